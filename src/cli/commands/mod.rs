pub mod export;
pub mod submit;
pub mod template;
pub mod validate;

pub mod export;
pub mod process;
pub mod upload;

// Re-export handler functions for use in routing
pub use export::export as export_get;
pub use export::template as template_get;
pub use process::cleanup as process_delete;
pub use process::progress as process_get;
pub use process::start as process_post;
pub use upload::upload as upload_post;

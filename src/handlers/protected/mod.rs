// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route Prefix: /api/*
// Middleware: JWT validation, `AuthUser` injected as a request extension

pub mod csv;
pub mod generate;
pub mod quota;

pub use generate::generate_post;
pub use quota::quota_get;

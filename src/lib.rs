pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod csv_io;
pub mod database;
pub mod error;
pub mod generation;
pub mod handlers;
pub mod jobs;
pub mod listing;
pub mod middleware;
pub mod quota;
pub mod state;

pub use app::app;
pub use state::AppState;

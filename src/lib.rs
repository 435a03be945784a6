pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod progress;
pub mod session;
pub mod stream;
pub mod ui;
pub mod utils;

pub use error::{AppError, Result};

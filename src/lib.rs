pub mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod prompt;
pub mod utils;

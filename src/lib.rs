pub mod commands;
pub mod config;
pub mod packaging;
pub mod platform;
pub mod utils;

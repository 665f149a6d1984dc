pub mod browser;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod feed;

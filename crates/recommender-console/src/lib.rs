pub mod analytics;
pub mod app;
pub mod config;
pub mod error;
pub mod model;
pub mod render;
pub mod results;
pub mod session;

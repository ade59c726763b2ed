#![forbid(unsafe_code)]

pub mod config;
pub mod logging;
pub mod pkg;

pub use config::UnpackConfig;

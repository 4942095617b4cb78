pub mod bucketer;
pub mod config;
pub mod error;
pub mod rotation;
pub mod scheduler;
pub mod scorer;
pub mod service;
pub mod types;

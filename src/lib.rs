pub mod config;
pub mod dashboard;
pub mod error;
pub mod jobs;
pub mod shutdown;
pub mod source;
pub mod view;

pub mod cli;
pub mod config;
pub mod daemon;
pub mod discovery;
pub mod error;
pub mod log_sink;
pub mod monitor;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod workspace;

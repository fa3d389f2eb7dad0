pub mod aggregate;
pub mod cache;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod partition;
pub mod series;

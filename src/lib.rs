pub mod analyzers;
pub mod charts;
pub mod config;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod output;
pub mod table;

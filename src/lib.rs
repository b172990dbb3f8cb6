pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod harvest;
pub mod logging;
pub mod model;
pub mod scraper;
pub mod table;
pub mod utils;

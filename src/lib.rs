pub mod analyzers;
pub mod config;
pub mod listing;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod rating;
pub mod validators;

pub mod config;
pub mod owner;
pub mod ownership_file;
pub mod pattern;
pub mod resolve;
pub mod team;

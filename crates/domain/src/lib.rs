pub mod config;
pub mod error;
pub mod lead;
pub mod tool;
pub mod trace;

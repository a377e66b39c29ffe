pub mod anneal;
pub mod config;
pub mod error;
pub mod input;
pub mod prepare;
pub mod render;
pub mod skyline;
pub mod solver;
pub mod strategies;
pub mod summary;
pub mod types;

pub mod actors;
pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod models;
pub mod render;
pub mod route;
pub mod types;

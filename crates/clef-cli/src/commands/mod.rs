pub mod auth;
pub mod common;
pub mod completions;
pub mod config;
pub mod gallery;
pub mod media;
pub mod shell;

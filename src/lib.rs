//! Skin Analysis Service Library

pub mod api;
pub mod config;
pub mod engine;
pub mod service;
pub mod storage;
pub mod upstream;
pub mod utils;

pub use config::Config;

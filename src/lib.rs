//! Morph File Conversion Service
//!
//! A Rust service for converting uploaded files between formats, applying
//! local image effects, and requesting AI-generated insights and
//! translations from the Gemini API.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod registry;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};

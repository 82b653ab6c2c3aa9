//! CheckIn24 core: check-in history, user preferences and QR check-in payloads.

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod models;
pub mod utils;

pub use error::{Error, Result};

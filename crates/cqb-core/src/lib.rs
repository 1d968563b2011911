//! Core domain + application logic for the cauciones quote bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the brokerage
//! API live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod security;

pub use errors::{Error, Result};

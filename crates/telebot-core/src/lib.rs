//! # telebot-core
//!
//! Core types, traits, configuration, and error handling for telebot.

pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod request;
pub mod traits;
pub mod types;

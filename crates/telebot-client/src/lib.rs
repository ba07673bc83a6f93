//! # telebot-client
//!
//! Telegram Bot API client: HTTP transport, retry on transient DNS
//! failures, the long-poll update loop with command dispatch, and typed
//! request wrappers.
//! Docs: <https://core.telegram.org/bots/api>

pub mod client;
pub mod requests;
pub mod retry;
pub mod transport;

pub use client::{Client, FileDownload, PollState};
pub use telebot_core::{
    config::ClientConfig,
    error::BotError,
    events::{self, Event},
    request::InputFile,
};

//! Minimaler Client für die Telegram Bot API (Long Polling).

pub mod client;
pub mod types;

pub use client::BotClient;
pub use types::{ApiResponse, Chat, Message, Update, UpdateBatch, User};

//! # certbot
//!
//! A Telegram bot and CLI that writes a name and an ID number onto a PDF
//! certificate template and sends the result back to the user.

pub mod bot;
pub mod cli;
pub mod config;
pub mod error;
pub mod pdf;
pub mod telegram;
pub mod template;

// Re-exports
pub use bot::{Dispatcher, Replier};
pub use cli::{Cli, Commands};
pub use config::BotConfig;
pub use error::{CertbotError, FormatError, RenderError, Result};
pub use pdf::{CertificateRenderer, OutputStore};
pub use template::CertificateRequest;

use crate::bot::commands::{Command, CommandParser};
use crate::config::{BotConfig, DEFAULT_ATTACHMENT_NAME, DEFAULT_GITHUB_URL};
use crate::error::{CertbotError, Result};
use crate::pdf::{CertificateRenderer, OutputStore};
use crate::telegram::{BotClient, Update};
use crate::template::CertificateRequest;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const START_TEXT: &str = "Welcome! Please send me your details in the format: \nName, ID Number";
pub const INVALID_FORMAT_TEXT: &str = "Invalid format. Please use: Name, ID Number";
pub const RENDER_FAILED_TEXT: &str =
    "Sorry, the certificate could not be generated. Please try again later.";

/// Rückkanal zum Chat
#[async_trait]
pub trait Replier: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    async fn send_document(&self, chat_id: i64, path: &Path, filename: &str) -> Result<()>;
}

#[async_trait]
impl Replier for BotClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_message(chat_id, text).await
    }

    async fn send_document(&self, chat_id: i64, path: &Path, filename: &str) -> Result<()> {
        BotClient::send_document(self, chat_id, path, filename).await
    }
}

/// Verteilt eingehende Updates auf die Handler
#[derive(Debug)]
pub struct Dispatcher {
    renderer: Arc<CertificateRenderer>,
    outputs: OutputStore,
    commands: CommandParser,
    github_url: String,
    attachment_name: String,
    cleanup: bool,
}

impl Dispatcher {
    pub fn new(renderer: CertificateRenderer, outputs: OutputStore) -> Result<Self> {
        let commands = CommandParser::new()
            .map_err(|e| CertbotError::Config(format!("command pattern: {}", e)))?;

        Ok(Self {
            renderer: Arc::new(renderer),
            outputs,
            commands,
            github_url: DEFAULT_GITHUB_URL.to_string(),
            attachment_name: DEFAULT_ATTACHMENT_NAME.to_string(),
            cleanup: false,
        })
    }

    pub fn from_config(config: &BotConfig, renderer: CertificateRenderer) -> Result<Self> {
        Ok(Self::new(renderer, OutputStore::new(&config.output_dir))?
            .github_url(&config.github_url)
            .attachment_name(&config.attachment_name)
            .cleanup(config.cleanup))
    }

    pub fn github_url(mut self, url: &str) -> Self {
        self.github_url = url.to_string();
        self
    }

    pub fn attachment_name(mut self, name: &str) -> Self {
        self.attachment_name = name.to_string();
        self
    }

    pub fn cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn bot_username(mut self, username: Option<String>) -> Self {
        self.commands = self.commands.with_bot_username(username);
        self
    }

    /// Bearbeitet ein Update. Fehler gehen an den Aufrufer, der sie protokolliert.
    pub async fn handle_update(&self, replier: &dyn Replier, update: &Update) -> Result<()> {
        let (Some(chat_id), Some(text)) = (update.chat_id(), update.text()) else {
            debug!("Ignoring update {} without text", update.update_id);
            return Ok(());
        };

        match self.commands.parse(text) {
            Some(Command::Start) => replier.send_text(chat_id, START_TEXT).await,
            Some(Command::Github) => {
                let reply = format!("GitHub: {}", self.github_url);
                replier.send_text(chat_id, &reply).await
            }
            Some(Command::Other(name)) => {
                debug!("Ignoring command '{}' in chat {}", name, chat_id);
                Ok(())
            }
            None => self.handle_details(replier, chat_id, text).await,
        }
    }

    /// "Name, ID Number" -> PDF zurückschicken
    async fn handle_details(&self, replier: &dyn Replier, chat_id: i64, text: &str) -> Result<()> {
        let request = match CertificateRequest::parse(text) {
            Ok(request) => request,
            Err(e) => {
                debug!("Rejected input in chat {}: {}", chat_id, e);
                return replier.send_text(chat_id, INVALID_FORMAT_TEXT).await;
            }
        };

        let output = match self.render(request).await {
            Ok(output) => output,
            Err(e) => {
                if let Err(send_err) = replier.send_text(chat_id, RENDER_FAILED_TEXT).await {
                    warn!("Could not notify chat {}: {}", chat_id, send_err);
                }
                return Err(e);
            }
        };

        info!("Sending {} to chat {}", output.display(), chat_id);
        let sent = replier
            .send_document(chat_id, &output, &self.attachment_name)
            .await;

        if self.cleanup {
            self.outputs.release(&output);
        }

        sent
    }

    /// Rendert auf einem Blocking-Thread in eine eigene Datei
    async fn render(&self, request: CertificateRequest) -> Result<PathBuf> {
        let output = self.outputs.allocate()?;
        let renderer = Arc::clone(&self.renderer);
        let target = output.clone();

        tokio::task::spawn_blocking(move || renderer.render(&request, &target)).await??;

        Ok(output)
    }
}

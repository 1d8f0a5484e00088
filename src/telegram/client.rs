use crate::error::{CertbotError, Result};
use crate::telegram::types::{ApiResponse, UpdateBatch, User};
use log::debug;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Zusätzliche Zeit für die HTTP-Anfrage über das Long-Polling hinaus
const HTTP_GRACE: Duration = Duration::from_secs(10);

pub struct BotClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    poll_timeout: Duration,
}

impl BotClient {
    pub fn new(token: &str, api_url: &str, poll_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(poll_timeout + HTTP_GRACE)
            .build()
            .map_err(|e| CertbotError::Http(e.without_url()))?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            poll_timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Schickt die Anfrage ab und entpackt die API-Hülle.
    /// URLs werden aus Fehlern entfernt, weil sie das Token enthalten.
    async fn call<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| e.without_url())?;
        let body: ApiResponse<T> = response.json().await.map_err(|e| e.without_url())?;
        body.into_result()
    }

    pub async fn get_me(&self) -> Result<User> {
        self.call(self.http.post(self.method_url("getMe"))).await
    }

    /// Wartet bis zu `poll_timeout` auf neue Nachrichten ab `offset`
    pub async fn get_updates(&self, offset: i64) -> Result<UpdateBatch> {
        let payload = json!({
            "offset": offset,
            "timeout": self.poll_timeout.as_secs(),
            "allowed_updates": ["message"],
        });

        let values: Vec<serde_json::Value> = self
            .call(self.http.post(self.method_url("getUpdates")).json(&payload))
            .await?;
        let batch = UpdateBatch::from_values(values);
        debug!("Received {} updates (offset {})", batch.updates.len(), offset);
        Ok(batch)
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let payload = json!({ "chat_id": chat_id, "text": text });
        let _: serde_json::Value = self
            .call(self.http.post(self.method_url("sendMessage")).json(&payload))
            .await?;
        Ok(())
    }

    /// Lädt die Datei als Dokument hoch, `filename` ist der Name beim Empfänger
    pub async fn send_document(&self, chat_id: i64, path: &Path, filename: &str) -> Result<()> {
        let bytes = tokio::fs::read(path).await?;
        let document = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| e.without_url())?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", document);

        let _: serde_json::Value = self
            .call(self.http.post(self.method_url("sendDocument")).multipart(form))
            .await?;
        Ok(())
    }
}

impl fmt::Debug for BotClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotClient")
            .field("api_url", &self.api_url)
            .field("token", &"***")
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}

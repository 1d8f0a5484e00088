use crate::error::{CertbotError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_TEMPLATE: &str = "cert_template.pdf";
pub const DEFAULT_OUTPUT_DIR: &str = "generated";
pub const DEFAULT_ATTACHMENT_NAME: &str = "generated_cert.pdf";
pub const DEFAULT_GITHUB_URL: &str = "https://github.com/azizulabedinazmi";
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Einstellungen des Bots, aus Umgebungsvariablen bzw. `.env`
#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    pub api_url: String,
    pub template: PathBuf,
    pub output_dir: PathBuf,
    pub attachment_name: String,
    pub github_url: String,
    pub poll_timeout: Duration,
    /// Erzeugte Dateien nach dem Versand löschen
    pub cleanup: bool,
}

impl BotConfig {
    /// Lädt `.env` (falls vorhanden) und liest die Prozessumgebung
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("TELEGRAM_BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CertbotError::Config("TELEGRAM_BOT_TOKEN must be set".to_string()))?;

        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            token,
            api_url: or_default("TELEGRAM_API_URL", DEFAULT_API_URL),
            template: PathBuf::from(or_default("CERTBOT_TEMPLATE", DEFAULT_TEMPLATE)),
            output_dir: PathBuf::from(or_default("CERTBOT_OUTPUT_DIR", DEFAULT_OUTPUT_DIR)),
            attachment_name: or_default("CERTBOT_ATTACHMENT_NAME", DEFAULT_ATTACHMENT_NAME),
            github_url: or_default("CERTBOT_GITHUB_URL", DEFAULT_GITHUB_URL),
            poll_timeout: Duration::from_secs(
                parse_var(&lookup, "CERTBOT_POLL_TIMEOUT")?.unwrap_or(DEFAULT_POLL_TIMEOUT_SECS),
            ),
            cleanup: parse_var(&lookup, "CERTBOT_CLEANUP")?.unwrap_or(false),
        })
    }

    /// Werte von der Kommandozeile haben Vorrang
    pub fn with_overrides(mut self, template: Option<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        if let Some(template) = template {
            self.template = template;
        }
        if let Some(output_dir) = output_dir {
            self.output_dir = output_dir;
        }
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CertbotError::Config(format!("invalid value for {}: '{}'", key, raw))),
        None => Ok(None),
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"***")
            .field("api_url", &self.api_url)
            .field("template", &self.template)
            .field("output_dir", &self.output_dir)
            .field("attachment_name", &self.attachment_name)
            .field("github_url", &self.github_url)
            .field("poll_timeout", &self.poll_timeout)
            .field("cleanup", &self.cleanup)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();

        assert_eq!(config.token, "123:abc");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.template, PathBuf::from("cert_template.pdf"));
        assert_eq!(config.output_dir, PathBuf::from("generated"));
        assert_eq!(config.attachment_name, "generated_cert.pdf");
        assert_eq!(config.poll_timeout, Duration::from_secs(30));
        assert!(!config.cleanup);
    }

    #[test]
    fn test_missing_token() {
        let result = BotConfig::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(CertbotError::Config(_))));

        let result = BotConfig::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "  ")]));
        assert!(matches!(result, Err(CertbotError::Config(_))));
    }

    #[test]
    fn test_custom_values() {
        let config = BotConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("CERTBOT_TEMPLATE", "/srv/nid.pdf"),
            ("CERTBOT_POLL_TIMEOUT", " 5 "),
            ("CERTBOT_CLEANUP", "true"),
        ]))
        .unwrap();

        assert_eq!(config.template, PathBuf::from("/srv/nid.pdf"));
        assert_eq!(config.poll_timeout, Duration::from_secs(5));
        assert!(config.cleanup);
    }

    #[test]
    fn test_invalid_number() {
        let result = BotConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("CERTBOT_POLL_TIMEOUT", "soon"),
        ]));
        assert!(matches!(result, Err(CertbotError::Config(_))));
    }

    #[test]
    fn test_overrides_and_debug() {
        let config = BotConfig::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "123:secret")]))
            .unwrap()
            .with_overrides(Some(PathBuf::from("other.pdf")), None);

        assert_eq!(config.template, PathBuf::from("other.pdf"));
        assert_eq!(config.output_dir, PathBuf::from("generated"));
        assert!(!format!("{:?}", config).contains("secret"));
    }
}

use regex::Regex;

/// Befehle, die der Bot kennt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Github,
    /// Unbekannt oder an einen anderen Bot gerichtet
    Other(String),
}

/// Erkennt `/name` und `/name@botname` am Anfang einer Nachricht
#[derive(Debug, Clone)]
pub struct CommandParser {
    pattern: Regex,
    bot_username: Option<String>,
}

impl CommandParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(r"^/([A-Za-z0-9_]+)(?:@([A-Za-z0-9_]+))?")?,
            bot_username: None,
        })
    }

    /// Befehle mit `@andererbot` werden dann als `Other` behandelt
    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    /// `None`, wenn der Text kein Befehl ist. Wie bei Telegram endet der
    /// Befehlsname am ersten Zeichen außerhalb von `[A-Za-z0-9_]`.
    pub fn parse(&self, text: &str) -> Option<Command> {
        let caps = self.pattern.captures(text)?;
        let name = caps[1].to_ascii_lowercase();

        if let (Some(target), Some(own)) = (caps.get(2), self.bot_username.as_deref()) {
            if !target.as_str().eq_ignore_ascii_case(own) {
                return Some(Command::Other(name));
            }
        }

        Some(match name.as_str() {
            "start" => Command::Start,
            "github" => Command::Github,
            _ => Command::Other(name),
        })
    }
}

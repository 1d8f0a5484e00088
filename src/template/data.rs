use crate::error::FormatError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Daten für ein Zertifikat, wie sie der Nutzer schickt: "Name, ID Number"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRequest {
    pub name: String,
    pub id_number: String,
}

impl CertificateRequest {
    pub fn new(name: impl Into<String>, id_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_number: id_number.into(),
        }
    }

    /// Zerlegt eine Zeile am Komma. Nur die Anzahl der Felder wird geprüft,
    /// leere Felder sind erlaubt.
    pub fn parse(line: &str) -> Result<Self, FormatError> {
        let fields: Vec<&str> = line.split(',').collect();

        match fields.as_slice() {
            [name, id_number] => Ok(Self::new(name.trim(), id_number.trim())),
            _ => Err(FormatError {
                fields: fields.len(),
            }),
        }
    }

    /// Text für die zweite Zeile auf dem Zertifikat
    pub fn id_line(&self) -> String {
        format!("ID Number: {}", self.id_number)
    }

    /// Lädt mehrere Datensätze aus einer JSON-Datei (Array von Objekten)
    pub fn batch_from_json_file(path: &Path) -> crate::error::Result<Vec<Self>> {
        let content = std::fs::read_to_string(path)?;
        let data = serde_json::from_str(&content)?;
        Ok(data)
    }
}

impl FromStr for CertificateRequest {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

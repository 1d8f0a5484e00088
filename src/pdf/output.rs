use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Vergibt pro Anfrage einen eigenen Dateipfad im Ausgabeordner
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Liefert `<dir>/cert_<uuid>.pdf`, legt den Ordner bei Bedarf an
    pub fn allocate(&self) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("cert_{}.pdf", Uuid::new_v4()));
        debug!("Allocated output path {}", path.display());
        Ok(path)
    }

    /// Entfernt eine zugestellte Datei. Fehler werden nur protokolliert.
    pub fn release(&self, path: &Path) {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}

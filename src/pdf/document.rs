use crate::error::RenderError;
use crate::pdf::overlay::{apply_overlays, Rgb, TextOverlay};
use crate::template::CertificateRequest;
use log::{debug, info};
use lopdf::Document;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Ankerpunkt des Namens (oben links, Grundlinie)
pub const NAME_ANCHOR: (f32, f32) = (200.0, 220.0);
pub const NAME_FONT_SIZE: f32 = 26.0;

/// Ankerpunkt der Zeile "ID Number: ..."
pub const ID_ANCHOR: (f32, f32) = (240.0, 240.0);
pub const ID_FONT_SIZE: f32 = 12.0;

/// Blau des Namens, (48, 169, 222)
pub fn name_color() -> Rgb {
    Rgb::from_u8(48, 169, 222)
}

/// Overlays für eine Anfrage: Name und ID-Zeile
pub fn certificate_overlays(request: &CertificateRequest) -> [TextOverlay; 2] {
    [
        TextOverlay::new(request.name.as_str(), NAME_ANCHOR, NAME_FONT_SIZE, name_color()),
        TextOverlay::new(request.id_line(), ID_ANCHOR, ID_FONT_SIZE, Rgb::BLACK),
    ]
}

/// Erzeugt Zertifikate aus einer PDF-Vorlage.
///
/// Die Vorlage wird bei jedem Aufruf neu geladen und nur im Speicher verändert,
/// die Datei selbst bleibt unberührt.
#[derive(Debug, Clone)]
pub struct CertificateRenderer {
    template: PathBuf,
}

impl CertificateRenderer {
    /// Prüft, dass die Vorlage existiert
    pub fn open(template: impl Into<PathBuf>) -> Result<Self, RenderError> {
        let template = template.into();
        if !template.is_file() {
            return Err(RenderError::TemplateNotFound(template));
        }

        Ok(Self { template })
    }

    pub fn template(&self) -> &Path {
        &self.template
    }

    /// Lädt Seite 1 der Vorlage und schreibt Name und ID-Nummer darauf
    fn fill(&self, request: &CertificateRequest) -> Result<Document, RenderError> {
        let bytes = std::fs::read(&self.template)
            .map_err(|_| RenderError::TemplateNotFound(self.template.clone()))?;
        let mut doc = Document::load_mem(&bytes)?;

        let page_id = doc
            .get_pages()
            .values()
            .next()
            .copied()
            .ok_or_else(|| RenderError::EmptyTemplate(self.template.clone()))?;

        debug!("Filling page {:?} of {}", page_id, self.template.display());
        apply_overlays(&mut doc, page_id, &certificate_overlays(request))?;

        Ok(doc)
    }

    /// Erzeugt das Zertifikat im Speicher
    pub fn render_to_bytes(&self, request: &CertificateRequest) -> Result<Vec<u8>, RenderError> {
        let mut doc = self.fill(request)?;
        let mut output = Vec::new();
        doc.save_to(&mut output)?;
        Ok(output)
    }

    /// Erzeugt das Zertifikat und speichert es unter `output_path`.
    ///
    /// Geschrieben wird in eine temporäre Datei im Zielordner, die erst bei
    /// Erfolg umbenannt wird. Eine vorhandene Datei wird überschrieben.
    pub fn render(&self, request: &CertificateRequest, output_path: &Path) -> Result<(), RenderError> {
        info!("Processing template: {}", self.template.display());

        let bytes = self.render_to_bytes(request)?;

        let dir = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(output_path).map_err(|e| RenderError::Io(e.error))?;

        info!("Successfully created: {}", output_path.display());
        Ok(())
    }

    /// Mehrere Zertifikate in einen Ordner schreiben
    pub fn batch_render(
        &self,
        output_dir: &Path,
        batch: &[(String, CertificateRequest)],
    ) -> Result<Vec<PathBuf>, RenderError> {
        std::fs::create_dir_all(output_dir)?;

        let mut created = Vec::with_capacity(batch.len());
        for (filename, request) in batch {
            let output_path = output_dir.join(filename);
            self.render(request, &output_path)?;
            created.push(output_path);
        }

        Ok(created)
    }
}

/// Einzelaufruf: Vorlage öffnen, füllen, speichern
pub fn render(
    request: &CertificateRequest,
    template_path: &Path,
    output_path: &Path,
) -> Result<(), RenderError> {
    CertificateRenderer::open(template_path)?.render(request, output_path)
}

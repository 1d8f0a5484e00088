//! Text-Overlays auf einer bestehenden PDF-Seite.
//!
//! Ankerpunkte werden wie bei einem Bildschirm angegeben: Ursprung oben links
//! in der sichtbaren Seite (CropBox, mit `/Rotate`), `y` wächst nach unten und
//! bezeichnet die Grundlinie des Textes. PDF zählt von unten links in der
//! ungedrehten Seite, deshalb wird jeder Anker über [`PagePlacement`] in eine
//! Textmatrix umgerechnet.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use log::{debug, warn};

use crate::error::RenderError;

/// Ressourcenname, unter dem die Overlay-Schrift auf der Seite registriert wird
pub const FONT_RESOURCE: &str = "FCertbot";

/// Standard-14 Schrift, benötigt kein Einbetten
pub const FONT_BASE: &str = "Helvetica";

/// US Letter, falls die Seite weder CropBox noch MediaBox hat
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Maximale Tiefe beim Hochlaufen im Seitenbaum
const MAX_TREE_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Farbe aus 0-255 Komponenten
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
        )
    }
}

/// Ein Textstück an einem festen Ankerpunkt
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub color: Rgb,
}

impl TextOverlay {
    pub fn new(text: impl Into<String>, (x, y): (f32, f32), font_size: f32, color: Rgb) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            font_size,
            color,
        }
    }
}

/// Kodiert Text für eine Schrift mit WinAnsiEncoding.
/// Zeichen ohne Entsprechung werden zu `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => b'?',
        })
        .collect()
}

/// Schreibt die Overlays auf die Seite `page_id`.
///
/// Der bestehende Seiteninhalt wird in `q`/`Q` eingeschlossen, damit ein
/// offener Grafikzustand der Vorlage die Position der Overlays nicht verschiebt.
pub fn apply_overlays(
    doc: &mut Document,
    page_id: ObjectId,
    overlays: &[TextOverlay],
) -> Result<(), RenderError> {
    let placement = PagePlacement::of_page(doc, page_id);
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => FONT_BASE,
        "Encoding" => "WinAnsiEncoding",
    });
    register_font(doc, page_id, font_id)?;

    // Zeilenumbruch vorweg, falls der letzte Strom der Vorlage ohne Whitespace endet
    let mut content = b"\n".to_vec();
    content.extend(overlay_content(overlays, &placement).encode()?);
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), content));
    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));

    let mut contents = vec![Object::Reference(save_id)];
    contents.extend(existing_contents(doc, page_id)?);
    contents.push(Object::Reference(overlay_id));

    debug!(
        "Appending {} overlays to page {:?} ({} content streams)",
        overlays.len(),
        page_id,
        contents.len()
    );

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));

    Ok(())
}

/// Sichtbarer Seitenbereich und Drehung einer Seite
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePlacement {
    /// `[x0, y0, x1, y1]`, normalisiert
    pub bbox: [f32; 4],
    /// 0, 90, 180 oder 270
    pub rotation: i64,
}

impl PagePlacement {
    pub fn new(bbox: [f32; 4], rotation: i64) -> Self {
        let [a, b, c, d] = bbox;
        let rotation = rotation.rem_euclid(360);
        let rotation = if rotation % 90 == 0 {
            rotation
        } else {
            warn!("Ignoring /Rotate {} (not a multiple of 90)", rotation);
            0
        };

        Self {
            bbox: [a.min(c), b.min(d), a.max(c), b.max(d)],
            rotation,
        }
    }

    /// CropBox (sonst MediaBox) und `/Rotate`, beides auch geerbt
    pub fn of_page(doc: &Document, page_id: ObjectId) -> Self {
        let bbox = inherited(doc, page_id, b"CropBox")
            .and_then(|obj| page_box(doc, obj))
            .or_else(|| inherited(doc, page_id, b"MediaBox").and_then(|obj| page_box(doc, obj)))
            .unwrap_or(DEFAULT_MEDIA_BOX);
        let rotation = match inherited(doc, page_id, b"Rotate") {
            Some(Object::Integer(r)) => *r,
            _ => 0,
        };

        Self::new(bbox, rotation)
    }

    /// Textmatrix `[a b c d e f]` für einen Anker in der sichtbaren Seite
    pub fn text_matrix(&self, x: f32, y: f32) -> [f32; 6] {
        let [x0, y0, x1, y1] = self.bbox;
        match self.rotation {
            90 => [0.0, 1.0, -1.0, 0.0, x0 + y, y0 + x],
            180 => [-1.0, 0.0, 0.0, -1.0, x1 - x, y0 + y],
            270 => [0.0, -1.0, 1.0, 0.0, x1 - y, y1 - x],
            _ => [1.0, 0.0, 0.0, 1.0, x0 + x, y1 - y],
        }
    }
}

/// Erzeugt den Inhaltsstrom: schließt den Vorlagenzustand und zeichnet die Texte
fn overlay_content(overlays: &[TextOverlay], placement: &PagePlacement) -> Content {
    let mut operations = vec![Operation::new("Q", vec![]), Operation::new("q", vec![])];

    for overlay in overlays {
        let color = overlay.color;
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_RESOURCE.into(), overlay.font_size.into()]),
            Operation::new("rg", vec![color.r.into(), color.g.into(), color.b.into()]),
            Operation::new(
                "Tm",
                placement
                    .text_matrix(overlay.x, overlay.y)
                    .iter()
                    .map(|v| Object::Real(*v))
                    .collect(),
            ),
            Operation::new(
                "Tj",
                vec![Object::String(
                    encode_win_ansi(&overlay.text),
                    StringFormat::Hexadecimal,
                )],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    operations.push(Operation::new("Q", vec![]));
    Content { operations }
}

/// Trägt die Schrift in die Ressourcen der Seite ein.
///
/// Geerbte oder referenzierte Ressourcen werden kopiert und direkt an die
/// Seite gehängt, andere Seiten der Vorlage bleiben unverändert.
fn register_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> Result<(), RenderError> {
    let mut resources = effective_resources(doc, page_id)?;

    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Reference(id)) => doc.get_object(*id)?.as_dict()?.clone(),
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    fonts.set(FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Resources", Object::Dictionary(resources));

    Ok(())
}

/// Ressourcen der Seite, auch wenn sie von einem Pages-Knoten geerbt werden
fn effective_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, RenderError> {
    let mut node = doc.get_object(page_id)?.as_dict()?;

    for _ in 0..MAX_TREE_DEPTH {
        match node.get(b"Resources") {
            Ok(Object::Reference(id)) => return Ok(doc.get_object(*id)?.as_dict()?.clone()),
            Ok(Object::Dictionary(dict)) => return Ok(dict.clone()),
            _ => {}
        }

        match node.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => node = doc.get_object(*parent_id)?.as_dict()?,
            _ => break,
        }
    }

    Ok(Dictionary::new())
}

/// Bisherige Inhaltsströme der Seite als Liste von Referenzen
fn existing_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, RenderError> {
    let page = doc.get_object(page_id)?.as_dict()?;

    let contents = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(items) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    Ok(contents)
}

/// Eintrag der Seite oder des nächsten Pages-Knotens, der ihn setzt
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_object(page_id).and_then(Object::as_dict).ok()?;

    for _ in 0..MAX_TREE_DEPTH {
        match node.get(key) {
            Ok(Object::Reference(id)) => return doc.get_object(*id).ok(),
            Ok(obj) => return Some(obj),
            Err(_) => {}
        }

        node = match node.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => doc.get_object(*parent_id).and_then(Object::as_dict).ok()?,
            _ => return None,
        };
    }

    None
}

fn page_box(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let Object::Array(values) = obj else {
        return None;
    };
    let numbers: Vec<f32> = values
        .iter()
        .filter_map(|v| match v {
            Object::Reference(id) => doc.get_object(*id).ok().and_then(number),
            other => number(other),
        })
        .collect();

    match numbers.as_slice() {
        [x0, y0, x1, y1] => Some([*x0, *y0, *x1, *y1]),
        _ => None,
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_ascii() {
        assert_eq!(encode_win_ansi("ID Number: 12345"), b"ID Number: 12345".to_vec());
    }

    #[test]
    fn test_encode_latin1_and_specials() {
        assert_eq!(encode_win_ansi("Müller"), vec![b'M', 0xfc, b'l', b'l', b'e', b'r']);
        assert_eq!(encode_win_ansi("5 €"), vec![b'5', b' ', 0x80]);
    }

    #[test]
    fn test_encode_unsupported_becomes_question_mark() {
        assert_eq!(encode_win_ansi("Ωx\n"), b"?x?".to_vec());
    }

    #[test]
    fn test_rgb_from_u8() {
        let color = Rgb::from_u8(255, 0, 51);
        assert_eq!(color, Rgb::new(1.0, 0.0, 0.2));
    }

    #[test]
    fn test_overlay_content_flips_y() {
        let overlays = [TextOverlay::new("Alice", (200.0, 220.0), 26.0, Rgb::BLACK)];
        let placement = PagePlacement::new([0.0, 0.0, 595.0, 842.0], 0);
        let content = overlay_content(&overlays, &placement);

        let tm = content
            .operations
            .iter()
            .find(|op| op.operator == "Tm")
            .unwrap();
        let expected: Vec<Object> = [1.0, 0.0, 0.0, 1.0, 200.0, 622.0]
            .iter()
            .map(|v| Object::Real(*v))
            .collect();
        assert_eq!(tm.operands, expected);

        let first = content.operations.first().unwrap();
        let last = content.operations.last().unwrap();
        assert_eq!(first.operator, "Q");
        assert_eq!(last.operator, "Q");
    }

    #[test]
    fn test_apply_overlays_inherited_resources() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let base_font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Times-Roman",
        });
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT /F1 12 Tf 10 10 Td (x) Tj ET".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => base_font } },
                "MediaBox" => vec![0.into(), 0.into(), 400.into(), 300.into()],
            }),
        );

        assert_eq!(
            PagePlacement::of_page(&doc, page_id),
            PagePlacement::new([0.0, 0.0, 400.0, 300.0], 0)
        );

        let overlays = [TextOverlay::new("Hi", (10.0, 20.0), 12.0, Rgb::BLACK)];
        apply_overlays(&mut doc, page_id, &overlays).unwrap();

        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let fonts = page
            .get(b"Resources")
            .and_then(Object::as_dict)
            .and_then(|r| r.get(b"Font"))
            .and_then(Object::as_dict)
            .unwrap();
        assert!(fonts.has(b"F1"));
        assert!(fonts.has(FONT_RESOURCE.as_bytes()));

        let contents = page.get(b"Contents").and_then(Object::as_array).unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1], Object::Reference(content_id));
    }

    #[test]
    fn test_crop_box_preferred_over_media_box() {
        let mut doc = Document::with_version("1.5");
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "CropBox" => vec![50.into(), 40.into(), 545.into(), 800.into()],
        });

        let placement = PagePlacement::of_page(&doc, page_id);

        assert_eq!(placement.bbox, [50.0, 40.0, 545.0, 800.0]);
        let matrix = placement.text_matrix(200.0, 220.0);
        assert_eq!((matrix[4], matrix[5]), (250.0, 580.0));
    }

    #[test]
    fn test_inherited_rotation() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Rotate" => -90,
                "MediaBox" => vec![0.into(), 0.into(), 400.into(), 300.into()],
            }),
        );

        assert_eq!(PagePlacement::of_page(&doc, page_id).rotation, 270);
    }

    #[test]
    fn test_text_matrix_rotations() {
        // ungedreht 400 x 300
        let bbox = [0.0, 0.0, 400.0, 300.0];

        assert_eq!(
            PagePlacement::new(bbox, 0).text_matrix(10.0, 20.0),
            [1.0, 0.0, 0.0, 1.0, 10.0, 280.0]
        );
        assert_eq!(
            PagePlacement::new(bbox, 90).text_matrix(10.0, 20.0),
            [0.0, 1.0, -1.0, 0.0, 20.0, 10.0]
        );
        assert_eq!(
            PagePlacement::new(bbox, 180).text_matrix(10.0, 20.0),
            [-1.0, 0.0, 0.0, -1.0, 390.0, 20.0]
        );
        assert_eq!(
            PagePlacement::new(bbox, 270).text_matrix(10.0, 20.0),
            [0.0, -1.0, 1.0, 0.0, 380.0, 290.0]
        );
    }

    #[test]
    fn test_odd_rotation_is_ignored() {
        assert_eq!(PagePlacement::new([0.0, 0.0, 10.0, 10.0], 45).rotation, 0);
        assert_eq!(PagePlacement::new([10.0, 10.0, 0.0, 0.0], 450).bbox, [0.0, 0.0, 10.0, 10.0]);
    }
}

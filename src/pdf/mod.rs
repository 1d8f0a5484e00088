pub mod document;
pub mod output;
pub mod overlay;

pub use document::{render, CertificateRenderer};
pub use output::OutputStore;
pub use overlay::{Rgb, TextOverlay};

//! PDF rendering of submission records.
//!
//! One `key: value` paragraph per record field, matching the layout of the
//! archived submissions raters already know.

use std::path::Path;

use anyhow::{Context, Result};
use genpdf::elements::{Break, Paragraph};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Style, StyledString};
use genpdf::{Document, Margins, SimplePageDecorator};
use tracing::info;

use crate::coding::SubmissionRecord;

/// Font sizes for PDF output (in points).
const NORMAL_SIZE: u8 = 11;
const TITLE_SIZE: u8 = 14;

/// Page margins in mm.
const MARGIN_MM: f64 = 20.0;

/// Write a submission record to a PDF file.
///
/// # Errors
///
/// Returns an error if:
/// - No suitable font can be loaded from the configured directory or the
///   common system locations
/// - The PDF file cannot be written to the specified path
pub fn write_submission_pdf(
    path: &Path,
    record: &SubmissionRecord,
    font_dir: Option<&Path>,
) -> Result<()> {
    info!(
        path = %path.display(),
        fields = record.fields().len(),
        "Generating submission PDF"
    );

    let font_family =
        load_font_family(font_dir).with_context(|| "Failed to load a font for PDF export")?;

    let mut doc = Document::new(font_family);
    doc.set_title("RSCT Rater Submission");

    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(Margins::trbl(MARGIN_MM, MARGIN_MM, MARGIN_MM, MARGIN_MM));
    doc.set_page_decorator(decorator);

    let title_style = Style::new().bold().with_font_size(TITLE_SIZE);
    doc.push(Paragraph::new(StyledString::new(
        "RSCT Rater Submission",
        title_style,
    )));
    doc.push(Break::new(0.5));

    let field_style = Style::new().with_font_size(NORMAL_SIZE);
    for line in submission_lines(record) {
        doc.push(Paragraph::new(StyledString::new(line, field_style)));
    }

    doc.render_to_file(path)
        .with_context(|| format!("Failed to render PDF to {}", path.display()))?;

    info!(path = %path.display(), "Submission PDF saved");
    Ok(())
}

/// One `name: value` line per record field, in record order. These are
/// the body paragraphs rendered under the document title.
fn submission_lines(record: &SubmissionRecord) -> Vec<String> {
    record
        .fields()
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect()
}

/// Load a font family for PDF generation.
///
/// The configured directory is tried first (any `*-Regular.ttf` family it
/// contains), then common Linux and macOS locations. Styles missing from
/// a location fall back to the regular face.
fn load_font_family(font_dir: Option<&Path>) -> Result<FontFamily<FontData>> {
    if let Some(dir) = font_dir {
        let family = discover_family(dir)
            .with_context(|| format!("No *-Regular.ttf found in {}", dir.display()))?;
        return genpdf::fonts::from_files(dir, &family, None)
            .with_context(|| format!("Failed to load font family {} from {}", family, dir.display()));
    }

    let candidates: [[&str; 4]; 3] = [
        [
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Italic.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-BoldItalic.ttf",
        ],
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-BoldOblique.ttf",
        ],
        [
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
            "/System/Library/Fonts/Supplemental/Arial Italic.ttf",
            "/System/Library/Fonts/Supplemental/Arial Bold Italic.ttf",
        ],
    ];

    for paths in &candidates {
        if Path::new(paths[0]).exists() {
            return load_faces(paths);
        }
    }

    anyhow::bail!("No usable system font found; set export.font_dir in config.toml")
}

/// Find a `Family-Regular.ttf` file in a directory and return the family name
fn discover_family(dir: &Path) -> Option<String> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_str()?;
        if let Some(family) = name.strip_suffix("-Regular.ttf") {
            return Some(family.to_string());
        }
    }
    None
}

/// Load regular/bold/italic/bold-italic faces from explicit paths,
/// substituting the regular face for any missing style
fn load_faces(paths: &[&str; 4]) -> Result<FontFamily<FontData>> {
    let regular_bytes = std::fs::read(paths[0])
        .with_context(|| format!("Failed to read font: {}", paths[0]))?;
    let regular = FontData::new(regular_bytes.clone(), None)
        .with_context(|| format!("Failed to parse font: {}", paths[0]))?;

    let face = |path: &str| -> Result<FontData> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(_) => regular_bytes.clone(),
        };
        FontData::new(bytes, None).with_context(|| format!("Failed to parse font: {path}"))
    };

    Ok(FontFamily {
        regular,
        bold: face(paths[1])?,
        italic: face(paths[2])?,
        bold_italic: face(paths[3])?,
    })
}

use crate::core::error::AnalysisError;
use crate::core::io::Storage;
use log::info;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::Path;

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFormat {
    PlainText,
    Word,
}

impl ScriptFormat {
    pub fn from_path(path: &str) -> Result<Self, AnalysisError> {
        let ext = Path::new(path)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "txt" => Ok(ScriptFormat::PlainText),
            "docx" | "doc" => Ok(ScriptFormat::Word),
            _ => Err(AnalysisError::UnsupportedFileType(path.to_string())),
        }
    }

    pub fn is_supported(path: &str) -> bool {
        Self::from_path(path).is_ok()
    }
}

/// Reads a screenplay file and returns its text.
pub async fn load_script(storage: &dyn Storage, path: &str) -> Result<String, AnalysisError> {
    let format = ScriptFormat::from_path(path)?;
    let bytes = storage
        .read(path)
        .await
        .map_err(|e| AnalysisError::ExtractionFailure(format!("{}: {:#}", path, e)))?;

    let text = match format {
        ScriptFormat::PlainText => String::from_utf8(bytes)
            .map(|s| s.trim_start_matches('\u{feff}').to_string())
            .map_err(|e| AnalysisError::ExtractionFailure(format!("{}: {}", path, e)))?,
        ScriptFormat::Word => extract_docx_text(&bytes)?,
    };

    info!("Loaded {} ({} chars)", path, text.chars().count());
    Ok(text)
}

/// Raw text of a WordprocessingML document, one line per paragraph.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, AnalysisError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(failure)?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(failure)?
        .read_to_string(&mut xml)
        .map_err(failure)?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_run = false;
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:r" => in_run = true,
                b"w:t" => in_run_text = in_run,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:r" => in_run = false,
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            // Tab stops in paragraph properties share the `w:tab` name; only run content counts.
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" if in_run => text.push('\t'),
                b"w:br" | b"w:cr" if in_run => text.push('\n'),
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_run_text => {
                text.push_str(&t.unescape().map_err(failure)?);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(failure(e)),
            _ => {}
        }
    }

    Ok(text.trim_end().to_string())
}

fn failure(e: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::ExtractionFailure(e.to_string())
}

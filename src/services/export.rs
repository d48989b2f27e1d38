use crate::core::io::Storage;
use crate::core::model::{AnalysisResult, TableKind};
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;

/// CSV document for one table, or `None` when the table has no rows.
///
/// Every text cell is double-quoted with embedded quotes doubled, whatever it
/// contains. Only the scene number column is written bare.
pub fn table_to_csv(result: &AnalysisResult, kind: TableKind) -> Result<Option<Vec<u8>>> {
    let (headers, rows) = result.table(kind);
    if rows.is_empty() {
        return Ok(None);
    }

    let mut buffer = headers.join(",").into_bytes();
    buffer.push(b'\n');

    let mut builder = csv::WriterBuilder::new();
    builder
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'));

    for row in &rows {
        let mut cells = row.as_slice();
        if kind.numbered() {
            if let Some((id, rest)) = cells.split_first() {
                buffer.extend_from_slice(id.as_bytes());
                buffer.push(b',');
                cells = rest;
            }
        }

        let mut writer = builder.from_writer(&mut buffer);
        writer.write_record(cells)?;
        writer
            .flush()
            .with_context(|| format!("Failed to write CSV for {}", kind.file_name()))?;
    }

    Ok(Some(buffer))
}

/// Writes `kind` into `dir`. Returns the written path, if any.
pub async fn export_table(
    storage: &dyn Storage,
    dir: &str,
    result: &AnalysisResult,
    kind: TableKind,
) -> Result<Option<String>> {
    let Some(bytes) = table_to_csv(result, kind)? else {
        info!("Nothing to export for {}", kind.file_name());
        return Ok(None);
    };

    let path = Path::new(dir).join(kind.file_name());
    let path_str = path.to_string_lossy().to_string();
    if storage.exists(&path_str).await? {
        warn!("Overwriting earlier export {}", path_str);
    }
    storage.write(&path_str, &bytes).await?;
    info!("Exported {} rows to {}", result.len_of(kind), path_str);
    Ok(Some(path_str))
}

/// Writes every non-empty table into `dir`.
pub async fn export_all(storage: &dyn Storage, dir: &str, result: &AnalysisResult) -> Result<Vec<String>> {
    let mut written = Vec::new();
    for kind in TableKind::ALL {
        if let Some(path) = export_table(storage, dir, result, kind).await? {
            written.push(path);
        }
    }
    Ok(written)
}

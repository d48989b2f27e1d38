use crate::core::model::{AnalysisResult, TableKind};
use std::fmt::Write;

/// Text rendering of one table: a block per record, one `header: value` line per cell.
pub fn render_table(result: &AnalysisResult, kind: TableKind) -> String {
    let (headers, rows) = result.table(kind);
    let mut out = String::new();

    let _ = writeln!(out, "===== {} ({}) =====", kind.title(), rows.len());
    if rows.is_empty() {
        out.push_str("(空)\n");
        return out;
    }

    for (index, row) in rows.iter().enumerate() {
        let _ = writeln!(out, "--- #{} ---", index + 1);
        for (header, cell) in headers.iter().zip(row) {
            let _ = writeln!(out, "  {}: {}", header, cell);
        }
    }
    out
}

/// One-line row counts of all four tables.
pub fn summary(result: &AnalysisResult) -> String {
    TableKind::ALL
        .iter()
        .map(|kind| format!("{} {}", kind.title(), result.len_of(*kind)))
        .collect::<Vec<_>>()
        .join(" | ")
}

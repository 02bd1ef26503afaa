//! CSV export with every field quoted.

use crate::core::error::{AppError, Result};
use crate::core::models::{ExportScope, MergedResult};
use csv::{QuoteStyle, Terminator, WriterBuilder};

const HEADERS: [&str; 4] = ["Email", "Valid", "Deliverable", "Reason"];

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Renders results as CSV text: a header line, then one line per result,
/// joined by `\n` with no trailing newline.
pub fn export_csv(results: &[MergedResult], scope: ExportScope) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(HEADERS)?;

    let mut exported = 0;
    for result in results
        .iter()
        .filter(|r| scope == ExportScope::All || r.valid)
    {
        writer.write_record([
            result.email.as_str(),
            yes_no(result.valid),
            yes_no(result.deliverable),
            result.reason.as_str(),
        ])?;
        exported += 1;
    }

    let bytes = writer.into_inner()?;
    let mut text = String::from_utf8(bytes)
        .map_err(|e| AppError::Generic(anyhow::anyhow!("CSV output was not UTF-8: {}", e)))?;
    if text.ends_with('\n') {
        text.pop();
    }

    tracing::debug!("Exported {} of {} results as CSV", exported, results.len());
    Ok(text)
}

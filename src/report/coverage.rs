//! Coverage report emission
//!
//! Coverage data is printed to the test log in fixed-size chunks so it
//! survives line-length limits of the collecting side.

use std::io::Write;

use crate::common::Result;

/// Default maximum characters per emitted chunk
pub const DEFAULT_CHUNK_LEN: usize = 500;

/// Prefix for coverage payload lines
pub const COVERAGE_DATA_KEY: &str = "OHOS_REPORT_COVERAGE_DATA:";

/// Prefix for the error line emitted when no coverage was collected
pub const ERROR_MESSAGE_KEY: &str = "OHOS_REPORT_ERROR_MESSAGE:";

const MISSING_COVERAGE: &str =
    "Coverage data generation failed. Please clean up the project and rerun";

/// Report lines for a serialized coverage payload
///
/// Chunks are cut on character boundaries and indexed `0..=len / chunk_len`,
/// so a payload that fills its last chunk exactly is followed by an empty one.
/// Lengths count Unicode scalar values, not UTF-16 units, so text outside the
/// BMP splits at different offsets than a UTF-16 based reader would expect.
pub fn coverage_lines(payload: Option<&str>, chunk_len: usize) -> Vec<String> {
    let (key, text) = match payload {
        Some(data) => (COVERAGE_DATA_KEY, data),
        None => (ERROR_MESSAGE_KEY, MISSING_COVERAGE),
    };
    let chunk_len = chunk_len.max(1);

    let chars: Vec<char> = text.chars().collect();
    let last = chars.len() / chunk_len;
    (0..=last)
        .map(|index| {
            let start = (index * chunk_len).min(chars.len());
            let end = ((index + 1) * chunk_len).min(chars.len());
            let chunk: String = chars[start..end].iter().collect();
            format!("{} {}", key, chunk)
        })
        .collect()
}

/// Write the report lines for `payload` to `out`
pub fn emit_coverage<W: Write>(
    out: &mut W,
    payload: Option<&serde_json::Value>,
    chunk_len: usize,
) -> Result<usize> {
    let serialized = payload.map(serde_json::to_string).transpose()?;
    let lines = coverage_lines(serialized.as_deref(), chunk_len);
    for line in &lines {
        writeln!(out, "{}", line)?;
    }
    tracing::debug!(lines = lines.len(), missing = payload.is_none(), "Coverage report emitted");
    Ok(lines.len())
}

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::core::ChuteError;

/// Delimiters the sniffer considers, in preference order.
const DELIMITERS: [char; 4] = [',', '\t', ';', '|'];

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSchema {
    pub delimiter: char,
    /// Column names in file order, quotes stripped. All columns are text.
    pub columns: Vec<String>,
}

/// Infers a table shape from a CSV header line.
pub trait HeaderSniffer: Send + Sync {
    fn sniff(&self, header: &str) -> Result<HeaderSchema, ChuteError>;
}

/// Sniffer that only ever looks at one line. A delimiter occurring inside
/// quoted text on that line will misparse; swap in a multi-line
/// implementation here if that starts to hurt.
pub struct SingleLineSniffer;

impl HeaderSniffer for SingleLineSniffer {
    fn sniff(&self, header: &str) -> Result<HeaderSchema, ChuteError> {
        let delimiter = infer_delimiter(header)?;
        let columns = header
            .split(delimiter)
            .map(strip_surrounding_quotes)
            .collect();
        Ok(HeaderSchema { delimiter, columns })
    }
}

fn infer_delimiter(line: &str) -> Result<char, ChuteError> {
    let mut best: Option<(char, usize)> = None;
    for d in DELIMITERS {
        let count = line.matches(d).count();
        if count > 0 && best.is_none_or(|(_, c)| count > c) {
            best = Some((d, count));
        }
    }
    match best {
        Some((d, _)) => Ok(d),
        None => Err(ChuteError::SchemaInferenceError(format!(
            "no delimiter found in header line {:?}",
            line
        ))),
    }
}

/// Strips one layer of surrounding double quotes, nothing else.
fn strip_surrounding_quotes(field: &str) -> String {
    field
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(field)
        .to_string()
}

/// Reads the first line of `path`, trimmed of surrounding whitespace.
pub fn read_header_line(path: &Path) -> Result<String, ChuteError> {
    let file = File::open(path)
        .map_err(|e| ChuteError::FileReadError(format!("{}: {}", path.display(), e)))?;
    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .map_err(|e| ChuteError::FileReadError(format!("{}: {}", path.display(), e)))?;
    let line = line.trim();
    if line.is_empty() {
        return Err(ChuteError::FileReadError(format!(
            "{}: empty header line",
            path.display()
        )));
    }
    Ok(line.to_string())
}

//! Line-oriented reader for pipe-delimited dataset files.
//!
//! # Responsibilities
//! - Skip the header row
//! - Split each row into exactly five fields
//! - Decode each row as UTF-8 independently
//! - Report malformed rows without stopping the scan
//!
//! # Design Decisions
//! - No type inference: every field stays text, only `image` is optional
//! - Blank lines are ignored silently (trailing newline at EOF)
//! - CRLF files are accepted

use thiserror::Error;

use crate::store::Record;

/// Header row written by the ingestion pipeline.
pub const DATASET_HEADER: &str = "title|description|image|url|date";

const FIELD_DELIMITER: char = '|';
const FIELD_COUNT: usize = 5;

/// Image marker the ingestion pipeline writes for articles without a thumbnail.
const ABSENT_IMAGE: &str = "None";

/// A row that could not be turned into a [`Record`].
///
/// Line numbers are 1-based and count the header row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRow {
    #[error("line {line}: expected 5 fields, found {found}")]
    FieldCount { line: usize, found: usize },
    #[error("line {line}: row is not valid UTF-8")]
    Encoding { line: usize },
}

/// Iterator over the data rows of one dataset file.
///
/// Yields `Ok(Record)` for well-formed rows and `Err(MalformedRow)` for rows
/// the caller should skip.
pub struct DatasetReader<'a> {
    lines: std::iter::Enumerate<std::slice::Split<'a, u8, fn(&u8) -> bool>>,
    header_ok: bool,
}

fn is_newline(b: &u8) -> bool {
    *b == b'\n'
}

impl<'a> DatasetReader<'a> {
    /// Start reading `content`, consuming its header row.
    pub fn new(content: &'a [u8]) -> Self {
        let mut lines = content
            .split(is_newline as fn(&u8) -> bool)
            .enumerate();

        let header_ok = match lines.next() {
            Some((_, header)) => std::str::from_utf8(header)
                .map(|h| h.trim_end() == DATASET_HEADER)
                .unwrap_or(false),
            None => false,
        };

        Self { lines, header_ok }
    }

    /// Whether the first line matched [`DATASET_HEADER`].
    ///
    /// The first line is skipped either way.
    pub fn header_ok(&self) -> bool {
        self.header_ok
    }
}

impl Iterator for DatasetReader<'_> {
    type Item = Result<Record, MalformedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (index, raw) = self.lines.next()?;
            let line = index + 1;

            let text = match std::str::from_utf8(raw) {
                Ok(text) => text.trim_end_matches(['\r', '\n']),
                Err(_) => return Some(Err(MalformedRow::Encoding { line })),
            };

            if text.trim().is_empty() {
                continue;
            }

            return Some(parse_row(text, line));
        }
    }
}

/// Split one data row into a [`Record`].
fn parse_row(text: &str, line: usize) -> Result<Record, MalformedRow> {
    let fields: Vec<&str> = text.split(FIELD_DELIMITER).collect();
    if fields.len() != FIELD_COUNT {
        return Err(MalformedRow::FieldCount {
            line,
            found: fields.len(),
        });
    }

    let image = match fields[2].trim() {
        "" | ABSENT_IMAGE => None,
        other => Some(other.to_string()),
    };

    Ok(Record {
        title: fields[0].to_string(),
        description: fields[1].to_string(),
        image,
        url: fields[3].to_string(),
        publish_date: fields[4].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_after_header() {
        let content = "title|description|image|url|date\n\
                       a|da|https://img/a.jpg|https://a|2022.07.01\n\
                       b|db|None|https://b|2022.07.02\n";
        let reader = DatasetReader::new(content.as_bytes());
        assert!(reader.header_ok());

        let rows: Vec<_> = reader.collect();
        assert_eq!(rows.len(), 2);

        let a = rows[0].as_ref().unwrap();
        assert_eq!(a.title, "a");
        assert_eq!(a.image.as_deref(), Some("https://img/a.jpg"));

        let b = rows[1].as_ref().unwrap();
        assert_eq!(b.image, None);
        assert_eq!(b.publish_date, "2022.07.02");
    }

    #[test]
    fn short_and_long_rows_are_reported() {
        let content = "title|description|image|url|date\n\
                       missing|one|field|here\n\
                       ok|d|None|https://ok|2022\n\
                       too|many|fields|in|this|row\n";
        let rows: Vec<_> = DatasetReader::new(content.as_bytes()).collect();

        assert_eq!(rows[0], Err(MalformedRow::FieldCount { line: 2, found: 4 }));
        assert!(rows[1].is_ok());
        assert_eq!(rows[2], Err(MalformedRow::FieldCount { line: 4, found: 6 }));
    }

    #[test]
    fn invalid_utf8_row_is_isolated() {
        let mut content = b"title|description|image|url|date\n".to_vec();
        content.extend_from_slice(b"bad|\xff\xfe|None|u|d\n");
        content.extend_from_slice(b"good|d|None|u|d\n");

        let rows: Vec<_> = DatasetReader::new(&content).collect();
        assert_eq!(rows[0], Err(MalformedRow::Encoding { line: 2 }));
        assert_eq!(rows[1].as_ref().unwrap().title, "good");
    }

    #[test]
    fn crlf_and_blank_lines() {
        let content = "title|description|image|url|date\r\n\r\nx|y||https://x|2022\r\n\n";
        let reader = DatasetReader::new(content.as_bytes());
        assert!(reader.header_ok());

        let rows: Vec<_> = reader.collect();
        assert_eq!(rows.len(), 1);
        let x = rows[0].as_ref().unwrap();
        assert_eq!(x.image, None);
        assert_eq!(x.publish_date, "2022");
    }

    #[test]
    fn unexpected_header_is_still_skipped() {
        let content = "a|b|c|d|e\nx|y|None|u|d\n";
        let reader = DatasetReader::new(content.as_bytes());
        assert!(!reader.header_ok());
        assert_eq!(reader.count(), 1);
    }

    #[test]
    fn empty_file_yields_nothing() {
        let reader = DatasetReader::new(b"");
        assert!(!reader.header_ok());
        assert_eq!(reader.count(), 0);
    }
}

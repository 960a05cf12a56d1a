use crate::domain::model::RawRow;
use crate::utils::error::{ImportError, Result};
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use std::collections::HashMap;
use std::io::Read;

pub const REQUIRED_COLUMNS: [&str; 3] = ["name", "email", "age"];

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Streams data rows out of a CSV source whose header names `name`, `email` and `age`.
///
/// The header is checked in [`CsvStreamParser::new`], so a bad header fails the
/// call before a single row is produced. Rows are then read lazily, one record per
/// `next()`. Short rows read missing trailing fields as empty strings and columns
/// beyond the header are dropped.
pub struct CsvStreamParser<R: Read> {
    records: StringRecordsIntoIter<R>,
    headers: Vec<String>,
    next_row: usize,
}

impl<R: Read> CsvStreamParser<R> {
    pub fn new(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = match csv_reader.headers() {
            Ok(record) => record
                .iter()
                .enumerate()
                .map(|(index, name)| normalize_header(index, name))
                .collect(),
            Err(e) if e.is_io_error() => return Err(ImportError::CsvError(e)),
            Err(e) => {
                return Err(ImportError::HeaderError {
                    found: format!("unreadable header ({})", e),
                })
            }
        };

        let has_all = REQUIRED_COLUMNS
            .iter()
            .all(|required| headers.iter().any(|h| h == required));
        if !has_all {
            tracing::debug!("Rejected CSV header: {:?}", headers);
            return Err(ImportError::HeaderError {
                found: headers.join(","),
            });
        }

        Ok(Self {
            records: csv_reader.into_records(),
            headers,
            next_row: 2,
        })
    }

    fn to_row(&self, number: usize, record: &StringRecord) -> RawRow {
        let mut fields = HashMap::with_capacity(self.headers.len());
        for (index, header) in self.headers.iter().enumerate() {
            let value = record.get(index).unwrap_or("");
            fields.insert(header.clone(), value.to_string());
        }
        RawRow { number, fields }
    }
}

impl<R: Read> Iterator for CsvStreamParser<R> {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        let number = self.next_row;
        self.next_row += 1;

        Some(match record {
            Ok(record) => Ok(self.to_row(number, &record)),
            Err(e) => Err(ImportError::StreamError {
                row: number,
                message: e.to_string(),
            }),
        })
    }
}

fn normalize_header(index: usize, name: &str) -> String {
    let name = if index == 0 {
        name.trim_start_matches(BYTE_ORDER_MARK)
    } else {
        name
    };
    name.trim().to_lowercase()
}

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use tracing::debug;

use crate::constants::{ADDRESS_COLUMN, COUNTRY_COLUMN, DELIMITER, UTM_ZONE_COLUMN};
use crate::error::{GeoError, Result};

/// What to do with a row that has fewer fields than the header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortRowPolicy {
    /// Fail the whole read with `MalformedRow`
    #[default]
    Reject,
    /// Fill missing trailing columns with empty strings
    Pad,
}

/// Ordered, lower-cased column names from the header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    columns: Vec<String>,
}

impl Header {
    pub fn parse(raw: &StringRecord) -> Result<Self> {
        let mut columns: Vec<String> = Vec::with_capacity(raw.len());
        for name in raw.iter() {
            let name = clean_field(name).to_lowercase();
            if columns.contains(&name) {
                return Err(GeoError::DuplicateColumn(name));
            }
            columns.push(name);
        }

        for required in [ADDRESS_COLUMN, COUNTRY_COLUMN] {
            if !columns.iter().any(|c| c == required) {
                return Err(GeoError::MissingColumn(required));
            }
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_zone_override(&self) -> bool {
        self.index_of(UTM_ZONE_COLUMN).is_some()
    }

    /// Columns copied to the output, in header order, without `utm_zone`
    pub fn output_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|c| *c != UTM_ZONE_COLUMN)
    }
}

/// One input row.
///
/// Values are matched to columns by position at read time; `address` and
/// `country` are lifted out so the pipeline never looks them up by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    ordinal: usize,
    address: String,
    country: String,
    fields: Vec<(String, String)>,
}

impl Record {
    fn from_values(ordinal: usize, header: &Header, values: Vec<String>) -> Self {
        let fields: Vec<(String, String)> =
            header.columns.iter().cloned().zip(values).collect();
        let lookup = |name: &str| {
            fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        Self {
            ordinal,
            address: lookup(ADDRESS_COLUMN),
            country: lookup(COUNTRY_COLUMN),
            fields,
        }
    }

    /// 1-based position: input line number minus the header line
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }

    /// Forced projection zone, when the column exists and is non-empty
    pub fn utm_zone(&self) -> Option<&str> {
        self.get(UTM_ZONE_COLUMN).filter(|z| !z.is_empty())
    }
}

/// All input rows, fully read before any request is made
#[derive(Debug, Clone)]
pub struct RecordStore {
    header: Header,
    records: BTreeMap<usize, Record>,
}

impl RecordStore {
    pub fn open(path: &Path, policy: ShortRowPolicy) -> Result<Self> {
        if !path.exists() {
            return Err(GeoError::InputNotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        Self::from_reader(file, policy)
    }

    pub fn from_reader<R: Read>(reader: R, policy: ShortRowPolicy) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = reader.records();
        let header = match rows.next() {
            Some(raw) => Header::parse(&raw?)?,
            None => return Err(GeoError::EmptyInput),
        };

        let mut records = BTreeMap::new();
        for raw in rows {
            let raw = raw?;
            let line = raw.position().map(|p| p.line()).unwrap_or(0);
            let values = Self::fit_to_header(&header, &raw, line, policy)?;
            let ordinal = line.saturating_sub(1) as usize;
            records.insert(ordinal, Record::from_values(ordinal, &header, values));
        }

        debug!(
            "Read {} records with columns [{}]",
            records.len(),
            header.columns.join(", ")
        );
        Ok(Self { header, records })
    }

    fn fit_to_header(
        header: &Header,
        raw: &StringRecord,
        line: u64,
        policy: ShortRowPolicy,
    ) -> Result<Vec<String>> {
        let mut values: Vec<String> = raw.iter().map(clean_field).collect();
        let malformed = GeoError::MalformedRow {
            line,
            expected: header.len(),
            found: values.len(),
        };

        if values.len() > header.len() {
            return Err(malformed);
        }
        if values.len() < header.len() {
            match policy {
                ShortRowPolicy::Reject => return Err(malformed),
                ShortRowPolicy::Pad => values.resize(header.len(), String::new()),
            }
        }
        Ok(values)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn get(&self, ordinal: usize) -> Option<&Record> {
        self.records.get(&ordinal)
    }

    /// Records in ascending ordinal order
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Trims a field as read by the CSV reader.
///
/// The reader only honours a quote that opens the field, so ` "NO"` arrives
/// with its quotes intact; those are removed here. A field the reader already
/// unquoted is only trimmed, keeping literal quotes such as `"""Q"""` → `"Q"`.
fn clean_field(raw: &str) -> String {
    let trimmed = raw.trim();
    let leading_space = raw.len() != raw.trim_start().len();
    if leading_space && trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

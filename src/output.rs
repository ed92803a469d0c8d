use std::io::Write;

use csv::{QuoteStyle, WriterBuilder};

use crate::constants::{appended_columns, DELIMITER};
use crate::error::Result;
use crate::projection::ProjectedCoordinate;
use crate::storage::{Header, Record};

/// Writes output rows as they are produced.
///
/// The header line is written bare. Row values go through a CSV writer with
/// `QuoteStyle::NonNumeric`: text (including the zone designator) is always
/// double-quoted with embedded quotes doubled, numbers are left bare. A value
/// containing the delimiter therefore never appears unquoted.
pub struct OutputWriter<W: Write> {
    writer: csv::Writer<W>,
    columns: Vec<String>,
    rows_written: usize,
}

impl<W: Write> OutputWriter<W> {
    pub fn new(mut sink: W, header: &Header) -> Result<Self> {
        let columns: Vec<String> = header.output_columns().map(str::to_string).collect();

        let delimiter = char::from(DELIMITER).to_string();
        let header_line = columns
            .iter()
            .map(|c| c.to_uppercase())
            .chain(appended_columns().iter().map(|c| c.to_string()))
            .collect::<Vec<_>>()
            .join(delimiter.as_str());
        writeln!(sink, "{header_line}")?;
        sink.flush()?;

        let writer = WriterBuilder::new()
            .delimiter(DELIMITER)
            .quote_style(QuoteStyle::NonNumeric)
            .has_headers(false)
            .from_writer(sink);

        Ok(Self {
            writer,
            columns,
            rows_written: 0,
        })
    }

    /// Writes pass-through values followed by easting, northing and zone,
    /// flushing immediately so a later failure keeps earlier rows.
    pub fn write_row(&mut self, record: &Record, coord: &ProjectedCoordinate) -> Result<()> {
        let mut row: Vec<String> = self
            .columns
            .iter()
            .map(|c| record.get(c).unwrap_or_default().to_string())
            .collect();
        row.push(coord.easting.to_string());
        row.push(coord.northing.to_string());
        row.push(coord.zone.to_string());

        self.writer.write_record(&row)?;
        self.writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::GeoError::Io(e.into_error()))
    }
}

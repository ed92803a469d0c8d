use std::io::Write;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::apis::request::RequestBuilder;
use crate::classifier::{classify, Decision};
use crate::error::{GeoError, Result};
use crate::metrics::GeocodeMetrics;
use crate::output::OutputWriter;
use crate::projection::UtmProjector;
use crate::rate_limiter::{Pacer, Sleeper};
use crate::storage::{Record, RecordStore};
use crate::types::GeocodeApi;

/// Outcome of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub total_records: usize,
    pub requests: u64,
    pub rows_written: usize,
    pub skipped: usize,
    /// Ordinal of the record whose response stopped the batch
    pub halted_at: Option<usize>,
}

impl PipelineSummary {
    pub fn halted(&self) -> bool {
        self.halted_at.is_some()
    }
}

enum Step {
    Written,
    Skipped,
    Halted,
}

/// Sequential geocode-and-project driver
pub struct Pipeline<G: GeocodeApi, S: Sleeper> {
    request_builder: RequestBuilder,
    geocoder: G,
    pacer: Pacer<S>,
    projector: UtmProjector,
}

impl<G: GeocodeApi, S: Sleeper> Pipeline<G, S> {
    pub fn new(request_builder: RequestBuilder, geocoder: G, pacer: Pacer<S>) -> Self {
        Self {
            request_builder,
            geocoder,
            pacer,
            projector: UtmProjector::wgs84(),
        }
    }

    /// Processes every record in ascending ordinal order, writing one row per
    /// resolved record. Stops early, keeping rows already written, when the
    /// service reports its quota is exhausted. Transport and projection
    /// failures abort the run with an error.
    pub fn run<W: Write>(
        &mut self,
        store: &RecordStore,
        output: &mut OutputWriter<W>,
    ) -> Result<PipelineSummary> {
        let mut summary = PipelineSummary {
            total_records: store.len(),
            ..Default::default()
        };
        info!("Geocoding {} records", store.len());

        for record in store.iter() {
            let span = info_span!("record", ordinal = record.ordinal());
            let _enter = span.enter();

            match self.process(record, output)? {
                Step::Written => summary.rows_written += 1,
                Step::Skipped => summary.skipped += 1,
                Step::Halted => {
                    summary.halted_at = Some(record.ordinal());
                    break;
                }
            }
        }

        summary.requests = self.pacer.issued();
        if let Some(ordinal) = summary.halted_at {
            warn!(
                "Stopped at record {} of {}; {} rows written",
                ordinal, summary.total_records, summary.rows_written
            );
        } else {
            info!(
                "Finished: {} rows written, {} skipped",
                summary.rows_written, summary.skipped
            );
        }
        Ok(summary)
    }

    fn process<W: Write>(
        &mut self,
        record: &Record,
        output: &mut OutputWriter<W>,
    ) -> Result<Step> {
        let query = self.request_builder.build(record);
        if self.pacer.before_request() {
            GeocodeMetrics::record_pause();
        }

        let started = Instant::now();
        let response = self.geocoder.geocode(&query)?;
        GeocodeMetrics::record_request(started.elapsed().as_secs_f64());
        GeocodeMetrics::record_outcome(response.status.as_str());

        match classify(&response.status, response.error_message.as_deref(), &query) {
            Decision::Continue => return Ok(Step::Skipped),
            Decision::Stop => return Ok(Step::Halted),
            Decision::Proceed => {}
        }

        if response.results.len() > 1 {
            info!(
                candidates = response.results.len(),
                "Multiple results, using the first"
            );
        }
        let Some(location) = response.first_location() else {
            warn!(
                "Status OK but no results for request {}",
                query.redacted_url()
            );
            return Ok(Step::Skipped);
        };

        let coord = self
            .projector
            .project(location.lat, location.lng, record.utm_zone())
            .map_err(|source| GeoError::Projection {
                ordinal: record.ordinal(),
                source,
            })?;

        output.write_row(record, &coord)?;
        GeocodeMetrics::record_row_written();
        debug!(
            easting = coord.easting,
            northing = coord.northing,
            zone = %coord.zone,
            "Resolved"
        );
        Ok(Step::Written)
    }
}

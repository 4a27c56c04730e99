use crate::assembler::OccupancyResult;
use crate::error::OccupancyError;
use crate::pipeline::OccupancyPipeline;
use crate::store::{LotId, ResultSink, SlotSource};
use common::span;
use inference::InferenceBackend;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::sync::Arc;
use std::time::Instant;

/// A computed result plus the persistence error, if saving it failed.
#[derive(Debug)]
pub struct OccupancyReport {
    pub result: OccupancyResult,
    pub persistence_warning: Option<OccupancyError>,
}

struct Metrics {
    duration: Histogram<f64>,
    frames: Counter<u64>,
    failures: Counter<u64>,
    occupied_slots: Counter<u64>,
}

fn init_metrics(meter_name: &'static str) -> Metrics {
    let meter = global::meter(meter_name);
    let latency_buckets = [
        0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0,
    ];

    Metrics {
        duration: meter
            .f64_histogram("occupancy_duration_seconds")
            .with_description("Time to compute occupancy for one frame (decode + infer + match)")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build(),
        frames: meter
            .u64_counter("occupancy_frames_total")
            .with_description("Total frames processed successfully")
            .build(),
        failures: meter
            .u64_counter("occupancy_failures_total")
            .with_description("Total frames that failed, by error kind")
            .build(),
        occupied_slots: meter
            .u64_counter("occupancy_occupied_slots_total")
            .with_description("Total occupied slots reported")
            .build(),
    }
}

/// Fetches a lot's slots, runs the pipeline and records the outcome.
pub struct OccupancyService<B> {
    pipeline: OccupancyPipeline<B>,
    slots: Arc<dyn SlotSource>,
    sink: Arc<dyn ResultSink>,
    metrics: Metrics,
}

impl<B: InferenceBackend> OccupancyService<B> {
    pub fn new(
        pipeline: OccupancyPipeline<B>,
        slots: Arc<dyn SlotSource>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            pipeline,
            slots,
            sink,
            metrics: init_metrics("occupancy"),
        }
    }

    pub fn pipeline(&self) -> &OccupancyPipeline<B> {
        &self.pipeline
    }

    #[tracing::instrument(skip(self, image_bytes), fields(bytes = image_bytes.len()))]
    pub fn process(
        &self,
        lot_id: LotId,
        image_bytes: &[u8],
        image_path: Option<&str>,
    ) -> Result<OccupancyReport, OccupancyError> {
        let start = Instant::now();
        let lot = KeyValue::new("lot_id", lot_id as i64);

        let outcome = self
            .slots
            .fetch_slots(lot_id)
            .and_then(|slots| self.pipeline.compute_occupancy(image_bytes, &slots));

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                self.metrics
                    .failures
                    .add(1, &[lot, KeyValue::new("kind", e.kind().as_str())]);
                tracing::warn!(lot_id, kind = e.kind().as_str(), error = %e, "Occupancy failed");
                return Err(e);
            }
        };

        let elapsed = start.elapsed().as_secs_f64();
        self.metrics.duration.record(elapsed, &[lot.clone()]);
        self.metrics.frames.add(1, &[lot.clone()]);
        self.metrics
            .occupied_slots
            .add(result.occupied.len() as u64, &[lot]);

        tracing::info!(
            lot_id,
            occupied = result.occupied.len(),
            available = result.available.len(),
            elapsed_ms = elapsed * 1000.0,
            "Occupancy computed"
        );

        let persistence_warning = {
            let _s = span!("persist_result");
            match self.sink.persist_result(lot_id, &result, image_path) {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!(lot_id, error = %e, "Failed to persist detection result");
                    Some(match e {
                        OccupancyError::PersistenceFailure(_) => e,
                        other => OccupancyError::PersistenceFailure(other.to_string()),
                    })
                }
            }
        };

        Ok(OccupancyReport {
            result,
            persistence_warning,
        })
    }
}

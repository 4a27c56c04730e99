use image::{ImageFormat, RgbImage};
use inference::{InferenceBackend, InferenceConfig, InferenceOutput, ModelHandle};
use ndarray::{Array, IxDyn};
use occupancy::store::{DetectionHistory, JsonSlotStore, JsonlHistory, MemoryStore, ResultSink, SlotRegistry};
use occupancy::{
    ErrorKind, LotId, OccupancyError, OccupancyPipeline, OccupancyResult, OccupancyService,
    PipelineConfig,
};
use schema::{ParkingSlot, Rect};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::tempdir;

/// Detector stand-in that replays fixed rows and counts calls.
struct FakeBackend {
    rows: Vec<f32>,
    calls: AtomicUsize,
}

impl FakeBackend {
    fn with_rows(rows: Vec<f32>) -> Self {
        Self {
            rows,
            calls: AtomicUsize::new(0),
        }
    }
}

impl InferenceBackend for FakeBackend {
    fn load_model(_config: &InferenceConfig) -> anyhow::Result<Self> {
        Ok(Self::with_rows(Vec::new()))
    }

    fn infer(&self, images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::ensure!(images.shape() == [1, 3, 640, 640], "unexpected input shape");
        Ok(InferenceOutput::from_flat(self.rows.clone()))
    }
}

/// Detector stand-in whose session always errors.
struct BrokenBackend;

impl InferenceBackend for BrokenBackend {
    fn load_model(_config: &InferenceConfig) -> anyhow::Result<Self> {
        Ok(Self)
    }

    fn infer(&self, _images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput> {
        anyhow::bail!("session run failed")
    }
}

struct FailingSink;

impl ResultSink for FailingSink {
    fn persist_result(
        &self,
        _lot_id: LotId,
        _result: &OccupancyResult,
        _image_path: Option<&str>,
    ) -> Result<(), OccupancyError> {
        Err(OccupancyError::Storage("database is down".to_string()))
    }
}

fn two_slot_lot() -> Vec<ParkingSlot> {
    vec![
        ParkingSlot::new("1", Rect::new(0.0, 0.0, 10.0, 10.0)),
        ParkingSlot::new("2", Rect::new(20.0, 20.0, 30.0, 30.0)),
    ]
}

/// One vehicle over slot "1": (1,1,9,9), confidence 0.9, class 0.
fn one_vehicle() -> Vec<f32> {
    vec![1.0, 1.0, 9.0, 9.0, 0.9, 0.0]
}

fn png_frame(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbImage::new(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn pipeline_config() -> PipelineConfig {
    PipelineConfig::from(&InferenceConfig::test_default())
}

fn pipeline_with<B: InferenceBackend>(backend: B) -> OccupancyPipeline<B> {
    OccupancyPipeline::new(Arc::new(ModelHandle::ready(backend)), pipeline_config())
}

#[test]
fn test_vehicle_over_first_slot() {
    let pipeline = pipeline_with(FakeBackend::with_rows(one_vehicle()));

    let result = pipeline
        .compute_occupancy(&png_frame(640, 640), &two_slot_lot())
        .unwrap();

    assert_eq!(result.occupied, vec!["1"]);
    assert_eq!(result.available, vec!["2"]);
    assert_eq!(result.total, 2);
}

#[test]
fn test_low_confidence_and_other_classes_leave_lot_free() {
    let rows = vec![
        1.0, 1.0, 9.0, 9.0, 0.24, 0.0, // below threshold
        21.0, 21.0, 29.0, 29.0, 0.9, 2.0, // not a vehicle
    ];
    let pipeline = pipeline_with(FakeBackend::with_rows(rows));

    let result = pipeline
        .compute_occupancy(&png_frame(640, 640), &two_slot_lot())
        .unwrap();

    assert!(result.occupied.is_empty());
    assert_eq!(result.available, vec!["1", "2"]);
}

#[test]
fn test_empty_slot_list_skips_the_model() {
    let backend = FakeBackend::with_rows(one_vehicle());
    let model = Arc::new(ModelHandle::ready(backend));
    let pipeline = OccupancyPipeline::new(Arc::clone(&model), pipeline_config());

    let err = pipeline.compute_occupancy(&png_frame(640, 640), &[]).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoSlotsConfigured);
    assert_eq!(model.backend().unwrap().calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_model_not_ready_or_failed_is_unavailable() {
    let loading = OccupancyPipeline::new(
        Arc::new(ModelHandle::<FakeBackend>::loading()),
        pipeline_config(),
    );
    let failed = OccupancyPipeline::new(
        Arc::new(ModelHandle::<FakeBackend>::failed("best.onnx: no such file")),
        pipeline_config(),
    );

    for pipeline in [loading, failed] {
        let err = pipeline
            .compute_occupancy(&png_frame(640, 640), &two_slot_lot())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
    }
}

#[test]
fn test_backend_error_is_inference_failed() {
    let pipeline = pipeline_with(BrokenBackend);
    let err = pipeline
        .compute_occupancy(&png_frame(640, 640), &two_slot_lot())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InferenceFailed);
    assert!(err.to_string().contains("session run failed"));
}

#[test]
fn test_ragged_model_output_is_malformed() {
    let pipeline = pipeline_with(FakeBackend::with_rows(vec![1.0; 7]));
    let err = pipeline
        .compute_occupancy(&png_frame(640, 640), &two_slot_lot())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedOutput);
}

#[test]
fn test_non_square_frame_maps_detections_back() {
    // 1280x720 frame: scale 0.5, 140 px bars. Slot "A" is (200,100)-(600,400)
    // in the frame, i.e. (100,190)-(300,340) in model space.
    let slots = vec![
        ParkingSlot::new("A", Rect::new(200.0, 100.0, 600.0, 400.0)),
        ParkingSlot::new("B", Rect::new(800.0, 100.0, 1200.0, 400.0)),
    ];
    let rows = vec![110.0, 200.0, 290.0, 330.0, 0.7, 0.0];
    let pipeline = pipeline_with(FakeBackend::with_rows(rows));

    let result = pipeline
        .compute_occupancy(&png_frame(1280, 720), &slots)
        .unwrap();

    assert_eq!(result.occupied, vec!["A"]);
    assert_eq!(result.available, vec!["B"]);
}

#[test]
fn test_service_persists_each_result() {
    let store = Arc::new(MemoryStore::with_slots(1, two_slot_lot()));
    let service = OccupancyService::new(
        pipeline_with(FakeBackend::with_rows(one_vehicle())),
        store.clone(),
        store.clone(),
    );

    let report = service
        .process(1, &png_frame(640, 640), Some("uploads/frame.png"))
        .unwrap();

    assert!(report.persistence_warning.is_none());
    assert_eq!(report.result.occupied, vec!["1"]);

    let latest = store.latest_result(1).unwrap().unwrap();
    assert_eq!(latest.occupied, vec!["1"]);
    assert_eq!(latest.available, vec!["2"]);
    assert_eq!(latest.total_occupied, 1);
    assert_eq!(latest.image_path.as_deref(), Some("uploads/frame.png"));
}

#[test]
fn test_persistence_failure_keeps_the_result() {
    let store = Arc::new(MemoryStore::with_slots(1, two_slot_lot()));
    let service = OccupancyService::new(
        pipeline_with(FakeBackend::with_rows(one_vehicle())),
        store,
        Arc::new(FailingSink),
    );

    let report = service.process(1, &png_frame(640, 640), None).unwrap();

    assert_eq!(report.result.occupied, vec!["1"]);
    let warning = report.persistence_warning.expect("warning expected");
    assert_eq!(warning.kind(), ErrorKind::PersistenceFailure);
    assert!(warning.to_string().contains("database is down"));
}

#[test]
fn test_service_unknown_lot_has_no_slots() {
    let store = Arc::new(MemoryStore::with_slots(1, two_slot_lot()));
    let service = OccupancyService::new(
        pipeline_with(FakeBackend::with_rows(one_vehicle())),
        store.clone(),
        store.clone(),
    );

    let err = service.process(2, &png_frame(640, 640), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoSlotsConfigured);
    assert!(store.records().is_empty());
}

#[test]
fn test_file_backed_stores_end_to_end() {
    let dir = tempdir().unwrap();
    let slots = Arc::new(JsonSlotStore::new(dir.path().join("slots.json")));
    let history = Arc::new(JsonlHistory::new(dir.path().join("history.jsonl")));
    slots.register_slots(4, &two_slot_lot()).unwrap();

    let service = OccupancyService::new(
        pipeline_with(FakeBackend::with_rows(one_vehicle())),
        slots.clone(),
        history.clone(),
    );
    service.process(4, &png_frame(640, 640), Some("lot4.png")).unwrap();

    let latest = history.latest_result(4).unwrap().unwrap();
    assert_eq!(latest.lot_id, 4);
    assert_eq!(latest.occupied, vec!["1"]);

    slots.delete_slots(4).unwrap();
    let err = service.process(4, &png_frame(640, 640), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoSlotsConfigured);
}

#[test]
fn test_pipeline_is_shareable_across_threads() {
    let pipeline = Arc::new(pipeline_with(FakeBackend::with_rows(one_vehicle())));
    let frame = png_frame(640, 640);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            let frame = frame.clone();
            std::thread::spawn(move || pipeline.compute_occupancy(&frame, &two_slot_lot()))
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap().unwrap();
        assert_eq!(result.occupied, vec!["1"]);
    }
    assert_eq!(pipeline.model().backend().unwrap().calls.load(Ordering::SeqCst), 4);
}

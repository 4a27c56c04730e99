use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use occupancy::{OccupancyMatcher, assemble};
use schema::{Detection, ParkingSlot, Rect};

/// A grid of `rows`×`cols` slots, 40×80 px each with a 5 px aisle.
fn create_lot(rows: usize, cols: usize) -> Vec<ParkingSlot> {
    let mut slots = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let x = c as f32 * 45.0;
            let y = r as f32 * 85.0;
            slots.push(ParkingSlot::new(
                (r * cols + c + 1).to_string(),
                Rect::new(x, y, x + 40.0, y + 80.0),
            ));
        }
    }
    slots
}

/// Park a car in every other slot, slightly offset.
fn create_detections(slots: &[ParkingSlot]) -> Vec<Detection> {
    slots
        .iter()
        .step_by(2)
        .map(|s| {
            let r = s.rect;
            Detection::vehicle(Rect::new(r.x1 + 3.0, r.y1 + 5.0, r.x2 + 3.0, r.y2 - 5.0), 0.8)
        })
        .collect()
}

fn benchmark_matcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("occupancy_matcher");
    let matcher = OccupancyMatcher::default();

    for (rows, cols) in [(2, 10), (5, 20), (10, 40)] {
        let slots = create_lot(rows, cols);
        let detections = create_detections(&slots);

        group.bench_with_input(
            BenchmarkId::new("match_and_assemble", slots.len()),
            &(slots, detections),
            |b, (slots, detections)| {
                b.iter(|| {
                    let occupied = matcher.occupied_labels(black_box(slots), black_box(detections));
                    assemble(slots.iter().map(|s| s.label.as_str()), &occupied)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_matcher);

criterion_main!(benches);

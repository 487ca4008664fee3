//! Pipeline benchmark: records → windows → count matrix → subspace scores.

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use loglens::{
    config::DetectorConfig, EventCountMatrix, LogRecord, SubspaceDetector, Windower,
};

fn make_records(n_windows: usize, per_window: usize) -> Vec<LogRecord> {
    let mut records = Vec::with_capacity(n_windows * per_window);
    for w in 0..n_windows {
        let ts = Utc.timestamp_opt(w as i64 * 300, 0).unwrap();
        for i in 0..per_window {
            // Deterministic template mix, 40 distinct templates.
            let template = format!("E{:02}", (w * 7 + i * 13) % 40);
            records.push(LogRecord::new(ts, template));
        }
    }
    records
}

fn bench_windowing(c: &mut Criterion) {
    let windower = Windower::new(Duration::minutes(5)).unwrap();
    let records = make_records(500, 50);

    c.bench_function("window_25k_records", |b| {
        b.iter(|| {
            let input = black_box(records.clone());
            black_box(windower.fixed_time_window(input).unwrap())
        })
    });
}

fn bench_count_matrix(c: &mut Criterion) {
    let windower = Windower::new(Duration::minutes(5)).unwrap();
    let windows = windower.fixed_time_window(make_records(500, 50)).unwrap();

    c.bench_function("count_matrix_500_windows", |b| {
        b.iter(|| black_box(EventCountMatrix::from_windows(black_box(&windows)).unwrap()))
    });
}

fn bench_subspace_scoring(c: &mut Criterion) {
    let windower = Windower::new(Duration::minutes(5)).unwrap();
    let windows = windower.fixed_time_window(make_records(500, 50)).unwrap();
    let matrix = EventCountMatrix::from_windows(&windows).unwrap();
    let detector =
        SubspaceDetector::new(DetectorConfig::new(0.9, 0.01).unwrap()).unwrap();

    c.bench_function("score_500x40_matrix", |b| {
        b.iter(|| black_box(detector.score(black_box(matrix.clone())).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_windowing,
    bench_count_matrix,
    bench_subspace_scoring
);
criterion_main!(benches);

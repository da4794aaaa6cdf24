//! Worker batch tests against reference files on disk.

use std::path::Path;

use spotscan_media::{DistanceKind, MediaError};
use spotscan_worker::{ScanContext, ScanExecutor, ScanMode, WorkerConfig, WorkerError};
use tempfile::TempDir;

async fn write_references(dir: &Path) {
    tokio::fs::create_dir_all(dir).await.unwrap();
    tokio::fs::write(dir.join("jingle.txt"), "0.00 0 0\n0.04 5 0\n0.08 10 0\n0.12 15 0\n")
        .await
        .unwrap();
    tokio::fs::write(dir.join("promo.txt"), "0.00 0 50\n0.04 0 55\n0.08 0 60\n")
        .await
        .unwrap();
}

fn config(root: &Path) -> WorkerConfig {
    let mut config = WorkerConfig {
        reference_dir: root.join("refs"),
        neighbor_dir: root.join("cercanos"),
        result_log: root.join("comerciales.txt"),
        progress_every: 2,
        ..WorkerConfig::default()
    };
    config.matcher.k = 3;
    config.matcher.distance = DistanceKind::L2;
    config
}

#[tokio::test]
async fn test_scan_then_replay_from_disk() {
    let dir = TempDir::new().unwrap();
    write_references(&dir.path().join("refs")).await;

    // promo, a gap, then jingle
    let broadcast = dir.path().join("canal13.txt");
    tokio::fs::write(
        &broadcast,
        "10.0 0 50\n10.5 0 55\n11.0 0 60\n11.5 200 200\n12.0 0 0\n12.5 5 0\n13.0 10 0\n13.5 15 0\n",
    )
    .await
    .unwrap();

    let ctx = ScanContext::new(config(dir.path())).await.unwrap();
    assert_eq!(ctx.library().len(), 2);
    let executor = ScanExecutor::new(ctx);

    let scanned = executor
        .run(vec![broadcast], ScanMode::Broadcast)
        .await
        .unwrap();
    assert!(scanned.is_success());
    let outcome = &scanned.succeeded[0];
    let found: Vec<(&str, f64, f64)> = outcome
        .detections
        .iter()
        .map(|e| (e.reference.as_str(), e.start, e.duration))
        .collect();
    assert_eq!(found, vec![("promo", 10.0, 1.0), ("jingle", 12.0, 1.5)]);

    let log = dir.path().join("cercanos").join("canal13.txt");
    let replayed = executor.run(vec![log], ScanMode::Replay).await.unwrap();
    assert_eq!(replayed.succeeded[0].detections, outcome.detections);

    let results = tokio::fs::read_to_string(dir.path().join("comerciales.txt"))
        .await
        .unwrap();
    assert_eq!(
        results,
        "canal13\t10.0\t1.0\tpromo\ncanal13\t12.0\t1.5\tjingle\n\
         canal13\t10.0\t1.0\tpromo\ncanal13\t12.0\t1.5\tjingle\n"
    );
}

#[tokio::test]
async fn test_missing_reference_dir_fails_context() {
    let dir = TempDir::new().unwrap();
    let err = ScanContext::new(config(dir.path())).await.err().unwrap();
    assert!(matches!(err, WorkerError::Media(MediaError::FileNotFound(_))));
}

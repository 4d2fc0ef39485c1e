//! Phase machine and ticker behaviour of the download progress controller.

use std::time::Duration;

use ambatudonlod::{
    DownloadProgressController, ESTIMATE_CEILING, ESTIMATE_INTERVAL, Error, Phase, Severity,
};
use tokio::time::timeout;

#[tokio::test(start_paused = true)]
async fn percent_never_decreases_through_a_download() {
    let mut p = DownloadProgressController::seeded(11);
    p.begin_estimation();
    let mut seen = vec![p.percent()];

    for _ in 0..20 {
        p.next_simulated_tick().await;
        p.on_simulated_tick();
        seen.push(p.percent());
    }
    assert!(seen.iter().all(|&v| v < ESTIMATE_CEILING));

    for loaded in (0..=1000).step_by(50) {
        p.on_transfer_progress(loaded, 1000);
        seen.push(p.percent());
        assert!((30..=99).contains(&p.percent()));
    }
    p.complete();
    seen.push(p.percent());

    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
    assert_eq!(*seen.last().unwrap(), 100);
}

#[tokio::test(start_paused = true)]
async fn ticker_fires_on_the_estimate_interval() {
    let mut p = DownloadProgressController::seeded(5);
    p.begin_estimation();
    let start = tokio::time::Instant::now();
    p.next_simulated_tick().await;
    assert!(start.elapsed() >= ESTIMATE_INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn first_sample_cancels_the_ticker() {
    let mut p = DownloadProgressController::seeded(5);
    p.begin_estimation();
    assert!(p.is_ticking());

    p.on_transfer_progress(1, 100);
    assert_eq!(p.phase(), Phase::Transferring);
    assert!(!p.is_ticking());

    let waited = timeout(Duration::from_secs(5), p.next_simulated_tick()).await;
    assert!(waited.is_err(), "ticker still live after first sample");
}

#[tokio::test(start_paused = true)]
async fn fail_releases_the_ticker_and_freezes_percent() {
    let mut p = DownloadProgressController::seeded(5);
    p.begin_estimation();
    p.next_simulated_tick().await;
    p.on_simulated_tick();

    let msg = p.fail(&Error::NetworkUnreachable("refused".into()));
    assert_eq!(msg.severity, Severity::Error);
    assert_eq!(
        msg.text,
        "Cannot connect to server. Make sure the API server is running."
    );
    assert!(!p.is_ticking());
    assert!(timeout(Duration::from_secs(5), p.next_simulated_tick()).await.is_err());

    for _ in 0..10 {
        p.on_simulated_tick();
        p.on_transfer_progress(80, 100);
    }
    assert_eq!(p.percent(), 0);
    assert_eq!(p.phase(), Phase::Failed);
}

#[tokio::test]
async fn complete_from_estimating_jumps_to_100() {
    let mut p = DownloadProgressController::seeded(5);
    p.begin_estimation();
    p.complete();
    assert_eq!(p.percent(), 100);
    assert_eq!(p.phase(), Phase::Complete);
    assert!(!p.is_ticking());
}

#[tokio::test]
async fn reset_returns_to_idle() {
    let mut p = DownloadProgressController::seeded(5);
    p.begin_estimation();
    p.on_transfer_progress(70, 100);
    p.reset();
    let snap = p.snapshot();
    assert_eq!(snap.phase, Phase::Idle);
    assert_eq!(snap.percent, 0);
    assert!(snap.message.is_empty());
    assert!(!p.is_ticking());
}

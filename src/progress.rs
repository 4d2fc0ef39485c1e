//! Phased download progress.
//!
//! The server sends no byte counts until conversion is done, so the bar first
//! creeps through `[1, 30)` on a simulated ticker and then maps the real
//! transfer onto `[30, 99]`. 100 is reserved for [`DownloadProgressController::complete`].
//!
//! The ticker is a tokio [`Interval`], so the controller must be created and
//! driven inside a tokio runtime.

use std::time::Duration;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::types::{Error, UserMessage};

/// Period of the simulated ticker.
pub const ESTIMATE_INTERVAL: Duration = Duration::from_millis(300);
/// Simulated progress stays strictly below this.
pub const ESTIMATE_CEILING: u8 = 30;
/// Highest percentage a measured transfer can show.
pub const TRANSFER_CEILING: u8 = 99;
/// How long Complete/Failed stay on screen before returning to Idle.
pub const RESET_DELAY: Duration = Duration::from_secs(2);

const MAX_ESTIMATE_STEP: f64 = 5.0;

/// Lifecycle stage of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Estimating,
    Transferring,
    Finalizing,
    Complete,
    Failed,
}

impl Phase {
    /// Whether a submission is in flight.
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Estimating | Phase::Transferring | Phase::Finalizing)
    }
}

/// What a view renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub phase: Phase,
    pub percent: u8,
    pub message: String,
    pub bytes_transferred: u64,
    pub bytes_total: u64,
}

pub struct DownloadProgressController {
    phase: Phase,
    percent: u8,
    message: String,
    bytes_transferred: u64,
    bytes_total: u64,
    ticker: Option<Interval>,
    finished_at: Option<Instant>,
    rng: StdRng,
}

impl Default for DownloadProgressController {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadProgressController {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic simulated increments.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            phase: Phase::Idle,
            percent: 0,
            message: String::new(),
            bytes_transferred: 0,
            bytes_total: 0,
            ticker: None,
            finished_at: None,
            rng,
        }
    }

    /// Idle → Estimating; starts the simulated ticker.
    pub fn begin_estimation(&mut self) {
        self.cancel_estimation();
        self.phase = Phase::Estimating;
        self.percent = 1;
        self.message = "Processing".to_owned();
        self.bytes_transferred = 0;
        self.bytes_total = 0;
        self.finished_at = None;

        let mut ticker =
            tokio::time::interval_at(Instant::now() + ESTIMATE_INTERVAL, ESTIMATE_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
        debug!("progress: estimating");
    }

    /// Stop the simulated ticker. Safe to call any number of times.
    pub fn cancel_estimation(&mut self) -> bool {
        self.ticker.take().is_some()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    /// Resolve at the next simulated tick; pending forever when not ticking.
    pub async fn next_simulated_tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Apply one random simulated step.
    pub fn on_simulated_tick(&mut self) -> u8 {
        let step = self.rng.random_range(0.0..MAX_ESTIMATE_STEP);
        self.estimate_step(step)
    }

    /// Apply a simulated step of `step` percent (clamped to `[0, 5)`).
    ///
    /// Ignored outside Estimating, so a tick that raced the first real sample
    /// cannot move the bar.
    pub fn estimate_step(&mut self, step: f64) -> u8 {
        if self.phase != Phase::Estimating || self.percent >= ESTIMATE_CEILING {
            return self.percent;
        }
        let step = step.clamp(0.0, MAX_ESTIMATE_STEP - f64::EPSILON);
        let next = (f64::from(self.percent) + step).floor() as u8;
        self.percent = next.clamp(self.percent, ESTIMATE_CEILING - 1);
        self.percent
    }

    /// Report a real byte-progress sample. `total == 0` means unknown.
    pub fn on_transfer_progress(&mut self, loaded: u64, total: u64) {
        if !self.phase.is_active() {
            debug!("progress: sample ignored in {:?}", self.phase);
            return;
        }
        self.bytes_transferred = loaded;
        self.bytes_total = total;
        if total == 0 {
            return;
        }

        if self.cancel_estimation() {
            debug!("progress: first sample, simulated ticker cancelled");
        }

        let download_percent = rounded_percent(loaded, total).min(100);
        let mapped = (30 + download_percent * 69 / 100).min(u64::from(TRANSFER_CEILING)) as u8;
        self.percent = self.percent.max(mapped);

        // Exactly half still reads "Downloading".
        if download_percent <= 50 && self.phase != Phase::Finalizing {
            self.phase = Phase::Transferring;
            self.message = "Downloading".to_owned();
        } else {
            self.phase = Phase::Finalizing;
            self.message = "Finalizing".to_owned();
        }
    }

    /// Confirmed success.
    pub fn complete(&mut self) {
        self.cancel_estimation();
        self.phase = Phase::Complete;
        self.percent = 100;
        self.message = "Download complete".to_owned();
        self.finished_at = Some(Instant::now());
        debug!("progress: complete");
    }

    /// Failure from any state: counters zeroed, ticker released.
    pub fn fail(&mut self, reason: &Error) -> UserMessage {
        self.cancel_estimation();
        self.phase = Phase::Failed;
        self.percent = 0;
        self.bytes_transferred = 0;
        self.bytes_total = 0;
        self.message.clear();
        self.finished_at = Some(Instant::now());
        warn!("download failed: {reason}");
        reason.user_message()
    }

    /// Back to Idle immediately.
    pub fn reset(&mut self) {
        self.cancel_estimation();
        self.phase = Phase::Idle;
        self.percent = 0;
        self.message.clear();
        self.bytes_transferred = 0;
        self.bytes_total = 0;
        self.finished_at = None;
    }

    /// Keep a Complete/Failed state on screen for [`RESET_DELAY`], then reset.
    pub async fn linger(&mut self) {
        if let Some(at) = self.finished_at {
            tokio::time::sleep_until(at + RESET_DELAY).await;
        }
        self.reset();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            phase: self.phase,
            percent: self.percent,
            message: self.message.clone(),
            bytes_transferred: self.bytes_transferred,
            bytes_total: self.bytes_total,
        }
    }
}

/// `round(loaded * 100 / total)`, half rounding up.
fn rounded_percent(loaded: u64, total: u64) -> u64 {
    let num = u128::from(loaded) * 200 + u128::from(total);
    let den = u128::from(total) * 2;
    u64::try_from(num / den).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn half_transferred_maps_to_64() {
        let mut p = DownloadProgressController::seeded(1);
        p.begin_estimation();
        p.on_transfer_progress(50, 100);
        assert_eq!(p.percent(), 64);
        assert_eq!(p.phase(), Phase::Transferring);
        assert_eq!(p.message(), "Downloading");
        assert!(!p.is_ticking());
    }

    #[tokio::test]
    async fn finalizing_starts_above_half() {
        for (loaded, phase, percent) in [
            (49, Phase::Transferring, 63),
            (50, Phase::Transferring, 64),
            (51, Phase::Finalizing, 65),
        ] {
            let mut p = DownloadProgressController::seeded(1);
            p.begin_estimation();
            p.on_transfer_progress(loaded, 100);
            assert_eq!(p.phase(), phase, "loaded={loaded}");
            assert_eq!(p.percent(), percent, "loaded={loaded}");
        }
    }

    #[tokio::test]
    async fn finalizing_is_sticky() {
        let mut p = DownloadProgressController::seeded(1);
        p.begin_estimation();
        p.on_transfer_progress(60, 100);
        assert_eq!(p.phase(), Phase::Finalizing);
        p.on_transfer_progress(40, 100);
        assert_eq!(p.phase(), Phase::Finalizing);
        assert_eq!(p.message(), "Finalizing");
        assert_eq!(p.percent(), 71);
    }

    #[tokio::test]
    async fn oversized_sample_is_held_at_99() {
        let mut p = DownloadProgressController::seeded(1);
        p.begin_estimation();
        p.on_transfer_progress(u64::MAX, 1);
        assert_eq!(p.percent(), 99);
        assert_eq!(p.phase(), Phase::Finalizing);
    }

    #[tokio::test]
    async fn ninety_percent_is_finalizing() {
        let mut p = DownloadProgressController::seeded(1);
        p.begin_estimation();
        p.on_transfer_progress(90, 100);
        assert_eq!(p.percent(), 92);
        assert_eq!(p.phase(), Phase::Finalizing);
        assert_eq!(p.message(), "Finalizing");
    }

    #[tokio::test]
    async fn full_transfer_is_held_at_99() {
        let mut p = DownloadProgressController::seeded(1);
        p.begin_estimation();
        p.on_transfer_progress(100, 100);
        assert_eq!(p.percent(), 99);
        p.on_transfer_progress(150, 100);
        assert_eq!(p.percent(), 99);
        p.complete();
        assert_eq!(p.percent(), 100);
    }

    #[tokio::test]
    async fn estimation_stays_below_thirty() {
        let mut p = DownloadProgressController::seeded(42);
        p.begin_estimation();
        let mut last = p.percent();
        for _ in 0..500 {
            let now = p.on_simulated_tick();
            assert!(now >= last);
            assert!(now < ESTIMATE_CEILING);
            last = now;
        }
        assert_eq!(last, ESTIMATE_CEILING - 1);
    }

    #[tokio::test]
    async fn ticks_after_first_sample_are_ignored() {
        let mut p = DownloadProgressController::seeded(3);
        p.begin_estimation();
        p.on_transfer_progress(10, 100);
        let after_sample = p.percent();
        p.estimate_step(4.9);
        p.on_simulated_tick();
        assert_eq!(p.percent(), after_sample);
    }

    #[tokio::test]
    async fn unknown_total_keeps_estimating() {
        let mut p = DownloadProgressController::seeded(3);
        p.begin_estimation();
        p.on_transfer_progress(4096, 0);
        assert_eq!(p.phase(), Phase::Estimating);
        assert!(p.is_ticking());
        assert_eq!(p.snapshot().bytes_transferred, 4096);
    }

    #[tokio::test]
    async fn fail_zeroes_everything() {
        let mut p = DownloadProgressController::seeded(3);
        p.begin_estimation();
        p.estimate_step(4.0);
        let msg = p.fail(&Error::RateLimited);
        assert_eq!(msg.severity, crate::types::Severity::Warning);
        let snap = p.snapshot();
        assert_eq!(snap.phase, Phase::Failed);
        assert_eq!((snap.percent, snap.bytes_transferred, snap.bytes_total), (0, 0, 0));
        assert!(snap.message.is_empty());
        assert!(!p.is_ticking());
        p.on_simulated_tick();
        assert_eq!(p.percent(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn linger_returns_to_idle() {
        let mut p = DownloadProgressController::seeded(3);
        p.begin_estimation();
        p.complete();
        let start = Instant::now();
        p.linger().await;
        assert!(start.elapsed() >= RESET_DELAY);
        assert_eq!(p.phase(), Phase::Idle);
        assert_eq!(p.percent(), 0);
    }

    #[test]
    fn rounding_matches_half_up() {
        assert_eq!(rounded_percent(1, 200), 1);
        assert_eq!(rounded_percent(1, 3), 33);
        assert_eq!(rounded_percent(2, 3), 67);
        assert_eq!(rounded_percent(0, 10), 0);
    }
}

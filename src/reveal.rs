//! Scramble-reveal text animation.
//!
//! A run starts with every position scrambled and locks in one true character
//! every `max_iterations + 1` frames until the whole text is visible. The
//! transition lives in [`RevealState::advance`] so any clock can drive it: the
//! tokio task behind [`spawn_reveal`], the egui frame loop, or a test.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::types::Error;

/// Substitute glyphs used when none are configured.
pub const DEFAULT_CHARACTERS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()";

/// Order in which positions lock in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealDirection {
    /// Left to right.
    #[default]
    Start,
    /// Outward from the middle, alternating right then left.
    Center,
}

impl FromStr for RevealDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(RevealDirection::Start),
            "center" => Ok(RevealDirection::Center),
            other => Err(Error::InvalidConfig(format!(
                "unsupported reveal direction '{other}' (expected start or center)"
            ))),
        }
    }
}

/// Tunables for one animator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealOptions {
    /// Delay between frames.
    pub speed: Duration,
    /// Scrambled frames shown before the next character locks in.
    pub max_iterations: u32,
    /// Substitute glyph pool.
    pub characters: Vec<char>,
    /// Which position locks in next.
    pub direction: RevealDirection,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            speed: Duration::from_millis(40),
            max_iterations: 7,
            characters: DEFAULT_CHARACTERS.chars().collect(),
            direction: RevealDirection::default(),
        }
    }
}

impl RevealOptions {
    pub fn with_direction(mut self, direction: RevealDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Reject settings that would stall or panic the animation.
    pub fn validate(&self) -> Result<(), Error> {
        if self.speed.is_zero() {
            return Err(Error::InvalidConfig("reveal speed must be positive".into()));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig("max iterations must be at least 1".into()));
        }
        if self.characters.is_empty() {
            return Err(Error::InvalidConfig("character pool must not be empty".into()));
        }
        Ok(())
    }
}

/// Supplies substitute glyphs for unrevealed positions.
pub trait GlyphSource {
    /// Pick one glyph from a non-empty `pool`.
    fn glyph(&mut self, pool: &[char]) -> char;
}

/// Uniformly random glyphs.
pub struct RandomGlyphs {
    rng: StdRng,
}

impl RandomGlyphs {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomGlyphs {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphSource for RandomGlyphs {
    fn glyph(&mut self, pool: &[char]) -> char {
        pool[self.rng.random_range(0..pool.len())]
    }
}

/// State of a single reveal run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealState {
    source: Vec<char>,
    revealed: HashSet<usize>,
    iteration: u32,
    running: bool,
    display: String,
}

impl RevealState {
    /// A resting state that shows `text` as-is.
    pub fn idle(text: &str) -> Self {
        Self {
            source: text.chars().collect(),
            display: text.to_owned(),
            ..Default::default()
        }
    }

    /// A fresh run over `text` with nothing revealed.
    pub fn started(text: &str) -> Self {
        let mut state = Self::idle(text);
        state.running = !state.source.is_empty();
        state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_complete(&self) -> bool {
        self.revealed.len() == self.source.len()
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.len()
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.contains(&index)
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// The last rendered frame.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Position that locks in next, or `None` once everything is revealed.
    pub fn next_index(&self, direction: RevealDirection) -> Option<usize> {
        let len = self.source.len();
        let n = self.revealed.len();
        if n >= len {
            return None;
        }
        let candidate = match direction {
            RevealDirection::Start => Some(n),
            RevealDirection::Center => {
                let mid = len / 2;
                if n == 0 {
                    Some(mid)
                } else if n % 2 == 1 {
                    Some(mid + n.div_ceil(2))
                } else {
                    mid.checked_sub(n / 2)
                }
            }
        };
        candidate
            .filter(|&i| i < len && !self.revealed.contains(&i))
            .or_else(|| (0..len).find(|i| !self.revealed.contains(i)))
    }

    /// Advance one frame. A state that is not running is returned unchanged.
    pub fn advance(mut self, options: &RevealOptions, glyphs: &mut dyn GlyphSource) -> Self {
        if !self.running {
            return self;
        }

        if self.iteration >= options.max_iterations {
            if let Some(index) = self.next_index(options.direction) {
                self.revealed.insert(index);
            }
            self.iteration = 0;
        } else {
            self.iteration += 1;
        }

        if self.is_complete() {
            self.display = self.source.iter().collect();
            self.running = false;
            return self;
        }

        self.display = self
            .source
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                if self.revealed.contains(&i) {
                    c
                } else {
                    glyphs.glyph(&options.characters)
                }
            })
            .collect();
        self
    }
}

/// Owns one animator: its text, options, glyph source and current run.
pub struct RevealScheduler {
    text: String,
    options: RevealOptions,
    glyphs: Box<dyn GlyphSource + Send>,
    state: RevealState,
}

impl RevealScheduler {
    pub fn new(text: impl Into<String>, options: RevealOptions) -> Result<Self, Error> {
        options.validate()?;
        let text = text.into();
        Ok(Self {
            state: RevealState::idle(&text),
            text,
            options,
            glyphs: Box::new(RandomGlyphs::new()),
        })
    }

    /// Replace the glyph source (deterministic output in tests).
    pub fn with_glyphs(mut self, glyphs: impl GlyphSource + Send + 'static) -> Self {
        self.glyphs = Box::new(glyphs);
        self
    }

    /// Begin a run. Returns `false` (and changes nothing) if one is in progress.
    pub fn start(&mut self) -> bool {
        if self.state.is_running() {
            return false;
        }
        debug!("reveal start: {} chars, {:?}", self.text.chars().count(), self.options.direction);
        self.state = RevealState::started(&self.text);
        true
    }

    /// Advance the current run by one frame and return it.
    pub fn tick(&mut self) -> &str {
        let state = std::mem::take(&mut self.state);
        self.state = state.advance(&self.options, self.glyphs.as_mut());
        self.state.display()
    }

    /// Cancel the current run and show the plain text.
    pub fn stop(&mut self) {
        if self.state.is_running() {
            debug!("reveal stopped after {} chars", self.state.revealed_count());
        }
        self.state = RevealState::idle(&self.text);
    }

    /// Swap the text; any run in progress is discarded.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.state = RevealState::idle(&self.text);
    }

    pub fn frame(&self) -> &str {
        self.state.display()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> &RevealState {
        &self.state
    }

    pub fn options(&self) -> &RevealOptions {
        &self.options
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Tick every `speed` until the run completes, sending each frame.
    ///
    /// Stops early if the receiver goes away.
    pub async fn run(&mut self, frames: &mpsc::UnboundedSender<String>) {
        let mut interval = tokio::time::interval(self.options.speed);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        while self.is_running() {
            interval.tick().await;
            let frame = self.tick().to_owned();
            if frames.send(frame).is_err() {
                self.stop();
                break;
            }
        }
    }
}

/// A reveal running on the tokio runtime. Dropping it cancels the timer.
pub struct RevealHandle {
    task: JoinHandle<()>,
}

impl RevealHandle {
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to finish on its own.
    pub async fn join(mut self) {
        let _ = (&mut self.task).await;
    }
}

impl Drop for RevealHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start `scheduler` and drive it on a tokio task.
pub fn spawn_reveal(
    mut scheduler: RevealScheduler,
    frames: mpsc::UnboundedSender<String>,
) -> RevealHandle {
    scheduler.start();
    let task = tokio::spawn(async move {
        scheduler.run(&frames).await;
    });
    RevealHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(char);

    impl GlyphSource for Fixed {
        fn glyph(&mut self, _pool: &[char]) -> char {
            self.0
        }
    }

    fn options(max_iterations: u32, direction: RevealDirection) -> RevealOptions {
        RevealOptions {
            max_iterations,
            direction,
            ..Default::default()
        }
    }

    fn reveal_order(text: &str, opts: &RevealOptions) -> Vec<usize> {
        let mut state = RevealState::started(text);
        let mut order = Vec::new();
        while state.is_running() {
            let before: HashSet<usize> = state.revealed.clone();
            state = state.advance(opts, &mut Fixed('#'));
            order.extend(state.revealed.difference(&before).copied());
        }
        order
    }

    #[test]
    fn center_order_for_five_chars() {
        let opts = options(1, RevealDirection::Center);
        assert_eq!(reveal_order("abcde", &opts), vec![2, 3, 1, 4, 0]);
    }

    #[test]
    fn center_falls_back_for_even_lengths() {
        let opts = options(1, RevealDirection::Center);
        assert_eq!(reveal_order("abcd", &opts), vec![2, 3, 1, 0]);
    }

    #[test]
    fn start_order_is_sequential() {
        let opts = options(2, RevealDirection::Start);
        assert_eq!(reveal_order("hello", &opts), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn unrevealed_positions_use_glyphs() {
        let opts = options(1, RevealDirection::Start);
        let state = RevealState::started("abc").advance(&opts, &mut Fixed('#'));
        assert_eq!(state.display(), "###");
        let state = state.advance(&opts, &mut Fixed('#'));
        assert_eq!(state.display(), "a##");
    }

    #[test]
    fn direction_parsing_rejects_end() {
        assert_eq!("center".parse::<RevealDirection>().unwrap(), RevealDirection::Center);
        assert!(matches!(
            "end".parse::<RevealDirection>(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let zero_iter = RevealOptions {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(RevealScheduler::new("x", zero_iter).is_err());

        let empty_pool = RevealOptions {
            characters: Vec::new(),
            ..Default::default()
        };
        assert!(RevealScheduler::new("x", empty_pool).is_err());

        let zero_speed = RevealOptions {
            speed: Duration::ZERO,
            ..Default::default()
        };
        assert!(RevealScheduler::new("x", zero_speed).is_err());
    }

    #[test]
    fn start_while_running_is_a_noop() {
        let mut s = RevealScheduler::new("abc", options(1, RevealDirection::Start))
            .unwrap()
            .with_glyphs(Fixed('*'));
        assert!(s.start());
        s.tick();
        s.tick();
        assert_eq!(s.state().revealed_count(), 1);
        assert!(!s.start());
        assert_eq!(s.state().revealed_count(), 1);
    }

    #[test]
    fn empty_text_never_runs() {
        let mut s = RevealScheduler::new("", RevealOptions::default()).unwrap();
        s.start();
        assert!(!s.is_running());
        assert_eq!(s.tick(), "");
    }

    #[test]
    fn stop_restores_plain_text() {
        let mut s = RevealScheduler::new("abc", options(3, RevealDirection::Start))
            .unwrap()
            .with_glyphs(Fixed('*'));
        s.start();
        s.tick();
        assert_eq!(s.frame(), "***");
        s.stop();
        assert!(!s.is_running());
        assert_eq!(s.frame(), "abc");
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_reveal_ends_on_source_text() {
        let scheduler = RevealScheduler::new("Ambatudonlod", options(2, RevealDirection::Center))
            .unwrap()
            .with_glyphs(RandomGlyphs::seeded(7));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_reveal(scheduler, tx);
        handle.join().await;

        let mut last = None;
        let mut count = 0;
        while let Ok(frame) = rx.try_recv() {
            last = Some(frame);
            count += 1;
        }
        assert_eq!(last.as_deref(), Some("Ambatudonlod"));
        assert!(count <= 12 * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels_the_timer() {
        let scheduler = RevealScheduler::new("long enough text", options(7, RevealDirection::Start))
            .unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_reveal(scheduler, tx);
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(handle);
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}

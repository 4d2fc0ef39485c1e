use ambatudonlod::{Phase, ProgressSnapshot};

/// What the progress area shows: a status line while looking up, a bar while downloading.
#[derive(Default)]
pub struct ProgressState {
    pub message: String,
    pub snapshot: Option<ProgressSnapshot>,
    running: bool,
}

impl ProgressState {
    pub fn start(&mut self, message: &str) {
        self.message = message.to_string();
        self.snapshot = None;
        self.running = true;
    }

    pub fn update(&mut self, snapshot: ProgressSnapshot) {
        if snapshot.phase == Phase::Idle {
            self.snapshot = None;
        } else {
            self.message = snapshot.message.clone();
            self.snapshot = Some(snapshot);
        }
    }

    /// Fraction for the bar; `None` while there is nothing measured yet.
    pub fn fraction(&self) -> Option<f32> {
        self.snapshot
            .as_ref()
            .map(|s| f32::from(s.percent) / 100.0)
    }

    pub fn reset(&mut self) {
        self.message.clear();
        self.snapshot = None;
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

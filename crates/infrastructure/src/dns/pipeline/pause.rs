use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy)]
struct PauseWindow {
    started_at: Instant,
    duration: Duration,
}

/// Temporary suspension of blacklist checks.
///
/// The window clears itself the first time it is checked after its duration
/// has elapsed.
#[derive(Debug, Default)]
pub struct BlockingPause {
    window: Mutex<Option<PauseWindow>>,
}

impl BlockingPause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self, duration: Duration) {
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        *window = Some(PauseWindow {
            started_at: Instant::now(),
            duration,
        });
        info!(duration_secs = duration.as_secs(), "Blocking paused");
    }

    pub fn resume(&self) {
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        if window.take().is_some() {
            info!("Blocking resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.remaining().is_some()
    }

    /// Time left in the current window, clearing an elapsed one.
    pub fn remaining(&self) -> Option<Duration> {
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        let current = (*window)?;

        let elapsed = current.started_at.elapsed();
        if elapsed >= current.duration {
            *window = None;
            info!("Blocking pause expired");
            return None;
        }
        Some(current.duration - elapsed)
    }
}

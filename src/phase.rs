//! Pipeline phase timing

use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Scope timer for one pipeline phase. Logs the phase name when created
/// and the elapsed time when dropped, so every exit path is covered.
pub struct Phase {
    name: &'static str,
    started: Instant,
}

impl Phase {
    pub fn start(name: &'static str) -> Self {
        debug!("{name}: started");
        Self {
            name,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for Phase {
    fn drop(&mut self) {
        info!("{}: {}", self.name, format_duration(self.elapsed()));
    }
}

fn format_duration(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 1 {
        format!("{:.1}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", elapsed.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_fast_phases_in_millis() {
        assert_eq!(format_duration(Duration::from_millis(42)), "42ms");
        assert_eq!(format_duration(Duration::from_millis(2_340)), "2.3s");
    }

    #[test]
    fn elapsed_grows() {
        let phase = Phase::start("versions");
        std::thread::sleep(Duration::from_millis(5));
        assert!(phase.elapsed() >= Duration::from_millis(5));
    }
}

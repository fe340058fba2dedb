//! Progress estimation for engine jobs.
//!
//! The engine's structured progress events are the primary source. Engines
//! that only emit raw log text (FFmpeg's default stderr stream) are covered
//! by a fallback estimator that reads the log clock: the `Duration:` header
//! line fixes the total, subsequent `time=HH:MM:SS.frac` fields yield a
//! coarse completion percentage. Both live behind the same strategy trait so
//! the pipeline state machine never cares which one fired.

use crate::engine::EngineEvent;

/// Strategy for deriving a completion percentage from engine events.
pub trait ProgressEstimator: Send {
    /// Observe an event; returns a percentage (0-100) when one can be derived.
    fn observe(&mut self, event: &EngineEvent) -> Option<u8>;
}

/// Estimator fed by the engine's normalized progress events.
#[derive(Debug, Default)]
pub struct StructuredEstimator;

impl ProgressEstimator for StructuredEstimator {
    fn observe(&mut self, event: &EngineEvent) -> Option<u8> {
        match event {
            EngineEvent::Progress(fraction) => {
                Some((fraction.clamp(0.0, 1.0) * 100.0).round() as u8)
            }
            EngineEvent::Log(_) => None,
        }
    }
}

/// Fallback estimator that parses the engine's log clock.
#[derive(Debug, Default)]
pub struct LogClockEstimator {
    duration_secs: Option<f64>,
}

impl ProgressEstimator for LogClockEstimator {
    fn observe(&mut self, event: &EngineEvent) -> Option<u8> {
        let EngineEvent::Log(line) = event else {
            return None;
        };

        if self.duration_secs.is_none() {
            if let Some(total) = parse_duration_line(line) {
                self.duration_secs = Some(total);
                return None;
            }
        }

        let total = self.duration_secs?;
        if total <= 0.0 {
            return None;
        }

        let elapsed = parse_time_field(line)?;
        Some(((elapsed / total) * 100.0).clamp(0.0, 100.0).round() as u8)
    }
}

/// Composite tracker the pipeline feeds every engine event into.
///
/// Structured events take priority: once one has been seen, log-clock
/// estimates are ignored for the rest of the job. Reported percentages are
/// monotonically non-decreasing.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    structured: StructuredEstimator,
    fallback: LogClockEstimator,
    structured_seen: bool,
    last: Option<u8>,
}

impl ProgressTracker {
    /// Create a tracker for a fresh job.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe an event; returns a percentage only when it advances.
    pub fn observe(&mut self, event: &EngineEvent) -> Option<u8> {
        let estimate = match event {
            EngineEvent::Progress(_) => {
                self.structured_seen = true;
                self.structured.observe(event)
            }
            EngineEvent::Log(_) if !self.structured_seen => self.fallback.observe(event),
            EngineEvent::Log(_) => None,
        }?;

        match self.last {
            Some(last) if estimate <= last => None,
            _ => {
                self.last = Some(estimate);
                Some(estimate)
            }
        }
    }
}

/// Parse a `HH:MM:SS.frac` (or `MM:SS.frac`, or bare seconds) clock value.
fn parse_clock(s: &str) -> Option<f64> {
    let parts: Vec<&str> = s.split(':').collect();
    let secs = match parts.len() {
        1 => parts[0].parse::<f64>().ok()?,
        2 => {
            let mins: f64 = parts[0].parse().ok()?;
            let secs: f64 = parts[1].parse().ok()?;
            mins * 60.0 + secs
        }
        3 => {
            let hours: f64 = parts[0].parse().ok()?;
            let mins: f64 = parts[1].parse().ok()?;
            let secs: f64 = parts[2].parse().ok()?;
            hours * 3600.0 + mins * 60.0 + secs
        }
        _ => return None,
    };
    if secs.is_finite() && secs >= 0.0 {
        Some(secs)
    } else {
        None
    }
}

/// Extract the total duration from a `Duration: HH:MM:SS.frac, ...` line.
fn parse_duration_line(line: &str) -> Option<f64> {
    let rest = line.split("Duration:").nth(1)?;
    let clock = rest.split(',').next()?.trim();
    parse_clock(clock)
}

/// Extract the elapsed clock from a `... time=HH:MM:SS.frac ...` field.
fn parse_time_field(line: &str) -> Option<f64> {
    let rest = line.split("time=").nth(1)?;
    let clock = rest.split_whitespace().next()?;
    parse_clock(clock)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(line: &str) -> EngineEvent {
        EngineEvent::Log(line.to_string())
    }

    #[test]
    fn test_parse_clock() {
        assert!((parse_clock("00:01:30.50").unwrap() - 90.5).abs() < 0.01);
        assert!((parse_clock("01:30.5").unwrap() - 90.5).abs() < 0.01);
        assert!((parse_clock("90.5").unwrap() - 90.5).abs() < 0.01);
        assert!(parse_clock("N/A").is_none());
    }

    #[test]
    fn test_structured_estimator() {
        let mut est = StructuredEstimator;
        assert_eq!(est.observe(&EngineEvent::Progress(0.5)), Some(50));
        assert_eq!(est.observe(&EngineEvent::Progress(1.5)), Some(100));
        assert_eq!(est.observe(&log("time=00:00:01.00")), None);
    }

    #[test]
    fn test_log_clock_estimator_needs_duration_first() {
        let mut est = LogClockEstimator::default();
        assert_eq!(est.observe(&log("frame=1 time=00:00:05.00 speed=1x")), None);

        assert_eq!(
            est.observe(&log("  Duration: 00:00:10.00, start: 0.0, bitrate: 1 kb/s")),
            None
        );
        assert_eq!(
            est.observe(&log("frame=120 time=00:00:05.00 speed=1x")),
            Some(50)
        );
        assert_eq!(
            est.observe(&log("frame=240 time=00:00:10.00 speed=1x")),
            Some(100)
        );
    }

    #[test]
    fn test_log_clock_ignores_na_time() {
        let mut est = LogClockEstimator::default();
        est.observe(&log("Duration: 00:00:10.00, start"));
        assert_eq!(est.observe(&log("size=0 time=N/A bitrate=N/A")), None);
    }

    #[test]
    fn test_tracker_is_monotonic() {
        let mut tracker = ProgressTracker::new();
        tracker.observe(&log("Duration: 00:00:10.00,"));
        assert_eq!(tracker.observe(&log("time=00:00:04.00 x")), Some(40));
        // Clock going backwards is not republished.
        assert_eq!(tracker.observe(&log("time=00:00:02.00 x")), None);
        assert_eq!(tracker.observe(&log("time=00:00:04.00 x")), None);
        assert_eq!(tracker.observe(&log("time=00:00:08.00 x")), Some(80));
    }

    #[test]
    fn test_tracker_prefers_structured_events() {
        let mut tracker = ProgressTracker::new();
        tracker.observe(&log("Duration: 00:00:10.00,"));
        assert_eq!(tracker.observe(&EngineEvent::Progress(0.3)), Some(30));
        // Log clock is ignored once structured progress has been seen.
        assert_eq!(tracker.observe(&log("time=00:00:09.00 x")), None);
        assert_eq!(tracker.observe(&EngineEvent::Progress(0.6)), Some(60));
    }
}

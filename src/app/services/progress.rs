//! Import progress reporting
//!
//! Progress is pushed to an optional caller-supplied callback. The tracker
//! guarantees a monotonically non-decreasing percentage, throttles per-row
//! updates and can map a stage's local 0–100 scale into a window of the
//! overall run (the parser reports 0–100 on its own, but only 5–40 when it
//! runs inside a full import).

use serde::Serialize;
use std::fmt;

/// Pipeline stage reported with each progress update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStage {
    Parsing,
    Validating,
    Processing,
    Saving,
    Completed,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Parsing => "parsing",
            Self::Validating => "validating",
            Self::Processing => "processing",
            Self::Saving => "saving",
            Self::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// One progress update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportProgress {
    pub stage: ImportStage,
    /// Overall completion, 0–100
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<usize>,
}

/// Caller-supplied progress sink
pub type ProgressCallback<'a> = &'a mut dyn FnMut(&ImportProgress);

/// Monotonic, throttled progress reporter
pub struct ProgressTracker<'a> {
    sink: Option<ProgressCallback<'a>>,
    window_start: f64,
    window_end: f64,
    last_percent: u8,
    row_interval: usize,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: Option<ProgressCallback<'a>>, row_interval: usize) -> Self {
        Self {
            sink,
            window_start: 0.0,
            window_end: 100.0,
            last_percent: 0,
            row_interval: row_interval.max(1),
        }
    }

    /// Tracker that reports nowhere
    pub fn disabled() -> Self {
        Self::new(None, 1)
    }

    /// Map subsequent local percentages into `[start, end]` of the overall run
    pub fn set_window(&mut self, start: u8, end: u8) {
        self.window_start = f64::from(start.min(100));
        self.window_end = f64::from(end.clamp(start.min(100), 100));
    }

    /// Last percentage handed to the callback
    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }

    /// Report a stage-local percentage
    pub fn report(&mut self, stage: ImportStage, local_percent: f64, message: impl Into<String>) {
        self.emit(stage, local_percent, message.into(), None);
    }

    /// Report per-row progress across `[start, start + span]` of the local
    /// scale; only every `row_interval`-th row (0-based) is emitted
    pub fn report_row(
        &mut self,
        stage: ImportStage,
        index: usize,
        total: usize,
        start: f64,
        span: f64,
        message: impl Into<String>,
    ) {
        if total == 0 || index % self.row_interval != 0 {
            return;
        }
        let fraction = index as f64 / total as f64;
        let local = start + (fraction * span).round();
        self.emit(stage, local, message.into(), Some((index + 1, total)));
    }

    /// Report the end of the run at 100%, regardless of the window
    pub fn complete(&mut self, message: impl Into<String>) {
        self.window_start = 0.0;
        self.window_end = 100.0;
        self.emit(ImportStage::Completed, 100.0, message.into(), None);
    }

    fn emit(
        &mut self,
        stage: ImportStage,
        local_percent: f64,
        message: String,
        rows: Option<(usize, usize)>,
    ) {
        let Some(sink) = self.sink.as_deref_mut() else {
            return;
        };

        let local = local_percent.clamp(0.0, 100.0);
        let overall = self.window_start + (self.window_end - self.window_start) * local / 100.0;
        let percent = (overall.round() as u8).max(self.last_percent);
        self.last_percent = percent;

        sink(&ImportProgress {
            stage,
            progress: percent,
            message,
            current_row: rows.map(|(current, _)| current),
            total_rows: rows.map(|(_, total)| total),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic() {
        let mut seen = Vec::new();
        let mut callback = |p: &ImportProgress| seen.push(p.progress);
        let mut tracker = ProgressTracker::new(Some(&mut callback), 10);

        tracker.report(ImportStage::Parsing, 30.0, "headers");
        tracker.report(ImportStage::Parsing, 10.0, "late update");
        tracker.complete("done");
        drop(tracker);

        assert_eq!(seen, vec![30, 30, 100]);
    }

    #[test]
    fn test_row_updates_are_throttled() {
        let mut seen = Vec::new();
        let mut callback = |p: &ImportProgress| seen.push((p.current_row, p.progress));
        let mut tracker = ProgressTracker::new(Some(&mut callback), 10);

        for i in 0..25 {
            tracker.report_row(ImportStage::Validating, i, 25, 40.0, 50.0, "row");
        }
        drop(tracker);

        // Rows 0, 10 and 20 with 40 + round(i / total * 50)
        assert_eq!(seen, vec![(Some(1), 40), (Some(11), 60), (Some(21), 80)]);
    }

    #[test]
    fn test_window_maps_local_scale() {
        let mut seen = Vec::new();
        let mut callback = |p: &ImportProgress| seen.push(p.progress);
        let mut tracker = ProgressTracker::new(Some(&mut callback), 1);

        tracker.set_window(5, 40);
        tracker.report(ImportStage::Parsing, 0.0, "start");
        tracker.report(ImportStage::Validating, 100.0, "end");
        drop(tracker);

        assert_eq!(seen, vec![5, 40]);
    }

    #[test]
    fn test_disabled_tracker_is_silent() {
        let mut tracker = ProgressTracker::disabled();
        tracker.report(ImportStage::Saving, 50.0, "nobody listens");
        assert_eq!(tracker.last_percent(), 0);
    }
}

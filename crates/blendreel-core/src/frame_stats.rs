//! Per-frame motion statistics for traces and tuning.
//!
//! Collects one [`MotionFrameStats`] per frame and exports them as JSONL
//! (one JSON object per line) or as an aggregate [`MotionSummary`]. Nothing
//! here measures time; the numbers are the motion state the host applied.
//!
//! # Usage
//!
//! ```ignore
//! let mut trace = FrameTraceCollector::new("autoplay_soak");
//! for _ in 0..600 {
//!     let snapshot = controller.frame();
//!     trace.record(MotionFrameStats::from(&snapshot));
//! }
//! println!("{}", trace.to_jsonl());
//! ```

use std::collections::VecDeque;

use serde::Serialize;

use crate::motion::MotionSnapshot;

/// One frame's motion state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionFrameStats {
    pub frame: u64,
    pub offset: f64,
    pub velocity: f64,
    pub blur: f64,
    pub wrapped: bool,
    pub autoplay: bool,
    pub momentum: bool,
    pub coalesced_inputs: u32,
}

impl From<&MotionSnapshot> for MotionFrameStats {
    fn from(s: &MotionSnapshot) -> Self {
        Self {
            frame: s.frame,
            offset: s.offset,
            velocity: s.velocity,
            blur: s.blur,
            wrapped: s.wrapped,
            autoplay: s.autoplay_running,
            momentum: s.momentum_running,
            coalesced_inputs: s.coalesced_inputs,
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonlFrame<'a> {
    run_id: &'a str,
    #[serde(flatten)]
    stats: &'a MotionFrameStats,
}

/// Aggregate over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MotionSummary {
    pub frames: u64,
    pub wraps: u64,
    pub momentum_frames: u64,
    pub peak_speed: f64,
    pub peak_blur: f64,
    /// Median absolute velocity over frames with any motion.
    pub p50_speed: f64,
    pub p95_speed: f64,
    pub total_inputs: u64,
}

/// Bounded per-run collector.
#[derive(Debug, Clone)]
pub struct FrameTraceCollector {
    run_id: String,
    records: VecDeque<MotionFrameStats>,
    capacity: usize,
    dropped: u64,
}

impl FrameTraceCollector {
    const DEFAULT_CAPACITY: usize = 4096;

    #[must_use]
    pub fn new(run_id: &str) -> Self {
        Self::with_capacity(run_id, Self::DEFAULT_CAPACITY)
    }

    /// Collector that keeps at most `capacity` frames; older frames are
    /// dropped first.
    #[must_use]
    pub fn with_capacity(run_id: &str, capacity: usize) -> Self {
        Self {
            run_id: run_id.to_string(),
            records: VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY)),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn record(&mut self, stats: MotionFrameStats) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
            self.dropped += 1;
        }
        self.records.push_back(stats);
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.records.len()
    }

    /// Frames evicted because the collector was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn records(&self) -> impl Iterator<Item = &MotionFrameStats> {
        self.records.iter()
    }

    /// Remove and return everything collected so far, oldest first.
    pub fn drain(&mut self) -> Vec<MotionFrameStats> {
        self.records.drain(..).collect()
    }

    /// Emit per-frame JSONL records to a string.
    ///
    /// Each line is a JSON object with `run_id` plus every
    /// [`MotionFrameStats`] field.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mut out = String::new();
        for line in jsonl_lines(&self.run_id, self.records.iter()) {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    #[must_use]
    pub fn summary(&self) -> MotionSummary {
        let mut speeds: Vec<f64> = self
            .records
            .iter()
            .map(|r| r.velocity.abs())
            .filter(|v| *v > 0.0)
            .collect();
        speeds.sort_by(f64::total_cmp);

        MotionSummary {
            frames: self.records.len() as u64,
            wraps: self.records.iter().filter(|r| r.wrapped).count() as u64,
            momentum_frames: self.records.iter().filter(|r| r.momentum).count() as u64,
            peak_speed: speeds.last().copied().unwrap_or(0.0),
            peak_blur: self.records.iter().map(|r| r.blur).fold(0.0, f64::max),
            p50_speed: percentile(&speeds, 50),
            p95_speed: percentile(&speeds, 95),
            total_inputs: self
                .records
                .iter()
                .map(|r| u64::from(r.coalesced_inputs))
                .sum(),
        }
    }
}

/// Serialize `records` as JSON lines tagged with `run_id`.
#[must_use]
pub fn jsonl_lines<'a>(
    run_id: &str,
    records: impl IntoIterator<Item = &'a MotionFrameStats>,
) -> Vec<String> {
    records
        .into_iter()
        .filter_map(|stats| serde_json::to_string(&JsonlFrame { run_id, stats }).ok())
        .collect()
}

/// Nearest-rank percentile of sorted values.
fn percentile(sorted: &[f64], p: usize) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p * sorted.len()).div_ceil(100).max(1);
    sorted[rank.min(sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(frame: u64, velocity: f64, wrapped: bool) -> MotionFrameStats {
        MotionFrameStats {
            frame,
            offset: 2000.0 + frame as f64,
            velocity,
            blur: velocity.abs() / 50.0,
            wrapped,
            autoplay: true,
            momentum: velocity != 0.0,
            coalesced_inputs: 1,
        }
    }

    #[test]
    fn jsonl_has_one_line_per_frame() {
        let mut c = FrameTraceCollector::new("run-a");
        c.record(stats(1, 3.0, false));
        c.record(stats(2, -4.0, true));
        let out = c.to_jsonl();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(out.ends_with('\n'));
        let v: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(v["run_id"], "run-a");
        assert_eq!(v["frame"], 2);
        assert_eq!(v["wrapped"], true);
    }

    #[test]
    fn empty_collector() {
        let c = FrameTraceCollector::new("empty");
        assert_eq!(c.to_jsonl(), "");
        assert_eq!(c.summary(), MotionSummary::default());
    }

    #[test]
    fn summary_aggregates() {
        let mut c = FrameTraceCollector::new("s");
        for (i, v) in [0.0, 10.0, -20.0, 5.0].into_iter().enumerate() {
            c.record(stats(i as u64, v, i == 2));
        }
        let s = c.summary();
        assert_eq!(s.frames, 4);
        assert_eq!(s.wraps, 1);
        assert_eq!(s.momentum_frames, 3);
        assert_eq!(s.peak_speed, 20.0);
        assert_eq!(s.p50_speed, 10.0);
        assert_eq!(s.total_inputs, 4);
        assert!((s.peak_blur - 0.4).abs() < 1e-12);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut c = FrameTraceCollector::with_capacity("cap", 2);
        for i in 0..5 {
            c.record(stats(i, 1.0, false));
        }
        assert_eq!(c.frame_count(), 2);
        assert_eq!(c.dropped(), 3);
        assert_eq!(c.records().next().map(|r| r.frame), Some(3));
        assert_eq!(c.drain().len(), 2);
        assert_eq!(c.frame_count(), 0);
    }
}

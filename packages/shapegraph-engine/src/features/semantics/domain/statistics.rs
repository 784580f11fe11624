//! Per-analysis statistics
//!
//! Cumulative phase timers and counters, updated by every apply/combine.
//! The analysis is single-threaded so no synchronization is involved.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Focus,
    Precondition,
    Update,
    Coerce,
    Blur,
    Join,
    TotalAnalysis,
    Load,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Focus => "focus",
            Phase::Precondition => "precondition",
            Phase::Update => "update",
            Phase::Coerce => "coerce",
            Phase::Blur => "blur",
            Phase::Join => "join",
            Phase::TotalAnalysis => "total_analysis",
            Phase::Load => "load",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimer {
    pub total: Duration,
    pub invocations: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStatistics {
    pub timers: BTreeMap<Phase, PhaseTimer>,
    /// Focused structures dropped by coerce after focus
    pub constraint_breaches: u64,
    /// Updated structures dropped by coerce after update
    pub breaches_after_update: u64,
    /// Branches dropped because messages fired with freeze-on-message
    pub messages: u64,
    /// Structures produced by the pipeline
    pub structures: u64,
    pub actions_applied: u64,
    pub combines: u64,
    #[serde(skip)]
    running: BTreeMap<Phase, Option<Instant>>,
}

impl AnalysisStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, phase: Phase, elapsed: Duration) {
        let timer = self.timers.entry(phase).or_default();
        timer.total += elapsed;
        timer.invocations += 1;
    }

    /// Run `f`, charging its wall time to `phase`
    pub fn time<T>(&mut self, phase: Phase, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(phase, start.elapsed());
        out
    }

    /// Start a long-running timer (total analysis, load)
    pub fn start(&mut self, phase: Phase) {
        self.running.insert(phase, Some(Instant::now()));
    }

    /// Stop a timer started with [`start`](Self::start); no-op otherwise
    pub fn stop(&mut self, phase: Phase) {
        if let Some(Some(started)) = self.running.remove(&phase) {
            self.record(phase, started.elapsed());
        }
    }

    pub fn elapsed(&self, phase: Phase) -> Duration {
        self.timers.get(&phase).map(|t| t.total).unwrap_or_default()
    }

    pub fn invocations(&self, phase: Phase) -> u64 {
        self.timers.get(&phase).map(|t| t.invocations).unwrap_or(0)
    }

    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Analysis statistics");
        for (phase, timer) in &self.timers {
            let _ = writeln!(
                out,
                "  {:<16} {:>10.3} ms ({} calls)",
                phase.as_str(),
                timer.total.as_secs_f64() * 1000.0,
                timer.invocations
            );
        }
        let _ = writeln!(out, "  actions applied:        {}", self.actions_applied);
        let _ = writeln!(out, "  combines:               {}", self.combines);
        let _ = writeln!(out, "  structures:             {}", self.structures);
        let _ = writeln!(out, "  constraint breaches:    {}", self.constraint_breaches);
        let _ = writeln!(out, "  breaches after update:  {}", self.breaches_after_update);
        let _ = writeln!(out, "  frozen with messages:   {}", self.messages);
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_accumulates_invocations() {
        let mut stats = AnalysisStatistics::new();
        let v = stats.time(Phase::Focus, || 41 + 1);
        stats.time(Phase::Focus, || ());
        assert_eq!(v, 42);
        assert_eq!(stats.invocations(Phase::Focus), 2);
        assert_eq!(stats.invocations(Phase::Blur), 0);
    }

    #[test]
    fn test_start_stop() {
        let mut stats = AnalysisStatistics::new();
        stats.stop(Phase::Load);
        assert_eq!(stats.invocations(Phase::Load), 0);
        stats.start(Phase::TotalAnalysis);
        stats.stop(Phase::TotalAnalysis);
        assert_eq!(stats.invocations(Phase::TotalAnalysis), 1);
    }

    #[test]
    fn test_report_and_json() {
        let mut stats = AnalysisStatistics::new();
        stats.constraint_breaches = 3;
        stats.record(Phase::Update, Duration::from_millis(2));
        let report = stats.report();
        assert!(report.contains("update"));
        assert!(report.contains("constraint breaches:    3"));
        let json = stats.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["constraint_breaches"], 3);
        assert!(value["timers"]["update"].is_object());
    }
}

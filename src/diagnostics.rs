use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Timing entry describing a single stage of a locate run or one of the
/// helper routines executed by the tools.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

impl StageTiming {
    pub fn new(label: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            label: label.into(),
            elapsed_ms,
        }
    }
}

/// Aggregated timing trace for one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn push(&mut self, label: impl Into<String>, elapsed_ms: f64) {
        self.stages.push(StageTiming::new(label, elapsed_ms));
    }

    /// Elapsed time of the first stage with this label.
    pub fn stage(&self, label: &str) -> Option<f64> {
        self.stages
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.elapsed_ms)
    }
}

/// Milliseconds since `start`.
#[inline]
pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_looked_up_by_label() {
        let mut t = TimingBreakdown {
            total_ms: 3.0,
            ..TimingBreakdown::default()
        };
        t.push("extract", 1.0);
        t.push("match", 2.0);
        assert_eq!(t.stage("match"), Some(2.0));
        assert_eq!(t.stage("place"), None);
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"totalMs\""));
        assert!(json.contains("\"elapsedMs\""));
    }
}

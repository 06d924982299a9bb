//! Derived metrics layered on stored facts: deltas, percentage change and
//! direction of change.

use serde::{Deserialize, Serialize};

/// Direction of a change, by strict sign of the delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  Increase,
  Decrease,
  NoChange,
}

impl Direction {
  pub fn classify(delta: f64) -> Self {
    if delta > 0.0 {
      Self::Increase
    } else if delta < 0.0 {
      Self::Decrease
    } else {
      Self::NoChange
    }
  }
}

/// `delta / baseline * 100`, or `None` when the baseline is exactly zero.
pub fn percent_change(delta: f64, baseline: f64) -> Option<f64> {
  (baseline != 0.0).then(|| delta / baseline * 100.0)
}

/// Delta and percentage of `current` relative to `baseline`.
///
/// Both fields are `None` if either operand is missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Change {
  pub delta:   Option<f64>,
  pub percent: Option<f64>,
}

impl Change {
  pub fn between(current: Option<f64>, baseline: Option<f64>) -> Self {
    match (current, baseline) {
      (Some(current), Some(baseline)) => {
        let delta = current - baseline;
        Self { delta: Some(delta), percent: percent_change(delta, baseline) }
      }
      _ => Self::default(),
    }
  }

  pub fn direction(&self) -> Option<Direction> { self.delta.map(Direction::classify) }
}

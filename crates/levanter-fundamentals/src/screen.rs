//! Screening predicates over metric rows.
//!
//! A screen is a conjunction of conditions of the form "field above a
//! threshold for N consecutive quarters", evaluated against a symbol's
//! metric rows ordered newest first. An absent field fails the condition.

use crate::calculator::MetricRow;

/// Accessor for one metric field.
pub type FieldAccessor = fn(&MetricRow) -> Option<f64>;

/// One screening condition: `field > threshold` on each of the most
/// recent `quarters` rows.
#[derive(Clone, Copy)]
pub struct ConsecutiveThreshold {
    /// Field under test.
    pub field: FieldAccessor,
    /// Exclusive lower bound.
    pub threshold: f64,
    /// Number of most recent quarters that must satisfy the bound.
    pub quarters: usize,
}

impl std::fmt::Debug for ConsecutiveThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsecutiveThreshold")
            .field("threshold", &self.threshold)
            .field("quarters", &self.quarters)
            .finish_non_exhaustive()
    }
}

impl ConsecutiveThreshold {
    /// Creates a condition.
    #[must_use]
    pub const fn new(field: FieldAccessor, threshold: f64, quarters: usize) -> Self {
        Self {
            field,
            threshold,
            quarters,
        }
    }

    /// Whether the most recent `quarters` rows all satisfy the bound.
    ///
    /// Fails when fewer rows are available or any value is absent.
    #[must_use]
    pub fn matches(&self, rows: &[MetricRow]) -> bool {
        if rows.len() < self.quarters {
            return false;
        }
        rows[..self.quarters]
            .iter()
            .all(|row| (self.field)(row).is_some_and(|v| v > self.threshold))
    }
}

/// A conjunction of screening conditions.
#[derive(Debug, Default)]
pub struct Screen {
    conditions: Vec<ConsecutiveThreshold>,
}

impl Screen {
    /// Creates an empty screen (matches everything).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Adds a condition.
    #[must_use]
    pub fn with(mut self, condition: ConsecutiveThreshold) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Whether a symbol's metric rows pass every condition.
    #[must_use]
    pub fn matches(&self, rows: &[MetricRow]) -> bool {
        self.conditions.iter().all(|c| c.matches(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows_with_net_margins(margins: &[Option<f64>]) -> Vec<MetricRow> {
        margins
            .iter()
            .map(|&net_margin| MetricRow {
                net_margin,
                ..MetricRow::default()
            })
            .collect()
    }

    #[test]
    fn test_consecutive_threshold_passes() {
        let rows = rows_with_net_margins(&[Some(0.30), Some(0.28), Some(0.26), Some(0.27)]);
        let cond = ConsecutiveThreshold::new(|r| r.net_margin, 0.25, 4);
        assert!(cond.matches(&rows));
    }

    #[test]
    fn test_one_bad_quarter_fails() {
        let rows = rows_with_net_margins(&[Some(0.30), Some(0.20), Some(0.26), Some(0.27)]);
        let cond = ConsecutiveThreshold::new(|r| r.net_margin, 0.25, 4);
        assert!(!cond.matches(&rows));
    }

    #[test]
    fn test_absent_field_fails() {
        let rows = rows_with_net_margins(&[Some(0.30), None, Some(0.26), Some(0.27)]);
        let cond = ConsecutiveThreshold::new(|r| r.net_margin, 0.25, 4);
        assert!(!cond.matches(&rows));
    }

    #[test]
    fn test_too_few_rows_fails() {
        let rows = rows_with_net_margins(&[Some(0.30), Some(0.28)]);
        let cond = ConsecutiveThreshold::new(|r| r.net_margin, 0.25, 4);
        assert!(!cond.matches(&rows));
    }

    #[test]
    fn test_only_recent_quarters_considered() {
        // A weak quarter older than the window does not matter
        let rows = rows_with_net_margins(&[Some(0.30), Some(0.28), Some(0.10)]);
        let cond = ConsecutiveThreshold::new(|r| r.net_margin, 0.25, 2);
        assert!(cond.matches(&rows));
    }

    #[test]
    fn test_screen_conjunction() {
        let rows: Vec<MetricRow> = (0..4)
            .map(|_| MetricRow {
                net_margin: Some(0.30),
                roe: Some(0.18),
                ..MetricRow::default()
            })
            .collect();

        let screen = Screen::new()
            .with(ConsecutiveThreshold::new(|r| r.net_margin, 0.25, 4))
            .with(ConsecutiveThreshold::new(|r| r.roe, 0.15, 2));
        assert!(screen.matches(&rows));

        let strict = Screen::new()
            .with(ConsecutiveThreshold::new(|r| r.net_margin, 0.25, 4))
            .with(ConsecutiveThreshold::new(|r| r.roe, 0.20, 2));
        assert!(!strict.matches(&rows));
    }

    #[test]
    fn test_empty_screen_matches() {
        assert!(Screen::new().matches(&[]));
    }
}

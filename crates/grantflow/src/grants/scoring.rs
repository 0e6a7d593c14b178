//! Running score statistics and score-history bookkeeping.
//!
//! Everything here is a pure read over currently persisted rows: nothing is
//! memoized, so every call re-scans the scores it is given. Stored history
//! strings are comma-separated decimal values, oldest first, and must stay
//! byte-compatible with data written by earlier deployments.

use super::domain::Score;

/// Read-time aggregate over one applicant's scores.
#[derive(Debug, Clone)]
pub struct ScoreSheet {
    scores: Vec<Score>,
}

impl ScoreSheet {
    pub fn new(scores: Vec<Score>) -> Self {
        Self { scores }
    }

    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.scores.iter().filter_map(|score| score.value)
    }

    /// Arithmetic mean of the non-null scores; `None` when no reviewer has
    /// committed a rating yet (distinct from an average of zero).
    pub fn average_score(&self) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for value in self.values() {
            sum += value;
            count += 1;
        }

        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    /// Population variance of the non-null scores. Defined as 0 when fewer
    /// than two values exist rather than returning NaN or an absent value.
    pub fn variance(&self) -> f64 {
        let Some(mean) = self.average_score() else {
            return 0.0;
        };

        let values: Vec<f64> = self.values().collect();
        if values.len() < 2 {
            return 0.0;
        }

        values
            .iter()
            .map(|value| (value - mean) * (value - mean))
            .sum::<f64>()
            / values.len() as f64
    }

    /// Standard deviation, always the exact square root of `variance()`.
    pub fn stdev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn reviewed_count(&self) -> usize {
        self.values().count()
    }
}

/// Decimal rendering used in stored history strings. Matches the legacy
/// format: whole values keep one fractional digit ("3.0", not "3").
pub(crate) fn format_score_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

impl Score {
    /// Append a prior value to the history string before it is overwritten.
    pub fn push_history(&mut self, prior: f64) {
        let rendered = format_score_value(prior);
        self.history = Some(match self.history.take() {
            Some(existing) => format!("{existing},{rendered}"),
            None => rendered,
        });
    }

    /// Display rendering of the stored history: comma-and-space joined,
    /// empty string when no history exists.
    pub fn history_human(&self) -> String {
        match self.history.as_deref() {
            Some(history) => history.split(',').collect::<Vec<_>>().join(", "),
            None => String::new(),
        }
    }
}

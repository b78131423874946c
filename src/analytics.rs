use serde::Serialize;

use crate::models::Attempt;
use crate::quiz_scorer::{MASTERY_THRESHOLD, round2};

const EXCELLENT_FROM: f64 = 90.0;
const AVERAGE_FROM: f64 = 50.0;
const TOP_PERFORMER_COUNT: usize = 5;

/// How many attempts fall in each score band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreDistribution {
    pub excellent: usize,
    pub good: usize,
    pub average: usize,
    pub poor: usize,
}

/// Summary statistics over recorded quiz attempts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptAnalytics {
    pub total_attempts: usize,
    pub average_score: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    pub pass_rate: f64,
    pub distribution: ScoreDistribution,
}

impl AttemptAnalytics {
    /// `None` when there is nothing to summarise.
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }

        let total = scores.len();
        let sum: f64 = scores.iter().sum();
        let highest = scores.iter().copied().fold(f64::MIN, f64::max);
        let lowest = scores.iter().copied().fold(f64::MAX, f64::min);
        let passed = scores.iter().filter(|s| **s >= MASTERY_THRESHOLD).count();

        let mut distribution = ScoreDistribution::default();
        for &score in scores {
            if score >= EXCELLENT_FROM {
                distribution.excellent += 1;
            } else if score >= MASTERY_THRESHOLD {
                distribution.good += 1;
            } else if score >= AVERAGE_FROM {
                distribution.average += 1;
            } else {
                distribution.poor += 1;
            }
        }

        Some(Self {
            total_attempts: total,
            average_score: round2(sum / total as f64),
            highest_score: highest,
            lowest_score: lowest,
            pass_rate: round2(passed as f64 / total as f64 * 100.0),
            distribution,
        })
    }

    pub fn from_attempts(attempts: &[Attempt]) -> Option<Self> {
        let scores: Vec<f64> = attempts.iter().map(|a| a.score).collect();
        Self::from_scores(&scores)
    }
}

/// The highest-scoring attempts, earlier entries first on equal scores.
pub fn top_performers(attempts: &[Attempt]) -> Vec<Attempt> {
    let mut ranked: Vec<&Attempt> = attempts.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
        .into_iter()
        .take(TOP_PERFORMER_COUNT)
        .cloned()
        .collect()
}

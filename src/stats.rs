//! Summary statistics of a matching run

use crate::aggregate::AssignmentCounts;
use crate::RankScores;
use serde::Serialize;
use std::fmt;

/// Labels of the summary lines, in output order
pub const LABELS: [&str; 7] = [
    "Total Course Weight Achieved",
    "First Choice Assignments",
    "Second Choice Assignments",
    "Third Choice Assignments",
    "No Choice Assignments",
    "Multi Assignments",
    "No Assignments",
];

/// A fraction, reported together with its numerator and denominator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Ratio {
    pub numerator: u64,
    pub denominator: u64,
}

impl Ratio {
    pub fn new(numerator: u64, denominator: u64) -> Ratio {
        Ratio {
            numerator,
            denominator,
        }
    }

    /// Value of the fraction. 0.0 for an empty population.
    pub fn fraction(&self) -> f64 {
        if self.denominator == 0 {
            0.0
        } else {
            self.numerator as f64 / self.denominator as f64
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.5} ({}/{})",
            self.fraction(),
            self.numerator,
            self.denominator
        )
    }
}

/// Summary statistics of an assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Achieved rank scores in relation to every student getting their first choice
    pub total_weight: Ratio,
    pub first_choice: Ratio,
    pub second_choice: Ratio,
    pub third_choice: Ratio,
    pub no_choice: Ratio,
    pub multi_assigned: Ratio,
    pub unassigned: Ratio,
}

/// Calculate the summary statistics for a population of `num_students` students
pub fn compute(counts: &AssignmentCounts, num_students: usize, scores: &RankScores) -> Statistics {
    let n = num_students as u64;
    let achieved = scores.first as u64 * counts.first_choice as u64
        + scores.second as u64 * counts.second_choice as u64
        + scores.third as u64 * counts.third_choice as u64;

    Statistics {
        total_weight: Ratio::new(achieved, n * scores.first as u64),
        first_choice: Ratio::new(counts.first_choice as u64, n),
        second_choice: Ratio::new(counts.second_choice as u64, n),
        third_choice: Ratio::new(counts.third_choice as u64, n),
        no_choice: Ratio::new(counts.no_choice as u64, n),
        multi_assigned: Ratio::new(counts.multi_assigned as u64, n),
        unassigned: Ratio::new(counts.unassigned as u64, n),
    }
}

impl Statistics {
    fn ratios(&self) -> [Ratio; 7] {
        [
            self.total_weight,
            self.first_choice,
            self.second_choice,
            self.third_choice,
            self.no_choice,
            self.multi_assigned,
            self.unassigned,
        ]
    }

    /// The summary as (label, value) pairs in the canonical order
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        LABELS
            .iter()
            .zip(self.ratios().iter())
            .map(|(label, ratio)| (*label, ratio.to_string()))
            .collect()
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in self.summary() {
            writeln!(f, "{}: {}", label, value)?;
        }
        Ok(())
    }
}

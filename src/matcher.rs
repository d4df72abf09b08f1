//! The matching pipeline: preference weights → model → solver → aggregation → statistics.
//!
//! Each stage consumes the result of the previous stage and produces a new value; no stage
//! modifies the data of an earlier one. A run owns all of its data, so independent runs never
//! share any state.

use crate::aggregate::{aggregate, MatchResult};
use crate::model::{build_model, AssignmentModel, MatchingPolicy};
use crate::solver::{GoodLpSolver, Solver, SolverOutcome, SolverStatus};
use crate::stats::{self, Statistics};
use crate::weights::{build_weights, PreferenceWeights};
use crate::{MatchError, Problem};
use log::{info, warn};

/// A problem together with its students' preference weights
pub struct WeightedProblem<'a> {
    pub problem: &'a Problem,
    pub weights: PreferenceWeights,
}

impl<'a> WeightedProblem<'a> {
    pub fn new(problem: &'a Problem) -> Self {
        let weights = build_weights(&problem.students, problem.courses.len(), &problem.scores);
        WeightedProblem { problem, weights }
    }

    pub fn build_model(&self, policy: &MatchingPolicy) -> AssignmentModel {
        build_model(&self.problem.courses, &self.weights, policy)
    }
}

/// Complete result of a successful matching run
#[derive(Clone, Debug)]
pub struct MatchReport {
    pub status: SolverStatus,
    /// Objective value of the optimal solution
    pub objective_value: f64,
    /// Which courses take place
    pub running: Vec<bool>,
    pub weights: PreferenceWeights,
    pub result: MatchResult,
    pub statistics: Statistics,
}

/// Interpret the solver's outcome. Only optimal outcomes are aggregated; every other status fails
/// the whole run.
pub fn evaluate(
    weighted: WeightedProblem<'_>,
    outcome: SolverOutcome,
) -> Result<MatchReport, MatchError> {
    let (assignment, running) = match (outcome.status, outcome.assignment, outcome.running) {
        (SolverStatus::Optimal, Some(assignment), Some(running)) => (assignment, running),
        (SolverStatus::Optimal, _, _) => {
            return Err(MatchError::Solver(
                "Solver reported an optimal solution without variable values".to_owned(),
            ))
        }
        (status, _, _) => {
            return Err(MatchError::NotOptimal {
                status,
                message: outcome.message,
            })
        }
    };
    let problem = weighted.problem;
    if assignment.dim() != (problem.students.len(), problem.courses.len()) {
        return Err(MatchError::Solver(format!(
            "Solution has dimensions {:?}, expected ({}, {})",
            assignment.dim(),
            problem.students.len(),
            problem.courses.len()
        )));
    }

    let result = aggregate(&problem.students, &assignment);
    if result.counts.no_choice > 0 || result.counts.multi_assigned > 0 {
        warn!(
            "Solution violates the model: {} assignments to unchosen courses, {} students with \
            multiple courses",
            result.counts.no_choice, result.counts.multi_assigned
        );
    }
    let statistics = stats::compute(&result.counts, problem.students.len(), &problem.scores);

    Ok(MatchReport {
        status: outcome.status,
        objective_value: outcome.objective_value.unwrap_or(0.0),
        running,
        weights: weighted.weights,
        result,
        statistics,
    })
}

/// Run the whole matching pipeline for one problem with the given policy and solver backend.
///
/// # Errors
///
/// * `MatchError::NotOptimal` if the solver does not find an optimal solution (e.g. because the
///   course minimums can't be met),
/// * `MatchError::Solver` if the solver backend fails.
pub fn solve(
    problem: &Problem,
    policy: &MatchingPolicy,
    solver: &dyn Solver,
) -> Result<MatchReport, MatchError> {
    info!(
        "Matching {} students to {} courses using {} policy",
        problem.students.len(),
        problem.courses.len(),
        policy.name
    );
    let weighted = WeightedProblem::new(problem);
    let model = weighted.build_model(policy);

    let outcome = solver.solve(&model).map_err(MatchError::Solver)?;
    info!("Status: {} ({})", outcome.status, solver.name());
    if let Some(objective_value) = outcome.objective_value {
        info!("Objective value: {}", objective_value);
    }

    evaluate(weighted, outcome)
}

/// Run the matching pipeline with the hard constraints policy and the default solver backend
pub fn solve_default(problem: &Problem) -> Result<MatchReport, MatchError> {
    solve(problem, &MatchingPolicy::HARD_CONSTRAINTS, &GoodLpSolver)
}

//! Adapter to the external MILP solver.
//!
//! The `Solver` trait is the seam between the matching pipeline and the solver backend. The
//! default implementation `GoodLpSolver` uses `good_lp` with its bundled pure Rust solver.

use crate::model::{AssignmentModel, Sense, VariableLayout};
use good_lp::{
    default_solver, variable, Expression, ProblemVariables, ResolutionError,
    Solution as LpSolution, SolverModel, Variable,
};
use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::time::Instant;

/// Terminal status of a solver run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SolverStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// The solver stopped without a definite result (e.g. numerical problems)
    NotSolved,
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverStatus::Optimal => write!(f, "Optimal"),
            SolverStatus::Infeasible => write!(f, "Infeasible"),
            SolverStatus::Unbounded => write!(f, "Unbounded"),
            SolverStatus::NotSolved => write!(f, "Not Solved"),
        }
    }
}

/// Result of a solver run. The variable values are only present for optimal solutions.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverOutcome {
    pub status: SolverStatus,
    pub message: String,
    /// Objective value of the (rounded) solution
    pub objective_value: Option<f64>,
    /// Rounded assignment variables `x[s][c]`, one row per student
    pub assignment: Option<ndarray::Array2<bool>>,
    /// Rounded run indicators `r[c]`
    pub running: Option<Vec<bool>>,
}

impl SolverOutcome {
    /// Create an optimal outcome from the solver's raw variable values. The values are rounded to
    /// exactly 0 or 1 first, as solvers may return values which are only close to integral.
    pub fn optimal(model: &AssignmentModel, values: &[f64]) -> SolverOutcome {
        let layout = &model.layout;
        let rounded: Vec<f64> = values
            .iter()
            .map(|v| if round_binary(*v) { 1.0 } else { 0.0 })
            .collect();
        let assignment = ndarray::Array2::from_shape_fn(
            [layout.num_students, layout.num_courses],
            |(s, c)| rounded[layout.assignment(s, c)] != 0.0,
        );
        let running = (0..layout.num_courses)
            .map(|c| rounded[layout.run(c)] != 0.0)
            .collect();

        SolverOutcome {
            status: SolverStatus::Optimal,
            message: "Optimal solution found".to_owned(),
            objective_value: Some(model.objective_value(&rounded)),
            assignment: Some(assignment),
            running: Some(running),
        }
    }

    /// Create an outcome without solution
    pub fn without_solution(status: SolverStatus, message: impl Into<String>) -> SolverOutcome {
        SolverOutcome {
            status,
            message: message.into(),
            objective_value: None,
            assignment: None,
            running: None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolverStatus::Optimal
    }
}

/// Coerce a solver's variable value to a binary value
pub fn round_binary(value: f64) -> bool {
    value.round() >= 1.0
}

/// A solver backend for the assignment model
pub trait Solver {
    fn name(&self) -> &str;

    /// Solve the model (maximizing the objective).
    ///
    /// A terminal non-optimal status (e.g. an infeasible model) is a successful solver run and
    /// returned as `Ok` outcome. `Err` is only returned if the solver could not be run at all.
    fn solve(&self, model: &AssignmentModel) -> Result<SolverOutcome, String>;
}

/// Solver backend using `good_lp` with its default (pure Rust) MILP solver
#[derive(Clone, Copy, Debug, Default)]
pub struct GoodLpSolver;

impl Solver for GoodLpSolver {
    fn name(&self) -> &str {
        "good_lp/microlp"
    }

    fn solve(&self, model: &AssignmentModel) -> Result<SolverOutcome, String> {
        check_variable_indexes(model)?;

        // Constraints without any variable can't be passed to the solver. They are either
        // trivially fulfilled or make the whole model infeasible.
        for constraint in model.constraints.iter().filter(|c| c.terms.is_empty()) {
            if !constraint.is_satisfied_by(&[]) {
                return Ok(SolverOutcome::without_solution(
                    SolverStatus::Infeasible,
                    format!("Constraint {} can never be satisfied", constraint.name),
                ));
            }
        }
        if model.layout.is_empty() {
            return Ok(SolverOutcome::optimal(model, &[]));
        }

        let start_time = Instant::now();
        let mut vars = ProblemVariables::new();
        let lp_variables: Vec<Variable> = (0..model.layout.len())
            .map(|v| vars.add(variable().binary().name(model.layout.name(v))))
            .collect();

        let mut objective: Expression = 0.into();
        for (v, coeff) in model.objective.iter() {
            objective += *coeff * lp_variables[*v];
        }

        let mut problem = vars.maximise(objective).using(default_solver);
        for constraint in model.constraints.iter().filter(|c| !c.terms.is_empty()) {
            let mut lhs: Expression = 0.into();
            for (v, coeff) in constraint.terms.iter() {
                lhs += *coeff * lp_variables[*v];
            }
            problem = match constraint.sense {
                Sense::LessEqual => problem.with(lhs.leq(constraint.rhs)),
                Sense::GreaterEqual => problem.with(lhs.geq(constraint.rhs)),
            };
        }

        info!(
            "Starting MILP solver with {} variables and {} constraints ...",
            lp_variables.len(),
            model.constraints.len()
        );
        let result = problem.solve();
        debug!(
            "Solver finished after {:.3}s",
            start_time.elapsed().as_secs_f64()
        );

        Ok(match result {
            Ok(solution) => {
                let values: Vec<f64> = lp_variables.iter().map(|v| solution.value(*v)).collect();
                SolverOutcome::optimal(model, &values)
            }
            Err(ResolutionError::Infeasible) => SolverOutcome::without_solution(
                SolverStatus::Infeasible,
                "Problem is infeasible: no assignment satisfies all course size constraints",
            ),
            Err(ResolutionError::Unbounded) => SolverOutcome::without_solution(
                SolverStatus::Unbounded,
                "Problem is unbounded",
            ),
            Err(e) => SolverOutcome::without_solution(
                SolverStatus::NotSolved,
                format!("Solver failed: {:?}", e),
            ),
        })
    }
}

/// Make sure all terms of the model reference existing variables
fn check_variable_indexes(model: &AssignmentModel) -> Result<(), String> {
    let layout: &VariableLayout = &model.layout;
    let terms = model
        .objective
        .iter()
        .map(|term| ("objective", term))
        .chain(model.constraints.iter().flat_map(|c| {
            c.terms.iter().map(move |term| (c.name.as_str(), term))
        }));
    for (name, (v, _)) in terms {
        if *v >= layout.len() {
            return Err(format!(
                "{} references variable {}, but the model has only {} variables",
                name,
                v,
                layout.len()
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{round_binary, GoodLpSolver, Solver, SolverOutcome, SolverStatus};
    use crate::model::{AssignmentModel, LinearConstraint, Sense, VariableLayout};

    #[test]
    fn rounding() {
        assert!(round_binary(1.0));
        assert!(round_binary(0.9999999));
        assert!(round_binary(1.0000002));
        assert!(!round_binary(0.0));
        assert!(!round_binary(1e-7));
        assert!(!round_binary(-1e-7));
    }

    #[test]
    fn optimal_outcome_rounds_values() {
        let model = AssignmentModel {
            layout: VariableLayout::new(2, 1),
            objective: vec![(0, 5.0), (1, 3.0)],
            constraints: Vec::new(),
        };
        let outcome = SolverOutcome::optimal(&model, &[0.9999998, 2e-8, 1.0000001]);

        assert!(outcome.is_optimal());
        let assignment = outcome.assignment.unwrap();
        assert_eq!(assignment.dim(), (2, 1));
        assert!(assignment[[0, 0]]);
        assert!(!assignment[[1, 0]]);
        assert_eq!(outcome.running, Some(vec![true]));
        assert_eq!(outcome.objective_value, Some(5.0));
    }

    #[test]
    fn violated_constant_constraint() {
        let model = AssignmentModel {
            layout: VariableLayout::new(0, 0),
            objective: Vec::new(),
            constraints: vec![LinearConstraint::new(
                "broken".to_owned(),
                Vec::new(),
                Sense::GreaterEqual,
                1.0,
            )],
        };
        let outcome = GoodLpSolver.solve(&model).unwrap();
        assert_eq!(outcome.status, SolverStatus::Infeasible);
        assert!(outcome.assignment.is_none());
    }

    #[test]
    fn invalid_variable_index() {
        let model = AssignmentModel {
            layout: VariableLayout::new(1, 1),
            objective: vec![(7, 1.0)],
            constraints: Vec::new(),
        };
        assert!(GoodLpSolver.solve(&model).is_err());
    }

    #[test]
    fn empty_model() {
        let model = AssignmentModel {
            layout: VariableLayout::new(0, 0),
            objective: Vec::new(),
            constraints: Vec::new(),
        };
        let outcome = GoodLpSolver.solve(&model).unwrap();
        assert!(outcome.is_optimal());
        assert_eq!(outcome.objective_value, Some(0.0));
    }

    #[test]
    fn solve_small_model() {
        // Two students, one course with room for one of them: the higher weight wins.
        let layout = VariableLayout::new(2, 1);
        let model = AssignmentModel {
            layout,
            objective: vec![(layout.assignment(0, 0), 1.0), (layout.assignment(1, 0), 5.0)],
            constraints: vec![
                LinearConstraint::new(
                    "C0M".to_owned(),
                    vec![
                        (layout.assignment(0, 0), 1.0),
                        (layout.assignment(1, 0), 1.0),
                        (layout.run(0), -1.0),
                    ],
                    Sense::LessEqual,
                    0.0,
                ),
            ],
        };
        let outcome = GoodLpSolver.solve(&model).unwrap();

        assert_eq!(outcome.status, SolverStatus::Optimal);
        let assignment = outcome.assignment.unwrap();
        assert!(!assignment[[0, 0]]);
        assert!(assignment[[1, 0]]);
        assert_eq!(outcome.running, Some(vec![true]));
        assert_eq!(outcome.objective_value, Some(5.0));
    }

    #[test]
    fn solve_infeasible_model() {
        let layout = VariableLayout::new(1, 1);
        let model = AssignmentModel {
            layout,
            objective: vec![(layout.assignment(0, 0), 1.0)],
            constraints: vec![
                LinearConstraint::new(
                    "C0m".to_owned(),
                    vec![(layout.assignment(0, 0), 1.0)],
                    Sense::GreaterEqual,
                    2.0,
                ),
            ],
        };
        let outcome = GoodLpSolver.solve(&model).unwrap();
        assert_eq!(outcome.status, SolverStatus::Infeasible);
        assert!(!outcome.is_optimal());
    }
}

//! Construction of the mixed integer linear program for the course assignment problem.
//!
//! The model is solver independent: variables are identified by their index (see
//! `VariableLayout`), constraints and the objective are lists of `(variable, coefficient)` terms.
//! The `solver` module translates it to the actual solver backend.
//!
//! Which objective and which constraint families make up the model is defined by a
//! `MatchingPolicy`. Currently, there is only the `MatchingPolicy::HARD_CONSTRAINTS` policy, which
//! enforces each running course's minimum and maximum size and cancels courses which can't be
//! filled.

use crate::weights::PreferenceWeights;
use crate::Course;
use log::debug;
use std::fmt;


/// Index of a variable in the model
pub type VarIndex = usize;

/// Linear expression as list of (variable, coefficient) terms
pub type Terms = Vec<(VarIndex, f64)>;

/// Layout of the model's variables.
///
/// The first `S*C` variables are the binary assignment variables `x[s][c]` ("student s is assigned
/// to course c"), stored row-wise. They are followed by `C` binary run indicator variables `r[c]`
/// ("course c takes place").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariableLayout {
    pub num_students: usize,
    pub num_courses: usize,
}

impl VariableLayout {
    pub fn new(num_students: usize, num_courses: usize) -> Self {
        VariableLayout {
            num_students,
            num_courses,
        }
    }

    /// Index of the assignment variable `x[student][course]`
    pub fn assignment(&self, student: usize, course: usize) -> VarIndex {
        student * self.num_courses + course
    }

    /// Index of the run indicator variable `r[course]`
    pub fn run(&self, course: usize) -> VarIndex {
        self.num_students * self.num_courses + course
    }

    /// Total number of variables
    pub fn len(&self) -> usize {
        (self.num_students + 1) * self.num_courses
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human readable variable name: `S{s}C{c}` for assignment variables, `C{c}r` for run
    /// indicators.
    pub fn name(&self, var: VarIndex) -> String {
        let num_assignments = self.num_students * self.num_courses;
        if var < num_assignments {
            format!("S{}C{}", var / self.num_courses, var % self.num_courses)
        } else {
            format!("C{}r", var - num_assignments)
        }
    }
}

/// Comparison sense of a linear constraint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    LessEqual,
    GreaterEqual,
}

/// A linear constraint `Σ coefficient·variable  (≤|≥)  rhs`
#[derive(Clone, Debug, PartialEq)]
pub struct LinearConstraint {
    pub name: String,
    pub terms: Terms,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn new(name: String, terms: Terms, sense: Sense, rhs: f64) -> Self {
        LinearConstraint {
            name,
            terms,
            sense,
            rhs,
        }
    }

    /// Value of the constraint's left hand side for the given variable values
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|(v, coeff)| coeff * values[*v]).sum()
    }

    /// Check if the constraint holds for the given variable values (with some numerical tolerance)
    pub fn is_satisfied_by(&self, values: &[f64]) -> bool {
        const TOLERANCE: f64 = 1e-6;
        let lhs = self.lhs(values);
        match self.sense {
            Sense::LessEqual => lhs <= self.rhs + TOLERANCE,
            Sense::GreaterEqual => lhs >= self.rhs - TOLERANCE,
        }
    }
}

/// Everything the objective and constraint builders of a `MatchingPolicy` may use
pub struct ModelContext<'a> {
    pub courses: &'a [Course],
    pub weights: &'a PreferenceWeights,
    pub layout: VariableLayout,
}

/// Builds the objective terms (to be maximized)
pub type ObjectiveBuilder = fn(&ModelContext<'_>) -> Terms;
/// Builds one family of constraints
pub type ConstraintBuilder = fn(&ModelContext<'_>) -> Vec<LinearConstraint>;

/// Strategy for building the model: the objective function and the constraint families
#[derive(Clone, Copy)]
pub struct MatchingPolicy {
    pub name: &'static str,
    pub objective: ObjectiveBuilder,
    pub constraints: &'static [ConstraintBuilder],
}

impl MatchingPolicy {
    /// Maximize the students' preference weights, such that each student is assigned to at most
    /// one of their chosen courses and each course either is cancelled or has between `num_min`
    /// and `num_max` students.
    pub const HARD_CONSTRAINTS: MatchingPolicy = MatchingPolicy {
        name: "hard constraints",
        objective: preference_objective,
        constraints: &[
            capacity_constraints,
            single_assignment_constraints,
            preference_constraints,
        ],
    };
}

impl Default for MatchingPolicy {
    fn default() -> Self {
        MatchingPolicy::HARD_CONSTRAINTS
    }
}

impl fmt::Debug for MatchingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchingPolicy")
            .field("name", &self.name)
            .field("constraint_families", &self.constraints.len())
            .finish()
    }
}

/// The complete model of one matching run. All variables are binary; the objective is maximized.
#[derive(Clone, Debug)]
pub struct AssignmentModel {
    pub layout: VariableLayout,
    pub objective: Terms,
    pub constraints: Vec<LinearConstraint>,
}

impl AssignmentModel {
    /// Value of the objective function for the given variable values
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .iter()
            .map(|(v, coeff)| coeff * values[*v])
            .sum()
    }

    /// Names of all constraints, which are violated by the given variable values
    pub fn violated_constraints(&self, values: &[f64]) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied_by(values))
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Build the model for the given courses and preference weights, using the given policy.
pub fn build_model(
    courses: &[Course],
    weights: &PreferenceWeights,
    policy: &MatchingPolicy,
) -> AssignmentModel {
    let layout = VariableLayout::new(weights.num_students(), courses.len());
    let context = ModelContext {
        courses,
        weights,
        layout,
    };

    let objective = (policy.objective)(&context);
    let constraints: Vec<LinearConstraint> = policy
        .constraints
        .iter()
        .flat_map(|builder| builder(&context))
        .collect();
    debug!(
        "Built model with policy '{}': {} variables, {} objective terms, {} constraints",
        policy.name,
        layout.len(),
        objective.len(),
        constraints.len()
    );

    AssignmentModel {
        layout,
        objective,
        constraints,
    }
}

/// Objective: `Σ_s Σ_c w[s][c]·x[s][c]`
pub fn preference_objective(context: &ModelContext<'_>) -> Terms {
    let layout = &context.layout;
    let mut terms = Terms::new();
    for s in 0..layout.num_students {
        for c in 0..layout.num_courses {
            let weight = context.weights.get(s, c);
            if weight != 0 {
                terms.push((layout.assignment(s, c), weight as f64));
            }
        }
    }
    terms
}

/// For each course c: `Σ_s x[s][c] ≥ min[c]·r[c]` and `Σ_s x[s][c] ≤ max[c]·r[c]`.
///
/// A cancelled course (`r[c] = 0`) has no students, a running course has between `num_min` and
/// `num_max` students.
pub fn capacity_constraints(context: &ModelContext<'_>) -> Vec<LinearConstraint> {
    let layout = &context.layout;
    let mut constraints = Vec::with_capacity(2 * layout.num_courses);
    for (c, course) in context.courses.iter().enumerate() {
        let students: Terms = (0..layout.num_students)
            .map(|s| (layout.assignment(s, c), 1.0))
            .collect();

        let mut min_terms = students.clone();
        min_terms.push((layout.run(c), -(course.num_min as f64)));
        constraints.push(LinearConstraint::new(
            format!("C{}m", c),
            min_terms,
            Sense::GreaterEqual,
            0.0,
        ));

        let mut max_terms = students;
        max_terms.push((layout.run(c), -(course.num_max as f64)));
        constraints.push(LinearConstraint::new(
            format!("C{}M", c),
            max_terms,
            Sense::LessEqual,
            0.0,
        ));
    }
    constraints
}

/// For each student s: `Σ_c x[s][c] ≤ 1`
pub fn single_assignment_constraints(context: &ModelContext<'_>) -> Vec<LinearConstraint> {
    let layout = &context.layout;
    (0..layout.num_students)
        .map(|s| {
            LinearConstraint::new(
                format!("S{}a", s),
                (0..layout.num_courses)
                    .map(|c| (layout.assignment(s, c), 1.0))
                    .collect(),
                Sense::LessEqual,
                1.0,
            )
        })
        .collect()
}

/// For each student s: `Σ_{c: w[s][c] = 0} x[s][c] ≤ 0`, i.e. students may only be assigned to
/// courses they have chosen.
pub fn preference_constraints(context: &ModelContext<'_>) -> Vec<LinearConstraint> {
    let layout = &context.layout;
    (0..layout.num_students)
        .map(|s| {
            LinearConstraint::new(
                format!("S{}p", s),
                (0..layout.num_courses)
                    .filter(|c| context.weights.get(s, *c) == 0)
                    .map(|c| (layout.assignment(s, c), 1.0))
                    .collect(),
                Sense::LessEqual,
                0.0,
            )
        })
        .collect()
}

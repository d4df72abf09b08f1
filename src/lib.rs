//! Assignment of students to courses, based on three ranked course choices per student and
//! minimum/maximum sizes per course.
//!
//! The assignment is calculated by a mixed integer linear program: `weights` derives the
//! objective coefficients from the students' choices, `model` builds the linear model, `solver`
//! hands it to a MILP solver and `aggregate`/`stats` interpret the solver's variable values.
//! `matcher` glues these stages together.

pub mod aggregate;
pub mod io;
pub mod matcher;
pub mod model;
pub mod solver;
pub mod stats;
pub mod weights;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::solver::SolverStatus;

/// One course choice slot of a student, as given in the input data
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Choice {
    /// 1-based number of the chosen course
    Course(usize),
    /// Anything else (an empty cell, a text, ...). The raw value is kept for the report output.
    Invalid(String),
}

impl Choice {
    /// Interpret a textual table cell as course choice. Every cell, which is not an unsigned
    /// integer, results in an `Invalid` choice.
    pub fn parse(cell: &str) -> Choice {
        match cell.trim().parse::<usize>() {
            Ok(number) => Choice::Course(number),
            Err(_) => Choice::Invalid(cell.to_owned()),
        }
    }

    /// 0-based index of the chosen course, if this is a valid course reference
    pub fn course_index(&self) -> Option<usize> {
        match self {
            Choice::Course(number) if *number >= 1 => Some(number - 1),
            _ => None,
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Course(number) => write!(f, "{}", number),
            Choice::Invalid(raw) => write!(f, "{}", raw),
        }
    }
}

/// Representation of a student's data
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Student {
    /// index of the Student in the list of students
    pub index: usize,
    pub first_name: String,
    pub last_name: String,
    /// First, second and third course choice
    pub choices: [Choice; 3],
}

impl Student {
    /// 1-based id of the student, as used in the report output
    pub fn id(&self) -> usize {
        self.index + 1
    }

    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Check if all three choices are valid course references and pairwise different.
    ///
    /// Students failing this check are "bullet voting": They are still assignable to each of
    /// their valid choices, but don't earn the full rank scores.
    pub fn has_unique_choices(&self) -> bool {
        let [c1, c2, c3] = &self.choices;
        c1.course_index().is_some()
            && c2.course_index().is_some()
            && c3.course_index().is_some()
            && c1 != c2
            && c1 != c3
            && c2 != c3
    }

    /// Get the rank (0 = first choice) of the given course in this student's choices. If the
    /// course has been chosen multiple times, the best rank is returned.
    pub fn choice_rank(&self, course_index: usize) -> Option<usize> {
        self.choices
            .iter()
            .position(|choice| choice.course_index() == Some(course_index))
    }
}

/// Representation of a course's data
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Course {
    /// index of the Course in the list of courses
    pub index: usize,
    pub name: String,
    /// Minimum number of students, if the course takes place
    pub num_min: usize,
    /// Maximum number of students
    pub num_max: usize,
}

impl Course {
    /// 1-based course number, as used in the students' choices and the report output
    pub fn id(&self) -> usize {
        self.index + 1
    }
}

/// Objective scores for an assignment to a student's first, second and third choice
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankScores {
    pub first: u32,
    pub second: u32,
    pub third: u32,
}

impl RankScores {
    /// Score of the given choice rank (0 = first choice)
    pub fn score(&self, rank: usize) -> u32 {
        match rank {
            0 => self.first,
            1 => self.second,
            2 => self.third,
            _ => 0,
        }
    }
}

impl Default for RankScores {
    fn default() -> Self {
        RankScores {
            first: 5,
            second: 3,
            third: 1,
        }
    }
}

/// Failure of a single matching run
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The input data is inconsistent. Detected before building the model.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The solver terminated without an optimal solution (e.g. the model is infeasible)
    #[error("No optimal assignment found (solver status: {status}): {message}")]
    NotOptimal {
        status: SolverStatus,
        message: String,
    },

    /// The solver backend could not be run at all
    #[error("Solver execution failed: {0}")]
    Solver(String),
}

/// Student data as parallel columns of a students table
#[derive(Clone, Debug, Default)]
pub struct StudentColumns {
    pub first_names: Vec<String>,
    pub last_names: Vec<String>,
    pub first_choices: Vec<Choice>,
    pub second_choices: Vec<Choice>,
    pub third_choices: Vec<Choice>,
}

/// Course data as parallel columns of a courses table
#[derive(Clone, Debug, Default)]
pub struct CourseColumns {
    pub names: Vec<String>,
    pub mins: Vec<usize>,
    pub maxs: Vec<usize>,
}

/// A validated matching problem: the input of a single matching run
#[derive(Clone, Debug)]
pub struct Problem {
    pub students: Vec<Student>,
    pub courses: Vec<Course>,
    pub scores: RankScores,
}

impl Problem {
    /// Create a problem from students and courses, after checking the input data for
    /// consistency.
    ///
    /// # Errors
    ///
    /// Fails with `MatchError::InvalidInput` if
    /// * any Student's or Course's `index` does not match its position in the list,
    /// * any course has `num_min > num_max`,
    /// * any choice references a course number outside of `1..=courses.len()`,
    /// * any rank score is zero.
    pub fn new(
        students: Vec<Student>,
        courses: Vec<Course>,
        scores: RankScores,
    ) -> Result<Problem, MatchError> {
        if scores.first == 0 || scores.second == 0 || scores.third == 0 {
            return Err(MatchError::InvalidInput(format!(
                "Rank scores must be at least 1, got ({}, {}, {})",
                scores.first, scores.second, scores.third
            )));
        }
        for (i, course) in courses.iter().enumerate() {
            if course.index != i {
                return Err(MatchError::InvalidInput(format!(
                    "Course '{}' has index {} at position {}",
                    course.name, course.index, i
                )));
            }
            if course.num_min > course.num_max {
                return Err(MatchError::InvalidInput(format!(
                    "Min students > max students for course '{}'",
                    course.name
                )));
            }
        }
        for (i, student) in students.iter().enumerate() {
            if student.index != i {
                return Err(MatchError::InvalidInput(format!(
                    "Student '{}' has index {} at position {}",
                    student.name(),
                    student.index,
                    i
                )));
            }
            for choice in student.choices.iter() {
                if let Choice::Course(number) = choice {
                    if *number == 0 || *number > courses.len() {
                        return Err(MatchError::InvalidInput(format!(
                            "Student '{}' (id={}) chose course {}, but there are only {} courses",
                            student.name(),
                            student.id(),
                            number,
                            courses.len()
                        )));
                    }
                }
            }
        }

        Ok(Problem {
            students,
            courses,
            scores,
        })
    }

    /// Create a problem from the parallel columns of a students table and a courses table.
    ///
    /// # Errors
    ///
    /// Fails with `MatchError::InvalidInput` if the columns of one table differ in length, or
    /// for any reason listed at `Problem::new()`.
    pub fn from_columns(
        students: StudentColumns,
        courses: CourseColumns,
        scores: RankScores,
    ) -> Result<Problem, MatchError> {
        let num_students = students.first_names.len();
        let student_lengths = [
            students.last_names.len(),
            students.first_choices.len(),
            students.second_choices.len(),
            students.third_choices.len(),
        ];
        if student_lengths.iter().any(|l| *l != num_students) {
            return Err(MatchError::InvalidInput(format!(
                "Student columns differ in length: {} first names, {} last names, {}/{}/{} choices",
                num_students,
                student_lengths[0],
                student_lengths[1],
                student_lengths[2],
                student_lengths[3]
            )));
        }
        let num_courses = courses.names.len();
        if courses.mins.len() != num_courses || courses.maxs.len() != num_courses {
            return Err(MatchError::InvalidInput(format!(
                "Course columns differ in length: {} names, {} minimum sizes, {} maximum sizes",
                num_courses,
                courses.mins.len(),
                courses.maxs.len()
            )));
        }

        let student_list = students
            .first_names
            .into_iter()
            .zip(students.last_names)
            .zip(students.first_choices)
            .zip(students.second_choices)
            .zip(students.third_choices)
            .enumerate()
            .map(
                |(index, ((((first_name, last_name), c1), c2), c3))| Student {
                    index,
                    first_name,
                    last_name,
                    choices: [c1, c2, c3],
                },
            )
            .collect();
        let course_list = courses
            .names
            .into_iter()
            .zip(courses.mins)
            .zip(courses.maxs)
            .enumerate()
            .map(|(index, ((name, num_min), num_max))| Course {
                index,
                name,
                num_min,
                num_max,
            })
            .collect();

        Problem::new(student_list, course_list, scores)
    }
}

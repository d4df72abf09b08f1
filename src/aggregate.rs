//! Interpretation of the solver's assignment variables: per student assignments, per course
//! rosters and the overall assignment counts.

use crate::{RankScores, Student};
use serde::Serialize;


/// Classification of a student's assignment by the satisfied choice rank
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Classification {
    FirstChoice,
    SecondChoice,
    ThirdChoice,
    /// Assigned to a course, which is none of the student's choices. Prevented by the model's
    /// constraints, so this should never occur.
    NoChoice,
    Unassigned,
}

impl Classification {
    fn from_rank(rank: Option<usize>) -> Classification {
        match rank {
            Some(0) => Classification::FirstChoice,
            Some(1) => Classification::SecondChoice,
            Some(2) => Classification::ThirdChoice,
            _ => Classification::NoChoice,
        }
    }
}

/// Assignment result of a single student
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssignmentResult {
    /// index of the student
    pub student: usize,
    /// Indexes of the assigned courses in ascending order. More than one entry should never occur.
    pub courses: Vec<usize>,
    /// Classification of the (first) assigned course
    pub classification: Classification,
}

impl AssignmentResult {
    pub fn is_assigned(&self) -> bool {
        !self.courses.is_empty()
    }

    pub fn is_multi_assigned(&self) -> bool {
        self.courses.len() > 1
    }

    /// Comma separated list of the assigned course numbers (1-based), e.g. "2" or "1, 4"
    pub fn course_list(&self) -> String {
        self.courses
            .iter()
            .map(|c| (c + 1).to_string())
            .collect::<Vec<String>>()
            .join(", ")
    }
}

/// Number of students per choice rank
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RankCounts {
    pub first: usize,
    pub second: usize,
    pub third: usize,
}

impl RankCounts {
    fn add(&mut self, rank: usize) {
        match rank {
            0 => self.first += 1,
            1 => self.second += 1,
            2 => self.third += 1,
            _ => (),
        }
    }

    pub fn total(&self) -> usize {
        self.first + self.second + self.third
    }

    /// Sum of the rank scores of all counted choices
    pub fn weight(&self, scores: &RankScores) -> u64 {
        scores.first as u64 * self.first as u64
            + scores.second as u64 * self.second as u64
            + scores.third as u64 * self.third as u64
    }
}

/// Choice statistics and assignment size of a single course
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CourseRoster {
    /// index of the course
    pub course: usize,
    /// Number of students, who chose this course (per rank)
    pub total_choices: RankCounts,
    /// Number of assigned students, who chose this course (per rank)
    pub assigned_choices: RankCounts,
    /// Number of assigned students
    pub num_assigned: usize,
}

/// Overall assignment counts.
///
/// The choice rank counts are counted per assigned (student, course) pair. `no_choice` and
/// `multi_assigned` must be 0 for any solution of the model. They are reported anyway, to detect
/// numerical problems of the solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentCounts {
    pub first_choice: usize,
    pub second_choice: usize,
    pub third_choice: usize,
    pub no_choice: usize,
    pub multi_assigned: usize,
    pub unassigned: usize,
}

/// Aggregated result of a matching run
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchResult {
    /// One entry per student
    pub students: Vec<AssignmentResult>,
    /// One entry per course
    pub courses: Vec<CourseRoster>,
    pub counts: AssignmentCounts,
    /// Indexes of the students with bullet voting choices, regardless of their assignment
    pub bullet_voting: Vec<usize>,
}

impl MatchResult {
    /// Indexes of the students, who are not assigned to any course
    pub fn unassigned_students(&self) -> Vec<usize> {
        self.students
            .iter()
            .filter(|r| !r.is_assigned())
            .map(|r| r.student)
            .collect()
    }
}

/// Aggregate the rounded assignment variables `assignment[[s, c]]` of a solution.
///
/// To count the total choices per course independently of the assignment, all student/course pairs
/// are visited. A choice is attributed to the first slot that names the course.
pub fn aggregate(students: &[Student], assignment: &ndarray::Array2<bool>) -> MatchResult {
    let num_courses = assignment.dim().1;
    let mut counts = AssignmentCounts::default();
    let mut courses: Vec<CourseRoster> = (0..num_courses)
        .map(|course| CourseRoster {
            course,
            ..CourseRoster::default()
        })
        .collect();
    let mut results = Vec::with_capacity(students.len());
    let mut bullet_voting = Vec::new();

    for (s, student) in students.iter().enumerate() {
        let mut assigned_courses = Vec::new();
        for (c, roster) in courses.iter_mut().enumerate() {
            let is_assigned = assignment[[s, c]];
            let rank = student.choice_rank(c);

            if let Some(rank) = rank {
                roster.total_choices.add(rank);
                if is_assigned {
                    roster.assigned_choices.add(rank);
                }
            }
            if is_assigned {
                roster.num_assigned += 1;
                match rank {
                    Some(0) => counts.first_choice += 1,
                    Some(1) => counts.second_choice += 1,
                    Some(2) => counts.third_choice += 1,
                    _ => counts.no_choice += 1,
                }
                assigned_courses.push(c);
            }
        }

        if assigned_courses.len() > 1 {
            counts.multi_assigned += 1;
        } else if assigned_courses.is_empty() {
            counts.unassigned += 1;
        }
        if !student.has_unique_choices() {
            bullet_voting.push(s);
        }

        let classification = match assigned_courses.first() {
            Some(c) => Classification::from_rank(student.choice_rank(*c)),
            None => Classification::Unassigned,
        };
        results.push(AssignmentResult {
            student: s,
            courses: assigned_courses,
            classification,
        });
    }

    MatchResult {
        students: results,
        courses,
        counts,
        bullet_voting,
    }
}

//! Calculation of the preference weights: the objective function coefficients for assigning a
//! student to a course.

use crate::{RankScores, Student};
use log::{debug, warn};

/// Type of the preference weights
pub type Weight = u32;

/// Preference weights of all students for all courses.
///
/// A weight of 0 means, the course is not an acceptable placement for the student. Each valid
/// choice of a student has a weight of at least 1.
#[derive(Clone, Debug, PartialEq)]
pub struct PreferenceWeights {
    /// One row per student, one column per course
    weights: ndarray::Array2<Weight>,
    /// Marks the students with bullet voting choices (see `Student::has_unique_choices()`)
    bullet_voting: Vec<bool>,
}

impl PreferenceWeights {
    pub fn num_students(&self) -> usize {
        self.weights.dim().0
    }

    pub fn num_courses(&self) -> usize {
        self.weights.dim().1
    }

    /// Weight of course `course` for student `student` (both 0-based indexes)
    pub fn get(&self, student: usize, course: usize) -> Weight {
        self.weights[[student, course]]
    }

    /// All course weights of one student
    pub fn row(&self, student: usize) -> ndarray::ArrayView1<Weight> {
        self.weights.row(student)
    }

    pub fn matrix(&self) -> &ndarray::Array2<Weight> {
        &self.weights
    }

    pub fn is_bullet_voting(&self, student: usize) -> bool {
        self.bullet_voting[student]
    }

    /// Indexes of all students with bullet voting choices
    pub fn bullet_voting_students(&self) -> Vec<usize> {
        self.bullet_voting
            .iter()
            .enumerate()
            .filter(|(_, bv)| **bv)
            .map(|(s, _)| s)
            .collect()
    }
}

/// Calculate the preference weights of all students.
///
/// For each valid choice `v` of rank `k` of student `s`, the weight is set to
/// `(w_k - 1) * uniqueness + 1`, where `uniqueness` is 1 if the student's choices are valid and
/// pairwise different and 0 otherwise. Thus, bullet voting students get a weight of 1 for each of
/// their valid choices.
///
/// The choices are evaluated in rank order. If a course is chosen at multiple ranks, the weight of
/// the later choice overwrites the earlier one.
pub fn build_weights(
    students: &[Student],
    num_courses: usize,
    scores: &RankScores,
) -> PreferenceWeights {
    let mut weights = ndarray::Array2::<Weight>::zeros([students.len(), num_courses]);
    let mut bullet_voting = vec![false; students.len()];

    for (s, student) in students.iter().enumerate() {
        let uniqueness: Weight = if student.has_unique_choices() { 1 } else { 0 };
        bullet_voting[s] = uniqueness == 0;

        for (rank, choice) in student.choices.iter().enumerate() {
            if let Some(c) = choice.course_index() {
                if c >= num_courses {
                    warn!(
                        "Ignoring choice {} of student '{}', which is not a valid course.",
                        choice,
                        student.name()
                    );
                    continue;
                }
                weights[[s, c]] = scores.score(rank).saturating_sub(1) * uniqueness + 1;
            }
        }
    }
    debug!(
        "Calculated preference weights for {} students, {} of them bullet voting",
        students.len(),
        bullet_voting.iter().filter(|bv| **bv).count()
    );

    PreferenceWeights {
        weights,
        bullet_voting,
    }
}

#[cfg(test)]
mod tests {
    use super::build_weights;
    use crate::tests::student;
    use crate::Choice::{Course, Invalid};
    use crate::RankScores;

    #[test]
    fn unique_choices_get_rank_scores() {
        let students = vec![student(0, [Course(1), Course(2), Course(3)])];
        let weights = build_weights(&students, 5, &RankScores::default());

        assert_eq!(weights.row(0).to_vec(), vec![5, 3, 1, 0, 0]);
        assert!(!weights.is_bullet_voting(0));
        assert!(weights.bullet_voting_students().is_empty());
    }

    #[test]
    fn custom_rank_scores() {
        let students = vec![student(0, [Course(3), Course(1), Course(2)])];
        let scores = RankScores {
            first: 10,
            second: 4,
            third: 2,
        };
        let weights = build_weights(&students, 3, &scores);

        assert_eq!(weights.row(0).to_vec(), vec![4, 2, 10]);
    }

    #[test]
    fn duplicate_choices_are_bullet_voting() {
        let students = vec![student(0, [Course(2), Course(5), Course(2)])];
        let weights = build_weights(&students, 5, &RankScores::default());

        assert!(weights.is_bullet_voting(0));
        assert_eq!(weights.get(0, 1), 1);
        assert_eq!(weights.get(0, 4), 1);
        assert_eq!(weights.row(0).to_vec(), vec![0, 1, 0, 0, 1]);
    }

    #[test]
    fn invalid_choices_are_bullet_voting() {
        let students = vec![
            student(0, [Course(1), Invalid("".to_owned()), Course(3)]),
            student(1, [Invalid("?".to_owned()), Invalid("".to_owned()), Invalid("".to_owned())]),
        ];
        let weights = build_weights(&students, 3, &RankScores::default());

        assert_eq!(weights.row(0).to_vec(), vec![1, 0, 1]);
        assert_eq!(weights.row(1).to_vec(), vec![0, 0, 0]);
        assert_eq!(weights.bullet_voting_students(), vec![0, 1]);
    }

    #[test]
    fn repeated_course_keeps_minimum_weight() {
        // A repeated course always makes the choices non-unique. So every slot writes the weight
        // 1 and the later slot overwriting the earlier one yields the same result.
        let students = vec![
            student(0, [Course(1), Course(1), Course(2)]),
            student(1, [Course(2), Course(1), Course(1)]),
            student(2, [Course(2), Course(2), Course(2)]),
        ];
        let weights = build_weights(&students, 2, &RankScores::default());

        assert_eq!(weights.row(0).to_vec(), vec![1, 1]);
        assert_eq!(weights.row(1).to_vec(), vec![1, 1]);
        assert_eq!(weights.row(2).to_vec(), vec![0, 1]);
        assert_eq!(weights.num_students(), 3);
        assert_eq!(weights.num_courses(), 2);
    }

    #[test]
    fn no_students() {
        let weights = build_weights(&[], 4, &RankScores::default());
        assert_eq!(weights.num_students(), 0);
        assert_eq!(weights.num_courses(), 4);
    }
}

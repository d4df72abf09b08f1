pub mod report;
pub mod simple;

use crate::matcher::MatchReport;
use crate::Problem;
use std::fmt::Write;

/// Format the calculated course assignment into a human readable String (e.g. to print it to
/// stdout).
///
/// The output format will look like
/// ```text
/// ===== 1. Course name (2 students) =====
/// Anton Administrator
/// Bertalotta Beispiel (2nd choice)
///
/// ===== 2. Another course name (cancelled) =====
///
/// ===== Unassigned (1 students) =====
/// Charly Clown
/// …
/// ```
pub fn format_assignment(problem: &Problem, report: &MatchReport) -> String {
    let mut result = String::new();
    for (c, course) in problem.courses.iter().enumerate() {
        let roster = &report.result.courses[c];
        if report.running.get(c).copied().unwrap_or(false) || roster.num_assigned > 0 {
            writeln!(
                result,
                "\n===== {}. {} ({} students) =====",
                course.id(),
                course.name,
                roster.num_assigned
            )
            .unwrap();
        } else {
            writeln!(
                result,
                "\n===== {}. {} (cancelled) =====",
                course.id(),
                course.name
            )
            .unwrap();
        }
        for assignment in report.result.students.iter() {
            if assignment.courses.contains(&c) {
                let student = &problem.students[assignment.student];
                writeln!(
                    result,
                    "{}{}",
                    student.name(),
                    match student.choice_rank(c) {
                        Some(0) => "",
                        Some(1) => " (2nd choice)",
                        Some(2) => " (3rd choice)",
                        _ => " (no choice)",
                    }
                )
                .unwrap();
            }
        }
    }

    let unassigned = report.result.unassigned_students();
    if !unassigned.is_empty() {
        writeln!(
            result,
            "\n===== Unassigned ({} students) =====",
            unassigned.len()
        )
        .unwrap();
        for s in unassigned {
            writeln!(result, "{}", problem.students[s].name()).unwrap();
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use crate::matcher::solve_default;
    use crate::tests::{course, student};
    use crate::Choice::Course as C;
    use crate::{Problem, RankScores};

    #[test]
    fn test_format_assignment() {
        let problem = Problem::new(
            vec![
                student(0, [C(1), C(2), C(3)]),
                student(1, [C(1), C(2), C(3)]),
                student(2, [C(3), C(3), C(3)]),
            ],
            vec![course(0, 1, 1), course(1, 1, 2), course(2, 2, 2)],
            RankScores::default(),
        )
        .unwrap();
        let report = solve_default(&problem).unwrap();
        let text = super::format_assignment(&problem, &report);

        assert!(text.contains("===== 1. Course 1 (1 students) ====="));
        assert!(text.contains("===== 2. Course 2 (1 students) ====="));
        assert!(text.contains("===== 3. Course 3 (cancelled) ====="));
        assert!(text.contains(" (2nd choice)\n"));
        assert!(text.contains("===== Unassigned (1 students) =====\nStudent 2\n"));
    }
}

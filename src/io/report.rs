//! Tabular report records of a matching run and their JSON output

use crate::aggregate::CourseRoster;
use crate::matcher::MatchReport;
use crate::solver::SolverStatus;
use crate::{Choice, Course, Problem, RankScores, Student};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Column names of the course records, in output order
pub const COURSE_COLUMNS: [&str; 14] = [
    "Course number",
    "Course name",
    "Total Choices",
    "Total First choices",
    "Total Second choices",
    "Total Third choices",
    "Weight",
    "Minimum class size",
    "Maximum class size",
    "Students assigned",
    "Assigned First choices",
    "Assigned Second choices",
    "Assigned Third choices",
    "Assigned Weight",
];

/// Column names of the student records, in output order. Records of unassigned students don't
/// have the last column.
pub const STUDENT_COLUMNS: [&str; 7] = [
    "Student ID",
    "First Name",
    "Last Name",
    "First choice",
    "Second choice",
    "Third choice",
    "Course Assignment",
];

/// One row of the courses table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CourseRecord {
    #[serde(rename = "Course number")]
    pub number: usize,
    #[serde(rename = "Course name")]
    pub name: String,
    #[serde(rename = "Total Choices")]
    pub total_choices: usize,
    #[serde(rename = "Total First choices")]
    pub total_first: usize,
    #[serde(rename = "Total Second choices")]
    pub total_second: usize,
    #[serde(rename = "Total Third choices")]
    pub total_third: usize,
    /// Sum of the rank scores of all choices of this course
    #[serde(rename = "Weight")]
    pub weight: u64,
    #[serde(rename = "Minimum class size")]
    pub num_min: usize,
    #[serde(rename = "Maximum class size")]
    pub num_max: usize,
    #[serde(rename = "Students assigned")]
    pub num_assigned: usize,
    #[serde(rename = "Assigned First choices")]
    pub assigned_first: usize,
    #[serde(rename = "Assigned Second choices")]
    pub assigned_second: usize,
    #[serde(rename = "Assigned Third choices")]
    pub assigned_third: usize,
    /// Sum of the rank scores of the assigned students' choices of this course
    #[serde(rename = "Assigned Weight")]
    pub assigned_weight: u64,
}

impl CourseRecord {
    pub fn new(course: &Course, roster: &CourseRoster, scores: &RankScores) -> CourseRecord {
        CourseRecord {
            number: course.id(),
            name: course.name.clone(),
            total_choices: roster.total_choices.total(),
            total_first: roster.total_choices.first,
            total_second: roster.total_choices.second,
            total_third: roster.total_choices.third,
            weight: roster.total_choices.weight(scores),
            num_min: course.num_min,
            num_max: course.num_max,
            num_assigned: roster.num_assigned,
            assigned_first: roster.assigned_choices.first,
            assigned_second: roster.assigned_choices.second,
            assigned_third: roster.assigned_choices.third,
            assigned_weight: roster.assigned_choices.weight(scores),
        }
    }
}

/// One row of a students table.
///
/// `assignment` is `None` for the unassigned students table, which has no "Course Assignment"
/// column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StudentRecord {
    #[serde(rename = "Student ID")]
    pub id: usize,
    #[serde(rename = "First Name")]
    pub first_name: String,
    #[serde(rename = "Last Name")]
    pub last_name: String,
    #[serde(rename = "First choice")]
    pub first_choice: Choice,
    #[serde(rename = "Second choice")]
    pub second_choice: Choice,
    #[serde(rename = "Third choice")]
    pub third_choice: Choice,
    #[serde(
        rename = "Course Assignment",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignment: Option<String>,
}

impl StudentRecord {
    pub fn new(student: &Student, assignment: Option<String>) -> StudentRecord {
        let [first_choice, second_choice, third_choice] = student.choices.clone();
        StudentRecord {
            id: student.id(),
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            first_choice,
            second_choice,
            third_choice,
            assignment,
        }
    }
}

/// All tables of a matching run's report
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportTables {
    pub courses: Vec<CourseRecord>,
    /// Assigned students only
    pub students: Vec<StudentRecord>,
    /// Bullet voting students, regardless of their assignment
    pub bullet_voting: Vec<StudentRecord>,
    pub unassigned: Vec<StudentRecord>,
}

pub fn course_records(problem: &Problem, report: &MatchReport) -> Vec<CourseRecord> {
    problem
        .courses
        .iter()
        .zip(report.result.courses.iter())
        .map(|(course, roster)| CourseRecord::new(course, roster, &problem.scores))
        .collect()
}

/// Build all report tables of a matching run
pub fn tables(problem: &Problem, report: &MatchReport) -> ReportTables {
    let results = &report.result.students;
    let students = results
        .iter()
        .filter(|r| r.is_assigned())
        .map(|r| StudentRecord::new(&problem.students[r.student], Some(r.course_list())))
        .collect();
    let bullet_voting = report
        .result
        .bullet_voting
        .iter()
        .map(|s| StudentRecord::new(&problem.students[*s], Some(results[*s].course_list())))
        .collect();
    let unassigned = report
        .result
        .unassigned_students()
        .into_iter()
        .map(|s| StudentRecord::new(&problem.students[s], None))
        .collect();

    ReportTables {
        courses: course_records(problem, report),
        students,
        bullet_voting,
        unassigned,
    }
}

/// One line of the statistics summary
#[derive(Serialize)]
struct SummaryLine {
    label: &'static str,
    value: String,
}

/// Contents of a report file. The records are serialized directly, so their fields keep the
/// column order.
#[derive(Serialize)]
struct ReportFile<'a> {
    format: &'static str,
    version: &'static str,
    timestamp: String,
    scores: RankScores,
    status: SolverStatus,
    objective_value: f64,
    statistics: Vec<SummaryLine>,
    course_columns: &'static [&'static str],
    student_columns: &'static [&'static str],
    #[serde(flatten)]
    tables: &'a ReportTables,
}

/// Write the report of a matching run as JSON: statistics summary, column names and all tables.
pub fn write<W: std::io::Write>(
    writer: W,
    problem: &Problem,
    report: &MatchReport,
) -> Result<(), String> {
    let statistics = report
        .statistics
        .summary()
        .into_iter()
        .map(|(label, value)| SummaryLine { label, value })
        .collect();
    let tables = tables(problem, report);

    let data = ReportFile {
        format: "X-coursematch-report",
        version: "1.0",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, false),
        scores: problem.scores,
        status: report.status,
        objective_value: report.objective_value,
        statistics,
        course_columns: &COURSE_COLUMNS,
        student_columns: &STUDENT_COLUMNS,
        tables: &tables,
    };
    serde_json::to_writer_pretty(writer, &data).map_err(|e| format!("{}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{tables, write, StudentRecord, COURSE_COLUMNS, STUDENT_COLUMNS};
    use crate::matcher::{solve_default, MatchReport};
    use crate::tests::{course, student};
    use crate::Choice::{Course as C, Invalid};
    use crate::{Problem, RankScores};

    fn solved_problem() -> (Problem, MatchReport) {
        // Student 2 is bullet voting and can't be assigned, since course 3 can't reach its
        // minimum size.
        let problem = Problem::new(
            vec![
                student(0, [C(1), C(2), C(3)]),
                student(1, [C(1), C(2), C(3)]),
                student(2, [C(3), C(3), Invalid("x".to_owned())]),
            ],
            vec![course(0, 1, 1), course(1, 1, 2), course(2, 2, 2)],
            RankScores::default(),
        )
        .unwrap();
        let report = solve_default(&problem).unwrap();
        (problem, report)
    }

    #[test]
    fn report_tables() {
        let (problem, report) = solved_problem();
        let tables = tables(&problem, &report);

        assert_eq!(tables.courses.len(), 3);
        let c0 = &tables.courses[0];
        assert_eq!(c0.number, 1);
        assert_eq!(c0.name, "Course 1");
        assert_eq!(c0.total_choices, 2);
        assert_eq!(c0.total_first, 2);
        assert_eq!(c0.weight, 10);
        assert_eq!(c0.num_assigned, 1);
        assert_eq!(c0.assigned_first, 1);
        assert_eq!(c0.assigned_weight, 5);
        let c1 = &tables.courses[1];
        assert_eq!(c1.total_second, 2);
        assert_eq!(c1.assigned_second, 1);
        assert_eq!(c1.assigned_weight, 3);
        let c2 = &tables.courses[2];
        assert_eq!(c2.total_choices, 3);
        assert_eq!(c2.total_first, 1);
        assert_eq!(c2.total_third, 2);
        assert_eq!(c2.weight, 7);
        assert_eq!(c2.num_min, 2);
        assert_eq!(c2.num_assigned, 0);

        assert_eq!(tables.students.len(), 2);
        assert_eq!(tables.students[0].id, 1);
        assert_eq!(tables.students[1].id, 2);
        let assignments: Vec<Option<String>> = tables
            .students
            .iter()
            .map(|r| r.assignment.clone())
            .collect();
        assert!(assignments.contains(&Some("1".to_owned())));
        assert!(assignments.contains(&Some("2".to_owned())));

        assert_eq!(
            tables.bullet_voting,
            vec![StudentRecord {
                id: 3,
                first_name: "Student".to_owned(),
                last_name: "2".to_owned(),
                first_choice: C(3),
                second_choice: C(3),
                third_choice: Invalid("x".to_owned()),
                assignment: Some(String::new()),
            }]
        );
        assert_eq!(tables.unassigned.len(), 1);
        assert_eq!(tables.unassigned[0].id, 3);
        assert_eq!(tables.unassigned[0].assignment, None);
    }

    #[test]
    fn write_report() {
        let (problem, report) = solved_problem();
        let mut buffer = Vec::<u8>::new();
        write(&mut buffer, &problem, &report).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();

        // Record fields are written in column order
        let course_positions: Vec<usize> = COURSE_COLUMNS
            .iter()
            .map(|col| text.find(&format!("\"{}\":", col)).unwrap())
            .collect();
        assert!(course_positions.windows(2).all(|w| w[0] < w[1]));
        let student_positions: Vec<usize> = STUDENT_COLUMNS
            .iter()
            .map(|col| text.find(&format!("\"{}\":", col)).unwrap())
            .collect();
        assert!(student_positions.windows(2).all(|w| w[0] < w[1]));

        let data: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(data["format"], "X-coursematch-report");
        assert_eq!(data["status"], "Optimal");
        assert_eq!(data["scores"]["first"], 5);
        assert_eq!(data["statistics"].as_array().unwrap().len(), 7);
        assert_eq!(
            data["statistics"][0]["label"],
            "Total Course Weight Achieved"
        );
        assert_eq!(data["statistics"][0]["value"], "0.53333 (8/15)");
        assert_eq!(data["courses"][2]["Students assigned"], 0);
        assert_eq!(data["bullet_voting"][0]["First choice"], 3);
        assert_eq!(data["bullet_voting"][0]["Third choice"], "x");
        assert_eq!(data["bullet_voting"][0]["Course Assignment"], "");
        assert!(data["unassigned"][0].get("Course Assignment").is_none());
    }
}

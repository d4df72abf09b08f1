use crate::{Choice, Course, Student};
use serde::Deserialize;
use serde_json::json;

/// Student entry of the simple JSON input format
#[derive(Deserialize)]
struct StudentData {
    first_name: String,
    last_name: String,
    /// Up to three course choices. Each choice should be a course number; anything else is
    /// treated as invalid choice.
    #[serde(default)]
    choices: Vec<serde_json::Value>,
}

/// Course entry of the simple JSON input format
#[derive(Deserialize)]
struct CourseData {
    name: String,
    #[serde(default)]
    num_min: usize,
    num_max: usize,
}

/// Interpret a JSON value as course choice.
///
/// Non-negative integral numbers (also as float, like `3.0`, as produced by some spreadsheet
/// exports) and numeric strings are course numbers. Everything else is an invalid choice, keeping
/// its textual representation (`null` becomes an empty string).
fn parse_choice(value: &serde_json::Value) -> Choice {
    match value {
        serde_json::Value::Number(number) => {
            if let Some(n) = number.as_u64() {
                Choice::Course(n as usize)
            } else {
                match number.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 => Choice::Course(f as usize),
                    _ => Choice::Invalid(number.to_string()),
                }
            }
        }
        serde_json::Value::String(s) => Choice::parse(s),
        serde_json::Value::Null => Choice::Invalid(String::new()),
        other => Choice::Invalid(other.to_string()),
    }
}

/// Read the list of students and courses from the simple JSON representation:
///
/// ```json
/// {
///   "students": [{"first_name": "Anton", "last_name": "Administrator", "choices": [1, 3, 2]}],
///   "courses": [{"name": "The First Course", "num_min": 3, "num_max": 10}]
/// }
/// ```
///
/// Missing choices are filled up with invalid choices. More than three choices are an error.
pub fn read<R: std::io::Read>(reader: R) -> Result<(Vec<Student>, Vec<Course>), String> {
    let mut data: serde_json::Map<String, serde_json::Value> =
        serde_json::from_reader(reader).map_err(|err| err.to_string())?;
    let mut take_list = |key: &str| {
        data.remove(key)
            .ok_or_else(|| format!("No '{}' list found in input data.", key))
    };

    let students_data: Vec<StudentData> =
        serde_json::from_value(take_list("students")?).map_err(|e| format!("{}", e))?;
    let mut students = Vec::with_capacity(students_data.len());
    for (i, s) in students_data.into_iter().enumerate() {
        if s.choices.len() > 3 {
            return Err(format!(
                "Student '{} {}' has {} course choices, but at most 3 are allowed.",
                s.first_name,
                s.last_name,
                s.choices.len()
            ));
        }
        let mut choices = s.choices.iter().map(parse_choice);
        let mut next_choice = || {
            choices
                .next()
                .unwrap_or_else(|| Choice::Invalid(String::new()))
        };
        let choices = [next_choice(), next_choice(), next_choice()];
        students.push(Student {
            index: i,
            first_name: s.first_name,
            last_name: s.last_name,
            choices,
        });
    }

    let courses_data: Vec<CourseData> =
        serde_json::from_value(take_list("courses")?).map_err(|e| format!("{}", e))?;
    let courses = courses_data
        .into_iter()
        .enumerate()
        .map(|(i, c)| Course {
            index: i,
            name: c.name,
            num_min: c.num_min,
            num_max: c.num_max,
        })
        .collect();

    Ok((students, courses))
}

/// Write the list of students and courses to the simple JSON representation, which can be read
/// by `read()`.
pub fn write_input_data<W: std::io::Write>(
    writer: W,
    students: &[Student],
    courses: &[Course],
) -> Result<(), String> {
    let s: Vec<serde_json::Value> = students
        .iter()
        .map(|s| {
            json!({
                "first_name": s.first_name,
                "last_name": s.last_name,
                "choices": s.choices,
            })
        })
        .collect();
    let c: Vec<serde_json::Value> = courses
        .iter()
        .map(|c| {
            json!({
                "name": c.name,
                "num_min": c.num_min,
                "num_max": c.num_max,
            })
        })
        .collect();
    let data = json!({
        "format": "X-coursematch-input-simple",
        "version": "1.0",
        "students": s,
        "courses": c,
    });
    serde_json::to_writer(writer, &data).map_err(|e| format!("{}", e))?;

    Ok(())
}

#[cfg(test)]
mod test {
    use crate::Choice;

    #[test]
    fn parse_simple_file() {
        let data = include_bytes!("test_ressources/simple_input.json");
        let (students, courses) = super::read(&data[..]).unwrap();

        assert_eq!(students.len(), 6);
        assert_eq!(courses.len(), 4);
        assert_eq!(students[2].name(), "Charly Clown");
        assert_eq!(students[2].index, 2);
        assert_eq!(
            students[2].choices,
            [Choice::Course(3), Choice::Course(1), Choice::Course(2)]
        );
        assert_eq!(
            students[3].choices,
            [
                Choice::Course(4),
                Choice::Invalid("egal".to_owned()),
                Choice::Invalid(String::new())
            ]
        );
        assert_eq!(
            students[4].choices,
            [
                Choice::Course(2),
                Choice::Course(2),
                Choice::Invalid(String::new())
            ]
        );
        assert_eq!(
            students[5].choices,
            [
                Choice::Course(1),
                Choice::Course(4),
                Choice::Invalid("2.5".to_owned())
            ]
        );
        assert_eq!(courses[2].name, "3. The Third Course");
        assert_eq!(courses[2].index, 2);
        assert_eq!(courses[2].num_min, 3);
        assert_eq!(courses[2].num_max, 20);
        assert_eq!(courses[0].num_min, 0);
    }

    #[test]
    fn too_many_choices() {
        let data = br#"{"students": [{"first_name": "A", "last_name": "B", "choices": [1, 2, 3, 4]}],
                        "courses": []}"#;
        assert!(super::read(&data[..]).is_err());
    }

    #[test]
    fn missing_course_fields() {
        let data = br#"{"students": [], "courses": [{"name": "Course without max"}]}"#;
        assert!(super::read(&data[..]).is_err());
    }

    #[test]
    fn invalid_structure() {
        assert!(super::read(&b"[1, 2, 3]"[..]).is_err());
        assert!(super::read(&br#"{"students": []}"#[..]).is_err());
    }

    #[test]
    fn write_and_read_input_data() {
        let data = include_bytes!("test_ressources/simple_input.json");
        let (students, courses) = super::read(&data[..]).unwrap();

        let mut buffer = Vec::<u8>::new();
        super::write_input_data(&mut buffer, &students, &courses).unwrap();
        let (students2, courses2) = super::read(&buffer[..]).unwrap();

        assert_eq!(students, students2);
        assert_eq!(courses, courses2);
    }
}

use clap::{command, value_parser, Arg, ArgAction};
use coursematch::matcher::solve_default;
use coursematch::{MatchError, Problem, RankScores};
use log::{error, info};

fn main() {
    let matches = command!()
        .about("Assign students to courses based on their ranked course choices")
        .arg(
            Arg::new("INPUT")
                .help("Input file with students and courses (simple JSON format)")
                .required(true),
        )
        .arg(
            Arg::new("OUTPUT")
                .short('o')
                .long("output")
                .help("Write the report to this JSON file"),
        )
        .arg(
            Arg::new("p1")
                .long("p1")
                .help("Score of an assignment to the first choice")
                .value_parser(value_parser!(u32).range(1..))
                .default_value("5"),
        )
        .arg(
            Arg::new("p2")
                .long("p2")
                .help("Score of an assignment to the second choice")
                .value_parser(value_parser!(u32).range(1..))
                .default_value("3"),
        )
        .arg(
            Arg::new("p3")
                .long("p3")
                .help("Score of an assignment to the third choice")
                .value_parser(value_parser!(u32).range(1..))
                .default_value("1"),
        )
        .arg(
            Arg::new("print")
                .short('p')
                .long("print")
                .help("Print the course rosters to stdout")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log level (can be given multiple times)")
                .action(ArgAction::Count),
        )
        .get_matches();

    let level = match matches.get_count("verbose") {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let scores = RankScores {
        first: *matches.get_one::<u32>("p1").unwrap_or(&5),
        second: *matches.get_one::<u32>("p2").unwrap_or(&3),
        third: *matches.get_one::<u32>("p3").unwrap_or(&1),
    };

    // Read input
    let input_path = match matches.get_one::<String>("INPUT") {
        Some(p) => p,
        None => std::process::exit(exitcode::USAGE),
    };
    let file = match std::fs::File::open(input_path) {
        Ok(f) => f,
        Err(e) => {
            error!("Could not open input file {}: {}", input_path, e);
            std::process::exit(exitcode::NOINPUT);
        }
    };
    let (students, courses) = match coursematch::io::simple::read(std::io::BufReader::new(file)) {
        Ok(data) => data,
        Err(e) => {
            error!("Could not read input data: {}", e);
            std::process::exit(exitcode::DATAERR);
        }
    };
    info!(
        "Read {} courses and {} students",
        courses.len(),
        students.len()
    );

    let problem = match Problem::new(students, courses, scores) {
        Ok(p) => p,
        Err(e) => {
            error!("{}", e);
            std::process::exit(exitcode::DATAERR);
        }
    };

    // Solve
    let report = match solve_default(&problem) {
        Ok(r) => r,
        Err(e) => {
            error!("{}", e);
            std::process::exit(match e {
                MatchError::InvalidInput(_) => exitcode::DATAERR,
                MatchError::NotOptimal { .. } => exitcode::UNAVAILABLE,
                MatchError::Solver(_) => exitcode::SOFTWARE,
            });
        }
    };

    print!("{}", report.statistics);
    if matches.get_flag("print") {
        print!("{}", coursematch::io::format_assignment(&problem, &report));
    }

    // Write report
    if let Some(output_path) = matches.get_one::<String>("OUTPUT") {
        let file = match std::fs::File::create(output_path) {
            Ok(f) => f,
            Err(e) => {
                error!("Could not create output file {}: {}", output_path, e);
                std::process::exit(exitcode::CANTCREAT);
            }
        };
        if let Err(e) =
            coursematch::io::report::write(std::io::BufWriter::new(file), &problem, &report)
        {
            error!("Could not write report: {}", e);
            std::process::exit(exitcode::IOERR);
        }
        info!("Wrote report to {}", output_path);
    }
}

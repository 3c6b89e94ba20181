//! Custom test runner for the xsdform test suite.
//!
//! This binary runs all test cases and reports results in a friendly format:
//! - compile/person 2/2 PASS
//! - errors/union 0/1 FAIL

use clap::Parser;
use rayon::prelude::*;
use test_suite::{Case, CaseResult, collect_cases};

#[derive(Parser)]
#[command(name = "test-suite", about = "xsdform test suite runner")]
struct Args {
    /// Filter tests by name pattern (substring match)
    #[arg(short, long)]
    filter: Option<String>,

    /// Show short error summaries instead of detailed output
    #[arg(short, long)]
    short: bool,
}

/// ANSI color codes
mod colors {
    pub const GREEN: &str = "\x1b[32m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RESET: &str = "\x1b[0m";
}

fn main() {
    let args = Args::parse();
    let exit_code = run(&args);
    std::process::exit(exit_code);
}

fn run(args: &Args) -> i32 {
    println!(
        "\n{}{}xsdform Test Suite{}",
        colors::BOLD,
        colors::CYAN,
        colors::RESET
    );
    println!("{}{}{}\n", colors::DIM, "=".repeat(50), colors::RESET);

    let mut cases = Vec::new();
    let mut collect_failures = 0;
    for case in collect_cases() {
        match case {
            Ok(case) => cases.push(case),
            Err(e) => {
                collect_failures += 1;
                eprintln!("{}{}Error:{} {e}", colors::BOLD, colors::RED, colors::RESET);
            }
        }
    }
    if let Some(filter) = &args.filter {
        cases.retain(|case| case.name.contains(filter.as_str()));
    }
    if cases.is_empty() {
        println!(
            "{}{}Warning:{} No test cases found{}",
            colors::BOLD,
            colors::YELLOW,
            colors::RESET,
            if args.filter.is_some() {
                " matching filter"
            } else {
                ""
            }
        );
        return i32::from(collect_failures > 0);
    }

    let outcomes: Vec<(&Case, CaseResult)> =
        cases.par_iter().map(|case| (case, case.run())).collect();

    let mut passed = 0;
    let mut failed = 0;
    for (case, result) in &outcomes {
        let ok = result.scenarios.iter().filter(|(_, r)| r.is_ok()).count();
        let total = result.scenarios.len();
        let (color, status) = if result.is_success() {
            (colors::GREEN, "PASS")
        } else {
            (colors::RED, "FAIL")
        };
        println!(
            "{} {ok}/{total} {color}{status}{}",
            case.name,
            colors::RESET
        );
        for (scenario, result) in &result.scenarios {
            match result {
                Ok(()) => passed += 1,
                Err(e) => {
                    failed += 1;
                    if args.short {
                        let first_line = e.to_string();
                        let first_line = first_line.lines().next().unwrap_or_default();
                        println!("  {}{scenario}:{} {first_line}", colors::DIM, colors::RESET);
                    } else {
                        println!("  {}{scenario}:{}\n{e}", colors::DIM, colors::RESET);
                    }
                }
            }
        }
    }

    println!();
    if failed == 0 && collect_failures == 0 {
        println!(
            "{}{}All {passed} scenarios passed{}",
            colors::BOLD,
            colors::GREEN,
            colors::RESET
        );
        0
    } else {
        println!(
            "{}{}{failed} failed, {passed} passed{}",
            colors::BOLD,
            colors::RED,
            colors::RESET
        );
        1
    }
}

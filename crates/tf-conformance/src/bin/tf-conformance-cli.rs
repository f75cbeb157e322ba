#![forbid(unsafe_code)]

use std::path::PathBuf;

use tf_conformance::{HarnessConfig, run_fixture_suite};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = HarnessConfig::default_paths();
    let mut require_green = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--fixtures" => {
                let value = args.next().ok_or("--fixtures requires a directory")?;
                config.fixture_root = PathBuf::from(value);
            }
            "--require-green" => {
                require_green = true;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                return Err(format!("unknown argument: {other}").into());
            }
        }
    }

    let report = run_fixture_suite(&config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if require_green && !report.is_green() {
        return Err(format!(
            "suite {} is not green: {} of {} fixtures failed",
            report.suite, report.failed, report.fixture_count
        )
        .into());
    }
    Ok(())
}

fn print_help() {
    println!(
        "tf-conformance-cli [--fixtures DIR] [--require-green]\n\n\
         Runs every JSON fixture under DIR (default: crates/tf-conformance/fixtures)\n\
         and prints the suite report as JSON."
    );
}

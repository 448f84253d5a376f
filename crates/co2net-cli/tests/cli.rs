use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn sample_cost_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    writeln!(
        file,
        "ncols 3\nnrows 3\nxllcorner -100.0\nyllcorner 30.0\ncellsize 1.0\nNODATA_value -9999\n\n\
         1 2 4\n0 1.0 1.5\n2 1 5\n0 1.0 1.5\n\n"
    )
    .unwrap();
    file
}

fn sample_source_table() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(
        file,
        "ID,UNIQUE NAME,Lat,Lon,X loc,Y loc,Capture Capacity (MTCO2/yr),Total Unit Cost ($/tCO2),Fixed Cost ($M),Operating Cost ($/tCO2)\n\
         s1,Plant A,29.0,-99.0,1,1,1.0,15.0,0,0"
    )
    .unwrap();
    file
}

#[test]
fn validate_cost_file_accepts_well_formed_input() {
    let cost_file = sample_cost_file();
    Command::cargo_bin("co2net")
        .unwrap()
        .arg("validate-cost-file")
        .arg(cost_file.path())
        .assert()
        .success();
}

#[test]
fn validate_cost_file_rejects_truncated_header() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    writeln!(file, "ncols 3\nnrows 3\n").unwrap();

    Command::cargo_bin("co2net")
        .unwrap()
        .arg("validate-cost-file")
        .arg(file.path())
        .assert()
        .failure();
}

#[test]
fn validate_assets_reports_source_table_diagnostics() {
    let cost_file = sample_cost_file();
    let sources = sample_source_table();

    Command::cargo_bin("co2net")
        .unwrap()
        .arg("validate-assets")
        .arg("--cost-file")
        .arg(cost_file.path())
        .arg("--kind")
        .arg("source")
        .arg(sources.path())
        .assert()
        .success();
}

#[test]
fn missing_subcommand_fails_with_usage() {
    Command::cargo_bin("co2net")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

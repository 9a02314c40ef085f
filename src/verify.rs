//! Pre-flight setup verifier.
//!
//! Runs every check even after a failure and reports the aggregate at the end.
//! Only a missing `main.py` stops it early, since that means the verifier is
//! not running from a DUO checkout at all.

use std::path::PathBuf;

use crate::console;
use crate::environment::{subset_roundtrip, SUBSET_ENV_VAR};
use crate::error::{DuoError, Result};
use crate::preflight::{self, MarkerReport, CONFIG_FILES, DATALOADER, SUBSET_MARKERS};
use crate::probe::{self, TRAINING_PACKAGES};
use crate::process::CommandRunner;
use crate::split::{check_split_cases, split_counts, SPLIT_CASES};

/// Value written to `OWT_SUBSET_NUM` by the environment check.
pub const PROBE_SUBSET: &str = "1000";

const SECTION_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// In execution order.
    pub checks: Vec<CheckResult>,
}

impl VerifyReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed(&self) -> Vec<&'static str> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.name)
            .collect()
    }

    /// 0 when every check passed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

pub struct Verifier<'a> {
    root: PathBuf,
    python: String,
    runner: &'a dyn CommandRunner,
}

fn section(title: &str) {
    println!("\n{}", "=".repeat(SECTION_WIDTH));
    println!("{title}");
    println!("{}", "=".repeat(SECTION_WIDTH));
}

impl<'a> Verifier<'a> {
    pub fn new(root: impl Into<PathBuf>, python: impl Into<String>, runner: &'a dyn CommandRunner) -> Self {
        Self {
            root: root.into(),
            python: python.into(),
            runner,
        }
    }

    /// Run all checks. Errors only when `main.py` is absent.
    pub async fn run(&self) -> Result<VerifyReport> {
        section("DUO Kaggle Setup Verification");
        println!();
        println!("Current directory: {}", self.root.display());

        if !self.root.join("main.py").exists() {
            println!();
            console::fail("ERROR: main.py not found");
            console::detail("Please run this from the DUO repository root directory");
            return Err(DuoError::MissingFiles(vec!["main.py".to_string()]));
        }

        let checks = vec![
            CheckResult {
                name: "Environment Variable",
                passed: self.check_env_var(),
            },
            CheckResult {
                name: "Dataloader Modification",
                passed: self.check_dataloader(),
            },
            CheckResult {
                name: "Package Imports",
                passed: self.check_imports().await,
            },
            CheckResult {
                name: "Split Calculation",
                passed: self.check_split(),
            },
            CheckResult {
                name: "Config Files",
                passed: self.check_config_files(),
            },
        ];

        let report = VerifyReport { checks };
        self.print_summary(&report);
        Ok(report)
    }

    fn check_env_var(&self) -> bool {
        section("Test 1: Environment Variable Recognition");

        match subset_roundtrip(PROBE_SUBSET) {
            Some(value) if value == PROBE_SUBSET => {
                console::ok(format!("Environment variable set: {SUBSET_ENV_VAR}={value}"));
                match value.parse::<u64>() {
                    Ok(total) => {
                        let (train, val) = split_counts(total);
                        console::ok(format!("Expected split: {train} train, {val} val"));
                    }
                    Err(_) => console::warn(format!("{SUBSET_ENV_VAR} is not an integer")),
                }
                true
            }
            _ => {
                console::fail(format!("Failed to read {SUBSET_ENV_VAR} environment variable"));
                false
            }
        }
    }

    fn check_dataloader(&self) -> bool {
        section("Test 2: Dataloader Modification Check");

        let report = match preflight::scan_markers(&self.root.join(DATALOADER), &SUBSET_MARKERS) {
            Ok(report) => report,
            Err(e) => {
                console::fail(format!("Could not read {DATALOADER}: {e}"));
                return false;
            }
        };
        let found = match report {
            MarkerReport::FileMissing { .. } => {
                console::fail(format!("{DATALOADER} not found in current directory"));
                return false;
            }
            MarkerReport::Scanned { ref found, .. } => found,
        };

        for (marker, present) in found {
            if *present {
                console::ok(format!("Found: {marker}"));
            } else {
                console::fail(format!("Missing: {marker}"));
            }
        }

        let missing = report.missing();
        println!();
        if missing.is_empty() {
            console::ok("Dataloader contains all required modifications");
            true
        } else {
            console::fail("Dataloader is missing required modifications");
            console::detail(format!("Missing strings: {missing:?}"));
            false
        }
    }

    async fn check_imports(&self) -> bool {
        section("Test 3: Package Import Check");

        let results = probe::probe_imports(&self.python, &TRAINING_PACKAGES, self.runner).await;
        for r in &results {
            let p = r.package;
            match (r.available, p.required) {
                (true, true) => console::ok(format!("{} ({})", p.display, p.module)),
                (false, true) => console::fail(format!("{} ({}) - Not installed", p.display, p.module)),
                (true, false) => console::ok(format!("{} (optional) - Available", p.display)),
                (false, false) => console::warn(format!(
                    "{} (optional) - Not available (will use fallback)",
                    p.display
                )),
            }
        }

        probe::required_available(&results)
    }

    fn check_split(&self) -> bool {
        section("Test 4: Split Calculation Verification");

        let cases = check_split_cases(&SPLIT_CASES);
        for case in &cases {
            let (train, val) = case.actual;
            let line = format!("Total {:6} → Train {:6}, Val {:5}", case.total, train, val);
            if case.passed() {
                console::ok(line);
            } else {
                console::fail(line);
                let (exp_train, exp_val) = case.expected;
                console::detail(format!("Expected: Train {exp_train:6}, Val {exp_val:5}"));
            }
        }

        cases.iter().all(|c| c.passed())
    }

    fn check_config_files(&self) -> bool {
        section("Test 5: Configuration Files Check");

        let report = preflight::check_files(&self.root, &CONFIG_FILES);
        for (path, exists) in &report.entries {
            if *exists {
                console::ok(path);
            } else {
                console::fail(format!("{path} - Not found"));
            }
        }
        report.all_found()
    }

    fn print_summary(&self, report: &VerifyReport) {
        section("Test Summary");

        for check in &report.checks {
            let status = if check.passed { "✓ PASS" } else { "✗ FAIL" };
            println!("{status} - {}", check.name);
        }

        println!("\n{}", "=".repeat(SECTION_WIDTH));
        if report.all_passed() {
            console::ok("All tests passed!");
            println!("{}", "=".repeat(SECTION_WIDTH));
            println!("\nYou're ready to run training on Kaggle!");
            println!("\nNext steps:");
            console::detail("1. Adjust the subset size: export DUO_RUN__SUBSET_SIZE=11000");
            console::detail("2. Run training: duo-kaggle train");
        } else {
            console::fail("Some tests failed");
            println!("{}", "=".repeat(SECTION_WIDTH));
            println!("\nPlease fix the issues above before proceeding.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(passed: [bool; 3]) -> VerifyReport {
        let names = ["Environment Variable", "Package Imports", "Config Files"];
        VerifyReport {
            checks: names
                .iter()
                .zip(passed)
                .map(|(&name, passed)| CheckResult { name, passed })
                .collect(),
        }
    }

    #[test]
    fn all_passing_exits_zero() {
        let report = report([true, true, true]);
        assert!(report.all_passed());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn any_failed_check_exits_one() {
        let report = report([true, false, true]);
        assert_eq!(report.failed(), vec!["Package Imports"]);
        assert_eq!(report.exit_code(), 1);
    }
}

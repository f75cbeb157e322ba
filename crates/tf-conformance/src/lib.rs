#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tf_calendar::HostDates;
use tf_columnar::{Categorical, Column};
use tf_frame::{OrderedSeries, Table};
use tf_index::SeriesIndex;
use tf_runtime::{
    BoundaryError, ConversionContext, ConversionOptions, ErrorKind, FromHost, HostError, ToHost,
    guard_host_call,
};
use tf_types::HostValue;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub repo_root: PathBuf,
    pub fixture_root: PathBuf,
    pub strict_mode: bool,
}

impl HarnessConfig {
    #[must_use]
    pub fn default_paths() -> Self {
        let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..");
        Self {
            fixture_root: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures"),
            strict_mode: true,
            repo_root,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarnessReport {
    pub suite: &'static str,
    pub fixture_count: usize,
    pub strict_mode: bool,
}

#[must_use]
pub fn run_smoke(config: &HarnessConfig) -> HarnessReport {
    let fixture_count = fs::read_dir(&config.fixture_root)
        .ok()
        .into_iter()
        .flat_map(|it| it.filter_map(Result::ok))
        .count();

    HarnessReport {
        suite: "smoke",
        fixture_count,
        strict_mode: config.strict_mode,
    }
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("fixture {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The native type a fixture's host value is imported into and exported back from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureOperation {
    TableRoundTrip,
    SeriesRoundTrip,
    ColumnRoundTrip,
    FactorRoundTrip,
    DateRoundTrip,
    IndexRoundTrip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub case_id: String,
    pub operation: FixtureOperation,
    #[serde(default)]
    pub options: ConversionOptions,
    pub input: HostValue,
    /// Expected export; the input itself when absent.
    #[serde(default)]
    pub expected: Option<HostValue>,
    #[serde(default)]
    pub expected_error: Option<ErrorKind>,
    #[serde(default)]
    pub expected_warnings: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    pub case_id: String,
    pub operation: FixtureOperation,
    pub status: CaseStatus,
    pub mismatch: Option<String>,
    pub diagnostics: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite: String,
    pub fixture_count: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<CaseResult>,
}

impl SuiteReport {
    #[must_use]
    pub fn is_green(&self) -> bool {
        self.failed == 0 && self.fixture_count > 0
    }
}

pub fn run_fixture_suite(config: &HarnessConfig) -> Result<SuiteReport, HarnessError> {
    let fixtures = load_fixtures(&config.fixture_root)?;
    let results: Vec<CaseResult> = fixtures.iter().map(run_fixture).collect();
    let passed = results
        .iter()
        .filter(|result| result.status == CaseStatus::Pass)
        .count();
    Ok(SuiteReport {
        suite: "host_round_trip".to_owned(),
        fixture_count: fixtures.len(),
        passed,
        failed: results.len() - passed,
        results,
    })
}

fn round_trip<T, E>(input: &HostValue, ctx: &mut ConversionContext) -> Result<HostValue, HostError>
where
    T: FromHost<Error = E> + ToHost<Error = E>,
    E: BoundaryError,
{
    guard_host_call(|| T::from_host(input, ctx)?.to_host(ctx))
}

#[must_use]
pub fn run_fixture(fixture: &Fixture) -> CaseResult {
    let mut ctx = ConversionContext::new(fixture.options);
    let input = &fixture.input;
    let outcome = match fixture.operation {
        FixtureOperation::TableRoundTrip => round_trip::<Table, _>(input, &mut ctx),
        FixtureOperation::SeriesRoundTrip => round_trip::<OrderedSeries, _>(input, &mut ctx),
        FixtureOperation::ColumnRoundTrip => round_trip::<Column, _>(input, &mut ctx),
        FixtureOperation::FactorRoundTrip => round_trip::<Categorical, _>(input, &mut ctx),
        FixtureOperation::DateRoundTrip => round_trip::<HostDates, _>(input, &mut ctx),
        FixtureOperation::IndexRoundTrip => round_trip::<SeriesIndex, _>(input, &mut ctx),
    };
    let warnings = ctx.ledger.warnings().count();
    let mismatch = compare(fixture, outcome, warnings);

    CaseResult {
        case_id: fixture.case_id.clone(),
        operation: fixture.operation,
        status: if mismatch.is_none() {
            CaseStatus::Pass
        } else {
            CaseStatus::Fail
        },
        mismatch,
        diagnostics: ctx.ledger.len(),
    }
}

fn compare(
    fixture: &Fixture,
    outcome: Result<HostValue, HostError>,
    warnings: usize,
) -> Option<String> {
    match (outcome, fixture.expected_error) {
        (Ok(_), Some(kind)) => Some(format!("expected {kind} error, conversion succeeded")),
        (Err(err), None) => Some(format!("unexpected error: {err}")),
        (Err(err), Some(kind)) if err.kind != kind => {
            Some(format!("expected {kind} error, got {}: {err}", err.kind))
        }
        (Err(_), Some(_)) => None,
        (Ok(actual), None) => {
            let expected = fixture.expected.as_ref().unwrap_or(&fixture.input);
            if &actual != expected {
                Some(format!("export mismatch: {actual:?} != {expected:?}"))
            } else if warnings != fixture.expected_warnings {
                Some(format!(
                    "expected {} warnings, recorded {warnings}",
                    fixture.expected_warnings
                ))
            } else {
                None
            }
        }
    }
}

fn load_fixtures(root: &Path) -> Result<Vec<Fixture>, HarnessError> {
    let mut fixtures = list_fixture_files(root)?
        .into_iter()
        .map(|path| load_fixture(&path))
        .collect::<Result<Vec<_>, _>>()?;
    fixtures.sort_by(|a, b| a.case_id.cmp(&b.case_id));
    Ok(fixtures)
}

fn load_fixture(path: &Path) -> Result<Fixture, HarnessError> {
    let body = fs::read_to_string(path)?;
    serde_json::from_str(&body).map_err(|source| HarnessError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn list_fixture_files(root: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(current) = stack.pop() {
        for entry in fs::read_dir(current)? {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::{CaseStatus, Fixture, FixtureOperation, run_fixture};
    use tf_runtime::{ConversionOptions, ErrorKind};
    use tf_types::HostValue;

    fn fixture(operation: FixtureOperation, input: HostValue) -> Fixture {
        Fixture {
            case_id: "inline".to_owned(),
            operation,
            options: ConversionOptions::default(),
            input,
            expected: None,
            expected_error: None,
            expected_warnings: 0,
        }
    }

    #[test]
    fn matching_round_trip_passes() {
        let input = HostValue::real(vec![0.0]).with_class(["Date"]);
        let result = run_fixture(&fixture(FixtureOperation::DateRoundTrip, input));
        assert_eq!(result.status, CaseStatus::Pass, "{:?}", result.mismatch);
    }

    #[test]
    fn expected_error_kind_is_compared() {
        let mut case = fixture(FixtureOperation::TableRoundTrip, HostValue::real(vec![1.0]));
        case.expected_error = Some(ErrorKind::InvalidFormat);
        assert_eq!(run_fixture(&case).status, CaseStatus::Pass);

        case.expected_error = Some(ErrorKind::UnknownColumn);
        let result = run_fixture(&case);
        assert_eq!(result.status, CaseStatus::Fail);
        assert!(result.mismatch.expect("mismatch").contains("invalid_format"));
    }

    #[test]
    fn export_differences_fail() {
        let mut case = fixture(FixtureOperation::ColumnRoundTrip, HostValue::integer(vec![1]));
        case.expected = Some(HostValue::integer(vec![2]));
        assert_eq!(run_fixture(&case).status, CaseStatus::Fail);
    }
}

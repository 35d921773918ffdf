//! Run state for one unit test execution

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::SetupError;
use crate::models::{TestRunRecord, TransUnitTest, UnitTestResult};
use crate::pipeline::RunOutcome;

/// Phase of a unit test run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestState {
    /// Definition validated, pipeline located
    Defined,
    /// Tweaks applied, input injected, golden nodes observed
    Prepared,
    /// Pipeline ran cleanly
    Executed,
    /// Every golden location was compared
    Compared,
    Passed,
    Failed,
    SetupError,
}

impl TestState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TestState::Passed | TestState::Failed | TestState::SetupError
        )
    }

    /// Whether the state machine allows moving to `next`
    pub fn can_transition_to(&self, next: TestState) -> bool {
        use TestState::*;
        matches!(
            (self, next),
            (Defined, Prepared)
                | (Defined, SetupError)
                | (Prepared, Executed)
                | (Prepared, Failed)
                | (Prepared, SetupError)
                | (Executed, Compared)
                | (Executed, Passed)
                | (Executed, SetupError)
                | (Compared, Passed)
                | (Compared, Failed)
        )
    }
}

impl std::fmt::Display for TestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TestState::Defined => "DEFINED",
            TestState::Prepared => "PREPARED",
            TestState::Executed => "EXECUTED",
            TestState::Compared => "COMPARED",
            TestState::Passed => "PASSED",
            TestState::Failed => "FAILED",
            TestState::SetupError => "SETUP_ERROR",
        };
        write!(f, "{}", name)
    }
}

/// Mutable state of a run in progress
pub(crate) struct TestRun<'t> {
    pub run_id: Uuid,
    pub unit_test: &'t TransUnitTest,
    pub pipeline_name: String,
    state: TestState,
    results: Vec<UnitTestResult>,
    execution: Option<RunOutcome>,
    setup_error: Option<SetupError>,
}

impl<'t> TestRun<'t> {
    pub fn new(run_id: Uuid, unit_test: &'t TransUnitTest) -> Self {
        let pipeline_name = unit_test
            .pipeline
            .resolution_order()
            .first()
            .map(|locator| locator.value().to_string())
            .unwrap_or_default();
        Self {
            run_id,
            unit_test,
            pipeline_name,
            state: TestState::Defined,
            results: Vec::new(),
            execution: None,
            setup_error: None,
        }
    }

    pub fn state(&self) -> TestState {
        self.state
    }

    pub fn transition(&mut self, next: TestState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        debug!(
            "Unit test '{}' run {}: {} -> {}",
            self.unit_test.name, self.run_id, self.state, next
        );
        self.state = next;
    }

    pub fn record_execution(&mut self, outcome: RunOutcome) {
        self.execution = Some(outcome);
    }

    pub fn push_result(&mut self, is_error: bool, data_set: &str, node: &str, comment: String) {
        let result = if is_error {
            UnitTestResult::failed(
                &self.pipeline_name,
                &self.unit_test.name,
                data_set,
                node,
                comment,
            )
        } else {
            UnitTestResult::passed(
                &self.pipeline_name,
                &self.unit_test.name,
                data_set,
                node,
                comment,
            )
        };
        self.results.push(result);
    }

    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|r| r.is_error)
    }

    pub fn fail_setup(&mut self, error: SetupError) {
        self.transition(TestState::SetupError);
        self.setup_error = Some(error);
    }

    pub fn into_report(self) -> TestRunReport {
        TestRunReport {
            run_id: self.run_id,
            unit_test_name: self.unit_test.name.clone(),
            pipeline_name: self.pipeline_name,
            state: self.state,
            results: self.results,
            execution: self.execution,
            setup_error: self.setup_error,
        }
    }
}

/// Outcome of one unit test run
#[derive(Debug)]
pub struct TestRunReport {
    pub run_id: Uuid,
    pub unit_test_name: String,
    pub pipeline_name: String,
    /// Terminal state of the run
    pub state: TestState,
    /// One result per golden location, or one result for a failed execution
    pub results: Vec<UnitTestResult>,
    /// Engine outcome, when the pipeline ran
    pub execution: Option<RunOutcome>,
    /// Configuration fault, when the state is `SetupError`
    pub setup_error: Option<SetupError>,
}

impl TestRunReport {
    /// True when the run completed and no result is an error
    pub fn passed(&self) -> bool {
        self.state == TestState::Passed && self.results.iter().all(|r| !r.is_error)
    }

    pub fn is_setup_error(&self) -> bool {
        self.state == TestState::SetupError
    }

    /// Results that flagged a problem
    pub fn failures(&self) -> impl Iterator<Item = &UnitTestResult> {
        self.results.iter().filter(|r| r.is_error)
    }

    /// Record suitable for persisting
    pub fn to_record(&self) -> TestRunRecord {
        TestRunRecord {
            run_id: self.run_id,
            unit_test_name: self.unit_test_name.clone(),
            pipeline_name: self.pipeline_name.clone(),
            finished_at: chrono::Utc::now(),
            passed: self.passed(),
            results: self.results.clone(),
        }
    }
}

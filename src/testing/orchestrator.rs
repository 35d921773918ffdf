//! Unit test orchestration
//!
//! Drives a unit test through its phases:
//!
//! - **Define**: validate the definition and load the pipeline, trying its
//!   locators by id, repository path, then filename.
//! - **Prepare**: swap connections, apply tweaks, inject input rows and
//!   start observing golden nodes. Every data set, group, node and mapped
//!   data set field is resolved before anything is fetched or modified.
//! - **Execute**: one blocking run of the pipeline. A failed run or any
//!   error ends the test as failed without comparing.
//! - **Compare**: captured rows of every golden node are checked against
//!   the golden data set. Setup problems of all locations surface before
//!   the first row is compared; each location is then verified on its own
//!   and stops at its first mismatch.

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::run::{TestRun, TestRunReport, TestState};
use super::{DataSetLookup, ResultSink, SetupError, TestError};
use crate::compare::{
    FieldResolutionError, MappingSide, ResolvedMapping, resolve_field_mappings, value_text,
    values_equal,
};
use crate::database::QueryExecutor;
use crate::golden::{compare_indices, resolve_golden_rows};
use crate::models::{DataSet, DataSetGroup, Row, RowSchema, SetLocation, TransUnitTest, TweakMode};
use crate::pipeline::{CapturedRows, NodeHandle, PipelineEngine, PipelineResolver, RunOutcome};
use crate::validation::DefinitionValidator;

/// A set location with everything it refers to resolved
struct ResolvedLocation<'t> {
    location: &'t SetLocation,
    node: NodeHandle,
    data_set: DataSet,
    group: DataSetGroup,
}

/// Golden location ready for row comparison
struct PendingComparison<'t> {
    resolved: ResolvedLocation<'t>,
    captured: CapturedRows,
    golden_rows: Vec<Row>,
    mappings: Vec<ResolvedMapping>,
}

/// Runs unit tests against pipelines
///
/// Collaborators are borrowed for the orchestrator's lifetime; data sets
/// are looked up by name on every run.
pub struct TestOrchestrator<'a> {
    data_sets: &'a dyn DataSetLookup,
    pipelines: &'a dyn PipelineResolver,
    executor: &'a dyn QueryExecutor,
    result_sink: Option<&'a dyn ResultSink>,
}

impl<'a> TestOrchestrator<'a> {
    pub fn new(
        data_sets: &'a dyn DataSetLookup,
        pipelines: &'a dyn PipelineResolver,
        executor: &'a dyn QueryExecutor,
    ) -> Self {
        Self {
            data_sets,
            pipelines,
            executor,
            result_sink: None,
        }
    }

    /// Persist records of tests that set `persist_results`
    pub fn with_result_sink(mut self, sink: &'a dyn ResultSink) -> Self {
        self.result_sink = Some(sink);
        self
    }

    /// Run one unit test
    ///
    /// Setup errors come back as a report in the `SetupError` state. Data
    /// access failures, unexpected engine faults and storage failures are
    /// returned as errors.
    pub async fn run_unit_test(
        &self,
        unit_test: &TransUnitTest,
    ) -> Result<TestRunReport, TestError> {
        let run_id = Uuid::new_v4();
        info!("Running unit test '{}' (run {})", unit_test.name, run_id);

        let mut run = TestRun::new(run_id, unit_test);
        match self.drive(&mut run).await {
            Ok(()) => {}
            Err(TestError::Setup(e)) => {
                warn!("Unit test '{}' has a setup error: {}", unit_test.name, e);
                run.fail_setup(e);
            }
            Err(e) => return Err(e),
        }

        let report = run.into_report();
        info!(
            "Unit test '{}' finished: {} ({} result(s))",
            report.unit_test_name,
            report.state,
            report.results.len()
        );

        if unit_test.persist_results
            && !report.is_setup_error()
            && let Some(sink) = self.result_sink
        {
            sink.persist(&report.to_record()).await?;
        }

        Ok(report)
    }

    /// Run several unit tests one after the other
    pub async fn run_unit_tests(
        &self,
        unit_tests: &[TransUnitTest],
    ) -> Result<Vec<TestRunReport>, TestError> {
        let mut reports = Vec::with_capacity(unit_tests.len());
        for unit_test in unit_tests {
            reports.push(self.run_unit_test(unit_test).await?);
        }
        Ok(reports)
    }

    async fn drive(&self, run: &mut TestRun<'_>) -> Result<(), TestError> {
        let unit_test = run.unit_test;

        let mut engine = self.define(unit_test).await?;
        run.pipeline_name = engine.pipeline_name();

        let golden = self.prepare(unit_test, engine.as_mut()).await?;
        run.transition(TestState::Prepared);

        let outcome = self.execute(engine.as_mut()).await;
        run.record_execution(outcome.clone());
        if !outcome.is_clean() {
            let comment = format!(
                "Pipeline execution failed with {} error(s){}",
                outcome.error_count,
                outcome
                    .detail
                    .as_deref()
                    .map(|d| format!(": {}", d))
                    .unwrap_or_default()
            );
            run.push_result(true, "", "", comment);
            run.transition(TestState::Failed);
            return Ok(());
        }
        run.transition(TestState::Executed);

        if !unit_test.test_type.compares_golden_rows() {
            debug!(
                "Unit test '{}' is a development test, skipping golden comparison",
                unit_test.name
            );
            run.transition(TestState::Passed);
            return Ok(());
        }

        let pending = self.collect_comparisons(golden, engine.as_ref()).await?;
        for comparison in &pending {
            let (is_error, comment) = verify_location(
                &comparison.captured,
                &comparison.golden_rows,
                &comparison.mappings,
                &comparison.resolved.location.node_name,
            );
            run.push_result(
                is_error,
                &comparison.resolved.data_set.name,
                &comparison.resolved.location.node_name,
                comment,
            );
        }
        run.transition(TestState::Compared);

        if run.has_errors() {
            run.transition(TestState::Failed);
        } else {
            run.transition(TestState::Passed);
        }
        Ok(())
    }

    /// Validate the definition and load the pipeline
    async fn define(&self, unit_test: &TransUnitTest) -> Result<Box<dyn PipelineEngine>, TestError> {
        let validation = DefinitionValidator::new().validate_unit_test(unit_test);
        if !validation.is_valid() {
            return Err(SetupError::InvalidDefinition(validation.summary()).into());
        }

        let mut tried = Vec::new();
        for locator in unit_test.pipeline.resolution_order() {
            match self.pipelines.resolve(locator).await {
                Ok(Some(engine)) => {
                    info!("Loaded pipeline '{}' by {}", engine.pipeline_name(), locator);
                    return Ok(engine);
                }
                Ok(None) => {
                    debug!("No pipeline found by {}", locator);
                    tried.push(locator.to_string());
                }
                Err(e) => {
                    warn!("Unable to load pipeline by {}: {}", locator, e);
                    tried.push(format!("{} ({})", locator, e));
                }
            }
        }

        Err(SetupError::PipelineNotFound { tried }.into())
    }

    /// Apply tweaks and replacements, inject input rows, observe golden nodes
    async fn prepare<'t>(
        &self,
        unit_test: &'t TransUnitTest,
        engine: &mut dyn PipelineEngine,
    ) -> Result<Vec<ResolvedLocation<'t>>, TestError> {
        let pipeline_name = engine.pipeline_name();

        // Resolve everything first so a broken definition never touches the pipeline
        let mut tweaks = Vec::with_capacity(unit_test.tweaks.len());
        for tweak in &unit_test.tweaks {
            let node = find_node(engine, &tweak.node_name, "tweak", &pipeline_name)?;
            tweaks.push((node, tweak.mode));
        }

        let mut inputs = Vec::with_capacity(unit_test.input_locations.len());
        for location in &unit_test.input_locations {
            let resolved = self
                .resolve_location(engine, location, "input", &pipeline_name)
                .await?;
            let projection =
                input_projection(&resolved.data_set, location).map_err(SetupError::from)?;
            inputs.push((resolved, projection));
        }

        let mut golden = Vec::with_capacity(unit_test.golden_locations.len());
        for location in &unit_test.golden_locations {
            let resolved = self
                .resolve_location(engine, location, "golden", &pipeline_name)
                .await?;
            check_golden_targets(&resolved).map_err(SetupError::from)?;
            golden.push(resolved);
        }

        for replacement in &unit_test.database_replacements {
            engine
                .replace_connection(
                    &replacement.original_connection_name,
                    &replacement.replacement_connection_name,
                )
                .map_err(SetupError::Engine)?;
            debug!(
                "Replaced connection '{}' with '{}'",
                replacement.original_connection_name, replacement.replacement_connection_name
            );
        }

        for (node, mode) in &tweaks {
            match mode {
                TweakMode::None => {}
                TweakMode::Bypass => engine.bypass_node(node).map_err(SetupError::Engine)?,
                TweakMode::Remove => engine.remove_node(node).map_err(SetupError::Engine)?,
            }
            debug!("Applied tweak {} to node '{}'", mode, node.name);
        }

        for (resolved, (schema, indices)) in inputs {
            let rows = resolved
                .data_set
                .fetch_rows_ordered_by(
                    &resolved.group,
                    self.executor,
                    &resolved.location.field_order_keys,
                )
                .await?;
            let rows: Vec<Row> = rows.iter().map(|row| project_row(row, &indices)).collect();
            info!(
                "Injecting {} rows of data set '{}' into node '{}'",
                rows.len(),
                resolved.data_set.name,
                resolved.node.name
            );
            engine
                .inject_rows(&resolved.node, schema, rows)
                .map_err(SetupError::Engine)?;
        }

        for resolved in &golden {
            engine
                .observe_node(&resolved.node)
                .map_err(SetupError::Engine)?;
        }

        Ok(golden)
    }

    /// Run the pipeline; engine faults count as a failed run
    async fn execute(&self, engine: &mut dyn PipelineEngine) -> RunOutcome {
        info!("Executing pipeline '{}'", engine.pipeline_name());
        match engine.run().await {
            Ok(outcome) => outcome,
            Err(e) => RunOutcome::failed(1, e.to_string()),
        }
    }

    /// Gather captured rows, golden rows and mappings of every golden location
    async fn collect_comparisons<'t>(
        &self,
        golden: Vec<ResolvedLocation<'t>>,
        engine: &dyn PipelineEngine,
    ) -> Result<Vec<PendingComparison<'t>>, TestError> {
        let mut pending = Vec::with_capacity(golden.len());
        for resolved in golden {
            let captured = engine.captured_rows(&resolved.node)?;
            let golden_rows = resolve_golden_rows(
                self.executor,
                &resolved.group,
                &resolved.data_set,
                resolved.location,
            )
            .await?;
            let golden_schema = resolved.data_set.materialize_schema(false);
            let mappings = resolve_field_mappings(
                &captured.schema,
                &golden_schema,
                &resolved.location.field_mappings,
                &resolved.location.node_name,
                &resolved.data_set.name,
            )
            .map_err(SetupError::FieldResolution)?;

            pending.push(PendingComparison {
                resolved,
                captured,
                golden_rows,
                mappings,
            });
        }
        Ok(pending)
    }

    async fn resolve_location<'t>(
        &self,
        engine: &dyn PipelineEngine,
        location: &'t SetLocation,
        purpose: &'static str,
        pipeline_name: &str,
    ) -> Result<ResolvedLocation<'t>, TestError> {
        let node = find_node(engine, &location.node_name, purpose, pipeline_name)?;

        let data_set = self
            .data_sets
            .data_set(&location.data_set_name)
            .await?
            .ok_or_else(|| SetupError::DataSetNotFound {
                data_set: location.data_set_name.clone(),
                node: location.node_name.clone(),
            })?;

        let group = self
            .data_sets
            .group(&data_set.group_name)
            .await?
            .ok_or_else(|| SetupError::GroupNotFound {
                group: data_set.group_name.clone(),
                data_set: data_set.name.clone(),
            })?;

        Ok(ResolvedLocation {
            location,
            node,
            data_set,
            group,
        })
    }
}

fn find_node(
    engine: &dyn PipelineEngine,
    name: &str,
    purpose: &'static str,
    pipeline_name: &str,
) -> Result<NodeHandle, SetupError> {
    engine.find_node(name).ok_or_else(|| SetupError::NodeNotFound {
        node: name.to_string(),
        purpose,
        pipeline: pipeline_name.to_string(),
    })
}

/// Schema and data set indices of the rows injected for an input location
///
/// Without mappings the whole data set is injected under its field names.
/// With mappings only mapped fields are injected, renamed to the pipeline
/// field names.
fn input_projection(
    data_set: &DataSet,
    location: &SetLocation,
) -> Result<(RowSchema, Vec<usize>), FieldResolutionError> {
    let schema = data_set.materialize_schema(false);

    for key in &location.field_order_keys {
        if schema.index_of(key).is_none() {
            return Err(FieldResolutionError::new(
                key,
                MappingSide::DataSet,
                &data_set.name,
                &schema,
            ));
        }
    }

    if location.field_mappings.is_empty() {
        let indices = (0..schema.len()).collect();
        return Ok((schema, indices));
    }

    let mut values = Vec::with_capacity(location.field_mappings.len());
    let mut indices = Vec::with_capacity(location.field_mappings.len());
    for mapping in &location.field_mappings {
        let index = schema.index_of(&mapping.target_field_name).ok_or_else(|| {
            FieldResolutionError::new(
                &mapping.target_field_name,
                MappingSide::DataSet,
                &data_set.name,
                &schema,
            )
        })?;
        let mut meta = schema.values[index].clone();
        meta.name = mapping.source_field_name.clone();
        values.push(meta);
        indices.push(index);
    }

    Ok((RowSchema::new(values), indices))
}

fn project_row(row: &Row, indices: &[usize]) -> Row {
    indices
        .iter()
        .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
        .collect()
}

/// Data set side of golden mappings, checked before the pipeline runs
fn check_golden_targets(resolved: &ResolvedLocation<'_>) -> Result<(), FieldResolutionError> {
    let schema = resolved.data_set.materialize_schema(false);
    compare_indices(&resolved.data_set, &schema, &resolved.location.field_mappings)?;
    for mapping in &resolved.location.field_mappings {
        if schema.index_of(&mapping.target_field_name).is_none() {
            return Err(FieldResolutionError::new(
                &mapping.target_field_name,
                MappingSide::DataSet,
                &resolved.data_set.name,
                &schema,
            ));
        }
    }
    Ok(())
}

/// Compare captured rows with golden rows for one location
///
/// Returns whether the location failed and the comment describing the
/// outcome. Row counts must match; rows are then compared at the same
/// index, field by field, and the first mismatch ends the comparison.
pub fn verify_location(
    captured: &CapturedRows,
    golden_rows: &[Row],
    mappings: &[ResolvedMapping],
    node_name: &str,
) -> (bool, String) {
    if captured.rows.len() != golden_rows.len() {
        return (
            true,
            format!(
                "Incorrect number of rows received from node '{}': {} rows captured but {} golden rows expected",
                node_name,
                captured.rows.len(),
                golden_rows.len()
            ),
        );
    }

    let null = Value::Null;
    for (row_index, (captured_row, golden_row)) in
        captured.rows.iter().zip(golden_rows).enumerate()
    {
        for mapping in mappings {
            let captured_value = captured_row.get(mapping.source_index).unwrap_or(&null);
            let golden_value = golden_row.get(mapping.target_index).unwrap_or(&null);
            if !values_equal(mapping.field_type, captured_value, golden_value) {
                return (
                    true,
                    format!(
                        "Validation against golden data failed for row number {}: field '{}' has value '{}' but golden field '{}' has value '{}'",
                        row_index + 1,
                        mapping.source_field_name,
                        value_text(captured_value),
                        mapping.target_field_name,
                        value_text(golden_value)
                    ),
                );
            }
        }
    }

    (
        false,
        format!(
            "Test passed successfully against golden data: {} rows compared",
            golden_rows.len()
        ),
    )
}

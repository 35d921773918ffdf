//! Collaborators shared by the integration tests
//!
//! `MockExecutor` serves data set tables from memory and understands the
//! projection queries data sets issue. `MockEngine` records every change the
//! orchestrator makes and emits fixed rows at observed nodes.

#![allow(dead_code)]

use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tokio::runtime::Runtime;
use uuid::Uuid;

use data_testing_sdk::database::{
    ConnectionHandle, DatabaseError, DatabaseResult, QueryExecutor, QueryResult,
    quote_identifier, quote_qualified,
};
use data_testing_sdk::models::{
    DataSet, DataSetGroup, FieldDescriptor, FieldType, PipelineLocator, Row, RowSchema, ValueMeta,
};
use data_testing_sdk::pipeline::{
    CapturedRows, NodeHandle, PipelineEngine, PipelineError, PipelineResolver, PipelineResult,
    RunOutcome,
};
use serde_json::json;

pub fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

struct MockTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

/// In-memory query executor keyed by connection and table name
#[derive(Default)]
pub struct MockExecutor {
    tables: HashMap<(String, String), MockTable>,
    open: RefCell<HashSet<Uuid>>,
    pub queries: RefCell<Vec<String>>,
    pub fail_queries: bool,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(
        mut self,
        connection: &str,
        table: &str,
        columns: &[&str],
        rows: Vec<Row>,
    ) -> Self {
        self.tables.insert(
            (connection.to_string(), table.to_string()),
            MockTable {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows,
            },
        );
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    pub fn open_handles(&self) -> usize {
        self.open.borrow().len()
    }

    pub fn query_count(&self) -> usize {
        self.queries.borrow().len()
    }

    fn knows_connection(&self, name: &str) -> bool {
        self.tables.keys().any(|(connection, _)| connection == name)
    }
}

fn unquote(identifier: &str) -> String {
    identifier.trim().trim_matches('"').replace("\"\"", "\"")
}

#[async_trait(?Send)]
impl QueryExecutor for MockExecutor {
    async fn connect(&self, connection_name: &str) -> DatabaseResult<ConnectionHandle> {
        if !self.knows_connection(connection_name) {
            return Err(DatabaseError::UnknownConnection(connection_name.to_string()));
        }
        let handle = ConnectionHandle::new(connection_name);
        self.open.borrow_mut().insert(handle.id);
        Ok(handle)
    }

    fn quote_column(&self, name: &str) -> String {
        quote_identifier(name)
    }

    fn quote_schema_table(&self, schema: Option<&str>, table: &str) -> String {
        quote_qualified(schema, table)
    }

    async fn query(&self, handle: &ConnectionHandle, sql: &str) -> DatabaseResult<QueryResult> {
        self.queries.borrow_mut().push(sql.to_string());
        if !self.open.borrow().contains(&handle.id) {
            return Err(DatabaseError::InvalidHandle(handle.id));
        }
        if self.fail_queries {
            return Err(DatabaseError::QueryFailed("store unavailable".to_string()));
        }

        let body = sql
            .strip_prefix("SELECT ")
            .ok_or_else(|| DatabaseError::QueryFailed(format!("Unsupported query: {}", sql)))?;
        let (columns, table) = body
            .split_once(" FROM ")
            .ok_or_else(|| DatabaseError::QueryFailed(format!("Unsupported query: {}", sql)))?;
        let table = unquote(table.rsplit('.').next().unwrap_or(table));

        let stored = self
            .tables
            .get(&(handle.connection_name.clone(), table.clone()))
            .ok_or_else(|| DatabaseError::QueryFailed(format!("No such table: {}", table)))?;

        let selected: Vec<String> = columns.split(", ").map(unquote).collect();
        let mut indices = Vec::with_capacity(selected.len());
        for column in &selected {
            let index = stored
                .columns
                .iter()
                .position(|c| c.eq_ignore_ascii_case(column))
                .ok_or_else(|| DatabaseError::QueryFailed(format!("No such column: {}", column)))?;
            indices.push(index);
        }

        let rows = stored
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(QueryResult::new(selected, rows))
    }

    async fn disconnect(&self, handle: ConnectionHandle) -> DatabaseResult<()> {
        if self.open.borrow_mut().remove(&handle.id) {
            Ok(())
        } else {
            Err(DatabaseError::InvalidHandle(handle.id))
        }
    }
}

/// Everything the orchestrator asked the engine to do
#[derive(Debug, Default)]
pub struct EngineLog {
    pub replaced: Vec<(String, String)>,
    pub bypassed: Vec<String>,
    pub removed: Vec<String>,
    pub injected: Vec<(String, RowSchema, Vec<Row>)>,
    pub observed: Vec<String>,
    pub runs: usize,
}

/// Scripted pipeline engine
#[derive(Clone)]
pub struct MockEngine {
    name: String,
    nodes: Vec<String>,
    connections: Vec<String>,
    outputs: HashMap<String, CapturedRows>,
    outcome: Result<RunOutcome, String>,
    pub log: Rc<RefCell<EngineLog>>,
}

impl MockEngine {
    pub fn new(name: &str, nodes: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            nodes: nodes.iter().map(|n| n.to_string()).collect(),
            connections: Vec::new(),
            outputs: HashMap::new(),
            outcome: Ok(RunOutcome::succeeded()),
            log: Rc::new(RefCell::new(EngineLog::default())),
        }
    }

    pub fn with_connection(mut self, name: &str) -> Self {
        self.connections.push(name.to_string());
        self
    }

    /// Rows an observed node emits when the pipeline runs
    pub fn with_output(mut self, node: &str, schema: RowSchema, rows: Vec<Row>) -> Self {
        self.outputs
            .insert(node.to_string(), CapturedRows { schema, rows });
        self
    }

    pub fn with_outcome(mut self, outcome: RunOutcome) -> Self {
        self.outcome = Ok(outcome);
        self
    }

    pub fn crashing(mut self, message: &str) -> Self {
        self.outcome = Err(message.to_string());
        self
    }

    fn check(&self, node: &NodeHandle) -> PipelineResult<()> {
        if self.nodes.contains(&node.name) {
            Ok(())
        } else {
            Err(PipelineError::NodeNotFound(node.name.clone()))
        }
    }
}

#[async_trait(?Send)]
impl PipelineEngine for MockEngine {
    fn pipeline_name(&self) -> String {
        self.name.clone()
    }

    fn find_node(&self, name: &str) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .position(|n| n == name)
            .map(|i| NodeHandle::new(name, i.to_string()))
    }

    fn bypass_node(&mut self, node: &NodeHandle) -> PipelineResult<()> {
        self.check(node)?;
        self.log.borrow_mut().bypassed.push(node.name.clone());
        Ok(())
    }

    fn remove_node(&mut self, node: &NodeHandle) -> PipelineResult<()> {
        self.check(node)?;
        self.log.borrow_mut().removed.push(node.name.clone());
        Ok(())
    }

    fn inject_rows(
        &mut self,
        node: &NodeHandle,
        schema: RowSchema,
        rows: Vec<Row>,
    ) -> PipelineResult<()> {
        self.check(node)?;
        self.log
            .borrow_mut()
            .injected
            .push((node.name.clone(), schema, rows));
        Ok(())
    }

    fn replace_connection(&mut self, original: &str, replacement: &str) -> PipelineResult<()> {
        if !self.connections.iter().any(|c| c == original) {
            return Err(PipelineError::ConnectionNotFound(original.to_string()));
        }
        self.log
            .borrow_mut()
            .replaced
            .push((original.to_string(), replacement.to_string()));
        Ok(())
    }

    fn observe_node(&mut self, node: &NodeHandle) -> PipelineResult<()> {
        self.check(node)?;
        self.log.borrow_mut().observed.push(node.name.clone());
        Ok(())
    }

    async fn run(&mut self) -> PipelineResult<RunOutcome> {
        self.log.borrow_mut().runs += 1;
        self.outcome.clone().map_err(PipelineError::Engine)
    }

    fn captured_rows(&self, node: &NodeHandle) -> PipelineResult<CapturedRows> {
        if !self.log.borrow().observed.contains(&node.name) {
            return Err(PipelineError::NotObserved(node.name.clone()));
        }
        Ok(self.outputs.get(&node.name).cloned().unwrap_or_default())
    }
}

/// Resolves locators to scripted engines
#[derive(Default)]
pub struct MockResolver {
    engines: Vec<(PipelineLocator, MockEngine)>,
    pub tried: RefCell<Vec<PipelineLocator>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, locator: PipelineLocator, engine: MockEngine) -> Self {
        self.engines.push((locator, engine));
        self
    }
}

#[async_trait(?Send)]
impl PipelineResolver for MockResolver {
    async fn resolve(
        &self,
        locator: &PipelineLocator,
    ) -> PipelineResult<Option<Box<dyn PipelineEngine>>> {
        self.tried.borrow_mut().push(locator.clone());
        Ok(self
            .engines
            .iter()
            .find(|(l, _)| l == locator)
            .map(|(_, engine)| Box::new(engine.clone()) as Box<dyn PipelineEngine>))
    }
}

/// The golden data set used across the tests: fields declared d, c, b, a
pub fn golden_out() -> DataSet {
    DataSet::new("GoldenOut", "golden", "GOLDEN_OUT")
        .with_field(FieldDescriptor::new("d", "COL_D", FieldType::Integer))
        .with_field(FieldDescriptor::new("c", "COL_C", FieldType::String))
        .with_field(FieldDescriptor::new("b", "COL_B", FieldType::String))
        .with_field(FieldDescriptor::new("a", "COL_A", FieldType::String))
}

pub fn golden_group() -> DataSetGroup {
    DataSetGroup::new("golden", "golden-db").with_schema("main")
}

/// Rows as stored, in fetch order
pub fn golden_rows() -> Vec<Row> {
    vec![
        vec![json!(123456), json!("c1"), json!("b1"), json!("a1")],
        vec![json!(123456), json!("c2"), json!("b2"), json!("a2")],
        vec![json!(123456), json!("c3"), json!("b3"), json!("a3")],
    ]
}

pub fn golden_executor() -> MockExecutor {
    MockExecutor::new().with_table(
        "golden-db",
        "GOLDEN_OUT",
        &["COL_D", "COL_C", "COL_B", "COL_A"],
        golden_rows(),
    )
}

pub fn captured_abc_schema() -> RowSchema {
    RowSchema::new(vec![
        ValueMeta::new("a", FieldType::String),
        ValueMeta::new("b", FieldType::String),
        ValueMeta::new("c", FieldType::String),
    ])
}

pub fn captured_abc_rows() -> Vec<Row> {
    (1..=3)
        .map(|i| {
            vec![
                json!(format!("a{}", i)),
                json!(format!("b{}", i)),
                json!(format!("c{}", i)),
            ]
        })
        .collect()
}

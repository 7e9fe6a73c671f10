//! Canonical metadata records produced by the extractors.
//!
//! These types are the normalized, source-shape-independent representation of
//! a Tableau workbook or Prep flow. They are created once per extraction pass,
//! serialized to JSON by the [`crate::store`] module, and never mutated.
//!
//! Absent XML attributes always round-trip as empty strings, never as nulls.

use serde::{Deserialize, Serialize};

/// Connection details shared by workbook datasources and prep-flow
/// input/output nodes. Any field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub dbname: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub authentication: String,
    /// Sourced from the `table-name` XML attribute on prep-flow connections.
    #[serde(default)]
    pub table: String,
}

impl Connection {
    /// Reads connection details from the first nested `connection` element of
    /// a datasource or flow node. Absence yields an empty record, not an error.
    pub fn from_node(node: &crate::document::Element) -> Connection {
        let conn = match node.find_first("connection") {
            Some(conn) => conn,
            None => return Connection::default(),
        };
        Connection {
            class: conn.attr_string("class"),
            server: conn.attr_string("server"),
            dbname: conn.attr_string("dbname"),
            schema: conn.attr_string("schema"),
            username: conn.attr_string("username"),
            authentication: conn.attr_string("authentication"),
            table: conn.attr_string("table-name"),
        }
    }
}

/// A user datasource in a workbook. Internal Tableau datasources
/// (`Parameters*`, `Sample File`) are never materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datasource {
    pub name: String,
    pub caption: String,
    pub connection: Connection,
}

/// A calculated field with its formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedField {
    pub display_name: String,
    pub internal_name: String,
    pub formula: String,
    pub datatype: String,
    pub role: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

/// A workbook parameter. Caption falls back to the internal name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub caption: String,
    pub datatype: String,
    pub value: String,
}

/// A worksheet filter. `column` holds the `column` attribute, falling back to
/// `field`; filters with neither are dropped at extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub class: String,
}

/// A join relation between two tables in a workbook datasource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkbookJoin {
    pub join_type: String,
    pub left_table: String,
    pub right_table: String,
    pub condition: String,
}

/// Everything extracted from one workbook document, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkbookMetadata {
    pub name: String,
    pub datasources: Vec<Datasource>,
    pub calculated_fields: Vec<CalculatedField>,
    pub parameters: Vec<Parameter>,
    pub filters: Vec<Filter>,
    pub joins: Vec<WorkbookJoin>,
    pub source_file: String,
}

/// An input data source node in a prep flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSource {
    pub id: String,
    pub name: String,
    pub connection: Connection,
}

/// Type-specific detail attached to a transformation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepDetail {
    Join { join_type: String },
    Aggregate { aggregations: Vec<Aggregation> },
    Filter { condition: FilterCondition },
    Clean { operation: CleanOperation },
    Other {},
}

/// One aggregated output field of an aggregate step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub name: String,
    pub calculation: String,
    pub source_field: String,
}

/// The predicate of a filter step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub field: String,
    pub operator: String,
    pub value: String,
}

/// The operation of a clean step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanOperation {
    #[serde(rename = "type")]
    pub op_type: String,
    pub field: String,
}

/// One transformation step. `step_number` is assigned in document traversal
/// order starting at 1 and is unrelated to the `id` attribute in the XML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub step_number: usize,
    #[serde(rename = "type")]
    pub step_type: String,
    pub id: String,
    pub name: String,
    pub input_step_id: String,
    pub detail: StepDetail,
}

/// One side of a prep-flow join: the feeding step and its display alias.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinInput {
    pub source: String,
    pub alias: String,
}

/// One key-pair clause of a prep-flow join. Operator defaults to `=`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinCondition {
    pub left_field: String,
    pub right_field: String,
    pub operator: String,
    pub left_source: String,
    pub right_source: String,
}

/// A join node with its two inputs (first in document order = left) and all
/// of its join clauses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowJoin {
    pub id: String,
    pub name: String,
    pub join_type: String,
    pub left: JoinInput,
    pub right: JoinInput,
    pub conditions: Vec<JoinCondition>,
}

/// An output destination node in a prep flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub id: String,
    pub name: String,
    pub input_step_id: String,
    pub connection: Connection,
}

/// Everything extracted from one prep-flow document, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepFlowMetadata {
    pub flow_name: String,
    pub input_sources: Vec<InputSource>,
    pub steps: Vec<Step>,
    pub joins: Vec<FlowJoin>,
    pub outputs: Vec<Output>,
    pub source_file: String,
}

/// The unit the store persists and the assembler consumes: one canonical
/// record, tagged on the wire by a `"type"` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardMetadata {
    Workbook(WorkbookMetadata),
    PrepFlow(PrepFlowMetadata),
}

impl DashboardMetadata {
    pub fn kind(&self) -> DashboardKind {
        match self {
            DashboardMetadata::Workbook(_) => DashboardKind::Workbook,
            DashboardMetadata::PrepFlow(_) => DashboardKind::PrepFlow,
        }
    }
}

/// Which of the two artifact formats a record (or a lookup) refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardKind {
    Workbook,
    PrepFlow,
}

impl DashboardKind {
    /// Store subdirectory for this kind.
    pub fn subdir(self) -> &'static str {
        match self {
            DashboardKind::Workbook => "workbooks",
            DashboardKind::PrepFlow => "prep_flows",
        }
    }

    /// Human-readable title used in context headers.
    pub fn title(self) -> &'static str {
        match self {
            DashboardKind::Workbook => "Workbook",
            DashboardKind::PrepFlow => "Prep Flow",
        }
    }
}

/// A past issue record from the historical-issues dataset. Read-only
/// reference data, reloaded at process start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalIssue {
    pub dashboard_name: String,
    pub issue_description: String,
    pub root_cause: String,
    pub resolution: String,
}

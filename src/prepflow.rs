//! Prep flow (.tfl) metadata extraction.
//!
//! Walks a loaded prep-flow tree and emits a canonical [`PrepFlowMetadata`]
//! record. Same degrade-to-empty policy as the workbook extractor: the only
//! hard error is a document that failed to load.

use crate::document::{Document, Element};
use crate::models::{
    Aggregation, CleanOperation, Connection, FilterCondition, FlowJoin, InputSource, JoinCondition,
    JoinInput, Output, PrepFlowMetadata, Step, StepDetail,
};

/// Extracts all prep-flow metadata. `flow_name` is the caller-supplied record
/// key, not derived from the XML.
pub fn extract(doc: &Document, flow_name: &str, source_file: &str) -> PrepFlowMetadata {
    PrepFlowMetadata {
        flow_name: flow_name.to_string(),
        input_sources: extract_input_sources(&doc.root),
        steps: extract_steps(&doc.root),
        joins: extract_joins(&doc.root),
        outputs: extract_outputs(&doc.root),
        source_file: source_file.to_string(),
    }
}

fn nodes_of_type<'a>(root: &'a Element, node_type: &str) -> Vec<&'a Element> {
    root.find_all("node")
        .into_iter()
        .filter(|node| node.attr("type") == Some(node_type))
        .collect()
}

fn extract_input_sources(root: &Element) -> Vec<InputSource> {
    nodes_of_type(root, "input")
        .into_iter()
        .map(|node| InputSource {
            id: node.attr_string("id"),
            name: node.attr_string("name"),
            connection: Connection::from_node(node),
        })
        .collect()
}

/// Step numbers are 1-based, contiguous, and assigned in document traversal
/// order. Nodes without a non-empty `type` attribute are skipped without
/// consuming a number.
fn extract_steps(root: &Element) -> Vec<Step> {
    let mut steps = Vec::new();
    for node in root.find_all("node") {
        let step_type = node.attr_string("type");
        if step_type.is_empty() {
            continue;
        }
        let detail = step_detail(node, &step_type);
        steps.push(Step {
            step_number: steps.len() + 1,
            step_type,
            id: node.attr_string("id"),
            name: node.attr_string("name"),
            input_step_id: node.attr_string("input"),
            detail,
        });
    }
    steps
}

fn step_detail(node: &Element, step_type: &str) -> StepDetail {
    match step_type {
        "join" => StepDetail::Join {
            join_type: node.attr_string("join-type"),
        },
        "aggregate" => StepDetail::Aggregate {
            aggregations: extract_aggregations(node),
        },
        "filter" => StepDetail::Filter {
            condition: node
                .find_first("condition")
                .map(|cond| FilterCondition {
                    field: cond.attr_string("field"),
                    operator: cond.attr_string("operator"),
                    value: cond.attr_string("value"),
                })
                .unwrap_or_default(),
        },
        "clean" => StepDetail::Clean {
            operation: node
                .find_first("operation")
                .map(|op| CleanOperation {
                    op_type: op.attr_string("type"),
                    field: op.attr_string("field"),
                })
                .unwrap_or_default(),
        },
        _ => StepDetail::Other {},
    }
}

fn extract_aggregations(node: &Element) -> Vec<Aggregation> {
    let container = match node.find_first("aggregations") {
        Some(container) => container,
        None => return Vec::new(),
    };
    container
        .find_all("field")
        .into_iter()
        .map(|field| Aggregation {
            name: field.attr_string("name"),
            calculation: field.attr_string("calculation"),
            source_field: field.attr_string("source-field"),
        })
        .collect()
}

fn extract_joins(root: &Element) -> Vec<FlowJoin> {
    nodes_of_type(root, "join")
        .into_iter()
        .map(|node| {
            let (left, right) = join_inputs(node);
            FlowJoin {
                id: node.attr_string("id"),
                name: node.attr_string("name"),
                join_type: node.attr("join-type").unwrap_or("inner").to_string(),
                left,
                right,
                conditions: join_conditions(node),
            }
        })
        .collect()
}

/// The first nested input element is the join's left side, the second its
/// right. Inputs beyond the second are ignored; missing sides stay empty.
fn join_inputs(node: &Element) -> (JoinInput, JoinInput) {
    let mut inputs = node.find_all("input").into_iter().map(|input| JoinInput {
        source: input.attr_string("source"),
        alias: input.attr_string("alias"),
    });
    (
        inputs.next().unwrap_or_default(),
        inputs.next().unwrap_or_default(),
    )
}

fn join_conditions(node: &Element) -> Vec<JoinCondition> {
    node.find_all("join-clause")
        .into_iter()
        .map(|clause| JoinCondition {
            left_field: clause.attr_string("left-field"),
            right_field: clause.attr_string("right-field"),
            operator: clause.attr("operator").unwrap_or("=").to_string(),
            left_source: clause.attr_string("left-source"),
            right_source: clause.attr_string("right-source"),
        })
        .collect()
}

fn extract_outputs(root: &Element) -> Vec<Output> {
    nodes_of_type(root, "output")
        .into_iter()
        .map(|node| Output {
            id: node.attr_string("id"),
            name: node.attr_string("name"),
            input_step_id: node.attr_string("input"),
            connection: Connection::from_node(node),
        })
        .collect()
}

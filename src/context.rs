//! Context assembly.
//!
//! Composes one canonical metadata record plus a bounded list of historical
//! issues into a single Markdown text block for the downstream prompt layer.
//! The output shape is consumed verbatim by that layer: headers, bullets, and
//! the `---` separator must not change without a corresponding change there.
//!
//! Rendering is deterministic — identical inputs produce byte-identical
//! output — so callers can test by literal string comparison. Missing inputs
//! never fail; they render as placeholders.

use crate::models::{
    DashboardKind, DashboardMetadata, HistoricalIssue, PrepFlowMetadata, StepDetail,
    WorkbookMetadata,
};

/// Fixed separator between the metadata and issues sections.
const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Rendering caps, threaded in explicitly rather than read from ambient
/// process state.
#[derive(Debug, Clone, Copy)]
pub struct RenderLimits {
    pub max_calculated_fields: usize,
    pub max_filters: usize,
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self {
            max_calculated_fields: 10,
            max_filters: 5,
        }
    }
}

/// Builds the full context block: metadata section, separator, issues section.
/// Always returns a non-empty, well-formed string.
pub fn assemble(
    dashboard_name: &str,
    kind: DashboardKind,
    metadata: Option<&DashboardMetadata>,
    issues: &[HistoricalIssue],
    limits: RenderLimits,
) -> String {
    let metadata_section = match metadata {
        Some(DashboardMetadata::Workbook(workbook)) => format_workbook(workbook, limits),
        Some(DashboardMetadata::PrepFlow(flow)) => format_prepflow(flow),
        None => format!(
            "# {}: {}\n\n(No metadata available)",
            kind.title(),
            dashboard_name
        ),
    };

    let issues_section = if issues.is_empty() {
        "# Historical Issues\n\nNo previous issues found for this dashboard.".to_string()
    } else {
        format_issues(issues)
    };

    format!("{}{}{}", metadata_section, SECTION_SEPARATOR, issues_section)
}

fn format_workbook(metadata: &WorkbookMetadata, limits: RenderLimits) -> String {
    let mut sections = vec![format!("# Tableau Workbook: {}\n", metadata.name)];

    if !metadata.datasources.is_empty() {
        sections.push("## Data Sources:".to_string());
        for ds in &metadata.datasources {
            let conn = &ds.connection;
            let mut conn_str = if conn.class.is_empty() {
                "N/A".to_string()
            } else {
                conn.class.clone()
            };
            if !conn.dbname.is_empty() {
                conn_str.push_str(&format!(" - {}", conn.dbname));
            }
            if !conn.server.is_empty() {
                conn_str.push_str(&format!(" @ {}", conn.server));
            }
            let display = if ds.caption.is_empty() {
                &ds.name
            } else {
                &ds.caption
            };
            sections.push(format!("- **{}**: {}", display, conn_str));
        }
    }

    if !metadata.calculated_fields.is_empty() {
        sections.push("\n## Calculated Fields:".to_string());
        for field in metadata
            .calculated_fields
            .iter()
            .take(limits.max_calculated_fields)
        {
            sections.push(format!("- **{}**: `{}`", field.display_name, field.formula));
        }
        if metadata.calculated_fields.len() > limits.max_calculated_fields {
            sections.push(format!(
                "  _(... and {} more)_",
                metadata.calculated_fields.len() - limits.max_calculated_fields
            ));
        }
    }

    if !metadata.parameters.is_empty() {
        sections.push("\n## Parameters:".to_string());
        for param in &metadata.parameters {
            let display = if param.caption.is_empty() {
                &param.name
            } else {
                &param.caption
            };
            let value_str = if param.value.is_empty() {
                String::new()
            } else {
                format!(" = {}", param.value)
            };
            sections.push(format!(
                "- **{}** ({}){}",
                display, param.datatype, value_str
            ));
        }
    }

    if !metadata.joins.is_empty() {
        sections.push("\n## Joins:".to_string());
        for join in &metadata.joins {
            let left = if join.left_table.is_empty() {
                "Table1"
            } else {
                join.left_table.as_str()
            };
            let right = if join.right_table.is_empty() {
                "Table2"
            } else {
                join.right_table.as_str()
            };
            sections.push(format!(
                "- **{} JOIN**: {} ↔ {}",
                join.join_type.to_uppercase(),
                left,
                right
            ));
            if !join.condition.is_empty() {
                sections.push(format!("  - Condition: `{}`", join.condition));
            }
        }
    }

    if !metadata.filters.is_empty() {
        sections.push("\n## Active Filters:".to_string());
        for filter in metadata.filters.iter().take(limits.max_filters) {
            sections.push(format!("- {} ({})", filter.column, filter.class));
        }
    }

    sections.join("\n")
}

fn format_prepflow(metadata: &PrepFlowMetadata) -> String {
    let mut sections = vec![format!("# Tableau Prep Flow: {}\n", metadata.flow_name)];

    if !metadata.input_sources.is_empty() {
        sections.push("## Input Sources:".to_string());
        for input in &metadata.input_sources {
            let conn = &input.connection;
            let mut table_info = if conn.table.is_empty() {
                "N/A".to_string()
            } else {
                conn.table.clone()
            };
            if !conn.dbname.is_empty() {
                table_info = format!("{}.{}", conn.dbname, table_info);
            }
            sections.push(format!("- **{}**: {}", input.name, table_info));
        }
    }

    if !metadata.steps.is_empty() {
        sections.push("\n## Transformation Steps:".to_string());
        for step in &metadata.steps {
            let mut step_desc = format!(
                "{}. **{}**: {}",
                step.step_number,
                step.step_type.to_uppercase(),
                step.name
            );
            if let StepDetail::Join { join_type } = &step.detail {
                if !join_type.is_empty() {
                    step_desc.push_str(&format!(" ({} join)", join_type));
                }
            }
            sections.push(step_desc);
        }
    }

    if !metadata.joins.is_empty() {
        sections.push("\n## Join Details:".to_string());
        for join in &metadata.joins {
            let left_alias = if join.left.alias.is_empty() {
                "Left"
            } else {
                join.left.alias.as_str()
            };
            let right_alias = if join.right.alias.is_empty() {
                "Right"
            } else {
                join.right.alias.as_str()
            };
            sections.push(format!(
                "- **{}** ({}): {} + {}",
                join.name, join.join_type, left_alias, right_alias
            ));
            for cond in &join.conditions {
                sections.push(format!(
                    "  - ON: {} {} {}",
                    cond.left_field, cond.operator, cond.right_field
                ));
            }
        }
    }

    if !metadata.outputs.is_empty() {
        sections.push("\n## Output Destinations:".to_string());
        for output in &metadata.outputs {
            let conn = &output.connection;
            let dest = if !conn.table.is_empty() {
                conn.table.as_str()
            } else if !conn.dbname.is_empty() {
                conn.dbname.as_str()
            } else {
                "Unknown"
            };
            sections.push(format!("- **{}** → {}", output.name, dest));
        }
    }

    sections.join("\n")
}

fn format_issues(issues: &[HistoricalIssue]) -> String {
    let mut sections = vec![
        "# Historical Issues & Resolutions\n".to_string(),
        format!("_Found {} similar past issue(s):_\n", issues.len()),
    ];

    for (i, issue) in issues.iter().enumerate() {
        sections.push(format!("## Issue {}:", i + 1));
        sections.push(format!("**Description:** {}", issue.issue_description));
        sections.push(format!("**Root Cause:** {}", issue.root_cause));
        sections.push(format!("**Resolution:** {}", issue.resolution));
        sections.push(String::new());
    }

    sections.join("\n")
}

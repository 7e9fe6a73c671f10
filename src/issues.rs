//! Historical issue lookups.
//!
//! Loads a CSV export of past dashboard issues once at construction and
//! answers "issues relevant to dashboard X" queries with a case-insensitive
//! substring match. A dataset that fails to load downgrades the index to
//! always-empty results for the life of the process — absence of history is a
//! normal, expected case for a new dashboard, never an error.

use std::path::Path;

use crate::models::HistoricalIssue;

const COL_DASHBOARD_NAME: &str = "Dashboard/Workflow Name";
const COL_ISSUE_DESCRIPTION: &str = "Issue Description";
const COL_ROOT_CAUSE: &str = "Root Cause";
const COL_RESOLUTION: &str = "Resolution";

/// In-memory index over the historical-issues dataset.
#[derive(Debug)]
pub struct HistoricalIssueIndex {
    issues: Vec<HistoricalIssue>,
}

impl HistoricalIssueIndex {
    /// Loads the dataset at `path`. Never fails: an unreadable or malformed
    /// dataset (including one missing the dashboard-name column) logs one
    /// warning and yields an index that returns empty results for every query.
    pub fn load(path: &Path) -> HistoricalIssueIndex {
        match read_issues(path) {
            Ok(issues) => {
                println!(
                    "Loaded {} historical issues from {}",
                    issues.len(),
                    path.display()
                );
                HistoricalIssueIndex { issues }
            }
            Err(e) => {
                eprintln!(
                    "Warning: could not load historical issues from {}: {}",
                    path.display(),
                    e
                );
                HistoricalIssueIndex::unavailable()
            }
        }
    }

    /// An index with no backing dataset. Every query returns empty.
    pub fn unavailable() -> HistoricalIssueIndex {
        HistoricalIssueIndex { issues: Vec::new() }
    }

    /// Issues whose dashboard-name column contains `dashboard_name` as a
    /// case-insensitive substring, in original dataset row order, truncated
    /// to `limit`. The permissive match is deliberate so minor naming
    /// variants still surface prior issues.
    pub fn issues_for(&self, dashboard_name: &str, limit: usize) -> Vec<HistoricalIssue> {
        let needle = dashboard_name.to_lowercase();
        self.issues
            .iter()
            .filter(|issue| {
                !issue.dashboard_name.is_empty()
                    && issue.dashboard_name.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect()
    }
}

fn read_issues(path: &Path) -> anyhow::Result<Vec<HistoricalIssue>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let name_idx = column_index(&headers, COL_DASHBOARD_NAME)
        .ok_or_else(|| anyhow::anyhow!("'{}' column not found", COL_DASHBOARD_NAME))?;
    // The remaining columns degrade to empty fields when absent; extra
    // columns are ignored.
    let description_idx = column_index(&headers, COL_ISSUE_DESCRIPTION);
    let cause_idx = column_index(&headers, COL_ROOT_CAUSE);
    let resolution_idx = column_index(&headers, COL_RESOLUTION);

    let mut issues = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string()
        };
        issues.push(HistoricalIssue {
            dashboard_name: field(Some(name_idx)),
            issue_description: field(description_idx),
            root_cause: field(cause_idx),
            resolution: field(resolution_idx),
        });
    }
    Ok(issues)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_dataset(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues_export.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    const DATASET: &str = "\
Dashboard/Workflow Name,Issue Description,Root Cause,Resolution,Reported By
sales_dashboard,Blank Q4 values,Stale extract,Refreshed the extract,alice
SALES_DASHBOARD_EU,Wrong percentages,Bad formula,Fixed the formula,bob
customer_prep_flow,Join step failing,Duplicate keys,Deduplicated input,carol
sales_dashboard,Filter shows all regions,Filter scope,Rescoped the filter,dave
,Orphan row without a name,Unknown,None,erin
sales_dashboard,Slow load,Too many marks,Aggregated the view,frank
";

    #[test]
    fn substring_match_is_case_insensitive_and_ordered() {
        let (_dir, path) = write_dataset(DATASET);
        let index = HistoricalIssueIndex::load(&path);

        let issues = index.issues_for("sales_dashboard", 3);
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].issue_description, "Blank Q4 values");
        assert_eq!(issues[1].dashboard_name, "SALES_DASHBOARD_EU");
        assert_eq!(issues[2].issue_description, "Filter shows all regions");
    }

    #[test]
    fn limit_truncates_in_row_order() {
        let (_dir, path) = write_dataset(DATASET);
        let index = HistoricalIssueIndex::load(&path);
        assert_eq!(index.issues_for("sales_dashboard", 10).len(), 4);
        assert_eq!(index.issues_for("sales_dashboard", 1).len(), 1);
    }

    #[test]
    fn rows_without_dashboard_name_never_match() {
        let (_dir, path) = write_dataset(DATASET);
        let index = HistoricalIssueIndex::load(&path);
        // Empty needle is a substring of everything, yet the orphan row with
        // no name must stay out.
        let issues = index.issues_for("", 100);
        assert_eq!(issues.len(), 5);
        assert!(issues.iter().all(|i| !i.dashboard_name.is_empty()));
    }

    #[test]
    fn no_match_returns_empty() {
        let (_dir, path) = write_dataset(DATASET);
        let index = HistoricalIssueIndex::load(&path);
        assert!(index.issues_for("inventory_dashboard", 5).is_empty());
    }

    #[test]
    fn missing_file_downgrades_to_empty_results() {
        let index = HistoricalIssueIndex::load(Path::new("/nonexistent/issues.csv"));
        assert!(index.issues_for("sales_dashboard", 5).is_empty());
    }

    #[test]
    fn missing_name_column_downgrades_to_empty_results() {
        let (_dir, path) = write_dataset("Issue Description,Root Cause\nsomething,other\n");
        let index = HistoricalIssueIndex::load(&path);
        assert!(index.issues_for("sales_dashboard", 5).is_empty());
    }

    #[test]
    fn missing_optional_columns_degrade_to_empty_fields() {
        let (_dir, path) =
            write_dataset("Dashboard/Workflow Name,Issue Description\nsales_dashboard,Broken\n");
        let index = HistoricalIssueIndex::load(&path);
        let issues = index.issues_for("sales", 5);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_description, "Broken");
        assert_eq!(issues[0].root_cause, "");
        assert_eq!(issues[0].resolution, "");
    }
}

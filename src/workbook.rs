//! Workbook (.twb) metadata extraction.
//!
//! Walks a loaded workbook tree and emits a canonical [`WorkbookMetadata`]
//! record. Extraction is a pure function of the document: it never fails on
//! missing optional substructure (absent attributes become empty strings,
//! absent collections become empty vectors), and every collection preserves
//! document order.

use crate::document::{Document, Element};
use crate::models::{
    CalculatedField, Connection, Datasource, Filter, Parameter, WorkbookJoin, WorkbookMetadata,
};

/// Datasource name prefix for Tableau's internal parameters datasource.
const RESERVED_PREFIX: &str = "Parameters";
/// Datasource name for Tableau's internal sample-file datasource.
const RESERVED_SAMPLE_FILE: &str = "Sample File";

/// Extracts all workbook metadata. `name` is the caller-supplied record key,
/// not derived from the XML.
pub fn extract(doc: &Document, name: &str, source_file: &str) -> WorkbookMetadata {
    WorkbookMetadata {
        name: name.to_string(),
        datasources: extract_datasources(&doc.root),
        calculated_fields: extract_calculated_fields(&doc.root),
        parameters: extract_parameters(&doc.root),
        filters: extract_filters(&doc.root),
        joins: extract_joins(&doc.root),
        source_file: source_file.to_string(),
    }
}

fn extract_datasources(root: &Element) -> Vec<Datasource> {
    let mut datasources = Vec::new();
    for ds in root.find_all("datasource") {
        let name = match ds.attr("name") {
            Some(name) => name,
            None => continue,
        };
        // Internal Tableau artifacts, not user data.
        if name.starts_with(RESERVED_PREFIX) || name == RESERVED_SAMPLE_FILE {
            continue;
        }
        datasources.push(Datasource {
            name: name.to_string(),
            caption: ds.attr("caption").unwrap_or(name).to_string(),
            connection: Connection::from_node(ds),
        });
    }
    datasources
}

fn extract_calculated_fields(root: &Element) -> Vec<CalculatedField> {
    let mut fields = Vec::new();
    for col in root.find_all("column") {
        let caption = match col.attr("caption") {
            Some(caption) => caption,
            None => continue,
        };
        let internal_name = col.attr_string("name");
        let calculation = col.find_first("calculation");
        // Heuristic preserved as observed: a nested calculation element or a
        // "Calculated" substring in the internal name marks a calculated
        // field. Known to mis-match on workbooks with other naming schemes.
        if !internal_name.contains("Calculated") && calculation.is_none() {
            continue;
        }
        fields.push(CalculatedField {
            display_name: caption.to_string(),
            internal_name,
            formula: calculation.map(|c| c.attr_string("formula")).unwrap_or_default(),
            datatype: col.attr("datatype").unwrap_or("unknown").to_string(),
            role: col.attr_string("role"),
            field_type: col.attr_string("type"),
        });
    }
    fields
}

fn extract_parameters(root: &Element) -> Vec<Parameter> {
    root.find_all("parameter")
        .into_iter()
        .map(|param| {
            let name = param.attr_string("name");
            Parameter {
                caption: param.attr("caption").unwrap_or(&name).to_string(),
                name,
                datatype: param.attr_string("type"),
                value: param.attr_string("value"),
            }
        })
        .collect()
}

fn extract_filters(root: &Element) -> Vec<Filter> {
    let mut filters = Vec::new();
    for filter in root.find_all("filter") {
        let column = filter.attr_string("column");
        let field = filter.attr_string("field");
        // Both empty means an incomplete filter element; treat as noise.
        if column.is_empty() && field.is_empty() {
            continue;
        }
        filters.push(Filter {
            column: if column.is_empty() { field } else { column },
            class: filter.attr_string("class"),
        });
    }
    filters
}

fn extract_joins(root: &Element) -> Vec<WorkbookJoin> {
    root.find_all("relation")
        .into_iter()
        .filter(|rel| rel.attr("type") == Some("join"))
        .map(|rel| {
            let (left_table, right_table) = join_tables(rel);
            WorkbookJoin {
                join_type: rel.attr("join").unwrap_or("inner").to_string(),
                left_table,
                right_table,
                condition: join_condition(rel),
            }
        })
        .collect()
}

/// The first two nested table relations, in document order, are the join's
/// left and right sides. Relations beyond the second are ignored; fewer than
/// two degrade to empty strings.
fn join_tables(relation: &Element) -> (String, String) {
    let tables: Vec<&Element> = relation
        .find_all("relation")
        .into_iter()
        .filter(|rel| rel.attr("type") == Some("table"))
        .collect();
    if tables.len() < 2 {
        return (String::new(), String::new());
    }
    (table_name(tables[0]), table_name(tables[1]))
}

fn table_name(relation: &Element) -> String {
    relation
        .attr("table")
        .or_else(|| relation.attr("name"))
        .unwrap_or_default()
        .to_string()
}

/// The ON expression from a nested join clause, falling back to an
/// `expression` attribute directly on the relation.
fn join_condition(relation: &Element) -> String {
    relation
        .find_all("clause")
        .into_iter()
        .find(|clause| clause.attr("type") == Some("join"))
        .map(|clause| clause.attr_string("expression"))
        .unwrap_or_else(|| relation.attr_string("expression"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
        <workbook version="18.1" source-build="2023.1.0">
          <datasources>
            <datasource name="Parameters [Internal]" caption="Parameters"/>
            <datasource name="Sample File"/>
            <datasource name="Sample-Superstore" caption="Sales Data" inline="true">
              <connection class="sqlserver" dbname="SalesDB" server="sql-server-01.db.com"
                          schema="dbo" username="sales_user"/>
              <column caption="Profit Margin" datatype="real" name="[Calculated_Profit_Margin]"
                      role="measure" type="quantitative">
                <calculation formula="[Profit] / [Sales]" class="tableau"/>
              </column>
              <column caption="Order Date" datatype="date" name="[Order Date]" role="dimension"/>
              <relation type="join" join="inner" connection="sqlserver">
                <relation type="table" table="[dbo].[Orders]" name="Orders"/>
                <relation type="table" table="[dbo].[Customers]" name="Customers"/>
                <clause type="join" expression="[Orders].[CustomerID] = [Customers].[CustomerID]"/>
              </relation>
            </datasource>
          </datasources>
          <parameter name="Date Range Start" type="date" value="#2025-01-01#" caption="Start Date"/>
          <parameter name="Region Filter" type="string" value="All"/>
          <worksheets>
            <worksheet name="Sales Overview">
              <filter column="[Region]" class="categorical"/>
              <filter class="quantitative"/>
              <filter field="[Order Date]" class="quantitative"/>
            </worksheet>
          </worksheets>
        </workbook>"##;

    fn sample() -> WorkbookMetadata {
        let doc = Document::parse(SAMPLE).unwrap();
        extract(&doc, "sales_dashboard", "sample_workbook.twb")
    }

    #[test]
    fn reserved_datasources_are_excluded() {
        let meta = sample();
        assert_eq!(meta.datasources.len(), 1);
        assert_eq!(meta.datasources[0].name, "Sample-Superstore");
        assert_eq!(meta.datasources[0].caption, "Sales Data");
        assert_eq!(meta.datasources[0].connection.class, "sqlserver");
        assert_eq!(meta.datasources[0].connection.dbname, "SalesDB");
        assert_eq!(meta.datasources[0].connection.authentication, "");
    }

    #[test]
    fn datasource_without_connection_yields_empty_record() {
        let doc = Document::parse(r#"<workbook><datasource name="ds"/></workbook>"#).unwrap();
        let meta = extract(&doc, "d", "d.twb");
        assert_eq!(meta.datasources.len(), 1);
        assert_eq!(meta.datasources[0].connection, Connection::default());
    }

    #[test]
    fn plain_columns_are_not_calculated_fields() {
        let meta = sample();
        assert_eq!(meta.calculated_fields.len(), 1);
        let field = &meta.calculated_fields[0];
        assert_eq!(field.display_name, "Profit Margin");
        assert_eq!(field.internal_name, "[Calculated_Profit_Margin]");
        assert_eq!(field.formula, "[Profit] / [Sales]");
        assert_eq!(field.datatype, "real");
        assert_eq!(field.role, "measure");
        assert_eq!(field.field_type, "quantitative");
    }

    #[test]
    fn calculated_name_without_calculation_element_still_matches() {
        let doc = Document::parse(
            r#"<workbook>
                 <column caption="Margin" name="[Calculated_Margin]" datatype="real"/>
               </workbook>"#,
        )
        .unwrap();
        let meta = extract(&doc, "d", "d.twb");
        assert_eq!(meta.calculated_fields.len(), 1);
        assert_eq!(meta.calculated_fields[0].formula, "");
    }

    #[test]
    fn extraction_returns_complete_field_set_without_cap() {
        let columns: String = (0..13)
            .map(|i| {
                format!(
                    r#"<column caption="Field {i}" name="[Calculated_{i}]">
                         <calculation formula="{i}"/>
                       </column>"#
                )
            })
            .collect();
        let doc = Document::parse(&format!("<workbook>{columns}</workbook>")).unwrap();
        let meta = extract(&doc, "d", "d.twb");
        assert_eq!(meta.calculated_fields.len(), 13);
        // Document order preserved, no re-sort.
        assert_eq!(meta.calculated_fields[0].display_name, "Field 0");
        assert_eq!(meta.calculated_fields[12].display_name, "Field 12");
    }

    #[test]
    fn parameter_caption_falls_back_to_name() {
        let meta = sample();
        assert_eq!(meta.parameters.len(), 2);
        assert_eq!(meta.parameters[0].caption, "Start Date");
        assert_eq!(meta.parameters[0].datatype, "date");
        assert_eq!(meta.parameters[0].value, "#2025-01-01#");
        assert_eq!(meta.parameters[1].caption, "Region Filter");
    }

    #[test]
    fn filters_without_column_or_field_are_dropped() {
        let meta = sample();
        assert_eq!(meta.filters.len(), 2);
        assert_eq!(meta.filters[0].column, "[Region]");
        assert_eq!(meta.filters[0].class, "categorical");
        // `field` stands in when `column` is absent.
        assert_eq!(meta.filters[1].column, "[Order Date]");
    }

    #[test]
    fn join_reads_first_two_tables_and_clause_expression() {
        let meta = sample();
        assert_eq!(meta.joins.len(), 1);
        let join = &meta.joins[0];
        assert_eq!(join.join_type, "inner");
        assert_eq!(join.left_table, "[dbo].[Orders]");
        assert_eq!(join.right_table, "[dbo].[Customers]");
        assert_eq!(
            join.condition,
            "[Orders].[CustomerID] = [Customers].[CustomerID]"
        );
    }

    #[test]
    fn join_condition_falls_back_to_relation_expression() {
        let doc = Document::parse(
            r#"<workbook>
                 <relation type="join" join="left" expression="[a] = [b]">
                   <relation type="table" name="A"/>
                   <relation type="table" name="B"/>
                 </relation>
               </workbook>"#,
        )
        .unwrap();
        let meta = extract(&doc, "d", "d.twb");
        assert_eq!(meta.joins[0].join_type, "left");
        assert_eq!(meta.joins[0].left_table, "A");
        assert_eq!(meta.joins[0].condition, "[a] = [b]");
    }

    #[test]
    fn join_with_fewer_than_two_tables_degrades_to_empty() {
        let doc = Document::parse(
            r#"<workbook>
                 <relation type="join">
                   <relation type="table" name="Only"/>
                 </relation>
               </workbook>"#,
        )
        .unwrap();
        let meta = extract(&doc, "d", "d.twb");
        assert_eq!(meta.joins[0].left_table, "");
        assert_eq!(meta.joins[0].right_table, "");
    }

    #[test]
    fn empty_workbook_extracts_empty_collections() {
        let doc = Document::parse("<workbook/>").unwrap();
        let meta = extract(&doc, "empty", "empty.twb");
        assert!(meta.datasources.is_empty());
        assert!(meta.calculated_fields.is_empty());
        assert!(meta.parameters.is_empty());
        assert!(meta.filters.is_empty());
        assert!(meta.joins.is_empty());
        assert_eq!(meta.name, "empty");
        assert_eq!(meta.source_file, "empty.twb");
    }
}

//! Sort directives and client-side sorting
//!
//! A sort directive string encodes one direction token and one or more
//! column names, e.g. `ASC,ra` or `DESC,ra,dec`.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{cell_to_f64, cell_to_string, TableColumn, TableRow};

pub const SORT_ASC: &str = "ASC";
pub const SORT_DESC: &str = "DESC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
    #[default]
    Unsorted,
}

/// Parsed sort directive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortInfo {
    pub direction: SortDirection,
    pub sort_columns: Vec<String>,
}

impl SortInfo {
    pub fn new(direction: SortDirection, columns: &[&str]) -> Self {
        Self {
            direction,
            sort_columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Parse `<DIR>,col1[,col2...]`.  An empty string or an unknown
    /// direction token yields the unsorted directive.
    pub fn parse(sort_info_str: &str) -> SortInfo {
        let mut parts = sort_info_str.split(',').map(str::trim);
        let direction = match parts.next() {
            Some(d) if d.eq_ignore_ascii_case(SORT_ASC) => SortDirection::Asc,
            Some(d) if d.eq_ignore_ascii_case(SORT_DESC) => SortDirection::Desc,
            _ => return SortInfo::default(),
        };
        let sort_columns = parts.filter(|s| !s.is_empty()).map(String::from).collect();
        SortInfo {
            direction,
            sort_columns,
        }
    }
}

impl fmt::Display for SortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            SortDirection::Asc => SORT_ASC,
            SortDirection::Desc => SORT_DESC,
            SortDirection::Unsorted => return Ok(()),
        };
        write!(f, "{},{}", dir, self.sort_columns.join(","))
    }
}

/// Sort the row window by the given directive, returning it.
///
/// Unsorted directive, empty data or an unknown sort column is a no-op;
/// the input comes back unchanged.  Character-typed (or untyped) columns
/// compare lexicographically, everything else numerically with
/// non-parsable values ordered as equals.  Unloaded rows sort after
/// loaded ones; sorting is only meaningful on a fully-loaded table.
pub fn sort_table_data(
    mut data: Vec<Option<TableRow>>,
    columns: &[TableColumn],
    sort_info_str: &str,
) -> Vec<Option<TableRow>> {
    let sort_info = SortInfo::parse(sort_info_str);
    if sort_info.direction == SortDirection::Unsorted || data.is_empty() {
        return data;
    }
    let Some(col_name) = sort_info.sort_columns.first() else {
        return data;
    };
    let Some(col_idx) = columns.iter().position(|c| &c.name == col_name) else {
        return data;
    };
    let numeric = !columns[col_idx].is_char();

    let cell_cmp = |r1: &TableRow, r2: &TableRow| -> Ordering {
        let (v1, v2) = (&r1[col_idx], &r2[col_idx]);
        if numeric {
            cell_to_f64(v1)
                .partial_cmp(&cell_to_f64(v2))
                .unwrap_or(Ordering::Equal)
        } else {
            cell_to_string(v1).cmp(&cell_to_string(v2))
        }
    };

    data.sort_by(|a, b| {
        let ord = match (a, b) {
            (Some(r1), Some(r2)) => cell_cmp(r1, r2),
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
        };
        match sort_info.direction {
            SortDirection::Desc => ord.reverse(),
            _ => ord,
        }
    });
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> Vec<TableColumn> {
        vec![
            TableColumn::new("mag").with_type("double"),
            TableColumn::new("name").with_type("char"),
        ]
    }

    fn rows() -> Vec<Option<TableRow>> {
        vec![
            Some(vec![json!(3.2), json!("c")]),
            Some(vec![json!(1.5), json!("a")]),
            Some(vec![json!("2.75"), json!("b")]),
        ]
    }

    #[test]
    fn test_parse_and_display() {
        let si = SortInfo::parse("DESC,ra,dec");
        assert_eq!(si.direction, SortDirection::Desc);
        assert_eq!(si.sort_columns, ["ra", "dec"]);
        assert_eq!(si.to_string(), "DESC,ra,dec");
        assert_eq!(SortInfo::parse(""), SortInfo::default());
    }

    #[test]
    fn test_unsorted_is_noop() {
        let data = rows();
        let out = sort_table_data(data.clone(), &columns(), "");
        assert_eq!(out, data);
    }

    #[test]
    fn test_numeric_sort_coerces_strings() {
        let out = sort_table_data(rows(), &columns(), "ASC,mag");
        let mags: Vec<String> = out
            .iter()
            .flatten()
            .map(|r| cell_to_string(&r[0]))
            .collect();
        assert_eq!(mags, ["1.5", "2.75", "3.2"]);
    }

    #[test]
    fn test_descending_multiplier() {
        let out = sort_table_data(rows(), &columns(), "DESC,name");
        let names: Vec<String> = out
            .iter()
            .flatten()
            .map(|r| cell_to_string(&r[1]))
            .collect();
        assert_eq!(names, ["c", "b", "a"]);
    }

    #[test]
    fn test_unknown_column_is_noop() {
        let data = rows();
        let out = sort_table_data(data.clone(), &columns(), "ASC,nope");
        assert_eq!(out, data);
    }

    #[test]
    fn test_unloaded_rows_sort_last() {
        let mut data = rows();
        data.insert(1, None);
        let out = sort_table_data(data, &columns(), "ASC,mag");
        assert!(out[3].is_none());
        assert!(out[0].is_some());
    }
}

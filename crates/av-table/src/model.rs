//! Canonical in-memory table model
//!
//! A [`TableModel`] is one table instance across its paging/filter/sort
//! lifecycle: column metadata, a partially-loaded row window, selection and
//! paging state.  Rows are positionally aligned with the column list; cell
//! values are plain JSON scalars (strings/numbers).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::request::TableRequest;
use crate::select::SelectInfo;

/// A single cell value.  `Null` stands in for a missing value.
pub type CellValue = Value;

/// One table row, same arity as the column list.
pub type TableRow = Vec<CellValue>;

/// Sentinel page size for an effectively unpaged request.  Never zero, so
/// pagination math cannot divide by zero.
pub const MAX_ROW: usize = i32::MAX as usize;

/// Name of the synthetic column recording a row's pre-filter/sort index.
pub const ROWID: &str = "ROWID";

const CHAR_TYPES: [&str; 4] = ["char", "c", "s", "str"];
const NUM_TYPES: [&str; 8] = ["double", "d", "long", "l", "int", "i", "float", "f"];

/// Column visibility in the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Show,
    Hidden,
}

/// Column type selector used when listing columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    All,
    Number,
    Text,
}

/// Column metadata.  `name` is unique within a table's column list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub col_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_string: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filterable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pref_width: Option<usize>,
}

impl TableColumn {
    /// Create a visible, untyped column.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, col_type: &str) -> Self {
        self.col_type = Some(col_type.to_string());
        self
    }

    pub fn with_units(mut self, units: &str) -> Self {
        self.units = Some(units.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visibility = Visibility::Hidden;
        self
    }

    /// True when the column holds character data.  An absent type is
    /// treated as character data for comparison purposes.
    pub fn is_char(&self) -> bool {
        match &self.col_type {
            Some(t) => CHAR_TYPES.contains(&t.as_str()),
            None => true,
        }
    }

    /// True when the column holds numeric data.
    pub fn is_numeric(&self) -> bool {
        matches!(&self.col_type, Some(t) if NUM_TYPES.contains(&t.as_str()))
    }
}

/// Column list plus the row window.  A `None` entry is a row that has not
/// been loaded into the window yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub columns: Vec<TableColumn>,
    pub data: Vec<Option<TableRow>>,
}

/// One table instance.  `total_rows` always covers at least the loaded
/// window; `highlighted_row` is clamped by every consumer, never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableModel {
    pub tbl_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<TableRequest>,
    #[serde(default)]
    pub total_rows: usize,
    #[serde(default)]
    pub highlighted_row: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_info: Option<SelectInfo>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub table_meta: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_data: Option<TableData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub is_fetching: bool,
}

impl TableModel {
    /// Create a fully-loaded table from columns and rows.
    pub fn with_data(tbl_id: &str, columns: Vec<TableColumn>, rows: Vec<TableRow>) -> Self {
        let total_rows = rows.len();
        Self {
            tbl_id: tbl_id.to_string(),
            total_rows,
            table_data: Some(TableData {
                columns,
                data: rows.into_iter().map(Some).collect(),
            }),
            ..Default::default()
        }
    }

    pub fn columns(&self) -> &[TableColumn] {
        self.table_data
            .as_ref()
            .map(|d| d.columns.as_slice())
            .unwrap_or_default()
    }

    /// Index of the column with the given name, if any.
    pub fn column_idx(&self, col_name: &str) -> Option<usize> {
        self.columns().iter().position(|c| c.name == col_name)
    }

    pub fn column(&self, col_name: &str) -> Option<&TableColumn> {
        self.column_idx(col_name).and_then(|i| self.columns().get(i))
    }

    /// The non-hidden columns matching the given type class.
    pub fn visible_columns(&self, col_type: ColumnType) -> Vec<&TableColumn> {
        self.columns()
            .iter()
            .filter(|c| c.visibility != Visibility::Hidden)
            .filter(|c| match col_type {
                ColumnType::All => true,
                ColumnType::Number => c.is_numeric(),
                ColumnType::Text => c.is_char(),
            })
            .collect()
    }

    /// Cell value at (row, column name).  The virtual `ROWID` column
    /// resolves to the row index when no real column carries that name.
    pub fn cell_value(&self, row_idx: usize, col_name: &str) -> Option<CellValue> {
        match self.column_idx(col_name) {
            Some(col_idx) => self
                .row_values(row_idx)
                .and_then(|row| row.get(col_idx).cloned()),
            None if col_name == ROWID => Some(Value::from(row_idx)),
            None => None,
        }
    }

    /// All loaded values of one column, in row order.
    pub fn column_values(&self, col_name: &str) -> Vec<CellValue> {
        let Some(col_idx) = self.column_idx(col_name) else {
            return Vec::new();
        };
        self.table_data
            .as_ref()
            .map(|d| {
                d.data
                    .iter()
                    .flatten()
                    .map(|row| row.get(col_idx).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The loaded row at the given index, if present in the window.
    pub fn row_values(&self, row_idx: usize) -> Option<&TableRow> {
        self.table_data
            .as_ref()
            .and_then(|d| d.data.get(row_idx))
            .and_then(|r| r.as_ref())
    }

    /// One row as a column-name → value map.  Defaults to the highlighted
    /// row; an out-of-window index yields an empty map.
    pub fn row_as_map(&self, row_idx: Option<usize>) -> IndexMap<String, CellValue> {
        let idx = row_idx.unwrap_or(self.highlighted_row);
        let Some(row) = self.row_values(idx) else {
            return IndexMap::new();
        };
        self.columns()
            .iter()
            .zip(row.iter())
            .map(|(c, v)| (c.name.clone(), v.clone()))
            .collect()
    }

    /// Number of filter clauses on the current request.
    pub fn filter_count(&self) -> usize {
        self.request
            .as_ref()
            .and_then(|r| r.filters.as_deref())
            .map(|f| f.split(';').filter(|s| !s.trim().is_empty()).count())
            .unwrap_or(0)
    }

    /// `highlighted_row` clamped into `[0, total_rows - 1]`.
    pub fn clamped_highlighted_row(&self) -> usize {
        if self.total_rows == 0 {
            0
        } else {
            self.highlighted_row.min(self.total_rows - 1)
        }
    }
}

/// Render a cell value the way it appears in a text table.
pub fn cell_to_string(value: &CellValue) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric view of a cell value.  Non-numeric content becomes NaN, the
/// same coercion the text table formats rely on.
pub fn cell_to_f64(value: &CellValue) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

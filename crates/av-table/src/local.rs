//! Client-side request processing
//!
//! When a table is "local" (its full contents already in memory), paging,
//! filtering and sorting are simulated here instead of going back to the
//! server.  Operations that cannot be answered from the loaded window
//! return an explicit remote-fallback signal; the fallback fetch itself is
//! the caller's responsibility.

use serde_json::Value;
use tracing::debug;

use crate::filter::{filter_table, FilterInfo};
use crate::model::{TableColumn, TableModel, TableRow, Visibility, MAX_ROW, ROWID};
use crate::request::TableRequest;
use crate::sort::sort_table_data;
use crate::TableError;

/// Pagination facts derived from a table model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TblInfo {
    pub tbl_id: String,
    pub title: String,
    pub total_rows: usize,
    pub page_size: usize,
    pub current_page: usize,
    pub total_pages: usize,
    /// First and one-past-last row index of the current page.
    pub start_idx: usize,
    pub end_idx: usize,
    pub highlighted_row: usize,
    /// Highlighted row relative to the current page.
    pub hl_row_idx: usize,
}

/// Result of a selection export.
#[derive(Debug, Clone)]
pub enum SelectedData {
    /// All selected rows were loaded; projected locally.
    Local(TableModel),
    /// Some selected rows are outside the loaded window; the caller must
    /// run the server-side selected-values fetch.
    Remote {
        file_path: Option<String>,
        column_names: Vec<String>,
        selected_rows: Vec<usize>,
    },
}

/// Result of a first-matching-row search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindIndex {
    Found(usize),
    /// No match in a fully-loaded table.
    NotFound,
    /// No match in the loaded window of a partially-loaded table; the
    /// caller must search server-side.
    NeedsRemote,
}

/// Simulate server-side paging/filter/sort against a fully-loaded table.
///
/// When filters or sort are requested, a hidden `ROWID` column recording
/// each row's original index is appended first, so downstream consumers
/// can map back.  Column projection (`incl_cols`) narrows columns and
/// cells only; it never affects which rows survive.  The result's window
/// holds `[start_idx, start_idx + page_size)`, and the highlighted row
/// defaults to `start_idx`.
pub fn process_request(
    orig: &TableModel,
    request: &TableRequest,
    hl_row_idx: Option<usize>,
) -> Result<TableModel, TableError> {
    let mut table = orig.clone();
    if table.table_data.is_none() {
        return Err(TableError::NoData(table.tbl_id.clone()));
    }
    table.request = Some(request.clone());

    if request.filters.is_some() || request.sort_info.is_some() {
        if let Some(data) = table.table_data.as_mut() {
            data.columns.push(TableColumn {
                name: ROWID.to_string(),
                col_type: Some("int".to_string()),
                visibility: Visibility::Hidden,
                ..Default::default()
            });
            for (idx, row) in data.data.iter_mut().enumerate() {
                if let Some(r) = row {
                    r.push(Value::String(idx.to_string()));
                }
            }
        }
    }

    if let Some(filters) = request.filters.as_deref() {
        table = filter_table(&table, filters)?;
    }
    if let Some(sort_info) = request.sort_info.as_deref() {
        if let Some(data) = table.table_data.as_mut() {
            data.data = sort_table_data(std::mem::take(&mut data.data), &data.columns, sort_info);
        }
    }
    if let Some(incl_cols) = request.incl_cols.as_deref() {
        project_columns(&mut table, incl_cols);
    }

    // slice to the requested page, keeping absolute row indexing
    if let Some(data) = table.table_data.as_mut() {
        let page_size = match request.page_size {
            0 => MAX_ROW,
            n => n,
        };
        let start = request.start_idx.min(data.data.len());
        let end = start.saturating_add(page_size).min(data.data.len());
        let page: Vec<_> = data.data[start..end].to_vec();
        let mut window: Vec<Option<TableRow>> = vec![None; start];
        window.extend(page);
        data.data = window;
    }

    table.highlighted_row = hl_row_idx.unwrap_or(request.start_idx);
    Ok(table)
}

/// Keep only the named columns (plus the hidden `ROWID` bookkeeping
/// column), dropping the other cells of every row.  Row selection and
/// order are untouched.
fn project_columns(table: &mut TableModel, incl_cols: &str) {
    let Some(data) = table.table_data.as_mut() else {
        return;
    };
    let wanted: Vec<&str> = incl_cols.split(',').map(str::trim).collect();
    let keep: Vec<usize> = data
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| wanted.contains(&c.name.as_str()) || c.name == ROWID)
        .map(|(idx, _)| idx)
        .collect();

    let columns: Vec<TableColumn> = keep.iter().filter_map(|&i| data.columns.get(i).cloned()).collect();
    data.columns = columns;
    for row in data.data.iter_mut().flatten() {
        let cells: TableRow = keep.iter().filter_map(|&i| row.get(i).cloned()).collect();
        *row = cells;
    }
}

/// Derive pagination facts, with an optional page-size override.
pub fn get_tbl_info(table: &TableModel, a_page_size: Option<usize>) -> TblInfo {
    let request_page_size = table.request.as_ref().map(|r| r.page_size).unwrap_or(0);
    // page size is never zero, so the math below cannot divide by zero
    let page_size = match a_page_size.unwrap_or(request_page_size) {
        0 => MAX_ROW,
        n => n,
    };
    let total_rows = table.total_rows;
    let highlighted_row = table.clamped_highlighted_row();
    let current_page = highlighted_row / page_size + 1;
    let hl_row_idx = highlighted_row % page_size;
    let start_idx = (current_page - 1) * page_size;
    let end_idx = match start_idx.saturating_add(page_size).min(total_rows) {
        0 => table
            .table_data
            .as_ref()
            .map(|d| d.data.len())
            .unwrap_or(start_idx),
        n => n,
    };
    let total_pages = total_rows.div_ceil(page_size);

    TblInfo {
        tbl_id: table.tbl_id.clone(),
        title: table.table_meta.get("title").cloned().unwrap_or_default(),
        total_rows,
        page_size,
        current_page,
        total_pages,
        start_idx,
        end_idx,
        highlighted_row,
        hl_row_idx,
    }
}

/// True only if every row in `[start_idx, end_idx)` (clamped to
/// `total_rows`) is present in the loaded window.
pub fn is_tbl_data_avail(start_idx: usize, end_idx: usize, table: &TableModel) -> bool {
    let end_idx = end_idx.min(table.total_rows);
    if end_idx <= start_idx {
        return false;
    }
    let Some(data) = table.table_data.as_ref() else {
        return false;
    };
    if end_idx > data.data.len() {
        return false;
    }
    data.data[start_idx..end_idx].iter().all(|r| r.is_some())
}

/// Project the selected rows of a table.
///
/// The fast path runs when every selected row is in the loaded window:
/// rows come back in ascending index order, columns in the caller's
/// requested order (all non-hidden columns if none are named).  Otherwise
/// an explicit [`SelectedData::Remote`] signal is returned for the caller
/// to resolve out of process.
pub fn get_selected_data(table: &TableModel, column_names: &[String]) -> SelectedData {
    let selected_rows = table
        .select_info
        .as_ref()
        .map(|s| s.selected())
        .unwrap_or_default();
    let column_names: Vec<String> = if column_names.is_empty() {
        table
            .columns()
            .iter()
            .filter(|c| c.visibility != Visibility::Hidden)
            .map(|c| c.name.clone())
            .collect()
    } else {
        column_names.to_vec()
    };

    let all_loaded = selected_rows
        .iter()
        .all(|&idx| table.row_values(idx).is_some());
    if !all_loaded {
        debug!(
            tbl_id = %table.tbl_id,
            "selected rows outside loaded window; deferring to remote fetch"
        );
        return SelectedData::Remote {
            file_path: table.table_meta.get("tblFilePath").cloned(),
            column_names,
            selected_rows,
        };
    }

    let columns: Vec<TableColumn> = column_names
        .iter()
        .filter_map(|name| table.column(name).cloned())
        .collect();
    let rows: Vec<TableRow> = selected_rows
        .iter()
        .map(|&idx| {
            column_names
                .iter()
                .map(|name| table.cell_value(idx, name).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    let mut out = TableModel::with_data(&table.tbl_id, columns, rows);
    out.table_meta = table.table_meta.clone();
    SelectedData::Local(out)
}

/// Index of the first row matching the filter string, searching the
/// loaded window.  A miss on a partially-loaded table is a remote-search
/// signal, not a definitive answer.
pub fn find_index(table: &TableModel, filter_info_str: &str) -> Result<FindIndex, TableError> {
    let Some(data) = table.table_data.as_ref() else {
        return Ok(FindIndex::NeedsRemote);
    };
    let predicates = FilterInfo::parse(filter_info_str)?.compile(&data.columns);
    let found = data.data.iter().enumerate().find(|(idx, row)| match row {
        Some(r) => predicates.iter().all(|p| p.matches(r, *idx)),
        None => false,
    });
    match found {
        Some((idx, _)) => Ok(FindIndex::Found(idx)),
        None if is_tbl_data_avail(0, table.total_rows, table) => Ok(FindIndex::NotFound),
        None => Ok(FindIndex::NeedsRemote),
    }
}

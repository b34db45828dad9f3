//! Fetch collaborator seam
//!
//! The engine never performs I/O.  Loading rows, exporting selections of
//! partially-loaded tables and server-side row searches are delegated to a
//! [`TableFetcher`] implemented by the host application.

use crate::model::TableModel;
use crate::request::TableRequest;

/// Meta key reporting a table's load status.
pub const LOADING_STATUS: &str = "Loading-Status";

/// The `Loading-Status` value of a fully-loaded table.
pub const STATUS_COMPLETED: &str = "COMPLETED";

/// Out-of-process table access.
///
/// Implementations return a [`TableModel`] snapshot with the window
/// `[start_idx, start_idx + page_size)` populated and `total_rows` set.
/// On failure they set `table_meta["Loading-Status"]` to a non-completed
/// value plus an `error` field rather than panicking.
#[async_trait::async_trait]
pub trait TableFetcher: Send + Sync {
    /// Run the request, returning a snapshot for the requested window.
    async fn fetch(&self, request: &TableRequest, hl_row_idx: Option<usize>) -> anyhow::Result<TableModel>;

    /// Project selected rows of a server-side table file.
    async fn selected_values(
        &self,
        file_path: &str,
        column_names: &[String],
        selected_rows: &[usize],
    ) -> anyhow::Result<TableModel>;

    /// Find the first row matching a filter string, server-side.
    async fn find_table_index(
        &self,
        request: &TableRequest,
        filter_info: &str,
    ) -> anyhow::Result<Option<usize>>;
}

/// True if the given table is fully loaded: not fetching, and its
/// `Loading-Status` meta (defaulting to completed) reports completion.
pub fn is_table_loaded(table: &TableModel) -> bool {
    let status = table
        .table_meta
        .get(LOADING_STATUS)
        .map(String::as_str)
        .unwrap_or(STATUS_COMPLETED);
    !table.is_fetching && status == STATUS_COMPLETED
}

/// An error placeholder table: completed, carrying only the error text.
pub fn create_error_tbl(tbl_id: &str, error: &str) -> TableModel {
    let mut table = TableModel {
        tbl_id: tbl_id.to_string(),
        error: Some(error.to_string()),
        ..Default::default()
    };
    table
        .table_meta
        .insert(LOADING_STATUS.to_string(), STATUS_COMPLETED.to_string());
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loaded_defaults_to_completed() {
        let table = TableModel::default();
        assert!(is_table_loaded(&table));
    }

    #[test]
    fn test_fetching_table_is_not_loaded() {
        let mut table = TableModel::default();
        table.is_fetching = true;
        assert!(!is_table_loaded(&table));
    }

    #[test]
    fn test_incomplete_status_is_not_loaded() {
        let mut table = TableModel::default();
        table
            .table_meta
            .insert(LOADING_STATUS.to_string(), "LOADING".to_string());
        assert!(!is_table_loaded(&table));
    }

    #[test]
    fn test_error_tbl_is_loaded_with_error() {
        let table = create_error_tbl("t-err", "query failed");
        assert!(is_table_loaded(&table));
        assert_eq!(table.error.as_deref(), Some("query failed"));
    }
}

//! Table data engine for the astronomical visualization platform
//!
//! This crate owns the canonical in-memory representation of a paged,
//! filtered and sorted table, and the pure query/mutation API the UI layer
//! drives it with.  Everything here is synchronous computation over explicit
//! inputs; fetching rows from a server lives behind the [`TableFetcher`]
//! collaborator trait and is never awaited inside the engine.

pub mod fetch;
pub mod filter;
pub mod ipac;
pub mod local;
pub mod merge;
pub mod model;
pub mod request;
pub mod select;
pub mod sort;

use thiserror::Error;

// Re-exports
pub use fetch::{create_error_tbl, is_table_loaded, TableFetcher, LOADING_STATUS, STATUS_COMPLETED};
pub use filter::{filter_table, CmpOp, FilterClause, FilterInfo};
pub use ipac::{calc_column_widths, ipac_to_table, table_to_ipac, table_text_view};
pub use local::{
    find_index, get_selected_data, get_tbl_info, is_tbl_data_avail, process_request, FindIndex,
    SelectedData, TblInfo,
};
pub use merge::smart_merge;
pub use model::{
    CellValue, ColumnType, TableColumn, TableData, TableModel, TableRow, Visibility, MAX_ROW, ROWID,
};
pub use request::{clone_request, IdGenerator, SearchParams, TableRequest};
pub use select::SelectInfo;
pub use sort::{sort_table_data, SortDirection, SortInfo};

/// Errors that can occur in table operations
#[derive(Error, Debug)]
pub enum TableError {
    #[error("invalid filter '{clause}': {reason}")]
    FilterSyntax { clause: String, reason: String },

    #[error("table '{0}' has no data")]
    NoData(String),

    #[error("malformed IPAC table: {0}")]
    IpacFormat(String),
}

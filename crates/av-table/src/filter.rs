//! Filter expressions and client-side filtering
//!
//! A filter string is a semicolon-separated list of column-scoped clauses,
//! e.g. `ra > 10.5; name like 'ngc'; flags in (1,2)`.  Each clause is
//! parsed into an explicit [`FilterClause`] AST, compiled once against the
//! table's column layout, and evaluated per row.  All clauses are applied
//! conjunctively: a row survives only if every clause matches.

use std::cmp::Ordering;
use std::fmt;

use tracing::warn;

use crate::model::{cell_to_f64, cell_to_string, CellValue, TableColumn, TableData, TableModel, ROWID};
use crate::TableError;

/// Comparison operators accepted in a filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    In,
}

impl CmpOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Like => "like",
            CmpOp::In => "in",
        }
    }
}

/// One parsed filter clause: `<column> <op> <value>`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub column: String,
    pub op: CmpOp,
    pub value: String,
    /// Parsed members of an `in (...)` list; empty for other operators.
    pub in_list: Vec<String>,
}

impl FilterClause {
    /// Parse a single clause.  A clause that cannot be parsed raises
    /// [`TableError::FilterSyntax`]; it never silently matches everything
    /// or nothing.
    pub fn parse(clause: &str) -> Result<FilterClause, TableError> {
        let clause = clause.trim();
        let err = |reason: &str| TableError::FilterSyntax {
            clause: clause.to_string(),
            reason: reason.to_string(),
        };

        let (column, op, value) = split_on_op(clause).ok_or_else(|| err("no comparison operator"))?;
        let column = column.trim();
        let value = value.trim();
        if column.is_empty() {
            return Err(err("missing column name"));
        }
        if value.is_empty() {
            return Err(err("missing comparison value"));
        }

        let mut in_list = Vec::new();
        if op == CmpOp::In {
            let inner = value
                .strip_prefix('(')
                .and_then(|v| v.strip_suffix(')'))
                .ok_or_else(|| err("'in' requires a parenthesized list"))?;
            in_list = inner.split(',').map(|s| unquote(s.trim()).to_string()).collect();
            if in_list.iter().all(|s| s.is_empty()) {
                return Err(err("'in' list is empty"));
            }
        }

        Ok(FilterClause {
            column: column.to_string(),
            op,
            value: unquote(value).to_string(),
            in_list,
        })
    }

    /// Bind this clause to a column layout.  An unknown column contributes
    /// no constraint; the virtual `ROWID` column matches the row index.
    pub fn compile(&self, columns: &[TableColumn]) -> RowPredicate {
        let col = match columns.iter().position(|c| c.name == self.column) {
            Some(idx) => Some(ColSource::Cell(idx)),
            None if self.column == ROWID => Some(ColSource::RowIdx),
            None => {
                warn!(column = %self.column, "filter column not found; clause ignored");
                None
            }
        };
        RowPredicate {
            col,
            op: self.op,
            value: self.value.clone(),
            like_value: self.value.trim_matches('%').to_lowercase(),
            in_list: self.in_list.clone(),
        }
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.op == CmpOp::In {
            write!(f, "{} in ({})", self.column, self.in_list.join(","))
        } else {
            write!(f, "{} {} {}", self.column, self.op.as_str(), self.value)
        }
    }
}

/// An ordered list of filter clauses, AND-ed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterInfo {
    pub clauses: Vec<FilterClause>,
}

impl FilterInfo {
    /// Parse a semicolon-separated filter string.  Empty clauses are
    /// skipped; a malformed clause is an error.
    pub fn parse(filter_info_str: &str) -> Result<FilterInfo, TableError> {
        let clauses = filter_info_str
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(FilterClause::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FilterInfo { clauses })
    }

    /// Add a clause unless an identical one is already present.
    pub fn add_filter(&mut self, clause: FilterClause) {
        if !self.clauses.contains(&clause) {
            self.clauses.push(clause);
        }
    }

    /// Remove every clause on the given column.
    pub fn remove_filter(&mut self, column: &str) {
        self.clauses.retain(|c| c.column != column);
    }

    /// Serialize back to the semicolon-separated string form.
    pub fn serialize(&self) -> String {
        self.clauses
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Compile every clause against a column layout.
    pub fn compile(&self, columns: &[TableColumn]) -> Vec<RowPredicate> {
        self.clauses.iter().map(|c| c.compile(columns)).collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum ColSource {
    Cell(usize),
    RowIdx,
}

/// A clause bound to a concrete column index, ready for per-row
/// evaluation.
#[derive(Debug, Clone)]
pub struct RowPredicate {
    col: Option<ColSource>,
    op: CmpOp,
    value: String,
    like_value: String,
    in_list: Vec<String>,
}

impl RowPredicate {
    pub fn matches(&self, row: &[CellValue], row_idx: usize) -> bool {
        let Some(col) = self.col else {
            return true; // unknown column: no constraint
        };
        let rowid_cell;
        let cell = match col {
            ColSource::Cell(idx) => match row.get(idx) {
                Some(v) => v,
                None => return false,
            },
            ColSource::RowIdx => {
                rowid_cell = CellValue::from(row_idx);
                &rowid_cell
            }
        };
        match self.op {
            CmpOp::Eq => eq_values(cell, &self.value),
            CmpOp::Ne => !eq_values(cell, &self.value),
            CmpOp::Gt => matches!(compare_values(cell, &self.value), Some(Ordering::Greater)),
            CmpOp::Ge => matches!(
                compare_values(cell, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            CmpOp::Lt => matches!(compare_values(cell, &self.value), Some(Ordering::Less)),
            CmpOp::Le => matches!(
                compare_values(cell, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            CmpOp::Like => cell_to_string(cell).to_lowercase().contains(&self.like_value),
            CmpOp::In => self.in_list.iter().any(|v| eq_values(cell, v)),
        }
    }
}

/// Filter the given table, returning a new model with the surviving rows
/// in their original relative order and `total_rows` updated.
///
/// An empty filter string or a table without data is a no-op clone.
pub fn filter_table(table: &TableModel, filter_info_str: &str) -> Result<TableModel, TableError> {
    let mut filtered = table.clone();
    if filter_info_str.trim().is_empty() {
        return Ok(filtered);
    }
    let Some(table_data) = &table.table_data else {
        return Ok(filtered);
    };
    let predicates = FilterInfo::parse(filter_info_str)?.compile(&table_data.columns);

    let data: Vec<_> = table_data
        .data
        .iter()
        .enumerate()
        .filter(|(idx, row)| match row {
            Some(r) => predicates.iter().all(|p| p.matches(r, *idx)),
            None => false, // unloaded rows cannot match
        })
        .map(|(_, row)| row.clone())
        .collect();

    filtered.total_rows = data.len();
    filtered.table_data = Some(TableData {
        columns: table_data.columns.clone(),
        data,
    });
    Ok(filtered)
}

fn split_on_op(clause: &str) -> Option<(&str, CmpOp, &str)> {
    const SYMBOL_OPS: [(&str, CmpOp); 6] = [
        (">=", CmpOp::Ge),
        ("<=", CmpOp::Le),
        ("!=", CmpOp::Ne),
        (">", CmpOp::Gt),
        ("<", CmpOp::Lt),
        ("=", CmpOp::Eq),
    ];
    for (pos, _) in clause.char_indices() {
        let rest = &clause[pos..];
        for (token, op) in SYMBOL_OPS {
            if rest.starts_with(token) {
                return Some((&clause[..pos], op, &clause[pos + token.len()..]));
            }
        }
    }
    for (token, op) in [(" like ", CmpOp::Like), (" in ", CmpOp::In)] {
        if let Some(pos) = clause.to_ascii_lowercase().find(token) {
            return Some((&clause[..pos], op, &clause[pos + token.len()..]));
        }
    }
    None
}

fn unquote(value: &str) -> &str {
    let v = value.trim();
    for quote in ['\'', '"'] {
        if v.len() >= 2 && v.starts_with(quote) && v.ends_with(quote) {
            return &v[1..v.len() - 1];
        }
    }
    v
}

fn eq_values(cell: &CellValue, rhs: &str) -> bool {
    if let Ok(r) = rhs.trim().parse::<f64>() {
        let c = cell_to_f64(cell);
        if !c.is_nan() {
            return c == r;
        }
    }
    cell_to_string(cell) == rhs
}

fn compare_values(cell: &CellValue, rhs: &str) -> Option<Ordering> {
    if let Ok(r) = rhs.trim().parse::<f64>() {
        let c = cell_to_f64(cell);
        if !c.is_nan() {
            return c.partial_cmp(&r);
        }
    }
    Some(cell_to_string(cell).as_str().cmp(rhs))
}

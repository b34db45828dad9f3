//! IPAC table text format
//!
//! The fixed-width, pipe-and-backslash plain-text tabular serialization
//! used by this ecosystem: `\key = value` metadata lines, optional
//! `\col.<name>.<Attr>` column directives, a pipe-delimited fixed-width
//! header block (name/type/[units]/[null string] rows), then one
//! space-padded data line per row bounded by a single leading and trailing
//! space.

use ahash::AHashMap;
use indexmap::IndexMap;
use serde_json::Value;

use crate::model::{cell_to_string, TableColumn, TableModel, TableRow, Visibility, ROWID};
use crate::TableError;

/// Width of the synthetic `ROWID` column, used as a floor even when its
/// values are narrower.
const ROWID_WIDTH: usize = 8;

/// Display width of each column: the longest of header label, units, type
/// and every loaded cell in that column.
pub fn calc_column_widths(columns: &[TableColumn], data: &[Option<TableRow>]) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let label = col.label.as_deref().unwrap_or(&col.name);
            let mut width = label
                .len()
                .max(col.units.as_deref().map(str::len).unwrap_or(0))
                .max(col.col_type.as_deref().map(str::len).unwrap_or(0));
            if col.name == ROWID {
                width = width.max(ROWID_WIDTH);
            }
            for row in data.iter().flatten() {
                if let Some(cell) = row.get(idx) {
                    width = width.max(cell_to_string(cell).len());
                }
            }
            width
        })
        .collect()
}

fn pad(value: &str, width: usize) -> String {
    format!("{value:<width$}")
}

fn header_line(columns: &[TableColumn], widths: &[usize], field: impl Fn(&TableColumn) -> String) -> String {
    let cells: Vec<String> = columns
        .iter()
        .zip(widths)
        .map(|(c, w)| pad(&field(c), *w))
        .collect();
    format!("|{}|", cells.join("|"))
}

/// Serialize a table into IPAC format.
pub fn table_to_ipac(table: &TableModel) -> String {
    let (columns, data): (&[TableColumn], &[Option<TableRow>]) = match &table.table_data {
        Some(d) => (&d.columns, &d.data),
        None => (&[], &[]),
    };
    let widths = calc_column_widths(columns, data);

    let mut lines: Vec<String> = table
        .table_meta
        .iter()
        .map(|(k, v)| format!("\\{k} = {v}"))
        .collect();
    for c in columns.iter().filter(|c| c.visibility == Visibility::Hidden) {
        lines.push(format!("\\col.{}.Visibility = hidden", c.name));
    }
    for c in columns.iter().filter(|c| c.filterable == Some(true)) {
        lines.push(format!("\\col.{}.Filterable = true", c.name));
    }
    for c in columns.iter().filter(|c| c.sortable == Some(true)) {
        lines.push(format!("\\col.{}.Sortable = true", c.name));
    }
    for c in columns.iter().filter(|c| c.label.is_some()) {
        lines.push(format!("\\col.{}.Label = {}", c.name, c.label.as_deref().unwrap_or_default()));
    }
    for c in columns.iter().filter(|c| c.desc.is_some()) {
        lines.push(format!(
            "\\col.{}.ShortDescription = {}",
            c.name,
            c.desc.as_deref().unwrap_or_default()
        ));
    }
    lines.push("\\".to_string());

    lines.push(header_line(columns, &widths, |c| c.name.clone()));
    lines.push(header_line(columns, &widths, |c| {
        c.col_type.clone().unwrap_or_default()
    }));
    if columns.iter().any(|c| c.units.is_some()) {
        lines.push(header_line(columns, &widths, |c| {
            c.units.clone().unwrap_or_default()
        }));
    }
    if columns.iter().any(|c| c.null_string.is_some()) {
        lines.push(header_line(columns, &widths, |c| {
            c.null_string.clone().unwrap_or_default()
        }));
    }

    for row in data.iter().flatten() {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| pad(&cell_to_string(cell), *w))
            .collect();
        lines.push(format!(" {} ", cells.join(" ")));
    }

    lines.join("\n")
}

/// A plain-text preview of the visible columns only.
pub fn table_text_view(columns: &[TableColumn], data: &[Option<TableRow>], show_units: bool) -> String {
    let widths = calc_column_widths(columns, data);
    let visible: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.visibility != Visibility::Hidden)
        .map(|(idx, _)| idx)
        .collect();

    let head = |field: &dyn Fn(&TableColumn) -> String| -> String {
        let cells: Vec<String> = visible
            .iter()
            .map(|&i| pad(&field(&columns[i]), widths[i]))
            .collect();
        format!("|{}|", cells.join("|"))
    };

    let mut lines = vec![
        head(&|c: &TableColumn| c.name.clone()),
        head(&|c: &TableColumn| c.col_type.clone().unwrap_or_default()),
    ];
    if show_units {
        lines.push(head(&|c: &TableColumn| c.units.clone().unwrap_or_default()));
    }
    for row in data.iter().flatten() {
        let cells: Vec<String> = visible
            .iter()
            .map(|&i| pad(&cell_to_string(&row[i]), widths[i]))
            .collect();
        lines.push(format!(" {} ", cells.join(" ")));
    }
    lines.join("\n")
}

/// Parse IPAC text back into a table model.
///
/// Attribute lines fold into the table meta, `\col.*` directives back onto
/// their columns, and rows are sliced by the fixed widths taken from the
/// header segments.  Untyped columns get their type guessed from the first
/// non-empty value.
pub fn ipac_to_table(text: &str) -> Result<TableModel, TableError> {
    let mut meta: IndexMap<String, String> = IndexMap::new();
    let mut col_attrs: AHashMap<(String, String), String> = AHashMap::new();
    let mut columns: Vec<TableColumn> = Vec::new();
    let mut widths: Vec<usize> = Vec::new();
    let mut header_rows_seen = 0usize;
    let mut rows: Vec<TableRow> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(attr) = line.strip_prefix('\\') {
            parse_attribute(attr, &mut meta, &mut col_attrs);
        } else if line.starts_with('|') {
            let segments = parse_headings(line);
            match header_rows_seen {
                0 => {
                    for seg in &segments {
                        columns.push(TableColumn::new(seg.trim()));
                        widths.push(seg.len());
                    }
                }
                1 => {
                    for (col, seg) in columns.iter_mut().zip(&segments) {
                        let t = seg.trim();
                        if !t.is_empty() {
                            col.col_type = Some(t.to_string());
                        }
                    }
                }
                2 => {
                    for (col, seg) in columns.iter_mut().zip(&segments) {
                        let t = seg.trim();
                        if !t.is_empty() {
                            col.units = Some(t.to_string());
                        }
                    }
                }
                3 => {
                    for (col, seg) in columns.iter_mut().zip(&segments) {
                        let t = seg.trim();
                        if !t.is_empty() {
                            col.null_string = Some(t.to_string());
                        }
                    }
                }
                _ => {}
            }
            header_rows_seen += 1;
        } else if line.starts_with(' ') {
            if columns.is_empty() {
                return Err(TableError::IpacFormat("data row before header block".to_string()));
            }
            rows.push(parse_row(line, &widths));
        } else {
            return Err(TableError::IpacFormat(format!(
                "data row must start with a space: '{line}'"
            )));
        }
    }

    apply_col_attrs(&mut columns, &col_attrs);
    guess_column_types(&mut columns, &rows);

    let tbl_id = meta.get("tbl_id").cloned().unwrap_or_default();
    let mut table = TableModel::with_data(&tbl_id, columns, rows);
    table.table_meta = meta;
    Ok(table)
}

/// `[type] key = value`; the first `=` separates key from value, any
/// later ones belong to the value.  A line with no `=` (the `\` separator)
/// parses to nothing.
fn parse_attribute(
    attr: &str,
    meta: &mut IndexMap<String, String>,
    col_attrs: &mut AHashMap<(String, String), String>,
) {
    let Some((key_part, value)) = attr.split_once('=') else {
        return;
    };
    let key_part = key_part.trim();
    let value = value.trim();
    // a leading word before the key is a type hint; the key is the last word
    let key = key_part.split_whitespace().last().unwrap_or_default();
    if key.is_empty() {
        return;
    }
    if let Some(rest) = key.strip_prefix("col.") {
        if let Some((name, attr_name)) = rest.rsplit_once('.') {
            col_attrs.insert((name.to_string(), attr_name.to_string()), value.to_string());
            return;
        }
    }
    meta.insert(key.to_string(), value.to_string());
}

fn apply_col_attrs(columns: &mut [TableColumn], col_attrs: &AHashMap<(String, String), String>) {
    for col in columns.iter_mut() {
        let get = |attr: &str| col_attrs.get(&(col.name.clone(), attr.to_string()));
        if let Some(v) = get("Visibility") {
            if v == "hidden" {
                col.visibility = Visibility::Hidden;
            }
        }
        if let Some(v) = get("Filterable") {
            col.filterable = Some(v == "true");
        }
        if let Some(v) = get("Sortable") {
            col.sortable = Some(v == "true");
        }
        if let Some(v) = get("Label") {
            col.label = Some(v.clone());
        }
        if let Some(v) = get("ShortDescription") {
            col.desc = Some(v.clone());
        }
    }
}

/// Segments of a `|`-delimited header line, without the trailing empty
/// segment produced by the closing pipe.
fn parse_headings(line: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = line[1..].split('|').collect();
    if segments.last() == Some(&"") {
        segments.pop();
    }
    segments
}

/// Slice one fixed-width data row.  A short line yields empty trailing
/// cells rather than an error.
fn parse_row(line: &str, widths: &[usize]) -> TableRow {
    let chars: Vec<char> = line.chars().collect();
    let mut offset = 0usize;
    widths
        .iter()
        .map(|w| {
            let end = (offset + w + 1).min(chars.len());
            let start = offset.min(chars.len());
            let cell: String = chars[start..end].iter().collect();
            offset = end;
            Value::String(cell.trim().to_string())
        })
        .collect()
}

/// Guess a type for untyped columns from the first non-empty value:
/// int → long → double → char.
fn guess_column_types(columns: &mut [TableColumn], rows: &[TableRow]) {
    for (idx, col) in columns.iter_mut().enumerate() {
        if col.col_type.is_some() {
            continue;
        }
        let sample = rows.iter().find_map(|row| {
            let s = cell_to_string(row.get(idx).unwrap_or(&Value::Null));
            (!s.is_empty()).then_some(s)
        });
        let Some(sample) = sample else {
            continue;
        };
        col.col_type = Some(
            if sample.parse::<i32>().is_ok() {
                "int"
            } else if sample.parse::<i64>().is_ok() {
                "long"
            } else if sample.parse::<f64>().is_ok() {
                "double"
            } else {
                "char"
            }
            .to_string(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_table() -> TableModel {
        let mut table = TableModel::with_data(
            "t1",
            vec![
                TableColumn::new("ra").with_type("double").with_units("deg"),
                TableColumn::new("name").with_type("char").with_label("Designation"),
                TableColumn::new("flags").with_type("int").hidden(),
            ],
            vec![
                vec![json!("10.5"), json!("NGC-1"), json!("1")],
                vec![json!("202.25"), json!("m31"), json!("2")],
            ],
        );
        table.table_meta.insert("title".to_string(), "test table".to_string());
        table
    }

    #[test]
    fn test_column_widths() {
        let t = sample_table();
        let d = t.table_data.as_ref().unwrap();
        let widths = calc_column_widths(&d.columns, &d.data);
        // "202.25" wins for ra, label "Designation" wins for name
        assert_eq!(widths, vec![6, 11, 5]);
    }

    #[test]
    fn test_rowid_width_floor() {
        let widths = calc_column_widths(
            &[TableColumn::new(ROWID).with_type("int")],
            &[Some(vec![json!("3")])],
        );
        assert_eq!(widths, vec![8]);
    }

    #[test]
    fn test_encode_layout() {
        let out = table_to_ipac(&sample_table());
        let lines: Vec<&str> = out.lines().collect();
        let head = |cells: [&str; 3]| {
            format!("|{:<6}|{:<11}|{:<5}|", cells[0], cells[1], cells[2])
        };
        let row = |cells: [&str; 3]| {
            format!(" {:<6} {:<11} {:<5} ", cells[0], cells[1], cells[2])
        };
        assert_eq!(lines[0], "\\title = test table");
        assert_eq!(lines[1], "\\col.flags.Visibility = hidden");
        assert_eq!(lines[2], "\\col.name.Label = Designation");
        assert_eq!(lines[3], "\\");
        assert_eq!(lines[4], head(["ra", "name", "flags"]));
        assert_eq!(lines[5], head(["double", "char", "int"]));
        assert_eq!(lines[6], head(["deg", "", ""]));
        assert_eq!(lines[7], row(["10.5", "NGC-1", "1"]));
        assert_eq!(lines[8], row(["202.25", "m31", "2"]));
    }

    #[test]
    fn test_round_trip() {
        let table = sample_table();
        let encoded = table_to_ipac(&table);
        let decoded = ipac_to_table(&encoded).unwrap();

        assert_eq!(decoded.total_rows, 2);
        let cols = decoded.columns();
        assert_eq!(cols[0].name, "ra");
        assert_eq!(cols[0].col_type.as_deref(), Some("double"));
        assert_eq!(cols[0].units.as_deref(), Some("deg"));
        assert_eq!(cols[1].label.as_deref(), Some("Designation"));
        assert_eq!(cols[2].visibility, Visibility::Hidden);
        assert_eq!(decoded.table_meta.get("title"), Some(&"test table".to_string()));

        // values survive unchanged, so re-encoding reproduces the text
        assert_eq!(decoded.cell_value(1, "ra"), Some(json!("202.25")));
        assert_eq!(table_to_ipac(&decoded), encoded);
    }

    #[test]
    fn test_decode_guesses_types() {
        let text = "|id |mag |name|\n 1   2.5  abc  \n";
        let t = ipac_to_table(text).unwrap();
        let cols = t.columns();
        assert_eq!(cols[0].col_type.as_deref(), Some("int"));
        assert_eq!(cols[1].col_type.as_deref(), Some("double"));
        assert_eq!(cols[2].col_type.as_deref(), Some("char"));
    }

    #[test]
    fn test_decode_rejects_bad_data_row() {
        let text = "|a |\nbad row";
        assert!(matches!(
            ipac_to_table(text),
            Err(TableError::IpacFormat(_))
        ));
    }

    #[test]
    fn test_attribute_with_type_prefix() {
        let t = ipac_to_table("\\int NAXIS = 2\n|a |\n 1  \n").unwrap();
        assert_eq!(t.table_meta.get("NAXIS"), Some(&"2".to_string()));
    }

    #[test]
    fn test_text_view_hides_hidden_columns() {
        let t = sample_table();
        let d = t.table_data.as_ref().unwrap();
        let out = table_text_view(&d.columns, &d.data, true);
        assert!(!out.contains("flags"));
        assert!(out.contains("deg"));
    }
}

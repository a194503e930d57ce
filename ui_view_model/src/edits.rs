//! Cell edits keyed by view coordinate.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::axis::{AxisProjection, Side};
use crate::op::{CellValue, DiffOp, FormulaDiff, OpRef, OpValue, StringRef};
use crate::payload::DiffReport;

/// Column stride for packed cell keys; the widest sheet a spreadsheet allows.
pub const CELL_KEY_STRIDE: u32 = 16_384;

pub fn cell_key(row: u32, col: u32) -> u64 {
    u64::from(row) * u64::from(CELL_KEY_STRIDE) + u64::from(col)
}

pub fn split_key(key: u64) -> (u32, u32) {
    let stride = u64::from(CELL_KEY_STRIDE);
    ((key / stride) as u32, (key % stride) as u32)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRecord {
    pub from_value: String,
    pub to_value: String,
    pub from_formula: String,
    pub to_formula: String,
    pub formula_diff: FormulaDiff,
}

impl EditRecord {
    pub fn is_blank(&self) -> bool {
        self.from_value.is_empty()
            && self.to_value.is_empty()
            && self.from_formula.is_empty()
            && self.to_formula.is_empty()
    }

    pub fn from_text(&self) -> &str {
        first_non_empty(&self.from_value, &self.from_formula)
    }

    pub fn to_text(&self) -> &str {
        first_non_empty(&self.to_value, &self.to_formula)
    }
}

fn first_non_empty<'a>(a: &'a str, b: &'a str) -> &'a str {
    if a.is_empty() {
        b
    } else {
        a
    }
}

pub fn format_number(n: f64) -> String {
    n.to_string()
}

/// Display text for an op snapshot value.
pub fn format_value(report: &DiffReport, value: Option<&OpValue>) -> String {
    match value {
        None => String::new(),
        Some(OpValue::Typed(value)) => match value {
            CellValue::Blank => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(text) => report.resolve(text).to_string(),
            CellValue::Bool(b) => bool_text(*b).to_string(),
            CellValue::Error(err) => report.resolve(err).to_string(),
        },
        Some(OpValue::Raw(raw)) => match raw {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(text) if text == "Blank" => String::new(),
            serde_json::Value::String(text) => text.clone(),
            serde_json::Value::Bool(b) => bool_text(*b).to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            other => other.to_string(),
        },
    }
}

fn bool_text(b: bool) -> &'static str {
    if b {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Formula text with a single leading `=`, or empty.
pub fn format_formula(report: &DiffReport, formula: Option<&StringRef>) -> String {
    let Some(formula) = formula else {
        return String::new();
    };
    let text = report.resolve(formula);
    if text.is_empty() {
        String::new()
    } else if text.starts_with('=') {
        text.to_string()
    } else {
        format!("={text}")
    }
}

/// Placed cell edits for one sheet.
#[derive(Debug, Clone, Default)]
pub struct EditIndex {
    edits: FxHashMap<u64, EditRecord>,
    dropped: usize,
}

impl EditIndex {
    pub fn build(
        report: &DiffReport,
        ops: &[OpRef<'_>],
        rows: &AxisProjection,
        cols: &AxisProjection,
        ignore_blank_to_blank: bool,
    ) -> Self {
        let mut index = EditIndex::default();
        for op in ops {
            let Some(DiffOp::CellEdited {
                addr,
                from,
                to,
                formula_diff,
                ..
            }) = op.diff()
            else {
                continue;
            };
            let placed = addr.indices().and_then(|(row, col)| {
                let view_row = rows.place(Side::New, row)?;
                let view_col = cols.place(Side::New, col)?;
                (view_col < CELL_KEY_STRIDE).then_some((view_row, view_col))
            });
            let Some((view_row, view_col)) = placed else {
                index.dropped += 1;
                continue;
            };

            let record = EditRecord {
                from_value: format_value(report, from.value.as_ref()),
                to_value: format_value(report, to.value.as_ref()),
                from_formula: format_formula(report, from.formula.as_ref()),
                to_formula: format_formula(report, to.formula.as_ref()),
                formula_diff: *formula_diff,
            };
            if ignore_blank_to_blank && record.is_blank() {
                continue;
            }
            index.edits.insert(cell_key(view_row, view_col), record);
        }

        if index.dropped > 0 {
            log::warn!("{} cell edits could not be placed in the aligned view", index.dropped);
        }
        index
    }

    pub fn get(&self, view_row: u32, view_col: u32) -> Option<&EditRecord> {
        if view_col >= CELL_KEY_STRIDE {
            return None;
        }
        self.edits.get(&cell_key(view_row, view_col))
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Edits that had no view position.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Packed keys in ascending (row, col) order.
    pub fn sorted_keys(&self) -> Vec<u64> {
        let mut keys: Vec<u64> = self.edits.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Operation;
    use crate::payload::{AxisEntry, AxisKind};
    use serde_json::json;

    fn ops(values: Vec<serde_json::Value>) -> Vec<Operation> {
        values
            .into_iter()
            .map(|v| serde_json::from_value(v).expect("op"))
            .collect()
    }

    fn refs(ops: &[Operation]) -> Vec<OpRef<'_>> {
        ops.iter()
            .enumerate()
            .map(|(index, op)| OpRef { index, op })
            .collect()
    }

    fn identity(len: u32) -> AxisProjection {
        let entries: Vec<AxisEntry> = (0..len)
            .map(|i| AxisEntry {
                old: Some(i),
                new: Some(i),
                kind: AxisKind::Match,
                move_id: None,
            })
            .collect();
        AxisProjection::new(&entries, len, len)
    }

    #[test]
    fn formats_typed_values() {
        let report = DiffReport::new(vec!["hello".into(), "#DIV/0!".into()], Vec::new());
        let text = OpValue::Typed(CellValue::Text(StringRef::Id(0)));
        let err = OpValue::Typed(CellValue::Error(StringRef::Id(1)));
        assert_eq!(format_value(&report, Some(&text)), "hello");
        assert_eq!(format_value(&report, Some(&err)), "#DIV/0!");
        assert_eq!(
            format_value(&report, Some(&OpValue::Typed(CellValue::Number(3.0)))),
            "3"
        );
        assert_eq!(
            format_value(&report, Some(&OpValue::Typed(CellValue::Number(2.5)))),
            "2.5"
        );
        assert_eq!(
            format_value(&report, Some(&OpValue::Typed(CellValue::Bool(true)))),
            "TRUE"
        );
        assert_eq!(format_value(&report, None), "");
    }

    #[test]
    fn formula_gets_single_equals_prefix() {
        let report = DiffReport::new(vec!["SUM(A1:A2)".into(), "=A1".into(), String::new()], Vec::new());
        assert_eq!(format_formula(&report, Some(&StringRef::Id(0))), "=SUM(A1:A2)");
        assert_eq!(format_formula(&report, Some(&StringRef::Id(1))), "=A1");
        assert_eq!(format_formula(&report, Some(&StringRef::Id(2))), "");
        assert_eq!(format_formula(&report, None), "");
    }

    #[test]
    fn blank_edits_are_dropped_unless_requested() {
        let ops = ops(vec![json!({
            "kind": "CellEdited", "sheet": 0, "addr": "A1",
            "from": { "value": "Blank" }, "to": { "value": "Blank" }
        })]);
        let report = DiffReport::new(vec!["S".into()], Vec::new());
        let rows = identity(1);
        let cols = identity(1);
        assert!(EditIndex::build(&report, &refs(&ops), &rows, &cols, true).is_empty());
        assert_eq!(EditIndex::build(&report, &refs(&ops), &rows, &cols, false).len(), 1);
    }

    #[test]
    fn unmappable_edits_are_counted_as_dropped() {
        let ops = ops(vec![
            json!({ "kind": "CellEdited", "sheet": 0, "addr": "C9",
                    "from": { "value": { "Number": 1 } }, "to": { "value": { "Number": 2 } } }),
            json!({ "kind": "CellEdited", "sheet": 0, "addr": "A1",
                    "from": { "value": { "Number": 1 } }, "to": { "value": { "Number": 2 } } }),
        ]);
        let report = DiffReport::new(vec!["S".into()], Vec::new());
        let index = EditIndex::build(&report, &refs(&ops), &identity(2), &identity(2), true);
        assert_eq!(index.len(), 1);
        assert_eq!(index.dropped(), 1);
        let edit = index.get(0, 0).expect("edit at A1");
        assert_eq!(edit.from_text(), "1");
        assert_eq!(edit.to_text(), "2");
    }

    #[test]
    fn keys_sort_by_row_then_col() {
        assert!(cell_key(0, CELL_KEY_STRIDE - 1) < cell_key(1, 0));
        assert_eq!(split_key(cell_key(7, 42)), (7, 42));
    }
}

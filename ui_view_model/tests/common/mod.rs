//! Payload builders shared across integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use ui_view_model::{build_workbook_view_model, DiffPayload, SheetViewModel, ViewOptions, WorkbookViewModel};

pub fn entry(old: Option<u32>, new: Option<u32>, kind: &str) -> Value {
    json!({ "old": old, "new": new, "kind": kind })
}

pub fn moved_entry(old: Option<u32>, new: Option<u32>, kind: &str, move_id: &str) -> Value {
    json!({ "old": old, "new": new, "kind": kind, "move_id": move_id })
}

/// `len` matched entries mapping i -> i.
pub fn identity_axis(len: u32) -> Vec<Value> {
    (0..len).map(|i| entry(Some(i), Some(i), "match")).collect()
}

pub fn alignment(sheet: &str, rows: Vec<Value>, cols: Vec<Value>) -> Value {
    json!({ "sheet": sheet, "rows": rows, "cols": cols, "moves": [], "skipped": false })
}

pub fn cell(row: u32, col: u32, value: &str) -> Value {
    json!({ "row": row, "col": col, "value": value, "formula": null })
}

pub fn sheet(name: &str, nrows: u32, ncols: u32, cells: Vec<Value>) -> Value {
    json!({ "name": name, "nrows": nrows, "ncols": ncols, "cells": cells, "truncated": false })
}

pub fn number_edit(sheet_id: u32, row: u32, col: u32, from: f64, to: f64) -> Value {
    json!({
        "kind": "CellEdited",
        "sheet": sheet_id,
        "addr": { "row": row, "col": col },
        "from": { "value": { "Number": from }, "formula": null },
        "to": { "value": { "Number": to }, "formula": null },
        "formula_diff": "unchanged"
    })
}

pub fn blank_edit(sheet_id: u32, a1: &str) -> Value {
    json!({
        "kind": "CellEdited",
        "sheet": sheet_id,
        "addr": a1,
        "from": { "value": "Blank", "formula": null },
        "to": { "value": "Blank", "formula": null },
        "formula_diff": "unchanged"
    })
}

pub fn row_added(sheet_id: u32, row_idx: u32) -> Value {
    json!({ "kind": "RowAdded", "sheet": sheet_id, "row_idx": row_idx })
}

pub fn payload_json(
    strings: &[&str],
    ops: Vec<Value>,
    old_sheets: Vec<Value>,
    new_sheets: Vec<Value>,
    alignments: Vec<Value>,
) -> Value {
    json!({
        "report": { "version": "1", "strings": strings, "ops": ops, "complete": true, "warnings": [] },
        "sheets": { "old": { "sheets": old_sheets }, "new": { "sheets": new_sheets } },
        "alignments": alignments
    })
}

pub fn parse_payload(value: Value) -> DiffPayload {
    serde_json::from_value(value).unwrap_or_else(|e| panic!("payload fixture should parse: {e}"))
}

pub fn build<'a>(payload: &'a DiffPayload, options: &'a ViewOptions) -> WorkbookViewModel<'a> {
    build_workbook_view_model(payload, options)
}

pub fn only_sheet<'v, 'a>(vm: &'v WorkbookViewModel<'a>) -> &'v SheetViewModel<'a> {
    assert_eq!(vm.sheets.len(), 1, "expected exactly one sheet");
    &vm.sheets[0]
}

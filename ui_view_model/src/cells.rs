//! Per-cell view: which old/new cells sit at a view coordinate and how they differ.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::axis::{AxisProjection, Side};
use crate::edits::{cell_key, EditIndex, EditRecord, CELL_KEY_STRIDE};
use crate::payload::{AxisKind, SheetCell, SheetSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Empty,
    Unchanged,
    Edited,
    Added,
    Removed,
    Moved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveRole {
    Src,
    Dst,
}

/// One side's raw coordinate and snapshot cell, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellSide {
    pub row: u32,
    pub col: u32,
    pub cell: Option<SheetCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CellDisplay {
    pub text: String,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellViewModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_row: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_col: Option<u32>,
    pub old: Option<CellSide>,
    pub new: Option<CellSide>,
    pub diff_kind: DiffKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_role: Option<MoveRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit: Option<EditRecord>,
    pub display: CellDisplay,
}

impl CellViewModel {
    fn empty(view_row: Option<u32>, view_col: Option<u32>) -> Self {
        Self {
            view_row,
            view_col,
            old: None,
            new: None,
            diff_kind: DiffKind::Empty,
            move_id: None,
            move_role: None,
            edit: None,
            display: CellDisplay::default(),
        }
    }
}

/// Snapshot cells keyed by raw coordinate. Built on first cell access.
#[derive(Debug, Default)]
pub struct CellIndex<'a> {
    old: FxHashMap<u64, &'a SheetCell>,
    new: FxHashMap<u64, &'a SheetCell>,
}

fn index_cells(sheet: Option<&SheetSnapshot>) -> FxHashMap<u64, &SheetCell> {
    let mut map = FxHashMap::default();
    for cell in sheet.map(|s| s.cells.as_slice()).unwrap_or_default() {
        if cell.col < CELL_KEY_STRIDE {
            map.insert(cell_key(cell.row, cell.col), cell);
        }
    }
    map
}

impl<'a> CellIndex<'a> {
    pub fn new(old: Option<&'a SheetSnapshot>, new: Option<&'a SheetSnapshot>) -> Self {
        let index = Self {
            old: index_cells(old),
            new: index_cells(new),
        };
        log::debug!(
            "indexed {} old and {} new snapshot cells",
            index.old.len(),
            index.new.len()
        );
        index
    }

    pub fn get(&self, side: Side, row: u32, col: u32) -> Option<&'a SheetCell> {
        if col >= CELL_KEY_STRIDE {
            return None;
        }
        let map = match side {
            Side::Old => &self.old,
            Side::New => &self.new,
        };
        map.get(&cell_key(row, col)).copied()
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty())
}

fn display_text(cell: Option<&SheetCell>) -> String {
    cell.and_then(|c| non_empty(c.value.as_deref()).or(non_empty(c.formula.as_deref())))
        .unwrap_or_default()
        .to_string()
}

fn tooltip(label: &str, cell: Option<&SheetCell>) -> String {
    let Some(cell) = cell else {
        return String::new();
    };
    let value = cell.value.as_deref().unwrap_or_default();
    let formula = cell.formula.as_deref().unwrap_or_default();
    match (value.is_empty(), formula.is_empty()) {
        (true, true) => String::new(),
        (false, false) if value != formula => format!("{label}: {value} | {formula}"),
        (false, _) => format!("{label}: {value}"),
        (true, false) => format!("{label}: {formula}"),
    }
}

fn edit_display(edit: &EditRecord) -> CellDisplay {
    let from = edit.from_text();
    let to = edit.to_text();
    let text = if to.is_empty() { from } else { to };
    let tooltip = if from.is_empty() && to.is_empty() {
        String::new()
    } else {
        let show = |s: &str| if s.is_empty() { "(empty)".to_string() } else { s.to_string() };
        format!("Changed: {} -> {}", show(from), show(to))
    };
    CellDisplay {
        text: text.to_string(),
        tooltip,
    }
}

fn side(row: Option<u32>, col: Option<u32>, cell: Option<&SheetCell>) -> Option<CellSide> {
    Some(CellSide {
        row: row?,
        col: col?,
        cell: cell.cloned(),
    })
}

/// Cell view at a view coordinate.
pub fn cell_at(
    view_row: u32,
    view_col: u32,
    rows: &AxisProjection,
    cols: &AxisProjection,
    index: &CellIndex<'_>,
    edits: &EditIndex,
) -> CellViewModel {
    let (Some(row_entry), Some(col_entry)) = (rows.entry(view_row), cols.entry(view_col)) else {
        return CellViewModel::empty(Some(view_row), Some(view_col));
    };

    let lookup = |side: Side, row: Option<u32>, col: Option<u32>| match (row, col) {
        (Some(r), Some(c)) => index.get(side, r, c),
        _ => None,
    };
    let old_cell = lookup(Side::Old, row_entry.old, col_entry.old);
    let new_cell = lookup(Side::New, row_entry.new, col_entry.new);
    let edit = edits.get(view_row, view_col);

    let either = |kind: AxisKind| row_entry.kind == kind || col_entry.kind == kind;
    let move_role = if either(AxisKind::MoveSrc) {
        Some(MoveRole::Src)
    } else if either(AxisKind::MoveDst) {
        Some(MoveRole::Dst)
    } else {
        None
    };

    let diff_kind = if edit.is_some() {
        DiffKind::Edited
    } else if either(AxisKind::Insert) {
        DiffKind::Added
    } else if either(AxisKind::Delete) {
        DiffKind::Removed
    } else if move_role.is_some() {
        DiffKind::Moved
    } else if old_cell.is_some() || new_cell.is_some() {
        DiffKind::Unchanged
    } else {
        DiffKind::Empty
    };

    let display = match diff_kind {
        DiffKind::Edited => edit.map(edit_display).unwrap_or_default(),
        DiffKind::Added => CellDisplay {
            text: display_text(new_cell),
            tooltip: tooltip("Added", new_cell),
        },
        DiffKind::Removed => CellDisplay {
            text: display_text(old_cell),
            tooltip: tooltip("Removed", old_cell),
        },
        DiffKind::Moved => {
            let cell = if move_role == Some(MoveRole::Src) { old_cell } else { new_cell };
            CellDisplay {
                text: display_text(cell),
                tooltip: tooltip("Moved", cell),
            }
        }
        DiffKind::Unchanged => {
            let cell = new_cell.or(old_cell);
            CellDisplay {
                text: display_text(cell),
                tooltip: tooltip("Value", cell),
            }
        }
        DiffKind::Empty => CellDisplay::default(),
    };

    CellViewModel {
        view_row: Some(view_row),
        view_col: Some(view_col),
        old: side(row_entry.old, col_entry.old, old_cell),
        new: side(row_entry.new, col_entry.new, new_cell),
        diff_kind,
        move_id: row_entry.move_id.clone().or_else(|| col_entry.move_id.clone()),
        move_role,
        edit: edit.cloned(),
        display,
    }
}

/// Cell view at a raw coordinate on one side. Coordinates with a view position
/// resolve through [`cell_at`]; others yield a cell carrying only that side.
pub fn cell_at_raw(
    side_of: Side,
    row: u32,
    col: u32,
    rows: &AxisProjection,
    cols: &AxisProjection,
    index: &CellIndex<'_>,
    edits: &EditIndex,
) -> CellViewModel {
    if let (Some(view_row), Some(view_col)) = (rows.view_of(side_of, row), cols.view_of(side_of, col)) {
        return cell_at(view_row, view_col, rows, cols, index, edits);
    }

    let cell = index.get(side_of, row, col);
    // Without alignment, edits are keyed by raw new-side coordinates.
    let edit = (side_of == Side::New && rows.is_empty() && cols.is_empty())
        .then(|| edits.get(row, col))
        .flatten();

    let mut vm = CellViewModel::empty(None, None);
    let raw_side = Some(CellSide {
        row,
        col,
        cell: cell.cloned(),
    });
    match side_of {
        Side::Old => vm.old = raw_side,
        Side::New => vm.new = raw_side,
    }
    if let Some(edit) = edit {
        vm.diff_kind = DiffKind::Edited;
        vm.display = edit_display(edit);
        vm.edit = Some(edit.clone());
    } else if cell.is_some() {
        vm.diff_kind = DiffKind::Unchanged;
        vm.display = CellDisplay {
            text: display_text(cell),
            tooltip: tooltip("Value", cell),
        };
    }
    vm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::AxisEntry;

    fn cell(row: u32, col: u32, value: &str) -> SheetCell {
        SheetCell {
            row,
            col,
            value: Some(value.to_string()),
            formula: None,
        }
    }

    fn sheet(cells: Vec<SheetCell>, nrows: u32, ncols: u32) -> SheetSnapshot {
        SheetSnapshot {
            name: "S".to_string(),
            nrows,
            ncols,
            cells,
            ..SheetSnapshot::default()
        }
    }

    fn entry(old: Option<u32>, new: Option<u32>, kind: AxisKind, move_id: Option<&str>) -> AxisEntry {
        AxisEntry {
            old,
            new,
            kind,
            move_id: move_id.map(str::to_string),
        }
    }

    #[test]
    fn inserted_row_shows_new_cell() {
        let old = sheet(vec![cell(0, 0, "a")], 1, 1);
        let new = sheet(vec![cell(0, 0, "x"), cell(1, 0, "a")], 2, 1);
        let rows = AxisProjection::new(
            &[
                entry(None, Some(0), AxisKind::Insert, None),
                entry(Some(0), Some(1), AxisKind::Match, None),
            ],
            1,
            2,
        );
        let cols = AxisProjection::new(&[entry(Some(0), Some(0), AxisKind::Match, None)], 1, 1);
        let index = CellIndex::new(Some(&old), Some(&new));
        let edits = EditIndex::default();

        let added = cell_at(0, 0, &rows, &cols, &index, &edits);
        assert_eq!(added.diff_kind, DiffKind::Added);
        assert_eq!(added.display.text, "x");
        assert_eq!(added.display.tooltip, "Added: x");
        assert!(added.old.is_none());

        let matched = cell_at(1, 0, &rows, &cols, &index, &edits);
        assert_eq!(matched.diff_kind, DiffKind::Unchanged);
        assert_eq!(matched.old.as_ref().map(|s| s.row), Some(0));
        assert_eq!(matched.new.as_ref().map(|s| s.row), Some(1));
    }

    #[test]
    fn moved_rows_report_role_and_id() {
        let old = sheet(vec![cell(0, 0, "m")], 2, 1);
        let new = sheet(vec![cell(1, 0, "m")], 2, 1);
        let rows = AxisProjection::new(
            &[
                entry(Some(0), None, AxisKind::MoveSrc, Some("r:0+1->1")),
                entry(Some(1), Some(0), AxisKind::Match, None),
                entry(None, Some(1), AxisKind::MoveDst, Some("r:0+1->1")),
            ],
            2,
            2,
        );
        let cols = AxisProjection::new(&[entry(Some(0), Some(0), AxisKind::Match, None)], 1, 1);
        let index = CellIndex::new(Some(&old), Some(&new));
        let edits = EditIndex::default();

        let src = cell_at(0, 0, &rows, &cols, &index, &edits);
        assert_eq!(src.diff_kind, DiffKind::Moved);
        assert_eq!(src.move_role, Some(MoveRole::Src));
        assert_eq!(src.display.tooltip, "Moved: m");
        let dst = cell_at(2, 0, &rows, &cols, &index, &edits);
        assert_eq!(dst.move_role, Some(MoveRole::Dst));
        assert_eq!(dst.move_id, src.move_id);
    }

    #[test]
    fn outside_the_axes_is_empty() {
        let vm = cell_at(5, 5, &AxisProjection::default(), &AxisProjection::default(), &CellIndex::default(), &EditIndex::default());
        assert_eq!(vm.diff_kind, DiffKind::Empty);
        assert_eq!(vm.view_row, Some(5));
    }

    #[test]
    fn raw_lookup_without_alignment_reads_one_side() {
        let old = sheet(vec![cell(2, 1, "old")], 3, 2);
        let index = CellIndex::new(Some(&old), None);
        let vm = cell_at_raw(
            Side::Old,
            2,
            1,
            &AxisProjection::default(),
            &AxisProjection::default(),
            &index,
            &EditIndex::default(),
        );
        assert_eq!(vm.diff_kind, DiffKind::Unchanged);
        assert_eq!(vm.display.text, "old");
        assert!(vm.new.is_none());
        assert_eq!(vm.view_row, None);
    }

    #[test]
    fn tooltip_shows_value_and_formula_when_they_differ() {
        let c = SheetCell {
            row: 0,
            col: 0,
            value: Some("3".to_string()),
            formula: Some("=1+2".to_string()),
        };
        assert_eq!(tooltip("Value", Some(&c)), "Value: 3 | =1+2");
        assert_eq!(display_text(Some(&c)), "3");
    }
}

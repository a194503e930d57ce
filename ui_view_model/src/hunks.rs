//! Hunks: self-contained previews of one change area.
//!
//! Aligned hunks come straight from region render bounds. When a sheet cannot be
//! shown in the aligned view, raw hunks are cut from interest rectangles in
//! old/new sheet coordinates instead. Rectangles come from the payload when the
//! producer supplied them, otherwise they are derived from the sheet's ops.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::addressing::range_address;
use crate::moves::move_id_for_op;
use crate::op::{DiffOp, OpRef};
use crate::payload::{InterestRect, RectSide, SheetSnapshot};
use crate::regions::{Bounds, Region};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HunkKind {
    Aligned,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hunk {
    pub id: String,
    pub kind: HunkKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
    /// Coordinate space of `bounds` for raw hunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<RectSide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_id: Option<String>,
    pub bounds: Bounds,
    pub label: String,
}

pub fn aligned_hunks(regions: &[Region]) -> Vec<Hunk> {
    regions
        .iter()
        .filter_map(|region| {
            let bounds = region.render_bounds?;
            Some(Hunk {
                id: format!("hunk-{}", region.id),
                kind: HunkKind::Aligned,
                region_id: Some(region.id.clone()),
                side: None,
                move_id: region.move_id.clone(),
                bounds,
                label: region.label.clone(),
            })
        })
        .collect()
}

/// Row and column counts of both snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SheetDims {
    pub old_rows: u32,
    pub old_cols: u32,
    pub new_rows: u32,
    pub new_cols: u32,
}

impl SheetDims {
    pub fn new(old: Option<&SheetSnapshot>, new: Option<&SheetSnapshot>) -> Self {
        Self {
            old_rows: old.map(|s| s.nrows).unwrap_or(0),
            old_cols: old.map(|s| s.ncols).unwrap_or(0),
            new_rows: new.map(|s| s.nrows).unwrap_or(0),
            new_cols: new.map(|s| s.ncols).unwrap_or(0),
        }
    }

    /// `(rows, cols)` for one side; `Both` spans the larger of the two sheets.
    pub fn for_side(&self, side: RectSide) -> (u32, u32) {
        match side {
            RectSide::Old => (self.old_rows, self.old_cols),
            RectSide::New => (self.new_rows, self.new_cols),
            RectSide::Both => (
                self.old_rows.max(self.new_rows),
                self.old_cols.max(self.new_cols),
            ),
        }
    }

    /// Side that cell addresses resolve against: new, unless only the old sheet exists.
    fn edit_side(&self) -> RectSide {
        if self.new_rows == 0 && self.old_rows > 0 {
            RectSide::Old
        } else {
            RectSide::New
        }
    }
}

fn clamp_span(start: u32, count: u32, len: u32) -> Option<(u32, u32)> {
    if count == 0 || start >= len {
        return None;
    }
    let end = start.saturating_add(count - 1).min(len - 1);
    Some((start, end))
}

struct RectCollector {
    dims: SheetDims,
    rects: Vec<InterestRect>,
    seen: BTreeSet<String>,
}

impl RectCollector {
    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        kind: &str,
        side: RectSide,
        row_start: u32,
        row_count: u32,
        col_start: u32,
        col_count: u32,
        move_id: Option<&str>,
    ) {
        let (nrows, ncols) = self.dims.for_side(side);
        let (Some(rows), Some(cols)) = (
            clamp_span(row_start, row_count, nrows),
            clamp_span(col_start, col_count, ncols),
        ) else {
            return;
        };
        let key = format!(
            "{kind}:{side:?}:{}:{}:{}:{}:{}",
            rows.0,
            rows.1,
            cols.0,
            cols.1,
            move_id.unwrap_or_default()
        );
        if !self.seen.insert(key) {
            return;
        }
        self.rects.push(InterestRect {
            id: format!("ir-{}", self.rects.len() + 1),
            kind: kind.to_string(),
            side,
            row_start: rows.0,
            row_end: rows.1,
            col_start: cols.0,
            col_end: cols.1,
            move_id: move_id.map(str::to_string),
        });
    }
}

/// Interest rectangles for a sheet, derived from its ops. Row-shaped changes
/// span `preview_cols` columns; column-shaped ones span `preview_rows` rows.
pub fn derive_interest_rects(
    ops: &[OpRef<'_>],
    dims: SheetDims,
    preview_rows: u32,
    preview_cols: u32,
) -> Vec<InterestRect> {
    let mut out = RectCollector {
        dims,
        rects: Vec::new(),
        seen: BTreeSet::new(),
    };

    for op in ops {
        let Some(diff) = op.diff() else {
            continue;
        };
        let move_id = move_id_for_op(diff);
        let move_id = move_id.as_deref();
        match diff {
            DiffOp::CellEdited { addr, .. } => {
                if let Some((row, col)) = addr.indices() {
                    out.push("cell", dims.edit_side(), row, 1, col, 1, None);
                }
            }
            DiffOp::RectReplaced {
                start_row,
                row_count,
                start_col,
                col_count,
                ..
            } => {
                for side in [RectSide::Old, RectSide::New] {
                    out.push(
                        "rect_replaced",
                        side,
                        *start_row,
                        *row_count,
                        *start_col,
                        *col_count,
                        None,
                    );
                }
            }
            DiffOp::RowAdded { row_idx, .. } => {
                out.push("row_added", RectSide::New, *row_idx, 1, 0, preview_cols, None)
            }
            DiffOp::RowRemoved { row_idx, .. } => {
                out.push("row_removed", RectSide::Old, *row_idx, 1, 0, preview_cols, None)
            }
            DiffOp::RowReplaced { row_idx, .. } => {
                for side in [RectSide::Old, RectSide::New] {
                    out.push("row_replaced", side, *row_idx, 1, 0, preview_cols, None);
                }
            }
            DiffOp::DuplicateKeyCluster {
                left_rows,
                right_rows,
                ..
            } => {
                for row in left_rows {
                    out.push("row_cluster", RectSide::Old, *row, 1, 0, preview_cols, None);
                }
                for row in right_rows {
                    out.push("row_cluster", RectSide::New, *row, 1, 0, preview_cols, None);
                }
            }
            DiffOp::ColumnAdded { col_idx, .. } => {
                out.push("col_added", RectSide::New, 0, preview_rows, *col_idx, 1, None)
            }
            DiffOp::ColumnRemoved { col_idx, .. } => {
                out.push("col_removed", RectSide::Old, 0, preview_rows, *col_idx, 1, None)
            }
            DiffOp::BlockMovedRows {
                src_start_row,
                row_count,
                dst_start_row,
                ..
            } => {
                out.push("move_src", RectSide::Old, *src_start_row, *row_count, 0, preview_cols, move_id);
                out.push("move_dst", RectSide::New, *dst_start_row, *row_count, 0, preview_cols, move_id);
            }
            DiffOp::BlockMovedColumns {
                src_start_col,
                col_count,
                dst_start_col,
                ..
            } => {
                out.push("move_src", RectSide::Old, 0, preview_rows, *src_start_col, *col_count, move_id);
                out.push("move_dst", RectSide::New, 0, preview_rows, *dst_start_col, *col_count, move_id);
            }
            DiffOp::BlockMovedRect {
                src_start_row,
                src_row_count,
                src_start_col,
                src_col_count,
                dst_start_row,
                dst_start_col,
                ..
            } => {
                out.push(
                    "move_src",
                    RectSide::Old,
                    *src_start_row,
                    *src_row_count,
                    *src_start_col,
                    *src_col_count,
                    move_id,
                );
                out.push(
                    "move_dst",
                    RectSide::New,
                    *dst_start_row,
                    *src_row_count,
                    *dst_start_col,
                    *src_col_count,
                    move_id,
                );
            }
            _ => {}
        }
    }

    out.rects
}

fn kind_text(kind: &str) -> &str {
    match kind {
        "cell" => "Edited cells",
        "rect_replaced" => "Replaced range",
        "row_added" => "Added rows",
        "row_removed" => "Removed rows",
        "row_replaced" => "Replaced rows",
        "row_cluster" => "Duplicate key rows",
        "col_added" => "Added columns",
        "col_removed" => "Removed columns",
        "move_src" => "Moved from",
        "move_dst" => "Moved to",
        other => other,
    }
}

/// Raw hunks from interest rectangles: clamped to the side's sheet bounds,
/// widened by the context margin, then capped to `max_visual_cells`.
pub fn raw_hunks(
    rects: &[InterestRect],
    dims: SheetDims,
    context_rows: u32,
    context_cols: u32,
    max_visual_cells: u32,
) -> Vec<Hunk> {
    let mut hunks = Vec::with_capacity(rects.len());
    for rect in rects {
        let (nrows, ncols) = dims.for_side(rect.side);
        let mut bounds = Bounds {
            top: rect.row_start,
            left: rect.col_start,
            bottom: rect.row_end.max(rect.row_start),
            right: rect.col_end.max(rect.col_start),
        };
        if nrows > 0 && ncols > 0 {
            if bounds.top >= nrows || bounds.left >= ncols {
                continue;
            }
            bounds.bottom = bounds.bottom.min(nrows - 1);
            bounds.right = bounds.right.min(ncols - 1);
        }
        let bounds = bounds
            .expand(context_rows, context_cols, nrows, ncols)
            .cap(max_visual_cells);
        hunks.push(Hunk {
            id: format!("hunk-{}", rect.id),
            kind: HunkKind::Raw,
            region_id: None,
            side: Some(rect.side),
            move_id: rect.move_id.clone(),
            label: format!(
                "{} {}",
                kind_text(&rect.kind),
                range_address(bounds.top, bounds.left, bounds.bottom, bounds.right)
            ),
            bounds,
        });
    }
    hunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{CellAddress, CellSnapshot, Operation, StringRef};

    fn refs(ops: &[Operation]) -> Vec<OpRef<'_>> {
        ops.iter()
            .enumerate()
            .map(|(index, op)| OpRef { index, op })
            .collect()
    }

    fn dims(rows: u32, cols: u32) -> SheetDims {
        SheetDims {
            old_rows: rows,
            old_cols: cols,
            new_rows: rows,
            new_cols: cols,
        }
    }

    #[test]
    fn derives_rects_for_rows_and_cells() {
        let ops = vec![
            Operation::from(DiffOp::RowAdded {
                sheet: StringRef::Id(0),
                row_idx: 3,
            }),
            Operation::from(DiffOp::CellEdited {
                sheet: StringRef::Id(0),
                addr: CellAddress::A1("B2".to_string()),
                from: CellSnapshot::default(),
                to: CellSnapshot::default(),
                formula_diff: Default::default(),
            }),
            Operation::from(DiffOp::CellEdited {
                sheet: StringRef::Id(0),
                addr: CellAddress::A1("B2".to_string()),
                from: CellSnapshot::default(),
                to: CellSnapshot::default(),
                formula_diff: Default::default(),
            }),
        ];
        let rects = derive_interest_rects(&refs(&ops), dims(10, 100), 200, 80);
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0].id, "ir-1");
        assert_eq!(rects[0].kind, "row_added");
        assert_eq!(rects[0].side, RectSide::New);
        assert_eq!((rects[0].col_start, rects[0].col_end), (0, 79));
        assert_eq!(rects[1].kind, "cell");
        assert_eq!((rects[1].row_start, rects[1].col_start), (1, 1));
    }

    #[test]
    fn rects_outside_a_missing_side_are_skipped() {
        let ops = vec![Operation::from(DiffOp::RowRemoved {
            sheet: StringRef::Id(0),
            row_idx: 0,
        })];
        let only_new = SheetDims {
            new_rows: 5,
            new_cols: 5,
            ..SheetDims::default()
        };
        assert!(derive_interest_rects(&refs(&ops), only_new, 200, 80).is_empty());
    }

    fn edit_at(row: u32, col: u32) -> Operation {
        Operation::from(DiffOp::CellEdited {
            sheet: StringRef::Id(0),
            addr: CellAddress::Index { row, col },
            from: CellSnapshot::default(),
            to: CellSnapshot::default(),
            formula_diff: Default::default(),
        })
    }

    #[test]
    fn cell_edits_resolve_against_their_own_sheet() {
        let ops = vec![edit_at(8, 1)];
        let grown = SheetDims {
            old_rows: 5,
            old_cols: 3,
            new_rows: 10,
            new_cols: 3,
        };
        let rects = derive_interest_rects(&refs(&ops), grown, 200, 80);
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].side, RectSide::New);
        assert_eq!((rects[0].row_start, rects[0].col_start), (8, 1));

        let only_old = SheetDims {
            old_rows: 4,
            old_cols: 4,
            ..SheetDims::default()
        };
        let rects = derive_interest_rects(&refs(&[edit_at(2, 2)]), only_old, 200, 80);
        assert_eq!(rects[0].side, RectSide::Old);
    }

    #[test]
    fn replaced_rect_is_kept_per_side() {
        let ops = vec![Operation::from(DiffOp::RectReplaced {
            sheet: StringRef::Id(0),
            start_row: 6,
            row_count: 2,
            start_col: 0,
            col_count: 2,
        })];
        let grown = SheetDims {
            old_rows: 4,
            old_cols: 3,
            new_rows: 10,
            new_cols: 3,
        };
        let rects = derive_interest_rects(&refs(&ops), grown, 200, 80);
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].side, RectSide::New);
        assert_eq!((rects[0].row_start, rects[0].row_end), (6, 7));

        let rects = derive_interest_rects(&refs(&ops), dims(10, 3), 200, 80);
        let sides: Vec<RectSide> = rects.iter().map(|rect| rect.side).collect();
        assert_eq!(sides, vec![RectSide::Old, RectSide::New]);
    }

    #[test]
    fn both_side_spans_the_larger_sheet() {
        let grown = SheetDims {
            old_rows: 5,
            old_cols: 3,
            new_rows: 10,
            new_cols: 2,
        };
        assert_eq!(grown.for_side(RectSide::Both), (10, 3));
    }

    #[test]
    fn raw_hunks_expand_and_cap() {
        let rect = InterestRect {
            id: "ir-1".to_string(),
            kind: "cell".to_string(),
            side: RectSide::Both,
            row_start: 1,
            row_end: 1,
            col_start: 1,
            col_end: 1,
            move_id: None,
        };
        let hunks = raw_hunks(std::slice::from_ref(&rect), dims(10, 10), 1, 1, 5000);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].id, "hunk-ir-1");
        assert_eq!(hunks[0].bounds, Bounds { top: 0, left: 0, bottom: 2, right: 2 });
        assert_eq!(hunks[0].label, "Edited cells A1:C3");

        let capped = raw_hunks(&[rect], dims(10, 10), 1, 1, 3);
        assert_eq!(capped[0].bounds, Bounds { top: 0, left: 0, bottom: 0, right: 2 });
    }
}

//! Contiguous row/column insert and delete ranges.

use std::collections::BTreeSet;

use crate::addressing::column_label;
use crate::axis::{AxisProjection, Side};
use crate::changes::{Axis, ChangeGroup, ChangeItem, ChangeType, ItemLocator};
use crate::op::{DiffOp, OpRef};

/// Inclusive run of consecutive indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRun {
    pub start: u32,
    pub end: u32,
}

impl IndexRun {
    pub fn count(&self) -> u32 {
        self.end - self.start + 1
    }
}

pub fn group_consecutive(indices: &BTreeSet<u32>) -> Vec<IndexRun> {
    let mut runs: Vec<IndexRun> = Vec::new();
    for &idx in indices {
        match runs.last_mut() {
            Some(run) if u64::from(run.end) + 1 == u64::from(idx) => run.end = idx,
            _ => runs.push(IndexRun { start: idx, end: idx }),
        }
    }
    runs
}

fn range_label(axis: Axis, projection: &AxisProjection, run: IndexRun, side: Side, action: &str) -> String {
    let start = projection.side_index(run.start, side);
    let end = projection.side_index(run.end, side);
    match axis {
        Axis::Row if start == end => format!("Row {} {action}", u64::from(start) + 1),
        Axis::Row => format!("Rows {}-{} {action}", u64::from(start) + 1, u64::from(end) + 1),
        Axis::Col if start == end => format!("Column {} {action}", column_label(start)),
        Axis::Col => format!(
            "Columns {}-{} {action}",
            column_label(start),
            column_label(end)
        ),
    }
}

fn range_items(
    items: &mut Vec<ChangeItem>,
    axis: Axis,
    projection: &AxisProjection,
    indices: &BTreeSet<u32>,
    change_type: ChangeType,
) {
    let (group, prefix) = match axis {
        Axis::Row => (ChangeGroup::Rows, "row"),
        Axis::Col => (ChangeGroup::Cols, "col"),
    };
    let (side, action) = match change_type {
        ChangeType::Removed => (Side::Old, "removed"),
        _ => (Side::New, "added"),
    };
    for run in group_consecutive(indices) {
        items.push(
            ChangeItem::new(
                format!("{prefix}-{action}-{}", run.start),
                group,
                change_type,
                range_label(axis, projection, run, side, action),
            )
            .with_locator(ItemLocator::Range {
                axis,
                view_start: run.start,
                view_end: run.end,
            }),
        );
    }
}

/// Replaced rows, then added/removed row ranges, then added/removed column ranges.
pub fn axis_change_items(ops: &[OpRef<'_>], rows: &AxisProjection, cols: &AxisProjection) -> Vec<ChangeItem> {
    let mut items = Vec::new();
    let mut replaced = BTreeSet::new();
    let mut row_adds = BTreeSet::new();
    let mut row_removes = BTreeSet::new();
    let mut col_adds = BTreeSet::new();
    let mut col_removes = BTreeSet::new();

    for op in ops {
        match op.diff() {
            Some(DiffOp::RowAdded { row_idx, .. }) => {
                row_adds.insert(rows.view_or_same(Side::New, *row_idx));
            }
            Some(DiffOp::RowRemoved { row_idx, .. }) => {
                row_removes.insert(rows.view_or_same(Side::Old, *row_idx));
            }
            Some(DiffOp::ColumnAdded { col_idx, .. }) => {
                col_adds.insert(cols.view_or_same(Side::New, *col_idx));
            }
            Some(DiffOp::ColumnRemoved { col_idx, .. }) => {
                col_removes.insert(cols.view_or_same(Side::Old, *col_idx));
            }
            Some(DiffOp::RowReplaced { row_idx, .. }) => {
                if !replaced.insert(*row_idx) {
                    continue;
                }
                let view = rows.view_or_same(Side::New, *row_idx);
                let raw = rows.side_index(view, Side::New);
                items.push(
                    ChangeItem::new(
                        format!("row-replaced-{row_idx}"),
                        ChangeGroup::Rows,
                        ChangeType::Modified,
                        format!("Row {} replaced", u64::from(raw) + 1),
                    )
                    .with_locator(ItemLocator::Range {
                        axis: Axis::Row,
                        view_start: view,
                        view_end: view,
                    }),
                );
            }
            _ => {}
        }
    }

    range_items(&mut items, Axis::Row, rows, &row_adds, ChangeType::Added);
    range_items(&mut items, Axis::Row, rows, &row_removes, ChangeType::Removed);
    range_items(&mut items, Axis::Col, cols, &col_adds, ChangeType::Added);
    range_items(&mut items, Axis::Col, cols, &col_removes, ChangeType::Removed);
    items
}

//! Move identity.
//!
//! A moved block is identified by its source extent and destination start. The
//! aligner may supply its own move records; when it does they replace the
//! row/column moves derived from ops. Rectangle moves always come from ops.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::addressing::{cell_address, column_label};
use crate::changes::{Axis, ChangeGroup, ChangeItem, ChangeType, ItemLocator};
use crate::op::{DiffOp, OpRef};
use crate::payload::SheetAlignment;

pub fn row_move_id(src_start: u32, count: u32, dst_start: u32) -> String {
    format!("r:{src_start}+{count}->{dst_start}")
}

pub fn col_move_id(src_start: u32, count: u32, dst_start: u32) -> String {
    format!("c:{src_start}+{count}->{dst_start}")
}

pub fn rect_move_id(
    src_row: u32,
    src_col: u32,
    row_count: u32,
    col_count: u32,
    dst_row: u32,
    dst_col: u32,
) -> String {
    format!("rect:{src_row},{src_col}+{row_count}x{col_count}->{dst_row},{dst_col}")
}

pub fn move_id_for_op(op: &DiffOp) -> Option<String> {
    match op {
        DiffOp::BlockMovedRows {
            src_start_row,
            row_count,
            dst_start_row,
            ..
        } => Some(row_move_id(*src_start_row, *row_count, *dst_start_row)),
        DiffOp::BlockMovedColumns {
            src_start_col,
            col_count,
            dst_start_col,
            ..
        } => Some(col_move_id(*src_start_col, *col_count, *dst_start_col)),
        DiffOp::BlockMovedRect {
            src_start_row,
            src_row_count,
            src_start_col,
            src_col_count,
            dst_start_row,
            dst_start_col,
            ..
        } => Some(rect_move_id(
            *src_start_row,
            *src_start_col,
            *src_row_count,
            *src_col_count,
            *dst_start_row,
            *dst_start_col,
        )),
        _ => None,
    }
}

/// Human labels for both ends of a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveEndpoints {
    pub src: String,
    pub dst: String,
}

fn last_index(start: u32, count: u32) -> u32 {
    start.saturating_add(count.max(1) - 1)
}

fn row_span_label(start: u32, count: u32) -> String {
    let end = last_index(start, count);
    if start == end {
        format!("Row {}", u64::from(start) + 1)
    } else {
        format!("Rows {}-{}", u64::from(start) + 1, u64::from(end) + 1)
    }
}

fn col_span_label(start: u32, count: u32) -> String {
    let end = last_index(start, count);
    if start == end {
        format!("Column {}", column_label(start))
    } else {
        format!("Columns {}-{}", column_label(start), column_label(end))
    }
}

fn axis_move_item(move_id: String, item_id: String, axis: Axis, src_start: u32, dst_start: u32, count: u32) -> ChangeItem {
    let (label, detail) = match axis {
        Axis::Row => (
            row_span_label(src_start, count),
            format!("to row {}", u64::from(dst_start) + 1),
        ),
        Axis::Col => (
            col_span_label(src_start, count),
            format!("to column {}", column_label(dst_start)),
        ),
    };
    ChangeItem::new(item_id, ChangeGroup::Moves, ChangeType::Moved, format!("{label} moved"))
        .with_detail(detail)
        .with_locator(ItemLocator::AxisMove {
            move_id,
            axis,
            src_start,
            dst_start,
            count,
        })
}

/// Move items for one sheet: row/column moves first, then rectangle moves.
pub fn move_items(alignment: Option<&SheetAlignment>, ops: &[OpRef<'_>]) -> Vec<ChangeItem> {
    let mut items = Vec::new();
    let aligned_moves = alignment.map(|a| a.moves.as_slice()).unwrap_or_default();

    if aligned_moves.is_empty() {
        for op in ops {
            match op.diff() {
                Some(DiffOp::BlockMovedRows {
                    src_start_row,
                    row_count,
                    dst_start_row,
                    ..
                }) => items.push(axis_move_item(
                    row_move_id(*src_start_row, *row_count, *dst_start_row),
                    format!("move-rows-{src_start_row}-{dst_start_row}"),
                    Axis::Row,
                    *src_start_row,
                    *dst_start_row,
                    *row_count,
                )),
                Some(DiffOp::BlockMovedColumns {
                    src_start_col,
                    col_count,
                    dst_start_col,
                    ..
                }) => items.push(axis_move_item(
                    col_move_id(*src_start_col, *col_count, *dst_start_col),
                    format!("move-cols-{src_start_col}-{dst_start_col}"),
                    Axis::Col,
                    *src_start_col,
                    *dst_start_col,
                    *col_count,
                )),
                _ => {}
            }
        }
    } else {
        for record in aligned_moves {
            let axis = match record.axis.as_str() {
                "row" => Axis::Row,
                "col" => Axis::Col,
                other => {
                    log::debug!("ignoring move {} on unknown axis {other:?}", record.id);
                    continue;
                }
            };
            items.push(axis_move_item(
                record.id.clone(),
                format!("move-{}", record.id),
                axis,
                record.src_start,
                record.dst_start,
                record.count,
            ));
        }
    }

    for op in ops {
        let Some(DiffOp::BlockMovedRect {
            src_start_row,
            src_row_count,
            src_start_col,
            src_col_count,
            dst_start_row,
            dst_start_col,
            ..
        }) = op.diff()
        else {
            continue;
        };
        let src_start = cell_address(*src_start_row, *src_start_col);
        let src_end = cell_address(
            last_index(*src_start_row, *src_row_count),
            last_index(*src_start_col, *src_col_count),
        );
        let dst_start = cell_address(*dst_start_row, *dst_start_col);
        let dst_end = cell_address(
            last_index(*dst_start_row, *src_row_count),
            last_index(*dst_start_col, *src_col_count),
        );
        let move_id = rect_move_id(
            *src_start_row,
            *src_start_col,
            *src_row_count,
            *src_col_count,
            *dst_start_row,
            *dst_start_col,
        );
        items.push(
            ChangeItem::new(
                format!("move-rect-{src_start}-{dst_start}"),
                ChangeGroup::Moves,
                ChangeType::Moved,
                format!("Range {src_start}:{src_end} moved"),
            )
            .with_detail(format!("to {dst_start}:{dst_end}"))
            .with_locator(ItemLocator::RectMove {
                move_id,
                src: format!("{src_start}:{src_end}"),
                dst: format!("{dst_start}:{dst_end}"),
            }),
        );
    }

    items
}

/// Endpoint labels keyed by move id.
pub fn move_table(items: &[ChangeItem]) -> BTreeMap<String, MoveEndpoints> {
    let mut table = BTreeMap::new();
    for item in items {
        let endpoints = match &item.locator {
            Some(ItemLocator::AxisMove {
                move_id,
                axis,
                src_start,
                dst_start,
                count,
            }) => {
                let span: fn(u32, u32) -> String = match axis {
                    Axis::Row => row_span_label,
                    Axis::Col => col_span_label,
                };
                (move_id, span(*src_start, *count), span(*dst_start, *count))
            }
            Some(ItemLocator::RectMove { move_id, src, dst }) => {
                (move_id, src.clone(), dst.clone())
            }
            _ => continue,
        };
        let (move_id, src, dst) = endpoints;
        table
            .entry(move_id.clone())
            .or_insert(MoveEndpoints { src, dst });
    }
    table
}

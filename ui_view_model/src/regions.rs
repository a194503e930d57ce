//! Bounding rectangles over changed view cells.
//!
//! Edited cells are clustered greedily row by row: each row's edited columns are
//! collapsed into runs, runs longer than the cell budget are split, and a run
//! extends a region from the row directly above when their column spans overlap
//! (within `merge_gap`). Regions are never merged across an unedited row. The
//! result is not a minimal cover.
//!
//! Replaced and moved blocks contribute their own regions with exact extents.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::addressing::{cell_address, range_address};
use crate::axis::{AxisProjection, Side};
use crate::edits::split_key;
use crate::moves::{col_move_id, rect_move_id, row_move_id};
use crate::op::{DiffOp, OpRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Cell,
    Rect,
    MoveSrc,
    MoveDst,
}

impl RegionKind {
    fn sort_rank(self) -> u8 {
        match self {
            RegionKind::MoveSrc | RegionKind::MoveDst => 0,
            RegionKind::Rect => 1,
            RegionKind::Cell => 2,
        }
    }
}

/// Inclusive view-coordinate rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl Bounds {
    pub fn rows(&self) -> u64 {
        u64::from(self.bottom.saturating_sub(self.top)) + 1
    }

    pub fn cols(&self) -> u64 {
        u64::from(self.right.saturating_sub(self.left)) + 1
    }

    pub fn area(&self) -> u64 {
        self.rows().saturating_mul(self.cols())
    }

    /// Grow by a context margin, clamped to `rows_count x cols_count`.
    pub fn expand(self, context_rows: u32, context_cols: u32, rows_count: u32, cols_count: u32) -> Bounds {
        if rows_count == 0 || cols_count == 0 {
            return self;
        }
        Bounds {
            top: self.top.saturating_sub(context_rows),
            left: self.left.saturating_sub(context_cols),
            bottom: self
                .bottom
                .saturating_add(context_rows)
                .min(rows_count - 1),
            right: self
                .right
                .saturating_add(context_cols)
                .min(cols_count - 1),
        }
    }

    /// Trim rows first, then columns, until the area fits `max_cells`.
    /// `0` disables the cap.
    pub fn cap(self, max_cells: u32) -> Bounds {
        let max_cells = u64::from(max_cells);
        if max_cells == 0 || self.area() <= max_cells {
            return self;
        }
        let rows = self.rows();
        let cols = self.cols();
        let max_rows = (max_cells / cols).max(1);
        if max_rows < rows {
            return Bounds {
                bottom: self.top + (max_rows - 1) as u32,
                ..self
            };
        }
        let max_cols = (max_cells / rows).max(1);
        if max_cols < cols {
            return Bounds {
                right: self.left + (max_cols - 1) as u32,
                ..self
            };
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    pub kind: RegionKind,
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
    pub cell_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_id: Option<String>,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_bounds: Option<Bounds>,
}

impl Region {
    fn exact(id: String, kind: RegionKind, rows: (u32, u32), cols: (u32, u32), move_id: Option<String>) -> Self {
        let bounds = Bounds {
            top: rows.0,
            left: cols.0,
            bottom: rows.1,
            right: cols.1,
        };
        Region {
            id,
            kind,
            top: bounds.top,
            left: bounds.left,
            bottom: bounds.bottom,
            right: bounds.right,
            cell_count: bounds.area(),
            move_id,
            label: String::new(),
            render_bounds: None,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            top: self.top,
            left: self.left,
            bottom: self.bottom,
            right: self.right,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Run {
    start: u32,
    end: u32,
}

impl Run {
    fn len(&self) -> u64 {
        u64::from(self.end - self.start) + 1
    }
}

#[derive(Debug, Clone, Copy)]
struct Growing {
    row_start: u32,
    row_end: u32,
    col_start: u32,
    col_end: u32,
    cells: u64,
}

impl Growing {
    fn start(row: u32, run: Run) -> Self {
        Growing {
            row_start: row,
            row_end: row,
            col_start: run.start,
            col_end: run.end,
            cells: run.len(),
        }
    }

    fn touches(&self, row: u32, run: Run, gap: u32) -> bool {
        u64::from(self.row_end) + 1 == u64::from(row)
            && u64::from(run.start) <= u64::from(self.col_end) + u64::from(gap)
            && u64::from(run.end) + u64::from(gap) >= u64::from(self.col_start)
    }
}

fn column_runs(cols: &[u32], max_cells: u64) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for &col in cols {
        match runs.last_mut() {
            Some(run) if col == run.end + 1 => run.end = col,
            Some(run) if col == run.end => {}
            _ => runs.push(Run { start: col, end: col }),
        }
    }
    if max_cells == 0 {
        return runs;
    }

    let mut split = Vec::with_capacity(runs.len());
    for run in runs {
        if run.len() <= max_cells {
            split.push(run);
            continue;
        }
        let mut seg_start = u64::from(run.start);
        while seg_start <= u64::from(run.end) {
            let seg_end = (seg_start + max_cells - 1).min(u64::from(run.end));
            split.push(Run {
                start: seg_start as u32,
                end: seg_end as u32,
            });
            seg_start = seg_end + 1;
        }
    }
    split
}

/// Cluster packed edit keys into `cell` regions with ids `cells-1`, `cells-2`, ...
/// in finalization order. `max_cells == 0` disables the budget.
pub fn cluster_edits(keys: &[u64], max_cells: u32, merge_gap: u32) -> Vec<Region> {
    let mut by_row: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for &key in keys {
        let (row, col) = split_key(key);
        by_row.entry(row).or_default().push(col);
    }

    let budget = u64::from(max_cells);
    let mut finished: Vec<Growing> = Vec::new();
    let mut active: Vec<Option<Growing>> = Vec::new();

    for (row, mut cols) in by_row {
        cols.sort_unstable();
        let mut next_active: Vec<Option<Growing>> = Vec::new();

        for run in column_runs(&cols, budget) {
            let matched = active
                .iter()
                .position(|region| region.is_some_and(|r| r.touches(row, run, merge_gap)));

            if let Some(slot) = matched.and_then(|i| active[i].take()) {
                let merged = slot.cells + run.len();
                if budget > 0 && merged > budget {
                    finished.push(slot);
                } else {
                    next_active.push(Some(Growing {
                        row_end: row,
                        col_start: slot.col_start.min(run.start),
                        col_end: slot.col_end.max(run.end),
                        cells: merged,
                        ..slot
                    }));
                    continue;
                }
            }
            next_active.push(Some(Growing::start(row, run)));
        }

        finished.extend(active.into_iter().flatten());
        active = next_active;
    }
    finished.extend(active.into_iter().flatten());

    finished
        .into_iter()
        .enumerate()
        .map(|(idx, g)| Region {
            id: format!("cells-{}", idx + 1),
            kind: RegionKind::Cell,
            top: g.row_start,
            left: g.col_start,
            bottom: g.row_end,
            right: g.col_end,
            cell_count: g.cells,
            move_id: None,
            label: String::new(),
            render_bounds: None,
        })
        .collect()
}

fn full_span(axis: &AxisProjection) -> Option<(u32, u32)> {
    (!axis.is_empty()).then(|| (0, axis.len() - 1))
}

/// Exact-extent regions for replaced rectangles and moved blocks.
pub fn block_regions(ops: &[OpRef<'_>], rows: &AxisProjection, cols: &AxisProjection) -> Vec<Region> {
    let mut regions = Vec::new();
    for op in ops {
        match op.diff() {
            Some(DiffOp::RectReplaced {
                start_row,
                row_count,
                start_col,
                col_count,
                ..
            }) => {
                let row_span = rows.map_range(Side::New, *start_row, *row_count);
                let col_span = cols.map_range(Side::New, *start_col, *col_count);
                if let (Some(r), Some(c)) = (row_span, col_span) {
                    regions.push(Region::exact(
                        format!("rect-{start_row}-{start_col}"),
                        RegionKind::Rect,
                        r,
                        c,
                        None,
                    ));
                }
            }
            Some(DiffOp::BlockMovedRect {
                src_start_row,
                src_row_count,
                src_start_col,
                src_col_count,
                dst_start_row,
                dst_start_col,
                ..
            }) => {
                let move_id = rect_move_id(
                    *src_start_row,
                    *src_start_col,
                    *src_row_count,
                    *src_col_count,
                    *dst_start_row,
                    *dst_start_col,
                );
                let src = (
                    rows.map_range(Side::Old, *src_start_row, *src_row_count),
                    cols.map_range(Side::Old, *src_start_col, *src_col_count),
                );
                let dst = (
                    rows.map_range(Side::New, *dst_start_row, *src_row_count),
                    cols.map_range(Side::New, *dst_start_col, *src_col_count),
                );
                push_move_pair(&mut regions, &move_id, src, dst);
            }
            Some(DiffOp::BlockMovedRows {
                src_start_row,
                row_count,
                dst_start_row,
                ..
            }) => {
                let move_id = row_move_id(*src_start_row, *row_count, *dst_start_row);
                let width = full_span(cols);
                let src = (rows.map_range(Side::Old, *src_start_row, *row_count), width);
                let dst = (rows.map_range(Side::New, *dst_start_row, *row_count), width);
                push_move_pair(&mut regions, &move_id, src, dst);
            }
            Some(DiffOp::BlockMovedColumns {
                src_start_col,
                col_count,
                dst_start_col,
                ..
            }) => {
                let move_id = col_move_id(*src_start_col, *col_count, *dst_start_col);
                let height = full_span(rows);
                let src = (height, cols.map_range(Side::Old, *src_start_col, *col_count));
                let dst = (height, cols.map_range(Side::New, *dst_start_col, *col_count));
                push_move_pair(&mut regions, &move_id, src, dst);
            }
            _ => {}
        }
    }
    regions
}

type Span = Option<(u32, u32)>;

fn push_move_pair(regions: &mut Vec<Region>, move_id: &str, src: (Span, Span), dst: (Span, Span)) {
    if let (Some(r), Some(c)) = src {
        regions.push(Region::exact(
            format!("move-src-{move_id}"),
            RegionKind::MoveSrc,
            r,
            c,
            Some(move_id.to_string()),
        ));
    }
    if let (Some(r), Some(c)) = dst {
        regions.push(Region::exact(
            format!("move-dst-{move_id}"),
            RegionKind::MoveDst,
            r,
            c,
            Some(move_id.to_string()),
        ));
    }
}

/// Human label in sheet addresses. Move sources read the old sheet; everything
/// else reads the new one.
pub fn label_region(region: &Region, rows: &AxisProjection, cols: &AxisProjection) -> String {
    let side = match region.kind {
        RegionKind::MoveSrc => Side::Old,
        _ => Side::New,
    };
    let top = rows.side_index(region.top, side);
    let bottom = rows.side_index(region.bottom, side);
    let left = cols.side_index(region.left, side);
    let right = cols.side_index(region.right, side);
    let address = range_address(top, left, bottom, right);
    match region.kind {
        RegionKind::Rect => format!(
            "Region {}:{}",
            cell_address(top, left),
            cell_address(bottom, right)
        ),
        RegionKind::MoveSrc | RegionKind::MoveDst => format!("Range {address}"),
        RegionKind::Cell if address.contains(':') => format!("Cells {address}"),
        RegionKind::Cell => format!("Cell {address}"),
    }
}

/// Top, left, kind (moves, rects, cells), then id.
pub fn compare_regions(a: &Region, b: &Region) -> Ordering {
    a.top
        .cmp(&b.top)
        .then(a.left.cmp(&b.left))
        .then(a.kind.sort_rank().cmp(&b.kind.sort_rank()))
        .then_with(|| a.id.cmp(&b.id))
}

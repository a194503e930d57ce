//! Per-sheet view model.

use std::cell::OnceCell;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::addressing::{cell_address, column_label, range_address};
use crate::analysis::{ChangeCounts, SheetBreakdown, SeverityCounts};
use crate::anchors::{attach_nav_targets, build_anchors, Anchor};
use crate::axis::{AxisProjection, Side};
use crate::cells::{cell_at, cell_at_raw, CellIndex, CellViewModel};
use crate::changes::{ChangeGroup, ChangeItem, ChangeType, ItemLocator};
use crate::classify::{classify, OpCategory, OpNoiseClass, OpSeverity};
use crate::edits::EditIndex;
use crate::hunks::{aligned_hunks, derive_interest_rects, raw_hunks, Hunk, SheetDims};
use crate::moves::{move_items, move_table, MoveEndpoints};
use crate::op::{DiffOp, OpRef, Operation};
use crate::options::ViewOptions;
use crate::payload::{DiffReport, InterestRect, SheetAlignment, SheetSnapshot};
use crate::ranges::axis_change_items;
use crate::regions::{block_regions, cluster_edits, compare_regions, label_region, Region, RegionKind};

const MSG_NO_ALIGNMENT: &str = "Alignment data is missing for this sheet.";
const MSG_NO_SNAPSHOTS: &str = "Sheet snapshots are missing for this sheet.";
const MSG_SKIPPED: &str =
    "Grid preview skipped because the aligned view is too large or inconsistent.";
const MSG_TRUNCATED: &str = "Sheet snapshot was truncated; some cells are not shown.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Ok,
    Partial,
    Skipped,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderStatus {
    pub kind: StatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RenderStatus {
    fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// Ok or partial: the aligned grid can be shown.
    pub fn is_renderable(&self) -> bool {
        matches!(self.kind, StatusKind::Ok | StatusKind::Partial)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPlan {
    pub regions_to_render: Vec<String>,
    pub status: RenderStatus,
    pub context_rows: u32,
    pub context_cols: u32,
    pub max_visual_cells: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SheetAxes {
    pub rows: AxisProjection,
    pub cols: AxisProjection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SheetChanges {
    pub items: Vec<ChangeItem>,
    pub regions: Vec<Region>,
    pub anchors: Vec<Anchor>,
    pub moves: BTreeMap<String, MoveEndpoints>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewPoint {
    pub row: u32,
    pub col: u32,
}

/// One entry per op routed to the sheet, in report order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpRow {
    pub index: usize,
    pub kind: String,
    pub category: OpCategory,
    pub severity: OpSeverity,
    pub change_type: ChangeType,
    pub noise_class: OpNoiseClass,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewPoint>,
}

/// Everything needed to build one sheet.
#[derive(Debug, Clone)]
pub struct SheetInputs<'a> {
    pub report: &'a DiffReport,
    pub name: String,
    /// Name in the old workbook when the sheet was renamed.
    pub old_name: Option<String>,
    pub ops: Vec<OpRef<'a>>,
    pub old_sheet: Option<&'a SheetSnapshot>,
    pub new_sheet: Option<&'a SheetSnapshot>,
    pub alignment: Option<&'a SheetAlignment>,
    pub interest_rects: Option<&'a [InterestRect]>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetViewModel<'a> {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_name: Option<String>,
    pub axis: SheetAxes,
    pub changes: SheetChanges,
    pub ops: Vec<OpRow>,
    pub hunks: Vec<Hunk>,
    pub render_plan: RenderPlan,
    pub op_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<OpSeverity>,
    pub severity_counts: SeverityCounts,
    pub counts: ChangeCounts,
    pub categories: Vec<OpCategory>,

    #[serde(skip)]
    old_sheet: Option<&'a SheetSnapshot>,
    #[serde(skip)]
    new_sheet: Option<&'a SheetSnapshot>,
    #[serde(skip)]
    edits: EditIndex,
    #[serde(skip)]
    cell_index: OnceCell<CellIndex<'a>>,
}

impl<'a> SheetViewModel<'a> {
    fn cells(&self) -> &CellIndex<'a> {
        self.cell_index
            .get_or_init(|| CellIndex::new(self.old_sheet, self.new_sheet))
    }

    pub fn cell_at(&self, view_row: u32, view_col: u32) -> CellViewModel {
        cell_at(
            view_row,
            view_col,
            &self.axis.rows,
            &self.axis.cols,
            self.cells(),
            &self.edits,
        )
    }

    pub fn cell_at_raw(&self, side: Side, row: u32, col: u32) -> CellViewModel {
        cell_at_raw(
            side,
            row,
            col,
            &self.axis.rows,
            &self.axis.cols,
            self.cells(),
            &self.edits,
        )
    }

    pub fn edits(&self) -> &EditIndex {
        &self.edits
    }

    pub fn status(&self) -> &RenderStatus {
        &self.render_plan.status
    }

    pub fn breakdown(&self) -> SheetBreakdown {
        SheetBreakdown {
            sheet_name: self.name.clone(),
            op_count: self.op_count,
            counts: self.counts,
            severity: self.severity_counts,
        }
    }
}

fn render_status(inputs: &SheetInputs<'_>, rows: &AxisProjection, cols: &AxisProjection) -> RenderStatus {
    let Some(alignment) = inputs.alignment else {
        return RenderStatus::new(StatusKind::Missing, MSG_NO_ALIGNMENT);
    };
    if alignment.skipped {
        let message = alignment
            .skip_reason
            .clone()
            .filter(|reason| !reason.is_empty())
            .unwrap_or_else(|| MSG_SKIPPED.to_string());
        return RenderStatus::new(StatusKind::Skipped, message);
    }
    let has_snapshot = |sheet: Option<&SheetSnapshot>| sheet.is_some_and(|s| !s.is_empty());
    if rows.is_empty()
        || cols.is_empty()
        || (!has_snapshot(inputs.old_sheet) && !has_snapshot(inputs.new_sheet))
    {
        return RenderStatus::new(StatusKind::Missing, MSG_NO_SNAPSHOTS);
    }
    let truncated = [inputs.old_sheet, inputs.new_sheet]
        .into_iter()
        .flatten()
        .find(|sheet| sheet.truncated);
    if let Some(sheet) = truncated {
        let message = sheet
            .note
            .clone()
            .filter(|note| !note.is_empty())
            .unwrap_or_else(|| MSG_TRUNCATED.to_string());
        return RenderStatus::new(StatusKind::Partial, message);
    }
    RenderStatus {
        kind: StatusKind::Ok,
        message: None,
    }
}

fn build_regions(
    ops: &[OpRef<'_>],
    edits: &EditIndex,
    rows: &AxisProjection,
    cols: &AxisProjection,
    options: &ViewOptions,
) -> Vec<Region> {
    let mut regions = cluster_edits(
        &edits.sorted_keys(),
        options.max_cells_per_region,
        options.merge_gap,
    );
    regions.extend(block_regions(ops, rows, cols));
    for region in regions.iter_mut() {
        region.label = label_region(region, rows, cols);
    }
    regions.sort_by(compare_regions);

    if !rows.is_empty() && !cols.is_empty() {
        for region in regions.iter_mut() {
            region.render_bounds = Some(
                region
                    .bounds()
                    .expand(options.context_rows, options.context_cols, rows.len(), cols.len())
                    .cap(options.max_visual_cells),
            );
        }
    }
    regions
}

fn region_items(regions: &[Region]) -> Vec<ChangeItem> {
    let mut items = Vec::new();
    for region in regions {
        let item = match region.kind {
            RegionKind::Cell => {
                let detail = if region.cell_count > 1 {
                    format!("{} cells", region.cell_count)
                } else {
                    String::new()
                };
                ChangeItem::new(
                    format!("cell-region-{}", region.id),
                    ChangeGroup::Cells,
                    ChangeType::Modified,
                    format!("{} modified", region.label),
                )
                .with_detail(detail)
            }
            RegionKind::Rect => ChangeItem::new(
                format!("rect-region-{}", region.id),
                ChangeGroup::Cells,
                ChangeType::Modified,
                format!("{} replaced", region.label),
            ),
            RegionKind::MoveSrc | RegionKind::MoveDst => continue,
        };
        items.push(item.with_locator(ItemLocator::Region {
            region_id: region.id.clone(),
        }));
    }
    items
}

fn is_listed_elsewhere(op: &Operation) -> bool {
    matches!(
        op.as_diff(),
        Some(
            DiffOp::RowAdded { .. }
                | DiffOp::RowRemoved { .. }
                | DiffOp::RowReplaced { .. }
                | DiffOp::ColumnAdded { .. }
                | DiffOp::ColumnRemoved { .. }
                | DiffOp::CellEdited { .. }
                | DiffOp::RectReplaced { .. }
                | DiffOp::BlockMovedRows { .. }
                | DiffOp::BlockMovedColumns { .. }
                | DiffOp::BlockMovedRect { .. }
                | DiffOp::SheetAdded { .. }
                | DiffOp::SheetRemoved { .. }
        )
    )
}

fn other_items(report: &DiffReport, ops: &[OpRef<'_>]) -> Vec<ChangeItem> {
    let mut items = Vec::new();
    for op in ops {
        if is_listed_elsewhere(op.op) {
            continue;
        }
        let class = classify(op.op);
        let id = format!("other-{}-{}", op.op.kind(), op.index);
        let item = match op.diff() {
            Some(DiffOp::SheetRenamed { from, .. }) => ChangeItem::new(
                id,
                ChangeGroup::Other,
                class.change_type,
                format!("Sheet renamed from {}", report.resolve(from)),
            ),
            Some(DiffOp::DuplicateKeyCluster {
                left_rows,
                right_rows,
                ..
            }) => ChangeItem::new(id, ChangeGroup::Other, class.change_type, "Duplicate key rows")
                .with_detail(format!(
                    "{} old, {} new",
                    left_rows.len(),
                    right_rows.len()
                )),
            _ => ChangeItem::new(
                id,
                ChangeGroup::Other,
                class.change_type,
                generic_label(report, op.op),
            ),
        };
        items.push(item);
    }
    items
}

fn generic_label(report: &DiffReport, op: &Operation) -> String {
    match op.name() {
        Some(name) => format!("{}: {}", op.kind(), report.resolve(&name)),
        None => op.kind().to_string(),
    }
}

fn row_label(row: u32) -> String {
    format!("Row {}", u64::from(row) + 1)
}

fn span_address(row: u32, rows: u32, col: u32, cols: u32) -> String {
    range_address(
        row,
        col,
        row.saturating_add(rows.max(1) - 1),
        col.saturating_add(cols.max(1) - 1),
    )
}

/// Human label and view position for one op.
fn describe_op(
    report: &DiffReport,
    op: &Operation,
    rows: &AxisProjection,
    cols: &AxisProjection,
) -> (String, Option<ViewPoint>) {
    let point = |row: Option<u32>, col: Option<u32>| {
        Some(ViewPoint {
            row: row?,
            col: col?,
        })
    };
    let Some(diff) = op.as_diff() else {
        return (generic_label(report, op), None);
    };
    match diff {
        DiffOp::CellEdited { addr, .. } => match addr.indices() {
            Some((row, col)) => (
                format!("Cell {} edited", cell_address(row, col)),
                point(rows.place(Side::New, row), cols.place(Side::New, col)),
            ),
            None => ("Cell edited".to_string(), None),
        },
        DiffOp::RowAdded { row_idx, .. } => (
            format!("{} added", row_label(*row_idx)),
            point(rows.view_of(Side::New, *row_idx), Some(0)),
        ),
        DiffOp::RowRemoved { row_idx, .. } => (
            format!("{} removed", row_label(*row_idx)),
            point(rows.view_of(Side::Old, *row_idx), Some(0)),
        ),
        DiffOp::RowReplaced { row_idx, .. } => (
            format!("{} replaced", row_label(*row_idx)),
            point(rows.view_of(Side::New, *row_idx), Some(0)),
        ),
        DiffOp::ColumnAdded { col_idx, .. } => (
            format!("Column {} added", column_label(*col_idx)),
            point(Some(0), cols.view_of(Side::New, *col_idx)),
        ),
        DiffOp::ColumnRemoved { col_idx, .. } => (
            format!("Column {} removed", column_label(*col_idx)),
            point(Some(0), cols.view_of(Side::Old, *col_idx)),
        ),
        DiffOp::BlockMovedRows {
            src_start_row,
            row_count,
            dst_start_row,
            ..
        } => (
            format!(
                "Rows {}-{} moved to row {}",
                u64::from(*src_start_row) + 1,
                u64::from(*src_start_row) + u64::from((*row_count).max(1)),
                u64::from(*dst_start_row) + 1
            ),
            point(rows.view_of(Side::Old, *src_start_row), Some(0)),
        ),
        DiffOp::BlockMovedColumns {
            src_start_col,
            col_count,
            dst_start_col,
            ..
        } => (
            format!(
                "Columns {}-{} moved to column {}",
                column_label(*src_start_col),
                column_label(src_start_col.saturating_add((*col_count).max(1) - 1)),
                column_label(*dst_start_col)
            ),
            point(Some(0), cols.view_of(Side::Old, *src_start_col)),
        ),
        DiffOp::BlockMovedRect {
            src_start_row,
            src_row_count,
            src_start_col,
            src_col_count,
            dst_start_row,
            dst_start_col,
            ..
        } => (
            format!(
                "Range {} moved to {}",
                span_address(*src_start_row, *src_row_count, *src_start_col, *src_col_count),
                span_address(*dst_start_row, *src_row_count, *dst_start_col, *src_col_count)
            ),
            point(
                rows.view_of(Side::Old, *src_start_row),
                cols.view_of(Side::Old, *src_start_col),
            ),
        ),
        DiffOp::RectReplaced {
            start_row,
            row_count,
            start_col,
            col_count,
            ..
        } => (
            format!(
                "Range {} replaced",
                span_address(*start_row, *row_count, *start_col, *col_count)
            ),
            point(
                rows.view_of(Side::New, *start_row),
                cols.view_of(Side::New, *start_col),
            ),
        ),
        DiffOp::SheetAdded { .. } => ("Sheet added".to_string(), None),
        DiffOp::SheetRemoved { .. } => ("Sheet removed".to_string(), None),
        DiffOp::SheetRenamed { from, .. } => (
            format!("Sheet renamed from {}", report.resolve(from)),
            None,
        ),
        DiffOp::DuplicateKeyCluster {
            left_rows,
            right_rows,
            ..
        } => (
            format!(
                "Duplicate key rows ({} old, {} new)",
                left_rows.len(),
                right_rows.len()
            ),
            None,
        ),
        _ => (generic_label(report, op), None),
    }
}

pub fn build_sheet_view_model<'a>(inputs: SheetInputs<'a>, options: &ViewOptions) -> SheetViewModel<'a> {
    let dims = SheetDims::new(inputs.old_sheet, inputs.new_sheet);
    let (row_entries, col_entries) = inputs
        .alignment
        .map(|a| (a.rows.as_slice(), a.cols.as_slice()))
        .unwrap_or_default();
    let rows = AxisProjection::new(row_entries, dims.old_rows, dims.new_rows);
    let cols = AxisProjection::new(col_entries, dims.old_cols, dims.new_cols);

    let edits = EditIndex::build(
        inputs.report,
        &inputs.ops,
        &rows,
        &cols,
        options.ignore_blank_to_blank,
    );
    let regions = build_regions(&inputs.ops, &edits, &rows, &cols, options);

    let mut items = axis_change_items(&inputs.ops, &rows, &cols);
    items.extend(move_items(inputs.alignment, &inputs.ops));
    items.extend(region_items(&regions));
    items.extend(other_items(inputs.report, &inputs.ops));

    let status = render_status(&inputs, &rows, &cols);
    let can_grid = status.is_renderable() && !rows.is_empty() && !cols.is_empty();
    let anchors = build_anchors(&inputs.name, can_grid, &items, &regions, &rows, &cols);
    attach_nav_targets(&mut items, &anchors);
    let moves = move_table(&items);

    let mut op_rows = Vec::with_capacity(inputs.ops.len());
    let mut severity_counts = SeverityCounts::default();
    let mut counts = ChangeCounts::default();
    let mut categories = Vec::new();
    for op in &inputs.ops {
        let class = classify(op.op);
        severity_counts.add(class.severity);
        counts.add(class.change_type);
        if !categories.contains(&class.category) {
            categories.push(class.category);
        }
        let (label, view) = describe_op(inputs.report, op.op, &rows, &cols);
        op_rows.push(OpRow {
            index: op.index,
            kind: op.op.kind().to_string(),
            category: class.category,
            severity: class.severity,
            change_type: class.change_type,
            noise_class: class.noise_class,
            label,
            view,
        });
    }
    categories.sort();

    let hunks = if status.is_renderable() {
        aligned_hunks(&regions)
    } else {
        let derived;
        let rects = match inputs.interest_rects {
            Some(rects) => rects,
            None => {
                derived = derive_interest_rects(&inputs.ops, dims, options.preview_rows, options.preview_cols);
                derived.as_slice()
            }
        };
        raw_hunks(
            rects,
            dims,
            options.context_rows,
            options.context_cols,
            options.max_visual_cells,
        )
    };

    let regions_to_render = if status.is_renderable() {
        regions.iter().map(|region| region.id.clone()).collect()
    } else {
        Vec::new()
    };

    log::debug!(
        "sheet {:?}: status={:?} ops={} edits={} regions={} anchors={} hunks={}",
        inputs.name,
        status.kind,
        inputs.ops.len(),
        edits.len(),
        regions.len(),
        anchors.len(),
        hunks.len()
    );

    SheetViewModel {
        name: inputs.name,
        old_name: inputs.old_name,
        axis: SheetAxes { rows, cols },
        changes: SheetChanges {
            items,
            regions,
            anchors,
            moves,
        },
        ops: op_rows,
        hunks,
        render_plan: RenderPlan {
            regions_to_render,
            status,
            context_rows: options.context_rows,
            context_cols: options.context_cols,
            max_visual_cells: options.max_visual_cells,
        },
        op_count: inputs.ops.len() as u64,
        severity: severity_counts.max(),
        severity_counts,
        counts,
        categories,
        old_sheet: inputs.old_sheet,
        new_sheet: inputs.new_sheet,
        edits,
        cell_index: OnceCell::new(),
    }
}

mod addressing;
mod analysis;
mod anchors;
mod axis;
mod cells;
mod changes;
mod classify;
mod edits;
mod error;
mod hunks;
mod moves;
mod op;
mod options;
mod payload;
mod ranges;
mod regions;
mod sheet;
mod workbook;

pub use addressing::{cell_address, column_label, parse_cell_address, range_address};
pub use analysis::{
    ArtifactRank, CategoryBreakdownRow, CategoryCounts, ChangeCounts, DiffAnalysis, SheetBreakdown,
    SeverityCounts,
};
pub use anchors::{list_element_id, Anchor, AnchorTarget};
pub use axis::{AxisProjection, Side};
pub use cells::{CellDisplay, CellSide, CellViewModel, DiffKind, MoveRole};
pub use changes::{Axis, ChangeGroup, ChangeItem, ChangeType, ItemLocator, NavTarget};
pub use classify::{classify, is_filtered, OpCategory, OpClass, OpNoiseClass, OpSeverity};
pub use edits::{EditIndex, EditRecord};
pub use error::{OptionsError, ViewModelError, OPTIONS_INVALID, OUTPUT_SERIALIZE, PAYLOAD_INVALID};
pub use hunks::{Hunk, HunkKind};
pub use moves::MoveEndpoints;
pub use op::{
    CellAddress, CellSnapshot, CellValue, DiffOp, ExpressionChangeKind, FormulaDiff, OpValue,
    Operation, QueryChangeKind, QueryMetadataField, StringRef, UnrecognizedOp,
};
pub use options::{NoiseFilters, ViewOptions, ViewOptionsBuilder};
pub use payload::{
    AxisEntry, AxisKind, DiffPayload, DiffReport, InterestRect, MoveGroup, RectSide,
    SheetAlignment, SheetCell, SheetInterestRects, SheetPairSnapshot, SheetSnapshot,
    WorkbookSnapshot,
};
pub use regions::{Bounds, Region, RegionKind};
pub use sheet::{
    OpRow, RenderPlan, RenderStatus, SheetAxes, SheetChanges, SheetViewModel, StatusKind, ViewPoint,
};
pub use workbook::{OtherArtifacts, OtherItem, WorkbookViewModel, WorkbookViewModelBuilder};

/// Build the full workbook view model. Never fails once the payload is parsed.
pub fn build_workbook_view_model<'a>(
    payload: &'a DiffPayload,
    options: &'a ViewOptions,
) -> WorkbookViewModel<'a> {
    WorkbookViewModelBuilder::new(payload, options).build()
}

/// JSON in, JSON out. `options_json` may be omitted or partial; missing fields
/// take their defaults.
pub fn build_workbook_view_model_from_json(
    payload_json: &str,
    options_json: Option<&str>,
) -> Result<String, ViewModelError> {
    let payload = DiffPayload::from_json_str(payload_json)?;
    let options = match options_json {
        Some(json) => ViewOptions::from_json_str(json)?,
        None => ViewOptions::default(),
    };
    let view_model = build_workbook_view_model(&payload, &options);
    serde_json::to_string(&view_model).map_err(ViewModelError::Output)
}

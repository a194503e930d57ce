//! Input contract: report, sheet snapshots, alignments and interest rectangles.

use serde::{Deserialize, Serialize};

use crate::error::ViewModelError;
use crate::op::{Operation, StringRef};

pub const UNKNOWN_STRING: &str = "<unknown>";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub strings: Vec<String>,
    #[serde(default)]
    pub ops: Vec<Operation>,
    #[serde(default = "default_complete")]
    pub complete: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
}

fn default_complete() -> bool {
    true
}

impl Default for DiffReport {
    fn default() -> Self {
        Self {
            version: None,
            strings: Vec::new(),
            ops: Vec::new(),
            complete: true,
            warnings: Vec::new(),
        }
    }
}

impl DiffReport {
    pub fn new(strings: Vec<String>, ops: Vec<Operation>) -> Self {
        Self {
            strings,
            ops,
            ..Self::default()
        }
    }

    /// Resolve a string reference. Ids outside the table render as `<unknown>`.
    pub fn resolve<'a>(&'a self, value: &'a StringRef) -> &'a str {
        match value {
            StringRef::Id(id) => self
                .strings
                .get(*id as usize)
                .map(String::as_str)
                .unwrap_or(UNKNOWN_STRING),
            StringRef::Literal(text) => text,
        }
    }

    pub fn resolve_opt<'a>(&'a self, value: Option<&'a StringRef>) -> Option<&'a str> {
        value.map(|value| self.resolve(value))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetCell {
    pub row: u32,
    pub col: u32,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub formula: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSnapshot {
    pub name: String,
    #[serde(default)]
    pub nrows: u32,
    #[serde(default)]
    pub ncols: u32,
    #[serde(default)]
    pub cells: Vec<SheetCell>,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_cells: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_non_empty_cells: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SheetSnapshot {
    pub fn is_empty(&self) -> bool {
        self.nrows == 0 || self.ncols == 0
    }
}

/// Snapshot list for one side. Accepts `{ "sheets": [...] }` or a bare array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WorkbookSnapshotRepr")]
pub struct WorkbookSnapshot {
    pub sheets: Vec<SheetSnapshot>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WorkbookSnapshotRepr {
    Bare(Vec<SheetSnapshot>),
    Listed {
        #[serde(default)]
        sheets: Vec<SheetSnapshot>,
    },
}

impl From<WorkbookSnapshotRepr> for WorkbookSnapshot {
    fn from(repr: WorkbookSnapshotRepr) -> Self {
        match repr {
            WorkbookSnapshotRepr::Bare(sheets) | WorkbookSnapshotRepr::Listed { sheets } => {
                WorkbookSnapshot { sheets }
            }
        }
    }
}

impl WorkbookSnapshot {
    pub fn find(&self, name: &str) -> Option<&SheetSnapshot> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetPairSnapshot {
    #[serde(default)]
    pub old: WorkbookSnapshot,
    #[serde(default)]
    pub new: WorkbookSnapshot,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisKind {
    #[default]
    Match,
    Insert,
    Delete,
    MoveSrc,
    MoveDst,
}

/// One view index on an axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisEntry {
    #[serde(default)]
    pub old: Option<u32>,
    #[serde(default)]
    pub new: Option<u32>,
    #[serde(default)]
    pub kind: AxisKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_id: Option<String>,
}

/// A block move recorded by the aligner. `axis` is `"row"` or `"col"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveGroup {
    pub id: String,
    #[serde(default)]
    pub axis: String,
    #[serde(default)]
    pub src_start: u32,
    #[serde(default)]
    pub dst_start: u32,
    #[serde(default)]
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetAlignment {
    #[serde(default)]
    pub sheet: String,
    #[serde(default)]
    pub rows: Vec<AxisEntry>,
    #[serde(default)]
    pub cols: Vec<AxisEntry>,
    #[serde(default)]
    pub moves: Vec<MoveGroup>,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RectSide {
    Old,
    New,
    #[default]
    Both,
}

/// A coarse area of interest in raw (unaligned) coordinates, inclusive bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestRect {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub side: RectSide,
    #[serde(alias = "row_start")]
    pub row_start: u32,
    #[serde(alias = "row_end")]
    pub row_end: u32,
    #[serde(alias = "col_start")]
    pub col_start: u32,
    #[serde(alias = "col_end")]
    pub col_end: u32,
    #[serde(default, alias = "move_id", skip_serializing_if = "Option::is_none")]
    pub move_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetInterestRects {
    pub sheet: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rects: Vec<InterestRect>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffPayload {
    #[serde(default)]
    pub report: DiffReport,
    #[serde(default)]
    pub sheets: SheetPairSnapshot,
    #[serde(default)]
    pub alignments: Vec<SheetAlignment>,
    #[serde(default, alias = "interestRects", skip_serializing_if = "Vec::is_empty")]
    pub interest_rects: Vec<SheetInterestRects>,
}

impl DiffPayload {
    /// Parse a full payload, or a bare report (an object without a `report` key).
    pub fn from_json_str(json: &str) -> Result<Self, ViewModelError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(ViewModelError::Payload)?;
        let has_report = value.get("report").is_some_and(|report| !report.is_null());
        if has_report {
            serde_json::from_value(value).map_err(ViewModelError::Payload)
        } else {
            let report = serde_json::from_value(value).map_err(ViewModelError::Payload)?;
            Ok(DiffPayload {
                report,
                ..DiffPayload::default()
            })
        }
    }

    pub fn alignment(&self, sheet: &str) -> Option<&SheetAlignment> {
        self.alignments.iter().find(|alignment| alignment.sheet == sheet)
    }

    pub fn interest_rects_for(&self, sheet: &str) -> Option<&[InterestRect]> {
        self.interest_rects
            .iter()
            .find(|entry| entry.sheet == sheet)
            .map(|entry| entry.rects.as_slice())
    }
}

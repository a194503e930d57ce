//! Diff operations as emitted by the comparison engine.
//!
//! Operations arrive as JSON objects tagged by `kind`. Known kinds decode into
//! [`DiffOp`]; anything else (new kinds, or known kinds with fields we cannot
//! read) is kept as an [`UnrecognizedOp`] so it can still be counted and listed.

use serde::{Deserialize, Serialize};

use crate::addressing::parse_cell_address;

/// A string-table id or an inline literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringRef {
    Id(u32),
    Literal(String),
}

impl From<u32> for StringRef {
    fn from(id: u32) -> Self {
        StringRef::Id(id)
    }
}

impl From<&str> for StringRef {
    fn from(text: &str) -> Self {
        StringRef::Literal(text.to_string())
    }
}

/// Cell location, either `"B7"` or `{ "row": 6, "col": 1 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellAddress {
    Index { row: u32, col: u32 },
    A1(String),
}

impl CellAddress {
    /// Zero-based (row, col), or `None` if the A1 text is malformed.
    pub fn indices(&self) -> Option<(u32, u32)> {
        match self {
            CellAddress::Index { row, col } => Some((*row, *col)),
            CellAddress::A1(text) => parse_cell_address(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Blank,
    Number(f64),
    Text(StringRef),
    Bool(bool),
    Error(StringRef),
}

/// A cell value inside an op snapshot. Producers that emit plain JSON scalars
/// instead of typed values land in `Raw`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpValue {
    Typed(CellValue),
    Raw(serde_json::Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<CellAddress>,
    #[serde(default)]
    pub value: Option<OpValue>,
    #[serde(default)]
    pub formula: Option<StringRef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaDiff {
    /// Not computed by the producer.
    #[default]
    Unknown,
    Unchanged,
    Added,
    Removed,
    /// Whitespace or casing only.
    FormattingOnly,
    /// Filled down/across (shift-equivalent).
    Filled,
    SemanticChange,
    TextChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryChangeKind {
    #[serde(alias = "Semantic")]
    Semantic,
    #[serde(alias = "FormattingOnly")]
    FormattingOnly,
    #[serde(alias = "Renamed")]
    Renamed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionChangeKind {
    #[serde(alias = "Semantic")]
    Semantic,
    #[serde(alias = "FormattingOnly")]
    FormattingOnly,
    #[default]
    #[serde(alias = "Unknown")]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryMetadataField {
    #[serde(alias = "load_to_sheet")]
    LoadToSheet,
    #[serde(alias = "load_to_model")]
    LoadToModel,
    #[serde(alias = "group_path")]
    GroupPath,
    #[serde(alias = "connection_only")]
    ConnectionOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelColumnProperty {
    Hidden,
    FormatString,
    SortBy,
    SummarizeBy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipProperty {
    CrossFilteringBehavior,
    Cardinality,
    IsActive,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySemanticDetail {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub step_diffs: Vec<serde_json::Value>,
}

/// A single logical change between two workbooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DiffOp {
    SheetAdded {
        sheet: StringRef,
    },
    SheetRemoved {
        sheet: StringRef,
    },
    /// `sheet` is the new name, `from` the old one.
    SheetRenamed {
        sheet: StringRef,
        from: StringRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<StringRef>,
    },
    RowAdded {
        sheet: StringRef,
        row_idx: u32,
    },
    RowRemoved {
        sheet: StringRef,
        row_idx: u32,
    },
    RowReplaced {
        sheet: StringRef,
        row_idx: u32,
    },
    /// Rows sharing a key on either side that could not be paired one-to-one.
    DuplicateKeyCluster {
        sheet: StringRef,
        #[serde(default)]
        key: Vec<serde_json::Value>,
        #[serde(default)]
        left_rows: Vec<u32>,
        #[serde(default)]
        right_rows: Vec<u32>,
    },
    ColumnAdded {
        sheet: StringRef,
        col_idx: u32,
    },
    ColumnRemoved {
        sheet: StringRef,
        col_idx: u32,
    },
    BlockMovedRows {
        sheet: StringRef,
        src_start_row: u32,
        row_count: u32,
        dst_start_row: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_hash: Option<u64>,
    },
    BlockMovedColumns {
        sheet: StringRef,
        src_start_col: u32,
        col_count: u32,
        dst_start_col: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_hash: Option<u64>,
    },
    BlockMovedRect {
        sheet: StringRef,
        src_start_row: u32,
        src_row_count: u32,
        src_start_col: u32,
        src_col_count: u32,
        dst_start_row: u32,
        dst_start_col: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_hash: Option<u64>,
    },
    RectReplaced {
        sheet: StringRef,
        start_row: u32,
        row_count: u32,
        start_col: u32,
        col_count: u32,
    },
    /// `addr` is in new-sheet coordinates.
    CellEdited {
        sheet: StringRef,
        addr: CellAddress,
        #[serde(default)]
        from: CellSnapshot,
        #[serde(default)]
        to: CellSnapshot,
        #[serde(default)]
        formula_diff: FormulaDiff,
    },

    VbaModuleAdded {
        name: StringRef,
    },
    VbaModuleRemoved {
        name: StringRef,
    },
    VbaModuleChanged {
        name: StringRef,
    },

    NamedRangeAdded {
        name: StringRef,
    },
    NamedRangeRemoved {
        name: StringRef,
    },
    NamedRangeChanged {
        name: StringRef,
        #[serde(default)]
        old_ref: Option<StringRef>,
        #[serde(default)]
        new_ref: Option<StringRef>,
    },

    ChartAdded {
        #[serde(default)]
        sheet: Option<StringRef>,
        name: StringRef,
    },
    ChartRemoved {
        #[serde(default)]
        sheet: Option<StringRef>,
        name: StringRef,
    },
    ChartChanged {
        #[serde(default)]
        sheet: Option<StringRef>,
        name: StringRef,
    },

    QueryAdded {
        name: StringRef,
    },
    QueryRemoved {
        name: StringRef,
    },
    QueryRenamed {
        from: StringRef,
        to: StringRef,
    },
    QueryDefinitionChanged {
        name: StringRef,
        change_kind: QueryChangeKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_hash: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_hash: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        semantic_detail: Option<QuerySemanticDetail>,
    },
    QueryMetadataChanged {
        name: StringRef,
        field: QueryMetadataField,
        #[serde(default)]
        old: Option<StringRef>,
        #[serde(default)]
        new: Option<StringRef>,
    },

    TableAdded {
        name: StringRef,
    },
    TableRemoved {
        name: StringRef,
    },
    ModelColumnAdded {
        table: StringRef,
        name: StringRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data_type: Option<StringRef>,
    },
    ModelColumnRemoved {
        table: StringRef,
        name: StringRef,
    },
    ModelColumnTypeChanged {
        table: StringRef,
        name: StringRef,
        #[serde(default)]
        old_type: Option<StringRef>,
        #[serde(default)]
        new_type: Option<StringRef>,
    },
    ModelColumnPropertyChanged {
        table: StringRef,
        name: StringRef,
        field: ModelColumnProperty,
        #[serde(default)]
        old: Option<StringRef>,
        #[serde(default)]
        new: Option<StringRef>,
    },
    CalculatedColumnDefinitionChanged {
        table: StringRef,
        name: StringRef,
        #[serde(default)]
        change_kind: ExpressionChangeKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_hash: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_hash: Option<u64>,
    },
    RelationshipAdded {
        from_table: StringRef,
        from_column: StringRef,
        to_table: StringRef,
        to_column: StringRef,
    },
    RelationshipRemoved {
        from_table: StringRef,
        from_column: StringRef,
        to_table: StringRef,
        to_column: StringRef,
    },
    RelationshipPropertyChanged {
        from_table: StringRef,
        from_column: StringRef,
        to_table: StringRef,
        to_column: StringRef,
        field: RelationshipProperty,
        #[serde(default)]
        old: Option<StringRef>,
        #[serde(default)]
        new: Option<StringRef>,
    },
    MeasureAdded {
        name: StringRef,
    },
    MeasureRemoved {
        name: StringRef,
    },
    MeasureDefinitionChanged {
        name: StringRef,
        #[serde(default)]
        change_kind: ExpressionChangeKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_hash: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_hash: Option<u64>,
    },
}

impl DiffOp {
    pub fn kind(&self) -> &'static str {
        match self {
            DiffOp::SheetAdded { .. } => "SheetAdded",
            DiffOp::SheetRemoved { .. } => "SheetRemoved",
            DiffOp::SheetRenamed { .. } => "SheetRenamed",
            DiffOp::RowAdded { .. } => "RowAdded",
            DiffOp::RowRemoved { .. } => "RowRemoved",
            DiffOp::RowReplaced { .. } => "RowReplaced",
            DiffOp::DuplicateKeyCluster { .. } => "DuplicateKeyCluster",
            DiffOp::ColumnAdded { .. } => "ColumnAdded",
            DiffOp::ColumnRemoved { .. } => "ColumnRemoved",
            DiffOp::BlockMovedRows { .. } => "BlockMovedRows",
            DiffOp::BlockMovedColumns { .. } => "BlockMovedColumns",
            DiffOp::BlockMovedRect { .. } => "BlockMovedRect",
            DiffOp::RectReplaced { .. } => "RectReplaced",
            DiffOp::CellEdited { .. } => "CellEdited",
            DiffOp::VbaModuleAdded { .. } => "VbaModuleAdded",
            DiffOp::VbaModuleRemoved { .. } => "VbaModuleRemoved",
            DiffOp::VbaModuleChanged { .. } => "VbaModuleChanged",
            DiffOp::NamedRangeAdded { .. } => "NamedRangeAdded",
            DiffOp::NamedRangeRemoved { .. } => "NamedRangeRemoved",
            DiffOp::NamedRangeChanged { .. } => "NamedRangeChanged",
            DiffOp::ChartAdded { .. } => "ChartAdded",
            DiffOp::ChartRemoved { .. } => "ChartRemoved",
            DiffOp::ChartChanged { .. } => "ChartChanged",
            DiffOp::QueryAdded { .. } => "QueryAdded",
            DiffOp::QueryRemoved { .. } => "QueryRemoved",
            DiffOp::QueryRenamed { .. } => "QueryRenamed",
            DiffOp::QueryDefinitionChanged { .. } => "QueryDefinitionChanged",
            DiffOp::QueryMetadataChanged { .. } => "QueryMetadataChanged",
            DiffOp::TableAdded { .. } => "TableAdded",
            DiffOp::TableRemoved { .. } => "TableRemoved",
            DiffOp::ModelColumnAdded { .. } => "ModelColumnAdded",
            DiffOp::ModelColumnRemoved { .. } => "ModelColumnRemoved",
            DiffOp::ModelColumnTypeChanged { .. } => "ModelColumnTypeChanged",
            DiffOp::ModelColumnPropertyChanged { .. } => "ModelColumnPropertyChanged",
            DiffOp::CalculatedColumnDefinitionChanged { .. } => {
                "CalculatedColumnDefinitionChanged"
            }
            DiffOp::RelationshipAdded { .. } => "RelationshipAdded",
            DiffOp::RelationshipRemoved { .. } => "RelationshipRemoved",
            DiffOp::RelationshipPropertyChanged { .. } => "RelationshipPropertyChanged",
            DiffOp::MeasureAdded { .. } => "MeasureAdded",
            DiffOp::MeasureRemoved { .. } => "MeasureRemoved",
            DiffOp::MeasureDefinitionChanged { .. } => "MeasureDefinitionChanged",
        }
    }

    /// The sheet a grid-scoped op belongs to. Charts carry a sheet too but are
    /// reported with workbook objects, so they return `None` here.
    pub fn sheet(&self) -> Option<&StringRef> {
        match self {
            DiffOp::SheetAdded { sheet }
            | DiffOp::SheetRemoved { sheet }
            | DiffOp::SheetRenamed { sheet, .. }
            | DiffOp::RowAdded { sheet, .. }
            | DiffOp::RowRemoved { sheet, .. }
            | DiffOp::RowReplaced { sheet, .. }
            | DiffOp::DuplicateKeyCluster { sheet, .. }
            | DiffOp::ColumnAdded { sheet, .. }
            | DiffOp::ColumnRemoved { sheet, .. }
            | DiffOp::BlockMovedRows { sheet, .. }
            | DiffOp::BlockMovedColumns { sheet, .. }
            | DiffOp::BlockMovedRect { sheet, .. }
            | DiffOp::RectReplaced { sheet, .. }
            | DiffOp::CellEdited { sheet, .. } => Some(sheet),
            _ => None,
        }
    }
}

/// An op whose `kind` or fields did not match any [`DiffOp`] variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnrecognizedOp {
    #[serde(default)]
    pub kind: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl UnrecognizedOp {
    fn string_field(&self, key: &str) -> Option<StringRef> {
        match self.fields.get(key)? {
            serde_json::Value::Number(n) => n
                .as_u64()
                .and_then(|id| u32::try_from(id).ok())
                .map(StringRef::Id),
            serde_json::Value::String(s) => Some(StringRef::Literal(s.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operation {
    Diff(DiffOp),
    Unrecognized(UnrecognizedOp),
}

impl Operation {
    pub fn kind(&self) -> &str {
        match self {
            Operation::Diff(op) => op.kind(),
            Operation::Unrecognized(op) => &op.kind,
        }
    }

    pub fn as_diff(&self) -> Option<&DiffOp> {
        match self {
            Operation::Diff(op) => Some(op),
            Operation::Unrecognized(_) => None,
        }
    }

    /// Sheet routing. Unrecognized ops are routed by a `sheet` field when present.
    pub fn sheet(&self) -> Option<StringRef> {
        match self {
            Operation::Diff(op) => op.sheet().cloned(),
            Operation::Unrecognized(op) => op.string_field("sheet"),
        }
    }

    /// Best-effort `name` for list labels.
    pub fn name(&self) -> Option<StringRef> {
        match self {
            Operation::Diff(
                DiffOp::VbaModuleAdded { name }
                | DiffOp::VbaModuleRemoved { name }
                | DiffOp::VbaModuleChanged { name }
                | DiffOp::NamedRangeAdded { name }
                | DiffOp::NamedRangeRemoved { name }
                | DiffOp::NamedRangeChanged { name, .. }
                | DiffOp::ChartAdded { name, .. }
                | DiffOp::ChartRemoved { name, .. }
                | DiffOp::ChartChanged { name, .. }
                | DiffOp::QueryAdded { name }
                | DiffOp::QueryRemoved { name }
                | DiffOp::QueryDefinitionChanged { name, .. }
                | DiffOp::QueryMetadataChanged { name, .. }
                | DiffOp::TableAdded { name }
                | DiffOp::TableRemoved { name }
                | DiffOp::ModelColumnAdded { name, .. }
                | DiffOp::ModelColumnRemoved { name, .. }
                | DiffOp::ModelColumnTypeChanged { name, .. }
                | DiffOp::ModelColumnPropertyChanged { name, .. }
                | DiffOp::CalculatedColumnDefinitionChanged { name, .. }
                | DiffOp::MeasureAdded { name }
                | DiffOp::MeasureRemoved { name }
                | DiffOp::MeasureDefinitionChanged { name, .. },
            ) => Some(name.clone()),
            Operation::Diff(DiffOp::QueryRenamed { to, .. }) => Some(to.clone()),
            Operation::Diff(_) => None,
            Operation::Unrecognized(op) => op.string_field("name"),
        }
    }
}

impl From<DiffOp> for Operation {
    fn from(op: DiffOp) -> Self {
        Operation::Diff(op)
    }
}

/// An op together with its position in `report.ops`.
#[derive(Debug, Clone, Copy)]
pub struct OpRef<'a> {
    pub index: usize,
    pub op: &'a Operation,
}

impl<'a> OpRef<'a> {
    pub fn diff(&self) -> Option<&'a DiffOp> {
        self.op.as_diff()
    }
}

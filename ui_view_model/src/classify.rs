//! Category, severity, change type and noise class for each op.

use serde::{Deserialize, Serialize};

use crate::changes::ChangeType;
use crate::op::{
    DiffOp, ExpressionChangeKind, FormulaDiff, Operation, QueryChangeKind, QueryMetadataField,
};
use crate::options::NoiseFilters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpCategory {
    Grid,
    PowerQuery,
    Model,
    Objects,
    Other,
}

/// Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpNoiseClass {
    Unknown,
    FormattingOnly,
    RenameOnly,
    Structural,
    Move,
    ValueChange,
    FormulaChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpClass {
    pub category: OpCategory,
    pub severity: OpSeverity,
    pub change_type: ChangeType,
    pub noise_class: OpNoiseClass,
}

pub fn classify(op: &Operation) -> OpClass {
    match op {
        Operation::Diff(op) => OpClass {
            category: category(op),
            severity: severity(op),
            change_type: change_type(op),
            noise_class: noise_class(op),
        },
        Operation::Unrecognized(op) => OpClass {
            category: category_for_kind(&op.kind),
            severity: OpSeverity::Medium,
            change_type: change_type_for_kind(&op.kind),
            noise_class: OpNoiseClass::Unknown,
        },
    }
}

/// Prefix table used for kinds we cannot decode.
const KIND_PREFIXES: &[(&str, OpCategory)] = &[
    ("Query", OpCategory::PowerQuery),
    ("Table", OpCategory::Model),
    ("ModelColumn", OpCategory::Model),
    ("CalculatedColumn", OpCategory::Model),
    ("Relationship", OpCategory::Model),
    ("Measure", OpCategory::Model),
    ("Chart", OpCategory::Objects),
    ("NamedRange", OpCategory::Objects),
    ("Vba", OpCategory::Objects),
    ("Sheet", OpCategory::Grid),
    ("Row", OpCategory::Grid),
    ("Column", OpCategory::Grid),
    ("Cell", OpCategory::Grid),
    ("Block", OpCategory::Grid),
    ("Rect", OpCategory::Grid),
    ("DuplicateKey", OpCategory::Grid),
];

pub fn category_for_kind(kind: &str) -> OpCategory {
    KIND_PREFIXES
        .iter()
        .find(|(prefix, _)| kind.starts_with(prefix))
        .map(|(_, category)| *category)
        .unwrap_or(OpCategory::Other)
}

pub fn change_type_for_kind(kind: &str) -> ChangeType {
    if kind.contains("Added") {
        ChangeType::Added
    } else if kind.contains("Removed") {
        ChangeType::Removed
    } else if kind.contains("Moved") {
        ChangeType::Moved
    } else {
        ChangeType::Modified
    }
}

pub fn category(op: &DiffOp) -> OpCategory {
    match op {
        DiffOp::SheetAdded { .. }
        | DiffOp::SheetRemoved { .. }
        | DiffOp::SheetRenamed { .. }
        | DiffOp::RowAdded { .. }
        | DiffOp::RowRemoved { .. }
        | DiffOp::RowReplaced { .. }
        | DiffOp::DuplicateKeyCluster { .. }
        | DiffOp::ColumnAdded { .. }
        | DiffOp::ColumnRemoved { .. }
        | DiffOp::BlockMovedRows { .. }
        | DiffOp::BlockMovedColumns { .. }
        | DiffOp::BlockMovedRect { .. }
        | DiffOp::RectReplaced { .. }
        | DiffOp::CellEdited { .. } => OpCategory::Grid,
        DiffOp::VbaModuleAdded { .. }
        | DiffOp::VbaModuleRemoved { .. }
        | DiffOp::VbaModuleChanged { .. }
        | DiffOp::NamedRangeAdded { .. }
        | DiffOp::NamedRangeRemoved { .. }
        | DiffOp::NamedRangeChanged { .. }
        | DiffOp::ChartAdded { .. }
        | DiffOp::ChartRemoved { .. }
        | DiffOp::ChartChanged { .. } => OpCategory::Objects,
        DiffOp::QueryAdded { .. }
        | DiffOp::QueryRemoved { .. }
        | DiffOp::QueryRenamed { .. }
        | DiffOp::QueryDefinitionChanged { .. }
        | DiffOp::QueryMetadataChanged { .. } => OpCategory::PowerQuery,
        DiffOp::TableAdded { .. }
        | DiffOp::TableRemoved { .. }
        | DiffOp::ModelColumnAdded { .. }
        | DiffOp::ModelColumnRemoved { .. }
        | DiffOp::ModelColumnTypeChanged { .. }
        | DiffOp::ModelColumnPropertyChanged { .. }
        | DiffOp::CalculatedColumnDefinitionChanged { .. }
        | DiffOp::RelationshipAdded { .. }
        | DiffOp::RelationshipRemoved { .. }
        | DiffOp::RelationshipPropertyChanged { .. }
        | DiffOp::MeasureAdded { .. }
        | DiffOp::MeasureRemoved { .. }
        | DiffOp::MeasureDefinitionChanged { .. } => OpCategory::Model,
    }
}

fn expression_severity(kind: ExpressionChangeKind) -> OpSeverity {
    match kind {
        ExpressionChangeKind::Semantic => OpSeverity::High,
        ExpressionChangeKind::FormattingOnly => OpSeverity::Low,
        ExpressionChangeKind::Unknown => OpSeverity::Medium,
    }
}

pub fn severity(op: &DiffOp) -> OpSeverity {
    match op {
        DiffOp::DuplicateKeyCluster { .. }
        | DiffOp::SheetAdded { .. }
        | DiffOp::SheetRemoved { .. }
        | DiffOp::QueryAdded { .. }
        | DiffOp::QueryRemoved { .. }
        | DiffOp::TableAdded { .. }
        | DiffOp::TableRemoved { .. }
        | DiffOp::MeasureAdded { .. }
        | DiffOp::MeasureRemoved { .. }
        | DiffOp::ModelColumnAdded { .. }
        | DiffOp::ModelColumnRemoved { .. }
        | DiffOp::ModelColumnTypeChanged { .. }
        | DiffOp::RelationshipAdded { .. }
        | DiffOp::RelationshipRemoved { .. }
        | DiffOp::RelationshipPropertyChanged { .. } => OpSeverity::High,

        DiffOp::QueryDefinitionChanged { change_kind, .. } => match change_kind {
            QueryChangeKind::Semantic => OpSeverity::High,
            QueryChangeKind::FormattingOnly | QueryChangeKind::Renamed => OpSeverity::Low,
        },
        DiffOp::MeasureDefinitionChanged { change_kind, .. }
        | DiffOp::CalculatedColumnDefinitionChanged { change_kind, .. } => {
            expression_severity(*change_kind)
        }
        DiffOp::CellEdited { formula_diff, .. } => match formula_diff {
            FormulaDiff::SemanticChange => OpSeverity::High,
            FormulaDiff::FormattingOnly => OpSeverity::Low,
            // Filled and text changes can still be material.
            _ => OpSeverity::Medium,
        },

        DiffOp::SheetRenamed { .. }
        | DiffOp::QueryRenamed { .. }
        | DiffOp::QueryMetadataChanged { .. }
        | DiffOp::ModelColumnPropertyChanged { .. } => OpSeverity::Low,

        DiffOp::RowAdded { .. }
        | DiffOp::RowRemoved { .. }
        | DiffOp::RowReplaced { .. }
        | DiffOp::ColumnAdded { .. }
        | DiffOp::ColumnRemoved { .. }
        | DiffOp::RectReplaced { .. }
        | DiffOp::BlockMovedRows { .. }
        | DiffOp::BlockMovedColumns { .. }
        | DiffOp::BlockMovedRect { .. }
        | DiffOp::VbaModuleAdded { .. }
        | DiffOp::VbaModuleRemoved { .. }
        | DiffOp::VbaModuleChanged { .. }
        | DiffOp::NamedRangeAdded { .. }
        | DiffOp::NamedRangeRemoved { .. }
        | DiffOp::NamedRangeChanged { .. }
        | DiffOp::ChartAdded { .. }
        | DiffOp::ChartRemoved { .. }
        | DiffOp::ChartChanged { .. } => OpSeverity::Medium,
    }
}

pub fn change_type(op: &DiffOp) -> ChangeType {
    match op {
        DiffOp::SheetAdded { .. }
        | DiffOp::RowAdded { .. }
        | DiffOp::ColumnAdded { .. }
        | DiffOp::VbaModuleAdded { .. }
        | DiffOp::NamedRangeAdded { .. }
        | DiffOp::ChartAdded { .. }
        | DiffOp::QueryAdded { .. }
        | DiffOp::TableAdded { .. }
        | DiffOp::ModelColumnAdded { .. }
        | DiffOp::RelationshipAdded { .. }
        | DiffOp::MeasureAdded { .. }
        | DiffOp::QueryMetadataChanged {
            field: QueryMetadataField::LoadToSheet,
            ..
        } => ChangeType::Added,
        DiffOp::SheetRemoved { .. }
        | DiffOp::RowRemoved { .. }
        | DiffOp::ColumnRemoved { .. }
        | DiffOp::VbaModuleRemoved { .. }
        | DiffOp::NamedRangeRemoved { .. }
        | DiffOp::ChartRemoved { .. }
        | DiffOp::QueryRemoved { .. }
        | DiffOp::TableRemoved { .. }
        | DiffOp::ModelColumnRemoved { .. }
        | DiffOp::RelationshipRemoved { .. }
        | DiffOp::MeasureRemoved { .. } => ChangeType::Removed,
        DiffOp::BlockMovedRows { .. }
        | DiffOp::BlockMovedColumns { .. }
        | DiffOp::BlockMovedRect { .. } => ChangeType::Moved,
        _ => ChangeType::Modified,
    }
}

pub fn noise_class(op: &DiffOp) -> OpNoiseClass {
    match op {
        DiffOp::CellEdited { formula_diff, .. } => match formula_diff {
            FormulaDiff::FormattingOnly => OpNoiseClass::FormattingOnly,
            FormulaDiff::Unknown | FormulaDiff::Unchanged => OpNoiseClass::ValueChange,
            _ => OpNoiseClass::FormulaChange,
        },
        DiffOp::QueryDefinitionChanged { change_kind, .. } => match change_kind {
            QueryChangeKind::Semantic => OpNoiseClass::FormulaChange,
            QueryChangeKind::FormattingOnly => OpNoiseClass::FormattingOnly,
            QueryChangeKind::Renamed => OpNoiseClass::RenameOnly,
        },
        DiffOp::MeasureDefinitionChanged { change_kind, .. }
        | DiffOp::CalculatedColumnDefinitionChanged { change_kind, .. } => match change_kind {
            ExpressionChangeKind::Semantic => OpNoiseClass::FormulaChange,
            ExpressionChangeKind::FormattingOnly => OpNoiseClass::FormattingOnly,
            ExpressionChangeKind::Unknown => OpNoiseClass::Unknown,
        },
        DiffOp::SheetRenamed { .. } | DiffOp::QueryRenamed { .. } => OpNoiseClass::RenameOnly,
        DiffOp::BlockMovedRows { .. }
        | DiffOp::BlockMovedColumns { .. }
        | DiffOp::BlockMovedRect { .. } => OpNoiseClass::Move,
        DiffOp::SheetAdded { .. }
        | DiffOp::SheetRemoved { .. }
        | DiffOp::RowAdded { .. }
        | DiffOp::RowRemoved { .. }
        | DiffOp::RowReplaced { .. }
        | DiffOp::DuplicateKeyCluster { .. }
        | DiffOp::ColumnAdded { .. }
        | DiffOp::ColumnRemoved { .. }
        | DiffOp::RectReplaced { .. }
        | DiffOp::VbaModuleAdded { .. }
        | DiffOp::VbaModuleRemoved { .. }
        | DiffOp::NamedRangeAdded { .. }
        | DiffOp::NamedRangeRemoved { .. }
        | DiffOp::ChartAdded { .. }
        | DiffOp::ChartRemoved { .. }
        | DiffOp::QueryAdded { .. }
        | DiffOp::QueryRemoved { .. }
        | DiffOp::TableAdded { .. }
        | DiffOp::TableRemoved { .. }
        | DiffOp::ModelColumnAdded { .. }
        | DiffOp::ModelColumnRemoved { .. }
        | DiffOp::ModelColumnTypeChanged { .. }
        | DiffOp::RelationshipAdded { .. }
        | DiffOp::RelationshipRemoved { .. }
        | DiffOp::MeasureAdded { .. }
        | DiffOp::MeasureRemoved { .. } => OpNoiseClass::Structural,
        _ => OpNoiseClass::Unknown,
    }
}

/// True when a noise filter hides this op.
pub fn is_filtered(op: &Operation, filters: NoiseFilters) -> bool {
    let Some(op) = op.as_diff() else {
        return false;
    };
    match op {
        DiffOp::QueryDefinitionChanged {
            change_kind: QueryChangeKind::FormattingOnly,
            ..
        } => filters.hide_m_formatting_only,
        DiffOp::MeasureDefinitionChanged {
            change_kind: ExpressionChangeKind::FormattingOnly,
            ..
        }
        | DiffOp::CalculatedColumnDefinitionChanged {
            change_kind: ExpressionChangeKind::FormattingOnly,
            ..
        } => filters.hide_dax_formatting_only,
        DiffOp::CellEdited {
            formula_diff: FormulaDiff::FormattingOnly,
            ..
        } => filters.hide_formula_formatting_only,
        _ => false,
    }
}

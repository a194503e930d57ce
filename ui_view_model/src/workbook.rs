//! Workbook view model: routes ops to sheets and artifact buckets, builds each
//! sheet, and reduces everything into the workbook analysis.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::analysis::{ArtifactRank, ChangeCounts, DiffAnalysis, OpTally};
use crate::changes::ChangeType;
use crate::classify::{classify, is_filtered, OpCategory, OpSeverity};
use crate::moves::move_id_for_op;
use crate::op::{
    DiffOp, ExpressionChangeKind, ModelColumnProperty, OpRef, Operation, QueryChangeKind,
    QueryMetadataField, RelationshipProperty, StringRef,
};
use crate::options::ViewOptions;
use crate::payload::{DiffPayload, DiffReport};
use crate::sheet::{build_sheet_view_model, SheetInputs, SheetViewModel};

/// A workbook-level change outside any sheet grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherItem {
    pub id: String,
    /// Position in `report.ops`.
    pub index: usize,
    pub kind: String,
    pub change_type: ChangeType,
    pub category: OpCategory,
    pub severity: OpSeverity,
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherArtifacts {
    pub vba: Vec<OtherItem>,
    pub named_ranges: Vec<OtherItem>,
    pub charts: Vec<OtherItem>,
    pub queries: Vec<OtherItem>,
    pub model: Vec<OtherItem>,
    /// Unrecognized ops that carry no sheet.
    pub misc: Vec<OtherItem>,
}

impl OtherArtifacts {
    pub fn iter(&self) -> impl Iterator<Item = &OtherItem> {
        self.vba
            .iter()
            .chain(&self.named_ranges)
            .chain(&self.charts)
            .chain(&self.queries)
            .chain(&self.model)
            .chain(&self.misc)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    fn bucket_mut(&mut self, op: &Operation) -> &mut Vec<OtherItem> {
        let Some(diff) = op.as_diff() else {
            return &mut self.misc;
        };
        match diff {
            DiffOp::VbaModuleAdded { .. }
            | DiffOp::VbaModuleRemoved { .. }
            | DiffOp::VbaModuleChanged { .. } => &mut self.vba,
            DiffOp::NamedRangeAdded { .. }
            | DiffOp::NamedRangeRemoved { .. }
            | DiffOp::NamedRangeChanged { .. } => &mut self.named_ranges,
            DiffOp::ChartAdded { .. } | DiffOp::ChartRemoved { .. } | DiffOp::ChartChanged { .. } => {
                &mut self.charts
            }
            DiffOp::QueryAdded { .. }
            | DiffOp::QueryRemoved { .. }
            | DiffOp::QueryRenamed { .. }
            | DiffOp::QueryDefinitionChanged { .. }
            | DiffOp::QueryMetadataChanged { .. } => &mut self.queries,
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
            | DiffOp::MeasureDefinitionChanged { .. } => &mut self.model,
            _ => &mut self.misc,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookViewModel<'a> {
    pub report: &'a DiffReport,
    pub warnings: Vec<String>,
    pub counts: ChangeCounts,
    pub sheets: Vec<SheetViewModel<'a>>,
    pub other: OtherArtifacts,
    pub analysis: DiffAnalysis,
}

impl<'a> WorkbookViewModel<'a> {
    pub fn sheet(&self, name: &str) -> Option<&SheetViewModel<'a>> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

fn change_kind_text(kind: ExpressionChangeKind) -> &'static str {
    match kind {
        ExpressionChangeKind::Semantic => "Definition changed",
        ExpressionChangeKind::FormattingOnly => "Formatting only",
        ExpressionChangeKind::Unknown => "",
    }
}

fn metadata_field_text(field: QueryMetadataField) -> &'static str {
    match field {
        QueryMetadataField::LoadToSheet => "Load to sheet",
        QueryMetadataField::LoadToModel => "Load to model",
        QueryMetadataField::GroupPath => "Group",
        QueryMetadataField::ConnectionOnly => "Connection only",
    }
}

fn column_property_text(field: ModelColumnProperty) -> &'static str {
    match field {
        ModelColumnProperty::Hidden => "Hidden",
        ModelColumnProperty::FormatString => "Format string",
        ModelColumnProperty::SortBy => "Sort by",
        ModelColumnProperty::SummarizeBy => "Summarize by",
    }
}

fn relationship_property_text(field: RelationshipProperty) -> &'static str {
    match field {
        RelationshipProperty::CrossFilteringBehavior => "Cross filtering",
        RelationshipProperty::Cardinality => "Cardinality",
        RelationshipProperty::IsActive => "Active",
    }
}

/// `"{what}: old -> new"`, or just `"{what} changed"` when either side is absent.
fn value_change(report: &DiffReport, what: &str, old: Option<&StringRef>, new: Option<&StringRef>) -> String {
    match (report.resolve_opt(old), report.resolve_opt(new)) {
        (Some(old), Some(new)) => format!("{what}: {old} -> {new}"),
        _ => format!("{what} changed"),
    }
}

fn artifact_text(report: &DiffReport, op: &Operation) -> (String, String) {
    let Some(diff) = op.as_diff() else {
        let label = match op.name() {
            Some(name) => format!("{}: {}", op.kind(), report.resolve(&name)),
            None => op.kind().to_string(),
        };
        return (label, String::new());
    };
    let r = |value: &StringRef| report.resolve(value).to_string();
    let relationship = |ft: &StringRef, fc: &StringRef, tt: &StringRef, tc: &StringRef| {
        format!(
            "Relationship: {}[{}] -> {}[{}]",
            r(ft),
            r(fc),
            r(tt),
            r(tc)
        )
    };
    match diff {
        DiffOp::VbaModuleAdded { name }
        | DiffOp::VbaModuleRemoved { name }
        | DiffOp::VbaModuleChanged { name } => (format!("VBA Module: {}", r(name)), String::new()),

        DiffOp::NamedRangeAdded { name } | DiffOp::NamedRangeRemoved { name } => {
            (format!("Named Range: {}", r(name)), String::new())
        }
        DiffOp::NamedRangeChanged {
            name,
            old_ref,
            new_ref,
        } => (
            format!("Named Range: {}", r(name)),
            value_change(report, "Refers to", old_ref.as_ref(), new_ref.as_ref()),
        ),

        DiffOp::ChartAdded { name, .. }
        | DiffOp::ChartRemoved { name, .. }
        | DiffOp::ChartChanged { name, .. } => (format!("Chart: {}", r(name)), String::new()),

        DiffOp::QueryAdded { name } | DiffOp::QueryRemoved { name } => {
            (format!("Query: {}", r(name)), String::new())
        }
        DiffOp::QueryRenamed { from, to } => (
            format!("Query: {}", r(to)),
            format!("Renamed from {}", r(from)),
        ),
        DiffOp::QueryDefinitionChanged {
            name,
            change_kind,
            semantic_detail,
            ..
        } => {
            let has_steps = semantic_detail
                .as_ref()
                .is_some_and(|detail| !detail.step_diffs.is_empty());
            let detail = if has_steps {
                "Step diffs"
            } else {
                match change_kind {
                    QueryChangeKind::Semantic => "Definition changed",
                    QueryChangeKind::FormattingOnly => "Formatting only",
                    QueryChangeKind::Renamed => "Renamed",
                }
            };
            (format!("Query: {}", r(name)), detail.to_string())
        }
        DiffOp::QueryMetadataChanged {
            name,
            field,
            old,
            new,
        } => (
            format!("Query: {}", r(name)),
            value_change(report, metadata_field_text(*field), old.as_ref(), new.as_ref()),
        ),

        DiffOp::TableAdded { name } | DiffOp::TableRemoved { name } => {
            (format!("Table: {}", r(name)), String::new())
        }
        DiffOp::ModelColumnAdded {
            table,
            name,
            data_type,
        } => (
            format!("Column: {}[{}]", r(table), r(name)),
            report
                .resolve_opt(data_type.as_ref())
                .map(|ty| format!("Type {ty}"))
                .unwrap_or_default(),
        ),
        DiffOp::ModelColumnRemoved { table, name } => {
            (format!("Column: {}[{}]", r(table), r(name)), String::new())
        }
        DiffOp::ModelColumnTypeChanged {
            table,
            name,
            old_type,
            new_type,
        } => (
            format!("Column: {}[{}]", r(table), r(name)),
            value_change(report, "Type", old_type.as_ref(), new_type.as_ref()),
        ),
        DiffOp::ModelColumnPropertyChanged {
            table,
            name,
            field,
            old,
            new,
        } => (
            format!("Column: {}[{}]", r(table), r(name)),
            value_change(report, column_property_text(*field), old.as_ref(), new.as_ref()),
        ),
        DiffOp::CalculatedColumnDefinitionChanged {
            table,
            name,
            change_kind,
            ..
        } => (
            format!("Column: {}[{}]", r(table), r(name)),
            change_kind_text(*change_kind).to_string(),
        ),

        DiffOp::RelationshipAdded {
            from_table,
            from_column,
            to_table,
            to_column,
        }
        | DiffOp::RelationshipRemoved {
            from_table,
            from_column,
            to_table,
            to_column,
        } => (
            relationship(from_table, from_column, to_table, to_column),
            String::new(),
        ),
        DiffOp::RelationshipPropertyChanged {
            from_table,
            from_column,
            to_table,
            to_column,
            field,
            old,
            new,
        } => (
            relationship(from_table, from_column, to_table, to_column),
            value_change(report, relationship_property_text(*field), old.as_ref(), new.as_ref()),
        ),

        DiffOp::MeasureAdded { name } | DiffOp::MeasureRemoved { name } => {
            (format!("Measure: {}", r(name)), String::new())
        }
        DiffOp::MeasureDefinitionChanged {
            name, change_kind, ..
        } => (
            format!("Measure: {}", r(name)),
            change_kind_text(*change_kind).to_string(),
        ),

        other => (other.kind().to_string(), String::new()),
    }
}

fn other_item(report: &DiffReport, op: OpRef<'_>) -> OtherItem {
    let class = classify(op.op);
    let (label, detail) = artifact_text(report, op.op);
    OtherItem {
        id: format!("{}-{}", op.op.kind(), op.index),
        index: op.index,
        kind: op.op.kind().to_string(),
        change_type: class.change_type,
        category: class.category,
        severity: class.severity,
        label,
        detail,
    }
}

/// Sheets with the highest severity first, then the busiest, then by name.
fn compare_sheets(a: &SheetViewModel<'_>, b: &SheetViewModel<'_>) -> std::cmp::Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| b.op_count.cmp(&a.op_count))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

/// Routes a payload's ops once, then builds sheets on demand or all at once.
#[derive(Debug)]
pub struct WorkbookViewModelBuilder<'a> {
    payload: &'a DiffPayload,
    options: &'a ViewOptions,
    sheet_ops: BTreeMap<String, Vec<OpRef<'a>>>,
    artifact_ops: Vec<OpRef<'a>>,
    /// New sheet name to old sheet name.
    renames: BTreeMap<String, String>,
    tally: OpTally,
}

impl<'a> WorkbookViewModelBuilder<'a> {
    pub fn new(payload: &'a DiffPayload, options: &'a ViewOptions) -> Self {
        let report = &payload.report;
        let filters = options.noise_filters;
        let mut sheet_ops: BTreeMap<String, Vec<OpRef<'a>>> = BTreeMap::new();
        let mut artifact_ops = Vec::new();
        let mut renames = BTreeMap::new();
        let mut seen_moves = BTreeSet::new();
        let mut tally = OpTally::default();

        for (index, op) in report.ops.iter().enumerate() {
            if let Some(DiffOp::SheetRenamed { sheet, from, .. }) = op.as_diff() {
                renames.insert(
                    report.resolve(sheet).to_string(),
                    report.resolve(from).to_string(),
                );
            }

            if is_filtered(op, filters) {
                continue;
            }
            if filters.collapse_moves {
                if let Some(move_id) = op.as_diff().and_then(move_id_for_op) {
                    if !seen_moves.insert(move_id) {
                        continue;
                    }
                }
            }

            tally.add(&classify(op));
            let op_ref = OpRef { index, op };
            match op.sheet() {
                Some(sheet) => sheet_ops
                    .entry(report.resolve(&sheet).to_string())
                    .or_default()
                    .push(op_ref),
                None => artifact_ops.push(op_ref),
            }
        }

        log::debug!(
            "routed {} ops: {} sheets, {} workbook artifacts",
            report.ops.len(),
            sheet_ops.len(),
            artifact_ops.len()
        );

        Self {
            payload,
            options,
            sheet_ops,
            artifact_ops,
            renames,
            tally,
        }
    }

    /// Names of sheets with at least one op, sorted by name.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheet_ops.keys().map(String::as_str)
    }

    /// Builds a single sheet without touching the others.
    pub fn build_sheet(&self, name: &str) -> Option<SheetViewModel<'a>> {
        let ops = self.sheet_ops.get(name)?;
        let payload = self.payload;
        let old_name = self.renames.get(name).cloned();
        let old_sheet = payload
            .sheets
            .old
            .find(name)
            .or_else(|| old_name.as_deref().and_then(|old| payload.sheets.old.find(old)));
        let alignment = payload
            .alignment(name)
            .or_else(|| old_name.as_deref().and_then(|old| payload.alignment(old)));
        let interest_rects = payload
            .interest_rects_for(name)
            .or_else(|| old_name.as_deref().and_then(|old| payload.interest_rects_for(old)));

        let inputs = SheetInputs {
            report: &payload.report,
            name: name.to_string(),
            old_name,
            ops: ops.clone(),
            old_sheet,
            new_sheet: payload.sheets.new.find(name),
            alignment,
            interest_rects,
        };
        Some(build_sheet_view_model(inputs, self.options))
    }

    pub fn build(self) -> WorkbookViewModel<'a> {
        let payload = self.payload;
        let report = &payload.report;

        let mut sheets: Vec<SheetViewModel<'a>> = self
            .sheet_names()
            .filter_map(|name| self.build_sheet(name))
            .collect();
        sheets.sort_by(compare_sheets);

        let mut other = OtherArtifacts::default();
        for op in &self.artifact_ops {
            let item = other_item(report, *op);
            other.bucket_mut(op.op).push(item);
        }

        let breakdowns = sheets.iter().map(SheetViewModel::breakdown).collect();
        let artifacts = other
            .iter()
            .map(|item| ArtifactRank {
                id: item.id.clone(),
                label: item.label.clone(),
                category: item.category,
                severity: item.severity,
            })
            .collect();
        let counts = self.tally.counts();
        let analysis = self.tally.finish(breakdowns, artifacts);

        log::debug!(
            "workbook view model: {} sheets, {} artifacts, {} ops",
            sheets.len(),
            other.len(),
            analysis.op_count
        );

        WorkbookViewModel {
            report,
            warnings: report.warnings.clone(),
            counts,
            sheets,
            other,
            analysis,
        }
    }
}

use std::collections::BTreeMap;

use serde::Serialize;

use crate::changes::ChangeType;
use crate::classify::{OpCategory, OpClass, OpSeverity};

const TOP_SHEETS: usize = 5;
const TOP_ARTIFACTS: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityCounts {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl SeverityCounts {
    pub fn add(&mut self, severity: OpSeverity) {
        match severity {
            OpSeverity::High => self.high = self.high.saturating_add(1),
            OpSeverity::Medium => self.medium = self.medium.saturating_add(1),
            OpSeverity::Low => self.low = self.low.saturating_add(1),
        }
    }

    pub fn total(&self) -> u64 {
        self.high + self.medium + self.low
    }

    /// Highest severity with a non-zero count.
    pub fn max(&self) -> Option<OpSeverity> {
        if self.high > 0 {
            Some(OpSeverity::High)
        } else if self.medium > 0 {
            Some(OpSeverity::Medium)
        } else if self.low > 0 {
            Some(OpSeverity::Low)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    pub grid: u64,
    pub power_query: u64,
    pub model: u64,
    pub objects: u64,
    pub other: u64,
}

impl CategoryCounts {
    pub fn add(&mut self, category: OpCategory) {
        match category {
            OpCategory::Grid => self.grid = self.grid.saturating_add(1),
            OpCategory::PowerQuery => self.power_query = self.power_query.saturating_add(1),
            OpCategory::Model => self.model = self.model.saturating_add(1),
            OpCategory::Objects => self.objects = self.objects.saturating_add(1),
            OpCategory::Other => self.other = self.other.saturating_add(1),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCounts {
    pub added: u64,
    pub removed: u64,
    pub modified: u64,
    pub moved: u64,
}

impl ChangeCounts {
    pub fn add(&mut self, change_type: ChangeType) {
        match change_type {
            ChangeType::Added => self.added = self.added.saturating_add(1),
            ChangeType::Removed => self.removed = self.removed.saturating_add(1),
            ChangeType::Modified => self.modified = self.modified.saturating_add(1),
            ChangeType::Moved => self.moved = self.moved.saturating_add(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdownRow {
    pub category: OpCategory,
    pub total: u64,
    pub severity: SeverityCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetBreakdown {
    pub sheet_name: String,
    pub op_count: u64,
    pub counts: ChangeCounts,
    pub severity: SeverityCounts,
}

/// A workbook-level artifact change considered for the "top artifacts" list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRank {
    pub id: String,
    pub label: String,
    pub category: OpCategory,
    pub severity: OpSeverity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffAnalysis {
    pub op_count: u64,
    pub counts: ChangeCounts,
    pub categories: CategoryCounts,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category_breakdown: Vec<CategoryBreakdownRow>,
    pub severity: SeverityCounts,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sheets: Vec<SheetBreakdown>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_sheets: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_artifacts: Vec<ArtifactRank>,
}

/// Running totals over the ops that survived noise filtering.
#[derive(Debug, Clone, Default)]
pub struct OpTally {
    op_count: u64,
    counts: ChangeCounts,
    categories: CategoryCounts,
    severity: SeverityCounts,
    by_category: BTreeMap<OpCategory, SeverityCounts>,
}

impl OpTally {
    pub fn add(&mut self, class: &OpClass) {
        self.op_count = self.op_count.saturating_add(1);
        self.counts.add(class.change_type);
        self.categories.add(class.category);
        self.severity.add(class.severity);
        self.by_category
            .entry(class.category)
            .or_default()
            .add(class.severity);
    }

    pub fn counts(&self) -> ChangeCounts {
        self.counts
    }

    /// `sheets` must already be in display order.
    pub fn finish(self, sheets: Vec<SheetBreakdown>, mut artifacts: Vec<ArtifactRank>) -> DiffAnalysis {
        let category_breakdown = self
            .by_category
            .into_iter()
            .filter(|(_, severity)| severity.total() > 0)
            .map(|(category, severity)| CategoryBreakdownRow {
                category,
                total: severity.total(),
                severity,
            })
            .collect();

        let top_sheets = sheets
            .iter()
            .take(TOP_SHEETS)
            .map(|sheet| sheet.sheet_name.clone())
            .collect();

        artifacts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.label.cmp(&b.label))
                .then_with(|| a.id.cmp(&b.id))
        });
        artifacts.truncate(TOP_ARTIFACTS);

        DiffAnalysis {
            op_count: self.op_count,
            counts: self.counts,
            categories: self.categories,
            category_breakdown,
            severity: self.severity,
            sheets,
            top_sheets,
            top_artifacts: artifacts,
        }
    }
}

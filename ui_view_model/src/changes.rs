//! Change items and the locators that tie them to grid or list positions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeGroup {
    Rows,
    Cols,
    Cells,
    Moves,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
    Moved,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Removed => "removed",
            ChangeType::Modified => "modified",
            ChangeType::Moved => "moved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Row,
    Col,
}

impl Axis {
    pub fn as_str(self) -> &'static str {
        match self {
            Axis::Row => "row",
            Axis::Col => "col",
        }
    }
}

/// What a change item points at, used to derive its anchors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemLocator {
    /// A contiguous run of view indices on one axis.
    #[serde(rename_all = "camelCase")]
    Range {
        axis: Axis,
        view_start: u32,
        view_end: u32,
    },
    #[serde(rename_all = "camelCase")]
    Region { region_id: String },
    /// A row or column block move, in raw indices.
    #[serde(rename_all = "camelCase")]
    AxisMove {
        move_id: String,
        axis: Axis,
        src_start: u32,
        dst_start: u32,
        count: u32,
    },
    /// A rectangle move with its source and destination A1 ranges.
    #[serde(rename_all = "camelCase")]
    RectMove {
        move_id: String,
        src: String,
        dst: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavTarget {
    pub anchor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeItem {
    pub id: String,
    pub group: ChangeGroup,
    pub change_type: ChangeType,
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<ItemLocator>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nav_targets: Vec<NavTarget>,
}

impl ChangeItem {
    pub fn new(id: impl Into<String>, group: ChangeGroup, change_type: ChangeType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group,
            change_type,
            label: label.into(),
            detail: String::new(),
            locator: None,
            nav_targets: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_locator(mut self, locator: ItemLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn move_id(&self) -> Option<&str> {
        match &self.locator {
            Some(ItemLocator::AxisMove { move_id, .. } | ItemLocator::RectMove { move_id, .. }) => {
                Some(move_id)
            }
            _ => None,
        }
    }
}

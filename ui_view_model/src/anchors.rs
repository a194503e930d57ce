//! Navigation anchors.
//!
//! Every change item yields zero or more anchors. Anchors are deduplicated by id
//! (first wins) and ordered by view position, then group priority, then id, so
//! "next change" walks the sheet top to bottom.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::axis::{AxisProjection, Side};
use crate::changes::{Axis, ChangeGroup, ChangeItem, ChangeType, ItemLocator, NavTarget};
use crate::regions::{Region, RegionKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnchorTarget {
    #[serde(rename_all = "camelCase")]
    Grid {
        view_row: u32,
        view_col: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        region_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        move_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    List { element_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    pub id: String,
    pub group: ChangeGroup,
    pub change_type: ChangeType,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub target: AnchorTarget,
}

fn priority(group: ChangeGroup, region_kind: Option<RegionKind>) -> u8 {
    match (group, region_kind) {
        (ChangeGroup::Moves, _) => 0,
        (ChangeGroup::Rows | ChangeGroup::Cols, _) => 1,
        (_, Some(RegionKind::Rect)) => 2,
        (ChangeGroup::Cells, _) => 3,
        _ => 4,
    }
}

pub fn list_element_id(sheet: &str, item_id: &str) -> String {
    format!("change-{sheet}-{item_id}")
}

fn range_anchor_id(axis: Axis, change_type: ChangeType, start: u32, end: u32) -> String {
    format!("{}:{}:{start}-{end}", axis.as_str(), change_type.as_str())
}

fn move_anchor_id(move_id: &str, side: Side) -> String {
    match side {
        Side::Old => format!("move:{move_id}:src"),
        Side::New => format!("move:{move_id}:dst"),
    }
}

fn region_anchor_id(region_id: &str) -> String {
    format!("region:{region_id}")
}

fn other_anchor_id(item_id: &str) -> String {
    format!("other:{item_id}")
}

struct Candidate {
    anchor: Anchor,
    row: u64,
    col: u64,
    priority: u8,
}

struct AnchorSink<'a> {
    sheet: &'a str,
    can_grid: bool,
    entries: Vec<Candidate>,
}

struct Spot<'a> {
    id: String,
    group: ChangeGroup,
    change_type: ChangeType,
    detail: Option<String>,
    at: Option<(u32, u32)>,
    region: Option<&'a Region>,
    move_id: Option<String>,
}

impl AnchorSink<'_> {
    fn push(&mut self, item: &ChangeItem, spot: Spot<'_>) {
        let region_kind = spot.region.map(|region| region.kind);
        let target = match spot.at {
            Some((view_row, view_col)) if self.can_grid => AnchorTarget::Grid {
                view_row,
                view_col,
                region_id: spot.region.map(|region| region.id.clone()),
                move_id: spot.move_id,
            },
            _ => AnchorTarget::List {
                element_id: list_element_id(self.sheet, &item.id),
            },
        };
        let (row, col) = spot
            .at
            .map(|(r, c)| (u64::from(r), u64::from(c)))
            .unwrap_or((u64::MAX, u64::MAX));
        self.entries.push(Candidate {
            anchor: Anchor {
                id: spot.id,
                group: spot.group,
                change_type: spot.change_type,
                label: item.label.clone(),
                detail: spot.detail.filter(|detail| !detail.is_empty()),
                target,
            },
            row,
            col,
            priority: priority(spot.group, region_kind),
        });
    }
}

/// Build the ordered anchor list for one sheet. `can_grid` selects grid targets
/// over list targets for anchors that have a view position.
pub fn build_anchors(
    sheet: &str,
    can_grid: bool,
    items: &[ChangeItem],
    regions: &[Region],
    rows: &AxisProjection,
    cols: &AxisProjection,
) -> Vec<Anchor> {
    let by_id: BTreeMap<&str, &Region> = regions.iter().map(|r| (r.id.as_str(), r)).collect();
    let mut sink = AnchorSink {
        sheet,
        can_grid,
        entries: Vec::new(),
    };

    for item in items {
        let detail = Some(item.detail.clone());
        match &item.locator {
            Some(ItemLocator::Region { region_id }) => {
                let Some(region) = by_id.get(region_id.as_str()).copied() else {
                    continue;
                };
                sink.push(
                    item,
                    Spot {
                        id: region_anchor_id(&region.id),
                        group: item.group,
                        change_type: item.change_type,
                        detail,
                        at: Some((region.top, region.left)),
                        region: Some(region),
                        move_id: region.move_id.clone(),
                    },
                );
            }
            Some(ItemLocator::Range {
                axis,
                view_start,
                view_end,
            }) => {
                let at = match axis {
                    Axis::Row => (*view_start, 0),
                    Axis::Col => (0, *view_start),
                };
                sink.push(
                    item,
                    Spot {
                        id: range_anchor_id(*axis, item.change_type, *view_start, *view_end),
                        group: item.group,
                        change_type: item.change_type,
                        detail,
                        at: Some(at),
                        region: None,
                        move_id: None,
                    },
                );
            }
            Some(ItemLocator::AxisMove {
                move_id,
                axis,
                src_start,
                dst_start,
                count,
            }) => {
                let projection = match axis {
                    Axis::Row => rows,
                    Axis::Col => cols,
                };
                for (side, start) in [(Side::Old, *src_start), (Side::New, *dst_start)] {
                    let Some((view, _)) = projection.map_range(side, start, *count) else {
                        continue;
                    };
                    let at = match axis {
                        Axis::Row => (view, 0),
                        Axis::Col => (0, view),
                    };
                    sink.push(
                        item,
                        Spot {
                            id: move_anchor_id(move_id, side),
                            group: ChangeGroup::Moves,
                            change_type: ChangeType::Moved,
                            detail: detail.clone(),
                            at: Some(at),
                            region: None,
                            move_id: Some(move_id.clone()),
                        },
                    );
                }
            }
            Some(ItemLocator::RectMove { move_id, .. }) => {
                let ends = [
                    (format!("move-src-{move_id}"), "From"),
                    (format!("move-dst-{move_id}"), "To"),
                ];
                for (region_id, label) in ends {
                    let Some(region) = by_id.get(region_id.as_str()).copied() else {
                        continue;
                    };
                    sink.push(
                        item,
                        Spot {
                            id: region_anchor_id(&region.id),
                            group: ChangeGroup::Moves,
                            change_type: ChangeType::Moved,
                            detail: Some(label.to_string()),
                            at: Some((region.top, region.left)),
                            region: Some(region),
                            move_id: Some(move_id.clone()),
                        },
                    );
                }
            }
            None => sink.push(
                item,
                Spot {
                    id: other_anchor_id(&item.id),
                    group: item.group,
                    change_type: item.change_type,
                    detail,
                    at: None,
                    region: None,
                    move_id: None,
                },
            ),
        }
    }

    let mut seen = BTreeSet::new();
    let mut entries: Vec<Candidate> = sink
        .entries
        .into_iter()
        .filter(|entry| seen.insert(entry.anchor.id.clone()))
        .collect();
    entries.sort_by(|a, b| {
        a.row
            .cmp(&b.row)
            .then(a.col.cmp(&b.col))
            .then(a.priority.cmp(&b.priority))
            .then_with(|| a.anchor.id.cmp(&b.anchor.id))
    });
    entries.into_iter().map(|entry| entry.anchor).collect()
}

/// Point each item at the anchors built for it. Move items get a "From" and a
/// "To" target.
pub fn attach_nav_targets(items: &mut [ChangeItem], anchors: &[Anchor]) {
    let ids: BTreeSet<&str> = anchors.iter().map(|anchor| anchor.id.as_str()).collect();
    for item in items.iter_mut() {
        let wanted: Vec<(String, Option<&str>)> = match &item.locator {
            Some(ItemLocator::Region { region_id }) => vec![(region_anchor_id(region_id), None)],
            Some(ItemLocator::Range {
                axis,
                view_start,
                view_end,
            }) => vec![(
                range_anchor_id(*axis, item.change_type, *view_start, *view_end),
                None,
            )],
            Some(ItemLocator::AxisMove { move_id, .. }) => vec![
                (move_anchor_id(move_id, Side::Old), Some("From")),
                (move_anchor_id(move_id, Side::New), Some("To")),
            ],
            Some(ItemLocator::RectMove { move_id, .. }) => vec![
                (region_anchor_id(&format!("move-src-{move_id}")), Some("From")),
                (region_anchor_id(&format!("move-dst-{move_id}")), Some("To")),
            ],
            None => vec![(other_anchor_id(&item.id), None)],
        };
        item.nav_targets = wanted
            .into_iter()
            .filter(|(anchor_id, _)| ids.contains(anchor_id.as_str()))
            .map(|(anchor_id, label)| NavTarget {
                anchor_id,
                label: label.map(str::to_string),
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{AxisEntry, AxisKind};

    fn identity(len: u32) -> AxisProjection {
        let entries: Vec<AxisEntry> = (0..len)
            .map(|i| AxisEntry {
                old: Some(i),
                new: Some(i),
                kind: AxisKind::Match,
                move_id: None,
            })
            .collect();
        AxisProjection::new(&entries, len, len)
    }

    fn row_item(start: u32) -> ChangeItem {
        ChangeItem::new(
            format!("row-added-{start}"),
            ChangeGroup::Rows,
            ChangeType::Added,
            format!("Row {} added", start + 1),
        )
        .with_locator(ItemLocator::Range {
            axis: Axis::Row,
            view_start: start,
            view_end: start,
        })
    }

    #[test]
    fn row_range_gets_grid_anchor_at_column_zero() {
        let items = vec![row_item(0)];
        let anchors = build_anchors("S", true, &items, &[], &identity(2), &identity(2));
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].id, "row:added:0-0");
        assert_eq!(
            anchors[0].target,
            AnchorTarget::Grid {
                view_row: 0,
                view_col: 0,
                region_id: None,
                move_id: None
            }
        );
    }

    #[test]
    fn list_targets_when_grid_unavailable() {
        let items = vec![row_item(3)];
        let anchors = build_anchors("Data", false, &items, &[], &identity(5), &identity(5));
        assert_eq!(
            anchors[0].target,
            AnchorTarget::List {
                element_id: "change-Data-row-added-3".to_string()
            }
        );
    }

    #[test]
    fn moves_sort_before_ranges_on_the_same_cell() {
        let mut items = vec![
            row_item(0),
            ChangeItem::new("move-rows-0-2", ChangeGroup::Moves, ChangeType::Moved, "Row 1 moved")
                .with_detail("to row 3")
                .with_locator(ItemLocator::AxisMove {
                    move_id: "r:0+1->2".to_string(),
                    axis: Axis::Row,
                    src_start: 0,
                    dst_start: 2,
                    count: 1,
                }),
        ];
        let anchors = build_anchors("S", true, &items, &[], &identity(3), &identity(1));
        let ids: Vec<&str> = anchors.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["move:r:0+1->2:src", "row:added:0-0", "move:r:0+1->2:dst"]);

        attach_nav_targets(&mut items, &anchors);
        let labels: Vec<Option<&str>> = items[1]
            .nav_targets
            .iter()
            .map(|t| t.label.as_deref())
            .collect();
        assert_eq!(labels, vec![Some("From"), Some("To")]);
        assert_eq!(items[0].nav_targets[0].anchor_id, "row:added:0-0");
    }

    #[test]
    fn duplicate_ids_keep_the_first_anchor() {
        let items = vec![row_item(1), row_item(1)];
        let anchors = build_anchors("S", true, &items, &[], &identity(2), &identity(1));
        assert_eq!(anchors.len(), 1);
    }
}

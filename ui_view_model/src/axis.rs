//! Three-way index space (old, new, view) for one sheet axis.

use serde::{Deserialize, Serialize};

use crate::payload::AxisEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Old,
    New,
}

/// Alignment entries for one axis plus reverse lookups sized to the raw axis
/// lengths. Built once per sheet; never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisProjection {
    entries: Vec<AxisEntry>,
    old_to_view: Vec<Option<u32>>,
    new_to_view: Vec<Option<u32>>,
    old_len: u32,
    new_len: u32,
    count: u32,
}

impl AxisProjection {
    pub fn new(entries: &[AxisEntry], old_len: u32, new_len: u32) -> Self {
        let mut old_to_view = vec![None; old_len as usize];
        let mut new_to_view = vec![None; new_len as usize];
        let mut out_of_range = 0usize;

        for (view, entry) in entries.iter().enumerate() {
            let view = u32::try_from(view).unwrap_or(u32::MAX);
            if let Some(old) = entry.old {
                match old_to_view.get_mut(old as usize) {
                    Some(slot) => *slot = Some(view),
                    None => out_of_range += 1,
                }
            }
            if let Some(new) = entry.new {
                match new_to_view.get_mut(new as usize) {
                    Some(slot) => *slot = Some(view),
                    None => out_of_range += 1,
                }
            }
        }

        // Zero-length sides are expected when a snapshot is absent.
        if out_of_range > 0 && old_len > 0 && new_len > 0 {
            log::warn!(
                "alignment references {out_of_range} indices outside the sheet bounds (old={old_len}, new={new_len})"
            );
        }

        Self {
            entries: entries.to_vec(),
            old_to_view,
            new_to_view,
            old_len,
            new_len,
            count: u32::try_from(entries.len()).unwrap_or(u32::MAX),
        }
    }

    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[AxisEntry] {
        &self.entries
    }

    pub fn entry(&self, view: u32) -> Option<&AxisEntry> {
        self.entries.get(view as usize)
    }

    pub fn raw_len(&self, side: Side) -> u32 {
        match side {
            Side::Old => self.old_len,
            Side::New => self.new_len,
        }
    }

    fn reverse(&self, side: Side) -> &[Option<u32>] {
        match side {
            Side::Old => &self.old_to_view,
            Side::New => &self.new_to_view,
        }
    }

    /// Strict lookup: `None` when the raw index has no view position.
    pub fn view_of(&self, side: Side, index: u32) -> Option<u32> {
        self.reverse(side).get(index as usize).copied().flatten()
    }

    /// Placement for edits. Without alignment entries, or without a snapshot for
    /// `side`, indices place by raw value; otherwise unmapped indices are dropped.
    pub fn place(&self, side: Side, index: u32) -> Option<u32> {
        if self.entries.is_empty() || self.reverse(side).is_empty() {
            return Some(index);
        }
        self.view_of(side, index)
    }

    /// Lenient lookup for labels, ranges and hunks: unmapped indices keep their
    /// raw value.
    pub fn view_or_same(&self, side: Side, index: u32) -> u32 {
        self.view_of(side, index).unwrap_or(index)
    }

    /// Raw index on `side` for a view index, falling back to the view index.
    pub fn side_index(&self, view: u32, side: Side) -> u32 {
        let raw = self.entry(view).and_then(|entry| match side {
            Side::Old => entry.old,
            Side::New => entry.new,
        });
        raw.unwrap_or(view)
    }

    /// View span `(min, max)` covered by `count` raw indices starting at `start`.
    /// Only indices inside the raw axis are walked; the rest keep their raw value,
    /// so they contribute one contiguous tail.
    pub fn map_range(&self, side: Side, start: u32, count: u32) -> Option<(u32, u32)> {
        if count == 0 {
            return None;
        }
        let end = start.saturating_add(count - 1);
        let len = self.raw_len(side);
        let mut span: Option<(u32, u32)> = None;
        let mut widen = |lo: u32, hi: u32| {
            span = Some(match span {
                None => (lo, hi),
                Some((a, b)) => (a.min(lo), b.max(hi)),
            });
        };
        for index in start..len.min(end.saturating_add(1)) {
            let view = self.view_or_same(side, index);
            widen(view, view);
        }
        if end >= len {
            widen(start.max(len), end);
        }
        span
    }
}

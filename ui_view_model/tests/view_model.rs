mod common;

use common::*;
use serde_json::json;
use ui_view_model::{
    AnchorTarget, ChangeGroup, DiffKind, HunkKind, MoveRole, RectSide, RegionKind, Side,
    StatusKind, ViewOptions,
};

#[test]
fn inserted_row_shifts_new_side_in_view() {
    let payload = parse_payload(payload_json(
        &["Sheet1"],
        vec![row_added(0, 0)],
        vec![sheet("Sheet1", 1, 1, vec![cell(0, 0, "A")])],
        vec![sheet("Sheet1", 2, 1, vec![cell(0, 0, "N"), cell(1, 0, "A")])],
        vec![alignment(
            "Sheet1",
            vec![entry(None, Some(0), "insert"), entry(Some(0), Some(1), "match")],
            identity_axis(1),
        )],
    ));
    let options = ViewOptions::default();
    let vm = build(&payload, &options);
    let sheet = only_sheet(&vm);

    let kept = sheet.cell_at(1, 0);
    assert_eq!(kept.old.as_ref().map(|side| side.row), Some(0));
    assert_eq!(kept.new.as_ref().map(|side| side.row), Some(1));
    assert_eq!(kept.diff_kind, DiffKind::Unchanged);
    assert_eq!(kept.display.text, "A");

    let added = sheet.cell_at(0, 0);
    assert_eq!(added.diff_kind, DiffKind::Added);
    assert!(added.old.is_none());
    assert_eq!(added.display.text, "N");
    assert_eq!(added.display.tooltip, "Added: N");

    let raw = sheet.cell_at_raw(Side::Old, 0, 0);
    assert_eq!(raw.view_row, Some(1));
}

#[test]
fn moved_row_links_source_and_destination() {
    let mut moved_alignment = alignment(
        "Sheet1",
        vec![
            moved_entry(Some(0), None, "move_src", "m1"),
            entry(Some(1), Some(0), "match"),
            entry(Some(2), Some(1), "match"),
            moved_entry(None, Some(2), "move_dst", "m1"),
        ],
        identity_axis(1),
    );
    moved_alignment["moves"] =
        json!([{ "id": "m1", "axis": "row", "src_start": 0, "dst_start": 2, "count": 1 }]);
    let payload = parse_payload(payload_json(
        &["Sheet1"],
        vec![json!({
            "kind": "BlockMovedRows",
            "sheet": 0,
            "src_start_row": 0,
            "row_count": 1,
            "dst_start_row": 2
        })],
        vec![sheet("Sheet1", 3, 1, vec![cell(0, 0, "a"), cell(1, 0, "b"), cell(2, 0, "c")])],
        vec![sheet("Sheet1", 3, 1, vec![cell(0, 0, "b"), cell(1, 0, "c"), cell(2, 0, "a")])],
        vec![moved_alignment],
    ));
    let options = ViewOptions::default();
    let vm = build(&payload, &options);
    let sheet = only_sheet(&vm);

    let src = sheet.cell_at(0, 0);
    assert_eq!(src.diff_kind, DiffKind::Moved);
    assert_eq!(src.move_role, Some(MoveRole::Src));
    assert_eq!(src.move_id.as_deref(), Some("m1"));
    assert_eq!(src.display.text, "a");

    let dst = sheet.cell_at(3, 0);
    assert_eq!(dst.diff_kind, DiffKind::Moved);
    assert_eq!(dst.move_role, Some(MoveRole::Dst));
    assert_eq!(dst.move_id, src.move_id);

    let item = sheet
        .changes
        .items
        .iter()
        .find(|item| item.id == "move-m1")
        .expect("move item");
    assert_eq!(item.label, "Row 1 moved");
    assert_eq!(item.detail, "to row 3");
    let targets: Vec<&str> = item.nav_targets.iter().map(|t| t.anchor_id.as_str()).collect();
    assert_eq!(targets, vec!["move:m1:src", "move:m1:dst"]);

    let endpoints = &sheet.changes.moves["m1"];
    assert_eq!(endpoints.src, "Row 1");
    assert_eq!(endpoints.dst, "Row 3");
}

#[test]
fn consecutive_row_adds_collapse_into_one_range() {
    let mut rows: Vec<_> = (0..10).map(|i| entry(None, Some(i), "insert")).collect();
    rows.push(entry(Some(0), Some(10), "match"));
    let payload = parse_payload(payload_json(
        &["Sheet1"],
        (0..10).map(|i| row_added(0, i)).collect(),
        vec![sheet("Sheet1", 1, 1, vec![cell(0, 0, "x")])],
        vec![sheet("Sheet1", 11, 1, vec![cell(10, 0, "x")])],
        vec![alignment("Sheet1", rows, identity_axis(1))],
    ));
    let options = ViewOptions::default();
    let vm = build(&payload, &options);
    let sheet = only_sheet(&vm);

    let row_items: Vec<_> = sheet
        .changes
        .items
        .iter()
        .filter(|item| item.group == ChangeGroup::Rows)
        .collect();
    assert_eq!(row_items.len(), 1);
    assert_eq!(row_items[0].id, "row-added-0");
    assert_eq!(row_items[0].label, "Rows 1-10 added");
    assert_eq!(sheet.changes.anchors[0].id, "row:added:0-9");
    assert_eq!(sheet.op_count, 10);
}

fn edit_grid(nrows: u32, ncols: u32, edits: &[(u32, u32)], options: &ViewOptions) -> Vec<(u32, u32, u32, u32, u64)> {
    let payload = parse_payload(payload_json(
        &["Sheet1"],
        edits
            .iter()
            .map(|&(row, col)| number_edit(0, row, col, 1.0, 2.0))
            .collect(),
        vec![sheet("Sheet1", nrows, ncols, Vec::new())],
        vec![sheet("Sheet1", nrows, ncols, Vec::new())],
        vec![alignment("Sheet1", identity_axis(nrows), identity_axis(ncols))],
    ));
    let vm = build(&payload, options);
    let regions: Vec<_> = only_sheet(&vm)
        .changes
        .regions
        .iter()
        .filter(|region| region.kind == RegionKind::Cell)
        .map(|r| (r.top, r.left, r.bottom, r.right, r.cell_count))
        .collect();
    regions
}

#[test]
fn distant_clusters_stay_separate() {
    let edits = [(0, 0), (0, 1), (1, 0), (1, 1), (100, 0), (100, 1), (101, 0), (101, 1)];
    let regions = edit_grid(102, 2, &edits, &ViewOptions::default());
    assert_eq!(regions, vec![(0, 0, 1, 1, 4), (100, 0, 101, 1, 4)]);
}

#[test]
fn long_edit_run_is_split_at_region_budget() {
    let edits: Vec<(u32, u32)> = (0..120).map(|col| (0, col)).collect();
    let options = ViewOptions::builder()
        .max_cells_per_region(50)
        .build()
        .expect("valid options");
    let regions = edit_grid(1, 120, &edits, &options);

    assert!(regions.len() >= 3);
    assert!(regions.iter().all(|r| r.4 <= 50));
    assert_eq!(regions.iter().map(|r| r.4).sum::<u64>(), 120);
}

#[test]
fn region_items_carry_labels_and_counts() {
    let payload = parse_payload(payload_json(
        &["Sheet1"],
        vec![number_edit(0, 0, 0, 1.0, 2.0), number_edit(0, 0, 1, 3.0, 4.0)],
        vec![sheet("Sheet1", 2, 2, Vec::new())],
        vec![sheet("Sheet1", 2, 2, Vec::new())],
        vec![alignment("Sheet1", identity_axis(2), identity_axis(2))],
    ));
    let options = ViewOptions::default();
    let vm = build(&payload, &options);
    let sheet = only_sheet(&vm);

    let item = &sheet.changes.items[0];
    assert_eq!(item.id, "cell-region-cells-1");
    assert_eq!(item.label, "Cells A1:B1 modified");
    assert_eq!(item.detail, "2 cells");

    let edited = sheet.cell_at(0, 1);
    assert_eq!(edited.diff_kind, DiffKind::Edited);
    assert_eq!(edited.display.text, "4");
    assert_eq!(edited.display.tooltip, "Changed: 3 -> 4");
    assert_eq!(sheet.render_plan.regions_to_render, vec!["cells-1"]);
    assert_eq!(sheet.hunks[0].kind, HunkKind::Aligned);
}

#[test]
fn single_row_insert_yields_grid_anchor() {
    let payload = parse_payload(payload_json(
        &["Sheet1"],
        vec![row_added(0, 0)],
        vec![sheet("Sheet1", 1, 1, vec![cell(0, 0, "A")])],
        vec![sheet("Sheet1", 2, 1, vec![cell(0, 0, "N"), cell(1, 0, "A")])],
        vec![alignment(
            "Sheet1",
            vec![entry(None, Some(0), "insert"), entry(Some(0), Some(1), "match")],
            identity_axis(1),
        )],
    ));
    let options = ViewOptions::default();
    let vm = build(&payload, &options);
    let sheet = only_sheet(&vm);

    let anchor = &sheet.changes.anchors[0];
    assert_eq!(anchor.id, "row:added:0-0");
    match &anchor.target {
        AnchorTarget::Grid { view_row, .. } => assert_eq!(*view_row, 0),
        other => panic!("expected grid target, got {other:?}"),
    }
    assert_eq!(sheet.changes.items[0].nav_targets[0].anchor_id, "row:added:0-0");
}

#[test]
fn blank_to_blank_edits_are_ignored_by_default() {
    let build_with = |ignore: bool| {
        let payload = parse_payload(payload_json(
            &["Sheet1"],
            vec![blank_edit(0, "B2")],
            vec![sheet("Sheet1", 2, 2, Vec::new())],
            vec![sheet("Sheet1", 2, 2, Vec::new())],
            vec![alignment("Sheet1", identity_axis(2), identity_axis(2))],
        ));
        let options = ViewOptions::builder()
            .ignore_blank_to_blank(ignore)
            .build()
            .expect("valid options");
        let vm = build(&payload, &options);
        let sheet = only_sheet(&vm);
        (
            sheet.changes.items.len(),
            sheet.changes.regions.len(),
            sheet.changes.anchors.len(),
        )
    };

    assert_eq!(build_with(true), (0, 0, 0));
    let (items, regions, anchors) = build_with(false);
    assert!(regions >= 1);
    assert!(items >= 1);
    assert!(anchors >= 1);
}

#[test]
fn renamed_sheet_pairs_old_and_new_snapshots() {
    let payload = parse_payload(payload_json(
        &["OldSheet", "NewSheet"],
        vec![json!({ "kind": "SheetRenamed", "sheet": 1, "from": 0 })],
        vec![sheet("OldSheet", 1, 1, vec![cell(0, 0, "A")])],
        vec![sheet("NewSheet", 1, 1, vec![cell(0, 0, "B")])],
        vec![alignment("NewSheet", identity_axis(1), identity_axis(1))],
    ));
    let options = ViewOptions::default();
    let vm = build(&payload, &options);
    let sheet = only_sheet(&vm);

    assert_eq!(sheet.name, "NewSheet");
    assert_eq!(sheet.old_name.as_deref(), Some("OldSheet"));
    let view = sheet.cell_at(0, 0);
    let old_value = view.old.and_then(|side| side.cell).and_then(|cell| cell.value);
    let new_value = view.new.and_then(|side| side.cell).and_then(|cell| cell.value);
    assert_eq!(old_value.as_deref(), Some("A"));
    assert_eq!(new_value.as_deref(), Some("B"));
    assert_eq!(sheet.changes.items[0].label, "Sheet renamed from OldSheet");
}

#[test]
fn skipped_alignment_uses_list_anchors_and_raw_hunks() {
    let mut skipped = alignment("Sheet1", Vec::new(), Vec::new());
    skipped["skipped"] = json!(true);
    skipped["skip_reason"] = json!("Sheet too large to align");
    let payload = parse_payload(payload_json(
        &["Sheet1"],
        vec![row_added(0, 0)],
        vec![sheet("Sheet1", 4, 3, Vec::new())],
        vec![sheet("Sheet1", 5, 3, Vec::new())],
        vec![skipped],
    ));
    let options = ViewOptions::default();
    let vm = build(&payload, &options);
    let sheet = only_sheet(&vm);

    assert_eq!(sheet.status().kind, StatusKind::Skipped);
    assert_eq!(sheet.status().message.as_deref(), Some("Sheet too large to align"));
    assert!(sheet.render_plan.regions_to_render.is_empty());
    assert_eq!(
        sheet.changes.anchors[0].target,
        AnchorTarget::List {
            element_id: "change-Sheet1-row-added-0".to_string()
        }
    );
    assert_eq!(sheet.hunks.len(), 1);
    assert_eq!(sheet.hunks[0].kind, HunkKind::Raw);
    assert_eq!(sheet.hunks[0].label, "Added rows A1:C2");
}

fn skipped_alignment() -> serde_json::Value {
    let mut skipped = alignment("Sheet1", Vec::new(), Vec::new());
    skipped["skipped"] = json!(true);
    skipped
}

#[test]
fn raw_hunk_keeps_edit_in_rows_only_the_new_sheet_has() {
    let payload = parse_payload(payload_json(
        &["Sheet1"],
        vec![number_edit(0, 8, 1, 1.0, 2.0)],
        vec![sheet("Sheet1", 5, 3, Vec::new())],
        vec![sheet("Sheet1", 10, 3, Vec::new())],
        vec![skipped_alignment()],
    ));
    let options = ViewOptions::default();
    let vm = build(&payload, &options);
    let sheet = only_sheet(&vm);

    assert_eq!(sheet.status().kind, StatusKind::Skipped);
    assert_eq!(sheet.hunks.len(), 1);
    assert_eq!(sheet.hunks[0].kind, HunkKind::Raw);
    assert_eq!(sheet.hunks[0].side, Some(RectSide::New));
    assert_eq!(sheet.hunks[0].label, "Edited cells A8:C10");
}

#[test]
fn raw_hunks_for_sheets_with_one_snapshot() {
    let added = parse_payload(payload_json(
        &["Sheet1"],
        vec![json!({ "kind": "SheetAdded", "sheet": 0 }), number_edit(0, 1, 1, 1.0, 2.0)],
        Vec::new(),
        vec![sheet("Sheet1", 10, 3, Vec::new())],
        Vec::new(),
    ));
    let options = ViewOptions::default();
    let vm = build(&added, &options);
    let sheet = only_sheet(&vm);
    assert_eq!(sheet.status().kind, StatusKind::Missing);
    assert_eq!(sheet.hunks.len(), 1);
    assert_eq!(sheet.hunks[0].side, Some(RectSide::New));
    assert_eq!(sheet.hunks[0].label, "Edited cells A1:C3");

    let removed = parse_payload(payload_json(
        &["Sheet1"],
        vec![json!({ "kind": "SheetRemoved", "sheet": 0 }), number_edit(0, 1, 1, 1.0, 2.0)],
        vec![common::sheet("Sheet1", 10, 3, Vec::new())],
        Vec::new(),
        Vec::new(),
    ));
    let vm = build(&removed, &options);
    let sheet = only_sheet(&vm);
    assert_eq!(sheet.hunks.len(), 1);
    assert_eq!(sheet.hunks[0].side, Some(RectSide::Old));
}

#[test]
fn raw_hunk_keeps_replaced_rect_beyond_the_smaller_old_sheet() {
    let payload = parse_payload(payload_json(
        &["Sheet1"],
        vec![json!({
            "kind": "RectReplaced",
            "sheet": 0,
            "start_row": 6,
            "row_count": 2,
            "start_col": 0,
            "col_count": 2
        })],
        vec![sheet("Sheet1", 4, 3, Vec::new())],
        vec![sheet("Sheet1", 10, 3, Vec::new())],
        vec![skipped_alignment()],
    ));
    let options = ViewOptions::default();
    let vm = build(&payload, &options);
    let sheet = only_sheet(&vm);

    assert_eq!(sheet.hunks.len(), 1);
    assert_eq!(sheet.hunks[0].side, Some(RectSide::New));
    assert_eq!(sheet.hunks[0].label, "Replaced range A6:C9");
}

#[test]
fn truncated_snapshot_marks_sheet_partial() {
    let mut truncated = sheet("Sheet1", 2, 2, Vec::new());
    truncated["truncated"] = json!(true);
    let payload = parse_payload(payload_json(
        &["Sheet1"],
        vec![number_edit(0, 0, 0, 1.0, 2.0)],
        vec![sheet("Sheet1", 2, 2, Vec::new())],
        vec![truncated],
        vec![alignment("Sheet1", identity_axis(2), identity_axis(2))],
    ));
    let options = ViewOptions::default();
    let vm = build(&payload, &options);
    let sheet = only_sheet(&vm);

    assert_eq!(sheet.status().kind, StatusKind::Partial);
    assert_eq!(sheet.render_plan.regions_to_render, vec!["cells-1"]);
    assert!(matches!(sheet.changes.anchors[0].target, AnchorTarget::Grid { .. }));
}

#[test]
fn formatting_only_filter_hides_ops_everywhere() {
    let formatting = json!({
        "kind": "CellEdited",
        "sheet": 0,
        "addr": "A1",
        "from": { "value": null, "formula": 1 },
        "to": { "value": null, "formula": 2 },
        "formula_diff": "formatting_only"
    });
    let payload = parse_payload(payload_json(
        &["Sheet1", "SUM(A2)", "sum(A2)"],
        vec![formatting],
        vec![sheet("Sheet1", 2, 1, Vec::new())],
        vec![sheet("Sheet1", 2, 1, Vec::new())],
        vec![alignment("Sheet1", identity_axis(2), identity_axis(1))],
    ));

    let shown = ViewOptions::default();
    let vm = build(&payload, &shown);
    assert_eq!(vm.sheets.len(), 1);
    let edit = vm.sheets[0].cell_at(0, 0).edit.expect("edit record");
    assert_eq!(edit.from_formula, "=SUM(A2)");
    assert_eq!(edit.to_formula, "=sum(A2)");

    let mut hidden = ViewOptions::default();
    hidden.noise_filters.hide_formula_formatting_only = true;
    let vm = build(&payload, &hidden);
    assert!(vm.sheets.is_empty());
    assert_eq!(vm.analysis.op_count, 0);
    assert_eq!(vm.counts.modified, 0);
}

#[test]
fn analysis_ranks_sheets_and_artifacts() {
    let payload = parse_payload(payload_json(
        &["Calm", "Busy", "Loud", "Sales", "Old"],
        vec![
            row_added(1, 0),
            row_added(1, 1),
            row_added(1, 2),
            row_added(0, 0),
            json!({ "kind": "SheetAdded", "sheet": 2 }),
            json!({ "kind": "QueryAdded", "name": 3 }),
            json!({ "kind": "QueryRenamed", "from": 4, "to": 3 }),
        ],
        Vec::new(),
        Vec::new(),
        Vec::new(),
    ));
    let options = ViewOptions::default();
    let vm = build(&payload, &options);

    assert_eq!(vm.analysis.top_sheets, vec!["Loud", "Busy", "Calm"]);
    let busy = &vm.analysis.sheets[1];
    assert_eq!(busy.sheet_name, "Busy");
    assert_eq!(busy.op_count, 3);
    assert_eq!(busy.counts.added, 3);

    let artifacts: Vec<(&str, &str)> = vm
        .analysis
        .top_artifacts
        .iter()
        .map(|a| (a.label.as_str(), a.id.as_str()))
        .collect();
    assert_eq!(
        artifacts,
        vec![("Query: Sales", "QueryAdded-5"), ("Query: Sales", "QueryRenamed-6")]
    );
    assert_eq!(vm.other.queries[1].detail, "Renamed from Old");
    assert_eq!(vm.analysis.op_count, 7);
    assert_eq!(vm.counts.added, 6);
}

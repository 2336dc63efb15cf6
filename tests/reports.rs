use std::fs;
use std::path::{Path, PathBuf};

use race_event_report::assets::AssetLayout;
use race_event_report::config::{RunConfig, TimestampStyle};
use race_event_report::report::ReportContext;
use race_event_report::world_records::WorldRecordSource;
use race_event_report::{event_report, milestone_report, showdown_report, tournament_report};
use tempfile::TempDir;

fn fixture_root() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("assets");
    path
}

fn copy_tree(from: &Path, to: &Path) {
    fs::create_dir_all(to).expect("create fixture dir");
    for entry in fs::read_dir(from).expect("fixture dir should be readable") {
        let entry = entry.expect("fixture entry");
        let target = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_tree(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).expect("copy fixture file");
        }
    }
}

/// Fixture assets in a scratch folder, so report files land outside the repo.
fn scratch_assets() -> (TempDir, AssetLayout, ReportContext) {
    let dir = tempfile::tempdir().expect("tempdir");
    copy_tree(&fixture_root(), dir.path());
    let config = RunConfig {
        asset_dir: dir.path().to_path_buf(),
        world_records: WorldRecordSource::File(dir.path().join("wr.json")),
        timestamps: TimestampStyle::Discord,
        ..RunConfig::default()
    };
    let layout = AssetLayout::new(&config.asset_dir);
    let ctx = ReportContext::load(&layout, &config);
    (dir, layout, ctx)
}

#[test]
fn lookups_load_from_asset_folders() {
    let (_dir, layout, ctx) = scratch_assets();
    assert!(layout.meta_dir.ends_with("metadata"));
    assert_eq!(ctx.translations.get("ZONDA_R_RewardRecycled"), Some("Pagani Zonda R"));
    assert_eq!(ctx.shop.len(), 2);
    assert_eq!(ctx.collections.get("SLOT_A"), Some(&vec!["SLOT_CAR_A".to_string()]));
    assert_eq!(ctx.world_records.len(), 2);
    assert_eq!(ctx.world_records.electric_only, 1);
    let quarter = ctx.world_records.get("QUARTER_CAR").expect("EC row kept");
    assert!(quarter.electric);
    assert_eq!(quarter.display_time, Some(7.25));
}

#[test]
fn event_report_orders_events_and_annotates_slots() {
    let (_dir, layout, ctx) = scratch_assets();
    let report = event_report::build(&layout.text_dir, &ctx);
    let expected = [
        "EARLY_EVT",
        "2020-09-13 12:26:40 GMT",
        "2020-09-14 16:13:20 GMT",
        "",
        "",
        "Summer Cup (SUMMER_CUP_2024)",
        "2023-11-14 22:13:20 GMT",
        "2023-11-21 20:53:20 GMT",
        "",
        "Slot 1",
        "Huayra BC (GS) - Pullable GK",
        "Huayra R (PS)",
        "",
        "Slot 3",
        "Pagani Zonda R (GS) - Winnable Race 5 / 250 Gold Coins / Summer Showdown 1500 SD Prize Car",
        "",
        "Slot SlotA",
        "NEW CAR X (PS)",
        "",
        "Prize Car : Prize Machine",
        "",
        "NO_DATE_EVT",
        "",
        "",
    ]
    .join("\n");
    assert_eq!(report.text.plain(), expected);
    assert!(report.summary.missing_translations.contains("NEW_CAR_X"));
}

#[test]
fn console_rendering_matches_plain_apart_from_colour() {
    let (_dir, layout, ctx) = scratch_assets();
    let report = event_report::build(&layout.text_dir, &ctx);
    assert_eq!(strip_ansi(&report.text.console()), report.text.plain());
}

fn strip_ansi(text: &str) -> String {
    let mut out = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[test]
fn event_run_writes_plain_output_file() {
    let (_dir, layout, ctx) = scratch_assets();
    let report = event_report::run(&layout.text_dir, &ctx).expect("event phase");
    let written = fs::read_to_string(layout.text_dir.join(event_report::OUTPUT_FILE))
        .expect("event output");
    assert_eq!(written, report.text.plain());
}

#[test]
fn showdown_report_lists_cars_by_class_then_time() {
    let (_dir, layout, ctx) = scratch_assets();
    let report = showdown_report::run(&layout.text_dir, &ctx).expect("showdown phase");
    let expected = [
        "Summer Showdown - Showdown (<t:1700100000:f> - <t:1700200000:f>)",
        "",
        "• Known SD Car (Best ET - 9.876) (T4 P3)",
        "",
        "Elite Showdown - Season 12 (<t:1700300000:f> - <t:1700400000:f>)",
        "",
        "• Known SD Car (Best ET - 9.876) (T4 P3) - Car For Sale - 100 Gold Coins",
        "• Quarter Car (Dyno - 7.250) (T2 G2) (1/4 mile Time Only)",
        "• MYSTERY (Dyno - N/A) (? ?)",
    ]
    .join("\n");
    assert_eq!(report.text.plain(), expected);
    assert_eq!(
        report.summary.unknown_cars.iter().collect::<Vec<_>>(),
        vec!["MYSTERY"]
    );
    assert!(report.summary.missing_world_records.is_empty());
    let written = fs::read_to_string(layout.text_dir.join(showdown_report::OUTPUT_FILE))
        .expect("showdown output");
    assert_eq!(written, expected);
}

#[test]
fn milestone_report_reads_numeric_files_only() {
    let (_dir, layout, ctx) = scratch_assets();
    let report = milestone_report::build(&layout.text_dir, &ctx);
    assert_eq!(
        report.text.plain(),
        [
            "Milestone Season 12:",
            "2022-04-15 05:20:00 GMT",
            "2022-04-21 00:13:20 GMT",
            "PC : Pagani Zonda R",
            "MS : MS_CAR",
            "",
        ]
        .join("\n")
    );
}

#[test]
fn tournament_report_uses_collections_and_schedule() {
    let (_dir, layout, ctx) = scratch_assets();
    let report = tournament_report::run(&layout.text_dir, &ctx).expect("tournament phase");
    let expected = [
        "Tournament Season 244 - (<t:1700000000:f> - <t:1700600000:f>)",
        "Day 1 / Race 1",
        "- Slot Car A (PP Range 300 - 320) (1/2 Mile) (2h 0m Reset)",
        "Day 2 / Race 1",
        "- Unknown (No Restrictions) (0-100 Sprint) (0h 30m Reset)",
        "",
        &"=".repeat(50),
        "",
    ]
    .join("\n");
    assert_eq!(report.text.plain(), expected);
    assert!(layout.text_dir.join(tournament_report::OUTPUT_FILE).is_file());
}

#[test]
fn missing_folders_degrade_to_empty_reports() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = RunConfig {
        asset_dir: dir.path().to_path_buf(),
        world_records: WorldRecordSource::Disabled,
        ..RunConfig::default()
    };
    let layout = AssetLayout::new(&config.asset_dir);
    let ctx = ReportContext::load(&layout, &config);
    assert!(ctx.translations.is_empty());
    assert!(ctx.shop.is_empty());
    assert!(ctx.world_records.is_empty());

    assert!(event_report::build(&layout.text_dir, &ctx).text.is_empty());
    assert!(milestone_report::build(&layout.text_dir, &ctx).text.is_empty());
    assert!(showdown_report::build(&layout.text_dir, &ctx).text.is_empty());
    assert!(tournament_report::build(&layout.text_dir, &ctx).text.is_empty());
    assert!(showdown_report::run(&layout.text_dir, &ctx).is_ok());
}

#[test]
fn untranslated_event_renders_humanized_ids() {
    let dir = tempfile::tempdir().expect("tempdir");
    let text_dir = dir.path().join("TextAsset");
    fs::create_dir_all(&text_dir).expect("mkdir");
    fs::write(
        text_dir.join("LONE_EVT.txt"),
        r#"{"LONE_EVT": {"LockinNamespaces": {"Namespaces": {"LONE_EVT": {"LockinSlotsList": [
            {"SlotIds": ["Slot2"], "Restrictions": [{"RestrictionType": "CarModel", "Model": "SOME_RARE_CAR"}]}
        ]}}}}}"#,
    )
    .expect("write event");
    let report = event_report::build(&text_dir, &ReportContext::default());
    assert_eq!(
        report.text.plain(),
        "LONE_EVT\n\nSlot 2\nSOME RARE CAR (PS)\n\n"
    );
}

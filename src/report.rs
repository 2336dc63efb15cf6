use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use crossterm::style::Color;
use serde_json::Value;

use crate::assets::{self, AssetLayout};
use crate::config::{RunConfig, TimestampStyle};
use crate::json_tree;
use crate::render::{Line, ReportText};
use crate::shop::ShopCatalog;
use crate::translation::TranslationTable;
use crate::world_records::{self, WorldRecordMap};

/// Files the report phases write next to their inputs.
pub const OUTPUT_FILES: [&str; 4] = [
    "event_output.txt",
    "milestone_output.txt",
    "sd_output.txt",
    "tournament_output.txt",
];

pub fn is_report_output(file_name: &str) -> bool {
    OUTPUT_FILES
        .iter()
        .any(|name| name.eq_ignore_ascii_case(file_name))
}

/// Read-only lookups and switches shared by every report phase of a run.
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    pub translations: TranslationTable,
    pub shop: ShopCatalog,
    pub collections: HashMap<String, Vec<String>>,
    pub world_records: WorldRecordMap,
    pub debug: bool,
    pub crdb: bool,
    pub timestamps: TimestampStyle,
}

impl ReportContext {
    /// Loads every lookup once; missing assets leave their lookup empty.
    pub fn load(layout: &AssetLayout, config: &RunConfig) -> Self {
        Self {
            translations: assets::load_translations(&layout.mono_dir),
            shop: assets::load_shop(&layout.meta_dir),
            collections: assets::load_collections(&layout.meta_dir),
            world_records: world_records::load_world_records(&config.world_records),
            debug: config.debug,
            crdb: config.crdb,
            timestamps: config.timestamps,
        }
    }
}

/// `EventSchedule.ScheduleList[0].Time_ActiveBetweenAny[0]` as `(start, end)`.
/// Zero stamps count as unscheduled.
pub fn schedule_window(event: &Value) -> Option<(i64, i64)> {
    let first = json_tree::items_at(event, &["EventSchedule", "ScheduleList"]).first()?;
    let window = json_tree::items_at(first, &["Time_ActiveBetweenAny"]).first()?;
    let bounds = json_tree::items(Some(window));
    let start = bounds.first().and_then(json_tree::as_i64)?;
    let end = bounds.get(1).and_then(json_tree::as_i64)?;
    (start != 0 && end != 0).then_some((start, end))
}

/// Identifiers that could not be fully resolved during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub missing_translations: BTreeSet<String>,
    pub missing_world_records: BTreeSet<String>,
    /// Neither translated nor present in the world-record data.
    pub unknown_cars: BTreeSet<String>,
}

impl RunSummary {
    pub fn merge(&mut self, other: RunSummary) {
        self.missing_translations.extend(other.missing_translations);
        self.missing_world_records.extend(other.missing_world_records);
        self.unknown_cars.extend(other.unknown_cars);
    }

    pub fn is_empty(&self) -> bool {
        self.missing_translations.is_empty()
            && self.missing_world_records.is_empty()
            && self.unknown_cars.is_empty()
    }

    pub fn render(&self) -> ReportText {
        let mut text = ReportText::new();
        let groups = [
            (&self.missing_translations, Color::Yellow, "cars missing translations"),
            (&self.missing_world_records, Color::Cyan, "cars missing WR data"),
            (&self.unknown_cars, Color::Red, "brand new cars detected"),
        ];
        for (ids, color, what) in groups {
            if ids.is_empty() {
                continue;
            }
            text.push(
                Line::colored("[SUMMARY]", color).text(format!(" {} {what}:", ids.len())),
            );
            for id in ids {
                text.push(Line::plain(format!("    • {id}")));
            }
        }
        text
    }
}

/// Output of one report phase.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub text: ReportText,
    pub summary: RunSummary,
}

impl Report {
    pub fn write_plain(&self, path: &Path) -> Result<()> {
        fs::write(path, self.text.plain())
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

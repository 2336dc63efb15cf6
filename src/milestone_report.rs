use std::path::Path;

use anyhow::Result;
use crossterm::style::Color;
use serde_json::Value;

use crate::assets;
use crate::json_tree;
use crate::render::{Line, ReportText, epoch_to_gmt};
use crate::report::{self, Report, ReportContext};
use crate::success;

pub const OUTPUT_FILE: &str = "milestone_output.txt";

fn is_milestone_file(file_name: &str) -> bool {
    let Some((stem, ext)) = file_name.rsplit_once('.') else {
        return false;
    };
    ext.eq_ignore_ascii_case("txt") && !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit())
}

/// `Milestone Season <n>:`, its window and the PC/MS reward cars.
pub fn milestone_section(document: &Value, ctx: &ReportContext) -> Option<ReportText> {
    let (title, season) = json_tree::root_entry(document)?;
    log::info!("Processing {title}");
    let rewards = json_tree::at(
        season,
        &["CrewLeaderboardRewardDefinitions", "SeasonalRewardCars", title],
    );
    let car = |key: &str| {
        rewards
            .and_then(|r| json_tree::str_at(r, &[key]))
            .filter(|name| !name.is_empty())
            .map(|name| ctx.translations.get_or(name).to_string())
            .unwrap_or_else(|| "None".to_string())
    };

    let mut text = ReportText::new();
    text.push(Line::colored(format!("Milestone Season {title}:"), Color::Cyan));
    if let Some((start, end)) = report::schedule_window(season) {
        text.push(Line::plain(epoch_to_gmt(start)));
        text.push(Line::plain(epoch_to_gmt(end)));
    }
    text.push(Line::plain(format!("PC : {}", car("PrestigeCupCar"))));
    text.push(Line::plain(format!("MS : {}", car("secondaryPrizeCarDBid"))));
    text.blank();
    Some(text)
}

pub fn build(text_dir: &Path, ctx: &ReportContext) -> Report {
    let mut text = ReportText::new();
    for file_name in assets::text_files_or_empty(text_dir) {
        if !is_milestone_file(&file_name) {
            continue;
        }
        match assets::read_json(&text_dir.join(&file_name)) {
            Ok(document) => {
                if let Some(section) = milestone_section(&document, ctx) {
                    text.extend(section);
                }
            }
            Err(err) => log::error!("Failed to load {file_name}: {err:#}"),
        }
    }
    Report {
        text,
        summary: Default::default(),
    }
}

pub fn run(text_dir: &Path, ctx: &ReportContext) -> Result<Report> {
    let report = build(text_dir, ctx);
    report.write_plain(&text_dir.join(OUTPUT_FILE))?;
    success!("Milestone output written to {OUTPUT_FILE}");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::TranslationTable;
    use serde_json::json;

    #[test]
    fn only_numeric_names_are_milestones() {
        assert!(is_milestone_file("123.txt"));
        assert!(is_milestone_file("7.TXT"));
        assert!(!is_milestone_file(".txt"));
        assert!(!is_milestone_file("12a.txt"));
        assert!(!is_milestone_file("123.json"));
    }

    #[test]
    fn season_lines_translate_reward_cars() {
        let doc = json!({"88": {
            "EventSchedule": {"ScheduleList": [{"Time_ActiveBetweenAny": [[0, 60]]}]},
            "CrewLeaderboardRewardDefinitions": {"SeasonalRewardCars": {"88": {
                "PrestigeCupCar": "PC_CAR",
                "secondaryPrizeCarDBid": "",
            }}},
        }});
        let ctx = ReportContext {
            translations: TranslationTable::from_pairs([("PC_CAR", "Prestige Car")]),
            ..ReportContext::default()
        };
        let text = milestone_section(&doc, &ctx).expect("section");
        assert_eq!(text.plain(), "Milestone Season 88:\nPC : Prestige Car\nMS : None\n");
    }
}

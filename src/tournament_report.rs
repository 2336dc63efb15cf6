use std::path::Path;

use anyhow::{Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::assets;
use crate::json_tree;
use crate::render::{Line, ReportText, format_timestamp};
use crate::report::{self, Report, ReportContext};
use crate::success;

pub const OUTPUT_FILE: &str = "tournament_output.txt";

const SEPARATOR_WIDTH: usize = 50;

static TOURNAMENT_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)TOURNAMENT_.*\.txt").expect("static regex"));
static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z])([A-Z])").expect("static regex"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex"));

/// `EPRange` becomes `EP Range 450 - 500`; other types are split into words.
pub fn format_restriction(restriction: &Value) -> String {
    let kind = json_tree::str_at(restriction, &["RestrictionType"]).unwrap_or("Unknown");
    let mut readable = CAMEL_BOUNDARY
        .replace_all(kind, "$1 $2")
        .replace("EPRange", "EP Range")
        .replace("PPRange", "PP Range");
    if matches!(kind, "EPRange" | "PPRange") {
        let bound = |keys: [&str; 2]| {
            keys.iter()
                .filter_map(|key| restriction.get(*key))
                .find(|value| json_tree::is_truthy(value))
                .map(json_tree::scalar_text)
        };
        if let (Some(min), Some(max)) = (bound(["MinEP", "MinPP"]), bound(["MaxEP", "MaxPP"])) {
            readable.push_str(&format!(" {min} - {max}"));
        }
    }
    readable
}

pub fn format_distance(race_event: &Value) -> &'static str {
    if json_tree::str_at(race_event, &["ECBRaceType"]) == Some("QuickestTime100Race") {
        "0-100 Sprint"
    } else if race_event.get("IsHalfMile").and_then(Value::as_bool) == Some(true) {
        "1/2 Mile"
    } else {
        "1/4 Mile"
    }
}

/// Seconds as `Hh Mm`.
pub fn format_cooldown(seconds: i64) -> String {
    let minutes = seconds / 60;
    format!("{}h {}m", minutes / 60, minutes % 60)
}

fn schedule_text(config_root: &Value, season_id: &str, ctx: &ReportContext) -> Option<String> {
    let digits = DIGITS.find(season_id).map(|m| m.as_str()).unwrap_or(season_id);
    let candidates = [
        format!("TOURNAMENTS_PARTS_GACHA_{digits}"),
        format!("TOURNAMENTS_PARTS_GACHA_{season_id}"),
    ];
    let entry = json_tree::items_at(config_root, &["EventSchedule", "ScheduleList"])
        .iter()
        .find(|entry| {
            json_tree::str_at(entry, &["id"]).is_some_and(|id| candidates.iter().any(|c| c == id))
        });
    let Some(entry) = entry else {
        log::warn!("Entry with id in {candidates:?} not found in ScheduleList.");
        return None;
    };
    let window = json_tree::items_at(entry, &["Time_ActiveBetweenAny"])
        .first()
        .map(|w| json_tree::items(Some(w)))
        .unwrap_or(&[]);
    let (Some(start), Some(end)) = (
        window.first().and_then(json_tree::as_i64),
        window.get(1).and_then(json_tree::as_i64),
    ) else {
        log::warn!("No timestamps found for {}", candidates[0]);
        return None;
    };
    log::debug!("Found tournament timing: start={start}, end={end}");
    Some(format!(
        "({} - {})",
        format_timestamp(start, ctx.timestamps),
        format_timestamp(end, ctx.timestamps)
    ))
}

fn race_lines(day: &str, race: &str, details: &Value, ctx: &ReportContext) -> [Line; 2] {
    let slot_name = json_tree::str_at(details, &["SlotId"])
        .and_then(|slot| ctx.collections.get(slot))
        .and_then(|names| names.first())
        .map(String::as_str)
        .unwrap_or("Unknown");
    let restriction = match json_tree::items_at(details, &["Restrictions"]).first() {
        Some(first) => format_restriction(first),
        None => "No Restrictions".to_string(),
    };
    let no_race_event = Value::Null;
    let distance = format_distance(details.get("RaceEvent").unwrap_or(&no_race_event));
    let cooldown = format_cooldown(json_tree::i64_at(details, &["CooldownTime"]).unwrap_or(0));
    [
        Line::plain(format!(
            "{} / {}",
            day.replace("Day", "Day "),
            race.replace("Race", "Race ")
        )),
        Line::plain(format!(
            "- {} ({restriction}) ({distance}) ({cooldown} Reset)",
            ctx.translations.get_or(slot_name)
        )),
    ]
}

/// Lines for one tournament document; empty when it has no schedule of races.
pub fn tournament_lines(document: &Value, ctx: &ReportContext) -> Result<Vec<Line>> {
    let root = document
        .as_object()
        .filter(|root| root.len() == 1)
        .ok_or_else(|| anyhow!("Expected a single root key like 'TOURNAMENT_244'."))?;
    let Some((tournament_id, config_root)) = root.iter().next() else {
        return Ok(Vec::new());
    };

    let events = json_tree::object_at(config_root, &["TournamentConfig", "TournamentEvents"]);
    let Some((season_id, season)) = events.and_then(|e| e.iter().next()) else {
        log::warn!("No TournamentEvents found for {tournament_id}");
        return Ok(Vec::new());
    };
    let periods: Option<&Map<String, Value>> =
        json_tree::object_at(season, &["PeriodDetails"]).filter(|p| !p.is_empty());
    let Some(periods) = periods else {
        log::warn!("No PeriodDetails found for {tournament_id}");
        return Ok(Vec::new());
    };

    let mut header = format!("Tournament Season {season_id}");
    if let Some(window) = schedule_text(config_root, season_id, ctx) {
        header.push_str(&format!(" - {window}"));
    }
    let mut lines = vec![Line::plain(header)];
    for (day, races) in periods {
        let Some(races) = races.as_object() else {
            continue;
        };
        for (race, details) in races {
            lines.extend(race_lines(day, race, details, ctx));
        }
    }
    Ok(lines)
}

/// Builds the tournament schedule for every tournament config in `text_dir`.
pub fn build(text_dir: &Path, ctx: &ReportContext) -> Report {
    let files: Vec<String> = assets::text_files_or_empty(text_dir)
        .into_iter()
        .filter(|name| TOURNAMENT_FILE.is_match(name) && !report::is_report_output(name))
        .collect();
    if files.is_empty() {
        log::error!("No tournament config files found.");
    }

    let mut text = ReportText::new();
    for file_name in &files {
        log::info!("Processing file: {file_name}");
        let lines = assets::read_json(&text_dir.join(file_name))
            .and_then(|document| tournament_lines(&document, ctx));
        match lines {
            Ok(lines) if lines.is_empty() => {}
            Ok(lines) => {
                for line in lines {
                    text.push(line);
                }
                text.blank();
                text.push(Line::plain("=".repeat(SEPARATOR_WIDTH)));
                text.blank();
            }
            Err(err) => log::error!("Failed to process {file_name}: {err:#}"),
        }
    }
    Report {
        text,
        summary: Default::default(),
    }
}

pub fn run(text_dir: &Path, ctx: &ReportContext) -> Result<Report> {
    let report = build(text_dir, ctx);
    if report.text.is_empty() {
        log::warn!("No data to write for tournaments.");
        return Ok(report);
    }
    let path = text_dir.join(OUTPUT_FILE);
    report.write_plain(&path)?;
    success!("Tournament output written to {}", path.display());
    Ok(report)
}

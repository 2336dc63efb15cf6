use std::path::Path;

use anyhow::{Context, Result};
use crossterm::style::Color;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::annotate::{self, AnnotatedLine, AnnotationSources, ShowdownPrizes};
use crate::assets;
use crate::json_tree;
use crate::render::{Line, ReportText, epoch_to_gmt};
use crate::report::{self, Report, ReportContext, RunSummary};
use crate::rewards::{self, EventPrize, RaceWins};
use crate::success;

pub const OUTPUT_FILE: &str = "event_output.txt";

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("static regex"));
static COMPANION_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[_ ](sd|bs)\d*$").expect("static regex"));
static TRAILING_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"_?\d{4}$").expect("static regex"));

/// Cars restricted to one or more slots that share the same line-up.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotGroup {
    pub models: Vec<String>,
    pub slots: Vec<String>,
}

impl SlotGroup {
    fn first_number(slot: &str) -> Option<u64> {
        NUMBER.find(slot).and_then(|m| m.as_str().parse().ok())
    }

    /// Lowest number in any slot label; groups without one sort last.
    pub fn sort_key(&self) -> (bool, u64) {
        match self.slots.iter().filter_map(|s| Self::first_number(s)).min() {
            Some(n) => (false, n),
            None => (true, 0),
        }
    }

    /// `Slot 1 / 3`, or the bare labels when none carries a number.
    pub fn label(&self) -> String {
        let numbers: Vec<&str> = self
            .slots
            .iter()
            .filter_map(|s| NUMBER.find(s).map(|m| m.as_str()))
            .collect();
        if !numbers.is_empty() {
            return format!("Slot {}", numbers.join(" / "));
        }
        let others: Vec<String> = self
            .slots
            .iter()
            .map(|s| NON_WORD.replace_all(s, "").into_owned())
            .collect();
        if others.is_empty() {
            "Slot ?".to_string()
        } else {
            format!("Slot {}", others.join(" / "))
        }
    }
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

/// Reads `LockinNamespaces.Namespaces.<title>.LockinSlotsList` into slot
/// groups, ordered for display.
pub fn slot_groups(event: &Value, title: &str) -> Vec<SlotGroup> {
    let entries = json_tree::items_at(
        event,
        &["LockinNamespaces", "Namespaces", title, "LockinSlotsList"],
    );
    let mut per_slot: Vec<(String, Vec<String>)> = Vec::new();
    for entry in entries {
        let mut models: Vec<String> = Vec::new();
        for restriction in json_tree::items_at(entry, &["Restrictions"]) {
            if json_tree::str_at(restriction, &["RestrictionType"]) != Some("CarModel") {
                continue;
            }
            if let Some(model) = json_tree::str_at(restriction, &["Model"]).filter(|m| !m.is_empty())
            {
                push_unique(&mut models, model);
            }
        }
        for slot_id in json_tree::items_at(entry, &["SlotIds"]).iter().filter_map(Value::as_str) {
            let label = slot_id.trim().trim_matches(|c| c == '{' || c == '}');
            let idx = match per_slot.iter().position(|(existing, _)| existing == label) {
                Some(idx) => idx,
                None => {
                    per_slot.push((label.to_string(), Vec::new()));
                    per_slot.len() - 1
                }
            };
            for model in &models {
                push_unique(&mut per_slot[idx].1, model);
            }
        }
    }

    let mut groups: Vec<SlotGroup> = Vec::new();
    for (slot, models) in per_slot {
        match groups.iter_mut().find(|g| g.models == models) {
            Some(group) => group.slots.push(slot),
            None => groups.push(SlotGroup {
                models,
                slots: vec![slot],
            }),
        }
    }
    groups.sort_by_key(SlotGroup::sort_key);
    groups
}

fn normalize_companion_name(file_name: &str) -> String {
    let stem = if file_name.to_ascii_lowercase().ends_with(".txt") {
        &file_name[..file_name.len() - 4]
    } else {
        file_name
    };
    // The year and the SD/BS marker come in either order.
    let mut stem = stem.to_string();
    loop {
        let stripped = {
            let without_year = TRAILING_YEAR.replace(&stem, "");
            COMPANION_SUFFIX.replace(&without_year, "").into_owned()
        };
        if stripped == stem {
            break;
        }
        stem = stripped;
    }
    strip_separators(&stem)
}

fn normalize_event_title(title: &str) -> String {
    let base = match title.rsplit_once('_') {
        Some((head, tail)) if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) => head,
        _ => title,
    };
    strip_separators(base)
}

fn strip_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '_' && *c != ' ')
        .collect::<String>()
        .to_lowercase()
}

fn is_companion_file(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    lower.contains("_sd") || lower.ends_with("_bs.txt")
}

/// The showdown/bespoke-showdown file that runs alongside `title`, if any.
pub fn find_companion<'a>(title: &str, candidates: &'a [String]) -> Option<&'a str> {
    let wanted = normalize_event_title(title);
    candidates
        .iter()
        .filter(|name| is_companion_file(name))
        .find(|name| normalize_companion_name(name) == wanted)
        .map(String::as_str)
}

fn skip_reason(file_name: &str) -> Option<&'static str> {
    let lower = file_name.to_ascii_lowercase();
    if report::is_report_output(file_name) {
        Some("report output")
    } else if lower.contains("_sd") || lower.contains("smp_showdown_") {
        Some("Showdown variant")
    } else if lower.contains("tournament_") {
        Some("Tournament variant")
    } else if lower.ends_with("_bs.txt") {
        Some("Bespoke Showdown variant")
    } else {
        None
    }
}

#[derive(Debug, Clone)]
struct EventSection {
    start: Option<i64>,
    text: ReportText,
}

fn load_showdown_prizes(
    text_dir: &Path,
    file_name: &str,
    ctx: &ReportContext,
) -> Option<ShowdownPrizes> {
    let path = text_dir.join(file_name);
    match assets::read_json(&path) {
        Ok(doc) => {
            let prizes = ShowdownPrizes::from_document(&doc, &ctx.translations)?;
            if !prizes.is_empty() {
                log::info!("Extracted {} SD prizes from {file_name}", prizes.prizes.len());
            }
            Some(prizes)
        }
        Err(err) => {
            log::error!("Failed to process SD file {file_name}: {err:#}");
            None
        }
    }
}

/// `Ok(None)` for files that are not lock-in events.
fn parse_event_file(
    text_dir: &Path,
    file_name: &str,
    companions: &[String],
    ctx: &ReportContext,
    summary: &mut RunSummary,
) -> Result<Option<EventSection>> {
    let content = assets::read_text(&text_dir.join(file_name))?;
    if !json_tree::looks_like_keyed_object(&content) {
        log::warn!("Skipping {file_name} (not event format)");
        return Ok(None);
    }
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse JSON {file_name}"))?;
    let Some((title, event)) = json_tree::root_entry(&document) else {
        return Ok(None);
    };
    if title.bytes().all(|b| b.is_ascii_digit()) {
        log::debug!("Skipping {file_name} (milestone file detected)");
        return Ok(None);
    }
    log::info!("Processing {title}");

    let window = report::schedule_window(event);
    let showdown = find_companion(title, companions)
        .and_then(|companion| load_showdown_prizes(text_dir, companion, ctx));
    let groups = slot_groups(event, title);
    let records = rewards::extract_rewards(event, title);
    let race_wins = RaceWins::from_records(&records);
    let prize = rewards::event_prize(event, &records);
    let shop = ctx.shop.for_schedule(title);
    let gold_key_cars = annotate::gold_key_cars(event);
    if !gold_key_cars.is_empty() {
        log::debug!("Gold Key pullable cars for {title}: {gold_key_cars:?}");
    }
    let sources = AnnotationSources {
        race_wins: &race_wins,
        gold_key_cars: &gold_key_cars,
        shop: &shop,
        showdown: showdown.as_ref(),
    };

    let mut text = ReportText::new();
    let pretty = ctx.translations.event_title(title);
    if pretty != title {
        text.push(Line::colored(pretty, Color::Cyan).text(format!(" ({title})")));
    } else {
        text.push(Line::colored(title, Color::Cyan));
    }
    if let Some((start, end)) = window {
        text.push(Line::plain(epoch_to_gmt(start)));
        text.push(Line::plain(epoch_to_gmt(end)));
    }
    text.blank();

    for group in &groups {
        text.push(Line::colored(group.label(), Color::Green));
        for model in &group.models {
            for name in ctx.translations.resolve(model, ctx.debug) {
                if !name.translated {
                    log::warn!("Missing translation for {model}");
                    summary.missing_translations.insert(model.clone());
                }
                text.push(AnnotatedLine::new(name, model, &sources).to_line());
            }
        }
        text.blank();
    }

    match prize {
        Some(EventPrize::Car(car)) => text.push(Line::colored(
            format!("Prize Car : {}", ctx.translations.get_or(&car)),
            Color::Magenta,
        )),
        Some(EventPrize::Sticker(sticker)) => text.push(Line::colored(
            format!("Prize Sticker : {}", ctx.translations.get_or(&sticker)),
            Color::Magenta,
        )),
        None => {}
    }
    text.blank();

    Ok(Some(EventSection {
        start: window.map(|(start, _)| start),
        text,
    }))
}

/// Builds the report for every lock-in event file in `text_dir`, ordered by
/// start time with unscheduled events last.
pub fn build(text_dir: &Path, ctx: &ReportContext) -> Report {
    let files = assets::text_files_or_empty(text_dir);
    let companions: Vec<String> = files
        .iter()
        .filter(|name| is_companion_file(name))
        .cloned()
        .collect();

    let mut summary = RunSummary::default();
    let mut sections = Vec::new();
    for file_name in &files {
        if let Some(reason) = skip_reason(file_name) {
            log::debug!("Skipping {file_name} ({reason})");
            continue;
        }
        match parse_event_file(text_dir, file_name, &companions, ctx, &mut summary) {
            Ok(Some(section)) => sections.push(section),
            Ok(None) => {}
            Err(err) => log::error!("{err:#}"),
        }
    }
    sections.sort_by_key(|section| (section.start.is_none(), section.start));

    let mut text = ReportText::new();
    for section in sections {
        text.extend(section.text);
    }
    Report { text, summary }
}

/// Builds the event report and writes its plain rendering next to the inputs.
pub fn run(text_dir: &Path, ctx: &ReportContext) -> Result<Report> {
    let report = build(text_dir, ctx);
    report.write_plain(&text_dir.join(OUTPUT_FILE))?;
    success!("Event output written to {OUTPUT_FILE}");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slot(ids: &[&str], models: &[&str]) -> Value {
        let restrictions: Vec<Value> = models
            .iter()
            .map(|m| json!({"RestrictionType": "CarModel", "Model": m}))
            .collect();
        json!({"SlotIds": ids, "Restrictions": restrictions})
    }

    fn lockin(slots: Vec<Value>) -> Value {
        json!({"LockinNamespaces": {"Namespaces": {"EVT": {"LockinSlotsList": slots}}}})
    }

    #[test]
    fn groups_sort_by_lowest_slot_number_then_unnumbered() {
        let event = lockin(vec![
            slot(&["Slot3"], &["CAR_C"]),
            slot(&["Slot1"], &["CAR_A"]),
            slot(&["SlotA"], &["CAR_X"]),
        ]);
        let labels: Vec<String> = slot_groups(&event, "EVT").iter().map(SlotGroup::label).collect();
        assert_eq!(labels, vec!["Slot 1", "Slot 3", "Slot SlotA"]);
    }

    #[test]
    fn slots_with_identical_lineups_share_a_group() {
        let event = lockin(vec![
            slot(&[" {Slot4} ", "Slot2"], &["CAR_A", "CAR_B", "CAR_A"]),
            slot(&["Slot7"], &["CAR_B"]),
            json!({"SlotIds": ["Slot9"], "Restrictions": [{"RestrictionType": "Other", "Model": "X"}]}),
        ]);
        let groups = slot_groups(&event, "EVT");
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].slots, vec!["Slot4", "Slot2"]);
        assert_eq!(groups[0].models, vec!["CAR_A", "CAR_B"]);
        assert_eq!(groups[0].label(), "Slot 4 / 2");
        assert_eq!(groups[1].label(), "Slot 7");
        assert!(groups[2].models.is_empty());
    }

    #[test]
    fn companion_match_ignores_year_suffix_and_case() {
        let candidates = vec![
            "Other_Event_SD.txt".to_string(),
            "Summer_Cup_2024_SD2.txt".to_string(),
            "summer cup_BS.txt".to_string(),
        ];
        assert_eq!(
            find_companion("SUMMER_CUP_2024", &candidates),
            Some("Summer_Cup_2024_SD2.txt")
        );
        assert_eq!(find_companion("SUMMER_CUP", &candidates), Some("Summer_Cup_2024_SD2.txt"));
        assert_eq!(find_companion("WINTER_CUP", &candidates), None);
    }

    #[test]
    fn companion_year_may_follow_the_showdown_marker() {
        let candidates = vec!["SUMMER_CUP_SD_2024.txt".to_string()];
        assert_eq!(
            find_companion("SUMMER_CUP_2024", &candidates),
            Some("SUMMER_CUP_SD_2024.txt")
        );
        assert_eq!(normalize_companion_name("EVT_BS_2023.txt"), "evt");
        assert_eq!(normalize_companion_name("EVT_2023_BS.txt"), "evt");
    }

    #[test]
    fn variant_files_are_skipped() {
        assert!(skip_reason("SMP_SHOWDOWN_12_W1.txt").is_some());
        assert!(skip_reason("EVT_SD.txt").is_some());
        assert!(skip_reason("TOURNAMENT_5.txt").is_some());
        assert!(skip_reason("EVT_BS.txt").is_some());
        assert!(skip_reason("event_output.txt").is_some());
        assert!(skip_reason("EVT_2024.txt").is_none());
    }
}

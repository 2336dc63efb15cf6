use std::path::Path;

use anyhow::{Context, Result};
use crossterm::style::Color;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::assets;
use crate::config::TimestampStyle;
use crate::json_tree;
use crate::render::{self, Line, ReportText, Span, format_timestamp};
use crate::report::{self, Report, ReportContext, RunSummary};
use crate::success;
use crate::world_records::TimeSource;

pub const OUTPUT_FILE: &str = "sd_output.txt";

/// Sort value for cars without a recorded time.
const MISSING_TIME: f64 = 999.999;

static WEEKLY_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^SMP_SHOWDOWN_\d+_W\d+\.txt").expect("static regex"));
static SPECIAL_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*_BS\.txt|.*_SD.*\.txt)").expect("static regex"));
static SEASON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"SMP_SHOWDOWN_(\d+)_W\d+").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowdownKind {
    Weekly,
    Elite,
    Championship,
    Special,
}

impl ShowdownKind {
    pub fn color(self) -> Color {
        match self {
            ShowdownKind::Weekly => Color::White,
            ShowdownKind::Elite => Color::Magenta,
            ShowdownKind::Championship => Color::Red,
            ShowdownKind::Special => Color::Blue,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ShowdownKind::Elite => "Elite Showdown",
            ShowdownKind::Championship => "Championship Showdown",
            ShowdownKind::Weekly | ShowdownKind::Special => "Showdown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarStatus {
    Complete,
    MissingTranslation,
    MissingRecord,
    /// In neither the translation table nor the world-record data.
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowdownCar {
    pub car_id: String,
    pub name: String,
    pub display_time: Option<f64>,
    pub tier: Option<String>,
    pub star: Option<String>,
    pub source: TimeSource,
    pub status: CarStatus,
    /// Gold price when the car is on sale during this showdown.
    pub sale_price: Option<i64>,
}

impl ShowdownCar {
    fn tier_number(&self) -> Option<u32> {
        self.tier
            .as_deref()
            .and_then(|t| t.strip_prefix('T'))
            .and_then(|rest| rest.chars().next())
            .and_then(|c| c.to_digit(10))
    }

    /// T4 and up race the half mile.
    pub fn is_half_mile(&self) -> bool {
        self.tier_number().is_some_and(|n| n >= 4)
    }

    fn is_quarter_mile(&self) -> bool {
        matches!(self.tier.as_deref(), Some("T1" | "T2" | "T3"))
    }
}

/// Half-mile cars first, then ascending time; missing times sort last.
pub fn sort_cars(cars: &mut [ShowdownCar]) {
    cars.sort_by(|a, b| {
        b.is_half_mile()
            .cmp(&a.is_half_mile())
            .then_with(|| time_key(a).total_cmp(&time_key(b)))
    });
}

fn time_key(car: &ShowdownCar) -> f64 {
    car.display_time.unwrap_or(MISSING_TIME)
}

pub fn resolve_cars(
    models: &[&str],
    ctx: &ReportContext,
    summary: &mut RunSummary,
) -> Vec<ShowdownCar> {
    let mut cars = Vec::new();
    for car_id in models.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        let translated = if ctx.crdb {
            Some(car_id)
        } else {
            ctx.translations.get(car_id)
        };
        let record = ctx.world_records.get(car_id);
        let status = match (translated, record) {
            (None, None) => {
                log::warn!("New car detected (not in translations or WR): {car_id}");
                summary.unknown_cars.insert(car_id.to_string());
                CarStatus::Unknown
            }
            (None, Some(_)) => {
                log::warn!("Missing translation for car id: {car_id}");
                summary.missing_translations.insert(car_id.to_string());
                CarStatus::MissingTranslation
            }
            (Some(_), None) => {
                log::info!("No WR data for {car_id}");
                summary.missing_world_records.insert(car_id.to_string());
                CarStatus::MissingRecord
            }
            (Some(_), Some(_)) => CarStatus::Complete,
        };
        cars.push(ShowdownCar {
            car_id: car_id.to_string(),
            name: translated.unwrap_or(car_id).to_string(),
            display_time: record.and_then(|r| r.display_time),
            tier: record.and_then(|r| r.tier.clone()),
            star: record.and_then(|r| r.star.clone()),
            source: record.map(|r| r.source).unwrap_or(TimeSource::Dyno),
            status,
            sale_price: None,
        });
    }
    cars
}

fn star_spans(star: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    for (idx, part) in star.split('_').enumerate() {
        if idx > 0 {
            spans.push(Span::plain("_"));
        }
        spans.push(if part.contains('P') {
            Span::colored(part, Color::Magenta)
        } else if part.contains('G') {
            Span::colored(part, Color::Yellow)
        } else {
            Span::plain(part)
        });
    }
    spans
}

/// `• Name (Best ET - 9.876) (T4 P3) - Car For Sale - 250 Gold Coins`
pub fn car_line(car: &ShowdownCar, mark_quarter: bool, show_raw_id: bool) -> Line {
    let mut name = car.name.clone();
    if show_raw_id && car.car_id != car.name {
        name.push_str(&format!(" ({})", car.car_id));
    }
    let time = match car.display_time {
        Some(t) => format!("{t:.3}"),
        None => "N/A".to_string(),
    };
    let head = format!("{name} ({} - {time})", car.source.label());
    let head_color = match (car.display_time, car.status) {
        (None, CarStatus::Unknown) => Some(Color::Red),
        (None, CarStatus::MissingRecord) => Some(Color::Yellow),
        _ => None,
    };

    let mut line = Line::plain("• ").with(Span {
        text: head,
        color: head_color,
    });
    line = line.text(format!(" ({} ", car.tier.as_deref().unwrap_or("?")));
    for span in star_spans(car.star.as_deref().unwrap_or("?")) {
        line = line.with(span);
    }
    line = line.text(")");
    if let Some(price) = car.sale_price {
        line = line
            .text(" - Car For Sale - ")
            .paint(format!("{price} Gold Coins"), Color::Yellow);
    }
    if mark_quarter && car.is_quarter_mile() {
        line = line.text(" (1/4 mile Time Only)");
    }
    line
}

#[derive(Debug, Clone)]
pub struct ShowdownSection {
    pub title: String,
    pub kind: ShowdownKind,
    /// Unscheduled showdowns have no window and are listed last.
    pub window: Option<(i64, i64)>,
    pub cars: Vec<ShowdownCar>,
}

impl ShowdownSection {
    pub fn render(&self, timestamps: TimestampStyle, show_raw_id: bool) -> ReportText {
        let mut text = ReportText::new();
        let mut header = Line::colored(self.title.as_str(), self.kind.color());
        if let Some((start, end)) = self.window {
            header = header.text(format!(
                " ({} - {})",
                format_timestamp(start, timestamps),
                format_timestamp(end, timestamps)
            ));
        }
        text.push(header);
        text.blank();

        let mark_quarter = self.cars.iter().any(ShowdownCar::is_half_mile)
            && self.cars.iter().any(ShowdownCar::is_quarter_mile);
        let mut cars = self.cars.clone();
        sort_cars(&mut cars);
        for car in &cars {
            text.push(car_line(car, mark_quarter, show_raw_id));
        }
        text
    }
}

fn showdown_kind(event: &Value) -> ShowdownKind {
    for group in json_tree::items_at(event, &["ShowdownEventsContainer", "RaceEventGroups"]) {
        let pin = json_tree::str_at(group, &["PinPositionId"]).unwrap_or("");
        if pin.contains("CHMPIONSHIP_SHOWDOWN") {
            return ShowdownKind::Championship;
        }
        if pin.contains("SD_ELITE_SHOWDOWN") {
            return ShowdownKind::Elite;
        }
    }
    ShowdownKind::Weekly
}

fn car_models(event: &Value) -> Vec<&str> {
    let mut models = Vec::new();
    for group in json_tree::items_at(event, &["ShowdownEventsContainer", "RaceEventGroups"]) {
        for race in json_tree::items_at(group, &["RaceEvents"]) {
            for restriction in json_tree::items_at(race, &["Restrictions"]) {
                if json_tree::str_at(restriction, &["RestrictionType"]) != Some("CarModels") {
                    continue;
                }
                models.extend(
                    json_tree::items_at(restriction, &["Models"])
                        .iter()
                        .filter_map(Value::as_str),
                );
            }
        }
    }
    models
}

fn file_stem(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name)
}

fn parse_showdown_file(
    text_dir: &Path,
    file_name: &str,
    special: bool,
    ctx: &ReportContext,
    summary: &mut RunSummary,
) -> Result<ShowdownSection> {
    let document = assets::read_json(&text_dir.join(file_name))?;
    let (_, event) = json_tree::root_entry(&document)
        .with_context(|| format!("{file_name} has no event object"))?;
    let window = report::schedule_window(event);
    if window.is_none() {
        log::warn!("{file_name} has no schedule window");
    }
    let stem = file_stem(file_name);

    let (kind, title) = if special {
        (
            ShowdownKind::Special,
            format!("{} - Showdown", ctx.translations.event_title(stem)),
        )
    } else {
        let schedule_id = json_tree::items_at(event, &["EventSchedule", "ScheduleList"])
            .first()
            .and_then(|s| json_tree::str_at(s, &["ScheduleID"]))
            .unwrap_or("");
        let season = SEASON
            .captures(schedule_id)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or("?");
        let kind = showdown_kind(event);
        (kind, format!("{} - Season {season}", kind.label()))
    };

    let mut cars = resolve_cars(&car_models(event), ctx, summary);
    if !special && stem.contains("_W2") {
        if !ctx.shop.has_offers_for(stem) {
            log::warn!(
                "W2 Showdowns are supposed to have a car for sale, please update ShopTimeGatedEvents.meta."
            );
        }
        for car in &mut cars {
            car.sale_price = ctx.shop.quantity_for(stem, &car.car_id);
        }
    }

    Ok(ShowdownSection {
        title,
        kind,
        window,
        cars,
    })
}

/// Builds every weekly and special showdown listing in `text_dir`, ordered
/// by start time with unscheduled showdowns last.
pub fn build(text_dir: &Path, ctx: &ReportContext) -> Report {
    if ctx.crdb {
        log::debug!("CRDB mode enabled");
    }
    let mut summary = RunSummary::default();
    let mut sections = Vec::new();
    for file_name in assets::text_files_or_empty(text_dir) {
        if report::is_report_output(&file_name) {
            continue;
        }
        let special = if WEEKLY_FILE.is_match(&file_name) {
            false
        } else if SPECIAL_FILE.is_match(&file_name) {
            true
        } else {
            continue;
        };
        log::info!("Parsing showdown file: {file_name}");
        match parse_showdown_file(text_dir, &file_name, special, ctx, &mut summary) {
            Ok(section) => sections.push(section),
            Err(err) => log::error!("Failed to process {file_name}: {err:#}"),
        }
    }
    sections.sort_by_key(|section| {
        let start = section.window.map(|(start, _)| start);
        (start.is_none(), start)
    });

    let show_raw_id = ctx.debug && !ctx.crdb;
    let text = render::join_sections(
        sections
            .iter()
            .map(|section| section.render(ctx.timestamps, show_raw_id))
            .collect(),
        "",
    );
    Report { text, summary }
}

pub fn run(text_dir: &Path, ctx: &ReportContext) -> Result<Report> {
    let report = build(text_dir, ctx);
    if report.text.is_empty() {
        log::warn!("No showdown files matched in this folder.");
        return Ok(report);
    }
    report.write_plain(&text_dir.join(OUTPUT_FILE))?;
    success!("Wrote results to {OUTPUT_FILE}");
    Ok(report)
}

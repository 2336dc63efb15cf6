use crossterm::style::Color;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::json_tree;
use crate::matching::matches_either;
use crate::render::{Line, Span};
use crate::rewards::{CAR_REWARD, RaceWins};
use crate::shop::ShopPromotionEntry;
use crate::translation::{ResolvedName, TranslationTable};

static GOLD_MACHINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)_GOLD_[A-Z]$").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    RaceWin,
    GoldKey,
    Shop,
    ShowdownPrize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub text: String,
}

impl Annotation {
    fn new(kind: AnnotationKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn color(&self) -> Option<Color> {
        match self.kind {
            AnnotationKind::RaceWin => None,
            AnnotationKind::GoldKey | AnnotationKind::Shop => Some(Color::Yellow),
            AnnotationKind::ShowdownPrize => Some(Color::Blue),
        }
    }

    fn span(&self) -> Span {
        Span {
            text: self.text.clone(),
            color: self.color(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShowdownPrizes {
    pub event_name: String,
    pub prizes: Vec<(String, String)>,
}

impl ShowdownPrizes {
    /// Reads `ShowdownMilestoneRewards.RewardContainers.<title>.brackets`.
    /// A car named by several brackets keeps its first position and the
    /// last threshold.
    pub fn from_document(document: &Value, translations: &TranslationTable) -> Option<Self> {
        let (title, event) = json_tree::root_entry(document)?;
        let brackets = json_tree::items_at(
            event,
            &["ShowdownMilestoneRewards", "RewardContainers", title, "brackets"],
        );
        let mut prizes: Vec<(String, String)> = Vec::new();
        for bracket in brackets {
            let threshold = bracket
                .get("threshold")
                .map(json_tree::scalar_text)
                .unwrap_or_else(|| "None".to_string());
            for reward in json_tree::items_at(bracket, &["rewards"]) {
                let Some(info) = reward.get("reward") else {
                    continue;
                };
                if json_tree::i64_at(info, &["rewardType"]) != Some(CAR_REWARD) {
                    continue;
                }
                let Some(name) = json_tree::str_at(info, &["name"]).filter(|n| !n.is_empty())
                else {
                    continue;
                };
                match prizes.iter_mut().find(|(existing, _)| existing == name) {
                    Some((_, current)) => *current = threshold.clone(),
                    None => prizes.push((name.to_string(), threshold.clone())),
                }
            }
        }
        Some(Self {
            event_name: translations.event_title(title),
            prizes,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.prizes.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnnotationSources<'a> {
    pub race_wins: &'a RaceWins,
    pub gold_key_cars: &'a [String],
    pub shop: &'a [ShopPromotionEntry],
    pub showdown: Option<&'a ShowdownPrizes>,
}

pub fn annotate(resolved_key: &str, slot_model: &str, sources: &AnnotationSources) -> Vec<Annotation> {
    let mut out = Vec::new();

    if let Some((_, wins)) = sources
        .race_wins
        .iter()
        .find(|(name, _)| matches_either(name, slot_model))
    {
        let text = match wins {
            Some(wins) => format!("Winnable Race {wins}"),
            None => "Winnable Race".to_string(),
        };
        out.push(Annotation::new(AnnotationKind::RaceWin, text));
    }

    if sources
        .gold_key_cars
        .iter()
        .any(|car| matches_either(car, resolved_key))
    {
        out.push(Annotation::new(AnnotationKind::GoldKey, "Pullable GK"));
    }

    let mut check_keys = vec![resolved_key];
    if slot_model != resolved_key {
        check_keys.push(slot_model);
    }
    for entry in sources.shop {
        if !check_keys.iter().any(|key| matches_either(&entry.car_id, key)) {
            continue;
        }
        let text = entry.price_text();
        if !out
            .iter()
            .any(|a| a.kind == AnnotationKind::Shop && a.text == text)
        {
            out.push(Annotation::new(AnnotationKind::Shop, text));
        }
    }

    if let Some(showdown) = sources.showdown
        && let Some((_, threshold)) = showdown
            .prizes
            .iter()
            .find(|(name, _)| matches_either(name, slot_model))
    {
        out.push(Annotation::new(
            AnnotationKind::ShowdownPrize,
            format!("{} {threshold} SD Prize Car", showdown.event_name),
        ));
    }

    out
}

/// Reward names of car weight alterations on Gold Key machines, first
/// occurrence kept.
pub fn gold_key_cars(event: &Value) -> Vec<String> {
    let mut cars: Vec<String> = Vec::new();
    for gacha in json_tree::items_at(event, &["GachaEventsCalendar", "GachaEvents"]) {
        for alteration in json_tree::items_at(gacha, &["GachaWeightAlterations"]) {
            if json_tree::i64_at(alteration, &["RewardType"]) != Some(CAR_REWARD) {
                continue;
            }
            let Some(name) = json_tree::str_at(alteration, &["RewardName"]).filter(|n| !n.is_empty())
            else {
                continue;
            };
            let machine = json_tree::str_at(alteration, &["AffectedGachaMachine"]).unwrap_or("");
            if GOLD_MACHINE.is_match(machine) && !cars.iter().any(|c| c == name) {
                cars.push(name.to_string());
            }
        }
    }
    cars
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedLine {
    pub name: ResolvedName,
    pub annotations: Vec<Annotation>,
}

impl AnnotatedLine {
    pub fn new(name: ResolvedName, slot_model: &str, sources: &AnnotationSources) -> Self {
        let annotations = annotate(&name.key, slot_model, sources);
        Self { name, annotations }
    }

    /// `Name (PS) - Winnable Race 5 / 250 Gold Coins`
    pub fn to_line(&self) -> Line {
        let mut line = Line::plain(self.name.display.as_str())
            .text(" ")
            .paint(self.name.tag.label(), self.name.tag.color());
        for (idx, annotation) in self.annotations.iter().enumerate() {
            line = line.text(if idx == 0 { " - " } else { " / " });
            line = line.with(annotation.span());
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::RewardRecord;
    use crate::translation::VariantTag;
    use serde_json::json;

    fn wins(entries: &[(&str, i64)]) -> RaceWins {
        let records: Vec<RewardRecord> = entries
            .iter()
            .map(|(name, wins)| RewardRecord {
                reward_type: Some(CAR_REWARD),
                name: Some(name.to_string()),
                wins_required: Some(*wins),
            })
            .collect();
        RaceWins::from_records(&records)
    }

    fn offer(car: &str, quantity: i64) -> ShopPromotionEntry {
        ShopPromotionEntry {
            car_id: car.to_string(),
            quantity,
            schedule_ids: vec!["EVT".to_string()],
        }
    }

    fn texts(annotations: &[Annotation]) -> Vec<&str> {
        annotations.iter().map(|a| a.text.as_str()).collect()
    }

    #[test]
    fn sources_apply_in_fixed_order() {
        let race_wins = wins(&[("ZONDA_R_Reward", 3), ("ZONDA_R_Reward", 5)]);
        let gold = vec!["ZONDA_R_RewardRecycled".to_string()];
        let shop = vec![offer("ZONDA_R", 250), offer("Zonda-R", 250), offer("ZONDA_R", 0)];
        let showdown = ShowdownPrizes {
            event_name: "Big Showdown".to_string(),
            prizes: vec![("ZONDA_R".to_string(), "1500".to_string())],
        };
        let sources = AnnotationSources {
            race_wins: &race_wins,
            gold_key_cars: &gold,
            shop: &shop,
            showdown: Some(&showdown),
        };
        let out = annotate("ZONDA_R_RewardRecycled", "ZONDA_R", &sources);
        assert_eq!(
            texts(&out),
            vec![
                "Winnable Race 5",
                "Pullable GK",
                "250 Gold Coins",
                "0 Gold Coins",
                "Big Showdown 1500 SD Prize Car",
            ]
        );
    }

    #[test]
    fn only_first_race_win_is_used() {
        let race_wins = wins(&[("CAR_A", 2), ("CAR_A_Gold", 9)]);
        let sources = AnnotationSources {
            race_wins: &race_wins,
            gold_key_cars: &[],
            shop: &[],
            showdown: None,
        };
        assert_eq!(texts(&annotate("CAR_A", "CAR_A", &sources)), vec!["Winnable Race 2"]);
    }

    #[test]
    fn wildcard_slot_model_matches_shop_offer() {
        let race_wins = RaceWins::default();
        let shop = vec![offer("ABC_9_TAIL", 75)];
        let sources = AnnotationSources {
            race_wins: &race_wins,
            gold_key_cars: &[],
            shop: &shop,
            showdown: None,
        };
        assert_eq!(
            texts(&annotate("ABC_1", "ABC_*_TAIL", &sources)),
            vec!["75 Gold Coins"]
        );
        assert!(annotate("XYZ", "XYZ", &sources).is_empty());
    }

    #[test]
    fn gold_key_needs_gold_machine_and_car_type() {
        let event = json!({"GachaEventsCalendar": {"GachaEvents": [
            {"GachaWeightAlterations": [
                {"RewardType": 11, "RewardName": "CAR_A", "AffectedGachaMachine": "KEY_GOLD_B"},
                {"RewardType": 11, "RewardName": "CAR_A", "AffectedGachaMachine": "KEY_gold_c"},
                {"RewardType": 11, "RewardName": "CAR_B", "AffectedGachaMachine": "KEY_SILVER_A"},
                {"RewardType": 3, "RewardName": "CASH", "AffectedGachaMachine": "KEY_GOLD_A"},
                {"RewardType": 11, "RewardName": "CAR_C", "AffectedGachaMachine": "KEY_GOLD_AB"},
            ]},
            {"GachaWeightAlterations": [
                {"RewardType": 11, "RewardName": "CAR_D", "AffectedGachaMachine": "X_GOLD_Z"},
            ]},
        ]}});
        assert_eq!(gold_key_cars(&event), vec!["CAR_A", "CAR_D"]);
    }

    #[test]
    fn showdown_prizes_from_companion_document() {
        let doc = json!({"SD_EVT_2024": {"ShowdownMilestoneRewards": {"RewardContainers": {
            "SD_EVT_2024": {"brackets": [
                {"threshold": 500, "rewards": [
                    {"reward": {"rewardType": 11, "name": "CAR_A"}},
                    {"reward": {"rewardType": 44, "name": "STICKER"}},
                ]},
                {"threshold": 900, "rewards": [{"reward": {"rewardType": 11, "name": "CAR_A"}}]},
            ]}
        }}}});
        let table = TranslationTable::from_pairs([("TEXT_SD_EVT_2024_TITLE", "Summer Showdown")]);
        let prizes = ShowdownPrizes::from_document(&doc, &table).expect("prizes");
        assert_eq!(prizes.event_name, "Summer Showdown");
        assert_eq!(prizes.prizes, vec![("CAR_A".to_string(), "900".to_string())]);
    }

    #[test]
    fn line_renders_tag_and_annotations_in_both_targets() {
        let line = AnnotatedLine {
            name: ResolvedName {
                display: "Pagani Zonda R".to_string(),
                tag: VariantTag::Gold,
                key: "ZONDA_R_RewardRecycled".to_string(),
                translated: true,
            },
            annotations: vec![
                Annotation::new(AnnotationKind::RaceWin, "Winnable Race 5"),
                Annotation::new(AnnotationKind::Shop, "250 Gold Coins"),
            ],
        }
        .to_line();
        assert_eq!(
            line.plain_text(),
            "Pagani Zonda R (GS) - Winnable Race 5 / 250 Gold Coins"
        );
        assert!(line.console().contains("250 Gold Coins"));
    }
}

use serde_json::{Map, Value};

use crate::json_tree;

pub const CAR_REWARD: i64 = 11;
pub const STICKER_REWARD: i64 = 44;

const REWARD_CONTAINER: &str = "EventMilestoneRewards";
const REWARD_LEVELS: &str = "RewardLevels";
const NESTED_REWARDS: &str = "rewards";

#[derive(Debug, Clone, PartialEq)]
pub struct RewardRecord {
    pub reward_type: Option<i64>,
    pub name: Option<String>,
    pub wins_required: Option<i64>,
}

impl RewardRecord {
    fn from_object(record: &Map<String, Value>) -> Self {
        let info = record.get("RewardInfo").and_then(Value::as_object);
        Self {
            reward_type: info
                .and_then(|i| i.get("rewardType"))
                .and_then(json_tree::as_i64),
            name: info
                .and_then(|i| i.get("name"))
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            wins_required: record.get("WinsRequired").and_then(json_tree::as_i64),
        }
    }

    pub fn car_name(&self) -> Option<&str> {
        (self.reward_type == Some(CAR_REWARD))
            .then_some(self.name.as_deref())
            .flatten()
    }
}

/// Flattens every reward record reachable from `event` for `title`.
pub fn extract_rewards(event: &Value, title: &str) -> Vec<RewardRecord> {
    let mut found: Vec<&Map<String, Value>> = Vec::new();

    match json_tree::at(event, &[REWARD_CONTAINER]) {
        Some(Value::Array(list)) => found.extend(list.iter().filter_map(Value::as_object)),
        Some(Value::Object(container)) => {
            if let Some(Value::Object(titled)) = container.get(title) {
                let levels = [REWARD_LEVELS, NESTED_REWARDS]
                    .iter()
                    .filter_map(|key| titled.get(*key))
                    .find(|value| json_tree::is_truthy(value));
                match levels {
                    Some(Value::Array(list)) => splice_levels(list, &mut found),
                    Some(Value::Object(single)) => found.push(single),
                    _ => {}
                }
            }
            if let Some(Value::Array(list)) = container.get(REWARD_LEVELS) {
                splice_levels(list, &mut found);
            }
        }
        _ => {}
    }

    if found.is_empty() {
        let level_lists = json_tree::collect_members(event, &mut |key, value| {
            (key == REWARD_LEVELS)
                .then(|| value.as_array())
                .flatten()
        });
        for list in level_lists {
            splice_levels(list, &mut found);
        }
    }

    found.into_iter().map(RewardRecord::from_object).collect()
}

/// A level either wraps its own `rewards` list or is itself the record.
fn splice_levels<'a>(levels: &'a [Value], out: &mut Vec<&'a Map<String, Value>>) {
    for level in levels.iter().filter_map(Value::as_object) {
        match level.get(NESTED_REWARDS) {
            Some(Value::Array(nested)) => out.extend(nested.iter().filter_map(Value::as_object)),
            _ => out.push(level),
        }
    }
}

/// Car reward name to the wins needed, keeping the highest count per car.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaceWins {
    entries: Vec<(String, Option<i64>)>,
}

impl RaceWins {
    pub fn from_records(records: &[RewardRecord]) -> Self {
        let mut wins = Self::default();
        for record in records {
            if let Some(name) = record.car_name() {
                wins.offer(name, record.wins_required);
            }
        }
        wins
    }

    fn offer(&mut self, name: &str, wins: Option<i64>) {
        match self.entries.iter_mut().find(|(existing, _)| existing == name) {
            None => self.entries.push((name.to_string(), wins)),
            Some((_, current)) => {
                if let Some(w) = wins
                    && w > current.unwrap_or(0)
                {
                    *current = Some(w);
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<i64>)> {
        self.entries.iter().map(|(name, wins)| (name.as_str(), *wins))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What the event hands out on completion, in priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPrize {
    Car(String),
    Sticker(String),
}

pub fn event_prize(event: &Value, records: &[RewardRecord]) -> Option<EventPrize> {
    if let Some(car) = special_ladder_prize(event) {
        return Some(EventPrize::Car(car));
    }
    let sticker = records
        .iter()
        .filter(|r| r.reward_type == Some(STICKER_REWARD))
        .filter_map(|r| r.name.clone())
        .last();
    if let Some(sticker) = sticker {
        return Some(EventPrize::Sticker(sticker));
    }
    top_tier_car(records).map(|name| EventPrize::Car(name.to_string()))
}

/// Car behind the single highest `WinsRequired`; the first record wins ties.
fn top_tier_car(records: &[RewardRecord]) -> Option<&str> {
    let mut best: Option<&RewardRecord> = None;
    for record in records {
        let Some(wins) = record.wins_required else {
            continue;
        };
        if best.and_then(|b| b.wins_required).is_none_or(|top| wins > top) {
            best = Some(record);
        }
    }
    best.and_then(RewardRecord::car_name)
}

fn special_ladder_prize(event: &Value) -> Option<String> {
    let groups = json_tree::items_at(
        event,
        &["SpecialLadderEvents", "LadderEvents", "RaceEventGroups"],
    );
    for group in groups {
        let Some(prize) = group
            .get("CarPrizeForCompletionDetails")
            .filter(|p| json_tree::is_truthy(p))
        else {
            continue;
        };
        let car = match prize {
            Value::Object(details) => details
                .get("Car")
                .filter(|car| json_tree::is_truthy(car))
                .or_else(|| details.values().next()),
            other => Some(other),
        };
        return car.map(json_tree::scalar_text);
    }
    None
}

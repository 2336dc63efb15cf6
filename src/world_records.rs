use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use crate::assets;
use crate::http_client::fetch_json;
use crate::success;

pub const DEFAULT_WR_URL: &str =
    "https://raw.githubusercontent.com/Nitro4CSR/CSR2WorldRecordsDB/refs/heads/main/JessWR.json";

const ELECTRIC_SUFFIX: &str = "_EC";

#[derive(Debug, Clone, PartialEq)]
pub enum WorldRecordSource {
    Remote(String),
    File(PathBuf),
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    Et,
    Dyno,
}

impl TimeSource {
    pub fn label(self) -> &'static str {
        match self {
            TimeSource::Et => "Best ET",
            TimeSource::Dyno => "Dyno",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorldRecordEntry {
    pub car_id: String,
    pub display_time: Option<f64>,
    pub star: Option<String>,
    pub tier: Option<String>,
    pub source: TimeSource,
    /// Stored from the `_EC` row of this car.
    pub electric: bool,
}

#[derive(Debug, Deserialize)]
struct RecordRow {
    #[serde(rename = "DB Name")]
    db_name: Option<String>,
    #[serde(rename = "WR-DYNO", default)]
    dyno: Value,
    #[serde(rename = "WR-BEST ET", default)]
    best_et: Value,
    #[serde(rename = "Un", default)]
    tier: Value,
    #[serde(rename = "★", default)]
    star: Value,
}

#[derive(Debug, Clone, Default)]
pub struct WorldRecordMap {
    entries: HashMap<String, WorldRecordEntry>,
    pub electric_overwrites: usize,
    pub electric_only: usize,
}

impl WorldRecordMap {
    /// Builds the lookup from the dataset's array of rows.
    ///
    /// An `_EC` row is stored under its base id and always replaces whatever is
    /// there. Other rows only fill an empty slot, so the first plain row for a
    /// car is kept and can never displace an electric one.
    pub fn from_rows(rows: &Value) -> Self {
        let mut map = Self::default();
        for raw in json_rows(rows) {
            let Ok(row) = serde_json::from_value::<RecordRow>(raw.clone()) else {
                continue;
            };
            let Some(car_id) = row.db_name.as_deref().filter(|id| !id.is_empty()) else {
                continue;
            };
            let dyno = parse_figure(&row.dyno, &["", "n.A."]);
            let best_et = parse_figure(&row.best_et, &["", "n.A.", "0.000"]).filter(|et| *et > 0.0);
            let (display_time, source) = match best_et {
                Some(et) => (Some(et), TimeSource::Et),
                None => (dyno, TimeSource::Dyno),
            };

            match car_id.strip_suffix(ELECTRIC_SUFFIX) {
                Some(base) => {
                    if map.entries.contains_key(base) {
                        map.electric_overwrites += 1;
                    } else {
                        map.electric_only += 1;
                    }
                    map.entries.insert(
                        base.to_string(),
                        WorldRecordEntry {
                            car_id: base.to_string(),
                            display_time,
                            star: text_field(&row.star),
                            tier: text_field(&row.tier),
                            source,
                            electric: true,
                        },
                    );
                }
                None => {
                    map.entries
                        .entry(car_id.to_string())
                        .or_insert_with(|| WorldRecordEntry {
                            car_id: car_id.to_string(),
                            display_time,
                            star: text_field(&row.star),
                            tier: text_field(&row.tier),
                            source,
                            electric: false,
                        });
                }
            }
        }
        map
    }

    pub fn get(&self, car_id: &str) -> Option<&WorldRecordEntry> {
        self.entries.get(car_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn json_rows(rows: &Value) -> &[Value] {
    rows.as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn parse_figure(value: &Value, null_tokens: &[&str]) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if null_tokens.contains(&s.as_str()) => None,
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn text_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn fetch_rows(source: &WorldRecordSource) -> Result<Value> {
    let rows = match source {
        WorldRecordSource::Remote(url) => {
            log::info!("Fetching WR data from {url}");
            fetch_json(url)?
        }
        WorldRecordSource::File(path) => {
            log::info!("Loading WR data from {}", path.display());
            assets::read_json(path)?
        }
        WorldRecordSource::Disabled => return Err(anyhow!("world-record lookup disabled")),
    };
    if !rows.is_array() {
        return Err(anyhow!("world-record document is not an array"));
    }
    Ok(rows)
}

/// Never fails: an unreachable or malformed source yields an empty lookup.
pub fn load_world_records(source: &WorldRecordSource) -> WorldRecordMap {
    if *source == WorldRecordSource::Disabled {
        log::warn!("World-record lookup disabled; showdown times will read N/A");
        return WorldRecordMap::default();
    }
    match fetch_rows(source) {
        Ok(rows) => {
            let map = WorldRecordMap::from_rows(&rows);
            success!(
                "Total WR entries processed: {} (EC overwrote {}, EC-only added {})",
                map.len(),
                map.electric_overwrites,
                map.electric_only
            );
            map
        }
        Err(err) => {
            log::error!("Failed to fetch WR data: {err:#}");
            WorldRecordMap::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn electric_row_wins_in_either_order() {
        let base = json!({"DB Name": "CAR1", "WR-DYNO": "100"});
        let electric = json!({"DB Name": "CAR1_EC", "WR-DYNO": "90"});
        for rows in [
            json!([base.clone(), electric.clone()]),
            json!([electric.clone(), base.clone()]),
        ] {
            let map = WorldRecordMap::from_rows(&rows);
            let entry = map.get("CAR1").expect("entry");
            assert_eq!(entry.display_time, Some(90.0));
            assert!(entry.electric);
            assert!(map.get("CAR1_EC").is_none());
        }
    }

    #[test]
    fn first_plain_row_is_kept() {
        let rows = json!([
            {"DB Name": "CAR2", "WR-DYNO": "11.5"},
            {"DB Name": "CAR2", "WR-DYNO": "10.0"},
        ]);
        let map = WorldRecordMap::from_rows(&rows);
        assert_eq!(map.get("CAR2").and_then(|e| e.display_time), Some(11.5));
    }

    #[test]
    fn best_et_preferred_when_positive() {
        let rows = json!([
            {"DB Name": "ET", "WR-DYNO": "12.000", "WR-BEST ET": "11.900", "Un": "T4", "★": "P3"},
            {"DB Name": "ZERO", "WR-DYNO": "12.000", "WR-BEST ET": "0.000"},
            {"DB Name": "NA", "WR-DYNO": "n.A.", "WR-BEST ET": "n.A."},
            {"DB Name": "NUM", "WR-DYNO": 9.5},
            {"DB Name": "", "WR-DYNO": "1"},
            {"WR-DYNO": "1"},
            "junk",
        ]);
        let map = WorldRecordMap::from_rows(&rows);
        let et = map.get("ET").expect("ET row");
        assert_eq!(et.source, TimeSource::Et);
        assert_eq!(et.display_time, Some(11.9));
        assert_eq!(et.tier.as_deref(), Some("T4"));
        assert_eq!(et.star.as_deref(), Some("P3"));
        let zero = map.get("ZERO").expect("ZERO row");
        assert_eq!(zero.source, TimeSource::Dyno);
        assert_eq!(zero.display_time, Some(12.0));
        assert_eq!(map.get("NA").and_then(|e| e.display_time), None);
        assert_eq!(map.get("NUM").and_then(|e| e.display_time), Some(9.5));
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn unreadable_source_degrades_to_empty() {
        let map = load_world_records(&WorldRecordSource::File(PathBuf::from(
            "/definitely/not/here/wr.json",
        )));
        assert!(map.is_empty());
        assert!(load_world_records(&WorldRecordSource::Disabled).is_empty());
    }
}

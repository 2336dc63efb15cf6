use std::collections::BTreeMap;
use std::ops::Bound;

use crossterm::style::Color;
use serde_json::Value;

use crate::json_tree;

const CAR_NAME_PREFIX: &str = "TEXT_CAR_";
const CAR_NAME_SUFFIX: &str = "_LONG";

#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    entries: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantTag {
    Prestige,
    Gold,
}

impl VariantTag {
    pub fn for_key(key: &str) -> Self {
        let lowered = key.to_ascii_lowercase();
        if lowered.contains("rewardrecycled") || lowered.contains("gold") {
            VariantTag::Gold
        } else {
            VariantTag::Prestige
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VariantTag::Prestige => "(PS)",
            VariantTag::Gold => "(GS)",
        }
    }

    pub fn color(self) -> Color {
        match self {
            VariantTag::Prestige => Color::Magenta,
            VariantTag::Gold => Color::Yellow,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedName {
    pub display: String,
    pub tag: VariantTag,
    /// Table key the display came from, or the raw identifier on fallback.
    pub key: String,
    pub translated: bool,
}

impl TranslationTable {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::default();
        for (from, to) in pairs {
            table.insert(from.into(), to.into());
        }
        table
    }

    /// Reads the parallel `TranslationsFrom` / `TranslationsTo` arrays.
    /// `TEXT_CAR_<code>_LONG` keys are stored under the bare car code.
    pub fn from_asset(root: &Value) -> Self {
        let from = json_tree::items_at(root, &["TranslationsFrom"]);
        let to = json_tree::items_at(root, &["TranslationsTo"]);
        let mut table = Self::default();
        for (key, value) in from.iter().zip(to) {
            let (Some(key), Some(value)) = (key.as_str(), value.as_str()) else {
                continue;
            };
            table.insert(key.to_string(), value.to_string());
        }
        table
    }

    fn insert(&mut self, key: String, value: String) {
        let key = key
            .strip_prefix(CAR_NAME_PREFIX)
            .and_then(|rest| rest.strip_suffix(CAR_NAME_SUFFIX))
            .map(str::to_string)
            .unwrap_or(key);
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get_or<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).unwrap_or(key)
    }

    /// `TEXT_<key>_TITLE`, then `TEXT_<key>_TITLE_SHORT`, else the key.
    pub fn event_title(&self, key: &str) -> String {
        [format!("TEXT_{key}_TITLE"), format!("TEXT_{key}_TITLE_SHORT")]
            .iter()
            .find_map(|candidate| self.get(candidate))
            .unwrap_or(key)
            .to_string()
    }

    /// `*` expands to one row per matching key; plain ids fall back from
    /// exact, to prefix, to substring, to the humanized id.
    pub fn resolve(&self, identifier: &str, debug: bool) -> Vec<ResolvedName> {
        if identifier.is_empty() {
            return Vec::new();
        }
        let keys = match identifier.split_once('*') {
            Some((prefix, suffix)) => self.expand_wildcard(prefix, suffix),
            None => vec![self.closest_key(identifier).unwrap_or(identifier)],
        };
        let keys = if keys.is_empty() {
            vec![identifier]
        } else {
            keys
        };
        keys.into_iter()
            .map(|key| self.named(key, debug))
            .collect()
    }

    fn expand_wildcard(&self, prefix: &str, suffix: &str) -> Vec<&str> {
        self.entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(key, _)| key.as_str())
            .take_while(|key| key.starts_with(prefix))
            .filter(|key| suffix.is_empty() || key.ends_with(suffix))
            .collect()
    }

    fn closest_key(&self, identifier: &str) -> Option<&str> {
        if let Some((key, _)) = self.entries.get_key_value(identifier) {
            return Some(key.as_str());
        }
        let starts = self
            .entries
            .range::<str, _>((Bound::Included(identifier), Bound::Unbounded))
            .map(|(key, _)| key.as_str())
            .take_while(|key| key.starts_with(identifier))
            .next();
        starts.or_else(|| {
            self.entries
                .keys()
                .map(String::as_str)
                .find(|key| key.contains(identifier))
        })
    }

    fn named(&self, key: &str, debug: bool) -> ResolvedName {
        let translated = self.get(key);
        let mut display = translated
            .map(str::to_string)
            .unwrap_or_else(|| key.replace('_', " "));
        if debug {
            display = format!("{display} ({key})");
        }
        ResolvedName {
            display,
            tag: VariantTag::for_key(key),
            key: key.to_string(),
            translated: translated.is_some(),
        }
    }
}

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde_json::Value;

use crate::json_tree;
use crate::shop::ShopCatalog;
use crate::success;
use crate::translation::TranslationTable;

const TRANSLATION_FILES: [&str; 5] = [
    "Localisation_EN.json",
    "Localisation_en.json",
    "Localisation.json",
    "TranslationDataAsset.json",
    "TranslationData.json",
];

const SHOP_MARKER: &str = "shoptimegatedevents";
const COLLECTION_MARKER: &str = "collectionslots";

/// The three folders the unpacker leaves under the asset root.
#[derive(Debug, Clone)]
pub struct AssetLayout {
    pub root: PathBuf,
    pub text_dir: PathBuf,
    pub mono_dir: PathBuf,
    pub meta_dir: PathBuf,
}

impl AssetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let lower = root.join("metadata");
        let meta_dir = if lower.is_dir() {
            lower
        } else {
            root.join("MetaData")
        };
        Self {
            text_dir: root.join("TextAsset"),
            mono_dir: root.join("MonoBehaviour"),
            meta_dir,
            root,
        }
    }
}

pub fn read_text(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(match raw.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => raw,
    })
}

pub fn read_json(path: &Path) -> Result<Value> {
    let text = read_text(path)?;
    serde_json::from_str(&text).with_context(|| format!("invalid json in {}", path.display()))
}

/// Names of the `.txt` files directly under `folder`, sorted.
pub fn list_text_files(folder: &Path) -> Result<Vec<String>> {
    let mut names = file_names(folder)?
        .into_iter()
        .filter(|name| name.to_ascii_lowercase().ends_with(".txt"))
        .collect::<Vec<_>>();
    names.sort();
    Ok(names)
}

/// Like [`list_text_files`], but a folder that cannot be listed reads as empty.
pub fn text_files_or_empty(folder: &Path) -> Vec<String> {
    list_text_files(folder).unwrap_or_else(|err| {
        log::error!("{err:#}");
        Vec::new()
    })
}

fn file_names(folder: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(folder)
        .with_context(|| format!("failed to list {}", folder.display()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", folder.display()))?;
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

fn files_containing(folder: &Path, marker: &str) -> Vec<PathBuf> {
    match file_names(folder) {
        Ok(names) => names
            .into_iter()
            .filter(|name| name.to_ascii_lowercase().contains(marker))
            .map(|name| folder.join(name))
            .collect(),
        Err(err) => {
            log::warn!("{err:#}");
            Vec::new()
        }
    }
}

/// Modification date of `path` as `YYYY/MM/DD`, when the filesystem reports one.
pub fn file_date(path: &Path) -> Option<String> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified).format("%Y/%m/%d").to_string())
}

fn describe(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    match file_date(path) {
        Some(date) => format!("{name} (File Date - {date})"),
        None => name,
    }
}

pub fn find_translation_file(mono_dir: &Path) -> Option<PathBuf> {
    if let Some(found) = TRANSLATION_FILES
        .iter()
        .map(|name| mono_dir.join(name))
        .find(|path| path.is_file())
    {
        return Some(found);
    }
    let names = file_names(mono_dir).ok()?;
    names
        .into_iter()
        .find(|name| {
            let lower = name.to_ascii_lowercase();
            lower.ends_with(".json")
                && (lower.contains("localisation") || lower.contains("translation"))
        })
        .map(|name| mono_dir.join(name))
}

pub fn load_translations(mono_dir: &Path) -> TranslationTable {
    let Some(path) = find_translation_file(mono_dir) else {
        log::warn!("No translation file found in {}; names will be untranslated", mono_dir.display());
        return TranslationTable::default();
    };
    match read_json(&path) {
        Ok(doc) => {
            let table = TranslationTable::from_asset(&doc);
            success!(
                "Translation lookup built with {} entries from {}",
                table.len(),
                describe(&path)
            );
            table
        }
        Err(err) => {
            log::error!("Failed to load translation file: {err:#}");
            TranslationTable::default()
        }
    }
}

/// First shop asset that parses; later candidates are only tried on failure.
pub fn load_shop(meta_dir: &Path) -> ShopCatalog {
    for path in files_containing(meta_dir, SHOP_MARKER) {
        match read_json(&path) {
            Ok(doc) => {
                let shop = ShopCatalog::from_asset(&doc);
                success!("Loaded {} with {} promotions", describe(&path), shop.len());
                return shop;
            }
            Err(err) => log::warn!("Failed to load shop asset: {err:#}"),
        }
    }
    log::warn!("No ShopTimeGatedEvents file found. Skipping shop annotations.");
    ShopCatalog::default()
}

/// Collection slot id to its display-name candidates.
pub fn load_collections(meta_dir: &Path) -> HashMap<String, Vec<String>> {
    let Some(path) = files_containing(meta_dir, COLLECTION_MARKER).into_iter().next() else {
        log::warn!("No CollectionSlots file found. Slot names will default to 'Unknown'.");
        return HashMap::new();
    };
    let doc = match read_json(&path) {
        Ok(doc) => doc,
        Err(err) => {
            log::error!("Failed to load collection file: {err:#}");
            return HashMap::new();
        }
    };
    let lookup = collections_from_asset(&doc);
    success!(
        "Collection lookup built with {} entries from {}",
        lookup.len(),
        describe(&path)
    );
    lookup
}

/// `CollectionSlots.<slot>.milestones[].names`; the last non-empty list wins.
pub fn collections_from_asset(doc: &Value) -> HashMap<String, Vec<String>> {
    let mut lookup = HashMap::new();
    let Some(slots) = json_tree::object_at(doc, &["CollectionSlots"]) else {
        return lookup;
    };
    for (slot_id, slot) in slots {
        for milestone in json_tree::items_at(slot, &["milestones"]) {
            let names = json_tree::items_at(milestone, &["names"])
                .iter()
                .map(json_tree::scalar_text)
                .collect::<Vec<_>>();
            if !names.is_empty() {
                lookup.insert(slot_id.clone(), names);
            }
        }
    }
    lookup
}

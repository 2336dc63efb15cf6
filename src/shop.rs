use serde_json::Value;

use crate::json_tree;

const PROMOTIONS_PATH: [&str; 2] = ["ShopTimeGatedEvents", "GENERATED_TimeGatedCarPromotions"];

/// One time-gated car offer from the shop asset.
#[derive(Debug, Clone, PartialEq)]
pub struct ShopPromotionEntry {
    pub car_id: String,
    pub quantity: i64,
    pub schedule_ids: Vec<String>,
}

impl ShopPromotionEntry {
    pub fn runs_during(&self, schedule_id: &str) -> bool {
        self.schedule_ids.iter().any(|id| id == schedule_id)
    }

    /// A zero quantity is a free offer and still reads `0 Gold Coins`.
    pub fn price_text(&self) -> String {
        format!("{} Gold Coins", self.quantity)
    }
}

/// All promotions, in asset order.
#[derive(Debug, Clone, Default)]
pub struct ShopCatalog {
    entries: Vec<ShopPromotionEntry>,
}

impl ShopCatalog {
    pub fn from_entries(entries: Vec<ShopPromotionEntry>) -> Self {
        Self { entries }
    }

    /// Reads `ShopTimeGatedEvents.GENERATED_TimeGatedCarPromotions`, a map from
    /// car id to a list of `{quantity, ScheduleIDList}` offers.
    pub fn from_asset(root: &Value) -> Self {
        let Some(promotions) = json_tree::object_at(root, &PROMOTIONS_PATH) else {
            return Self::default();
        };
        let mut entries = Vec::new();
        for (car_id, offers) in promotions {
            for offer in json_tree::items(Some(offers)) {
                if !offer.is_object() {
                    continue;
                }
                let schedule_ids = json_tree::items_at(offer, &["ScheduleIDList"])
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
                entries.push(ShopPromotionEntry {
                    car_id: car_id.clone(),
                    quantity: json_tree::i64_at(offer, &["quantity"]).unwrap_or(0),
                    schedule_ids,
                });
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offers running under `schedule_id`, in asset order.
    pub fn for_schedule(&self, schedule_id: &str) -> Vec<ShopPromotionEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.runs_during(schedule_id))
            .cloned()
            .collect()
    }

    /// Exact car id to quantity for a schedule; later offers replace earlier.
    pub fn quantity_for(&self, schedule_id: &str, car_id: &str) -> Option<i64> {
        self.entries
            .iter()
            .filter(|entry| entry.car_id == car_id && entry.runs_during(schedule_id))
            .map(|entry| entry.quantity)
            .last()
    }

    pub fn has_offers_for(&self, schedule_id: &str) -> bool {
        self.entries.iter().any(|entry| entry.runs_during(schedule_id))
    }
}

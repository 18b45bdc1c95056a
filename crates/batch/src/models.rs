//! Batch and entry types shared by the client and the ledger

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::BatchError;

/// A cohort of birds raised together from a start date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(deserialize_with = "de::loose_date")]
    pub start_date: NaiveDate,
    /// The backend reports this as `currentChicken`
    #[serde(alias = "currentChicken")]
    pub population: i64,
}

/// Measurement unit of a consumption entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    G,
    Lb,
    Pcs,
    Ml,
    L,
}

impl Unit {
    pub const ALL: [Unit; 6] = [Unit::Kg, Unit::G, Unit::Lb, Unit::Pcs, Unit::Ml, Unit::L];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kg => "kg",
            Self::G => "g",
            Self::Lb => "lb",
            Self::Pcs => "pcs",
            Self::Ml => "ml",
            Self::L => "l",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::ALL
            .into_iter()
            .find(|unit| unit.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BatchError::Validation(format!("Unknown unit: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Feed,
    Medicine,
    General,
}

impl ItemCategory {
    pub fn is_feed_or_medicine(&self) -> bool {
        matches!(self, Self::Feed | Self::Medicine)
    }
}

/// Catalogue item selectable in the consumption forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    pub name: String,
    pub category: ItemCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_unit: Option<Unit>,
}

impl InventoryItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ItemCategory,
        default_unit: Option<Unit>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            default_unit,
        }
    }
}

/// Built-in catalogue used until the backend item list is loaded
pub fn default_items() -> Vec<InventoryItem> {
    vec![
        InventoryItem::new("i1", "Starter Feed", ItemCategory::Feed, Some(Unit::Kg)),
        InventoryItem::new("i2", "Grower Feed", ItemCategory::Feed, Some(Unit::Kg)),
        InventoryItem::new("i3", "Vitamin Mix", ItemCategory::Medicine, Some(Unit::Ml)),
        InventoryItem::new("i4", "Bedding", ItemCategory::General, Some(Unit::Pcs)),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMedicineEntry {
    pub id: String,
    pub item_id: String,
    pub item_name: String,
    pub qty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryUsageEntry {
    pub id: String,
    pub item_id: String,
    pub item_name: String,
    pub qty: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MortalityEntry {
    pub id: String,
    pub batch_id: String,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Assigned by the backend; `None` while the entry is only optimistic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_mortality_id: Option<String>,
}

impl MortalityEntry {
    pub fn is_confirmed(&self) -> bool {
        self.backend_mortality_id.is_some()
    }

    /// Applies the server echo; fields the server sends win over local ones
    ///
    /// An empty batch id or a zero count in the echo is ignored, so the
    /// entry keeps the values that passed local validation.
    pub fn confirm(mut self, receipt: MortalityReceipt) -> Self {
        if let Some(batch_id) = receipt.batch_id.filter(|id| !id.trim().is_empty()) {
            self.batch_id = batch_id;
        }
        if let Some(count) = receipt.count.filter(|count| *count >= 1) {
            self.count = count;
        }
        if receipt.cause.is_some() {
            self.cause = receipt.cause;
        }
        if let Some(timestamp) = receipt.timestamp {
            self.timestamp = timestamp;
        }
        self.backend_mortality_id = Some(receipt.mortality_id);
        self
    }
}

/// Body of `POST /mortality`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MortalityRequest {
    pub batch_id: String,
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<&MortalityEntry> for MortalityRequest {
    fn from(entry: &MortalityEntry) -> Self {
        Self {
            batch_id: entry.batch_id.clone(),
            count: entry.count,
            cause: entry.cause.clone(),
            timestamp: entry.timestamp,
        }
    }
}

/// What the backend echoes for a stored mortality record
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MortalityReceipt {
    #[serde(
        alias = "mortalityID",
        alias = "MortalityID",
        alias = "id",
        deserialize_with = "de::string_or_number"
    )]
    pub mortality_id: String,
    #[serde(default, alias = "batchID", deserialize_with = "de::opt_string_or_number")]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub cause: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarvestKind {
    Harvest,
    Cull,
}

impl FromStr for HarvestKind {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "harvest" => Ok(Self::Harvest),
            "cull" => Ok(Self::Cull),
            _ => Err(BatchError::Validation("Select type".to_string())),
        }
    }
}

/// Birds leaving a batch, recorded on the harvesting tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestEntry {
    pub id: String,
    pub batch_id: String,
    pub quantity: u32,
    pub kind: HarvestKind,
    pub weight_total: f64,
    pub timestamp: DateTime<Utc>,
}

/// Fresh identifier for a locally created entry
pub fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) mod de {
    use super::*;
    use serde::de::Error;
    use serde_json::Value;

    fn value_to_string<E: Error>(value: Value) -> Result<String, E> {
        match value {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(E::custom(format!("expected string or number, got {}", other))),
        }
    }

    pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        value_to_string(Value::deserialize(deserializer)?)
    }

    pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value_to_string(value).map(Some),
        }
    }

    /// Lists of identifiers; the backend encodes an empty list as `null`
    pub fn id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Vec<Value>>::deserialize(deserializer)?
            .unwrap_or_default()
            .into_iter()
            .map(value_to_string)
            .collect()
    }

    /// `YYYY-MM-DD`, optionally followed by a time part
    pub fn loose_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let date_part = raw.get(..10).unwrap_or(raw.as_str());
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map_err(|e| D::Error::custom(format!("invalid date {:?}: {}", raw, e)))
    }
}

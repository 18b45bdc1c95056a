//! In-memory entry lists of the batch page
//!
//! Every list keeps the newest entry first. Recording validates the form
//! input and leaves all lists untouched when it fails.

use chrono::Utc;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::client::BatchClient;
use crate::models::{
    default_items, new_entry_id, FeedMedicineEntry, HarvestEntry, HarvestKind, InventoryItem,
    InventoryUsageEntry, MortalityEntry, MortalityRequest, Unit,
};
use crate::{BatchError, Result};

const PICK_ITEM_AND_QTY: &str = "Pick item and qty";
const ENTER_A_COUNT: &str = "Enter a count";
const SELECT_A_BATCH: &str = "Select a batch";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    FeedMedicine,
    InventoryUsage,
    Mortality,
    Harvest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMedicineInput {
    pub item_id: String,
    pub qty: f64,
    /// Falls back to the item's default unit
    #[serde(default)]
    pub unit: Option<Unit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryUsageInput {
    pub item_id: String,
    pub qty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MortalityInput {
    pub batch_id: String,
    pub count: u32,
    #[serde(default)]
    pub cause: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestInput {
    pub batch_id: String,
    pub quantity: u32,
    pub kind: HarvestKind,
    pub weight_total: f64,
}

/// Form payload of any entry kind
#[derive(Debug, Clone, PartialEq)]
pub enum EntryPayload {
    FeedMedicine(FeedMedicineInput),
    InventoryUsage(InventoryUsageInput),
    Mortality(MortalityInput),
    Harvest(HarvestInput),
}

impl EntryPayload {
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::FeedMedicine(_) => EntryKind::FeedMedicine,
            Self::InventoryUsage(_) => EntryKind::InventoryUsage,
            Self::Mortality(_) => EntryKind::Mortality,
            Self::Harvest(_) => EntryKind::Harvest,
        }
    }
}

/// The record produced by [`EntryLedger::record`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEntry {
    FeedMedicine(FeedMedicineEntry),
    InventoryUsage(InventoryUsageEntry),
    Mortality(MortalityEntry),
    Harvest(HarvestEntry),
}

impl RecordedEntry {
    pub fn id(&self) -> &str {
        match self {
            Self::FeedMedicine(entry) => &entry.id,
            Self::InventoryUsage(entry) => &entry.id,
            Self::Mortality(entry) => &entry.id,
            Self::Harvest(entry) => &entry.id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryLedger {
    items: Vec<InventoryItem>,
    feed_medicine: Vec<FeedMedicineEntry>,
    inventory_usage: Vec<InventoryUsageEntry>,
    mortality: Vec<MortalityEntry>,
    harvest: Vec<HarvestEntry>,
}

impl EntryLedger {
    /// Empty lists over the built-in item catalogue
    pub fn new() -> Self {
        Self::with_items(default_items())
    }

    pub fn with_items(items: Vec<InventoryItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    /// Swaps in a catalogue loaded from the backend; recorded entries stay
    pub fn replace_items(&mut self, items: Vec<InventoryItem>) {
        self.items = items;
    }

    pub fn feed_medicine_items(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.iter().filter(|i| i.category.is_feed_or_medicine())
    }

    pub fn general_items(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.iter().filter(|i| !i.category.is_feed_or_medicine())
    }

    pub fn feed_medicine(&self) -> &[FeedMedicineEntry] {
        &self.feed_medicine
    }

    pub fn inventory_usage(&self) -> &[InventoryUsageEntry] {
        &self.inventory_usage
    }

    pub fn mortality(&self) -> &[MortalityEntry] {
        &self.mortality
    }

    pub fn harvest(&self) -> &[HarvestEntry] {
        &self.harvest
    }

    pub fn len(&self, kind: EntryKind) -> usize {
        match kind {
            EntryKind::FeedMedicine => self.feed_medicine.len(),
            EntryKind::InventoryUsage => self.inventory_usage.len(),
            EntryKind::Mortality => self.mortality.len(),
            EntryKind::Harvest => self.harvest.len(),
        }
    }

    pub fn is_empty(&self, kind: EntryKind) -> bool {
        self.len(kind) == 0
    }

    fn find_item(&self, item_id: &str) -> Result<&InventoryItem> {
        self.items
            .iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| BatchError::UnknownItem(item_id.to_string()))
    }

    /// Records an entry of any kind; mortality goes through [`Self::record_mortality`]
    pub async fn record(
        &mut self,
        client: &BatchClient,
        payload: EntryPayload,
    ) -> Result<RecordedEntry> {
        Ok(match payload {
            EntryPayload::FeedMedicine(input) => {
                RecordedEntry::FeedMedicine(self.record_feed_medicine(input)?)
            }
            EntryPayload::InventoryUsage(input) => {
                RecordedEntry::InventoryUsage(self.record_inventory_usage(input)?)
            }
            EntryPayload::Mortality(input) => {
                RecordedEntry::Mortality(self.record_mortality(client, input).await?)
            }
            EntryPayload::Harvest(input) => RecordedEntry::Harvest(self.record_harvest(input)?),
        })
    }

    pub fn record_feed_medicine(&mut self, input: FeedMedicineInput) -> Result<FeedMedicineEntry> {
        require_item_and_qty(&input.item_id, input.qty)?;
        let item = self.find_item(&input.item_id)?;
        if !item.category.is_feed_or_medicine() {
            return Err(BatchError::Validation(format!(
                "{} is not a feed or medicine item",
                item.name
            )));
        }

        let entry = FeedMedicineEntry {
            id: new_entry_id(),
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            qty: input.qty,
            unit: input.unit.or(item.default_unit),
            timestamp: Utc::now(),
        };
        self.feed_medicine.insert(0, entry.clone());
        debug!("Feed/medicine entry {} recorded", entry.id);
        Ok(entry)
    }

    pub fn record_inventory_usage(
        &mut self,
        input: InventoryUsageInput,
    ) -> Result<InventoryUsageEntry> {
        require_item_and_qty(&input.item_id, input.qty)?;
        let item = self.find_item(&input.item_id)?;
        if item.category.is_feed_or_medicine() {
            return Err(BatchError::Validation(format!(
                "{} is not a general inventory item",
                item.name
            )));
        }

        let entry = InventoryUsageEntry {
            id: new_entry_id(),
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            qty: input.qty,
            timestamp: Utc::now(),
        };
        self.inventory_usage.insert(0, entry.clone());
        debug!("Inventory usage entry {} recorded", entry.id);
        Ok(entry)
    }

    /// Adds an unconfirmed mortality entry without contacting the backend
    pub fn record_mortality_local(&mut self, input: MortalityInput) -> Result<MortalityEntry> {
        let entry = build_mortality(input)?;
        self.mortality.insert(0, entry.clone());
        debug!("Optimistic mortality entry {} recorded", entry.id);
        Ok(entry)
    }

    /// Records mortality through `POST /mortality`
    ///
    /// A placeholder entry is shown while the request runs. On success it is
    /// replaced by the confirmed entry carrying the backend id; on failure it
    /// is removed again so the lists end up exactly as before. No retry.
    pub async fn record_mortality(
        &mut self,
        client: &BatchClient,
        input: MortalityInput,
    ) -> Result<MortalityEntry> {
        let placeholder = build_mortality(input)?;
        let request = MortalityRequest::from(&placeholder);
        self.mortality.insert(0, placeholder.clone());

        match client.submit_mortality(&request).await {
            Ok(receipt) => {
                let confirmed = placeholder.confirm(receipt);
                match self.mortality.iter().position(|e| e.id == confirmed.id) {
                    Some(pos) => self.mortality[pos] = confirmed.clone(),
                    None => self.mortality.insert(0, confirmed.clone()),
                }
                Ok(confirmed)
            }
            Err(e) => {
                error!("Failed to record mortality for batch {}: {}", request.batch_id, e);
                self.mortality.retain(|entry| entry.id != placeholder.id);
                Err(e)
            }
        }
    }

    pub fn record_harvest(&mut self, input: HarvestInput) -> Result<HarvestEntry> {
        if input.batch_id.trim().is_empty() {
            return Err(BatchError::Validation(SELECT_A_BATCH.to_string()));
        }
        if input.quantity == 0 {
            return Err(BatchError::Validation("Enter a bird quantity".to_string()));
        }
        if !input.weight_total.is_finite() || input.weight_total < 0.0 {
            return Err(BatchError::Validation("Enter a valid total weight".to_string()));
        }

        let entry = HarvestEntry {
            id: new_entry_id(),
            batch_id: input.batch_id,
            quantity: input.quantity,
            kind: input.kind,
            weight_total: input.weight_total,
            timestamp: Utc::now(),
        };
        self.harvest.insert(0, entry.clone());
        Ok(entry)
    }
}

fn require_item_and_qty(item_id: &str, qty: f64) -> Result<()> {
    if item_id.trim().is_empty() || !qty.is_finite() || qty <= 0.0 {
        return Err(BatchError::Validation(PICK_ITEM_AND_QTY.to_string()));
    }
    Ok(())
}

fn build_mortality(input: MortalityInput) -> Result<MortalityEntry> {
    if input.count < 1 {
        return Err(BatchError::Validation(ENTER_A_COUNT.to_string()));
    }
    if input.batch_id.trim().is_empty() {
        return Err(BatchError::Validation(SELECT_A_BATCH.to_string()));
    }

    Ok(MortalityEntry {
        id: new_entry_id(),
        batch_id: input.batch_id,
        count: input.count,
        cause: input
            .cause
            .map(|cause| cause.trim().to_string())
            .filter(|cause| !cause.is_empty()),
        timestamp: Utc::now(),
        backend_mortality_id: None,
    })
}

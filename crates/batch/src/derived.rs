//! Values computed from the current batch and entry lists
//!
//! Nothing here is cached; callers recompute on every render.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::BTreeMap;

use crate::models::{Batch, FeedMedicineEntry, InventoryUsageEntry, MortalityEntry};

/// Whole days from `start` to `now`, never negative
pub fn age_in_days(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    // num_days truncates toward zero, which is floor for non-negative spans
    (now - start).num_days().max(0)
}

/// Age of a batch whose start date is taken as midnight UTC
pub fn age_in_days_from_date(start: NaiveDate, now: DateTime<Utc>) -> i64 {
    let start = Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN));
    age_in_days(start, now)
}

pub fn total_mortality(entries: &[MortalityEntry]) -> u64 {
    entries.iter().map(|entry| u64::from(entry.count)).sum()
}

/// Birds still alive according to the recorded mortality
pub fn current_population(batch: &Batch, entries: &[MortalityEntry]) -> i64 {
    let dead = i64::try_from(total_mortality(entries)).unwrap_or(i64::MAX);
    batch.population.saturating_sub(dead).max(0)
}

/// An entry that consumes some quantity of a catalogue item
pub trait Consumption {
    fn item_name(&self) -> &str;
    fn qty(&self) -> f64;
}

impl Consumption for FeedMedicineEntry {
    fn item_name(&self) -> &str {
        &self.item_name
    }

    fn qty(&self) -> f64 {
        self.qty
    }
}

impl Consumption for InventoryUsageEntry {
    fn item_name(&self) -> &str {
        &self.item_name
    }

    fn qty(&self) -> f64 {
        self.qty
    }
}

/// Summed quantity per item name, ordered by name
pub fn quantity_by_item<E: Consumption>(entries: &[E]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.item_name().to_string()).or_insert(0.0) += entry.qty();
    }
    totals
}

/// Figures shown on the batch card
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub batch_id: String,
    pub start_date: NaiveDate,
    pub population: i64,
    pub age_days: i64,
    pub mortality: u64,
    pub alive: i64,
}

impl BatchSummary {
    pub fn compute(batch: &Batch, mortality: &[MortalityEntry], now: DateTime<Utc>) -> Self {
        let batch_mortality: Vec<MortalityEntry> = mortality
            .iter()
            .filter(|entry| entry.batch_id == batch.id)
            .cloned()
            .collect();

        Self {
            batch_id: batch.id.clone(),
            start_date: batch.start_date,
            population: batch.population,
            age_days: age_in_days_from_date(batch.start_date, now),
            mortality: total_mortality(&batch_mortality),
            alive: current_population(batch, &batch_mortality),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn mortality(batch_id: &str, count: u32) -> MortalityEntry {
        MortalityEntry {
            id: crate::models::new_entry_id(),
            batch_id: batch_id.to_string(),
            count,
            cause: None,
            timestamp: Utc::now(),
            backend_mortality_id: None,
        }
    }

    fn batch(population: i64) -> Batch {
        Batch {
            id: "B-1".to_string(),
            name: "Broilers".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            population,
        }
    }

    #[test]
    fn age_is_zero_on_start_day() {
        let d = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        assert_eq!(age_in_days(d, d), 0);
        assert_eq!(age_in_days(d, d + Duration::days(1)), 1);
    }

    #[test]
    fn age_rounds_down_partial_days() {
        let d = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(age_in_days(d, d + Duration::hours(23)), 0);
        assert_eq!(age_in_days(d, d + Duration::hours(49)), 2);
    }

    #[test]
    fn age_never_negative() {
        let d = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(age_in_days(d, d - Duration::days(3)), 0);
        assert_eq!(age_in_days(d, d - Duration::seconds(1)), 0);
    }

    #[test]
    fn age_from_calendar_date() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(age_in_days_from_date(start, now), 14);
    }

    #[test]
    fn mortality_sums() {
        assert_eq!(total_mortality(&[]), 0);
        assert_eq!(total_mortality(&[mortality("B-1", 3), mortality("B-1", 5)]), 8);
    }

    #[test]
    fn population_never_below_zero() {
        let entries = vec![mortality("B-1", 7), mortality("B-1", 5)];
        assert_eq!(current_population(&batch(100), &entries), 88);
        assert_eq!(current_population(&batch(10), &entries), 0);
    }

    #[test]
    fn quantities_grouped_by_item() {
        let now = Utc::now();
        let entry = |name: &str, qty: f64| InventoryUsageEntry {
            id: crate::models::new_entry_id(),
            item_id: name.to_lowercase(),
            item_name: name.to_string(),
            qty,
            timestamp: now,
        };
        let totals = quantity_by_item(&[
            entry("Bedding", 2.0),
            entry("Bedding", 3.0),
            entry("Lime", 1.5),
        ]);
        assert_eq!(totals.get("Bedding"), Some(&5.0));
        assert_eq!(totals.get("Lime"), Some(&1.5));
    }

    #[test]
    fn summary_only_counts_its_own_batch() {
        let now = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap();
        let entries = vec![mortality("B-1", 4), mortality("B-2", 9)];
        let summary = BatchSummary::compute(&batch(500), &entries, now);

        assert_eq!(summary.age_days, 10);
        assert_eq!(summary.mortality, 4);
        assert_eq!(summary.alive, 496);
    }
}

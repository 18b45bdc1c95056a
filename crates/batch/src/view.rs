//! Which form and table clusters the batch page shows

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Monitoring,
    Harvesting,
}

/// Sub-page of the monitoring tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MonitoringPage {
    #[default]
    One,
    Two,
}

impl MonitoringPage {
    pub const COUNT: u8 = 2;

    pub fn number(&self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::Two
    }

    pub fn previous(self) -> Self {
        Self::One
    }

    pub fn has_next(&self) -> bool {
        *self == Self::One
    }

    pub fn has_previous(&self) -> bool {
        *self == Self::Two
    }

    pub fn label(&self) -> String {
        format!("Page {} of {}", self.number(), Self::COUNT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    FeedMedicine,
    InventoryUsage,
    Mortality,
    Harvest,
}

/// Toggle state of the batch page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardView {
    tab: Tab,
    page: MonitoringPage,
    selected_batch: Option<String>,
}

impl DashboardView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn page(&self) -> MonitoringPage {
        self.page
    }

    pub fn selected_batch(&self) -> Option<&str> {
        self.selected_batch.as_deref()
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn next_page(&mut self) {
        self.page = self.page.next();
    }

    pub fn previous_page(&mut self) {
        self.page = self.page.previous();
    }

    pub fn select_batch(&mut self, batch_id: impl Into<String>) {
        self.selected_batch = Some(batch_id.into());
    }

    /// Picks the first batch when nothing valid is selected yet
    pub fn select_default_batch(&mut self, batch_ids: &[String]) {
        let still_listed = self
            .selected_batch
            .as_ref()
            .map(|id| batch_ids.contains(id))
            .unwrap_or(false);
        if !still_listed {
            self.selected_batch = batch_ids.first().cloned();
        }
    }

    /// Panels rendered for the current tab and page
    pub fn visible_panels(&self) -> Vec<Panel> {
        match (self.tab, self.page) {
            (Tab::Harvesting, _) => vec![Panel::Harvest],
            (Tab::Monitoring, MonitoringPage::One) => vec![Panel::FeedMedicine],
            (Tab::Monitoring, MonitoringPage::Two) => vec![Panel::InventoryUsage, Panel::Mortality],
        }
    }

    /// The save button only shows on the last monitoring page
    pub fn shows_save(&self) -> bool {
        self.tab == Tab::Monitoring && self.page == MonitoringPage::Two
    }
}

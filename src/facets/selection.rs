//! Filter criteria the user manipulates, and the transitions on them.
//!
//! Every transition is total: malformed input degrades (e.g. an unparseable
//! date clears the bound) instead of failing.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::{parse_day, preset_bounds, DayRange};
use crate::models::{
    CaseType, DateBound, DateRangePreset, FacetDimension, FilterFlag, ScanStatus, UserId,
};

/// A value in one facet dimension, as passed to `toggle_facet_value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "dimension", content = "value", rename_all = "snake_case")]
pub enum FacetValue {
    Site(String),
    Sector(String),
    Doctor(UserId),
}

impl FacetValue {
    pub fn dimension(&self) -> FacetDimension {
        match self {
            Self::Site(_) => FacetDimension::Site,
            Self::Sector(_) => FacetDimension::Sector,
            Self::Doctor(_) => FacetDimension::Doctor,
        }
    }
}

/// Text typed into each facet's own picker search box. Narrows what the
/// picker displays; never filters cases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetQueries {
    pub site: String,
    pub sector: String,
    pub doctor: String,
}

impl FacetQueries {
    pub fn get(&self, dimension: FacetDimension) -> &str {
        match dimension {
            FacetDimension::Site => &self.site,
            FacetDimension::Sector => &self.sector,
            FacetDimension::Doctor => &self.doctor,
        }
    }

    fn set(&mut self, dimension: FacetDimension, text: String) {
        match dimension {
            FacetDimension::Site => self.site = text,
            FacetDimension::Sector => self.sector = text,
            FacetDimension::Doctor => self.doctor = text,
        }
    }
}

/// Complete filter state. `Default` is the initial "show everything" state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    search_text: String,
    case_type: CaseType,
    scan_status: ScanStatus,
    urgent_only: bool,
    no_images_only: bool,
    completed_shares_only: bool,
    unseen_images_only: bool,
    selected_sites: BTreeSet<String>,
    selected_sectors: BTreeSet<String>,
    selected_doctors: BTreeSet<UserId>,
    date_range: DateRangePreset,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    facet_queries: FacetQueries,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Reads ──────────────────────────────────────────────

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn case_type(&self) -> CaseType {
        self.case_type
    }

    pub fn scan_status(&self) -> ScanStatus {
        self.scan_status
    }

    pub fn flag(&self, flag: FilterFlag) -> bool {
        match flag {
            FilterFlag::UrgentOnly => self.urgent_only,
            FilterFlag::NoImagesOnly => self.no_images_only,
            FilterFlag::CompletedSharesOnly => self.completed_shares_only,
            FilterFlag::UnseenImagesOnly => self.unseen_images_only,
        }
    }

    pub fn selected_sites(&self) -> &BTreeSet<String> {
        &self.selected_sites
    }

    pub fn selected_sectors(&self) -> &BTreeSet<String> {
        &self.selected_sectors
    }

    pub fn selected_doctors(&self) -> &BTreeSet<UserId> {
        &self.selected_doctors
    }

    pub fn is_selected(&self, value: &FacetValue) -> bool {
        match value {
            FacetValue::Site(name) => self.selected_sites.contains(name),
            FacetValue::Sector(name) => self.selected_sectors.contains(name),
            FacetValue::Doctor(id) => self.selected_doctors.contains(id),
        }
    }

    pub fn date_range(&self) -> DateRangePreset {
        self.date_range
    }

    /// Bounds as last stored (what a snapshot consumer sees).
    pub fn date_bounds(&self) -> DayRange {
        DayRange::new(self.date_from, self.date_to)
    }

    /// Bounds to filter with on `today`: presets re-resolve, manual ranges
    /// use what the user entered.
    pub fn effective_dates(&self, today: NaiveDate) -> DayRange {
        preset_bounds(self.date_range, today).unwrap_or_else(|| self.date_bounds())
    }

    pub fn facet_query(&self, dimension: FacetDimension) -> &str {
        self.facet_queries.get(dimension)
    }

    pub fn facet_queries(&self) -> &FacetQueries {
        &self.facet_queries
    }

    // ── Transitions ────────────────────────────────────────

    /// Stored verbatim; "" disables the text filter.
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    /// Add the value if absent, remove it if present. Returns whether the
    /// value is selected afterwards.
    pub fn toggle_facet_value(&mut self, value: FacetValue) -> bool {
        fn toggle<T: Ord>(set: &mut BTreeSet<T>, item: T) -> bool {
            if set.remove(&item) {
                false
            } else {
                set.insert(item);
                true
            }
        }

        match value {
            FacetValue::Site(name) => toggle(&mut self.selected_sites, name),
            FacetValue::Sector(name) => toggle(&mut self.selected_sectors, name),
            FacetValue::Doctor(id) => toggle(&mut self.selected_doctors, id),
        }
    }

    pub fn set_flag(&mut self, flag: FilterFlag, value: bool) {
        match flag {
            FilterFlag::UrgentOnly => self.urgent_only = value,
            FilterFlag::NoImagesOnly => self.no_images_only = value,
            FilterFlag::CompletedSharesOnly => self.completed_shares_only = value,
            FilterFlag::UnseenImagesOnly => self.unseen_images_only = value,
        }
    }

    pub fn set_case_type(&mut self, case_type: CaseType) {
        self.case_type = case_type;
    }

    pub fn set_scan_status(&mut self, scan_status: ScanStatus) {
        self.scan_status = scan_status;
    }

    /// Switch to a preset and store the bounds it stands for on `today`.
    /// Picking `From` opens a manual range ending today.
    pub fn set_date_range_preset(&mut self, preset: DateRangePreset, today: NaiveDate) {
        let bounds = preset_bounds(preset, today).unwrap_or(DayRange::new(None, Some(today)));
        self.date_range = preset;
        self.date_from = bounds.from;
        self.date_to = bounds.to;
    }

    /// Manual edit of one bound. Always leaves the range in `From` mode.
    /// The other bound keeps its value; when a preset was active it is first
    /// resolved on `today`, so the kept bound is the one the user saw.
    pub fn set_manual_date_bound(&mut self, which: DateBound, text: &str, today: NaiveDate) {
        if let Some(bounds) = preset_bounds(self.date_range, today) {
            self.date_from = bounds.from;
            self.date_to = bounds.to;
        }
        let parsed = parse_day(text);
        self.date_range = DateRangePreset::From;
        match which {
            DateBound::From => self.date_from = parsed,
            DateBound::To => self.date_to = parsed,
        }
    }

    pub fn set_facet_search_text(&mut self, dimension: FacetDimension, text: impl Into<String>) {
        self.facet_queries.set(dimension, text.into());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

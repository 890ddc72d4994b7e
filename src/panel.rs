//! Filter panel: the integration surface over the facet engine.
//!
//! Owns the data snapshots, the selection, the latest `FacetView` and the
//! publisher. Every selection transition runs one recompute and one
//! publication, in that order. Data loads recompute without publishing:
//! the selection did not change.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::InboxConfig;
use crate::directory::{CaseDirectory, DirectoryError, UserDirectory};
use crate::facets::{
    recompute, CaseFilter, CatalogError, Clock, EngineInput, FacetCatalog, FacetValue, FacetView,
    SelectionState, SystemClock,
};
use crate::models::*;
use crate::publisher::{FilterChange, FilterPublisher, FilterSubscriber, SubscriptionId};
use crate::results::{results_page, ResultsQuery};

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

pub struct FilterPanel {
    cases: Option<Vec<Case>>,
    catalog: Option<FacetCatalog>,
    selection: SelectionState,
    view: FacetView,
    clock: Box<dyn Clock>,
    current_user_id: Option<UserId>,
    page_size: u32,
    publisher: FilterPublisher,
    revision: u64,
}

impl FilterPanel {
    pub fn new(config: &InboxConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    pub fn with_clock(config: &InboxConfig, clock: impl Clock + 'static) -> Self {
        Self {
            cases: None,
            catalog: None,
            selection: SelectionState::new(),
            view: FacetView::default(),
            clock: Box::new(clock),
            current_user_id: config.current_user_id,
            page_size: config.page_size,
            publisher: FilterPublisher::new(),
            revision: 0,
        }
    }

    // ── Data snapshots ──────────────────────────────────────

    /// Replace the case snapshot wholesale.
    pub fn load_cases(&mut self, cases: Vec<Case>) {
        tracing::info!(cases = cases.len(), "Case snapshot loaded");
        self.cases = Some(cases);
        self.refresh_view();
    }

    /// Replace the facet catalog wholesale.
    pub fn load_catalog(&mut self, catalog: FacetCatalog) {
        tracing::info!(
            sites = catalog.sites().len(),
            sectors = catalog.sectors().len(),
            doctors = catalog.doctors().len(),
            "Facet catalog loaded"
        );
        self.catalog = Some(catalog);
        self.refresh_view();
    }

    /// Forget both snapshots; the view drops back to "no data yet".
    pub fn clear_data(&mut self) {
        self.cases = None;
        self.catalog = None;
        self.refresh_view();
    }

    /// Pull fresh snapshots from the directories.
    ///
    /// Cases replace the case snapshot; users replace the doctor options of
    /// the loaded catalog (sites and sectors are kept). Nothing is replaced
    /// unless both fetches succeed.
    pub fn refresh(
        &mut self,
        cases: &dyn CaseDirectory,
        users: &dyn UserDirectory,
    ) -> Result<(), PanelError> {
        let fetched = cases.list_cases().and_then(|c| Ok((c, users.list_users()?)));
        let (case_list, user_list) = match fetched {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "Directory refresh failed, keeping previous snapshot");
                return Err(e.into());
            }
        };

        let catalog = match self.catalog.clone() {
            Some(catalog) => Some(catalog.with_doctors_from_users(&user_list)?),
            None => {
                tracing::debug!("No facet catalog loaded yet, doctor list not applied");
                None
            }
        };

        if self.current_user_id.is_none() {
            self.current_user_id = users.current_user_id();
        }
        tracing::info!(
            cases = case_list.len(),
            users = user_list.len(),
            "Directory snapshot refreshed"
        );
        self.cases = Some(case_list);
        if catalog.is_some() {
            self.catalog = catalog;
        }
        self.refresh_view();
        Ok(())
    }

    // ── Selection transitions ───────────────────────────────

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.apply(|s, _| s.set_search_text(text));
    }

    /// Returns whether the value is selected afterwards.
    pub fn toggle_facet_value(&mut self, value: FacetValue) -> bool {
        self.apply(|s, _| s.toggle_facet_value(value))
    }

    pub fn set_flag(&mut self, flag: FilterFlag, value: bool) {
        self.apply(|s, _| s.set_flag(flag, value));
    }

    pub fn set_case_type(&mut self, case_type: CaseType) {
        self.apply(|s, _| s.set_case_type(case_type));
    }

    pub fn set_scan_status(&mut self, scan_status: ScanStatus) {
        self.apply(|s, _| s.set_scan_status(scan_status));
    }

    pub fn set_date_range_preset(&mut self, preset: DateRangePreset) {
        self.apply(|s, today| s.set_date_range_preset(preset, today));
    }

    pub fn set_manual_date_bound(&mut self, which: DateBound, text: &str) {
        self.apply(|s, today| s.set_manual_date_bound(which, text, today));
    }

    pub fn set_facet_search_text(&mut self, dimension: FacetDimension, text: impl Into<String>) {
        let text = text.into();
        self.apply(|s, _| s.set_facet_search_text(dimension, text));
    }

    pub fn reset(&mut self) {
        self.apply(|s, _| s.reset());
    }

    // ── Subscribers ─────────────────────────────────────────

    pub fn subscribe(&mut self, subscriber: impl FilterSubscriber + 'static) -> SubscriptionId {
        self.publisher.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.publisher.unsubscribe(id)
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn view(&self) -> &FacetView {
        &self.view
    }

    pub fn total(&self) -> usize {
        self.view.total
    }

    /// Number of transitions published so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.current_user_id
    }

    /// First page of results at the configured page size.
    pub fn default_query(&self) -> ResultsQuery {
        ResultsQuery {
            page_size: self.page_size,
            ..Default::default()
        }
    }

    /// Cases matching the current selection, sorted and paged.
    ///
    /// Empty until both cases and a catalog are loaded, like the view.
    pub fn results_page(&self, query: &ResultsQuery) -> SearchResult<Case> {
        let today = self.clock.today();
        let filter = CaseFilter::new(&self.selection, today, self.current_user_id);
        let cases = match (&self.cases, &self.catalog) {
            (Some(cases), Some(_)) => cases.as_slice(),
            _ => &[],
        };
        results_page(cases, &filter, query)
    }

    // ── Internals ───────────────────────────────────────────

    fn apply<R>(&mut self, change: impl FnOnce(&mut SelectionState, NaiveDate) -> R) -> R {
        let today = self.clock.today();
        let result = change(&mut self.selection, today);
        self.recompute_at(today);
        self.revision += 1;

        let published = FilterChange {
            revision: self.revision,
            state: self.selection.clone(),
            total: self.view.total,
        };
        let delivered = self.publisher.publish(&published);
        tracing::debug!(
            revision = self.revision,
            total = self.view.total,
            delivered,
            "Filter change published"
        );
        result
    }

    fn refresh_view(&mut self) {
        let today = self.clock.today();
        self.recompute_at(today);
    }

    fn recompute_at(&mut self, today: NaiveDate) {
        self.view = recompute(&EngineInput {
            cases: self.cases.as_deref(),
            catalog: self.catalog.as_ref(),
            selection: &self.selection,
            today,
            current_user: self.current_user_id,
        });
        tracing::debug!(
            total = self.view.total,
            sites = self.view.sites.len(),
            sectors = self.view.sectors.len(),
            doctors = self.view.doctors.len(),
            unattributed = self.view.unattributed,
            "Facets recomputed"
        );
    }
}

// ═══════════════════════════════════════════════════════════
// SharedFilterPanel: one panel behind a mutex
// ═══════════════════════════════════════════════════════════

/// Cloneable handle for hosts that drive the panel from several threads.
/// A transition and its recompute happen under one lock acquisition.
#[derive(Clone)]
pub struct SharedFilterPanel(Arc<Mutex<FilterPanel>>);

impl SharedFilterPanel {
    pub fn new(panel: FilterPanel) -> Self {
        Self(Arc::new(Mutex::new(panel)))
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, FilterPanel>, PanelError> {
        self.0.lock().map_err(|_| PanelError::LockPoisoned)
    }

    /// Run `f` with exclusive access to the panel.
    pub fn with<R>(&self, f: impl FnOnce(&mut FilterPanel) -> R) -> Result<R, PanelError> {
        let mut panel = self.lock()?;
        Ok(f(&mut panel))
    }
}

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use chrono::NaiveDate;

use super::catalog::FacetCatalog;
use super::dates::DayRange;
use super::selection::SelectionState;
use super::types::*;
use crate::models::{Case, CaseStatus, CaseType, FacetDimension, FilterFlag, ScanStatus, UserId};

/// A selection compiled against one evaluation day and user.
///
/// Facet constraints are `None` when nothing is selected in that dimension,
/// so `without` can drop one dimension and leave every other constraint in
/// place.
#[derive(Debug, Clone)]
pub struct CaseFilter<'a> {
    text: Option<String>,
    case_type: CaseType,
    current_user: Option<UserId>,
    scan_status: ScanStatus,
    urgent_only: bool,
    no_images_only: bool,
    completed_shares_only: bool,
    unseen_images_only: bool,
    dates: DayRange,
    sites: Option<&'a BTreeSet<String>>,
    sectors: Option<&'a BTreeSet<String>>,
    doctors: Option<&'a BTreeSet<UserId>>,
}

impl<'a> CaseFilter<'a> {
    pub fn new(selection: &'a SelectionState, today: NaiveDate, current_user: Option<UserId>) -> Self {
        let non_empty = |set: &'a BTreeSet<String>| (!set.is_empty()).then_some(set);
        let text = selection.search_text();
        Self {
            text: (!text.is_empty()).then(|| text.to_lowercase()),
            case_type: selection.case_type(),
            current_user,
            scan_status: selection.scan_status(),
            urgent_only: selection.flag(FilterFlag::UrgentOnly),
            no_images_only: selection.flag(FilterFlag::NoImagesOnly),
            completed_shares_only: selection.flag(FilterFlag::CompletedSharesOnly),
            unseen_images_only: selection.flag(FilterFlag::UnseenImagesOnly),
            dates: selection.effective_dates(today),
            sites: non_empty(selection.selected_sites()),
            sectors: non_empty(selection.selected_sectors()),
            doctors: Some(selection.selected_doctors()).filter(|set| !set.is_empty()),
        }
    }

    /// Same filter with one facet dimension's selection cleared.
    pub fn without(&self, dimension: FacetDimension) -> Self {
        let mut filter = self.clone();
        match dimension {
            FacetDimension::Site => filter.sites = None,
            FacetDimension::Sector => filter.sectors = None,
            FacetDimension::Doctor => filter.doctors = None,
        }
        filter
    }

    pub fn matches(&self, case: &Case) -> bool {
        self.matches_criteria(case) && self.matches_facets(case)
    }

    /// Everything except the three facet dimensions.
    fn matches_criteria(&self, case: &Case) -> bool {
        if let Some(ref text) = self.text {
            let hit = case.title.to_lowercase().contains(text)
                || case.site.to_lowercase().contains(text)
                || case.sector.to_lowercase().contains(text);
            if !hit {
                return false;
            }
        }

        let case_type_ok = match self.case_type {
            CaseType::All => true,
            CaseType::My => self.current_user.is_some() && case.assigned_doctor_id == self.current_user,
            CaseType::Unassigned => case.assigned_doctor_id.is_none(),
        };
        let scan_ok = match self.scan_status {
            ScanStatus::All => true,
            ScanStatus::FullyScanned => case.is_fully_scanned,
            ScanStatus::Pending => !case.is_fully_scanned,
        };

        case_type_ok
            && scan_ok
            && (!self.urgent_only || case.status == CaseStatus::Urgent)
            && (!self.no_images_only || !case.is_scanned)
            && (!self.completed_shares_only
                || (case.status == CaseStatus::Completed && case.has_shares))
            && (!self.unseen_images_only || case.has_unseen_images)
            && self.dates.contains(case.day())
    }

    fn matches_facets(&self, case: &Case) -> bool {
        self.sites.map_or(true, |s| s.contains(&case.site))
            && self.sectors.map_or(true, |s| s.contains(&case.sector))
            && self.doctors.map_or(true, |s| {
                case.assigned_doctor_id.is_some_and(|id| s.contains(&id))
            })
    }
}

/// Inputs for one recompute pass. Either collection may be missing
/// (collaborator has not answered yet).
#[derive(Debug, Clone, Copy)]
pub struct EngineInput<'a> {
    pub cases: Option<&'a [Case]>,
    pub catalog: Option<&'a FacetCatalog>,
    pub selection: &'a SelectionState,
    pub today: NaiveDate,
    pub current_user: Option<UserId>,
}

/// Derive the facet view for a selection.
///
/// Pure: identical inputs give identical output. A missing case collection
/// or catalog yields an empty subset and zero counts.
pub fn recompute(input: &EngineInput<'_>) -> FacetView {
    let Some(catalog) = input.catalog else {
        return FacetView::default();
    };
    let cases = input.cases.unwrap_or(&[]);
    let selection = input.selection;
    let filter = CaseFilter::new(selection, input.today, input.current_user);

    let mut case_ids = Vec::new();
    let mut unattributed = 0;
    for case in cases.iter().filter(|c| filter.matches(c)) {
        case_ids.push(case.id);
        if !catalog.has_site(&case.site) || !catalog.has_sector(&case.sector) {
            unattributed += 1;
        }
    }

    let site_counts = count_by(cases, &filter.without(FacetDimension::Site), |c| {
        Some(c.site.as_str())
    });
    let sector_counts = count_by(cases, &filter.without(FacetDimension::Sector), |c| {
        Some(c.sector.as_str())
    });
    let doctor_counts = count_by(cases, &filter.without(FacetDimension::Doctor), |c| {
        c.assigned_doctor_id
    });

    let picked_sites = selection.selected_sites();
    let site_query = picker_query(selection, FacetDimension::Site);
    let sector_query = picker_query(selection, FacetDimension::Sector);
    let doctor_query = picker_query(selection, FacetDimension::Doctor);

    let sites = catalog
        .sites()
        .iter()
        .filter(|name| name_matches(name, &site_query))
        .map(|name| FacetOption {
            name: name.clone(),
            count: site_counts.get(name.as_str()).copied().unwrap_or(0),
            selected: picked_sites.contains(name),
        })
        .collect();

    let sectors = catalog
        .sectors()
        .iter()
        .filter(|s| picked_sites.is_empty() || picked_sites.contains(&s.site))
        .filter(|s| name_matches(&s.name, &sector_query))
        .map(|s| SectorOption {
            name: s.name.clone(),
            site: s.site.clone(),
            count: sector_counts.get(s.name.as_str()).copied().unwrap_or(0),
            selected: selection.selected_sectors().contains(&s.name),
        })
        .collect();

    // Doctors without a site affiliation drop out as soon as any site is picked.
    let doctors = catalog
        .doctors()
        .iter()
        .filter(|d| {
            picked_sites.is_empty()
                || d.site.as_ref().is_some_and(|site| picked_sites.contains(site))
        })
        .filter(|d| name_matches(&d.name, &doctor_query))
        .map(|d| DoctorOption {
            id: d.id,
            name: d.name.clone(),
            site: d.site.clone(),
            count: doctor_counts.get(&d.id).copied().unwrap_or(0),
            selected: selection.selected_doctors().contains(&d.id),
        })
        .collect();

    FacetView {
        sites,
        sectors,
        doctors,
        total: case_ids.len(),
        case_ids,
        unattributed,
    }
}

fn count_by<'c, K, F>(cases: &'c [Case], filter: &CaseFilter<'_>, key: F) -> HashMap<K, usize>
where
    K: Eq + Hash,
    F: Fn(&'c Case) -> Option<K>,
{
    let mut counts = HashMap::new();
    for case in cases.iter().filter(|c| filter.matches(c)) {
        if let Some(k) = key(case) {
            *counts.entry(k).or_insert(0) += 1;
        }
    }
    counts
}

fn picker_query(selection: &SelectionState, dimension: FacetDimension) -> String {
    selection.facet_query(dimension).to_lowercase()
}

fn name_matches(name: &str, lowered_query: &str) -> bool {
    lowered_query.is_empty() || name.to_lowercase().contains(lowered_query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn case(id: i64, site: &str, sector: &str, doctor: Option<UserId>) -> Case {
        Case {
            id,
            title: format!("Case #{id:03}"),
            assigned_doctor_id: doctor,
            site: site.into(),
            sector: sector.into(),
            date: Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap(),
            status: CaseStatus::Pending,
            is_scanned: true,
            has_unseen_images: false,
            is_fully_scanned: true,
            has_shares: false,
        }
    }

    #[test]
    fn empty_selection_matches_everything() {
        let state = SelectionState::new();
        let filter = CaseFilter::new(&state, today(), None);
        assert!(filter.matches(&case(1, "A", "X", None)));
        assert!(filter.matches(&case(2, "B", "Y", Some(3))));
    }

    #[test]
    fn unassigned_case_never_matches_doctor_selection() {
        let mut state = SelectionState::new();
        state.toggle_facet_value(crate::facets::FacetValue::Doctor(3));
        let filter = CaseFilter::new(&state, today(), None);
        assert!(!filter.matches(&case(1, "A", "X", None)));
        assert!(filter.matches(&case(2, "A", "X", Some(3))));
        assert!(filter.without(FacetDimension::Doctor).matches(&case(1, "A", "X", None)));
    }

    #[test]
    fn my_cases_need_a_current_user() {
        let mut state = SelectionState::new();
        state.set_case_type(CaseType::My);
        let c = case(1, "A", "X", Some(1));
        assert!(!CaseFilter::new(&state, today(), None).matches(&c));
        assert!(CaseFilter::new(&state, today(), Some(1)).matches(&c));
        assert!(!CaseFilter::new(&state, today(), Some(2)).matches(&c));
    }

    #[test]
    fn scan_status_and_flags() {
        let mut pending = case(1, "A", "X", None);
        pending.is_fully_scanned = false;
        pending.is_scanned = false;
        pending.status = CaseStatus::Urgent;
        let mut shared = case(2, "A", "X", None);
        shared.status = CaseStatus::Completed;
        shared.has_shares = true;
        shared.has_unseen_images = true;

        let mut state = SelectionState::new();
        state.set_scan_status(ScanStatus::Pending);
        let filter = CaseFilter::new(&state, today(), None);
        assert!(filter.matches(&pending));
        assert!(!filter.matches(&shared));

        let mut state = SelectionState::new();
        state.set_flag(FilterFlag::CompletedSharesOnly, true);
        state.set_flag(FilterFlag::UnseenImagesOnly, true);
        let filter = CaseFilter::new(&state, today(), None);
        assert!(filter.matches(&shared));
        assert!(!filter.matches(&pending));

        let mut state = SelectionState::new();
        state.set_flag(FilterFlag::UrgentOnly, true);
        state.set_flag(FilterFlag::NoImagesOnly, true);
        let filter = CaseFilter::new(&state, today(), None);
        assert!(filter.matches(&pending));
        assert!(!filter.matches(&shared));
    }

    #[test]
    fn missing_catalog_is_no_data() {
        let cases = vec![case(1, "A", "X", None)];
        let state = SelectionState::new();
        let view = recompute(&EngineInput {
            cases: Some(&cases),
            catalog: None,
            selection: &state,
            today: today(),
            current_user: None,
        });
        assert_eq!(view, FacetView::default());
    }

    #[test]
    fn missing_cases_gives_zero_counts() {
        let catalog = FacetCatalog::new(
            vec!["A".into()],
            vec![crate::facets::SectorEntry::new("X", "A")],
            vec![],
        )
        .unwrap();
        let state = SelectionState::new();
        let view = recompute(&EngineInput {
            cases: None,
            catalog: Some(&catalog),
            selection: &state,
            today: today(),
            current_user: None,
        });
        assert_eq!(view.total, 0);
        assert_eq!(view.site("A").unwrap().count, 0);
        assert_eq!(view.sector("X").unwrap().count, 0);
    }
}

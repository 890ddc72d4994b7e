//! Results page: one sorted, paged slice of the cases matching a selection.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PAGE_SIZE;
use crate::facets::CaseFilter;
use crate::models::{Case, SearchResult, SortOrder};

/// `page` is 1-based; 0 reads as 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsQuery {
    pub page: u32,
    pub page_size: u32,
    pub sort: SortOrder,
}

impl Default for ResultsQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortOrder::default(),
        }
    }
}

impl ResultsQuery {
    fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.page_size as usize
    }
}

/// Filter, sort by date (ties by id), then slice out the requested page.
/// `total` is the size of the whole filtered set.
pub fn results_page(cases: &[Case], filter: &CaseFilter<'_>, query: &ResultsQuery) -> SearchResult<Case> {
    let mut matched: Vec<&Case> = cases.iter().filter(|c| filter.matches(c)).collect();
    match query.sort {
        SortOrder::NewestFirst => matched.sort_by(|a, b| b.date.cmp(&a.date).then(a.id.cmp(&b.id))),
        SortOrder::OldestFirst => matched.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id))),
    }

    let total = matched.len();
    let items = matched
        .into_iter()
        .skip(query.offset())
        .take(query.page_size as usize)
        .cloned()
        .collect();

    SearchResult {
        items,
        total,
        page: query.page.max(1),
        page_size: query.page_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::seed;
    use crate::facets::{FacetValue, SelectionState};
    use crate::models::CaseId;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn demo_cases() -> Vec<Case> {
        seed::demo_cases(Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap())
    }

    fn ids(result: &SearchResult<Case>) -> Vec<CaseId> {
        result.items.iter().map(|c| c.id).collect()
    }

    #[test]
    fn newest_first_by_default() {
        let cases = demo_cases();
        let state = SelectionState::new();
        let filter = CaseFilter::new(&state, today(), None);
        let page = results_page(
            &cases,
            &filter,
            &ResultsQuery {
                page_size: 3,
                ..Default::default()
            },
        );
        assert_eq!(page.total, 16);
        assert_eq!(ids(&page), vec![1, 2, 3]);
    }

    #[test]
    fn oldest_first_and_paging() {
        let cases = demo_cases();
        let mut state = SelectionState::new();
        state.toggle_facet_value(FacetValue::Site("CHU-Caen".into()));
        let filter = CaseFilter::new(&state, today(), None);
        let query = ResultsQuery {
            page: 2,
            page_size: 2,
            sort: SortOrder::NewestFirst.toggle(),
        };
        let page = results_page(&cases, &filter, &query);
        // CHU-Caen: 4, 5, 6, 15, 16 -> oldest first 16, 15, 6, 5, 4
        assert_eq!(page.total, 5);
        assert_eq!(ids(&page), vec![6, 5]);
    }

    #[test]
    fn page_zero_reads_as_first_page() {
        let cases = demo_cases();
        let state = SelectionState::new();
        let filter = CaseFilter::new(&state, today(), None);
        let page = results_page(
            &cases,
            &filter,
            &ResultsQuery {
                page: 0,
                page_size: 1,
                sort: SortOrder::NewestFirst,
            },
        );
        assert_eq!(page.page, 1);
        assert_eq!(ids(&page), vec![1]);
    }

    #[test]
    fn page_past_end_is_empty() {
        let cases = demo_cases();
        let state = SelectionState::new();
        let filter = CaseFilter::new(&state, today(), None);
        let page = results_page(
            &cases,
            &filter,
            &ResultsQuery {
                page: 9,
                page_size: 10,
                sort: SortOrder::NewestFirst,
            },
        );
        assert_eq!(page.total, 16);
        assert!(page.items.is_empty());
    }

    #[test]
    fn equal_dates_break_ties_by_id() {
        let mut cases = demo_cases();
        let stamp = cases[0].date;
        for case in &mut cases {
            case.date = stamp;
        }
        let state = SelectionState::new();
        let filter = CaseFilter::new(&state, today(), None);
        let query = ResultsQuery {
            page_size: 4,
            ..Default::default()
        };
        assert_eq!(ids(&results_page(&cases, &filter, &query)), vec![1, 2, 3, 4]);
    }
}

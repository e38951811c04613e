//! Fund table state: filters, search, sort and pagination
//!
//! Any change that alters the result set sends the table back to the
//! first page.

use crate::models::{FundsQuery, SortOrder};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SORT_FIELD: &str = "return1Year";
pub const DEFAULT_ROWS_PER_PAGE: u32 = 25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundsTable {
    filters: FundsQuery,
    search: Option<String>,
    sort_by: String,
    sort_order: SortOrder,
    page: u32,
    rows_per_page: u32,
}

impl Default for FundsTable {
    fn default() -> Self {
        Self {
            filters: FundsQuery::default(),
            search: None,
            sort_by: DEFAULT_SORT_FIELD.to_string(),
            sort_order: SortOrder::Desc,
            page: 0,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

impl FundsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn rows_per_page(&self) -> u32 {
        self.rows_per_page
    }

    pub fn sort(&self) -> (&str, SortOrder) {
        (&self.sort_by, self.sort_order)
    }

    /// Direction shown on a column header, `None` when not the sort column
    pub fn sort_direction(&self, field: &str) -> Option<SortOrder> {
        (self.sort_by == field).then_some(self.sort_order)
    }

    /// Click on a column header. Unsortable fields are ignored; the
    /// current column flips direction; a new column starts descending.
    /// Returns whether the state changed.
    pub fn sort_by(&mut self, field: &str, sortable: &[String]) -> bool {
        if !sortable.iter().any(|f| f == field) {
            return false;
        }

        if self.sort_by == field {
            self.sort_order = self.sort_order.toggled();
        } else {
            self.sort_by = field.to_string();
            self.sort_order = SortOrder::Desc;
        }
        self.page = 0;
        true
    }

    /// Jump straight to `field` in `order`, as a link or bookmark would.
    /// Unsortable fields are ignored.
    pub fn set_sort(&mut self, field: &str, order: SortOrder, sortable: &[String]) -> bool {
        if !sortable.iter().any(|f| f == field) {
            return false;
        }

        self.sort_by = field.to_string();
        self.sort_order = order;
        self.page = 0;
        true
    }

    /// Only the filter fields are kept; sort and paging stay table-owned
    pub fn set_filters(&mut self, filters: FundsQuery) {
        self.filters = FundsQuery {
            sort_by: None,
            sort_order: None,
            skip: None,
            limit: None,
            ..filters
        };
        self.page = 0;
    }

    pub fn clear_filters(&mut self) {
        self.filters = FundsQuery::default();
        self.search = None;
        self.page = 0;
    }

    pub fn set_search(&mut self, term: &str) {
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self.page = 0;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page;
    }

    pub fn set_rows_per_page(&mut self, rows: u32) {
        self.rows_per_page = rows.max(1);
        self.page = 0;
    }

    /// Last page index for `total` rows
    pub fn last_page(&self, total: u64) -> u32 {
        let rows = u64::from(self.rows_per_page);
        u32::try_from(total.saturating_sub(1) / rows).unwrap_or(u32::MAX)
    }

    /// Request for the current view. The search term travels as the
    /// manager substring filter.
    pub fn query(&self) -> FundsQuery {
        let mut query = self.filters.clone();
        if let Some(search) = &self.search {
            query.manager = Some(search.clone());
        }
        query.sort_by = Some(self.sort_by.clone());
        query.sort_order = Some(self.sort_order);
        query.skip = Some(self.page.saturating_mul(self.rows_per_page));
        query.limit = Some(self.rows_per_page);
        query
    }
}

//! Filter, sort and pagination state for the products listing.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Everything that determines which page of products is requested.
///
/// `offset` is a multiple of `limit` under normal UI flows. Price bounds are
/// forwarded as given; `price_min > price_max` is left to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub offset: usize,
    pub limit: usize,
    pub search: Option<String>,
    pub category: Option<String>,
    pub is_sold: Option<bool>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            search: None,
            category: None,
            is_sold: None,
            price_min: None,
            price_max: None,
            sort_by: None,
            sort_order: SortOrder::Asc,
        }
    }
}

impl FilterState {
    /// `ordering` query value: the field, prefixed with `-` when descending.
    pub fn ordering(&self) -> Option<String> {
        self.sort_by.as_ref().map(|field| match self.sort_order {
            SortOrder::Asc => field.clone(),
            SortOrder::Desc => format!("-{}", field),
        })
    }

    /// Zero-based page the current offset falls on.
    pub fn page_index(&self) -> usize {
        self.offset / self.limit.max(1)
    }

    /// Query parameters for `GET products/list`. Absent fields are omitted.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("offset", self.offset.to_string()),
            ("limit", self.limit.to_string()),
        ];

        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            query.push(("category", category.to_string()));
        }
        if let Some(ordering) = self.ordering() {
            query.push(("ordering", ordering));
        }
        if let Some(sold) = self.is_sold {
            query.push(("sold", sold.to_string()));
        }
        if let Some(min) = self.price_min {
            query.push(("min_price", min.to_string()));
        }
        if let Some(max) = self.price_max {
            query.push(("max_price", max.to_string()));
        }

        query
    }

    /// Apply a patch in place.
    ///
    /// Offset drops back to 0 whenever a filter field changes, or when the
    /// page size changes without an explicit offset. Returns true if the
    /// state changed.
    pub fn apply(&mut self, patch: FilterPatch) -> bool {
        let before = self.clone();
        let resets_offset = patch.touches_filters() || (patch.limit.is_some() && patch.offset.is_none());

        if let Some(offset) = patch.offset {
            self.offset = offset;
        }
        if let Some(limit) = patch.limit {
            self.limit = limit;
        }
        if let Some(search) = patch.search {
            self.search = search;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(is_sold) = patch.is_sold {
            self.is_sold = is_sold;
        }
        if let Some(price_min) = patch.price_min {
            self.price_min = price_min;
        }
        if let Some(price_max) = patch.price_max {
            self.price_max = price_max;
        }
        if let Some(sort_by) = patch.sort_by {
            self.sort_by = sort_by;
        }
        if let Some(sort_order) = patch.sort_order {
            self.sort_order = sort_order;
        }

        if resets_offset {
            self.offset = 0;
        }

        *self != before
    }
}

/// Partial update to a [`FilterState`].
///
/// Each optional field is tri-state: `None` leaves it alone, `Some(None)`
/// clears it, `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub is_sold: Option<Option<bool>>,
    pub price_min: Option<Option<f64>>,
    pub price_max: Option<Option<f64>>,
    pub sort_by: Option<Option<String>>,
    pub sort_order: Option<SortOrder>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn search(mut self, search: Option<impl Into<String>>) -> Self {
        self.search = Some(search.map(Into::into));
        self
    }

    pub fn category(mut self, category: Option<impl Into<String>>) -> Self {
        self.category = Some(category.map(Into::into));
        self
    }

    pub fn is_sold(mut self, is_sold: Option<bool>) -> Self {
        self.is_sold = Some(is_sold);
        self
    }

    pub fn price_min(mut self, price_min: Option<f64>) -> Self {
        self.price_min = Some(price_min);
        self
    }

    pub fn price_max(mut self, price_max: Option<f64>) -> Self {
        self.price_max = Some(price_max);
        self
    }

    pub fn sort(mut self, sort_by: Option<impl Into<String>>, sort_order: SortOrder) -> Self {
        self.sort_by = Some(sort_by.map(Into::into));
        self.sort_order = Some(sort_order);
        self
    }

    /// True if the patch changes anything besides paging or sorting.
    pub fn touches_filters(&self) -> bool {
        self.search.is_some()
            || self.category.is_some()
            || self.is_sold.is_some()
            || self.price_min.is_some()
            || self.price_max.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_value<'a>(query: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        query.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_default_query_has_only_paging() {
        let query = FilterState::default().to_query();
        assert_eq!(
            query,
            vec![("offset", "0".to_string()), ("limit", "10".to_string())]
        );
    }

    #[test]
    fn test_ordering_prefix() {
        let mut filter = FilterState::default();
        assert_eq!(filter.ordering(), None);

        filter.sort_by = Some("price".to_string());
        assert_eq!(filter.ordering().as_deref(), Some("price"));

        filter.sort_order = SortOrder::Desc;
        assert_eq!(filter.ordering().as_deref(), Some("-price"));
    }

    #[test]
    fn test_query_keeps_false_sold_and_zero_price() {
        let filter = FilterState {
            is_sold: Some(false),
            price_min: Some(0.0),
            price_max: Some(12.5),
            ..FilterState::default()
        };
        let query = filter.to_query();

        assert_eq!(query_value(&query, "sold"), Some("false"));
        assert_eq!(query_value(&query, "min_price"), Some("0"));
        assert_eq!(query_value(&query, "max_price"), Some("12.5"));
    }

    #[test]
    fn test_query_skips_empty_strings() {
        let filter = FilterState {
            search: Some(String::new()),
            category: Some(String::new()),
            ..FilterState::default()
        };
        let query = filter.to_query();
        assert_eq!(query_value(&query, "search"), None);
        assert_eq!(query_value(&query, "category"), None);
    }

    #[test]
    fn test_inverted_price_bounds_forwarded() {
        let filter = FilterState {
            price_min: Some(100.0),
            price_max: Some(10.0),
            ..FilterState::default()
        };
        let query = filter.to_query();
        assert_eq!(query_value(&query, "min_price"), Some("100"));
        assert_eq!(query_value(&query, "max_price"), Some("10"));
    }

    #[test]
    fn test_filter_change_resets_offset() {
        let patches = [
            FilterPatch::new().category(Some("Shoes")),
            FilterPatch::new().is_sold(Some(true)),
            FilterPatch::new().price_min(Some(5.0)),
            FilterPatch::new().price_max(None),
            FilterPatch::new().search(Some("boot")),
        ];

        for patch in patches {
            let mut filter = FilterState {
                offset: 30,
                ..FilterState::default()
            };
            filter.apply(patch.clone());
            assert_eq!(filter.offset, 0, "patch {:?} must reset offset", patch);
        }
    }

    #[test]
    fn test_filter_change_overrides_explicit_offset() {
        let mut filter = FilterState::default();
        filter.apply(FilterPatch::new().offset(20).category(Some("Hats")));
        assert_eq!(filter.offset, 0);
    }

    #[test]
    fn test_sort_and_offset_patches_keep_offset() {
        let mut filter = FilterState {
            offset: 20,
            ..FilterState::default()
        };
        filter.apply(FilterPatch::new().sort(Some("price"), SortOrder::Desc));
        assert_eq!(filter.offset, 20);

        filter.apply(FilterPatch::new().offset(40));
        assert_eq!(filter.offset, 40);

        filter.apply(FilterPatch::new().offset(5).limit(5));
        assert_eq!(filter.offset, 5);
        assert_eq!(filter.limit, 5);
    }

    #[test]
    fn test_limit_change_resets_offset() {
        let mut filter = FilterState {
            offset: 20,
            ..FilterState::default()
        };
        filter.apply(FilterPatch::new().limit(15));
        assert_eq!(filter.offset, 0);
        assert_eq!(filter.limit, 15);
    }

    #[test]
    fn test_patches_compose() {
        let mut filter = FilterState::default();
        filter.apply(FilterPatch::new().price_min(Some(10.0)));
        filter.apply(FilterPatch::new().price_max(Some(50.0)));
        assert_eq!(filter.price_min, Some(10.0));
        assert_eq!(filter.price_max, Some(50.0));

        filter.apply(FilterPatch::new().price_min(None));
        assert_eq!(filter.price_min, None);
        assert_eq!(filter.price_max, Some(50.0));
    }

    #[test]
    fn test_apply_reports_change() {
        let mut filter = FilterState::default();
        assert!(!filter.apply(FilterPatch::new()));
        assert!(filter.apply(FilterPatch::new().category(Some("Shoes"))));
        assert!(!filter.apply(FilterPatch::new().category(Some("Shoes"))));
    }

    #[test]
    fn test_page_index() {
        let filter = FilterState {
            offset: 30,
            limit: 15,
            ..FilterState::default()
        };
        assert_eq!(filter.page_index(), 2);
    }
}

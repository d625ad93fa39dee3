//! Search query over the order collection: a normalized, bounded value
//! object plus the pure normalizer that builds it from raw external input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ordertrack_core::{DomainError, DomainResult, ValueObject};

use crate::order::{Order, OrderStatus};

/// Page size applied when the caller gives none (or a non-positive one).
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Hard upper bound on page size; larger requests are clamped, not rejected.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Fields the order collection can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Whitelist parse; anything unrecognized falls back to the default
    /// (`UpdatedAt`) instead of erroring.
    fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("createdat") | Some("created_at") => SortField::CreatedAt,
            Some("updatedat") | Some("updated_at") => SortField::UpdatedAt,
            _ => SortField::UpdatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            _ => SortDirection::Desc,
        }
    }
}

/// Raw, untrusted filter input as it arrives at the edge (query string,
/// message payload). Everything is optional; strings are unparsed.
#[derive(Debug, Clone, Default)]
pub struct OrderSearchInput {
    pub order_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: Option<String>,
    pub updated_from: Option<String>,
    pub updated_to: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

/// Normalized, bounded search query.
///
/// Can only be built through [`OrderSearchQuery::from_input`] (or
/// `Default`), so every instance is already validated and clamped by the
/// time it reaches a store adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSearchQuery {
    order_id_contains: Option<String>,
    customer_id_contains: Option<String>,
    status: Option<OrderStatus>,
    updated_from: Option<DateTime<Utc>>,
    updated_to: Option<DateTime<Utc>>,
    page: u32,
    size: u32,
    sort_by: SortField,
    sort_dir: SortDirection,
}

impl ValueObject for OrderSearchQuery {}

impl Default for OrderSearchQuery {
    /// No filters, first page, default size, newest-updated first.
    fn default() -> Self {
        Self {
            order_id_contains: None,
            customer_id_contains: None,
            status: None,
            updated_from: None,
            updated_to: None,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort_by: SortField::UpdatedAt,
            sort_dir: SortDirection::Desc,
        }
    }
}

impl OrderSearchQuery {
    /// Normalize raw external input into a bounded query.
    ///
    /// Rules:
    /// - blank/absent optional filters mean "no filter", never an
    ///   empty-substring match;
    /// - an unknown status or malformed timestamp fails validation before
    ///   any data access;
    /// - pagination is clamped (negative page -> 0, size <= 0 -> default,
    ///   size > max -> max);
    /// - unrecognized sort field/direction silently fall back to defaults.
    pub fn from_input(input: OrderSearchInput) -> DomainResult<Self> {
        let status = match non_blank(input.status) {
            Some(raw) => Some(raw.parse::<OrderStatus>()?),
            None => None,
        };

        let size = match input.size {
            Some(s) if s > 0 => (s.min(i64::from(MAX_PAGE_SIZE))) as u32,
            _ => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            order_id_contains: non_blank(input.order_id),
            customer_id_contains: non_blank(input.customer_id),
            status,
            updated_from: parse_instant("updatedFrom", non_blank(input.updated_from))?,
            updated_to: parse_instant("updatedTo", non_blank(input.updated_to))?,
            page: input.page.unwrap_or(0).clamp(0, i64::from(u32::MAX)) as u32,
            size,
            sort_by: SortField::parse_or_default(input.sort_by.as_deref()),
            sort_dir: SortDirection::parse_or_default(input.sort_dir.as_deref()),
        })
    }

    pub fn order_id_contains(&self) -> Option<&str> {
        self.order_id_contains.as_deref()
    }

    pub fn customer_id_contains(&self) -> Option<&str> {
        self.customer_id_contains.as_deref()
    }

    pub fn status(&self) -> Option<OrderStatus> {
        self.status
    }

    pub fn updated_from(&self) -> Option<DateTime<Utc>> {
        self.updated_from
    }

    pub fn updated_to(&self) -> Option<DateTime<Utc>> {
        self.updated_to
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort_by(&self) -> SortField {
        self.sort_by
    }

    pub fn sort_dir(&self) -> SortDirection {
        self.sort_dir
    }

    /// Filter predicate shared by store adapters.
    ///
    /// Substring filters match case-insensitively as "contains"; the time
    /// range is inclusive on both ends when both bounds are present.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(needle) = self.order_id_contains() {
            if !contains_ci(order.id().as_str(), needle) {
                return false;
            }
        }
        if let Some(needle) = self.customer_id_contains() {
            if !contains_ci(order.customer_id().as_str(), needle) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if order.status() != status {
                return false;
            }
        }
        if let Some(from) = self.updated_from {
            if order.updated_at() < from {
                return false;
            }
        }
        if let Some(to) = self.updated_to {
            if order.updated_at() > to {
                return false;
            }
        }
        true
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_instant(field: &str, raw: Option<String>) -> DomainResult<Option<DateTime<Utc>>> {
    match raw {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| DomainError::validation(format!("{field}: invalid timestamp '{s}': {e}"))),
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordertrack_core::{CustomerId, OrderId};
    use proptest::prelude::*;

    fn input() -> OrderSearchInput {
        OrderSearchInput::default()
    }

    fn order(id: &str, customer: &str) -> Order {
        Order::create(
            OrderId::new(id).unwrap(),
            CustomerId::new(customer).unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn empty_input_yields_defaults() {
        let q = OrderSearchQuery::from_input(input()).unwrap();
        assert_eq!(q, OrderSearchQuery::default());
        assert_eq!(q.page(), 0);
        assert_eq!(q.size(), DEFAULT_PAGE_SIZE);
        assert_eq!(q.sort_by(), SortField::UpdatedAt);
        assert_eq!(q.sort_dir(), SortDirection::Desc);
    }

    #[test]
    fn blank_filters_are_dropped_not_matched_as_empty() {
        let q = OrderSearchQuery::from_input(OrderSearchInput {
            order_id: Some("   ".to_string()),
            customer_id: Some(String::new()),
            ..input()
        })
        .unwrap();

        assert_eq!(q.order_id_contains(), None);
        assert_eq!(q.customer_id_contains(), None);
    }

    #[test]
    fn status_filter_is_uppercased_and_validated() {
        let q = OrderSearchQuery::from_input(OrderSearchInput {
            status: Some(" shipped ".to_string()),
            ..input()
        })
        .unwrap();
        assert_eq!(q.status(), Some(OrderStatus::Shipped));

        let err = OrderSearchQuery::from_input(OrderSearchInput {
            status: Some("RETURNED".to_string()),
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn malformed_timestamp_fails_validation() {
        let err = OrderSearchQuery::from_input(OrderSearchInput {
            updated_from: Some("yesterday".to_string()),
            ..input()
        })
        .unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("updatedFrom")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn timestamps_parse_as_rfc3339_instants() {
        let q = OrderSearchQuery::from_input(OrderSearchInput {
            updated_from: Some("2024-01-01T00:00:00Z".to_string()),
            updated_to: Some("2024-01-31T23:59:59+01:00".to_string()),
            ..input()
        })
        .unwrap();

        assert_eq!(
            q.updated_from().unwrap(),
            "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(
            q.updated_to().unwrap(),
            "2024-01-31T22:59:59Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn pagination_is_clamped() {
        let q = OrderSearchQuery::from_input(OrderSearchInput {
            page: Some(-3),
            size: Some(0),
            ..input()
        })
        .unwrap();
        assert_eq!(q.page(), 0);
        assert_eq!(q.size(), DEFAULT_PAGE_SIZE);

        let q = OrderSearchQuery::from_input(OrderSearchInput {
            size: Some(10_000),
            ..input()
        })
        .unwrap();
        assert_eq!(q.size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn unrecognized_sort_inputs_fall_back_to_defaults() {
        let q = OrderSearchQuery::from_input(OrderSearchInput {
            sort_by: Some("priority".to_string()),
            sort_dir: Some("sideways".to_string()),
            ..input()
        })
        .unwrap();
        assert_eq!(q.sort_by(), SortField::UpdatedAt);
        assert_eq!(q.sort_dir(), SortDirection::Desc);

        let q = OrderSearchQuery::from_input(OrderSearchInput {
            sort_by: Some("createdAt".to_string()),
            sort_dir: Some("ASC".to_string()),
            ..input()
        })
        .unwrap();
        assert_eq!(q.sort_by(), SortField::CreatedAt);
        assert_eq!(q.sort_dir(), SortDirection::Asc);
    }

    #[test]
    fn substring_filters_match_case_insensitively() {
        let q = OrderSearchQuery::from_input(OrderSearchInput {
            order_id: Some("ORD".to_string()),
            ..input()
        })
        .unwrap();

        assert!(q.matches(&order("ord-17", "c-1")));
        assert!(q.matches(&order("x-Ord-2", "c-1")));
        assert!(!q.matches(&order("po-9", "c-1")));
    }

    #[test]
    fn updated_range_is_inclusive_on_both_ends() {
        let q = OrderSearchQuery::from_input(OrderSearchInput {
            updated_from: Some("2024-01-01T00:00:00Z".to_string()),
            updated_to: Some("2024-01-31T23:59:59Z".to_string()),
            ..input()
        })
        .unwrap();

        let at_lower = Order::create(
            OrderId::new("o-lo").unwrap(),
            CustomerId::new("c").unwrap(),
            "2024-01-01T00:00:00Z".parse().unwrap(),
        );
        let at_upper = Order::create(
            OrderId::new("o-hi").unwrap(),
            CustomerId::new("c").unwrap(),
            "2024-01-31T23:59:59Z".parse().unwrap(),
        );
        let outside = Order::create(
            OrderId::new("o-out").unwrap(),
            CustomerId::new("c").unwrap(),
            "2024-02-01T00:00:00Z".parse().unwrap(),
        );

        assert!(q.matches(&at_lower));
        assert!(q.matches(&at_upper));
        assert!(!q.matches(&outside));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: normalization always lands pagination inside the
        /// documented bounds, whatever the caller sends.
        #[test]
        fn normalized_pagination_is_always_in_bounds(
            page in any::<i64>(),
            size in any::<i64>(),
        ) {
            let q = OrderSearchQuery::from_input(OrderSearchInput {
                page: Some(page),
                size: Some(size),
                ..OrderSearchInput::default()
            }).unwrap();

            prop_assert!(q.size() >= 1 && q.size() <= MAX_PAGE_SIZE);
            prop_assert!(i64::from(q.page()) >= 0);
        }
    }
}



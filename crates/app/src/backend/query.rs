//! List query parameters

use std::fmt::{self, Display, Formatter};

use till::catalog::{BrandId, CategoryId};

/// Limit used when a caller wants the whole collection.
pub const UNBOUNDED_LIMIT: u32 = 99_999;

/// Sort order, sent as `field:asc` or `field:desc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    field: String,
    descending: bool,
}

impl Order {
    /// Ascending by `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    /// Descending by `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let direction = if self.descending { "desc" } else { "asc" };

        write!(f, "{}:{direction}", self.field)
    }
}

/// Paginated, sorted and optionally filtered list read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Maximum number of records.
    pub limit: u32,

    /// Records to skip.
    pub offset: u32,

    /// Sort order.
    pub order: Order,

    /// Free-text search.
    pub search_term: Option<String>,

    /// Only records in this category.
    pub category_id: Option<CategoryId>,

    /// Only records of this brand.
    pub brand_id: Option<BrandId>,
}

impl ListQuery {
    /// First `limit` records sorted by `order`.
    pub fn new(limit: u32, order: Order) -> Self {
        Self {
            limit,
            offset: 0,
            order,
            search_term: None,
            category_id: None,
            brand_id: None,
        }
    }

    /// Every record, sorted by `order`.
    pub fn all(order: Order) -> Self {
        Self::new(UNBOUNDED_LIMIT, order)
    }

    /// Page `page` (zero-based) of `page_size` records.
    #[must_use]
    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        self.limit = page_size;
        self.offset = page.saturating_mul(page_size);
        self
    }

    /// Filter by free-text search.
    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    /// Query-string pairs, in a stable order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
            ("order", self.order.to_string()),
        ];

        if let Some(term) = &self.search_term {
            pairs.push(("searchTerm", term.clone()));
        }

        if let Some(category) = &self.category_id {
            pairs.push(("categoryId", category.to_string()));
        }

        if let Some(brand) = &self.brand_id {
            pairs.push(("brandId", brand.to_string()));
        }

        pairs
    }
}

//! Catalog Browser
//!
//! Paged category → brand → product navigation over cached catalog lists.

use smallvec::SmallVec;

use crate::catalog::{Brand, BrandId, Category, CategoryId, Product};

/// Entries shown per page.
pub const PAGE_SIZE: usize = 10;

/// One page of a filtered list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    items: SmallVec<[&'a T; PAGE_SIZE]>,
    number: usize,
    has_next: bool,
}

impl<'a, T> Page<'a, T> {
    /// Entries on this page.
    pub fn items(&self) -> &[&'a T] {
        &self.items
    }

    /// Zero-based page number actually shown, after clamping.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Returns true if a later page has entries.
    pub fn has_next(&self) -> bool {
        self.has_next
    }

    /// Returns true if the page has no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Slice `entries` into pages of [`PAGE_SIZE`] and return page `page`.
///
/// A page past the end clamps back to the last page that has entries, so
/// paging forward from the last page stays put. Page 0 is returned as-is even
/// when empty.
pub fn paginate<'a, T>(entries: impl IntoIterator<Item = &'a T>, page: usize) -> Page<'a, T> {
    let entries: Vec<&'a T> = entries.into_iter().collect();

    let last_page = entries.len().saturating_sub(1) / PAGE_SIZE;
    let number = page.min(last_page);
    let offset = number.saturating_mul(PAGE_SIZE);

    Page {
        items: entries.iter().skip(offset).take(PAGE_SIZE).copied().collect(),
        number,
        has_next: entries.len() > offset.saturating_add(PAGE_SIZE),
    }
}

/// A page of categories.
pub fn categories(all: &[Category], page: usize) -> Page<'_, Category> {
    paginate(all, page)
}

/// A page of the brands listed under `category`.
pub fn brands<'a>(all: &'a [Brand], category: &CategoryId, page: usize) -> Page<'a, Brand> {
    paginate(
        all.iter()
            .filter(|brand| brand.category_id.as_ref() == Some(category)),
        page,
    )
}

/// A page of in-stock products of `brand`.
pub fn products<'a>(all: &'a [Product], brand: &BrandId, page: usize) -> Page<'a, Product> {
    paginate(
        all.iter()
            .filter(|product| product.brand_id.as_ref() == Some(brand) && product.stock > 0),
        page,
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn numbered_categories(count: usize) -> Result<Vec<Category>, serde_json::Error> {
        (0..count)
            .map(|i| serde_json::from_value(json!({ "id": i, "name": format!("Category {i}") })))
            .collect()
    }

    #[test]
    fn pages_hold_at_most_page_size_entries() -> TestResult {
        let all = numbered_categories(23)?;

        let first = categories(&all, 0);
        let last = categories(&all, 2);

        assert_eq!(first.items().len(), PAGE_SIZE);
        assert!(first.has_next());
        assert_eq!(last.items().len(), 3);
        assert!(!last.has_next());

        Ok(())
    }

    #[test]
    fn page_past_the_end_clamps_back() -> TestResult {
        let all = numbered_categories(20)?;

        let page = categories(&all, 2);

        assert_eq!(page.number(), 1);
        assert_eq!(page.items().first().map(|c| c.name.as_str()), Some("Category 10"));

        Ok(())
    }

    #[test]
    fn empty_first_page_is_not_clamped() {
        let page = categories(&[], 0);

        assert_eq!(page.number(), 0);
        assert!(page.is_empty());
    }

    #[test]
    fn brands_are_filtered_by_category() -> TestResult {
        let all: Vec<Brand> = serde_json::from_value(json!([
            { "id": "b1", "name": "Acme", "categoryId": 1 },
            { "id": "b2", "name": "Globex", "categoryId": 2 },
            { "id": "b3", "name": "Initech" }
        ]))?;

        let page = brands(&all, &CategoryId::new("1"), 0);

        assert_eq!(page.items().len(), 1);
        assert_eq!(page.items().first().map(|b| b.name.as_str()), Some("Acme"));

        Ok(())
    }

    #[test]
    fn products_are_filtered_by_brand_and_stock() -> TestResult {
        let all: Vec<Product> = serde_json::from_value(json!([
            { "id": "p1", "name": "Soap", "price": 10, "stock": 2, "brandId": "b1" },
            { "id": "p2", "name": "Gel", "price": 10, "stock": 0, "brandId": "b1" },
            { "id": "p3", "name": "Wax", "price": 10, "stock": 4, "brandId": "b2" }
        ]))?;

        let page = products(&all, &BrandId::new("b1"), 0);

        let names: Vec<&str> = page.items().iter().map(|p| p.name.as_str()).collect();

        assert_eq!(names, ["Soap"]);

        Ok(())
    }
}

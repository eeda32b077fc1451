//! Offset pagination primitives for the admin query surface.

use serde_json::json;

use crate::domain::Error;

/// Default page size for admin listings.
pub const DEFAULT_PAGE_LIMIT: i64 = 20;
/// Maximum accepted page size.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

impl PageRequest {
    /// Validate page parameters, applying documented defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::invalid_request`] when `page` is below 1 or `limit`
    /// falls outside `1..=MAX_PAGE_LIMIT`.
    pub fn try_new(page: Option<i64>, limit: Option<i64>) -> Result<Self, Error> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(Error::invalid_request("page must be at least 1")
                .with_details(json!({ "field": "page", "value": page })));
        }
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(
                Error::invalid_request(format!("limit must be between 1 and {MAX_PAGE_LIMIT}"))
                    .with_details(json!({ "field": "limit", "value": limit })),
            );
        }
        Ok(Self { page, limit })
    }

    pub fn page(self) -> i64 {
        self.page
    }

    pub fn limit(self) -> i64 {
        self.limit
    }

    /// Zero-based row offset of this page.
    pub fn offset(self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Number of pages needed for `total` rows at `limit` rows per page.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 { 0 } else { (total + limit - 1) / limit }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, Ok((1, DEFAULT_PAGE_LIMIT, 0)))]
    #[case(Some(2), Some(20), Ok((2, 20, 20)))]
    #[case(Some(0), None, Err(()))]
    #[case(None, Some(0), Err(()))]
    #[case(None, Some(MAX_PAGE_LIMIT + 1), Err(()))]
    fn validates_page_parameters(
        #[case] page: Option<i64>,
        #[case] limit: Option<i64>,
        #[case] expected: Result<(i64, i64, i64), ()>,
    ) {
        let result = PageRequest::try_new(page, limit)
            .map(|p| (p.page(), p.limit(), p.offset()))
            .map_err(|_| ());
        assert_eq!(result, expected);
    }

    #[rstest]
    #[case(45, 20, 3)]
    #[case(40, 20, 2)]
    #[case(41, 20, 3)]
    #[case(0, 20, 0)]
    #[case(1, 20, 1)]
    fn computes_total_pages(#[case] total: i64, #[case] limit: i64, #[case] expected: i64) {
        assert_eq!(total_pages(total, limit), expected);
    }
}

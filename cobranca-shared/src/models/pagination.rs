/// Page selection for list endpoints
///
/// Pages are 1-indexed. Values that are missing, non-numeric or not positive
/// fall back to the defaults (page 1, 10 rows). Page size is capped at
/// [`MAX_PAGE_SIZE`].

use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    #[serde(rename = "pagina")]
    pub number: i64,

    #[serde(rename = "limite")]
    pub size: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    /// Builds a page from raw query-string values
    ///
    /// ```
    /// use cobranca_shared::models::pagination::Page;
    ///
    /// let page = Page::from_query(Some("3"), None);
    /// assert_eq!((page.number, page.size), (3, 10));
    ///
    /// let page = Page::from_query(Some("abc"), Some("0"));
    /// assert_eq!((page.number, page.size), (1, 10));
    ///
    /// let page = Page::from_query(None, Some("5000"));
    /// assert_eq!(page.size, 100);
    /// ```
    pub fn from_query(page: Option<&str>, size: Option<&str>) -> Self {
        Self {
            number: parse_positive(page).unwrap_or(DEFAULT_PAGE),
            size: parse_positive(size)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip; saturates instead of overflowing on huge page numbers
    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.size)
    }

    /// Number of pages needed for `total` rows (`ceil(total / size)`)
    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 || self.size <= 0 {
            0
        } else {
            total / self.size + i64::from(total % self.size != 0)
        }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value > 0)
}

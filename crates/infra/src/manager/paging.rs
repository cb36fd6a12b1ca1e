use serde::{Deserialize, Serialize};

use atelier_core::ID_FIELD;

use crate::entity_store::{Filter, PageRequest};

/// Caller-facing paging options for `read`.
///
/// Every field has a default, so a partial JSON object (or none at all) is a
/// valid request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingOptions {
    pub page: u32,
    pub size: u32,
    pub order: String,
    pub asc: bool,
    /// Case-insensitive substring filter over `code` or `name`.
    pub keyword: Option<String>,
}

impl Default for PagingOptions {
    fn default() -> Self {
        Self {
            page: 1,
            size: 20,
            order: ID_FIELD.to_string(),
            asc: true,
            keyword: None,
        }
    }
}

impl PagingOptions {
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn page(mut self, page: u32, size: u32) -> Self {
        self.page = page;
        self.size = size;
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, asc: bool) -> Self {
        self.order = field.into();
        self.asc = asc;
        self
    }

    /// Live records, narrowed by the keyword when one is given.
    pub fn filter(&self) -> Filter {
        match self.keyword.as_deref() {
            Some(keyword) if !keyword.is_empty() => {
                Filter::not_deleted().and(Filter::keyword(keyword))
            }
            _ => Filter::not_deleted(),
        }
    }

    /// Store page request with the size clamped to `1..=max_size`.
    pub fn page_request(&self, max_size: u32) -> PageRequest {
        PageRequest {
            page: self.page.max(1),
            size: self.size.clamp(1, max_size.max(1)),
            order: if self.order.is_empty() {
                ID_FIELD.to_string()
            } else {
                self.order.clone()
            },
            asc: self.asc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_options_take_defaults() {
        let options: PagingOptions = serde_json::from_value(json!({ "keyword": "acme" })).unwrap();
        assert_eq!(options.page, 1);
        assert_eq!(options.size, 20);
        assert_eq!(options.order, "_id");
        assert!(options.asc);
        assert_eq!(options.keyword.as_deref(), Some("acme"));
    }

    #[test]
    fn filter_always_excludes_deleted() {
        assert_eq!(PagingOptions::default().filter(), Filter::not_deleted());
        assert_eq!(
            PagingOptions::default().keyword("").filter(),
            Filter::not_deleted()
        );
        assert_eq!(
            PagingOptions::default().keyword("acme").filter(),
            Filter::And(vec![Filter::not_deleted(), Filter::keyword("acme")])
        );
    }

    #[test]
    fn page_request_is_clamped() {
        let request = PagingOptions::default().page(0, 500).page_request(100);
        assert_eq!(request.page, 1);
        assert_eq!(request.size, 100);

        let request = PagingOptions::default().page(2, 0).page_request(100);
        assert_eq!(request.size, 1);
        assert_eq!(request.order, "_id");
    }
}

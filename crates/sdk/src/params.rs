//! Filter and pagination descriptor for collection queries.

use serde::{Deserialize, Serialize};

/// Sort direction for [`Sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Orders a collection by one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Generic filter/pagination descriptor for collection-returning queries.
///
/// Encoded as the service's `api:*` query parameters. `query` and
/// `aggregation` are JSON documents in the service's query language and are
/// passed through verbatim. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParams {
    pub query: Option<String>,
    /// Free-text search.
    pub search: Option<String>,
    pub sort: Option<Sort>,
    pub aggregation: Option<String>,
    /// Zero-based page index.
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn aggregation(mut self, aggregation: impl Into<String>) -> Self {
        self.aggregation = Some(aggregation.into());
        self
    }

    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }

    /// Returns the query pairs to send, in a stable order.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(query) = &self.query {
            pairs.push(("api:query".to_owned(), query.clone()));
        }
        if let Some(search) = &self.search {
            pairs.push(("api:search".to_owned(), search.clone()));
        }
        if let Some(sort) = &self.sort {
            // {"field":"asc"}
            let mut value = serde_json::Map::new();
            value.insert(sort.field.clone(), sort.direction.as_str().into());
            pairs.push(("api:sort".to_owned(), serde_json::Value::Object(value).to_string()));
        }
        if let Some(aggregation) = &self.aggregation {
            pairs.push(("api:aggregation".to_owned(), aggregation.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("api:page".to_owned(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("api:pageSize".to_owned(), page_size.to_string()));
        }
        pairs
    }
}

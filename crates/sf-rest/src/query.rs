//! SOQL query page type.

use serde::Deserialize;

/// One page of a REST query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse<T> {
    pub total_size: u64,
    pub done: bool,
    #[serde(default)]
    pub next_records_url: Option<String>,
    pub records: Vec<T>,
}

impl<T> QueryResponse<T> {
    /// The relative URL of the next page, if there is one.
    pub fn next_page(&self) -> Option<&str> {
        if self.done {
            None
        } else {
            self.next_records_url.as_deref()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Account {
        id: String,
        name: String,
    }

    #[test]
    fn test_query_response_deserialization() {
        let page: QueryResponse<Account> = serde_json::from_value(json!({
            "totalSize": 3,
            "done": false,
            "nextRecordsUrl": "/services/data/v62.0/query/01gxx-2000",
            "records": [
                {"attributes": {"type": "Account"}, "Id": "001A", "Name": "Acme"},
                {"attributes": {"type": "Account"}, "Id": "001B", "Name": "Globex"}
            ]
        }))
        .unwrap();

        assert_eq!(page.total_size, 3);
        assert_eq!(page.records[1].name, "Globex");
        assert_eq!(page.records[0].id, "001A");
        assert_eq!(page.next_page(), Some("/services/data/v62.0/query/01gxx-2000"));
    }

    #[test]
    fn test_last_page_has_no_next() {
        let page: QueryResponse<serde_json::Value> = serde_json::from_value(json!({
            "totalSize": 1,
            "done": true,
            "records": [{"Id": "001A"}]
        }))
        .unwrap();
        assert!(page.next_page().is_none());
    }
}

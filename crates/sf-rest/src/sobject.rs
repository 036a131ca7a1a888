//! SObject write results.

use serde::{Deserialize, Serialize};

/// Result of an insert.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InsertResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<SalesforceError>,
}

/// Per-record result of a composite delete.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeleteResult {
    #[serde(default)]
    pub id: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<SalesforceError>,
}

/// Salesforce error in operation results.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SalesforceError {
    #[serde(rename = "statusCode")]
    pub status_code: String,
    pub message: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

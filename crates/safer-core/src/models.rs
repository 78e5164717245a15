use serde_json::Value;

use crate::error::AppError;

/// Carrier lookup endpoint on the FMCSA SAFER site.
pub const SAFER_QUERY_URL: &str = "https://safer.fmcsa.dot.gov/query.asp";

/// `href` of the help link that precedes the Canadian inspections table.
pub const INSPECTIONS_ANCHOR_HREF: &str = "saferhelp.aspx#InspectionsCA";

const SEARCH_TYPE: &str = "ANY";
const QUERY_TYPE: &str = "queryCarrierSnapshot";
const QUERY_PARAM: &str = "USDOT";

/// Input configuration supplied by the host at run start.
///
/// Only `query_string` is recognized; any other key is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotInput {
    /// Carrier identifier (a USDOT number), if one was supplied.
    pub query_string: Option<String>,
}

impl SnapshotInput {
    pub fn new(query_string: impl Into<String>) -> Self {
        Self {
            query_string: Some(query_string.into()),
        }
    }

    /// Build the input from the host's raw mapping.
    ///
    /// `None` and `null` both mean "no input" and yield the empty input.
    /// A numeric `query_string` is accepted and rendered as text.
    pub fn from_value(value: Option<Value>) -> Result<Self, AppError> {
        let map = match value {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(AppError::ConfigError(format!(
                    "input must be a JSON object, got {}",
                    json_kind(&other)
                )));
            }
        };

        let query_string = match map.get("query_string") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(other) => {
                return Err(AppError::ConfigError(format!(
                    "query_string must be a string, got {}",
                    json_kind(other)
                )));
            }
        };

        Ok(Self { query_string })
    }

    /// The query string to send; empty when none was configured.
    pub fn query(&self) -> &str {
        self.query_string.as_deref().unwrap_or_default()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A carrier snapshot query: the fixed form submitted to the lookup site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub url: String,
    pub query_string: String,
}

impl QueryRequest {
    /// Snapshot query by USDOT number against the SAFER endpoint.
    pub fn carrier_snapshot(input: &SnapshotInput) -> Self {
        Self {
            url: SAFER_QUERY_URL.to_string(),
            query_string: input.query().to_string(),
        }
    }

    /// Form fields in wire order.
    pub fn form_fields(&self) -> [(&'static str, &str); 4] {
        [
            ("searchtype", SEARCH_TYPE),
            ("query_type", QUERY_TYPE),
            ("query_param", QUERY_PARAM),
            ("query_string", &self.query_string),
        ]
    }
}

/// The single record a successful run emits.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutputRecord {
    pub driver_out_of_service_percentage: String,
}

impl OutputRecord {
    pub fn new(driver_out_of_service_percentage: impl Into<String>) -> Self {
        Self {
            driver_out_of_service_percentage: driver_out_of_service_percentage.into(),
        }
    }
}

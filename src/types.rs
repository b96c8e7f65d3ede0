use chrono::Utc;
use config::{Config, ConfigError, Environment, File};
use serde::{de::DeserializeOwned, Deserialize, Serialize, Serializer};
use serde_json::Value;

pub const PLACEHOLDER_USER: &str = "user";
pub const PLACEHOLDER_GEOLOCATION: &str = "some location";

pub const UNKNOWN_GEOLOCATION: &str = "unknown_geolocation";
pub const UNKNOWN_DATE: &str = "unknown_date";

pub const DEFAULT_DOWNSTREAM_FUNCTION: &str =
    "arn:aws:lambda:eu-west-3:084525207573:function:lambda2";

fn default_downstream_function() -> String {
    DEFAULT_DOWNSTREAM_FUNCTION.to_string()
}

fn default_aws_origin() -> String {
    "env".to_string()
}

fn default_offline_endpoint() -> String {
    "http://localhost:3002/".to_string()
}

/// Optional `<name>.json` next to the binary, then the process environment.
/// Environment keys are matched lowercased, so `DDB_TABLE` fills `ddb_table`.
fn load<T: DeserializeOwned>(name: &str) -> Result<T, ConfigError> {
    let s = Config::builder()
        .add_source(File::with_name(name).required(false))
        .add_source(Environment::default())
        .build()?;
    s.try_deserialize()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelaySettings {
    pub ddb_table: String,
    #[serde(default = "default_downstream_function")]
    pub downstream_function: String,
    #[serde(default = "default_aws_origin")]
    pub aws_origin: String,
    #[serde(default = "default_offline_endpoint")]
    pub offline_endpoint: String,
    #[serde(default)]
    pub call_timeout_secs: Option<u64>,
}

impl RelaySettings {
    pub fn new() -> Result<Self, ConfigError> {
        load("relay")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastSettings {
    #[serde(default)]
    pub forecast_api_url: Option<String>,
}

impl ForecastSettings {
    pub fn new() -> Result<Self, ConfigError> {
        load("forecast")
    }
}

/// One row per relay invocation. Insert-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    pub user: String,
    pub geolocation: String,
    pub timestamp: String,
}

impl UsageRecord {
    /// Actor and location are placeholders until the event carries them.
    /// The timestamp is the naive UTC time in chrono's default rendering,
    /// e.g. `2024-01-01 12:00:00.123456789`.
    pub fn now() -> Self {
        UsageRecord {
            user: PLACEHOLDER_USER.to_string(),
            geolocation: PLACEHOLDER_GEOLOCATION.to_string(),
            timestamp: Utc::now().naive_utc().to_string(),
        }
    }
}

/// What the forecast handler reads out of its event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastQuery {
    pub geolocation: String,
    pub date: String,
}

impl ForecastQuery {
    pub fn from_event(event: &Value) -> Self {
        ForecastQuery {
            geolocation: field_or(event, "geolocation", UNKNOWN_GEOLOCATION),
            date: field_or(event, "date", UNKNOWN_DATE),
        }
    }
}

fn field_or(event: &Value, key: &str, fallback: &str) -> String {
    match event.get(key) {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => fallback.to_string(),
        Some(other) => other.to_string(),
    }
}

/// HTTP-like response shape shared by both handlers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status_code: u16,
    pub body: Value,
}

/// Synchronous invoke result, field names as the Lambda API reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvokeResponse {
    pub status_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_version: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "payload_as_text"
    )]
    pub payload: Option<Vec<u8>>,
}

// Payload bytes have no JSON form; they go out as lossy UTF-8 text.
fn payload_as_text<S>(payload: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match payload {
        Some(bytes) => serializer.serialize_str(&String::from_utf8_lossy(bytes)),
        None => serializer.serialize_none(),
    }
}

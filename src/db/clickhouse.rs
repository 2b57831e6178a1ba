//! ClickHouse client over the HTTP interface.
//!
//! Statements are POSTed as the request body. Settings and query parameters
//! travel as URL parameters (`param_<name>` binds `{name:Type}` placeholders),
//! credentials as `X-ClickHouse-User` / `X-ClickHouse-Key` headers. Row sets
//! are requested as `JSONCompact` so column order is preserved.

use crate::error::{DbError, DbResult};
use crate::models::{ConnectionSettings, QueryOutcome, Row, Stage};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::fmt;
use tracing::debug;
use url::Url;

const HEADER_USER: &str = "X-ClickHouse-User";
const HEADER_KEY: &str = "X-ClickHouse-Key";
const HEADER_SUMMARY: &str = "X-ClickHouse-Summary";
const HEADER_EXCEPTION_CODE: &str = "X-ClickHouse-Exception-Code";

#[derive(Clone)]
pub struct ClickHouseClient {
    http: reqwest::Client,
    endpoint: Url,
    user: String,
    password: String,
    database: String,
}

impl fmt::Debug for ClickHouseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickHouseClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

impl ClickHouseClient {
    /// Build a client. No request is sent until the first statement.
    pub fn new(settings: &ConnectionSettings) -> DbResult<Self> {
        let endpoint = endpoint_url(&settings.host, settings.port, &settings.ssl_mode)?;
        let http = reqwest::Client::builder().build().map_err(|e| {
            DbError::connection(
                format!("Failed to build HTTP client: {}", e),
                "Check the TLS configuration of the host",
            )
        })?;

        Ok(Self {
            http,
            endpoint,
            user: settings.username.clone(),
            password: settings.password.clone(),
            database: settings.database.clone(),
        })
    }

    /// Run a catalog query, binding `params` to the statement's placeholders
    /// in order of first appearance.
    pub async fn fetch_rows(&self, sql: &str, params: &[&str]) -> DbResult<Vec<Row>> {
        let names = placeholder_names(sql);
        if names.len() != params.len() {
            return Err(DbError::internal(format!(
                "statement has {} placeholder(s) but {} parameter(s) were supplied",
                names.len(),
                params.len()
            )));
        }
        let bindings: Vec<(&str, &str)> = names.into_iter().zip(params.iter().copied()).collect();

        let response = self.send(sql, &bindings).await?;
        parse_compact(&response.body)
    }

    /// Run a statement verbatim.
    pub async fn execute(&self, sql: &str) -> DbResult<QueryOutcome> {
        let response = self.send(sql, &[]).await?;
        if response.body.trim().is_empty() {
            let written = response
                .summary
                .as_deref()
                .map(written_rows)
                .unwrap_or(0);
            return Ok(QueryOutcome::from_parts(Vec::new(), written));
        }
        Ok(QueryOutcome::Rows(parse_compact(&response.body)?))
    }

    async fn send(&self, sql: &str, bindings: &[(&str, &str)]) -> DbResult<HttpResponse> {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            if !self.database.is_empty() {
                pairs.append_pair("database", &self.database);
            }
            pairs
                .append_pair("default_format", "JSONCompact")
                .append_pair("output_format_json_quote_64bit_integers", "0")
                .append_pair("output_format_json_quote_decimals", "1");
            for (name, value) in bindings {
                pairs.append_pair(&format!("param_{}", name), value);
            }
        }

        debug!(endpoint = %self.endpoint, params = bindings.len(), "Sending ClickHouse statement");

        let response = self
            .http
            .post(url)
            .header(HEADER_USER, &self.user)
            .header(HEADER_KEY, &self.password)
            .body(sql.to_string())
            .send()
            .await?;

        let status = response.status();
        let exception_code = header_text(&response, HEADER_EXCEPTION_CODE);
        let summary = header_text(&response, HEADER_SUMMARY);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(DbError::Query {
                stage: Stage::Execute,
                message: body.trim().to_string(),
                sql_state: exception_code,
            });
        }

        Ok(HttpResponse { body, summary })
    }
}

struct HttpResponse {
    body: String,
    summary: Option<String>,
}

fn header_text(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn endpoint_url(host: &str, port: u16, ssl_mode: &str) -> DbResult<Url> {
    let scheme = match ssl_mode {
        "require" | "verify-ca" | "verify-full" => "https",
        _ => "http",
    };
    Url::parse(&format!("{}://{}:{}/", scheme, host.trim(), port)).map_err(|e| {
        DbError::config(format!("Invalid ClickHouse address '{}:{}': {}", host, port, e))
    })
}

/// Names of `{name:Type}` placeholders in order of first appearance.
pub(crate) fn placeholder_names(sql: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    let mut rest = sql;
    while let Some(open) = rest.find('{') {
        rest = &rest[open + 1..];
        let Some(close) = rest.find('}') else { break };
        let Some((name, ty)) = rest[..close].split_once(':') else {
            continue;
        };
        let is_ident = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if is_ident && !ty.trim().is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

#[derive(Debug, Deserialize)]
struct CompactResponse {
    meta: Vec<CompactColumn>,
    data: Vec<Vec<JsonValue>>,
}

#[derive(Debug, Deserialize)]
struct CompactColumn {
    name: String,
}

/// Parse a `JSONCompact` body into ordered rows.
fn parse_compact(body: &str) -> DbResult<Vec<Row>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parsed: CompactResponse = serde_json::from_str(body).map_err(|e| {
        DbError::query(
            Stage::Execute,
            format!("Unexpected ClickHouse response (expected JSONCompact): {}", e),
        )
    })?;

    parsed
        .data
        .into_iter()
        .map(|values| {
            if values.len() != parsed.meta.len() {
                return Err(DbError::query(
                    Stage::Execute,
                    format!(
                        "ClickHouse row has {} values for {} columns",
                        values.len(),
                        parsed.meta.len()
                    ),
                ));
            }
            Ok(parsed
                .meta
                .iter()
                .zip(values)
                .map(|(col, value)| (col.name.clone(), portable(value)))
                .collect())
        })
        .collect()
}

/// Arrays, tuples and maps are rendered as their JSON text.
fn portable(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Array(_) | JsonValue::Object(_) => JsonValue::String(value.to_string()),
        other => other,
    }
}

/// `written_rows` from an `X-ClickHouse-Summary` header. Values are quoted.
fn written_rows(summary: &str) -> u64 {
    serde_json::from_str::<JsonValue>(summary)
        .ok()
        .and_then(|v| match v.get("written_rows")? {
            JsonValue::String(s) => s.parse().ok(),
            JsonValue::Number(n) => n.as_u64(),
            _ => None,
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EngineKind;
    use serde_json::json;

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            engine: EngineKind::ClickHouse,
            host: "localhost".to_string(),
            port: 8123,
            username: "default".to_string(),
            password: "s3cret".to_string(),
            database: "analytics".to_string(),
            ssl_mode: "disable".to_string(),
            file: String::new(),
        }
    }

    #[test]
    fn test_placeholder_names() {
        assert_eq!(
            placeholder_names("SELECT * FROM t WHERE name = {table_name:String}"),
            vec!["table_name"]
        );
        assert_eq!(
            placeholder_names("SELECT {a:UInt8}, {b:String}, {a:UInt8}"),
            vec!["a", "b"]
        );
        assert!(placeholder_names("SELECT map('k', 1), '{not a param}'").is_empty());
        assert!(placeholder_names("SELECT '{'").is_empty());
    }

    #[test]
    fn test_parse_compact_preserves_column_order() {
        let body = r#"{
            "meta": [{"name": "z", "type": "UInt8"}, {"name": "a", "type": "String"}],
            "data": [[1, "x"], [2, null]],
            "rows": 2
        }"#;
        let rows = parse_compact(body).unwrap();
        assert_eq!(rows.len(), 2);
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(rows[1]["a"], JsonValue::Null);
    }

    #[test]
    fn test_parse_compact_stringifies_composites() {
        let body = r#"{"meta": [{"name": "tags", "type": "Array(String)"}], "data": [[["a","b"]]]}"#;
        let rows = parse_compact(body).unwrap();
        assert_eq!(rows[0]["tags"], json!(r#"["a","b"]"#));
    }

    #[test]
    fn test_parse_compact_empty_body() {
        assert!(parse_compact("").unwrap().is_empty());
        assert!(parse_compact("not json").is_err());
    }

    #[test]
    fn test_written_rows() {
        assert_eq!(
            written_rows(r#"{"read_rows":"0","written_rows":"3"}"#),
            3
        );
        assert_eq!(written_rows("garbage"), 0);
    }

    #[test]
    fn test_endpoint_scheme_follows_ssl_mode() {
        assert_eq!(
            endpoint_url("localhost", 8123, "disable").unwrap().as_str(),
            "http://localhost:8123/"
        );
        assert_eq!(
            endpoint_url("ch.example.com", 8443, "require").unwrap().scheme(),
            "https"
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let client = ClickHouseClient::new(&settings()).unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("analytics"));
    }

    #[tokio::test]
    async fn test_fetch_rows_rejects_parameter_mismatch() {
        let client = ClickHouseClient::new(&settings()).unwrap();
        let err = client
            .fetch_rows("SELECT {a:String}", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Internal { .. }));
    }
}

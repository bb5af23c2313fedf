//! # GraphQL Transport
//!
//! One POST per operation, body `{ "query", "variables" }`, response
//! `{ "data", "errors" }`.
//!
//! ## Response Handling
//! ```text
//! non-2xx status            ──► ClientError::Status
//! errors: [..] non-empty    ──► ClientError::GraphQl(messages joined by "; ")
//! data: null / missing      ──► ClientError::MissingData("data")
//! otherwise                 ──► Ok(data)
//! ```
//!
//! The transport is a trait so controllers can run against an in-memory
//! server in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;

/// A single GraphQL operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlRequest {
    pub query: &'static str,
    pub variables: Value,

    /// Operation name used in logs only.
    #[serde(skip)]
    pub operation: &'static str,
}

impl GraphqlRequest {
    pub fn new(operation: &'static str, query: &'static str) -> Self {
        GraphqlRequest {
            query,
            variables: Value::Object(Default::default()),
            operation,
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlErrorItem {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlErrorItem>>,
}

impl GraphqlResponse {
    /// Unwraps `data`, turning a non-empty `errors` array into an error.
    pub fn into_data(self) -> ClientResult<Value> {
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ClientError::GraphQl(message));
        }

        match self.data {
            Some(Value::Null) | None => Err(ClientError::MissingData("data".into())),
            Some(data) => Ok(data),
        }
    }
}

/// Executes GraphQL operations and returns the `data` object.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn execute(&self, request: GraphqlRequest) -> ClientResult<Value>;
}

// =============================================================================
// HTTP Transport
// =============================================================================

/// `reqwest`-backed transport. Attaches the session token when present.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
    session: Session,
}

impl HttpTransport {
    pub fn new(endpoint: Url, timeout: Duration, session: Session) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(HttpTransport {
            client,
            endpoint,
            timeout,
            session,
        })
    }

    pub fn from_config(config: &ClientConfig, session: Session) -> ClientResult<Self> {
        Self::new(config.endpoint_url()?, config.request_timeout(), session)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl GraphqlTransport for HttpTransport {
    async fn execute(&self, request: GraphqlRequest) -> ClientResult<Value> {
        debug!(operation = request.operation, "Sending GraphQL request");

        let mut builder = self.client.post(self.endpoint.clone()).json(&request);
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(self.timeout.as_secs())
            } else {
                ClientError::from(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                operation = request.operation,
                status = status.as_u16(),
                "GraphQL request rejected"
            );
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        let body: GraphqlResponse = response.json().await?;
        body.into_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> GraphqlResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let request = GraphqlRequest::new("getBookById", "query { x }")
            .with_variables(json!({ "id": "b1" }));
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body, json!({ "query": "query { x }", "variables": { "id": "b1" } }));
    }

    #[test]
    fn test_data_is_returned() {
        let data = parse(json!({ "data": { "allBooks": [] } })).into_data().unwrap();
        assert_eq!(data, json!({ "allBooks": [] }));
    }

    #[test]
    fn test_errors_win_over_partial_data() {
        let err = parse(json!({
            "data": { "getBookById": null },
            "errors": [{ "message": "Book not found" }, { "message": "second" }]
        }))
        .into_data()
        .unwrap_err();
        assert_eq!(err.to_string(), "Book not found; second");
    }

    #[test]
    fn test_empty_errors_array_is_ignored() {
        let data = parse(json!({ "data": { "ok": true }, "errors": [] }))
            .into_data()
            .unwrap();
        assert_eq!(data["ok"], true);
    }

    #[test]
    fn test_missing_data() {
        assert!(matches!(
            parse(json!({ "data": null })).into_data(),
            Err(ClientError::MissingData(_))
        ));
        assert!(matches!(
            parse(json!({})).into_data(),
            Err(ClientError::MissingData(_))
        ));
    }

    #[test]
    fn test_http_transport_from_config() {
        let transport = HttpTransport::from_config(&ClientConfig::default(), Session::anonymous())
            .unwrap();
        assert_eq!(transport.endpoint().path(), "/graphql");
    }
}

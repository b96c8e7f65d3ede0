use crate::types::{Envelope, ForecastQuery};
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde_json::{json, Value};
use std::sync::Arc;

pub const PLACEHOLDER_REPLY: &str = "HELLO";

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastReply {
    pub status: u16,
    pub body: Value,
}

#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn fetch(&self, geolocation: &str, date: &str) -> Result<ForecastReply>;
}

/// Queries `GET <url>?geolocation=..&date=..` and expects JSON back.
#[derive(Clone)]
pub struct HttpForecastProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpForecastProvider {
    pub fn new(url: impl Into<String>) -> Self {
        HttpForecastProvider {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ForecastProvider for HttpForecastProvider {
    async fn fetch(&self, geolocation: &str, date: &str) -> Result<ForecastReply> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("geolocation", geolocation), ("date", date)])
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?;

        let status = response.status().as_u16();
        let body = response
            .json::<Value>()
            .await
            .with_context(|| format!("forecast provider answered {} without JSON", status))?;

        Ok(ForecastReply { status, body })
    }
}

#[derive(Clone, Default)]
pub struct ForecastResponder {
    provider: Option<Arc<dyn ForecastProvider>>,
}

impl ForecastResponder {
    pub fn placeholder() -> Self {
        ForecastResponder { provider: None }
    }

    pub fn with_provider(provider: Arc<dyn ForecastProvider>) -> Self {
        ForecastResponder {
            provider: Some(provider),
        }
    }

    /// `"HELLO"` without a provider; otherwise the provider's status and body.
    pub async fn handle(&self, event: Value) -> Result<Value> {
        let query = ForecastQuery::from_event(&event);
        debug!("forecast query {:?}", query);

        let provider = match &self.provider {
            Some(provider) => provider,
            None => return Ok(json!(PLACEHOLDER_REPLY)),
        };

        let reply = provider.fetch(&query.geolocation, &query.date).await?;
        let envelope = Envelope {
            status_code: reply.status,
            body: reply.body,
        };
        Ok(serde_json::to_value(envelope)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::Mutex;
    use warp::http::StatusCode;
    use warp::Filter;

    struct FixedProvider {
        seen: Mutex<Vec<(String, String)>>,
        reply: ForecastReply,
    }

    #[async_trait]
    impl ForecastProvider for FixedProvider {
        async fn fetch(&self, geolocation: &str, date: &str) -> Result<ForecastReply> {
            self.seen
                .lock()
                .unwrap()
                .push((geolocation.to_string(), date.to_string()));
            Ok(self.reply.clone())
        }
    }

    fn fixed(status: u16, body: Value) -> Arc<FixedProvider> {
        Arc::new(FixedProvider {
            seen: Mutex::new(Vec::new()),
            reply: ForecastReply { status, body },
        })
    }

    fn spawn_provider() -> SocketAddr {
        let forecast = warp::path("forecast")
            .and(warp::query::<HashMap<String, String>>())
            .map(|query: HashMap<String, String>| {
                let body = json!({
                    "geolocation": query.get("geolocation"),
                    "date": query.get("date"),
                    "temperature": 21.5,
                });
                warp::reply::with_status(warp::reply::json(&body), StatusCode::ACCEPTED)
            });
        let broken = warp::path("broken").map(|| "sunny, probably");

        let (addr, server) =
            warp::serve(forecast.or(broken)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }

    #[tokio::test]
    async fn placeholder_ignores_empty_event() {
        let reply = ForecastResponder::placeholder().handle(json!({})).await.unwrap();
        assert_eq!(reply, json!("HELLO"));
    }

    #[tokio::test]
    async fn placeholder_ignores_full_event() {
        let event = json!({"geolocation": "Paris", "date": "2024-01-01"});
        let reply = ForecastResponder::placeholder().handle(event).await.unwrap();
        assert_eq!(reply, json!("HELLO"));
    }

    #[tokio::test]
    async fn provider_status_is_passed_through() {
        let provider = fixed(404, json!({"error": "no such place"}));
        let responder = ForecastResponder::with_provider(provider.clone());

        let reply = responder
            .handle(json!({"geolocation": "Atlantis", "date": "2024-01-01"}))
            .await
            .unwrap();

        assert_eq!(
            reply,
            json!({"statusCode": 404, "body": {"error": "no such place"}})
        );
        assert_eq!(
            provider.seen.lock().unwrap().as_slice(),
            &[("Atlantis".to_string(), "2024-01-01".to_string())]
        );
    }

    #[tokio::test]
    async fn provider_receives_sentinels_for_missing_fields() {
        let provider = fixed(200, json!({}));
        let responder = ForecastResponder::with_provider(provider.clone());

        responder.handle(json!({})).await.unwrap();

        assert_eq!(
            provider.seen.lock().unwrap().as_slice(),
            &[("unknown_geolocation".to_string(), "unknown_date".to_string())]
        );
    }

    #[tokio::test]
    async fn http_provider_sends_query_and_keeps_status() {
        let addr = spawn_provider();
        let provider = HttpForecastProvider::new(format!("http://{}/forecast", addr));

        let reply = provider.fetch("Paris", "2024-01-01").await.unwrap();

        assert_eq!(reply.status, 202);
        assert_eq!(reply.body["geolocation"], json!("Paris"));
        assert_eq!(reply.body["date"], json!("2024-01-01"));
        assert_eq!(reply.body["temperature"], json!(21.5));
    }

    #[tokio::test]
    async fn http_provider_rejects_non_json_body() {
        let addr = spawn_provider();
        let provider = HttpForecastProvider::new(format!("http://{}/broken", addr));

        assert!(provider.fetch("Paris", "2024-01-01").await.is_err());
    }
}

use crate::my_aws::{FunctionInvoker, UsageStore};
use crate::types::{Envelope, UsageRecord};
use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct UsageRelay {
    store: Arc<dyn UsageStore>,
    invoker: Arc<dyn FunctionInvoker>,
    downstream_function: String,
}

impl UsageRelay {
    pub fn new(
        store: Arc<dyn UsageStore>,
        invoker: Arc<dyn FunctionInvoker>,
        downstream_function: impl Into<String>,
    ) -> Self {
        UsageRelay {
            store,
            invoker,
            downstream_function: downstream_function.into(),
        }
    }

    /// Writes the usage row before invoking, so a failed write never reaches
    /// the downstream function and a failed invoke leaves the row behind.
    pub async fn handle(&self, event: Value) -> Result<Envelope> {
        let payload = serde_json::to_vec(&event)?;
        info!("event: {}", String::from_utf8_lossy(&payload));

        let record = UsageRecord::now();
        self.store.put(&record).await?;
        debug!("stored usage record at {}", record.timestamp);

        let response = self
            .invoker
            .invoke(&self.downstream_function, &payload)
            .await?;
        debug!(
            "{} answered with status {}",
            self.downstream_function, response.status_code
        );

        // Round trip through JSON text; binary fields come back as strings.
        let text = serde_json::to_string(&response)?;
        let body: Value = serde_json::from_str(&text).context("reparse downstream response")?;

        // 200 regardless of what the downstream function reported.
        Ok(Envelope {
            status_code: 200,
            body,
        })
    }
}

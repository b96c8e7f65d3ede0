use crate::types::{InvokeResponse, UsageRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::model::AttributeValue;
use aws_sdk_lambda::model::InvocationType;
use aws_sdk_lambda::{Region, RetryConfig};
use aws_smithy_async::rt::sleep::default_async_sleep;
use aws_smithy_http::endpoint::Endpoint;
use aws_smithy_types::timeout;
use aws_smithy_types::tristate::TriState;
use aws_types::{credentials::SharedCredentialsProvider, Credentials, SdkConfig};
use log::debug;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use warp::hyper::Uri;

pub struct MyAwsConfig {}
impl MyAwsConfig {
    pub fn new(
        origin: &str,
        offline_endpoint: &str,
        call_timeout: Option<Duration>,
    ) -> Result<SdkConfig> {
        match origin {
            "env" => MyAwsConfig::from_env(call_timeout),
            "offline" => MyAwsConfig::from_offline(offline_endpoint, call_timeout),
            other => anyhow::bail!("unknown aws origin: {}", other),
        }
    }

    pub fn from_offline(endpoint: &str, call_timeout: Option<Duration>) -> Result<SdkConfig> {
        let region = Region::new("local");
        let uri: Uri = endpoint
            .parse()
            .with_context(|| format!("invalid offline endpoint: {}", endpoint))?;
        let endpoint = Endpoint::immutable(uri);
        let credential = Credentials::new(
            "localAccessKey",
            "localSecretAccessKey",
            None,
            None,
            "local",
        );

        let mut builder = Self::skel(call_timeout);
        builder.set_region(region);
        builder.set_endpoint_resolver(Some(Arc::new(endpoint)));
        builder.set_credentials_provider(Some(SharedCredentialsProvider::new(credential)));
        Ok(builder.build())
    }

    /// Reads the variables the Lambda runtime exports into every function.
    pub fn from_env(call_timeout: Option<Duration>) -> Result<SdkConfig> {
        let access_key_id = env::var("AWS_ACCESS_KEY_ID").context("AWS_ACCESS_KEY_ID")?;
        let secret_access_key =
            env::var("AWS_SECRET_ACCESS_KEY").context("AWS_SECRET_ACCESS_KEY")?;
        let session_token = env::var("AWS_SESSION_TOKEN").ok();

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            session_token,
            None,
            "environment",
        );

        let aws_region = env::var("AWS_REGION").context("AWS_REGION")?;
        let region = Region::new(aws_region);

        let mut builder = Self::skel(call_timeout);
        builder.set_region(region);
        builder.set_credentials_provider(Some(SharedCredentialsProvider::new(credentials)));
        Ok(builder.build())
    }

    fn skel(call_timeout: Option<Duration>) -> aws_types::sdk_config::Builder {
        // Failures surface to the caller on the first attempt.
        let retry_config = RetryConfig::new().with_max_attempts(1);

        let mut builder = SdkConfig::builder();
        builder.set_retry_config(Some(retry_config));
        if let Some(call_timeout) = call_timeout {
            let api_timeout_config =
                timeout::Api::new().with_call_timeout(TriState::Set(call_timeout));
            let timeout_config = timeout::Config::new().with_api_timeouts(api_timeout_config);
            builder.set_timeout_config(Some(timeout_config));
            // Timeouts only fire with a sleep implementation behind them.
            builder.set_sleep_impl(default_async_sleep());
        } else {
            builder.set_sleep_impl(None);
        }
        builder
    }
}

/// Insert-only sink for usage records.
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn put(&self, record: &UsageRecord) -> Result<()>;
}

/// Calls another function and waits for its answer.
#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    async fn invoke(&self, function_name: &str, payload: &[u8]) -> Result<InvokeResponse>;
}

#[derive(Clone)]
pub struct MyAwsDynamo {
    client: aws_sdk_dynamodb::Client,
    table: String,
}
impl MyAwsDynamo {
    pub fn new(client: aws_sdk_dynamodb::Client, table: impl Into<String>) -> Self {
        MyAwsDynamo {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl UsageStore for MyAwsDynamo {
    async fn put(&self, record: &UsageRecord) -> Result<()> {
        debug!("put_item table={} record={:?}", self.table, record);
        self.client
            .put_item()
            .table_name(&self.table)
            .item("user", AttributeValue::S(record.user.clone()))
            .item("geolocation", AttributeValue::S(record.geolocation.clone()))
            .item("timestamp", AttributeValue::S(record.timestamp.clone()))
            .send()
            .await
            .with_context(|| format!("put_item into {}", self.table))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct MyAwsLambda {
    client: aws_sdk_lambda::Client,
}
impl MyAwsLambda {
    pub fn new(client: aws_sdk_lambda::Client) -> Self {
        MyAwsLambda { client }
    }
}

#[async_trait]
impl FunctionInvoker for MyAwsLambda {
    async fn invoke(&self, function_name: &str, payload: &[u8]) -> Result<InvokeResponse> {
        debug!("invoke function={} bytes={}", function_name, payload.len());
        let blob = aws_smithy_types::Blob::new(payload);
        let output = self
            .client
            .invoke()
            .function_name(function_name)
            .payload(blob)
            .invocation_type(InvocationType::RequestResponse)
            .send()
            .await
            .with_context(|| format!("invoke {}", function_name))?;

        Ok(InvokeResponse {
            status_code: output.status_code(),
            function_error: output.function_error().map(str::to_string),
            log_result: output.log_result().map(str::to_string),
            executed_version: output.executed_version().map(str::to_string),
            payload: output.payload().map(|blob| blob.as_ref().to_vec()),
        })
    }
}

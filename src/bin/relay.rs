use lambda_runtime::{handler_fn, Context, Error};
use log::info;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use usage_relay::{MyAwsConfig, MyAwsDynamo, MyAwsLambda, RelaySettings, UsageRelay};

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = RelaySettings::new()?;
    let sdk_config = MyAwsConfig::new(
        &settings.aws_origin,
        &settings.offline_endpoint,
        settings.call_timeout_secs.map(Duration::from_secs),
    )?;

    let store = MyAwsDynamo::new(
        aws_sdk_dynamodb::Client::new(&sdk_config),
        settings.ddb_table.clone(),
    );
    let invoker = MyAwsLambda::new(aws_sdk_lambda::Client::new(&sdk_config));
    let relay = UsageRelay::new(
        Arc::new(store),
        Arc::new(invoker),
        settings.downstream_function.clone(),
    );
    info!(
        "relay ready: table={} downstream={}",
        settings.ddb_table, settings.downstream_function
    );

    let func = handler_fn(move |event: Value, context: Context| {
        let relay = relay.clone();
        async move { dispatch(relay, event, context).await }
    });
    lambda_runtime::run(func).await?;
    Ok(())
}

async fn dispatch(relay: UsageRelay, event: Value, context: Context) -> Result<Value, Error> {
    info!("request {}", context.request_id);
    let envelope = relay.handle(event).await?;
    Ok(serde_json::to_value(envelope)?)
}

use lambda_runtime::{handler_fn, Context, Error};
use log::info;
use serde_json::Value;
use std::sync::Arc;
use usage_relay::{ForecastResponder, ForecastSettings, HttpForecastProvider};

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = ForecastSettings::new()?;
    let responder = match settings.forecast_api_url {
        Some(url) => {
            info!("forecast provider: {}", url);
            ForecastResponder::with_provider(Arc::new(HttpForecastProvider::new(url)))
        }
        None => ForecastResponder::placeholder(),
    };

    let func = handler_fn(move |event: Value, context: Context| {
        let responder = responder.clone();
        async move { dispatch(responder, event, context).await }
    });
    lambda_runtime::run(func).await?;
    Ok(())
}

async fn dispatch(
    responder: ForecastResponder,
    event: Value,
    context: Context,
) -> Result<Value, Error> {
    info!("request {}", context.request_id);
    Ok(responder.handle(event).await?)
}

pub mod forecast;
pub mod my_aws;
pub mod relay;
pub mod types;

pub use forecast::{ForecastProvider, ForecastReply, ForecastResponder, HttpForecastProvider};
pub use my_aws::{FunctionInvoker, MyAwsConfig, MyAwsDynamo, MyAwsLambda, UsageStore};
pub use relay::UsageRelay;
pub use types::{Envelope, ForecastSettings, InvokeResponse, RelaySettings, UsageRecord};

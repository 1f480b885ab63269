//! Health Lambda.

use std::sync::Arc;

use api_gateway::health::handler;
use lambda_http::{run, service_fn, Error};
use shared::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    run(service_fn(move |event| {
        let config = config.clone();
        async move { handler(config, event).await }
    }))
    .await
}

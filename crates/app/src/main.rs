mod catalog;
mod checkout;
mod inventory;
mod loyalty;
mod pricing;
mod problem;
mod request;
mod router;
mod shipping;
mod tap;
mod telemetry;
mod whoami;

use std::net::SocketAddr;

use storefront_util::{load_env_file, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let tap_hub = tap::TapHub::new();
    let state = router::AppState::new(metrics, tap_hub, config.checkout);
    if config.environment.is_development() {
        state.tap().spawn_heartbeat(state.clock());
    }

    let addr: SocketAddr = config.bind_addr;
    info!(
        stage = "app",
        %addr,
        env = %config.environment.as_str(),
        free_shipping_threshold = config.checkout.free_shipping_threshold,
        "starting HTTP server"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .await
        .map_err(|err| err.into())
}

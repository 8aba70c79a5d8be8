// Console dashboard: wires the live metrics client and logs the coalesced
// view on every change. Ctrl-c tears the client down explicitly.

use anyhow::Result;
use thermocast::client::{DashboardState, LiveClient, LiveClientConfig};
use thermocast::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let app_config = AppConfig::load()?;
    let server_addr = std::env::var("DASHBOARD_TARGET").unwrap_or_else(|_| {
        let host = if app_config.server.host == "0.0.0.0" {
            "127.0.0.1"
        } else {
            app_config.server.host.as_str()
        };
        format!("{}:{}", host, app_config.server.port)
    });

    let mut client = LiveClient::spawn(LiveClientConfig::from_config(
        &app_config.client,
        &server_addr,
    ));
    let mut state_rx = client.state();
    let mut status_rx = client.status();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            r = status_rx.changed() => {
                if r.is_err() {
                    break;
                }
                let status = *status_rx.borrow_and_update();
                tracing::info!(?status, "connection status");
                // Full re-render on every transition, like a resume from a
                // hidden tab.
                render(&state_rx.borrow());
            }
            r = state_rx.changed() => {
                if r.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                render(&state);
            }
        }
    }

    client.stop().await;
    Ok(())
}

fn render(state: &DashboardState) {
    tracing::info!(
        installs = state.total_installs,
        active = state.active_instances,
        p95_ms = format!("{:.0}", state.p95_latency),
        reliability = format!("{:.2}%", state.reliability),
        per_hour = state.installs_per_hour,
        countries = state.country_count,
        avg_temp_c = format!("{:.1}", state.avg_temp),
        "metrics"
    );
}

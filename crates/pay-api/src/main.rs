//! # cipc-pay
//!
//! Payment façade for CIPC annual-return filings.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export OZOW_SITE_CODE=...
//! export OZOW_PRIVATE_KEY=...
//! export PAYFAST_MERCHANT_ID=...
//! export PAYSTACK_SECRET_KEY=sk_test_...
//!
//! # Run the server
//! cipc-pay
//! ```

use pay_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!(
        "Gateway order: {:?}",
        state.payments.gateways().identities()
    );
    info!("Webhook sources: {:?}", state.webhooks.sources());

    let app = routes::create_router(state);

    info!("cipc-pay {} starting on http://{}", env!("CARGO_PKG_VERSION"), addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Create payment: POST http://{}/api/v1/payments/create", addr);
        info!("Webhooks: POST http://{}/api/v1/webhooks/{{source}}", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! # pay-api
//!
//! HTTP API layer for cipc-pay.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Payment creation and status endpoints
//! - Webhook endpoints for every gateway
//! - Onboarding hand-off to the filing workflow
//! - WhatsApp completion notifications via AiSensy
//!
//! ## Endpoints
//!
//! Served at the root and under `/api/v1`:
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/payments/create` | Create hosted payment |
//! | GET | `/payments/{id}/status` | Payment status |
//! | POST | `/webhooks/{source}` | Gateway webhook |
//! | POST | `/flows/onboard` | Start filing workflow |

pub mod handlers;
pub mod notify;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};

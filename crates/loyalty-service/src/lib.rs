//! Loyalty Platform HTTP API Service.
//!
//! This crate provides the HTTP API for the loyalty platform, including:
//!
//! - Member profiles, points balances, and tiers
//! - Order checkout, fulfillment, payment, and cancellation
//! - Product catalog and stock
//! - Reward catalog and point redemptions
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **Bearer tokens** - HS256 JWTs issued on register/login, for member
//!    requests
//! 2. **Admin API key** - the `x-admin-key` header, for privileged mutations

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for routing consistency

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use services::{MemberService, OrderService, ProductService, RewardService};
pub use state::AppState;

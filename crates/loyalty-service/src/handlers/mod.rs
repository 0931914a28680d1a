//! API handlers.

pub mod auth;
pub mod health;
pub mod members;
pub mod orders;
pub mod products;
pub mod rewards;

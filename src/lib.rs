//! Library exports for the trip fundraising service
//!
//! The domain rules (`aggregate`, `commitment`, `ledger`, `trip`) are pure
//! and usable on their own; `service` persists them and `route` serves them
//! over HTTP.

pub mod aggregate;
pub mod commitment;
pub mod config;
pub mod database;
pub mod error;
pub mod extract;
pub mod handler;
pub mod ledger;
pub mod model;
pub mod route;
pub mod service;
pub mod trip;

//! Batch retrieval of referral letters from the Ocean clinical-records API.
//!
//! The core is [`services::DownloadService`]: a strictly sequential,
//! rate-limited loop that exchanges OAuth2 client credentials for a bearer
//! token once per batch, then fetches and persists one PDF per referral
//! reference, reporting progress through an event channel.

pub mod api;
pub mod cli;
pub mod config;
pub mod input;
pub mod models;
pub mod services;

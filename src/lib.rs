//! clicktrail - a small click tracker
//!
//! Logs each visit to the tracking path (IP, user-agent, time and an
//! optional geolocation), then 302-redirects to a configured URL. A
//! dashboard command reports on the stored clicks next to an externally
//! written DM log.
//!
//! # Architecture
//! - `api`: HTTP handlers (`/saved`, `/health`)
//! - `services`: click pipeline, bot filter, geolocation, gist backup
//! - `storage`: SeaORM storage backend and SQL dump/restore
//! - `dashboard`: metrics, coordinate backfill and report rendering
//! - `interfaces`: CLI commands
//! - `config`: configuration management
//! - `runtime`: application lifecycle and execution modes
//! - `system`: logging setup

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;

//! # Repo Events Library
//!
//! Receives GitHub `push` and `pull_request` webhooks, normalizes them into
//! a compact record, stores them, and serves the recent history.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod normalization;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub mod timestamp;
pub mod webhook_verification;
pub use migration;

//! Shared types and configuration for Cambio.
//!
//! This crate provides common types used across all other crates:
//! - Typed ids for accounts, journal entries, transactions, clients and records
//! - The closed `Currency` set
//! - Layered configuration management

pub mod config;
pub mod types;

pub use config::AppConfig;

//! Multi-tenant UTXO wallet middleware: watches a chain through a
//! wallet-node RPC, classifies each transaction against per-tenant
//! address books, persists a normalized view, and exposes the tenant
//! onboarding / withdraw-signing API.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod utils;

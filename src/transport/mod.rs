//! Blockchain transport: HTTP+JSON gateway client plus the push-style
//! transaction-notification channel. Both are external collaborators per
//! `spec.md` §1 — implemented here as thin, swappable adapters so the core
//! engine can be exercised in isolation.
//!
//! Author: AI-Generated
//! Created: 2026-01-29

pub mod gateway;
pub mod notifications;

pub use gateway::GatewayClient;
pub use notifications::{NotificationChannel, TxOutcome, TxStatus};

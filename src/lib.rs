//! # Packmon Library
//!
//! Core of a battery-pack telemetry peripheral: a periodic producer samples
//! pack telemetry, streams it live to a subscribed client over a wireless
//! notification transport, and durably retains samples in an append-only
//! record log so a reconnecting client can replay everything missed.

pub mod config;
pub mod error;
pub mod producer;
pub mod record;
pub mod sampler;
pub mod session;
pub mod store;
pub mod transport;

//! # qse-core
//!
//! Foundation types for the QSE client crates.
//!
//! This crate provides the shared vocabulary the transport crates depend on:
//!
//! - **Errors**: [`errors::QseError`] taxonomy via `thiserror`
//! - **Identity material**: [`identity::CertificateBundle`] (paths + redacted secret)
//! - **Channel events**: [`events::ChannelEvent`] and [`events::ChannelState`]
//! - **Listeners**: [`listener::ChannelListener`] fan-out capability
//! - **Wire constants**: [`constants`] (XRFKEY, ports, identity headers)
//! - **Logging**: [`logging::init`] tracing subscriber setup
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `qse-tls`, `qse-qps`, and `qse-engine`.

#![deny(unsafe_code)]

pub mod constants;
pub mod errors;
pub mod events;
pub mod identity;
pub mod listener;
pub mod logging;

//! Ticket client for the engine's proxy service (QPS).
//!
//! Issues the mutual-TLS `POST /qps/ticket` exchange that trades a
//! `(user directory, user id)` pair for a short-lived, single-use
//! authentication ticket. One core async implementation; the blocking form
//! wraps it so both produce byte-identical requests.

mod client;
mod types;

pub use client::TicketClient;
pub use types::{QpsConfig, TicketRequestBody};

//! Outbound RPC clients.

pub mod callback;

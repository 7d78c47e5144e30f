//! The gateway dispatch layer (spec C5/C6/C8/C9): authenticated HTTP
//! endpoints that validate typed requests, enqueue jobs onto the broker,
//! poll their status, and issue short-lived tokens for produced artifacts.

#[macro_use]
extern crate commons;

pub mod admission;
pub mod config;
pub mod kinds;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod token_store;

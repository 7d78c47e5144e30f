//! The worker runtime (spec C3/C4): one process bound to exactly one
//! queue, decoding popped jobs, resolving a handler by name from a
//! compile-time registry, enforcing a per-job timeout, and publishing the
//! outcome back to the broker.

#[macro_use]
extern crate commons;

pub mod cleanup;
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod registry;
pub mod runtime;

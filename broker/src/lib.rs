// Copyright 2018 Alex Crawford
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The job broker: typed read/write of queues, job hashes, and result keys
//! on the shared broker (spec §4.1), plus the job codec (§4.2).
//!
//! This crate is deliberately broker-agnostic at the trait level
//! ([`BrokerClient`]) so the gateway and the worker runtime can be tested
//! against [`memory::InMemoryBroker`] without a live Redis instance, while
//! [`redis_client::RedisBroker`] provides the production implementation
//! against a Redis-compatible store.

pub mod backoff;
pub mod client;
pub mod codec;
pub mod job;
pub mod memory;
pub mod redis_client;

pub use client::BrokerClient;
pub use job::{Job, JobRecord, JobStatus, NewJob};

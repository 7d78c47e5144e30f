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

//! The handler registry (spec C4): a fixed, in-process mapping from
//! `handler_name` strings to executable handler bodies, resolved by a
//! static match rather than any form of dynamic loading (spec §9 "keep
//! the string-named protocol at the broker boundary for language
//! independence, but resolve to typed handlers via a compile-time
//! registry per worker").

use crate::handlers::Handler;
use commons::{ErrorKind, JobError};
use serde_json::Value;

/// Resolve `handler_name` to its handler body. An unknown name is a fatal,
/// non-retryable error for that job (spec §4.4, §4.3: published as
/// `failed/decode`, the worker continues).
pub fn resolve(handler_name: &str) -> Result<Handler, JobError> {
    let handler: Handler = match handler_name {
        "tasks.run_ifcconvert" => crate::handlers::convert::run,
        "tasks.run_ifccsv_export" => crate::handlers::csv::run_export,
        "tasks.run_ifccsv_import" => crate::handlers::csv::run_import,
        "tasks.run_ifcclash_detection" => crate::handlers::clash::run,
        "tasks.run_ifctester" => crate::handlers::tester::run,
        "tasks.run_ifcdiff" => crate::handlers::diff::run,
        "tasks.run_ifc5d_qto" => crate::handlers::qto::run,
        "tasks.run_ifc2json" => crate::handlers::json::run,
        "tasks.run_ifcpatch" => crate::handlers::patch::run,
        "tasks.list_ifcpatch_recipes" => crate::handlers::patch::list_recipes,
        other => {
            return Err(JobError::new(
                ErrorKind::Decode,
                format!("unknown handler {}", other),
            ))
        }
    };
    Ok(handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_known_handler() {
        for name in [
            "tasks.run_ifcconvert",
            "tasks.run_ifccsv_export",
            "tasks.run_ifccsv_import",
            "tasks.run_ifcclash_detection",
            "tasks.run_ifctester",
            "tasks.run_ifcdiff",
            "tasks.run_ifc5d_qto",
            "tasks.run_ifc2json",
            "tasks.run_ifcpatch",
            "tasks.list_ifcpatch_recipes",
        ] {
            assert!(resolve(name).is_ok(), "{} should resolve", name);
        }
    }

    #[test]
    fn unknown_handler_is_a_decode_error() {
        let err = resolve("tasks.nonexistent").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Decode);
        assert!(err.message.contains("tasks.nonexistent"));
    }
}

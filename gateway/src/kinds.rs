//! The per-kind request schemas the gateway validates and dispatches
//! (spec §4.5, §6), plus the queue/handler-name/timeout each kind maps to.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One of the job kinds exposed over HTTP. `CsvImport` and `CsvExport`
/// share a queue and worker but have distinct request schemas and
/// handler names, as do `Patch` and `PatchList`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Convert,
    CsvExport,
    CsvImport,
    Clash,
    Tester,
    Diff,
    /// Quantity take-off; `calculate-qtos` is accepted as an alias of the
    /// canonical `ifc5d` path (spec §9 Open Question, resolved in
    /// `SPEC_FULL.md` in favor of `ifc5d` as canonical).
    Qto,
    Json,
    Patch,
    PatchList,
}

impl Kind {
    /// Broker queue name this kind is enqueued onto.
    pub fn queue(self) -> &'static str {
        match self {
            Kind::Convert => "ifcconvert",
            Kind::CsvExport | Kind::CsvImport => "ifccsv",
            Kind::Clash => "ifcclash",
            Kind::Tester => "ifctester",
            Kind::Diff => "ifcdiff",
            Kind::Qto => "ifc5d",
            Kind::Json => "ifc2json",
            Kind::Patch | Kind::PatchList => "ifcpatch",
        }
    }

    /// Handler name resolved in the worker's handler registry (spec C4).
    pub fn handler_name(self) -> &'static str {
        match self {
            Kind::Convert => "tasks.run_ifcconvert",
            Kind::CsvExport => "tasks.run_ifccsv_export",
            Kind::CsvImport => "tasks.run_ifccsv_import",
            Kind::Clash => "tasks.run_ifcclash_detection",
            Kind::Tester => "tasks.run_ifctester",
            Kind::Diff => "tasks.run_ifcdiff",
            Kind::Qto => "tasks.run_ifc5d_qto",
            Kind::Json => "tasks.run_ifc2json",
            Kind::Patch => "tasks.run_ifcpatch",
            Kind::PatchList => "tasks.list_ifcpatch_recipes",
        }
    }

    /// Default per-job timeout applied unless the caller overrides it
    /// (spec §4.5: "long for clash/diff (e.g. 2 hours), short for CSV/
    /// tester (e.g. 1 hour)" — extended uniformly to every other kind
    /// that does not name its own timeout).
    pub fn default_timeout(self) -> Duration {
        match self {
            Kind::Clash | Kind::Diff => Duration::from_secs(2 * 60 * 60),
            _ => Duration::from_secs(60 * 60),
        }
    }
}

/// `POST /ifcconvert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertRequest {
    pub input_filename: String,
    pub output_filename: String,
}

/// `POST /ifccsv` — tabular export from an IFC model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsvExportRequest {
    pub filename: String,
    pub output_filename: String,
    #[serde(default)]
    pub format: Option<CsvFormat>,
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub null_value: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
}

/// Accepted tabular output formats for CSV export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvFormat {
    Csv,
    Xlsx,
    Ods,
}

/// `POST /ifccsv/import` — apply tabular edits back onto an IFC model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsvImportRequest {
    pub ifc_filename: String,
    pub csv_filename: String,
    #[serde(default)]
    pub output_filename: Option<String>,
}

/// One named group of models checked against each other for clashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClashSet {
    pub name: String,
    pub filenames: Vec<String>,
}

/// `POST /ifcclash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClashRequest {
    pub clash_sets: Vec<ClashSet>,
    #[serde(default)]
    pub tolerance: Option<f64>,
    pub output_filename: String,
}

/// `POST /ifctester` — IDS rule validation against a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TesterRequest {
    pub ifc_filename: String,
    pub ids_filename: String,
    pub output_filename: String,
    #[serde(default)]
    pub report_type: Option<String>,
}

/// `POST /ifcdiff` — structural diff between two IFC models.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiffRequest {
    pub old_file: String,
    pub new_file: String,
    pub output_filename: String,
    #[serde(default)]
    pub filter_changed_only: Option<bool>,
    #[serde(default)]
    pub filter_geometry: Option<bool>,
}

/// `POST /ifc5d` (alias `/calculate-qtos`) — quantity take-off.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QtoRequest {
    pub filename: String,
    pub output_filename: String,
}

/// `POST /ifc2json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonRequest {
    pub filename: String,
    pub output_filename: String,
}

/// `POST /patch/execute` — apply one named patch recipe to a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchRequest {
    pub input_file: String,
    pub output_file: String,
    pub recipe: String,
    #[serde(default)]
    pub arguments: Vec<serde_json::Value>,
    #[serde(default)]
    pub use_custom: bool,
}

/// `POST /patch/recipes/list` — synchronous recipe listing (spec §4.5,
/// §5: bounded wait, `408` if the patch worker does not answer in time).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchListRequest {
    #[serde(default = "default_true")]
    pub include_builtin: bool,
    #[serde(default = "default_true")]
    pub include_custom: bool,
}

fn default_true() -> bool {
    true
}

/// A single patch recipe as reported by `/patch/recipes/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchRecipe {
    pub name: String,
    pub custom: bool,
}

/// Result shape returned inline by `/patch/recipes/list` (spec S6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchRecipeListing {
    pub recipes: Vec<PatchRecipe>,
    pub builtin_count: usize,
    pub custom_count: usize,
    pub total_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clash_and_diff_get_two_hour_default() {
        assert_eq!(Kind::Clash.default_timeout(), Duration::from_secs(7200));
        assert_eq!(Kind::Diff.default_timeout(), Duration::from_secs(7200));
        assert_eq!(Kind::Convert.default_timeout(), Duration::from_secs(3600));
    }

    #[test]
    fn csv_export_and_import_share_a_queue_but_not_a_handler() {
        assert_eq!(Kind::CsvExport.queue(), Kind::CsvImport.queue());
        assert_ne!(Kind::CsvExport.handler_name(), Kind::CsvImport.handler_name());
    }

    #[test]
    fn qto_and_patch_list_default_timeouts_match_spec_short_default() {
        assert_eq!(Kind::Qto.default_timeout(), Duration::from_secs(3600));
        assert_eq!(Kind::PatchList.default_timeout(), Duration::from_secs(3600));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let raw = r#"{"input_filename":"a.ifc","output_filename":"a.glb","bogus":1}"#;
        let parsed: Result<ConvertRequest, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn patch_list_defaults_to_both_sources() {
        let parsed: PatchListRequest = serde_json::from_str("{}").unwrap();
        assert!(parsed.include_builtin);
        assert!(parsed.include_custom);
    }
}

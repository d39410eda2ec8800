//! Data model for annotation records, editable fields, batch kinds, and jobs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};

// =============================================================================
// EDITABLE FIELDS
// =============================================================================

/// A field the user can edit from the grid or the detail panel.
///
/// The string form is the UI name; [`EditableField::record_path`] gives the
/// location of the value inside the persisted [`AnnotationRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditableField {
    DataType,
    DataCategory,
    DataSubCategory,
    UsageStatus,
    Action,
    DataSource,
    SourceSystem,
    Tags,
    SuggestedName,
    ClassificationDataType,
    SummaryShort,
    SummaryFull,
}

impl EditableField {
    /// Every editable field, in display order.
    pub const ALL: [EditableField; 12] = [
        EditableField::DataType,
        EditableField::DataCategory,
        EditableField::DataSubCategory,
        EditableField::UsageStatus,
        EditableField::Action,
        EditableField::DataSource,
        EditableField::SourceSystem,
        EditableField::Tags,
        EditableField::SuggestedName,
        EditableField::ClassificationDataType,
        EditableField::SummaryShort,
        EditableField::SummaryFull,
    ];

    /// UI name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            EditableField::DataType => "dataType",
            EditableField::DataCategory => "dataCategory",
            EditableField::DataSubCategory => "dataSubCategory",
            EditableField::UsageStatus => "usageStatus",
            EditableField::Action => "action",
            EditableField::DataSource => "dataSource",
            EditableField::SourceSystem => "sourceSystem",
            EditableField::Tags => "tags",
            EditableField::SuggestedName => "suggestedName",
            EditableField::ClassificationDataType => "classificationDataType",
            EditableField::SummaryShort => "summaryShort",
            EditableField::SummaryFull => "summaryFull",
        }
    }

    /// JSON path of the field inside an annotation record.
    pub fn record_path(&self) -> &'static [&'static str] {
        match self {
            EditableField::DataType => &["dataType"],
            EditableField::DataCategory => &["dataCategory"],
            EditableField::DataSubCategory => &["dataSubCategory"],
            EditableField::UsageStatus => &["usageStatus"],
            EditableField::Action => &["action"],
            EditableField::DataSource => &["dataSource"],
            EditableField::SourceSystem => &["sourceSystem"],
            EditableField::Tags => &["tags"],
            EditableField::SuggestedName => &["suggestedName"],
            EditableField::ClassificationDataType => &["classification", "dataType"],
            EditableField::SummaryShort => &["summary", "short"],
            EditableField::SummaryFull => &["summary", "full"],
        }
    }
}

impl fmt::Display for EditableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditableField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EditableField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown field: {}", s)))
    }
}

// =============================================================================
// ANNOTATION RECORD
// =============================================================================

/// Persisted per-entity annotation document.
///
/// Stored as a JSON object. Keys the engine does not know about are kept
/// as-is so a save never drops data written by other tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationRecord(Map<String, JsonValue>);

impl AnnotationRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a record from stored bytes. The document must be a JSON object.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        match serde_json::from_slice::<JsonValue>(bytes)? {
            JsonValue::Object(map) => Ok(Self(map)),
            other => Err(Error::Serialization(format!(
                "annotation record must be a JSON object, found {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Serialize the record for storage (pretty-printed, trailing newline).
    pub fn to_vec_pretty(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(&self.0)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Value stored for an editable field, if any.
    pub fn get(&self, field: EditableField) -> Option<&JsonValue> {
        self.get_path(field.record_path())
    }

    /// Value at an arbitrary path.
    pub fn get_path(&self, path: &[&str]) -> Option<&JsonValue> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.0.get(*first)?, |value, key| value.as_object()?.get(*key))
    }

    /// Set an editable field, creating intermediate objects as needed.
    pub fn set(&mut self, field: EditableField, value: JsonValue) {
        set_path(&mut self.0, field.record_path(), value);
    }

    /// Apply a set of pending edits.
    pub fn apply<'a, I>(&mut self, edits: I)
    where
        I: IntoIterator<Item = (&'a EditableField, &'a JsonValue)>,
    {
        for (field, value) in edits {
            self.set(*field, value.clone());
        }
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, JsonValue>> for AnnotationRecord {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}

fn set_path(map: &mut Map<String, JsonValue>, path: &[&str], value: JsonValue) {
    match path {
        [] => {}
        [leaf] => {
            map.insert((*leaf).to_string(), value);
        }
        [head, rest @ ..] => {
            let entry = map
                .entry((*head).to_string())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            if !entry.is_object() {
                *entry = JsonValue::Object(Map::new());
            }
            if let JsonValue::Object(child) = entry {
                set_path(child, rest, value);
            }
        }
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

// =============================================================================
// BATCH KINDS
// =============================================================================

/// Enrichment operation run over a working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BatchKind {
    /// Fetch sample rows for each table
    #[serde(rename = "fetch-samples")]
    SampleFetch,
    /// Fetch distinct values of categorical columns
    #[serde(rename = "fetch-categorical")]
    CategoricalFetch,
    /// Fetch column/table details from the source system
    #[serde(rename = "fetch-details")]
    DetailFetch,
    /// Run AI classification and summarization
    #[serde(rename = "ai-analysis")]
    AiAnalysis,
    /// Regenerate the derived overview artifact
    #[serde(rename = "generate-overview")]
    OverviewGeneration,
}

impl BatchKind {
    pub const ALL: [BatchKind; 5] = [
        BatchKind::SampleFetch,
        BatchKind::CategoricalFetch,
        BatchKind::DetailFetch,
        BatchKind::AiAnalysis,
        BatchKind::OverviewGeneration,
    ];

    /// Stable slug used in job ids and capability endpoints.
    pub fn as_slug(&self) -> &'static str {
        match self {
            BatchKind::SampleFetch => "fetch-samples",
            BatchKind::CategoricalFetch => "fetch-categorical",
            BatchKind::DetailFetch => "fetch-details",
            BatchKind::AiAnalysis => "ai-analysis",
            BatchKind::OverviewGeneration => "generate-overview",
        }
    }

    /// Human-readable job name.
    pub fn display_name(&self) -> &'static str {
        match self {
            BatchKind::SampleFetch => "Fetch samples",
            BatchKind::CategoricalFetch => "Fetch categorical values",
            BatchKind::DetailFetch => "Fetch details",
            BatchKind::AiAnalysis => "AI analysis",
            BatchKind::OverviewGeneration => "Generate overviews",
        }
    }

    /// Mutual-exclusion family this kind belongs to.
    pub fn family(&self) -> BatchFamily {
        match self {
            BatchKind::SampleFetch | BatchKind::CategoricalFetch | BatchKind::DetailFetch => {
                BatchFamily::Fetch
            }
            BatchKind::AiAnalysis => BatchFamily::Analysis,
            BatchKind::OverviewGeneration => BatchFamily::Overview,
        }
    }

    /// Overwrite flag requested when the caller does not override it.
    ///
    /// AI analysis defaults to false so reviewed annotations survive a rerun.
    pub fn default_overwrite(&self) -> bool {
        !matches!(self, BatchKind::AiAnalysis)
    }

    /// Verb used in the final job summary.
    pub fn summary_verb(&self) -> &'static str {
        match self {
            BatchKind::SampleFetch | BatchKind::CategoricalFetch | BatchKind::DetailFetch => {
                "Fetched"
            }
            BatchKind::AiAnalysis => "Analyzed",
            BatchKind::OverviewGeneration => "Generated",
        }
    }

    /// Final job message, e.g. `"Fetched 2, 1 errors"`.
    pub fn summary(&self, success_count: usize, error_count: usize) -> String {
        if error_count > 0 {
            format!(
                "{} {}, {} errors",
                self.summary_verb(),
                success_count,
                error_count
            )
        } else {
            format!("{} {}", self.summary_verb(), success_count)
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_slug())
    }
}

impl FromStr for BatchKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BatchKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_slug() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown batch kind: {}", s)))
    }
}

/// Set of batch kinds of which at most one may run at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchFamily {
    /// Sample, categorical-value, and detail fetches share the source connection.
    Fetch,
    Analysis,
    Overview,
}

impl BatchFamily {
    /// Kinds belonging to this family.
    pub fn members(&self) -> Vec<BatchKind> {
        BatchKind::ALL
            .iter()
            .copied()
            .filter(|kind| kind.family() == *self)
            .collect()
    }
}

impl fmt::Display for BatchFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchFamily::Fetch => "fetch",
            BatchFamily::Analysis => "analysis",
            BatchFamily::Overview => "overview",
        };
        f.write_str(name)
    }
}

// =============================================================================
// JOBS
// =============================================================================

/// Status of a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and failed jobs never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// One run of a batch task, as shown in the progress panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub kind: BatchKind,
    pub status: JobStatus,
    /// Percent complete, 0-100.
    pub progress: u8,
    pub message: String,
    pub success_count: usize,
    pub error_count: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// A freshly started job: running, progress 0.
    pub fn new(id: impl Into<String>, kind: BatchKind) -> Self {
        Self {
            id: id.into(),
            name: kind.display_name().to_string(),
            kind,
            status: JobStatus::Running,
            progress: 0,
            message: "Starting...".to_string(),
            success_count: 0,
            error_count: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn family(&self) -> BatchFamily {
        self.kind.family()
    }

    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }
}

/// Partial update merged into a stored [`Job`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub progress: Option<u8>,
    pub message: Option<String>,
    pub status: Option<JobStatus>,
    pub success_count: Option<usize>,
    pub error_count: Option<usize>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn counts(mut self, success_count: usize, error_count: usize) -> Self {
        self.success_count = Some(success_count);
        self.error_count = Some(error_count);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_editable_field_round_trips_ui_name() {
        for field in EditableField::ALL {
            assert_eq!(field.as_str().parse::<EditableField>().unwrap(), field);
        }
    }

    #[test]
    fn test_editable_field_rejects_unknown_name() {
        let err = "colour".parse::<EditableField>().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_editable_field_serde_matches_ui_name() {
        let value = serde_json::to_value(EditableField::SummaryShort).unwrap();
        assert_eq!(value, json!("summaryShort"));
    }

    #[test]
    fn test_nested_fields_map_to_nested_paths() {
        assert_eq!(
            EditableField::ClassificationDataType.record_path(),
            &["classification", "dataType"]
        );
        assert_eq!(EditableField::SummaryFull.record_path(), &["summary", "full"]);
        assert_eq!(EditableField::UsageStatus.record_path(), &["usageStatus"]);
    }

    #[test]
    fn test_record_set_nested_preserves_siblings() {
        let mut record = AnnotationRecord::from_slice(
            br#"{"summary":{"full":"Long text"},"owner":"finance"}"#,
        )
        .unwrap();

        record.set(EditableField::SummaryShort, json!("Order headers"));

        assert_eq!(
            record.get(EditableField::SummaryShort),
            Some(&json!("Order headers"))
        );
        assert_eq!(record.get(EditableField::SummaryFull), Some(&json!("Long text")));
        assert_eq!(record.get_path(&["owner"]), Some(&json!("finance")));
    }

    #[test]
    fn test_record_set_replaces_non_object_intermediate() {
        let mut record = AnnotationRecord::from_slice(br#"{"summary":"legacy"}"#).unwrap();
        record.set(EditableField::SummaryShort, json!("New"));
        assert_eq!(record.as_map()["summary"], json!({"short": "New"}));
    }

    #[test]
    fn test_record_apply_edits() {
        let mut record = AnnotationRecord::new();
        let edits = [
            (EditableField::UsageStatus, json!("In Use")),
            (EditableField::Tags, json!(["pii", "finance"])),
        ];
        record.apply(edits.iter().map(|(f, v)| (f, v)));

        assert_eq!(record.get(EditableField::UsageStatus), Some(&json!("In Use")));
        assert_eq!(record.get(EditableField::Tags), Some(&json!(["pii", "finance"])));
    }

    #[test]
    fn test_record_from_slice_rejects_non_object() {
        let err = AnnotationRecord::from_slice(b"[1, 2]").unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_record_pretty_bytes_parse_back() {
        let mut record = AnnotationRecord::new();
        record.set(EditableField::Action, json!("Approved"));
        let bytes = record.to_vec_pretty().unwrap();
        assert!(bytes.ends_with(b"\n"));
        assert_eq!(AnnotationRecord::from_slice(&bytes).unwrap(), record);
    }

    #[test]
    fn test_batch_kind_families() {
        assert_eq!(BatchKind::SampleFetch.family(), BatchFamily::Fetch);
        assert_eq!(BatchKind::CategoricalFetch.family(), BatchFamily::Fetch);
        assert_eq!(BatchKind::DetailFetch.family(), BatchFamily::Fetch);
        assert_eq!(BatchKind::AiAnalysis.family(), BatchFamily::Analysis);
        assert_eq!(BatchKind::OverviewGeneration.family(), BatchFamily::Overview);
        assert_eq!(BatchFamily::Fetch.members().len(), 3);
    }

    #[test]
    fn test_batch_kind_slug_parses() {
        for kind in BatchKind::ALL {
            assert_eq!(kind.as_slug().parse::<BatchKind>().unwrap(), kind);
        }
        assert!("fetch".parse::<BatchKind>().is_err());
    }

    #[test]
    fn test_batch_kind_serde_uses_slug() {
        assert_eq!(
            serde_json::to_value(BatchKind::CategoricalFetch).unwrap(),
            json!("fetch-categorical")
        );
    }

    #[test]
    fn test_summary_omits_error_clause_when_zero() {
        assert_eq!(BatchKind::SampleFetch.summary(3, 0), "Fetched 3");
        assert_eq!(BatchKind::SampleFetch.summary(2, 1), "Fetched 2, 1 errors");
        assert_eq!(BatchKind::AiAnalysis.summary(5, 0), "Analyzed 5");
        assert_eq!(BatchKind::OverviewGeneration.summary(0, 4), "Generated 0, 4 errors");
    }

    #[test]
    fn test_default_overwrite() {
        assert!(BatchKind::SampleFetch.default_overwrite());
        assert!(!BatchKind::AiAnalysis.default_overwrite());
    }

    #[test]
    fn test_new_job_is_running_at_zero() {
        let job = Job::new("fetch-samples-1", BatchKind::SampleFetch);
        assert!(job.is_running());
        assert_eq!(job.progress, 0);
        assert_eq!(job.name, "Fetch samples");
        assert!(job.finished_at.is_none());
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_job_update_builder() {
        let update = JobUpdate::new()
            .progress(50)
            .message("2/4: orders")
            .counts(2, 0);
        assert_eq!(update.progress, Some(50));
        assert_eq!(update.message.as_deref(), Some("2/4: orders"));
        assert_eq!(update.success_count, Some(2));
        assert_eq!(update.status, None);
    }
}

//! Local overview renderer.
//!
//! Renders `overview.md` for an entity from its annotation record. This is
//! the derived artifact the persistence controller refreshes after a save.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::debug;

use marginalia_core::{
    annotation_path, overview_path, AnnotationRecord, EditableField, Error, OverviewGenerator,
    RecordStore, Result,
};

/// [`OverviewGenerator`] that writes markdown next to the annotation record.
#[derive(Debug, Clone)]
pub struct RecordOverviewRenderer<S> {
    store: S,
}

impl<S: RecordStore> RecordOverviewRenderer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: RecordStore> OverviewGenerator for RecordOverviewRenderer<S> {
    async fn regenerate(&self, domain_id: &str, entity_id: &str, overwrite: bool) -> Result<()> {
        let target = overview_path(domain_id, entity_id)?;
        if !overwrite && self.store.read(&target).await?.is_some() {
            debug!(domain_id, entity_id, "overview: exists, overwrite not requested");
            return Ok(());
        }

        let source = annotation_path(domain_id, entity_id)?;
        let bytes = self.store.read(&source).await?.ok_or_else(|| {
            Error::Regeneration(format!("no annotation record for {}/{}", domain_id, entity_id))
        })?;
        let record = AnnotationRecord::from_slice(&bytes)
            .map_err(|e| Error::Regeneration(format!("{}/{}: {}", domain_id, entity_id, e)))?;

        let markdown = render_overview(domain_id, entity_id, &record);
        self.store.write(&target, markdown.as_bytes()).await?;
        Ok(())
    }
}

/// Render the overview markdown for one record.
pub fn render_overview(domain_id: &str, entity_id: &str, record: &AnnotationRecord) -> String {
    let title = record
        .get(EditableField::SuggestedName)
        .and_then(JsonValue::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(entity_id);

    let mut out = format!("# {}\n\n`{}` in domain `{}`\n\n", title, entity_id, domain_id);

    let rows: Vec<(EditableField, String)> = EditableField::ALL
        .iter()
        .filter(|f| !matches!(f, EditableField::SummaryShort | EditableField::SummaryFull))
        .filter_map(|f| record.get(*f).and_then(display_value).map(|v| (*f, v)))
        .collect();

    if !rows.is_empty() {
        out.push_str("| Field | Value |\n|-------|-------|\n");
        for (field, value) in rows {
            out.push_str(&format!("| {} | {} |\n", field, value.replace('|', "\\|")));
        }
        out.push('\n');
    }

    let short = record
        .get(EditableField::SummaryShort)
        .and_then(display_value);
    let full = record
        .get(EditableField::SummaryFull)
        .and_then(display_value);
    if short.is_some() || full.is_some() {
        out.push_str("## Summary\n\n");
        if let Some(short) = short {
            out.push_str(&format!("**{}**\n\n", short));
        }
        if let Some(full) = full {
            out.push_str(&full);
            out.push('\n');
        }
    }

    out
}

fn display_value(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) if s.is_empty() => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Array(items) if items.is_empty() => None,
        JsonValue::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}

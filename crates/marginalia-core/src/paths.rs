//! Record layout under the data root.
//!
//! ```text
//! {domain_id}/{entity_id}/annotation.json
//! {domain_id}/{entity_id}/overview.md
//! ```

use crate::defaults::{ANNOTATION_FILE, OVERVIEW_FILE};
use crate::error::{Error, Result};

/// Reject ids that would escape their directory or collapse the layout.
pub fn validate_segment(label: &str, value: &str) -> Result<()> {
    if value.is_empty()
        || value == "."
        || value == ".."
        || value.contains('/')
        || value.contains('\\')
        || value.contains('\0')
    {
        return Err(Error::InvalidInput(format!("invalid {}: {:?}", label, value)));
    }
    Ok(())
}

/// Relative path of an entity's annotation record.
pub fn annotation_path(domain_id: &str, entity_id: &str) -> Result<String> {
    entity_file(domain_id, entity_id, ANNOTATION_FILE)
}

/// Relative path of an entity's derived overview artifact.
pub fn overview_path(domain_id: &str, entity_id: &str) -> Result<String> {
    entity_file(domain_id, entity_id, OVERVIEW_FILE)
}

fn entity_file(domain_id: &str, entity_id: &str, file: &str) -> Result<String> {
    validate_segment("domain id", domain_id)?;
    validate_segment("entity id", entity_id)?;
    Ok(format!("{}/{}/{}", domain_id, entity_id, file))
}

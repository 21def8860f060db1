//! Human-readable summary renderer for change-sets.

use crate::diff::model::ChangeSet;
use crate::schema::ResourceSchema;
use crate::snapshot::Snapshot;
use serde_json::Value;

/// Render one `field: old → new` line per change, in schema order.
///
/// Withheld gated fields follow on their own lines. An empty change-set
/// renders as `No changes.`.
pub fn render_change_summary(
    schema: &ResourceSchema,
    snapshot: &Snapshot,
    change_set: &ChangeSet,
) -> String {
    if change_set.is_empty() && change_set.withheld.is_empty() {
        return "No changes.\n".to_string();
    }

    let mut out = String::new();
    for name in schema.field_names() {
        if let Some(new) = change_set.changes.get(name) {
            out.push_str(&format!(
                "{}: {} → {}\n",
                name,
                snapshot.get(name).map_or("(unset)".to_string(), render),
                render(new)
            ));
        }
    }
    for name in &change_set.withheld {
        out.push_str(&format!("{}: withheld (edit-gate closed)\n", name));
    }
    out
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

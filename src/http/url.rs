//! Resource-addressed URL composition.
//!
//! A call that names a resource (the `name` field of its data) targets
//! `{base}/{name}`. The name is percent-encoded so `/`, `?`, `#` and spaces
//! inside it never change the shape of the path.

use serde_json::Value;

/// Field of the call data that names the target resource.
pub const RESOURCE_NAME_FIELD: &str = "name";

/// Append the percent-encoded resource name to `base_path`.
///
/// An absent or empty name returns `base_path` unchanged.
pub fn compose(base_path: &str, resource_name: Option<&str>) -> String {
    match resource_name {
        Some(name) if !name.is_empty() => {
            format!("{}/{}", base_path, urlencoding::encode(name))
        }
        _ => base_path.to_string(),
    }
}

/// Extract the resource name from call data, if it carries a string `name`.
pub fn resource_name(data: Option<&Value>) -> Option<&str> {
    data.and_then(|d| d.get(RESOURCE_NAME_FIELD))
        .and_then(Value::as_str)
}

//! Dashboard definitions shipped inside package manifests

use crate::validate::ValidationError;
use serde_json::{Map, Value};

/// Keys assigned by the dashboard store. Never sent on write.
const STORE_ASSIGNED_KEYS: [&str; 2] = ["id", "version"];

/// A dashboard definition as declared by a package developer.
///
/// `uid` and `title` are lifted out of the JSON model; anything that is not a
/// string there counts as absent. The remaining model is kept opaque.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub uid: Option<String>,
    pub title: Option<String>,
    body: Map<String, Value>,
}

impl Dashboard {
    /// Parse an untyped manifest entry.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut body) = value else {
            return Err(ValidationError::BadDashboard(format!(
                "expected a JSON object, got {}",
                json_kind(&value)
            )));
        };

        let uid = take_string(&mut body, "uid");
        let title = take_string(&mut body, "title");
        for key in STORE_ASSIGNED_KEYS {
            body.remove(key);
        }

        Ok(Self { uid, title, body })
    }

    /// Build a dashboard from its parts; store-assigned keys are dropped.
    pub fn new(uid: Option<String>, title: Option<String>, mut body: Map<String, Value>) -> Self {
        for key in ["uid", "title"].into_iter().chain(STORE_ASSIGNED_KEYS) {
            body.remove(key);
        }
        Self { uid, title, body }
    }

    /// The opaque model without uid, title, id and version.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// The model to send to the store under the derived `uid` and `title`.
    pub fn to_model(&self, uid: &str, title: &str) -> Map<String, Value> {
        let mut model = self.body.clone();
        model.insert("uid".to_string(), Value::String(uid.to_string()));
        model.insert("title".to_string(), Value::String(title.to_string()));
        model
    }
}

fn take_string(body: &mut Map<String, Value>, key: &str) -> Option<String> {
    match body.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_assigned_fields_are_stripped() {
        let dashboard = Dashboard::from_value(json!({
            "id": 12,
            "uid": "prysm-main",
            "title": "Prysm",
            "version": 7,
            "panels": []
        }))
        .unwrap();

        assert_eq!(dashboard.uid.as_deref(), Some("prysm-main"));
        assert_eq!(dashboard.title.as_deref(), Some("Prysm"));
        assert!(!dashboard.body().contains_key("id"));
        assert!(!dashboard.body().contains_key("version"));
        assert!(dashboard.body().contains_key("panels"));
    }

    #[test]
    fn test_non_string_uid_is_absent() {
        let dashboard = Dashboard::from_value(json!({ "uid": {}, "title": 3 })).unwrap();
        assert_eq!(dashboard.uid, None);
        assert_eq!(dashboard.title, None);
    }

    #[test]
    fn test_non_object_is_rejected() {
        let err = Dashboard::from_value(json!(["not", "a", "dashboard"])).unwrap_err();
        assert!(matches!(err, ValidationError::BadDashboard(_)));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_to_model_uses_derived_identity() {
        let dashboard = Dashboard::from_value(json!({ "uid": "x", "schemaVersion": 16 })).unwrap();
        let model = dashboard.to_model("prysm-x", "prysm 0");

        assert_eq!(model["uid"], "prysm-x");
        assert_eq!(model["title"], "prysm 0");
        assert_eq!(model["schemaVersion"], 16);
        assert!(!model.contains_key("id"));
    }
}

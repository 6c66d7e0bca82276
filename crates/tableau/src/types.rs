//! Small wire types shared by several entities.

use serde::{Deserialize, Serialize};

/// `{ "id": ..., "name": ... }` reference to an owner, project or publisher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl Reference {
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.name.is_empty()
    }
}

/// Content location (personal space or project).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub label: String,
}

/// `{ "tag": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    #[serde(default, rename = "tag", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl Tags {
    pub fn labels(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.label.clone()).collect()
    }
}

/// Wire booleans sometimes arrive as strings ("true"); accept both.
pub(crate) mod flexible_bool {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Str(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        Ok(match Option::<BoolOrString>::deserialize(deserializer)? {
            Some(BoolOrString::Bool(b)) => Some(b),
            Some(BoolOrString::Str(s)) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            None => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Flag {
        #[serde(default, deserialize_with = "flexible_bool::deserialize")]
        value: Option<bool>,
    }

    #[test]
    fn test_reference_skips_empty_fields() {
        let json = serde_json::to_value(Reference::id("p1")).unwrap();
        assert_eq!(json, serde_json::json!({"id": "p1"}));
        assert!(Reference::default().is_empty());
    }

    #[test]
    fn test_flexible_bool() {
        let f: Flag = serde_json::from_str(r#"{"value": "true"}"#).unwrap();
        assert_eq!(f.value, Some(true));
        let f: Flag = serde_json::from_str(r#"{"value": false}"#).unwrap();
        assert_eq!(f.value, Some(false));
        let f: Flag = serde_json::from_str("{}").unwrap();
        assert_eq!(f.value, None);
    }

    #[test]
    fn test_tags_labels() {
        let tags: Tags = serde_json::from_str(r#"{"tag": [{"label": "a"}, {"label": "b"}]}"#).unwrap();
        assert_eq!(tags.labels(), vec!["a", "b"]);
    }
}

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use crate::error::{Result, SearchError};

/// Caller-assigned, stable document identifier. Ordering is byte-wise and
/// is used to break score ties.
pub type DocId = String;

/// A flat record: an id plus field name to field value. Indexed fields must
/// hold text (which may carry inline markup) or null; other keys may hold
/// anything and are handled by the schema's [`UnknownFieldPolicy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: DocId,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

/// Accept string or integer ids; integers are stored in decimal form.
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<DocId, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Signed(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
    })
}

impl Document {
    pub fn new(id: impl Into<DocId>) -> Self {
        Self { id: id.into(), fields: BTreeMap::new() }
    }

    pub fn with_field(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.fields.insert(name.into(), Value::String(text.into()));
        self
    }

    /// Text of a field. `None` when the field is missing, null or not text.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default = "default_boost")]
    pub boost: f32,
}

fn default_boost() -> f32 { 1.0 }

impl FieldDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), boost: default_boost() }
    }

    pub fn boosted(name: impl Into<String>, boost: f32) -> Self {
        Self { name: name.into(), boost }
    }
}

/// What to do with a document field that the schema does not list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldPolicy {
    #[default]
    Ignore,
    Reject,
}

/// The ordered set of indexed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub unknown_fields: UnknownFieldPolicy,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new(["title", "articles", "tags", "category"])
    }
}

impl Schema {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: names.into_iter().map(FieldDef::new).collect(),
            unknown_fields: UnknownFieldPolicy::default(),
        }
    }

    pub fn reject_unknown_fields(mut self) -> Self {
        self.unknown_fields = UnknownFieldPolicy::Reject;
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn boost(&self, name: &str) -> f32 {
        self.get(name).map_or(1.0, |f| f.boost)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(SearchError::InvalidConfig("schema has no fields".into()));
        }
        let mut seen = HashSet::new();
        for f in &self.fields {
            if f.name.is_empty() || f.name.contains(':') || f.name.contains(char::is_whitespace) {
                return Err(SearchError::InvalidConfig(format!("invalid field name {:?}", f.name)));
            }
            if !seen.insert(f.name.as_str()) {
                return Err(SearchError::InvalidConfig(format!("duplicate field {:?}", f.name)));
            }
            if !f.boost.is_finite() || f.boost <= 0.0 {
                return Err(SearchError::InvalidConfig(format!("field {:?} has boost {}", f.name, f.boost)));
            }
        }
        Ok(())
    }

    /// Checks a document against the schema: indexed fields must be text or
    /// null, other fields follow the unknown-field policy. Returns the names
    /// of fields that will be ignored.
    pub fn check_document<'d>(&self, doc: &'d Document) -> Result<Vec<&'d str>> {
        for f in &self.fields {
            match doc.fields.get(&f.name) {
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(_) => {
                    return Err(SearchError::InvalidFieldType { doc: doc.id.clone(), field: f.name.clone() })
                }
            }
        }
        let unknown: Vec<&str> = doc.fields.keys().map(String::as_str).filter(|k| !self.contains(k)).collect();
        match (self.unknown_fields, unknown.first()) {
            (UnknownFieldPolicy::Reject, Some(field)) => Err(SearchError::UnknownField {
                doc: doc.id.clone(),
                field: field.to_string(),
            }),
            _ => Ok(unknown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_record_parses() {
        let doc: Document =
            serde_json::from_str(r#"{"id":"a","title":"Ocean Tales","articles":"<li>x</li>"}"#).unwrap();
        assert_eq!(doc.id, "a");
        assert_eq!(doc.field("title"), Some("Ocean Tales"));
        assert_eq!(doc.field("tags"), None);
    }

    #[test]
    fn integer_ids_are_normalized() {
        let doc: Document = serde_json::from_str(r#"{"id": 7, "title": "Ocean"}"#).unwrap();
        assert_eq!(doc.id, "7");
        let doc: Document = serde_json::from_str(r#"{"id": -3}"#).unwrap();
        assert_eq!(doc.id, "-3");
        assert!(serde_json::from_str::<Document>(r#"{"id": 1.5}"#).is_err());
    }

    #[test]
    fn non_text_extra_keys_parse_and_are_ignored() {
        let doc: Document =
            serde_json::from_str(r#"{"id":"a","title":"Ocean","rank":3,"url":null,"meta":{"x":[1]}}"#).unwrap();
        let mut ignored = Schema::default().check_document(&doc).unwrap();
        ignored.sort();
        assert_eq!(ignored, vec!["meta", "rank", "url"]);

        let err = Schema::default().reject_unknown_fields().check_document(&doc).unwrap_err();
        assert!(matches!(err, SearchError::UnknownField { .. }));
    }

    #[test]
    fn indexed_fields_must_be_text() {
        let doc: Document = serde_json::from_str(r#"{"id":"a","title":42}"#).unwrap();
        let err = Schema::default().check_document(&doc).unwrap_err();
        assert!(matches!(err, SearchError::InvalidFieldType { field, .. } if field == "title"));

        let doc: Document = serde_json::from_str(r#"{"id":"a","title":null}"#).unwrap();
        assert!(Schema::default().check_document(&doc).unwrap().is_empty());
        assert_eq!(doc.field("title"), None);
    }

    #[test]
    fn unknown_fields_follow_policy() {
        let doc = Document::new("a").with_field("title", "x").with_field("author", "y");
        assert_eq!(Schema::default().check_document(&doc).unwrap(), vec!["author"]);
        let err = Schema::default().reject_unknown_fields().check_document(&doc).unwrap_err();
        assert!(matches!(err, SearchError::UnknownField { field, .. } if field == "author"));
    }

    #[test]
    fn schema_validation() {
        assert!(Schema::default().validate().is_ok());
        assert!(Schema::new(Vec::<String>::new()).validate().is_err());
        assert!(Schema::new(["title", "title"]).validate().is_err());
        assert!(Schema::new(["a:b"]).validate().is_err());
    }
}

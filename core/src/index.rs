use crate::inverted::InvertedIndex;
use crate::store::{DocumentStore, StoredDoc};
use crate::tokenizer::analyze;
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// elasticlunr.js release whose index layout this crate emits.
pub const ELASTICLUNR_VERSION: &str = "0.9.5";
pub const DEFAULT_REF: &str = "id";
pub const PIPELINE: [&str; 3] = ["trimmer", "stopWordFilter", "stemmer"];
pub const LANG: &str = "English";

/// A document field value. Every variant is indexed through its `Display` form.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Indexes as nothing: no tokens, field length 0. A missing reference field is
    /// treated the same way and yields the empty ref.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self { FieldValue::Text(s.to_string()) }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self { FieldValue::Text(s) }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self { FieldValue::Int(n) }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self { FieldValue::Float(x) }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self { FieldValue::Bool(b) }
}

impl From<&FieldValue> for Value {
    fn from(v: &FieldValue) -> Self {
        match v {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(n) => Value::from(*n),
            FieldValue::Float(x) => Number::from_f64(*x).map(Value::Number).unwrap_or(Value::Null),
            FieldValue::Text(s) => Value::String(s.clone()),
        }
    }
}

/// Field name to value. Missing fields are simply not indexed.
pub type Document = BTreeMap<String, FieldValue>;

/// The search index: one inverted index per field plus the shared document store.
/// Fields are fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    fields: Vec<String>,
    ref_field: String,
    field_indexes: HashMap<String, InvertedIndex>,
    document_store: DocumentStore,
}

impl Index {
    /// Index over `fields` with `"id"` as the reference field and document saving on.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_config(fields, DEFAULT_REF, true)
    }

    pub fn with_config<I, S>(fields: I, ref_field: &str, save_docs: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let field_indexes = fields
            .iter()
            .map(|f| (f.clone(), InvertedIndex::new()))
            .collect();
        Self {
            fields,
            ref_field: ref_field.to_string(),
            field_indexes,
            document_store: DocumentStore::new(save_docs),
        }
    }

    pub fn fields(&self) -> &[String] { &self.fields }

    pub fn ref_field(&self) -> &str { &self.ref_field }

    pub fn field_index(&self, field: &str) -> Option<&InvertedIndex> { self.field_indexes.get(field) }

    pub fn document_store(&self) -> &DocumentStore { &self.document_store }

    /// Add one document. Its ref is the `Display` form of the reference field; every other
    /// configured field present in `doc` is analyzed and posted with weight `sqrt(count)`.
    pub fn add_doc(&mut self, doc: &Document) {
        let doc_ref = doc.get(&self.ref_field).map(ToString::to_string).unwrap_or_default();

        let stored: StoredDoc = doc
            .iter()
            .map(|(key, val)| {
                let v = if *key == self.ref_field { Value::String(doc_ref.clone()) } else { Value::from(val) };
                (key.clone(), v)
            })
            .collect();
        self.document_store.add_doc(&doc_ref, stored);

        for field in &self.fields {
            if *field == self.ref_field {
                continue;
            }
            let Some(value) = doc.get(field) else { continue };
            let terms = analyze(&value.to_string());

            let mut term_freq: HashMap<&str, u32> = HashMap::new();
            for term in &terms {
                *term_freq.entry(term.as_str()).or_insert(0) += 1;
            }
            self.document_store.add_field_length(&doc_ref, field, term_freq.len());

            let Some(inverted) = self.field_indexes.get_mut(field) else { continue };
            for (term, count) in term_freq {
                inverted.add_token(&doc_ref, term, f64::from(count).sqrt());
            }
            tracing::trace!(doc_ref = %doc_ref, field = %field, terms = terms.len(), "indexed field");
        }
        tracing::debug!(doc_ref = %doc_ref, "added document");
    }

    /// The elasticlunr index object. The reference field has no `index` entry.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut nested = Map::new();
        for field in &self.fields {
            if *field == self.ref_field {
                continue;
            }
            if let Some(inverted) = self.field_indexes.get(field) {
                nested.insert(field.clone(), inverted.to_value());
            }
        }

        let mut map = Map::new();
        map.insert("fields".into(), Value::from(self.fields.clone()));
        map.insert("ref".into(), Value::from(self.ref_field.as_str()));
        map.insert("version".into(), Value::from(ELASTICLUNR_VERSION));
        map.insert("pipeline".into(), Value::from(PIPELINE.to_vec()));
        map.insert("lang".into(), Value::from(LANG));
        map.insert("documentStore".into(), self.document_store.to_value());
        map.insert("index".into(), Value::Object(nested));
        map
    }

    pub fn to_value(&self) -> Value { Value::Object(self.to_map()) }

    /// Rebuild an index from its serialized form. `version`, `pipeline` and `lang` are
    /// fixed and not read back; `index` entries for unknown fields are ignored.
    pub fn from_value(value: &Value) -> Self {
        let fields: Vec<String> = value
            .get("fields")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        let ref_field = value.get("ref").and_then(Value::as_str).unwrap_or(DEFAULT_REF);

        let mut index = Index::with_config(fields, ref_field, true);
        if let Some(nested) = value.get("index").and_then(Value::as_object) {
            for (field, entry) in nested {
                if let Some(slot) = index.field_indexes.get_mut(field) {
                    *slot = InvertedIndex::from_value(entry);
                }
            }
        }
        if let Some(store) = value.get("documentStore") {
            index.document_store = DocumentStore::from_value(store);
        }
        index
    }
}

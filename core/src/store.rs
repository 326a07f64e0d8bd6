use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Original field values of one document, as handed to the client.
pub type StoredDoc = Map<String, Value>;

/// Holds what the client needs besides the trie: document payloads and per-field lengths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStore {
    save: bool,
    docs: BTreeMap<String, StoredDoc>,
    doc_info: BTreeMap<String, BTreeMap<String, usize>>,
    length: usize,
}

impl DocumentStore {
    pub fn new(save: bool) -> Self {
        Self { save, ..Self::default() }
    }

    pub fn is_saving(&self) -> bool { self.save }

    /// Number of distinct refs ever stored.
    pub fn len(&self) -> usize { self.length }

    pub fn is_empty(&self) -> bool { self.length == 0 }

    /// Store `doc` under `doc_ref`, or an empty placeholder when saving is off.
    /// Re-adding a ref replaces its payload and leaves `len` unchanged.
    pub fn add_doc(&mut self, doc_ref: &str, doc: StoredDoc) {
        let payload = if self.save { doc } else { StoredDoc::new() };
        if self.docs.insert(doc_ref.to_string(), payload).is_none() {
            self.length += 1;
        }
    }

    pub fn get_doc(&self, doc_ref: &str) -> Option<&StoredDoc> { self.docs.get(doc_ref) }

    pub fn has_doc(&self, doc_ref: &str) -> bool { self.docs.contains_key(doc_ref) }

    pub fn add_field_length(&mut self, doc_ref: &str, field: &str, length: usize) {
        self.doc_info
            .entry(doc_ref.to_string())
            .or_default()
            .insert(field.to_string(), length);
    }

    pub fn get_field_length(&self, doc_ref: &str, field: &str) -> Option<usize> {
        self.doc_info.get(doc_ref)?.get(field).copied()
    }

    pub fn to_value(&self) -> Value {
        json!({
            "save": self.save,
            "docs": self.docs,
            "docInfo": self.doc_info,
            "length": self.length,
        })
    }

    /// Lenient decode, mirroring the trie decoder: malformed entries are skipped.
    pub fn from_value(value: &Value) -> Self {
        let mut store = DocumentStore::new(value.get("save").and_then(Value::as_bool).unwrap_or(true));
        if let Some(docs) = value.get("docs").and_then(Value::as_object) {
            for (doc_ref, doc) in docs {
                if let Some(doc) = doc.as_object() {
                    store.docs.insert(doc_ref.clone(), doc.clone());
                }
            }
        }
        if let Some(info) = value.get("docInfo").and_then(Value::as_object) {
            for (doc_ref, fields) in info {
                let Some(fields) = fields.as_object() else { continue };
                for (field, len) in fields {
                    if let Some(len) = len.as_u64() {
                        store.add_field_length(doc_ref, field, len as usize);
                    }
                }
            }
        }
        store.length = value
            .get("length")
            .and_then(Value::as_u64)
            .map_or(store.docs.len(), |n| n as usize);
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str) -> StoredDoc {
        let mut d = StoredDoc::new();
        d.insert("title".into(), Value::from(title));
        d
    }

    #[test]
    fn length_counts_distinct_refs() {
        let mut store = DocumentStore::new(true);
        store.add_doc("0", doc("first"));
        store.add_doc("1", doc("second"));
        store.add_doc("0", doc("replaced"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get_doc("0").unwrap()["title"], "replaced");
    }

    #[test]
    fn placeholder_when_not_saving() {
        let mut store = DocumentStore::new(false);
        store.add_doc("0", doc("hidden"));
        assert!(store.has_doc("0"));
        assert!(store.get_doc("0").unwrap().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn field_lengths() {
        let mut store = DocumentStore::new(true);
        store.add_field_length("0", "body", 4);
        store.add_field_length("0", "title", 2);
        store.add_field_length("0", "body", 5);
        assert_eq!(store.get_field_length("0", "body"), Some(5));
        assert_eq!(store.get_field_length("0", "title"), Some(2));
        assert_eq!(store.get_field_length("0", "breadcrumbs"), None);
        assert_eq!(store.get_field_length("9", "body"), None);
    }

    #[test]
    fn wire_shape_round_trips() {
        let mut store = DocumentStore::new(true);
        store.add_doc("0", doc("intro"));
        store.add_field_length("0", "title", 1);
        let value = store.to_value();
        assert_eq!(value["save"], true);
        assert_eq!(value["length"], 1);
        assert_eq!(value["docInfo"]["0"]["title"], 1);
        assert_eq!(value["docs"]["0"]["title"], "intro");
        assert_eq!(DocumentStore::from_value(&value), store);
    }
}

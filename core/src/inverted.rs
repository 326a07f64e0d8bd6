//! Per-field token trie and its elasticlunr wire encoding.
//!
//! On the wire a node is a single JSON object: `docs` and `df` sit next to the child edges,
//! each child keyed by its one-character label. There is no `children` wrapper.

use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashMap};

const DOCS_KEY: &str = "docs";
const DF_KEY: &str = "df";
const TF_KEY: &str = "tf";

// Largest integer a JS number holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A trie node: postings for the token ending here plus child edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexItem {
    pub docs: HashMap<String, f64>,
    pub df: u64,
    pub children: BTreeMap<char, IndexItem>,
}

impl IndexItem {
    pub fn new() -> Self { Self::default() }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if !self.docs.is_empty() {
            let docs: Map<String, Value> = self
                .docs
                .iter()
                .map(|(doc_ref, tf)| {
                    let mut entry = Map::new();
                    entry.insert(TF_KEY.to_string(), weight_to_value(*tf));
                    (doc_ref.clone(), Value::Object(entry))
                })
                .collect();
            map.insert(DOCS_KEY.to_string(), Value::Object(docs));
        }
        if self.df > 0 {
            map.insert(DF_KEY.to_string(), Value::from(self.df));
        }
        for (edge, child) in &self.children {
            map.insert(edge.to_string(), child.to_value());
        }
        Value::Object(map)
    }

    /// Lenient decode: anything that is not the expected type is skipped. Keys other than
    /// `docs`/`df` are child edges; keys that are not a single character cannot be reached
    /// by a token walk and are dropped.
    pub fn from_value(value: &Value) -> Self {
        let mut item = IndexItem::new();
        let Some(map) = value.as_object() else { return item };
        for (key, val) in map {
            match key.as_str() {
                DOCS_KEY => {
                    let Some(docs) = val.as_object() else { continue };
                    for (doc_ref, entry) in docs {
                        if let Some(tf) = entry.get(TF_KEY).and_then(Value::as_f64) {
                            item.docs.insert(doc_ref.clone(), tf);
                        }
                    }
                }
                DF_KEY => {
                    let df = val
                        .as_u64()
                        .or_else(|| val.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64));
                    if let Some(df) = df {
                        item.df = df;
                    }
                }
                _ => {
                    let mut chars = key.chars();
                    let (Some(edge), None) = (chars.next(), chars.next()) else { continue };
                    if val.is_object() {
                        item.children.insert(edge, IndexItem::from_value(val));
                    }
                }
            }
        }
        item
    }
}

/// Whole weights go out as integers (`1`, not `1.0`) to match what JS engines print.
fn weight_to_value(weight: f64) -> Value {
    if weight.fract() == 0.0 && (0.0..=MAX_SAFE_INTEGER).contains(&weight) {
        Value::from(weight as u64)
    } else {
        Number::from_f64(weight).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// The inverted index for one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvertedIndex {
    pub root: IndexItem,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Post `weight` for `doc_ref` under `token`. `df` counts distinct refs; a repeated
    /// ref only replaces its weight.
    pub fn add_token(&mut self, doc_ref: &str, token: &str, weight: f64) {
        if token.is_empty() {
            return;
        }
        let mut node = &mut self.root;
        for ch in token.chars() {
            node = node.children.entry(ch).or_default();
        }
        if !node.docs.contains_key(doc_ref) {
            node.df += 1;
        }
        node.docs.insert(doc_ref.to_string(), weight);
    }

    pub fn get_node(&self, token: &str) -> Option<&IndexItem> {
        let mut node = &self.root;
        for ch in token.chars() {
            node = node.children.get(&ch)?;
        }
        Some(node)
    }

    pub fn has_token(&self, token: &str) -> bool { self.get_node(token).is_some() }

    pub fn get_docs(&self, token: &str) -> Option<&HashMap<String, f64>> {
        self.get_node(token).map(|node| &node.docs)
    }

    pub fn get_doc_frequency(&self, token: &str) -> u64 {
        self.get_node(token).map_or(0, |node| node.df)
    }

    /// `{"root": <node>}`, the per-field entry of the serialized index.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("root".to_string(), self.root.to_value());
        Value::Object(map)
    }

    pub fn from_value(value: &Value) -> Self {
        let root = value.get("root").map(IndexItem::from_value).unwrap_or_default();
        Self { root }
    }
}

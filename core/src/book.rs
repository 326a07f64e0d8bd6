//! Turning a book's chapter tree into search documents and the `searchindex` envelope
//! that the page script loads.

use crate::index::{Document, FieldValue, Index, DEFAULT_REF};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const BOOK_FIELDS: [&str; 3] = ["title", "body", "breadcrumbs"];
pub const BREADCRUMB_SEPARATOR: &str = " » ";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub id: String,
    pub text: String,
}

/// A rendered chapter: plain body text (HTML already stripped) and its headings.
/// Chapters without a path are drafts and are not indexed, nor is anything below them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub headings: Vec<Heading>,
    #[serde(default)]
    pub sub_items: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsOptions {
    pub limit_results: u32,
    pub teaser_word_count: u32,
}

impl Default for ResultsOptions {
    fn default() -> Self {
        Self { limit_results: 30, teaser_word_count: 30 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldBoost {
    pub boost: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(rename = "bool")]
    pub bool_mode: String,
    pub expand: bool,
    pub fields: BTreeMap<String, FieldBoost>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        let fields = [("title", 2), ("body", 1), ("breadcrumbs", 1)]
            .into_iter()
            .map(|(f, boost)| (f.to_string(), FieldBoost { boost }))
            .collect();
        Self { bool_mode: "OR".to_string(), expand: true, fields }
    }
}

/// Page URL for a chapter source path: `.md` becomes `.html`, separators become `/`.
pub fn chapter_url(path: &str) -> String {
    let stem = path.strip_suffix(".md").unwrap_or(path);
    format!("{stem}.html").replace('\\', "/")
}

/// Collects book documents into an [`Index`] while tracking the URL of each one.
/// Document ids are the positions in `doc_urls`.
pub struct SearchIndexBuilder {
    index: Index,
    doc_urls: Vec<String>,
    results_options: ResultsOptions,
    search_options: SearchOptions,
}

impl SearchIndexBuilder {
    pub fn new(results_options: ResultsOptions, search_options: SearchOptions) -> Self {
        Self::with_save_docs(results_options, search_options, true)
    }

    pub fn with_save_docs(results_options: ResultsOptions, search_options: SearchOptions, save_docs: bool) -> Self {
        Self {
            index: Index::with_config(BOOK_FIELDS, DEFAULT_REF, save_docs),
            doc_urls: Vec::new(),
            results_options,
            search_options,
        }
    }

    pub fn num_docs(&self) -> usize { self.doc_urls.len() }

    pub fn add_chapters(&mut self, chapters: &[Chapter]) {
        for chapter in chapters {
            self.add_chapter(chapter, "");
        }
    }

    fn add_chapter(&mut self, chapter: &Chapter, parent_breadcrumb: &str) {
        let Some(path) = chapter.path.as_deref() else {
            tracing::debug!(name = %chapter.name, "skipping draft chapter");
            return;
        };
        let page = chapter_url(path);
        let breadcrumb = if parent_breadcrumb.is_empty() {
            chapter.name.clone()
        } else {
            format!("{parent_breadcrumb}{BREADCRUMB_SEPARATOR}{}", chapter.name)
        };

        self.push_doc(page.clone(), &chapter.name, &chapter.body, &breadcrumb);
        for heading in &chapter.headings {
            let crumbs = format!("{breadcrumb}{BREADCRUMB_SEPARATOR}{}", heading.text);
            self.push_doc(format!("{page}#{}", heading.id), &heading.text, &heading.text, &crumbs);
        }

        for sub in &chapter.sub_items {
            self.add_chapter(sub, &breadcrumb);
        }
    }

    fn push_doc(&mut self, url: String, title: &str, body: &str, breadcrumbs: &str) {
        let id = self.doc_urls.len() as i64;
        let mut doc = Document::new();
        doc.insert("body".into(), FieldValue::from(body));
        doc.insert("breadcrumbs".into(), FieldValue::from(breadcrumbs));
        doc.insert(DEFAULT_REF.into(), FieldValue::Int(id));
        doc.insert("title".into(), FieldValue::from(title));
        self.doc_urls.push(url);
        self.index.add_doc(&doc);
    }

    pub fn finish(self) -> SearchIndex {
        tracing::info!(num_docs = self.doc_urls.len(), "search index built");
        SearchIndex {
            doc_urls: self.doc_urls,
            index: self.index,
            results_options: self.results_options,
            search_options: self.search_options,
        }
    }
}

/// Everything `searchindex.js` carries: the elasticlunr index plus page URLs and the
/// options the client search script reads.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchIndex {
    pub doc_urls: Vec<String>,
    pub index: Index,
    pub results_options: ResultsOptions,
    pub search_options: SearchOptions,
}

impl SearchIndex {
    pub fn to_value(&self) -> Value {
        json!({
            "doc_urls": self.doc_urls,
            "index": self.index.to_value(),
            "results_options": self.results_options,
            "search_options": self.search_options,
        })
    }

    /// Accepts the full envelope or a bare index object; missing options fall back to
    /// their defaults. A bare index always carries a top-level `fields` list, which the
    /// envelope never does.
    pub fn from_value(value: &Value) -> Self {
        let envelope = value.get("doc_urls").is_some()
            || (value.get("fields").is_none()
                && value.get("index").and_then(|i| i.get("fields")).is_some_and(Value::is_array));
        if !envelope {
            return SearchIndex {
                doc_urls: Vec::new(),
                index: Index::from_value(value),
                results_options: ResultsOptions::default(),
                search_options: SearchOptions::default(),
            };
        }
        let doc_urls = value
            .get("doc_urls")
            .and_then(Value::as_array)
            .map(|urls| urls.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        let results_options = value
            .get("results_options")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();
        let search_options = value
            .get("search_options")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();
        SearchIndex { doc_urls, index: Index::from_value(&value["index"]), results_options, search_options }
    }

    /// URL of the page (or heading anchor) a document ref points at.
    pub fn doc_url(&self, doc_ref: &str) -> Option<&str> {
        let pos: usize = doc_ref.parse().ok()?;
        self.doc_urls.get(pos).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(name: &str, path: Option<&str>, body: &str) -> Chapter {
        Chapter { name: name.into(), path: path.map(Into::into), body: body.into(), ..Chapter::default() }
    }

    fn sample_book() -> Vec<Chapter> {
        let mut intro = chapter("Introduction", Some("intro.md"), "Welcome to the guide.");
        intro.headings.push(Heading { id: "goals".into(), text: "Goals".into() });
        let mut nested = chapter("Install", Some("setup\\install.md"), "Download the installer.");
        nested.sub_items.push(chapter("Draft", None, "unpublished"));
        intro.sub_items.push(nested);
        vec![intro, chapter("Appendix", Some("appendix.md"), "Extra material.")]
    }

    #[test]
    fn documents_follow_chapter_order() {
        let mut builder = SearchIndexBuilder::new(ResultsOptions::default(), SearchOptions::default());
        builder.add_chapters(&sample_book());
        let built = builder.finish();
        assert_eq!(
            built.doc_urls,
            vec!["intro.html", "intro.html#goals", "setup/install.html", "appendix.html"]
        );
        let store = built.index.document_store();
        assert_eq!(store.len(), 4);
        assert_eq!(store.get_doc("1").unwrap()["breadcrumbs"], "Introduction » Goals");
        assert_eq!(store.get_doc("1").unwrap()["body"], "Goals");
        assert_eq!(store.get_doc("2").unwrap()["breadcrumbs"], "Introduction » Install");
        assert_eq!(store.get_doc("3").unwrap()["breadcrumbs"], "Appendix");
        assert_eq!(built.doc_url("2"), Some("setup/install.html"));
        assert_eq!(built.doc_url("9"), None);
    }

    #[test]
    fn draft_chapters_are_skipped() {
        let mut builder = SearchIndexBuilder::new(ResultsOptions::default(), SearchOptions::default());
        builder.add_chapters(&sample_book());
        let built = builder.finish();
        assert!(!built.index.field_index("body").unwrap().has_token("unpublish"));
    }

    #[test]
    fn envelope_shape() {
        let mut builder = SearchIndexBuilder::new(ResultsOptions::default(), SearchOptions::default());
        builder.add_chapters(&sample_book());
        let value = builder.finish().to_value();
        assert_eq!(value["results_options"]["limit_results"], 30);
        assert_eq!(value["results_options"]["teaser_word_count"], 30);
        assert_eq!(value["search_options"]["bool"], "OR");
        assert_eq!(value["search_options"]["expand"], true);
        assert_eq!(value["search_options"]["fields"]["title"]["boost"], 2);
        assert_eq!(value["index"]["ref"], "id");
        assert_eq!(value["index"]["version"], "0.9.5");
        assert_eq!(value["index"]["fields"], json!(["title", "body", "breadcrumbs"]));
        assert_eq!(value["doc_urls"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn envelope_decodes() {
        let mut builder = SearchIndexBuilder::new(ResultsOptions { limit_results: 10, teaser_word_count: 5 }, SearchOptions::default());
        builder.add_chapters(&sample_book());
        let built = builder.finish();
        assert_eq!(SearchIndex::from_value(&built.to_value()), built);
    }

    #[test]
    fn bare_index_decodes() {
        let mut builder = SearchIndexBuilder::new(ResultsOptions::default(), SearchOptions::default());
        builder.add_chapters(&sample_book());
        let built = builder.finish();
        let bare = SearchIndex::from_value(&built.index.to_value());
        assert!(bare.doc_urls.is_empty());
        assert_eq!(bare.index, built.index);
    }

    #[test]
    fn bare_index_with_field_named_fields_decodes() {
        let mut idx = Index::new(["title", "fields"]);
        let mut doc = Document::new();
        doc.insert("id".into(), FieldValue::Int(0));
        doc.insert("title".into(), FieldValue::from("Schema"));
        doc.insert("fields".into(), FieldValue::from("columns and types"));
        idx.add_doc(&doc);

        let loaded = SearchIndex::from_value(&idx.to_value());
        assert!(loaded.doc_urls.is_empty());
        assert_eq!(loaded.index, idx);
        assert_eq!(loaded.index.field_index("fields").unwrap().get_doc_frequency("column"), 1);
    }

    #[test]
    fn chapter_url_rewrites() {
        assert_eq!(chapter_url("a/b.md"), "a/b.html");
        assert_eq!(chapter_url("a\\b.md"), "a/b.html");
        assert_eq!(chapter_url("readme"), "readme.html");
    }
}

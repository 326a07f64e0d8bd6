use crate::book::SearchIndex;
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const SEARCH_INDEX_JS: &str = "searchindex.js";
pub const SEARCH_INDEX_JSON: &str = "searchindex.json";

const JS_PREFIX: &str = "window.search = Object.assign(window.search, JSON.parse('";
const JS_SUFFIX: &str = "'));";

pub struct OutputPaths {
    pub root: PathBuf,
}

impl OutputPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn js(&self) -> PathBuf { self.root.join(SEARCH_INDEX_JS) }
    pub fn json(&self) -> PathBuf { self.root.join(SEARCH_INDEX_JSON) }
}

/// Replace `<`, `>`, `&`, U+2028 and U+2029 with `\uXXXX` escapes. serde_json only emits
/// these inside strings, so the result is the same JSON value.
pub fn escape_json_html(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for a single-quoted JS string literal: backslashes first, then quotes.
/// Line and paragraph separators become `\u` escapes so pre-ES2019 engines accept them.
pub fn escape_js_single_quoted(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

pub fn unescape_js_single_quoted(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(next) => out.push(next),
            None => {}
        }
    }
    out
}

/// The `searchindex.js` statement that merges `value` into `window.search`.
pub fn embed_js(value: &Value) -> Result<String> {
    let json = escape_json_html(&serde_json::to_string(value)?);
    Ok(format!("{JS_PREFIX}{}{JS_SUFFIX}", escape_js_single_quoted(&json)))
}

/// Inverse of [`embed_js`]: the JSON text inside the statement.
pub fn extract_js(script: &str) -> Result<String> {
    let literal = script
        .trim()
        .strip_prefix(JS_PREFIX)
        .and_then(|rest| rest.strip_suffix(JS_SUFFIX))
        .ok_or_else(|| anyhow!("not a searchindex.js payload"))?;
    Ok(unescape_js_single_quoted(literal))
}

pub fn write_search_index(paths: &OutputPaths, index: &SearchIndex, also_json: bool) -> Result<()> {
    create_dir_all(&paths.root)
        .with_context(|| format!("creating {}", paths.root.display()))?;
    let value = index.to_value();

    let mut f = File::create(paths.js()).with_context(|| format!("creating {}", paths.js().display()))?;
    f.write_all(embed_js(&value)?.as_bytes())?;

    if also_json {
        let mut f = File::create(paths.json()).with_context(|| format!("creating {}", paths.json().display()))?;
        f.write_all(serde_json::to_string(&value)?.as_bytes())?;
    }
    tracing::info!(output = %paths.root.display(), also_json, "wrote search index");
    Ok(())
}

/// Load a `searchindex.js` or `searchindex.json` file written by [`write_search_index`]
/// (or by any producer of the same shape).
pub fn load_search_index(path: &Path) -> Result<SearchIndex> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let json = if path.extension().and_then(|s| s.to_str()) == Some("js") { extract_js(&buf)? } else { buf };
    let value: Value = serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
    Ok(SearchIndex::from_value(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::{Chapter, ResultsOptions, SearchIndexBuilder, SearchOptions};
    use serde_json::json;

    #[test]
    fn escapes_backslash_before_quote() {
        assert_eq!(escape_js_single_quoted(r#"{"a":"it's \"x\""}"#), r#"{"a":"it\'s \\"x\\""}"#);
    }

    #[test]
    fn embed_then_extract() {
        let value = json!({ "title": "Rust's \\ path", "n": 1 });
        let script = embed_js(&value).unwrap();
        assert!(script.starts_with("window.search = Object.assign(window.search, JSON.parse('"));
        assert!(script.ends_with("'));"));
        assert!(script.contains("Rust\\'s"));
        let back: Value = serde_json::from_str(&extract_js(&script).unwrap()).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn html_and_separator_characters_are_escaped() {
        let value = json!({ "body": "a < b && c > d\u{2028}next\u{2029}" });
        let script = embed_js(&value).unwrap();
        assert!(script.contains(r"a \\u003c b \\u0026\\u0026 c \\u003e d\\u2028next\\u2029"));
        assert!(!script.contains(['<', '>', '&', '\u{2028}', '\u{2029}']));
        let back: Value = serde_json::from_str(&extract_js(&script).unwrap()).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn raw_separators_in_literal_round_trip() {
        let text = "line\u{2028}para\u{2029}it's";
        let literal = escape_js_single_quoted(text);
        assert_eq!(literal, r"line\u2028para\u2029it\'s");
        assert_eq!(unescape_js_single_quoted(&literal), text);
    }

    #[test]
    fn extract_rejects_other_scripts() {
        assert!(extract_js("console.log('hi');").is_err());
    }

    #[test]
    fn write_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = SearchIndexBuilder::new(ResultsOptions::default(), SearchOptions::default());
        builder.add_chapters(&[Chapter {
            name: "Don't Panic".into(),
            path: Some("panic.md".into()),
            body: "Handling errors with C:\\paths and 'quotes'.".into(),
            ..Chapter::default()
        }]);
        let built = builder.finish();
        let paths = OutputPaths::new(dir.path().join("book"));
        write_search_index(&paths, &built, true).unwrap();

        assert_eq!(load_search_index(&paths.js()).unwrap(), built);
        assert_eq!(load_search_index(&paths.json()).unwrap(), built);
    }
}

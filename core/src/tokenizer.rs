use crate::stemmer::stem;
use lazy_static::lazy_static;
use std::collections::HashSet;

/// Tokens longer than this many bytes are dropped, not truncated.
pub const MAX_TOKEN_LEN: usize = 80;

lazy_static! {
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "",
            "a","able","about","across","after","all","almost","also","am","among","an","and","any","are","as","at",
            "be","because","been","but","by",
            "can","cannot","could",
            "dear","did","do","does",
            "either","else","ever","every",
            "for","from",
            "get","got",
            "had","has","have","he","her","hers","him","his","how","however",
            "i","if","in","into","is","it","its",
            "just",
            "least","let","like","likely",
            "may","me","might","most","must","my",
            "neither","no","nor","not",
            "of","off","often","on","only","or","other","our","own",
            "rather",
            "said","say","says","she","should","since","so","some",
            "than","that","the","their","them","then","there","these","they","this","tis","to","too","twas",
            "us",
            "wants","was","we","were","what","when","where","which","while","who","whom","why","will","with","would",
            "yet","you","your"
        ];
        words.iter().copied().collect()
    };
}

/// Exact match against the lowercased, unstemmed token.
pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

fn is_separator(c: char) -> bool { c.is_whitespace() || c == '-' }

/// Split text on whitespace and hyphens into lowercase tokens. Punctuation other than the
/// hyphen is kept verbatim; tokens over [`MAX_TOKEN_LEN`] bytes are omitted entirely.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(is_separator)
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .filter(|token| token.len() <= MAX_TOKEN_LEN)
        .collect()
}

/// Run the full pipeline (tokenize, stopword filter, stem) and return the stemmed terms in
/// document order. Repeated terms are kept; callers tally them.
pub fn analyze(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|token| !is_stopword(token))
        .map(|token| stem(&token))
        .filter(|term| !term.is_empty())
        .collect()
}

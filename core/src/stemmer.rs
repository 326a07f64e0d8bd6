//! Heuristic suffix stripper. It approximates Porter stemming closely enough for the
//! client-side runtime, which stems query terms the same way.

const PLURAL_SUFFIXES: [(&str, usize); 3] = [("ies", 3), ("es", 2), ("s", 1)];

const DERIVATIONAL_SUFFIXES: [&str; 15] = [
    "tion", "sion", "ment", "ness", "ful", "less", "ity",
    "ous", "ive", "ent", "ant", "able", "ible", "ence", "ance",
];

const AGENTIVE_SUFFIXES: [&str; 3] = ["ly", "er", "est"];

/// Strip the first suffix in `suffixes` that matches and leaves more than two bytes behind.
fn strip_first<'a>(word: &'a str, suffixes: &[&str]) -> &'a str {
    for suffix in suffixes {
        if word.len() > suffix.len() + 2 {
            if let Some(rest) = word.strip_suffix(suffix) {
                return rest;
            }
        }
    }
    word
}

/// Reduce a token toward its root. Each rule group fires at most once, in order.
pub fn stem(token: &str) -> String {
    if token.len() <= 2 {
        return token.to_string();
    }
    let lowered = token.to_lowercase();
    let mut word = lowered.as_str();

    for (suffix, min_rest) in PLURAL_SUFFIXES {
        if let Some(rest) = word.strip_suffix(suffix) {
            if rest.len() > min_rest {
                word = rest;
                break;
            }
        }
    }

    if word.len() > 4 && word.ends_with("ed") {
        word = &word[..word.len() - 2];
    } else if word.len() > 5 && word.ends_with("ing") {
        word = &word[..word.len() - 3];
    }

    word = strip_first(word, &DERIVATIONAL_SUFFIXES);
    word = strip_first(word, &AGENTIVE_SUFFIXES);
    word.to_string()
}

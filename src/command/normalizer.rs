// Utterance normalisation and whole-word helpers used by slot extraction.
use std::sync::LazyLock;

use regex::Regex;

/// Words the recognizer hears but that carry no command meaning.
static FILLERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(donna|please|hey|okay|ok)\b").expect("static regex"));

/// Everything except letters, digits, whitespace and apostrophes.
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s']").expect("static regex"));

/// Lowercase, fold punctuation to spaces, drop filler words, collapse whitespace.
pub fn normalize(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let no_punct = PUNCTUATION.replace_all(&lower, " ");
    let no_fillers = FILLERS.replace_all(&no_punct, " ");
    collapse(&no_fillers)
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn padded(s: &str) -> String {
    format!(" {s} ")
}

/// Whole-word (or whole-phrase) containment on normalised text.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    !phrase.is_empty() && padded(text).contains(&padded(phrase))
}

pub fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| contains_phrase(text, p))
}

/// Delete every whole-word occurrence of each phrase, in the given order.
pub fn strip_phrases<S: AsRef<str>>(text: &str, phrases: &[S]) -> String {
    let mut out = padded(text);
    for phrase in phrases {
        let phrase = phrase.as_ref();
        if phrase.is_empty() {
            continue;
        }
        let pat = padded(phrase);
        while out.contains(&pat) {
            out = out.replacen(&pat, " ", 1);
        }
    }
    collapse(&out)
}

/// Text following the first whole-word occurrence of `phrase`, trimmed.
pub fn text_after_phrase<'a>(text: &'a str, phrase: &str) -> Option<&'a str> {
    if phrase.is_empty() {
        return None;
    }
    let hay = padded(text);
    let pos = hay.find(&padded(phrase))?;
    // `hay` is `text` shifted right by one byte.
    let start = (pos + phrase.len() + 1).min(text.len());
    Some(text[start..].trim())
}

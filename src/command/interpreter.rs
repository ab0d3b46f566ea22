//! Maps a normalised utterance to an [`Intent`].
//!
//! Rules are evaluated strictly in order and the first match wins; the order
//! is part of the behaviour (stop always beats everything, open beats the
//! contextual search fallback, and so on). Slot values come from deleting
//! known command words from the utterance and trimming what is left.
use crate::agent_engine::state::AppSessionState;
use crate::command::normalizer::{contains_any, contains_phrase, strip_phrases, text_after_phrase};
use crate::command::profiles::{all_spoken_names, named_in};
use crate::command::types::{CallRoute, Intent, UtteranceContext};

const STOP_WORDS: &[&str] = &["stop", "cancel", "ruko", "bas karo", "band karo"];
const BACK_WORDS: &[&str] = &["back", "peeche", "wapas"];
const HOME_WORDS: &[&str] = &["home"];
const OPEN_WORDS: &[&str] = &["open", "kholo", "launch"];
const CALL_WORDS: &[&str] = &["call", "dial"];
/// Priority order for locating the message text: the first keyword present wins.
const MESSAGE_WORDS: &[&str] = &["bhejo", "msg", "message", "send"];
const SCROLL_WORDS: &[&str] = &["scroll", "niche", "neeche"];
const SEARCH_WORDS: &[&str] = &["search", "find", "dhundo", "khojo", "play", "chalao", "lagao"];
const CONNECTORS: &[&str] = &["pe", "par", "on", "in", "mein", "karo", "kar", "do", "app", "the", "gana"];
const CALL_MODIFIERS: &[&str] = &["video", "voice", "audio"];
const CONTACT_MARKERS: &[&str] = &["ko", "to"];

fn is_command_word(token: &str) -> bool {
    [
        STOP_WORDS,
        BACK_WORDS,
        HOME_WORDS,
        OPEN_WORDS,
        CALL_WORDS,
        MESSAGE_WORDS,
        SCROLL_WORDS,
        SEARCH_WORDS,
        CONNECTORS,
        CALL_MODIFIERS,
        CONTACT_MARKERS,
    ]
    .iter()
    .any(|set| set.contains(&token))
        || all_spoken_names().any(|n| n == token)
}

pub fn interpret(utterance: &UtteranceContext, session: &AppSessionState) -> Option<Intent> {
    let text = utterance.normalized_text.as_str();
    if text.is_empty() {
        return None;
    }

    if contains_any(text, STOP_WORDS) {
        return Some(Intent::Stop);
    }

    if contains_any(text, BACK_WORDS) {
        return Some(Intent::NavigateBack);
    }

    if contains_any(text, HOME_WORDS) {
        return Some(Intent::NavigateHome);
    }

    if contains_any(text, OPEN_WORDS) {
        let app_name = strip_phrases(text, OPEN_WORDS);
        let app_name = strip_phrases(&app_name, &["app", "the", "karo", "do"]);
        if app_name.is_empty() {
            tracing::debug!(text, "open command without an app name");
            return None;
        }
        return Some(Intent::OpenApp { app_name });
    }

    if contains_any(text, CALL_WORDS) {
        let route = if contains_phrase(text, "whatsapp") {
            CallRoute::WhatsApp
        } else {
            CallRoute::Dialer
        };
        return Some(Intent::PlaceCall {
            contact_name: call_contact(text),
            is_video: contains_phrase(text, "video"),
            route,
        });
    }

    if contains_phrase(text, "whatsapp") && contains_any(text, MESSAGE_WORDS) {
        let contact_name = message_contact(text);
        let body = message_body(text, &contact_name);
        return Some(Intent::SendMessage { contact_name, body });
    }

    if contains_any(text, SCROLL_WORDS) {
        return Some(Intent::Scroll);
    }

    if let Some(current) = session.current_label() {
        let names_other_app = named_in(text)
            .is_some_and(|p| session.current_profile().map(|c| c.key) != Some(p.key));
        if !names_other_app {
            let query = search_query(text);
            if query.is_empty() {
                return None;
            }
            return Some(Intent::SearchInApp {
                app: Some(current.to_string()),
                query,
            });
        }
    }

    if contains_any(text, SEARCH_WORDS) {
        let query = search_query(text);
        if query.is_empty() {
            return None;
        }
        return Some(Intent::SearchInApp {
            app: named_in(text).map(|p| p.launch_name.to_string()),
            query,
        });
    }

    tracing::debug!(text, "no rule matched; dropping utterance");
    None
}

fn search_query(text: &str) -> String {
    let names: Vec<&str> = all_spoken_names().collect();
    let stripped = strip_phrases(text, &names);
    let stripped = strip_phrases(&stripped, SEARCH_WORDS);
    strip_phrases(&stripped, CONNECTORS)
}

/// `ramesh ko ...` names the contact before the marker; when that token is a
/// command word (`... bhejo ko ramesh ...`) the one after it is used instead.
/// `... to ramesh` names the contact after the marker.
fn marker_contact(tokens: &[&str]) -> Option<String> {
    if let Some(i) = tokens.iter().position(|t| *t == "ko") {
        if i > 0 && !is_command_word(tokens[i - 1]) {
            return Some(tokens[i - 1].to_string());
        }
        if let Some(next) = tokens.get(i + 1).filter(|t| !is_command_word(t)) {
            return Some(next.to_string());
        }
    }
    let i = tokens.iter().position(|t| *t == "to")?;
    tokens
        .get(i + 1)
        .filter(|t| !is_command_word(t))
        .map(|t| t.to_string())
}

fn call_contact(text: &str) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    marker_contact(&tokens).unwrap_or_else(|| {
        tokens
            .iter()
            .filter(|t| !is_command_word(t))
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    })
}

fn message_contact(text: &str) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if let Some(name) = marker_contact(&tokens) {
        return name;
    }
    let after = MESSAGE_WORDS
        .iter()
        .find_map(|kw| text_after_phrase(text, kw))
        .unwrap_or_default();
    after
        .split_whitespace()
        .find(|t| !is_command_word(t))
        .unwrap_or_default()
        .to_string()
}

fn message_body(text: &str, contact: &str) -> String {
    let source = MESSAGE_WORDS
        .iter()
        .find_map(|kw| text_after_phrase(text, kw))
        .filter(|s| !s.is_empty())
        .unwrap_or(text);

    let mut tokens: Vec<&str> = source.split_whitespace().collect();
    if !contact.is_empty() {
        if let Some(i) = first_contact_pair(&tokens, contact) {
            tokens.drain(i..i + 2);
        } else if tokens.first() == Some(&contact) {
            tokens.remove(0);
        }
    }
    trim_command_edges(tokens)
}

/// Index of the first `ko X`, `X ko` or `to X` pair; later repeats are message text.
fn first_contact_pair(tokens: &[&str], contact: &str) -> Option<usize> {
    tokens.windows(2).position(|w| match w {
        [marker, name] if CONTACT_MARKERS.contains(marker) && *name == contact => true,
        [name, "ko"] => *name == contact,
        _ => false,
    })
}

fn trim_command_edges(mut tokens: Vec<&str>) -> String {
    while tokens.first().is_some_and(|t| is_command_word(t)) {
        tokens.remove(0);
    }
    while tokens.last().is_some_and(|t| is_command_word(t)) {
        tokens.pop();
    }
    tokens.join(" ")
}

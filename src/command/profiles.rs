//! Built-in automation knowledge about specific foreign apps.
//!
//! Each profile says how to find the app's search control, whether that
//! control can be hidden behind a detail view (so pressing back may reveal
//! it), and where its send / call buttons live. Anything not listed here
//! falls back to [`GENERIC`].
use crate::command::normalizer::contains_phrase;
use crate::executor::locator::LocateCriteria;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSpec {
    pub text: Option<&'static str>,
    pub label: Option<&'static str>,
    pub id: Option<&'static str>,
}

impl ControlSpec {
    pub fn criteria(&self) -> LocateCriteria {
        LocateCriteria {
            text: self.text.map(str::to_string),
            label: self.label.map(str::to_string),
            id_substring: self.id.map(str::to_string),
            skip_editable: false,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct AppProfile {
    pub key: &'static str,
    /// Whole words that name this app in an utterance.
    pub spoken_names: &'static [&'static str],
    /// Name handed to the launcher.
    pub launch_name: &'static str,
    /// Cold launch takes noticeably longer (media apps).
    pub heavy_launch: bool,
    pub search: ControlSpec,
    /// Search may be hidden behind an open chat; press back to reveal it.
    pub search_hidden_by_detail_view: bool,
    pub send: Option<ControlSpec>,
    pub voice_call: Option<ControlSpec>,
    pub video_call: Option<ControlSpec>,
}

pub static WHATSAPP: AppProfile = AppProfile {
    key: "whatsapp",
    spoken_names: &["whatsapp", "whats app"],
    launch_name: "WhatsApp",
    heavy_launch: false,
    search: ControlSpec {
        text: Some("Search"),
        label: Some("Search"),
        id: Some("id/menu_search"),
    },
    search_hidden_by_detail_view: true,
    send: Some(ControlSpec {
        text: None,
        label: Some("Send"),
        id: Some("id/send"),
    }),
    voice_call: Some(ControlSpec {
        text: None,
        label: Some("Voice call"),
        id: Some("id/voice_call"),
    }),
    video_call: Some(ControlSpec {
        text: None,
        label: Some("Video call"),
        id: Some("id/video_call"),
    }),
};

pub static YOUTUBE: AppProfile = AppProfile {
    key: "youtube",
    spoken_names: &["youtube", "you tube"],
    launch_name: "YouTube",
    heavy_launch: true,
    search: ControlSpec {
        text: Some("Search"),
        label: Some("Search"),
        id: Some("id/menu_search_icon"),
    },
    search_hidden_by_detail_view: false,
    send: None,
    voice_call: None,
    video_call: None,
};

pub static DIALER: AppProfile = AppProfile {
    key: "phone",
    spoken_names: &["dialer"],
    launch_name: "Phone",
    heavy_launch: false,
    search: ControlSpec {
        text: Some("Search contacts"),
        label: Some("Search"),
        id: Some("search"),
    },
    search_hidden_by_detail_view: false,
    send: None,
    voice_call: Some(ControlSpec {
        text: None,
        label: Some("Call"),
        id: Some("call"),
    }),
    video_call: Some(ControlSpec {
        text: None,
        label: Some("Video call"),
        id: Some("video"),
    }),
};

pub static GENERIC: AppProfile = AppProfile {
    key: "generic",
    spoken_names: &[],
    launch_name: "",
    heavy_launch: false,
    search: ControlSpec {
        text: Some("Search"),
        label: Some("Search"),
        id: Some("search"),
    },
    search_hidden_by_detail_view: false,
    send: Some(ControlSpec {
        text: Some("Send"),
        label: Some("Send"),
        id: Some("send"),
    }),
    voice_call: None,
    video_call: None,
};

/// Profiles that can be named in an utterance.
static NAMED: [&AppProfile; 2] = [&WHATSAPP, &YOUTUBE];

static ALL: [&AppProfile; 3] = [&WHATSAPP, &YOUTUBE, &DIALER];

/// Profile for an installed app's display label.
pub fn profile_for_label(label: &str) -> &'static AppProfile {
    let lower = label.to_lowercase();
    ALL.iter()
        .find(|p| p.launch_name.to_lowercase() == lower || p.spoken_names.contains(&lower.as_str()))
        .copied()
        .unwrap_or(&GENERIC)
}

/// First profiled app named anywhere in the normalised utterance.
pub fn named_in(text: &str) -> Option<&'static AppProfile> {
    NAMED
        .iter()
        .find(|p| p.spoken_names.iter().any(|n| contains_phrase(text, n)))
        .copied()
}

/// Every spoken app name, for stripping out of slot values.
pub fn all_spoken_names() -> impl Iterator<Item = &'static str> {
    NAMED.iter().flat_map(|p| p.spoken_names.iter().copied())
}

//! Source-application badge
//!
//! Maps the `app_name` a memory was written or read by to a display name and
//! icon. Unknown names still render: the key becomes the label and a generic
//! icon stands in.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// Icon shown next to the label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "src", rename_all = "snake_case")]
pub enum Icon {
    /// Image asset path
    Image(&'static str),
    /// Generic edit glyph for unrecognised sources
    Fallback,
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Icon::Image(src) => write!(f, "{}", src),
            Icon::Fallback => f.write_str("edit"),
        }
    }
}

/// A known source application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceAppInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub icon: Icon,
}

const fn known(key: &'static str, name: &'static str, src: &'static str) -> SourceAppInfo {
    SourceAppInfo {
        key,
        name,
        icon: Icon::Image(src),
    }
}

pub const KNOWN_APPS: &[SourceAppInfo] = &[
    known("claude", "Claude", "/images/claude.webp"),
    known("openmemory", "OpenMemory", "/images/open-memory.svg"),
    known("cursor", "Cursor", "/images/cursor.png"),
    known("cline", "Cline", "/images/cline.png"),
    known("roocline", "Roo Cline", "/images/roocline.png"),
    known("windsurf", "Windsurf", "/images/windsurf.png"),
    known("witsy", "Witsy", "/images/witsy.png"),
    known("enconvo", "Enconvo", "/images/enconvo.png"),
    known("augment", "Augment", "/images/augment.png"),
    known("msty", "Msty.ai", "/images/msty.svg"),
    SourceAppInfo {
        key: "default",
        name: "Default",
        icon: Icon::Fallback,
    },
];

/// Render model for one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: Cow<'static, str>,
    pub icon: Icon,
    /// Label is a raw key and should be shown capitalized
    pub capitalize: bool,
}

impl Badge {
    /// Label as it should appear on screen
    pub fn display_label(&self) -> Cow<'_, str> {
        if self.capitalize {
            Cow::Owned(capitalize_words(&self.label))
        } else {
            Cow::Borrowed(self.label.as_ref())
        }
    }

    /// Text rendering for terminals
    pub fn render_plain(&self) -> String {
        let marker = match self.icon {
            Icon::Image(_) => "●",
            Icon::Fallback => "✎",
        };
        format!("{} {}", marker, self.display_label())
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_label())
    }
}

/// Known entry for `key`, if any (exact, case-sensitive)
pub fn lookup(key: &str) -> Option<&'static SourceAppInfo> {
    KNOWN_APPS.iter().find(|app| app.key == key)
}

/// Badge for any key
pub fn source_app(key: &str) -> Badge {
    match lookup(key) {
        Some(app) => Badge {
            label: Cow::Borrowed(app.name),
            icon: app.icon,
            capitalize: false,
        },
        None => Badge {
            label: Cow::Owned(key.replace(&['-', '_'][..], " ")),
            icon: Icon::Fallback,
            capitalize: true,
        },
    }
}

/// Upper-case the first letter of each space-separated word
fn capitalize_words(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_source() {
        let badge = source_app("claude");
        assert_eq!(badge.label, "Claude");
        assert_eq!(badge.icon, Icon::Image("/images/claude.webp"));
        assert_eq!(badge.display_label(), "Claude");
    }

    #[test]
    fn test_unknown_source_falls_back() {
        let badge = source_app("some-unknown-tool");
        assert_eq!(badge.label, "some unknown tool");
        assert_eq!(badge.icon, Icon::Fallback);
        assert_eq!(badge.display_label(), "Some Unknown Tool");
        assert_eq!(badge.render_plain(), "✎ Some Unknown Tool");
    }

    #[test]
    fn test_underscores_and_mixed_separators() {
        assert_eq!(source_app("my_local-agent").label, "my local agent");
    }

    #[test]
    fn test_display_names_kept_verbatim() {
        assert_eq!(source_app("msty").to_string(), "Msty.ai");
        assert_eq!(source_app("roocline").to_string(), "Roo Cline");
        assert_eq!(source_app("default").icon, Icon::Fallback);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(lookup("Claude").is_none());
        assert_eq!(source_app("Claude").icon, Icon::Fallback);
    }

    #[test]
    fn test_empty_key_still_renders() {
        let badge = source_app("");
        assert_eq!(badge.label, "");
        assert_eq!(badge.render_plain(), "✎ ");
    }
}

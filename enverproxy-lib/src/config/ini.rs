//! Minimal INI reader for the `[enverproxy]` section.
//!
//! None of the reference corpus this implementation is grounded on reaches
//! for an INI-parsing crate, so this is a small hand-rolled reader rather
//! than a fetched dependency (see DESIGN.md). It supports `;`/`#` comments,
//! blank lines, `[section]` headers and `key = value` pairs with values
//! trimmed but otherwise taken verbatim (values may themselves contain `=`).

use std::collections::HashMap;

/// A single parsed `[section]` of an INI file, keyed by raw key string.
#[derive(Debug, Default, Clone)]
pub struct Section {
    entries: HashMap<String, String>,
}

impl Section {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// Parse `text` and return the named section, if present.
pub fn section(text: &str, name: &str) -> Option<Section> {
    let mut current: Option<String> = None;
    let mut section = Section::default();
    let mut found = false;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            if found {
                // We've already collected the section we wanted; a later
                // section header means we're done.
                break;
            }
            current = Some(stripped.trim().to_string());
            continue;
        }
        if current.as_deref() != Some(name) {
            continue;
        }
        found = true;
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        section
            .entries
            .insert(key.trim().to_string(), value.trim().to_string());
    }

    found.then_some(section)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_section_ignoring_comments_and_other_sections() {
        let text = "\
; leading comment
[other]
buffer_size = 999

[enverproxy]
# a comment
buffer_size = 4096
listen_port=5005
id2device = {\"11121314\": \"Roof array\"}
";
        let sec = section(text, "enverproxy").expect("section present");
        assert_eq!(sec.get("buffer_size"), Some("4096"));
        assert_eq!(sec.get("listen_port"), Some("5005"));
        assert_eq!(
            sec.get("id2device"),
            Some("{\"11121314\": \"Roof array\"}")
        );
        assert_eq!(sec.get("nonexistent"), None);
    }

    #[test]
    fn missing_section_returns_none() {
        assert!(section("[other]\nk=v\n", "enverproxy").is_none());
    }
}

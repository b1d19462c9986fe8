//! Filename sanitisation: client-supplied names → safe on-disk base names.
//!
//! A client filename is untrusted: it may carry directory components
//! (`../../etc/passwd.jsf`), Windows separators, spaces, control characters
//! or non-ASCII text. [`BaseName`] is the only way the rest of the crate
//! refers to a stored document, and it can only be built through
//! [`sanitize_base_name`], so every path the service writes is
//! `<dir>/<[a-zA-Z0-9._-]+>.<ext>`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Base name used when sanitisation leaves nothing behind.
pub const DEFAULT_BASE_NAME: &str = "upload";

/// Replacement for each disallowed character.
pub const PLACEHOLDER: &str = "_";

static RE_DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9._-]").unwrap());

/// A sanitised, extension-stripped document identifier.
///
/// Shared by a source document (`<base>.jsf`) and its artifact
/// (`<base>.pdf`); the pairing is purely by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseName(String);

impl BaseName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<base>.<ext>`
    pub fn file_name(&self, ext: &str) -> String {
        format!("{}.{}", self.0, ext)
    }
}

impl fmt::Display for BaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BaseName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Final path component of `raw`, treating both `/` and `\` as separators.
pub fn strip_directories(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw)
}

/// Split `name` at its last `.` into `(stem, extension)`.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) => (&name[..idx], Some(&name[idx + 1..])),
        None => (name, None),
    }
}

/// Lower-cased extension of the final path component, if any.
pub fn extension_of(raw: &str) -> Option<String> {
    split_extension(strip_directories(raw))
        .1
        .map(|ext| ext.to_ascii_lowercase())
}

/// Case-insensitive check that `name` ends in `.<ext>`.
pub fn has_extension(name: &str, ext: &str) -> bool {
    split_extension(strip_directories(name))
        .1
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Derive a [`BaseName`] from a client-supplied filename.
///
/// Directory components and the extension are dropped, every character
/// outside `[a-zA-Z0-9._-]` becomes [`PLACEHOLDER`], and an empty result
/// falls back to [`DEFAULT_BASE_NAME`].
pub fn sanitize_base_name(raw: &str) -> BaseName {
    let (stem, _) = split_extension(strip_directories(raw));
    let cleaned = RE_DISALLOWED.replace_all(stem, PLACEHOLDER);
    if cleaned.is_empty() {
        BaseName(DEFAULT_BASE_NAME.to_string())
    } else {
        BaseName(cleaned.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_allowed(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
    }

    #[test]
    fn plain_name_is_kept() {
        assert_eq!(sanitize_base_name("report.jsf").as_str(), "report");
        assert_eq!(sanitize_base_name("v1.2-final_draft.jsf").as_str(), "v1.2-final_draft");
    }

    #[test]
    fn disallowed_characters_are_replaced() {
        assert_eq!(sanitize_base_name("my report (1).jsf").as_str(), "my_report__1_");
        assert_eq!(sanitize_base_name("résumé.jsf").as_str(), "r_sum_");
    }

    #[test]
    fn directory_components_are_dropped() {
        assert_eq!(sanitize_base_name("../../etc/passwd.jsf").as_str(), "passwd");
        assert_eq!(sanitize_base_name("C:\\Users\\me\\doc.jsf").as_str(), "doc");
    }

    #[test]
    fn empty_result_uses_default() {
        assert_eq!(sanitize_base_name(".jsf").as_str(), DEFAULT_BASE_NAME);
        assert_eq!(sanitize_base_name("").as_str(), DEFAULT_BASE_NAME);
        assert_eq!(sanitize_base_name("dir/").as_str(), DEFAULT_BASE_NAME);
    }

    #[test]
    fn output_only_contains_allowed_characters() {
        let nasty = [
            "a b c.jsf",
            "../../../x.jsf",
            "..\\..\\win.jsf",
            "\0null\0.jsf",
            "tab\there.jsf",
            "quote\"s'.jsf",
            "emoji🎉.jsf",
            "semi;colon|pipe&amp.jsf",
            "%2e%2e%2fescape.jsf",
            "        .jsf",
            "日本語.jsf",
        ];
        for raw in nasty {
            let base = sanitize_base_name(raw);
            assert!(!base.as_str().is_empty(), "empty for {raw:?}");
            assert!(
                base.as_str().chars().all(is_allowed),
                "{raw:?} → {base:?} has disallowed chars"
            );
            assert!(!base.as_str().contains('/') && !base.as_str().contains('\\'));
        }
    }

    #[test]
    fn file_name_forces_extension() {
        let base = sanitize_base_name("report.JSF");
        assert_eq!(base.file_name("jsf"), "report.jsf");
        assert_eq!(base.file_name("pdf"), "report.pdf");
    }

    #[test]
    fn extension_checks_are_case_insensitive() {
        assert!(has_extension("report.jsf", "jsf"));
        assert!(has_extension("REPORT.JSF", "jsf"));
        assert!(has_extension("a/b/c.Pdf", "pdf"));
        assert!(!has_extension("report.txt", "jsf"));
        assert!(!has_extension("report", "jsf"));
        assert!(!has_extension("report.", "jsf"));
        assert!(!has_extension("jsf", "jsf"));
        assert_eq!(extension_of("x.TXT").as_deref(), Some("txt"));
        assert_eq!(extension_of("noext"), None);
    }

    #[test]
    fn strip_directories_takes_last_component() {
        assert_eq!(strip_directories("../../etc/passwd"), "passwd");
        assert_eq!(strip_directories("..\\..\\boot.ini"), "boot.ini");
        assert_eq!(strip_directories("plain.pdf"), "plain.pdf");
        assert_eq!(strip_directories("trailing/"), "");
    }
}

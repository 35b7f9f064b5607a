//! Entry name normalization for create/rename.

use crate::config::NotebookConfig;
use crate::error::{NotebookError, NotebookResult};
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;

// Separators, NUL/control chars and the characters Windows refuses.
static ILLEGAL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\<>:"|?*\x00-\x1F\x7F]"#).expect("valid name regex"));

/// Trims and validates one path segment supplied by the user.
pub fn normalize_entry_name(raw: &str) -> NotebookResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return Err(NotebookError::InvalidName(raw.to_string()));
    }
    if ILLEGAL_NAME_RE.is_match(trimmed) {
        return Err(NotebookError::InvalidName(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Resolves the file name for a new note.
///
/// - `None` yields a local timestamp name, `YYYYMMDDHHMMSS.<ext>`.
/// - Names without a recognized extension get the default one appended.
pub fn note_file_name(config: &NotebookConfig, raw: Option<&str>) -> NotebookResult<String> {
    let name = match raw {
        Some(raw) => normalize_entry_name(raw)?,
        None => Local::now().format("%Y%m%d%H%M%S").to_string(),
    };
    if config.is_note_name(&name) {
        return Ok(name);
    }
    Ok(format!("{name}.{}", config.default_note_extension))
}

#[cfg(test)]
mod tests {
    use super::{normalize_entry_name, note_file_name};
    use crate::config::NotebookConfig;
    use crate::error::NotebookError;

    #[test]
    fn rejects_blank_dots_and_separators() {
        for raw in ["", "   ", ".", "..", "a/b", "a\\b", "bad:name", "tab\tname", "nul\0"] {
            assert!(
                matches!(normalize_entry_name(raw), Err(NotebookError::InvalidName(_))),
                "expected `{raw:?}` to be rejected"
            );
        }
    }

    #[test]
    fn trims_valid_names() {
        assert_eq!(normalize_entry_name("  drafts ").unwrap(), "drafts");
        assert_eq!(normalize_entry_name(".hidden").unwrap(), ".hidden");
    }

    #[test]
    fn note_file_name_appends_default_extension() {
        let config = NotebookConfig::default();
        assert_eq!(note_file_name(&config, Some("x.txt")).unwrap(), "x.txt");
        assert_eq!(note_file_name(&config, Some("ideas")).unwrap(), "ideas.txt");
        assert_eq!(note_file_name(&config, Some("a.md")).unwrap(), "a.md.txt");
    }

    #[test]
    fn note_file_name_defaults_to_timestamp() {
        let name = note_file_name(&NotebookConfig::default(), None).unwrap();
        let stem = name.strip_suffix(".txt").expect("default extension");
        assert_eq!(stem.len(), 14);
        assert!(stem.chars().all(|c| c.is_ascii_digit()));
    }
}

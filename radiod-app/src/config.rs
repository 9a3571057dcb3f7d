// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Minimal INI-style config reader with directory-merge support.
//!
//! Config parsing/merging proper is a named interface, not a deeply
//! implemented subsystem: this covers exactly the grammar `radiod` needs
//! (`[section]` headers, `key = value` pairs, `#`/`;` comments) and the
//! directory-merge semantics (concatenate `*.conf` entries in lexicographic
//! order into one virtual file before parsing), matching the source's own
//! temp-file-concatenation approach without the temp file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use radiod_core::EngineError;

/// A parsed INI document: an ordered map from section name to an ordered
/// map of key/value pairs. `"global"` (no brackets before the first header)
/// is used as the implicit section name for any leading keys, though
/// `radiod`'s grammar always requires an explicit `[global]` header.
#[derive(Debug, Clone, Default)]
pub struct IniDocument {
    sections: Vec<(String, BTreeMap<String, String>)>,
}

impl IniDocument {
    /// Parse a single string as an INI document.
    pub fn parse(text: &str) -> Result<Self, EngineError> {
        let mut sections: Vec<(String, BTreeMap<String, String>)> = Vec::new();

        for (lineno, raw_line) in text.lines().enumerate() {
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }

            if let Some(stripped) = line.strip_prefix('[') {
                let name = stripped
                    .strip_suffix(']')
                    .ok_or_else(|| {
                        EngineError::Config(format!("line {}: malformed section header", lineno + 1))
                    })?
                    .trim()
                    .to_string();
                sections.push((name, BTreeMap::new()));
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(EngineError::Config(format!(
                    "line {}: expected `key = value`",
                    lineno + 1
                )));
            };
            let key = key.trim().to_string();
            let value = value.trim().to_string();

            let Some((_, map)) = sections.last_mut() else {
                return Err(EngineError::Config(format!(
                    "line {}: key outside of any section",
                    lineno + 1
                )));
            };
            map.insert(key, value);
        }

        Ok(Self { sections })
    }

    /// Load from a path: if it's a regular file, parse it directly; if it's
    /// a directory, concatenate every `*.conf` entry in lexicographic order
    /// into one virtual document before parsing.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
                .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("conf"))
                .collect();
            entries.sort();

            let mut combined = String::new();
            for entry in entries {
                let content = std::fs::read_to_string(&entry)
                    .map_err(|e| EngineError::Config(format!("{}: {}", entry.display(), e)))?;
                combined.push_str(&content);
                combined.push('\n');
            }
            Self::parse(&combined)
        } else {
            let content = std::fs::read_to_string(path)
                .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
            Self::parse(&content)
        }
    }

    /// Resolve a config path the way `radiod`'s CLI does: try the path as a
    /// file or directory directly, and if it doesn't exist, try `path` with
    /// a `.d` suffix as a directory.
    pub fn load_resolving(path: &Path) -> Result<Self, EngineError> {
        if path.exists() {
            return Self::load(path);
        }
        let mut with_suffix = path.as_os_str().to_owned();
        with_suffix.push(".d");
        let dir_path = PathBuf::from(with_suffix);
        if dir_path.exists() {
            return Self::load(&dir_path);
        }
        Err(EngineError::Config(format!(
            "no such config file or directory: {} (also tried {})",
            path.display(),
            dir_path.display()
        )))
    }

    pub fn section(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(n, _)| n.as_str())
    }
}

fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (idx, &b) in bytes.iter().enumerate() {
        if b == b'#' || b == b';' {
            return &line[..idx];
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_keys() {
        let doc = IniDocument::parse(
            "[global]\nblocktime = 20\n# comment\n[rx888]\ndevice = rx888\n",
        )
        .unwrap();
        assert_eq!(doc.section("global").unwrap().get("blocktime").unwrap(), "20");
        assert_eq!(doc.section("rx888").unwrap().get("device").unwrap(), "rx888");
    }

    #[test]
    fn rejects_key_before_any_section() {
        let err = IniDocument::parse("blocktime = 20\n");
        assert!(err.is_err());
    }

    #[test]
    fn semicolon_comments_are_stripped() {
        let doc = IniDocument::parse("[global]\nverbose = 1 ; start chatty\n").unwrap();
        assert_eq!(doc.section("global").unwrap().get("verbose").unwrap(), "1");
    }
}

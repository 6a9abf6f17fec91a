use crate::entry::FileEntry;
use crate::error::TidyError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-file rename options.
///
/// Fields apply in a fixed order: prefix, suffix, replace, insert, regex.
/// List fields apply in list order. The extension is never touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOptions {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub replace: Vec<(String, String)>,
    /// Character offsets into the stem. Negative offsets clamp to 0,
    /// offsets past the end append.
    pub insert: Vec<(String, i64)>,
    /// Each pattern replaces its first match only.
    pub regex: Vec<(String, String)>,
}

impl RenameOptions {
    pub fn is_empty(&self) -> bool {
        self.prefix.as_deref().unwrap_or_default().is_empty()
            && self.suffix.as_deref().unwrap_or_default().is_empty()
            && self.replace.is_empty()
            && self.insert.is_empty()
            && self.regex.is_empty()
    }
}

/// [`RenameOptions`] with every regex compiled up front.
#[derive(Debug, Clone)]
pub struct RenameRules {
    options: RenameOptions,
    regexes: Vec<(Regex, String)>,
}

impl RenameRules {
    pub fn compile(options: &RenameOptions) -> Result<Self, TidyError> {
        let regexes = options
            .regex
            .iter()
            .map(|(pattern, replacement)| -> Result<(Regex, String), TidyError> {
                Ok((compile_regex(pattern)?, replacement.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            options: options.clone(),
            regexes,
        })
    }

    pub fn apply(&self, path: &Path) -> String {
        let entry = FileEntry::from_path(path);
        let mut name = entry.stem;

        if let Some(prefix) = self.options.prefix.as_deref().filter(|v| !v.is_empty()) {
            name.insert_str(0, prefix);
        }
        if let Some(suffix) = self.options.suffix.as_deref().filter(|v| !v.is_empty()) {
            name.push_str(suffix);
        }
        for (from, to) in &self.options.replace {
            if from.is_empty() {
                continue;
            }
            name = name.replace(from.as_str(), to);
        }
        for (text, index) in &self.options.insert {
            name = insert_at(&name, text, *index);
        }
        for (regex, replacement) in &self.regexes {
            name = regex.replace(&name, replacement.as_str()).into_owned();
        }

        name + &entry.extension
    }
}

pub fn compute_new_name(path: &Path, options: &RenameOptions) -> Result<String, TidyError> {
    Ok(RenameRules::compile(options)?.apply(path))
}

pub(crate) fn compile_regex(pattern: &str) -> Result<Regex, TidyError> {
    Regex::new(pattern).map_err(|source| TidyError::RuleCompilation {
        pattern: pattern.to_string(),
        source,
    })
}

fn insert_at(value: &str, text: &str, index: i64) -> String {
    let offset = usize::try_from(index).unwrap_or(0);
    let split = value
        .char_indices()
        .nth(offset)
        .map(|(pos, _)| pos)
        .unwrap_or(value.len());

    let mut out = String::with_capacity(value.len() + text.len());
    out.push_str(&value[..split]);
    out.push_str(text);
    out.push_str(&value[split..]);
    out
}

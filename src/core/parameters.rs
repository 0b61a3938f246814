// src/core/parameters.rs

use crate::constants::{PLACEHOLDER_PREFIX, PLACEHOLDER_SUFFIX};
use lazy_static::lazy_static;
use log::{trace, warn};
use regex::Regex;
use std::{borrow::Cow, collections::BTreeMap};
use thiserror::Error;

lazy_static! {
    static ref VARIABLE_NAME_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap();
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VariableError {
    #[error("Invalid variable definition '{0}': expected the form name=value.")]
    MissingSeparator(String),
    #[error(
        "Invalid variable name '{name}' in '{definition}': names start with a letter or '_' \
         and contain only letters, digits, '_', '.' or '-'."
    )]
    InvalidName { name: String, definition: String },
}

/// Builds the placeholder text for a variable name, e.g. `Configuration` ->
/// `$(Configuration)`.
pub fn placeholder_for(name: &str) -> String {
    format!("{PLACEHOLDER_PREFIX}{name}{PLACEHOLDER_SUFFIX}")
}

/// Splits a `name=value` argument. Only the first `=` separates; the value may
/// be empty and may contain further `=` characters.
pub fn parse_variable(definition: &str) -> Result<(String, String), VariableError> {
    let (name, value) = definition
        .split_once('=')
        .ok_or_else(|| VariableError::MissingSeparator(definition.to_string()))?;
    let name = name.trim();
    if !VARIABLE_NAME_RE.is_match(name) {
        return Err(VariableError::InvalidName {
            name: name.to_string(),
            definition: definition.to_string(),
        });
    }
    Ok((name.to_string(), value.to_string()))
}

/// Placeholder -> replacement mapping, built once per run and read-only while
/// jobs execute.
#[derive(Debug, Clone, Default)]
pub struct ParameterTable {
    entries: BTreeMap<String, String>,
    /// Alternation of every placeholder, longest first. `None` when empty.
    matcher: Option<Regex>,
}

impl ParameterTable {
    /// Builds a table from `(name, value)` pairs. Later pairs win over earlier
    /// ones with the same name.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries: BTreeMap<String, String> = pairs
            .into_iter()
            .map(|(name, value)| (placeholder_for(name.as_ref()), value.into()))
            .collect();
        let matcher = Self::build_matcher(&entries);
        Self { entries, matcher }
    }

    /// Parses `name=value` definitions into a table.
    pub fn from_definitions<S: AsRef<str>>(definitions: &[S]) -> Result<Self, VariableError> {
        let pairs = definitions
            .iter()
            .map(|d| parse_variable(d.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_pairs(pairs))
    }

    /// Builds the run's table: configured variables first, command-line
    /// definitions layered on top.
    pub fn from_sources<S: AsRef<str>>(
        configured: &BTreeMap<String, String>,
        definitions: &[S],
    ) -> Result<Self, VariableError> {
        let mut pairs = Vec::with_capacity(configured.len() + definitions.len());
        for (name, value) in configured {
            if !VARIABLE_NAME_RE.is_match(name) {
                return Err(VariableError::InvalidName {
                    name: name.clone(),
                    definition: format!("{name}={value}"),
                });
            }
            pairs.push((name.clone(), value.clone()));
        }
        for definition in definitions {
            pairs.push(parse_variable(definition.as_ref())?);
        }
        Ok(Self::from_pairs(pairs))
    }

    fn build_matcher(entries: &BTreeMap<String, String>) -> Option<Regex> {
        if entries.is_empty() {
            return None;
        }
        let mut keys: Vec<&String> = entries.keys().collect();
        // Leftmost-first alternation: listing longer keys first makes the
        // longest placeholder win when several start at the same position.
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let pattern = keys
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        match Regex::new(&pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Could not build the placeholder matcher: {}", e);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Looks up the replacement for a placeholder (e.g. `$(Configuration)`).
    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.entries.get(placeholder).map(String::as_str)
    }

    /// Replaces every placeholder occurrence in `text` with its value.
    ///
    /// The scan is a single left-to-right pass: replacement values are never
    /// rescanned. When no placeholder occurs the input is returned borrowed.
    pub fn preprocess<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let Some(matcher) = &self.matcher else {
            return Cow::Borrowed(text);
        };
        if !self.entries.keys().any(|k| text.contains(k.as_str())) {
            return Cow::Borrowed(text);
        }

        let replaced = matcher.replace_all(text, |caps: &regex::Captures<'_>| {
            let key = caps.get(0).map_or("", |m| m.as_str());
            self.entries.get(key).cloned().unwrap_or_else(|| key.to_string())
        });
        trace!("Substituted placeholders ({} variable(s) in table)", self.len());
        replaced
    }
}

//! # Parameter specifications
//!
//! A specification names a parameter and, optionally, the index columns its
//! bracketed indices should become: `sigma`, `b[term]`, `r_condition[condition,term]`.
//! An empty slot (`r_condition[condition,]`) still takes a position in the
//! bracket but its values are discarded.
//!
//! ```
//! use tidy_draws::{ParamSpec, ParseOptions};
//!
//! let spec: ParamSpec = "r_condition[condition,term]".parse().expect("valid spec");
//! let binding = spec
//!     .bind("r_condition[A,Intercept]", &ParseOptions::default())
//!     .expect("arity matches")
//!     .expect("names match");
//!
//! assert_eq!(binding.get("condition"), Some("A"));
//! assert_eq!(binding.get("term"), Some("Intercept"));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::TidyError;

/// Default split between raw index values: commas or whitespace, runs collapsed.
pub const DEFAULT_INDEX_SEPARATOR: &str = r"[,\s]+";

static DEFAULT_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DEFAULT_INDEX_SEPARATOR).expect("default index separator is a valid pattern")
});

/// Options for matching raw parameter names.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Pattern splitting the bracketed part of a raw name into index values.
    pub index_separator: Regex,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            index_separator: DEFAULT_SEPARATOR.clone(),
        }
    }
}

impl ParseOptions {
    /// Use a custom separator pattern.
    ///
    /// # Errors
    ///
    /// Returns `TidyError::InvalidOptions` if the pattern does not compile or matches
    /// the empty string.
    pub fn with_separator(pattern: &str) -> Result<Self, TidyError> {
        let index_separator = Regex::new(pattern)
            .map_err(|err| TidyError::InvalidOptions(format!("index separator: {err}")))?;
        let options = Self { index_separator };
        options.validate()?;
        Ok(options)
    }

    /// # Errors
    ///
    /// Returns `TidyError::InvalidOptions` if the separator matches the empty string.
    pub fn validate(&self) -> Result<(), TidyError> {
        if self.index_separator.is_match("") {
            return Err(TidyError::InvalidOptions(format!(
                "index separator `{}` matches the empty string",
                self.index_separator.as_str()
            )));
        }
        Ok(())
    }
}

/// A parameter specification: base name, optional index slots, optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    base: String,
    slots: Option<Vec<String>>,
    alias: Option<String>,
}

/// Index values of one raw parameter name bound to the named slots of a specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBinding {
    pub raw_name: String,
    /// `(slot, value)` pairs in declared order; unnamed slots are omitted.
    pub indices: Vec<(String, String)>,
}

impl IndexBinding {
    #[must_use]
    pub fn get(&self, slot: &str) -> Option<&str> {
        self.indices
            .iter()
            .find(|(name, _)| name == slot)
            .map(|(_, value)| value.as_str())
    }
}

impl ParamSpec {
    /// Specification for a parameter without brackets.
    #[must_use]
    pub fn scalar(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            slots: None,
            alias: None,
        }
    }

    /// Specification with bracketed slots; an empty slot name discards that position.
    #[must_use]
    pub fn indexed<I, S>(base: impl Into<String>, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            base: base.into(),
            slots: Some(slots.into_iter().map(Into::into).collect()),
            alias: None,
        }
    }

    /// Name the value column produced by this specification.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Parse a specification string such as `b[term]`.
    ///
    /// # Errors
    ///
    /// Returns `TidyError::InvalidSpecification` for malformed strings.
    pub fn parse(text: &str) -> Result<Self, TidyError> {
        let invalid = |reason| TidyError::InvalidSpecification {
            spec: text.to_string(),
            reason,
        };
        let trimmed = text.trim();

        let Some(open) = trimmed.find('[') else {
            if trimmed.is_empty() {
                return Err(invalid("base name is empty"));
            }
            if trimmed.contains(']') {
                return Err(invalid("unbalanced bracket"));
            }
            return Ok(Self::scalar(trimmed));
        };

        let base = trimmed[..open].trim();
        if base.is_empty() {
            return Err(invalid("base name is empty"));
        }
        if base.contains(']') {
            return Err(invalid("unbalanced bracket"));
        }
        let Some(inner) = trimmed[open + 1..].strip_suffix(']') else {
            return Err(invalid("bracket must close at the end of the specification"));
        };
        if inner.contains(['[', ']']) {
            return Err(invalid("nested brackets are not supported"));
        }

        let slots: Vec<String> = inner.split(',').map(|slot| slot.trim().to_string()).collect();
        let mut seen = HashSet::new();
        for slot in slots.iter().filter(|slot| !slot.is_empty()) {
            if !slot
                .chars()
                .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '.')
            {
                return Err(invalid("slot names must be identifiers"));
            }
            if !seen.insert(slot.as_str()) {
                return Err(invalid("slot names must be unique"));
            }
        }

        Ok(Self::indexed(base, slots))
    }

    /// Parse several specification strings.
    ///
    /// # Errors
    ///
    /// Returns the first parse failure.
    pub fn parse_all<S: AsRef<str>>(texts: &[S]) -> Result<Vec<Self>, TidyError> {
        texts.iter().map(|text| Self::parse(text.as_ref())).collect()
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn slots(&self) -> Option<&[String]> {
        self.slots.as_deref()
    }

    /// Name of the value column: the alias if set, else the base name.
    #[must_use]
    pub fn column_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.base)
    }

    /// Named slots in declared order.
    pub fn index_columns(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|slot| !slot.is_empty())
    }

    /// Match a raw parameter name against this specification.
    ///
    /// Returns `Ok(None)` when base names or bracket presence differ.
    ///
    /// # Errors
    ///
    /// Returns `TidyError::EmptyIndexValue` when names match but an index value is
    /// empty (`b[1,,2]`, `b[1,2,]`), and `TidyError::IndexArityMismatch` when the
    /// number of index values differs from the number of declared slots.
    pub fn bind(
        &self,
        raw_name: &str,
        options: &ParseOptions,
    ) -> Result<Option<IndexBinding>, TidyError> {
        let (base, bracket) = split_raw_name(raw_name);
        if base != self.base {
            return Ok(None);
        }

        match (&self.slots, bracket) {
            (None, None) => Ok(Some(IndexBinding {
                raw_name: raw_name.to_string(),
                indices: Vec::new(),
            })),
            (Some(slots), Some(inner)) => {
                let values = split_indices(inner, &options.index_separator);
                if let Some(position) = values.iter().position(|value| value.is_empty()) {
                    return Err(TidyError::EmptyIndexValue {
                        name: raw_name.to_string(),
                        position: position + 1,
                    });
                }
                if values.len() != slots.len() {
                    return Err(TidyError::IndexArityMismatch {
                        spec: self.to_string(),
                        name: raw_name.to_string(),
                        expected: slots.len(),
                        found: values.len(),
                    });
                }
                let indices = slots
                    .iter()
                    .zip(values)
                    .filter(|(slot, _)| !slot.is_empty())
                    .map(|(slot, value)| (slot.clone(), value.to_string()))
                    .collect();
                Ok(Some(IndexBinding {
                    raw_name: raw_name.to_string(),
                    indices,
                }))
            }
            _ => Ok(None),
        }
    }
}

impl FromStr for ParamSpec {
    type Err = TidyError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl fmt::Display for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if let Some(slots) = &self.slots {
            write!(f, "[{}]", slots.join(","))?;
        }
        Ok(())
    }
}

/// Split `name[i,j]` into `("name", Some("i,j"))`; names without a closed bracket have no indices.
fn split_raw_name(raw_name: &str) -> (&str, Option<&str>) {
    if let Some(stripped) = raw_name.strip_suffix(']')
        && let Some(open) = stripped.find('[')
    {
        return (&stripped[..open], Some(&stripped[open + 1..]));
    }
    (raw_name, None)
}

fn split_indices<'a>(inner: &'a str, separator: &Regex) -> Vec<&'a str> {
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    separator.split(trimmed).collect()
}

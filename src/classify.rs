//! Semantic role classification of dataset keys.
//!
//! Every role owns an ordered list of regular expressions. A key belongs to a
//! role when it matches one of the patterns over its whole length; the index of
//! the first matching pattern is kept because segmentation keys are paired with
//! their legend key by position in the lists, not by name.

use std::fmt;

use regex::Regex;

use crate::config::KeyLists;
use crate::error::{Error, Result};

#[allow(unused_imports)]
use log::{debug, trace};

/// What a dataset key holds, as far as rendering is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Rgb,
    Flow,
    Segmap,
    SegColormap,
    Depth,
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Rgb => "rgb",
            Role::Flow => "flow",
            Role::Segmap => "segmap",
            Role::SegColormap => "segcolormap",
            Role::Depth => "depth",
            Role::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered, compiled list of full-match key patterns.
#[derive(Debug, Clone)]
pub struct KeyPatterns {
    sources: Vec<String>,
    compiled: Vec<Regex>,
}

impl KeyPatterns {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut sources = Vec::with_capacity(patterns.len());
        let mut compiled = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            let pattern = pattern.as_ref();
            // Anchor on both ends so that a pattern never matches a substring of the key
            let anchored = format!(r"\A(?:{pattern})\z");
            let regex = Regex::new(&anchored).map_err(|source| Error::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
            sources.push(pattern.to_string());
            compiled.push(regex);
        }

        Ok(Self { sources, compiled })
    }

    /// Index of the first pattern matching the whole key.
    pub fn first_match(&self, key: &str) -> Option<usize> {
        self.compiled.iter().position(|regex| regex.is_match(key))
    }

    pub fn matches(&self, key: &str) -> bool {
        self.first_match(key).is_some()
    }

    /// The pattern text at `index`, as it was configured.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.sources.get(index).map(String::as_str)
    }
}

/// Returns the index of the first pattern in `patterns` that matches all of `key`.
///
/// Compiles the patterns on every call; hold on to a [`KeyPatterns`] when
/// matching many keys.
#[cfg(test)]
pub fn key_matches<S: AsRef<str>>(key: &str, patterns: &[S]) -> Result<Option<usize>> {
    Ok(KeyPatterns::new(patterns)?.first_match(key))
}

/// The five role pattern lists, compiled once per run.
#[derive(Debug, Clone)]
pub struct KeyClassifier {
    rgb: KeyPatterns,
    flow: KeyPatterns,
    segmap: KeyPatterns,
    segcolormap: KeyPatterns,
    depth: KeyPatterns,
}

impl KeyClassifier {
    pub fn new(lists: &KeyLists) -> Result<Self> {
        Ok(Self {
            rgb: KeyPatterns::new(&lists.rgb)?,
            flow: KeyPatterns::new(&lists.flow)?,
            segmap: KeyPatterns::new(&lists.segmap)?,
            segcolormap: KeyPatterns::new(&lists.segcolormap)?,
            depth: KeyPatterns::new(&lists.depth)?,
        })
    }

    /// Assigns a role to `key`.
    ///
    /// Roles are tried in rendering priority: flow, segmap, depth, rgb. Legend
    /// keys come last since they are only read on behalf of a segmap key.
    pub fn classify(&self, key: &str) -> Role {
        let role = if self.flow.matches(key) {
            Role::Flow
        } else if self.segmap.matches(key) {
            Role::Segmap
        } else if self.depth.matches(key) {
            Role::Depth
        } else if self.rgb.matches(key) {
            Role::Rgb
        } else if self.segcolormap.matches(key) {
            Role::SegColormap
        } else {
            Role::Unknown
        };
        trace!("Classified `{}` as {}", key, role);
        role
    }

    /// The pattern list of `role`; unknown keys have none.
    #[cfg(test)]
    pub fn patterns(&self, role: Role) -> Option<&KeyPatterns> {
        match role {
            Role::Rgb => Some(&self.rgb),
            Role::Flow => Some(&self.flow),
            Role::Segmap => Some(&self.segmap),
            Role::SegColormap => Some(&self.segcolormap),
            Role::Depth => Some(&self.depth),
            Role::Unknown => None,
        }
    }

    /// Name of the legend dataset paired with a segmentation key.
    ///
    /// The legend entry sits at the same index in the segcolormap list as the
    /// pattern that matched `segmap_key` in the segmap list.
    pub fn legend_key_for(&self, segmap_key: &str) -> Option<&str> {
        let index = self.segmap.first_match(segmap_key)?;
        let legend_key = self.segcolormap.get(index);
        if legend_key.is_none() {
            debug!("No legend key configured at index {} for `{}`", index, segmap_key);
        }
        legend_key
    }
}

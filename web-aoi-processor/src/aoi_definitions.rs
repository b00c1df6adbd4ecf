//! AOI definition files
//!
//! The browser relay locates AOIs on each page with a locator chain per AOI
//! name, stored as JSON:
//!
//! ```json
//! {
//!   "https://example.com/": {
//!     "banner": [
//!       { "type": "role", "args": { "role": "banner" } },
//!       { "type": "text", "args": { "text(re)": "^Welcome" }, "next": { "type": "first" } }
//!     ]
//!   }
//! }
//! ```
//!
//! Argument keys ending in `(re)` hold regular expressions rather than
//! literal text. The processor itself never evaluates locators; this module
//! validates and exposes the definitions for tooling.

use crate::types::{Result, WebAoiError};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

const REGEX_SUFFIX: &str = "(re)";

/// Lookup strategy or structural operation of a locator step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorKind {
    AltText,
    Label,
    Placeholder,
    Role,
    TestId,
    Text,
    Title,
    Locator,
    Filter,
    Nth,
    First,
    Last,
    Unknown(String),
}

impl LocatorKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "alt_text" => LocatorKind::AltText,
            "label" => LocatorKind::Label,
            "placeholder" => LocatorKind::Placeholder,
            "role" => LocatorKind::Role,
            "test_id" => LocatorKind::TestId,
            "text" => LocatorKind::Text,
            "title" => LocatorKind::Title,
            "locator" => LocatorKind::Locator,
            "filter" => LocatorKind::Filter,
            "nth" => LocatorKind::Nth,
            "first" => LocatorKind::First,
            "last" => LocatorKind::Last,
            other => LocatorKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LocatorKind::AltText => "alt_text",
            LocatorKind::Label => "label",
            LocatorKind::Placeholder => "placeholder",
            LocatorKind::Role => "role",
            LocatorKind::TestId => "test_id",
            LocatorKind::Text => "text",
            LocatorKind::Title => "title",
            LocatorKind::Locator => "locator",
            LocatorKind::Filter => "filter",
            LocatorKind::Nth => "nth",
            LocatorKind::First => "first",
            LocatorKind::Last => "last",
            LocatorKind::Unknown(name) => name,
        }
    }
}

impl fmt::Display for LocatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Argument of a locator step
#[derive(Debug, Clone)]
pub enum LocatorArg {
    /// Literal JSON value (text, number, boolean)
    Value(serde_json::Value),
    /// Compiled regular expression from a `(re)` key
    Pattern(Regex),
}

impl PartialEq for LocatorArg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LocatorArg::Value(a), LocatorArg::Value(b)) => a == b,
            (LocatorArg::Pattern(a), LocatorArg::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// One step of a locator chain
#[derive(Debug, Clone, PartialEq)]
pub struct LocatorStep {
    pub kind: LocatorKind,
    /// Arguments keyed by name, `(re)` suffix removed
    pub args: BTreeMap<String, LocatorArg>,
    pub next: Option<Box<LocatorStep>>,
}

impl LocatorStep {
    /// This step followed by every step linked through `next`
    pub fn chain(&self) -> Vec<&LocatorStep> {
        let mut steps = vec![self];
        let mut current = self;
        while let Some(next) = current.next.as_deref() {
            steps.push(next);
            current = next;
        }
        steps
    }

    fn from_raw(raw: RawStep, context: &str) -> Result<Self> {
        let kind = LocatorKind::from_name(&raw.kind);
        if let LocatorKind::Unknown(name) = &kind {
            log::warn!("Unrecognized locator type '{}' in {}", name, context);
        }

        let mut args = BTreeMap::new();
        for (key, value) in raw.args {
            match key.strip_suffix(REGEX_SUFFIX) {
                Some(name) => {
                    let pattern = value.as_str().ok_or_else(|| {
                        WebAoiError::AoiDefinitionError(format!(
                            "{}: argument '{}' must be a string",
                            context, key
                        ))
                    })?;
                    let regex = Regex::new(pattern).map_err(|e| {
                        WebAoiError::AoiDefinitionError(format!(
                            "{}: invalid pattern for '{}': {}",
                            context, key, e
                        ))
                    })?;
                    args.insert(name.to_string(), LocatorArg::Pattern(regex));
                }
                None => {
                    args.insert(key, LocatorArg::Value(value));
                }
            }
        }

        let next = match raw.next {
            Some(next) => Some(Box::new(Self::from_raw(*next, context)?)),
            None => None,
        };

        Ok(Self { kind, args, next })
    }
}

#[derive(Deserialize)]
struct RawStep {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    args: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    next: Option<Box<RawStep>>,
}

type RawDefinitions = BTreeMap<String, BTreeMap<String, Vec<RawStep>>>;

/// AOI locator chains by page URL and AOI name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AoiDefinitions {
    pages: BTreeMap<String, BTreeMap<String, Vec<LocatorStep>>>,
}

impl AoiDefinitions {
    pub fn from_file(path: &Path) -> Result<Self> {
        log::info!("Loading AOI definitions: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawDefinitions = serde_json::from_str(json)
            .map_err(|e| WebAoiError::AoiDefinitionError(format!("Invalid JSON: {}", e)))?;

        let mut pages = BTreeMap::new();
        for (url, aois) in raw {
            let mut chains = BTreeMap::new();
            for (aoi_name, steps) in aois {
                let context = format!("AOI '{}' on {}", aoi_name, url);
                let steps = steps
                    .into_iter()
                    .map(|step| LocatorStep::from_raw(step, &context))
                    .collect::<Result<Vec<_>>>()?;
                chains.insert(aoi_name, steps);
            }
            pages.insert(url, chains);
        }

        Ok(Self { pages })
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// Locator chains of every AOI defined for `url`
    pub fn aois_for(&self, url: &str) -> Option<&BTreeMap<String, Vec<LocatorStep>>> {
        self.pages.get(url)
    }

    pub fn aoi_count(&self) -> usize {
        self.pages.values().map(BTreeMap::len).sum()
    }

    /// Locator type names that are not recognized, in definition order
    pub fn unknown_kinds(&self) -> Vec<String> {
        self.pages
            .values()
            .flat_map(BTreeMap::values)
            .flatten()
            .flat_map(LocatorStep::chain)
            .filter_map(|step| match &step.kind {
                LocatorKind::Unknown(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

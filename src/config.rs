use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::GlslError;

/// A GLSL language version, as named by a `#version` directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlslVersion {
    pub number: u32,
    pub es: bool,
}

impl GlslVersion {
    pub const LATEST: GlslVersion = GlslVersion::desktop(460);

    pub const fn desktop(number: u32) -> Self {
        GlslVersion { number, es: false }
    }

    pub const fn es(number: u32) -> Self {
        GlslVersion { number, es: true }
    }

    /// Desktop version offering roughly the same builtins; used to filter the builtin tables.
    pub fn desktop_equivalent(&self) -> u32 {
        if !self.es {
            return self.number;
        }
        match self.number {
            0..=100 => 120,
            101..=300 => 330,
            301..=310 => 430,
            _ => 450,
        }
    }
}

impl Default for GlslVersion {
    fn default() -> Self {
        GlslVersion::LATEST
    }
}

impl fmt::Display for GlslVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.es {
            write!(f, "{} es", self.number)
        } else {
            write!(f, "{}", self.number)
        }
    }
}

impl FromStr for GlslVersion {
    type Err = GlslError;

    /// Accepts the argument of a `#version` directive: `"450"`, `"330 core"`, `"300 es"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lazy_static! {
            static ref VERSION_RE: Regex =
                Regex::new(r"^\s*(\d{3})\s*(core|compatibility|es)?\s*$").unwrap();
        }

        let captures = VERSION_RE
            .captures(s)
            .ok_or_else(|| GlslError::InvalidVersion(s.to_string()))?;
        let number = captures[1]
            .parse()
            .map_err(|_| GlslError::InvalidVersion(s.to_string()))?;
        let es = captures.get(2).map_or(false, |m| m.as_str() == "es");

        Ok(GlslVersion { number, es })
    }
}

/// Knobs for parsing, include crawling and completion.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Language version used to select builtins
    pub version: GlslVersion,

    /// Deepest syntactic nesting the parser descends into before giving up on a construct
    pub max_nesting: usize,

    /// Longest include chain followed by the crawler
    pub max_include_depth: usize,

    /// Narrow non-function completion categories by case-insensitive prefix
    pub narrow_by_prefix: bool,

    /// Insert the closing `)` together with the opening one for constructor completions
    pub auto_close_parens: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: GlslVersion::default(),
            max_nesting: 1000,
            max_include_depth: 64,
            narrow_by_prefix: true,
            auto_close_parens: true,
        }
    }
}

impl Config {
    pub fn with_version(mut self, version: GlslVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    pub fn with_max_include_depth(mut self, max_include_depth: usize) -> Self {
        self.max_include_depth = max_include_depth;
        self
    }

    pub fn with_prefix_narrowing(mut self, narrow_by_prefix: bool) -> Self {
        self.narrow_by_prefix = narrow_by_prefix;
        self
    }

    pub fn with_auto_close_parens(mut self, auto_close_parens: bool) -> Self {
        self.auto_close_parens = auto_close_parens;
        self
    }
}

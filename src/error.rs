use crate::include_provider::FileId;
use crate::syntax::Span;

pub type BoxedIncludeProviderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned from fallible API calls. Problems found in shader source are
/// never reported this way; those become [`Diagnostic`]s.
#[derive(Debug, thiserror::Error)]
pub enum GlslError {
    /// A `#version`-style string could not be understood
    #[error("invalid GLSL version {0:?}")]
    InvalidVersion(String),

    /// Any error reported by an `IncludeProvider` while reading a file
    #[error("include provider error: \"{cause:?}\" when trying to read {file:?}")]
    IncludeProviderError {
        file: String,
        cause: BoxedIncludeProviderError,
    },
}

#[derive(Debug, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DiagnosticKind {
    /// Malformed source; the parser recovered and carried on
    #[error("{message}")]
    SyntaxError { message: String },

    /// Include argument without a matching `""` or `<>` pair
    #[error("invalid include path {path:?}")]
    InvalidIncludePath { path: String },

    /// Well-formed include path which no search path could satisfy
    #[error("cannot resolve include {path:?}")]
    UnresolvedInclude { path: String },

    /// Recursively included file, along with the file which triggered it
    #[error("file {file:?} is recursively included; triggered in {from:?}")]
    IncludeCycle { file: String, from: String },

    /// Include chain deeper than the configured limit
    #[error("include of {file:?} exceeds the maximum depth of {depth}")]
    IncludeDepthExceeded { file: String, depth: usize },

    /// Any error reported by the user-supplied `IncludeProvider`
    #[error("include provider error: \"{cause}\" when trying to include {file:?}")]
    IncludeProviderError { file: String, cause: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Severity {
    Error,
    Warning,
}

/// A problem attached to a source location. Nothing reported as a diagnostic
/// stops a parse, a crawl or a completion query.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    /// File the problem was found in; `None` for a bare `parse` call
    pub file: Option<FileId>,
    pub span: Span,

    /// 1-based line of `span.start`
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(span: Span, line: usize, kind: DiagnosticKind) -> Self {
        Diagnostic {
            file: None,
            span,
            line,
            kind,
        }
    }

    pub fn in_file(mut self, file: &FileId) -> Self {
        self.file = Some(file.clone());
        self
    }

    pub fn severity(&self) -> Severity {
        match self.kind {
            DiagnosticKind::SyntaxError { .. } => Severity::Error,
            _ => Severity::Warning,
        }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}({}): {}", file, self.line, self.kind),
            None => write!(f, "({}): {}", self.line, self.kind),
        }
    }
}

//! **glsl-scope** is a GLSL source analyzer aimed at editor tooling: syntax highlighting,
//! include navigation and code completion.
//!
//! Source text is parsed into a lossless syntax tree: every byte of the input, comments
//! and malformed code included, belongs to exactly one token, so the tree prints back to
//! the input text. Problems are reported as [`Diagnostic`]s and never stop a parse.
//!
//! Includes are followed through a user-supplied [`IncludeProvider`], which enables
//! custom virtual file systems and include paths. The resulting [`IncludeGraph`] can be
//! shared between threads and re-crawled as files change.
//!
//! # Example
//!
//! ```rust
//! use glsl_scope::{Analyzer, Config};
//!
//! let analyzer = Analyzer::new(Config::default());
//!
//! let source = "uniform float radius;\nvoid main() { float r = rad }";
//! let candidates = analyzer.complete_at(source, source.len() - 2);
//!
//! assert_eq!(candidates[0].insert_text, "radius");
//! assert!(candidates.iter().any(|c| c.insert_text == "radians"));
//! ```

use std::sync::Arc;

pub mod builtins;
pub mod completion;
mod config;
mod error;
mod graph;
mod include;
mod include_provider;
pub mod lexer;
mod parser;
pub mod scope;
pub mod syntax;
pub mod token;

pub use builtins::BuiltinDatabase;
pub use completion::{
    apply, complete, CandidateCategory, CompletionCandidate, ContextKind, CursorContext, Edit,
    InsertBehavior,
};
pub use config::{Config, GlslVersion};
pub use error::{BoxedIncludeProviderError, Diagnostic, DiagnosticKind, GlslError, Severity};
pub use graph::{IncludeEdge, IncludeGraph, IncludeReport};
pub use include::{is_valid_include_path, resolve, search_order, IncludeDirective, IncludeKind};
pub use include_provider::{FileId, FsIncludeProvider, IncludeProvider};
pub use parser::{parse_with_config, Parse};
pub use syntax::{Span, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxTree};
pub use token::TokenClass;

/// Parse `source` with the default configuration.
pub fn parse(source: &str) -> (SyntaxTree, Vec<Diagnostic>) {
    parse_with_config(source, &Config::default()).into_parts()
}

/// Parsing and completion against one builtin database.
///
/// Cheap to clone; the database is shared.
#[derive(Clone)]
pub struct Analyzer {
    builtins: Arc<BuiltinDatabase>,
    config: Config,
}

impl Analyzer {
    pub fn new(config: Config) -> Self {
        let builtins = Arc::new(BuiltinDatabase::new(config.version));
        Analyzer { builtins, config }
    }

    /// Use an existing database, e.g. one shared with other analyzers.
    pub fn with_builtins(config: Config, builtins: Arc<BuiltinDatabase>) -> Self {
        Analyzer { builtins, config }
    }

    pub fn builtins(&self) -> &Arc<BuiltinDatabase> {
        &self.builtins
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn parse(&self, source: &str) -> Parse {
        parse_with_config(source, &self.config)
    }

    /// Parse a file read through `provider`; diagnostics are attributed to `file`.
    pub fn parse_file(
        &self,
        provider: &dyn IncludeProvider,
        file: &FileId,
    ) -> Result<Parse, GlslError> {
        let source = provider
            .read_file(file)
            .map_err(|cause| GlslError::IncludeProviderError {
                file: file.to_string(),
                cause,
            })?;

        let mut parse = self.parse(&source);
        for diagnostic in &mut parse.diagnostics {
            diagnostic.file = Some(file.clone());
        }
        Ok(parse)
    }

    pub fn complete(&self, ctx: &CursorContext) -> Vec<CompletionCandidate> {
        complete(ctx, &self.builtins, &self.config)
    }

    /// Parse `source` and complete at byte `offset`.
    pub fn complete_at(&self, source: &str, offset: usize) -> Vec<CompletionCandidate> {
        let tree = self.parse(source).tree;
        self.complete(&CursorContext::at(&tree, offset))
    }

    /// A graph crawling with this analyzer's configuration.
    pub fn include_graph(&self) -> IncludeGraph {
        IncludeGraph::new(self.config.clone())
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::new(Config::default())
    }
}

#[cfg(test)]
mod tests;

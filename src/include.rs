use std::path::{Path, PathBuf};

use crate::include_provider::FileId;
use crate::syntax::{Span, SyntaxKind, SyntaxNode};
use crate::token::TokenClass;

/// How the path of an include directive was delimited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IncludeKind {
    /// `#include "path"`
    Quoted,
    /// `#include <path>`
    Angled,
    /// Neither; the directive names no resolvable file.
    Invalid,
}

/// Argument of an `#include` directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncludeDirective {
    /// Path text as written, delimiters included
    pub raw: String,
    pub kind: IncludeKind,

    /// Span of the raw path text (or of the directive itself when the path is missing)
    pub span: Span,

    /// 1-based line of the directive
    pub line: usize,
}

/// True if `include_path` is delimited by a matching `""` or `<>` pair around at least one char.
pub fn is_valid_include_path(include_path: &str) -> bool {
    let mut chars = include_path.chars();
    if include_path.chars().count() < 3 {
        return false;
    }
    match (chars.next(), chars.next_back()) {
        (Some('"'), Some('"')) | (Some('<'), Some('>')) => true,
        _ => false,
    }
}

impl IncludeDirective {
    /// Validate include argument text; no escape processing is done on the path.
    pub fn parse(raw: &str) -> Self {
        let kind = if !is_valid_include_path(raw) {
            IncludeKind::Invalid
        } else if raw.starts_with('"') {
            IncludeKind::Quoted
        } else {
            IncludeKind::Angled
        };

        IncludeDirective {
            raw: raw.to_string(),
            kind,
            span: Span::new(0, raw.len()),
            line: 1,
        }
    }

    pub(crate) fn from_node(node: &SyntaxNode) -> Self {
        debug_assert_eq!(node.kind, SyntaxKind::IncludeDirective);

        let tokens = node.significant_tokens();
        let line = tokens.first().map_or(1, |t| t.line);
        let argument = tokens
            .iter()
            .skip(1)
            .find(|t| t.class != TokenClass::Directive);

        match argument {
            Some(token) => IncludeDirective {
                span: token.span,
                line,
                ..IncludeDirective::parse(&token.text)
            },
            None => IncludeDirective {
                span: node.span,
                line,
                ..IncludeDirective::parse("")
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        self.kind != IncludeKind::Invalid
    }

    /// Logical path between the delimiters, taken verbatim.
    pub fn path(&self) -> Option<&str> {
        if self.is_valid() {
            let first = self.raw.chars().next().map_or(0, char::len_utf8);
            let last = self.raw.chars().next_back().map_or(0, char::len_utf8);
            Some(&self.raw[first..self.raw.len() - last])
        } else {
            None
        }
    }
}

/// Try every search path in order; the first directory containing the path wins.
pub fn resolve<P>(
    directive: &IncludeDirective,
    search_paths: &[P],
    file_exists: impl Fn(&Path, &str) -> bool,
) -> Option<FileId>
where
    P: AsRef<Path>,
{
    let path = directive.path()?;
    search_paths
        .iter()
        .map(AsRef::as_ref)
        .find(|dir| file_exists(dir, path))
        .map(|dir| FileId(dir.join(path)))
}

/// Search order for a directive found in `includer`: quoted includes look next to the
/// including file first.
pub fn search_order(
    directive: &IncludeDirective,
    includer: &FileId,
    search_paths: Vec<PathBuf>,
) -> Vec<PathBuf> {
    match (directive.kind, includer.dir()) {
        (IncludeKind::Quoted, Some(dir)) => {
            let mut order = Vec::with_capacity(search_paths.len() + 1);
            order.push(dir.to_path_buf());
            order.extend(search_paths.into_iter().filter(|p| p.as_path() != dir));
            order
        }
        _ => search_paths,
    }
}

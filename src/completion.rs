//! Completion queries.
//!
//! [`CursorContext::at`] looks at the tree around the cursor and decides what kind of
//! name may be typed there. [`complete`] turns that context into candidates, and
//! [`apply`] describes the edit a host would make when one is accepted.

use crate::builtins::BuiltinDatabase;
use crate::config::Config;
use crate::lexer::{self, Token};
use crate::scope::{self, Symbol, SymbolKind};
use crate::syntax::{Span, SyntaxKind, SyntaxNode, SyntaxTree};
use crate::token::{self, TokenClass};

/// What may be typed at the cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContextKind {
    /// Name of a preprocessor directive after `#`
    DirectiveName,
    /// One of a fixed keyword list, e.g. inside `layout(...)`
    Keywords(&'static [&'static str]),
    Type,
    /// Start of a statement in a function body
    Statement,
    Expression,
    /// After `.`; fields and swizzles need type information, so nothing is offered
    Member,
    /// Comments, include paths, literals
    None,
}

#[derive(Clone, Debug)]
pub struct CursorContext {
    pub kind: ContextKind,

    /// Part of the word under the cursor typed so far
    pub prefix: String,

    /// Span replaced by an accepted candidate
    pub range: Span,

    pub offset: usize,

    /// Names visible at the cursor, innermost first
    pub symbols: Vec<Symbol>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CandidateCategory {
    Directive,
    Keyword,
    BuiltinType,
    BuiltinFunction,
    Constructor,
    Variable,
    Function,
    Struct,
    Macro,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InsertBehavior {
    Plain,
    /// Replace the whole token under the cursor and append a space
    ReplaceTokenWithTrailingSpace,
    /// Append `(` and leave the caret inside, optionally closing with `)`
    OpenParameterList { close: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompletionCandidate {
    pub display: String,
    pub insert_text: String,

    /// Type annotation: declared type, or return type for functions
    pub detail: Option<String>,

    pub category: CandidateCategory,
    pub insert_behavior: InsertBehavior,
}

impl CompletionCandidate {
    fn plain(name: &str, category: CandidateCategory) -> Self {
        CompletionCandidate {
            display: name.to_string(),
            insert_text: name.to_string(),
            detail: None,
            category,
            insert_behavior: InsertBehavior::Plain,
        }
    }
}

/// Replacement of `range` by `text`, leaving the caret at `caret` in the edited document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit {
    pub range: Span,
    pub text: String,
    pub caret: usize,
}

fn is_word(token: &Token) -> bool {
    match token.class {
        TokenClass::Identifier | TokenClass::Keyword | TokenClass::BuiltinType => true,
        // `true` and `false`
        TokenClass::Literal => token.text.starts_with(|c: char| c.is_ascii_alphabetic()),
        _ => false,
    }
}

/// True unless the cursor sits right after the token closing `node`.
fn encloses(node: &SyntaxNode, anchor: usize) -> bool {
    if anchor < node.span.end {
        return true;
    }
    let closer = match node.kind {
        SyntaxKind::CompoundStatement | SyntaxKind::StructSpecifier => "}",
        SyntaxKind::ParameterList => ")",
        SyntaxKind::InterfaceBlock => ";",
        _ => return true,
    };
    node.child_tokens()
        .filter(|t| !t.is_trivia())
        .last()
        .map_or(true, |t| t.text != closer)
}

/// Index of the `(` matching the `)` at `close`.
fn matching_open(before: &[&Token], close: usize) -> Option<usize> {
    let mut depth = 0usize;
    for i in (0..=close).rev() {
        match before[i].text.as_str() {
            ")" => depth += 1,
            "(" => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Index of an unclosed `(` between the enclosing brace and the cursor.
fn unclosed_paren(before: &[&Token]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, t) in before.iter().enumerate().rev() {
        match t.text.as_str() {
            ")" => depth += 1,
            "(" if depth == 0 => return Some(i),
            "(" => depth -= 1,
            "{" | "}" => return None,
            _ => {}
        }
    }
    None
}

/// True if the last token is a `)` whose group follows one of `keywords`.
fn keyword_before_parens(before: &[&Token], keywords: &[&str]) -> bool {
    let close = match before.len().checked_sub(1) {
        Some(close) => close,
        None => return false,
    };
    match matching_open(before, close) {
        Some(open) if open > 0 => keywords.contains(&before[open - 1].text.as_str()),
        _ => false,
    }
}

fn at_statement_start(before: &[&Token]) -> bool {
    let prev = match before.last() {
        Some(prev) => prev,
        None => return true,
    };
    match prev.text.as_str() {
        // `;` also separates the clauses of a `for` header
        "{" | "}" | ";" => unclosed_paren(before).is_none(),
        ")" => keyword_before_parens(before, &["if", "for", "while"]),
        "else" | "do" => true,
        ":" => {
            for t in before.iter().rev().skip(1) {
                match t.text.as_str() {
                    "case" | "default" => return true,
                    "?" | ";" | "{" | "}" => return false,
                    _ => {}
                }
            }
            false
        }
        _ => false,
    }
}

/// Directive on the cursor's line, if the cursor is past its `#`. `directives` are in
/// source order.
fn directive_at<'t>(
    directives: &[&'t SyntaxNode],
    tokens: &[&Token],
    offset: usize,
) -> Option<&'t SyntaxNode> {
    let line_start = tokens
        .iter()
        .take_while(|t| t.span.start < offset)
        .filter(|t| t.is_newline())
        .last()
        .map(|t| t.span.start);

    directives
        .iter()
        .rev()
        .find(|n| n.span.start < offset)
        .filter(|n| line_start.map_or(true, |start| n.span.start > start))
        .copied()
}

impl CursorContext {
    /// Derive the completion context at byte `offset` of the parsed source.
    pub fn at(tree: &SyntaxTree, offset: usize) -> Self {
        let mut ctx = CursorContext {
            kind: ContextKind::Expression,
            prefix: String::new(),
            range: Span::new(offset, offset),
            offset,
            symbols: Vec::new(),
        };

        let tokens = tree.tokens();
        let under = tokens
            .iter()
            .find(|t| t.span.start < offset && offset <= t.span.end)
            .copied();

        if let Some(token) = under {
            let typed = token
                .text
                .get(..offset - token.span.start)
                .unwrap_or(&token.text);
            match token.class {
                TokenClass::Comment if token.text.starts_with("//") || offset < token.span.end => {
                    ctx.kind = ContextKind::None;
                    return ctx;
                }
                TokenClass::Directive => {
                    let name_len = token
                        .text
                        .chars()
                        .rev()
                        .take_while(|c| token::is_ident_char(*c))
                        .count();
                    ctx.kind = ContextKind::DirectiveName;
                    ctx.prefix = lexer::directive_name(typed);
                    ctx.range = Span::new(token.span.end - name_len, token.span.end);
                    return ctx;
                }
                _ if is_word(token) => {
                    ctx.prefix = typed.to_string();
                    ctx.range = token.span;
                }
                TokenClass::Literal => {
                    ctx.kind = ContextKind::None;
                    return ctx;
                }
                _ => {}
            }
        }

        let mut directives: Vec<&SyntaxNode> = tree
            .descendants()
            .into_iter()
            .filter(|n| n.kind.is_directive())
            .collect();
        directives.sort_by_key(|n| n.span.start);

        let current_directive = directive_at(&directives, &tokens, offset);
        if let Some(directive) = current_directive {
            if !matches!(
                directive.kind,
                SyntaxKind::DefineDirective | SyntaxKind::ConditionalDirective
            ) {
                ctx.kind = ContextKind::None;
                return ctx;
            }
        }

        // Other directive lines are transparent
        let current_span = current_directive.map(|d| d.span);
        let mut skipped = directives
            .iter()
            .map(|n| n.span)
            .filter(|span| Some(*span) != current_span)
            .peekable();
        let word_start = ctx.range.start;
        let before: Vec<&Token> = tokens
            .iter()
            .copied()
            .filter(|t| !t.is_trivia() && t.span.end <= word_start)
            .filter(|t| {
                while skipped.peek().map_or(false, |d| d.end <= t.span.start) {
                    skipped.next();
                }
                skipped
                    .peek()
                    .map_or(true, |d| !(d.start <= t.span.start && t.span.end <= d.end))
            })
            .collect();

        // Unterminated constructs end at their last token, so look up structure from there
        let anchor = if ctx.range.is_empty() {
            before.last().map_or(offset, |t| t.span.end)
        } else {
            offset
        };
        let path = tree.path_to(anchor);

        ctx.symbols = scope::visible_symbols(tree, offset);
        ctx.kind = classify(&before, &path, anchor);
        ctx
    }
}

fn classify(before: &[&Token], path: &[&SyntaxNode], anchor: usize) -> ContextKind {
    let prev = before.last().copied();
    let prev_text = prev.map(|t| t.text.as_str());

    if prev_text == Some(".") {
        return ContextKind::Member;
    }

    let in_layout = unclosed_paren(before).map_or(false, |i| i > 0 && before[i - 1].is("layout"));
    if in_layout && matches!(prev_text, Some("(") | Some(",")) {
        return ContextKind::Keywords(token::LAYOUT_QUALIFIERS);
    }

    if let Some(prev) = prev {
        let after_qualifier = prev.class == TokenClass::Keyword
            && token::is_qualifier(&prev.text)
            && prev.text != "layout";
        let after_layout = prev.text == ")" && keyword_before_parens(before, &["layout"]);
        if after_qualifier || after_layout {
            return ContextKind::Type;
        }
    }

    let innermost = path.iter().rev().find(|n| {
        matches!(
            n.kind,
            SyntaxKind::CompoundStatement
                | SyntaxKind::StructSpecifier
                | SyntaxKind::InterfaceBlock
                | SyntaxKind::ParameterList
        ) && encloses(n, anchor)
    });

    match innermost.map(|n| n.kind) {
        Some(SyntaxKind::CompoundStatement) => {
            if at_statement_start(before) {
                ContextKind::Statement
            } else {
                ContextKind::Expression
            }
        }
        Some(SyntaxKind::StructSpecifier) | Some(SyntaxKind::InterfaceBlock)
            if matches!(prev_text, Some("{") | Some(";")) =>
        {
            ContextKind::Type
        }
        Some(SyntaxKind::ParameterList) if matches!(prev_text, Some("(") | Some(",")) => {
            ContextKind::Type
        }
        None if matches!(prev_text, None | Some(";") | Some("}")) => ContextKind::Type,
        _ => ContextKind::Expression,
    }
}

struct Completer<'a> {
    ctx: &'a CursorContext,
    builtins: &'a BuiltinDatabase,
    config: &'a Config,
    prefix: String,
    out: Vec<CompletionCandidate>,
}

impl<'a> Completer<'a> {
    fn narrowed(&self, name: &str) -> bool {
        !self.config.narrow_by_prefix || name.to_lowercase().starts_with(&self.prefix)
    }

    fn directives(&mut self) {
        for name in token::directive_names() {
            if name.contains(&self.prefix) {
                self.out.push(CompletionCandidate {
                    insert_behavior: InsertBehavior::ReplaceTokenWithTrailingSpace,
                    ..CompletionCandidate::plain(&name, CandidateCategory::Directive)
                });
            }
        }
    }

    fn keywords(&mut self, words: &[&str]) {
        for word in words {
            if self.narrowed(word) {
                self.out.push(CompletionCandidate::plain(word, CandidateCategory::Keyword));
            }
        }
    }

    fn types(&mut self) {
        let (ctx, builtins) = (self.ctx, self.builtins);
        for ty in builtins.types() {
            if self.narrowed(ty) {
                self.out.push(CompletionCandidate::plain(ty, CandidateCategory::BuiltinType));
            }
        }
        for symbol in &ctx.symbols {
            if symbol.kind == SymbolKind::Struct && self.narrowed(&symbol.name) {
                self.out.push(CompletionCandidate::plain(&symbol.name, CandidateCategory::Struct));
            }
        }
    }

    fn expressions(&mut self) {
        let (ctx, builtins) = (self.ctx, self.builtins);
        for symbol in &ctx.symbols {
            let category = match symbol.kind {
                SymbolKind::Variable | SymbolKind::Parameter => CandidateCategory::Variable,
                SymbolKind::Function => CandidateCategory::Function,
                SymbolKind::Macro => CandidateCategory::Macro,
                SymbolKind::Struct | SymbolKind::Block => continue,
            };
            if self.narrowed(&symbol.name) {
                self.out.push(CompletionCandidate {
                    detail: symbol.ty.clone(),
                    ..CompletionCandidate::plain(&symbol.name, category)
                });
            }
        }

        for (name, overloads) in builtins.lookup_functions(&self.prefix) {
            for overload in overloads {
                self.out.push(CompletionCandidate {
                    display: overload.label(),
                    insert_text: name.to_string(),
                    detail: Some(overload.return_type.clone()),
                    category: CandidateCategory::BuiltinFunction,
                    insert_behavior: InsertBehavior::Plain,
                });
            }
        }

        let close = self.config.auto_close_parens;
        for name in builtins.list_vector_matrix_constructors() {
            if self.narrowed(name) {
                self.out.push(CompletionCandidate {
                    insert_behavior: InsertBehavior::OpenParameterList { close },
                    ..CompletionCandidate::plain(name, CandidateCategory::Constructor)
                });
            }
        }
    }
}

/// Candidates for `ctx`, grouped by category in a fixed order and not ranked further.
pub fn complete(
    ctx: &CursorContext,
    builtins: &BuiltinDatabase,
    config: &Config,
) -> Vec<CompletionCandidate> {
    let mut completer = Completer {
        ctx,
        builtins,
        config,
        prefix: ctx.prefix.to_lowercase(),
        out: Vec::new(),
    };

    match &ctx.kind {
        ContextKind::DirectiveName => completer.directives(),
        ContextKind::Keywords(words) => completer.keywords(words),
        ContextKind::Type => completer.types(),
        ContextKind::Statement => {
            completer.keywords(token::STATEMENT_KEYWORDS);
            completer.types();
            completer.expressions();
        }
        ContextKind::Expression => completer.expressions(),
        ContextKind::Member | ContextKind::None => {}
    }

    log::trace!(
        "{} candidates for {:?} at {} (prefix {:?})",
        completer.out.len(),
        ctx.kind,
        ctx.offset,
        ctx.prefix
    );
    completer.out
}

/// Edit made by accepting `candidate` in `text`. Nothing is modified.
pub fn apply(candidate: &CompletionCandidate, text: &str, ctx: &CursorContext) -> Edit {
    let range = ctx.range;
    let new_text = match candidate.insert_behavior {
        InsertBehavior::Plain => candidate.insert_text.clone(),
        InsertBehavior::ReplaceTokenWithTrailingSpace => format!("{} ", candidate.insert_text),
        InsertBehavior::OpenParameterList { close } => {
            let has_paren = text
                .get(range.end..)
                .map_or(false, |rest| rest.starts_with('('));
            if has_paren {
                // Step over the existing parenthesis instead of doubling it
                return Edit {
                    range,
                    text: candidate.insert_text.clone(),
                    caret: range.start + candidate.insert_text.len() + 1,
                };
            }
            let mut s = format!("{}(", candidate.insert_text);
            if close {
                s.push(')');
            }
            return Edit {
                range,
                caret: range.start + candidate.insert_text.len() + 1,
                text: s,
            };
        }
    };

    Edit {
        range,
        caret: range.start + new_text.len(),
        text: new_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_with_config;

    /// Parse `marked` with the `$` removed and derive the context at its position.
    fn context_with(marked: &str, config: &Config) -> (String, CursorContext) {
        let offset = marked.find('$').unwrap();
        let src = marked.replacen('$', "", 1);
        let tree = parse_with_config(&src, config).tree;
        let ctx = CursorContext::at(&tree, offset);
        (src, ctx)
    }

    fn context(marked: &str) -> (String, CursorContext) {
        context_with(marked, &Config::default())
    }

    fn candidates_with(marked: &str, config: &Config) -> Vec<CompletionCandidate> {
        let (_, ctx) = context_with(marked, config);
        complete(&ctx, &BuiltinDatabase::default(), config)
    }

    fn candidates(marked: &str) -> Vec<CompletionCandidate> {
        candidates_with(marked, &Config::default())
    }

    fn displays(candidates: &[CompletionCandidate], category: CandidateCategory) -> Vec<&str> {
        candidates
            .iter()
            .filter(|c| c.category == category)
            .map(|c| c.display.as_str())
            .collect()
    }

    fn edited(src: &str, edit: &Edit) -> String {
        format!("{}{}{}", &src[..edit.range.start], edit.text, &src[edit.range.end..])
    }

    #[test]
    fn many_directive_lines() {
        let defines: String = (0..500).map(|i| format!("#define D{} {}\n", i, i)).collect();

        let (_, ctx) = context(&format!("{}#ifdef D1\nvoid f() {{ x = D$ }}", defines));
        assert_eq!(ctx.kind, ContextKind::Expression);
        assert_eq!(ctx.symbols.iter().filter(|s| s.kind == SymbolKind::Macro).count(), 500);

        let (_, ctx) = context(&format!("{}#include <a.glsl> $", defines));
        assert_eq!(ctx.kind, ContextKind::None);

        let (_, ctx) = context(&format!("{}#define X ve$", defines));
        assert_eq!(ctx.kind, ContextKind::Expression);

        let (_, ctx) = context(&format!("{}#version 450\n$", defines));
        assert_eq!(ctx.kind, ContextKind::Type);
    }

    #[test]
    fn context_kinds() {
        let cases: &[(&str, ContextKind)] = &[
            ("#inc$", ContextKind::DirectiveName),
            ("#$", ContextKind::DirectiveName),
            ("layout(std$) in;", ContextKind::Keywords(token::LAYOUT_QUALIFIERS)),
            ("layout(location = 0, $", ContextKind::Keywords(token::LAYOUT_QUALIFIERS)),
            ("uniform $", ContextKind::Type),
            ("layout(location = 0) out $", ContextKind::Type),
            ("layout(location = 0) $", ContextKind::Type),
            ("$", ContextKind::Type),
            ("#version 450\n$", ContextKind::Type),
            ("void f() {}\nve$", ContextKind::Type),
            ("void f($", ContextKind::Type),
            ("void f(int a, fl$)", ContextKind::Type),
            ("struct S { float a; $", ContextKind::Type),
            ("void f() { $ }", ContextKind::Statement),
            ("void f() { x = 1;\n#ifdef A\n$\n#endif\n}", ContextKind::Statement),
            ("void f() { if (x) $ }", ContextKind::Statement),
            ("void f() { switch (x) { case 1: $ } }", ContextKind::Statement),
            ("void f() { x = a ? b : $ }", ContextKind::Expression),
            ("void f() { x = $ }", ContextKind::Expression),
            ("void f() { for (int i = 0; $", ContextKind::Expression),
            ("void f() { foo(a, $) }", ContextKind::Expression),
            ("float x = $", ContextKind::Expression),
            ("void f() { v.$ }", ContextKind::Member),
            ("void f() { v.xy$ }", ContextKind::Member),
            ("#include \"fo$\"", ContextKind::None),
            ("#version 4$", ContextKind::None),
            ("// comm$", ContextKind::None),
            ("/* a $ */", ContextKind::None),
            ("void f() { x = 1.$ }", ContextKind::None),
            ("#define A ve$", ContextKind::Expression),
        ];

        for (marked, expected) in cases {
            let (_, ctx) = context(marked);
            assert_eq!(&ctx.kind, expected, "{}", marked);
        }
    }

    #[test]
    fn word_under_cursor() {
        let (_, ctx) = context("void f() { x = texLod$ }");
        assert_eq!(ctx.prefix, "texLod");
        let (_, ctx) = context("void f() { x = tex$Lod }");
        assert_eq!(ctx.prefix, "tex");
        assert_eq!(ctx.range, Span::new(15, 21));
    }

    #[test]
    fn directive_completion() {
        let (src, ctx) = context("#IN$");
        assert_eq!(ctx.prefix, "in");
        let found = complete(&ctx, &BuiltinDatabase::default(), &Config::default());
        assert_eq!(displays(&found, CandidateCategory::Directive), vec!["include", "define", "line"]);

        let include = &found[0];
        assert_eq!(include.insert_behavior, InsertBehavior::ReplaceTokenWithTrailingSpace);
        let edit = apply(include, &src, &ctx);
        assert_eq!(edited(&src, &edit), "#include ");
        assert_eq!(edit.caret, "#include ".len());

        let (src, ctx) = context("  #  Defi$ne X 1");
        let found = complete(&ctx, &BuiltinDatabase::default(), &Config::default());
        assert_eq!(displays(&found, CandidateCategory::Directive), vec!["define"]);
        assert_eq!(edited(&src, &apply(&found[0], &src, &ctx)), "  #  define  X 1");
    }

    #[test]
    fn expression_completion_order() {
        let found = candidates("void main() { float radius = 1.0; float r2 = ra$ }");
        assert_eq!(found[0].display, "radius");
        assert_eq!(found[0].category, CandidateCategory::Variable);
        assert_eq!(found[0].detail.as_deref(), Some("float"));

        let functions = displays(&found, CandidateCategory::BuiltinFunction);
        assert!(functions.contains(&"radians(float degrees)"));
        assert!(!found.iter().any(|c| c.display == "r2"));

        let first_builtin = found
            .iter()
            .position(|c| c.category == CandidateCategory::BuiltinFunction)
            .unwrap();
        assert!(found[..first_builtin]
            .iter()
            .all(|c| c.category == CandidateCategory::Variable || c.category == CandidateCategory::Function));
    }

    #[test]
    fn builtin_functions_match_substrings() {
        let found = candidates("void main() { x = Lod$ }");
        let names: Vec<&str> = found
            .iter()
            .filter(|c| c.category == CandidateCategory::BuiltinFunction)
            .map(|c| c.insert_text.as_str())
            .collect();
        assert!(names.contains(&"textureLod"));
        assert!(names.contains(&"textureQueryLod"));

        let overloads = found.iter().filter(|c| c.insert_text == "textureLod").count();
        assert!(overloads > 1);
        let one = found.iter().find(|c| c.insert_text == "textureLod").unwrap();
        assert_eq!(one.detail.as_deref(), Some("vec4"));
    }

    #[test]
    fn constructors_open_parameter_list() {
        let marked = "void main() { vec3 v = ve$ }";
        let (src, ctx) = context(marked);
        let found = complete(&ctx, &BuiltinDatabase::default(), &Config::default());
        assert_eq!(displays(&found, CandidateCategory::Constructor), vec!["vec2", "vec3", "vec4"]);

        let vec3 = found.iter().find(|c| c.display == "vec3").unwrap();
        assert_eq!(vec3.insert_behavior, InsertBehavior::OpenParameterList { close: true });
        let edit = apply(vec3, &src, &ctx);
        let result = edited(&src, &edit);
        assert_eq!(result, "void main() { vec3 v = vec3() }");
        assert!(result[..edit.caret].ends_with("vec3("));

        let found = candidates("void main() { $ }");
        let constructors = displays(&found, CandidateCategory::Constructor);
        for name in ["vec2", "vec3", "vec4", "mat2", "mat3", "mat4"] {
            assert!(constructors.contains(&name), "{}", name);
        }
    }

    #[test]
    fn constructor_without_auto_close() {
        let config = Config::default().with_auto_close_parens(false);
        let (src, ctx) = context_with("float x = ma$", &config);
        let found = complete(&ctx, &BuiltinDatabase::default(), &config);
        let mat3 = found.iter().find(|c| c.display == "mat3").unwrap();
        let edit = apply(mat3, &src, &ctx);
        assert_eq!(edited(&src, &edit), "float x = mat3(");
        assert_eq!(edit.caret, edited(&src, &edit).len());

        // An existing parenthesis is stepped over
        let (src, ctx) = context("float x = ma$(1.0);");
        let edit = apply(mat3, &src, &ctx);
        assert_eq!(edited(&src, &edit), "float x = mat3(1.0);");
        assert_eq!(&edited(&src, &edit)[..edit.caret], "float x = mat3(");
    }

    #[test]
    fn type_completion() {
        let found = candidates("struct Light { float a; };\nuniform L$");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].display, "Light");
        assert_eq!(found[0].category, CandidateCategory::Struct);

        let found = candidates("uniform sampler2DA$");
        assert_eq!(
            displays(&found, CandidateCategory::BuiltinType),
            vec!["sampler2DArray", "sampler2DArrayShadow"]
        );

        let unfiltered = candidates_with("uniform vec$", &Config::default().with_prefix_narrowing(false));
        assert!(unfiltered.iter().any(|c| c.display == "float"));
    }

    #[test]
    fn layout_and_statement_keywords() {
        let found = candidates("layout(std$) uniform B { float a; };");
        assert_eq!(displays(&found, CandidateCategory::Keyword), vec!["std140", "std430"]);

        let found = candidates("void main() { re$ }");
        assert_eq!(found[0].display, "return");
        assert_eq!(found[0].category, CandidateCategory::Keyword);
        assert!(found.iter().any(|c| c.insert_text == "reflect"));
    }

    #[test]
    fn nothing_offered() {
        assert!(candidates("void f() { v.$ }").is_empty());
        assert!(candidates("#include <co$").is_empty());
        assert!(candidates("// text$").is_empty());
    }
}

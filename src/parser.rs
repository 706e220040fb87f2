//! Recursive descent parser producing a lossless [`SyntaxTree`].
//!
//! The parser never gives up on its input. Malformed constructs are wrapped in
//! [`SyntaxKind::Error`] nodes and reported as diagnostics, and parsing resumes at the next
//! statement or line boundary.
//!
//! Preprocessor directive lines may appear between any two tokens. They are parsed as
//! soon as they are met, the same way trivia is attached, so the grammar proper never
//! sees them.

use crate::config::Config;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::include::is_valid_include_path;
use crate::lexer::{self, Token};
use crate::syntax::{Span, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxTree};
use crate::token::{self, TokenClass};

/// Longest piece of offending source quoted in an error message
const MAX_ERROR_TOKEN_TEXT: usize = 20;

const ASSIGNMENT_OPERATORS: &[&str] = &["=", "+=", "-=", "*=", "/=", "%=", "<<=", ">>=", "&=", "^=", "|="];
const PREFIX_OPERATORS: &[&str] = &["++", "--", "+", "-", "!", "~"];
const STATEMENT_STARTS: &[&str] = &[
    "if", "for", "while", "do", "switch", "return", "break", "continue", "discard", "case", "default",
];

fn binary_precedence(op: &str) -> Option<u8> {
    Some(match op {
        "||" => 1,
        "^^" => 2,
        "&&" => 3,
        "|" => 4,
        "^" => 5,
        "&" => 6,
        "==" | "!=" => 7,
        "<" | ">" | "<=" | ">=" => 8,
        "<<" | ">>" => 9,
        "+" | "-" => 10,
        "*" | "/" | "%" => 11,
        _ => return None,
    })
}

fn truncate(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(MAX_ERROR_TOKEN_TEXT) {
        Some((i, _)) => format!("{}...", &text[..i]),
        None => text.to_string(),
    }
}

/// Tree and diagnostics for one source unit.
#[derive(Debug)]
pub struct Parse {
    pub tree: SyntaxTree,
    pub diagnostics: Vec<Diagnostic>,
}

impl Parse {
    pub fn into_parts(self) -> (SyntaxTree, Vec<Diagnostic>) {
        (self.tree, self.diagnostics)
    }
}

pub fn parse_with_config(source: &str, config: &Config) -> Parse {
    let mut tokens = lexer::tokenize(source);
    tokens.reverse();

    let mut parser = Parser {
        tokens,
        frames: vec![Frame::new(SyntaxKind::TranslationUnit)],
        diagnostics: Vec::new(),
        depth: 0,
        max_nesting: config.max_nesting,
        last_error_at: None,
        in_directive: false,
        offset: 0,
        line: 1,
    };
    parser.translation_unit();

    let (root, diagnostics) = parser.finish_root();
    log::trace!(
        "parsed {} bytes: {} diagnostics",
        source.len(),
        diagnostics.len()
    );

    Parse {
        tree: SyntaxTree::new(root),
        diagnostics,
    }
}

struct Frame {
    kind: SyntaxKind,
    children: Vec<SyntaxElement>,
}

impl Frame {
    fn new(kind: SyntaxKind) -> Self {
        Frame {
            kind,
            children: Vec::new(),
        }
    }
}

#[derive(Clone, Copy)]
struct Checkpoint {
    depth: usize,
    index: usize,
}

struct Parser {
    /// Remaining tokens, last one first
    tokens: Vec<Token>,
    frames: Vec<Frame>,
    diagnostics: Vec<Diagnostic>,
    depth: usize,
    max_nesting: usize,
    last_error_at: Option<usize>,
    in_directive: bool,

    // End offset and line of the last consumed significant token
    offset: usize,
    line: usize,
}

// Token stream and tree building
impl Parser {
    fn push_element(&mut self, element: SyntaxElement) {
        if let Some(frame) = self.frames.last_mut() {
            frame.children.push(element);
        }
    }

    fn bump_raw(&mut self) {
        if let Some(token) = self.tokens.pop() {
            if !token.is_trivia() {
                self.offset = token.span.end;
                self.line = token.line + token.text.matches('\n').count();
            }
            self.push_element(SyntaxElement::Token(token));
        }
    }

    /// Attach pending trivia to the current node, parsing any directive lines on the way.
    fn eat_trivia(&mut self) {
        loop {
            let next = self.tokens.last().map(|t| (t.is_trivia(), t.class));
            match next {
                Some((true, _)) => self.bump_raw(),
                Some((false, TokenClass::Directive)) if !self.in_directive => self.directive(),
                _ => break,
            }
        }
    }

    fn nth(&mut self, n: usize) -> Option<&Token> {
        self.eat_trivia();
        self.tokens.iter().rev().filter(|t| !t.is_trivia()).nth(n)
    }

    fn current(&mut self) -> Option<&Token> {
        self.nth(0)
    }

    fn at_eof(&mut self) -> bool {
        self.current().is_none()
    }

    fn nth_at(&mut self, n: usize, text: &str) -> bool {
        self.nth(n)
            .map_or(false, |t| t.text == text && t.class != TokenClass::Literal)
    }

    fn at(&mut self, text: &str) -> bool {
        self.nth_at(0, text)
    }

    fn at_operator(&mut self, ops: &[&str]) -> bool {
        self.current()
            .map_or(false, |t| t.class == TokenClass::Operator && ops.contains(&t.text.as_str()))
    }

    fn nth_class(&mut self, n: usize) -> Option<TokenClass> {
        self.nth(n).map(|t| t.class)
    }

    fn at_class(&mut self, class: TokenClass) -> bool {
        self.nth_class(0) == Some(class)
    }

    fn at_qualifier(&mut self) -> bool {
        self.current()
            .map_or(false, |t| t.class == TokenClass::Keyword && token::is_qualifier(&t.text))
    }

    fn at_statement_start(&mut self) -> bool {
        self.current()
            .map_or(false, |t| t.class == TokenClass::Keyword && STATEMENT_STARTS.contains(&t.text.as_str()))
    }

    fn bump(&mut self) {
        self.eat_trivia();
        self.bump_raw();
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.at(text) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, text: &str) -> bool {
        if self.eat(text) {
            true
        } else {
            self.error_expected(&format!("'{}'", text));
            false
        }
    }

    fn expect_ident(&mut self, what: &str) -> bool {
        if self.at_class(TokenClass::Identifier) {
            self.bump();
            true
        } else {
            self.error_expected(what);
            false
        }
    }

    fn start_node(&mut self, kind: SyntaxKind) {
        self.eat_trivia();
        self.frames.push(Frame::new(kind));
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.eat_trivia();
        Checkpoint {
            depth: self.frames.len(),
            index: self.frames.last().map_or(0, |f| f.children.len()),
        }
    }

    /// Open a node which adopts everything parsed since `checkpoint`.
    fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        debug_assert_eq!(checkpoint.depth, self.frames.len());

        let children = match self.frames.last_mut() {
            Some(frame) => {
                let index = checkpoint.index.min(frame.children.len());
                frame.children.split_off(index)
            }
            None => Vec::new(),
        };
        self.frames.push(Frame { kind, children });
    }

    fn retag(&mut self, kind: SyntaxKind) {
        if let Some(frame) = self.frames.last_mut() {
            frame.kind = kind;
        }
    }

    /// Close the current node. Trailing trivia moves out to the parent so spans stay tight.
    fn finish_node(&mut self) {
        if self.frames.len() <= 1 {
            return;
        }
        let mut frame = match self.frames.pop() {
            Some(frame) => frame,
            None => return,
        };

        let mut split = frame.children.len();
        while split > 0 {
            let movable = match &frame.children[split - 1] {
                SyntaxElement::Token(token) => token.is_trivia(),
                SyntaxElement::Node(node) => node.kind.is_directive(),
            };
            if !movable {
                break;
            }
            split -= 1;
        }
        let trailing = frame.children.split_off(split);
        let at = trailing.first().map_or(self.offset, |e| e.span().start);

        let node = SyntaxNode::new(frame.kind, frame.children, at);
        self.push_element(SyntaxElement::Node(node));
        if let Some(parent) = self.frames.last_mut() {
            parent.children.extend(trailing);
        }
    }

    fn finish_root(mut self) -> (SyntaxNode, Vec<Diagnostic>) {
        self.eat_trivia();
        while self.frames.len() > 1 {
            self.finish_node();
        }
        let children = self.frames.pop().map(|f| f.children).unwrap_or_default();
        (
            SyntaxNode::new(SyntaxKind::TranslationUnit, children, 0),
            self.diagnostics,
        )
    }
}

// Diagnostics and recovery
impl Parser {
    fn report(&mut self, span: Span, line: usize, kind: DiagnosticKind) {
        // One error per position; the first one is the most useful
        if self.last_error_at == Some(span.start) {
            return;
        }
        self.last_error_at = Some(span.start);
        log::trace!("syntax error at {}..{}: {}", span.start, span.end, kind);
        self.diagnostics.push(Diagnostic::new(span, line, kind));
    }

    fn error_at(&mut self, span: Span, line: usize, message: String) {
        self.report(span, line, DiagnosticKind::SyntaxError { message });
    }

    fn here(&mut self) -> (Span, usize, Option<String>) {
        let (offset, line) = (self.offset, self.line);
        match self.current() {
            Some(t) => (t.span, t.line, Some(t.text.clone())),
            None => (Span::new(offset, offset), line, None),
        }
    }

    fn error_expected(&mut self, expected: &str) {
        let (span, line, found) = self.here();
        let message = match found {
            Some(found) => format!("{} expected, got '{}'", expected, truncate(&found)),
            None => format!("{} expected", expected),
        };
        self.error_at(span, line, message);
    }

    fn error_unexpected(&mut self) {
        let (span, line, found) = self.here();
        let message = match found {
            Some(found) => format!("unexpected '{}'", truncate(&found)),
            None => "unmatched input".to_string(),
        };
        self.error_at(span, line, message);
    }

    /// Skip the rest of a broken statement: through the next `;`, or up to a `}`, `{` or
    /// statement keyword. Always consumes at least one token unless at `}` or end of input.
    fn recover(&mut self, global: bool) {
        if self.at_eof() || self.at("}") {
            return;
        }

        self.start_node(SyntaxKind::Error);
        loop {
            if global && self.at("{") {
                self.skip_braces();
                break;
            }
            let done = self.at(";");
            self.bump();
            if done
                || self.at_eof()
                || self.at("}")
                || (!global && self.at("{"))
                || self.at_statement_start()
            {
                break;
            }
        }
        self.finish_node();
    }

    fn skip_braces(&mut self) {
        let mut depth = 0usize;
        while !self.at_eof() {
            if self.at("{") {
                depth += 1;
            } else if self.at("}") {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    self.bump();
                    break;
                }
            }
            self.bump();
        }
    }

    fn expect_semicolon(&mut self) {
        if self.eat(";") {
            return;
        }
        self.error_expected("';'");

        // A forgotten `;` at the end of a line: the next line is parsed on its own
        let line = self.line;
        let next_line = self.current().map(|t| t.line);
        if next_line.map_or(true, |next| next > line) {
            return;
        }
        self.recover(false);
    }

    fn enter(&mut self) -> bool {
        if self.depth >= self.max_nesting {
            let (span, line, _) = self.here();
            self.error_at(span, line, "maximum nesting level reached".to_string());
            if !self.at_eof() {
                self.start_node(SyntaxKind::Error);
                self.bump();
                self.finish_node();
            }
            return false;
        }
        self.depth += 1;
        true
    }

    fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

// Preprocessor
impl Parser {
    fn directive_peek(&self) -> Option<&Token> {
        self.tokens
            .iter()
            .rev()
            .take_while(|t| !t.is_newline())
            .find(|t| !t.is_trivia())
    }

    fn directive_bump(&mut self) {
        while let Some(t) = self.tokens.last() {
            if t.is_newline() {
                return;
            }
            if !t.is_trivia() {
                break;
            }
            self.bump_raw();
        }
        self.bump_raw();
    }

    fn directive(&mut self) {
        let (name, span, line) = match self.tokens.last() {
            Some(t) => (t.directive_name().unwrap_or_default(), t.span, t.line),
            None => return,
        };
        let kind = match name.as_str() {
            "version" => SyntaxKind::VersionDirective,
            "extension" => SyntaxKind::ExtensionDirective,
            "include" => SyntaxKind::IncludeDirective,
            "define" => SyntaxKind::DefineDirective,
            "if" | "ifdef" | "ifndef" | "elif" | "else" | "endif" => SyntaxKind::ConditionalDirective,
            _ => SyntaxKind::Directive,
        };

        self.in_directive = true;
        self.frames.push(Frame::new(kind));
        self.bump_raw();

        match kind {
            SyntaxKind::VersionDirective => {
                if self.directive_peek().map(|t| t.class) == Some(TokenClass::Literal) {
                    self.directive_bump();
                } else {
                    self.error_at(span, line, "version number expected".to_string());
                }
            }
            SyntaxKind::ExtensionDirective => {
                let has_name = self.directive_peek().map(|t| t.class) == Some(TokenClass::Identifier);
                let has_colon = self
                    .tokens
                    .iter()
                    .rev()
                    .take_while(|t| !t.is_newline())
                    .any(|t| t.is(":"));
                if !has_name || !has_colon {
                    self.error_at(span, line, "'#extension name : behavior' expected".to_string());
                }
            }
            SyntaxKind::IncludeDirective => {
                let argument = self.directive_peek().map(|t| (t.text.clone(), t.span, t.line));
                match argument {
                    Some((path, arg_span, arg_line)) => {
                        if !is_valid_include_path(&path) {
                            self.report(arg_span, arg_line, DiagnosticKind::InvalidIncludePath { path });
                        }
                        self.directive_bump();
                    }
                    None => {
                        let path = String::new();
                        self.report(span, line, DiagnosticKind::InvalidIncludePath { path });
                    }
                }
            }
            SyntaxKind::DefineDirective => {
                let class = self.directive_peek().map(|t| t.class);
                match class {
                    Some(TokenClass::Identifier) => self.directive_bump(),
                    _ => self.error_at(span, line, "macro name expected".to_string()),
                }
            }
            SyntaxKind::Directive if !name.is_empty() && !token::is_directive_name(&name) => {
                self.error_at(span, line, format!("unknown preprocessor directive '{}'", name));
            }
            _ => {}
        }

        while let Some(t) = self.tokens.last() {
            if t.is_newline() {
                break;
            }
            self.bump_raw();
        }
        self.in_directive = false;
        self.finish_node();
    }
}

// Declarations
impl Parser {
    fn translation_unit(&mut self) {
        while !self.at_eof() {
            let before = self.tokens.len();
            self.external_declaration();
            if self.tokens.len() == before {
                self.error_unexpected();
                if self.at("}") {
                    // Stray closing brace at file scope
                    self.start_node(SyntaxKind::Error);
                    self.bump();
                    self.finish_node();
                } else {
                    self.recover(true);
                }
            }
        }
    }

    fn external_declaration(&mut self) {
        if self.at(";") {
            self.start_node(SyntaxKind::EmptyStatement);
            self.bump();
            self.finish_node();
        } else if self.at("precision") {
            self.precision_declaration();
        } else {
            self.declaration(true);
        }
    }

    fn declaration(&mut self, global: bool) {
        let checkpoint = self.checkpoint();
        let has_qualifiers = self.type_qualifiers();

        if has_qualifiers && self.at(";") {
            // layout(local_size_x = 8) in;
            self.start_node_at(checkpoint, SyntaxKind::QualifierDeclaration);
            self.bump();
            self.finish_node();
            return;
        }

        if has_qualifiers
            && self.at_class(TokenClass::Identifier)
            && (self.nth_at(1, ",") || self.nth_at(1, ";"))
        {
            // invariant gl_Position;
            self.start_node_at(checkpoint, SyntaxKind::QualifierDeclaration);
            loop {
                self.expect_ident("identifier");
                if !self.eat(",") {
                    break;
                }
            }
            self.expect_semicolon();
            self.finish_node();
            return;
        }

        if has_qualifiers && self.at_class(TokenClass::Identifier) && self.nth_at(1, "{") {
            self.start_node_at(checkpoint, SyntaxKind::InterfaceBlock);
            self.bump();
            self.struct_body();
            if self.at_class(TokenClass::Identifier) {
                self.bump();
                self.array_specifiers();
            }
            self.expect_semicolon();
            self.finish_node();
            return;
        }

        if !self.type_specifier() {
            self.start_node_at(checkpoint, SyntaxKind::VariableDeclaration);
            self.error_expected("type");
            self.recover(global);
            self.finish_node();
            return;
        }

        if self.at_class(TokenClass::Identifier) && self.nth_at(1, "(") {
            self.start_node_at(checkpoint, SyntaxKind::FunctionPrototype);
            self.bump();
            self.parameter_list();
            if self.at("{") {
                self.retag(SyntaxKind::FunctionDefinition);
                self.compound_statement();
            } else {
                self.expect_semicolon();
            }
            self.finish_node();
            return;
        }

        self.start_node_at(checkpoint, SyntaxKind::VariableDeclaration);
        if !self.at(";") {
            loop {
                self.declarator();
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect_semicolon();
        self.finish_node();
    }

    fn declarator(&mut self) {
        self.start_node(SyntaxKind::Declarator);
        self.expect_ident("identifier");
        self.array_specifiers();
        if self.eat("=") {
            self.initializer();
        }
        self.finish_node();
    }

    fn initializer(&mut self) {
        if self.at("{") {
            self.initializer_list();
        } else {
            self.assignment();
        }
    }

    fn initializer_list(&mut self) {
        if !self.enter() {
            return;
        }
        self.start_node(SyntaxKind::InitializerList);
        self.bump();
        while !self.at("}") && !self.at_eof() {
            let before = self.tokens.len();
            self.initializer();
            if !self.eat(",") || self.tokens.len() == before {
                break;
            }
        }
        self.expect("}");
        self.finish_node();
        self.exit();
    }

    fn type_qualifiers(&mut self) -> bool {
        if !self.at_qualifier() {
            return false;
        }
        self.start_node(SyntaxKind::TypeQualifier);
        while self.at_qualifier() {
            if self.at("layout") {
                self.layout_qualifier();
            } else {
                self.bump();
            }
        }
        self.finish_node();
        true
    }

    fn layout_qualifier(&mut self) {
        self.start_node(SyntaxKind::LayoutQualifier);
        self.bump();
        if self.expect("(") {
            while !self.at(")") && !self.at_eof() {
                // `shared` is both a keyword and a layout identifier
                if self.at_class(TokenClass::Identifier) || self.at_class(TokenClass::Keyword) {
                    self.bump();
                } else {
                    self.error_expected("layout qualifier");
                    break;
                }
                if self.eat("=") {
                    self.assignment();
                }
                if !self.eat(",") {
                    break;
                }
            }
            self.expect(")");
        }
        self.finish_node();
    }

    fn type_specifier(&mut self) -> bool {
        if self.at("struct") {
            self.start_node(SyntaxKind::TypeSpecifier);
            self.struct_specifier();
            self.array_specifiers();
            self.finish_node();
            return true;
        }

        match self.nth_class(0) {
            Some(TokenClass::BuiltinType) | Some(TokenClass::Identifier) => {
                self.start_node(SyntaxKind::TypeSpecifier);
                self.bump();
                self.array_specifiers();
                self.finish_node();
                true
            }
            _ => false,
        }
    }

    fn array_specifiers(&mut self) {
        while self.at("[") {
            self.start_node(SyntaxKind::ArraySpecifier);
            self.bump();
            if !self.at("]") {
                self.expr();
            }
            self.expect("]");
            self.finish_node();
        }
    }

    fn struct_specifier(&mut self) {
        if !self.enter() {
            return;
        }
        self.start_node(SyntaxKind::StructSpecifier);
        self.bump();
        if self.at_class(TokenClass::Identifier) {
            self.bump();
        }
        self.struct_body();
        self.finish_node();
        self.exit();
    }

    fn struct_body(&mut self) {
        if !self.expect("{") {
            return;
        }
        while !self.at("}") && !self.at_eof() {
            let before = self.tokens.len();
            self.struct_member();
            if self.tokens.len() == before {
                break;
            }
        }
        self.expect("}");
    }

    fn struct_member(&mut self) {
        self.start_node(SyntaxKind::StructMember);
        self.type_qualifiers();
        if self.type_specifier() {
            loop {
                self.expect_ident("member name");
                self.array_specifiers();
                if !self.eat(",") {
                    break;
                }
            }
            self.expect_semicolon();
        } else {
            self.error_expected("member type");
            self.recover(false);
        }
        self.finish_node();
    }

    fn parameter_list(&mut self) {
        self.start_node(SyntaxKind::ParameterList);
        self.expect("(");
        if self.at("void") && self.nth_at(1, ")") {
            self.bump();
        } else if !self.at(")") {
            loop {
                self.parameter();
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(")");
        self.finish_node();
    }

    fn parameter(&mut self) {
        self.start_node(SyntaxKind::Parameter);
        self.type_qualifiers();
        if self.type_specifier() {
            if self.at_class(TokenClass::Identifier) {
                self.bump();
                self.array_specifiers();
            }
        } else {
            self.error_expected("parameter type");
        }
        self.finish_node();
    }

    fn precision_declaration(&mut self) {
        self.start_node(SyntaxKind::PrecisionDeclaration);
        self.bump();
        let is_precision = self
            .current()
            .map_or(false, |t| token::PRECISION_QUALIFIERS.contains(&t.text.as_str()));
        if is_precision {
            self.bump();
        } else {
            self.error_expected("precision qualifier");
        }
        if !self.type_specifier() {
            self.error_expected("type");
        }
        self.expect_semicolon();
        self.finish_node();
    }
}

// Statements
impl Parser {
    /// Significant token following the bracket group which starts `n` tokens ahead.
    fn nth_after_brackets(&mut self, n: usize) -> Option<String> {
        self.eat_trivia();
        let mut depth = 0usize;
        let mut tokens = self.tokens.iter().rev().filter(|t| !t.is_trivia()).skip(n);
        for t in tokens.by_ref() {
            if t.is("[") {
                depth += 1;
            } else if t.is("]") {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
        }
        tokens.next().map(|t| t.text.clone())
    }

    fn at_declaration_start(&mut self) -> bool {
        match self.nth_class(0) {
            Some(TokenClass::Keyword) => self.at_qualifier() || self.at("struct"),
            Some(TokenClass::BuiltinType) => {
                if self.nth_at(1, "(") {
                    false
                } else if self.nth_at(1, "[") {
                    // float[2](a, b) constructs; float[2] a declares
                    self.nth_after_brackets(1).as_deref() != Some("(")
                } else {
                    true
                }
            }
            Some(TokenClass::Identifier) => self.nth_class(1) == Some(TokenClass::Identifier),
            _ => false,
        }
    }

    fn statement(&mut self) {
        if !self.enter() {
            return;
        }

        let next = self.current().map(|t| (t.text.clone(), t.class));
        match next {
            Some((text, class)) if class == TokenClass::Keyword || text == "{" || text == ";" => {
                match text.as_str() {
                    "{" => self.compound_statement(),
                    ";" => {
                        self.start_node(SyntaxKind::EmptyStatement);
                        self.bump();
                        self.finish_node();
                    }
                    "if" => self.if_statement(),
                    "for" => self.for_statement(),
                    "while" => self.while_statement(),
                    "do" => self.do_while_statement(),
                    "switch" => self.switch_statement(),
                    "case" | "default" => self.case_label(),
                    "return" => self.return_statement(),
                    "break" | "continue" | "discard" => self.jump_statement(),
                    "precision" => self.precision_declaration(),
                    _ if self.at_declaration_start() => self.declaration(false),
                    _ => self.expression_statement(),
                }
            }
            _ if self.at_declaration_start() => self.declaration(false),
            _ => self.expression_statement(),
        }

        self.exit();
    }

    fn compound_statement(&mut self) {
        self.start_node(SyntaxKind::CompoundStatement);
        self.expect("{");
        while !self.at("}") && !self.at_eof() {
            let before = self.tokens.len();
            self.statement();
            if self.tokens.len() == before {
                self.error_unexpected();
                self.recover(false);
            }
        }
        self.expect("}");
        self.finish_node();
    }

    fn condition(&mut self) {
        if self.expect("(") {
            self.expr();
            self.expect(")");
        }
    }

    fn if_statement(&mut self) {
        self.start_node(SyntaxKind::IfStatement);
        self.bump();
        self.condition();
        self.statement();
        if self.eat("else") {
            self.statement();
        }
        self.finish_node();
    }

    fn for_statement(&mut self) {
        self.start_node(SyntaxKind::ForStatement);
        self.bump();
        if self.expect("(") {
            if self.at(";") {
                self.bump();
            } else if self.at_declaration_start() {
                self.declaration(false);
            } else {
                self.expression_statement();
            }
            if !self.at(";") {
                self.expr();
            }
            self.expect(";");
            if !self.at(")") {
                self.expr();
            }
            self.expect(")");
        }
        self.statement();
        self.finish_node();
    }

    fn while_statement(&mut self) {
        self.start_node(SyntaxKind::WhileStatement);
        self.bump();
        self.condition();
        self.statement();
        self.finish_node();
    }

    fn do_while_statement(&mut self) {
        self.start_node(SyntaxKind::DoWhileStatement);
        self.bump();
        self.statement();
        if self.expect("while") {
            self.condition();
        }
        self.expect_semicolon();
        self.finish_node();
    }

    fn switch_statement(&mut self) {
        self.start_node(SyntaxKind::SwitchStatement);
        self.bump();
        self.condition();
        if self.at("{") {
            self.compound_statement();
        } else {
            self.error_expected("'{'");
        }
        self.finish_node();
    }

    fn case_label(&mut self) {
        self.start_node(SyntaxKind::CaseLabel);
        let is_case = self.at("case");
        self.bump();
        if is_case {
            self.expr();
        }
        self.expect(":");
        self.finish_node();
    }

    fn return_statement(&mut self) {
        self.start_node(SyntaxKind::ReturnStatement);
        self.bump();
        if !self.at(";") {
            self.expr();
        }
        self.expect_semicolon();
        self.finish_node();
    }

    fn jump_statement(&mut self) {
        self.start_node(SyntaxKind::JumpStatement);
        self.bump();
        self.expect_semicolon();
        self.finish_node();
    }

    fn expression_statement(&mut self) {
        self.start_node(SyntaxKind::ExpressionStatement);
        self.expr();
        self.expect_semicolon();
        self.finish_node();
    }
}

// Expressions
impl Parser {
    fn expr(&mut self) {
        let checkpoint = self.checkpoint();
        self.assignment();
        if self.at(",") {
            self.start_node_at(checkpoint, SyntaxKind::SequenceExpr);
            while self.eat(",") {
                self.assignment();
            }
            self.finish_node();
        }
    }

    fn assignment(&mut self) {
        if !self.enter() {
            return;
        }
        let checkpoint = self.checkpoint();
        self.conditional();
        if self.at_operator(ASSIGNMENT_OPERATORS) {
            self.start_node_at(checkpoint, SyntaxKind::AssignmentExpr);
            self.bump();
            self.assignment();
            self.finish_node();
        }
        self.exit();
    }

    fn conditional(&mut self) {
        let checkpoint = self.checkpoint();
        self.binary(1);
        if self.at("?") {
            self.start_node_at(checkpoint, SyntaxKind::TernaryExpr);
            self.bump();
            self.expr();
            self.expect(":");
            self.assignment();
            self.finish_node();
        }
    }

    fn binary(&mut self, min_precedence: u8) {
        let checkpoint = self.checkpoint();
        self.unary();
        loop {
            let precedence = match self.current() {
                Some(t) if t.class == TokenClass::Operator => binary_precedence(&t.text),
                _ => None,
            };
            match precedence {
                Some(precedence) if precedence >= min_precedence => {
                    self.start_node_at(checkpoint, SyntaxKind::BinaryExpr);
                    self.bump();
                    self.binary(precedence + 1);
                    self.finish_node();
                }
                _ => break,
            }
        }
    }

    fn unary(&mut self) {
        if !self.at_operator(PREFIX_OPERATORS) {
            self.postfix();
            return;
        }
        if !self.enter() {
            return;
        }
        self.start_node(SyntaxKind::PrefixExpr);
        self.bump();
        self.unary();
        self.finish_node();
        self.exit();
    }

    fn postfix(&mut self) {
        let checkpoint = self.checkpoint();
        if !self.primary() {
            return;
        }
        loop {
            if self.at("(") {
                self.start_node_at(checkpoint, SyntaxKind::CallExpr);
                self.argument_list();
            } else if self.at("[") {
                self.start_node_at(checkpoint, SyntaxKind::IndexExpr);
                self.bump();
                self.expr();
                self.expect("]");
            } else if self.at(".") {
                self.start_node_at(checkpoint, SyntaxKind::FieldExpr);
                self.bump();
                self.expect_ident("field name");
            } else if self.at("++") || self.at("--") {
                self.start_node_at(checkpoint, SyntaxKind::PostfixExpr);
                self.bump();
            } else {
                break;
            }
            self.finish_node();
        }
    }

    fn primary(&mut self) -> bool {
        let next = self.current().map(|t| (t.class, t.text.clone()));
        match next {
            Some((TokenClass::Literal, _)) => {
                self.start_node(SyntaxKind::Literal);
                self.bump();
                self.finish_node();
            }
            Some((TokenClass::Identifier, _)) => {
                self.start_node(SyntaxKind::NameRef);
                self.bump();
                self.finish_node();
            }
            Some((TokenClass::BuiltinType, _)) => {
                // Constructor callee; the argument list is picked up as a postfix call
                self.type_specifier();
            }
            Some((TokenClass::Operator, text)) if text == "(" => {
                self.start_node(SyntaxKind::ParenExpr);
                self.bump();
                self.expr();
                self.expect(")");
                self.finish_node();
            }
            Some((TokenClass::Operator, text)) if text == "{" => self.initializer_list(),
            _ => {
                self.error_expected("expression");
                return false;
            }
        }
        true
    }

    fn argument_list(&mut self) {
        self.start_node(SyntaxKind::ArgumentList);
        self.bump();
        if self.at("void") && self.nth_at(1, ")") {
            self.bump();
        } else if !self.at(")") {
            loop {
                self.assignment();
                if !self.eat(",") {
                    break;
                }
            }
        }
        self.expect(")");
        self.finish_node();
    }
}

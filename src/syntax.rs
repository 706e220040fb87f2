//! Concrete syntax tree.
//!
//! Every token produced by the lexer, trivia included, ends up in exactly one node,
//! so the tree can always be printed back to the exact input.

use crate::include::IncludeDirective;
use crate::lexer::Token;
use crate::token::TokenClass;

/// Half-open byte range into the source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `offset` lies inside the span or touches its end.
    pub fn touches(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    TranslationUnit,

    // Preprocessor
    VersionDirective,
    ExtensionDirective,
    IncludeDirective,
    DefineDirective,
    ConditionalDirective,
    Directive,

    // Declarations
    FunctionDefinition,
    FunctionPrototype,
    ParameterList,
    Parameter,
    VariableDeclaration,
    Declarator,
    StructSpecifier,
    StructMember,
    InterfaceBlock,
    PrecisionDeclaration,
    QualifierDeclaration,
    TypeSpecifier,
    TypeQualifier,
    LayoutQualifier,
    ArraySpecifier,
    InitializerList,

    // Statements
    CompoundStatement,
    ExpressionStatement,
    IfStatement,
    ForStatement,
    WhileStatement,
    DoWhileStatement,
    SwitchStatement,
    CaseLabel,
    ReturnStatement,
    JumpStatement,
    EmptyStatement,

    // Expressions
    Literal,
    NameRef,
    ParenExpr,
    BinaryExpr,
    AssignmentExpr,
    TernaryExpr,
    PrefixExpr,
    PostfixExpr,
    CallExpr,
    ArgumentList,
    IndexExpr,
    FieldExpr,
    SequenceExpr,

    Error,
}

impl SyntaxKind {
    pub fn is_directive(self) -> bool {
        matches!(
            self,
            SyntaxKind::VersionDirective
                | SyntaxKind::ExtensionDirective
                | SyntaxKind::IncludeDirective
                | SyntaxKind::DefineDirective
                | SyntaxKind::ConditionalDirective
                | SyntaxKind::Directive
        )
    }

    pub fn is_statement(self) -> bool {
        matches!(
            self,
            SyntaxKind::CompoundStatement
                | SyntaxKind::ExpressionStatement
                | SyntaxKind::IfStatement
                | SyntaxKind::ForStatement
                | SyntaxKind::WhileStatement
                | SyntaxKind::DoWhileStatement
                | SyntaxKind::SwitchStatement
                | SyntaxKind::ReturnStatement
                | SyntaxKind::JumpStatement
                | SyntaxKind::EmptyStatement
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyntaxElement {
    Node(SyntaxNode),
    Token(Token),
}

impl SyntaxElement {
    pub fn span(&self) -> Span {
        match self {
            SyntaxElement::Node(node) => node.span,
            SyntaxElement::Token(token) => token.span,
        }
    }

    pub fn as_node(&self) -> Option<&SyntaxNode> {
        match self {
            SyntaxElement::Node(node) => Some(node),
            SyntaxElement::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            SyntaxElement::Node(_) => None,
            SyntaxElement::Token(token) => Some(token),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    pub span: Span,
    pub children: Vec<SyntaxElement>,
}

impl SyntaxNode {
    pub(crate) fn new(kind: SyntaxKind, children: Vec<SyntaxElement>, at: usize) -> Self {
        let span = match (children.first(), children.last()) {
            (Some(first), Some(last)) => Span::new(first.span().start, last.span().end),
            _ => Span::new(at, at),
        };
        SyntaxNode {
            kind,
            span,
            children,
        }
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter_map(SyntaxElement::as_node)
    }

    pub fn child_tokens(&self) -> impl Iterator<Item = &Token> {
        self.children.iter().filter_map(SyntaxElement::as_token)
    }

    pub fn child(&self, kind: SyntaxKind) -> Option<&SyntaxNode> {
        self.child_nodes().find(|n| n.kind == kind)
    }

    /// First direct non-trivia token child of the given class.
    pub fn child_token(&self, class: TokenClass) -> Option<&Token> {
        self.child_tokens().find(|t| t.class == class)
    }

    /// All tokens under this node in source order.
    pub fn tokens(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Token>) {
        for child in &self.children {
            match child {
                SyntaxElement::Node(node) => node.collect_tokens(out),
                SyntaxElement::Token(token) => out.push(token),
            }
        }
    }

    pub fn significant_tokens(&self) -> Vec<&Token> {
        self.tokens().into_iter().filter(|t| !t.is_trivia()).collect()
    }

    pub fn first_significant_token(&self) -> Option<&Token> {
        for child in &self.children {
            match child {
                SyntaxElement::Node(node) => {
                    if let Some(token) = node.first_significant_token() {
                        return Some(token);
                    }
                }
                SyntaxElement::Token(token) if !token.is_trivia() => return Some(token),
                SyntaxElement::Token(_) => {}
            }
        }
        None
    }

    pub fn text(&self) -> String {
        self.tokens().iter().map(|t| t.text.as_str()).collect()
    }

    /// Depth-first, pre-order walk over this node and all descendants.
    pub fn descendants(&self) -> Vec<&SyntaxNode> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, out: &mut Vec<&'a SyntaxNode>) {
        out.push(self);
        for node in self.child_nodes() {
            node.collect_descendants(out);
        }
    }
}

/// Result of parsing one source unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxTree {
    root: SyntaxNode,
}

impl SyntaxTree {
    pub(crate) fn new(root: SyntaxNode) -> Self {
        SyntaxTree { root }
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// Source text reconstructed from the tokens; always equal to the parsed input.
    pub fn text(&self) -> String {
        self.root.text()
    }

    pub fn tokens(&self) -> Vec<&Token> {
        self.root.tokens()
    }

    pub fn significant_tokens(&self) -> Vec<&Token> {
        self.root.significant_tokens()
    }

    pub fn descendants(&self) -> Vec<&SyntaxNode> {
        self.root.descendants()
    }

    /// Chain of nodes from the root down to the deepest node whose span touches `offset`.
    pub fn path_to(&self, offset: usize) -> Vec<&SyntaxNode> {
        let mut path = vec![&self.root];
        let mut node = &self.root;

        'descend: loop {
            // Prefer the child that strictly contains the offset, then one that ends there
            let mut touching = None;
            for child in node.child_nodes() {
                if child.span.start < offset && offset < child.span.end {
                    touching = Some(child);
                    break;
                }
                if child.span.touches(offset) && !child.span.is_empty() {
                    touching = Some(child);
                }
            }
            match touching {
                Some(child) => {
                    path.push(child);
                    node = child;
                    continue 'descend;
                }
                None => break,
            }
        }

        path
    }

    /// Token containing `offset`, or ending exactly at it when nothing contains it.
    pub fn token_at(&self, offset: usize) -> Option<&Token> {
        let tokens = self.tokens();
        tokens
            .iter()
            .find(|t| t.span.start <= offset && offset < t.span.end)
            .or_else(|| tokens.iter().rev().find(|t| t.span.end == offset))
            .copied()
    }

    /// Last non-trivia token ending at or before `offset`.
    pub fn significant_token_before(&self, offset: usize) -> Option<&Token> {
        self.tokens()
            .into_iter()
            .filter(|t| !t.is_trivia() && t.span.end <= offset)
            .last()
    }

    /// Include directives in source order.
    pub fn includes(&self) -> Vec<IncludeDirective> {
        self.descendants()
            .into_iter()
            .filter(|n| n.kind == SyntaxKind::IncludeDirective)
            .map(IncludeDirective::from_node)
            .collect()
    }

    /// Number given by the first `#version` directive, e.g. `(450, None)` or `(300, Some("es"))`.
    pub fn version(&self) -> Option<(u32, Option<String>)> {
        let node = self
            .root
            .child_nodes()
            .find(|n| n.kind == SyntaxKind::VersionDirective)?;
        let tokens = node.significant_tokens();
        let number = tokens.get(1)?.text.parse().ok()?;
        let profile = tokens.get(2).map(|t| t.text.clone());
        Some((number, profile))
    }
}

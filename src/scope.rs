//! Symbols visible at a source offset: file-scope declarations and macros, plus the
//! parameters and earlier locals of the enclosing function.

use std::collections::HashSet;

use crate::lexer::Token;
use crate::syntax::{Span, SyntaxKind, SyntaxNode, SyntaxTree};
use crate::token::TokenClass;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SymbolKind {
    Function,
    Variable,
    Parameter,
    Struct,
    /// Name of an interface block; not usable in expressions
    Block,
    Macro,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,

    /// Declared type, or return type for functions
    pub ty: Option<String>,

    /// Span of the declaring name token
    pub span: Span,
}

impl Symbol {
    fn new(name: &Token, kind: SymbolKind, ty: Option<String>) -> Self {
        Symbol {
            name: name.text.clone(),
            kind,
            ty,
            span: name.span,
        }
    }
}

/// Type named by the `TypeSpecifier` child of a declaration.
fn type_name(node: &SyntaxNode) -> Option<String> {
    let specifier = node.child(SyntaxKind::TypeSpecifier)?;
    match specifier.child(SyntaxKind::StructSpecifier) {
        Some(s) => s.child_token(TokenClass::Identifier).map(|t| t.text.clone()),
        None => specifier.first_significant_token().map(|t| t.text.clone()),
    }
}

fn declaration_symbols(node: &SyntaxNode, out: &mut Vec<Symbol>) {
    match node.kind {
        SyntaxKind::VariableDeclaration => {
            let declared_struct = node
                .child(SyntaxKind::TypeSpecifier)
                .and_then(|ts| ts.child(SyntaxKind::StructSpecifier))
                .and_then(|s| s.child_token(TokenClass::Identifier));
            if let Some(name) = declared_struct {
                out.push(Symbol::new(name, SymbolKind::Struct, None));
            }

            let ty = type_name(node);
            for declarator in node.child_nodes().filter(|n| n.kind == SyntaxKind::Declarator) {
                if let Some(name) = declarator.child_token(TokenClass::Identifier) {
                    out.push(Symbol::new(name, SymbolKind::Variable, ty.clone()));
                }
            }
        }
        SyntaxKind::FunctionDefinition | SyntaxKind::FunctionPrototype => {
            if let Some(name) = node.child_token(TokenClass::Identifier) {
                out.push(Symbol::new(name, SymbolKind::Function, type_name(node)));
            }
        }
        SyntaxKind::InterfaceBlock => {
            let mut names = node.child_tokens().filter(|t| t.class == TokenClass::Identifier);
            let block = names.next();
            let instance = names.next();

            if let Some(block) = block {
                out.push(Symbol::new(block, SymbolKind::Block, None));
            }
            match instance {
                Some(instance) => {
                    let ty = block.map(|b| b.text.clone());
                    out.push(Symbol::new(instance, SymbolKind::Variable, ty));
                }
                // Members of anonymous blocks live at file scope
                None => {
                    for member in node.child_nodes().filter(|n| n.kind == SyntaxKind::StructMember) {
                        let ty = type_name(member);
                        for name in member.child_tokens().filter(|t| t.class == TokenClass::Identifier) {
                            out.push(Symbol::new(name, SymbolKind::Variable, ty.clone()));
                        }
                    }
                }
            }
        }
        _ => {}
    }
}

/// File-scope declarations in source order, followed by `#define` macros.
pub fn global_symbols(tree: &SyntaxTree) -> Vec<Symbol> {
    let mut out = Vec::new();
    for node in tree.root().child_nodes() {
        declaration_symbols(node, &mut out);
    }

    for node in tree.descendants() {
        if node.kind != SyntaxKind::DefineDirective {
            continue;
        }
        if let Some(name) = node
            .significant_tokens()
            .get(1)
            .filter(|t| t.class == TokenClass::Identifier)
        {
            out.push(Symbol::new(name, SymbolKind::Macro, None));
        }
    }

    out
}

/// Locals declared before `offset` in the blocks enclosing it, innermost first, then the
/// parameters of the enclosing function.
pub fn local_symbols(tree: &SyntaxTree, offset: usize) -> Vec<Symbol> {
    let mut out = Vec::new();

    for node in tree.path_to(offset).into_iter().rev() {
        match node.kind {
            SyntaxKind::CompoundStatement | SyntaxKind::ForStatement => {
                for child in node.child_nodes() {
                    if child.kind == SyntaxKind::VariableDeclaration && child.span.end <= offset {
                        declaration_symbols(child, &mut out);
                    }
                }
            }
            SyntaxKind::FunctionDefinition => {
                if let Some(params) = node.child(SyntaxKind::ParameterList) {
                    for param in params.child_nodes() {
                        if let Some(name) = param.child_token(TokenClass::Identifier) {
                            out.push(Symbol::new(name, SymbolKind::Parameter, type_name(param)));
                        }
                    }
                }
                break;
            }
            _ => {}
        }
    }

    out
}

/// Everything nameable at `offset`; inner declarations shadow outer ones of the same name.
pub fn visible_symbols(tree: &SyntaxTree, offset: usize) -> Vec<Symbol> {
    let mut seen = HashSet::new();
    local_symbols(tree, offset)
        .into_iter()
        .chain(global_symbols(tree))
        .filter(|s| seen.insert(s.name.clone()))
        .collect()
}

use std::iter::Peekable;
use std::str::CharIndices;

use crate::syntax::Span;
use crate::token::{self, TokenClass};

/// A lexical unit. Concatenating the `text` of every token of a source reproduces it exactly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub class: TokenClass,
    pub text: String,
    pub span: Span,

    /// 1-based line on which the token starts
    pub line: usize,
}

impl Token {
    pub fn is_trivia(&self) -> bool {
        self.class.is_trivia()
    }

    /// Newline which terminates a logical line (not part of a line continuation).
    pub fn is_newline(&self) -> bool {
        self.class == TokenClass::Whitespace && (self.text == "\n" || self.text == "\r\n")
    }

    pub fn is(&self, text: &str) -> bool {
        !self.is_trivia() && self.text == text
    }

    /// Normalized directive name (`include`, `define`, ...) for directive tokens.
    pub fn directive_name(&self) -> Option<String> {
        if self.text.starts_with('#') && self.class != TokenClass::Operator {
            Some(directive_name(&self.text))
        } else {
            None
        }
    }
}

/// Name of the directive introduced by `text`, ignoring blanks, block comments and line
/// continuations between the `#` and the name, e.g. `#/**/in\⏎clude` is `include`.
pub fn directive_name(text: &str) -> String {
    let mut name = String::new();
    let mut rest = text.strip_prefix('#').unwrap_or(text);

    while let Some(c) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix("/*") {
            rest = match after.find("*/") {
                Some(i) => &after[i + 2..],
                None => "",
            };
        } else if let Some(after) = rest.strip_prefix("\\\r\n") {
            rest = after;
        } else if let Some(after) = rest.strip_prefix("\\\n") {
            rest = after;
        } else {
            if !c.is_whitespace() {
                name.push(c);
            }
            rest = &rest[c.len_utf8()..];
        }
    }

    token::normalize_directive_name(&name)
}

#[derive(Clone)]
struct LocationTracking<I> {
    iter: I,
    line: usize,
}

impl<'a> Iterator for LocationTracking<CharIndices<'a>> {
    type Item = (usize, (usize, char));

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|a| {
            let ret = (self.line, a);
            if a.1 == '\n' {
                self.line += 1;
            }
            ret
        })
    }
}

type InputIter<'a> = Peekable<LocationTracking<CharIndices<'a>>>;

/// Split GLSL source into tokens, trivia included.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    lexer.process_input();
    lexer.tokens
}

struct Lexer<'a> {
    input: &'a str,
    input_iter: InputIter<'a>,
    tokens: Vec<Token>,

    // Set once the current logical line has something other than trivia on it
    line_has_code: bool,
    directive: Option<String>,
    include_arg_pending: bool,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer {
            input,
            input_iter: LocationTracking {
                iter: input.char_indices(),
                line: 1,
            }
            .peekable(),
            tokens: Vec::new(),
            line_has_code: false,
            directive: None,
            include_arg_pending: false,
        }
    }

    fn read_char(&mut self) -> Option<(usize, (usize, char))> {
        self.input_iter.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input_iter.peek().map(|&(_, (_, c))| c)
    }

    fn peek_nth_char(&self, n: usize) -> Option<char> {
        self.input_iter.clone().nth(n).map(|(_, (_, c))| c)
    }

    fn offset(&mut self) -> usize {
        let len = self.input.len();
        self.input_iter.peek().map_or(len, |&(_, (offset, _))| offset)
    }

    /// Length in chars of a newline starting at `n`, if there is one.
    fn newline_at(&self, n: usize) -> Option<usize> {
        match self.peek_nth_char(n) {
            Some('\n') => Some(1),
            Some('\r') if self.peek_nth_char(n + 1) == Some('\n') => Some(2),
            _ => None,
        }
    }

    fn read_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(c) = self.peek_char() {
            if pred(c) {
                let _ = self.read_char();
            } else {
                break;
            }
        }
    }

    fn skip_block_comment(mut it: InputIter<'a>) -> InputIter<'a> {
        while let Some((_, (_, c))) = it.next() {
            if c == '*' {
                if let Some(&(_, (_, '/'))) = it.peek() {
                    let _ = it.next();
                    break;
                }
            }
        }
        it
    }

    fn read_line_comment(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\\' {
                if let Some(n) = self.newline_at(1) {
                    for _ in 0..=n {
                        let _ = self.read_char();
                    }
                    continue;
                }
            } else if self.newline_at(0).is_some() {
                break;
            }
            let _ = self.read_char();
        }
    }

    /// Scans past `#`, blanks, block comments and line continuations to the end of the
    /// directive name. Returns `None` if no name follows.
    fn peek_preprocessor_ident(&self) -> Option<InputIter<'a>> {
        let mut found = false;
        let mut it = self.input_iter.clone();

        while let Some(&(_, (_, c))) = it.peek() {
            if '\n' == c || '\r' == c {
                break;
            } else if token::is_ident_char(c) {
                let _ = it.next();
                found = true;
            } else if c.is_whitespace() {
                if found {
                    // Already found some chars, and this ends the identifier
                    break;
                }
                let _ = it.next();
            } else if '\\' == c {
                let mut peek_next = it.clone();
                let _ = peek_next.next();

                match peek_next.next() {
                    Some((_, (_, '\n'))) => it = peek_next,
                    Some((_, (_, '\r'))) if matches!(peek_next.peek(), Some(&(_, (_, '\n')))) => {
                        let _ = peek_next.next();
                        it = peek_next;
                    }
                    _ => break,
                }
            } else if '/' == c && !found {
                let mut next_peek = it.clone();
                let _ = next_peek.next();

                if let Some(&(_, (_, '*'))) = next_peek.peek() {
                    let _ = next_peek.next();
                    it = Self::skip_block_comment(next_peek);
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        if found {
            Some(it)
        } else {
            None
        }
    }

    /// Reads up to and including `right_delim`, stopping early at the end of the line.
    fn read_delimited(&mut self, right_delim: char) {
        let _ = self.read_char();
        while let Some(c) = self.peek_char() {
            if self.newline_at(0).is_some() {
                break;
            }
            let _ = self.read_char();
            if c == right_delim {
                break;
            }
        }
    }

    fn read_number(&mut self) {
        let mut prev = '\0';
        let is_hex = self.peek_char() == Some('0') && matches!(self.peek_nth_char(1), Some('x' | 'X'));

        while let Some(c) = self.peek_char() {
            let exponent_sign = (c == '+' || c == '-') && (prev == 'e' || prev == 'E') && !is_hex;
            if token::is_ident_char(c) || c == '.' || exponent_sign {
                let _ = self.read_char();
                prev = c;
            } else {
                break;
            }
        }
    }

    fn read_operator(&mut self) -> TokenClass {
        let input = self.input;
        let rest = &input[self.offset()..];

        match token::OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            Some(op) => {
                for _ in 0..op.len() {
                    let _ = self.read_char();
                }
                TokenClass::Operator
            }
            None => {
                let _ = self.read_char();
                TokenClass::Identifier
            }
        }
    }

    fn push_token(&mut self, class: TokenClass, start: usize, line: usize) {
        let input = self.input;
        let end = self.offset();
        self.tokens.push(Token {
            class,
            text: input[start..end].to_string(),
            span: Span::new(start, end),
            line,
        });
    }

    fn process_input(&mut self) {
        while let Some(&(line, (start, c))) = self.input_iter.peek() {
            let class = if let Some(n) = self.newline_at(0) {
                for _ in 0..n {
                    let _ = self.read_char();
                }
                self.line_has_code = false;
                self.directive = None;
                self.include_arg_pending = false;
                TokenClass::Whitespace
            } else if c == '\\' && self.newline_at(1).is_some() {
                let n = self.newline_at(1).unwrap_or(1);
                for _ in 0..=n {
                    let _ = self.read_char();
                }
                TokenClass::Whitespace
            } else if c.is_whitespace() {
                self.read_while(|c| c.is_whitespace() && c != '\n' && c != '\r');
                if self.offset() == start {
                    // Lone '\r'
                    let _ = self.read_char();
                }
                TokenClass::Whitespace
            } else if c == '/' && self.peek_nth_char(1) == Some('/') {
                self.read_line_comment();
                TokenClass::Comment
            } else if c == '/' && self.peek_nth_char(1) == Some('*') {
                let _ = self.read_char();
                let _ = self.read_char();
                self.input_iter = Self::skip_block_comment(self.input_iter.clone());
                TokenClass::Comment
            } else {
                let class = self.read_code_token(c);
                self.line_has_code = true;
                class
            };

            self.push_token(class, start, line);
        }
    }

    fn read_code_token(&mut self, c: char) -> TokenClass {
        let include_arg = std::mem::take(&mut self.include_arg_pending);

        if c == '#' && !self.line_has_code && self.directive.is_none() {
            let _ = self.read_char();
            if let Some(it) = self.peek_preprocessor_ident() {
                self.input_iter = it;
            }
            let start = self.tokens.last().map_or(0, |t| t.span.end);
            let end = self.offset();
            let name = directive_name(&self.input[start..end]);
            self.include_arg_pending = name == "include";
            self.directive = Some(name);
            TokenClass::Directive
        } else if c == '#' {
            let _ = self.read_char();
            if self.peek_char() == Some('#') {
                let _ = self.read_char();
            }
            TokenClass::Operator
        } else if c == '"' {
            self.read_delimited('"');
            TokenClass::Literal
        } else if c == '<' && include_arg {
            self.read_delimited('>');
            TokenClass::Literal
        } else if c.is_ascii_digit()
            || (c == '.' && self.peek_nth_char(1).map_or(false, |c| c.is_ascii_digit()))
        {
            self.read_number();
            TokenClass::Literal
        } else if token::is_ident_start(c) {
            let start = self.offset();
            self.read_while(token::is_ident_char);
            let end = self.offset();
            token::classify_word(&self.input[start..end])
        } else {
            self.read_operator()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(s: &str) -> Vec<(TokenClass, String)> {
        tokenize(s).into_iter().map(|t| (t.class, t.text)).collect()
    }

    fn significant(s: &str) -> Vec<String> {
        tokenize(s)
            .into_iter()
            .filter(|t| !t.is_trivia())
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn lossless() {
        for s in [
            "",
            "int foo;",
            "foo /* /* bar */ baz",
            "/*\nfoo\n/*/\nbar\n//*/",
            "#in\\\nclude <foo>\r\n",
            "#version 430\n#pragma stuff",
            "x = 1.5e-3f + 0xFFu;\n\t@$",
            "/* unterminated",
            "#include <foo",
            "// comment \\\ncontinued\nnext",
        ] {
            let text: String = tokenize(s).into_iter().map(|t| t.text).collect();
            assert_eq!(text, s);
        }
    }

    #[test]
    fn basic_tokens() {
        assert_eq!(
            lex("vec3 a=b;"),
            vec![
                (TokenClass::BuiltinType, "vec3".to_string()),
                (TokenClass::Whitespace, " ".to_string()),
                (TokenClass::Identifier, "a".to_string()),
                (TokenClass::Operator, "=".to_string()),
                (TokenClass::Identifier, "b".to_string()),
                (TokenClass::Operator, ";".to_string()),
            ]
        );
        assert_eq!(significant("a<<=b>>c"), vec!["a", "<<=", "b", ">>", "c"]);
        assert_eq!(significant("1.0e+5 2u .5f 0x1F"), vec!["1.0e+5", "2u", ".5f", "0x1F"]);
    }

    #[test]
    fn directive_tokens() {
        let tokens = tokenize("#  include <foo/bar.glsl>\nint x;");
        assert_eq!(tokens[0].class, TokenClass::Directive);
        assert_eq!(tokens[0].text, "#  include");
        assert_eq!(tokens[0].directive_name().as_deref(), Some("include"));
        assert_eq!(tokens[2].class, TokenClass::Literal);
        assert_eq!(tokens[2].text, "<foo/bar.glsl>");
        assert!(tokens[3].is_newline());
        assert_eq!(tokens[4].line, 2);
    }

    #[test]
    fn split_directive_names() {
        let tokens = tokenize("#/**/inc\\\nlude \"a\"");
        assert_eq!(tokens[0].text, "#/**/inc\\\nlude");
        assert_eq!(tokens[0].directive_name().as_deref(), Some("include"));
        assert_eq!(tokens[2].text, "\"a\"");
    }

    #[test]
    fn hash_after_code_is_not_a_directive() {
        let tokens = tokenize("a # define");
        assert!(tokens.iter().all(|t| t.class != TokenClass::Directive));

        let tokens = tokenize("#define CAT(a, b) a ## b");
        assert_eq!(tokens[0].class, TokenClass::Directive);
        assert!(tokens.iter().any(|t| t.text == "##" && t.class == TokenClass::Operator));
    }

    #[test]
    fn angle_brackets_only_form_paths_in_includes() {
        assert_eq!(significant("#define A <b>"), vec!["#define", "A", "<", "b", ">"]);
        assert_eq!(significant("#include <b>"), vec!["#include", "<b>"]);
    }

    #[test]
    fn comments() {
        assert_eq!(
            lex("a // x\\\ny\nb"),
            vec![
                (TokenClass::Identifier, "a".to_string()),
                (TokenClass::Whitespace, " ".to_string()),
                (TokenClass::Comment, "// x\\\ny".to_string()),
                (TokenClass::Whitespace, "\n".to_string()),
                (TokenClass::Identifier, "b".to_string()),
            ]
        );
        assert_eq!(lex("/* a */")[0].0, TokenClass::Comment);
    }
}

//! Token classification tables.
//!
//! Every lexeme of GLSL source falls into one of the [`TokenClass`] categories.
//! The keyword tables here double as the fixed candidate lists offered by the
//! completion engine.

use std::collections::HashSet;

use lazy_static::lazy_static;

/// Classification tag carried by every token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenClass {
    Identifier,
    Keyword,
    Directive,
    BuiltinType,
    Operator,
    Literal,
    Comment,
    Whitespace,
}

impl TokenClass {
    /// Whitespace and comments; kept in the tree for round-tripping, ignored by the grammar.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenClass::Whitespace | TokenClass::Comment)
    }
}

/// Internal names of the preprocessor directives; see [`normalize_directive_name`].
pub const DIRECTIVE_KEYWORDS: &[&str] = &[
    "#PP_VERSION",
    "#PP_EXTENSION",
    "#PP_INCLUDE",
    "#PP_DEFINE",
    "#PP_UNDEF",
    "#PP_IF",
    "#PP_IFDEF",
    "#PP_IFNDEF",
    "#PP_ELIF",
    "#PP_ELSE",
    "#PP_ENDIF",
    "#PP_ERROR",
    "#PP_PRAGMA",
    "#PP_LINE",
];

pub const BUILTIN_TYPE_KEYWORDS: &[&str] = &[
    // Scalars
    "void", "bool", "int", "uint", "float", "double",
    // Vectors
    "vec2", "vec3", "vec4", "ivec2", "ivec3", "ivec4", "uvec2", "uvec3", "uvec4",
    "bvec2", "bvec3", "bvec4", "dvec2", "dvec3", "dvec4",
    // Matrices
    "mat2", "mat3", "mat4", "mat2x2", "mat2x3", "mat2x4", "mat3x2", "mat3x3", "mat3x4",
    "mat4x2", "mat4x3", "mat4x4", "dmat2", "dmat3", "dmat4", "dmat2x2", "dmat2x3",
    "dmat2x4", "dmat3x2", "dmat3x3", "dmat3x4", "dmat4x2", "dmat4x3", "dmat4x4",
    // Samplers
    "sampler1D", "sampler2D", "sampler3D", "samplerCube", "sampler2DRect",
    "sampler1DArray", "sampler2DArray", "samplerCubeArray", "samplerBuffer",
    "sampler2DMS", "sampler2DMSArray",
    "sampler1DShadow", "sampler2DShadow", "samplerCubeShadow", "sampler2DRectShadow",
    "sampler1DArrayShadow", "sampler2DArrayShadow", "samplerCubeArrayShadow",
    "isampler1D", "isampler2D", "isampler3D", "isamplerCube", "isampler2DRect",
    "isampler1DArray", "isampler2DArray", "isamplerCubeArray", "isamplerBuffer",
    "isampler2DMS", "isampler2DMSArray",
    "usampler1D", "usampler2D", "usampler3D", "usamplerCube", "usampler2DRect",
    "usampler1DArray", "usampler2DArray", "usamplerCubeArray", "usamplerBuffer",
    "usampler2DMS", "usampler2DMSArray",
    // Images
    "image1D", "image2D", "image3D", "imageCube", "image2DRect", "image1DArray",
    "image2DArray", "imageCubeArray", "imageBuffer", "image2DMS", "image2DMSArray",
    "iimage1D", "iimage2D", "iimage3D", "iimageCube", "iimage2DRect", "iimage1DArray",
    "iimage2DArray", "iimageCubeArray", "iimageBuffer", "iimage2DMS", "iimage2DMSArray",
    "uimage1D", "uimage2D", "uimage3D", "uimageCube", "uimage2DRect", "uimage1DArray",
    "uimage2DArray", "uimageCubeArray", "uimageBuffer", "uimage2DMS", "uimage2DMSArray",
    "atomic_uint",
];

pub const STORAGE_QUALIFIERS: &[&str] = &[
    "const", "in", "out", "inout", "attribute", "uniform", "varying", "buffer", "shared",
    "centroid", "sample", "patch", "invariant", "precise", "subroutine",
];

pub const INTERPOLATION_QUALIFIERS: &[&str] = &["smooth", "flat", "noperspective"];

pub const PRECISION_QUALIFIERS: &[&str] = &["highp", "mediump", "lowp"];

pub const MEMORY_QUALIFIERS: &[&str] = &["coherent", "volatile", "restrict", "readonly", "writeonly"];

pub const LAYOUT_QUALIFIERS: &[&str] = &[
    "location", "component", "binding", "set", "index", "offset", "align",
    "std140", "std430", "packed", "shared", "row_major", "column_major", "push_constant",
    "origin_upper_left", "pixel_center_integer", "early_fragment_tests",
    "local_size_x", "local_size_y", "local_size_z",
    "points", "lines", "lines_adjacency", "triangles", "triangles_adjacency",
    "line_strip", "triangle_strip", "max_vertices", "invocations", "stream",
    "vertices", "quads", "isolines", "equal_spacing", "fractional_even_spacing",
    "fractional_odd_spacing", "cw", "ccw", "point_mode",
    "xfb_buffer", "xfb_offset", "xfb_stride", "depth_any", "depth_greater",
    "depth_less", "depth_unchanged",
];

pub const STATEMENT_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "default", "break", "continue",
    "return", "discard", "struct", "layout", "precision",
];

pub const RESERVED_WORDS: &[&str] = &[
    "common", "partition", "active", "asm", "class", "union", "enum", "typedef", "template",
    "this", "resource", "goto", "inline", "noinline", "public", "static", "extern",
    "external", "interface", "long", "short", "half", "fixed", "unsigned", "superp",
    "input", "output", "hvec2", "hvec3", "hvec4", "fvec2", "fvec3", "fvec4", "filter",
    "sizeof", "cast", "namespace", "using", "sampler3DRect",
];

/// Operators and punctuators, longest first so greedy matching works off the front.
pub const OPERATORS: &[&str] = &[
    "<<=", ">>=", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "^^", "*=",
    "/=", "%=", "+=", "-=", "&=", "^=", "|=", "(", ")", "[", "]", "{", "}", ".", ",", ";",
    ":", "?", "=", "+", "-", "*", "/", "%", "<", ">", "!", "~", "&", "|", "^",
];

lazy_static! {
    static ref BUILTIN_TYPE_SET: HashSet<&'static str> =
        BUILTIN_TYPE_KEYWORDS.iter().copied().collect();
    static ref KEYWORD_SET: HashSet<&'static str> = STORAGE_QUALIFIERS
        .iter()
        .chain(INTERPOLATION_QUALIFIERS)
        .chain(PRECISION_QUALIFIERS)
        .chain(MEMORY_QUALIFIERS)
        .chain(STATEMENT_KEYWORDS)
        .chain(RESERVED_WORDS)
        .copied()
        .collect();
    static ref DIRECTIVE_SET: HashSet<String> = DIRECTIVE_KEYWORDS
        .iter()
        .map(|d| normalize_directive_name(d))
        .collect();
    static ref OPERATOR_SET: HashSet<&'static str> = OPERATORS.iter().copied().collect();
}

/// Display form of a directive name: case-folded, without the `pp_` prefix and `#`.
///
/// `#PP_DEFINE` becomes `define`; user-typed `#Define` becomes `define` as well.
pub fn normalize_directive_name(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let lower = lower.trim_start_matches('#').trim_start();
    lower.strip_prefix("pp_").unwrap_or(lower).to_string()
}

/// Normalized names of all known directives, in table order.
pub fn directive_names() -> impl Iterator<Item = String> {
    DIRECTIVE_KEYWORDS.iter().map(|d| normalize_directive_name(d))
}

pub fn is_directive_name(name: &str) -> bool {
    DIRECTIVE_SET.contains(name)
}

pub fn is_builtin_type(word: &str) -> bool {
    BUILTIN_TYPE_SET.contains(word)
}

pub fn is_keyword(word: &str) -> bool {
    KEYWORD_SET.contains(word)
}

pub fn is_qualifier(word: &str) -> bool {
    STORAGE_QUALIFIERS.contains(&word)
        || INTERPOLATION_QUALIFIERS.contains(&word)
        || PRECISION_QUALIFIERS.contains(&word)
        || MEMORY_QUALIFIERS.contains(&word)
        || word == "layout"
}

pub fn is_operator(text: &str) -> bool {
    OPERATOR_SET.contains(text)
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Classify a single word: identifier, keyword or builtin type.
pub(crate) fn classify_word(word: &str) -> TokenClass {
    if word == "true" || word == "false" {
        TokenClass::Literal
    } else if is_builtin_type(word) {
        TokenClass::BuiltinType
    } else if is_keyword(word) {
        TokenClass::Keyword
    } else {
        TokenClass::Identifier
    }
}

fn looks_numeric(raw: &str) -> bool {
    let mut chars = raw.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.') => chars.next().map_or(false, |c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Classify a raw lexeme. Total over any input; anything unrecognized is an identifier.
pub fn classify(raw: &str) -> TokenClass {
    if !raw.is_empty() && raw.chars().all(char::is_whitespace) {
        return TokenClass::Whitespace;
    }
    if raw == "\\\n" || raw == "\\\r\n" {
        return TokenClass::Whitespace;
    }
    if raw.starts_with("//") || raw.starts_with("/*") {
        return TokenClass::Comment;
    }
    if raw.starts_with('#') {
        return if is_directive_name(&crate::lexer::directive_name(raw)) {
            TokenClass::Directive
        } else {
            TokenClass::Identifier
        };
    }
    if looks_numeric(raw) {
        return TokenClass::Literal;
    }
    if raw.len() >= 2
        && ((raw.starts_with('"') && raw.ends_with('"'))
            || (raw.starts_with('<') && raw.ends_with('>')))
    {
        return TokenClass::Literal;
    }
    if is_operator(raw) {
        return TokenClass::Operator;
    }
    if raw.chars().next().map_or(false, is_ident_start) && raw.chars().all(is_ident_char) {
        return classify_word(raw);
    }
    TokenClass::Identifier
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_names_are_normalized() {
        assert_eq!(normalize_directive_name("#PP_DEFINE"), "define");
        assert_eq!(normalize_directive_name("#Include"), "include");
        assert_eq!(normalize_directive_name("# ifdef"), "ifdef");
        assert!(directive_names().any(|n| n == "version"));
        assert_eq!(directive_names().count(), DIRECTIVE_KEYWORDS.len());
    }

    #[test]
    fn classify_lexemes() {
        assert_eq!(classify("#define"), TokenClass::Directive);
        assert_eq!(classify("#  include"), TokenClass::Directive);
        assert_eq!(classify("#bogus"), TokenClass::Identifier);
        assert_eq!(classify("vec3"), TokenClass::BuiltinType);
        assert_eq!(classify("usampler2DArray"), TokenClass::BuiltinType);
        assert_eq!(classify("uniform"), TokenClass::Keyword);
        assert_eq!(classify("highp"), TokenClass::Keyword);
        assert_eq!(classify("goto"), TokenClass::Keyword);
        assert_eq!(classify("myVar"), TokenClass::Identifier);
        assert_eq!(classify("1.5e3f"), TokenClass::Literal);
        assert_eq!(classify(".5"), TokenClass::Literal);
        assert_eq!(classify("true"), TokenClass::Literal);
        assert_eq!(classify("<<="), TokenClass::Operator);
        assert_eq!(classify("// hi"), TokenClass::Comment);
        assert_eq!(classify(" \t"), TokenClass::Whitespace);
        assert_eq!(classify("<foo.glsl>"), TokenClass::Literal);
        assert_eq!(classify("@"), TokenClass::Identifier);
        assert_eq!(classify(""), TokenClass::Identifier);
    }

    #[test]
    fn operators_are_longest_first() {
        for (i, op) in OPERATORS.iter().enumerate() {
            for later in &OPERATORS[i + 1..] {
                assert!(
                    !(later.len() > op.len() && later.starts_with(op)),
                    "{} shadows {}",
                    op,
                    later
                );
            }
        }
    }
}

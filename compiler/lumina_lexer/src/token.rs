use lumina_ir::Location;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Number(f64),
    String(String),
    Boolean(bool),
    Identifier(String),

    // Keywords
    KwFn,
    KwLet,
    KwMut,
    KwReturn,
    KwIf,
    KwElse,
    KwWhile,
    KwMatch,
    KwStruct,
    KwEnum,
    KwTrait,
    KwImpl,
    KwType,
    KwImport,
    KwAs,
    KwFrom,
    KwExtern,
    KwPub,
    KwConst,
    KwIs,
    KwRef,
    KwFor,

    // Punctuation / operators
    Plus,
    Minus,
    StarOp,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    PipeGt,
    Eq,
    Colon,
    ColonColon,
    Comma,
    Dot,
    Arrow,
    Underscore,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,

    Eof,
    /// A lexical error; the parser adapter turns these into diagnostics
    /// rather than aborting (§4.1, §7).
    Error(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}

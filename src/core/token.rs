use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    End,
    /// Synthetic line terminator, only produced while scanning for newlines.
    Newline,
    Semicolon,
    Comma,
    Assign,
    Hook,
    Colon,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    StrictEq,
    Eq,
    StrictNe,
    Ne,
    Lt,
    Le,
    Ge,
    Gt,
    Lsh,
    Rsh,
    Ursh,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Not,
    BitNot,
    Dot,
    LeftBracket,
    RightBracket,
    LeftCurly,
    RightCurly,
    LeftParen,
    RightParen,
    Increment,
    Decrement,
    /// `+` and `-` scanned where an operand is expected.
    UnaryPlus,
    UnaryMinus,
    Identifier,
    Number,
    String,
    RegExp,
    Break,
    Case,
    Catch,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    False,
    Finally,
    For,
    Function,
    If,
    In,
    InstanceOf,
    New,
    Null,
    Return,
    Switch,
    This,
    Throw,
    True,
    Try,
    TypeOf,
    Var,
    Void,
    While,
    With,
}

/// Punctuators, longest first so a prefix never shadows a longer operator.
pub(crate) const OPERATORS: &[(&str, TokenKind)] = &[
    (">>>", TokenKind::Ursh),
    ("===", TokenKind::StrictEq),
    ("!==", TokenKind::StrictNe),
    ("||", TokenKind::Or),
    ("&&", TokenKind::And),
    ("==", TokenKind::Eq),
    ("!=", TokenKind::Ne),
    ("<<", TokenKind::Lsh),
    ("<=", TokenKind::Le),
    (">>", TokenKind::Rsh),
    (">=", TokenKind::Ge),
    ("++", TokenKind::Increment),
    ("--", TokenKind::Decrement),
    (";", TokenKind::Semicolon),
    (",", TokenKind::Comma),
    ("=", TokenKind::Assign),
    ("?", TokenKind::Hook),
    (":", TokenKind::Colon),
    ("|", TokenKind::BitOr),
    ("^", TokenKind::BitXor),
    ("&", TokenKind::BitAnd),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Mul),
    ("/", TokenKind::Div),
    ("%", TokenKind::Mod),
    ("!", TokenKind::Not),
    ("~", TokenKind::BitNot),
    (".", TokenKind::Dot),
    ("[", TokenKind::LeftBracket),
    ("]", TokenKind::RightBracket),
    ("{", TokenKind::LeftCurly),
    ("}", TokenKind::RightCurly),
    ("(", TokenKind::LeftParen),
    (")", TokenKind::RightParen),
];

pub(crate) fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "break" => TokenKind::Break,
        "case" => TokenKind::Case,
        "catch" => TokenKind::Catch,
        "const" => TokenKind::Const,
        "continue" => TokenKind::Continue,
        "debugger" => TokenKind::Debugger,
        "default" => TokenKind::Default,
        "delete" => TokenKind::Delete,
        "do" => TokenKind::Do,
        "else" => TokenKind::Else,
        "false" => TokenKind::False,
        "finally" => TokenKind::Finally,
        "for" => TokenKind::For,
        "function" => TokenKind::Function,
        "if" => TokenKind::If,
        "in" => TokenKind::In,
        "instanceof" => TokenKind::InstanceOf,
        "new" => TokenKind::New,
        "null" => TokenKind::Null,
        "return" => TokenKind::Return,
        "switch" => TokenKind::Switch,
        "this" => TokenKind::This,
        "throw" => TokenKind::Throw,
        "true" => TokenKind::True,
        "try" => TokenKind::Try,
        "typeof" => TokenKind::TypeOf,
        "var" => TokenKind::Var,
        "void" => TokenKind::Void,
        "while" => TokenKind::While,
        "with" => TokenKind::With,
        _ => return None,
    };
    Some(kind)
}

impl TokenKind {
    /// Operators that may be fused with a trailing `=` into a compound assignment.
    pub(crate) fn is_assignable_operator(self) -> bool {
        matches!(
            self,
            TokenKind::BitOr
                | TokenKind::BitXor
                | TokenKind::BitAnd
                | TokenKind::Lsh
                | TokenKind::Rsh
                | TokenKind::Ursh
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Mul
                | TokenKind::Div
                | TokenKind::Mod
        )
    }

    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::End => "end of input",
            TokenKind::Newline => "newline",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::RegExp => "regular expression",
            TokenKind::UnaryPlus => "+",
            TokenKind::UnaryMinus => "-",
            TokenKind::Break => "break",
            TokenKind::Case => "case",
            TokenKind::Catch => "catch",
            TokenKind::Const => "const",
            TokenKind::Continue => "continue",
            TokenKind::Debugger => "debugger",
            TokenKind::Default => "default",
            TokenKind::Delete => "delete",
            TokenKind::Do => "do",
            TokenKind::Else => "else",
            TokenKind::False => "false",
            TokenKind::Finally => "finally",
            TokenKind::For => "for",
            TokenKind::Function => "function",
            TokenKind::If => "if",
            TokenKind::In => "in",
            TokenKind::InstanceOf => "instanceof",
            TokenKind::New => "new",
            TokenKind::Null => "null",
            TokenKind::Return => "return",
            TokenKind::Switch => "switch",
            TokenKind::This => "this",
            TokenKind::Throw => "throw",
            TokenKind::True => "true",
            TokenKind::Try => "try",
            TokenKind::TypeOf => "typeof",
            TokenKind::Var => "var",
            TokenKind::Void => "void",
            TokenKind::While => "while",
            TokenKind::With => "with",
            other => OPERATORS.iter().find(|(_, kind)| *kind == other).map(|(text, _)| *text).unwrap_or("?"),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Number(f64),
    String(String),
    Identifier(String),
    RegExp { pattern: String, flags: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenData {
    pub kind: TokenKind,
    pub value: Option<TokenValue>,
    /// Base operator of a compound assignment such as `+=`.
    pub assign_op: Option<TokenKind>,
    pub line: usize,
    pub column: usize,
    pub start: usize,
    pub end: usize,
}

impl TokenData {
    pub(crate) fn end_of_input(line: usize, offset: usize) -> Self {
        TokenData {
            kind: TokenKind::End,
            value: None,
            assign_op: None,
            line,
            column: 0,
            start: offset,
            end: offset,
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        match &self.value {
            Some(TokenValue::Identifier(name)) => Some(name),
            _ => None,
        }
    }
}

use crate::core::{OPERATORS, TokenData, TokenKind, TokenValue, keyword, number::parse_radix_digits};
use crate::{JSError, raise_eval_error, raise_syntax_error};
use std::rc::Rc;

const LOOKAHEAD_SLOTS: usize = 4;
const SLOT_MASK: usize = LOOKAHEAD_SLOTS - 1;

/// On-demand tokenizer with a small ring buffer for lookahead and pushback.
///
/// The parser toggles `scan_operand` to tell the lexer whether an operand or an
/// operator is expected next; that decides whether `/` starts a regular
/// expression and whether `+`/`-` are unary.
pub struct Lexer<'a> {
    source: &'a str,
    source_name: Rc<str>,
    cursor: usize,
    line: usize,
    line_start: usize,
    tokens: [TokenData; LOOKAHEAD_SLOTS],
    token_index: usize,
    lookahead: usize,
    pub(crate) scan_operand: bool,
    pub(crate) scan_newlines: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, source_name: &str, start_line: usize) -> Self {
        let start_line = start_line.max(1);
        Lexer {
            source,
            source_name: Rc::from(source_name),
            cursor: 0,
            line: start_line,
            line_start: 0,
            tokens: std::array::from_fn(|_| TokenData::end_of_input(start_line, 0)),
            token_index: 0,
            lookahead: 0,
            scan_operand: true,
            scan_newlines: false,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn source_name(&self) -> &Rc<str> {
        &self.source_name
    }

    /// Line the scanner has reached, which may be ahead of the current token.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The most recently consumed token.
    pub fn current(&self) -> &TokenData {
        &self.tokens[self.token_index]
    }

    /// The token consumed before the current one.
    pub(crate) fn previous(&self) -> &TokenData {
        &self.tokens[(self.token_index + SLOT_MASK) & SLOT_MASK]
    }

    pub fn done(&mut self) -> Result<bool, JSError> {
        Ok(self.peek()? == TokenKind::End)
    }

    pub fn next(&mut self) -> Result<&TokenData, JSError> {
        let mut buffered = false;
        while self.lookahead > 0 {
            self.lookahead -= 1;
            self.token_index = (self.token_index + 1) & SLOT_MASK;
            if self.tokens[self.token_index].kind != TokenKind::Newline || self.scan_newlines {
                buffered = true;
                break;
            }
        }
        if !buffered {
            let token = self.scan()?;
            log::trace!("token {:?} at {}:{}", token.kind, token.line, token.column);
            self.token_index = (self.token_index + 1) & SLOT_MASK;
            self.tokens[self.token_index] = token;
        }
        Ok(&self.tokens[self.token_index])
    }

    pub fn peek(&mut self) -> Result<TokenKind, JSError> {
        for offset in 1..=self.lookahead {
            let next = &self.tokens[(self.token_index + offset) & SLOT_MASK];
            if next.kind == TokenKind::Newline && !self.scan_newlines {
                continue;
            }
            if self.scan_newlines && next.line != self.current().line {
                return Ok(TokenKind::Newline);
            }
            return Ok(next.kind);
        }
        let kind = self.next()?.kind;
        self.pushback()?;
        Ok(kind)
    }

    /// Peeks while treating a line break as a `Newline` token.
    pub fn peek_same_line(&mut self) -> Result<TokenKind, JSError> {
        self.scan_newlines = true;
        let kind = self.peek();
        self.scan_newlines = false;
        kind
    }

    pub fn pushback(&mut self) -> Result<(), JSError> {
        self.lookahead += 1;
        if self.lookahead == LOOKAHEAD_SLOTS {
            return Err(raise_eval_error!("token lookahead buffer exhausted"));
        }
        self.token_index = (self.token_index + SLOT_MASK) & SLOT_MASK;
        Ok(())
    }

    pub fn match_token(&mut self, kind: TokenKind) -> Result<bool, JSError> {
        if self.next()?.kind == kind {
            Ok(true)
        } else {
            self.pushback()?;
            Ok(false)
        }
    }

    pub fn must_match(&mut self, kind: TokenKind) -> Result<&TokenData, JSError> {
        if !self.match_token(kind)? {
            return Err(self.syntax_error(&format!("Missing {kind}")));
        }
        Ok(self.current())
    }

    /// Builds a syntax error located at the scanner's cursor.
    pub fn syntax_error(&self, message: &str) -> JSError {
        let mut err = raise_syntax_error!(message);
        err.set_js_location(Some(&self.source_name), self.line, Some(self.column_at(self.cursor)));
        err.set_excerpt(self.excerpt());
        err
    }

    fn column_at(&self, offset: usize) -> usize {
        let start = self.line_start.min(offset);
        self.source[start..offset].chars().count() + 1
    }

    fn excerpt(&self) -> String {
        let cursor = self.cursor.min(self.source.len());
        let start = self.source[..cursor].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let end = self.source[cursor..].find('\n').map(|i| cursor + i).unwrap_or(self.source.len());
        let caret = self.source[start..cursor].chars().count();
        format!("{}\n{}^", &self.source[start..end], " ".repeat(caret))
    }

    fn rest(&self) -> &'a str {
        &self.source[self.cursor..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_char_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.cursor += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.line_start = self.cursor;
        }
        Some(c)
    }

    fn token(&self, kind: TokenKind, value: Option<TokenValue>, start: usize, line: usize) -> TokenData {
        let line_start = if line == self.line { self.line_start } else { 0 };
        let column = self.source[line_start.min(start)..start].chars().count() + 1;
        TokenData {
            kind,
            value,
            assign_op: None,
            line,
            column,
            start,
            end: self.cursor,
        }
    }

    /// Skips whitespace and comments. Returns a `Newline` token when newlines are
    /// significant and a line break was crossed.
    fn skip_blank(&mut self) -> Result<Option<TokenData>, JSError> {
        loop {
            let Some(c) = self.peek_char() else {
                return Ok(None);
            };
            match c {
                '\n' => {
                    if self.scan_newlines {
                        let (start, line) = (self.cursor, self.line);
                        self.bump();
                        let mut token = self.token(TokenKind::Newline, None, start, line);
                        token.column = 0;
                        return Ok(Some(token));
                    }
                    self.bump();
                }
                '/' if self.peek_char_at(1) == Some('/') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '/' if self.peek_char_at(1) == Some('*') => {
                    let (start, line) = (self.cursor, self.line);
                    let Some(close) = self.rest()[2..].find("*/") else {
                        return Err(self.syntax_error("Unterminated comment"));
                    };
                    let end = self.cursor + 2 + close + 2;
                    let mut crossed_line = false;
                    while self.cursor < end {
                        crossed_line |= self.bump() == Some('\n');
                    }
                    if crossed_line && self.scan_newlines {
                        let mut token = self.token(TokenKind::Newline, None, start, line);
                        token.column = 0;
                        return Ok(Some(token));
                    }
                }
                c if c.is_whitespace() || c == '\u{feff}' => {
                    self.bump();
                }
                _ => return Ok(None),
            }
        }
    }

    fn scan(&mut self) -> Result<TokenData, JSError> {
        if let Some(newline) = self.skip_blank()? {
            return Ok(newline);
        }
        let (start, line) = (self.cursor, self.line);
        let Some(c) = self.peek_char() else {
            return Ok(TokenData::end_of_input(self.line, self.cursor));
        };

        if c.is_ascii_digit() || (c == '.' && self.peek_char_at(1).is_some_and(|d| d.is_ascii_digit())) {
            let value = self.scan_number()?;
            return Ok(self.token(TokenKind::Number, Some(TokenValue::Number(value)), start, line));
        }

        if is_identifier_start(c) {
            while self.peek_char().is_some_and(is_identifier_part) {
                self.bump();
            }
            let word = &self.source[start..self.cursor];
            let kind = keyword(word).unwrap_or(TokenKind::Identifier);
            let value = TokenValue::Identifier(word.to_string());
            return Ok(self.token(kind, Some(value), start, line));
        }

        if c == '"' || c == '\'' {
            let value = self.scan_string(c)?;
            return Ok(self.token(TokenKind::String, Some(TokenValue::String(value)), start, line));
        }

        if c == '/' && self.scan_operand {
            let (pattern, flags) = self.scan_regexp()?;
            return Ok(self.token(TokenKind::RegExp, Some(TokenValue::RegExp { pattern, flags }), start, line));
        }

        let rest = self.rest();
        let Some(&(text, kind)) = OPERATORS.iter().find(|(text, _)| rest.starts_with(text)) else {
            return Err(self.syntax_error("Illegal token"));
        };
        self.cursor += text.len();
        if kind == TokenKind::Assign {
            return Ok(self.token(TokenKind::Assign, None, start, line));
        }
        if kind.is_assignable_operator() && self.peek_char() == Some('=') {
            self.bump();
            let mut token = self.token(TokenKind::Assign, None, start, line);
            token.assign_op = Some(kind);
            return Ok(token);
        }
        let kind = match kind {
            TokenKind::Plus if self.scan_operand => TokenKind::UnaryPlus,
            TokenKind::Minus if self.scan_operand => TokenKind::UnaryMinus,
            other => other,
        };
        Ok(self.token(kind, None, start, line))
    }

    fn scan_number(&mut self) -> Result<f64, JSError> {
        let start = self.cursor;
        if self.peek_char() == Some('0')
            && matches!(self.peek_char_at(1), Some('x' | 'X'))
            && self.peek_char_at(2).is_some_and(|c| c.is_ascii_hexdigit())
        {
            self.bump();
            self.bump();
            let digits_start = self.cursor;
            while self.peek_char().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            return Ok(parse_radix_digits(&self.source[digits_start..self.cursor], 16));
        }

        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let integer_part = &self.source[start..self.cursor];
        let mut is_integer = true;
        if self.peek_char() == Some('.') {
            is_integer = false;
            self.bump();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let has_sign = matches!(self.peek_char_at(1), Some('+' | '-'));
            let digit_at = if has_sign { 2 } else { 1 };
            if self.peek_char_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_integer = false;
                for _ in 0..digit_at {
                    self.bump();
                }
                while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }

        if is_integer && integer_part.len() > 1 && integer_part.starts_with('0') && integer_part.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return Ok(parse_radix_digits(&integer_part[1..], 8));
        }
        let text = &self.source[start..self.cursor];
        text.parse::<f64>().map_err(|_| self.syntax_error(&format!("Invalid number literal '{text}'")))
    }

    fn scan_string(&mut self, quote: char) -> Result<String, JSError> {
        self.bump();
        let mut out = String::new();
        let mut pending_surrogate: Option<u32> = None;
        loop {
            let Some(c) = self.peek_char() else {
                return Err(self.syntax_error("Unterminated string literal"));
            };
            if c == '\n' {
                return Err(self.syntax_error("Unterminated string literal"));
            }
            self.bump();
            if c == quote {
                break;
            }
            if c != '\\' {
                flush_surrogate(&mut out, &mut pending_surrogate);
                out.push(c);
                continue;
            }
            let Some(escaped) = self.bump() else {
                return Err(self.syntax_error("Unterminated string literal"));
            };
            let code_unit = match escaped {
                'n' => Some('\n' as u32),
                't' => Some('\t' as u32),
                'r' => Some('\r' as u32),
                'b' => Some(0x08),
                'f' => Some(0x0c),
                'v' => Some(0x0b),
                '0'..='7' => {
                    let max_digits = if escaped <= '3' { 3 } else { 2 };
                    let mut value = escaped.to_digit(8).unwrap_or(0);
                    for _ in 1..max_digits {
                        match self.peek_char().and_then(|d| d.to_digit(8)) {
                            Some(d) => {
                                value = value * 8 + d;
                                self.bump();
                            }
                            None => break,
                        }
                    }
                    Some(value)
                }
                'x' => self.scan_hex_escape(2).or(Some('x' as u32)),
                'u' => self.scan_hex_escape(4).or(Some('u' as u32)),
                '\r' => {
                    if self.peek_char() == Some('\n') {
                        self.bump();
                    }
                    None
                }
                '\n' | '\u{2028}' | '\u{2029}' => None,
                other => Some(other as u32),
            };
            let Some(unit) = code_unit else {
                continue;
            };
            match (pending_surrogate.take(), unit) {
                (Some(high), 0xDC00..=0xDFFF) => {
                    let combined = 0x10000 + ((high - 0xD800) << 10) + (unit - 0xDC00);
                    out.push(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                (previous, 0xD800..=0xDBFF) => {
                    if previous.is_some() {
                        out.push(char::REPLACEMENT_CHARACTER);
                    }
                    pending_surrogate = Some(unit);
                }
                (previous, _) => {
                    if previous.is_some() {
                        out.push(char::REPLACEMENT_CHARACTER);
                    }
                    out.push(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
            }
        }
        flush_surrogate(&mut out, &mut pending_surrogate);
        Ok(out)
    }

    fn scan_hex_escape(&mut self, digits: usize) -> Option<u32> {
        let text = self.rest().get(..digits)?;
        if !text.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(text, 16).ok()?;
        self.cursor += digits;
        Some(value)
    }

    fn scan_regexp(&mut self) -> Result<(String, String), JSError> {
        self.bump();
        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            let c = match self.peek_char() {
                None | Some('\n') => return Err(self.syntax_error("Unterminated regular expression literal")),
                Some(c) => c,
            };
            self.bump();
            match c {
                '\\' => {
                    pattern.push(c);
                    match self.peek_char() {
                        None | Some('\n') => return Err(self.syntax_error("Unterminated regular expression literal")),
                        Some(next) => {
                            self.bump();
                            pattern.push(next);
                        }
                    }
                }
                '[' => {
                    in_class = true;
                    pattern.push(c);
                }
                ']' => {
                    in_class = false;
                    pattern.push(c);
                }
                '/' if !in_class => break,
                _ => pattern.push(c),
            }
        }
        let mut flags = String::new();
        while let Some(c) = self.peek_char().filter(|c| is_identifier_part(*c)) {
            self.bump();
            flags.push(c);
        }
        Ok((pattern, flags))
    }
}

fn flush_surrogate(out: &mut String, pending: &mut Option<u32>) {
    if pending.take().is_some() {
        out.push(char::REPLACEMENT_CHARACTER);
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '$' || c == '_' || (!c.is_ascii() && c.is_alphabetic())
}

fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c) || c.is_ascii_digit() || (!c.is_ascii() && c.is_alphanumeric())
}

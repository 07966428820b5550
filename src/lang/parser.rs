use super::ast::{BinOp, Expr, Program, Stmt};
use crate::shell::error::SyntaxError;

type ParseResult<T> = std::result::Result<T, SyntaxError>;

/// Parse source text into a [`Program`] labelled with where it came from.
pub fn parse_program(source: &str, label: &str) -> ParseResult<Program> {
    let tokens = Scanner::new(source, label).scan()?;
    let mut parser = Parser {
        source,
        label,
        tokens,
        index: 0,
    };
    let body = parser.parse_statements(None)?;
    Ok(Program::new(label, source, body))
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Int(i64),
    Text(String),
    Ident(String),
    Punct(&'static str),
    Newline,
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    line: usize,
    column: usize,
}

const PUNCTUATION: &[&str] = &[
    ":=", "==", "!=", "<=", ">=", "(", ")", "[", "]", "{", "}", ",", ";", "+", "-", "*", "/",
    "%", "<", ">",
];

const KEYWORDS: &[&str] = &["def", "nil", "true", "false"];

struct Scanner<'a> {
    src: &'a str,
    label: &'a str,
    bytes: &'a [u8],
    index: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str, label: &'a str) -> Self {
        Self {
            src,
            label,
            bytes: src.as_bytes(),
            index: 0,
            line: 1,
            line_start: 0,
        }
    }

    fn current(&self) -> Option<u8> {
        self.bytes.get(self.index).copied()
    }

    fn peek_char(&self) -> Option<u8> {
        self.bytes.get(self.index + 1).copied()
    }

    fn advance(&mut self) {
        if self.index < self.bytes.len() {
            self.index += 1;
        }
    }

    /// 1-based column, counted in characters rather than bytes
    fn column(&self) -> usize {
        self.src
            .get(self.line_start..self.index)
            .map_or(self.index - self.line_start, |prefix| prefix.chars().count())
            + 1
    }

    fn scan(mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_ws();
            let (line, column) = (self.line, self.column());
            let Some(ch) = self.current() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line,
                    column,
                });
                return Ok(tokens);
            };

            let kind = match ch {
                b'\n' => {
                    self.advance();
                    self.line += 1;
                    self.line_start = self.index;
                    TokenKind::Newline
                }
                b'"' => self.scan_string()?,
                b'0'..=b'9' => self.scan_integer()?,
                c if c.is_ascii_alphabetic() || c == b'_' => self.scan_ident(),
                _ => self.scan_punct()?,
            };
            tokens.push(Token { kind, line, column });
        }
    }

    fn skip_ws(&mut self) {
        loop {
            while let Some(ch) = self.current() {
                if ch != b'\n' && ch.is_ascii_whitespace() {
                    self.advance();
                } else {
                    break;
                }
            }
            // `//` comments run to the end of the line
            if self.current() == Some(b'/') && self.peek_char() == Some(b'/') {
                while let Some(ch) = self.current() {
                    if ch == b'\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }
            break;
        }
    }

    fn scan_string(&mut self) -> ParseResult<TokenKind> {
        // consume opening quote
        self.advance();
        let mut buf = Vec::new();
        while let Some(ch) = self.current() {
            match ch {
                b'"' => {
                    self.advance();
                    let text = String::from_utf8(buf)
                        .map_err(|_| self.error("invalid UTF-8 in string literal"))?;
                    return Ok(TokenKind::Text(text));
                }
                b'\n' => break,
                b'\\' => {
                    self.advance();
                    let escaped = self
                        .current()
                        .ok_or_else(|| self.error("incomplete escape"))?;
                    let value = match escaped {
                        b'"' => b'"',
                        b'\\' => b'\\',
                        b'n' => b'\n',
                        b't' => b'\t',
                        other => {
                            return Err(
                                self.error(&format!("unknown escape: \\{}", other as char))
                            );
                        }
                    };
                    self.advance();
                    buf.push(value);
                }
                other => {
                    self.advance();
                    buf.push(other);
                }
            }
        }
        Err(self.error("unterminated string literal"))
    }

    fn scan_integer(&mut self) -> ParseResult<TokenKind> {
        let start = self.index;
        while matches!(self.current(), Some(b'0'..=b'9')) {
            self.advance();
        }
        self.src[start..self.index]
            .parse::<i64>()
            .map(TokenKind::Int)
            .map_err(|_| self.error("integer literal out of range"))
    }

    fn scan_ident(&mut self) -> TokenKind {
        let start = self.index;
        while let Some(ch) = self.current() {
            if ch.is_ascii_alphanumeric() || ch == b'_' {
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::Ident(self.src[start..self.index].to_string())
    }

    fn scan_punct(&mut self) -> ParseResult<TokenKind> {
        let rest = &self.bytes[self.index..];
        for &punct in PUNCTUATION {
            if rest.starts_with(punct.as_bytes()) {
                for _ in 0..punct.len() {
                    self.advance();
                }
                return Ok(TokenKind::Punct(punct));
            }
        }
        let ch = self.src[self.index..].chars().next().unwrap_or('?');
        Err(self.error(&format!("unexpected character '{}'", ch)))
    }

    fn error(&self, message: &str) -> SyntaxError {
        syntax_error(self.src, self.label, self.line, self.column(), message)
    }
}

struct Parser<'a> {
    source: &'a str,
    label: &'a str,
    tokens: Vec<Token>,
    index: usize,
}

impl<'a> Parser<'a> {
    fn current(&self) -> &Token {
        // The scanner always terminates the stream with Eof.
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[(self.index + 1).min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        token
    }

    fn at_punct(&self, punct: &str) -> bool {
        matches!(&self.current().kind, TokenKind::Punct(p) if *p == punct)
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.at_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: &str) -> ParseResult<Token> {
        if self.at_punct(punct) {
            Ok(self.advance())
        } else {
            Err(self.error_here(&format!("expected '{}'", punct)))
        }
    }

    fn skip_newlines(&mut self) {
        while self.current().kind == TokenKind::Newline {
            self.advance();
        }
    }

    fn skip_separators(&mut self) {
        while self.current().kind == TokenKind::Newline || self.at_punct(";") {
            self.advance();
        }
    }

    fn at_end(&self, terminator: Option<&str>) -> bool {
        match terminator {
            Some(punct) => self.at_punct(punct) || self.current().kind == TokenKind::Eof,
            None => self.current().kind == TokenKind::Eof,
        }
    }

    fn parse_statements(&mut self, terminator: Option<&str>) -> ParseResult<Vec<Stmt>> {
        let mut body = Vec::new();
        loop {
            self.skip_separators();
            if self.at_end(terminator) {
                break;
            }
            body.push(self.parse_statement()?);
            if self.at_end(terminator) {
                break;
            }
            if self.current().kind != TokenKind::Newline && !self.at_punct(";") {
                return Err(self.error_here("expected end of statement"));
            }
        }
        Ok(body)
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        if let TokenKind::Ident(word) = self.current().kind.clone() {
            if word == "def" {
                self.advance();
                let name = self.expect_name()?;
                self.expect_punct(":=")?;
                self.skip_newlines();
                let value = self.parse_expr()?;
                return Ok(Stmt::Def { name, value });
            }
            if !KEYWORDS.contains(&word.as_str())
                && matches!(self.peek_kind(), TokenKind::Punct(":="))
            {
                let line = self.current().line;
                let name = self.expect_name()?;
                self.advance();
                self.skip_newlines();
                let value = self.parse_expr()?;
                return Ok(Stmt::Assign { name, value, line });
            }
        }
        Ok(Stmt::Expr(self.parse_expr()?))
    }

    fn expect_name(&mut self) -> ParseResult<String> {
        match &self.current().kind {
            TokenKind::Ident(name) if !KEYWORDS.contains(&name.as_str()) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_here("expected a name")),
        }
    }

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        let left = self.parse_additive()?;
        let op = match &self.current().kind {
            TokenKind::Punct("==") => BinOp::Eq,
            TokenKind::Punct("!=") => BinOp::Ne,
            TokenKind::Punct("<") => BinOp::Lt,
            TokenKind::Punct("<=") => BinOp::Le,
            TokenKind::Punct(">") => BinOp::Gt,
            TokenKind::Punct(">=") => BinOp::Ge,
            _ => return Ok(left),
        };
        let line = self.advance().line;
        self.skip_newlines();
        let right = self.parse_additive()?;
        Ok(binary(op, left, right, line))
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match &self.current().kind {
                TokenKind::Punct("+") => BinOp::Add,
                TokenKind::Punct("-") => BinOp::Sub,
                _ => return Ok(left),
            };
            let line = self.advance().line;
            self.skip_newlines();
            let right = self.parse_term()?;
            left = binary(op, left, right, line);
        }
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match &self.current().kind {
                TokenKind::Punct("*") => BinOp::Mul,
                TokenKind::Punct("/") => BinOp::Div,
                TokenKind::Punct("%") => BinOp::Rem,
                _ => return Ok(left),
            };
            let line = self.advance().line;
            self.skip_newlines();
            let right = self.parse_unary()?;
            left = binary(op, left, right, line);
        }
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.eat_punct("-") {
            let operand = self.parse_unary()?;
            return Ok(match operand {
                Expr::Int(value) => Expr::Int(-value),
                other => Expr::Neg(Box::new(other)),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Int(value) => {
                self.advance();
                Ok(Expr::Int(value))
            }
            TokenKind::Text(text) => {
                self.advance();
                Ok(Expr::Text(text))
            }
            TokenKind::Ident(word) => {
                self.advance();
                match word.as_str() {
                    "nil" => Ok(Expr::Nil),
                    "true" => Ok(Expr::Bool(true)),
                    "false" => Ok(Expr::Bool(false)),
                    "def" => Err(syntax_error(
                        self.source,
                        self.label,
                        token.line,
                        token.column,
                        "'def' is only allowed as a statement",
                    )),
                    _ if self.at_punct("(") => {
                        self.advance();
                        let args = self.parse_list(")")?;
                        Ok(Expr::Call {
                            name: word,
                            args,
                            line: token.line,
                        })
                    }
                    _ => Ok(Expr::Ident {
                        name: word,
                        line: token.line,
                    }),
                }
            }
            TokenKind::Punct("(") => {
                self.advance();
                self.skip_newlines();
                let inner = self.parse_expr()?;
                self.skip_newlines();
                self.expect_punct(")")?;
                Ok(inner)
            }
            TokenKind::Punct("[") => {
                self.advance();
                Ok(Expr::Table(self.parse_list("]")?))
            }
            TokenKind::Punct("{") => {
                self.advance();
                let body = self.parse_statements(Some("}"))?;
                self.expect_punct("}")?;
                Ok(Expr::Block {
                    body,
                    line: token.line,
                })
            }
            TokenKind::Eof => Err(self.error_at(&token, "unexpected end of input")),
            TokenKind::Newline => Err(self.error_at(&token, "unexpected end of line")),
            TokenKind::Punct(p) => Err(self.error_at(&token, &format!("unexpected '{}'", p))),
        }
    }

    /// Comma-separated expressions up to `close`; the opener is already consumed.
    fn parse_list(&mut self, close: &str) -> ParseResult<Vec<Expr>> {
        let mut items = Vec::new();
        self.skip_newlines();
        if self.eat_punct(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expr()?);
            self.skip_newlines();
            if self.eat_punct(close) {
                return Ok(items);
            }
            self.expect_punct(",")?;
            self.skip_newlines();
        }
    }

    fn error_here(&self, message: &str) -> SyntaxError {
        let token = self.current().clone();
        self.error_at(&token, message)
    }

    fn error_at(&self, token: &Token, message: &str) -> SyntaxError {
        syntax_error(self.source, self.label, token.line, token.column, message)
    }
}

fn binary(op: BinOp, left: Expr, right: Expr, line: usize) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        line,
    }
}

fn syntax_error(source: &str, label: &str, line: usize, column: usize, message: &str) -> SyntaxError {
    SyntaxError {
        label: label.to_string(),
        line,
        column,
        offending: source.lines().nth(line - 1).unwrap_or_default().to_string(),
        message: message.to_string(),
    }
}

use crate::token::{keyword, Token, TokenKind};
use dingo_sourcemap::Position;

/// A comment as scanned from the source, with its position and raw text
/// (including the leading `//` or `/* ... */` delimiters). Plugins
/// enumerate these through `ParsedFile::comments` rather than walking
/// the token stream themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub pos: Position,
    /// True for `// ...` line comments, false for `/* ... */` block comments.
    pub line: bool,
}

pub struct Lexer<'a> {
    src: &'a [u8],
    offset: usize,
    line: u32,
    col: u32,
    pub comments: Vec<Comment>,
}

/// Does a token of this kind trigger Go's automatic-semicolon-insertion
/// rule when immediately followed by a newline?
fn triggers_asi(kind: &TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Ident
            | Int
            | Float
            | String
            | Char
            | True
            | False
            | Nil
            | Break
            | Continue
            | Fallthrough
            | Return
            | Inc
            | Dec
            | RParen
            | RBracket
            | RBrace
            | Question
    )
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            offset: 0,
            line: 1,
            col: 1,
            comments: Vec::new(),
        }
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.col)
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.offset).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.src.get(self.offset + 1).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.offset += 1;
        if c == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    /// Tokenize the entire input, inserting virtual semicolons per Go's
    /// ASI rule and collecting comments separately. Marker comments
    /// must round-trip through the parser unmodified as free-floating
    /// comments; this lexer is what preserves them.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Comment>) {
        let mut tokens = Vec::new();
        let mut last_kind: Option<TokenKind> = None;
        loop {
            let had_newline = self.skip_space_tracking_newline(&mut last_kind, &mut tokens);
            if had_newline {
                continue;
            }
            let start = self.pos();
            let Some(c) = self.peek() else {
                if last_kind.as_ref().is_some_and(triggers_asi) {
                    tokens.push(Token::new(TokenKind::Semicolon, "\n", start));
                }
                tokens.push(Token::new(TokenKind::Eof, "", start));
                break;
            };
            let tok = self.scan_one(c, start);
            last_kind = Some(tok.kind.clone());
            tokens.push(tok);
        }
        (tokens, self.comments)
    }

    /// Consumes whitespace and comments. Returns true (and possibly
    /// pushes a virtual semicolon) if a newline was crossed, so the
    /// caller re-checks for more whitespace/comments before the next token.
    fn skip_space_tracking_newline(
        &mut self,
        last_kind: &mut Option<TokenKind>,
        tokens: &mut Vec<Token>,
    ) -> bool {
        let mut crossed_newline = false;
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') => {
                    self.bump();
                }
                Some(b'\n') => {
                    self.bump();
                    crossed_newline = true;
                }
                Some(b'/') if self.peek2() == Some(b'/') => {
                    self.scan_line_comment();
                }
                Some(b'/') if self.peek2() == Some(b'*') => {
                    let had_nl = self.scan_block_comment();
                    crossed_newline |= had_nl;
                }
                _ => break,
            }
        }
        if crossed_newline && last_kind.as_ref().is_some_and(triggers_asi) {
            tokens.push(Token::new(TokenKind::Semicolon, "\n", self.pos()));
            *last_kind = None;
        }
        false
    }

    fn scan_line_comment(&mut self) {
        let start = self.pos();
        let mut text = String::from("//");
        self.bump();
        self.bump();
        while let Some(c) = self.peek() {
            if c == b'\n' {
                break;
            }
            text.push(c as char);
            self.bump();
        }
        self.comments.push(Comment {
            text,
            pos: start,
            line: true,
        });
    }

    /// Returns true if the block comment spans at least one newline
    /// (which itself can trigger ASI per the Go spec).
    fn scan_block_comment(&mut self) -> bool {
        let start = self.pos();
        let mut text = String::from("/*");
        self.bump();
        self.bump();
        let mut had_newline = false;
        loop {
            match self.peek() {
                None => break,
                Some(b'\n') => {
                    had_newline = true;
                    text.push('\n');
                    self.bump();
                }
                Some(b'*') if self.peek2() == Some(b'/') => {
                    text.push_str("*/");
                    self.bump();
                    self.bump();
                    break;
                }
                Some(c) => {
                    text.push(c as char);
                    self.bump();
                }
            }
        }
        self.comments.push(Comment {
            text,
            pos: start,
            line: false,
        });
        had_newline
    }

    fn scan_one(&mut self, c: u8, start: Position) -> Token {
        if c.is_ascii_alphabetic() || c == b'_' {
            return self.scan_ident(start);
        }
        if c.is_ascii_digit() {
            return self.scan_number(start);
        }
        if c == b'"' || c == b'`' {
            return self.scan_string(start, c);
        }
        if c == b'\'' {
            return self.scan_char(start);
        }
        self.scan_punct(start)
    }

    fn scan_ident(&mut self, start: Position) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                text.push(c as char);
                self.bump();
            } else {
                break;
            }
        }
        let kind = keyword(&text).unwrap_or(TokenKind::Ident);
        Token::new(kind, text, start)
    }

    fn scan_number(&mut self, start: Position) -> Token {
        let mut text = String::new();
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c as char);
                self.bump();
            } else if c == b'.' && !is_float {
                is_float = true;
                text.push('.');
                self.bump();
            } else {
                break;
            }
        }
        Token::new(if is_float { TokenKind::Float } else { TokenKind::Int }, text, start)
    }

    fn scan_string(&mut self, start: Position, quote: u8) -> Token {
        let mut text = String::new();
        text.push(quote as char);
        self.bump();
        while let Some(c) = self.peek() {
            if c == quote {
                text.push(c as char);
                self.bump();
                break;
            }
            if c == b'\\' && quote != b'`' {
                text.push(c as char);
                self.bump();
                if let Some(escaped) = self.peek() {
                    text.push(escaped as char);
                    self.bump();
                }
                continue;
            }
            text.push(c as char);
            self.bump();
        }
        Token::new(TokenKind::String, text, start)
    }

    fn scan_char(&mut self, start: Position) -> Token {
        let mut text = String::from("'");
        self.bump();
        while let Some(c) = self.peek() {
            if c == b'\'' {
                text.push('\'');
                self.bump();
                break;
            }
            if c == b'\\' {
                text.push('\\');
                self.bump();
                if let Some(escaped) = self.peek() {
                    text.push(escaped as char);
                    self.bump();
                }
                continue;
            }
            text.push(c as char);
            self.bump();
        }
        Token::new(TokenKind::Char, text, start)
    }

    fn scan_punct(&mut self, start: Position) -> Token {
        use TokenKind::*;
        macro_rules! tok {
            ($kind:expr, $text:expr, $n:expr) => {{
                for _ in 0..$n {
                    self.bump();
                }
                return Token::new($kind, $text, start);
            }};
        }
        let c = self.bump().unwrap();
        let c2 = self.peek();
        match (c, c2) {
            (b'(', _) => Token::new(LParen, "(", start),
            (b')', _) => Token::new(RParen, ")", start),
            (b'{', _) => Token::new(LBrace, "{", start),
            (b'}', _) => Token::new(RBrace, "}", start),
            (b'[', _) => Token::new(LBracket, "[", start),
            (b']', _) => Token::new(RBracket, "]", start),
            (b',', _) => Token::new(Comma, ",", start),
            (b';', _) => Token::new(Semicolon, ";", start),
            (b':', Some(b'=')) => tok!(Define, ":=", 1),
            (b':', _) => Token::new(Colon, ":", start),
            (b'.', Some(b'.')) if self.src.get(self.offset + 1) == Some(&b'.') => {
                tok!(Ellipsis, "...", 2)
            }
            (b'.', _) => Token::new(Dot, ".", start),
            (b'?', _) => Token::new(Question, "?", start),
            (b'+', Some(b'+')) => tok!(Inc, "++", 1),
            (b'+', Some(b'=')) => tok!(PlusAssign, "+=", 1),
            (b'+', _) => Token::new(Plus, "+", start),
            (b'-', Some(b'-')) => tok!(Dec, "--", 1),
            (b'-', Some(b'=')) => tok!(MinusAssign, "-=", 1),
            (b'-', _) => Token::new(Minus, "-", start),
            (b'*', Some(b'=')) => tok!(StarAssign, "*=", 1),
            (b'*', _) => Token::new(Star, "*", start),
            (b'/', Some(b'=')) => tok!(SlashAssign, "/=", 1),
            (b'/', _) => Token::new(Slash, "/", start),
            (b'%', Some(b'=')) => tok!(PercentAssign, "%=", 1),
            (b'%', _) => Token::new(Percent, "%", start),
            (b'&', Some(b'&')) => tok!(AndAnd, "&&", 1),
            (b'&', Some(b'^')) => tok!(AndNot, "&^", 1),
            (b'&', Some(b'=')) => tok!(AmpAssign, "&=", 1),
            (b'&', _) => Token::new(Amp, "&", start),
            (b'|', Some(b'|')) => tok!(OrOr, "||", 1),
            (b'|', Some(b'=')) => tok!(PipeAssign, "|=", 1),
            (b'|', _) => Token::new(Pipe, "|", start),
            (b'^', Some(b'=')) => tok!(CaretAssign, "^=", 1),
            (b'^', _) => Token::new(Caret, "^", start),
            (b'=', Some(b'=')) => tok!(Eq, "==", 1),
            (b'=', _) => Token::new(Assign, "=", start),
            (b'!', Some(b'=')) => tok!(NotEq, "!=", 1),
            (b'!', _) => Token::new(Not, "!", start),
            (b'<', Some(b'-')) => tok!(Arrow, "<-", 1),
            (b'<', Some(b'<')) => tok!(Shl, "<<", 1),
            (b'<', Some(b'=')) => tok!(LtEq, "<=", 1),
            (b'<', _) => Token::new(Lt, "<", start),
            (b'>', Some(b'>')) => tok!(Shr, ">>", 1),
            (b'>', Some(b'=')) => tok!(GtEq, ">=", 1),
            (b'>', _) => Token::new(Gt, ">", start),
            (other, _) => Token::new(TokenKind::Ident, (other as char).to_string(), start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn asi_inserts_semicolon_after_ident_at_line_end() {
        let k = kinds("x\ny");
        assert_eq!(
            k,
            vec![TokenKind::Ident, TokenKind::Semicolon, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn no_asi_after_operators() {
        let k = kinds("x +\ny");
        assert_eq!(k, vec![TokenKind::Ident, TokenKind::Plus, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn collects_line_comments_separately_from_tokens() {
        let (tokens, comments) = Lexer::new("// DINGO_MATCH_START: r\nx").tokenize();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "// DINGO_MATCH_START: r");
        assert_eq!(tokens[0].kind, TokenKind::Ident);
    }

    #[test]
    fn question_mark_is_its_own_token() {
        let k = kinds("f()?");
        assert!(k.contains(&TokenKind::Question));
    }
}

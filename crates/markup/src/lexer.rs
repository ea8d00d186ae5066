//! Character-level HTML lexer.
//!
//! The lexer keeps a three-character window (previous, current, lookahead)
//! over the input. Entity references are resolved while advancing, so every
//! caller sees exactly one logical character per reference and can ask
//! whether the current character came from an entity (an entity-produced
//! `<` or `>` never delimits a tag).
//!
//! The caller drives the mode: `next_content_token` outside tags,
//! `next_tag_token` inside them, and the unconditional
//! `next_equal_sign_token` / `next_atom_token` while reading attributes.
//!
//! Known quirk (kept on purpose): a failed entity match drops the characters
//! consumed while trying to match it.
use std::str::Chars;

use crate::entities::{
    MAX_NAMED_ENTITY_LEN, MAX_NUMERIC_ENTITY_DIGITS, entity_char, numeric_entity_char,
};
use crate::error::EngineInvariantError;
use crate::types::{Token, TokenKind};

fn is_name_start(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

fn is_name_char(ch: char) -> bool {
    is_name_start(ch) || matches!(ch, '.' | '-' | ':') || ch.is_ascii_digit()
}

pub struct HtmlLexer<'a> {
    input: Chars<'a>,
    /// `None` once the input is exhausted.
    next: Option<char>,
    lookahead: Option<char>,
    previous: char,
    next_is_entity: bool,
    ignore_next_whitespace: bool,
    token: String,
    kind: TokenKind,
}

impl<'a> HtmlLexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.chars();
        let lookahead = chars.next();
        let mut lexer = Self {
            input: chars,
            next: Some(' '),
            lookahead,
            previous: ' ',
            next_is_entity: false,
            ignore_next_whitespace: true,
            token: String::with_capacity(100),
            kind: TokenKind::Text,
        };
        // The virtual leading space is never past the end, so this first
        // step cannot fail.
        lexer.shift();
        lexer
    }

    pub fn token_kind(&self) -> TokenKind {
        self.kind
    }

    pub fn token_text(&self) -> &str {
        &self.token
    }

    pub fn token(&self) -> Token {
        Token::new(self.kind, self.token.as_str())
    }

    pub fn is_at_end_of_stream(&self) -> bool {
        self.next.is_none()
    }

    /// Next token assuming the cursor is outside a tag: a tag start, a text
    /// run, a comment, or end of stream.
    pub fn next_content_token(&mut self) -> Result<TokenKind, EngineInvariantError> {
        self.token.clear();
        if self.is_at_end_of_stream() {
            return Ok(self.finish(TokenKind::EndOfStream));
        }

        if self.is_at_tag_start() {
            self.advance()?;
            if self.next == Some('/') {
                self.token.push_str("</");
                self.kind = TokenKind::ClosingTagStart;
                self.advance()?;
                // whitespace after a closing tag is significant
                self.ignore_next_whitespace = false;
            } else {
                self.token.push('<');
                self.kind = TokenKind::OpeningTagStart;
                self.ignore_next_whitespace = true;
            }
        } else if self.is_at_directive_start() {
            self.advance()?;
            match self.lookahead {
                Some('[') => self.read_dynamic_content()?,
                Some('-') => self.read_comment()?,
                _ => self.read_unknown_directive()?,
            }
        } else {
            self.read_text()?;
        }

        log::trace!(target: "markup.lexer", "content token: {:?} {:?}", self.kind, self.token);
        Ok(self.kind)
    }

    /// Next token assuming the cursor is inside a tag: `>`, `/>`, a name, or a
    /// single-character atom for anything unexpected.
    pub fn next_tag_token(&mut self) -> Result<TokenKind, EngineInvariantError> {
        self.token.clear();
        if self.is_at_end_of_stream() {
            return Ok(self.finish(TokenKind::EndOfStream));
        }

        self.skip_whitespace()?;

        let Some(ch) = self.next else {
            return Ok(self.finish(TokenKind::EndOfStream));
        };

        if ch == '>' && !self.next_is_entity {
            self.kind = TokenKind::TagEnd;
            self.token.push('>');
            self.advance()?;
        } else if ch == '/' && self.lookahead == Some('>') {
            self.kind = TokenKind::EmptyTagEnd;
            self.token.push_str("/>");
            self.advance()?;
            self.advance()?;
            // whitespace after a no-content element is significant
            self.ignore_next_whitespace = false;
        } else if is_name_start(ch) {
            self.kind = TokenKind::Name;
            while let Some(ch) = self.next {
                if !is_name_char(ch) {
                    break;
                }
                self.token.push(ch);
                self.advance()?;
            }
        } else {
            self.kind = TokenKind::Atom;
            self.token.push(ch);
            self.advance()?;
        }

        log::trace!(target: "markup.lexer", "tag token: {:?} {:?}", self.kind, self.token);
        Ok(self.kind)
    }

    /// Always yields an equal sign, consuming a real `=` only if one follows.
    pub fn next_equal_sign_token(&mut self) -> Result<TokenKind, EngineInvariantError> {
        self.token.clear();
        self.token.push('=');
        self.kind = TokenKind::EqualSign;

        self.skip_whitespace()?;
        if self.next == Some('=') {
            self.advance()?;
        }
        Ok(self.kind)
    }

    /// Always yields an atom: a quoted value (quotes stripped) or the run of
    /// characters up to whitespace or `>`. Possibly empty.
    pub fn next_atom_token(&mut self) -> Result<TokenKind, EngineInvariantError> {
        self.token.clear();
        self.skip_whitespace()?;
        self.kind = TokenKind::Atom;

        match self.next {
            Some(quote @ ('\'' | '"')) if !self.next_is_entity => {
                self.advance()?;
                while let Some(ch) = self.next {
                    if ch == quote && !self.next_is_entity {
                        break;
                    }
                    self.token.push(ch);
                    self.advance()?;
                }
                if self.next == Some(quote) {
                    self.advance()?;
                }
            }
            _ => {
                while let Some(ch) = self.next {
                    if ch.is_whitespace() || ch == '>' {
                        break;
                    }
                    self.token.push(ch);
                    self.advance()?;
                }
            }
        }

        log::trace!(target: "markup.lexer", "atom token: {:?}", self.token);
        Ok(self.kind)
    }

    fn finish(&mut self, kind: TokenKind) -> TokenKind {
        self.kind = kind;
        kind
    }

    fn is_at_tag_start(&self) -> bool {
        self.next == Some('<')
            && !self.next_is_entity
            && self
                .lookahead
                .is_some_and(|ch| ch == '/' || is_name_start(ch))
    }

    fn is_at_directive_start(&self) -> bool {
        self.next == Some('<') && self.lookahead == Some('!') && !self.next_is_entity
    }

    fn read_text(&mut self) -> Result<(), EngineInvariantError> {
        self.kind = TokenKind::Text;
        while !self.is_at_tag_start() && !self.is_at_directive_start() {
            let Some(ch) = self.next else {
                break;
            };
            if ch == '<' && !self.next_is_entity && self.lookahead == Some('?') {
                self.skip_processing_directive()?;
                continue;
            }
            if ch <= ' ' {
                if !self.ignore_next_whitespace {
                    self.token.push(' ');
                }
                self.ignore_next_whitespace = true;
            } else {
                self.token.push(ch);
                self.ignore_next_whitespace = false;
            }
            self.advance()?;
        }
        Ok(())
    }

    /// `<![ ... ]>`: skipped, yields an empty text token.
    fn read_dynamic_content(&mut self) -> Result<(), EngineInvariantError> {
        self.kind = TokenKind::Text;
        self.token.clear();
        // past '!' and '['
        self.advance()?;
        self.advance_unless_end()?;
        while !self.is_at_end_of_stream()
            && !(self.next == Some(']') && self.lookahead == Some('>'))
        {
            self.advance()?;
        }
        if !self.is_at_end_of_stream() {
            self.advance()?;
            self.advance()?;
        }
        Ok(())
    }

    /// `<!-- ... -->`, also accepting `!>` as terminator. Inner `--` is kept.
    fn read_comment(&mut self) -> Result<(), EngineInvariantError> {
        self.kind = TokenKind::Comment;
        self.token.clear();
        // onto the first '-', the second '-', then the first content char
        for _ in 0..3 {
            self.advance_unless_end()?;
        }

        loop {
            while let Some(ch) = self.next {
                let at_dashes = ch == '-' && self.lookahead == Some('-');
                let at_bang_end = ch == '!' && self.lookahead == Some('>');
                if at_dashes || at_bang_end {
                    break;
                }
                self.token.push(ch);
                self.advance()?;
            }
            if self.is_at_end_of_stream() {
                break;
            }

            self.advance()?;
            if self.previous == '-' && self.next == Some('-') && self.lookahead == Some('>') {
                self.advance()?;
                break;
            } else if self.previous == '!' && self.next == Some('>') {
                break;
            }
            self.token.push(self.previous);
        }

        if self.next == Some('>') {
            self.advance()?;
        }
        Ok(())
    }

    /// `<!DOCTYPE ...>` and friends: skipped up to the next real `>`.
    fn read_unknown_directive(&mut self) -> Result<(), EngineInvariantError> {
        self.kind = TokenKind::Text;
        self.token.clear();
        self.advance()?;
        while let Some(ch) = self.next {
            if ch == '>' && !self.next_is_entity {
                break;
            }
            self.advance()?;
        }
        self.advance_unless_end()
    }

    /// `<? ... ?>` (or `... />`), dropped from text entirely.
    fn skip_processing_directive(&mut self) -> Result<(), EngineInvariantError> {
        self.advance()?;
        self.advance()?;
        while let Some(ch) = self.next {
            if (ch == '?' || ch == '/') && self.lookahead == Some('>') {
                break;
            }
            self.advance()?;
        }
        if !self.is_at_end_of_stream() {
            self.advance()?;
            self.advance()?;
        }
        Ok(())
    }

    /// Whitespace inside a tag, together with any `<?..>`, `<!..>` or
    /// `<![..]]>` construct embedded there.
    fn skip_whitespace(&mut self) -> Result<(), EngineInvariantError> {
        loop {
            if self.next == Some('<') && matches!(self.lookahead, Some('?' | '!')) {
                self.advance()?;
                if self.lookahead == Some('[') {
                    while !self.is_at_end_of_stream()
                        && !(self.previous == ']'
                            && self.next == Some(']')
                            && self.lookahead == Some('>'))
                    {
                        self.advance()?;
                    }
                    if self.next == Some(']') {
                        self.advance()?;
                    }
                } else {
                    while self.next.is_some_and(|ch| ch != '>') {
                        self.advance()?;
                    }
                }
                if self.next == Some('>') {
                    self.advance()?;
                }
            }

            match self.next {
                Some(ch) if ch.is_whitespace() => self.advance()?,
                _ => return Ok(()),
            }
        }
    }

    fn advance_unless_end(&mut self) -> Result<(), EngineInvariantError> {
        if self.is_at_end_of_stream() {
            return Ok(());
        }
        self.advance()
    }

    /// Moves the window one logical character forward. Advancing past the end
    /// of the stream is a caller bug.
    fn advance(&mut self) -> Result<(), EngineInvariantError> {
        let Some(current) = self.next else {
            return Err(EngineInvariantError::new(
                "lexer advanced past end of stream",
            ));
        };
        self.previous = current;
        self.shift();
        Ok(())
    }

    fn shift(&mut self) {
        self.next = self.lookahead;
        self.next_is_entity = false;
        self.read_lookahead();

        if self.next == Some('&') {
            self.decode_entity();
        }
    }

    fn read_lookahead(&mut self) {
        if self.lookahead.is_some() {
            self.lookahead = self.input.next();
        }
    }

    /// Called with `&` as the current character.
    fn decode_entity(&mut self) {
        match self.lookahead {
            Some('#') => {
                self.read_lookahead();
                let mut code: u32 = 0;
                for _ in 0..MAX_NUMERIC_ENTITY_DIGITS {
                    let Some(digit) = self.lookahead.filter(char::is_ascii_digit) else {
                        break;
                    };
                    code = code * 10 + (digit as u32 - '0' as u32);
                    self.read_lookahead();
                }
                if self.lookahead == Some(';') {
                    self.read_lookahead();
                    self.next = Some(numeric_entity_char(code));
                    self.next_is_entity = true;
                } else {
                    self.next = self.lookahead;
                    self.read_lookahead();
                }
            }
            Some(ch) if ch.is_alphabetic() => {
                let mut name = String::new();
                for _ in 0..MAX_NAMED_ENTITY_LEN {
                    let Some(ch) = self.lookahead.filter(|ch| ch.is_alphanumeric()) else {
                        break;
                    };
                    name.push(ch);
                    self.read_lookahead();
                }
                if self.lookahead == Some(';') {
                    self.read_lookahead();
                    if let Some(decoded) = entity_char(&name) {
                        self.next = Some(decoded);
                        self.next_is_entity = true;
                        return;
                    }
                }
                self.next = self.lookahead;
                self.read_lookahead();
            }
            _ => {}
        }
    }
}

/// Runs the lexer over `input` switching modes the way the parser does, and
/// collects every token including the final `EndOfStream`.
pub fn tokenize(input: &str) -> Result<Vec<Token>, EngineInvariantError> {
    let mut lexer = HtmlLexer::new(input);
    let mut tokens = Vec::new();
    let mut kind = lexer.next_content_token()?;

    loop {
        tokens.push(lexer.token());
        match kind {
            TokenKind::EndOfStream => break,
            TokenKind::OpeningTagStart => {
                kind = lexer.next_tag_token()?;
                tokens.push(lexer.token());
                if kind == TokenKind::Name {
                    kind = lexer.next_tag_token()?;
                    tokens.push(lexer.token());
                    while !matches!(
                        kind,
                        TokenKind::TagEnd | TokenKind::EmptyTagEnd | TokenKind::EndOfStream
                    ) {
                        if kind == TokenKind::Name {
                            lexer.next_equal_sign_token()?;
                            tokens.push(lexer.token());
                            lexer.next_atom_token()?;
                            tokens.push(lexer.token());
                        }
                        kind = lexer.next_tag_token()?;
                        tokens.push(lexer.token());
                    }
                }
            }
            TokenKind::ClosingTagStart => {
                kind = lexer.next_tag_token()?;
                tokens.push(lexer.token());
                if kind == TokenKind::Name {
                    kind = lexer.next_tag_token()?;
                    tokens.push(lexer.token());
                }
            }
            _ => {}
        }
        if kind == TokenKind::EndOfStream {
            break;
        }
        kind = lexer.next_content_token()?;
    }

    Ok(tokens)
}

//! Script lexer

use super::ScriptError;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Num(f64),
    Str(String),
    /// 템플릿 리터럴: 문자열 조각과 `${...}` 소스가 번갈아 옴
    Template(Vec<RawSegment>),
    Ident(String),
    Punct(&'static str),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawSegment {
    Lit(String),
    Code(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: usize,
    pub col: usize,
}

/// 길이가 긴 것부터 매칭
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "=>", "==", "!=", "<=", ">=", "&&", "||", "??", "++", "--", "+=", "-=", "*=",
    "/=", "%=", "?.", "(", ")", "{", "}", "[", "]", ",", ";", ".", "?", ":", "+", "-", "*", "/",
    "%", "!", "=", "<", ">",
];

pub fn tokenize(source: &str) -> Result<Vec<Token>, ScriptError> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::Syntax(format!("{} ({}:{})", message.into(), self.line, self.col))
    }

    fn run(mut self) -> Result<Vec<Token>, ScriptError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_trivia()?;
            let (line, col) = (self.line, self.col);
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    tok: Tok::Eof,
                    line,
                    col,
                });
                return Ok(tokens);
            };

            let tok = if c.is_ascii_digit()
                || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()))
            {
                self.number()?
            } else if c == '"' || c == '\'' {
                Tok::Str(self.string(c)?)
            } else if c == '`' {
                self.template()?
            } else if c.is_alphabetic() || c == '_' || c == '$' {
                self.ident()
            } else {
                self.punct()?
            };

            tokens.push(Token { tok, line, col });
        }
    }

    fn skip_trivia(&mut self) -> Result<(), ScriptError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                            None => return Err(self.error("Unterminated comment")),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn number(&mut self) -> Result<Tok, ScriptError> {
        let start = self.pos;

        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.bump();
            self.bump();
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits: String = self.chars[digits_start..self.pos].iter().collect();
            return u64::from_str_radix(&digits, 16)
                .map(|n| Tok::Num(n as f64))
                .map_err(|_| self.error("Invalid hexadecimal literal"));
        }

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign_ok = match self.peek_at(1) {
                Some('+') | Some('-') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if sign_ok {
                self.bump();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.bump();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map(Tok::Num)
            .map_err(|_| self.error(format!("Invalid number '{}'", text)))
    }

    fn escape(&mut self) -> Result<char, ScriptError> {
        let c = self
            .bump()
            .ok_or_else(|| self.error("Unterminated string"))?;
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            'x' => self.hex_escape(2)?,
            'u' => {
                if self.peek() == Some('{') {
                    self.bump();
                    let mut digits = String::new();
                    while let Some(d) = self.bump() {
                        if d == '}' {
                            break;
                        }
                        digits.push(d);
                    }
                    u32::from_str_radix(&digits, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| self.error("Invalid Unicode escape"))?
                } else {
                    self.hex_escape(4)?
                }
            }
            other => other,
        })
    }

    fn hex_escape(&mut self, len: usize) -> Result<char, ScriptError> {
        let mut digits = String::with_capacity(len);
        for _ in 0..len {
            match self.bump() {
                Some(d) if d.is_ascii_hexdigit() => digits.push(d),
                _ => return Err(self.error("Invalid escape sequence")),
            }
        }
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("Invalid escape sequence"))
    }

    fn string(&mut self, quote: char) -> Result<String, ScriptError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => out.push(self.escape()?),
                Some('\n') | None => return Err(self.error("Invalid or unexpected token")),
                Some(c) => out.push(c),
            }
        }
    }

    fn template(&mut self) -> Result<Tok, ScriptError> {
        self.bump();
        let mut segments = Vec::new();
        let mut lit = String::new();

        loop {
            match self.bump() {
                Some('`') => break,
                Some('\\') => lit.push(self.escape()?),
                Some('$') if self.peek() == Some('{') => {
                    self.bump();
                    if !lit.is_empty() {
                        segments.push(RawSegment::Lit(std::mem::take(&mut lit)));
                    }
                    segments.push(RawSegment::Code(self.template_code()?));
                }
                Some(c) => lit.push(c),
                None => return Err(self.error("Unterminated template literal")),
            }
        }

        if !lit.is_empty() {
            segments.push(RawSegment::Lit(lit));
        }
        Ok(Tok::Template(segments))
    }

    /// `${` 다음부터 짝이 맞는 `}`까지의 소스
    fn template_code(&mut self) -> Result<String, ScriptError> {
        let mut depth = 0usize;
        let mut code = String::new();
        let mut quote: Option<char> = None;

        loop {
            let c = self
                .bump()
                .ok_or_else(|| self.error("Unterminated template expression"))?;

            if let Some(q) = quote {
                code.push(c);
                if c == '\\' {
                    if let Some(next) = self.bump() {
                        code.push(next);
                    }
                } else if c == q {
                    quote = None;
                }
                continue;
            }

            match c {
                '"' | '\'' => {
                    quote = Some(c);
                    code.push(c);
                }
                '{' => {
                    depth += 1;
                    code.push(c);
                }
                '}' if depth == 0 => return Ok(code),
                '}' => {
                    depth -= 1;
                    code.push(c);
                }
                _ => code.push(c),
            }
        }
    }

    fn ident(&mut self) -> Tok {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        {
            self.bump();
        }
        Tok::Ident(self.chars[start..self.pos].iter().collect())
    }

    fn punct(&mut self) -> Result<Tok, ScriptError> {
        for p in PUNCTUATORS {
            let len = p.chars().count();
            let matches = p
                .chars()
                .enumerate()
                .all(|(i, pc)| self.peek_at(i) == Some(pc));
            if !matches {
                continue;
            }
            // `a?.5:1`은 옵셔널 체이닝이 아님
            if *p == "?." && self.peek_at(2).is_some_and(|c| c.is_ascii_digit()) {
                continue;
            }
            for _ in 0..len {
                self.bump();
            }
            return Ok(Tok::Punct(p));
        }

        let c = self.peek().unwrap_or(' ');
        Err(self.error(format!("Invalid or unexpected token '{}'", c)))
    }
}

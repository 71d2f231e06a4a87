//! PSF ASCII tokenizer.

use crate::error::{Error, Result};

/// Token types for PSF ASCII files.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Quoted string, quotes removed.
    Str(String),
    /// Numeric literal.
    Number(f64),
    /// Bare word: section keywords and type names.
    Word(String),
    LParen,
    RParen,
    Eof,
}

/// A token with the line it started on.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub line: usize,
}

/// Lexer for PSF ASCII files.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    /// Tokenize the whole input. The last token is always `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<SpannedToken>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    pub fn next_token(&mut self) -> Result<SpannedToken> {
        self.skip_whitespace();
        let line = self.line;

        let token = match self.chars.peek().copied() {
            None => Token::Eof,
            Some('(') => {
                self.chars.next();
                Token::LParen
            }
            Some(')') => {
                self.chars.next();
                Token::RParen
            }
            Some('"') => {
                self.chars.next();
                Token::Str(self.read_string(line)?)
            }
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                let text = self.read_word();
                let value = text.parse().map_err(|_| Error::Parse {
                    line,
                    message: format!("invalid number '{}'", text),
                })?;
                Token::Number(value)
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let word = self.read_word();
                match word.as_str() {
                    "inf" | "nan" | "NaN" => Token::Number(word.parse().map_err(|_| {
                        Error::Parse {
                            line,
                            message: format!("invalid number '{}'", word),
                        }
                    })?),
                    _ => Token::Word(word),
                }
            }
            Some(c) => {
                return Err(Error::Parse {
                    line,
                    message: format!("unexpected character '{}'", c),
                })
            }
        };

        Ok(SpannedToken { token, line })
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                self.line += 1;
            } else if !c.is_whitespace() {
                break;
            }
            self.chars.next();
        }
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '(' | ')' | '"') {
                break;
            }
            word.push(c);
            self.chars.next();
        }
        word
    }

    fn read_string(&mut self, start: usize) -> Result<String> {
        let mut s = String::new();
        loop {
            match self.chars.next() {
                Some('"') => return Ok(s),
                Some('\\') => match self.chars.next() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(c) => s.push(c),
                    None => break,
                },
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    s.push(c);
                }
                None => break,
            }
        }
        Err(Error::Parse {
            line: start,
            message: "unterminated string".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_tokens() {
        assert_eq!(
            tokens("\"freq\" FLOAT DOUBLE PROP(\n\"grid\" 3\n)"),
            vec![
                Token::Str("freq".to_string()),
                Token::Word("FLOAT".to_string()),
                Token::Word("DOUBLE".to_string()),
                Token::Word("PROP".to_string()),
                Token::LParen,
                Token::Str("grid".to_string()),
                Token::Number(3.0),
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("1.5e-12 -3 (2.0 -1e3)"),
            vec![
                Token::Number(1.5e-12),
                Token::Number(-3.0),
                Token::LParen,
                Token::Number(2.0),
                Token::Number(-1e3),
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_line_numbers() {
        let toks = Lexer::new("HEADER\n\n\"a\" 1\n").tokenize().unwrap();
        assert_eq!(toks[0].line, 1);
        assert_eq!(toks[1].line, 3);
        assert_eq!(toks[2].line, 3);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Lexer::new("\"open").tokenize(),
            Err(Error::Parse { line: 1, .. })
        ));
        assert!(matches!(
            Lexer::new("HEADER\n1.2.3").tokenize(),
            Err(Error::Parse { line: 2, .. })
        ));
        assert!(Lexer::new("HEADER\n@").tokenize().is_err());
    }
}

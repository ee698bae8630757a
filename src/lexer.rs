use crate::ast::{Delimiter, Token};
use crate::parser::ParseError;

/// Scanner over desugared query text.
///
/// Recognizes parentheses, the `& | ,` delimiters and bare tokens. Anything
/// else (whitespace included) is an illegal character.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Position of the next unread character
    pub fn position(&self) -> usize {
        self.position
    }

    fn read_word(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if is_word_char(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        match self.current_char() {
            None => Ok(Token::Eof),
            Some('(') => {
                self.advance();
                Ok(Token::LParen)
            }
            Some(')') => {
                self.advance();
                Ok(Token::RParen)
            }
            Some('&') => {
                self.advance();
                Ok(Token::Delimiter(Delimiter::And))
            }
            Some('|') => {
                self.advance();
                Ok(Token::Delimiter(Delimiter::Or))
            }
            Some(',') => {
                self.advance();
                Ok(Token::Delimiter(Delimiter::Comma))
            }
            Some(ch) if is_word_char(ch) => Ok(Token::Word(self.read_word())),
            Some(_) => {
                let rest: String = self.input[self.position..].iter().collect();
                Err(ParseError::Syntax(format!(
                    "Illegal character in query string encountered {}",
                    rest
                )))
            }
        }
    }
}

/// Bare-token alphabet: ASCII letters, digits and `+ * $ - : % . _`
pub fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '+' | '*' | '$' | '-' | ':' | '%' | '.' | '_')
}

#[test]
fn test_call_tokens() {
    let mut lexer = Lexer::new("in(price,(5,10))");
    assert_eq!(lexer.next_token().unwrap(), Token::Word("in".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::LParen);
    assert_eq!(lexer.next_token().unwrap(), Token::Word("price".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Delimiter(Delimiter::Comma));
    assert_eq!(lexer.next_token().unwrap(), Token::LParen);
    assert_eq!(lexer.next_token().unwrap(), Token::Word("5".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Delimiter(Delimiter::Comma));
    assert_eq!(lexer.next_token().unwrap(), Token::Word("10".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::RParen);
    assert_eq!(lexer.next_token().unwrap(), Token::RParen);
    assert_eq!(lexer.next_token().unwrap(), Token::Eof);
}

#[test]
fn test_conjunction_delimiters() {
    let mut lexer = Lexer::new("a&b|c");
    assert_eq!(lexer.next_token().unwrap(), Token::Word("a".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Delimiter(Delimiter::And));
    assert_eq!(lexer.next_token().unwrap(), Token::Word("b".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Delimiter(Delimiter::Or));
    assert_eq!(lexer.next_token().unwrap(), Token::Word("c".to_string()));
}

#[test]
fn test_illegal_character() {
    let mut lexer = Lexer::new("a b");
    assert_eq!(lexer.next_token().unwrap(), Token::Word("a".to_string()));
    assert!(lexer.next_token().is_err());
}

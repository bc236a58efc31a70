//! Expression tokenizer
//!
//! Whitespace is insignificant between tokens and inside numbers (`"1 2"` is
//! read as `12`). It does end a name, so `"BA SIC"` is two names, and a
//! placeholder must be written without any.

use crate::error::{FormulaError, FormulaResult};

/// Which tokens besides numbers, operators and parentheses are accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
    /// Plain arithmetic: digits, `.`, `+ - * / ( )`
    Arithmetic,
    /// Arithmetic plus `UPPER_CASE` variable references and `{{#name}}`
    /// placeholders
    References,
}

/// Expression tokens
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric literal
    Number(f64),
    /// Variable reference (`[A-Z_][A-Z0-9_]*`)
    Variable(String),
    /// Contextual placeholder `{{#name}}`, holding `name`
    Placeholder(String),
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
}

impl Token {
    /// Check if the token is a value rather than an operator or parenthesis
    pub fn is_operand(&self) -> bool {
        matches!(
            self,
            Token::Number(_) | Token::Variable(_) | Token::Placeholder(_)
        )
    }
}

/// Tokenize a plain arithmetic expression
///
/// # Example
/// ```rust
/// use tally_formula::lexer::{tokenize, Token};
///
/// let tokens = tokenize("2 + 3.5").unwrap();
/// assert_eq!(tokens, vec![Token::Number(2.0), Token::Plus, Token::Number(3.5)]);
/// ```
pub fn tokenize(input: &str) -> FormulaResult<Vec<Token>> {
    tokenize_with_mode(input, LexMode::Arithmetic)
}

/// Tokenize an expression, accepting references according to `mode`
pub fn tokenize_with_mode(input: &str, mode: LexMode) -> FormulaResult<Vec<Token>> {
    Lexer::new(input, mode).run()
}

struct Lexer {
    /// Non-whitespace characters with their position in the input
    chars: Vec<(usize, char)>,
    pos: usize,
    mode: LexMode,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(input: &str, mode: LexMode) -> Self {
        let chars = input
            .chars()
            .enumerate()
            .filter(|(_, c)| !c.is_whitespace())
            .collect();
        Self {
            chars,
            pos: 0,
            mode,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> FormulaResult<Vec<Token>> {
        while let Some(c) = self.peek_char() {
            match c {
                '+' => self.single(Token::Plus),
                '-' => self.single(Token::Minus),
                '*' => self.single(Token::Star),
                '/' => self.single(Token::Slash),
                '(' => self.single(Token::LeftParen),
                ')' => self.single(Token::RightParen),
                c if c.is_ascii_digit() || c == '.' => self.scan_number()?,
                c if self.mode == LexMode::References && (c.is_ascii_alphabetic() || c == '_') => {
                    self.scan_variable()?
                }
                '{' if self.mode == LexMode::References => self.scan_placeholder()?,
                _ => return Err(self.invalid_here()),
            }
        }
        Ok(self.tokens)
    }

    fn single(&mut self, token: Token) {
        self.advance();
        self.tokens.push(token);
    }

    fn scan_number(&mut self) -> FormulaResult<()> {
        let mut text = String::new();
        while let Some(c) = self
            .peek_char()
            .filter(|c| c.is_ascii_digit() || *c == '.')
        {
            text.push(c);
            self.advance();
        }

        // `2A` is not an implicit product
        if self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        {
            return Err(self.invalid_here());
        }

        let value = text
            .parse::<f64>()
            .map_err(|_| FormulaError::InvalidNumber(text.clone()))?;
        self.tokens.push(Token::Number(value));
        Ok(())
    }

    /// Scan a name; a word holding any lowercase letter is invalid from its
    /// first character
    fn scan_variable(&mut self) -> FormulaResult<()> {
        let start = self.pos;
        let mut name = String::new();
        while let Some(c) = self
            .peek_adjoining(start)
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        {
            name.push(c);
            self.advance();
        }

        if name.chars().any(|c| c.is_ascii_lowercase()) {
            self.pos = start;
            return Err(self.invalid_here());
        }

        self.tokens.push(Token::Variable(name));
        Ok(())
    }

    /// Scan `{{#name}}`; anything else starting with `{` is invalid
    fn scan_placeholder(&mut self) -> FormulaResult<()> {
        let start = self.pos;
        for expected in ['{', '{', '#'] {
            if self.peek_adjoining(start) != Some(expected) {
                self.pos = start;
                return Err(self.invalid_here());
            }
            self.advance();
        }

        let mut name = String::new();
        while let Some(c) = self.peek_adjoining(start).filter(|c| {
            c.is_ascii_alphabetic() || *c == '_' || (c.is_ascii_digit() && !name.is_empty())
        }) {
            name.push(c);
            self.advance();
        }

        for _ in 0..2 {
            if name.is_empty() || self.peek_adjoining(start) != Some('}') {
                self.pos = start;
                return Err(self.invalid_here());
            }
            self.advance();
        }

        self.tokens.push(Token::Placeholder(name));
        Ok(())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    /// Next character, unless whitespace separates it from the previous one
    /// within a token that began at `start`
    fn peek_adjoining(&self, start: usize) -> Option<char> {
        if self.pos > start {
            let previous = self.chars.get(self.pos - 1).map(|(i, _)| *i);
            let current = self.chars.get(self.pos).map(|(i, _)| *i);
            if previous.map(|i| i + 1) != current {
                return None;
            }
        }
        self.peek_char()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn invalid_here(&self) -> FormulaError {
        match self.chars.get(self.pos) {
            Some(&(position, character)) => FormulaError::Syntax {
                character,
                position,
            },
            None => FormulaError::InvalidExpression,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tokenize_arithmetic() {
        assert_eq!(
            tokenize("(1+2)*3.5/4-.5").unwrap(),
            vec![
                Token::LeftParen,
                Token::Number(1.0),
                Token::Plus,
                Token::Number(2.0),
                Token::RightParen,
                Token::Star,
                Token::Number(3.5),
                Token::Slash,
                Token::Number(4.0),
                Token::Minus,
                Token::Number(0.5),
            ]
        );
    }

    #[test]
    fn test_whitespace_is_stripped() {
        assert_eq!(tokenize(" 1 2 +\t3\n").unwrap(), tokenize("12+3").unwrap());
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(
            tokenize("1 + x").unwrap_err(),
            FormulaError::Syntax {
                character: 'x',
                position: 4
            }
        );
        assert_eq!(
            tokenize("2^3").unwrap_err(),
            FormulaError::Syntax {
                character: '^',
                position: 1
            }
        );
    }

    #[test]
    fn test_arithmetic_mode_rejects_references() {
        assert!(matches!(
            tokenize("BASIC*2"),
            Err(FormulaError::Syntax { character: 'B', .. })
        ));
        assert!(matches!(
            tokenize("{{#days}}"),
            Err(FormulaError::Syntax { character: '{', .. })
        ));
    }

    #[test]
    fn test_invalid_number() {
        assert_eq!(
            tokenize("1.2.3+1").unwrap_err(),
            FormulaError::InvalidNumber("1.2.3".into())
        );
        assert_eq!(
            tokenize("1+.").unwrap_err(),
            FormulaError::InvalidNumber(".".into())
        );
    }

    #[test]
    fn test_tokenize_references() {
        assert_eq!(
            tokenize_with_mode("(GROSS/30)*{{#num_of_days}}", LexMode::References).unwrap(),
            vec![
                Token::LeftParen,
                Token::Variable("GROSS".into()),
                Token::Slash,
                Token::Number(30.0),
                Token::RightParen,
                Token::Star,
                Token::Placeholder("num_of_days".into()),
            ]
        );
        assert_eq!(
            tokenize_with_mode("_X1+A_2", LexMode::References).unwrap(),
            vec![
                Token::Variable("_X1".into()),
                Token::Plus,
                Token::Variable("A_2".into()),
            ]
        );
    }

    #[test]
    fn test_lowercase_names_are_invalid() {
        assert_eq!(
            tokenize_with_mode("Gross*2", LexMode::References).unwrap_err(),
            FormulaError::Syntax {
                character: 'G',
                position: 0
            }
        );
        assert_eq!(
            tokenize_with_mode("BASIC * GROSs", LexMode::References).unwrap_err(),
            FormulaError::Syntax {
                character: 'G',
                position: 8
            }
        );
        assert_eq!(
            tokenize_with_mode("1+days", LexMode::References).unwrap_err(),
            FormulaError::Syntax {
                character: 'd',
                position: 2
            }
        );
    }

    #[test]
    fn test_whitespace_ends_names() {
        assert_eq!(
            tokenize_with_mode("BA SIC", LexMode::References).unwrap(),
            vec![Token::Variable("BA".into()), Token::Variable("SIC".into())]
        );
        assert_eq!(
            tokenize_with_mode("BASIC 2", LexMode::References).unwrap(),
            vec![Token::Variable("BASIC".into()), Token::Number(2.0)]
        );
        assert_eq!(
            tokenize_with_mode(" BASIC\t* 2 ", LexMode::References).unwrap(),
            vec![Token::Variable("BASIC".into()), Token::Star, Token::Number(2.0)]
        );
    }

    #[test]
    fn test_number_followed_by_name_is_invalid() {
        assert_eq!(
            tokenize_with_mode("2A", LexMode::References).unwrap_err(),
            FormulaError::Syntax {
                character: 'A',
                position: 1
            }
        );
    }

    #[test]
    fn test_malformed_placeholder() {
        assert_eq!(
            tokenize_with_mode("1+{{days}}", LexMode::References).unwrap_err(),
            FormulaError::Syntax {
                character: '{',
                position: 2
            }
        );
        assert!(matches!(
            tokenize_with_mode("{{#1x}}", LexMode::References),
            Err(FormulaError::Syntax { character: '{', .. })
        ));
        assert!(matches!(
            tokenize_with_mode("{{#", LexMode::References),
            Err(FormulaError::Syntax { character: '{', .. })
        ));
        assert!(matches!(
            tokenize_with_mode("{{#days}", LexMode::References),
            Err(FormulaError::Syntax { character: '{', .. })
        ));
    }

    #[test]
    fn test_placeholder_must_not_contain_whitespace() {
        assert_eq!(
            tokenize_with_mode("2*{{# days}}", LexMode::References).unwrap_err(),
            FormulaError::Syntax {
                character: '{',
                position: 2
            }
        );
        for input in ["{ {#days}}", "{{ #days}}", "{{#da ys}}", "{{#days} }"] {
            assert_eq!(
                tokenize_with_mode(input, LexMode::References).unwrap_err(),
                FormulaError::Syntax {
                    character: '{',
                    position: 0
                },
                "input: {}",
                input
            );
        }
        assert_eq!(
            tokenize_with_mode(" {{#days}} ", LexMode::References).unwrap(),
            vec![Token::Placeholder("days".into())]
        );
    }
}

//! Expression parser
//!
//! Parsing runs in three steps: tokenize, reorder into postfix with the
//! shunting-yard algorithm, then assemble the postfix sequence into an
//! [`Expr`] tree with a value stack.
//!
//! Precedence (lowest to highest), all left-associative:
//! 1. Addition/Subtraction: `+`, `-`
//! 2. Multiplication/Division: `*`, `/`

use crate::ast::{BinaryOperator, Expr};
use crate::error::{FormulaError, FormulaResult};
use crate::lexer::{tokenize_with_mode, LexMode, Token};

/// Parse an expression that may reference variables and placeholders
///
/// # Example
/// ```rust
/// use tally_formula::{parse_expression, BinaryOperator, Expr};
///
/// let ast = parse_expression("(GROSS/30)*{{#days}}").unwrap();
/// assert!(matches!(ast, Expr::BinaryOp { op: BinaryOperator::Multiply, .. }));
/// assert_eq!(ast.references(), vec!["GROSS"]);
/// ```
pub fn parse_expression(input: &str) -> FormulaResult<Expr> {
    parse_with_mode(input, LexMode::References)
}

/// Parse a plain arithmetic expression (numbers and operators only)
pub fn parse_arithmetic(input: &str) -> FormulaResult<Expr> {
    parse_with_mode(input, LexMode::Arithmetic)
}

fn parse_with_mode(input: &str, mode: LexMode) -> FormulaResult<Expr> {
    let tokens = tokenize_with_mode(input, mode)?;
    let postfix = to_postfix(tokens)?;
    assemble(postfix)
}

/// Map an operator token to its operator
pub(crate) fn operator_of(token: &Token) -> Option<BinaryOperator> {
    match token {
        Token::Plus => Some(BinaryOperator::Add),
        Token::Minus => Some(BinaryOperator::Subtract),
        Token::Star => Some(BinaryOperator::Multiply),
        Token::Slash => Some(BinaryOperator::Divide),
        _ => None,
    }
}

/// Reorder infix tokens into postfix (shunting-yard)
///
/// An operator pops every stacked operator of greater or equal precedence
/// before being pushed. Parentheses never appear in the output.
pub fn to_postfix(tokens: Vec<Token>) -> FormulaResult<Vec<Token>> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();

    for token in tokens {
        if token.is_operand() {
            output.push(token);
            continue;
        }

        match token {
            Token::LeftParen => stack.push(token),
            Token::RightParen => loop {
                match stack.pop() {
                    Some(Token::LeftParen) => break,
                    Some(op) => output.push(op),
                    None => return Err(FormulaError::MismatchedParentheses),
                }
            },
            _ => {
                // Operand tokens were handled above, parentheses just now
                let Some(op) = operator_of(&token) else {
                    return Err(FormulaError::InvalidExpression);
                };
                while let Some(top) = stack.last().and_then(operator_of) {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    output.extend(stack.pop());
                }
                stack.push(token);
            }
        }
    }

    while let Some(token) = stack.pop() {
        if matches!(token, Token::LeftParen | Token::RightParen) {
            return Err(FormulaError::MismatchedParentheses);
        }
        output.push(token);
    }

    Ok(output)
}

/// Build an expression tree from a postfix token sequence
///
/// Each operator takes the two most recent operands: the earlier one is the
/// left side. Exactly one tree must remain at the end.
pub fn assemble(postfix: Vec<Token>) -> FormulaResult<Expr> {
    let mut stack: Vec<Expr> = Vec::new();

    for token in postfix {
        let node = match token {
            Token::Number(n) => Expr::Number(n),
            Token::Variable(name) => Expr::Variable(name),
            Token::Placeholder(name) => Expr::Placeholder(name),
            other => {
                let op = operator_of(&other).ok_or(FormulaError::InvalidExpression)?;
                let right = stack.pop().ok_or(FormulaError::InvalidExpression)?;
                let left = stack.pop().ok_or(FormulaError::InvalidExpression)?;
                Expr::binary(op, left, right)
            }
        };
        stack.push(node);
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(expr), true) => Ok(expr),
        _ => Err(FormulaError::InvalidExpression),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use pretty_assertions::assert_eq;

    fn postfix_string(input: &str) -> String {
        let tokens = tokenize_with_mode(input, LexMode::References).unwrap();
        to_postfix(tokens)
            .unwrap()
            .iter()
            .map(|t| match t {
                Token::Number(n) => n.to_string(),
                Token::Variable(name) => name.clone(),
                Token::Placeholder(name) => format!("#{}", name),
                other => operator_of(other).unwrap().to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_postfix_precedence() {
        assert_eq!(postfix_string("2+3*4"), "2 3 4 * +");
        assert_eq!(postfix_string("(2+3)*4"), "2 3 + 4 *");
        assert_eq!(postfix_string("A*B+C/D"), "A B * C D / +");
    }

    #[test]
    fn test_postfix_left_associative() {
        assert_eq!(postfix_string("8-3-2"), "8 3 - 2 -");
        assert_eq!(postfix_string("8/4*2"), "8 4 / 2 *");
    }

    #[test]
    fn test_postfix_placeholders() {
        assert_eq!(
            postfix_string("(GROSS/30)*{{#num_of_days}}"),
            "GROSS 30 / #num_of_days *"
        );
    }

    #[test]
    fn test_mismatched_parentheses() {
        for input in ["(1+2", "1+2)", "((1)", ")(", "(1))+(2"] {
            let tokens = tokenize(input).unwrap();
            assert_eq!(
                to_postfix(tokens).unwrap_err(),
                FormulaError::MismatchedParentheses,
                "input: {}",
                input
            );
        }
    }

    #[test]
    fn test_parse_tree_shape() {
        let ast = parse_expression("1+2*X").unwrap();
        assert_eq!(
            ast,
            Expr::binary(
                BinaryOperator::Add,
                Expr::Number(1.0),
                Expr::binary(
                    BinaryOperator::Multiply,
                    Expr::Number(2.0),
                    Expr::Variable("X".into())
                )
            )
        );
    }

    #[test]
    fn test_parse_subtraction_keeps_operand_order() {
        let ast = parse_arithmetic("10-4").unwrap();
        assert_eq!(
            ast,
            Expr::binary(
                BinaryOperator::Subtract,
                Expr::Number(10.0),
                Expr::Number(4.0)
            )
        );
    }

    #[test]
    fn test_invalid_expression() {
        // Operator without enough operands
        assert_eq!(
            parse_arithmetic("1+").unwrap_err(),
            FormulaError::InvalidExpression
        );
        assert_eq!(
            parse_arithmetic("*2").unwrap_err(),
            FormulaError::InvalidExpression
        );
        // No unary minus
        assert_eq!(
            parse_arithmetic("-5").unwrap_err(),
            FormulaError::InvalidExpression
        );
        // Operands left over
        assert_eq!(
            parse_arithmetic("(1)(2)").unwrap_err(),
            FormulaError::InvalidExpression
        );
        // Nothing at all
        assert_eq!(
            parse_arithmetic("  ").unwrap_err(),
            FormulaError::InvalidExpression
        );
        assert_eq!(
            parse_arithmetic("()").unwrap_err(),
            FormulaError::InvalidExpression
        );
    }
}

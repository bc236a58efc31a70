//! Expression evaluator
//!
//! Evaluates expression trees (or raw postfix sequences) to numbers using
//! IEEE double precision, with no rounding.

use crate::ast::{BinaryOperator, Expr};
use crate::error::{FormulaError, FormulaResult};
use crate::lexer::{tokenize, Token};
use crate::parser::{operator_of, to_postfix};

/// Source of values for variable references and placeholders
pub trait Environment {
    /// Value of a variable reference
    fn variable(&self, name: &str) -> FormulaResult<f64> {
        Err(FormulaError::UndefinedVariable(name.to_string()))
    }

    /// Value of a contextual placeholder
    fn placeholder(&self, name: &str) -> FormulaResult<f64> {
        Err(FormulaError::MissingContextValue(name.to_string()))
    }
}

/// Environment with no variables and no placeholders
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyEnvironment;

impl Environment for EmptyEnvironment {}

impl<E: Environment + ?Sized> Environment for &E {
    fn variable(&self, name: &str) -> FormulaResult<f64> {
        (**self).variable(name)
    }

    fn placeholder(&self, name: &str) -> FormulaResult<f64> {
        (**self).placeholder(name)
    }
}

/// Tokenize, convert and evaluate a plain arithmetic expression
///
/// # Example
/// ```rust
/// use tally_formula::{tokenize_and_evaluate, FormulaError};
///
/// assert_eq!(tokenize_and_evaluate("2+3*4").unwrap(), 14.0);
/// assert_eq!(tokenize_and_evaluate("(2+3)*4").unwrap(), 20.0);
/// assert_eq!(tokenize_and_evaluate("1/0"), Err(FormulaError::DivisionByZero));
/// ```
pub fn tokenize_and_evaluate(input: &str) -> FormulaResult<f64> {
    let tokens = tokenize(input)?;
    let postfix = to_postfix(tokens)?;
    evaluate_postfix(&postfix, &EmptyEnvironment)
}

impl Expr {
    /// Evaluate this tree against an environment
    pub fn evaluate(&self, env: &impl Environment) -> FormulaResult<f64> {
        evaluate(self, env)
    }
}

/// Pending work while walking a tree
enum Step<'a> {
    Visit(&'a Expr),
    Apply(BinaryOperator),
}

/// Evaluate an expression tree
///
/// The tree is walked post-order with an explicit stack, left side before
/// right side, so the depth of the tree is bounded only by memory.
pub fn evaluate(expr: &Expr, env: &impl Environment) -> FormulaResult<f64> {
    let mut steps = vec![Step::Visit(expr)];
    let mut values: Vec<f64> = Vec::new();

    while let Some(step) = steps.pop() {
        let value = match step {
            Step::Visit(Expr::Number(n)) => *n,
            Step::Visit(Expr::Variable(name)) => env.variable(name)?,
            Step::Visit(Expr::Placeholder(name)) => env.placeholder(name)?,
            Step::Visit(Expr::BinaryOp { op, left, right }) => {
                steps.push(Step::Apply(*op));
                steps.push(Step::Visit(&**right));
                steps.push(Step::Visit(&**left));
                continue;
            }
            Step::Apply(op) => {
                let right = values.pop().ok_or(FormulaError::InvalidExpression)?;
                let left = values.pop().ok_or(FormulaError::InvalidExpression)?;
                apply(op, left, right)?
            }
        };
        values.push(value);
    }

    values.pop().ok_or(FormulaError::InvalidExpression)
}

/// Evaluate a postfix token sequence with a value stack
///
/// Operand tokens push their value; an operator pops the top value as its
/// right side and the one below as its left side. Exactly one value must
/// remain at the end.
pub fn evaluate_postfix(postfix: &[Token], env: &impl Environment) -> FormulaResult<f64> {
    let mut stack: Vec<f64> = Vec::new();

    for token in postfix {
        let value = match token {
            Token::Number(n) => *n,
            Token::Variable(name) => env.variable(name)?,
            Token::Placeholder(name) => env.placeholder(name)?,
            other => {
                let op = operator_of(other).ok_or(FormulaError::InvalidExpression)?;
                let right = stack.pop().ok_or(FormulaError::InvalidExpression)?;
                let left = stack.pop().ok_or(FormulaError::InvalidExpression)?;
                apply(op, left, right)?
            }
        };
        stack.push(value);
    }

    match stack.as_slice() {
        [value] => Ok(*value),
        _ => Err(FormulaError::InvalidExpression),
    }
}

fn apply(op: BinaryOperator, left: f64, right: f64) -> FormulaResult<f64> {
    match op {
        BinaryOperator::Add => Ok(left + right),
        BinaryOperator::Subtract => Ok(left - right),
        BinaryOperator::Multiply => Ok(left * right),
        BinaryOperator::Divide => {
            if right == 0.0 {
                Err(FormulaError::DivisionByZero)
            } else {
                Ok(left / right)
            }
        }
    }
}

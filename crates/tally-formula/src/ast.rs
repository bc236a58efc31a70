//! Expression tree types
//!
//! Trees can be as deep as the input is long, so every traversal here uses
//! an explicit stack instead of recursion, including `Drop`.

use std::{fmt, mem};

/// Parsed expression
///
/// Expressions are parsed once and then evaluated against an environment,
/// so resolved values never have to be written back into expression text.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Variable reference by canonical name
    Variable(String),
    /// Contextual placeholder `{{#name}}`
    Placeholder(String),
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Build a binary operation node
    pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Self {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Distinct variable names referenced, in order of first appearance
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(|expr| {
            if let Expr::Variable(name) = expr {
                if !names.contains(&name.as_str()) {
                    names.push(name.as_str());
                }
            }
        });
        names
    }

    /// Distinct placeholder names used, in order of first appearance
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(|expr| {
            if let Expr::Placeholder(name) = expr {
                if !names.contains(&name.as_str()) {
                    names.push(name.as_str());
                }
            }
        });
        names
    }

    /// Visit every node in pre-order, left to right
    fn walk<'a>(&'a self, mut visit: impl FnMut(&'a Expr)) {
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            visit(expr);
            if let Expr::BinaryOp { left, right, .. } = expr {
                stack.push(&**right);
                stack.push(&**left);
            }
        }
    }
}

impl Drop for Expr {
    fn drop(&mut self) {
        let mut detached = Vec::new();
        detach_children(self, &mut detached);
        // Each popped node only holds leaves by the time it is dropped
        while let Some(mut expr) = detached.pop() {
            detach_children(&mut expr, &mut detached);
        }
    }
}

fn detach_children(expr: &mut Expr, into: &mut Vec<Expr>) {
    if let Expr::BinaryOp { left, right, .. } = expr {
        into.push(mem::replace(&mut **left, Expr::Number(0.0)));
        into.push(mem::replace(&mut **right, Expr::Number(0.0)));
    }
}

/// Piece of output while rendering a tree
enum Piece<'a> {
    Node(&'a Expr),
    Operator(BinaryOperator),
    Close,
}

/// Renders fully parenthesized infix, e.g. `((2 + 3) * BASIC)`
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pieces = vec![Piece::Node(self)];
        while let Some(piece) = pieces.pop() {
            match piece {
                Piece::Node(Expr::Number(n)) => write!(f, "{}", n)?,
                Piece::Node(Expr::Variable(name)) => f.write_str(name)?,
                Piece::Node(Expr::Placeholder(name)) => write!(f, "{{{{#{}}}}}", name)?,
                Piece::Node(Expr::BinaryOp { op, left, right }) => {
                    f.write_str("(")?;
                    pieces.push(Piece::Close);
                    pieces.push(Piece::Node(&**right));
                    pieces.push(Piece::Operator(*op));
                    pieces.push(Piece::Node(&**left));
                }
                Piece::Operator(op) => write!(f, " {} ", op)?,
                Piece::Close => f.write_str(")")?,
            }
        }
        Ok(())
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    /// Binding strength; all operators are left-associative
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Add | BinaryOperator::Subtract => 1,
            BinaryOperator::Multiply | BinaryOperator::Divide => 2,
        }
    }

    /// Operator symbol
    pub fn symbol(self) -> char {
        match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Subtract => '-',
            BinaryOperator::Multiply => '*',
            BinaryOperator::Divide => '/',
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

//! Tests for formula evaluation with variables and contextual inputs

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tally::prelude::*;
use tally::{evaluate_formula, resolve_variables, substitute_context, tokenize_and_evaluate};

/// Test plain arithmetic without references
#[test]
fn test_evaluate_simple_expressions() {
    assert_eq!(tokenize_and_evaluate("2+3*4").unwrap(), 14.0);
    assert_eq!(tokenize_and_evaluate("(2+3)*4").unwrap(), 20.0);
    assert_eq!(tokenize_and_evaluate(" 7 / 2 ").unwrap(), 3.5);
    assert_eq!(tokenize_and_evaluate("((1))").unwrap(), 1.0);
}

/// Test arithmetic errors
#[test]
fn test_evaluate_arithmetic_errors() {
    assert_eq!(tokenize_and_evaluate("1/0"), Err(FormulaError::DivisionByZero));
    assert_eq!(
        tokenize_and_evaluate("(1+2"),
        Err(FormulaError::MismatchedParentheses)
    );
    assert_eq!(
        tokenize_and_evaluate("2^3"),
        Err(FormulaError::Syntax {
            character: '^',
            position: 1,
        })
    );
}

/// Test variables resolving through each other
#[test]
fn test_resolve_variables() {
    let variables = vec![
        Variable::constant("1", "BASIC", "10000"),
        Variable::dynamic("2", "DA", "BASIC*0.2"),
    ];

    let values = resolve_variables(&variables).unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values.get("BASIC"), Some(10000.0));
    assert_eq!(values.get("DA"), Some(2000.0));
}

/// Test circular dependency detection
#[test]
fn test_circular_dependency() {
    let variables = vec![
        Variable::dynamic("1", "A", "B+1"),
        Variable::dynamic("2", "B", "A+1"),
    ];

    let err = resolve_variables(&variables).unwrap_err();
    assert!(matches!(err, FormulaError::CircularDependency { .. }));
    assert_eq!(
        err.to_string(),
        "Circular dependency detected at \"A\" (A -> B -> A)"
    );
}

/// Test contextual placeholders in a formula
#[test]
fn test_evaluate_with_context() {
    let variables = vec![Variable::constant("1", "GROSS", "3000")];
    let formula = "(GROSS/30)*{{#num_of_days}}";

    let ctx = ContextValues::new().with("num_of_days", "20");
    assert_eq!(evaluate_formula(formula, &variables, &ctx).unwrap(), 2000.0);

    assert_eq!(
        evaluate_formula(formula, &variables, &ContextValues::new()),
        Err(FormulaError::MissingContextValue("num_of_days".into()))
    );

    let ctx = ContextValues::new().with("num_of_days", "twenty");
    assert_eq!(
        evaluate_formula(formula, &variables, &ctx),
        Err(FormulaError::NonNumericContextValue {
            name: "num_of_days".into(),
            value: "twenty".into(),
        })
    );
}

/// Test substitution on its own
#[test]
fn test_substitute_context() {
    let ctx = ContextValues::new().with("a", "1.50");
    assert_eq!(
        substitute_context("{{#a}}+{{#a}}*X", &ctx).unwrap(),
        "1.5+1.5*X"
    );
}

/// Test references to undefined variables
#[test]
fn test_undefined_variable() {
    let variables = vec![Variable::constant("1", "BASIC", "1")];
    assert_eq!(
        evaluate_formula("FOO*2", &variables, &ContextValues::new()),
        Err(FormulaError::UndefinedVariable("FOO".into()))
    );
}

/// Test evaluation through the catalog
#[test]
fn test_catalog_workflow() {
    let mut catalog = Catalog::new();
    let basic = catalog
        .add_variable("basic", VariableKind::Constant, "10000")
        .unwrap();
    catalog
        .add_variable("hra", VariableKind::Dynamic, "BASIC*0.4")
        .unwrap();
    catalog
        .add_formula("leave_pay", "(BASIC+HRA)*{{#days}}/30")
        .unwrap();

    let ctx = ContextValues::new().with("days", "3");
    assert_eq!(catalog.evaluate("leave_pay", &ctx).unwrap(), 1400.0);

    // Replacing a variable keeps its id and changes later results
    catalog
        .replace_variable(&basic, "BASIC", VariableKind::Constant, "20000")
        .unwrap();
    assert_eq!(catalog.variable_by_name("basic").unwrap().id, basic);
    assert_eq!(catalog.evaluate("leave_pay", &ctx).unwrap(), 2800.0);
}

/// Test catalog name rules
#[test]
fn test_catalog_rejects_duplicate_names() {
    let mut catalog = Catalog::new();
    catalog
        .add_variable("Basic", VariableKind::Constant, "1")
        .unwrap();

    assert_eq!(
        catalog.add_variable("BASIC", VariableKind::Constant, "2"),
        Err(Error::DuplicateVariableName("BASIC".into()))
    );
    assert_eq!(
        catalog.add_variable(" basic ", VariableKind::Dynamic, "3"),
        Err(Error::DuplicateVariableName("BASIC".into()))
    );
    assert_eq!(catalog.variables().len(), 1);
}

/// Test that evaluation has no hidden state
#[test]
fn test_evaluation_is_repeatable() {
    let variables = vec![
        Variable::constant("1", "X", "0.1"),
        Variable::dynamic("2", "Y", "X+0.2"),
    ];
    let ctx = ContextValues::new().with("k", "3");

    let first = evaluate_formula("Y*{{#k}}", &variables, &ctx);
    let second = evaluate_formula("Y*{{#k}}", &variables, &ctx);
    assert_eq!(first, second);
    assert_eq!(first.unwrap(), (0.1 + 0.2) * 3.0);
}

proptest! {
    /// `a + b * c` binds the product first, and evaluation is repeatable
    #[test]
    fn test_precedence_matches_native(a in 0u32..10_000, b in 0u32..10_000, c in 1u32..10_000) {
        let (a, b, c) = (a as f64, b as f64, c as f64);

        let expr = format!("{} + {} * {}", a, b, c);
        let first = tokenize_and_evaluate(&expr).unwrap();
        prop_assert_eq!(first, a + b * c);
        prop_assert_eq!(tokenize_and_evaluate(&expr).unwrap(), first);

        let expr = format!("{} - {} / {}", a, b, c);
        prop_assert_eq!(tokenize_and_evaluate(&expr).unwrap(), a - b / c);

        let expr = format!("({} + {}) * {}", a, b, c);
        prop_assert_eq!(tokenize_and_evaluate(&expr).unwrap(), (a + b) * c);
    }

    /// Left-to-right grouping for operators of equal precedence
    #[test]
    fn test_left_associativity(a in 1u32..1000, b in 1u32..1000, c in 1u32..1000) {
        let (a, b, c) = (a as f64, b as f64, c as f64);

        let expr = format!("{}-{}-{}", a, b, c);
        prop_assert_eq!(tokenize_and_evaluate(&expr).unwrap(), (a - b) - c);

        let expr = format!("{}/{}/{}", a, b, c);
        prop_assert_eq!(tokenize_and_evaluate(&expr).unwrap(), (a / b) / c);
    }
}

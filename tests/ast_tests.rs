use rs274::ast::{
    BinaryOperator, Comment, Line, ParameterIndex, ParameterSetting, Program, RealValue,
    UnaryOperator, Word,
};
use rs274::{parse_line, EvaluationError, ValidationError};

const TOLERANCE: f64 = 1e-9;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "{} is not close to {}",
        actual,
        expected
    );
}

#[test]
fn test_clone_is_independent() {
    let original = parse_line("N1 G1 X[1 + #2] (cut) #3=4 ; end").unwrap();
    let mut clone = original.clone();
    assert_eq!(clone.to_string(), original.to_string());

    for word in clone.iter_words_mut() {
        word.set_value(0);
    }
    clone.strip_comments();
    clone.toggle_deleted();
    clone.clear_line_number();

    assert_eq!(original.to_string(), "N1 G1 X[1 + #2] (cut) #3=4 ; end");
    assert_eq!(clone.to_string(), "/ G0 X0 #3=4");
}

#[test]
fn test_expression_clone_is_deep() {
    let original = RealValue::binary(
        BinaryOperator::Multiply,
        RealValue::unary(UnaryOperator::SquareRoot, 16),
        2,
    );
    let mut clone = original.clone();
    if let RealValue::Binary { left, .. } = &mut clone {
        **left = RealValue::from(1);
    }
    assert_eq!(original.evaluate(), Ok(8.0));
    assert_eq!(clone.evaluate(), Ok(2.0));
}

#[test]
fn test_program_clone() {
    let mut program = Program::new();
    program.push(parse_line("G0 X0").unwrap());
    let mut clone = program.clone();
    clone.push(parse_line("M2").unwrap());
    assert_eq!(program.len(), 1);
    assert_eq!(clone.to_string(), "G0 X0\nM2");
}

#[test]
fn test_trigonometry_uses_degrees() {
    let cosine = RealValue::unary(UnaryOperator::Cosine, 45);
    assert_close(cosine.evaluate().unwrap(), 45f64.to_radians().cos());

    let sine = RealValue::unary(UnaryOperator::Sine, 30);
    let arc_sine = RealValue::unary(UnaryOperator::ArcSine, sine.evaluate().unwrap());
    assert_close(arc_sine.evaluate().unwrap(), 30.0);

    let arc_cosine = RealValue::unary(UnaryOperator::ArcCosine, 0.5);
    assert_close(arc_cosine.evaluate().unwrap(), 60.0);

    let tangent = RealValue::unary(UnaryOperator::Tangent, 45);
    assert_close(tangent.evaluate().unwrap(), 1.0);
}

/// `fix` rounds toward negative infinity and `fup` toward positive
/// infinity. Some historical implementations swapped the two.
#[test]
fn test_fix_is_floor_and_fup_is_ceiling() {
    let fix = |x: f64| RealValue::unary(UnaryOperator::FixDown, x).evaluate();
    let fup = |x: f64| RealValue::unary(UnaryOperator::FixUp, x).evaluate();

    assert_eq!(fix(1.5), Ok(1.0));
    assert_eq!(fix(-1.5), Ok(-2.0));
    assert_eq!(fup(1.5), Ok(2.0));
    assert_eq!(fup(-1.5), Ok(-1.0));
    assert_eq!(UnaryOperator::FixDown.token(), "fix");
    assert_eq!(UnaryOperator::FixUp.token(), "fup");
}

#[test]
fn test_other_unary_functions() {
    let eval = |op, x: f64| RealValue::unary(op, x).evaluate().unwrap();
    assert_eq!(eval(UnaryOperator::AbsoluteValue, -2.5), 2.5);
    assert_close(eval(UnaryOperator::ERaisedTo, 1.0), std::f64::consts::E);
    assert_close(eval(UnaryOperator::NaturalLogOf, std::f64::consts::E), 1.0);
    assert_eq!(eval(UnaryOperator::Round, 2.5), 3.0);
    assert_eq!(eval(UnaryOperator::Round, -2.5), -3.0);
    assert_eq!(eval(UnaryOperator::SquareRoot, 9.0), 3.0);
}

#[test]
fn test_binary_operators() {
    let eval = |op, a: f64, b: f64| RealValue::binary(op, a, b).evaluate();
    assert_eq!(eval(BinaryOperator::Power, 2.0, 10.0), Ok(1024.0));
    assert_eq!(eval(BinaryOperator::Divide, 1.0, 4.0), Ok(0.25));
    assert_eq!(eval(BinaryOperator::Modulo, 7.0, 3.0), Ok(1.0));
    assert_eq!(eval(BinaryOperator::Multiply, 1.5, 4.0), Ok(6.0));
    assert_eq!(eval(BinaryOperator::Subtract, 1.0, 4.0), Ok(-3.0));
    assert_eq!(eval(BinaryOperator::Add, 1.0, 4.0), Ok(5.0));
    assert_eq!(
        eval(BinaryOperator::Modulo, 1.0, 0.0),
        Err(EvaluationError::DivisionByZero("mod"))
    );
}

#[test]
fn test_parameter_evaluation_requires_context() {
    let value = RealValue::parameter(5220);
    assert_eq!(
        value.evaluate(),
        Err(EvaluationError::UnresolvedParameter("5220".to_string()))
    );
}

#[test]
fn test_invalid_letter_rejected() {
    assert_eq!(Word::new('N', 1), Err(ValidationError::InvalidLetter('N')));
    assert_eq!(Word::new('O', 1), Err(ValidationError::InvalidLetter('O')));
    assert!(Word::new('x', 1).is_ok());
}

#[test]
fn test_comment_rejects_parentheses() {
    assert_eq!(
        Comment::new("a (b"),
        Err(ValidationError::CommentContainsParenthesis("a (b".to_string()))
    );
    assert_eq!(
        Comment::new("a) b"),
        Err(ValidationError::CommentContainsParenthesis("a) b".to_string()))
    );
    let mut line = Line::new();
    assert!(line.set_comment(Some("x(".to_string())).is_err());
    // An end-of-line comment runs to the end of the line, so `)` is harmless
    assert!(line.set_comment(Some("1) rough pass".to_string())).is_ok());
}

#[test]
fn test_built_comments_parse_back() {
    let mut line = Line::new().with_comment("1) rough pass").unwrap();
    line.push(Comment::new("tool 2").unwrap());
    line.push(Word::new('M', 6).unwrap());
    let text = line.to_string();
    assert_eq!(text, "(tool 2) M6 ; 1) rough pass");
    assert_eq!(parse_line(&text).unwrap(), line);
}

#[test]
fn test_built_line_prints_canonically() {
    let mut line = Line::new()
        .with_deleted(true)
        .with_line_number(5.0)
        .unwrap()
        .with_comment("done")
        .unwrap();
    line.push(Word::new('g', 1).unwrap());
    line.push(Word::new('x', RealValue::binary(BinaryOperator::Add, 1, 2)).unwrap());
    line.push(ParameterSetting::new(
        ParameterIndex::named("feed").unwrap(),
        RealValue::parameter(1),
    ));
    assert_eq!(line.to_string(), "/ N5 G1 X[1 + 2] #<feed>=#1 ; done");
    assert_eq!(parse_line(&line.to_string()).unwrap(), line);
}

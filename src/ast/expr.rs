//! Real values
//!
//! A real value is anything that evaluates to a number: a literal, a
//! parameter reference, or a unary/binary operation over other real values.
//! Operators are closed enums backed by static tables carrying the canonical
//! G-code token and the evaluation function of each variant.

use std::fmt::{self, Display, Formatter};

use crate::error::{EvaluationError, ValidationError};

/// A numeric literal, remembering whether it was written with a decimal point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Decimal(f64),
}

impl Number {
    pub fn value(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Decimal(x) => x,
        }
    }

    /// Collapse whole values to `Integer`, keep the rest as `Decimal`
    pub fn normalized(value: f64) -> Number {
        if value.fract() == 0.0 && value.abs() < 9.007_199_254_740_992e15 {
            Number::Integer(value as i64)
        } else {
            Number::Decimal(value)
        }
    }

    /// Whole, non-negative value fitting a `u32`
    pub fn as_index(self) -> Option<u32> {
        match self {
            Number::Integer(n) => u32::try_from(n).ok(),
            Number::Decimal(x) if x.fract() == 0.0 && x >= 0.0 && x <= u32::MAX as f64 => {
                Some(x as u32)
            }
            Number::Decimal(_) => None,
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Integer(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Integer(value.into())
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        Number::Integer(value.into())
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Decimal(value)
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Number::Integer(n) => write!(f, "{}", n),
            Number::Decimal(x) if x.fract() == 0.0 && x.is_finite() => write!(f, "{:.1}", x),
            Number::Decimal(x) => write!(f, "{}", x),
        }
    }
}

/// Lookup of parameter values, supplied by whoever owns machine state
pub trait ParameterResolver {
    fn numbered(&self, index: u32) -> Option<f64>;

    fn named(&self, _name: &str) -> Option<f64> {
        None
    }
}

/// The part of a parameter reference after `#`
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterIndex {
    /// `#3`
    Number(u32),
    /// `#<name>`
    Named(String),
    /// `#[1 + 2]`, `##2`: resolved when evaluated
    Expression(Box<RealValue>),
}

impl ParameterIndex {
    /// Coerce a parsed real value: literals must be whole and non-negative,
    /// anything else is kept as an unresolved expression.
    pub fn from_value(value: RealValue) -> Result<Self, ValidationError> {
        match value {
            RealValue::Literal(number) => number
                .as_index()
                .map(ParameterIndex::Number)
                .ok_or(ValidationError::InvalidParameterIndex(number.value())),
            other => Ok(ParameterIndex::Expression(Box::new(other))),
        }
    }

    pub fn named(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            Ok(ParameterIndex::Named(name))
        } else {
            Err(ValidationError::InvalidParameterName(name))
        }
    }

    fn lookup(&self, resolver: &dyn ParameterResolver) -> Result<f64, EvaluationError> {
        match self {
            ParameterIndex::Number(n) => resolver
                .numbered(*n)
                .ok_or_else(|| EvaluationError::UnknownParameter(n.to_string())),
            ParameterIndex::Named(name) => resolver
                .named(name)
                .ok_or_else(|| EvaluationError::UnknownParameter(format!("<{}>", name))),
            ParameterIndex::Expression(expr) => {
                let value = expr.eval(Some(resolver))?;
                Number::normalized(value)
                    .as_index()
                    .and_then(|n| resolver.numbered(n))
                    .ok_or_else(|| EvaluationError::UnknownParameter(value.to_string()))
            }
        }
    }
}

impl From<u32> for ParameterIndex {
    fn from(value: u32) -> Self {
        ParameterIndex::Number(value)
    }
}

impl Display for ParameterIndex {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ParameterIndex::Number(n) => write!(f, "{}", n),
            ParameterIndex::Named(name) => write!(f, "<{}>", name),
            ParameterIndex::Expression(expr) => write!(f, "{}", expr),
        }
    }
}

/// Static description of an operator
#[derive(Debug)]
pub struct UnaryInfo {
    pub name: &'static str,
    pub token: &'static str,
    function: fn(f64) -> f64,
}

#[derive(Debug)]
pub struct BinaryInfo {
    pub name: &'static str,
    pub token: &'static str,
    /// 1 binds tightest (power), 3 loosest (additive and logical)
    pub precedence: u8,
    function: fn(f64, f64) -> f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    AbsoluteValue,
    ArcCosine,
    ArcSine,
    ArcTangent,
    Cosine,
    ERaisedTo,
    FixDown,
    FixUp,
    NaturalLogOf,
    Round,
    Sine,
    SquareRoot,
    Tangent,
}

fn arc_cosine(x: f64) -> f64 {
    x.acos().to_degrees()
}

fn arc_sine(x: f64) -> f64 {
    x.asin().to_degrees()
}

fn arc_tangent(x: f64) -> f64 {
    x.atan().to_degrees()
}

fn cosine(x: f64) -> f64 {
    x.to_radians().cos()
}

fn sine(x: f64) -> f64 {
    x.to_radians().sin()
}

fn tangent(x: f64) -> f64 {
    x.to_radians().tan()
}

// Indexed by `UnaryOperator as usize`
static UNARY_OPERATORS: [UnaryInfo; 13] = [
    UnaryInfo { name: "absolute value", token: "abs", function: f64::abs },
    UnaryInfo { name: "arc cosine", token: "acos", function: arc_cosine },
    UnaryInfo { name: "arc sine", token: "asin", function: arc_sine },
    UnaryInfo { name: "arc tangent", token: "atan", function: arc_tangent },
    UnaryInfo { name: "cosine", token: "cos", function: cosine },
    UnaryInfo { name: "e raised to", token: "exp", function: f64::exp },
    UnaryInfo { name: "fix down", token: "fix", function: f64::floor },
    UnaryInfo { name: "fix up", token: "fup", function: f64::ceil },
    UnaryInfo { name: "natural log of", token: "ln", function: f64::ln },
    UnaryInfo { name: "round", token: "round", function: f64::round },
    UnaryInfo { name: "sine", token: "sin", function: sine },
    UnaryInfo { name: "square root", token: "sqrt", function: f64::sqrt },
    UnaryInfo { name: "tangent", token: "tan", function: tangent },
];

impl UnaryOperator {
    pub const ALL: [UnaryOperator; 13] = [
        UnaryOperator::AbsoluteValue,
        UnaryOperator::ArcCosine,
        UnaryOperator::ArcSine,
        UnaryOperator::ArcTangent,
        UnaryOperator::Cosine,
        UnaryOperator::ERaisedTo,
        UnaryOperator::FixDown,
        UnaryOperator::FixUp,
        UnaryOperator::NaturalLogOf,
        UnaryOperator::Round,
        UnaryOperator::Sine,
        UnaryOperator::SquareRoot,
        UnaryOperator::Tangent,
    ];

    pub fn info(self) -> &'static UnaryInfo {
        &UNARY_OPERATORS[self as usize]
    }

    pub fn token(self) -> &'static str {
        self.info().token
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.token().eq_ignore_ascii_case(token))
    }

    /// Every unary operation except `atan`, which is only written as `atan a / b`
    pub fn is_ordinary(self) -> bool {
        self != UnaryOperator::ArcTangent
    }

    pub fn apply(self, argument: f64) -> Result<f64, EvaluationError> {
        let result = (self.info().function)(argument);
        if result.is_finite() {
            Ok(result)
        } else {
            Err(EvaluationError::Domain {
                operation: self.token(),
                argument,
            })
        }
    }
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Power,
    Divide,
    Modulo,
    Multiply,
    And,
    ExclusiveOr,
    Subtract,
    Or,
    Add,
}

fn truth(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

fn modulo(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }
}

// Indexed by `BinaryOperator as usize`
static BINARY_OPERATORS: [BinaryInfo; 9] = [
    BinaryInfo { name: "power", token: "**", precedence: 1, function: f64::powf },
    BinaryInfo { name: "divided by", token: "/", precedence: 2, function: |a, b| a / b },
    BinaryInfo { name: "modulo", token: "mod", precedence: 2, function: modulo },
    BinaryInfo { name: "times", token: "*", precedence: 2, function: |a, b| a * b },
    BinaryInfo { name: "and", token: "and", precedence: 3, function: |a, b| truth(a != 0.0 && b != 0.0) },
    BinaryInfo { name: "exclusive or", token: "xor", precedence: 3, function: |a, b| truth((a != 0.0) != (b != 0.0)) },
    BinaryInfo { name: "minus", token: "-", precedence: 3, function: |a, b| a - b },
    BinaryInfo { name: "non exclusive or", token: "or", precedence: 3, function: |a, b| truth(a != 0.0 || b != 0.0) },
    BinaryInfo { name: "plus", token: "+", precedence: 3, function: |a, b| a + b },
];

impl BinaryOperator {
    pub const ALL: [BinaryOperator; 9] = [
        BinaryOperator::Power,
        BinaryOperator::Divide,
        BinaryOperator::Modulo,
        BinaryOperator::Multiply,
        BinaryOperator::And,
        BinaryOperator::ExclusiveOr,
        BinaryOperator::Subtract,
        BinaryOperator::Or,
        BinaryOperator::Add,
    ];

    pub fn info(self) -> &'static BinaryInfo {
        &BINARY_OPERATORS[self as usize]
    }

    pub fn token(self) -> &'static str {
        self.info().token
    }

    pub fn precedence(self) -> u8 {
        self.info().precedence
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.token().eq_ignore_ascii_case(token))
    }

    pub fn apply(self, left: f64, right: f64) -> Result<f64, EvaluationError> {
        if matches!(self, BinaryOperator::Divide | BinaryOperator::Modulo) && right == 0.0 {
            return Err(EvaluationError::DivisionByZero(self.token()));
        }
        let result = (self.info().function)(left, right);
        if result.is_finite() {
            Ok(result)
        } else {
            Err(EvaluationError::Domain {
                operation: self.token(),
                argument: left,
            })
        }
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Expression tree; every node exclusively owns its children
#[derive(Debug, Clone, PartialEq)]
pub enum RealValue {
    Literal(Number),
    Parameter(ParameterIndex),
    Unary {
        operator: UnaryOperator,
        arg: Box<RealValue>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<RealValue>,
        right: Box<RealValue>,
    },
}

impl RealValue {
    pub fn unary(operator: UnaryOperator, arg: impl Into<RealValue>) -> Self {
        RealValue::Unary {
            operator,
            arg: Box::new(arg.into()),
        }
    }

    pub fn binary(
        operator: BinaryOperator,
        left: impl Into<RealValue>,
        right: impl Into<RealValue>,
    ) -> Self {
        RealValue::Binary {
            operator,
            left: Box::new(left.into()),
            right: Box::new(right.into()),
        }
    }

    pub fn parameter(index: impl Into<ParameterIndex>) -> Self {
        RealValue::Parameter(index.into())
    }

    pub fn as_literal(&self) -> Option<Number> {
        match self {
            RealValue::Literal(number) => Some(*number),
            _ => None,
        }
    }

    fn is_arc_tangent(&self) -> bool {
        matches!(
            self,
            RealValue::Unary {
                operator: UnaryOperator::ArcTangent,
                ..
            }
        )
    }

    /// Whether the tree references a parameter anywhere
    pub fn has_parameters(&self) -> bool {
        match self {
            RealValue::Literal(_) => false,
            RealValue::Parameter(_) => true,
            RealValue::Unary { arg, .. } => arg.has_parameters(),
            RealValue::Binary { left, right, .. } => {
                left.has_parameters() || right.has_parameters()
            }
        }
    }

    /// Evaluate without machine state; any parameter reference is an error.
    pub fn evaluate(&self) -> Result<f64, EvaluationError> {
        self.eval(None)
    }

    pub fn evaluate_with(&self, resolver: &dyn ParameterResolver) -> Result<f64, EvaluationError> {
        self.eval(Some(resolver))
    }

    fn eval(&self, resolver: Option<&dyn ParameterResolver>) -> Result<f64, EvaluationError> {
        match self {
            RealValue::Literal(number) => Ok(number.value()),
            RealValue::Parameter(index) => match resolver {
                Some(resolver) => index.lookup(resolver),
                None => Err(EvaluationError::UnresolvedParameter(index.to_string())),
            },
            RealValue::Unary { operator, arg } => operator.apply(arg.eval(resolver)?),
            RealValue::Binary {
                operator,
                left,
                right,
            } => operator.apply(left.eval(resolver)?, right.eval(resolver)?),
        }
    }
}

impl From<Number> for RealValue {
    fn from(value: Number) -> Self {
        RealValue::Literal(value)
    }
}

impl From<i32> for RealValue {
    fn from(value: i32) -> Self {
        RealValue::Literal(value.into())
    }
}

impl From<i64> for RealValue {
    fn from(value: i64) -> Self {
        RealValue::Literal(value.into())
    }
}

impl From<f64> for RealValue {
    fn from(value: f64) -> Self {
        RealValue::Literal(value.into())
    }
}

impl From<ParameterIndex> for RealValue {
    fn from(value: ParameterIndex) -> Self {
        RealValue::Parameter(value)
    }
}

impl Display for RealValue {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            RealValue::Literal(number) => write!(f, "{}", number),
            RealValue::Parameter(index) => write!(f, "#{}", index),
            RealValue::Unary { operator, arg } => write!(f, "{}[{}]", operator, arg),
            RealValue::Binary {
                operator: BinaryOperator::Divide,
                left,
                right,
            } if left.is_arc_tangent() && !matches!(**right, RealValue::Binary { .. }) => {
                // `atan a / b` only accepts a bracketed divisor
                write!(f, "[{} / [{}]]", left, right)
            }
            RealValue::Binary {
                operator,
                left,
                right,
            } => write!(f, "[{} {} {}]", left, operator, right),
        }
    }
}

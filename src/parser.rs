//! Grammar for data-binding strings.
//!
//! A binding string is literal text with embedded `${...}` expressions. Quoted strings inside
//! an expression follow the same rule, so interpolation nests to any depth.
//!
//! ```text
//! template    := (binding | text)*
//! binding     := '${' ws expression? ws '}'
//! expression  := nullc (ws '?' ws expression ws ':' ws expression)?
//! nullc       := or (ws '??' ws or)*
//! or          := and (ws '||' ws and)*
//! and         := equality (ws '&&' ws equality)*
//! equality    := comparison (ws ('==' | '!=') ws comparison)*
//! comparison  := additive (ws ('<=' | '>=' | '<' | '>') ws additive)*
//! additive    := term (ws ('+' | '-') ws term)*
//! term        := unary (ws ('*' | '/' | '%') ws unary)*
//! unary       := ('+' | '-' | '!')* factor
//! factor      := 'true' | 'false' | 'null' | dimension | postfix | number | string
//! postfix     := (group | '@' name | symbol | array | map) ('.' name | '[' expr ']' | '(' args ')')*
//! ```
//!
//! The grammar does not build a syntax tree. Each rule pushes values and operators onto the
//! [`Stacks`] machine and asks it to reduce once a precedence level is complete. A rule only
//! touches the stacks after it has committed to its input; from then on any mismatch is a
//! hard failure carrying a [`ParseErrorKind`], so nom never backtracks over a push.

use crate::builtinops::{
    ADD, AND, ARRAY_ACCESS, BuiltinOp, DIVIDE, EQUAL, FIELD_ACCESS, FUNCTION_CALL, GREATER_EQUAL,
    GREATER_THAN, LESS_EQUAL, LESS_THAN, MAP_LITERAL, MULTIPLY, NOT_EQUAL, NULLC, OR, Order,
    REMAINDER, SUBTRACT, TERNARY, UNARY_MINUS, UNARY_NOT, UNARY_PLUS,
};
use crate::context::Context;
use crate::dimension::Unit;
use crate::numberformat::string_to_double;
use crate::object::Object;
use crate::stack::{CombineMode, Stacks};
use crate::{MAX_PARSE_DEPTH, ParseError, ParseErrorKind};
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit0, digit1, multispace0, satisfy},
    combinator::{all_consuming, not, opt, recognize, value},
    error::ErrorKind,
    multi::{many0, many1},
    sequence::{pair, preceded},
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::trace;

/// Names that cannot be used as bare symbols
const KEYWORDS: &[&str] = &["true", "false", "null", "dp", "px", "vh", "vw"];

/// Grammar error. `kind` is set once a rule has committed and then failed.
#[derive(Debug, Clone, PartialEq)]
struct GrammarError<'a> {
    input: &'a str,
    kind: Option<ParseErrorKind>,
}

impl<'a> nom::error::ParseError<&'a str> for GrammarError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        GrammarError { input, kind: None }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl GrammarError<'_> {
    fn into_parse_error(self, source: &str) -> ParseError {
        let offset = source.len().saturating_sub(self.input.len());
        let kind = self.kind.unwrap_or(if offset < source.len() {
            ParseErrorKind::UnexpectedTokenBeforeEof
        } else {
            ParseErrorKind::UnexpectedToken
        });
        ParseError::at(kind, source, offset)
    }
}

type PResult<'a, O> = IResult<&'a str, O, GrammarError<'a>>;

fn fail<'a, O>(kind: ParseErrorKind, input: &'a str) -> PResult<'a, O> {
    Err(nom::Err::Failure(GrammarError {
        input,
        kind: Some(kind),
    }))
}

/// Run `parser`; a soft mismatch becomes a hard failure of `kind`
fn must<'a, O, F>(kind: ParseErrorKind, mut parser: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    move |input| match parser(input) {
        Err(nom::Err::Error(_)) => fail(kind, input),
        other => other,
    }
}

fn ws(input: &str) -> PResult<'_, &str> {
    multispace0(input)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(is_identifier_char),
    ))(input)
}

fn word_end(input: &str) -> PResult<'_, ()> {
    not(satisfy(is_identifier_char))(input)
}

fn comma(input: &str) -> PResult<'_, char> {
    preceded(ws, char(','))(input)
}

/// Digits before the decimal point. A leading zero must stand alone.
fn integer_part(input: &str) -> PResult<'_, &str> {
    if let Some(rest) = input.strip_prefix('0') {
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            return fail(ParseErrorKind::InvalidNumberFormat, input);
        }
        return Ok((rest, &input[..1]));
    }
    recognize(pair(satisfy(|c| ('1'..='9').contains(&c)), digit0))(input)
}

fn number_text(input: &str) -> PResult<'_, &str> {
    alt((
        recognize(pair(integer_part, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    ))(input)
}

fn unit(input: &str) -> PResult<'_, Unit> {
    alt((
        value(Unit::Dp, tag("dp")),
        value(Unit::Px, tag("px")),
        value(Unit::Vh, tag("vh")),
        value(Unit::Vw, tag("vw")),
    ))(input)
}

fn unary_op(input: &str) -> PResult<'_, &'static BuiltinOp> {
    alt((
        value(&UNARY_PLUS, char('+')),
        value(&UNARY_MINUS, char('-')),
        value(&UNARY_NOT, char('!')),
    ))(input)
}

fn term_op(input: &str) -> PResult<'_, &'static BuiltinOp> {
    alt((
        value(&MULTIPLY, char('*')),
        value(&DIVIDE, char('/')),
        value(&REMAINDER, char('%')),
    ))(input)
}

fn additive_op(input: &str) -> PResult<'_, &'static BuiltinOp> {
    alt((value(&ADD, char('+')), value(&SUBTRACT, char('-'))))(input)
}

fn comparison_op(input: &str) -> PResult<'_, &'static BuiltinOp> {
    alt((
        value(&LESS_EQUAL, tag("<=")),
        value(&GREATER_EQUAL, tag(">=")),
        value(&LESS_THAN, char('<')),
        value(&GREATER_THAN, char('>')),
    ))(input)
}

fn equality_op(input: &str) -> PResult<'_, &'static BuiltinOp> {
    alt((value(&EQUAL, tag("==")), value(&NOT_EQUAL, tag("!="))))(input)
}

fn and_op(input: &str) -> PResult<'_, &'static BuiltinOp> {
    value(&AND, tag("&&"))(input)
}

fn or_op(input: &str) -> PResult<'_, &'static BuiltinOp> {
    value(&OR, tag("||"))(input)
}

fn nullc_op(input: &str) -> PResult<'_, &'static BuiltinOp> {
    value(&NULLC, tag("??"))(input)
}

type Rule<'c, 'a> = for<'g> fn(&'g Grammar<'c>, &'a str) -> PResult<'a, ()>;

/// Parser state for one binding string
struct Grammar<'c> {
    context: &'c Rc<Context>,
    stacks: RefCell<Stacks>,
    depth: Cell<usize>,
}

impl<'c> Grammar<'c> {
    fn new(context: &'c Rc<Context>) -> Self {
        Grammar {
            context,
            stacks: RefCell::new(Stacks::new()),
            depth: Cell::new(0),
        }
    }

    fn push_object(&self, object: Object) {
        self.stacks.borrow_mut().push_object(object);
    }

    fn push_op(&self, op: &'static BuiltinOp) {
        self.stacks.borrow_mut().push_op(op);
    }

    fn open(&self) {
        self.stacks.borrow_mut().open();
    }

    fn close(&self, mode: CombineMode) {
        self.stacks.borrow_mut().close(mode);
    }

    fn template<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, _) = many0(alt((
            |i| self.data_binding(i),
            |i| self.raw_text(i, None),
        )))(input)?;
        Ok((input, ()))
    }

    /// Literal text up to the next `${` (or closing quote inside a quoted string)
    fn raw_text<'a>(&self, input: &'a str, quote: Option<char>) -> PResult<'a, ()> {
        let (input, text) = recognize(many1(preceded(
            not(tag("${")),
            satisfy(|c| Some(c) != quote),
        )))(input)?;
        self.push_object(Object::from(text));
        Ok((input, ()))
    }

    fn data_binding<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, _) = tag("${")(input)?;
        self.open();
        let (input, _) = ws(input)?;
        let (input, parsed) = opt(|i| self.expression(i))(input)?;
        if parsed.is_none() {
            self.push_object(Object::from(""));
        }
        let (input, _) = ws(input)?;
        let (input, _) = must(ParseErrorKind::ExpectedDataBindingEnd, char('}'))(input)?;
        self.close(CombineMode::Single);
        Ok((input, ()))
    }

    fn expression<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let depth = self.depth.get() + 1;
        if depth > MAX_PARSE_DEPTH {
            return fail(ParseErrorKind::TooDeeplyNested, input);
        }
        self.depth.set(depth);
        let result = self.ternary(input);
        self.depth.set(depth - 1);
        result
    }

    fn ternary<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, _) = self.nullc(input)?;
        let (input, question) = opt(preceded(ws, char('?')))(input)?;
        if question.is_none() {
            return Ok((input, ()));
        }
        self.push_op(&TERNARY);
        let (input, _) = must(ParseErrorKind::MalformedTernaryExpression, |i| {
            let (i, _) = ws(i)?;
            let (i, _) = self.expression(i)?;
            let (i, _) = ws(i)?;
            let (i, _) = char(':')(i)?;
            self.push_op(&TERNARY);
            let (i, _) = ws(i)?;
            self.expression(i)
        })(input)?;
        self.stacks.borrow_mut().reduce_ternary(Order::Ternary);
        Ok((input, ()))
    }

    /// `operand (op operand)*`, leaving the operators unreduced on the stack
    fn binary_chain<'a>(
        &self,
        input: &'a str,
        operand: Rule<'c, 'a>,
        operator: fn(&'a str) -> PResult<'a, &'static BuiltinOp>,
        missing: ParseErrorKind,
    ) -> PResult<'a, ()> {
        let (mut input, _) = operand(self, input)?;
        loop {
            match preceded(ws, operator)(input) {
                Ok((rest, op)) => {
                    self.push_op(op);
                    let (rest, _) = ws(rest)?;
                    let (rest, _) = must(missing, |i| operand(self, i))(rest)?;
                    input = rest;
                }
                Err(nom::Err::Error(_)) => return Ok((input, ())),
                Err(err) => return Err(err),
            }
        }
    }

    fn left_assoc<'a>(
        &self,
        input: &'a str,
        operand: Rule<'c, 'a>,
        operator: fn(&'a str) -> PResult<'a, &'static BuiltinOp>,
        missing: ParseErrorKind,
        order: Order,
    ) -> PResult<'a, ()> {
        let (input, _) = self.binary_chain(input, operand, operator, missing)?;
        self.stacks.borrow_mut().reduce_lr(order);
        Ok((input, ()))
    }

    /// Right-associative: fold the newest `??` first
    fn nullc<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, _) = self.binary_chain(
            input,
            Grammar::logical_or,
            nullc_op,
            ParseErrorKind::ExpectedOperandAfterNullc,
        )?;
        let mut stacks = self.stacks.borrow_mut();
        while stacks.reduce_binary(Order::Nullc) {}
        Ok((input, ()))
    }

    fn logical_or<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        self.left_assoc(
            input,
            Grammar::logical_and,
            or_op,
            ParseErrorKind::ExpectedOperandAfterLogicalOr,
            Order::LogicalOr,
        )
    }

    fn logical_and<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        self.left_assoc(
            input,
            Grammar::equality,
            and_op,
            ParseErrorKind::ExpectedOperandAfterLogicalAnd,
            Order::LogicalAnd,
        )
    }

    fn equality<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        self.left_assoc(
            input,
            Grammar::comparison,
            equality_op,
            ParseErrorKind::ExpectedOperandAfterEquality,
            Order::Equality,
        )
    }

    fn comparison<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        self.left_assoc(
            input,
            Grammar::additive,
            comparison_op,
            ParseErrorKind::ExpectedOperandAfterComparison,
            Order::Comparison,
        )
    }

    fn additive<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        self.left_assoc(
            input,
            Grammar::term,
            additive_op,
            ParseErrorKind::ExpectedOperandAfterAdditive,
            Order::Expression,
        )
    }

    fn term<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        self.left_assoc(
            input,
            Grammar::unary,
            term_op,
            ParseErrorKind::ExpectedOperandAfterMultiplicative,
            Order::Term,
        )
    }

    /// Prefix operators bind directly to their operand; no whitespace in between
    fn unary<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, ops) = many0(unary_op)(input)?;
        if ops.is_empty() {
            return self.factor(input);
        }
        for op in ops {
            self.push_op(op);
        }
        let (input, _) = must(ParseErrorKind::ExpectedExpression, |i| self.factor(i))(input)?;
        self.stacks.borrow_mut().reduce_unary(Order::Unary);
        Ok((input, ()))
    }

    fn factor<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        alt((
            |i| self.keyword_literal(i),
            |i| self.dimension(i),
            |i| self.postfix_expression(i),
            |i| self.number(i),
            |i| self.quoted_string(i, '\'', ParseErrorKind::UnterminatedSingleQuotedString),
            |i| self.quoted_string(i, '"', ParseErrorKind::UnterminatedDoubleQuotedString),
        ))(input)
    }

    fn keyword_literal<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, literal) = alt((
            value(Object::from(true), tag("true")),
            value(Object::from(false), tag("false")),
            value(Object::Null, tag("null")),
        ))(input)?;
        let (input, _) = word_end(input)?;
        self.push_object(literal);
        Ok((input, ()))
    }

    fn dimension<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, text) = number_text(input)?;
        let (input, unit) = unit(input)?;
        let (input, _) = word_end(input)?;
        let resolved = self.context.metrics().resolve(string_to_double(text), unit);
        self.push_object(Object::from(resolved));
        Ok((input, ()))
    }

    fn number<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, text) = number_text(input)?;
        self.push_object(Object::from(string_to_double(text)));
        Ok((input, ()))
    }

    fn quoted_string<'a>(
        &self,
        input: &'a str,
        quote: char,
        unterminated: ParseErrorKind,
    ) -> PResult<'a, ()> {
        let (input, _) = char(quote)(input)?;
        self.open();
        let (input, _) = many0(alt((
            |i| self.data_binding(i),
            |i| self.raw_text(i, Some(quote)),
        )))(input)?;
        let (input, _) = must(unterminated, char(quote))(input)?;
        self.close(CombineMode::EmbeddedString);
        Ok((input, ()))
    }

    fn postfix_expression<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (mut input, _) = alt((
            |i| self.grouping(i),
            |i| self.resource(i),
            |i| self.symbol(i),
            |i| self.array_literal(i),
            |i| self.map_literal(i),
        ))(input)?;
        loop {
            match self.postfix(input) {
                Ok((rest, ())) => input = rest,
                Err(nom::Err::Error(_)) => return Ok((input, ())),
                Err(err) => return Err(err),
            }
        }
    }

    fn symbol<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (rest, name) = identifier(input)?;
        if KEYWORDS.contains(&name) {
            return Err(nom::Err::Error(GrammarError { input, kind: None }));
        }
        self.push_object(self.context.resolve_symbol(name));
        Ok((rest, ()))
    }

    fn resource<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, name) = recognize(pair(char('@'), identifier))(input)?;
        self.push_object(self.context.resolve_symbol(name));
        Ok((input, ()))
    }

    fn grouping<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, _) = char('(')(input)?;
        self.open();
        let (input, _) = ws(input)?;
        let (input, _) = must(ParseErrorKind::ExpectedExpression, |i| self.expression(i))(input)?;
        let (input, _) = ws(input)?;
        let (input, _) = must(ParseErrorKind::ExpectedGroupEnd, char(')'))(input)?;
        self.close(CombineMode::Single);
        Ok((input, ()))
    }

    /// Zero or more comma-separated expressions. Once a comma is seen another
    /// expression is required.
    fn expression_list<'a>(&self, input: &'a str, missing: ParseErrorKind) -> PResult<'a, ()> {
        let (mut input, first) = opt(|i| self.expression(i))(input)?;
        if first.is_none() {
            return Ok((input, ()));
        }
        loop {
            match comma(input) {
                Ok((rest, _)) => {
                    let (rest, _) = ws(rest)?;
                    let (rest, _) = must(missing, |i| self.expression(i))(rest)?;
                    input = rest;
                }
                Err(nom::Err::Error(_)) => return Ok((input, ())),
                Err(err) => return Err(err),
            }
        }
    }

    fn array_literal<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, _) = char('[')(input)?;
        self.open();
        let (input, _) = ws(input)?;
        let (input, _) = self.expression_list(input, ParseErrorKind::MalformedArray)?;
        let (input, _) = ws(input)?;
        let (input, _) = must(ParseErrorKind::MalformedArray, char(']'))(input)?;
        self.close(CombineMode::Vector);
        Ok((input, ()))
    }

    /// `'key': value`. Keys are quoted strings and may interpolate.
    fn map_entry<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, _) = alt((
            |i| self.quoted_string(i, '\'', ParseErrorKind::UnterminatedSingleQuotedString),
            |i| self.quoted_string(i, '"', ParseErrorKind::UnterminatedDoubleQuotedString),
        ))(input)?;
        let (input, _) = ws(input)?;
        let (input, _) = must(ParseErrorKind::ExpectedMapValueAssignment, char(':'))(input)?;
        let (input, _) = ws(input)?;
        must(ParseErrorKind::ExpectedExpression, |i| self.expression(i))(input)
    }

    fn map_literal<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, _) = char('{')(input)?;
        self.push_op(&MAP_LITERAL);
        self.open();
        let (mut input, _) = ws(input)?;
        let (rest, first) = opt(|i| self.map_entry(i))(input)?;
        input = rest;
        if first.is_some() {
            loop {
                match comma(input) {
                    Ok((rest, _)) => {
                        let (rest, _) = ws(rest)?;
                        let (rest, _) =
                            must(ParseErrorKind::ExpectedMapAssignment, |i| self.map_entry(i))(
                                rest,
                            )?;
                        input = rest;
                    }
                    Err(nom::Err::Error(_)) => break,
                    Err(err) => return Err(err),
                }
            }
        }
        let (input, _) = ws(input)?;
        let (input, _) = must(ParseErrorKind::MalformedMap, char('}'))(input)?;
        self.close(CombineMode::Vector);
        self.stacks.borrow_mut().reduce_unary(Order::FieldOrFunction);
        Ok((input, ()))
    }

    fn postfix<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, _) = ws(input)?;
        alt((
            |i| self.field_access(i),
            |i| self.array_access(i),
            |i| self.call(i),
        ))(input)
    }

    fn field_access<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, name) = preceded(pair(char('.'), ws), identifier)(input)?;
        self.push_op(&FIELD_ACCESS);
        self.push_object(Object::from(name));
        self.stacks.borrow_mut().reduce_binary(Order::FieldOrFunction);
        Ok((input, ()))
    }

    fn array_access<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, _) = char('[')(input)?;
        self.push_op(&ARRAY_ACCESS);
        self.open();
        let (input, _) = ws(input)?;
        let (input, _) = must(ParseErrorKind::ExpectedExpression, |i| self.expression(i))(input)?;
        let (input, _) = ws(input)?;
        let (input, _) = must(ParseErrorKind::ExpectedArrayAccessEnd, char(']'))(input)?;
        self.close(CombineMode::Single);
        self.stacks.borrow_mut().reduce_binary(Order::FieldOrFunction);
        Ok((input, ()))
    }

    fn call<'a>(&self, input: &'a str) -> PResult<'a, ()> {
        let (input, _) = char('(')(input)?;
        self.push_op(&FUNCTION_CALL);
        self.open();
        let (input, _) = ws(input)?;
        let (input, _) = self.expression_list(input, ParseErrorKind::ExpectedExpression)?;
        let (input, _) = ws(input)?;
        let (input, _) = must(ParseErrorKind::ExpectedPostfixRightParen, char(')'))(input)?;
        self.close(CombineMode::Vector);
        self.stacks.borrow_mut().reduce_binary(Order::FieldOrFunction);
        Ok((input, ()))
    }
}

/// Parse a binding string into its value.
///
/// Constant expressions are computed during the parse; anything that reads a writeable
/// binding or calls an impure function comes back as an evaluable node.
pub fn parse(context: &Rc<Context>, source: &str) -> Result<Object, ParseError> {
    trace!("Parsing '{}'", source);
    let grammar = Grammar::new(context);
    let result = all_consuming(|i| grammar.template(i))(source);
    match result {
        Ok(_) => Ok(grammar.stacks.into_inner().finish()),
        Err(nom::Err::Error(err) | nom::Err::Failure(err)) => Err(err.into_parse_error(source)),
        Err(nom::Err::Incomplete(_)) => Err(ParseError::at(
            ParseErrorKind::UnexpectedToken,
            source,
            source.len(),
        )),
    }
}

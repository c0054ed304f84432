//! Parser for schema definition files
//!
//! The accepted language is the subset of CUE needed for flat and nested
//! object shapes:
//!
//! ```text
//! package person
//!
//! #person: {
//!     name: string
//!     age:  int & >=0 & <=130
//!     address: #Address
//! }
//!
//! #Address: { city: string, zipCode: string }
//! ```
//!
//! The parser only builds the declaration tree; type keywords, bounds and
//! references are interpreted by the compiler.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{cut, eof, fail, map, opt, peek, recognize, value, verify},
    error::{context, VerboseError, VerboseErrorKind},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use nom_locate::LocatedSpan;

use super::errors::{SchemaError, SchemaResult};

type Span<'a> = LocatedSpan<&'a str>;
type ParseResult<'a, T> = IResult<Span<'a>, T, VerboseError<Span<'a>>>;

const MISPLACED_PACKAGE: &str = "package clause must come first";
const UNSUPPORTED_IMPORT: &str = "imports are not supported";
const EXPRESSION: &str = "a type, bound, struct or reference";

/// Comparison operator of a bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Ge,
    Le,
    Gt,
    Lt,
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Ge => ">=",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Lt => "<",
        }
    }
}

/// One term of a `&` conjunction
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Bare identifier such as `string` or `int`
    Type(String),
    /// Numeric bound such as `>=0`, literal kept verbatim
    Bound(Comparison, String),
    /// Inline struct literal
    Struct(StructLit),
    /// Reference to a definition (`#Name`)
    Reference(String),
}

/// A `&` conjunction of terms
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub line: usize,
    pub terms: Vec<Term>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub label: String,
    /// Field was marked `?`
    pub optional: bool,
    pub line: usize,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructLit {
    pub fields: Vec<FieldDecl>,
    /// Struct contains `...`
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: String,
    pub line: usize,
    pub value: Expr,
}

/// Parsed schema file
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaFile {
    pub definitions: Vec<Definition>,
}

impl SchemaFile {
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.name == name)
    }
}

/// Parses schema definition text.
///
/// # Errors
///
/// Returns `MalformedDefinition` carrying the offending line.
pub fn parse(origin: &str, text: &str) -> SchemaResult<SchemaFile> {
    let parsed = match schema_file(Span::new(text)) {
        Ok((_, parsed)) => parsed,
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            return Err(syntax_error(origin, &e));
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(SchemaError::malformed(origin, 1, "incomplete input"));
        }
    };

    let mut definitions: Vec<Definition> = Vec::with_capacity(parsed.len());
    for definition in parsed {
        if definitions.iter().any(|d| d.name == definition.name) {
            return Err(SchemaError::malformed(
                origin,
                definition.line,
                format!("definition '#{}' is declared more than once", definition.name),
            ));
        }
        definitions.push(definition);
    }

    Ok(SchemaFile { definitions })
}

/// Maps the innermost failure position to its line and the innermost
/// context to what the parser expected there.
fn syntax_error(origin: &str, err: &VerboseError<Span<'_>>) -> SchemaError {
    let Some((at, _)) = err.errors.first() else {
        return SchemaError::malformed(origin, 1, "unparseable schema definition");
    };

    let expected = err
        .errors
        .iter()
        .find_map(|(_, kind)| match kind {
            VerboseErrorKind::Context(label) => Some(*label),
            _ => None,
        })
        .unwrap_or("a declaration");

    let reason = if expected == MISPLACED_PACKAGE || expected == UNSUPPORTED_IMPORT {
        expected.to_string()
    } else {
        format!("expected {}, found {}", expected, describe(at.fragment()))
    };
    SchemaError::malformed(origin, line_of(at), reason)
}

fn describe(rest: &str) -> String {
    let word: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
        .collect();
    match rest.chars().next() {
        None => "end of file".into(),
        Some('\n') | Some('\r') => "end of line".into(),
        Some(_) if !word.is_empty() => format!("'{}'", word),
        Some(c) => format!("'{}'", c),
    }
}

fn line_of(span: &Span<'_>) -> usize {
    span.location_line() as usize
}

fn owned(span: Span<'_>) -> String {
    span.fragment().to_string()
}

// ============================================================================
// Layout
// ============================================================================

fn comment<'a>(input: Span<'a>) -> ParseResult<'a, Span<'a>> {
    recognize(pair(tag("//"), take_while(|c: char| c != '\n')))(input)
}

/// Spaces, tabs and comments, never a newline.
fn blank<'a>(input: Span<'a>) -> ParseResult<'a, ()> {
    value(
        (),
        many0(alt((
            take_while1(|c: char| c == ' ' || c == '\t' || c == '\r'),
            comment,
        ))),
    )(input)
}

/// Any whitespace, newlines included, and comments.
fn gap<'a>(input: Span<'a>) -> ParseResult<'a, ()> {
    value(
        (),
        many0(alt((take_while1(|c: char| c.is_whitespace()), comment))),
    )(input)
}

/// A struct member ends at a newline, a comma, or the closing brace.
fn member_end<'a>(input: Span<'a>) -> ParseResult<'a, ()> {
    preceded(
        blank,
        alt((
            value((), pair(one_of(",\n"), gap)),
            value((), peek(char('}'))),
        )),
    )(input)
}

/// A top-level declaration ends at a newline, a comma, or end of file.
fn declaration_end<'a>(input: Span<'a>) -> ParseResult<'a, ()> {
    preceded(blank, alt((value((), one_of(",\n")), value((), eof))))(input)
}

// ============================================================================
// Lexemes
// ============================================================================

fn identifier<'a>(input: Span<'a>) -> ParseResult<'a, Span<'a>> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_' || c == '$'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '$'),
    ))(input)
}

fn quoted<'a>(input: Span<'a>) -> ParseResult<'a, String> {
    map(
        delimited(
            char('"'),
            take_while(|c: char| c != '"' && c != '\n'),
            cut(context("closing '\"'", char('"'))),
        ),
        owned,
    )(input)
}

fn digits<'a>(input: Span<'a>) -> ParseResult<'a, Span<'a>> {
    take_while1(|c: char| c.is_ascii_digit() || c == '_')(input)
}

fn number_literal<'a>(input: Span<'a>) -> ParseResult<'a, Span<'a>> {
    recognize(tuple((
        opt(char('-')),
        digits,
        opt(pair(char('.'), digits)),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)
}

fn comparison<'a>(input: Span<'a>) -> ParseResult<'a, Comparison> {
    alt((
        value(Comparison::Ge, tag(">=")),
        value(Comparison::Le, tag("<=")),
        value(Comparison::Gt, char('>')),
        value(Comparison::Lt, char('<')),
    ))(input)
}

fn definition_name<'a>(input: Span<'a>) -> ParseResult<'a, String> {
    map(
        preceded(char('#'), cut(context("a definition name", identifier))),
        owned,
    )(input)
}

// ============================================================================
// Expressions
// ============================================================================

fn bound<'a>(input: Span<'a>) -> ParseResult<'a, Term> {
    let (input, cmp) = comparison(input)?;
    let (input, literal) = preceded(blank, cut(context("a number", number_literal)))(input)?;
    Ok((input, Term::Bound(cmp, owned(literal))))
}

fn term<'a>(input: Span<'a>) -> ParseResult<'a, Term> {
    alt((
        bound,
        map(struct_lit, Term::Struct),
        map(definition_name, Term::Reference),
        map(identifier, |word| Term::Type(owned(word))),
    ))(input)
}

fn expr<'a>(input: Span<'a>) -> ParseResult<'a, Expr> {
    let line = line_of(&input);
    let (input, first) = term(input)?;
    let (input, rest) = many0(preceded(
        tuple((blank, char('&'), gap)),
        cut(context(EXPRESSION, term)),
    ))(input)?;

    let mut terms = vec![first];
    terms.extend(rest);
    Ok((input, Expr { line, terms }))
}

/// `: <expr>` after a label or definition name.
fn declared_value<'a>(input: Span<'a>) -> ParseResult<'a, Expr> {
    let (input, _) = blank(input)?;
    let (input, _) = cut(context("':'", char(':')))(input)?;
    preceded(blank, cut(context(EXPRESSION, expr)))(input)
}

// ============================================================================
// Structs
// ============================================================================

enum Member {
    Field(FieldDecl),
    Open,
}

fn field_decl<'a>(input: Span<'a>) -> ParseResult<'a, FieldDecl> {
    let line = line_of(&input);
    let (input, label) = alt((map(identifier, owned), quoted))(input)?;
    let (input, marker) = opt(one_of("?!"))(input)?;
    let (input, value) = declared_value(input)?;

    Ok((
        input,
        FieldDecl {
            label,
            optional: marker == Some('?'),
            line,
            value,
        },
    ))
}

fn member<'a>(input: Span<'a>) -> ParseResult<'a, Member> {
    alt((
        map(tag("..."), |_| Member::Open),
        map(field_decl, Member::Field),
    ))(input)
}

fn struct_lit<'a>(input: Span<'a>) -> ParseResult<'a, StructLit> {
    let (input, _) = char('{')(input)?;
    let (input, _) = gap(input)?;
    let (input, members) = many0(terminated(
        member,
        cut(context("end of declaration", member_end)),
    ))(input)?;
    let (input, _) = cut(context("'}'", char('}')))(input)?;

    let mut lit = StructLit {
        fields: Vec::with_capacity(members.len()),
        open: false,
    };
    for member in members {
        match member {
            Member::Field(field) => lit.fields.push(field),
            Member::Open => lit.open = true,
        }
    }
    Ok((input, lit))
}

// ============================================================================
// File
// ============================================================================

fn package_clause<'a>(input: Span<'a>) -> ParseResult<'a, ()> {
    let (input, _) = verify(identifier, |word: &Span<'a>| *word.fragment() == "package")(input)?;
    let (input, _) = preceded(blank, cut(context("a package name", identifier)))(input)?;
    let (input, _) = cut(context("end of declaration", declaration_end))(input)?;
    Ok((input, ()))
}

fn definition<'a>(input: Span<'a>) -> ParseResult<'a, Definition> {
    let line = line_of(&input);
    let (input, name) = definition_name(input)?;
    let (input, value) = declared_value(input)?;
    let (input, _) = cut(context("end of declaration", declaration_end))(input)?;
    Ok((input, Definition { name, line, value }))
}

/// Fails hard on top-level statements the language does not accept.
fn unsupported_statement<'a>(input: Span<'a>) -> ParseResult<'a, Definition> {
    let (_, word) = peek(identifier)(input)?;
    match *word.fragment() {
        "package" => cut(context(MISPLACED_PACKAGE, fail))(input),
        "import" => cut(context(UNSUPPORTED_IMPORT, fail))(input),
        _ => fail(input),
    }
}

fn schema_file<'a>(input: Span<'a>) -> ParseResult<'a, Vec<Definition>> {
    let (input, _) = gap(input)?;
    let (input, _) = opt(package_clause)(input)?;
    let (input, definitions) =
        many0(preceded(gap, alt((definition, unsupported_statement))))(input)?;
    let (input, _) = gap(input)?;
    let (input, _) = cut(context("a definition", eof))(input)?;
    Ok((input, definitions))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSON: &str = r#"
package person

// A person returned by the model
#person: {
    name: string
    age:  int & >=0 & <=130
    "zip-code"?: string
    address: {
        city: string, street: string
    }
    home: #Address
    ...
}

#Address: { line: string }
"#;

    #[test]
    fn test_parse_person() {
        let file = parse("person.cue", PERSON).unwrap();
        assert_eq!(file.definitions.len(), 2);

        let person = file.definition("person").unwrap();
        assert_eq!(person.line, 5);
        let body = match &person.value.terms[0] {
            Term::Struct(body) => body,
            other => panic!("expected struct, got {:?}", other),
        };
        assert!(body.open);
        let labels: Vec<&str> = body.fields.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["name", "age", "zip-code", "address", "home"]);
        assert!(body.fields[2].optional);
        assert_eq!(
            body.fields[1].value.terms,
            vec![
                Term::Type("int".into()),
                Term::Bound(Comparison::Ge, "0".into()),
                Term::Bound(Comparison::Le, "130".into()),
            ]
        );
        assert_eq!(body.fields[4].value.terms, vec![Term::Reference("Address".into())]);
    }

    #[test]
    fn test_negative_and_float_bounds() {
        let file = parse("t", "package t\n#t: { x: number & >=-1.5 & <2e3 }").unwrap();
        let body = match &file.definitions[0].value.terms[0] {
            Term::Struct(body) => body.clone(),
            _ => unreachable!(),
        };
        assert_eq!(
            body.fields[0].value.terms[1..],
            [
                Term::Bound(Comparison::Ge, "-1.5".into()),
                Term::Bound(Comparison::Lt, "2e3".into()),
            ]
        );
    }

    #[test]
    fn test_missing_colon_reports_line() {
        let err = parse("bad.cue", "package bad\n\n#bad: {\n  name string\n}").unwrap_err();
        match err {
            SchemaError::MalformedDefinition { line, origin, .. } => {
                assert_eq!(line, 4);
                assert_eq!(origin, "bad.cue");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_struct() {
        let err = parse("bad.cue", "package bad\n#bad: {\n  name: string\n").unwrap_err();
        assert_eq!(err.code(), "SCHEMA_MALFORMED_DEFINITION");
    }

    #[test]
    fn test_duplicate_definition() {
        let err = parse("dup", "package dup\n#dup: {}\n#dup: {}\n").unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_unexpected_character() {
        let err = parse("bad", "package bad\n#bad: { a: string | int }").unwrap_err();
        assert!(err.to_string().contains("expected end of declaration, found '|'"));
    }

    #[test]
    fn test_error_line_inside_nested_struct() {
        let text = "package p\n#p: {\n  a: {\n    b: int &\n      & >=1\n  }\n}";
        let err = parse("p.cue", text).unwrap_err();
        match err {
            SchemaError::MalformedDefinition { line, reason, .. } => {
                assert_eq!(line, 5);
                assert!(reason.contains("found '&'"), "{}", reason);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_misplaced_package_and_import() {
        let err = parse("p", "#p: {}\npackage p\n").unwrap_err();
        assert!(err.to_string().contains("package clause must come first"));

        let err = parse("p", "package p\nimport \"strings\"\n#p: {}\n").unwrap_err();
        match err {
            SchemaError::MalformedDefinition { line, reason, .. } => {
                assert_eq!(line, 2);
                assert_eq!(reason, "imports are not supported");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_comments_and_separators() {
        let text = "package c // trailing\n\n#c: { a: int, b: bool // note\n  c: #d }, #d: {}\n";
        let file = parse("c", text).unwrap();
        assert_eq!(file.definitions.len(), 2);
        let body = match &file.definitions[0].value.terms[0] {
            Term::Struct(body) => body.clone(),
            _ => unreachable!(),
        };
        let labels: Vec<&str> = body.fields.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
        assert_eq!(body.fields[2].line, 4);
    }

    #[test]
    fn test_top_level_field_rejected() {
        let err = parse("bad", "package bad\nname: string\n").unwrap_err();
        assert!(err.to_string().contains("expected a definition"));
    }
}

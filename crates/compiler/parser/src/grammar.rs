//! Combinator grammars for the token-level pieces of a line.
//!
//! Line splitting (descriptions, the `@` region, `[...]` tokens) stays with
//! the scanners in [`crate::syntax`]; what is left once a piece has been cut
//! out is parsed here with `chumsky`:
//!
//! ```text
//! call      ::= name ( '(' argument (',' argument)* ')' )?
//! argument  ::= ( quoted | bracketed | [^"`()[]{},] )*
//! type      ::= name '?'? ( '(' balanced ')' )? '?'? rest
//! ```

use chumsky::prelude::*;

use crate::model::Attribute;
use crate::syntax::{check_balanced, SyntaxError};

type Extra<'src> = extra::Err<Rich<'src, char>>;

/// `Type`, `Type?`, `Type(inner)`, `Type(inner)?` followed by whatever is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSyntax<'src> {
    pub name: &'src str,
    pub nullable: bool,
    pub inner: Option<&'src str>,
    pub rest: &'src str,
}

fn identifier<'src>() -> impl Parser<'src, &'src str, &'src str, Extra<'src>> + Clone {
    any()
        .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
        .repeated()
        .at_least(1)
        .to_slice()
}

fn quoted<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    let string = |quote: char| {
        let escaped = just('\\').then(any()).ignored();
        let plain = any()
            .filter(move |c: &char| *c != quote && *c != '\\')
            .ignored();
        just(quote)
            .then(choice((escaped, plain)).repeated())
            .then(just(quote))
            .ignored()
    };
    choice((string('"'), string('`')))
}

/// One `()`, `[]` or `{}` group with everything nested inside it.
fn bracketed<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    recursive(|bracketed| {
        let content = choice((quoted(), bracketed, none_of("\"`()[]{}").ignored())).repeated();
        choice((
            content.clone().delimited_by(just('('), just(')')),
            content.clone().delimited_by(just('['), just(']')),
            content.delimited_by(just('{'), just('}')),
        ))
    })
}

fn balanced<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    choice((quoted(), bracketed(), none_of("\"`()[]{}").ignored())).repeated()
}

fn call<'src>() -> impl Parser<'src, &'src str, Attribute, Extra<'src>> + Clone {
    let argument = choice((quoted(), bracketed(), none_of("\"`()[]{},").ignored()))
        .repeated()
        .to_slice()
        .map(str::trim);
    let arguments = argument
        .separated_by(just(','))
        .collect::<Vec<_>>()
        .delimited_by(just('('), just(')'));

    identifier()
        .then(arguments.or_not())
        .map_with(|(name, args), extra| {
            let args = args
                .unwrap_or_default()
                .into_iter()
                .filter(|arg| !arg.is_empty())
                .map(str::to_string)
                .collect();
            Attribute::new(name, args, extra.slice())
        })
}

fn attribute_run<'src>() -> impl Parser<'src, &'src str, Vec<Attribute>, Extra<'src>> {
    let separator = any()
        .filter(|c: &char| *c == ',' || c.is_whitespace())
        .repeated();
    separator
        .clone()
        .ignore_then(
            just('@')
                .ignore_then(call())
                .then_ignore(separator)
                .repeated()
                .collect(),
        )
        .then_ignore(end())
}

fn call_list<'src>() -> impl Parser<'src, &'src str, Vec<Attribute>, Extra<'src>> {
    call()
        .padded()
        .separated_by(just(',').padded().repeated().at_least(1))
        .allow_leading()
        .allow_trailing()
        .at_least(1)
        .collect()
        .then_ignore(end())
}

fn type_syntax<'src>() -> impl Parser<'src, &'src str, TypeSyntax<'src>, Extra<'src>> {
    let marker = just('?').or_not().map(|mark| mark.is_some());
    identifier()
        .then(marker.clone())
        .then(
            balanced()
                .to_slice()
                .delimited_by(just('('), just(')'))
                .or_not(),
        )
        .then(marker)
        .then(any().repeated().to_slice())
        .map(|((((name, before), inner), after), rest)| TypeSyntax {
            name,
            nullable: before || after,
            inner,
            rest: rest.trim(),
        })
}

/// Unbalanced input is reported as such; anything else points at the first
/// text the grammar could not take.
fn syntax_error(text: &str, errors: &[Rich<'_, char>]) -> SyntaxError {
    if let Err(err) = check_balanced(text) {
        return err;
    }
    let at = errors
        .first()
        .map_or(text.len(), |err| err.span().start.min(text.len()));
    let rest = text.get(at..).unwrap_or_default().trim();
    let rest = if rest.is_empty() { text.trim() } else { rest };
    SyntaxError::UnexpectedText {
        text: rest.to_string(),
    }
}

/// Parse a run of `@name` / `@name(args)` tokens separated by whitespace or commas.
pub fn parse_attribute_run(text: &str) -> Result<Vec<Attribute>, SyntaxError> {
    attribute_run()
        .parse(text)
        .into_result()
        .map_err(|errors| syntax_error(text, &errors))
}

/// Parse the comma-separated calls held by one `[...]` token.
pub fn parse_call_list(text: &str) -> Result<Vec<Attribute>, SyntaxError> {
    call_list()
        .parse(text)
        .into_result()
        .map_err(|errors| syntax_error(text, &errors))
}

/// `None` when the text does not start with a type name.
pub fn parse_type_syntax(text: &str) -> Option<TypeSyntax<'_>> {
    type_syntax().parse(text).into_result().ok()
}

use winnow::ascii::till_line_ending;
use winnow::combinator::{alt, cut_err, opt, repeat};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::stream::Stream;
use winnow::token::{any, take_while};

use crate::types::Node;

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Identifiers ------------------------------------------------------------

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

// -- Attribute values -------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

/// Unquoted attribute value: numbers, version strings, MACs, CIDR blocks and
/// plain URLs all pass without quoting.
fn bare_value<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '/')
    })
    .parse_next(input)
}

fn attr_value(input: &mut &str) -> ModalResult<String> {
    alt((string_literal, bare_value.map(ToOwned::to_owned)))
        .context(StrContext::Expected(StrContextValue::Description(
            "attribute value",
        )))
        .parse_next(input)
}

// -- Nodes ------------------------------------------------------------------

/// `name=value` pairs following a node kind. An identifier not followed by
/// `=` belongs to the next sibling, so the loop backtracks and stops there.
fn attrs(input: &mut &str) -> ModalResult<Vec<(String, String)>> {
    let mut out = Vec::new();
    loop {
        let checkpoint = input.checkpoint();
        ws.parse_next(input)?;
        let name = match ident.parse_next(input) {
            Ok(name) => name.to_owned(),
            Err(_) => {
                input.reset(&checkpoint);
                return Ok(out);
            }
        };
        ws.parse_next(input)?;
        if opt('=').parse_next(input)?.is_none() {
            input.reset(&checkpoint);
            return Ok(out);
        }
        ws.parse_next(input)?;
        let value = cut_err(attr_value).parse_next(input)?;
        out.push((name, value));
    }
}

pub(super) fn node(input: &mut &str) -> ModalResult<Node> {
    ws.parse_next(input)?;
    let kind = ident
        .context(StrContext::Expected(StrContextValue::Description(
            "element kind",
        )))
        .parse_next(input)?;
    let mut result = Node::new(kind);

    // `value "x"` shorthand: a quoted string right after the kind is its
    // `value` attribute.
    ws.parse_next(input)?;
    if let Some(shorthand) = opt(string_literal).parse_next(input)? {
        result = result.attr("value", shorthand);
    }

    for (name, value) in attrs.parse_next(input)? {
        result = result.attr(&name, value);
    }

    ws.parse_next(input)?;
    if opt('{').parse_next(input)?.is_some() {
        let children: Vec<Node> = repeat(0.., node).parse_next(input)?;
        for child in children {
            result = result.child(child);
        }
        ws.parse_next(input)?;
        cut_err('}')
            .context(StrContext::Expected(StrContextValue::CharLiteral('}')))
            .parse_next(input)?;
    }

    Ok(result)
}

/// Top-level parser: exactly one root node, surrounded by whitespace.
pub fn parse_document(input: &mut &str) -> ModalResult<Node> {
    let root = node.parse_next(input)?;
    ws.parse_next(input)?;
    Ok(root)
}

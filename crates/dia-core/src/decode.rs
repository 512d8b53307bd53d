//! Decoder for raw attribute value strings → `AttrValue`.
//!
//! Dia stores typed values as a kind tag plus a `val` string
//! (`<dia:point val="10.5,20.1"/>`). The document reader hands those pairs
//! over as-is; this module turns them into typed values. Built on `winnow`.

use crate::attributes::{AttrValue, Font, Point, Rect};
use crate::error::DiaError;
use winnow::ascii::{dec_int, float, space0};
use winnow::combinator::{alt, delimited, separated_pair};
use winnow::prelude::*;

/// Decode a raw value of the given kind.
///
/// Fonts need three fields and go through [`decode_font`]; composites are
/// nested attribute maps built by the reader directly.
///
/// # Errors
/// `InvalidValue` when the kind is unknown or the text does not parse.
pub fn decode_value(kind: &str, raw: &str) -> Result<AttrValue, DiaError> {
    let invalid = || DiaError::InvalidValue {
        kind: kind.to_owned(),
        raw: raw.to_owned(),
    };

    let value = match kind {
        "real" => AttrValue::Real(parse_real.parse(raw).map_err(|_| invalid())?),
        "int" => AttrValue::Int(parse_int.parse(raw).map_err(|_| invalid())?),
        "enum" => AttrValue::Enum(parse_int.parse(raw).map_err(|_| invalid())?),
        "boolean" | "bool" => AttrValue::Boolean(parse_bool.parse(raw).map_err(|_| invalid())?),
        "point" => AttrValue::Point(parse_point.parse(raw).map_err(|_| invalid())?),
        "rectangle" | "rect" => AttrValue::Rectangle(parse_rect.parse(raw).map_err(|_| invalid())?),
        "color" => AttrValue::Color(raw.to_owned()),
        "string" => AttrValue::String(raw.to_owned()),
        _ => return Err(invalid()),
    };
    Ok(value)
}

/// Decode a font value from its `family`, `style`, and `name` fields.
pub fn decode_font(family: &str, style: &str, name: &str) -> AttrValue {
    AttrValue::Font(Font {
        family: family.to_owned(),
        style: style.to_owned(),
        name: name.to_owned(),
    })
}

// ─── Low-level parsers ──────────────────────────────────────────────────

fn parse_real(input: &mut &str) -> ModalResult<f64> {
    delimited(space0, float, space0).parse_next(input)
}

fn parse_int(input: &mut &str) -> ModalResult<i64> {
    delimited(space0, dec_int, space0).parse_next(input)
}

fn parse_bool(input: &mut &str) -> ModalResult<bool> {
    alt(("true".value(true), "false".value(false))).parse_next(input)
}

/// `x,y`
fn parse_point(input: &mut &str) -> ModalResult<Point> {
    separated_pair(parse_real, ',', parse_real)
        .map(|(x, y)| Point { x, y })
        .parse_next(input)
}

/// `x1,y1;x2,y2`
fn parse_rect(input: &mut &str) -> ModalResult<Rect> {
    separated_pair(parse_point, ';', parse_point)
        .map(|(a, b)| Rect {
            left: a.x,
            top: a.y,
            right: b.x,
            bottom: b.y,
        })
        .parse_next(input)
}

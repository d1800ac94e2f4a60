//! Colors and the color string grammar.
//!
//! Supported forms:
//!
//! ```text
//! #RGB  #RGBA  #RRGGBB  #RRGGBBAA
//! red  aliceblue  transparent ...
//! rgb(255, 0, 0)  rgba(255, 0, 0, 50%)  rgb(red, 0.5)
//! hsl(120, 100%, 50%)  hsla(120, 1, 0.5, 0.25)
//! ```
//!
//! Arguments may carry a trailing `%` which divides them by 100. The first argument of a
//! function may itself be a color. Each failure has its own [`ColorError`] variant.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// A 32-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub u32);

impl Color {
    pub const TRANSPARENT: Color = Color(0);
    pub const BLACK: Color = Color(0x000000ff);
    pub const WHITE: Color = Color(0xffffffff);

    pub fn from_rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Color(u32::from_be_bytes([red, green, blue, alpha]))
    }

    pub fn red(self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    pub fn green(self) -> u8 {
        self.0.to_be_bytes()[1]
    }

    pub fn blue(self) -> u8 {
        self.0.to_be_bytes()[2]
    }

    pub fn alpha(self) -> u8 {
        self.0.to_be_bytes()[3]
    }

    /// Parse a color string
    pub fn parse(input: &str) -> Result<Color, ColorError> {
        let (rest, term) = delimited(multispace0, parse_term, multispace0)(input)
            .map_err(|_| ColorError::Malformed(input.to_string()))?;
        if !rest.is_empty() {
            return Err(ColorError::Malformed(input.to_string()));
        }
        term.resolve()
    }

    /// Find a color by its CSS name
    pub fn lookup(name: &str) -> Option<Color> {
        NAMED_COLORS.get(name).copied()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.0)
    }
}

/// Color grammar failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("Invalid hexidecimal color")]
    InvalidHex,
    #[error("Invalid named color: '{0}'")]
    UnknownName(String),
    #[error("too many arguments in a color function")]
    TooManyColorArguments,
    #[error("expected at least two arguments for a color function")]
    TooFewColorArguments,
    #[error("too many arguments in an hsl function")]
    TooManyHslArguments,
    #[error("expected at least three arguments for an hsl function")]
    TooFewHslArguments,
    #[error("malformed color '{0}'")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FunctionKind {
    Rgb,
    Hsl,
}

/// Syntax tree of a color string, resolved into a [`Color`] after parsing
#[derive(Debug, Clone, PartialEq)]
enum ColorTerm<'a> {
    Hex(&'a str),
    Named(&'a str),
    Function(FunctionKind, Vec<ColorArg<'a>>),
}

#[derive(Debug, Clone, PartialEq)]
enum ColorArg<'a> {
    Color(ColorTerm<'a>),
    Number(f64),
}

impl ColorTerm<'_> {
    fn resolve(&self) -> Result<Color, ColorError> {
        match self {
            ColorTerm::Hex(digits) => color_from_hex(digits).ok_or(ColorError::InvalidHex),
            ColorTerm::Named(name) => {
                Color::lookup(name).ok_or_else(|| ColorError::UnknownName(name.to_string()))
            }
            ColorTerm::Function(kind, args) => {
                let values = args
                    .iter()
                    .map(|arg| match arg {
                        ColorArg::Color(term) => term.resolve().map(|c| f64::from(c.0)),
                        ColorArg::Number(n) => Ok(*n),
                    })
                    .collect::<Result<Vec<f64>, ColorError>>()?;
                match kind {
                    FunctionKind::Rgb => rgb_function(&values),
                    FunctionKind::Hsl => hsl_function(&values),
                }
            }
        }
    }
}

fn rgb_function(args: &[f64]) -> Result<Color, ColorError> {
    match args {
        [color, alpha] => Ok(apply_alpha(Color(*color as u32), *alpha)),
        [r, g, b] => Ok(color_from_rgba(*r, *g, *b, 1.0)),
        [r, g, b, a] => Ok(color_from_rgba(*r, *g, *b, *a)),
        [_] => Err(ColorError::TooFewColorArguments),
        _ => Err(ColorError::TooManyColorArguments),
    }
}

fn hsl_function(args: &[f64]) -> Result<Color, ColorError> {
    match args {
        [h, s, l] => Ok(color_from_hsla(*h, *s, *l, 1.0)),
        [h, s, l, a] => Ok(color_from_hsla(*h, *s, *l, *a)),
        [] | [_] | [_, _] => Err(ColorError::TooFewHslArguments),
        _ => Err(ColorError::TooManyHslArguments),
    }
}

fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn unit_channel(value: f64) -> u8 {
    channel(value * 255.0)
}

fn color_from_rgba(r: f64, g: f64, b: f64, a: f64) -> Color {
    Color::from_rgba(channel(r), channel(g), channel(b), unit_channel(a))
}

/// Scale the existing alpha channel of `color` by `alpha`
fn apply_alpha(color: Color, alpha: f64) -> Color {
    let scaled = channel(f64::from(color.alpha()) * alpha.clamp(0.0, 1.0));
    Color::from_rgba(color.red(), color.green(), color.blue(), scaled)
}

/// `hue` in degrees; `saturation`, `lightness` and `alpha` in [0,1]
fn color_from_hsla(hue: f64, saturation: f64, lightness: f64, alpha: f64) -> Color {
    let h = hue.rem_euclid(360.0) / 360.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    if s == 0.0 {
        return Color::from_rgba(unit_channel(l), unit_channel(l), unit_channel(l), unit_channel(alpha));
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let hue_to_rgb = |t: f64| {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };

    Color::from_rgba(
        unit_channel(hue_to_rgb(h + 1.0 / 3.0)),
        unit_channel(hue_to_rgb(h)),
        unit_channel(hue_to_rgb(h - 1.0 / 3.0)),
        unit_channel(alpha),
    )
}

/// Expand `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA` (digits only, no `#`)
fn color_from_hex(digits: &str) -> Option<Color> {
    let value = u32::from_str_radix(digits, 16).ok()?;
    let nibble = |shift: u32| ((value >> shift) & 0xf) * 0x11;
    match digits.len() {
        3 => Some(Color(
            (nibble(8) << 24) | (nibble(4) << 16) | (nibble(0) << 8) | 0xff,
        )),
        4 => Some(Color(
            (nibble(12) << 24) | (nibble(8) << 16) | (nibble(4) << 8) | nibble(0),
        )),
        6 => Some(Color((value << 8) | 0xff)),
        8 => Some(Color(value)),
        _ => None,
    }
}

fn parse_hex(input: &str) -> IResult<&str, ColorTerm<'_>> {
    map(
        preceded(char('#'), take_while1(|c: char| c.is_ascii_hexdigit())),
        ColorTerm::Hex,
    )(input)
}

fn parse_named(input: &str) -> IResult<&str, ColorTerm<'_>> {
    map(take_while1(|c: char| c.is_ascii_alphabetic()), ColorTerm::Named)(input)
}

/// Unsigned decimal with an optional `%`
fn parse_number(input: &str) -> IResult<&str, f64> {
    let digits = |i| take_while1(|c: char| c.is_ascii_digit())(i);
    let (input, text) = recognize(alt((
        recognize(pair(
            digits,
            opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        )),
        recognize(pair(char('.'), digits)),
    )))(input)?;
    let (input, percent) = opt(char('%'))(input)?;

    let value = text.parse::<f64>().unwrap_or(f64::NAN);
    Ok((input, if percent.is_some() { value * 0.01 } else { value }))
}

fn parse_comma(input: &str) -> IResult<&str, char> {
    delimited(multispace0, char(','), multispace0)(input)
}

fn parse_arguments(input: &str) -> IResult<&str, Vec<ColorArg<'_>>> {
    let first_arg = alt((
        map(parse_term, ColorArg::Color),
        map(parse_number, ColorArg::Number),
    ));
    let (input, (_, _, first, rest, _, _)) = tuple((
        char('('),
        multispace0,
        first_arg,
        many0(preceded(parse_comma, map(parse_number, ColorArg::Number))),
        multispace0,
        char(')'),
    ))(input)?;

    let mut args = vec![first];
    args.extend(rest);
    Ok((input, args))
}

fn parse_function(input: &str) -> IResult<&str, ColorTerm<'_>> {
    let (input, kind) = alt((
        map(tag("rgb"), |_| FunctionKind::Rgb),
        map(tag("hsl"), |_| FunctionKind::Hsl),
    ))(input)?;
    let (input, _) = opt(char('a'))(input)?;
    let (input, args) = parse_arguments(input)?;
    Ok((input, ColorTerm::Function(kind, args)))
}

fn parse_term(input: &str) -> IResult<&str, ColorTerm<'_>> {
    alt((parse_hex, parse_function, parse_named))(input)
}

static NAMED_COLORS: LazyLock<HashMap<&'static str, Color>> = LazyLock::new(|| {
    COLOR_TABLE
        .iter()
        .map(|(name, rgb)| (*name, Color((rgb << 8) | 0xff)))
        .chain(std::iter::once(("transparent", Color::TRANSPARENT)))
        .collect()
});

/// CSS named colors as 0xRRGGBB
static COLOR_TABLE: &[(&str, u32)] = &[
    ("aliceblue", 0xf0f8ff),
    ("antiquewhite", 0xfaebd7),
    ("aqua", 0x00ffff),
    ("aquamarine", 0x7fffd4),
    ("azure", 0xf0ffff),
    ("beige", 0xf5f5dc),
    ("bisque", 0xffe4c4),
    ("black", 0x000000),
    ("blanchedalmond", 0xffebcd),
    ("blue", 0x0000ff),
    ("blueviolet", 0x8a2be2),
    ("brown", 0xa52a2a),
    ("burlywood", 0xdeb887),
    ("cadetblue", 0x5f9ea0),
    ("chartreuse", 0x7fff00),
    ("chocolate", 0xd2691e),
    ("coral", 0xff7f50),
    ("cornflowerblue", 0x6495ed),
    ("cornsilk", 0xfff8dc),
    ("crimson", 0xdc143c),
    ("cyan", 0x00ffff),
    ("darkblue", 0x00008b),
    ("darkcyan", 0x008b8b),
    ("darkgoldenrod", 0xb8860b),
    ("darkgray", 0xa9a9a9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xa9a9a9),
    ("darkkhaki", 0xbdb76b),
    ("darkmagenta", 0x8b008b),
    ("darkolivegreen", 0x556b2f),
    ("darkorange", 0xff8c00),
    ("darkorchid", 0x9932cc),
    ("darkred", 0x8b0000),
    ("darksalmon", 0xe9967a),
    ("darkseagreen", 0x8fbc8f),
    ("darkslateblue", 0x483d8b),
    ("darkslategray", 0x2f4f4f),
    ("darkslategrey", 0x2f4f4f),
    ("darkturquoise", 0x00ced1),
    ("darkviolet", 0x9400d3),
    ("deeppink", 0xff1493),
    ("deepskyblue", 0x00bfff),
    ("dimgray", 0x696969),
    ("dimgrey", 0x696969),
    ("dodgerblue", 0x1e90ff),
    ("firebrick", 0xb22222),
    ("floralwhite", 0xfffaf0),
    ("forestgreen", 0x228b22),
    ("fuchsia", 0xff00ff),
    ("gainsboro", 0xdcdcdc),
    ("ghostwhite", 0xf8f8ff),
    ("gold", 0xffd700),
    ("goldenrod", 0xdaa520),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("greenyellow", 0xadff2f),
    ("grey", 0x808080),
    ("honeydew", 0xf0fff0),
    ("hotpink", 0xff69b4),
    ("indianred", 0xcd5c5c),
    ("indigo", 0x4b0082),
    ("ivory", 0xfffff0),
    ("khaki", 0xf0e68c),
    ("lavender", 0xe6e6fa),
    ("lavenderblush", 0xfff0f5),
    ("lawngreen", 0x7cfc00),
    ("lemonchiffon", 0xfffacd),
    ("lightblue", 0xadd8e6),
    ("lightcoral", 0xf08080),
    ("lightcyan", 0xe0ffff),
    ("lightgoldenrodyellow", 0xfafad2),
    ("lightgray", 0xd3d3d3),
    ("lightgreen", 0x90ee90),
    ("lightgrey", 0xd3d3d3),
    ("lightpink", 0xffb6c1),
    ("lightsalmon", 0xffa07a),
    ("lightseagreen", 0x20b2aa),
    ("lightskyblue", 0x87cefa),
    ("lightslategray", 0x778899),
    ("lightslategrey", 0x778899),
    ("lightsteelblue", 0xb0c4de),
    ("lightyellow", 0xffffe0),
    ("lime", 0x00ff00),
    ("limegreen", 0x32cd32),
    ("linen", 0xfaf0e6),
    ("magenta", 0xff00ff),
    ("maroon", 0x800000),
    ("mediumaquamarine", 0x66cdaa),
    ("mediumblue", 0x0000cd),
    ("mediumorchid", 0xba55d3),
    ("mediumpurple", 0x9370db),
    ("mediumseagreen", 0x3cb371),
    ("mediumslateblue", 0x7b68ee),
    ("mediumspringgreen", 0x00fa9a),
    ("mediumturquoise", 0x48d1cc),
    ("mediumvioletred", 0xc71585),
    ("midnightblue", 0x191970),
    ("mintcream", 0xf5fffa),
    ("mistyrose", 0xffe4e1),
    ("moccasin", 0xffe4b5),
    ("navajowhite", 0xffdead),
    ("navy", 0x000080),
    ("oldlace", 0xfdf5e6),
    ("olive", 0x808000),
    ("olivedrab", 0x6b8e23),
    ("orange", 0xffa500),
    ("orangered", 0xff4500),
    ("orchid", 0xda70d6),
    ("palegoldenrod", 0xeee8aa),
    ("palegreen", 0x98fb98),
    ("paleturquoise", 0xafeeee),
    ("palevioletred", 0xdb7093),
    ("papayawhip", 0xffefd5),
    ("peachpuff", 0xffdab9),
    ("peru", 0xcd853f),
    ("pink", 0xffc0cb),
    ("plum", 0xdda0dd),
    ("powderblue", 0xb0e0e6),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xff0000),
    ("rosybrown", 0xbc8f8f),
    ("royalblue", 0x4169e1),
    ("saddlebrown", 0x8b4513),
    ("salmon", 0xfa8072),
    ("sandybrown", 0xf4a460),
    ("seagreen", 0x2e8b57),
    ("seashell", 0xfff5ee),
    ("sienna", 0xa0522d),
    ("silver", 0xc0c0c0),
    ("skyblue", 0x87ceeb),
    ("slateblue", 0x6a5acd),
    ("slategray", 0x708090),
    ("slategrey", 0x708090),
    ("snow", 0xfffafa),
    ("springgreen", 0x00ff7f),
    ("steelblue", 0x4682b4),
    ("tan", 0xd2b48c),
    ("teal", 0x008080),
    ("thistle", 0xd8bfd8),
    ("tomato", 0xff6347),
    ("turquoise", 0x40e0d0),
    ("violet", 0xee82ee),
    ("wheat", 0xf5deb3),
    ("white", 0xffffff),
    ("whitesmoke", 0xf5f5f5),
    ("yellow", 0xffff00),
    ("yellowgreen", 0x9acd32),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(Color::parse("#f00").unwrap(), Color(0xff0000ff));
        assert_eq!(Color::parse("#f008").unwrap(), Color(0xff000088));
        assert_eq!(Color::parse("#00ff00").unwrap(), Color(0x00ff00ff));
        assert_eq!(Color::parse("  #0000ff80 ").unwrap(), Color(0x0000ff80));
    }

    #[test]
    fn test_parse_named_colors() {
        assert_eq!(Color::parse("red").unwrap(), Color(0xff0000ff));
        assert_eq!(Color::parse("transparent").unwrap(), Color::TRANSPARENT);
        assert_eq!(Color::lookup("rebeccapurple"), Some(Color(0x663399ff)));
        assert_eq!(Color::lookup("notacolor"), None);
    }

    #[test]
    fn test_parse_functions() {
        assert_eq!(Color::parse("rgb(255, 0, 0)").unwrap(), Color(0xff0000ff));
        assert_eq!(Color::parse("rgba(0,0,255,50%)").unwrap(), Color(0x0000ff80));
        assert_eq!(Color::parse("rgb(red, 0.5)").unwrap(), Color(0xff000080));
        assert_eq!(Color::parse("rgba(#00ff0080, 50%)").unwrap(), Color(0x00ff0040));
        assert_eq!(Color::parse("hsl(0, 100%, 50%)").unwrap(), Color(0xff0000ff));
        assert_eq!(Color::parse("hsl(120, 1, 0.25)").unwrap(), Color(0x008000ff));
        assert_eq!(Color::parse("hsla(240, 1, 0.5, 0)").unwrap(), Color(0x0000ff00));
    }

    #[test]
    fn test_color_errors() {
        assert_eq!(Color::parse("#12345"), Err(ColorError::InvalidHex));
        assert_eq!(
            Color::parse("blurple"),
            Err(ColorError::UnknownName("blurple".to_string()))
        );
        assert_eq!(
            Color::parse("rgb(1,2,3,4,5)"),
            Err(ColorError::TooManyColorArguments)
        );
        assert_eq!(Color::parse("rgb(1)"), Err(ColorError::TooFewColorArguments));
        assert_eq!(Color::parse("hsl(1,2)"), Err(ColorError::TooFewHslArguments));
        assert_eq!(
            Color::parse("hsl(1,2,3,4,5)"),
            Err(ColorError::TooManyHslArguments)
        );
        assert!(matches!(Color::parse("rgb(1,2"), Err(ColorError::Malformed(_))));
        assert!(matches!(Color::parse("red blue"), Err(ColorError::Malformed(_))));
        assert!(Color::parse("rgbaaa(1, 2, 3)").is_err());
        assert!(Color::parse("hslaa(1, 2, 3)").is_err());
    }

    #[test]
    fn test_color_display() {
        assert_eq!(Color(0xff0000ff).to_string(), "#ff0000ff");
        assert_eq!(Color::TRANSPARENT.to_string(), "#00000000");
        let c = Color::from_rgba(1, 2, 3, 4);
        assert_eq!((c.red(), c.green(), c.blue(), c.alpha()), (1, 2, 3, 4));
    }
}

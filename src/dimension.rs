//! Dimensions and viewport metrics.
//!
//! A dimension is absolute (display-independent pixels, `dp`), relative (a percentage of the
//! parent) or `auto`. Strings and expression literals may use `px`, `vw` and `vh`; those are
//! converted to `dp` immediately using the [`Metrics`] of the viewport.

use crate::Error;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::multispace0,
    combinator::{eof, opt},
    number::complete::recognize_float,
    sequence::{delimited, tuple},
};
use std::fmt;

use crate::numberformat::double_to_string;

/// Density that maps one pixel to one dp
pub const CORE_DPI: f64 = 160.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimensionType {
    Absolute,
    Relative,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension {
    kind: DimensionType,
    value: f64,
}

impl Dimension {
    pub fn absolute(value: f64) -> Self {
        Dimension {
            kind: DimensionType::Absolute,
            value,
        }
    }

    pub fn relative(value: f64) -> Self {
        Dimension {
            kind: DimensionType::Relative,
            value,
        }
    }

    pub fn auto() -> Self {
        Dimension {
            kind: DimensionType::Auto,
            value: 0.0,
        }
    }

    pub fn kind(&self) -> DimensionType {
        self.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_absolute(&self) -> bool {
        self.kind == DimensionType::Absolute
    }

    pub fn is_relative(&self) -> bool {
        self.kind == DimensionType::Relative
    }

    pub fn is_auto(&self) -> bool {
        self.kind == DimensionType::Auto
    }

    /// Parse `auto`, `N%`, `Ndp`, `Npx`, `Nvw`, `Nvh` or a bare number (dp).
    /// Whitespace is allowed around the value and between the number and its unit.
    pub fn parse(input: &str, metrics: &Metrics) -> Result<Dimension, Error> {
        let invalid = || Error::Dimension(input.to_string());

        if input.trim() == "auto" {
            return Ok(Dimension::auto());
        }

        let (_, (number, unit)) = parse_dimension(input).map_err(|_| invalid())?;
        let value = number.parse::<f64>().map_err(|_| invalid())?;
        let unit = match unit {
            Some(unit) => Unit::from_suffix(unit).ok_or_else(invalid)?,
            None => Unit::Dp,
        };
        Ok(metrics.resolve(value, unit))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DimensionType::Absolute => write!(f, "{}dp", double_to_string(self.value)),
            DimensionType::Relative => write!(f, "{}%", double_to_string(self.value)),
            DimensionType::Auto => write!(f, "auto"),
        }
    }
}

/// Units accepted after a number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Dp,
    Px,
    Vw,
    Vh,
    Percent,
}

impl Unit {
    pub fn from_suffix(suffix: &str) -> Option<Unit> {
        match suffix {
            "dp" => Some(Unit::Dp),
            "px" => Some(Unit::Px),
            "vw" => Some(Unit::Vw),
            "vh" => Some(Unit::Vh),
            "%" => Some(Unit::Percent),
            _ => None,
        }
    }
}

fn parse_dimension(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    let (input, (number, unit, _)) = delimited(
        multispace0,
        tuple((
            recognize_float,
            opt(delimited(
                multispace0,
                alt((tag("dp"), tag("px"), tag("vw"), tag("vh"), tag("%"))),
                multispace0,
            )),
            multispace0,
        )),
        eof,
    )(input)?;
    Ok((input, (number, unit)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenShape {
    Rectangle,
    Round,
}

impl ScreenShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenShape::Rectangle => "rectangle",
            ScreenShape::Round => "round",
        }
    }
}

/// Viewport description: pixel size, density, shape, theme and device mode
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub width: f64,
    pub height: f64,
    pub dpi: f64,
    pub shape: ScreenShape,
    pub theme: String,
    pub mode: String,
}

impl Default for Metrics {
    fn default() -> Self {
        Metrics {
            width: 1024.0,
            height: 800.0,
            dpi: CORE_DPI,
            shape: ScreenShape::Rectangle,
            theme: "dark".to_string(),
            mode: "hub".to_string(),
        }
    }
}

impl Metrics {
    pub fn new(width: f64, height: f64, dpi: f64) -> Self {
        Metrics {
            width,
            height,
            dpi,
            ..Metrics::default()
        }
    }

    pub fn with_shape(mut self, shape: ScreenShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_theme(mut self, theme: &str) -> Self {
        self.theme = theme.to_string();
        self
    }

    pub fn with_mode(mut self, mode: &str) -> Self {
        self.mode = mode.to_string();
        self
    }

    pub fn px_to_dp(&self, px: f64) -> f64 {
        px * CORE_DPI / self.dpi
    }

    pub fn width_dp(&self) -> f64 {
        self.px_to_dp(self.width)
    }

    pub fn height_dp(&self) -> f64 {
        self.px_to_dp(self.height)
    }

    /// Convert a number with a unit into a dimension
    pub fn resolve(&self, value: f64, unit: Unit) -> Dimension {
        match unit {
            Unit::Dp => Dimension::absolute(value),
            Unit::Px => Dimension::absolute(self.px_to_dp(value)),
            Unit::Vw => Dimension::absolute(value * self.width_dp() / 100.0),
            Unit::Vh => Dimension::absolute(value * self.height_dp() / 100.0),
            Unit::Percent => Dimension::relative(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimension_units() {
        let metrics = Metrics::new(2048.0, 1600.0, 320.0);
        assert_eq!(Dimension::parse("20", &metrics).unwrap(), Dimension::absolute(20.0));
        assert_eq!(Dimension::parse("20dp", &metrics).unwrap(), Dimension::absolute(20.0));
        assert_eq!(Dimension::parse("20px", &metrics).unwrap(), Dimension::absolute(10.0));
        assert_eq!(Dimension::parse(" 10 vw ", &metrics).unwrap(), Dimension::absolute(102.4));
        assert_eq!(Dimension::parse("50vh", &metrics).unwrap(), Dimension::absolute(400.0));
        assert_eq!(Dimension::parse("25%", &metrics).unwrap(), Dimension::relative(25.0));
        assert_eq!(Dimension::parse("auto", &metrics).unwrap(), Dimension::auto());
    }

    #[test]
    fn test_parse_dimension_errors() {
        let metrics = Metrics::default();
        assert!(Dimension::parse("", &metrics).is_err());
        assert!(Dimension::parse("wide", &metrics).is_err());
        assert!(Dimension::parse("10em", &metrics).is_err());
        assert_eq!(
            Dimension::parse("10 px 4", &metrics),
            Err(Error::Dimension("10 px 4".to_string()))
        );
    }

    #[test]
    fn test_dimension_display() {
        assert_eq!(Dimension::absolute(20.0).to_string(), "20dp");
        assert_eq!(Dimension::relative(12.5).to_string(), "12.5%");
        assert_eq!(Dimension::auto().to_string(), "auto");
    }

    #[test]
    fn test_metrics_conversion() {
        let metrics = Metrics::default();
        assert_eq!(metrics.width_dp(), 1024.0);
        assert_eq!(metrics.height_dp(), 800.0);
        let dense = Metrics::new(1280.0, 800.0, 320.0).with_theme("light");
        assert_eq!(dense.width_dp(), 640.0);
        assert_eq!(dense.theme, "light");
    }
}

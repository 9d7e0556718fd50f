use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dictionary::DIMENSIONLESS_UNIT_TYPE;
use crate::error::UnitError;
use crate::parse::ParsedUnit;
use crate::transform::{LinearTransform, inverse_linear, reduce_transformations};
use crate::UnitDictionary;

/// A scalar or a series of values to convert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Values {
    Scalar(f64),
    Series(Vec<f64>),
}

impl Values {
    pub fn is_scalar(&self) -> bool {
        matches!(self, Values::Scalar(_))
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Values::Scalar(v) => Some(*v),
            Values::Series(_) => None,
        }
    }

    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            Values::Scalar(_) => None,
            Values::Series(v) => Some(v),
        }
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Values {
        match self {
            Values::Scalar(v) => Values::Scalar(f(v)),
            Values::Series(vs) => Values::Series(vs.into_iter().map(f).collect()),
        }
    }
}

impl From<f64> for Values {
    fn from(value: f64) -> Self {
        Values::Scalar(value)
    }
}

impl From<i64> for Values {
    fn from(value: i64) -> Self {
        Values::Scalar(value as f64)
    }
}

impl From<i32> for Values {
    fn from(value: i32) -> Self {
        Values::Scalar(value.into())
    }
}

impl From<Vec<f64>> for Values {
    fn from(values: Vec<f64>) -> Self {
        Values::Series(values)
    }
}

impl From<&[f64]> for Values {
    fn from(values: &[f64]) -> Self {
        Values::Series(values.to_vec())
    }
}

/// Options for [`crate::unit_convert`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Unit type (or unit type alias) both units must belong to.
    pub unit_type: Option<String>,
    /// Return a [`ConversionTrace`] with the result. Scalars only.
    pub show_conversions: bool,
    /// Return the output unit alongside the converted value.
    pub unit_aware: bool,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit_type(mut self, unit_type: impl Into<String>) -> Self {
        self.unit_type = Some(unit_type.into());
        self
    }

    pub fn show_conversions(mut self, show: bool) -> Self {
        self.show_conversions = show;
        self
    }

    pub fn unit_aware(mut self, unit_aware: bool) -> Self {
        self.unit_aware = unit_aware;
        self
    }
}

/// Result of [`crate::unit_convert`].
#[derive(Clone, Debug, PartialEq)]
pub struct Conversion {
    pub value: Values,
    /// The output unit, when the conversion was unit aware.
    pub unit: Option<String>,
    /// Step-by-step record, when conversions were shown.
    pub trace: Option<ConversionTrace>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    Numerator,
    Denominator,
}

/// Transform contributed by one token on its way to the base unit.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceStep {
    pub token: String,
    pub unit: String,
    pub base_unit: String,
    pub position: Position,
    pub transform: LinearTransform,
}

/// Unit to base-unit transform of one side of a conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct SideTrace {
    pub unit: String,
    pub normalized: String,
    pub steps: Vec<TraceStep>,
    pub transform: LinearTransform,
    /// Numeric multiplier times scaler.
    pub factor: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConversionTrace {
    pub unit_type: String,
    pub input: SideTrace,
    pub output: SideTrace,
    /// Input units to output units, before multipliers and scalers.
    pub transform: LinearTransform,
}

impl fmt::Display for SideTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}):", self.unit, self.normalized)?;
        for step in &self.steps {
            let direction = match step.position {
                Position::Numerator => "to",
                Position::Denominator => "per",
            };
            writeln!(
                f,
                "  {} [{}] {} {}: {}",
                step.token, step.unit, direction, step.base_unit, step.transform
            )?;
        }
        writeln!(f, "  to base: {}", self.transform)?;
        if self.factor != 1.0 {
            writeln!(f, "  multiplier/scaler: {}", self.factor)?;
        }
        Ok(())
    }
}

impl fmt::Display for ConversionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "unit type: {}", self.unit_type)?;
        write!(f, "{}", self.input)?;
        write!(f, "{}", self.output)?;
        write!(
            f,
            "{} -> {}: {}",
            self.input.unit, self.output.unit, self.transform
        )?;
        if self.input.factor != 1.0 || self.output.factor != 1.0 {
            write!(f, " * {} / {}", self.input.factor, self.output.factor)?;
        }
        Ok(())
    }
}

impl UnitDictionary {
    /// Transform from `unit` to the base units of its dimension.
    ///
    /// Numerator tokens convert into their base unit (the inverse of the
    /// table rule), denominator tokens the opposite way. Shifts only apply
    /// to temperature and pressure dimensions.
    pub fn base_conversion_factor(&self, unit: &ParsedUnit) -> (LinearTransform, Vec<TraceStep>) {
        let affine = self.is_affine(&unit.dimension);
        let steps: Vec<TraceStep> = unit
            .numerator
            .iter()
            .map(|t| (t, Position::Numerator))
            .chain(unit.denominator.iter().map(|t| (t, Position::Denominator)))
            .filter_map(|(token, position)| {
                let definition = self.units.get(&token.unit)?;
                let shift = if affine { definition.shift } else { 0.0 };
                let transform = match position {
                    Position::Numerator => inverse_linear(definition.multiplier, shift),
                    Position::Denominator => LinearTransform::new(definition.multiplier, shift),
                };
                Some(TraceStep {
                    token: token.text.clone(),
                    unit: token.unit.clone(),
                    base_unit: definition.base_unit.clone(),
                    position,
                    transform,
                })
            })
            .collect();
        let transform = reduce_transformations(steps.iter().map(|s| s.transform));
        (transform, steps)
    }

    fn side_trace(&self, parsed: &ParsedUnit) -> SideTrace {
        let (transform, steps) = self.base_conversion_factor(parsed);
        SideTrace {
            unit: parsed.input.clone(),
            normalized: parsed.normalized(),
            steps,
            transform,
            factor: parsed.multiplier * parsed.scaler,
        }
    }

    /// Convert `value` from `input_unit` to `output_unit` with this dictionary.
    pub fn convert(
        &self,
        value: impl Into<Values>,
        input_unit: &str,
        output_unit: &str,
        options: &ConvertOptions,
    ) -> Result<Conversion, UnitError> {
        convert_units(self, value, input_unit, output_unit, options)
    }
}

/// Convert `value` from `input_unit` to `output_unit`.
///
/// Both units must reduce to the same dimension, and to the declared unit
/// type if `options.unit_type` is set. Values of the dimensionless unit
/// type `-` are returned unchanged.
pub fn convert_units(
    dictionary: &UnitDictionary,
    value: impl Into<Values>,
    input_unit: &str,
    output_unit: &str,
    options: &ConvertOptions,
) -> Result<Conversion, UnitError> {
    let value = value.into();
    let unit_type = dictionary.unit_type_check(options.unit_type.as_deref())?;
    let unit = options.unit_aware.then(|| output_unit.to_string());

    if unit_type
        .as_ref()
        .is_some_and(|t| t.unit_type == DIMENSIONLESS_UNIT_TYPE)
    {
        return Ok(Conversion {
            value,
            unit,
            trace: None,
        });
    }
    if options.show_conversions && !value.is_scalar() {
        return Err(UnitError::ShowConversionsNonScalar);
    }

    let input = dictionary.parse_unit(input_unit, unit_type.as_ref())?;
    let output = dictionary.parse_unit(output_unit, unit_type.as_ref())?;
    if input.dimension != output.dimension {
        return Err(UnitError::DimensionMismatch {
            input_unit: input_unit.to_string(),
            input: dictionary.base_to_unit_type(&input.dimension),
            output_unit: output_unit.to_string(),
            output: dictionary.base_to_unit_type(&output.dimension),
        });
    }

    let input_side = dictionary.side_trace(&input);
    let output_side = dictionary.side_trace(&output);
    let transform = reduce_transformations([input_side.transform, output_side.transform.inverse()]);
    let (input_factor, output_factor) = (input_side.factor, output_side.factor);
    log::debug!(
        "Converting '{input_unit}' to '{output_unit}': {transform}, factor {input_factor} / {output_factor}"
    );

    let value = value.map(|v| input_factor * transform.apply(v) / output_factor);
    let trace = options.show_conversions.then(|| ConversionTrace {
        unit_type: input.unit_type.clone(),
        input: input_side,
        output: output_side,
        transform,
    });
    Ok(Conversion { value, unit, trace })
}

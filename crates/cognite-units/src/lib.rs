//! Unit parsing, dimensional analysis and unit conversion.
//!
//! Unit expressions such as `acre*ft/d` or `kilolbf/(in*in)` are parsed into
//! canonical units, reduced to a dimension over the fundamental basis
//! (mass, distance, time, temperature) and converted through a single
//! linear or affine transform:
//!
//! ```
//! use cognite_units::{ConvertOptions, unit_convert};
//!
//! let feet = unit_convert(1.0, "m", "ft", &ConvertOptions::default()).unwrap();
//! assert!((feet.value.as_scalar().unwrap() - 3.280839895).abs() < 1e-6);
//! ```
//!
//! All lookups go through an immutable [`UnitDictionary`]. The crate ships
//! a default one ([`UnitDictionary::bundled`]); custom tables can be loaded
//! with [`UnitDictionary::from_json`] or [`UnitDictionary::from_dir`].

pub mod check;
pub mod convert;
pub mod dictionary;
pub mod dimension;
pub mod error;
pub mod parse;
pub mod transform;

pub use check::ResolvedUnitType;
pub use convert::{
    Conversion, ConversionTrace, ConvertOptions, Position, SideTrace, TraceStep, Values,
    convert_units,
};
pub use dictionary::{
    AFFINE_UNIT_TYPES, DIMENSIONLESS_UNIT_TYPE, RawTables, UnitDefinition, UnitDictionary,
    UnitTypeAlias, UnitTypeDefinition,
};
pub use dimension::{Dimension, TypeBreakdown};
pub use error::{DictionaryError, UnitError};
pub use parse::{MAX_EXPONENT, ParsedUnit, Token, bracket_check, multiplier_extract};
pub use transform::{LinearTransform, inverse_linear, reduce_transformations};

/// Convert `value` from `input_unit` to `output_unit` using the bundled
/// unit tables.
pub fn unit_convert(
    value: impl Into<Values>,
    input_unit: &str,
    output_unit: &str,
    options: &ConvertOptions,
) -> Result<Conversion, UnitError> {
    UnitDictionary::bundled().convert(value, input_unit, output_unit, options)
}

/// Validation failure raised while parsing or converting a unit.
///
/// Every variant is fatal to the call that produced it; nothing is retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    #[error("Invalid unit syntax in '{unit}': {reason}")]
    InvalidSyntax { unit: String, reason: String },
    #[error("'{token}' is not defined in unit_conversion dictionary")]
    UnknownUnit { token: String },
    #[error("'{unit_type}' is not a valid unit type")]
    UnknownUnitType { unit_type: String },
    #[error("'{unit}' is not a valid unit of the unit type '{unit_type}'")]
    InvalidUnitForType { unit: String, unit_type: String },
    #[error("Units {units:?} in '{unit}' are not allowed for the unit type '{unit_type}'")]
    RestrictedUnit {
        unit: String,
        unit_type: String,
        units: Vec<String>,
    },
    #[error("Breakdown '{breakdown}' of '{unit}' is not allowed for the unit type '{unit_type}'")]
    RestrictedBreakdown {
        unit: String,
        unit_type: String,
        breakdown: String,
    },
    #[error("'{unit}' reduces to '{dimension}', which is not a known unit type")]
    UnresolvedDimension { unit: String, dimension: String },
    #[error(
        "Cannot convert '{input_unit}' ({input}) to '{output_unit}' ({output}): dimensions differ"
    )]
    DimensionMismatch {
        input_unit: String,
        input: String,
        output_unit: String,
        output: String,
    },
    #[error("show_conversions is only supported for scalar values")]
    ShowConversionsNonScalar,
}

/// Failure while turning raw tables into a [`crate::UnitDictionary`].
#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("Failed to parse {table}: {source}")]
    Json {
        table: &'static str,
        source: serde_json::Error,
    },
    #[error("Invalid numeric expression '{expression}' for unit '{unit}'")]
    InvalidExpression { unit: String, expression: String },
    #[error("Alias '{alias}' is defined for both '{first}' and '{second}'")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },
    #[error("Unknown unit type '{unit_type}' referenced by '{referenced_by}'")]
    UnknownUnitType {
        unit_type: String,
        referenced_by: String,
    },
    #[error("Could not resolve the fundamental dimension of unit type '{unit_type}'")]
    UnresolvedUnitType { unit_type: String },
    #[error("Breakdown '{breakdown}' of unit type '{unit_type}' disagrees with its other forms")]
    InconsistentBreakdown {
        unit_type: String,
        breakdown: String,
    },
    #[error("No fundamental unit types are declared")]
    MissingBasis,
    #[error("Scaler '{scaler}' has invalid scale factor {factor}")]
    InvalidScaleFactor { scaler: String, factor: f64 },
}

//! Raw unit tables and the immutable [`UnitDictionary`] derived from them.
//!
//! The dictionary is built once from four tables:
//!
//! - `unit_conversion.json`: units per unit type, with the linear rule
//!   `unit = multiplier * base + shift` for each unit
//! - `unit_type_fundamental.json`: how each unit type breaks down into
//!   other unit types, down to the fundamental basis
//! - `scalers.json`: prefixes such as `kilo` / `k`
//! - `unit_type_alias.json`: restricted views on a unit type
//!
//! Everything after construction is read-only, so a dictionary can be
//! shared freely between threads.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dimension::{Dimension, TypeBreakdown};
use crate::error::DictionaryError;

/// Unit types whose units may carry an additive shift (gauge pressures,
/// temperature scales). Any other dimension converts purely linearly.
pub const AFFINE_UNIT_TYPES: [&str; 2] = ["temperature", "pressure"];

/// Marker unit type for values that are never converted.
pub const DIMENSIONLESS_UNIT_TYPE: &str = "-";

const UNIT_CONVERSION_JSON: &str = include_str!("../data/unit_conversion.json");
const UNIT_TYPE_FUNDAMENTAL_JSON: &str = include_str!("../data/unit_type_fundamental.json");
const SCALERS_JSON: &str = include_str!("../data/scalers.json");
const UNIT_TYPE_ALIAS_JSON: &str = include_str!("../data/unit_type_alias.json");

static BUNDLED: Lazy<UnitDictionary> = Lazy::new(|| {
    UnitDictionary::from_json(
        UNIT_CONVERSION_JSON,
        UNIT_TYPE_FUNDAMENTAL_JSON,
        SCALERS_JSON,
        UNIT_TYPE_ALIAS_JSON,
    )
    .expect("bundled unit tables are valid")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawUnit {
    pub multiplier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawUnitType {
    pub base_unit: String,
    #[serde(default)]
    pub fundamental: bool,
    #[serde(default)]
    pub units: BTreeMap<String, RawUnit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawScaler {
    #[serde(rename = "scale factor")]
    pub scale_factor: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawUnitTypeAlias {
    pub unit_type_relation: String,
    /// Allowed canonical units, keyed by the unit type of the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_restriction: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown_restriction: Option<Vec<String>>,
}

/// The four raw tables, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub unit_conversion: Vec<(String, RawUnitType)>,
    pub unit_type_fundamental: Vec<(String, Vec<String>)>,
    pub scalers: Vec<(String, RawScaler)>,
    pub unit_type_alias: Vec<(String, RawUnitTypeAlias)>,
}

impl RawTables {
    pub fn from_json(
        unit_conversion: &str,
        unit_type_fundamental: &str,
        scalers: &str,
        unit_type_alias: &str,
    ) -> Result<Self, DictionaryError> {
        Ok(Self {
            unit_conversion: ordered_entries(unit_conversion, "unit_conversion")?,
            unit_type_fundamental: ordered_entries(unit_type_fundamental, "unit_type_fundamental")?,
            scalers: ordered_entries(scalers, "scalers")?,
            unit_type_alias: ordered_entries(unit_type_alias, "unit_type_alias")?,
        })
    }
}

/// Deserialize a JSON object into `(key, value)` pairs, keeping file order.
fn ordered_entries<T: DeserializeOwned>(
    json: &str,
    table: &'static str,
) -> Result<Vec<(String, T)>, DictionaryError> {
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(json).map_err(|source| DictionaryError::Json { table, source })?;
    object
        .into_iter()
        .map(|(key, value)| {
            serde_json::from_value(value)
                .map(|parsed| (key, parsed))
                .map_err(|source| DictionaryError::Json { table, source })
        })
        .collect()
}

/// Evaluate a constant such as `"0.3048"`, `"1/0.3048"` or `"-101325/6894.76"`.
fn eval_constant(unit: &str, expression: &str) -> Result<f64, DictionaryError> {
    let invalid = || DictionaryError::InvalidExpression {
        unit: unit.to_string(),
        expression: expression.to_string(),
    };
    let mut value = 1.0;
    let mut divide = false;
    let mut rest = expression.trim();
    loop {
        let end = rest.find(['*', '/']).unwrap_or(rest.len());
        let factor: f64 = rest[..end].trim().parse().map_err(|_| invalid())?;
        if divide {
            value /= factor;
        } else {
            value *= factor;
        }
        if end == rest.len() {
            break;
        }
        divide = rest[end..].starts_with('/');
        rest = &rest[end + 1..];
    }
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid())
    }
}

/// A canonical unit and its rule relative to the base unit of its type.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDefinition {
    pub name: String,
    pub unit_type: String,
    pub base_unit: String,
    pub multiplier: f64,
    pub shift: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitTypeDefinition {
    pub name: String,
    pub base_unit: String,
    pub fundamental: bool,
    pub dimension: Dimension,
    pub breakdowns: Vec<TypeBreakdown>,
    /// Canonical unit names, sorted.
    pub units: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitTypeAlias {
    pub name: String,
    pub unit_type: String,
    pub unit_restriction: Option<BTreeMap<String, Vec<String>>>,
    pub breakdown_restriction: Option<Vec<TypeBreakdown>>,
}

impl UnitTypeAlias {
    pub fn is_restricted(&self) -> bool {
        self.unit_restriction.is_some() || self.breakdown_restriction.is_some()
    }
}

/// Immutable lookup tables derived from [`RawTables`].
#[derive(Debug, Clone)]
pub struct UnitDictionary {
    /// Fundamental unit types in declaration order.
    pub(crate) basis: Vec<String>,
    pub(crate) unit_aliases: HashMap<String, String>,
    pub(crate) scaler_aliases: HashMap<String, f64>,
    /// Scaler aliases, longest first.
    pub(crate) scaler_prefixes: Vec<String>,
    pub(crate) units: HashMap<String, UnitDefinition>,
    pub(crate) unit_types: HashMap<String, UnitTypeDefinition>,
    pub(crate) unit_type_order: Vec<String>,
    pub(crate) dimension_types: HashMap<Dimension, String>,
    pub(crate) aliases: HashMap<String, UnitTypeAlias>,
}

impl UnitDictionary {
    /// The dictionary built from the tables shipped with this crate.
    pub fn bundled() -> &'static UnitDictionary {
        &BUNDLED
    }

    pub fn from_json(
        unit_conversion: &str,
        unit_type_fundamental: &str,
        scalers: &str,
        unit_type_alias: &str,
    ) -> Result<Self, DictionaryError> {
        Self::from_tables(RawTables::from_json(
            unit_conversion,
            unit_type_fundamental,
            scalers,
            unit_type_alias,
        )?)
    }

    /// Load the tables from `dir`. `unit_type_alias.json` is optional.
    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        let read = |name: &str| -> anyhow::Result<String> {
            let path = dir.join(name);
            std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))
        };
        let unit_conversion = read("unit_conversion.json")?;
        let unit_type_fundamental = read("unit_type_fundamental.json")?;
        let scalers = read("scalers.json")?;
        let alias_path = dir.join("unit_type_alias.json");
        let unit_type_alias = if alias_path.exists() {
            read("unit_type_alias.json")?
        } else {
            "{}".to_string()
        };
        Self::from_json(
            &unit_conversion,
            &unit_type_fundamental,
            &scalers,
            &unit_type_alias,
        )
        .with_context(|| format!("failed to build unit dictionary from {}", dir.display()))
    }

    pub fn from_tables(tables: RawTables) -> Result<Self, DictionaryError> {
        let basis: Vec<String> = tables
            .unit_conversion
            .iter()
            .filter(|(_, raw)| raw.fundamental)
            .map(|(name, _)| name.clone())
            .collect();
        if basis.is_empty() {
            return Err(DictionaryError::MissingBasis);
        }

        let mut unit_aliases: HashMap<String, String> = HashMap::new();
        let mut units = HashMap::new();
        for (unit_type, raw_type) in &tables.unit_conversion {
            for (unit, raw_unit) in &raw_type.units {
                for alias in std::iter::once(unit).chain(raw_unit.aliases.iter()) {
                    if let Some(first) = unit_aliases.insert(alias.clone(), unit.clone()) {
                        if first != *unit {
                            return Err(DictionaryError::DuplicateAlias {
                                alias: alias.clone(),
                                first,
                                second: unit.clone(),
                            });
                        }
                    }
                }
                let shift = match &raw_unit.shift {
                    Some(expr) => eval_constant(unit, expr)?,
                    None => 0.0,
                };
                units.insert(
                    unit.clone(),
                    UnitDefinition {
                        name: unit.clone(),
                        unit_type: unit_type.clone(),
                        base_unit: raw_type.base_unit.clone(),
                        multiplier: eval_constant(unit, &raw_unit.multiplier)?,
                        shift,
                    },
                );
            }
        }

        let mut scaler_aliases = HashMap::new();
        let mut scaler_owners: HashMap<&str, &str> = HashMap::new();
        for (scaler, raw) in &tables.scalers {
            if !raw.scale_factor.is_finite() || raw.scale_factor == 0.0 {
                return Err(DictionaryError::InvalidScaleFactor {
                    scaler: scaler.clone(),
                    factor: raw.scale_factor,
                });
            }
            for alias in std::iter::once(scaler).chain(raw.aliases.iter()) {
                if let Some(first) = scaler_owners.insert(alias, scaler) {
                    if first != scaler.as_str() {
                        return Err(DictionaryError::DuplicateAlias {
                            alias: alias.clone(),
                            first: first.to_string(),
                            second: scaler.clone(),
                        });
                    }
                }
                scaler_aliases.insert(alias.clone(), raw.scale_factor);
            }
        }
        let mut scaler_prefixes: Vec<String> = scaler_aliases.keys().cloned().collect();
        scaler_prefixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let breakdowns: HashMap<&str, Vec<TypeBreakdown>> = tables
            .unit_type_fundamental
            .iter()
            .map(|(name, forms)| {
                (
                    name.as_str(),
                    forms.iter().map(|f| TypeBreakdown::parse(f)).collect(),
                )
            })
            .collect();
        let dimensions = resolve_dimensions(&tables.unit_conversion, &basis, &breakdowns)?;

        let mut unit_types = HashMap::new();
        let mut unit_type_order = Vec::new();
        let mut dimension_types: HashMap<Dimension, String> = HashMap::new();
        for (name, raw) in &tables.unit_conversion {
            let dimension = dimensions[name.as_str()].clone();
            match dimension_types.get(&dimension) {
                Some(owner) => log::warn!(
                    "Unit type '{name}' shares its dimension with '{owner}'; '{owner}' is used for lookups"
                ),
                None => {
                    dimension_types.insert(dimension.clone(), name.clone());
                }
            }
            let mut type_units: Vec<String> = raw.units.keys().cloned().collect();
            type_units.sort();
            unit_types.insert(
                name.clone(),
                UnitTypeDefinition {
                    name: name.clone(),
                    base_unit: raw.base_unit.clone(),
                    fundamental: raw.fundamental,
                    dimension,
                    breakdowns: breakdowns.get(name.as_str()).cloned().unwrap_or_default(),
                    units: type_units,
                },
            );
            unit_type_order.push(name.clone());
        }

        let mut aliases = HashMap::new();
        for (name, raw) in tables.unit_type_alias {
            if !unit_types.contains_key(&raw.unit_type_relation) {
                return Err(DictionaryError::UnknownUnitType {
                    unit_type: raw.unit_type_relation,
                    referenced_by: name,
                });
            }
            let breakdown_restriction = raw
                .breakdown_restriction
                .map(|forms| forms.iter().map(|f| TypeBreakdown::parse(f)).collect());
            aliases.insert(
                name.clone(),
                UnitTypeAlias {
                    name,
                    unit_type: raw.unit_type_relation,
                    unit_restriction: raw.unit_restriction,
                    breakdown_restriction,
                },
            );
        }

        log::debug!(
            "Built unit dictionary: {} unit types, {} units, {} unit aliases, {} scaler aliases",
            unit_types.len(),
            units.len(),
            unit_aliases.len(),
            scaler_aliases.len()
        );

        Ok(Self {
            basis,
            unit_aliases,
            scaler_aliases,
            scaler_prefixes,
            units,
            unit_types,
            unit_type_order,
            dimension_types,
            aliases,
        })
    }

    /// Fundamental unit types, in basis order.
    pub fn basis(&self) -> &[String] {
        &self.basis
    }

    /// Unit type names in declaration order.
    pub fn unit_types(&self) -> impl Iterator<Item = &UnitTypeDefinition> {
        self.unit_type_order.iter().map(|name| &self.unit_types[name])
    }

    pub fn unit_type(&self, name: &str) -> Option<&UnitTypeDefinition> {
        self.unit_types.get(name)
    }

    pub fn unit_type_alias(&self, name: &str) -> Option<&UnitTypeAlias> {
        self.aliases.get(name)
    }

    /// Canonical units of `unit_type` (or of the unit type an alias points to).
    pub fn units_of(&self, unit_type: &str) -> Option<&[String]> {
        let name = self
            .aliases
            .get(unit_type)
            .map(|alias| alias.unit_type.as_str())
            .unwrap_or(unit_type);
        self.unit_types.get(name).map(|t| t.units.as_slice())
    }

    pub fn unit(&self, canonical: &str) -> Option<&UnitDefinition> {
        self.units.get(canonical)
    }

    pub fn resolve_alias(&self, alias: &str) -> Option<&str> {
        self.unit_aliases.get(alias).map(String::as_str)
    }

    pub fn scale_factor(&self, alias: &str) -> Option<f64> {
        self.scaler_aliases.get(alias).copied()
    }

    /// Canonical `num*num/den*den` string of a dimension (`base_unit`).
    pub fn base_unit(&self, dimension: &Dimension) -> String {
        dimension.render(&self.basis)
    }

    /// Dimension of a unit type, if the type is known.
    pub fn dimension_of(&self, unit_type: &str) -> Option<&Dimension> {
        self.unit_types.get(unit_type).map(|t| &t.dimension)
    }

    pub(crate) fn is_affine(&self, dimension: &Dimension) -> bool {
        AFFINE_UNIT_TYPES
            .iter()
            .filter_map(|name| self.dimension_of(name))
            .any(|d| d == dimension)
    }
}

/// Resolve every unit type to a basis vector, passing over the table until
/// nothing new resolves.
fn resolve_dimensions<'a>(
    unit_conversion: &'a [(String, RawUnitType)],
    basis: &[String],
    breakdowns: &HashMap<&str, Vec<TypeBreakdown>>,
) -> Result<HashMap<&'a str, Dimension>, DictionaryError> {
    let mut resolved: HashMap<&str, Dimension> = basis
        .iter()
        .enumerate()
        .filter_map(|(index, name)| {
            unit_conversion
                .iter()
                .find(|(n, _)| n == name)
                .map(|(n, _)| (n.as_str(), Dimension::basis(index)))
        })
        .collect();

    let known = |name: &str| unit_conversion.iter().any(|(n, _)| n == name);
    for (name, forms) in breakdowns {
        if !known(*name) {
            return Err(DictionaryError::UnknownUnitType {
                unit_type: name.to_string(),
                referenced_by: "unit_type_fundamental".to_string(),
            });
        }
        for term in forms
            .iter()
            .flat_map(|f| f.numerator().iter().chain(f.denominator()))
        {
            if !known(term.as_str()) {
                return Err(DictionaryError::UnknownUnitType {
                    unit_type: term.clone(),
                    referenced_by: name.to_string(),
                });
            }
        }
    }

    let evaluate = |form: &TypeBreakdown, resolved: &HashMap<&str, Dimension>| {
        let side = |terms: &[String]| -> Option<Dimension> {
            terms
                .iter()
                .map(|t| resolved.get(t.as_str()).cloned())
                .product()
        };
        Some(side(form.numerator())? / side(form.denominator())?)
    };

    loop {
        let mut progressed = false;
        for (name, _) in unit_conversion {
            if resolved.contains_key(name.as_str()) {
                continue;
            }
            // A type without a breakdown entry stays unresolved; an empty
            // entry marks it dimensionless.
            let Some(forms) = breakdowns.get(name.as_str()) else {
                continue;
            };
            let found = if forms.is_empty() {
                Some(Dimension::DIMENSIONLESS)
            } else {
                forms
                    .iter()
                    .filter(|f| !f.is_only(name))
                    .find_map(|f| evaluate(f, &resolved))
            };
            if let Some(dimension) = found {
                resolved.insert(name, dimension);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    for (name, _) in unit_conversion {
        let Some(dimension) = resolved.get(name.as_str()) else {
            return Err(DictionaryError::UnresolvedUnitType {
                unit_type: name.clone(),
            });
        };
        for form in breakdowns.get(name.as_str()).into_iter().flatten() {
            if form.is_only(name) {
                continue;
            }
            if evaluate(form, &resolved).as_ref() != Some(dimension) {
                return Err(DictionaryError::InconsistentBreakdown {
                    unit_type: name.clone(),
                    breakdown: form.to_string(),
                });
            }
        }
    }

    Ok(resolved)
}

use itertools::Itertools;

use crate::dictionary::UnitTypeAlias;
use crate::dimension::{Dimension, TypeBreakdown};
use crate::error::UnitError;
use crate::parse::Token;
use crate::UnitDictionary;

/// A validated unit type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnitType {
    /// The name as given: a unit type or a unit type alias.
    pub name: String,
    /// The unit type `name` refers to.
    pub unit_type: String,
    /// True when `name` is an alias declaring unit or breakdown restrictions.
    pub restricted: bool,
}

impl UnitDictionary {
    /// Validate an optional unit type name, resolving aliases.
    pub fn unit_type_check(
        &self,
        unit_type: Option<&str>,
    ) -> Result<Option<ResolvedUnitType>, UnitError> {
        let Some(name) = unit_type else {
            return Ok(None);
        };
        if self.unit_types.contains_key(name) {
            return Ok(Some(ResolvedUnitType {
                name: name.to_string(),
                unit_type: name.to_string(),
                restricted: false,
            }));
        }
        match self.aliases.get(name) {
            Some(alias) => Ok(Some(ResolvedUnitType {
                name: name.to_string(),
                unit_type: alias.unit_type.clone(),
                restricted: alias.is_restricted(),
            })),
            None => Err(UnitError::UnknownUnitType {
                unit_type: name.to_string(),
            }),
        }
    }

    /// Unit-type breakdown of a token list, e.g. `area*distance/time`.
    pub fn type_breakdown(&self, numerator: &[Token], denominator: &[Token]) -> TypeBreakdown {
        let types = |tokens: &[Token]| tokens.iter().map(|t| t.unit_type.clone()).collect();
        TypeBreakdown::new(types(numerator), types(denominator))
    }

    /// Dimension of a parsed token list, checked against the declared unit
    /// type when there is one.
    pub fn unit_to_unit_type_check(
        &self,
        unit: &str,
        numerator: &[Token],
        denominator: &[Token],
        unit_type: Option<&ResolvedUnitType>,
    ) -> Result<Dimension, UnitError> {
        let dimension_of = |tokens: &[Token]| -> Dimension {
            tokens
                .iter()
                .filter_map(|t| self.dimension_of(&t.unit_type).cloned())
                .product()
        };
        let dimension = dimension_of(numerator) / dimension_of(denominator);

        if let Some(declared) = unit_type {
            let expected = self.dimension_of(&declared.unit_type);
            if expected != Some(&dimension) {
                log::debug!(
                    "'{unit}' has breakdown '{}' ({}), expected {}",
                    self.type_breakdown(numerator, denominator),
                    self.base_unit(&dimension),
                    declared.unit_type
                );
                return Err(UnitError::InvalidUnitForType {
                    unit: unit.to_string(),
                    unit_type: declared.name.clone(),
                });
            }
        }
        Ok(dimension)
    }

    /// Name of the unit type owning `dimension`, or the dimension's own
    /// `num*num/den*den` rendering when no unit type claims it.
    pub fn base_to_unit_type(&self, dimension: &Dimension) -> String {
        self.dimension_types
            .get(dimension)
            .cloned()
            .unwrap_or_else(|| self.base_unit(dimension))
    }

    /// Enforce the unit and breakdown restrictions of a unit type alias.
    pub fn res_unit_check(
        &self,
        unit: &str,
        numerator: &[Token],
        denominator: &[Token],
        alias: &UnitTypeAlias,
    ) -> Result<(), UnitError> {
        if let Some(allowed) = &alias.unit_restriction {
            let offending: Vec<String> = numerator
                .iter()
                .chain(denominator)
                .filter(|token| {
                    !allowed
                        .get(&token.unit_type)
                        .is_some_and(|units| units.contains(&token.unit))
                })
                .map(|token| token.unit.clone())
                .unique()
                .collect();
            if !offending.is_empty() {
                return Err(UnitError::RestrictedUnit {
                    unit: unit.to_string(),
                    unit_type: alias.name.clone(),
                    units: offending,
                });
            }
        }

        if let Some(allowed) = &alias.breakdown_restriction {
            let breakdown = self.type_breakdown(numerator, denominator);
            if !allowed.contains(&breakdown) {
                return Err(UnitError::RestrictedBreakdown {
                    unit: unit.to_string(),
                    unit_type: alias.name.clone(),
                    breakdown: breakdown.to_string(),
                });
            }
        }
        Ok(())
    }
}

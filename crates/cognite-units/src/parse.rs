//! Tokenizing compound unit expressions such as `acre*ft/d` or
//! `kilolbf/(in*in)`.
//!
//! A unit expression is an optional numerator and an optional denominator
//! separated by a single `/`. Factors are separated by `*`, `.` or `-`.
//! Each factor may carry a leading integer multiplier (`10mile`), a scaler
//! prefix (`kilolbf`, `km`) and a trailing integer exponent (`s2`, `ft3`).

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::check::ResolvedUnitType;
use crate::dimension::Dimension;
use crate::error::UnitError;
use crate::UnitDictionary;

static LEADING_NUMERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)(.*)$").expect("valid regex"));
static TRAILING_EXPONENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*[^0-9])([0-9]+)$").expect("valid regex"));

/// Largest trailing exponent accepted on a single factor.
pub const MAX_EXPONENT: usize = 12;

/// One resolved factor of a unit expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The factor as written, before multiplier/exponent/scaler stripping.
    pub text: String,
    pub unit: String,
    pub unit_type: String,
    pub scale: f64,
}

/// A unit expression reduced to canonical units and a dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedUnit {
    pub input: String,
    pub numerator: Vec<Token>,
    pub denominator: Vec<Token>,
    /// Product of numeric prefixes, numerator over denominator.
    pub multiplier: f64,
    /// Product of scaler prefixes, numerator over denominator.
    pub scaler: f64,
    pub dimension: Dimension,
    /// Unit type owning `dimension`.
    pub unit_type: String,
}

impl ParsedUnit {
    /// Canonical unit names joined as `a*b/c*d`.
    pub fn normalized(&self) -> String {
        let join = |tokens: &[Token]| {
            tokens
                .iter()
                .map(|t| t.unit.as_str())
                .collect::<Vec<_>>()
                .join("*")
        };
        match (self.numerator.is_empty(), self.denominator.is_empty()) {
            (_, true) => join(&self.numerator),
            (true, false) => format!("1/{}", join(&self.denominator)),
            (false, false) => format!("{}/{}", join(&self.numerator), join(&self.denominator)),
        }
    }
}

impl fmt::Display for ParsedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized())
    }
}

/// Validate `/` and parenthesis placement.
///
/// Parentheses may only wrap the whole denominator, and a denominator with
/// more than one factor must be wrapped: `kg/(m*s)` is accepted, `kg/m*s`
/// and `(m/s)*s` are not.
pub fn bracket_check(unit: &str) -> Result<(), UnitError> {
    let fail = |reason: &str| {
        Err(UnitError::InvalidSyntax {
            unit: unit.to_string(),
            reason: reason.to_string(),
        })
    };
    let trimmed = unit.trim();
    if trimmed.is_empty() {
        return fail("empty unit");
    }
    if trimmed.starts_with('/') || trimmed.ends_with('/') {
        return fail("'/' cannot start or end a unit");
    }
    let (numerator, denominator) = match trimmed.split_once('/') {
        Some((num, den)) => (num, Some(den)),
        None => (trimmed, None),
    };
    if numerator.contains(['(', ')']) {
        return fail("parentheses are only allowed in the denominator");
    }
    let Some(denominator) = denominator.map(str::trim) else {
        return Ok(());
    };
    if denominator.contains('/') {
        return fail("only one '/' is allowed");
    }
    if denominator.contains(['(', ')']) {
        let inner = denominator
            .strip_prefix('(')
            .and_then(|d| d.strip_suffix(')'));
        match inner {
            Some(inner) if !inner.contains(['(', ')']) && !inner.trim().is_empty() => Ok(()),
            _ => fail("the denominator must be a single parenthesised group"),
        }
    } else if denominator.contains(['*', '.', '-']) {
        fail("a denominator with several factors must be wrapped in parentheses")
    } else {
        Ok(())
    }
}

/// Split a checked unit expression into numerator and denominator factors.
fn split_factors(unit: &str) -> (Vec<String>, Vec<String>) {
    let normalized: String = unit
        .trim()
        .chars()
        .filter(|c| *c != '(' && *c != ')')
        .map(|c| if c == '.' || c == '-' { '*' } else { c })
        .collect();
    let factors = |side: &str| -> Vec<String> {
        side.split('*').map(|t| t.trim().to_string()).collect()
    };
    match normalized.split_once('/') {
        Some((num, den)) => (factors(num), factors(den)),
        None => (factors(&normalized), Vec::new()),
    }
}

/// Strip a leading integer from a factor: `10mile` -> `(10.0, "mile")`.
pub fn multiplier_extract(token: &str) -> (f64, &str) {
    match LEADING_NUMERAL.captures(token) {
        Some(caps) => {
            let digits = caps.get(1).map_or("", |m| m.as_str());
            let rest = caps.get(2).map_or("", |m| m.as_str());
            (digits.parse().unwrap_or(1.0), rest)
        }
        None => (1.0, token),
    }
}

impl UnitDictionary {
    /// Expand a trailing exponent into repeated factors: `s4` -> `[s, s, s, s]`.
    ///
    /// Tokens that are already unit aliases (`m3`) are left alone. Exponents
    /// must lie in `1..=MAX_EXPONENT`.
    pub fn exponent_split(&self, token: &str) -> Result<Vec<String>, UnitError> {
        if self.unit_aliases.contains_key(token) {
            return Ok(vec![token.to_string()]);
        }
        let Some(caps) = TRAILING_EXPONENT.captures(token) else {
            return Ok(vec![token.to_string()]);
        };
        let base = caps.get(1).map_or("", |m| m.as_str());
        let digits = caps.get(2).map_or("", |m| m.as_str());
        match digits.parse::<usize>() {
            Ok(exponent) if (1..=MAX_EXPONENT).contains(&exponent) => {
                log::trace!("Expanded '{token}' into {exponent} x '{base}'");
                Ok(vec![base.to_string(); exponent])
            }
            _ => Err(UnitError::InvalidSyntax {
                unit: token.to_string(),
                reason: format!("exponent {digits} is outside 1..={MAX_EXPONENT}"),
            }),
        }
    }

    /// Split `token` into a scaler prefix and a known unit alias.
    ///
    /// The split is only accepted if the remainder is a unit alias, trying
    /// longer scaler aliases first.
    pub fn unit_from_scaler<'a>(&self, token: &'a str) -> Option<(f64, &'a str)> {
        self.scaler_prefixes.iter().find_map(|prefix| {
            let rest = token.strip_prefix(prefix.as_str())?;
            if rest.is_empty() || !self.unit_aliases.contains_key(rest) {
                return None;
            }
            log::trace!("Split '{token}' into scaler '{prefix}' and unit '{rest}'");
            Some((self.scaler_aliases[prefix], rest))
        })
    }

    /// Scale factor and unit alias of a factor; known aliases are never split.
    pub fn scaler_extract<'a>(&self, token: &'a str) -> (f64, &'a str) {
        if self.unit_aliases.contains_key(token) {
            return (1.0, token);
        }
        self.unit_from_scaler(token).unwrap_or((1.0, token))
    }

    /// Resolve one side of an expression into tokens, returning the side's
    /// numeric multiplier and scaler products.
    fn resolve_side(&self, factors: &[String]) -> Result<(Vec<Token>, f64, f64), UnitError> {
        let mut tokens = Vec::new();
        let mut multiplier = 1.0;
        let mut scaler = 1.0;
        for factor in factors {
            if factor.is_empty() {
                return Err(UnitError::UnknownUnit {
                    token: factor.clone(),
                });
            }
            let (numeral, rest) = multiplier_extract(factor);
            if numeral == 0.0 || !numeral.is_finite() {
                return Err(UnitError::InvalidSyntax {
                    unit: factor.clone(),
                    reason: "numeric multipliers must be positive and finite".to_string(),
                });
            }
            multiplier *= numeral;
            if rest.is_empty() {
                continue;
            }
            for piece in self.exponent_split(rest)? {
                let (scale, alias) = self.scaler_extract(&piece);
                let unknown = || UnitError::UnknownUnit {
                    token: factor.clone(),
                };
                let unit = self.unit_aliases.get(alias).ok_or_else(unknown)?;
                let definition = self.units.get(unit).ok_or_else(unknown)?;
                scaler *= scale;
                tokens.push(Token {
                    text: factor.clone(),
                    unit: unit.clone(),
                    unit_type: definition.unit_type.clone(),
                    scale,
                });
            }
        }
        Ok((tokens, multiplier, scaler))
    }

    /// Parse `unit` into canonical tokens and a dimension (`preprocess_unit`).
    ///
    /// `unit_type` is the result of [`UnitDictionary::unit_type_check`];
    /// restricted aliases are enforced before the dimension is resolved.
    pub fn parse_unit(
        &self,
        unit: &str,
        unit_type: Option<&ResolvedUnitType>,
    ) -> Result<ParsedUnit, UnitError> {
        bracket_check(unit)?;
        let (num_factors, den_factors) = split_factors(unit);
        let (numerator, num_multiplier, num_scaler) = self.resolve_side(&num_factors)?;
        let (denominator, den_multiplier, den_scaler) = self.resolve_side(&den_factors)?;

        if let Some(alias) = unit_type
            .filter(|t| t.restricted)
            .and_then(|t| self.aliases.get(&t.name))
        {
            self.res_unit_check(unit, &numerator, &denominator, alias)?;
        }

        let dimension = self.unit_to_unit_type_check(unit, &numerator, &denominator, unit_type)?;
        let owner = self.base_to_unit_type(&dimension);
        if !self.unit_types.contains_key(&owner) {
            return Err(UnitError::UnresolvedDimension {
                unit: unit.to_string(),
                dimension: owner,
            });
        }

        let parsed = ParsedUnit {
            input: unit.to_string(),
            numerator,
            denominator,
            multiplier: num_multiplier / den_multiplier,
            scaler: num_scaler / den_scaler,
            dimension,
            unit_type: owner,
        };
        log::debug!(
            "Parsed '{}' as '{}' ({}), multiplier {}, scaler {}",
            unit,
            parsed.normalized(),
            parsed.unit_type,
            parsed.multiplier,
            parsed.scaler
        );
        Ok(parsed)
    }
}

use std::fmt;

use itertools::{EitherOrBoth, Itertools};

/// Signed exponents over the ordered fundamental basis.
///
/// Trailing zero exponents are trimmed so that dimensions built over
/// bases of different lengths still compare equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dimension(Vec<i32>);

impl Dimension {
    pub const DIMENSIONLESS: Self = Self(Vec::new());

    /// Unit vector of the `index`-th basis element.
    pub fn basis(index: usize) -> Self {
        let mut exponents = vec![0; index + 1];
        exponents[index] = 1;
        Self(exponents)
    }

    pub fn from_exponents(exponents: Vec<i32>) -> Self {
        Self(exponents).trimmed()
    }

    pub fn exponents(&self) -> &[i32] {
        &self.0
    }

    pub fn exponent(&self, index: usize) -> i32 {
        self.0.get(index).copied().unwrap_or(0)
    }

    pub fn is_dimensionless(&self) -> bool {
        self.0.is_empty()
    }

    fn combine(&self, rhs: &Self, op: impl Fn(i32, i32) -> i32) -> Self {
        let exponents = self
            .0
            .iter()
            .zip_longest(rhs.0.iter())
            .map(|pair| match pair {
                EitherOrBoth::Both(a, b) => op(*a, *b),
                EitherOrBoth::Left(a) => op(*a, 0),
                EitherOrBoth::Right(b) => op(0, *b),
            })
            .collect();
        Self(exponents).trimmed()
    }

    fn trimmed(mut self) -> Self {
        while self.0.last() == Some(&0) {
            self.0.pop();
        }
        self
    }

    /// Canonical `num*num/den*den` rendering over the given basis names.
    pub fn render(&self, basis: &[impl AsRef<str>]) -> String {
        let mut num = Vec::new();
        let mut den = Vec::new();
        for (index, &exp) in self.0.iter().enumerate() {
            let name = basis
                .get(index)
                .map(|b| b.as_ref().to_string())
                .unwrap_or_else(|| format!("dim{index}"));
            let side = if exp > 0 { &mut num } else { &mut den };
            for _ in 0..exp.unsigned_abs() {
                side.push(name.clone());
            }
        }
        match (num.is_empty(), den.is_empty()) {
            (true, true) => String::new(),
            (false, true) => num.join("*"),
            (true, false) => format!("1/{}", den.join("*")),
            (false, false) => format!("{}/{}", num.join("*"), den.join("*")),
        }
    }
}

impl std::ops::Mul for &Dimension {
    type Output = Dimension;
    fn mul(self, rhs: Self) -> Self::Output {
        self.combine(rhs, |a, b| a + b)
    }
}

impl std::ops::Div for &Dimension {
    type Output = Dimension;
    fn div(self, rhs: Self) -> Self::Output {
        self.combine(rhs, |a, b| a - b)
    }
}

impl std::ops::Mul for Dimension {
    type Output = Dimension;
    fn mul(self, rhs: Self) -> Self::Output {
        &self * &rhs
    }
}

impl std::ops::Div for Dimension {
    type Output = Dimension;
    fn div(self, rhs: Self) -> Self::Output {
        &self / &rhs
    }
}

impl std::iter::Product for Dimension {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Dimension::DIMENSIONLESS, |acc, d| acc * d)
    }
}

/// Numerator and denominator multisets of unit-type names, e.g.
/// `volume/time` or `mass*distance/time*time`.
///
/// Both sides are kept sorted, so two breakdowns compare equal whatever
/// order their factors were written in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TypeBreakdown {
    numerator: Vec<String>,
    denominator: Vec<String>,
}

impl TypeBreakdown {
    pub fn new(mut numerator: Vec<String>, mut denominator: Vec<String>) -> Self {
        numerator.sort();
        denominator.sort();
        Self {
            numerator,
            denominator,
        }
    }

    /// Parse an expression like `mass*distance/(time*time)`.
    ///
    /// Parentheses are ignored and bare numerals (the `1` in `1/time`)
    /// contribute nothing.
    pub fn parse(expression: &str) -> Self {
        let cleaned: String = expression
            .chars()
            .filter(|c| *c != '(' && *c != ')')
            .collect();
        let (num, den) = match cleaned.split_once('/') {
            Some((num, den)) => (num, den),
            None => (cleaned.as_str(), ""),
        };
        let terms = |side: &str| -> Vec<String> {
            side.split('*')
                .map(str::trim)
                .filter(|t| !t.is_empty() && !t.chars().all(|c| c.is_ascii_digit()))
                .map(str::to_string)
                .collect()
        };
        Self::new(terms(num), terms(den))
    }

    pub fn numerator(&self) -> &[String] {
        &self.numerator
    }

    pub fn denominator(&self) -> &[String] {
        &self.denominator
    }

    pub fn is_empty(&self) -> bool {
        self.numerator.is_empty() && self.denominator.is_empty()
    }

    /// True for a breakdown consisting of `unit_type` alone.
    pub fn is_only(&self, unit_type: &str) -> bool {
        self.denominator.is_empty() && self.numerator.len() == 1 && self.numerator[0] == unit_type
    }
}

impl fmt::Display for TypeBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let num = if self.numerator.is_empty() {
            "1".to_string()
        } else {
            self.numerator.join("*")
        };
        if self.denominator.is_empty() {
            write!(f, "{num}")
        } else {
            write!(f, "{num}/{}", self.denominator.join("*"))
        }
    }
}

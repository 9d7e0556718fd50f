use std::fmt;

/// Linear (or affine) rule `y = multiplier * x + shift`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearTransform {
    pub multiplier: f64,
    pub shift: f64,
}

impl LinearTransform {
    pub const IDENTITY: Self = Self::new(1.0, 0.0);

    pub const fn new(multiplier: f64, shift: f64) -> Self {
        Self { multiplier, shift }
    }

    /// `self` followed by `next`.
    pub fn then(self, next: LinearTransform) -> LinearTransform {
        LinearTransform {
            multiplier: self.multiplier * next.multiplier,
            shift: next.multiplier * self.shift + next.shift,
        }
    }

    pub fn inverse(self) -> LinearTransform {
        LinearTransform {
            multiplier: 1.0 / self.multiplier,
            shift: -self.shift / self.multiplier,
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        self.multiplier * value + self.shift
    }
}

impl Default for LinearTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for LinearTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shift == 0.0 {
            write!(f, "x * {}", self.multiplier)
        } else if self.shift < 0.0 {
            write!(f, "x * {} - {}", self.multiplier, -self.shift)
        } else {
            write!(f, "x * {} + {}", self.multiplier, self.shift)
        }
    }
}

/// Left fold of `transforms` into one transform, applied first to last.
pub fn reduce_transformations<I>(transforms: I) -> LinearTransform
where
    I: IntoIterator<Item = LinearTransform>,
{
    transforms
        .into_iter()
        .fold(LinearTransform::IDENTITY, LinearTransform::then)
}

pub fn inverse_linear(multiplier: f64, shift: f64) -> LinearTransform {
    LinearTransform::new(multiplier, shift).inverse()
}

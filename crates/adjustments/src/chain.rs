use crate::error::AdjustmentError;
use configuration::{AdjustmentParam, AdjustmentSpec};
use std::fmt;

/// A single resolved adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// `ln(x)` for `x > 0`, missing otherwise.
    Log,
    /// `ln(1 + x)` for `x > -1`, missing otherwise.
    Log1p,
    /// Saturate into `[lo, hi]`.
    Clip { lo: f64, hi: f64 },
    /// Replace missing with a default.
    Coalesce(f64),
    /// Negate.
    Invert,
    Abs,
}

impl Adjustment {
    /// Resolves one YAML entry.
    pub fn from_spec(spec: &AdjustmentSpec) -> Result<Self, AdjustmentError> {
        let name = spec.name.trim();
        let invalid = |reason: &str| AdjustmentError::InvalidParameter {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let adjustment = match (name, &spec.param) {
            ("log", None) => Adjustment::Log,
            ("log1p", None) => Adjustment::Log1p,
            ("invert", None) => Adjustment::Invert,
            ("abs", None) => Adjustment::Abs,
            ("clip", None) => Adjustment::Clip { lo: 0.0, hi: 1.0 },
            ("clip", Some(AdjustmentParam::Bounds(bounds))) => match bounds.as_slice() {
                [lo, hi] if lo.is_finite() && hi.is_finite() && lo <= hi => {
                    Adjustment::Clip { lo: *lo, hi: *hi }
                }
                _ => return Err(invalid("expected finite bounds [lo, hi] with lo <= hi")),
            },
            ("coalesce", None) => Adjustment::Coalesce(0.0),
            ("coalesce", Some(AdjustmentParam::Scalar(v))) if v.is_finite() => {
                Adjustment::Coalesce(*v)
            }
            ("clip" | "coalesce", Some(_)) => return Err(invalid("unexpected parameter shape")),
            ("log" | "log1p" | "invert" | "abs", Some(_)) => {
                return Err(invalid("takes no parameter"));
            }
            (other, _) => return Err(AdjustmentError::UnknownAdjustment(other.to_string())),
        };
        Ok(adjustment)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Adjustment::Log => "log",
            Adjustment::Log1p => "log1p",
            Adjustment::Clip { .. } => "clip",
            Adjustment::Coalesce(_) => "coalesce",
            Adjustment::Invert => "invert",
            Adjustment::Abs => "abs",
        }
    }

    pub fn apply(&self, value: Option<f64>) -> Option<f64> {
        let out = match (self, value) {
            (Adjustment::Coalesce(default), None) => Some(*default),
            (_, None) => None,
            (Adjustment::Log, Some(x)) => (x > 0.0).then(|| x.ln()),
            (Adjustment::Log1p, Some(x)) => (x > -1.0).then(|| x.ln_1p()),
            (Adjustment::Clip { lo, hi }, Some(x)) => Some(x.clamp(*lo, *hi)),
            (Adjustment::Coalesce(_), Some(x)) => Some(x),
            (Adjustment::Invert, Some(x)) => Some(-x),
            (Adjustment::Abs, Some(x)) => Some(x.abs()),
        };
        out.filter(|v| v.is_finite())
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::Clip { lo, hi } => write!(f, "clip[{lo}, {hi}]"),
            Adjustment::Coalesce(v) => write!(f, "coalesce({v})"),
            other => f.write_str(other.name()),
        }
    }
}

/// An ordered list of adjustments, applied left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdjustmentChain {
    steps: Vec<Adjustment>,
}

impl AdjustmentChain {
    pub fn new(steps: Vec<Adjustment>) -> Self {
        Self { steps }
    }

    /// Resolves every entry, failing on the first unknown or malformed one.
    pub fn resolve(specs: &[AdjustmentSpec]) -> Result<Self, AdjustmentError> {
        let steps = specs
            .iter()
            .map(Adjustment::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Adjustment] {
        &self.steps
    }

    pub fn apply(&self, value: Option<f64>) -> Option<f64> {
        self.steps.iter().fold(value, |v, step| step.apply(v))
    }

    /// Applies the chain to every cell of a column in place.
    pub fn apply_column(&self, values: &mut [Option<f64>]) {
        if self.is_empty() {
            return;
        }
        for v in values.iter_mut() {
            *v = self.apply(*v);
        }
    }
}

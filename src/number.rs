//! Numbers holding either a signed integer or a floating point value.

/// 2^63 as a double. The smallest double that does not fit into an `i64`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Representation requested from or stored in a [`Number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberType {
    Int64,
    Double,
}

/// Number.
///
/// Can hold signed integer values up to `i64` and floating point values up to `f64`.
/// Conversions between the two report whether they were exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Returns the representation the value is stored in.
    pub fn number_type(&self) -> NumberType {
        match self {
            Number::Int(_) => NumberType::Int64,
            Number::Float(_) => NumberType::Double,
        }
    }

    /// Returns true if the value is stored in a floating point format.
    pub fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Converts to an integer.
    ///
    /// Returns the converted value and whether the conversion was exact. Floats are
    /// truncated toward zero; magnitudes beyond the `i64` range saturate and NaN becomes 0.
    pub fn to_i64(&self) -> (i64, bool) {
        match *self {
            Number::Int(value) => (value, true),
            Number::Float(value) => {
                if value >= I64_LIMIT {
                    (i64::MAX, false)
                } else if value < -I64_LIMIT {
                    (i64::MIN, false)
                } else {
                    let converted = value as i64;
                    (converted, converted as f64 == value)
                }
            }
        }
    }

    /// Converts to a double.
    ///
    /// Returns the converted value and whether the conversion was exact.
    pub fn to_f64(&self) -> (f64, bool) {
        match *self {
            Number::Float(value) => (value, true),
            Number::Int(value) => {
                let converted = value as f64;
                // `as` saturates on the way back, so 2^63 needs its own check.
                let exact = converted < I64_LIMIT && converted as i64 == value;
                (converted, exact)
            }
        }
    }

    /// Returns the integer value if it is exactly representable.
    pub fn exact_i64(&self) -> Option<i64> {
        match self.to_i64() {
            (value, true) => Some(value),
            _ => None,
        }
    }

    /// Returns the floating point value if it is exactly representable.
    pub fn exact_f64(&self) -> Option<f64> {
        match self.to_f64() {
            (value, true) => Some(value),
            _ => None,
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

//! Kleene three-valued logic
//!
//! Values are ordered `False < Unknown < True` for the connectives
//! (`and` = min, `or` = max) and `False, True < Unknown` for the
//! information order used by join.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A three-valued truth value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kleene {
    False = 0,
    Unknown = 1,
    True = 2,
}

impl Kleene {
    /// Numeric encoding (0, 1, 2)
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Kleene::False),
            1 => Some(Kleene::Unknown),
            2 => Some(Kleene::True),
            _ => None,
        }
    }

    #[inline]
    pub fn from_bool(b: bool) -> Self {
        if b {
            Kleene::True
        } else {
            Kleene::False
        }
    }

    #[inline]
    pub fn and(self, other: Self) -> Self {
        self.min(other)
    }

    #[inline]
    pub fn or(self, other: Self) -> Self {
        self.max(other)
    }

    #[inline]
    pub fn not(self) -> Self {
        match self {
            Kleene::False => Kleene::True,
            Kleene::Unknown => Kleene::Unknown,
            Kleene::True => Kleene::False,
        }
    }

    /// `self -> other`, i.e. `!self | other`
    #[inline]
    pub fn implies(self, other: Self) -> Self {
        self.not().or(other)
    }

    /// Information-order join: equal values are kept, anything else is Unknown.
    #[inline]
    pub fn join(self, other: Self) -> Self {
        if self == other {
            self
        } else {
            Kleene::Unknown
        }
    }

    /// Information-order meet. Unknown yields the other operand;
    /// `False` meet `True` has no value.
    pub fn meet(self, other: Self) -> Option<Self> {
        match (self, other) {
            (Kleene::Unknown, v) | (v, Kleene::Unknown) => Some(v),
            (a, b) if a == b => Some(a),
            _ => None,
        }
    }

    /// `self` is at least as precise as `other`.
    #[inline]
    pub fn less_or_equal(self, other: Self) -> bool {
        other == Kleene::Unknown || self == other
    }

    #[inline]
    pub fn is_definite(self) -> bool {
        self != Kleene::Unknown
    }

    #[inline]
    pub fn is_potentially_true(self) -> bool {
        self != Kleene::False
    }
}

impl Default for Kleene {
    fn default() -> Self {
        Kleene::False
    }
}

impl From<bool> for Kleene {
    fn from(b: bool) -> Self {
        Kleene::from_bool(b)
    }
}

impl fmt::Display for Kleene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kleene::False => "0",
            Kleene::Unknown => "1/2",
            Kleene::True => "1",
        };
        f.write_str(s)
    }
}

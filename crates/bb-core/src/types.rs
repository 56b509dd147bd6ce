//! Record identifiers and the concurrency limit type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generates an integer record ID newtype with common trait implementations.
macro_rules! define_record_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw identifier.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw identifier value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

define_record_id!(
    /// Identifies a department.
    DepartmentId
);

define_record_id!(
    /// Identifies a user.
    UserId
);

define_record_id!(
    /// Identifies a break type.
    BreakTypeId
);

define_record_id!(
    /// Identifies a single break entry.
    BreakId
);

/// Concurrency limit for a break type.
///
/// `Unlimited` is a distinct variant rather than a large numeric sentinel, so
/// it can never overflow or compare oddly against a real active count.
///
/// Serializes as a plain number for finite limits and the string
/// `"unlimited"` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// At most this many breaks of the type may be active at once.
    Finite(u32),
    /// No cap on concurrent breaks of the type.
    Unlimited,
}

impl Limit {
    /// Whether a new break may start given the current active count.
    #[must_use]
    pub fn admits(self, active: usize) -> bool {
        match self {
            Self::Finite(limit) => (active as u64) < u64::from(limit),
            Self::Unlimited => true,
        }
    }

    #[must_use]
    pub const fn is_unlimited(self) -> bool {
        matches!(self, Self::Unlimited)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(limit) => write!(f, "{limit}"),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

impl Serialize for Limit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Finite(limit) => serializer.serialize_u32(*limit),
            Self::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(limit) => Ok(Self::Finite(limit)),
            Raw::Text(s) if s == "unlimited" => Ok(Self::Unlimited),
            Raw::Text(s) => Err(serde::de::Error::custom(format!(
                "invalid concurrency limit: {s}"
            ))),
        }
    }
}

//! Validated string types that enforce invariants at construction time

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation errors for configuration values
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("hostname cannot be empty or whitespace")]
    EmptyHostName,

    #[error("advertised name cannot be empty or whitespace")]
    EmptyDisplayName,

    #[error("invalid port number: {0}")]
    InvalidPortNumber(String),

    #[error("port cannot be 0")]
    InvalidPort,
}

/// Generates a validated string newtype.
///
/// Each type gets a validating `new()`, `as_str()`, `AsRef<str>`, `Deref`,
/// `Display`, `FromStr`, `TryFrom<String>` and serde support that re-runs
/// validation on deserialization.
macro_rules! validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident(String) {
            validation: |$s_param:ident| $validation:expr,
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            #[doc = concat!("Create a new ", stringify!($name), " after validation")]
            pub fn new($s_param: String) -> Result<Self, ValidationError> {
                let validate = || $validation;
                validate()?;
                Ok(Self($s_param))
            }

            #[doc = concat!("Get the ", stringify!($name), " as a string slice")]
            #[must_use]
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from($s_param: String) -> Result<Self, Self::Error> {
                Self::new($s_param)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

validated_string! {
    /// Upstream game server host: a DNS name or an IP literal
    ///
    /// Only non-emptiness is checked here. Resolution happens on every
    /// connect so DNS changes are picked up without a restart.
    ///
    /// # Examples
    /// ```
    /// use troxy::types::HostName;
    ///
    /// let host = HostName::new("t.dark-gaming.com".to_string()).unwrap();
    /// assert_eq!(host.as_str(), "t.dark-gaming.com");
    ///
    /// assert!(HostName::new("".to_string()).is_err());
    /// assert!(HostName::new("   ".to_string()).is_err());
    /// ```
    #[doc(alias = "host")]
    pub struct HostName(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyHostName)
            } else {
                Ok(())
            }
        },
    }
}

validated_string! {
    /// Name advertised to LAN clients in discovery replies
    ///
    /// Any length is accepted; the discovery packet encoder truncates it.
    pub struct DisplayName(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyDisplayName)
            } else {
                Ok(())
            }
        },
    }
}

impl DisplayName {
    /// Name advertised when none is configured
    pub const DEFAULT: &'static str = "TerrariaProxy";
}

impl Default for DisplayName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

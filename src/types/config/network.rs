//! Network-related configuration types

use std::num::NonZeroU16;
use std::str::FromStr;

use crate::types::ValidationError;

nonzero_newtype! {
    /// A validated network port number that cannot be zero
    ///
    /// # Examples
    /// ```
    /// use troxy::types::Port;
    ///
    /// let port = Port::new(7777).unwrap();
    /// assert_eq!(port.get(), 7777);
    ///
    /// assert!(Port::new(0).is_none());
    /// assert_eq!(Port::DISCOVERY.get(), 8888);
    /// ```
    #[doc(alias = "port_number")]
    pub struct Port(NonZeroU16: u16, serialize as serialize_u16);
}

impl Port {
    /// Gameplay port, shared by UDP and TCP (7777)
    pub const GAME: Self = Self(NonZeroU16::new(7777).unwrap());

    /// LAN discovery port (8888)
    pub const DISCOVERY: Self = Self(NonZeroU16::new(8888).unwrap());
}

impl Default for Port {
    fn default() -> Self {
        Self::GAME
    }
}

impl FromStr for Port {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let port = s
            .parse::<u16>()
            .map_err(|_| ValidationError::InvalidPortNumber(s.to_string()))?;
        Self::new(port).ok_or(ValidationError::InvalidPort)
    }
}

impl TryFrom<u16> for Port {
    type Error = ValidationError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ValidationError::InvalidPort)
    }
}

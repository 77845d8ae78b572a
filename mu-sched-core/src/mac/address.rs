//! Station addressing.

use std::fmt;
use std::str::FromStr;

use crate::errors::SchedError;

/// Association identifier assigned by the AP.
pub type Aid = u16;

/// 48-bit IEEE MAC address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Group address received by every station.
    pub const BROADCAST: MacAddress = MacAddress([0xff; 6]);

    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Locally administered unicast address derived from an AID.
    /// Convenient for tests and simulations that key stations by AID.
    pub const fn from_aid(aid: Aid) -> Self {
        let [hi, lo] = aid.to_be_bytes();
        Self([0x02, 0, 0, 0, hi, lo])
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for MacAddress {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in octets.iter_mut() {
            let part = parts
                .next()
                .filter(|p| p.len() == 2)
                .ok_or_else(|| SchedError::InvalidAddress(s.to_string()))?;
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| SchedError::InvalidAddress(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(SchedError::InvalidAddress(s.to_string()));
        }
        Ok(Self(octets))
    }
}

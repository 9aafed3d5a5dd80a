//! Field elements of the BN254 scalar field, as seen from outside the prover.
//!
//! The protocol never does field arithmetic itself; it only needs a canonical,
//! range-checked 32-byte representation that the proving engine can consume
//! and that survives JSON round trips unchanged.

use core::fmt;
use core::str::FromStr;

use crate::error::FieldError;

/// Number of bytes in a serialized field element.
pub const FIELD_BYTES: usize = 32;

/// BN254 scalar field modulus, big-endian.
///
/// `0x30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001`
pub const BN254_MODULUS: [u8; FIELD_BYTES] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91, 0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00, 0x00, 0x01,
];

/// A big-endian unsigned integer strictly below [`BN254_MODULUS`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldElement([u8; FIELD_BYTES]);

impl FieldElement {
    pub const ZERO: Self = Self([0u8; FIELD_BYTES]);

    /// Build from big-endian bytes, rejecting values outside the field.
    pub fn from_be_bytes(bytes: [u8; FIELD_BYTES]) -> Result<Self, FieldError> {
        // Lexicographic order on big-endian arrays is numeric order.
        if bytes >= BN254_MODULUS {
            return Err(FieldError::OutOfRange);
        }
        Ok(Self(bytes))
    }

    /// Build from a big-endian byte string of at most 32 bytes.
    ///
    /// Shorter inputs are left-padded with zeros.
    pub fn from_be_slice(bytes: &[u8]) -> Result<Self, FieldError> {
        if bytes.len() > FIELD_BYTES {
            return Err(FieldError::TooWide(bytes.len()));
        }
        let mut padded = [0u8; FIELD_BYTES];
        padded[FIELD_BYTES - bytes.len()..].copy_from_slice(bytes);
        Self::from_be_bytes(padded)
    }

    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; FIELD_BYTES];
        bytes[FIELD_BYTES - 8..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    pub const fn to_be_bytes(&self) -> [u8; FIELD_BYTES] {
        self.0
    }

    pub const fn as_bytes(&self) -> &[u8; FIELD_BYTES] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; FIELD_BYTES]
    }

    /// `0x`-prefixed, zero-padded lower-case hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse hex with or without `0x`, accepting fewer than 64 digits.
    pub fn from_hex(input: &str) -> Result<Self, FieldError> {
        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);
        if digits.is_empty() {
            return Err(FieldError::InvalidHex(input.to_string()));
        }
        let digits = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(&digits).map_err(|_| FieldError::InvalidHex(input.to_string()))?;
        // Leading zero bytes beyond 32 are harmless.
        let significant = match bytes.iter().position(|b| *b != 0) {
            Some(first) => &bytes[first..],
            None => &[][..],
        };
        Self::from_be_slice(significant)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_hex())
    }
}

impl FromStr for FieldElement {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for FieldElement {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for FieldElement {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Public hash of a phrase (and optionally a username). Fixed at round creation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Commitment(pub FieldElement);

impl Commitment {
    pub const fn element(&self) -> FieldElement {
        self.0
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Commitment {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldElement::from_hex(s).map(Self)
    }
}

impl From<FieldElement> for Commitment {
    fn from(element: FieldElement) -> Self {
        Self(element)
    }
}

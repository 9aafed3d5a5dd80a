//! Protocol model for The Word.
//!
//! `word-core` defines the canonical phrase encoding, the field element and
//! commitment types, round records and the protocol configuration. It has no
//! I/O and no cryptographic engine; the `zk` crate consumes the encoded
//! vectors and the `runtime` crate drives the round lifecycle.
pub mod config;
pub mod encoding;
pub mod error;
pub mod field;
pub mod round;

pub use config::{IdentityScheme, ProtocolConfig};
pub use encoding::{
    CHUNK_BYTES, MAX_PHRASE_LEN, MAX_USERNAME_LEN, PHRASE_ELEMENTS, PhraseElements,
    decode_phrase, encode_phrase, encode_username,
};
pub use error::{EncodingError, FieldError, ValidationError};
pub use field::{BN254_MODULUS, Commitment, FIELD_BYTES, FieldElement};
pub use round::{Identity, Prize, Round, RoundNumber, RoundStatus, UserActivity};

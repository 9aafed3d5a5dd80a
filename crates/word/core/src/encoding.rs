//! Canonical encoding of phrases and usernames into circuit inputs.
//!
//! A phrase is laid out as `PHRASE_ELEMENTS` chunks of `CHUNK_BYTES` bytes.
//! Each chunk is right-padded with zeros and prefixed with a single zero byte,
//! so the resulting 32-byte big-endian integer is always below the BN254
//! modulus:
//!
//! ```text
//! "hunter2"  →  [ 00 | 68 75 6e 74 65 72 32 00 .. 00 ]   element 0
//!               [ 00 | 00 .. 00 ]                         elements 1..5
//! ```
//!
//! Every string within the length limit encodes. NUL is also the padding
//! byte, so trailing NULs are indistinguishable from padding: `"abc\0"` and
//! `"abc"` share an encoding. Usernames are single big-endian integers, where
//! a NUL would alias a shorter name, so they still reject it.

use crate::error::EncodingError;
use crate::field::{FIELD_BYTES, FieldElement};

/// Bytes of phrase data carried by one field element.
pub const CHUNK_BYTES: usize = 31;

/// Width of the phrase vector fed to the circuit.
pub const PHRASE_ELEMENTS: usize = 6;

/// Longest accepted phrase, in UTF-8 bytes.
pub const MAX_PHRASE_LEN: usize = 180;

/// Longest accepted username, in UTF-8 bytes.
pub const MAX_USERNAME_LEN: usize = CHUNK_BYTES;

const _: () = assert!(MAX_PHRASE_LEN <= CHUNK_BYTES * PHRASE_ELEMENTS);

/// Fixed-width field vector for one phrase.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhraseElements([FieldElement; PHRASE_ELEMENTS]);

impl PhraseElements {
    pub const fn new(elements: [FieldElement; PHRASE_ELEMENTS]) -> Self {
        Self(elements)
    }

    pub const fn elements(&self) -> &[FieldElement; PHRASE_ELEMENTS] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldElement> {
        self.0.iter()
    }
}

impl AsRef<[FieldElement]> for PhraseElements {
    fn as_ref(&self) -> &[FieldElement] {
        &self.0
    }
}

/// Encode a phrase into its canonical field vector.
pub fn encode_phrase(phrase: &str) -> Result<PhraseElements, EncodingError> {
    let bytes = phrase.as_bytes();
    if bytes.len() > MAX_PHRASE_LEN {
        return Err(EncodingError::PhraseTooLong {
            len: bytes.len(),
            max: MAX_PHRASE_LEN,
        });
    }

    let mut elements = [FieldElement::ZERO; PHRASE_ELEMENTS];
    for (element, chunk) in elements.iter_mut().zip(bytes.chunks(CHUNK_BYTES)) {
        let mut word = [0u8; FIELD_BYTES];
        // word[0] stays zero, keeping the value below the modulus.
        word[1..1 + chunk.len()].copy_from_slice(chunk);
        *element = FieldElement::from_be_bytes(word)
            .expect("a zero leading byte keeps the chunk below the modulus");
    }

    Ok(PhraseElements(elements))
}

/// Recover the phrase from its field vector.
///
/// Trailing NULs are read as padding and dropped. Returns `None` for vectors
/// that [`encode_phrase`] cannot produce.
pub fn decode_phrase(elements: &PhraseElements) -> Option<String> {
    let mut bytes = Vec::with_capacity(CHUNK_BYTES * PHRASE_ELEMENTS);
    for element in elements.iter() {
        let word = element.as_bytes();
        if word[0] != 0 {
            return None;
        }
        bytes.extend_from_slice(&word[1..]);
    }
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |last| last + 1);
    if end > MAX_PHRASE_LEN {
        return None;
    }
    bytes.truncate(end);
    String::from_utf8(bytes).ok()
}

/// Encode a username into a single field element.
pub fn encode_username(username: &str) -> Result<FieldElement, EncodingError> {
    let bytes = username.as_bytes();
    if bytes.is_empty() {
        return Err(EncodingError::EmptyUsername);
    }
    if bytes.len() > MAX_USERNAME_LEN {
        return Err(EncodingError::UsernameTooLong {
            len: bytes.len(),
            max: MAX_USERNAME_LEN,
        });
    }
    if bytes.contains(&0) {
        return Err(EncodingError::InvalidCharacter { field: "username" });
    }
    Ok(FieldElement::from_be_slice(bytes)
        .expect("31 bytes always fit below the modulus"))
}

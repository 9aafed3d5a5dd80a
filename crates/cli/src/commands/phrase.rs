//! Local phrase encoding and commitments. No keys or server needed.

use anyhow::Result;
use clap::Parser;
use console::style;
use word_core::{Commitment, FieldElement, encode_phrase, encode_username};

/// Print the six field elements a phrase encodes to
#[derive(Debug, Parser)]
pub struct Encode {
    /// The phrase
    phrase: String,
}

impl Encode {
    pub fn execute(&self) -> Result<()> {
        let elements = encode_phrase(&self.phrase)?;
        for (index, element) in elements.iter().enumerate() {
            println!("{} {}", style(format!("[{index}]")).dim(), element);
        }
        Ok(())
    }
}

/// Print the commitment of a phrase
#[derive(Debug, Parser)]
pub struct Hash {
    /// The phrase
    phrase: String,
}

impl Hash {
    pub fn execute(&self) -> Result<()> {
        println!("{}", commitment(&self.phrase)?);
        Ok(())
    }
}

pub(crate) fn username_element(username: Option<&str>) -> Result<Option<FieldElement>> {
    Ok(username.map(encode_username).transpose()?)
}

pub(crate) fn commitment(phrase: &str) -> Result<Commitment> {
    let elements = encode_phrase(phrase)?;
    Ok(zk::commit_phrase(&elements)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_depends_on_the_phrase_only() {
        let plain = commitment("hunter2").unwrap();
        assert_eq!(plain, commitment("hunter2").unwrap());
        assert_ne!(plain, commitment("hunter3").unwrap());
    }

    #[test]
    fn oversized_phrase_is_rejected() {
        assert!(commitment(&"x".repeat(181)).is_err());
        assert!(commitment(&"x".repeat(180)).is_ok());
    }

    #[test]
    fn username_element_is_optional() {
        assert_eq!(username_element(None).unwrap(), None);
        assert!(username_element(Some("alice")).unwrap().is_some());
    }
}

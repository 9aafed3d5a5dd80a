//! Round records and the identities that act on them.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::field::Commitment;

/// Unique, monotonically allocated round number. The first round is `1`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RoundNumber(pub u64);

impl RoundNumber {
    pub const FIRST: Self = Self(1);

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RoundNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoundNumber {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Prize amount in the ledger's smallest currency unit.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Prize(pub u128);

impl Prize {
    pub const ZERO: Self = Self(0);

    pub const fn amount(self) -> u128 {
        self.0
    }

    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Prize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A principal acting on rounds: wallet address, public key or username.
///
/// Hex wallet addresses are normalised to lower case so that signature
/// recovery and whisperer deduplication agree on one spelling.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Identity(String);

impl Identity {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        if is_hex_address(trimmed) {
            Self(trimmed.to_ascii_lowercase())
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

fn is_hex_address(value: &str) -> bool {
    value.len() == 42
        && (value.starts_with("0x") || value.starts_with("0X"))
        && value[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// Lifecycle state derived from a round record.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RoundStatus {
    Active,
    Shouted,
}

/// The central record. Created once, whispered to many times, shouted once.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Round {
    pub round: RoundNumber,
    pub commitment: Commitment,
    pub hint: String,
    pub prize: Prize,
    pub active: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub created_by: Option<Identity>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub whisperers: Vec<Identity>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub shouter: Option<Identity>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub phrase: Option<String>,
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ended_at: Option<DateTime<Utc>>,
    /// Ledger transaction that created this round, when mirrored on-chain.
    #[cfg_attr(feature = "serde", serde(default))]
    pub creation_tx: Option<String>,
}

impl Round {
    /// A freshly created, active round with no whisperers.
    pub fn open(
        round: RoundNumber,
        commitment: Commitment,
        hint: impl Into<String>,
        prize: Prize,
        created_by: Option<Identity>,
    ) -> Self {
        Self {
            round,
            commitment,
            hint: hint.into(),
            prize,
            active: true,
            created_by,
            whisperers: Vec::new(),
            shouter: None,
            phrase: None,
            created_at: Utc::now(),
            ended_at: None,
            creation_tx: None,
        }
    }

    pub fn with_creation_tx(mut self, tx: impl Into<String>) -> Self {
        self.creation_tx = Some(tx.into());
        self
    }

    pub fn status(&self) -> RoundStatus {
        if self.active {
            RoundStatus::Active
        } else {
            RoundStatus::Shouted
        }
    }

    pub fn has_whispered(&self, identity: &Identity) -> bool {
        self.whisperers.contains(identity)
    }

    pub fn has_shouted(&self, identity: &Identity) -> bool {
        self.shouter.as_ref() == Some(identity)
    }

    /// Append a whisperer, ignoring duplicates. Returns whether it was added.
    pub fn add_whisperer(&mut self, identity: Identity) -> bool {
        if self.has_whispered(&identity) {
            return false;
        }
        self.whisperers.push(identity);
        true
    }

    /// Apply the terminal shout transition.
    pub fn close(&mut self, shouter: Identity, phrase: impl Into<String>) {
        self.active = false;
        self.shouter = Some(shouter);
        self.phrase = Some(phrase.into());
        self.ended_at = Some(Utc::now());
    }

    /// Check the record invariants. Used when loading persisted rounds.
    pub fn check_invariants(&self) -> Result<(), ValidationError> {
        let inconsistent = |reason: String| ValidationError::InconsistentRound {
            round: self.round,
            reason,
        };
        let closed = self.shouter.is_some() && self.phrase.is_some();
        if self.active == closed {
            return Err(inconsistent(format!(
                "active={} but shouter/phrase presence is {}",
                self.active, closed
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for whisperer in &self.whisperers {
            if !seen.insert(whisperer) {
                return Err(inconsistent(format!("whisperer {whisperer} listed twice")));
            }
        }
        Ok(())
    }
}

/// Derived back-references from an identity to the rounds it acted on.
///
/// Computed from round records on demand; never stored.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UserActivity {
    pub identity: Option<Identity>,
    pub whispered: Vec<RoundNumber>,
    pub shouted: Vec<RoundNumber>,
}

impl UserActivity {
    pub fn collect<'a>(identity: &Identity, rounds: impl IntoIterator<Item = &'a Round>) -> Self {
        let mut activity = Self {
            identity: Some(identity.clone()),
            ..Self::default()
        };
        for round in rounds {
            if round.has_whispered(identity) {
                activity.whispered.push(round.round);
            }
            if round.has_shouted(identity) {
                activity.shouted.push(round.round);
            }
        }
        activity
    }
}

//! JSON bodies of the HTTP API.
//!
//! Shared with the CLI so both ends agree on field names. Every body uses
//! camelCase on the wire.

use serde::{Deserialize, Serialize};
use word_core::{Commitment, Identity, Prize, Round, RoundNumber};
use zk::ProofData;

use crate::auth::IdentityClaim;

/// Requests that may carry wallet credentials (`address`, `signature`,
/// `message`) next to their own fields.
pub trait Authenticated {
    fn claim(&self) -> IdentityClaim<'_>;
}

macro_rules! impl_authenticated {
    ($($request:ty),+) => {
        $(impl Authenticated for $request {
            fn claim(&self) -> IdentityClaim<'_> {
                IdentityClaim {
                    address: self.address.as_deref(),
                    signature: self.signature.as_deref(),
                    message: self.message.as_deref(),
                }
            }
        })+
    };
}

impl_authenticated!(CreateRequest, WhisperRequest, ShoutRequest, CallerQuery);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub commitment: Commitment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub proof: ProofData,
    pub hint: String,
    #[serde(default)]
    pub prize: Prize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhisperRequest {
    pub round: RoundNumber,
    pub proof: ProofData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoutRequest {
    pub round: RoundNumber,
    pub secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub proof: ProofData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<Commitment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Optional wallet credentials on `GET` requests, passed as query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallerQuery {
    pub address: Option<String>,
    pub signature: Option<String>,
    pub message: Option<String>,
}

/// Response to `GET /auth/nonce`. Signed messages end with `:<nonce>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonceResponse {
    pub nonce: String,
}

/// Response to `/create` and `/shout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundReceipt {
    pub round: RoundNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    pub round: RoundNumber,
    pub active: bool,
    pub commitment: Commitment,
    pub hint: String,
    pub prize: Prize,
    pub num_whispers: usize,
    pub whisperers: Vec<Identity>,
    /// The revealed phrase, present once the round is shouted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shouter: Option<Identity>,
}

impl From<Round> for RoundView {
    fn from(round: Round) -> Self {
        Self {
            round: round.round,
            active: round.active,
            commitment: round.commitment,
            hint: round.hint,
            prize: round.prize,
            num_whispers: round.whisperers.len(),
            whisperers: round.whisperers,
            secret: round.phrase,
            shouter: round.shouter,
        }
    }
}

/// Entry of `/rounds`. The per-caller flags are set only when the caller's
/// identity resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub round: RoundNumber,
    pub active: bool,
    pub hint: String,
    pub prize: Prize,
    pub num_whispers: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whispered: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shouted: Option<bool>,
}

impl RoundSummary {
    pub fn new(round: &Round, caller: Option<&Identity>) -> Self {
        Self {
            round: round.round,
            active: round.active,
            hint: round.hint.clone(),
            prize: round.prize,
            num_whispers: round.whisperers.len(),
            whispered: caller.map(|identity| round.has_whispered(identity)),
            shouted: caller.map(|identity| round.has_shouted(identity)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortedRoundsView {
    pub whispered: Vec<RoundSummary>,
    pub not_whispered: Vec<RoundSummary>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub ok: bool,
    pub shouted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

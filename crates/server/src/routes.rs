//! Route table and handlers.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use runtime::{CreateRound, ProofTarget, RoundService, Shout, Whisper};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::debug;
use word_core::{Identity, Round, RoundNumber};

use crate::api::{
    Authenticated, CallerQuery, CreateRequest, NonceResponse, RoundReceipt, RoundSummary,
    RoundView, ShoutRequest, SortedRoundsView, VerifyRequest, VerifyResponse, WhisperRequest,
};
use crate::auth::{IdentityClaim, IdentityResolver, NonceRegistry};
use crate::error::ApiError;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Clone)]
pub struct AppState {
    pub service: RoundService,
    pub identity: Arc<dyn IdentityResolver>,
    /// Must be the registry the wallet resolver redeems against.
    pub nonces: Arc<NonceRegistry>,
}

impl AppState {
    pub fn new(
        service: RoundService,
        identity: Arc<dyn IdentityResolver>,
        nonces: Arc<NonceRegistry>,
    ) -> Self {
        Self {
            service,
            identity,
            nonces,
        }
    }

    fn caller(&self, headers: &HeaderMap, claim: IdentityClaim<'_>) -> ApiResult<Identity> {
        Ok(self.identity.resolve(headers, claim)?)
    }

    /// Resolve the caller only if credentials were supplied; bad credentials
    /// are still rejected.
    fn optional_caller(
        &self,
        headers: &HeaderMap,
        claim: IdentityClaim<'_>,
    ) -> ApiResult<Option<Identity>> {
        if !self.identity.has_credentials(headers, claim) {
            return Ok(None);
        }
        self.caller(headers, claim).map(Some)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/nonce", get(nonce))
        .route("/create", post(create))
        .route("/round/:round", get(get_round))
        .route("/rounds", get(list_rounds))
        .route("/rounds/sorted/:user", get(sorted_rounds))
        .route("/whisper", post(whisper))
        .route("/shout", post(shout))
        .route("/verify", post(verify))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

async fn health() -> &'static str {
    "ok"
}

async fn nonce(State(state): State<AppState>) -> Json<NonceResponse> {
    Json(NonceResponse {
        nonce: state.nonces.issue(),
    })
}

async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RoundReceipt>)> {
    let Json(request) = payload?;
    let creator = state.optional_caller(&headers, request.claim())?;

    let created = state
        .service
        .create_round(CreateRound {
            commitment: request.commitment,
            hint: request.hint,
            username: request.username,
            proof: request.proof,
            prize: request.prize,
            creator,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RoundReceipt {
            round: created.round,
            tx_hash: created.tx.map(|tx| tx.to_hex()),
        }),
    ))
}

async fn get_round(
    State(state): State<AppState>,
    Path(round): Path<String>,
) -> ApiResult<Json<RoundView>> {
    let round = parse_round(&round)?;
    Ok(Json(state.service.get_round(round).await?.into()))
}

async fn list_rounds(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<CallerQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<RoundSummary>>> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    // Listing never fails on bad credentials; the caller just gets no flags.
    let caller = match state.identity.resolve(&headers, query.claim()) {
        Ok(identity) => Some(identity),
        Err(err) => {
            debug!(error = %err, "Listing rounds for an anonymous caller");
            None
        }
    };

    let rounds = state.service.list_rounds().await?;
    Ok(Json(
        rounds
            .iter()
            .map(|round| RoundSummary::new(round, caller.as_ref()))
            .collect(),
    ))
}

async fn sorted_rounds(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> ApiResult<Json<SortedRoundsView>> {
    let identity = Identity::new(user);
    let sorted = state.service.sorted_rounds(&identity).await?;
    let summarise = |rounds: Vec<Round>| -> Vec<RoundSummary> {
        rounds
            .iter()
            .map(|round| RoundSummary::new(round, Some(&identity)))
            .collect()
    };

    Ok(Json(SortedRoundsView {
        whispered: summarise(sorted.whispered),
        not_whispered: summarise(sorted.not_whispered),
    }))
}

async fn whisper(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<WhisperRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(request) = payload?;
    let identity = state.caller(&headers, request.claim())?;

    state
        .service
        .whisper(Whisper {
            round: request.round,
            proof: request.proof,
            identity,
            username: request.username,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(json!({}))))
}

async fn shout(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ShoutRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RoundReceipt>)> {
    let Json(request) = payload?;
    let identity = state.caller(&headers, request.claim())?;

    let shouted = state
        .service
        .shout(Shout {
            round: request.round,
            phrase: request.secret,
            identity,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RoundReceipt {
            round: shouted.round,
            tx_hash: shouted.tx.map(|tx| tx.to_hex()),
        }),
    ))
}

async fn verify(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> ApiResult<Json<VerifyResponse>> {
    let Json(request) = payload?;
    let target = match (request.round, request.commitment) {
        (Some(round), _) => ProofTarget::Round(round),
        (None, Some(commitment)) => ProofTarget::Commitment(commitment),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "either round or commitment is required".to_string(),
            ));
        }
    };

    let check = state
        .service
        .check_proof(target, request.proof, request.username.as_deref())
        .await?;
    Ok(Json(VerifyResponse {
        ok: check.ok,
        shouted: check.shouted,
    }))
}

fn parse_round(raw: &str) -> ApiResult<RoundNumber> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid round number: {raw}")))
}

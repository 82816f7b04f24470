use actix_web::rt::System;
use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, error, info, warn};
use std::time::Instant;
use uuid::Uuid;

use super::models::{
    AppState, ChainResponse, DifficultyResponse, ErrorResponse, ProposeRequest, ReplaceResponse,
    ValidateResponse,
};
use crate::blockchain::{Block, LedgerError, RejectionReason};

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    match state.ledger.chain() {
        Ok(chain) => HttpResponse::Ok().json(ChainResponse {
            length: chain.len(),
            difficulty: chain.last().map_or(0, |b| b.difficulty),
            chain,
        }),
        Err(e) => ledger_error(e),
    }
}

/// Mine a block carrying the given payload on the current tip.
#[post("/blocks/")]
pub async fn propose_block(
    state: web::Data<AppState>,
    req: web::Json<ProposeRequest>,
) -> impl Responder {
    match propose(&state, req.payload).await {
        Ok(block) => HttpResponse::Created().json(block),
        Err(resp) => resp,
    }
}

/// Offer a full candidate chain; it is adopted only if valid and strictly longer.
#[post("/chain/replace/")]
pub async fn replace_chain(
    state: web::Data<AppState>,
    body: web::Json<Vec<Block>>,
) -> impl Responder {
    let candidate = body.into_inner();
    debug!("POST /chain/replace/ - candidate length {}", candidate.len());

    let replaced = match state.ledger.replace_chain(candidate) {
        Ok(replaced) => replaced,
        Err(e) => return ledger_error(e),
    };
    match state.ledger.len() {
        Ok(length) => HttpResponse::Ok().json(ReplaceResponse { replaced, length }),
        Err(e) => ledger_error(e),
    }
}

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    match state.ledger.validate() {
        Ok(check) => HttpResponse::Ok().json(ValidateResponse {
            valid: check.valid,
            length: check.length,
            difficulty: check.difficulty,
        }),
        Err(e) => ledger_error(e),
    }
}

/// Current tip difficulty and the one the next block will be mined at.
#[get("/difficulty/")]
pub async fn get_difficulty(state: web::Data<AppState>) -> impl Responder {
    match state.ledger.stats() {
        Ok(stats) => HttpResponse::Ok().json(DifficultyResponse {
            difficulty: stats.difficulty,
            next_difficulty: stats.next_difficulty,
        }),
        Err(e) => ledger_error(e),
    }
}

/* -------------------- Legacy routes -------------------- */

/// The bare chain as a pretty-printed JSON array.
#[get("/")]
pub async fn legacy_get_chain(state: web::Data<AppState>) -> impl Responder {
    let chain = match state.ledger.chain() {
        Ok(chain) => chain,
        Err(e) => return ledger_error(e),
    };
    match serde_json::to_string_pretty(&chain) {
        Ok(body) => HttpResponse::Ok()
            .content_type("application/json")
            .body(body),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

#[post("/")]
pub async fn legacy_propose_block(
    state: web::Data<AppState>,
    req: web::Json<ProposeRequest>,
) -> impl Responder {
    match propose(&state, req.payload).await {
        Ok(block) => HttpResponse::Created().json(block),
        Err(resp) => resp,
    }
}

/* -------------------- Helpers -------------------- */

/// Run a proposal on the blocking pool so mining never stalls the workers.
async fn propose(state: &web::Data<AppState>, payload: i64) -> Result<Block, HttpResponse> {
    let request_id = Uuid::new_v4();
    let t0 = Instant::now();
    debug!("proposal {} - payload={}", request_id, payload);

    let ledger = state.ledger.clone();
    let outcome = web::block(move || ledger.propose_block(payload)).await;

    match outcome {
        Ok(Ok(block)) => {
            info!(
                "proposal {} - sealed block #{} (hash={}, nonce={}) in {} ms",
                request_id,
                block.index,
                block.hash,
                block.nonce,
                t0.elapsed().as_millis()
            );
            Ok(block)
        }
        Ok(Err(e)) => {
            warn!("proposal {} - {}", request_id, e);
            Err(ledger_error(e))
        }
        Err(e) => {
            error!("proposal {} - mining task failed: {}", request_id, e);
            Err(HttpResponse::InternalServerError().json(ErrorResponse {
                error: "MiningTaskFailed",
                message: e.to_string(),
            }))
        }
    }
}

/// Map a ledger failure onto a status code; a poisoned chain stops the server.
pub(super) fn ledger_error(e: LedgerError) -> HttpResponse {
    let body = ErrorResponse {
        error: e.code(),
        message: e.to_string(),
    };
    if e.is_fatal() {
        error!("fatal ledger error, stopping server: {}", e);
        System::current().stop();
        return HttpResponse::InternalServerError().json(body);
    }
    match e {
        LedgerError::Rejected(RejectionReason::StaleTip) => HttpResponse::Conflict().json(body),
        LedgerError::Rejected(_) => HttpResponse::UnprocessableEntity().json(body),
        LedgerError::MiningCancelled => HttpResponse::ServiceUnavailable().json(body),
        LedgerError::LockPoisoned => HttpResponse::InternalServerError().json(body),
    }
}

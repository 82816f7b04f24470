use actix_web::{HttpResponse, Responder, get, web};

use super::chain::ledger_error;
use super::models::{AppState, StatsResponse};

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let stats = match state.ledger.stats() {
        Ok(stats) => stats,
        Err(e) => return ledger_error(e),
    };
    let params = state.ledger.params();

    HttpResponse::Ok().json(StatsResponse {
        height: stats.height,
        difficulty: stats.difficulty,
        next_difficulty: stats.next_difficulty,
        min_difficulty: params.min_difficulty,
        target_block_time_secs: params.block_generation_interval_secs,
        adjust_interval: params.difficulty_adjustment_interval,
        last_interval_secs: stats.last_interval_secs,
        avg_interval_secs: stats.avg_interval_secs,
    })
}

mod chain;
mod health;
pub mod models;
mod stats;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::propose_block)
            .service(chain::replace_chain)
            .service(chain::validate_chain)
            .service(chain::get_difficulty)
            .service(stats::get_stats),
    )
    // unversioned routes kept for older clients: GET / reads, POST / proposes
    .service(chain::legacy_get_chain)
    .service(chain::legacy_propose_block);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Ledger;
    use crate::blockchain::test_support::mined_chain;
    use crate::config::ConsensusParams;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn state(min_difficulty: u32) -> web::Data<AppState> {
        let params = ConsensusParams {
            min_difficulty,
            ..ConsensusParams::default()
        };
        web::Data::new(AppState::new(Arc::new(Ledger::new(params))))
    }

    #[actix_web::test]
    async fn chain_starts_with_genesis() {
        let app = test::init_service(App::new().app_data(state(1)).configure(init_routes)).await;
        let req = test::TestRequest::get().uri("/api/v1/chain/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["length"], 1);
        assert_eq!(body["chain"][0]["index"], 0);
        assert_eq!(body["chain"][0]["previous_hash"], "");
        assert_eq!(body["chain"][0]["difficulty"], 0);
    }

    #[actix_web::test]
    async fn proposing_mines_and_appends() {
        let app = test::init_service(App::new().app_data(state(1)).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/blocks/")
            .set_json(json!({ "payload": 42 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let block: Value = test::read_body_json(resp).await;
        assert_eq!(block["index"], 1);
        assert_eq!(block["payload"], 42);
        assert!(block["hash"].as_str().unwrap().starts_with('0'));
        assert_eq!(block["transactions"][0]["amount"], 10);

        let req = test::TestRequest::get().uri("/api/v1/validate/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["valid"], true);
        assert_eq!(body["length"], 2);
    }

    #[actix_web::test]
    async fn legacy_routes_accept_bpm() {
        let app = test::init_service(App::new().app_data(state(1)).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/")
            .set_json(json!({ "BPM": 7 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let chain = body.as_array().unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1]["payload"], 7);
    }

    #[actix_web::test]
    async fn malformed_proposal_is_bad_request() {
        let app = test::init_service(App::new().app_data(state(1)).configure(init_routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/blocks/")
            .set_json(json!({ "payload": "high" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn replacement_reports_outcome() {
        let app = test::init_service(App::new().app_data(state(0)).configure(init_routes)).await;
        let mut candidate = mined_chain(3, 0);

        // not longer: kept
        let req = test::TestRequest::post()
            .uri("/api/v1/chain/replace/")
            .set_json(&candidate[..1])
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["replaced"], false);
        assert_eq!(body["length"], 1);

        // longer but tampered: refused with a reason
        candidate[2].payload += 1;
        let req = test::TestRequest::post()
            .uri("/api/v1/chain/replace/")
            .set_json(&candidate)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "HashMismatch");

        // longer and valid: adopted
        candidate[2].payload -= 1;
        let req = test::TestRequest::post()
            .uri("/api/v1/chain/replace/")
            .set_json(&candidate)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["replaced"], true);
        assert_eq!(body["length"], 3);
    }

    #[actix_web::test]
    async fn stats_and_difficulty_reflect_config() {
        let app = test::init_service(App::new().app_data(state(3)).configure(init_routes)).await;

        let req = test::TestRequest::get().uri("/api/v1/stats/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["height"], 1);
        assert_eq!(body["min_difficulty"], 3);
        assert_eq!(body["adjust_interval"], 10);
        assert!(body["last_interval_secs"].is_null());

        let req = test::TestRequest::get().uri("/api/v1/difficulty/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["difficulty"], 0);
        assert_eq!(body["next_difficulty"], 3);
    }
}

//! Single binary web server exposing the bracket engine over REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST (e.g. 0.0.0.0), PORT (e.g. 8080).

use actix_web::{
    get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use pickleball_bracket_web::{
    build_bracket, check_stop, match_state, on_game_score_changed, record_game_scores,
    set_forfeit, with_stop, BracketConfig, EngineError, GameScoreUpdate, GameSlot, InMemoryStore,
    Side, Store, TeamId,
};
use serde::Deserialize;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory state: all stops behind one lock. Writers serialize here; the
/// store's version check guards any embedding without this lock.
type AppState = Data<RwLock<InMemoryStore>>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateStopBody {
    #[serde(default = "default_stop_name")]
    name: String,
    /// Teams in seeding order.
    team_ids: Vec<TeamId>,
    /// Standard game slots; defaults to the full doubles lineup.
    #[serde(default)]
    game_slots: Option<Vec<GameSlot>>,
}

fn default_stop_name() -> String {
    "Main Bracket".to_string()
}

#[derive(Deserialize)]
struct RecordScoresBody {
    games: Vec<GameScoreUpdate>,
}

#[derive(Deserialize)]
struct ForfeitBody {
    /// Side that forfeits, or null to clear a recorded forfeit.
    team: Option<Side>,
}

/// Path segment: stop id (e.g. /api/stops/{id})
#[derive(Deserialize)]
struct StopPath {
    id: Uuid,
}

/// Path segment: match id (e.g. /api/matches/{id})
#[derive(Deserialize)]
struct MatchPath {
    id: Uuid,
}

fn error_response(e: &EngineError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        EngineError::StopNotFound(_) | EngineError::MatchNotFound(_) => {
            HttpResponse::NotFound().json(body)
        }
        EngineError::ConcurrentWriteConflict => HttpResponse::Conflict().json(body),
        EngineError::DataInconsistency(_) => HttpResponse::UnprocessableEntity().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "pickleball-bracket-web",
    })
}

/// Generate a double-elimination bracket for a stop (admin action).
#[post("/api/stops")]
async fn api_create_stop(state: AppState, body: Json<CreateStopBody>) -> HttpResponse {
    let config = match &body.game_slots {
        Some(slots) => BracketConfig {
            game_slots: slots.clone(),
        },
        None => BracketConfig::default(),
    };
    let stop = match build_bracket(body.name.clone(), &body.team_ids, &config) {
        Ok(stop) => stop,
        Err(e) => return error_response(&e),
    };
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let id = stop.id;
    match g.insert_stop(stop) {
        Ok(()) => match g.get_stop(id) {
            Ok(stop) => HttpResponse::Ok().json(stop),
            Err(e) => error_response(&e),
        },
        Err(e) => error_response(&e),
    }
}

/// Full bracket graph for a stop (404 if not found).
#[get("/api/stops/{id}")]
async fn api_get_stop(state: AppState, path: Path<StopPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_stop(path.id) {
        Ok(stop) => HttpResponse::Ok().json(stop),
        Err(e) => error_response(&e),
    }
}

/// Invariant walk over a stop's bracket graph (operational tooling).
#[get("/api/stops/{id}/diagnostics")]
async fn api_stop_diagnostics(state: AppState, path: Path<StopPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let stop = match g.get_stop(path.id) {
        Ok(stop) => stop,
        Err(e) => return error_response(&e),
    };
    let findings = check_stop(&stop);
    HttpResponse::Ok().json(serde_json::json!({
        "ok": findings.is_empty(),
        "findings": findings,
    }))
}

/// Schedule/scoreboard view of one match: state, winner, assigned teams.
#[get("/api/matches/{id}")]
async fn api_get_match(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let stop_id = match g.locate_match(path.id) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };
    let stop = match g.get_stop(stop_id) {
        Ok(stop) => stop,
        Err(e) => return error_response(&e),
    };
    match match_state(&stop, path.id) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&e),
    }
}

/// Record per-slot scores for a match and run evaluation + advancement in
/// the same transaction. Called for corrections too.
#[put("/api/matches/{id}/games")]
async fn api_record_scores(
    state: AppState,
    path: Path<MatchPath>,
    body: Json<RecordScoresBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let stop_id = match g.locate_match(path.id) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };
    let result = with_stop(&mut *g, stop_id, |stop| {
        record_game_scores(stop, path.id, &body.games)?;
        on_game_score_changed(stop, path.id)
    });
    let touched = match result {
        Ok(touched) => touched,
        Err(e) => return error_response(&e),
    };
    match g.get_stop(stop_id) {
        Ok(stop) => HttpResponse::Ok().json(serde_json::json!({
            "touched": touched,
            "stop": stop,
        })),
        Err(e) => error_response(&e),
    }
}

/// Set or clear a forfeit on a match, then re-run the pipeline.
#[post("/api/matches/{id}/forfeit")]
async fn api_set_forfeit(
    state: AppState,
    path: Path<MatchPath>,
    body: Json<ForfeitBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let stop_id = match g.locate_match(path.id) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };
    let result = with_stop(&mut *g, stop_id, |stop| {
        set_forfeit(stop, path.id, body.team)?;
        on_game_score_changed(stop, path.id)
    });
    let touched = match result {
        Ok(touched) => touched,
        Err(e) => return error_response(&e),
    };
    match g.get_stop(stop_id) {
        Ok(stop) => HttpResponse::Ok().json(serde_json::json!({
            "touched": touched,
            "stop": stop,
        })),
        Err(e) => error_response(&e),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(InMemoryStore::new()));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_stop)
            .service(api_get_stop)
            .service(api_stop_diagnostics)
            .service(api_get_match)
            .service(api_record_scores)
            .service(api_set_forfeit)
    })
    .bind(bind)?
    .run()
    .await
}

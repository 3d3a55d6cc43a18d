//! Web API over the map pool checker and match scheduler.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Env: HOST, PORT, POOLS_CONFIG (division rules JSON), OSU_API_KEY, OSU_API_BASE,
//! TIME_RECORDS_FILE (optional JSON snapshot of match time history).

use actix_web::{
    get, post,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::Utc;
use osu_map_pools::{
    refresh_checkers, verify_offsets, week_number, Beatmap, Checker, LeaderboardSource,
    LookupError, MemoryTimeStore, NoLeaderboard, OffsetKey, OsuApiClient, Scheduler,
    SchedulerError, TimeRecord, TournamentConfig,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Checkers for one week of the tournament.
struct CheckerSet {
    week: i64,
    checkers: HashMap<String, Arc<Checker>>,
}

struct AppState {
    config_path: String,
    records_path: Option<String>,
    source: Arc<dyn LeaderboardSource>,
    config: RwLock<TournamentConfig>,
    checkers: RwLock<CheckerSet>,
    scheduler: Scheduler<MemoryTimeStore>,
}

type State = Data<AppState>;

/// How often the current week is re-derived.
const WEEK_CHECK_INTERVAL: Duration = Duration::from_secs(3600);

impl AppState {
    fn checker(&self, division: &str) -> Option<Arc<Checker>> {
        self.checkers.read().ok()?.checkers.get(division).cloned()
    }

    /// Rebuild every division's checker from `config` for the current week.
    fn rebuild(&self, config: &TournamentConfig) -> Result<usize, String> {
        let now = Utc::now();
        let built = refresh_checkers(config, now, Arc::clone(&self.source)).map_err(|e| e.to_string())?;
        let count = built.len();
        let mut g = self.checkers.write().map_err(|_| "lock error".to_string())?;
        *g = CheckerSet {
            week: week_number(now, config.first_due_date),
            checkers: built.into_iter().map(|(k, v)| (k, Arc::new(v))).collect(),
        };
        Ok(count)
    }

    fn save_records(&self) {
        let Some(path) = &self.records_path else {
            return;
        };
        let snapshot = self.scheduler.store().snapshot();
        let result = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| e.to_string())
            .and_then(|s| std::fs::write(path, s).map_err(|e| e.to_string()));
        if let Err(e) = result {
            log::warn!("Could not save time records to {}: {}", path, e);
        }
    }
}

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct DivisionPath {
    division: String,
}

#[derive(Deserialize)]
struct OffsetsQuery {
    /// Comma separated, e.g. `-5,0,3`.
    offsets: String,
}

#[derive(Deserialize)]
struct RecordTimeBody {
    offsets: String,
    /// UTC hours the match started at, e.g. 18.5 for 18:30.
    time: f64,
}

fn parse_offsets(raw: &str) -> OffsetKey {
    verify_offsets(raw.split(','))
}

fn error_json(msg: impl ToString) -> serde_json::Value {
    serde_json::json!({ "error": msg.to_string() })
}

fn lookup_error(e: LookupError) -> HttpResponse {
    log::warn!("Leaderboard lookup failed: {}", e);
    HttpResponse::BadGateway().json(error_json(e))
}

fn no_division(name: &str) -> HttpResponse {
    HttpResponse::NotFound().json(error_json(format!("No division named {}", name)))
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "osu-map-pools",
    })
}

/// Check one beatmap for a division: rejected, pending approval, or accepted.
#[post("/api/divisions/{division}/check")]
async fn api_check(state: State, path: Path<DivisionPath>, body: Json<Beatmap>) -> HttpResponse {
    let Some(checker) = state.checker(&path.division) else {
        return no_division(&path.division);
    };
    match checker.check(&body).await {
        Ok(verdict) => HttpResponse::Ok().json(verdict),
        Err(e) => lookup_error(e),
    }
}

/// Check a team's whole pool: duplicates, buffer-zone counts, aggregates.
#[post("/api/divisions/{division}/check-pool")]
async fn api_check_pool(state: State, path: Path<DivisionPath>, body: Json<Vec<Beatmap>>) -> HttpResponse {
    let Some(checker) = state.checker(&path.division) else {
        return no_division(&path.division);
    };
    match checker.check_pool(&body).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => lookup_error(e),
    }
}

/// Reload the config file and rebuild all checkers.
#[post("/api/divisions/refresh")]
async fn api_refresh(state: State) -> HttpResponse {
    let config = match TournamentConfig::load(&state.config_path) {
        Ok(c) => c,
        Err(e) => return HttpResponse::BadRequest().json(error_json(e)),
    };
    match state.rebuild(&config) {
        Ok(count) => {
            if let Ok(mut g) = state.config.write() {
                *g = config;
            }
            HttpResponse::Ok().json(serde_json::json!({ "divisions": count }))
        }
        Err(e) => HttpResponse::InternalServerError().json(error_json(e)),
    }
}

/// Suggested time for a match: history if any, else a window everyone is awake.
#[get("/api/schedule")]
async fn api_get_schedule(state: State, query: Query<OffsetsQuery>) -> HttpResponse {
    let key = parse_offsets(&query.offsets);
    if key.is_empty() {
        return HttpResponse::BadRequest().json(error_json(SchedulerError::NoOffsets));
    }
    match state.scheduler.propose(&key) {
        Some(proposal) => HttpResponse::Ok().json(proposal),
        None => HttpResponse::NotFound().json(error_json(format!(
            "No common waking hours for {}; schedule manually",
            key
        ))),
    }
}

/// Record the start time of a played match.
#[post("/api/schedule")]
async fn api_record_time(state: State, body: Json<RecordTimeBody>) -> HttpResponse {
    let key = parse_offsets(&body.offsets);
    match state.scheduler.set_time(&key, body.time) {
        Ok(update) => {
            state.save_records();
            HttpResponse::Ok().json(update)
        }
        Err(e @ SchedulerError::Contended(..)) => HttpResponse::Conflict().json(error_json(e)),
        Err(e) => HttpResponse::BadRequest().json(error_json(e)),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn load_records(path: &str) -> MemoryTimeStore {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(_) => {
            log::info!("No time records at {}, starting empty", path);
            return MemoryTimeStore::new();
        }
    };
    match serde_json::from_str::<Vec<(OffsetKey, TimeRecord)>>(&text) {
        Ok(entries) => {
            let store = MemoryTimeStore::from_entries(entries);
            log::info!("Loaded {} time record(s) from {}", store.len(), path);
            store
        }
        Err(e) => {
            log::warn!("Ignoring unreadable time records in {}: {}", path, e);
            MemoryTimeStore::new()
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let config_path = std::env::var("POOLS_CONFIG").unwrap_or_else(|_| "pools.json".to_string());
    let records_path = std::env::var("TIME_RECORDS_FILE").ok();

    let config = TournamentConfig::load(&config_path)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

    let source: Arc<dyn LeaderboardSource> = match std::env::var("OSU_API_KEY") {
        Ok(key) => {
            let base = std::env::var("OSU_API_BASE").unwrap_or_else(|_| "https://osu.ppy.sh".to_string());
            Arc::new(OsuApiClient::new(key, base))
        }
        Err(_) => {
            log::warn!("OSU_API_KEY not set; leaderboard rules will fail");
            Arc::new(NoLeaderboard)
        }
    };

    let store = records_path
        .as_deref()
        .map(load_records)
        .unwrap_or_default();

    let state = Data::new(AppState {
        config_path,
        records_path,
        source,
        scheduler: Scheduler::new(store, config.scheduler),
        checkers: RwLock::new(CheckerSet {
            week: i64::MIN,
            checkers: HashMap::new(),
        }),
        config: RwLock::new(config.clone()),
    });
    let count = state
        .rebuild(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    log::info!("Loaded {} division(s)", count);

    // Background task: rebuild checkers when a new week starts
    let state_weekly = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(WEEK_CHECK_INTERVAL);
        loop {
            interval.tick().await;
            let config = match state_weekly.config.read() {
                Ok(g) => g.clone(),
                Err(_) => continue,
            };
            let week = week_number(Utc::now(), config.first_due_date);
            let current = state_weekly.checkers.read().map(|g| g.week).unwrap_or(week);
            if week == current {
                continue;
            }
            match state_weekly.rebuild(&config) {
                Ok(_) => log::info!("Week {} started; rebuilt checkers", week),
                Err(e) => log::warn!("Could not rebuild checkers for week {}: {}", week, e),
            }
        }
    });

    log::info!("Starting server at http://{}:{}", host, port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_refresh)
            .service(api_check)
            .service(api_check_pool)
            .service(api_get_schedule)
            .service(api_record_time)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

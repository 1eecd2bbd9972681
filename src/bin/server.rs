use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use lootdog_server::app::Application;
use lootdog_server::config;
use lootdog_server::map::Map;
use lootdog_server::records::RecordsStore;
use lootdog_server::state_store::StateFile;
use lootdog_server::types::Direction;
use serde::Deserialize;
use serde_json::{json, Map as JsonMap, Value};
use tokio::sync::Mutex;
use tower_http::services::ServeDir;

const MAX_RECORD_PAGE: usize = 100;
const TOKEN_LENGTH: usize = 32;

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to the game configuration json.
    #[arg(long, short = 'c')]
    config_file: PathBuf,
    /// Automatic tick period in milliseconds. Without it the simulation is
    /// driven by POST /api/v1/game/tick.
    #[arg(long, short = 't')]
    tick_period: Option<u64>,
    /// Directory with static frontend files.
    #[arg(long, short = 'w')]
    www_root: Option<PathBuf>,
    /// Spawn joining dogs at random road points instead of the first road start.
    #[arg(long)]
    randomize_spawn_points: bool,
    /// Path to the server state snapshot; loaded at startup if present.
    #[arg(long)]
    state_file: Option<PathBuf>,
    /// How often to autosave the snapshot, in milliseconds of game time.
    #[arg(long)]
    save_state_period: Option<u64>,
    /// Path to the leaderboard records file.
    #[arg(long, default_value = ".data/records.json")]
    records_file: PathBuf,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

struct ServerState {
    app: Application,
    state_file: Option<StateFile>,
    save_period: Option<Duration>,
    time_since_save: Duration,
    auto_tick: bool,
}

impl ServerState {
    /// Advances the game and runs the autosave schedule on game time.
    fn advance(&mut self, delta: Duration) {
        self.app.tick(delta);

        let Some(period) = self.save_period else {
            return;
        };
        self.time_since_save += delta;
        if self.time_since_save >= period {
            self.time_since_save = Duration::ZERO;
            save_state(&self.app, self.state_file.as_ref());
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match config::load_game(&cli.config_file) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("[server] failed to load {}: {err}", cli.config_file.display());
            std::process::exit(1);
        }
    };

    let mut game = settings.game;
    game.set_randomize_spawn_points(cli.randomize_spawn_points);

    let records = RecordsStore::open(cli.records_file.clone());
    let mut app = Application::new(game, records, settings.retirement_time);

    let state_file = cli.state_file.clone().map(StateFile::new);
    if let Some(file) = state_file.as_ref() {
        if file.exists() {
            let loaded = match file.load() {
                Ok(loaded) => loaded,
                Err(err) => {
                    eprintln!("[server] failed to read state file: {err}");
                    std::process::exit(1);
                }
            };
            if let Err(err) = app.restore_state(loaded) {
                eprintln!("[server] failed to restore state: {err}");
                std::process::exit(1);
            }
            println!("[server] state restored from {}", file.path().display());
        }
    }

    let state = Arc::new(Mutex::new(ServerState {
        app,
        state_file,
        save_period: cli.save_state_period.map(Duration::from_millis),
        time_since_save: Duration::ZERO,
        auto_tick: cli.tick_period.is_some(),
    }));

    if let Some(period_ms) = cli.tick_period {
        start_tick_loop(state.clone(), Duration::from_millis(period_ms));
    }

    let router = Router::new()
        .route("/api/v1/maps", get(maps_handler))
        .route("/api/v1/maps/{id}", get(map_handler))
        .route("/api/v1/game/join", post(join_handler))
        .route("/api/v1/game/state", get(state_handler))
        .route("/api/v1/game/players", get(players_handler))
        .route("/api/v1/game/player/action", post(action_handler))
        .route("/api/v1/game/tick", post(tick_handler))
        .route("/api/v1/game/records", get(records_handler))
        .with_state(state.clone());

    let router = match cli.www_root {
        Some(root) => {
            println!("[server] static file root: {}", root.display());
            router.fallback_service(ServeDir::new(root))
        }
        None => router,
    };

    let bind_addr = format!("0.0.0.0:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    println!("[server] listening on :{}", cli.port);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .expect("server runtime failed");
}

fn start_tick_loop(state: SharedState, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await; // the first tick fires immediately
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            guard.advance(period);
        }
    });
}

async fn shutdown_signal(state: SharedState) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    let guard = state.lock().await;
    save_state(&guard.app, guard.state_file.as_ref());
    println!("[server] shutting down");
}

fn save_state(app: &Application, state_file: Option<&StateFile>) {
    let Some(file) = state_file else {
        return;
    };
    if let Err(err) = file.save(&app.get_state()) {
        eprintln!("[server] failed to save state: {err}");
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinRequest {
    user_name: String,
    map_id: String,
}

#[derive(Debug, Deserialize)]
struct ActionRequest {
    #[serde(rename = "move")]
    movement: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickRequest {
    time_delta: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordsQuery {
    start: Option<usize>,
    max_items: Option<usize>,
}

async fn maps_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    let maps: Vec<Value> = guard
        .app
        .game()
        .maps()
        .map(|map| json!({ "id": map.id(), "name": map.name() }))
        .collect();
    Json(Value::Array(maps))
}

async fn map_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let guard = state.lock().await;
    match guard.app.game().find_map(&id) {
        Some(map) => (StatusCode::OK, Json(map_to_json(map))),
        None => error_response(StatusCode::NOT_FOUND, "mapNotFound", "map not found"),
    }
}

async fn join_handler(
    State(state): State<SharedState>,
    Json(request): Json<JoinRequest>,
) -> impl IntoResponse {
    if request.user_name.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalidArgument",
            "user name must not be empty",
        );
    }

    let mut guard = state.lock().await;
    match guard.app.join_game(request.user_name.trim(), &request.map_id) {
        Ok(result) => (
            StatusCode::OK,
            Json(json!({
                "authToken": result.token,
                "playerId": result.player_id,
            })),
        ),
        Err(_) => error_response(StatusCode::NOT_FOUND, "mapNotFound", "map not found"),
    }
}

async fn state_handler(State(state): State<SharedState>, headers: HeaderMap) -> impl IntoResponse {
    let guard = state.lock().await;
    let player = match authorize(&guard.app, &headers) {
        Ok(player) => player,
        Err(response) => return response,
    };

    let Some(session) = guard.app.game().session_for_map(&player.map_id) else {
        return error_response(StatusCode::NOT_FOUND, "mapNotFound", "map not found");
    };

    let mut players = JsonMap::new();
    for dog in session.dogs() {
        let bag: Vec<Value> = dog
            .bag()
            .iter()
            .map(|(item_id, info)| {
                json!({
                    "id": item_id,
                    "type": info.kind.as_str(),
                })
            })
            .collect();
        players.insert(
            dog.id().to_string(),
            json!({
                "pos": [dog.position().x, dog.position().y],
                "speed": [dog.velocity().vx, dog.velocity().vy],
                "dir": dog.direction().as_code(),
                "bag": bag,
                "score": dog.score(),
            }),
        );
    }

    let mut lost_objects = JsonMap::new();
    for item in session.loot_items() {
        lost_objects.insert(
            item.id.to_string(),
            json!({
                "type": item.info.kind.as_str(),
                "pos": [item.position.x, item.position.y],
            }),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "players": players,
            "lostObjects": lost_objects,
        })),
    )
}

async fn players_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let guard = state.lock().await;
    let player = match authorize(&guard.app, &headers) {
        Ok(player) => player,
        Err(response) => return response,
    };

    let mut players = JsonMap::new();
    for entry in guard.app.players_in_map(&player.map_id) {
        let name = guard
            .app
            .game()
            .session_for_map(&entry.map_id)
            .and_then(|session| session.dog(entry.dog_id))
            .map(|dog| dog.name().to_string())
            .unwrap_or_default();
        players.insert(entry.id.to_string(), json!({ "name": name }));
    }

    (StatusCode::OK, Json(Value::Object(players)))
}

async fn action_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(request): Json<ActionRequest>,
) -> impl IntoResponse {
    let mut guard = state.lock().await;
    let player_id = match authorize(&guard.app, &headers) {
        Ok(player) => player.id,
        Err(response) => return response,
    };

    let result = match parse_move(&request.movement) {
        Some(Some(direction)) => guard.app.move_player(player_id, direction),
        Some(None) => guard.app.stop_player(player_id),
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalidArgument",
                "move must be one of L, R, U, D or empty",
            )
        }
    };

    match result {
        Ok(()) => (StatusCode::OK, Json(json!({}))),
        Err(_) => error_response(StatusCode::UNAUTHORIZED, "unknownToken", "player not found"),
    }
}

async fn tick_handler(
    State(state): State<SharedState>,
    Json(request): Json<TickRequest>,
) -> impl IntoResponse {
    let mut guard = state.lock().await;
    if guard.auto_tick {
        return error_response(
            StatusCode::BAD_REQUEST,
            "badRequest",
            "manual ticks are disabled when --tick-period is set",
        );
    }
    if request.time_delta == 0 {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalidArgument",
            "timeDelta must be positive",
        );
    }

    guard.advance(Duration::from_millis(request.time_delta));
    (StatusCode::OK, Json(json!({})))
}

async fn records_handler(
    State(state): State<SharedState>,
    Query(query): Query<RecordsQuery>,
) -> impl IntoResponse {
    let start = query.start.unwrap_or(0);
    let Some(max_items) = validate_record_page(query.max_items) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalidArgument",
            "maxItems must not exceed 100",
        );
    };

    let guard = state.lock().await;
    let records: Vec<Value> = guard
        .app
        .records(start, max_items)
        .iter()
        .map(|record| {
            json!({
                "name": record.name,
                "score": record.score,
                "playTime": record.play_time_sec,
            })
        })
        .collect();
    (StatusCode::OK, Json(Value::Array(records)))
}

fn map_to_json(map: &Map) -> Value {
    let roads: Vec<Value> = map
        .roads()
        .iter()
        .map(|road| {
            let (x0, y0) = road.start();
            let (x1, y1) = road.end();
            if road.is_horizontal() {
                json!({ "x0": x0, "y0": y0, "x1": x1 })
            } else {
                json!({ "x0": x0, "y0": y0, "y1": y1 })
            }
        })
        .collect();

    let buildings: Vec<Value> = map
        .buildings()
        .iter()
        .map(|building| {
            json!({
                "x": building.x,
                "y": building.y,
                "w": building.width,
                "h": building.height,
            })
        })
        .collect();

    let offices: Vec<Value> = map
        .offices()
        .iter()
        .map(|office| {
            json!({
                "id": office.id,
                "x": office.x,
                "y": office.y,
                "offsetX": office.offset_x,
                "offsetY": office.offset_y,
            })
        })
        .collect();

    let loot_types: Vec<Value> = map
        .loot_types()
        .iter()
        .map(|info| {
            json!({
                "name": info.kind.as_str(),
                "value": info.value,
            })
        })
        .collect();

    json!({
        "id": map.id(),
        "name": map.name(),
        "roads": roads,
        "buildings": buildings,
        "offices": offices,
        "lootTypes": loot_types,
    })
}

fn authorize<'a>(
    app: &'a Application,
    headers: &HeaderMap,
) -> Result<&'a lootdog_server::app::Player, (StatusCode, Json<Value>)> {
    let Some(token) = bearer_token(headers) else {
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            "invalidToken",
            "authorization header is missing or malformed",
        ));
    };
    app.find_player_by_token(&token).ok_or_else(|| {
        error_response(
            StatusCode::UNAUTHORIZED,
            "unknownToken",
            "player token has not been found",
        )
    })
}

/// Extracts a well-formed bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("Authorization")?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ")?.trim();
    if token.len() != TOKEN_LENGTH || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(token.to_string())
}

/// `Some(Some(dir))` to move, `Some(None)` to stop, `None` for garbage.
fn parse_move(raw: &str) -> Option<Option<Direction>> {
    if raw.is_empty() {
        return Some(None);
    }
    Direction::parse_code(raw).map(Some)
}

fn validate_record_page(max_items: Option<usize>) -> Option<usize> {
    let max_items = max_items.unwrap_or(MAX_RECORD_PAGE);
    if max_items > MAX_RECORD_PAGE {
        return None;
    }
    Some(max_items)
}

fn error_response(status: StatusCode, code: &str, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "code": code,
            "message": message,
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_requires_exact_shape() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", "Bearer short".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        let token = "a".repeat(32);
        headers.insert(
            "Authorization",
            format!("Bearer {token}").parse().unwrap(),
        );
        assert_eq!(bearer_token(&headers), Some(token.clone()));

        headers.insert("Authorization", token.parse().unwrap());
        assert_eq!(bearer_token(&headers), None, "missing Bearer prefix");

        let bad = format!("Bearer {}!", "a".repeat(31));
        headers.insert("Authorization", bad.parse().unwrap());
        assert_eq!(bearer_token(&headers), None, "non-alphanumeric character");
    }

    #[test]
    fn move_codes_cover_stop_and_directions() {
        assert_eq!(parse_move(""), Some(None));
        assert_eq!(parse_move("L"), Some(Some(Direction::West)));
        assert_eq!(parse_move("R"), Some(Some(Direction::East)));
        assert_eq!(parse_move("U"), Some(Some(Direction::North)));
        assert_eq!(parse_move("D"), Some(Some(Direction::South)));
        assert_eq!(parse_move("diagonal"), None);
    }

    #[test]
    fn record_page_is_capped() {
        assert_eq!(validate_record_page(None), Some(100));
        assert_eq!(validate_record_page(Some(10)), Some(10));
        assert_eq!(validate_record_page(Some(100)), Some(100));
        assert_eq!(validate_record_page(Some(101)), None);
    }
}

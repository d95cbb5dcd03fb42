//! HTTP interface for players and administrators.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use axum::Router;
use chrono::NaiveDateTime;
use daily_wordle_rules::{GameStatus, Verdict};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tracing::{debug, error, info, instrument, warn};

use crate::db::{Game, Guess, Player, WordEntry};
use crate::error::SessionError;
use crate::report_service::{parse_report_date, DailyReport, PlayerDayStats, ReportError, ReportService};
use crate::session::SessionManager;
use crate::store::{Backend, GameId, PlayerId, StoreError, WordId};
use crate::word_service::{WordError, WordService};

/// Services shared by every request handler.
#[derive(Debug)]
pub struct AppState<B> {
    sessions: SessionManager<B>,
    words: WordService<B>,
    reports: ReportService<B>,
}

impl<B: Backend> AppState<B> {
    /// Bundles the services. All three should share one backend.
    pub fn new(sessions: SessionManager<B>, words: WordService<B>, reports: ReportService<B>) -> Self {
        Self {
            sessions,
            words,
            reports,
        }
    }

    /// Builds every service over `backend` using the session manager's clock.
    #[instrument(skip_all)]
    pub fn from_sessions(sessions: SessionManager<B>) -> Self {
        let backend = sessions.backend().clone();
        let words = WordService::with_clock(backend.clone(), Arc::clone(sessions.clock()));
        let reports = ReportService::new(backend);
        Self::new(sessions, words, reports)
    }

    /// The game session manager.
    pub fn sessions(&self) -> &SessionManager<B> {
        &self.sessions
    }
}

/// Builds the application router.
pub fn router<B: Backend>(state: Arc<AppState<B>>) -> Router {
    let player = Router::new()
        .route("/game/start", post(start_game::<B>))
        .route("/game/{game_id}/guess", post(submit_guess::<B>))
        .route("/game/{game_id}/status", get(game_status::<B>))
        .route("/game/{game_id}/guesses", get(game_guesses::<B>))
        .route("/{user_id}/games/today", get(games_today::<B>));

    let admin = Router::new()
        .route("/words", get(list_words::<B>).post(create_word::<B>))
        .route("/words/{id}", put(update_word::<B>).delete(delete_word::<B>))
        .route("/report/daily/{date}", get(daily_report::<B>))
        .route("/report/player/{user_id}", get(player_report::<B>))
        .route("/players", get(list_players::<B>));

    Router::new()
        .route("/health", get(health))
        .nest("/api/player", player)
        .nest("/api/admin", admin)
        .layer(ServiceBuilder::new().layer(middleware::from_fn(log_requests)))
        .with_state(state)
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let started = Instant::now();
    debug!(method = %method, uri = %uri, "Incoming HTTP request");

    let response = next.run(req).await;

    info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Response sent"
    );
    response
}

/// Error returned to HTTP clients as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = self.status.as_u16(), error = %self.message, "Request failed");
        } else {
            warn!(status = self.status.as_u16(), error = %self.message, "Request rejected");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let status = match &err {
            SessionError::NotFound { .. } => StatusCode::NOT_FOUND,
            SessionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl From<WordError> for ApiError {
    fn from(err: WordError) -> Self {
        let status = match &err {
            WordError::NotFound { .. } => StatusCode::NOT_FOUND,
            WordError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        let status = match &err {
            ReportError::PlayerNotFound { .. } => StatusCode::NOT_FOUND,
            ReportError::InvalidDate { .. } => StatusCode::BAD_REQUEST,
            ReportError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

/// A game as shown to clients. The target word stays hidden until the game ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    /// Game id.
    pub id: GameId,
    /// Owning player.
    pub player_id: PlayerId,
    /// Lifecycle state.
    pub status: GameStatus,
    /// Always five.
    pub guesses_allowed: i32,
    /// Guesses used so far.
    pub guesses_made: i32,
    /// True once solved.
    pub won: bool,
    /// True once won or lost.
    pub finished: bool,
    /// Creation time.
    pub started_at: NaiveDateTime,
    /// Time the game ended.
    pub finished_at: Option<NaiveDateTime>,
    /// The answer, revealed only for finished games.
    pub target_word: Option<String>,
}

impl GameView {
    fn build<B: Backend>(state: &AppState<B>, game: &Game) -> Result<Self, ApiError> {
        let status = game.status();
        let target_word = if status.is_finished() {
            Some(state.sessions.target_word(game)?.to_string())
        } else {
            None
        };
        Ok(Self {
            id: *game.id(),
            player_id: *game.player_id(),
            status,
            guesses_allowed: *game.guesses_allowed(),
            guesses_made: *game.guesses_made(),
            won: *game.won(),
            finished: *game.finished(),
            started_at: *game.started_at(),
            finished_at: *game.finished_at(),
            target_word,
        })
    }
}

/// A stored guess as shown to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessView {
    /// Guess id.
    pub id: i32,
    /// Game the guess belongs to.
    pub game_id: GameId,
    /// The guessed word, uppercase.
    pub guessed_word: String,
    /// Verdict symbols: `G` exact, `O` present, `-` absent.
    pub feedback: String,
    /// Per-letter verdicts in guess order.
    pub verdicts: Vec<Verdict>,
    /// Submission time.
    pub guessed_at: NaiveDateTime,
}

impl TryFrom<&Guess> for GuessView {
    type Error = StoreError;

    fn try_from(guess: &Guess) -> Result<Self, Self::Error> {
        let feedback = guess.parse_feedback()?;
        Ok(Self {
            id: *guess.id(),
            game_id: *guess.game_id(),
            guessed_word: guess.guessed_word().clone(),
            feedback: feedback.to_string(),
            verdicts: feedback.verdicts().to_vec(),
            guessed_at: *guess.guessed_at(),
        })
    }
}

/// A catalog word as shown to administrators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordView {
    /// Word id.
    pub id: WordId,
    /// Uppercase text.
    pub word: String,
    /// Whether new games may pick it.
    pub active: bool,
    /// Creation time.
    pub created_at: NaiveDateTime,
    /// Last modification time.
    pub updated_at: NaiveDateTime,
}

impl From<&WordEntry> for WordView {
    fn from(entry: &WordEntry) -> Self {
        Self {
            id: *entry.id(),
            word: entry.word().clone(),
            active: *entry.is_active(),
            created_at: *entry.created_at(),
            updated_at: *entry.updated_at(),
        }
    }
}

/// A player account as listed for administrators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    /// Player id.
    pub id: PlayerId,
    /// Login name.
    pub username: String,
    /// Registration time.
    pub created_at: NaiveDateTime,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            id: *player.id(),
            username: player.username().clone(),
            created_at: *player.created_at(),
        }
    }
}

/// Query string of the start endpoint.
#[derive(Debug, Deserialize)]
pub struct StartQuery {
    /// Player starting the game.
    #[serde(rename = "userId")]
    pub user_id: PlayerId,
}

/// Body of the guess endpoint.
#[derive(Debug, Deserialize)]
pub struct GuessRequest {
    /// The five-letter guess.
    pub guess: String,
}

/// Body of the word create and update endpoints.
#[derive(Debug, Deserialize)]
pub struct WordRequest {
    /// New word text.
    pub word: Option<String>,
    /// New active flag.
    pub active: Option<bool>,
}

async fn health() -> &'static str {
    "ok"
}

/// Runs synchronous engine work on the blocking pool inside the current span.
///
/// The engine holds per-key mutexes and does SQLite I/O, neither of which
/// may stall an async worker.
async fn blocking<B, T, F>(state: &Arc<AppState<B>>, work: F) -> Result<T, ApiError>
where
    B: Backend,
    T: Send + 'static,
    F: FnOnce(&AppState<B>) -> Result<T, ApiError> + Send + 'static,
{
    let state = Arc::clone(state);
    let span = tracing::Span::current();
    tokio::task::spawn_blocking(move || span.in_scope(|| work(&state)))
        .await
        .map_err(|e| {
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Worker task failed: {}", e),
            )
        })?
}

/// POST /api/player/game/start?userId=N
#[instrument(skip(state))]
async fn start_game<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Query(query): Query<StartQuery>,
) -> Result<Json<GameView>, ApiError> {
    blocking(&state, move |state| {
        let game = state.sessions.start(query.user_id)?;
        GameView::build(state, &game)
    })
    .await
    .map(Json)
}

/// POST /api/player/game/{gameId}/guess
#[instrument(skip(state, request))]
async fn submit_guess<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(game_id): Path<GameId>,
    Json(request): Json<GuessRequest>,
) -> Result<Json<GuessView>, ApiError> {
    blocking(&state, move |state| {
        let guess = state.sessions.guess(game_id, &request.guess)?;
        Ok(GuessView::try_from(&guess)?)
    })
    .await
    .map(Json)
}

/// GET /api/player/game/{gameId}/status
#[instrument(skip(state))]
async fn game_status<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(game_id): Path<GameId>,
) -> Result<Json<GameView>, ApiError> {
    blocking(&state, move |state| {
        let game = state.sessions.get_game_by_id(game_id)?;
        GameView::build(state, &game)
    })
    .await
    .map(Json)
}

/// GET /api/player/game/{gameId}/guesses
#[instrument(skip(state))]
async fn game_guesses<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(game_id): Path<GameId>,
) -> Result<Json<Vec<GuessView>>, ApiError> {
    blocking(&state, move |state| {
        let guesses = state.sessions.game_guesses(game_id)?;
        Ok(guesses
            .iter()
            .map(GuessView::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    })
    .await
    .map(Json)
}

/// GET /api/player/{userId}/games/today
#[instrument(skip(state))]
async fn games_today<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(user_id): Path<PlayerId>,
) -> Result<Json<Vec<GameView>>, ApiError> {
    blocking(&state, move |state| {
        let games = state.sessions.get_games_played_today(user_id)?;
        games
            .iter()
            .map(|game| GameView::build(state, game))
            .collect::<Result<Vec<_>, _>>()
    })
    .await
    .map(Json)
}

/// GET /api/admin/words
#[instrument(skip(state))]
async fn list_words<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
) -> Result<Json<Vec<WordView>>, ApiError> {
    blocking(&state, |state| {
        let words = state.words.list()?;
        Ok(words.iter().map(WordView::from).collect())
    })
    .await
    .map(Json)
}

/// POST /api/admin/words
#[instrument(skip(state))]
async fn create_word<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Json(request): Json<WordRequest>,
) -> Result<Json<WordView>, ApiError> {
    let text = request
        .word
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Word cannot be blank"))?;
    let active = request.active;
    blocking(&state, move |state| {
        let mut entry = state.words.create(&text)?;
        if active == Some(false) {
            entry = state.words.update(*entry.id(), None, Some(false))?;
        }
        Ok(WordView::from(&entry))
    })
    .await
    .map(Json)
}

/// PUT /api/admin/words/{id}
#[instrument(skip(state))]
async fn update_word<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<WordId>,
    Json(request): Json<WordRequest>,
) -> Result<Json<WordView>, ApiError> {
    blocking(&state, move |state| {
        let entry = state
            .words
            .update(id, request.word.as_deref(), request.active)?;
        Ok(WordView::from(&entry))
    })
    .await
    .map(Json)
}

/// DELETE /api/admin/words/{id}
#[instrument(skip(state))]
async fn delete_word<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<WordId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    blocking(&state, move |state| Ok(state.words.delete(id)?)).await?;
    Ok(Json(json!({ "message": "Word deleted successfully" })))
}

/// GET /api/admin/report/daily/{date}
#[instrument(skip(state))]
async fn daily_report<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(date): Path<String>,
) -> Result<Json<DailyReport>, ApiError> {
    let date = parse_report_date(&date)?;
    blocking(&state, move |state| Ok(state.reports.daily_report(date)?))
        .await
        .map(Json)
}

/// GET /api/admin/report/player/{userId}
#[instrument(skip(state))]
async fn player_report<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(user_id): Path<PlayerId>,
) -> Result<Json<Vec<PlayerDayStats>>, ApiError> {
    blocking(&state, move |state| Ok(state.reports.player_report(user_id)?))
        .await
        .map(Json)
}

/// GET /api/admin/players
#[instrument(skip(state))]
async fn list_players<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
) -> Result<Json<Vec<PlayerView>>, ApiError> {
    blocking(&state, |state| {
        let players = state.reports.list_players()?;
        Ok(players.iter().map(PlayerView::from).collect())
    })
    .await
    .map(Json)
}

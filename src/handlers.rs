use crate::catalog::{self, CatalogResponse, MAX_PVI, MIN_PVI};
use crate::errors::AppError;
use crate::models::{
    GUEST_USER, ImportRequest, ImportResponse, MonthsResponse, PviQuery, PviResponse, Session,
    SessionInput, StatsQuery, UserData, UserSettings,
};
use crate::state::AppState;
use crate::stats::{Period, StatsResponse, available_months, build_stats, solve_pvi, theoretical_tide_points};
use crate::ui::render_index;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Html,
};
use chrono::{NaiveDate, Utc};
use tracing::info;

const USER_HEADER: &str = "x-user-id";
const MAX_USER_ID_LEN: usize = 64;

pub async fn index() -> Html<String> {
    Html(render_index(&Period::current(false)))
}

pub async fn get_catalog() -> Json<CatalogResponse> {
    Json(catalog::catalog())
}

pub async fn list_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Session>>, AppError> {
    let user = user_id(&headers)?;
    Ok(Json(snapshot(&state, &user).await.sessions))
}

pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<SessionInput>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    let user = user_id(&headers)?;
    let created = mutate(&state, &user, |data| {
        let session = input.into_session(next_id(&data.sessions));
        validate_session(&session)?;
        data.sessions.push(session.clone());
        sort_sessions(&mut data.sessions);
        Ok(session)
    })
    .await?;

    info!(user = %user, session = %created.id, date = %created.date, "session created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<SessionInput>,
) -> Result<Json<Session>, AppError> {
    let user = user_id(&headers)?;
    let updated = mutate(&state, &user, |data| {
        let session = input.into_session(id.clone());
        validate_session(&session)?;
        let slot = data
            .sessions
            .iter_mut()
            .find(|existing| existing.id == id)
            .ok_or_else(|| AppError::not_found(format!("session {id} not found")))?;
        *slot = session.clone();
        sort_sessions(&mut data.sessions);
        Ok(session)
    })
    .await?;

    info!(user = %user, session = %updated.id, "session updated");
    Ok(Json(updated))
}

pub async fn delete_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user = user_id(&headers)?;
    mutate(&state, &user, |data| {
        let before = data.sessions.len();
        data.sessions.retain(|session| session.id != id);
        if data.sessions.len() == before {
            return Err(AppError::not_found(format!("session {id} not found")));
        }
        Ok(())
    })
    .await?;

    info!(user = %user, session = %id, "session deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserSettings>, AppError> {
    let user = user_id(&headers)?;
    Ok(Json(snapshot(&state, &user).await.settings))
}

pub async fn put_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(settings): Json<UserSettings>,
) -> Result<Json<UserSettings>, AppError> {
    let user = user_id(&headers)?;
    validate_settings(&settings)?;
    let saved = mutate(&state, &user, |data| {
        data.settings = settings;
        Ok(data.settings.clone())
    })
    .await?;

    info!(user = %user, rank = %saved.ocean_rank, goal = saved.exchange_goal_index, "settings saved");
    Ok(Json(saved))
}

pub async fn get_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    let user = user_id(&headers)?;
    let year_view = match query.view.as_deref() {
        None | Some("month") => false,
        Some("year") => true,
        Some(other) => {
            return Err(AppError::bad_request(format!(
                "view must be 'month' or 'year', got '{other}'"
            )));
        }
    };
    let period = match query.month.as_deref() {
        Some(month) => Period::parse(month, year_view)
            .ok_or_else(|| AppError::bad_request("month must be YYYY-MM"))?,
        None => Period::current(year_view),
    };

    let data = snapshot(&state, &user).await;
    Ok(Json(build_stats(&data.sessions, &data.settings, &period)))
}

pub async fn get_months(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MonthsResponse>, AppError> {
    let user = user_id(&headers)?;
    let data = snapshot(&state, &user).await;
    Ok(Json(MonthsResponse {
        months: available_months(&data.sessions),
    }))
}

pub async fn get_pvi(Query(query): Query<PviQuery>) -> Json<PviResponse> {
    let pvi = solve_pvi(query.tide_points, query.buy_in, query.games);
    Json(PviResponse {
        pvi,
        pvi_rounded: pvi.map(|value| (value * 100.0).round() / 100.0),
        theoretical_tp: theoretical_tide_points(query.buy_in, query.games),
    })
}

pub async fn export_data(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserData>, AppError> {
    let user = user_id(&headers)?;
    Ok(Json(snapshot(&state, &user).await))
}

/// Replaces the user's sessions, and settings when present, with the posted
/// document. Records from older exports are accepted as-is.
pub async fn import_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    let user = user_id(&headers)?;
    let imported = mutate(&state, &user, |data| {
        let mut sessions: Vec<Session> = Vec::with_capacity(request.sessions.len());
        for mut session in request.sessions {
            if session.id.is_empty() || sessions.iter().any(|kept| kept.id == session.id) {
                session.id = next_id(&sessions);
            }
            sessions.push(session);
        }
        sort_sessions(&mut sessions);
        data.sessions = sessions;
        if let Some(settings) = request.settings {
            data.settings = settings;
        }
        Ok(data.sessions.len())
    })
    .await?;

    info!(user = %user, imported, "data imported");
    Ok(Json(ImportResponse { imported }))
}

async fn snapshot(state: &AppState, user: &str) -> UserData {
    let data = state.data.lock().await;
    data.users.get(user).cloned().unwrap_or_default()
}

/// Applies `change` to a copy of the user's data and commits it only once the
/// whole document has been persisted.
async fn mutate<T>(
    state: &AppState,
    user: &str,
    change: impl FnOnce(&mut UserData) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let mut data = state.data.lock().await;
    let mut updated = data.users.get(user).cloned().unwrap_or_default();
    let result = change(&mut updated)?;

    let previous = data.users.insert(user.to_string(), updated);
    if let Err(err) = state.storage.persist(&data).await {
        match previous {
            Some(previous) => data.users.insert(user.to_string(), previous),
            None => data.users.remove(user),
        };
        return Err(err);
    }
    Ok(result)
}

/// Partition key from `x-user-id`, or the local guest when absent.
fn user_id(headers: &HeaderMap) -> Result<String, AppError> {
    let Some(raw) = headers.get(USER_HEADER) else {
        return Ok(GUEST_USER.to_string());
    };
    let raw = raw
        .to_str()
        .map_err(|_| AppError::bad_request("x-user-id must be ASCII"))?;
    let id = raw.trim().replace(['/', '.'], "_");

    let valid = !id.is_empty()
        && id.len() <= MAX_USER_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(AppError::bad_request(
            "x-user-id must be 1-64 characters of letters, digits, '_' or '-'",
        ));
    }
    Ok(id)
}

/// Millisecond timestamp ids, bumped past any collision.
fn next_id(sessions: &[Session]) -> String {
    let mut candidate = Utc::now().timestamp_millis();
    while sessions.iter().any(|session| session.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

/// Most recent date first; equal dates keep their order.
fn sort_sessions(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| b.date.cmp(&a.date));
}

fn validate_session(session: &Session) -> Result<(), AppError> {
    if session.date.len() != 10 || NaiveDate::parse_from_str(&session.date, "%Y-%m-%d").is_err() {
        return Err(AppError::bad_request("date must be YYYY-MM-DD"));
    }
    if !catalog::is_stake(session.buy_in) {
        return Err(AppError::bad_request(format!(
            "buy_in {} is not an offered stake",
            session.buy_in
        )));
    }
    if !(MIN_PVI..=MAX_PVI).contains(&session.pvi) {
        return Err(AppError::bad_request(format!(
            "pvi must be between {MIN_PVI} and {MAX_PVI}"
        )));
    }
    if session.leaderboard_prize < 0.0 || session.mining_prize < 0.0 {
        return Err(AppError::bad_request("prizes cannot be negative"));
    }
    Ok(())
}

fn validate_settings(settings: &UserSettings) -> Result<(), AppError> {
    if catalog::find_tier(&settings.ocean_rank).is_none() {
        return Err(AppError::bad_request(format!(
            "unknown ocean rank '{}'",
            settings.ocean_rank
        )));
    }
    if catalog::find_goal(settings.exchange_goal_index).is_none() {
        return Err(AppError::bad_request("exchange goal index out of range"));
    }
    if !(MIN_PVI..=MAX_PVI).contains(&settings.default_pvi) {
        return Err(AppError::bad_request(format!(
            "default pvi must be between {MIN_PVI} and {MAX_PVI}"
        )));
    }
    Ok(())
}

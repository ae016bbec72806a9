use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query},
    http::{StatusCode, Uri},
    Extension, Json,
};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    authentication::{
        get_jwt_token, hash_password_argon2, verify_password_argon2, AdminUser, AuthUser,
        MaybeUser,
    },
    data_formats::*,
    db_helpers::*,
    errors::RequestError,
    interaction::{Direction, InteractionKind, MembershipSet},
    models::User,
    roles::Role,
    AppState,
};

type JsonResult<T> = Result<Json<T>, RequestError>;

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> Result<(), (StatusCode, String)> {
    Err((
        StatusCode::NOT_FOUND,
        format!("URL {} provided was not found", uri),
    ))
}

async fn build_user_response(
    pool: &SqlitePool,
    user: User,
    token: String,
) -> Result<UserResponse, RequestError> {
    let role = Role::from_code(user.user_type).map_err(|e| {
        warn!(user_id = user.id, "{}", e);
        RequestError::ServerError
    })?;
    let liked = get_membership_in_db(pool, user.id, InteractionKind::Like).await?;
    let saved = get_membership_in_db(pool, user.id, InteractionKind::Save).await?;
    Ok(UserResponse::new(user, role, token, liked, saved))
}

fn issue_token(state: &AppState, id: i64) -> Result<String, RequestError> {
    get_jwt_token(id, &state.config.jwt_secret).map_err(|e| {
        warn!("Could not issue token: {:#}", e);
        RequestError::RunTimeError("Could not generate JWT successfully\nTry again later")
    })
}

// ----------------- User Handlers -----------------
pub async fn login_user(
    Extension(state): Extension<Arc<AppState>>,
    Json(UserWrapper { user: request }): Json<UserWrapper<LoginRequest>>,
) -> JsonResult<UserWrapper<UserResponse>> {
    let user = get_user_by_email(&state.pool, &request.email)
        .await?
        .ok_or(RequestError::RunTimeError("Email not found"))?;

    let is_password_correct = verify_password_argon2(request.password, &user.password)
        .await
        .map_err(|_| RequestError::RunTimeError("Could not login user\nPlease Try again"))?;
    if !is_password_correct {
        return Err(RequestError::RunTimeError("Incorrect password"));
    }
    if !user.is_active {
        return Err(RequestError::Deactivated);
    }

    let token = issue_token(&state, user.id)?;
    let result = build_user_response(&state.pool, user, token).await?;
    Ok(Json(UserWrapper::wrap_with_user_data(result)))
}

pub async fn register_user(
    Extension(state): Extension<Arc<AppState>>,
    Json(UserWrapper { mut user }): Json<UserWrapper<RegisterRequest>>,
) -> JsonResult<UserWrapper<UserResponse>> {
    user.password = hash_password_argon2(user.password)
        .await
        .map_err(|_| RequestError::RunTimeError("Could not register user\nPlease Try again"))?;

    let user = insert_user(&state.pool, &user, Role::User)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                return RequestError::RunTimeError("Email or username already exists");
            }
            e
        })?;
    info!(user_id = user.id, "Registered user {}", user.username);

    let token = issue_token(&state, user.id)?;
    let result = build_user_response(&state.pool, user, token).await?;
    Ok(Json(UserWrapper::wrap_with_user_data(result)))
}

pub async fn get_current_user(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser { id, token, .. }: AuthUser,
) -> JsonResult<UserWrapper<UserResponse>> {
    let user = get_user_by_id(&state.pool, id)
        .await?
        .ok_or(RequestError::NotFound("User not found"))?;
    let result = build_user_response(&state.pool, user, token).await?;
    Ok(Json(UserWrapper::wrap_with_user_data(result)))
}

pub async fn update_user(
    AuthUser { id, token, .. }: AuthUser,
    Extension(state): Extension<Arc<AppState>>,
    Json(UserWrapper { user }): Json<UserWrapper<UpdateUserRequest>>,
) -> JsonResult<UserWrapper<UserResponse>> {
    let user = update_user_in_db(&state.pool, id, user)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                return RequestError::RunTimeError("Email or username already exists");
            }
            e
        })?;
    let result = build_user_response(&state.pool, user, token).await?;
    Ok(Json(UserWrapper::wrap_with_user_data(result)))
}

pub async fn set_user_role(
    AdminUser(admin): AdminUser,
    Extension(state): Extension<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(RoleRequest { role }): Json<RoleRequest>,
) -> JsonResult<SuccessResponse> {
    if admin.id == user_id && role != Role::Admin {
        return Err(RequestError::RunTimeError("Admins cannot demote themselves"));
    }
    set_user_role_in_db(&state.pool, user_id, role).await?;
    info!(admin_id = admin.id, user_id, ?role, "Changed user role");
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn set_user_status(
    AdminUser(admin): AdminUser,
    Extension(state): Extension<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(StatusRequest { active }): Json<StatusRequest>,
) -> JsonResult<SuccessResponse> {
    if admin.id == user_id && !active {
        return Err(RequestError::RunTimeError("Admins cannot deactivate themselves"));
    }
    set_user_active_in_db(&state.pool, user_id, active).await?;
    info!(admin_id = admin.id, user_id, active, "Changed account status");
    Ok(Json(SuccessResponse { success: true }))
}
// ----------------- End User Handlers -----------------

// ----------------- Article Handlers -----------------
pub async fn list_articles(
    Extension(state): Extension<Arc<AppState>>,
    maybe_user: MaybeUser,
    Query(params): Query<ArticleQueryParams>,
) -> JsonResult<MultipleArticlesWrapper> {
    let articles = list_all_articles(&state.pool, maybe_user.get_id(), params).await?;
    let articles: Vec<ArticleResponse> = articles.into_iter().map(ArticleResponse::new).collect();
    Ok(Json(MultipleArticlesWrapper {
        article_count: articles.len(),
        articles,
    }))
}

pub async fn get_article(
    Extension(state): Extension<Arc<AppState>>,
    maybe_user: MaybeUser,
    Path(article_id): Path<i64>,
) -> JsonResult<ArticleWrapper<ArticleResponse>> {
    let article = get_article_by_id_in_db(&state.pool, article_id, maybe_user.get_id())
        .await?
        .ok_or(RequestError::NotFound("Article not found"))?;
    Ok(Json(ArticleWrapper {
        article: ArticleResponse::new(article),
    }))
}

pub async fn create_article(
    AdminUser(admin): AdminUser,
    Extension(state): Extension<Arc<AppState>>,
    Json(ArticleWrapper { article }): Json<ArticleWrapper<CreateArticleRequest>>,
) -> JsonResult<ArticleWrapper<ArticleResponse>> {
    if article.title.trim().is_empty() || article.link.trim().is_empty() {
        return Err(RequestError::RunTimeError("Title and link are required"));
    }
    let article = create_article_in_db(&state.pool, admin.id, article).await?;
    info!(article_id = article.id, "Created article");
    Ok(Json(ArticleWrapper {
        article: ArticleResponse::new(article),
    }))
}

pub async fn delete_article(
    AdminUser(_): AdminUser,
    Extension(state): Extension<Arc<AppState>>,
    Path(article_id): Path<i64>,
) -> JsonResult<SuccessResponse> {
    delete_article_in_db(&state.pool, article_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// `POST /posts/:id?like=1|-1` or `?save=1|-1` with the caller's new set.
pub async fn toggle_interaction(
    user: AuthUser,
    Extension(state): Extension<Arc<AppState>>,
    Path(article_id): Path<i64>,
    query: Result<Query<ToggleQuery>, QueryRejection>,
    Json(body): Json<MembershipRequest>,
) -> JsonResult<ToggleResponse> {
    let Query(query) =
        query.map_err(|_| RequestError::RunTimeError("Signal must be 1 or -1"))?;
    let (kind, signal) = match (query.like, query.save) {
        (Some(signal), None) => (InteractionKind::Like, signal),
        (None, Some(signal)) => (InteractionKind::Save, signal),
        _ => {
            return Err(RequestError::RunTimeError(
                "Exactly one of like or save is required",
            ))
        }
    };
    let direction = Direction::from_signal(signal)
        .ok_or(RequestError::RunTimeError("Signal must be 1 or -1"))?;

    let submitted = match kind {
        InteractionKind::Like => body.liked_articles,
        InteractionKind::Save => body.saved_articles,
    };
    let membership: MembershipSet = submitted
        .ok_or(match kind {
            InteractionKind::Like => RequestError::RunTimeError("liked_articles is required"),
            InteractionKind::Save => RequestError::RunTimeError("saved_articles is required"),
        })?
        .into_iter()
        .collect();

    let count = toggle_interaction_in_db(
        &state.pool,
        user.id,
        article_id,
        kind,
        direction,
        &membership,
    )
    .await?;

    Ok(Json(ToggleResponse {
        success: true,
        message: Some(format!("{} updated", kind.set_field())),
        count: Some(count),
    }))
}

// ----------------- Event Handlers -----------------
pub async fn list_events(
    Extension(state): Extension<Arc<AppState>>,
) -> JsonResult<MultipleEventsWrapper> {
    let events = list_events_in_db(&state.pool).await?;
    Ok(Json(MultipleEventsWrapper {
        events: events.into_iter().map(EventResponse::new).collect(),
    }))
}

pub async fn create_event(
    user: AuthUser,
    Extension(state): Extension<Arc<AppState>>,
    Json(EventWrapper { event }): Json<EventWrapper<CreateEventRequest>>,
) -> JsonResult<EventWrapper<EventResponse>> {
    if !user.role.can_post_events() {
        return Err(RequestError::Forbidden);
    }
    if event.title.trim().is_empty() {
        return Err(RequestError::RunTimeError("Title is required"));
    }
    let event = create_event_in_db(&state.pool, user.id, event).await?;
    info!(event_id = event.id, user_id = user.id, "Created event");
    Ok(Json(EventWrapper {
        event: EventResponse::new(event),
    }))
}

pub async fn delete_event(
    AdminUser(_): AdminUser,
    Extension(state): Extension<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> JsonResult<SuccessResponse> {
    delete_event_in_db(&state.pool, event_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Resets an article's counters to the size of its membership sets.
pub async fn recount_article(
    AdminUser(admin): AdminUser,
    Extension(state): Extension<Arc<AppState>>,
    Path(article_id): Path<i64>,
) -> JsonResult<RecountResponse> {
    let (like_count, save_count) = recount_article_in_db(&state.pool, article_id).await?;
    info!(admin_id = admin.id, article_id, like_count, save_count, "Recounted article");
    Ok(Json(RecountResponse {
        like_count,
        save_count,
    }))
}

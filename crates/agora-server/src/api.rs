use std::future::Future;
use std::sync::Arc;

use agora_shared::{CommentId, FieldError, PostId, RegistrationInput, TextInput, UserId};
use agora_store::{Comment, Like, Post, User};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::Method,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::AuthUser;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::service::{PostService, SharedDb, UserService};

#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub users: UserService,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: SharedDb, config: ServerConfig) -> Self {
        Self {
            posts: PostService::new(db.clone()),
            users: UserService::new(db),
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let posts = Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/:id", get(get_post).delete(delete_post))
        .route("/like/:id", post(like_post))
        .route("/unlike/:id", patch(unlike_post))
        .route("/comment/:id", post(add_comment))
        .route("/comment/:id/:comment_id", delete(remove_comment));

    let users = Router::new()
        .route("/", post(register_user))
        .route("/:id", get(get_user));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/posts", posts)
        .nest("/api/users", users)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct MessageResponse {
    msg: &'static str,
}

async fn root() -> &'static str {
    "API running"
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Turn an unreadable JSON body into a field-level validation error.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServerError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ServerError::Validation(vec![FieldError::new("body", rejection.body_text())]))
}

/// Malformed identifiers are reported exactly like missing records.
fn post_id(raw: &str) -> Result<PostId, ServerError> {
    PostId::parse(raw).map_err(|_| ServerError::NotFound("Post not found".into()))
}

// ─── Posts ───

async fn create_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<TextInput>, JsonRejection>,
) -> Result<Json<Post>, ServerError> {
    state.posts.create(user, body(payload)?).await.map(Json)
}

async fn list_posts(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> Result<Json<Vec<Post>>, ServerError> {
    state.posts.list().await.map(Json)
}

async fn get_post(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Post>, ServerError> {
    state.posts.get(post_id(&id)?).await.map(Json)
}

async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
    state.posts.delete(post_id(&id)?, user).await?;
    Ok(Json(MessageResponse { msg: "Post removed" }))
}

async fn like_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Like>>, ServerError> {
    state.posts.like(post_id(&id)?, user).await.map(Json)
}

async fn unlike_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Like>>, ServerError> {
    state.posts.unlike(post_id(&id)?, user).await.map(Json)
}

async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<TextInput>, JsonRejection>,
) -> Result<Json<Vec<Comment>>, ServerError> {
    let id = post_id(&id)?;
    state.posts.add_comment(id, user, body(payload)?).await.map(Json)
}

async fn remove_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<Json<Vec<Comment>>, ServerError> {
    let id = post_id(&id)?;
    let comment_id = CommentId::parse(&comment_id)
        .map_err(|_| ServerError::NotFound("Comment does not exist".into()))?;
    state.posts.remove_comment(id, user, comment_id).await.map(Json)
}

// ─── Users ───

async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegistrationInput>, JsonRejection>,
) -> Result<Json<User>, ServerError> {
    state.users.register(body(payload)?).await.map(Json)
}

async fn get_user(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ServerError> {
    let id = UserId::parse(&id).map_err(|_| ServerError::NotFound("User not found".into()))?;
    state.users.get(id).await.map(Json)
}

pub async fn serve(
    state: AppState,
    addr: std::net::SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use agora_store::Database;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        let db = SharedDb::new(Database::open_in_memory().unwrap());
        build_router(AppState::new(db, ServerConfig::default()))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            req = req.header("x-user-id", user);
        }
        let req = match body {
            Some(body) => req
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    async fn register(app: &Router, name: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/users",
            None,
            Some(json!({ "name": name, "email": format!("{name}@example.com") })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn root_and_health() {
        let app = app();
        let (status, body) = send(&app, "GET", "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("API running".into()));

        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn posts_require_identity() {
        let app = app();
        let (status, body) = send(&app, "GET", "/api/posts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["msg"], "No token, authorization denied");

        let (status, body) = send(&app, "GET", "/api/posts", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["msg"], "Token is not valid");
    }

    #[tokio::test]
    async fn create_validates_text() {
        let app = app();
        let u1 = register(&app, "ada").await;

        let (status, body) =
            send(&app, "POST", "/api/posts", Some(u1.as_str()), Some(json!({ "text": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["param"], "text");
        assert_eq!(body["errors"][0]["msg"], "Text is required");

        let (status, _) = send(&app, "POST", "/api/posts", Some(u1.as_str()), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = app();
        let u1 = register(&app, "ada").await;

        let req = Request::builder()
            .method("POST")
            .uri("/api/posts")
            .header("x-user-id", &u1)
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_list_get_delete() {
        let app = app();
        let u1 = register(&app, "ada").await;
        let u2 = register(&app, "bob").await;

        let (status, post) =
            send(&app, "POST", "/api/posts", Some(u1.as_str()), Some(json!({ "text": "hello" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(post["text"], "hello");
        assert_eq!(post["name"], "ada");
        assert_eq!(post["user"], u1.as_str());
        assert_eq!(post["likes"], json!([]));
        assert_eq!(post["comments"], json!([]));
        let id = post["id"].as_str().unwrap().to_string();

        let (status, list) = send(&app, "GET", "/api/posts", Some(u2.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, fetched) = send(&app, "GET", &format!("/api/posts/{id}"), Some(u2.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, post);

        let (status, body) =
            send(&app, "DELETE", &format!("/api/posts/{id}"), Some(u2.as_str()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["msg"], "User not authorized");

        let (status, body) =
            send(&app, "DELETE", &format!("/api/posts/{id}"), Some(u1.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["msg"], "Post removed");

        let (status, body) = send(&app, "GET", &format!("/api/posts/{id}"), Some(u1.as_str()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["msg"], "Post not found");
    }

    #[tokio::test]
    async fn malformed_post_id_is_not_found() {
        let app = app();
        let u1 = register(&app, "ada").await;

        let (status, body) = send(&app, "GET", "/api/posts/not-an-id", Some(u1.as_str()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["msg"], "Post not found");
    }

    #[tokio::test]
    async fn like_unlike_over_http() {
        let app = app();
        let u1 = register(&app, "ada").await;
        let u2 = register(&app, "bob").await;
        let (_, post) =
            send(&app, "POST", "/api/posts", Some(u1.as_str()), Some(json!({ "text": "hello" }))).await;
        let id = post["id"].as_str().unwrap();

        let (status, likes) =
            send(&app, "POST", &format!("/api/posts/like/{id}"), Some(u2.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(likes[0]["user"], u2.as_str());

        let (status, body) =
            send(&app, "POST", &format!("/api/posts/like/{id}"), Some(u2.as_str()), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "Post already liked");

        let (status, likes) =
            send(&app, "PATCH", &format!("/api/posts/unlike/{id}"), Some(u2.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(likes, json!([]));

        let (status, body) =
            send(&app, "PATCH", &format!("/api/posts/unlike/{id}"), Some(u2.as_str()), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "User has not yet liked the Post");
    }

    #[tokio::test]
    async fn comments_over_http() {
        let app = app();
        let u1 = register(&app, "ada").await;
        let u3 = register(&app, "cy").await;
        let (_, post) =
            send(&app, "POST", "/api/posts", Some(u1.as_str()), Some(json!({ "text": "hello" }))).await;
        let id = post["id"].as_str().unwrap();

        let (status, comments) = send(
            &app,
            "POST",
            &format!("/api/posts/comment/{id}"),
            Some(u3.as_str()),
            Some(json!({ "text": "nice" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(comments[0]["text"], "nice");
        assert_eq!(comments[0]["name"], "cy");
        let comment_id = comments[0]["id"].as_str().unwrap();

        let uri = format!("/api/posts/comment/{id}/{comment_id}");
        let (status, _) = send(&app, "DELETE", &uri, Some(u1.as_str()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, comments) = send(&app, "DELETE", &uri, Some(u3.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(comments, json!([]));

        let (status, body) = send(&app, "DELETE", &uri, Some(u3.as_str()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["msg"], "Comment does not exist");
    }

    #[tokio::test]
    async fn missing_or_malformed_targets_are_not_found() {
        let app = app();
        let u1 = register(&app, "ada").await;
        let (_, post) =
            send(&app, "POST", "/api/posts", Some(u1.as_str()), Some(json!({ "text": "hello" }))).await;
        let id = post["id"].as_str().unwrap();
        let unknown = PostId::new().to_string();

        for target in [unknown.as_str(), "not-an-id"] {
            let (status, body) =
                send(&app, "POST", &format!("/api/posts/like/{target}"), Some(u1.as_str()), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["msg"], "Post not found");

            let (status, body) =
                send(&app, "PATCH", &format!("/api/posts/unlike/{target}"), Some(u1.as_str()), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["msg"], "Post not found");

            let (status, body) = send(
                &app,
                "POST",
                &format!("/api/posts/comment/{target}"),
                Some(u1.as_str()),
                Some(json!({ "text": "hi" })),
            )
            .await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["msg"], "Post not found");
        }

        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/api/posts/comment/{id}/not-an-id"),
            Some(u1.as_str()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["msg"], "Comment does not exist");
    }

    #[tokio::test]
    async fn whitespace_text_is_accepted() {
        let app = app();
        let u1 = register(&app, "ada").await;

        let (status, post) =
            send(&app, "POST", "/api/posts", Some(u1.as_str()), Some(json!({ "text": "   " }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(post["text"], "   ");
    }

    #[tokio::test]
    async fn register_and_fetch_user() {
        let app = app();
        let u1 = register(&app, "ada").await;

        let (status, user) = send(&app, "GET", &format!("/api/users/{u1}"), Some(u1.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["email"], "ada@example.com");

        let (status, body) = send(
            &app,
            "POST",
            "/api/users",
            None,
            Some(json!({ "name": "other", "email": "ADA@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "User already exists");
    }
}

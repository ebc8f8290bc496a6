//! HTTP routing.

use crate::api::{comments, lists, tags, tasks};
use crate::auth::{self, AppState, require_bearer};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/api/auth/register", post(auth::routes::register))
        .route("/api/auth/login", post(auth::routes::login))
        .route("/api/auth/refresh", post(auth::routes::refresh));

    let protected = Router::new()
        .route("/api/auth/logout", post(auth::routes::logout))
        .route("/api/lists", get(lists::list_lists).post(lists::create_list))
        .route(
            "/api/lists/{id}",
            get(lists::get_list)
                .put(lists::update_list)
                .delete(lists::delete_list),
        )
        .route("/api/lists/{id}/roles", get(lists::list_roles))
        .route(
            "/api/lists/{id}/roles/{user_id}",
            put(lists::assign_role).delete(lists::revoke_role),
        )
        .route(
            "/api/lists/{id}/tasks",
            get(tasks::list_tasks).post(tasks::create_task),
        )
        .route(
            "/api/tasks/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route(
            "/api/tasks/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/api/comments/{id}", delete(comments::delete_comment))
        .route(
            "/api/tasks/{id}/tags",
            get(tags::list_tags).post(tags::add_tag),
        )
        .route("/api/tasks/{id}/tags/{tag_id}", delete(tags::remove_tag))
        .route_layer(from_fn_with_state(
            state.validator.clone(),
            require_bearer,
        ));

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/*
 * Responsibility
 * - URL 構造と、route ごとに必要な permission を定義する
 * - permission guard は handler 単位で掛ける (同じ path でも GET は public)
 */
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch},
};

use crate::{
    api::handlers::{
        drinks::{create_drink, delete_drink, list_drinks, list_drinks_detail, update_drink},
        health::health,
    },
    middleware::auth::permission::require,
    services::auth::AuthGate,
    state::AppState,
};

pub fn routes(auth: &Arc<AuthGate>) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/drinks",
            get(list_drinks).post(require(auth, "post:drinks", create_drink)),
        )
        .route(
            "/drinks-detail",
            get(require(auth, "get:drinks-detail", list_drinks_detail)),
        )
        .route(
            "/drinks/{id}",
            patch(require(auth, "patch:drinks", update_drink))
                .delete(require(auth, "delete:drinks", delete_drink)),
        )
}

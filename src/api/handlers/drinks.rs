/*
 * Responsibility
 * - /drinks 系 handler
 * - 認可は route の permission guard が済ませている (AuthCtx で受け取る)
 * - Json は Result で受け、rejection も AppError の JSON body で返す
 */
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    api::{
        dto::drinks::{
            CreateDrinkRequest, DeleteDrinkResponse, DrinkResponse, DrinksResponse,
            UpdateDrinkRequest,
        },
        extractors::{AuthCtxExtractor, DrinkId},
    },
    error::AppError,
    state::AppState,
};

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(AppError::PayloadTooLarge)
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "rejected request body");
            Err(AppError::BadRequest("body must be a JSON object"))
        }
    }
}

/// GET /drinks (public): short representation.
pub async fn list_drinks(State(state): State<AppState>) -> Result<Json<DrinksResponse>, AppError> {
    let drinks = state.drinks.list().await?;
    Ok(Json(DrinksResponse::new(
        drinks.into_iter().map(DrinkResponse::short).collect(),
    )))
}

/// GET /drinks-detail: long representation.
pub async fn list_drinks_detail(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<DrinksResponse>, AppError> {
    let drinks = state.drinks.list().await?;
    tracing::debug!(subject = ctx.subject(), count = drinks.len(), "listing drink details");
    Ok(Json(DrinksResponse::new(
        drinks.into_iter().map(DrinkResponse::long).collect(),
    )))
}

pub async fn create_drink(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    payload: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse>, AppError> {
    let new = json_body(payload)?
        .validate()
        .map_err(AppError::BadRequest)?;

    let drink = state.drinks.create(&new.title, &new.recipe).await?;
    tracing::info!(subject = ctx.subject(), drink_id = drink.id, "drink created");

    Ok(Json(DrinksResponse::new(vec![DrinkResponse::long(drink)])))
}

pub async fn update_drink(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    DrinkId(id): DrinkId,
    payload: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse>, AppError> {
    let changes = json_body(payload)?
        .validate()
        .map_err(AppError::BadRequest)?;

    let drink = state
        .drinks
        .update(id, changes.title.as_deref(), changes.recipe.as_ref())
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(subject = ctx.subject(), drink_id = id, "drink updated");

    Ok(Json(DrinksResponse::new(vec![DrinkResponse::long(drink)])))
}

pub async fn delete_drink(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    DrinkId(id): DrinkId,
) -> Result<Json<DeleteDrinkResponse>, AppError> {
    if !state.drinks.delete(id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(subject = ctx.subject(), drink_id = id, "drink deleted");

    Ok(Json(DeleteDrinkResponse {
        success: true,
        delete: id,
    }))
}

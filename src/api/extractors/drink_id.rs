/*
 * Responsibility
 * - Path の `{id}` を内部 ID (正の i64) として受け取る
 * - 数値でない / 0 以下の id は「存在しないリソース」として 404
 */
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrinkId(pub i64);

fn parse(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id > 0)
}

impl<S> FromRequestParts<S> for DrinkId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound)?;
        parse(&raw).map(DrinkId).ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_positive_integers_are_ids() {
        assert_eq!(parse("5"), Some(5));
        for raw in ["0", "-3", "abc", "1.5", "", "99999999999999999999"] {
            assert_eq!(parse(raw), None, "{raw:?}");
        }
    }
}

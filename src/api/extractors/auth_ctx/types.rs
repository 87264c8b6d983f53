/*
 * Responsibility
 * - Handler から見える「認可済みコンテキスト」の型
 * - permission guard が AuthGate を通した後に request extensions に格納する
 *
 * Notes
 * - 署名検証や permission の判定は services::auth の責務
 * - ここは検証済み claims を handler に渡すための「型（契約）」
 */
use chrono::{DateTime, Utc};

use crate::services::auth::VerifiedClaims;

/// Context attached to a request that passed its route's permission guard.
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub claims: VerifiedClaims,
    // The permission the guard checked for this route.
    pub granted: &'static str,
}

impl AuthCtx {
    pub fn new(claims: VerifiedClaims, granted: &'static str) -> Self {
        Self { claims, granted }
    }

    pub fn subject(&self) -> &str {
        self.claims.subject().unwrap_or("unknown")
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.claims.expires_at())
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

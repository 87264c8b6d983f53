/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - drinks: DrinkStore (Postgres / memory), auth: AuthGate
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::{fmt, sync::Arc};

use crate::repos::drink_repo::DrinkStore;
use crate::services::auth::AuthGate;

#[derive(Clone)]
pub struct AppState {
    pub drinks: Arc<dyn DrinkStore>,
    pub auth: Arc<AuthGate>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("drinks", &self.drinks.backend_name())
            .field("auth", &self.auth)
            .finish()
    }
}

impl AppState {
    pub fn new(drinks: Arc<dyn DrinkStore>, auth: Arc<AuthGate>) -> Self {
        Self { drinks, auth }
    }
}

//! Route guard: run the AuthGate for one permission, then hand the verified
//! claims to the handler through `AuthCtx`.
//!
//! Guards wrap individual handlers, so public and protected methods can share a path:
//! ```ignore
//! get(list_drinks).post(permission::require(&auth, "post:drinks", create_drink))
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    handler::Handler,
    http::header,
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::AuthGate;

/// State carried by one guarded handler.
#[derive(Clone)]
pub struct PermissionGuard {
    auth: Arc<AuthGate>,
    permission: &'static str,
}

/// Wrap `handler` so it only runs for requests carrying `permission`.
pub fn require<H, T, S>(auth: &Arc<AuthGate>, permission: &'static str, handler: H) -> impl Handler<T, S>
where
    H: Handler<T, S>,
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    let guard = PermissionGuard {
        auth: Arc::clone(auth),
        permission,
    };
    handler.layer(middleware::from_fn_with_state(guard, check_permission))
}

async fn check_permission(
    State(guard): State<PermissionGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = req.headers().get(header::AUTHORIZATION).cloned();

    let claims = match guard.auth.authorize(authorization.as_ref(), guard.permission).await {
        Ok(claims) => claims,
        Err(err) => {
            // never log the credential itself
            tracing::warn!(
                kind = err.kind(),
                permission = guard.permission,
                method = %req.method(),
                path = %req.uri().path(),
                "authorization failed"
            );
            return Err(err.into());
        }
    };

    let ctx = AuthCtx::new(claims, guard.permission);
    tracing::debug!(
        subject = ctx.subject(),
        issuer = ctx.claims.issuer(),
        client = ?ctx.claims.claim("azp"),
        expires_at = ?ctx.expires_at(),
        permission = ctx.granted,
        "authorized"
    );
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

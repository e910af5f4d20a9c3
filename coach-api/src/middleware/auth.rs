use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::{Duration, Utc};
use coach_core::identity::{Principal, Role};
use coach_core::EngineError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Bearer token claims issued by the identity service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

impl From<&Claims> for Principal {
    fn from(claims: &Claims) -> Self {
        Principal::new(claims.sub, claims.role)
    }
}

pub fn issue_token(secret: &str, principal: &Principal, ttl_seconds: u64) -> Result<String, AppError> {
    let claims = Claims {
        sub: principal.id,
        role: principal.role,
        exp: (Utc::now() + Duration::seconds(ttl_seconds as i64)).timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::Anyhow(anyhow::anyhow!("Token encoding failed: {}", e)))
}

fn authenticate(state: &AppState, req: &Request) -> Result<Principal, AppError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::Unauthorized("Not authorized to access this route".to_string()))?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        AppError::Unauthorized("Not authorized to access this route".to_string())
    })?;

    Ok(Principal::from(&token_data.claims))
}

/// Any signed-in caller. The verified `Principal` is placed in the request
/// extensions.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = authenticate(&state, &req)?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = authenticate(&state, &req)?;
    if !principal.is_admin() {
        return Err(EngineError::Forbidden("Access denied. Admin only.".to_string()).into());
    }
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use crate::auth;

/// Resolves the `Authorization: Bearer` header to a user id and stores it in
/// the request extensions. Requests without a valid token never reach a
/// handler.
pub async fn authenticate(
    State(auth_service): State<auth::Service>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> crate::Result<Response> {
    let TypedHeader(bearer) = bearer.ok_or(auth::Error::Unauthorized)?;
    let sub = auth_service.validate(bearer.token())?;

    req.extensions_mut().insert(sub);

    Ok(next.run(req).await)
}

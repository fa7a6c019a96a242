// Route gate middleware for Subtitle API
//
// This module wraps every request in the route gate: it resolves the signed-in user
// from the session token, then either forwards the request or answers with a
// redirect to the landing page or the sign-in page.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    http::header,
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures::future::{ok, ready, LocalBoxFuture, Ready};
use log::debug;
use std::sync::Arc;

use crate::route_gate::RouteGate;
use crate::session::SessionProvider;

/// Identifier of the signed-in user, available to handlers behind the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(ErrorUnauthorized("User not authenticated"))),
        }
    }
}

struct GuardState {
    gate: RouteGate,
    sessions: Arc<dyn SessionProvider>,
    cookie_name: String,
}

impl GuardState {
    /// Session token from the Authorization header, falling back to the session cookie
    fn session_token(&self, req: &ServiceRequest) -> Option<String> {
        let bearer = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        bearer.or_else(|| {
            req.cookie(&self.cookie_name)
                .map(|cookie| cookie.value().to_string())
                .filter(|token| !token.is_empty())
        })
    }
}

/// Middleware factory for the route gate
#[derive(Clone)]
pub struct RouteGuard {
    state: Arc<GuardState>,
}

impl RouteGuard {
    pub fn new(gate: RouteGate, sessions: Arc<dyn SessionProvider>, cookie_name: &str) -> Self {
        Self {
            state: Arc::new(GuardState {
                gate,
                sessions,
                cookie_name: cookie_name.to_string(),
            }),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RouteGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RouteGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RouteGuardMiddleware {
            service,
            state: self.state.clone(),
        })
    }
}

/// Route gate middleware implementation
pub struct RouteGuardMiddleware<S> {
    service: S,
    state: Arc<GuardState>,
}

impl<S, B> Service<ServiceRequest> for RouteGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let user_id = self
            .state
            .session_token(&req)
            .and_then(|token| self.state.sessions.user_id(&token));

        let decision = self.state.gate.decide(req.path(), user_id.as_deref());
        if let Some(location) = decision.location() {
            debug!("Redirecting {} to {}", req.path(), location);
            let response = HttpResponse::TemporaryRedirect()
                .insert_header((header::LOCATION, location))
                .finish();
            let res = req.into_response(response).map_into_right_body();
            return Box::pin(async move { Ok(res) });
        }

        if let Some(user_id) = user_id {
            req.extensions_mut().insert(AuthenticatedUser(user_id));
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// JWT Authentication Middleware
///
/// Runs the [`RequestGate`] with a fixed [`TokenPolicy`] before the wrapped
/// service and injects the decoded claims into request extensions for use by
/// route handlers (`web::ReqData<Claims>`).

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{RequestGate, TokenPolicy};

/// JWT middleware for protecting routes
pub struct JwtMiddleware {
    gate: RequestGate,
    policy: TokenPolicy,
}

impl JwtMiddleware {
    pub fn new(gate: RequestGate, policy: TokenPolicy) -> Self {
        Self { gate, policy }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            gate: self.gate.clone(),
            policy: self.policy,
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    gate: RequestGate,
    policy: TokenPolicy,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let authorization = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(str::to_owned);

        let service = self.service.clone();
        let gate = self.gate.clone();
        let policy = self.policy;

        Box::pin(async move {
            let claims = gate.authorize(authorization.as_deref(), policy).await?;

            tracing::debug!(
                user_id = %claims.sub,
                jti = %claims.jti,
                path = %req.path(),
                "JWT validated successfully"
            );
            req.extensions_mut().insert(claims);

            service.call(req).await
        })
    }
}

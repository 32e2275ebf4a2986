use crate::handlers::auth::TokenValidator;
use crate::handlers::errors::ApiError;
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, HttpMessage,
};
use futures_util::future::{ok, Ready};
use log::{error, warn};
use std::{
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

/// Middleware for bearer-token authentication. Valid claims are stored in
/// the request extensions for the policy checks further down.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddlewareMiddleware<S> {
    pub service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let Some(validator) = req.app_data::<web::Data<TokenValidator>>().cloned() else {
                error!("TokenValidator is not registered as app data");
                return Err(ApiError::Internal("token validator missing".into()).into());
            };

            let Some(token) = bearer_token(&req) else {
                warn!("No bearer token on {} {}", req.method(), req.path());
                return Err(ApiError::Unauthorized.into());
            };

            match validator.validate(&token) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                }
                Err(reason) => {
                    // Reason stays in the log; the client only sees 401.
                    warn!("Rejected token on {} {}: {}", req.method(), req.path(), reason);
                    return Err(ApiError::Unauthorized.into());
                }
            }

            service.call(req).await
        })
    }
}

// Authorization: Bearer <token>, scheme matched case-insensitively
fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn extracts_bearer_token_case_insensitively() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "bearer abc.def.ghi"))
            .to_srv_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn ignores_other_schemes_and_empty_values() {
        for header in ["Basic dXNlcjpwYXNz", "Bearer ", "Bearer", "abc.def.ghi"] {
            let req = TestRequest::default()
                .insert_header((AUTHORIZATION, header))
                .to_srv_request();
            assert_eq!(bearer_token(&req), None, "header {:?}", header);
        }

        let req = TestRequest::default().to_srv_request();
        assert_eq!(bearer_token(&req), None);
    }
}

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::{error, info};
use std::{rc::Rc, time::Instant};

// Request logger middleware. Never logs the token itself.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggerMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestLoggerMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
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
        let started = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_owned();
        let client_ip = req
            .connection_info()
            .peer_addr()
            .unwrap_or("unknown")
            .to_owned();
        let bearer = req.headers().contains_key(AUTHORIZATION);

        info!(
            "[ROLEGATE-REQUEST] {} - {} {} - Bearer: {}",
            client_ip, method, path, bearer
        );

        let service = self.service.clone();
        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = started.elapsed();

            match &res {
                Ok(response) => {
                    info!(
                        "[ROLEGATE-RESPONSE] {} - {} {} - Status: {} - Time: {:.2?}",
                        client_ip,
                        method,
                        path,
                        response.status().as_u16(),
                        elapsed
                    );
                }
                Err(err) => {
                    error!(
                        "[ROLEGATE-ERROR] {} - {} {} - Status: {} - Time: {:.2?}",
                        client_ip,
                        method,
                        path,
                        err.as_response_error().status_code().as_u16(),
                        elapsed
                    );
                }
            }

            res
        })
    }
}

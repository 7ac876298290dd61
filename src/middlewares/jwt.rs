use std::future::Future;
use std::pin::Pin;

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use log::debug;

use crate::context::UserInfo;
use crate::response::redirect;
use crate::session::{Sessions, LOGIN_PATH};

/// Puts the signed-in user into the request extensions, or redirects to the
/// login page with the requested path as `next`.
pub(crate) struct JWTMiddleware {
    sessions: Sessions,
}

impl JWTMiddleware {
    pub fn new(sessions: Sessions) -> Self {
        Self { sessions }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JWTMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = JWTService<S>;
    type InitError = ();
    type Future = Pin<Box<dyn Future<Output = Result<Self::Transform, Self::InitError>>>>;
    fn new_transform(&self, service: S) -> Self::Future {
        let sessions = self.sessions.clone();
        Box::pin(async move {
            Ok(JWTService {
                sessions,
                next_service: service,
            })
        })
    }
}

pub struct JWTService<S> {
    sessions: Sessions,
    next_service: S,
}

impl<S, B> Service<ServiceRequest> for JWTService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    fn poll_ready(&self, ctx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.next_service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.sessions.authenticate(req.request()) {
            Some(id) => {
                req.extensions_mut().insert(UserInfo { id });
                let res_fut = self.next_service.call(req);
                Box::pin(async move {
                    let resp = res_fut.await?;
                    Ok(resp.map_into_left_body())
                })
            }
            None => {
                debug!("no session for {}", req.path());
                let location = format!("{}?next={}", LOGIN_PATH, req.path().replace('&', "%26"));
                let resp = req.into_response(redirect(&location));
                Box::pin(async move { Ok(resp.map_into_right_body()) })
            }
        }
    }
}

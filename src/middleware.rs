use std::{future::Ready, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error,
};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Tags every response with a request id. A caller-supplied id is kept so a
/// client retry can be traced across attempts; otherwise a fresh uuid is used.
pub struct RequestIdMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequestIdMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestIdMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequestIdMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestIdMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestIdMiddlewareService<S>
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
        let request_id = incoming_request_id(&req).unwrap_or_else(|| Uuid::new_v4().to_string());
        let method = req.method().clone();
        let path = req.path().to_string();
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let mut res = service.call(req).await?;
            log::debug!(
                "[{}] {} {} -> {}",
                request_id,
                method,
                path,
                res.status().as_u16()
            );
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }
            Ok(res)
        })
    }
}

fn incoming_request_id(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{get, test, App, HttpResponse};

    #[get("/ping")]
    async fn ping() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    fn response_id<B>(resp: &ServiceResponse<B>) -> String {
        resp.headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .expect("request id header")
    }

    #[actix_web::test]
    async fn fresh_ids_are_generated_per_request() {
        let app = test::init_service(App::new().wrap(RequestIdMiddleware).service(ping)).await;

        let first = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        let second = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;

        assert!(Uuid::parse_str(&response_id(&first)).is_ok());
        assert_ne!(response_id(&first), response_id(&second));
    }

    #[actix_web::test]
    async fn caller_supplied_id_is_echoed() {
        let app = test::init_service(App::new().wrap(RequestIdMiddleware).service(ping)).await;

        let req = test::TestRequest::get()
            .uri("/ping")
            .insert_header((REQUEST_ID_HEADER, "retry-7"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(response_id(&resp), "retry-7");
    }

    #[actix_web::test]
    async fn oversized_caller_id_is_replaced() {
        let app = test::init_service(App::new().wrap(RequestIdMiddleware).service(ping)).await;

        let req = test::TestRequest::get()
            .uri("/ping")
            .insert_header((REQUEST_ID_HEADER, "x".repeat(MAX_REQUEST_ID_LEN + 1)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(Uuid::parse_str(&response_id(&resp)).is_ok());
    }
}

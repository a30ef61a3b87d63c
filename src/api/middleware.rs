use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, time::Instant};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id of the current request, kept in request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestIdValue(pub String);

/// Id for log lines; `-` outside the middleware (e.g. in tests).
pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestIdValue>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "-".to_string())
}

/// Caller-supplied ids are reused when they are short and plain.
fn incoming_id(req: &ServiceRequest) -> Option<String> {
    let raw = req.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    let plain = !raw.is_empty()
        && raw.len() <= 64
        && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    plain.then(|| raw.to_string())
}

/// Assigns every request a correlation id (reusing a valid incoming
/// `x-request-id`), logs its outcome and echoes the id back.
pub struct RequestId;

impl<S, B> Transform<S, ServiceRequest> for RequestId
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestIdMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestIdMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestIdMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let id = incoming_id(&req).unwrap_or_else(|| Uuid::new_v4().to_string());
        req.extensions_mut().insert(RequestIdValue(id.clone()));
        let method = req.method().clone();
        let path = req.path().to_string();
        let started = Instant::now();

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut resp = fut.await?;
            let status = resp.status();
            let elapsed = started.elapsed().as_millis();
            if status.is_server_error() {
                log::warn!("request_id={} {} {} -> {} in {}ms", id, method, path, status, elapsed);
            } else {
                log::debug!("request_id={} {} {} -> {} in {}ms", id, method, path, status, elapsed);
            }
            if let Ok(value) = HeaderValue::from_str(&id) {
                resp.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }
            Ok(resp)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test, web};

    async fn echo(req: HttpRequest) -> HttpResponse {
        HttpResponse::Ok().body(request_id(&req))
    }

    #[actix_web::test]
    async fn reuses_plain_incoming_id() {
        let app = test::init_service(
            App::new().wrap(RequestId).route("/", web::get().to(echo)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((REQUEST_ID_HEADER, "abc-123"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get(REQUEST_ID_HEADER).unwrap(), "abc-123");
        let body = test::read_body(resp).await;
        assert_eq!(body, "abc-123");
    }

    #[actix_web::test]
    async fn replaces_unusable_incoming_id() {
        let app = test::init_service(
            App::new().wrap(RequestId).route("/", web::get().to(echo)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((REQUEST_ID_HEADER, "bad id; drop"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let header = resp.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap().to_string();
        assert_ne!(header, "bad id; drop");
        assert!(Uuid::parse_str(&header).is_ok());
        let body = test::read_body(resp).await;
        assert_eq!(body, header.as_bytes());
    }

    #[actix_web::test]
    async fn id_is_dash_without_middleware() {
        let req = test::TestRequest::get().to_http_request();
        assert_eq!(request_id(&req), "-");
    }
}

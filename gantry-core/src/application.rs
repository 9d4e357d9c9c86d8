// Application bootstrapper and HTTP server.
//
// This is the transport adapter: it wraps inbound hyper requests into
// `HttpRequest`, hands them to the router, and serializes the resulting
// `HttpResponse` back onto the wire. Errors escaping dispatch are mapped to
// their status code here.

use crate::logging::{error, info};
use crate::{form, Container, Error, HttpRequest, HttpResponse, Router};
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{body::Incoming as IncomingBody, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// The main application struct
pub struct Application {
    pub container: Container,
    pub router: Arc<Router>,
}

impl Application {
    /// Create an application from a composed container and router.
    ///
    /// Registration (bindings, routes, middleware) is expected to be
    /// complete before construction; dispatch treats both tables as
    /// immutable.
    pub fn new(container: Container, router: Router) -> Self {
        Self {
            container,
            router: Arc::new(router),
        }
    }

    /// Get a reference to the DI container
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Start the HTTP server on the specified port
    pub async fn listen(self, port: u16) -> Result<(), Error> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await?;

        info!(address = %addr, "Server listening");

        let router = self.router.clone();

        loop {
            let (stream, _) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let router = router.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<IncomingBody>| {
                    let router = router.clone();
                    async move { handle_request(req, router).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!(error = ?err, "Error serving connection");
                }
            });
        }
    }
}

/// Handle an incoming HTTP request
async fn handle_request(
    req: Request<IncomingBody>,
    router: Arc<Router>,
) -> Result<Response<Full<bytes::Bytes>>, hyper::Error> {
    let method = req.method().to_string();
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let mut request = HttpRequest::new(method, target);

    for (name, value) in req.headers() {
        if let Ok(value_str) = value.to_str() {
            request.insert_header(name.as_str(), value_str);
        }
    }

    let body_bytes = req.collect().await?.to_bytes();
    request.body = body_bytes.to_vec();

    // URL-encoded bodies populate form fields; anything else stays raw
    let is_form = request
        .header("content-type")
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if is_form && !request.body.is_empty() {
        request.form_params = form::parse_form_map(&request.body).unwrap_or_default();
    }

    let response = match router.dispatch(request).await {
        Ok(response) => response,
        Err(err) => {
            error!(error = %err, "Dispatch failed");
            HttpResponse::new(err.status_code()).with_text(err.to_string())
        }
    };

    Ok(serialize_response(response))
}

/// Convert an `HttpResponse` into a hyper response
fn serialize_response(response: HttpResponse) -> Response<Full<bytes::Bytes>> {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut builder = Response::builder().status(status);
    for (name, value) in &response.headers {
        builder = builder.header(name, value);
    }

    match builder.body(Full::new(bytes::Bytes::from(response.body))) {
        Ok(resp) => resp,
        Err(err) => {
            error!(error = %err, "Failed to serialize response");
            let mut fallback = Response::new(Full::new(bytes::Bytes::from_static(
                b"Internal Server Error",
            )));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        }
    }
}

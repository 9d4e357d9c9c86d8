//! Integration tests for gantry-core

use async_trait::async_trait;
use gantry_core::*;
use parking_lot::Mutex;
use std::sync::Arc;

#[test]
fn test_http_request_creation() {
    let req = HttpRequest::new("GET".to_string(), "/test".to_string());
    assert_eq!(req.method, "GET");
    assert_eq!(req.path, "/test");
    assert!(req.headers.is_empty());
    assert!(req.body.is_empty());
    assert!(req.path_params.is_empty());
}

#[test]
fn test_http_response_creation() {
    assert_eq!(HttpResponse::ok().status, 200);
    assert_eq!(HttpResponse::created().status, 201);
    assert_eq!(HttpResponse::no_content().status, 204);
    assert_eq!(HttpResponse::bad_request().status, 400);
    assert_eq!(HttpResponse::forbidden().status, 403);
    assert_eq!(HttpResponse::not_found().status, 404);
    assert_eq!(HttpResponse::internal_server_error().status, 500);
}

#[test]
fn test_error_conversion() {
    let err = Error::NotFound("Resource not found".to_string());
    assert_eq!(err.status_code(), 404);
    assert!(err.is_client_error());
    assert!(!err.is_server_error());

    let err = Error::Internal("Server error".to_string());
    assert_eq!(err.status_code(), 500);
    assert!(err.is_server_error());

    let err = Error::ProviderNotFound("Svc".to_string());
    assert_eq!(err.status_code(), 500);
}

// ---- End-to-end dispatch scenario ----

#[tokio::test]
async fn test_dispatch_end_to_end() {
    let mut router = Router::new(Container::new());

    router
        .get("/", handler(|_req| async { Ok("home") }))
        .unwrap();
    router
        .get(
            "/products/{id}",
            handler(|req| async move {
                let id = req.param("id").cloned().unwrap_or_default();
                Ok(Json(serde_json::json!({ "id": id })))
            }),
        )
        .unwrap();

    let response = router
        .dispatch(HttpRequest::new("GET".to_string(), "/".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body_ref(), b"home");

    let response = router
        .dispatch(HttpRequest::new(
            "GET".to_string(),
            "/products/7".to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    let value: serde_json::Value = serde_json::from_slice(response.body_ref()).unwrap();
    assert_eq!(value, serde_json::json!({ "id": "7" }));
}

// ---- Controllers resolved through the container ----

#[derive(Clone)]
struct CatalogService {
    store_name: String,
}

impl Injectable for CatalogService {
    fn construct(_container: &Container) -> Result<Self, Error> {
        Ok(Self {
            store_name: "default-store".to_string(),
        })
    }
}

struct ProductsController {
    catalog: Arc<CatalogService>,
}

impl Injectable for ProductsController {
    fn construct(container: &Container) -> Result<Self, Error> {
        Ok(Self {
            catalog: container.resolve_or_build::<CatalogService>()?,
        })
    }
}

#[tokio::test]
async fn test_controller_route_with_injected_service() {
    let container = Container::new();
    container.register(CatalogService {
        store_name: "acme".to_string(),
    });

    let mut router = Router::new(container);
    router
        .get(
            "/products/{id}",
            RouteAction::controller::<ProductsController, _, _, _>("show", |c, req| {
                let id = req.param("id").cloned().unwrap_or_default();
                async move {
                    Ok(Json(serde_json::json!({
                        "store": c.catalog.store_name.clone(),
                        "id": id,
                    })))
                }
            })
            .unwrap(),
        )
        .unwrap();

    let response = router
        .dispatch(HttpRequest::new(
            "GET".to_string(),
            "/products/42".to_string(),
        ))
        .await
        .unwrap();

    let value: serde_json::Value = serde_json::from_slice(response.body_ref()).unwrap();
    assert_eq!(value, serde_json::json!({ "store": "acme", "id": "42" }));
}

// ---- Middleware behavior through full dispatch ----

struct TraceMiddleware {
    tag: &'static str,
    events: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Middleware for TraceMiddleware {
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        self.events.lock().push(format!("{}:in", self.tag));
        let mut response = next(req).await?;
        self.events.lock().push(format!("{}:out", self.tag));

        let trace = match response.headers.get("x-trace") {
            Some(existing) => format!("{},{}", existing, self.tag),
            None => self.tag.to_string(),
        };
        response.headers.insert("x-trace".to_string(), trace);
        Ok(response)
    }
}

struct GateMiddleware;

#[async_trait]
impl Middleware for GateMiddleware {
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        if req.header("x-session").is_none() {
            return Ok(HttpResponse::redirect("/login"));
        }
        next(req).await
    }
}

#[tokio::test]
async fn test_global_middleware_runs_before_route_middleware() {
    let events = Arc::new(Mutex::new(Vec::new()));

    let mut router = Router::new(Container::new());
    router.add_global_middleware(TraceMiddleware {
        tag: "global",
        events: events.clone(),
    });
    router
        .route(
            HttpMethod::GET,
            "/checkout",
            handler(|_req| async { Ok("ok") }),
            vec![Arc::new(TraceMiddleware {
                tag: "route",
                events: events.clone(),
            })],
        )
        .unwrap();

    let response = router
        .dispatch(HttpRequest::new("GET".to_string(), "/checkout".to_string()))
        .await
        .unwrap();

    assert_eq!(
        *events.lock(),
        vec!["global:in", "route:in", "route:out", "global:out"]
    );
    // Unwind order: route middleware stamps first, global last
    assert_eq!(
        response.headers.get("x-trace"),
        Some(&"route,global".to_string())
    );
}

#[tokio::test]
async fn test_middleware_short_circuit_through_dispatch() {
    let events = Arc::new(Mutex::new(Vec::new()));

    let mut router = Router::new(Container::new());
    router
        .route(
            HttpMethod::GET,
            "/account",
            handler(|_req| async { Ok("account-page") }),
            vec![
                Arc::new(GateMiddleware),
                Arc::new(TraceMiddleware {
                    tag: "inner",
                    events: events.clone(),
                }),
            ],
        )
        .unwrap();

    // No session header: the gate short-circuits with a redirect
    let response = router
        .dispatch(HttpRequest::new("GET".to_string(), "/account".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status, 302);
    assert_eq!(response.headers.get("Location"), Some(&"/login".to_string()));
    assert!(events.lock().is_empty());

    // With a session the chain passes through to the handler
    let mut request = HttpRequest::new("GET".to_string(), "/account".to_string());
    request.insert_header("x-session", "s-1");
    let response = router.dispatch(request).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body_ref(), b"account-page");
}

#[tokio::test]
async fn test_request_id_middleware_through_dispatch() {
    let mut router = Router::new(Container::new());
    router.add_global_middleware(RequestIdMiddleware);
    router
        .get("/ping", handler(|_req| async { Ok("pong") }))
        .unwrap();

    let response = router
        .dispatch(HttpRequest::new("GET".to_string(), "/ping".to_string()))
        .await
        .unwrap();

    assert!(response.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_handler_error_surfaces_from_dispatch() {
    let mut router = Router::new(Container::new());
    router
        .get(
            "/broken",
            handler(|_req| async {
                Err::<HttpResponse, _>(Error::Internal("kaput".to_string()))
            }),
        )
        .unwrap();

    let result = router
        .dispatch(HttpRequest::new("GET".to_string(), "/broken".to_string()))
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.status_code(), 500);
}

// Routing system for HTTP requests

use crate::logging::debug;
use crate::{
    Container, Error, HandlerFn, HttpMethod, HttpRequest, HttpResponse, Middleware,
    MiddlewareChain, RouteAction, RoutePattern,
};
use std::sync::Arc;

/// Route definition: verb, pattern, action, and route-specific middleware
pub struct Route {
    pub method: HttpMethod,
    pub pattern: RoutePattern,
    pub action: RouteAction,
    pub middleware: Vec<Arc<dyn Middleware>>,
}

/// Router owning the route table and the global middleware list.
///
/// The route table is an insertion-ordered sequence: dispatch tries routes
/// in registration order and the first structural match wins, so specific
/// literal routes must be registered before parameterized catch-alls that
/// would shadow them.
pub struct Router {
    pub routes: Vec<Route>,
    global_middleware: Vec<Arc<dyn Middleware>>,
    container: Container,
}

impl Router {
    pub fn new(container: Container) -> Self {
        Self {
            routes: Vec::new(),
            global_middleware: Vec::new(),
            container,
        }
    }

    /// The container used to resolve controllers and their dependencies
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Add a pre-built route to the table
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Register a route with explicit middleware.
    ///
    /// Fails on a malformed pattern; registration happens during startup
    /// composition, so the error aborts composition rather than surfacing
    /// mid-request.
    pub fn route(
        &mut self,
        method: HttpMethod,
        pattern: &str,
        action: RouteAction,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<(), Error> {
        let pattern = RoutePattern::parse(pattern)?;
        self.routes.push(Route {
            method,
            pattern,
            action,
            middleware,
        });
        Ok(())
    }

    pub fn get(&mut self, pattern: &str, action: RouteAction) -> Result<(), Error> {
        self.route(HttpMethod::GET, pattern, action, Vec::new())
    }

    pub fn post(&mut self, pattern: &str, action: RouteAction) -> Result<(), Error> {
        self.route(HttpMethod::POST, pattern, action, Vec::new())
    }

    pub fn put(&mut self, pattern: &str, action: RouteAction) -> Result<(), Error> {
        self.route(HttpMethod::PUT, pattern, action, Vec::new())
    }

    pub fn delete(&mut self, pattern: &str, action: RouteAction) -> Result<(), Error> {
        self.route(HttpMethod::DELETE, pattern, action, Vec::new())
    }

    /// Append a middleware applied to every route, ahead of route-specific
    /// middleware, in registration order
    pub fn add_global_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        self.global_middleware.push(Arc::new(middleware));
    }

    /// Dispatch a request through route matching, the middleware chain, and
    /// the matched action.
    ///
    /// An unmatched request is not an error: it yields a 404 response. `Err`
    /// is reserved for configuration faults (failed controller resolution)
    /// and errors raised by handlers themselves.
    pub async fn dispatch(&self, mut request: HttpRequest) -> Result<HttpResponse, Error> {
        for route in &self.routes {
            if route.method.as_str() != request.method {
                continue;
            }

            let Some(params) = route.pattern.matches(&request.path) else {
                continue;
            };

            debug!(
                method = %request.method,
                path = %request.path,
                pattern = %route.pattern,
                "Route matched"
            );
            request.path_params = params;

            let chain = MiddlewareChain::from_list(
                self.global_middleware
                    .iter()
                    .chain(route.middleware.iter())
                    .cloned()
                    .collect(),
            );

            let action = route.action.clone();
            let container = self.container.clone();
            let terminal: HandlerFn =
                Arc::new(move |req| action.invoke(container.clone(), req));

            return chain.apply(request, terminal).await;
        }

        debug!(method = %request.method, path = %request.path, "No route matched");
        Ok(HttpResponse::not_found().with_text("Not Found"))
    }
}

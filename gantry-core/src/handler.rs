// Route actions and the controller invocation adapter

use crate::logging::trace;
use crate::{Container, Error, HttpRequest, HttpResponse, Injectable, IntoResponse};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for type-erased async route handlers
pub type HandlerFn = Arc<
    dyn Fn(HttpRequest) -> Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>
        + Send
        + Sync,
>;

type ControllerInvokeFn = Arc<
    dyn Fn(
            Container,
            HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>
        + Send
        + Sync,
>;

/// What a route runs when it matches.
///
/// A closed variant: either a plain async function, or a controller method
/// resolved through the container at dispatch time. There is no dynamic
/// third form; anything else is rejected at the type level.
#[derive(Clone)]
pub enum RouteAction {
    /// A directly-invocable handler function
    Handler(HandlerFn),
    /// A controller method, resolved through the container
    Controller(ControllerMethod),
}

impl RouteAction {
    /// Build an action from a controller method binding
    pub fn controller<C, F, Fut, R>(
        method_name: &'static str,
        method: F,
    ) -> Result<Self, Error>
    where
        C: Injectable,
        F: Fn(Arc<C>, HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, Error>> + Send + 'static,
        R: IntoResponse,
    {
        Ok(RouteAction::Controller(ControllerMethod::bind::<C, F, Fut, R>(
            method_name,
            method,
        )?))
    }

    /// Invoke the action, normalizing its result into a response
    pub fn invoke(
        &self,
        container: Container,
        req: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>> {
        match self {
            RouteAction::Handler(f) => f(req),
            RouteAction::Controller(method) => method.invoke(container, req),
        }
    }
}

/// Wrap an async function as a route action.
///
/// The function's return value is normalized through [`IntoResponse`], so
/// handlers may return responses, strings, or JSON-able values directly.
pub fn handler<F, Fut, R>(f: F) -> RouteAction
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
    R: IntoResponse,
{
    RouteAction::Handler(Arc::new(move |req| {
        let fut = f(req);
        Box::pin(async move { fut.await.and_then(IntoResponse::into_response) })
    }))
}

/// A controller method bound to its controller type.
///
/// At dispatch time the controller is resolved through the container
/// (auto-wiring its dependencies if it has no binding) and the bound method
/// is called with the request.
#[derive(Clone)]
pub struct ControllerMethod {
    controller_name: &'static str,
    method_name: &'static str,
    invoke: ControllerInvokeFn,
}

impl ControllerMethod {
    /// Bind a method on controller type `C`.
    ///
    /// The method name is carried for diagnostics only; an empty name is a
    /// configuration error.
    pub fn bind<C, F, Fut, R>(method_name: &'static str, method: F) -> Result<Self, Error>
    where
        C: Injectable,
        F: Fn(Arc<C>, HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, Error>> + Send + 'static,
        R: IntoResponse,
    {
        let controller_name = std::any::type_name::<C>();
        if method_name.is_empty() {
            return Err(Error::InvalidRouteAction(format!(
                "empty method name for controller {}",
                controller_name
            )));
        }

        let invoke: ControllerInvokeFn = Arc::new(move |container: Container, req: HttpRequest| {
            trace!(
                controller = controller_name,
                method = method_name,
                "Invoking controller method"
            );

            let fut: Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>> =
                match container.resolve_or_build::<C>() {
                    Ok(controller) => {
                        let call = method(controller, req);
                        Box::pin(async move { call.await.and_then(IntoResponse::into_response) })
                    }
                    Err(err) => Box::pin(async move { Err(err) }),
                };
            fut
        });

        Ok(Self {
            controller_name,
            method_name,
            invoke,
        })
    }

    /// The controller's type name
    pub fn controller_name(&self) -> &'static str {
        self.controller_name
    }

    /// The bound method's name
    pub fn method_name(&self) -> &'static str {
        self.method_name
    }

    /// Resolve the controller and run the bound method
    pub fn invoke(
        &self,
        container: Container,
        req: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>> {
        (self.invoke)(container, req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct EchoController {
        prefix: String,
    }

    impl Injectable for EchoController {
        fn construct(_container: &Container) -> Result<Self, Error> {
            Ok(Self {
                prefix: "echo".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_handler_normalizes_string() {
        let action = handler(|_req| async { Ok("hello".to_string()) });
        let req = HttpRequest::new("GET".to_string(), "/".to_string());

        let response = action.invoke(Container::new(), req).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body_ref(), b"hello");
    }

    #[tokio::test]
    async fn test_controller_method_auto_builds() {
        let action = RouteAction::controller::<EchoController, _, _, _>("show", |c, req| {
            let id = req.param("id").cloned().unwrap_or_default();
            async move { Ok(format!("{}:{}", c.prefix, id)) }
        })
        .unwrap();

        let mut req = HttpRequest::new("GET".to_string(), "/items/5".to_string());
        req.path_params.insert("id".to_string(), "5".to_string());

        let response = action.invoke(Container::new(), req).await.unwrap();
        assert_eq!(response.body_ref(), b"echo:5");
    }

    #[tokio::test]
    async fn test_controller_method_uses_registered_instance() {
        let container = Container::new();
        container.register(EchoController {
            prefix: "registered".to_string(),
        });

        let action = RouteAction::controller::<EchoController, _, _, _>("show", |c, _req| {
            async move { Ok(c.prefix.clone()) }
        })
        .unwrap();

        let req = HttpRequest::new("GET".to_string(), "/".to_string());
        let response = action.invoke(container, req).await.unwrap();
        assert_eq!(response.body_ref(), b"registered");
    }

    #[test]
    fn test_empty_method_name_rejected() {
        let result = ControllerMethod::bind::<EchoController, _, _, _>("", |_c, _req| async {
            Ok(HttpResponse::ok())
        });
        assert!(matches!(result, Err(Error::InvalidRouteAction(_))));
    }
}

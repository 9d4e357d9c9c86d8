// Core traits for the Gantry framework

use crate::{Container, Error};

/// Marker for types that can live in the DI container.
///
/// Blanket-implemented for every `Send + Sync + 'static` type, so services
/// need no boilerplate to become container-manageable.
pub trait Provider: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Provider for T {}

/// Trait for types the container can construct on demand.
///
/// `construct` is the compile-time counterpart of constructor auto-wiring:
/// each injectable type resolves its own dependencies from the container
/// (typically via [`Container::resolve`] or [`Container::resolve_or_build`]).
///
/// Cycles between injectable types are not detected; a cyclic graph will
/// recurse until the stack overflows.
pub trait Injectable: Provider + Sized {
    /// Build an instance, resolving dependencies from the container
    fn construct(container: &Container) -> Result<Self, Error>;
}

/// HTTP methods
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
}

impl HttpMethod {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "HEAD" => Some(HttpMethod::HEAD),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

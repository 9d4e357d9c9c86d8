// Tests for dependency auto-wiring

use gantry_core::{Container, Error, Injectable};
use std::sync::Arc;

#[derive(Clone)]
struct ConfigService {
    base_url: String,
}

impl Injectable for ConfigService {
    fn construct(_container: &Container) -> Result<Self, Error> {
        Ok(Self {
            base_url: "http://localhost".to_string(),
        })
    }
}

struct ProductRepository {
    config: Arc<ConfigService>,
}

impl Injectable for ProductRepository {
    fn construct(container: &Container) -> Result<Self, Error> {
        Ok(Self {
            config: container.resolve_or_build::<ConfigService>()?,
        })
    }
}

struct ProductService {
    repository: Arc<ProductRepository>,
}

impl Injectable for ProductService {
    fn construct(container: &Container) -> Result<Self, Error> {
        Ok(Self {
            repository: container.resolve_or_build::<ProductRepository>()?,
        })
    }
}

#[derive(Clone)]
struct CacheSettings {
    ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_seconds: 60 }
    }
}

struct CacheService {
    settings: Arc<CacheSettings>,
}

impl Injectable for CacheService {
    fn construct(container: &Container) -> Result<Self, Error> {
        // Settings are optional wiring: fall back to defaults when unbound
        Ok(Self {
            settings: container.resolve_or_default::<CacheSettings>(),
        })
    }
}

#[test]
fn test_build_constructs_dependency_graph() {
    let container = Container::new();

    let service = container.build::<ProductService>().unwrap();
    assert_eq!(service.repository.config.base_url, "http://localhost");
}

#[test]
fn test_resolve_or_build_prefers_registered_instance() {
    let container = Container::new();
    container.register(ConfigService {
        base_url: "https://prod.example.com".to_string(),
    });

    let service = container.build::<ProductService>().unwrap();
    assert_eq!(
        service.repository.config.base_url,
        "https://prod.example.com"
    );
}

#[test]
fn test_autowire_singleton_shares_instance_across_builds() {
    let container = Container::new();
    container.autowire_singleton::<ConfigService>();

    let first = container.build::<ProductRepository>().unwrap();
    let second = container.build::<ProductRepository>().unwrap();

    assert!(Arc::ptr_eq(&first.config, &second.config));
}

#[test]
fn test_autowire_transient_builds_fresh_instances() {
    let container = Container::new();
    container.autowire::<ConfigService>();

    let first = container.resolve::<ConfigService>().unwrap();
    let second = container.resolve::<ConfigService>().unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_default_fallback_when_dependency_unbound() {
    let container = Container::new();

    let cache = container.build::<CacheService>().unwrap();
    assert_eq!(cache.settings.ttl_seconds, 60);
}

#[test]
fn test_default_fallback_prefers_registered_value() {
    let container = Container::new();
    container.register(CacheSettings { ttl_seconds: 300 });

    let cache = container.build::<CacheService>().unwrap();
    assert_eq!(cache.settings.ttl_seconds, 300);
}

#[test]
fn test_construct_error_propagates_through_graph() {
    struct FailingDependency;

    impl Injectable for FailingDependency {
        fn construct(_container: &Container) -> Result<Self, Error> {
            Err(Error::DependencyInjection(
                "database url missing".to_string(),
            ))
        }
    }

    struct NeedsFailing {
        _dep: Arc<FailingDependency>,
    }

    impl Injectable for NeedsFailing {
        fn construct(container: &Container) -> Result<Self, Error> {
            Ok(Self {
                _dep: container.resolve_or_build::<FailingDependency>()?,
            })
        }
    }

    let container = Container::new();
    let result = container.build::<NeedsFailing>();
    assert!(matches!(result, Err(Error::DependencyInjection(_))));
}

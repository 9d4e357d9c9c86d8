// Gantry - a dependency-injection HTTP framework for Rust
//
// This library provides a container-driven approach to building HTTP
// applications: services declare their dependencies, routes bind handlers or
// controller methods, and middleware composes around dispatch.

// Re-export core functionality
pub use gantry_core::*;

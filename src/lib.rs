#![warn(
    clippy::pedantic,
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    rust_2021_compatibility
)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

//! `Proxetta` generates JVM proxy classes by weaving advice bytecode around the methods of a
//! target class.
//!
//! A proxy is either a subclass of the target (see [`ProxyMode::Subclass`](proxy::ProxyMode))
//! or a wrapper that holds the target in a field and delegates to it
//! (see [`ProxyMode::Wrapper`](proxy::ProxyMode)).
//! Advices are ordinary compiled classes whose `execute()` method is copied into the proxy,
//! with calls to `ProxyTarget` placeholders replaced by code specific to each woven method.
//!
//! ```no_run
//! use proxetta::jvm::class_loader::{ClassLoader, class_paths::DirectoryClassPath};
//! use proxetta::proxy::{Aspect, Proxetta, ProxyRequest, pointcut};
//!
//! let loader = ClassLoader::new(vec![DirectoryClassPath::new("target/classes")]).into_cached();
//! let proxetta = Proxetta::new(&loader)
//!     .with_aspect(Aspect::new("org/example/LogAdvice", pointcut::all_public_methods()));
//! let proxy = proxetta
//!     .build(&ProxyRequest::subclass("org/example/Service"))
//!     .unwrap()
//!     .expect("at least one method is woven");
//! std::fs::write("Service$$Proxetta.class", proxy.bytes).unwrap();
//! ```
//! ## Features
#![doc = document_features::document_features!()]

pub mod jvm;
pub(crate) mod macros;
pub mod proxy;
pub mod types;

/// Test utilities
#[cfg(test)]
pub mod tests;

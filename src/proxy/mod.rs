//! Weaving advices into proxy classes.
//!
//! A [`Proxetta`] holds an ordered list of [`Aspect`]s. For each [`ProxyRequest`] it loads the
//! target class and its hierarchy, selects the methods matched by the pointcuts, and emits a
//! class where each matched method runs the `execute()` bodies of the matching advices, the
//! first aspect outermost, before reaching the target method.

use std::{fs, path::Path};

use log::{debug, trace, warn};

use crate::jvm::{
    class_loader::{CachingClassLoader, ClassPath},
    references::ClassRef,
};

mod advice;
mod asm_util;
mod aspect;
mod class_model;
pub mod config;
mod context;
mod errors;
mod intrinsics;
pub mod pointcut;
mod rewriter;
mod signature;
mod type_descriptor;
mod weaver;

pub use advice::AdviceCache;
pub use aspect::Aspect;
pub use class_model::ClassModel;
pub use config::{ProxettaConfig, ProxyNames};
pub use errors::{Error, ErrorKind};
pub use intrinsics::{PROXY_TARGET, PROXY_TARGET_INFO};
pub use pointcut::{Pointcut, PointcutExt};
pub use signature::{Argument, MethodSignature};
pub use type_descriptor::{OpcodeTag, TypeDescriptor};

use advice::AdviceData;
use aspect::AspectBinding;
use context::{WeavingContext, WrapperField};
use errors::{ErrorContext, WeavingErrorContext};
use weaver::wrapper::WrapperOptions;

/// How a proxy reaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyMode {
    /// The proxy extends the target and calls the overridden methods with `invokespecial`.
    Subclass,
    /// The proxy holds the target in a field and calls it through that field.
    Wrapper,
}

/// A target class and how to proxy it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    target: String,
    mode: ProxyMode,
    class_name: Option<String>,
    interface: Option<String>,
    target_field: Option<String>,
    create_target: bool,
}

impl ProxyRequest {
    fn new(target: &str, mode: ProxyMode) -> Self {
        Self {
            target: target.replace('.', "/"),
            mode,
            class_name: None,
            interface: None,
            target_field: None,
            create_target: false,
        }
    }

    /// Requests a subclass of `target`, given by its binary or Java name.
    #[must_use]
    pub fn subclass(target: &str) -> Self {
        Self::new(target, ProxyMode::Subclass)
    }

    /// Requests a wrapper of `target`, given by its binary or Java name.
    #[must_use]
    pub fn wrapper(target: &str) -> Self {
        Self::new(target, ProxyMode::Wrapper)
    }

    /// Names the proxy in Java notation. The configured suffix is still appended.
    ///
    /// A name starting with `.` is placed in the package of the target, and a name ending
    /// with `.` is a package in which the proxy takes the simple name of the target.
    #[must_use]
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Sets the interface implemented by a wrapper of a class.
    #[must_use]
    pub fn with_interface(mut self, interface: &str) -> Self {
        self.interface = Some(interface.replace('.', "/"));
        self
    }

    /// Overrides [`ProxyNames::wrapper_target_field`] for this request.
    #[must_use]
    pub fn with_target_field(mut self, name: impl Into<String>) -> Self {
        self.target_field = Some(name.into());
        self
    }

    /// Makes the wrapper constructor create the target with its no-argument constructor.
    /// The target field is then private and final.
    #[must_use]
    pub fn create_target_in_default_constructor(mut self, create: bool) -> Self {
        self.create_target = create;
        self
    }

    /// Returns the binary name of the target.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the mode of the proxy.
    #[must_use]
    pub const fn mode(&self) -> ProxyMode {
        self.mode
    }
}

/// A generated class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyClass {
    /// The binary name of the class.
    pub name: String,
    /// The class file.
    pub bytes: Vec<u8>,
}

impl ProxyClass {
    /// Returns the name of the class in Java notation.
    #[must_use]
    pub fn java_name(&self) -> String {
        self.name.replace('/', ".")
    }
}

/// Creates proxies of classes found through a class loader.
#[derive(Debug)]
pub struct Proxetta<'a, P> {
    loader: &'a CachingClassLoader<P>,
    aspects: Vec<Aspect>,
    config: ProxettaConfig,
    advice_cache: &'a AdviceCache,
}

impl<'a, P: ClassPath> Proxetta<'a, P> {
    /// Creates a [`Proxetta`] without aspects, using the [global](AdviceCache::global) advice
    /// cache.
    #[must_use]
    pub fn new(loader: &'a CachingClassLoader<P>) -> Self {
        Self {
            loader,
            aspects: Vec::new(),
            config: ProxettaConfig::default(),
            advice_cache: AdviceCache::global(),
        }
    }

    /// Adds an aspect after the existing ones.
    #[must_use]
    pub fn with_aspect(mut self, aspect: Aspect) -> Self {
        self.aspects.push(aspect);
        self
    }

    /// Adds aspects after the existing ones.
    #[must_use]
    pub fn with_aspects(mut self, aspects: impl IntoIterator<Item = Aspect>) -> Self {
        self.aspects.extend(aspects);
        self
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ProxettaConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses `cache` instead of the global advice cache.
    #[must_use]
    pub fn with_advice_cache(mut self, cache: &'a AdviceCache) -> Self {
        self.advice_cache = cache;
        self
    }

    /// Returns the aspects in the order they are applied.
    #[must_use]
    pub fn aspects(&self) -> &[Aspect] {
        &self.aspects
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ProxettaConfig {
        &self.config
    }

    /// Builds the proxy class of `request`.
    ///
    /// Returns `Ok(None)` if a subclass proxy would not override any method and the
    /// configuration does not [force](ProxettaConfig::forced) its creation.
    ///
    /// # Errors
    /// See [`ErrorKind`]. Nothing is produced when an error occurs.
    pub fn build(&self, request: &ProxyRequest) -> Result<Option<ProxyClass>, Error> {
        let target = request.target();
        debug!("processing: {target}");
        let model = ClassModel::build(target, self.loader).for_target(target)?;
        let proxy_name = self.proxy_name(request, &model);
        let bindings = self.bind_aspects(target)?;
        let names = &self.config.names;

        let wrapper = (request.mode == ProxyMode::Wrapper).then(|| WrapperField {
            name: request
                .target_field
                .clone()
                .unwrap_or_else(|| names.wrapper_target_field.clone()),
            target: ClassRef::new(target),
            target_is_interface: model.target().is_interface(),
        });
        let mut context = WeavingContext::new(&model, names, proxy_name, wrapper);
        let header = match request.mode {
            ProxyMode::Subclass => weaver::subclass::weave(&mut context, &bindings)?,
            ProxyMode::Wrapper => {
                let options = WrapperOptions {
                    interface: request.interface.clone(),
                    create_target: request.create_target,
                };
                weaver::wrapper::weave(&mut context, &bindings, &options)?
            }
        };

        let applied = request.mode == ProxyMode::Wrapper || context.any_method_woven;
        if !applied && !self.config.forced {
            debug!("proxy not applied: {target}");
            return Ok(None);
        }
        trace!(
            "{} field(s) and {} method(s) generated",
            context.fields.len(),
            context.methods.len()
        );
        context.check_members().for_target(target)?;
        let class = context.into_class(header.access_flags, header.super_class, header.interfaces);
        let name = class.binary_name.clone();
        let bytes = class
            .to_bytes()
            .map_err(ErrorKind::from)
            .for_target(target)?;
        let proxy = ProxyClass { name, bytes };
        if let Some(folder) = &self.config.debug_folder {
            dump(folder, &proxy);
        }
        debug!("proxy created: {}", proxy.java_name());
        Ok(Some(proxy))
    }

    fn bind_aspects(&self, target: &str) -> Result<Vec<AspectBinding<'_>>, Error> {
        self.aspects
            .iter()
            .enumerate()
            .map(|(index, aspect)| {
                let name = aspect.advice();
                let advice = self
                    .advice_cache
                    .get_or_try_insert_with(name, || {
                        self.loader
                            .load_class(name)
                            .map_err(|e| ErrorKind::class_resolution(name, e))
                    })
                    .and_then(|class| AdviceData::new(class, index, &self.config.names))
                    .for_target(target)
                    .in_advice(name)?;
                Ok(AspectBinding { aspect, advice })
            })
            .collect()
    }

    fn proxy_name(&self, request: &ProxyRequest, model: &ClassModel) -> String {
        let suffix = self.config.class_name_suffix.as_deref().unwrap_or(match request.mode {
            ProxyMode::Subclass => config::SUBCLASS_SUFFIX,
            ProxyMode::Wrapper => config::WRAPPER_SUFFIX,
        });
        let mut name = match &request.class_name {
            None => model.name().to_owned(),
            Some(requested) => {
                let mut java_name = requested.clone();
                if java_name.starts_with('.') {
                    java_name.insert_str(0, &model.package_name());
                }
                if java_name.ends_with('.') {
                    java_name.push_str(&model.simple_name());
                }
                java_name.trim_start_matches('.').replace('.', "/")
            }
        };
        name.push_str(suffix);
        if self.config.variable_class_name {
            name.push_str(&config::next_class_number().to_string());
        }
        name
    }
}

/// Writes `proxy` to `<folder>/<java name>.class`. Failures are only logged.
fn dump(folder: &Path, proxy: &ProxyClass) {
    if !folder.is_dir() {
        warn!("debug folder {} is not a directory", folder.display());
        return;
    }
    let path = folder.join(format!("{}.class", proxy.java_name()));
    match fs::write(&path, &proxy.bytes) {
        Ok(()) => debug!("proxy dumped: {}", path.display()),
        Err(e) => warn!("unable to dump {}: {e}", path.display()),
    }
}

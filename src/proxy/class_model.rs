//! The methods a proxy can override, collected from the hierarchy of the target class.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
};

use log::trace;

use super::{ErrorKind, signature::MethodSignature};
use crate::jvm::{
    Annotation, Class,
    bytecode::ParseError,
    class_loader::{self, CachingClassLoader, ClassPath},
    method,
};

/// The target class of a proxy request and every method visible through its hierarchy.
#[derive(Debug)]
pub struct ClassModel {
    target: Arc<Class>,
    super_chain: Vec<String>,
    all_interfaces: Vec<String>,
    methods: Vec<MethodSignature>,
    index: HashMap<String, usize>,
    constructors: Vec<MethodSignature>,
    class_annotations: Arc<[Annotation]>,
}

impl ClassModel {
    /// Loads `target` and its ancestors and collects their methods.
    ///
    /// The methods of the target come first, in declaration order, followed by the methods
    /// inherited from super classes and then those inherited from interfaces. An inherited
    /// method is only collected if no class closer to the target declares a method with the
    /// same name and descriptor.
    ///
    /// # Errors
    /// - [`ErrorKind::ClassResolution`] if the target or one of its ancestors cannot be loaded.
    /// - [`ErrorKind::MalformedSignature`] if a loaded class has a malformed descriptor, or a
    ///   collected method has a malformed generic signature.
    pub fn build<P: ClassPath>(
        target: &str,
        loader: &CachingClassLoader<P>,
    ) -> Result<Self, ErrorKind> {
        let load = |name: &str| {
            loader.load_class(name).map_err(|e| match e {
                class_loader::Error::Malformed(ParseError::Descriptor(message)) => {
                    ErrorKind::MalformedSignature(format!("{name}: {message}"))
                }
                e => ErrorKind::class_resolution(name, e),
            })
        };
        let target_class = load(target)?;
        let class_annotations: Arc<[Annotation]> =
            target_class.annotations().cloned().collect();

        let mut model = Self {
            target: Arc::clone(&target_class),
            super_chain: Vec::new(),
            all_interfaces: Vec::new(),
            methods: Vec::new(),
            index: HashMap::new(),
            constructors: Vec::new(),
            class_annotations,
        };
        let mut seen = HashSet::new();

        for (i, method) in target_class.methods.iter().enumerate() {
            if method.access_flags.contains(method::AccessFlags::PRIVATE)
                || method.is_static_initializer_block()
            {
                continue;
            }
            let signature = model.decode(&target_class, i)?;
            if method.is_constructor() {
                model.constructors.push(signature);
            } else {
                seen.insert(signature.clean_signature());
                model.insert(signature);
            }
        }

        let mut interface_queue: VecDeque<String> = target_class
            .interfaces
            .iter()
            .map(|it| it.binary_name.clone())
            .collect();
        let mut super_name = target_class.super_class.clone();
        while let Some(super_ref) = super_name {
            let super_class = load(&super_ref.binary_name)?;
            model.super_chain.push(super_class.binary_name.clone());
            for (i, method) in super_class.methods.iter().enumerate() {
                let flags = method.access_flags;
                if !flags.contains(method::AccessFlags::PUBLIC)
                    || flags.contains(method::AccessFlags::FINAL)
                    || method.is_constructor()
                    || method.is_static_initializer_block()
                {
                    continue;
                }
                let signature = model.decode(&super_class, i)?;
                if seen.insert(signature.clean_signature()) {
                    model.insert(signature);
                }
            }
            interface_queue.extend(
                super_class
                    .interfaces
                    .iter()
                    .map(|it| it.binary_name.clone()),
            );
            super_name = super_class.super_class.clone();
        }

        let mut visited = HashSet::new();
        while let Some(interface_name) = interface_queue.pop_front() {
            if !visited.insert(interface_name.clone()) {
                continue;
            }
            let interface = load(&interface_name)?;
            model.all_interfaces.push(interface_name);
            for (i, method) in interface.methods.iter().enumerate() {
                let flags = method.access_flags;
                if !flags.contains(method::AccessFlags::PUBLIC)
                    || flags.contains(method::AccessFlags::STATIC)
                    || method.is_static_initializer_block()
                {
                    continue;
                }
                let signature = model.decode(&interface, i)?;
                if seen.insert(signature.clean_signature()) {
                    model.insert(signature);
                }
            }
            interface_queue.extend(interface.interfaces.iter().map(|it| it.binary_name.clone()));
        }

        trace!(
            "class model of {target}: {} method(s), {} constructor(s)",
            model.methods.len(),
            model.constructors.len()
        );
        Ok(model)
    }

    fn decode(&self, class: &Arc<Class>, method_index: usize) -> Result<MethodSignature, ErrorKind> {
        MethodSignature::decode(
            class,
            method_index,
            &self.target.binary_name,
            Arc::clone(&self.class_annotations),
        )
    }

    fn insert(&mut self, signature: MethodSignature) {
        self.index.insert(signature.key(), self.methods.len());
        self.methods.push(signature);
    }

    /// Returns the target class.
    #[must_use]
    pub fn target(&self) -> &Arc<Class> {
        &self.target
    }

    /// Returns the binary name of the target class.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.target.binary_name
    }

    /// Returns the package of the target class in Java notation, e.g., `org.pkg`.
    #[must_use]
    pub fn package_name(&self) -> String {
        self.target.make_ref().package().replace('/', ".")
    }

    /// Returns the simple name of the target class.
    #[must_use]
    pub fn simple_name(&self) -> String {
        self.target.make_ref().simple_name().to_owned()
    }

    /// Returns the super classes of the target, nearest first.
    #[must_use]
    pub fn super_chain(&self) -> &[String] {
        &self.super_chain
    }

    /// Returns every interface implemented directly or indirectly by the target, breadth
    /// first.
    #[must_use]
    pub fn all_interfaces(&self) -> &[String] {
        &self.all_interfaces
    }

    /// Returns the collected methods in a stable order.
    #[must_use]
    pub fn methods(&self) -> &[MethodSignature] {
        &self.methods
    }

    /// Returns the non-private constructors of the target.
    #[must_use]
    pub fn constructors(&self) -> &[MethodSignature] {
        &self.constructors
    }

    /// Returns the annotations of the target class.
    #[must_use]
    pub fn class_annotations(&self) -> &[Annotation] {
        &self.class_annotations
    }

    /// Looks up a method by its access flags, name, descriptor and declaring class.
    #[must_use]
    pub fn lookup(
        &self,
        access_flags: method::AccessFlags,
        name: &str,
        descriptor: &str,
        declaring_class: &str,
    ) -> Option<&MethodSignature> {
        let key = super::signature::signature_key(access_flags, name, descriptor, declaring_class);
        self.index.get(&key).map(|&i| &self.methods[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        jvm::{
            class,
            class_loader::{ClassLoader, class_paths::MemoryClassPath},
        },
        tests::{class_bytes, method_stub, test_loader},
    };

    fn loader(classes: Vec<Class>) -> CachingClassLoader<MemoryClassPath> {
        test_loader(classes)
    }

    fn class(name: &str, super_name: &str, methods: Vec<crate::jvm::Method>) -> Class {
        Class {
            binary_name: name.to_owned(),
            access_flags: class::AccessFlags::PUBLIC | class::AccessFlags::SUPER,
            super_class: Some(crate::jvm::references::ClassRef::new(super_name)),
            methods,
            ..Class::default()
        }
    }

    #[test]
    fn overridden_methods_appear_once() {
        let public = method::AccessFlags::PUBLIC;
        let base = class(
            "org/pkg/Base",
            "java/lang/Object",
            vec![
                method_stub("org/pkg/Base", "<init>", "()V", public),
                method_stub("org/pkg/Base", "run", "()V", public),
                method_stub("org/pkg/Base", "stop", "()V", public),
                method_stub("org/pkg/Base", "locked", "()V", public | method::AccessFlags::FINAL),
                method_stub("org/pkg/Base", "hidden", "()V", method::AccessFlags::PROTECTED),
            ],
        );
        let service = class(
            "org/pkg/Service",
            "org/pkg/Base",
            vec![
                method_stub("org/pkg/Service", "<init>", "(I)V", public),
                method_stub("org/pkg/Service", "<init>", "()V", method::AccessFlags::PRIVATE),
                method_stub("org/pkg/Service", "run", "()V", public),
                method_stub("org/pkg/Service", "helper", "()V", method::AccessFlags::PRIVATE),
                method_stub("org/pkg/Service", "done", "()I", public | method::AccessFlags::FINAL),
            ],
        );
        let loader = loader(vec![base, service]);
        let model = ClassModel::build("org/pkg/Service", &loader).unwrap();

        let names: Vec<_> = model
            .methods()
            .iter()
            .map(|it| format!("{}.{}", it.declaring_class_name(), it.name()))
            .collect();
        assert_eq!(
            names,
            [
                "org/pkg/Service.run",
                "org/pkg/Service.done",
                "org/pkg/Base.stop",
                "java/lang/Object.hashCode",
                "java/lang/Object.equals",
                "java/lang/Object.toString",
            ]
        );
        assert_eq!(model.constructors().len(), 1);
        assert_eq!(model.super_chain(), ["org/pkg/Base", "java/lang/Object"]);
        assert!(model.methods()[1].is_final());
        assert!(model
            .lookup(public, "stop", "()V", "org/pkg/Base")
            .is_some_and(|it| !it.is_top_level_method()));
        assert!(model.lookup(public, "run", "()V", "org/pkg/Base").is_none());
        assert_eq!(model.package_name(), "org.pkg");
        assert_eq!(model.simple_name(), "Service");
    }

    #[test]
    fn interfaces_are_walked_once() {
        let public = method::AccessFlags::PUBLIC;
        let abstract_public = public | method::AccessFlags::ABSTRACT;
        let interface = |name: &str, parents: &[&str], methods| Class {
            binary_name: name.to_owned(),
            access_flags: class::AccessFlags::PUBLIC
                | class::AccessFlags::INTERFACE
                | class::AccessFlags::ABSTRACT,
            interfaces: parents.iter().map(|it| crate::jvm::references::ClassRef::new(*it)).collect(),
            methods,
            ..Class::default()
        };
        let named = interface(
            "org/pkg/Named",
            &[],
            vec![method_stub("org/pkg/Named", "name", "()Ljava/lang/String;", abstract_public)],
        );
        let runnable = interface(
            "org/pkg/Task",
            &["org/pkg/Named"],
            vec![
                method_stub("org/pkg/Task", "run", "()V", abstract_public),
                method_stub(
                    "org/pkg/Task",
                    "of",
                    "()Lorg/pkg/Task;",
                    public | method::AccessFlags::STATIC,
                ),
            ],
        );
        let mut service = class(
            "org/pkg/Service",
            "java/lang/Object",
            vec![method_stub("org/pkg/Service", "run", "()V", public)],
        );
        service.interfaces = vec![
            crate::jvm::references::ClassRef::new("org/pkg/Task"),
            crate::jvm::references::ClassRef::new("org/pkg/Named"),
        ];
        let loader = loader(vec![named, runnable, service]);
        let model = ClassModel::build("org/pkg/Service", &loader).unwrap();
        assert_eq!(model.all_interfaces(), ["org/pkg/Task", "org/pkg/Named"]);
        let from_interfaces: Vec<_> = model
            .methods()
            .iter()
            .filter(|it| it.is_interface_context())
            .map(MethodSignature::name)
            .collect();
        assert_eq!(from_interfaces, ["name"]);
    }

    #[test]
    fn void_parameters_are_malformed() {
        let service = class(
            "org/pkg/Service",
            "java/lang/Object",
            vec![method_stub("org/pkg/Service", "run", "(I)V", method::AccessFlags::PUBLIC)],
        );
        let mut bytes = class_bytes(service);
        let at = bytes.windows(4).position(|it| it == b"(I)V").unwrap();
        bytes[at + 1] = b'V';
        let class_path: MemoryClassPath = [("org/pkg/Service", bytes)].into_iter().collect();
        let loader = ClassLoader::new(vec![class_path]).into_cached();

        let err = ClassModel::build("org/pkg/Service", &loader).unwrap_err();
        let ErrorKind::MalformedSignature(message) = &err else {
            panic!("expected a malformed signature, got {err:?}");
        };
        assert!(message.contains("method run"), "{message}");
        assert!(message.contains("(V)V"), "{message}");
    }

    #[test]
    fn missing_ancestor_is_fatal() {
        let loader = loader(vec![class("org/pkg/Service", "org/pkg/Missing", Vec::new())]);
        let err = ClassModel::build("org/pkg/Service", &loader).unwrap_err();
        assert!(matches!(err, ErrorKind::ClassResolution { name, .. } if name == "org/pkg/Missing"));
    }
}

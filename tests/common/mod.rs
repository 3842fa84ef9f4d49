#![allow(dead_code)]

use std::fs;

use proxetta::jvm::{
    Class, Method,
    class::{self, Version},
    class_loader::{CachingClassLoader, ClassLoader, class_paths::MemoryClassPath},
    code::{CodeBuilder, MethodBody, opcodes::RETURN},
    method,
    references::ClassRef,
};

/// The folder holding the compiled Java test data.
pub const TEST_CLASSES: &str = concat!(env!("OUT_DIR"), "/proxetta/java_classes");

fn object_class() -> Class {
    let mut code = CodeBuilder::new();
    code.simple(RETURN);
    let constructor = Method {
        access_flags: method::AccessFlags::PUBLIC,
        name: Method::CONSTRUCTOR_NAME.to_owned(),
        descriptor: "()V".parse().unwrap(),
        owner: ClassRef::new("java/lang/Object"),
        body: Some(code.build(1).unwrap()),
        exceptions: Vec::new(),
        signature: None,
        runtime_visible_annotations: Vec::new(),
        runtime_invisible_annotations: Vec::new(),
        runtime_visible_parameter_annotations: Vec::new(),
        runtime_invisible_parameter_annotations: Vec::new(),
        annotation_default: None,
    };
    Class {
        version: Version::JDK8,
        access_flags: class::AccessFlags::PUBLIC | class::AccessFlags::SUPER,
        binary_name: "java/lang/Object".to_owned(),
        super_class: None,
        methods: vec![constructor],
        ..Class::default()
    }
}

/// A class path with every compiled test class and a minimal `java/lang/Object`.
pub fn test_class_path() -> MemoryClassPath {
    let mut class_path: MemoryClassPath = walkdir::WalkDir::new(TEST_CLASSES)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|it| it.path().extension().is_some_and(|ext| ext == "class"))
        .map(|entry| {
            let relative = entry.path().strip_prefix(TEST_CLASSES).unwrap();
            let binary_name = relative
                .with_extension("")
                .to_str()
                .unwrap()
                .replace(std::path::MAIN_SEPARATOR, "/");
            (binary_name, fs::read(entry.path()).unwrap())
        })
        .collect();
    class_path.insert("java/lang/Object", object_class().to_bytes().unwrap());
    class_path
}

pub fn test_loader() -> CachingClassLoader<MemoryClassPath> {
    ClassLoader::new(vec![test_class_path()]).into_cached()
}

/// Parses a generated class.
pub fn parse(bytes: &[u8]) -> Class {
    Class::from_reader(&mut &bytes[..]).unwrap()
}

pub fn find_method<'c>(class: &'c Class, name: &str) -> &'c Method {
    class
        .methods
        .iter()
        .find(|it| it.name == name)
        .unwrap_or_else(|| panic!("{} has no method {name}", class.binary_name))
}

/// The instructions of a method body as text, without labels.
pub fn listing(body: &MethodBody) -> Vec<String> {
    body.opcodes().map(ToString::to_string).collect()
}

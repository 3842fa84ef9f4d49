use std::cell::Cell;

use proxetta::jvm::{
    Class,
    class_loader::{ClassLoader, ClassPath, Error, class_paths::DirectoryClassPath},
};

mod common;

fn create_test_dir_class_path() -> DirectoryClassPath {
    DirectoryClassPath::new(common::TEST_CLASSES)
}

#[test]
fn load_class() {
    let dir_cp = create_test_dir_class_path();
    let class_loader = ClassLoader::new(vec![&dir_cp]);
    let class = class_loader.load_class("org/proxetta/test/Calculator").unwrap();
    assert_eq!(class.binary_name, "org/proxetta/test/Calculator");
    assert_eq!(
        class.super_class.map(|it| it.binary_name).as_deref(),
        Some("java/lang/Object")
    );
}

#[test]
fn load_absent_class() {
    let dir_cp = create_test_dir_class_path();
    let class_loader = ClassLoader::new(vec![&dir_cp]);
    let class = class_loader.load_class("org/proxetta/test/MyAbsentClass");
    assert!(matches!(class, Err(Error::NotFound(_))));
}

#[test]
fn memory_class_path_holds_compiled_classes() {
    let class_path = common::test_class_path();
    assert!(class_path.contains("org/proxetta/ProxyTarget"));
    assert!(class_path.contains("java/lang/Object"));
    let class = class_path.find_class("org/proxetta/ProxyTargetInfo").unwrap();
    assert_eq!(class.fields.len(), 9);
}

#[derive(Debug)]
struct TestClassPath<'c> {
    inner: DirectoryClassPath,
    counter: &'c Cell<usize>,
}

impl<'c> TestClassPath<'c> {
    fn new(counter: &'c Cell<usize>) -> Self {
        Self {
            inner: create_test_dir_class_path(),
            counter,
        }
    }
}

impl ClassPath for TestClassPath<'_> {
    fn find_class(&self, binary_name: &str) -> Result<Class, Error> {
        self.counter.set(self.counter.get() + 1);
        self.inner.find_class(binary_name)
    }
}

#[test]
fn caching_class_loader_load_once() {
    let counter = Cell::new(0);
    let test_cp = TestClassPath::new(&counter);
    let class_loader = ClassLoader::new(vec![&test_cp]).into_cached();
    for _ in 0..10 {
        let class = class_loader.load_class("org/proxetta/test/Calculator").unwrap();
        assert_eq!(class.binary_name, "org/proxetta/test/Calculator");
    }
    assert_eq!(counter.get(), 1);
    assert!(class_loader.is_cached("org/proxetta/test/Calculator"));
}

#![no_main]

use libfuzzer_sys::fuzz_target;
use proxetta::{
    jvm::class_loader::{ClassLoader, class_paths::MemoryClassPath},
    proxy::ClassModel,
};

fuzz_target!(|data: &[u8]| {
    let class_path: MemoryClassPath = [("org/fuzz/Target", data.to_vec())].into_iter().collect();
    let loader = ClassLoader::new(vec![class_path]).into_cached();
    let _ = ClassModel::build("org/fuzz/Target", &loader);
});

//! Compiles the Java sources under `test_data/proxetta` into `$OUT_DIR/proxetta/java_classes`,
//! where the weaving tests load targets and advices from.

use std::{
    env,
    path::{Path, PathBuf},
    process::Command,
};

const TEST_SUITE: &str = "proxetta";

fn main() {
    println!("cargo::rustc-check-cfg=cfg(integration_test)");
    println!("cargo::rerun-if-env-changed=INTEGRATION_TEST");
    if env::var_os("INTEGRATION_TEST").is_some() {
        println!("cargo::rustc-cfg=integration_test");
    }

    let javac_found = Command::new("javac")
        .arg("-version")
        .output()
        .is_ok_and(|it| it.status.success());
    if !javac_found {
        println!("cargo::warning=javac is not on the PATH, the weaving tests will not build");
        return;
    }

    let source_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join(TEST_SUITE);
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("cargo sets OUT_DIR"));
    javac(&source_root, &out_dir.join(TEST_SUITE).join("java_classes"));
}

fn javac(source_root: &Path, class_dir: &Path) {
    println!("cargo::rerun-if-changed={}", source_root.display());
    let pattern = source_root.join("**").join("*.java");
    let mut sources: Vec<PathBuf> = glob::glob(
        pattern
            .to_str()
            .expect("test_data is not under a UTF-8 path"),
    )
    .expect("invalid glob pattern")
    .filter_map(Result::ok)
    .collect();
    sources.sort();
    for source in &sources {
        println!("cargo::rerun-if-changed={}", source.display());
    }

    let output = Command::new("javac")
        .arg("-g")
        .arg("-encoding")
        .arg("UTF-8")
        .arg("-d")
        .arg(class_dir)
        .args(&sources)
        .current_dir(source_root)
        .output()
        .expect("failed to run javac");
    if !output.status.success() {
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            println!("cargo::warning=javac: {line}");
        }
    }
}

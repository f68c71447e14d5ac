use kernel_info::memory::STAGE1_LOAD_ADDR;
use std::{env, path::PathBuf};

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let ld = manifest_dir.join("stage1.ld");
    println!("cargo:rerun-if-changed={}", ld.display());

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("none") {
        return;
    }

    println!("cargo:rustc-link-arg-bins=-T{}", ld.display());
    println!("cargo:rustc-link-arg-bins=--defsym=STAGE1_LOAD={STAGE1_LOAD_ADDR:#x}");
}

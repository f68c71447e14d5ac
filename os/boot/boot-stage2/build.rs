use kernel_info::memory::{STAGE2_END, STAGE2_LOAD_ADDR};
use std::{env, path::PathBuf};

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let ld = manifest_dir.join("stage2.ld");
    println!("cargo:rerun-if-changed={}", ld.display());

    // Host builds only produce the stub binary.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("none") {
        return;
    }

    assert!(
        STAGE2_END <= 0x1_0000,
        "Stage-2 must stay addressable with CS = 0 (ends at {STAGE2_END:#x})"
    );

    println!("cargo:rustc-link-arg-bins=-T{}", ld.display());
    println!("cargo:rustc-link-arg-bins=--defsym=STAGE2_LOAD={STAGE2_LOAD_ADDR:#x}");
    println!("cargo:rustc-link-arg-bins=--defsym=STAGE2_END={STAGE2_END:#x}");
}

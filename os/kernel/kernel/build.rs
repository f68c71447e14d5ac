use kernel_info::memory::{KERNEL_END, KERNEL_LOAD_ADDR, KERNEL_STACK_SIZE, KERNEL_STACK_TOP};
use std::{env, path::PathBuf};

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let ld = manifest_dir.join("kernel.ld");
    println!("cargo:rerun-if-changed={}", ld.display());

    // Host builds only produce the stub binary.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("none") {
        return;
    }

    assert_eq!(
        KERNEL_LOAD_ADDR & 0xfff,
        0,
        "KERNEL_LOAD must be 4 KiB aligned (got {KERNEL_LOAD_ADDR:#x})"
    );
    assert_eq!(
        KERNEL_STACK_TOP & 0xf,
        0,
        "KERNEL_STACK_TOP must be 16-byte aligned (got {KERNEL_STACK_TOP:#x})"
    );
    let stack_bottom = KERNEL_STACK_TOP - KERNEL_STACK_SIZE as u64;

    println!("cargo:rustc-link-arg-bins=-T{}", ld.display());
    println!("cargo:rustc-link-arg-bins=--defsym=KERNEL_LOAD={KERNEL_LOAD_ADDR:#x}");
    println!("cargo:rustc-link-arg-bins=--defsym=KERNEL_END={KERNEL_END:#x}");
    println!("cargo:rustc-link-arg-bins=--defsym=KERNEL_STACK_TOP={KERNEL_STACK_TOP:#x}");
    println!("cargo:rustc-link-arg-bins=--defsym=KERNEL_STACK_BOTTOM={stack_bottom:#x}");
}

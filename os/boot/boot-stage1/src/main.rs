//! # Stage-1 Boot Sector
//!
//! The BIOS loads this sector to `0x0000:0x7C00` and jumps to it with the
//! boot drive in `DL`. It does exactly one thing: read Stage-2 with a single
//! `INT 13h, AH=42h` call and jump to it, drive number still in `DL`.
//!
//! ```text
//! 0x7C00  _start      segments and stack to 0, DL → [BOOT_DRIVE_ADDR]
//!         ...         INT 13h extended read of STAGE2_SECTORS from STAGE2_LBA
//!         ...         jmp 0x0000:STAGE2_LOAD_ADDR
//!         disk_error  "Stage-1: disk read error", then halt
//! 0x7DFE  0x55 0xAA
//! ```
//!
//! Everything is assembly; the image is built for the `i386-code16-boot`
//! target and linked with `stage1.ld`, which checks the 512-byte size. On
//! the host this binary is an empty stub.

#![cfg_attr(target_os = "none", no_std, no_main)]

#[cfg(target_os = "none")]
mod boot_sector {
    use kernel_info::disk::{MAX_SECTORS_PER_READ, STAGE2_LBA, STAGE2_SECTORS};
    use kernel_info::memory::{BOOT_DRIVE_ADDR, REAL_MODE_STACK_TOP, STAGE2_LOAD_ADDR};

    const _: () = {
        assert!(STAGE2_SECTORS > 0);
        assert!(STAGE2_SECTORS <= MAX_SECTORS_PER_READ);
        // Stage-2 is entered with CS = 0
        assert!(STAGE2_LOAD_ADDR < 0x1_0000);
        assert!(BOOT_DRIVE_ADDR < 0x1_0000);
    };

    core::arch::global_asm!(
        ".section .boot, \"awx\"",
        ".code16",
        ".global _start",
        "_start:",
        "    cli",
        "    xor ax, ax",
        "    mov ds, ax",
        "    mov es, ax",
        "    mov ss, ax",
        "    mov sp, {stack}",
        // some BIOSes enter at 0x07C0:0x0000
        "    .byte 0xEA",
        "    .word stage1_normalized, 0",
        "stage1_normalized:",
        "    sti",
        "    cld",
        "    mov byte ptr [{drive_addr}], dl",

        "    mov si, offset stage1_dap",
        "    mov ah, 0x42",
        "    int 0x13",
        "    jc stage1_disk_error",

        "    mov dl, byte ptr [{drive_addr}]",
        "    .byte 0xEA",
        "    .word {stage2}, 0",

        "stage1_disk_error:",
        "    mov si, offset stage1_message",
        "stage1_print:",
        "    lodsb",
        "    test al, al",
        "    jz stage1_halt",
        "    mov ah, 0x0E",
        "    xor bx, bx",
        "    int 0x10",
        "    jmp stage1_print",
        "stage1_halt:",
        "    cli",
        "    hlt",
        "    jmp stage1_halt",

        ".balign 4",
        "stage1_dap:",
        "    .byte 0x10, 0",
        "    .word {sectors}",
        "    .word {stage2}, 0",
        "    .quad {lba}",

        "stage1_message:",
        "    .asciz \"Stage-1: disk read error\\r\\n\"",

        "    .org 510",
        "    .byte 0x55, 0xAA",

        stack = const REAL_MODE_STACK_TOP,
        drive_addr = const BOOT_DRIVE_ADDR,
        stage2 = const STAGE2_LOAD_ADDR,
        sectors = const STAGE2_SECTORS,
        lba = const STAGE2_LBA,
    );

    #[panic_handler]
    fn panic(_: &core::panic::PanicInfo) -> ! {
        loop {
            core::hint::spin_loop();
        }
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}

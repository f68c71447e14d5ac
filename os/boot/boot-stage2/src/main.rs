//! # Stage-2 Entry Point
//!
//! Stage-1 jumps to `_start` at `0x0000:0x7E00` with the boot drive in `DL`.
//! The image is built for the `i386-code16-boot` target: 32-bit code with
//! operand-size prefixes so it runs in real mode.
//!
//! On the host this binary is an empty stub so the workspace builds and the
//! engine library can be tested.

#![cfg_attr(target_os = "none", no_std, no_main)]
#![allow(unsafe_code)]

#[cfg(target_os = "none")]
mod bios;
#[cfg(target_os = "none")]
mod real_mode;
#[cfg(target_os = "none")]
mod trampoline;

#[cfg(target_os = "none")]
mod entry {
    use crate::bios::Bios;
    use crate::real_mode::RealMode;
    use boot_stage2::{Engine, Firmware, Stage2Config};
    use kernel_hal::Ports;
    use kernel_info::memory::REAL_MODE_STACK_TOP;
    use kernel_qemu::{QemuLogger, qemu_trace};
    use log::LevelFilter;

    core::arch::global_asm!(
        ".section .start, \"ax\"",
        ".code16",
        ".global _start",
        "_start:",
        "    cli",
        "    xorw %ax, %ax",
        "    movw %ax, %ds",
        "    movw %ax, %es",
        "    movw %ax, %ss",
        "    movl ${stack}, %esp",
        "    cld",
        "    sti",
        "    movzbl %dl, %edx",
        "    pushl %edx",
        "    calll stage2_main",
        "5:",
        "    hlt",
        "    jmp 5b",
        stack = const REAL_MODE_STACK_TOP,
        options(att_syntax),
    );

    /// Mirrors log output to the screen.
    fn teletype(text: &str) {
        // SAFETY: only called while still in real mode.
        let mut bios = unsafe { Bios::new() };
        for byte in text.bytes() {
            if byte == b'\n' {
                bios.print_byte(b'\r');
            }
            bios.print_byte(byte);
        }
    }

    #[unsafe(no_mangle)]
    extern "C" fn stage2_main(boot_drive: u32) -> ! {
        if let Err(e) = QemuLogger::new(LevelFilter::Info)
            .with_mirror(teletype)
            .init()
        {
            qemu_trace!("Stage-2 logger unavailable: {e}\n");
        }

        #[allow(clippy::cast_possible_truncation)]
        let boot_drive = boot_drive as u8;
        log::info!("Stage-2 up, boot drive {boot_drive:#04x}");

        // SAFETY: we are in real mode at CPL0 with DS = ES = SS = 0, and these
        // are the only instances.
        let (bios, ports, machine) = unsafe { (Bios::new(), Ports::new(), RealMode::new()) };
        let mut engine = Engine::new(Stage2Config::DEFAULT, boot_drive, bios, ports, machine);
        match engine.prepare() {
            Ok(plan) => engine.enter_kernel(&plan),
            Err(e) => engine.fail(&e),
        }
    }

    #[panic_handler]
    fn panic(info: &core::panic::PanicInfo) -> ! {
        kernel_qemu::qemu_trace!("Stage-2 panic: {info}\n");
        teletype("Stage-2: panic\n");
        loop {
            // SAFETY: nothing left to do.
            unsafe { core::arch::asm!("cli", "hlt", options(nomem, nostack)) }
        }
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}

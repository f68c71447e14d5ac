//! # Kernel Entry Point
//!
//! Stage-2 far-jumps to the first byte of the image with `RDI` holding the
//! Handoff Descriptor Block address and interrupts disabled. [`_start_kernel`]
//! is placed there by the linker script, switches to the kernel stack and
//! tail-jumps into Rust.
//!
//! On the host this binary is an empty stub so the workspace builds and the
//! library can be tested.

#![cfg_attr(target_os = "none", no_std, no_main)]
#![allow(unsafe_code)]

#[cfg(target_os = "none")]
mod entry {
    use kernel::console::{TextConsole, VgaBuffer};
    use kernel::interrupts::{
        Idt, InterruptFrame, IrqTable, Route, STUB_VECTORS, pushes_error_code,
    };
    use kernel::keyboard::{self, KEYBOARD, KEYBOARD_LINE};
    use kernel::pic::{IRQ_BASE, Pic8259};
    use kernel::shell::{self, Action, KeyInterrupts, ShellState};
    use kernel::{StatusReport, Terminal};
    use kernel_hal::Ports;
    use kernel_hal::cpu::{
        disable_interrupts, enable_interrupts, enable_interrupts_and_halt, halt_forever,
    };
    use kernel_info::boot::KernelEntryFn;
    use kernel_info::handoff::HandoffBlock;
    use kernel_info::memory::{
        HANDOFF_CAPACITY, KERNEL_STACK_TOP, TEXT_COLUMNS, TEXT_ROWS, VGA_TEXT_BUFFER,
    };
    use kernel_info::selectors::CODE64;
    use kernel_memory_addresses::PhysicalAddress;
    use kernel_qemu::{QemuLogger, qemu_trace};
    use kernel_sync::SyncOnceCell;
    use log::{LevelFilter, error, info, warn};

    const PIC: Pic8259 = Pic8259::new(IRQ_BASE);

    static IDT: SyncOnceCell<Idt> = SyncOnceCell::new();
    static IRQS: SyncOnceCell<IrqTable> = SyncOnceCell::new();

    /// The kernel entry point.
    ///
    /// # Naked function & Stack
    /// Nothing may touch the stack before `RSP` points at the kernel stack,
    /// so this is naked. The dummy return address makes `RSP % 16 == 8` at
    /// the start of [`kernel_entry`], as if it had been called.
    #[unsafe(no_mangle)]
    #[unsafe(naked)]
    #[unsafe(link_section = ".text.entry")]
    pub extern "sysv64" fn _start_kernel(_handoff: u64) -> ! {
        core::arch::naked_asm!(
            "cli",
            "mov rsp, {stack_top}",
            "xor rbp, rbp",
            "push 0",
            // RDI still holds the handoff address.
            "jmp {rust_entry}",
            stack_top = const KERNEL_STACK_TOP,
            rust_entry = sym kernel_entry,
        );
    }

    const _: KernelEntryFn = _start_kernel;

    #[unsafe(no_mangle)]
    extern "sysv64" fn kernel_entry(handoff: u64) -> ! {
        qemu_trace!("Kernel reporting to QEMU, handoff block at {handoff:#x}\n");
        if let Err(e) = QemuLogger::new(LevelFilter::Info).init() {
            qemu_trace!("Kernel logger unavailable: {e}\n");
        }

        let status = read_handoff(PhysicalAddress::new(handoff));
        let mut console = open_console(status.as_ref());
        console.clear();

        init_interrupts();

        let mut shell = ShellState::new(status);
        shell::start(&mut console);
        match shell::run(&mut shell, &mut console, &KEYBOARD, &mut CpuInterrupts) {
            Action::Reboot => {
                info!("reboot requested");
                // SAFETY: the shell loop has ended; nothing else drives the controller.
                keyboard::pulse_reset_line(unsafe { &mut Ports::new() });
                warn!("reset pulse had no effect");
                halt_forever()
            }
            Action::Halt | Action::Continue => {
                info!("halting");
                halt_forever()
            }
        }
    }

    /// The interrupt flag, gating the keyboard service routine.
    struct CpuInterrupts;

    impl KeyInterrupts for CpuInterrupts {
        fn disable(&mut self) {
            disable_interrupts();
        }

        fn enable(&mut self) {
            // SAFETY: `init_interrupts` loaded the table and remapped the PIC
            // before the shell started.
            unsafe { enable_interrupts() }
        }

        fn enable_and_wait(&mut self) {
            // SAFETY: as for `enable`.
            unsafe { enable_interrupts_and_halt() }
        }
    }

    fn read_handoff(addr: PhysicalAddress) -> Option<StatusReport> {
        #[allow(clippy::cast_possible_truncation)]
        let base = core::ptr::with_exposed_provenance::<u8>(addr.as_u64() as usize);
        // SAFETY: Stage-2 reserves HANDOFF_CAPACITY bytes at this address inside
        // the identity map and never writes them after the jump.
        let region = unsafe { core::slice::from_raw_parts(base, HANDOFF_CAPACITY) };

        match HandoffBlock::parse(region).and_then(|block| StatusReport::from_handoff(addr, &block))
        {
            Ok(report) => {
                info!(
                    "handoff block at {addr}: {} bytes, {} entries",
                    report.handoff_len, report.entries
                );
                Some(report)
            }
            Err(e) => {
                warn!("handoff block at {addr} unusable: {e}");
                None
            }
        }
    }

    fn open_console(status: Option<&StatusReport>) -> TextConsole<VgaBuffer> {
        let (columns, rows, base) = status.and_then(|report| report.console).map_or(
            (
                usize::from(TEXT_COLUMNS),
                usize::from(TEXT_ROWS),
                VGA_TEXT_BUFFER,
            ),
            |console| {
                (
                    usize::from(console.columns),
                    usize::from(console.rows),
                    u64::from(console.buffer),
                )
            },
        );
        // SAFETY: the text buffer is identity mapped and this is its only user.
        let buffer = unsafe { VgaBuffer::new(PhysicalAddress::new(base), columns * rows) };
        TextConsole::new(buffer, columns, rows)
    }

    fn init_interrupts() {
        let idt = IDT.get_or_init(|| {
            let mut idt = Idt::new();
            idt.install_stubs(&STUBS.map(|stub| stub as usize as u64), CODE64);
            idt
        });
        // SAFETY: CPL0, and every present gate points at one of the stubs below.
        unsafe { idt.load() };

        // SAFETY: interrupts are still disabled and this is the only port user.
        let mut ports = unsafe { Ports::new() };
        PIC.remap(&mut ports);

        IRQS.get_or_init(|| {
            let mut irqs = IrqTable::new();
            if let Err(e) = irqs.register(KEYBOARD_LINE, keyboard::keyboard_interrupt) {
                error!("keyboard not wired: {e}");
            }
            irqs
        });
        PIC.unmask(&mut ports, KEYBOARD_LINE);

        info!("interrupts on, keyboard on vector {}", IRQ_BASE + KEYBOARD_LINE);
        // SAFETY: the table is loaded and the PIC no longer overlaps exceptions.
        unsafe { enable_interrupts() };
    }

    macro_rules! isr_stubs {
        ($($name:ident = $vector:literal),* $(,)?) => {
            $(
                /// Pushes a zero error code when the CPU does not, then the vector.
                #[unsafe(naked)]
                extern "C" fn $name() {
                    core::arch::naked_asm!(
                        ".if {has_code} == 0",
                        "push 0",
                        ".endif",
                        "push {vector}",
                        "jmp {common}",
                        has_code = const pushes_error_code($vector) as u8,
                        vector = const $vector,
                        common = sym isr_common,
                    );
                }
            )*

            const STUBS: [extern "C" fn(); STUB_VECTORS] = [$($name),*];
        };
    }

    isr_stubs!(
        isr0 = 0, isr1 = 1, isr2 = 2, isr3 = 3, isr4 = 4, isr5 = 5, isr6 = 6, isr7 = 7,
        isr8 = 8, isr9 = 9, isr10 = 10, isr11 = 11, isr12 = 12, isr13 = 13, isr14 = 14,
        isr15 = 15, isr16 = 16, isr17 = 17, isr18 = 18, isr19 = 19, isr20 = 20, isr21 = 21,
        isr22 = 22, isr23 = 23, isr24 = 24, isr25 = 25, isr26 = 26, isr27 = 27, isr28 = 28,
        isr29 = 29, isr30 = 30, isr31 = 31, isr32 = 32, isr33 = 33, isr34 = 34, isr35 = 35,
        isr36 = 36, isr37 = 37, isr38 = 38, isr39 = 39, isr40 = 40, isr41 = 41, isr42 = 42,
        isr43 = 43, isr44 = 44, isr45 = 45, isr46 = 46, isr47 = 47,
    );

    /// Saves the general registers in [`InterruptFrame`] order and calls
    /// [`isr_dispatch`] with a pointer to the frame.
    ///
    /// The CPU aligns `RSP` to 16 before pushing its 40-byte frame; with the
    /// error code, the vector and 15 registers the frame is 176 bytes, so the
    /// `call` happens on a 16-byte boundary.
    #[unsafe(naked)]
    extern "C" fn isr_common() {
        core::arch::naked_asm!(
            "cld",
            "push rax","push rbx","push rcx","push rdx","push rsi","push rdi","push rbp",
            "push r8","push r9","push r10","push r11","push r12","push r13","push r14","push r15",

            "mov rdi, rsp",
            "call {dispatch}",

            "pop r15","pop r14","pop r13","pop r12","pop r11","pop r10","pop r9","pop r8",
            "pop rbp","pop rdi","pop rsi","pop rdx","pop rcx","pop rbx","pop rax",
            // vector and error code
            "add rsp, 16",
            "iretq",
            dispatch = sym isr_dispatch,
        );
    }

    extern "C" fn isr_dispatch(frame: &InterruptFrame) {
        match Route::classify(frame.vector, PIC) {
            Route::Exception(_) => {
                error!("{}", frame.fault());
                halt_forever();
            }
            Route::Device(line) => {
                // SAFETY: interrupt gates run with IF clear, so nothing else is
                // using the ports until iretq.
                let mut ports = unsafe { Ports::new() };
                match IRQS.get() {
                    Some(irqs) => irqs.dispatch(line, PIC, &mut ports),
                    None => PIC.end_of_interrupt(&mut ports, line),
                }
            }
            Route::Unexpected(vector) => warn!("unexpected interrupt vector {vector}"),
        }
    }

    #[panic_handler]
    fn panic(info: &core::panic::PanicInfo) -> ! {
        qemu_trace!("Kernel panic: {info}\n");
        halt_forever()
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}

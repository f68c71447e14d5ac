//! Real mode → protected mode → (long mode) → kernel.
//!
//! `ESI` points at a [`SwitchRegisters`] for the whole sequence. Stage-2 is
//! linked at its load address with `CS = 0`, so labels are linear addresses
//! and the flat code segments can jump straight to them.
//!
//! The CR4/CR3/EFER/CR0 writes that turn on paging stay in this block rather
//! than behind a `kernel_hal` call: they run after the far jump into 32-bit
//! code, while everything Rust emits for this binary is 16-bit code, so there
//! is no Rust function they could live in. Their values come precomputed from
//! [`ModeSwitch`](boot_stage2::ModeSwitch) through [`SwitchRegisters`].

use boot_stage2::switch::SwitchRegisters;
use core::mem::offset_of;
use kernel_info::selectors::{CODE32, CODE64, DATA32, DATA64};
use kernel_registers::Efer;

core::arch::global_asm!(
    ".section .text.trampoline, \"ax\"",
    ".code16",
    ".global stage2_trampoline",
    "stage2_trampoline:",
    "    cli",
    "    movl {cr0_protected}(%esi), %eax",
    "    movl %eax, %cr0",
    "    ljmp ${code32}, $4f",

    ".code32",
    "4:",
    "    movw ${data32}, %ax",
    "    movw %ax, %ds",
    "    movw %ax, %es",
    "    movw %ax, %fs",
    "    movw %ax, %gs",
    "    movw %ax, %ss",
    "    movl {stack_top}(%esi), %esp",
    "    cmpl $0, {long_mode}(%esi)",
    "    je 3f",

    // PAE, page root, LME, then PG: the order long mode requires.
    "    movl {cr4}(%esi), %eax",
    "    movl %eax, %cr4",
    "    movl {cr3}(%esi), %eax",
    "    movl %eax, %cr3",
    "    movl ${efer_msr}, %ecx",
    "    rdmsr",
    "    orl {efer}(%esi), %eax",
    "    wrmsr",
    "    movl {cr0_paging}(%esi), %eax",
    "    movl %eax, %cr0",
    "    ljmp ${code64}, $2f",

    ".code64",
    "2:",
    "    movw ${data64}, %ax",
    "    movw %ax, %ds",
    "    movw %ax, %es",
    "    movw %ax, %fs",
    "    movw %ax, %gs",
    "    movw %ax, %ss",
    "    movl {stack_top}(%esi), %esp",
    "    movl {handoff}(%esi), %edi",
    "    movl {entry}(%esi), %eax",
    "    xorl %ebp, %ebp",
    "    pushq $0",
    "    jmp *%rax",

    ".code32",
    "3:",
    "    pushl {handoff}(%esi)",
    "    pushl $0",
    "    movl {entry}(%esi), %eax",
    "    xorl %ebp, %ebp",
    "    jmp *%eax",
    ".code16",

    code32 = const CODE32,
    data32 = const DATA32,
    code64 = const CODE64,
    data64 = const DATA64,
    efer_msr = const Efer::MSR_EFER,
    cr0_protected = const offset_of!(SwitchRegisters, cr0_protected),
    cr4 = const offset_of!(SwitchRegisters, cr4),
    cr3 = const offset_of!(SwitchRegisters, cr3),
    efer = const offset_of!(SwitchRegisters, efer),
    cr0_paging = const offset_of!(SwitchRegisters, cr0_paging),
    entry = const offset_of!(SwitchRegisters, entry),
    handoff = const offset_of!(SwitchRegisters, handoff),
    stack_top = const offset_of!(SwitchRegisters, stack_top),
    long_mode = const offset_of!(SwitchRegisters, long_mode),
    options(att_syntax),
);

/// Jump into the trampoline.
///
/// # Safety
/// Real mode, `DS = 0`, `registers` below 64 KiB, and every structure the
/// registers point at fully built. The GDTR must already hold the table
/// with the selectors from [`kernel_info::selectors`].
pub unsafe fn enter(registers: &SwitchRegisters) -> ! {
    unsafe {
        core::arch::asm!(
            "mov esi, {regs:e}",
            "jmp stage2_trampoline",
            regs = in(reg) core::ptr::from_ref(registers),
            options(noreturn),
        );
    }
}

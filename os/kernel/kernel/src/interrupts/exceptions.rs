//! CPU exception vectors 0..=31.

const NAMES: [&str; 32] = [
    "divide error",
    "debug",
    "non-maskable interrupt",
    "breakpoint",
    "overflow",
    "bound range exceeded",
    "invalid opcode",
    "device not available",
    "double fault",
    "coprocessor segment overrun",
    "invalid TSS",
    "segment not present",
    "stack-segment fault",
    "general protection fault",
    "page fault",
    "reserved",
    "x87 floating-point exception",
    "alignment check",
    "machine check",
    "SIMD floating-point exception",
    "virtualization exception",
    "control protection exception",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
    "hypervisor injection exception",
    "VMM communication exception",
    "security exception",
    "reserved",
];

/// Mnemonic name of an exception vector, `"not an exception"` above 31.
#[must_use]
pub const fn exception_name(vector: u8) -> &'static str {
    if (vector as usize) < NAMES.len() {
        NAMES[vector as usize]
    } else {
        "not an exception"
    }
}

/// Whether the CPU pushes an error code before entering the gate.
///
/// Stubs for the other vectors push a zero so every frame has the same shape.
#[must_use]
pub const fn pushes_error_code(vector: u8) -> bool {
    matches!(vector, 8 | 10..=14 | 17 | 21 | 29 | 30)
}

use super::exceptions::exception_name;
use crate::pic::Pic8259;
use core::fmt;

/// Stack contents when the common dispatcher runs.
///
/// The stub pushed `vector` and `error_code` (zero where the CPU pushes
/// none); the common entry then pushed `rax` through `r15`, so `r15` sits at
/// the lowest address.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct InterruptFrame {
    pub r15: u64,
    pub r14: u64,
    pub r13: u64,
    pub r12: u64,
    pub r11: u64,
    pub r10: u64,
    pub r9: u64,
    pub r8: u64,
    pub rbp: u64,
    pub rdi: u64,
    pub rsi: u64,
    pub rdx: u64,
    pub rcx: u64,
    pub rbx: u64,
    pub rax: u64,
    pub vector: u64,
    pub error_code: u64,
    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u64,
}

/// 15 saved registers, vector, error code and the 5-word hardware frame.
pub const FRAME_BYTES: usize = 22 * 8;

const _: () = assert!(size_of::<InterruptFrame>() == FRAME_BYTES);

impl InterruptFrame {
    /// Display adapter describing this frame as a CPU fault.
    #[must_use]
    pub const fn fault(&self) -> Fault<'_> {
        Fault(self)
    }
}

/// `"<name> (vector N, error code 0x..) at RIP 0x.."`.
pub struct Fault<'a>(&'a InterruptFrame);

impl fmt::Display for Fault<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.0;
        let name = u8::try_from(frame.vector).map_or("not an exception", exception_name);
        write!(
            f,
            "{name} (vector {}, error code {:#x}) at RIP {:#018x}",
            frame.vector, frame.error_code, frame.rip
        )
    }
}

/// Where the common dispatcher sends a vector.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Route {
    /// CPU exception 0..=31.
    Exception(u8),
    /// 8259 device line 0..=15.
    Device(u8),
    /// Anything else; only reachable through a stray `int n`.
    Unexpected(u64),
}

impl Route {
    #[must_use]
    pub fn classify(vector: u64, pic: Pic8259) -> Self {
        if let Some(line) = pic.line_for(vector) {
            return Self::Device(line);
        }
        match u8::try_from(vector) {
            Ok(exception) if exception < 32 => Self::Exception(exception),
            _ => Self::Unexpected(vector),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_after_remap() {
        let pic = Pic8259::new(32);
        assert_eq!(Route::classify(14, pic), Route::Exception(14));
        assert_eq!(Route::classify(32, pic), Route::Device(0));
        assert_eq!(Route::classify(33, pic), Route::Device(1));
        assert_eq!(Route::classify(47, pic), Route::Device(15));
        assert_eq!(Route::classify(48, pic), Route::Unexpected(48));
    }

    #[test]
    fn fault_description() {
        let frame = InterruptFrame {
            vector: 13,
            error_code: 0x18,
            rip: 0x1_2345,
            ..InterruptFrame::default()
        };
        assert_eq!(
            frame.fault().to_string(),
            "general protection fault (vector 13, error code 0x18) at RIP 0x0000000000012345"
        );
    }
}

use crate::config::TargetMode;
use core::fmt;

/// Progress of the loader. Stages only ever move forward.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Stage {
    Entered,
    ExtendedAddressingEnabled,
    KernelImageLoaded,
    DescriptorTablesBuilt,
    /// Long-mode target only.
    PageTablesBuilt,
    HandoffBlockFinalized,
    ModeSwitched,
    KernelEntered,
}

impl Stage {
    /// The stage that follows `self` on the way to `target`, or `None` once
    /// the kernel has been entered.
    #[must_use]
    pub const fn next(self, target: TargetMode) -> Option<Self> {
        Some(match self {
            Self::Entered => Self::ExtendedAddressingEnabled,
            Self::ExtendedAddressingEnabled => Self::KernelImageLoaded,
            Self::KernelImageLoaded => Self::DescriptorTablesBuilt,
            Self::DescriptorTablesBuilt if target.is_long() => Self::PageTablesBuilt,
            Self::DescriptorTablesBuilt | Self::PageTablesBuilt => Self::HandoffBlockFinalized,
            Self::HandoffBlockFinalized => Self::ModeSwitched,
            Self::ModeSwitched => Self::KernelEntered,
            Self::KernelEntered => return None,
        })
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Entered => "entered",
            Self::ExtendedAddressingEnabled => "extended addressing enabled",
            Self::KernelImageLoaded => "kernel image loaded",
            Self::DescriptorTablesBuilt => "descriptor tables built",
            Self::PageTablesBuilt => "page tables built",
            Self::HandoffBlockFinalized => "handoff block finalized",
            Self::ModeSwitched => "mode switched",
            Self::KernelEntered => "kernel entered",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! ITCM block accounting for the i.MX RT1062.
//!
//! ITCM is carved out of the shared FlexRAM bank in 32 KiB blocks. Code
//! placed in ITCM occupies whole blocks, and the unused tail of the last
//! block is RAM1 that the data sections can no longer use.

/// Size of one ITCM block in bytes.
pub const ITCM_BLOCK_SIZE: u64 = 32_768;

/// Largest padding a layout can carry; the scale `ITCM P:` is drawn against.
pub const ITCM_PADDING_SCALE: u64 = 32_767;

/// Block layout for a given amount of ITCM code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItcmLayout {
    /// Bytes of code in ITCM.
    pub used: u64,
    /// Whole blocks allocated: `ceil(used / 32768)`.
    pub blocks: u64,
    /// Bytes allocated: `blocks × 32768`.
    pub allocated: u64,
    /// Allocated but unused bytes: `allocated - used`.
    pub padding: u64,
}

impl ItcmLayout {
    /// Lay out `used` bytes of ITCM code.
    #[must_use]
    pub fn new(used: u64) -> Self {
        let blocks = used.div_ceil(ITCM_BLOCK_SIZE);
        let allocated = blocks.saturating_mul(ITCM_BLOCK_SIZE);
        Self {
            used,
            blocks,
            allocated,
            padding: allocated.saturating_sub(used),
        }
    }

    /// RAM1 usage once the padding is charged to it.
    #[must_use]
    pub fn charge(&self, ram1: u64) -> u64 {
        ram1.saturating_add(self.padding)
    }
}

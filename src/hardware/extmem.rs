//! External memory-mapped window seam (XSPI NOR flash and PSRAM).

/// External-memory controller configuration failure.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExtMemError {
    #[error("NOR flash controller init failed")]
    Flash,
    #[error("PSRAM controller init failed")]
    Psram,
}

/// Memory-mapped execution windows for the model weights (NOR flash) and,
/// optionally, activation spill (PSRAM).
///
/// Both windows may only be mapped with the NPU RAM and cache domains live,
/// since the weights stream from flash straight into an active NPU.
pub trait ExternalMemory {
    /// Configure the NOR flash controller for memory-mapped reads.
    fn flash_memory_mapped(&mut self) -> Result<(), ExtMemError>;
    fn flash_deinit(&mut self);
    /// Configure the PSRAM controller for memory-mapped access.
    fn psram_memory_mapped(&mut self) -> Result<(), ExtMemError>;
    fn psram_deinit(&mut self);
}

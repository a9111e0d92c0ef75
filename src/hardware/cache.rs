//! Cache controller seams.
//!
//! The NPU reads and writes its buffers through paths that bypass the CPU
//! cache hierarchy; the sequencer has to invalidate on the boundaries. Both
//! traits are implemented by the board support code (AXI cache controller
//! and SCB cache maintenance respectively).

/// The dedicated AXI cache in front of the NPU SRAM banks.
///
/// `npu_cache_init`/`npu_cache_enable` may only run with the NPU RAM domain
/// powered, and `npu_cache_disable`/`npu_cache_deinit` must run before it is
/// powered down: the cache must never be live over unpowered RAM.
pub trait NpuCacheControl {
    fn npu_cache_init(&mut self);
    fn npu_cache_deinit(&mut self);
    fn npu_cache_enable(&mut self);
    fn npu_cache_disable(&mut self);
    fn npu_cache_invalidate(&mut self);
}

/// CPU-side cache maintenance.
pub trait CoreCache {
    /// Clean and invalidate the entire data cache.
    fn clean_invalidate_dcache(&mut self);
    /// Invalidate the entire instruction cache.
    fn invalidate_icache(&mut self);
    /// Invalidate the data-cache lines backing `len` bytes at `addr`,
    /// without cleaning. Used on NPU output buffers, which the hardware
    /// writes behind the cache's back.
    fn invalidate_dcache_range(&mut self, addr: usize, len: usize);
}

//! Resource lifecycle controller.
//!
//! Hand-ordered enable/disable sequences for every clock/power domain a
//! measurement cycle touches. Each pair must be called in strictly
//! alternating order within a cycle; the phase sequencer is the only caller
//! and there is no reference counting; the system runs exactly one cycle at
//! a time. The `debug_assert!`s below catch a violated alternation in tests,
//! nothing more.

use super::cache::{CoreCache, NpuCacheControl};
use super::console::Console;
use super::extmem::{ExtMemError, ExternalMemory};
use super::rcc::{ClockGates, ClockSnapshot, Peripheral, RamControl, SramBank};

/// Owns the low-level register access object and sequences it.
pub struct PowerDomains<P> {
    pac: P,
    npu_ram_on: bool,
    npu_cache_on: bool,
}

impl<P> PowerDomains<P>
where
    P: ClockGates + RamControl + NpuCacheControl + CoreCache,
{
    pub fn new(pac: P) -> Self {
        Self {
            pac,
            npu_ram_on: false,
            npu_cache_on: false,
        }
    }

    /// Clock-enable register snapshot for a telemetry checkpoint.
    pub fn snapshot(&self) -> ClockSnapshot {
        self.pac.snapshot()
    }

    /// Boot-time shed of always-on IPs that never take part in a cycle.
    pub fn shed_unused(&mut self) {
        for p in [
            Peripheral::AhbSram1,
            Peripheral::AhbSram2,
            Peripheral::BkpSram,
            Peripheral::RtcApb,
            Peripheral::Rtc,
            Peripheral::Rng,
        ] {
            self.pac.disable(p);
        }
    }

    /// Gate the NPU core clock on and pulse its reset.
    pub fn enable_npu_clock(&mut self) {
        self.pac.enable(Peripheral::Npu);
        self.pac.sleep_enable(Peripheral::Npu);
        self.pac.force_reset(Peripheral::Npu);
        self.pac.release_reset(Peripheral::Npu);
    }

    /// Gate the NPU core clock off. The reset is asserted during
    /// [`PowerDomains::disable_npu_ram`], which always follows in teardown.
    pub fn disable_npu_clock(&mut self) {
        self.pac.disable(Peripheral::Npu);
        self.pac.sleep_disable(Peripheral::Npu);
    }

    /// Bring up the four NPU SRAM banks and their shared RAM controller.
    ///
    /// Must precede [`PowerDomains::enable_npu_cache`] and any inference.
    pub fn enable_npu_ram(&mut self) {
        debug_assert!(!self.npu_ram_on);

        // Sleep-mode gates first: the banks stay clocked while the CPU
        // sleeps through the NPU epochs.
        for bank in SramBank::ALL {
            self.pac.sleep_enable(Peripheral::NpuSram(bank));
        }
        for bank in SramBank::ALL {
            self.pac.enable(Peripheral::NpuSram(bank));
        }

        self.pac.enable(Peripheral::RamController);
        self.pac.sleep_enable(Peripheral::RamController);
        self.pac.force_reset(Peripheral::RamController);
        self.pac.release_reset(Peripheral::RamController);

        for bank in SramBank::ALL {
            self.pac.enable_bank(bank);
        }

        self.npu_ram_on = true;
    }

    /// Symmetric teardown of the NPU SRAM domain. Also forces the NPU core
    /// back into reset and drops its clocks, so the compute island is fully
    /// dark between cycles (and from boot until the first inference).
    ///
    /// The NPU cache must already be down: it must never be live over
    /// unpowered RAM.
    pub fn disable_npu_ram(&mut self) {
        debug_assert!(!self.npu_cache_on);

        for bank in SramBank::ALL {
            self.pac.disable_bank(bank);
        }

        self.pac.force_reset(Peripheral::Npu);
        self.pac.release_reset(Peripheral::Npu);
        self.pac.disable(Peripheral::Npu);
        self.pac.sleep_disable(Peripheral::Npu);

        for bank in SramBank::ALL {
            self.pac.disable(Peripheral::NpuSram(bank));
        }
        for bank in SramBank::ALL {
            self.pac.sleep_disable(Peripheral::NpuSram(bank));
        }

        self.pac.disable(Peripheral::RamController);
        self.pac.sleep_disable(Peripheral::RamController);

        self.npu_ram_on = false;
    }

    /// Bring up the NPU AXI cache: backing RAM and controller clocks, a
    /// reset pulse, then controller init and enable.
    pub fn enable_npu_cache(&mut self) {
        debug_assert!(self.npu_ram_on);
        debug_assert!(!self.npu_cache_on);

        self.pac.enable(Peripheral::NpuCacheRam);
        self.pac.sleep_enable(Peripheral::NpuCacheRam);
        self.pac.enable(Peripheral::NpuCache);
        self.pac.sleep_enable(Peripheral::NpuCache);
        self.pac.force_reset(Peripheral::NpuCache);
        self.pac.release_reset(Peripheral::NpuCache);

        self.pac.npu_cache_init();
        self.pac.npu_cache_enable();

        self.npu_cache_on = true;
    }

    /// Disable and deinit the NPU AXI cache; must precede
    /// [`PowerDomains::disable_npu_ram`].
    pub fn disable_npu_cache(&mut self) {
        debug_assert!(self.npu_cache_on);

        self.pac.npu_cache_disable();
        self.pac.npu_cache_deinit();

        self.pac.force_reset(Peripheral::NpuCache);
        self.pac.disable(Peripheral::NpuCacheRam);
        self.pac.sleep_disable(Peripheral::NpuCacheRam);
        self.pac.disable(Peripheral::NpuCache);
        self.pac.sleep_disable(Peripheral::NpuCache);

        self.npu_cache_on = false;
    }

    pub fn invalidate_npu_cache(&mut self) {
        self.pac.npu_cache_invalidate();
    }

    /// Sleep-mode gates for everything the capture path touches while the
    /// CPU sleeps waiting for the frame.
    pub fn enable_capture_clocks(&mut self) {
        for p in [
            Peripheral::Dcmipp,
            Peripheral::Csi,
            Peripheral::AxiSram1,
            Peripheral::AxiSram2,
            Peripheral::FlexRam,
            Peripheral::Tim2,
            Peripheral::I2c1,
            Peripheral::I2c2,
        ] {
            self.pac.sleep_enable(p);
        }
    }

    /// Map the NOR flash window (model weights).
    pub fn enable_flash_window(
        &mut self,
        ext: &mut impl ExternalMemory,
    ) -> Result<(), ExtMemError> {
        ext.flash_memory_mapped()?;
        self.pac.sleep_enable(Peripheral::Xspi2);
        Ok(())
    }

    /// Map the PSRAM window.
    pub fn enable_psram_window(
        &mut self,
        ext: &mut impl ExternalMemory,
    ) -> Result<(), ExtMemError> {
        ext.psram_memory_mapped()?;
        self.pac.sleep_enable(Peripheral::Xspi1);
        Ok(())
    }

    /// Unmap the external memory windows and drop the shared interface
    /// clock.
    pub fn disable_memory_windows(
        &mut self,
        ext: &mut impl ExternalMemory,
        use_psram: bool,
    ) {
        ext.flash_deinit();
        if use_psram {
            ext.psram_deinit();
        }
        self.pac.disable(Peripheral::XspiManager);
    }

    /// Console bring-up: gates first, then pins and UART.
    pub fn console_up(&mut self, console: &mut impl Console) {
        self.pac.enable(Peripheral::Usart1);
        self.pac.enable(Peripheral::ConsoleGpio);
        console.enable();
    }

    /// Console teardown, releasing the pins and both gates.
    pub fn console_down(&mut self, console: &mut impl Console) {
        console.disable();
        self.pac.disable(Peripheral::Usart1);
        self.pac.disable(Peripheral::ConsoleGpio);
    }

    pub fn clean_invalidate_dcache(&mut self) {
        self.pac.clean_invalidate_dcache();
    }

    pub fn invalidate_icache(&mut self) {
        self.pac.invalidate_icache();
    }

    pub fn invalidate_dcache_range(&mut self, addr: usize, len: usize) {
        self.pac.invalidate_dcache_range(addr, len);
    }
}

//! Clock/power plan collaborator interface.
//!
//! The board's clock plan owns the oscillator and PLL programming; the core
//! selects between named configurations. The clock trees behind this trait
//! (nominal and overdrive, 48 MHz crystal reference):
//!
//! Nominal
//!   HSE (48 MHz)
//!    ├── PLL1 (800 MHz): AXI, CSI, DCMIPP, NPU, NPU RAMs
//!    └── PLL3 (600 MHz): CPU
//!
//! Overdrive
//!   HSE (48 MHz)
//!    ├── PLL1 (800 MHz): CPU, AXI, CSI, DCMIPP
//!    ├── PLL2 (1000 MHz): NPU
//!    └── PLL3 (900 MHz): NPU RAMs
//!
//! PLL2/PLL3 are only brought up around inference; PLL1 is always on and is
//! the safe parking source while the compute muxes are being retargeted.

use crate::scaling::FrequencyStep;

/// PLL programming record (reference divider M, multiplier N, post dividers
/// P1/P2, fractional part).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PllConfig {
    pub source: PllSource,
    pub m: u8,
    pub n: u16,
    pub p1: u8,
    pub p2: u8,
    pub fractional: u16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PllSource {
    /// External crystal oscillator.
    Hse,
    /// Internal RC oscillator.
    Hsi,
}

/// Source selection for the CPU/NPU/NPU-RAM clock muxes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClockSource {
    Pll1,
    Pll2,
    Pll3,
}

/// Operating point of the external core-supply regulator. Voltage must lead
/// frequency on the way up and lag it on the way down; the sequencer owns
/// that ordering.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PowerMode {
    Nominal,
    Overdrive,
}

/// Clock/oscillator configuration failure. Always fatal: there is no
/// fallback frequency, a bad plan is a build-time error caught on the bench.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("oscillator/PLL configuration rejected")]
    Oscillator,
    #[error("clock tree configuration rejected")]
    ClockTree,
}

/// Named frequency configurations of the board clock plan.
pub trait ClockPlan {
    /// Apply the nominal base clock tree (boot time).
    fn apply_nominal(&mut self) -> Result<(), ClockError>;

    /// Apply the overdrive base clock tree (boot time). Implementations
    /// raise the regulator before touching the PLLs.
    fn apply_overdrive(&mut self) -> Result<(), ClockError>;

    /// Bring up the inference PLLs (PLL2 for the NPU, PLL3 for the NPU
    /// RAMs) and retarget their muxes. No-op in the nominal plan, where
    /// both trees stay on PLL1.
    fn configure_npu_clocks(&mut self) -> Result<(), ClockError>;

    /// Bring up the CPU PLL ahead of [`ClockPlan::set_cpu_max`]. Only
    /// meaningful when the CPU is parked on the crystal between compute
    /// phases.
    fn configure_cpu_pll(&mut self) -> Result<(), ClockError>;

    /// Switch the CPU mux to the plan's full-speed source.
    fn set_cpu_max(&mut self) -> Result<(), ClockError>;

    /// Park the CPU directly on the crystal.
    fn set_cpu_min(&mut self) -> Result<(), ClockError>;

    /// Move the CPU, NPU and NPU-RAM muxes onto the always-on PLL1 so the
    /// scaling PLLs can be reprogrammed without glitching a live tree.
    fn park_compute_clocks(&mut self) -> Result<(), ClockError>;

    /// Program a sweep step's PLLs and retarget the three compute muxes to
    /// the step's designated sources.
    fn apply_step(&mut self, step: &FrequencyStep) -> Result<(), ClockError>;

    /// Tear down the overdrive NPU PLL, returning the NPU mux to PLL1.
    fn npu_overdrive_pll_off(&mut self) -> Result<(), ClockError>;

    /// Tear down the overdrive NPU-RAM PLL, returning its mux to PLL1.
    fn npu_ram_overdrive_pll_off(&mut self) -> Result<(), ClockError>;

    /// After a sweep, route the NPU and NPU-RAM trees back onto the parked
    /// PLL1 configuration.
    fn restore_baseline(&mut self) -> Result<(), ClockError>;

    /// Power off the sweep PLLs. With `park_cpu_pll` the CPU PLL goes down
    /// too (the CPU must already be parked on the crystal); otherwise the
    /// CPU keeps its PLL and only the NPU-side PLL is dropped.
    fn scaling_plls_off(&mut self, park_cpu_pll: bool) -> Result<(), ClockError>;

    /// Reconfigure the external supply regulator.
    fn set_core_voltage(&mut self, mode: PowerMode);
}

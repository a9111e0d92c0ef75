//! NPU frequency-scaling sweep support.
//!
//! A diagnostic mode that repeats inference once per entry of a fixed table
//! of NPU/NPU-RAM clock configurations, producing comparable per-frequency
//! energy/latency datasets from a single button press.

use crate::hardware::clocks::{
    ClockError, ClockPlan, ClockSource, PllConfig, PllSource, PowerMode,
};
use crate::hardware::design_parameters::NPU_FREQ_MAX_MHZ;

/// One row of the sweep table.
///
/// The rows are consumed top to bottom, no reordering and no skipping. By
/// convention the table is sorted by descending NPU frequency; nothing
/// validates that, a consistent table is the caller's contract.
#[derive(Copy, Clone, Debug)]
pub struct FrequencyStep {
    /// PLL2 programming (the NPU tree in every row).
    pub pll2: PllConfig,
    /// PLL3 programming (NPU RAMs in the overdrive row, CPU otherwise).
    pub pll3: PllConfig,
    /// Intended NPU frequency, used as the overdrive selector and for the
    /// voltage lead/lag decision.
    pub npu_freq_mhz: u32,
    pub cpu_source: ClockSource,
    pub npu_source: ClockSource,
    pub npu_ram_source: ClockSource,
    /// Checkpoint label of the step's measured inference.
    pub name: &'static str,
}

const fn pll_hse(m: u8, n: u16, p1: u8, p2: u8) -> PllConfig {
    PllConfig {
        source: PllSource::Hse,
        m,
        n,
        p1,
        p2,
        fractional: 0,
    }
}

/// Clock configurations visited during one sweep, from a 48 MHz crystal.
pub static FREQUENCY_STEPS: [FrequencyStep; 6] = [
    // overdrive, npu@1GHz, cpu@800MHz
    FrequencyStep {
        pll2: pll_hse(6, 125, 1, 1),
        pll3: pll_hse(4, 75, 1, 1),
        npu_freq_mhz: 1000,
        cpu_source: ClockSource::Pll1,
        npu_source: ClockSource::Pll2,
        npu_ram_source: ClockSource::Pll3,
        name: "nn_inference_1GHz",
    },
    // nominal, npu@800MHz, cpu@600MHz
    FrequencyStep {
        pll2: pll_hse(3, 50, 1, 1),
        pll3: pll_hse(2, 50, 2, 1),
        npu_freq_mhz: 800,
        cpu_source: ClockSource::Pll3,
        npu_source: ClockSource::Pll2,
        npu_ram_source: ClockSource::Pll2,
        name: "nn_inference_800MHz",
    },
    // nominal, npu@600MHz, cpu@600MHz
    FrequencyStep {
        pll2: pll_hse(2, 50, 2, 1),
        pll3: pll_hse(2, 50, 2, 1),
        npu_freq_mhz: 600,
        cpu_source: ClockSource::Pll3,
        npu_source: ClockSource::Pll2,
        npu_ram_source: ClockSource::Pll2,
        name: "nn_inference_600MHz",
    },
    // nominal, npu@400MHz, cpu@600MHz
    FrequencyStep {
        pll2: pll_hse(3, 50, 2, 1),
        pll3: pll_hse(2, 50, 2, 1),
        npu_freq_mhz: 400,
        cpu_source: ClockSource::Pll3,
        npu_source: ClockSource::Pll2,
        npu_ram_source: ClockSource::Pll2,
        name: "nn_inference_400MHz",
    },
    // nominal, npu@200MHz, cpu@600MHz
    FrequencyStep {
        pll2: pll_hse(3, 50, 4, 1),
        pll3: pll_hse(2, 50, 2, 1),
        npu_freq_mhz: 200,
        cpu_source: ClockSource::Pll3,
        npu_source: ClockSource::Pll2,
        npu_ram_source: ClockSource::Pll2,
        name: "nn_inference_200MHz",
    },
    // nominal, npu@100MHz, cpu@600MHz
    FrequencyStep {
        pll2: pll_hse(3, 50, 4, 2),
        pll3: pll_hse(2, 50, 2, 1),
        npu_freq_mhz: 100,
        cpu_source: ClockSource::Pll3,
        npu_source: ClockSource::Pll2,
        npu_ram_source: ClockSource::Pll2,
        name: "nn_inference_100MHz",
    },
];

/// Reconfigure the compute clock trees for one sweep step.
///
/// The three compute muxes are parked on the always-on PLL first, so a PLL
/// is never reprogrammed while a downstream mux sources from it. The supply
/// regulator must never sustain a frequency its voltage does not cover:
/// going up to the maximum step the voltage is raised *before* the PLL
/// switch, going to any lower step it is lowered only *after*.
pub fn configure_step<C: ClockPlan>(
    clocks: &mut C,
    step: &FrequencyStep,
) -> Result<(), ClockError> {
    clocks.park_compute_clocks()?;

    if step.npu_freq_mhz == NPU_FREQ_MAX_MHZ {
        clocks.set_core_voltage(PowerMode::Overdrive);
    }

    clocks.apply_step(step)?;

    if step.npu_freq_mhz < NPU_FREQ_MAX_MHZ {
        clocks.set_core_voltage(PowerMode::Nominal);
    }

    Ok(())
}

//! Hardware-facing seams of the benchmark core.
//!
//! Register-level access (RCC gates, cache controllers, the clock plan, the
//! console UART) lives behind the traits in the submodules; the board
//! support crate implements them, the test suite substitutes recording
//! doubles.

pub mod cache;
pub mod clocks;
pub mod console;
pub mod design_parameters;
pub mod domains;
pub mod extmem;
pub mod rcc;
pub mod sleep;

pub use cache::{CoreCache, NpuCacheControl};
pub use clocks::{ClockError, ClockPlan, ClockSource, PllConfig, PllSource, PowerMode};
pub use console::Console;
pub use domains::PowerDomains;
pub use extmem::ExternalMemory;
pub use rcc::{ClockGates, ClockSnapshot, Peripheral, RamControl, SramBank};
pub use sleep::SleepControl;

use crate::camera::Camera;
use crate::nn::Inference;
use crate::postprocess::Postprocess;
use crate::telemetry::TickTimer;

/// The full set of types one board (plus its collaborators) provides.
///
/// Bundling them as associated types keeps the sequencer generic over a
/// single parameter instead of a dozen.
pub trait Platform {
    /// Low-level register access: clock gates, RAM controller, NPU cache
    /// controller and CPU cache maintenance.
    type Pac: ClockGates + RamControl + NpuCacheControl + CoreCache;
    /// The board clock/power plan.
    type Clocks: ClockPlan;
    /// Sleep and interrupt plumbing.
    type Sleep: SleepControl;
    /// Free-running timestamp timer.
    type Timer: TickTimer;
    /// Output pin marking the measurement window for the power analyzer.
    type Trigger: embedded_hal_1::digital::OutputPin;
    /// Console UART.
    type Console: Console;
    /// External memory-mapped windows.
    type ExtMem: ExternalMemory;
    /// Camera sensor + capture pipeline.
    type Camera: Camera;
    /// NPU inference runtime.
    type Network: Inference;
    /// Detection postprocessing.
    type Post: Postprocess;
}

/// Set up the RTT log sink. The board crate calls this once before anything
/// logs; RTT only reaches a debug probe, so it never disturbs the measured
/// power rails the way the console UART would.
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub fn setup_logging() {
    use rtt_logger::RTTLogger;

    static LOGGER: RTTLogger = RTTLogger::new(log::LevelFilter::Info);
    rtt_target::rtt_init_print!();
    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(log::LevelFilter::Trace))
        .unwrap();
}

/// Halt in place. Configuration failures are never recovered from: a wrong
/// measurement is worse than a stop the operator notices, so the core parks
/// here with the fault visible to an attached debugger.
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub fn halt() -> ! {
    cortex_m::interrupt::disable();
    loop {
        cortex_m::asm::bkpt();
    }
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    use core::fmt::Write;
    use rtt_target::{ChannelMode, UpChannel};

    cortex_m::interrupt::disable();

    if let Some(mut channel) = unsafe { UpChannel::conjure(0) } {
        channel.set_mode(ChannelMode::BlockIfFull);
        writeln!(channel, "{}", info).ok();
    }

    halt()
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
#[cortex_m_rt::exception]
unsafe fn HardFault(ef: &cortex_m_rt::ExceptionFrame) -> ! {
    panic!("HardFault at {:#?}", ef);
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
#[cortex_m_rt::exception]
unsafe fn DefaultHandler(irqn: i16) {
    panic!("Unhandled exception (IRQn = {})", irqn);
}

//! Low-level clock gating and reset control seam.
//!
//! One variant per independently gateable clock/power island the core
//! touches. The register-level read-modify-write lives behind [`ClockGates`]
//! in the board support code; the core only sequences the operations.

/// Number of clock-enable/divider registers captured with every checkpoint.
pub const NUM_CLOCK_REGISTERS: usize = 15;

/// Register names, in capture order, as they appear on the wire.
pub const CLOCK_REGISTER_NAMES: [&str; NUM_CLOCK_REGISTERS] = [
    "DIVENR", "MISCENR", "MEMENR", "AHB1ENR", "AHB2ENR", "AHB3ENR", "AHB4ENR",
    "AHB5ENR", "APB1LENR", "APB1HENR", "APB2ENR", "APB3ENR", "APB4LENR",
    "APB4HENR", "APB5ENR",
];

/// Raw values of the clock-enable/divider registers at one point in time.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClockSnapshot(pub [u32; NUM_CLOCK_REGISTERS]);

/// The four AXI SRAM banks dedicated to the NPU (4x448KB).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SramBank {
    Axi3,
    Axi4,
    Axi5,
    Axi6,
}

impl SramBank {
    pub const ALL: [SramBank; 4] =
        [SramBank::Axi3, SramBank::Axi4, SramBank::Axi5, SramBank::Axi6];
}

/// Clock/power domains with an RCC gate the sequencer drives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Peripheral {
    /// NPU compute core.
    Npu,
    /// One of the NPU SRAM banks.
    NpuSram(SramBank),
    /// Shared RAM controller for the NPU SRAM banks.
    RamController,
    /// NPU AXI cache controller.
    NpuCache,
    /// Backing RAM of the NPU AXI cache.
    NpuCacheRam,
    /// External PSRAM interface.
    Xspi1,
    /// External NOR flash interface (model weights).
    Xspi2,
    /// Shared external-memory-interface clock.
    XspiManager,
    /// Console UART.
    Usart1,
    /// GPIO port carrying the console UART pins.
    ConsoleGpio,
    /// Camera pixel pipeline.
    Dcmipp,
    /// Camera serial interface.
    Csi,
    /// General-purpose SRAMs crossed by the capture path.
    AxiSram1,
    AxiSram2,
    FlexRam,
    /// Timestamp timer.
    Tim2,
    /// Sensor control buses.
    I2c1,
    I2c2,
    // Always-on IPs shed once at boot; they never take part in a cycle.
    AhbSram1,
    AhbSram2,
    BkpSram,
    RtcApb,
    Rtc,
    Rng,
}

/// RCC gate and reset-line control, plus the enable-register snapshot used
/// by the timestamp log.
pub trait ClockGates {
    /// Enable the active (run-mode) clock gate.
    fn enable(&mut self, p: Peripheral);
    /// Disable the active clock gate.
    fn disable(&mut self, p: Peripheral);
    /// Enable the sleep-mode clock gate. Required for anything that must
    /// keep running while the CPU sleeps during capture or inference.
    fn sleep_enable(&mut self, p: Peripheral);
    /// Disable the sleep-mode clock gate.
    fn sleep_disable(&mut self, p: Peripheral);
    /// Assert the peripheral's reset line.
    fn force_reset(&mut self, p: Peripheral);
    /// Release the peripheral's reset line.
    fn release_reset(&mut self, p: Peripheral);
    /// Read all clock-enable/divider registers.
    fn snapshot(&self) -> ClockSnapshot;
}

/// Per-bank RAM-controller configuration (ECC/protection logic).
pub trait RamControl {
    fn enable_bank(&mut self, bank: SramBank);
    fn disable_bank(&mut self, bank: SramBank);
}

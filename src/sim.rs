//! Recording doubles for the hardware seams and collaborators.
//!
//! Every double appends to a shared journal handle that the test keeps a
//! clone of, so call order can be asserted after the sequencer has consumed
//! the objects.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::camera::{Camera, CameraError, CaptureMode, FrameSignal};
use crate::hardware::cache::{CoreCache, NpuCacheControl};
use crate::hardware::clocks::{ClockError, ClockPlan, PowerMode};
use crate::hardware::console::Console;
use crate::hardware::design_parameters::NN_BUFFER_LEN;
use crate::hardware::extmem::{ExtMemError, ExternalMemory};
use crate::hardware::rcc::{
    ClockGates, ClockSnapshot, Peripheral, RamControl, SramBank,
    NUM_CLOCK_REGISTERS,
};
use crate::hardware::sleep::SleepControl;
use crate::hardware::Platform;
use crate::nn::Inference;
use crate::postprocess::{OdOutput, Postprocess, PostprocessParams};
use crate::scaling::FrequencyStep;
use crate::sequencer::BenchParts;
use crate::telemetry::TickTimer;

/// Register-level operations recorded by [`SimPac`].
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Enable(Peripheral),
    Disable(Peripheral),
    SleepEnable(Peripheral),
    SleepDisable(Peripheral),
    ForceReset(Peripheral),
    ReleaseReset(Peripheral),
    EnableBank(SramBank),
    DisableBank(SramBank),
    NpuCache(&'static str),
    CleanInvalidateDcache,
    InvalidateIcache,
    InvalidateDcacheRange(usize, usize),
}

/// Recording stand-in for the register access object.
#[derive(Default)]
pub struct SimPac {
    pub journal: Rc<RefCell<Vec<Op>>>,
    snapshots: Cell<u32>,
}

impl SimPac {
    fn record(&self, op: Op) {
        self.journal.borrow_mut().push(op);
    }
}

impl ClockGates for SimPac {
    fn enable(&mut self, p: Peripheral) {
        self.record(Op::Enable(p));
    }
    fn disable(&mut self, p: Peripheral) {
        self.record(Op::Disable(p));
    }
    fn sleep_enable(&mut self, p: Peripheral) {
        self.record(Op::SleepEnable(p));
    }
    fn sleep_disable(&mut self, p: Peripheral) {
        self.record(Op::SleepDisable(p));
    }
    fn force_reset(&mut self, p: Peripheral) {
        self.record(Op::ForceReset(p));
    }
    fn release_reset(&mut self, p: Peripheral) {
        self.record(Op::ReleaseReset(p));
    }
    fn snapshot(&self) -> ClockSnapshot {
        // Distinct values per capture so entries are distinguishable.
        let n = self.snapshots.get() + 1;
        self.snapshots.set(n);
        ClockSnapshot([n; NUM_CLOCK_REGISTERS])
    }
}

impl RamControl for SimPac {
    fn enable_bank(&mut self, bank: SramBank) {
        self.record(Op::EnableBank(bank));
    }
    fn disable_bank(&mut self, bank: SramBank) {
        self.record(Op::DisableBank(bank));
    }
}

impl NpuCacheControl for SimPac {
    fn npu_cache_init(&mut self) {
        self.record(Op::NpuCache("init"));
    }
    fn npu_cache_deinit(&mut self) {
        self.record(Op::NpuCache("deinit"));
    }
    fn npu_cache_enable(&mut self) {
        self.record(Op::NpuCache("enable"));
    }
    fn npu_cache_disable(&mut self) {
        self.record(Op::NpuCache("disable"));
    }
    fn npu_cache_invalidate(&mut self) {
        self.record(Op::NpuCache("invalidate"));
    }
}

impl CoreCache for SimPac {
    fn clean_invalidate_dcache(&mut self) {
        self.record(Op::CleanInvalidateDcache);
    }
    fn invalidate_icache(&mut self) {
        self.record(Op::InvalidateIcache);
    }
    fn invalidate_dcache_range(&mut self, addr: usize, len: usize) {
        self.record(Op::InvalidateDcacheRange(addr, len));
    }
}

/// Clock-plan operations recorded by [`SimClockPlan`].
#[derive(Clone, Debug, PartialEq)]
pub enum ClockOp {
    ApplyNominal,
    ApplyOverdrive,
    ConfigureNpuClocks,
    ConfigureCpuPll,
    SetCpuMax,
    SetCpuMin,
    ParkComputeClocks,
    ApplyStep(&'static str),
    NpuOverdrivePllOff,
    NpuRamOverdrivePllOff,
    RestoreBaseline,
    ScalingPllsOff(bool),
    SetCoreVoltage(PowerMode),
}

/// Recording stand-in for the board clock plan. Every operation succeeds.
#[derive(Default)]
pub struct SimClockPlan {
    pub journal: Rc<RefCell<Vec<ClockOp>>>,
}

impl SimClockPlan {
    fn record(&self, op: ClockOp) -> Result<(), ClockError> {
        self.journal.borrow_mut().push(op);
        Ok(())
    }
}

impl ClockPlan for SimClockPlan {
    fn apply_nominal(&mut self) -> Result<(), ClockError> {
        self.record(ClockOp::ApplyNominal)
    }
    fn apply_overdrive(&mut self) -> Result<(), ClockError> {
        self.record(ClockOp::ApplyOverdrive)
    }
    fn configure_npu_clocks(&mut self) -> Result<(), ClockError> {
        self.record(ClockOp::ConfigureNpuClocks)
    }
    fn configure_cpu_pll(&mut self) -> Result<(), ClockError> {
        self.record(ClockOp::ConfigureCpuPll)
    }
    fn set_cpu_max(&mut self) -> Result<(), ClockError> {
        self.record(ClockOp::SetCpuMax)
    }
    fn set_cpu_min(&mut self) -> Result<(), ClockError> {
        self.record(ClockOp::SetCpuMin)
    }
    fn park_compute_clocks(&mut self) -> Result<(), ClockError> {
        self.record(ClockOp::ParkComputeClocks)
    }
    fn apply_step(&mut self, step: &FrequencyStep) -> Result<(), ClockError> {
        self.record(ClockOp::ApplyStep(step.name))
    }
    fn npu_overdrive_pll_off(&mut self) -> Result<(), ClockError> {
        self.record(ClockOp::NpuOverdrivePllOff)
    }
    fn npu_ram_overdrive_pll_off(&mut self) -> Result<(), ClockError> {
        self.record(ClockOp::NpuRamOverdrivePllOff)
    }
    fn restore_baseline(&mut self) -> Result<(), ClockError> {
        self.record(ClockOp::RestoreBaseline)
    }
    fn scaling_plls_off(
        &mut self,
        park_cpu_pll: bool,
    ) -> Result<(), ClockError> {
        self.record(ClockOp::ScalingPllsOff(park_cpu_pll))
    }
    fn set_core_voltage(&mut self, mode: PowerMode) {
        self.journal
            .borrow_mut()
            .push(ClockOp::SetCoreVoltage(mode));
    }
}

/// Sleep plumbing double. Waking delivers the frame interrupt, so a capture
/// wait terminates after one sleep.
pub struct SimSleep {
    signal: &'static FrameSignal,
    pub suspends: Rc<Cell<u32>>,
    pub resumes: Rc<Cell<u32>>,
    pub wakeups: Rc<Cell<u32>>,
}

impl SleepControl for SimSleep {
    fn suspend_tick(&mut self) {
        self.suspends.set(self.suspends.get() + 1);
    }
    fn resume_tick(&mut self) {
        self.resumes.set(self.resumes.get() + 1);
    }
    fn wait_for_interrupt(&mut self) {
        self.wakeups.set(self.wakeups.get() + 1);
        self.signal.notify();
    }
    fn clear_trigger_irq(&mut self) {}
    fn disable_frame_irq(&mut self) {}
}

/// Free-running timer double; the count advances a little on every read so
/// successive checkpoints get increasing timestamps.
#[derive(Default)]
pub struct SimTimer {
    pub now: Cell<u32>,
    pub running: Cell<bool>,
    pub zeroed: Cell<u32>,
    pub inited: Cell<u32>,
}

impl TickTimer for SimTimer {
    fn init(&mut self) {
        self.inited.set(self.inited.get() + 1);
    }
    fn set_counter(&mut self, ticks: u32) {
        self.now.set(ticks);
        if ticks == 0 {
            self.zeroed.set(self.zeroed.get() + 1);
        }
    }
    fn start(&mut self) {
        self.running.set(true);
    }
    fn stop(&mut self) {
        self.running.set(false);
    }
    fn count(&self) -> u32 {
        let t = self.now.get() + 7;
        self.now.set(t);
        t
    }
}

/// Trigger pin double.
#[derive(Default)]
pub struct SimPin {
    pub state: Rc<Cell<bool>>,
    pub highs: Rc<Cell<u32>>,
    pub lows: Rc<Cell<u32>>,
}

impl embedded_hal_1::digital::ErrorType for SimPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal_1::digital::OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state.set(false);
        self.lows.set(self.lows.get() + 1);
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.state.set(true);
        self.highs.set(self.highs.get() + 1);
        Ok(())
    }
}

/// Console double collecting the raw byte stream.
#[derive(Default)]
pub struct SimConsole {
    pub bytes: Rc<RefCell<Vec<u8>>>,
    pub enables: Rc<Cell<u32>>,
    pub disables: Rc<Cell<u32>>,
}

impl embedded_io::ErrorType for SimConsole {
    type Error = core::convert::Infallible;
}

impl embedded_io::Write for SimConsole {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.bytes.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Console for SimConsole {
    fn enable(&mut self) {
        self.enables.set(self.enables.get() + 1);
    }
    fn disable(&mut self) {
        self.disables.set(self.disables.get() + 1);
    }
}

/// External-memory double.
#[derive(Default)]
pub struct SimExtMem {
    pub calls: Rc<RefCell<Vec<&'static str>>>,
}

impl ExternalMemory for SimExtMem {
    fn flash_memory_mapped(&mut self) -> Result<(), ExtMemError> {
        self.calls.borrow_mut().push("flash_init");
        Ok(())
    }
    fn flash_deinit(&mut self) {
        self.calls.borrow_mut().push("flash_deinit");
    }
    fn psram_memory_mapped(&mut self) -> Result<(), ExtMemError> {
        self.calls.borrow_mut().push("psram_init");
        Ok(())
    }
    fn psram_deinit(&mut self) {
        self.calls.borrow_mut().push("psram_deinit");
    }
}

/// Camera double. The frame "arrives" via [`SimSleep`]'s wakeup, so the
/// capture wait loop is genuinely exercised.
#[derive(Default)]
pub struct SimCamera {
    pub calls: Rc<RefCell<Vec<&'static str>>>,
    pub capture_len: Rc<Cell<usize>>,
}

impl Camera for SimCamera {
    fn init(&mut self) -> Result<(), CameraError> {
        self.calls.borrow_mut().push("init");
        Ok(())
    }
    fn deinit(&mut self) -> Result<(), CameraError> {
        self.calls.borrow_mut().push("deinit");
        Ok(())
    }
    fn display_pipe_start(
        &mut self,
        _dst: &mut [u8],
        _mode: CaptureMode,
    ) -> Result<(), CameraError> {
        self.calls.borrow_mut().push("display_pipe_start");
        Ok(())
    }
    fn nn_pipe_start(
        &mut self,
        dst: &mut [u8],
        _mode: CaptureMode,
    ) -> Result<(), CameraError> {
        self.calls.borrow_mut().push("nn_pipe_start");
        self.capture_len.set(dst.len());
        Ok(())
    }
    fn isp_update(&mut self) -> Result<(), CameraError> {
        self.calls.borrow_mut().push("isp_update");
        Ok(())
    }
}

/// Inference double with two fixed-size float outputs.
pub struct SimNetwork {
    pub outputs: Vec<Vec<f32>>,
    pub runs: Rc<Cell<u32>>,
}

impl Default for SimNetwork {
    fn default() -> Self {
        Self {
            outputs: vec![vec![0.0; 10], vec![0.0; 4]],
            runs: Rc::default(),
        }
    }
}

impl Inference for SimNetwork {
    fn input_len(&self, _idx: usize) -> usize {
        NN_BUFFER_LEN
    }
    fn run(&mut self, input: &[u8]) {
        assert_eq!(input.len(), NN_BUFFER_LEN);
        self.runs.set(self.runs.get() + 1);
    }
    fn output_count(&self) -> usize {
        self.outputs.len()
    }
    fn output(&self, idx: usize) -> &[f32] {
        &self.outputs[idx]
    }
    fn output_name(&self, _idx: usize) -> &'static str {
        "detector_head"
    }
}

/// Postprocess double reporting zero detections.
#[derive(Default)]
pub struct SimPost {
    pub runs: Rc<Cell<u32>>,
}

impl Postprocess for SimPost {
    fn init(&mut self, _params: &mut PostprocessParams) {}
    fn run(
        &mut self,
        outputs: &[&[f32]],
        result: &mut OdOutput,
        _params: &PostprocessParams,
    ) -> usize {
        assert!(!outputs.is_empty());
        self.runs.set(self.runs.get() + 1);
        result.clear();
        result.detections.len()
    }
}

/// Type bundle wiring the doubles into the sequencer.
pub struct SimPlatform;

impl Platform for SimPlatform {
    type Pac = SimPac;
    type Clocks = SimClockPlan;
    type Sleep = SimSleep;
    type Timer = SimTimer;
    type Trigger = SimPin;
    type Console = SimConsole;
    type ExtMem = SimExtMem;
    type Camera = SimCamera;
    type Network = SimNetwork;
    type Post = SimPost;
}

/// Journal handles kept by the test while the sequencer owns the doubles.
pub struct SimHandles {
    pub pac_journal: Rc<RefCell<Vec<Op>>>,
    pub clock_journal: Rc<RefCell<Vec<ClockOp>>>,
    pub console_bytes: Rc<RefCell<Vec<u8>>>,
    pub console_enables: Rc<Cell<u32>>,
    pub console_disables: Rc<Cell<u32>>,
    pub extmem_calls: Rc<RefCell<Vec<&'static str>>>,
    pub camera_calls: Rc<RefCell<Vec<&'static str>>>,
    pub capture_len: Rc<Cell<usize>>,
    pub nn_runs: Rc<Cell<u32>>,
    pub post_runs: Rc<Cell<u32>>,
    pub trigger_state: Rc<Cell<bool>>,
    pub trigger_highs: Rc<Cell<u32>>,
    pub trigger_lows: Rc<Cell<u32>>,
    pub suspends: Rc<Cell<u32>>,
    pub resumes: Rc<Cell<u32>>,
    pub wakeups: Rc<Cell<u32>>,
}

/// Build a complete set of doubles sharing one set of journals.
pub fn bench_parts(
    signal: &'static FrameSignal,
) -> (BenchParts<SimPlatform>, SimHandles) {
    let pac = SimPac::default();
    let clocks = SimClockPlan::default();
    let sleep = SimSleep {
        signal,
        suspends: Rc::default(),
        resumes: Rc::default(),
        wakeups: Rc::default(),
    };
    let trigger = SimPin::default();
    let console = SimConsole::default();
    let extmem = SimExtMem::default();
    let camera = SimCamera::default();
    let network = SimNetwork::default();
    let post = SimPost::default();

    let handles = SimHandles {
        pac_journal: pac.journal.clone(),
        clock_journal: clocks.journal.clone(),
        console_bytes: console.bytes.clone(),
        console_enables: console.enables.clone(),
        console_disables: console.disables.clone(),
        extmem_calls: extmem.calls.clone(),
        camera_calls: camera.calls.clone(),
        capture_len: camera.capture_len.clone(),
        nn_runs: network.runs.clone(),
        post_runs: post.runs.clone(),
        trigger_state: trigger.state.clone(),
        trigger_highs: trigger.highs.clone(),
        trigger_lows: trigger.lows.clone(),
        suspends: sleep.suspends.clone(),
        resumes: sleep.resumes.clone(),
        wakeups: sleep.wakeups.clone(),
    };

    let parts = BenchParts {
        pac,
        clocks,
        sleep,
        timer: SimTimer::default(),
        trigger,
        console,
        extmem,
        camera,
        network,
        post,
    };

    (parts, handles)
}

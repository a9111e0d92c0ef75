//! Phase sequencer: the top-level measurement state machine.
//!
//! One cycle per button trigger, no concurrent cycles. The sequencer is the
//! only caller of the resource lifecycle controller and the timestamp log,
//! and the only place the enable/disable ordering contract is enforced.
//! Any collaborator failure mid-cycle is fatal for this boot; there is no
//! recovery path back to the trigger wait.

use embedded_hal_1::digital::OutputPin;
use heapless::Vec;

use crate::camera::{Camera, CaptureMode, FrameSignal};
use crate::hardware::clocks::{ClockPlan, PowerMode};
use crate::hardware::design_parameters::{MAX_NN_OUTPUTS, NN_BUFFER_LEN};
use crate::hardware::domains::PowerDomains;
use crate::hardware::sleep::SleepControl;
use crate::hardware::Platform;
use crate::nn::Inference;
use crate::postprocess::{OdOutput, Postprocess, PostprocessParams};
use crate::scaling::{self, FREQUENCY_STEPS};
use crate::telemetry::TimestampLog;

/// Compile-time power-plan selection, derived from the crate features.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BenchConfig {
    /// Base operating point of the clock plan.
    pub power: PowerMode,
    /// Park the CPU on the crystal between compute phases.
    pub cpu_scale_down: bool,
    /// Replace the single measured inference with the frequency sweep.
    pub freq_scaling: bool,
    /// Map the external PSRAM window alongside the weight flash.
    pub use_psram: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        let freq_scaling = cfg!(feature = "npu-freq-scaling");
        Self {
            // The sweep rows carry their own operating points; the base
            // plan stays nominal so every row starts from the same tree.
            power: if cfg!(feature = "overdrive") && !freq_scaling {
                PowerMode::Overdrive
            } else {
                PowerMode::Nominal
            },
            cpu_scale_down: cfg!(feature = "cpu-scale-down"),
            freq_scaling,
            use_psram: cfg!(feature = "psram"),
        }
    }
}

/// The nine phases of one measurement cycle, in strict order, no skips and
/// no reentrancy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PipelinePhase {
    WaitTrigger,
    StartPower,
    CameraInit,
    Capture,
    CameraDeinit,
    Inference,
    Postprocess,
    SendTelemetry,
    Teardown,
}

impl PipelinePhase {
    pub fn next(self) -> Self {
        match self {
            PipelinePhase::WaitTrigger => PipelinePhase::StartPower,
            PipelinePhase::StartPower => PipelinePhase::CameraInit,
            PipelinePhase::CameraInit => PipelinePhase::Capture,
            PipelinePhase::Capture => PipelinePhase::CameraDeinit,
            PipelinePhase::CameraDeinit => PipelinePhase::Inference,
            PipelinePhase::Inference => PipelinePhase::Postprocess,
            PipelinePhase::Postprocess => PipelinePhase::SendTelemetry,
            PipelinePhase::SendTelemetry => PipelinePhase::Teardown,
            PipelinePhase::Teardown => PipelinePhase::WaitTrigger,
        }
    }
}

/// Everything one board hands to the sequencer, in the disabled state.
pub struct BenchParts<P: Platform> {
    pub pac: P::Pac,
    pub clocks: P::Clocks,
    pub sleep: P::Sleep,
    pub timer: P::Timer,
    pub trigger: P::Trigger,
    pub console: P::Console,
    pub extmem: P::ExtMem,
    pub camera: P::Camera,
    pub network: P::Network,
    pub post: P::Post,
}

/// The benchmark harness. Owns every handle; single-threaded by contract.
pub struct Bench<P: Platform> {
    domains: PowerDomains<P::Pac>,
    clocks: P::Clocks,
    sleep: P::Sleep,
    log: TimestampLog<P::Timer>,
    trigger: P::Trigger,
    console: P::Console,
    extmem: P::ExtMem,
    camera: P::Camera,
    network: P::Network,
    post: P::Post,
    frame_signal: &'static FrameSignal,
    frame: &'static mut [u8; NN_BUFFER_LEN],
    params: PostprocessParams,
    result: OdOutput,
    cfg: BenchConfig,
    phase: PipelinePhase,
    n_outputs: usize,
}

impl<P: Platform> Bench<P> {
    /// Boot-time bring-up: compute island dark, unused IPs unclocked, base
    /// clock tree applied, network output table discovered, postprocess
    /// parameters resolved.
    pub fn new(
        parts: BenchParts<P>,
        frame_signal: &'static FrameSignal,
        frame: &'static mut [u8; NN_BUFFER_LEN],
        cfg: BenchConfig,
    ) -> Self {
        let BenchParts {
            pac,
            mut clocks,
            sleep,
            timer,
            trigger,
            console,
            extmem,
            camera,
            network,
            mut post,
        } = parts;

        let mut domains = PowerDomains::new(pac);
        domains.disable_npu_ram();
        domains.shed_unused();

        let applied = match cfg.power {
            PowerMode::Overdrive => clocks.apply_overdrive(),
            PowerMode::Nominal => clocks.apply_nominal(),
        };
        if let Err(e) = applied {
            panic!("base clock tree rejected: {}", e);
        }

        let n_outputs = network.output_count();
        assert!(
            n_outputs <= MAX_NN_OUTPUTS,
            "network output count exceeds design bound"
        );

        let mut params = PostprocessParams::default();
        post.init(&mut params);

        log::info!("bench ready, {} network outputs", n_outputs);

        Self {
            domains,
            clocks,
            sleep,
            log: TimestampLog::new(timer),
            trigger,
            console,
            extmem,
            camera,
            network,
            post,
            frame_signal,
            frame,
            params,
            result: OdOutput::default(),
            cfg,
            phase: PipelinePhase::WaitTrigger,
            n_outputs,
        }
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    /// Run measurement cycles forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.run_cycle();
        }
    }

    /// One full trigger-to-teardown cycle.
    pub fn run_cycle(&mut self) {
        self.wait_trigger();
        self.start_power();
        self.camera_init();
        self.capture();
        self.camera_deinit();
        self.inference();
        self.postprocess();
        self.send_telemetry();
        self.teardown();
    }

    fn advance(&mut self) {
        self.phase = self.phase.next();
        log::trace!("phase: {:?}", self.phase);
    }

    /// Record a checkpoint with the live clock-gate state.
    fn checkpoint(&mut self, label: &'static str) {
        let snapshot = self.domains.snapshot();
        self.log.log(label, snapshot);
    }

    /// Park everything and sleep until the button interrupt wakes the core.
    fn wait_trigger(&mut self) {
        self.trigger.set_low().unwrap();
        self.sleep.clear_trigger_irq();
        self.sleep.disable_frame_irq();

        self.sleep.suspend_tick();
        self.sleep.wait_for_interrupt();
        self.sleep.resume_tick();

        // Clock sources may have moved since the last cycle; the timestamp
        // timer is reconfigured from scratch on every wake.
        self.log.init();

        self.advance();
    }

    /// Assert the analyzer trigger and open the timestamp bracket.
    fn start_power(&mut self) {
        self.trigger.set_high().unwrap();
        self.log.start();
        self.checkpoint("start timestamp");
        self.advance();
    }

    fn camera_init(&mut self) {
        if let Err(e) = self.camera.init() {
            panic!("camera init failed: {}", e);
        }
        self.checkpoint("CAM init");
        self.advance();
    }

    /// Single-shot capture into the network input buffer, sleeping until
    /// the frame-complete interrupt fires.
    fn capture(&mut self) {
        self.frame_signal.reset();

        // Sleep-mode gates only: capture runs while the CPU sleeps.
        self.domains.enable_capture_clocks();

        if let Err(e) = self
            .camera
            .nn_pipe_start(self.frame.as_mut_slice(), CaptureMode::Snapshot)
        {
            panic!("camera capture start failed: {}", e);
        }
        self.checkpoint("camera started");

        self.sleep.suspend_tick();
        while !self.frame_signal.frame_received() {
            self.sleep.wait_for_interrupt();
        }
        self.sleep.resume_tick();
        self.checkpoint("wait frame");

        if let Err(e) = self.camera.isp_update() {
            panic!("ISP update failed: {}", e);
        }
        self.checkpoint("ISP update");

        self.advance();
    }

    fn camera_deinit(&mut self) {
        if let Err(e) = self.camera.deinit() {
            panic!("camera deinit failed: {}", e);
        }
        self.checkpoint("camera de-init");
        self.advance();
    }

    /// Power the compute island, map the weight flash and run inference:
    /// either the dry-run/measured pair or the frequency sweep.
    fn inference(&mut self) {
        if let Err(e) = self.clocks.configure_npu_clocks() {
            panic!("NPU clock config rejected: {}", e);
        }
        self.domains.enable_npu_clock();
        if let Err(e) = self.clocks.configure_cpu_pll() {
            panic!("CPU PLL config rejected: {}", e);
        }
        if self.cfg.cpu_scale_down {
            if let Err(e) = self.clocks.set_cpu_max() {
                panic!("CPU max-frequency switch rejected: {}", e);
            }
        }

        self.domains.enable_npu_ram();
        self.domains.enable_npu_cache();

        // Weights stream from flash straight into the live NPU, so the
        // windows are only mapped with the compute island up.
        if self.cfg.use_psram {
            if self.domains.enable_psram_window(&mut self.extmem).is_err() {
                panic!("PSRAM mapping failed");
            }
            self.checkpoint("External RAM init");
        }
        if self.domains.enable_flash_window(&mut self.extmem).is_err() {
            panic!("NOR flash mapping failed");
        }
        self.checkpoint("NOR flash init");

        // The capture buffer is the network input. It is written by the
        // capture DMA and read by the NPU, never by CPU loads or stores, so
        // no cache maintenance is needed on it.
        assert_eq!(
            self.frame.len(),
            self.network.input_len(0),
            "capture buffer does not match the model input"
        );
        self.checkpoint("NPU and NPU Rams config");

        if self.cfg.freq_scaling {
            self.inference_sweep();
        } else {
            // The first pass absorbs the one-time setup cost; only the
            // second one counts for the energy figures.
            self.run_inference_pass();
            self.checkpoint("nn inference (dry run)");

            self.run_inference_pass();
            self.checkpoint("nn inference");
        }

        self.domains.disable_npu_clock();
        self.domains
            .disable_memory_windows(&mut self.extmem, self.cfg.use_psram);

        self.advance();
    }

    /// One inference pass with the tick suspended so the CPU can sleep
    /// through the hardware epochs.
    fn run_inference_pass(&mut self) {
        self.sleep.suspend_tick();
        self.network.run(self.frame.as_slice());
        self.sleep.resume_tick();
    }

    /// One inference per sweep-table row, in table order, no skips.
    fn inference_sweep(&mut self) {
        for step in FREQUENCY_STEPS.iter() {
            if let Err(e) = scaling::configure_step(&mut self.clocks, step) {
                panic!("frequency step {} rejected: {}", step.name, e);
            }

            // The reconfigured clock trees leave stale microarchitectural
            // state behind; every cache goes down before the pass.
            self.domains.invalidate_npu_cache();
            self.domains.clean_invalidate_dcache();
            self.domains.invalidate_icache();
            self.checkpoint("config npu clock scaling");

            self.run_inference_pass();
            self.checkpoint(step.name);
        }
    }

    /// Decode the detections, close the timestamp bracket and return the
    /// clock trees to their idle state.
    fn postprocess(&mut self) {
        // Deferred from the inference phase so the elevated NPU clock
        // covers the whole inference, not just its setup.
        if self.cfg.power == PowerMode::Overdrive {
            if let Err(e) = self.clocks.npu_overdrive_pll_off() {
                panic!("NPU overdrive PLL teardown rejected: {}", e);
            }
        }

        let mut ranges: Vec<(usize, usize), MAX_NN_OUTPUTS> = Vec::new();
        {
            let mut outputs: Vec<&[f32], MAX_NN_OUTPUTS> = Vec::new();
            for i in 0..self.n_outputs {
                let out = self.network.output(i);
                ranges
                    .push((out.as_ptr() as usize, core::mem::size_of_val(out)))
                    .ok();
                outputs.push(out).ok();
            }

            self.result.clear();
            let kept =
                self.post.run(&outputs, &mut self.result, &self.params);
            log::debug!("postprocess kept {} detections", kept);
        }
        self.checkpoint("post processing");
        self.log.stop();

        // The NPU wrote the output buffers behind the cache's back; drop
        // any cached lines now so the next cycle's inference cannot be
        // masked by stale data.
        for (addr, len) in ranges {
            self.domains.invalidate_dcache_range(addr, len);
        }

        if self.cfg.power == PowerMode::Overdrive {
            if let Err(e) = self.clocks.npu_ram_overdrive_pll_off() {
                panic!("NPU RAM overdrive PLL teardown rejected: {}", e);
            }
        }

        if self.cfg.freq_scaling {
            if let Err(e) = self.clocks.restore_baseline() {
                panic!("baseline clock restore rejected: {}", e);
            }
            if self.cfg.cpu_scale_down {
                if let Err(e) = self.clocks.set_cpu_min() {
                    panic!("CPU min-frequency switch rejected: {}", e);
                }
                if let Err(e) = self.clocks.scaling_plls_off(true) {
                    panic!("scaling PLL shutdown rejected: {}", e);
                }
            } else if let Err(e) = self.clocks.scaling_plls_off(false) {
                panic!("scaling PLL shutdown rejected: {}", e);
            }
        }

        self.advance();
    }

    /// Bring the console up only now that the measured phases are over, and
    /// flush the log.
    fn send_telemetry(&mut self) {
        self.domains.console_up(&mut self.console);
        if self.log.send_over_uart(&mut self.console).is_err() {
            panic!("console write failed");
        }
        self.advance();
    }

    /// Release every domain and return to the trigger wait.
    fn teardown(&mut self) {
        self.trigger.set_low().unwrap();

        // Cache first: it must never be live over unpowered RAM.
        self.domains.disable_npu_cache();
        self.domains.disable_npu_ram();

        if self.cfg.cpu_scale_down {
            if let Err(e) = self.clocks.set_cpu_min() {
                panic!("CPU min-frequency switch rejected: {}", e);
            }
        }

        self.domains.console_down(&mut self.console);

        self.advance();
    }
}

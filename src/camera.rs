//! Camera sensor + capture pipeline collaborator.

use core::sync::atomic::{AtomicU32, Ordering};

/// Capture mode of the neural-network pipe.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CaptureMode {
    /// Exactly one frame, then the pipe stops itself.
    Snapshot,
    /// Free-running capture.
    Continuous,
}

/// Camera/ISP failure. Fatal to the cycle (§ error policy: assert, no
/// retry).
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("sensor bring-up failed")]
    Sensor,
    #[error("capture pipeline configuration failed")]
    Pipeline,
    #[error("ISP update failed")]
    Isp,
}

/// Frame-complete signal crossing the interrupt boundary.
///
/// The camera implementation's frame ISR is the only writer
/// ([`FrameSignal::notify`]); the sequencer's capture wait loop is the only
/// reader. A relaxed atomic is all that is needed: the reader only asks
/// "became nonzero", not for an exact count. Injected by shared reference
/// into the camera at construction and into the sequencer.
#[derive(Debug, Default)]
pub struct FrameSignal {
    frames: AtomicU32,
}

impl FrameSignal {
    pub const fn new() -> Self {
        Self {
            frames: AtomicU32::new(0),
        }
    }

    /// Called from the frame-complete interrupt.
    pub fn notify(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Re-arm before starting a capture.
    pub fn reset(&self) {
        self.frames.store(0, Ordering::Relaxed);
    }

    pub fn frame_received(&self) -> bool {
        self.frames.load(Ordering::Relaxed) != 0
    }
}

/// The camera sensor and pixel pipeline (CSI + DCMIPP + ISP), consumed as a
/// black box.
pub trait Camera {
    /// Power up the sensor and configure both pipes.
    fn init(&mut self) -> Result<(), CameraError>;

    /// Tear the sensor and pipeline down.
    fn deinit(&mut self) -> Result<(), CameraError>;

    /// Start the display pipe into `dst`. Unused by the power bench (no
    /// panel attached) but part of the pipeline surface.
    fn display_pipe_start(
        &mut self,
        dst: &mut [u8],
        mode: CaptureMode,
    ) -> Result<(), CameraError>;

    /// Start the neural-network pipe into `dst`. On frame completion the
    /// implementation fires the injected [`FrameSignal`].
    fn nn_pipe_start(
        &mut self,
        dst: &mut [u8],
        mode: CaptureMode,
    ) -> Result<(), CameraError>;

    /// Run one background step of the ISP statistics loop (exposure/gain).
    fn isp_update(&mut self) -> Result<(), CameraError>;
}

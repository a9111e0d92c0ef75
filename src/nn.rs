//! NPU inference runtime collaborator.

/// Inference runtime failure surfaced at the buffer-binding seam.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NnError {
    #[error("input buffer length does not match the model input")]
    InputLength,
}

/// One compiled network instance on the NPU, consumed as a black box.
///
/// The output table is static per build: the sequencer discovers the output
/// count once at startup and asserts it against the design bound. The input
/// buffer is written only by the capture DMA and read only by the NPU, so no
/// CPU cache maintenance is needed on it.
pub trait Inference {
    /// Declared byte length of input buffer `idx`.
    fn input_len(&self, idx: usize) -> usize;

    /// Run one full inference pass over `input`.
    ///
    /// Blocking; the caller suspends the system tick around it so the CPU
    /// can sleep through the hardware epochs.
    fn run(&mut self, input: &[u8]);

    /// Number of network output buffers.
    fn output_count(&self) -> usize;

    /// Output buffer `idx` as produced by the last pass.
    fn output(&self, idx: usize) -> &[f32];

    /// Name of output buffer `idx` from the compiled network description.
    fn output_name(&self, idx: usize) -> &'static str;
}

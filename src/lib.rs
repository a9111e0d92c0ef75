//! Power/latency benchmarking firmware core for a camera-fed NPU inference
//! pipeline.
//!
//! One measurement cycle per button trigger: power up the camera and NPU
//! domains, capture a single frame, run inference (optionally once per entry
//! of a frequency-scaling table), postprocess, dump the timestamp/clock-gate
//! trace over the console UART and power everything back down.
//!
//! The crate is the chip-independent core: the phase sequencer, the resource
//! lifecycle controller, the timestamp log and the frequency sweep. Register
//! access, the camera/ISP stack, the NPU runtime and the detection decode are
//! consumed through the traits in [`hardware`], [`camera`], [`nn`] and
//! [`postprocess`].
#![cfg_attr(not(test), no_std)]

pub mod camera;
pub mod hardware;
pub mod nn;
pub mod postprocess;
pub mod scaling;
pub mod sequencer;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod sim;

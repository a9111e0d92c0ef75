//! Cooperative low-power control seam.

/// Sleep and interrupt plumbing for the two suspension points of a cycle:
/// the indefinite wait for the next button trigger and the wait for the
/// frame-complete interrupt during capture.
///
/// The periodic system tick is suspended around every timed sleep so that
/// tick bookkeeping never lands inside a measured window. Every wait is
/// unbounded: a missing interrupt hangs the device, which on a bench
/// instrument beats a timeout quietly corrupting the measurement.
pub trait SleepControl {
    /// Stop the periodic system tick.
    fn suspend_tick(&mut self);
    /// Restart the periodic system tick.
    fn resume_tick(&mut self);
    /// Enter the low-power sleep state until any enabled interrupt fires.
    fn wait_for_interrupt(&mut self);
    /// Clear a pending button-trigger interrupt before sleeping on it.
    fn clear_trigger_irq(&mut self);
    /// Mask the camera frame interrupt while idle between cycles.
    fn disable_frame_irq(&mut self);
}

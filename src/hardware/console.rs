//! Console UART seam.

/// Byte sink for the end-of-cycle telemetry dump.
///
/// The console is deliberately dead during the measured phases (its clocks
/// would show up in the power trace) and is only brought up once the
/// timestamp timer has stopped. `enable` configures the UART pins and the
/// peripheral at the fixed baud; `disable` is the symmetric teardown. The
/// surrounding RCC gates are sequenced by the resource lifecycle controller,
/// not here.
pub trait Console: embedded_io::Write {
    fn enable(&mut self);
    fn disable(&mut self);
}

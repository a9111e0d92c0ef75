use fugit::HertzU32;

/// Counting frequency of the timestamp timer. Derived from the crystal, not
/// from the system clock, so reconfiguring the PLLs mid-cycle does not skew
/// the trace.
pub const TIMESTAMP_TICK_RATE: HertzU32 = HertzU32::from_raw(1_000_000);

/// Console UART baud rate (ST-Link virtual COM port).
pub const CONSOLE_BAUD: u32 = 115_200;

/// Maximum number of checkpoints per measurement cycle. Overrunning this is
/// fatal: a truncated power trace is worse than a halt the operator notices.
pub const MAX_LOG_ENTRIES: usize = 100;

/// Checkpoint labels longer than this are truncated on the wire.
pub const MAX_LABEL_LENGTH: usize = 30;

/// Network input geometry. The capture pipe converts directly into this
/// format, so the frame buffer doubles as the inference input buffer.
pub const NN_WIDTH: usize = 224;
pub const NN_HEIGHT: usize = 224;
pub const NN_BPP: usize = 3;
pub const NN_BUFFER_LEN: usize = NN_WIDTH * NN_HEIGHT * NN_BPP;

/// Upper bound on the number of network output buffers, checked once at
/// startup when the output table is discovered.
pub const MAX_NN_OUTPUTS: usize = 5;

/// NPU frequency of the overdrive operating point. A frequency step at this
/// value requires the supply voltage to be raised before the PLL switch.
pub const NPU_FREQ_MAX_MHZ: u32 = 1000;

/// Detection classes of the person-detector model.
pub const CLASSES: [&str; 2] = ["person", "not_person"];

// YOLOv2 decode geometry and tuning for the person-detector head.
pub const YOLOV2_NB_CLASSES: usize = 1;
pub const YOLOV2_NB_ANCHORS: usize = 5;
pub const YOLOV2_GRID_WIDTH: usize = 7;
pub const YOLOV2_GRID_HEIGHT: usize = 7;
pub const YOLOV2_CONF_THRESHOLD: f32 = 0.6;
pub const YOLOV2_IOU_THRESHOLD: f32 = 0.3;
pub const YOLOV2_MAX_BOXES: usize = 10;

/// Anchor boxes, (width, height) pairs in grid units.
pub const YOLOV2_ANCHORS: [f32; 2 * YOLOV2_NB_ANCHORS] = [
    0.9883, 3.3606, //
    2.1194, 5.3759, //
    3.0520, 9.1336, //
    5.5517, 9.3066, //
    9.7260, 11.1422,
];

//! Detection postprocessing collaborator (YOLO box decode + NMS).

use heapless::Vec;

use crate::hardware::design_parameters::{
    YOLOV2_ANCHORS, YOLOV2_CONF_THRESHOLD, YOLOV2_GRID_HEIGHT,
    YOLOV2_GRID_WIDTH, YOLOV2_IOU_THRESHOLD, YOLOV2_MAX_BOXES,
    YOLOV2_NB_ANCHORS, YOLOV2_NB_CLASSES,
};

/// Static model-specific decode configuration. Filled in by
/// [`Postprocess::init`] at startup, then read-only.
#[derive(Copy, Clone, Debug)]
pub struct PostprocessParams {
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub max_boxes: usize,
    pub grid_width: usize,
    pub grid_height: usize,
    pub nb_classes: usize,
    pub nb_anchors: usize,
    /// (width, height) anchor pairs in grid units.
    pub anchors: &'static [f32],
}

impl Default for PostprocessParams {
    fn default() -> Self {
        Self {
            conf_threshold: YOLOV2_CONF_THRESHOLD,
            iou_threshold: YOLOV2_IOU_THRESHOLD,
            max_boxes: YOLOV2_MAX_BOXES,
            grid_width: YOLOV2_GRID_WIDTH,
            grid_height: YOLOV2_GRID_HEIGHT,
            nb_classes: YOLOV2_NB_CLASSES,
            nb_anchors: YOLOV2_NB_ANCHORS,
            anchors: &YOLOV2_ANCHORS,
        }
    }
}

/// One decoded detection, normalized image coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Detection {
    pub x_center: f32,
    pub y_center: f32,
    pub width: f32,
    pub height: f32,
    pub conf: f32,
    pub class_index: usize,
}

/// Decoded detections of one cycle. Zero detections is an ordinary empty
/// result, not an error.
#[derive(Clone, Debug, Default)]
pub struct OdOutput {
    pub detections: Vec<Detection, YOLOV2_MAX_BOXES>,
}

impl OdOutput {
    pub fn clear(&mut self) {
        self.detections.clear();
    }
}

/// The decode/NMS stage, consumed as a black box.
pub trait Postprocess {
    /// Resolve the model-specific decode configuration once at startup.
    fn init(&mut self, params: &mut PostprocessParams);

    /// Decode the raw network outputs into `result`. Returns the number of
    /// detections kept.
    fn run(
        &mut self,
        outputs: &[&[f32]],
        result: &mut OdOutput,
        params: &PostprocessParams,
    ) -> usize;
}

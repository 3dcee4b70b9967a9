//! Flow magnitude classes and the stroke styles derived from them.

use riverflow_types::color::Rgba;
use serde::{Deserialize, Serialize};

/// Upper (exclusive) bounds of the flow classes, in m³/s.
pub const FLOW_BREAKS: [f64; 5] = [125.0, 600.0, 1435.0, 3656.0, 12565.0];

const FLOW_STEPS: [f64; 6] = [0.2, 0.3, 0.4, 0.6, 0.8, 1.0];

const FLOW_COLORS: [Rgba; 6] = [
    Rgba::opaque(255, 0, 0),
    Rgba::opaque(250, 127, 0),
    Rgba::opaque(255, 255, 0),
    Rgba::opaque(0, 255, 0),
    Rgba::opaque(0, 255, 255),
    Rgba::opaque(0, 255, 255),
];

/// Red (well below average) to blue (well above), one entry per 0.2 of ratio.
const RATIO_COLORS: [Rgba; 10] = [
    Rgba::opaque(255, 0, 0),
    Rgba::opaque(255, 51, 51),
    Rgba::opaque(255, 102, 102),
    Rgba::opaque(255, 153, 153),
    Rgba::opaque(255, 204, 204),
    Rgba::opaque(204, 204, 255),
    Rgba::opaque(153, 153, 255),
    Rgba::opaque(102, 102, 255),
    Rgba::opaque(51, 51, 255),
    Rgba::opaque(0, 0, 255),
];

/// Stroke order styles for orders 4 through 9; other orders use the plain style.
const ORDER_STYLES: [(u8, Rgba, f64); 6] = [
    (4, Rgba::opaque(197, 0, 255), 1.0),
    (5, Rgba::opaque(197, 0, 255), 1.0),
    (6, Rgba::opaque(255, 0, 0), 1.0),
    (7, Rgba::opaque(250, 127, 0), 1.0),
    (8, Rgba::opaque(255, 255, 0), 1.5),
    (9, Rgba::opaque(0, 255, 0), 2.0),
];

/// Width of strokes whose stream order has no style.
pub const UNSTYLED_ORDER_WIDTH: f64 = 0.3;

/// How stroke colors are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Translucent white everywhere
    #[default]
    Plain,
    /// Color by flow magnitude class
    Flow,
    /// Color by monthly flow relative to the ten-year average
    Comparison,
    /// Color and width by stream order (`S`)
    StreamOrder,
}

/// Index of the flow class containing `flow`. Each lower bound is inclusive.
pub fn flow_class(flow: f64) -> usize {
    FLOW_BREAKS
        .iter()
        .position(|&upper| flow < upper)
        .unwrap_or(FLOW_BREAKS.len())
}

/// Step value of the flow class; drives both speed and stroke width.
pub fn flow_step(flow: f64) -> f64 {
    FLOW_STEPS[flow_class(flow)]
}

/// Advance multiplier for a reconstructed flow.
pub fn speed_scale(flow: f64) -> f64 {
    flow_step(flow)
}

/// Stroke width for a reconstructed flow.
pub fn line_width(flow: f64) -> f64 {
    flow_step(flow)
}

/// Color for a flow magnitude.
pub fn flow_color(flow: f64) -> Rgba {
    FLOW_COLORS[flow_class(flow)]
}

/// Color for a flow / ten-year-average ratio, clamped to `[0, 2]`.
pub fn ratio_color(ratio: f64) -> Rgba {
    if ratio.is_nan() {
        return Rgba::TRANSLUCENT_WHITE;
    }
    let clamped = ratio.clamp(0.0, 2.0);
    let step = ((clamped / 0.2).floor() as usize).min(RATIO_COLORS.len() - 1);
    RATIO_COLORS[step]
}

/// Color and width for a stream order, `None` when the order has no style.
pub fn order_style(order: Option<u8>) -> Option<(Rgba, f64)> {
    let order = order?;
    ORDER_STYLES
        .iter()
        .find(|(o, _, _)| *o == order)
        .map(|&(_, color, width)| (color, width))
}

impl DisplayMode {
    /// Stroke color for a point with the given flow, ten-year average and
    /// stream order.
    pub fn color(&self, flow: f64, average: Option<f64>, order: Option<u8>) -> Rgba {
        match self {
            DisplayMode::Plain => Rgba::TRANSLUCENT_WHITE,
            DisplayMode::Flow => flow_color(flow),
            DisplayMode::Comparison => match average {
                Some(avg) if avg > 0.0 => ratio_color(flow / avg),
                _ => Rgba::TRANSLUCENT_WHITE,
            },
            DisplayMode::StreamOrder => {
                order_style(order).map_or(Rgba::TRANSLUCENT_WHITE, |(color, _)| color)
            }
        }
    }

    /// Stroke width: the flow class width, except in stream order mode.
    pub fn width(&self, flow_width: f64, order: Option<u8>) -> f64 {
        match self {
            DisplayMode::StreamOrder => {
                order_style(order).map_or(UNSTYLED_ORDER_WIDTH, |(_, width)| width)
            }
            _ => flow_width,
        }
    }
}

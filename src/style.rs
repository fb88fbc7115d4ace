//! Theme passed explicitly to layers through the painting context.

use crate::render::{BoxStyle, Color, LineStyle, TextStyle};

/// Visual theme for charts.
///
/// Created once by the embedding application and read by every layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Box of a HUD element.
    pub hud_box: BoxStyle,
    /// Box of the active HUD element.
    pub hud_box_active: BoxStyle,
    /// Label text of HUD elements.
    pub hud_text: TextStyle,
    /// Threshold lines.
    pub threshold_line: LineStyle,
    /// Threshold line of the active element.
    pub threshold_line_active: LineStyle,
    /// History lines.
    pub history_line: LineStyle,
}

impl Theme {
    /// Create the default theme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Box style of a HUD element.
    pub fn hud_box(&self, active: bool) -> &BoxStyle {
        if active { &self.hud_box_active } else { &self.hud_box }
    }

    /// Line style of a threshold line.
    pub fn threshold_line(&self, active: bool) -> &LineStyle {
        if active { &self.threshold_line_active } else { &self.threshold_line }
    }
}

impl Default for Theme {
    fn default() -> Self {
        let blue = Color::rgb8(0x00, 0x65, 0xa4);
        let dark_blue = Color::rgb8(0x00, 0x2c, 0x5c);
        Self {
            hud_box: BoxStyle {
                fill: Color::rgb8(0xe6, 0xf0, 0xf7),
                border: Some(blue),
                ..BoxStyle::default()
            },
            hud_box_active: BoxStyle {
                fill: Color::rgb8(0xe6, 0xf0, 0xf7),
                border: Some(dark_blue),
                border_width: 2.0,
                ..BoxStyle::default()
            },
            hud_text: TextStyle::default(),
            threshold_line: LineStyle {
                color: blue,
                width: 1.0,
                dashes: Some((4.0, 4.0)),
            },
            threshold_line_active: LineStyle {
                color: dark_blue,
                width: 2.0,
                dashes: None,
            },
            history_line: LineStyle {
                color: blue,
                width: 1.0,
                dashes: None,
            },
        }
    }
}

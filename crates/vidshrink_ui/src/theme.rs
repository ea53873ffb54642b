//! Theme constants for vidshrink.

use iced::Color;

/// Text and state colors.
pub mod colors {
    use super::Color;

    /// Secondary text (status line, hints)
    pub const TEXT_SECONDARY: Color = Color::from_rgb(0.53, 0.53, 0.53);

    /// Success text (saved notice)
    pub const SUCCESS: Color = Color::from_rgb(0.25, 0.60, 0.30);

    /// Error text
    pub const ERROR: Color = Color::from_rgb(0.80, 0.25, 0.25);
}

/// Spacing constants.
pub mod spacing {
    /// Extra small spacing (4px)
    pub const XS: f32 = 4.0;
    /// Small spacing (8px)
    pub const SM: f32 = 8.0;
    /// Medium spacing (12px)
    pub const MD: f32 = 12.0;
    /// Large spacing (16px)
    pub const LG: f32 = 16.0;
    /// Extra large spacing (24px)
    pub const XL: f32 = 24.0;
}

/// Font sizes.
pub mod font {
    pub const SM: u32 = 11;
    pub const NORMAL: u32 = 13;
    pub const HEADER: u32 = 22;
}

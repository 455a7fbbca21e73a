use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    /// Span bar fill, cycled per service.
    SpanBar(u8),
    SpanBarError,

    RowBackground,
    RowBackgroundAlt,
    RowHover,
    DetailBackground,
    DetailText,

    TextPrimary,
    TextSecondary,
    TextMuted,
    SearchMatch,

    Background,
    Border,

    // Header / ticks
    HeaderBackground,
    TickLine,
    TickText,

    // Column resizer
    ResizerGrip,
    ResizerDragRegion,

    // Minimap and reframing
    MinimapBackground,
    MinimapInactive,
    MinimapHandle,
    CursorGuide,
    ReframeRegion,
    ShiftRegion,
}

impl ThemeToken {
    /// Number of distinct service colors in the span bar palette.
    pub const SPAN_PALETTE_LEN: u8 = 8;

    /// Stable palette slot for a service name.
    pub fn for_service(service: &str) -> Self {
        let hash = service
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        ThemeToken::SpanBar((hash % u32::from(Self::SPAN_PALETTE_LEN)) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_color_is_stable_and_in_palette() {
        let a = ThemeToken::for_service("frontend");
        assert_eq!(a, ThemeToken::for_service("frontend"));
        match a {
            ThemeToken::SpanBar(slot) => assert!(slot < ThemeToken::SPAN_PALETTE_LEN),
            other => unreachable!("unexpected token {other:?}"),
        }
    }
}

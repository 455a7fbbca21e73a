//! Keyboard shortcuts of the timeline.
//!
//! A [`ShortcutBinder`] is owned by the view that handles the keys. It only
//! dispatches while attached, so keys pressed before the timeline is mounted
//! (or after it is torn down) fall through.

use std::collections::HashMap;

use tracing::debug;
use waterfall_protocol::{KeyChord, KeyCode};

use crate::config::TimelineConfig;
use crate::model::ViewRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutAction {
    ScrollPageDown,
    ScrollPageUp,
    ScrollToNextVisibleSpan,
    ScrollToPrevVisibleSpan,
    PanLeft,
    PanLeftFast,
    PanRight,
    PanRightFast,
    ZoomIn,
    ZoomInFast,
    ZoomOut,
    ZoomOutFast,
    CollapseAll,
    ExpandAll,
    CollapseOne,
    ExpandOne,
    FocusSearch,
    ClearSearch,
}

impl ShortcutAction {
    /// `(start_change, end_change)` applied to the view range, for the pan
    /// and zoom actions.
    pub fn view_adjustment(self, config: &TimelineConfig) -> Option<(f64, f64)> {
        let step = config.pan_step;
        let fast = config.pan_step_fast;
        Some(match self {
            ShortcutAction::PanLeft => (-step, -step),
            ShortcutAction::PanLeftFast => (-fast, -fast),
            ShortcutAction::PanRight => (step, step),
            ShortcutAction::PanRightFast => (fast, fast),
            ShortcutAction::ZoomIn => (step, -step),
            ShortcutAction::ZoomInFast => (fast, -fast),
            ShortcutAction::ZoomOut => (-step, step),
            ShortcutAction::ZoomOutFast => (-fast, fast),
            _ => return None,
        })
    }

    /// The view range after a pan or zoom, `None` for other actions.
    pub fn adjust_view(self, view: &ViewRange, config: &TimelineConfig) -> Option<ViewRange> {
        let (start_change, end_change) = self.view_adjustment(config)?;
        Some(view.adjust(start_change, end_change, config.min_view_range))
    }

    pub fn describe(self) -> &'static str {
        match self {
            ShortcutAction::ScrollPageDown => "page down",
            ShortcutAction::ScrollPageUp => "page up",
            ShortcutAction::ScrollToNextVisibleSpan => "next span",
            ShortcutAction::ScrollToPrevVisibleSpan => "previous span",
            ShortcutAction::PanLeft => "pan left",
            ShortcutAction::PanLeftFast => "pan left fast",
            ShortcutAction::PanRight => "pan right",
            ShortcutAction::PanRightFast => "pan right fast",
            ShortcutAction::ZoomIn => "zoom in",
            ShortcutAction::ZoomInFast => "zoom in fast",
            ShortcutAction::ZoomOut => "zoom out",
            ShortcutAction::ZoomOutFast => "zoom out fast",
            ShortcutAction::CollapseAll => "collapse all",
            ShortcutAction::ExpandAll => "expand all",
            ShortcutAction::CollapseOne => "collapse one level",
            ShortcutAction::ExpandOne => "expand one level",
            ShortcutAction::FocusSearch => "search",
            ShortcutAction::ClearSearch => "clear search",
        }
    }
}

fn default_keymap() -> HashMap<KeyChord, ShortcutAction> {
    use KeyCode::{Char, Down, Esc, Left, Right, Up};
    use ShortcutAction as A;
    let plain = KeyChord::plain;
    let shift = KeyChord::shift;
    [
        (plain(Char('s')), A::ScrollPageDown),
        (plain(Char('w')), A::ScrollPageUp),
        (plain(Char('f')), A::ScrollToNextVisibleSpan),
        (plain(Char('b')), A::ScrollToPrevVisibleSpan),
        (plain(Char('a')), A::PanLeft),
        (plain(Left), A::PanLeft),
        (shift(Char('a')), A::PanLeftFast),
        (shift(Left), A::PanLeftFast),
        (plain(Char('d')), A::PanRight),
        (plain(Right), A::PanRight),
        (shift(Char('d')), A::PanRightFast),
        (shift(Right), A::PanRightFast),
        (plain(Up), A::ZoomIn),
        (shift(Up), A::ZoomInFast),
        (plain(Down), A::ZoomOut),
        (shift(Down), A::ZoomOutFast),
        (plain(Char(']')), A::CollapseAll),
        (plain(Char('[')), A::ExpandAll),
        (plain(Char('p')), A::CollapseOne),
        (plain(Char('o')), A::ExpandOne),
        (KeyChord::ctrl(Char('b')), A::FocusSearch),
        (plain(Esc), A::ClearSearch),
    ]
    .into_iter()
    .collect()
}

/// Terminals report shift+a as `A`; fold that into the lowercase chord.
fn normalize(chord: KeyChord) -> KeyChord {
    match chord.code {
        KeyCode::Char(c) if c.is_ascii_uppercase() => KeyChord {
            code: KeyCode::Char(c.to_ascii_lowercase()),
            shift: true,
            ..chord
        },
        _ => chord,
    }
}

#[derive(Debug, Clone)]
pub struct ShortcutBinder {
    keymap: HashMap<KeyChord, ShortcutAction>,
    attached: bool,
}

impl Default for ShortcutBinder {
    fn default() -> Self {
        Self {
            keymap: default_keymap(),
            attached: false,
        }
    }
}

impl ShortcutBinder {
    pub fn attach(&mut self) {
        if !self.attached {
            debug!(bindings = self.keymap.len(), "shortcuts attached");
        }
        self.attached = true;
    }

    pub fn detach(&mut self) {
        if self.attached {
            debug!("shortcuts detached");
        }
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Bind (or rebind) a chord.
    pub fn bind(&mut self, chord: KeyChord, action: ShortcutAction) {
        self.keymap.insert(normalize(chord), action);
    }

    pub fn dispatch(&self, chord: KeyChord) -> Option<ShortcutAction> {
        if !self.attached {
            return None;
        }
        self.keymap.get(&normalize(chord)).copied()
    }

    /// Every chord bound to `action`, for help text.
    pub fn chords_for(&self, action: ShortcutAction) -> Vec<KeyChord> {
        let mut chords: Vec<KeyChord> = self
            .keymap
            .iter()
            .filter(|&(_, a)| *a == action)
            .map(|(chord, _)| *chord)
            .collect();
        chords.sort_by_key(|c| (c.shift, c.ctrl, format!("{:?}", c.code)));
        chords
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached() -> ShortcutBinder {
        let mut binder = ShortcutBinder::default();
        binder.attach();
        binder
    }

    #[test]
    fn detached_binder_dispatches_nothing() {
        let mut binder = ShortcutBinder::default();
        let key = KeyChord::plain(KeyCode::Char('s'));
        assert_eq!(binder.dispatch(key), None);
        binder.attach();
        assert_eq!(binder.dispatch(key), Some(ShortcutAction::ScrollPageDown));
        binder.detach();
        assert_eq!(binder.dispatch(key), None);
    }

    #[test]
    fn default_keymap_covers_navigation() {
        let binder = attached();
        let cases = [
            (KeyChord::plain(KeyCode::Char('w')), ShortcutAction::ScrollPageUp),
            (KeyChord::plain(KeyCode::Char('f')), ShortcutAction::ScrollToNextVisibleSpan),
            (KeyChord::plain(KeyCode::Char('b')), ShortcutAction::ScrollToPrevVisibleSpan),
            (KeyChord::plain(KeyCode::Left), ShortcutAction::PanLeft),
            (KeyChord::shift(KeyCode::Right), ShortcutAction::PanRightFast),
            (KeyChord::plain(KeyCode::Up), ShortcutAction::ZoomIn),
            (KeyChord::plain(KeyCode::Char(']')), ShortcutAction::CollapseAll),
            (KeyChord::plain(KeyCode::Char('o')), ShortcutAction::ExpandOne),
            (KeyChord::plain(KeyCode::Esc), ShortcutAction::ClearSearch),
        ];
        for (chord, action) in cases {
            assert_eq!(binder.dispatch(chord), Some(action), "{chord:?}");
        }
        assert_eq!(binder.dispatch(KeyChord::plain(KeyCode::Char('z'))), None);
    }

    #[test]
    fn uppercase_letters_are_shifted_chords() {
        let binder = attached();
        assert_eq!(
            binder.dispatch(KeyChord::plain(KeyCode::Char('A'))),
            Some(ShortcutAction::PanLeftFast)
        );
        assert_eq!(
            binder.dispatch(KeyChord::shift(KeyCode::Char('D'))),
            Some(ShortcutAction::PanRightFast)
        );
    }

    #[test]
    fn rebinding_replaces_the_action() {
        let mut binder = attached();
        binder.bind(KeyChord::plain(KeyCode::Char('s')), ShortcutAction::ExpandAll);
        assert_eq!(
            binder.dispatch(KeyChord::plain(KeyCode::Char('s'))),
            Some(ShortcutAction::ExpandAll)
        );
        assert_eq!(binder.chords_for(ShortcutAction::PanLeft).len(), 2);
    }

    #[test]
    fn pan_and_zoom_adjust_the_view() {
        let config = TimelineConfig::default();
        let view = ViewRange::new(0.2, 0.6);

        let panned = ShortcutAction::PanRightFast
            .adjust_view(&view, &config)
            .expect("pan action");
        assert!((panned.start() - 0.25).abs() < 1e-9);
        assert!((panned.end() - 0.65).abs() < 1e-9);

        let zoomed = ShortcutAction::ZoomIn
            .adjust_view(&view, &config)
            .expect("zoom action");
        assert!((zoomed.start() - 0.205).abs() < 1e-9);
        assert!((zoomed.end() - 0.595).abs() < 1e-9);

        assert_eq!(ShortcutAction::CollapseAll.adjust_view(&view, &config), None);
    }
}

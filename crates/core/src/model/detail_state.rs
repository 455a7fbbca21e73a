use std::collections::BTreeSet;

/// Open/closed state of the log section and of individual log entries
/// (by index into the span's `logs`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogsState {
    pub is_open: bool,
    pub opened_items: BTreeSet<usize>,
}

/// A section of the detail panel a click can open or close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailSection {
    Tags,
    Process,
    Logs,
    LogItem(usize),
    Warnings,
    References,
}

/// Which sections of a span's expanded detail row are open.
///
/// Toggles return a new value; a snapshot handed to the renderer is never
/// mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailState {
    pub is_tags_open: bool,
    pub is_process_open: bool,
    pub is_warnings_open: bool,
    pub is_references_open: bool,
    pub logs: LogsState,
}

impl DetailState {
    pub fn toggle_tags(&self) -> Self {
        Self {
            is_tags_open: !self.is_tags_open,
            ..self.clone()
        }
    }

    pub fn toggle_process(&self) -> Self {
        Self {
            is_process_open: !self.is_process_open,
            ..self.clone()
        }
    }

    pub fn toggle_warnings(&self) -> Self {
        Self {
            is_warnings_open: !self.is_warnings_open,
            ..self.clone()
        }
    }

    pub fn toggle_references(&self) -> Self {
        Self {
            is_references_open: !self.is_references_open,
            ..self.clone()
        }
    }

    pub fn toggle_logs(&self) -> Self {
        let mut next = self.clone();
        next.logs.is_open = !next.logs.is_open;
        next
    }

    pub fn toggle_section(&self, section: DetailSection) -> Self {
        match section {
            DetailSection::Tags => self.toggle_tags(),
            DetailSection::Process => self.toggle_process(),
            DetailSection::Logs => self.toggle_logs(),
            DetailSection::LogItem(index) => self.toggle_log_item(index),
            DetailSection::Warnings => self.toggle_warnings(),
            DetailSection::References => self.toggle_references(),
        }
    }

    pub fn toggle_log_item(&self, log_index: usize) -> Self {
        let mut next = self.clone();
        if !next.logs.opened_items.remove(&log_index) {
            next.logs.opened_items.insert(log_index);
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_leave_original_untouched() {
        let closed = DetailState::default();
        let open = closed.toggle_tags().toggle_logs();
        assert!(open.is_tags_open);
        assert!(open.logs.is_open);
        assert!(!closed.is_tags_open);
        assert!(!closed.logs.is_open);
    }

    #[test]
    fn log_items_toggle_individually() {
        let state = DetailState::default().toggle_log_item(2).toggle_log_item(5);
        assert_eq!(state.logs.opened_items.iter().copied().collect::<Vec<_>>(), vec![2, 5]);
        let state = state.toggle_log_item(2);
        assert_eq!(state.logs.opened_items.iter().copied().collect::<Vec<_>>(), vec![5]);
        let state = state.toggle_section(DetailSection::LogItem(5)).toggle_section(DetailSection::Warnings);
        assert!(state.logs.opened_items.is_empty());
        assert!(state.is_warnings_open);
    }
}

//! Draft slider values for the mood remix panel.
//!
//! The draft is a copy of the live document's sliders taken when the panel
//! opens.  Nothing here writes back to the document; `confirm` hands the
//! values to whoever starts the next generation.

use moodmix_proto::mood::{MoodAxisKind, MoodSliders};

#[derive(Debug, Clone, Default)]
pub struct RemixDraft {
    draft: Option<MoodSliders>,
    selected: usize,
}

impl RemixDraft {
    pub fn open(&mut self, current: &MoodSliders) {
        self.draft = Some(*current);
        self.selected = 0;
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    pub fn values(&self) -> Option<&MoodSliders> {
        self.draft.as_ref()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_kind(&self) -> MoodAxisKind {
        MoodAxisKind::ALL[self.selected]
    }

    pub fn select(&mut self, index: usize) {
        if index < MoodAxisKind::ALL.len() {
            self.selected = index;
        }
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % MoodAxisKind::ALL.len();
    }

    pub fn select_prev(&mut self) {
        let n = MoodAxisKind::ALL.len();
        self.selected = (self.selected + n - 1) % n;
    }

    /// Nudge the selected axis, clamped to `0..=100`.
    pub fn adjust(&mut self, delta: i16) {
        let kind = self.selected_kind();
        if let Some(draft) = self.draft.as_mut() {
            let v = (draft.get(kind) as i16 + delta).clamp(0, 100) as u8;
            draft.set(kind, v);
        }
    }

    pub fn set(&mut self, kind: MoodAxisKind, value: u8) {
        if let Some(draft) = self.draft.as_mut() {
            draft.set(kind, value);
        }
    }

    /// Close the panel, returning the edited values.
    pub fn confirm(&mut self) -> Option<MoodSliders> {
        self.draft.take()
    }

    pub fn cancel(&mut self) {
        self.draft = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live() -> MoodSliders {
        MoodSliders {
            energy: 75,
            tempo: 40,
            temperature: 30,
            brightness: 60,
            atmosphere: 35,
            density: 95,
        }
    }

    #[test]
    fn test_open_seeds_from_live() {
        let mut d = RemixDraft::default();
        assert!(!d.is_open());
        d.open(&live());
        assert_eq!(d.values(), Some(&live()));
        assert_eq!(d.selected_kind(), MoodAxisKind::Energy);
    }

    #[test]
    fn test_adjust_is_clamped_and_copy_only() {
        let doc = live();
        let mut d = RemixDraft::default();
        d.open(&doc);
        d.adjust(50);
        assert_eq!(d.values().unwrap().energy, 100);
        d.select_prev();
        assert_eq!(d.selected_kind(), MoodAxisKind::Density);
        d.adjust(-120);
        assert_eq!(d.values().unwrap().density, 0);
        assert_eq!(doc, live());
    }

    #[test]
    fn test_confirm_returns_draft_and_closes() {
        let mut d = RemixDraft::default();
        d.open(&live());
        d.set(MoodAxisKind::Tempo, 90);
        let out = d.confirm().unwrap();
        assert_eq!(out.tempo, 90);
        assert!(!d.is_open());
        assert_eq!(d.confirm(), None);
    }

    #[test]
    fn test_cancel_discards() {
        let mut d = RemixDraft::default();
        d.open(&live());
        d.adjust(-10);
        d.cancel();
        assert!(!d.is_open());
        d.open(&live());
        assert_eq!(d.values(), Some(&live()));
    }

    #[test]
    fn test_edits_ignored_when_closed() {
        let mut d = RemixDraft::default();
        d.adjust(10);
        d.set(MoodAxisKind::Energy, 10);
        assert_eq!(d.values(), None);
    }
}

//! Three-line source/target synchronized display (§4.7).

use std::collections::VecDeque;

use crate::config::DisplayModelConfig;

use super::similarity::leading_token_similarity;

const DISPLAY_CHARS_PER_LINE: usize = 40;
const MERGE_THRESHOLD: f32 = 0.7;

/// Where a pair currently sits in the three-row layout. Purely a view
/// over position in [`RealtimeDisplayModel`]'s internal ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairRole {
    Recent,
    Older,
    Oldest,
}

fn role_at(index: usize) -> PairRole {
    match index {
        0 => PairRole::Recent,
        1 => PairRole::Older,
        _ => PairRole::Oldest,
    }
}

/// Lifecycle of one display pair: `Active -> Fading -> Completed ->
/// Removed`. Transitions other than this sequence are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairState {
    Active,
    Fading,
    Completed,
    Removed,
}

#[derive(Debug, Clone)]
pub struct DisplayPair {
    pub segment_id: String,
    pub source_text: String,
    pub target_text: String,
    pub source_is_final: bool,
    pub target_is_complete: bool,
    pub state: PairState,
    pub started_at: u64,
    pub translation_started_at: Option<u64>,
    pub source_lines: usize,
    pub target_lines: usize,
}

impl DisplayPair {
    fn advance(&mut self, next: PairState) {
        let allowed = matches!(
            (self.state, next),
            (PairState::Active, PairState::Fading)
                | (PairState::Fading, PairState::Completed)
                | (PairState::Completed, PairState::Removed)
                | (PairState::Active, PairState::Completed)
        );
        if allowed {
            self.state = next;
        }
    }
}

fn line_count(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        (text.chars().count() + DISPLAY_CHARS_PER_LINE - 1) / DISPLAY_CHARS_PER_LINE
    }
}

/// Holds up to three visible pairs (recent/older/oldest) plus any number
/// still draining through their removal hold window.
pub struct RealtimeDisplayModel {
    config: DisplayModelConfig,
    pairs: VecDeque<DisplayPair>,
    last_translated_index: Option<usize>,
}

impl RealtimeDisplayModel {
    pub fn new(config: DisplayModelConfig) -> Self {
        Self { config, pairs: VecDeque::new(), last_translated_index: None }
    }

    pub fn pairs(&self) -> impl Iterator<Item = (PairRole, &DisplayPair)> {
        self.pairs.iter().enumerate().map(|(i, p)| (role_at(i), p))
    }

    /// Merge an interim ASR update into the current pending pair if
    /// similar enough, per the dedup rule; otherwise it is dropped (a
    /// new pair is only ever started by a final segment) (§4.7).
    pub fn on_interim(&mut self, text: &str, now_ms: u64) {
        self.tick(now_ms);
        match self.pairs.front_mut() {
            Some(front) if !front.source_is_final => {
                if leading_token_similarity(&front.source_text, text) >= MERGE_THRESHOLD {
                    front.source_text = text.to_string();
                    front.source_lines = line_count(&front.source_text);
                }
            }
            Some(_) => {}
            None => {
                self.pairs.push_front(DisplayPair {
                    segment_id: String::new(),
                    source_text: text.to_string(),
                    target_text: String::new(),
                    source_is_final: false,
                    target_is_complete: false,
                    state: PairState::Active,
                    started_at: now_ms,
                    translation_started_at: None,
                    source_lines: line_count(text),
                    target_lines: 0,
                });
            }
        }
    }

    /// Finalize the current pending pair in place, or start a new recent
    /// pair if the current front is already final (§4.7).
    pub fn on_final(&mut self, segment_id: &str, text: &str, now_ms: u64) {
        self.tick(now_ms);
        if let Some(front) = self.pairs.front_mut() {
            if !front.source_is_final {
                front.segment_id = segment_id.to_string();
                front.source_text = text.to_string();
                front.source_is_final = true;
                front.source_lines = line_count(text);
                return;
            }
        }
        self.push_new_pair(segment_id, text, now_ms);
    }

    fn push_new_pair(&mut self, segment_id: &str, text: &str, now_ms: u64) {
        self.pairs.push_front(DisplayPair {
            segment_id: segment_id.to_string(),
            source_text: text.to_string(),
            target_text: String::new(),
            source_is_final: true,
            target_is_complete: false,
            state: PairState::Active,
            started_at: now_ms,
            translation_started_at: None,
            source_lines: line_count(text),
            target_lines: 0,
        });
        self.last_translated_index = self.last_translated_index.map(|i| i + 1);
        self.retire_overflow();
    }

    fn retire_overflow(&mut self) {
        for (i, pair) in self.pairs.iter_mut().enumerate() {
            if i >= 3 && pair.state == PairState::Active {
                pair.advance(PairState::Fading);
            }
        }
    }

    /// Apply one cumulative translation update using the pairing
    /// heuristic: the oldest live pair with a final source and no target
    /// yet; else the pair whose target is most similar; else the most
    /// recently started translated pair. `text` is the full cumulative
    /// target text produced so far for that job, so it replaces rather
    /// than appends to the pair's current target (§4.3, §4.7).
    pub fn apply_translation_text(&mut self, text: &str, now_ms: u64) {
        self.tick(now_ms);
        if text.is_empty() {
            return;
        }
        let idx = self
            .pairs
            .iter()
            .position(|p| p.source_is_final && p.target_text.is_empty())
            .or_else(|| {
                self.pairs
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| !p.target_text.is_empty())
                    .max_by(|(_, a), (_, b)| {
                        leading_token_similarity(&a.target_text, text)
                            .partial_cmp(&leading_token_similarity(&b.target_text, text))
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .map(|(i, _)| i)
            })
            .or_else(|| {
                self.pairs
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.translation_started_at.is_some())
                    .max_by_key(|(_, p)| p.translation_started_at)
                    .map(|(i, _)| i)
            });

        if let Some(idx) = idx {
            self.last_translated_index = Some(idx);
            if let Some(pair) = self.pairs.get_mut(idx) {
                if pair.translation_started_at.is_none() {
                    pair.translation_started_at = Some(now_ms);
                }
                pair.target_text = text.to_string();
                pair.target_lines = line_count(&pair.target_text);
            }
        }
    }

    /// Mark the most recently translated pair's target complete.
    pub fn complete_translation(&mut self, now_ms: u64) {
        self.tick(now_ms);
        if let Some(idx) = self.last_translated_index {
            if let Some(pair) = self.pairs.get_mut(idx) {
                pair.target_is_complete = true;
                if pair.source_is_final {
                    pair.advance(PairState::Fading);
                }
            }
        }
    }

    /// Advance lifecycle states and drop pairs past their removal hold
    /// window, from the oldest end inward (§4.7, §8).
    fn tick(&mut self, now_ms: u64) {
        while let Some(back) = self.pairs.back() {
            if !self.removal_eligible(back, now_ms) {
                break;
            }
            match back.state {
                PairState::Completed | PairState::Removed => {
                    self.pairs.pop_back();
                    self.last_translated_index =
                        self.last_translated_index.and_then(|i| if i == self.pairs.len() { None } else { Some(i) });
                }
                PairState::Active | PairState::Fading => {
                    let idx = self.pairs.len() - 1;
                    self.pairs[idx].advance(PairState::Completed);
                }
            }
        }
    }

    fn removal_eligible(&self, pair: &DisplayPair, now_ms: u64) -> bool {
        let min_display_ok = now_ms.saturating_sub(pair.started_at) >= self.config.min_display_ms;
        let translation_ok = match pair.translation_started_at {
            Some(t) => now_ms.saturating_sub(t) >= self.config.translation_hold_ms,
            None => true,
        };
        min_display_ok && translation_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DisplayModelConfig {
        DisplayModelConfig {
            translation_hold_ms: 1_500,
            min_display_ms: 1_500,
            fade_in_ms: 200,
            fade_out_ms: 300,
            opacity_recent: 1.0,
            opacity_older: 0.6,
            opacity_oldest_min: 0.3,
            opacity_oldest_max: 0.4,
        }
    }

    #[test]
    fn interim_updates_in_place_until_final() {
        let mut model = RealtimeDisplayModel::new(config());
        model.on_interim("Life", 0);
        model.on_interim("Life asks", 160);
        model.on_interim("Life asks us", 320);
        assert_eq!(model.pairs().count(), 1);
        model.on_final("s1", "Life asks us to wait.", 480);
        assert_eq!(model.pairs().count(), 1);
        let (role, pair) = model.pairs().next().unwrap();
        assert_eq!(role, PairRole::Recent);
        assert_eq!(pair.source_text, "Life asks us to wait.");
        assert!(pair.source_is_final);
    }

    #[test]
    fn dissimilar_interim_is_dropped_not_a_new_pair() {
        let mut model = RealtimeDisplayModel::new(config());
        model.on_interim("Hello world", 0);
        model.on_interim("Completely unrelated text", 100);
        assert_eq!(model.pairs().count(), 1);
        let (_, pair) = model.pairs().next().unwrap();
        assert_eq!(pair.source_text, "Hello world");
    }

    #[test]
    fn a_second_final_demotes_the_first_to_older() {
        let mut model = RealtimeDisplayModel::new(config());
        model.on_final("s1", "First sentence.", 0);
        model.on_final("s2", "Second sentence.", 10);
        let pairs: Vec<_> = model.pairs().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, PairRole::Recent);
        assert_eq!(pairs[0].1.source_text, "Second sentence.");
        assert_eq!(pairs[1].0, PairRole::Older);
        assert_eq!(pairs[1].1.source_text, "First sentence.");
    }

    #[test]
    fn translation_text_targets_the_final_pair_awaiting_translation() {
        let mut model = RealtimeDisplayModel::new(config());
        model.on_final("s1", "Hello world.", 0);
        model.apply_translation_text("こんにちは", 10);
        model.apply_translation_text("こんにちは、世界。", 20);
        let (_, pair) = model.pairs().next().unwrap();
        assert_eq!(pair.target_text, "こんにちは、世界。");
        assert_eq!(pair.translation_started_at, Some(10));
    }

    #[test]
    fn a_completed_pair_is_not_removed_before_min_display_ms() {
        let mut model = RealtimeDisplayModel::new(config());
        model.on_final("s1", "Hello.", 0);
        model.apply_translation_text("Konnichiwa.", 5);
        model.complete_translation(10);
        model.on_final("s2", "Goodbye.", 100);
        assert_eq!(model.pairs().count(), 2);
        model.tick(1_000);
        assert_eq!(model.pairs().count(), 2);
    }

    #[test]
    fn a_completed_pair_is_removed_after_both_hold_windows() {
        let mut model = RealtimeDisplayModel::new(config());
        model.on_final("s1", "Hello.", 0);
        model.apply_translation_text("Konnichiwa.", 5);
        model.complete_translation(10);
        model.tick(2_000);
        assert_eq!(model.pairs().count(), 0);
    }
}

//! Group finalized sentence/paragraph translations into persisted
//! history blocks (§4.8).

use crate::config::HistoryGrouperConfig;

/// One item accepted into the current or a past block.
#[derive(Debug, Clone)]
pub struct HistoryItem {
    pub sentence_id: String,
    pub original: String,
    pub translation: Option<String>,
    pub ts: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Sentences,
    Paragraph,
}

/// A persisted block of one or more sentences (or exactly one
/// paragraph), the single authoritative record for its items (§5).
#[derive(Debug, Clone)]
pub struct HistoryBlock {
    pub id: String,
    pub kind: BlockKind,
    pub items: Vec<HistoryItem>,
    pub height: f32,
}

/// Signal returned by [`HistoryGrouper::update_translation`]: whether the
/// block needs a `history-block-updated` event, and nothing if the
/// translation was already set (first write wins) or the id is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    AppliedToPending,
    AppliedToEmittedBlock,
    AlreadySet,
    UnknownSentence,
}

struct Emitted {
    block: HistoryBlock,
}

pub struct HistoryGrouper {
    config: HistoryGrouperConfig,
    pending: Vec<HistoryItem>,
    emitted: Vec<Emitted>,
    next_id: u64,
}

impl HistoryGrouper {
    pub fn new(config: HistoryGrouperConfig) -> Self {
        Self { config, pending: Vec::new(), emitted: Vec::new(), next_id: 0 }
    }

    /// Add one finalized sentence. Returns a freshly emitted block when
    /// the buffer reaches `max_sentences_per_block`, or reaches
    /// `min_sentences_per_block` with a natural break present (§4.8).
    pub fn add_sentence(&mut self, item: HistoryItem) -> Option<HistoryBlock> {
        let natural_break = self.gap_to_last(&item) >= self.config.natural_break_gap_ms || ends_with_break(&item.original);
        self.pending.push(item);

        let count = self.sentence_count();
        if count >= self.config.max_sentences_per_block {
            return Some(self.emit(BlockKind::Sentences));
        }
        if count >= self.config.min_sentences_per_block && natural_break {
            return Some(self.emit(BlockKind::Sentences));
        }
        None
    }

    /// Immediately flush any pending buffer and emit a single-item
    /// paragraph block.
    pub fn add_paragraph(&mut self, item: HistoryItem) -> (Option<HistoryBlock>, HistoryBlock) {
        let flushed = if self.pending.is_empty() { None } else { Some(self.emit(BlockKind::Sentences)) };
        self.pending.push(item);
        let block = self.emit(BlockKind::Paragraph);
        (flushed, block)
    }

    /// Update a sentence's stored translation. First write wins; repeat
    /// calls after the first are idempotent no-ops (§8).
    pub fn update_translation(&mut self, sentence_id: &str, new_translation: &str) -> UpdateOutcome {
        for item in self.pending.iter_mut() {
            if item.sentence_id == sentence_id {
                if item.translation.is_some() {
                    return UpdateOutcome::AlreadySet;
                }
                item.translation = Some(new_translation.to_string());
                return UpdateOutcome::AppliedToPending;
            }
        }
        for emitted in self.emitted.iter_mut() {
            for item in emitted.block.items.iter_mut() {
                if item.sentence_id == sentence_id {
                    if item.translation.is_some() {
                        return UpdateOutcome::AlreadySet;
                    }
                    item.translation = Some(new_translation.to_string());
                    emitted.block.height = compute_height(&emitted.block.items, &self.config);
                    return UpdateOutcome::AppliedToEmittedBlock;
                }
            }
        }
        UpdateOutcome::UnknownSentence
    }

    pub fn block(&self, id: &str) -> Option<&HistoryBlock> {
        self.emitted.iter().map(|e| &e.block).find(|b| b.id == id)
    }

    /// Find the emitted block currently holding `sentence_id`, for
    /// building a `history-block-updated` event after `update_translation`
    /// reports `AppliedToEmittedBlock`.
    pub fn block_for_sentence(&self, sentence_id: &str) -> Option<&HistoryBlock> {
        self.emitted.iter().map(|e| &e.block).find(|b| b.items.iter().any(|i| i.sentence_id == sentence_id))
    }

    fn sentence_count(&self) -> usize {
        let period_count = self.pending.iter().map(|i| i.original.matches('。').count()).sum::<usize>();
        let dot_count = self.pending.iter().map(|i| i.original.matches('.').count()).sum::<usize>();
        period_count.max(dot_count).max(1)
    }

    fn gap_to_last(&self, incoming: &HistoryItem) -> u64 {
        match self.pending.last() {
            Some(last) => incoming.ts.saturating_sub(last.ts),
            None => 0,
        }
    }

    fn emit(&mut self, kind: BlockKind) -> HistoryBlock {
        self.next_id += 1;
        let items = std::mem::take(&mut self.pending);
        let height = compute_height(&items, &self.config);
        let block = HistoryBlock { id: format!("history_{}", self.next_id), kind, items, height };
        self.emitted.push(Emitted { block: block.clone() });
        block
    }
}

fn ends_with_break(text: &str) -> bool {
    const BREAKS: &[char] = &['.', '。', '?', '?', '!', '!'];
    text.trim_end().chars().last().map(|c| BREAKS.contains(&c)).unwrap_or(false)
}

fn line_count(text: &str, chars_per_line: usize) -> usize {
    if text.is_empty() {
        0
    } else {
        (text.chars().count() + chars_per_line - 1) / chars_per_line
    }
}

fn compute_height(items: &[HistoryItem], config: &HistoryGrouperConfig) -> f32 {
    let sum: usize = items
        .iter()
        .map(|item| {
            let source_lines = line_count(&item.original, config.chars_per_line);
            let target_lines = item.translation.as_deref().map(|t| line_count(t, config.chars_per_line)).unwrap_or(0);
            source_lines.max(target_lines)
        })
        .sum();
    sum as f32 * config.line_height + config.padding
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HistoryGrouperConfig {
        HistoryGrouperConfig {
            min_sentences_per_block: 3,
            max_sentences_per_block: 5,
            natural_break_gap_ms: 3_000,
            chars_per_line: 40,
            line_height: 24.0,
            padding: 16.0,
        }
    }

    fn item(id: &str, text: &str, ts: u64) -> HistoryItem {
        HistoryItem { sentence_id: id.into(), original: text.into(), translation: None, ts }
    }

    #[test]
    fn emits_block_at_min_with_natural_break() {
        let mut grouper = HistoryGrouper::new(config());
        assert!(grouper.add_sentence(item("s1", "A.", 0)).is_none());
        assert!(grouper.add_sentence(item("s2", "B.", 100)).is_none());
        let block = grouper.add_sentence(item("s3", "C.", 200)).unwrap();
        assert_eq!(block.items.len(), 3);
        assert_eq!(block.kind, BlockKind::Sentences);
    }

    #[test]
    fn emits_at_max_even_without_natural_break() {
        // Each item embeds one mid-text period (e.g. an abbreviation) so the
        // punctuation count climbs to max without ever ending in a terminator.
        let mut grouper = HistoryGrouper::new(config());
        for (i, label) in ["a", "b", "c", "d"].iter().enumerate() {
            assert!(grouper.add_sentence(item(label, "the U.S. delegation spoke", i as u64 * 10)).is_none());
        }
        let block = grouper.add_sentence(item("e", "the U.S. delegation spoke", 40)).unwrap();
        assert_eq!(block.items.len(), 5);
    }

    #[test]
    fn add_paragraph_flushes_pending_and_emits_single_item_block() {
        let mut grouper = HistoryGrouper::new(config());
        grouper.add_sentence(item("s1", "Partial thought", 0));
        let (flushed, paragraph_block) = grouper.add_paragraph(item("p1", "A whole paragraph.", 100));
        let flushed = flushed.unwrap();
        assert_eq!(flushed.items.len(), 1);
        assert_eq!(flushed.kind, BlockKind::Sentences);
        assert_eq!(paragraph_block.kind, BlockKind::Paragraph);
        assert_eq!(paragraph_block.items.len(), 1);
    }

    #[test]
    fn update_translation_is_idempotent_first_write_wins() {
        let mut grouper = HistoryGrouper::new(config());
        grouper.add_sentence(item("s1", "A.", 0));
        grouper.add_sentence(item("s2", "B.", 10));
        let block = grouper.add_sentence(item("s3", "C.", 20)).unwrap();

        let outcome = grouper.update_translation("s1", "Alpha.");
        assert_eq!(outcome, UpdateOutcome::AppliedToEmittedBlock);
        let outcome2 = grouper.update_translation("s1", "Something else.");
        assert_eq!(outcome2, UpdateOutcome::AlreadySet);

        let stored = grouper.block(&block.id).unwrap();
        assert_eq!(stored.items[0].translation.as_deref(), Some("Alpha."));
    }

    #[test]
    fn unknown_sentence_id_is_reported() {
        let mut grouper = HistoryGrouper::new(config());
        assert_eq!(grouper.update_translation("missing", "x"), UpdateOutcome::UnknownSentence);
    }
}

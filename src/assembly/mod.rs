//! Turning a stream of finalized ASR segments into sentences and
//! paragraphs (§4.5, §4.6).

pub mod paragraph_builder;
pub mod sentence_combiner;
pub mod text_cleaning;

pub use paragraph_builder::{Paragraph, ParagraphBuilder};
pub use sentence_combiner::{CombinedSentence, SentenceCombiner};

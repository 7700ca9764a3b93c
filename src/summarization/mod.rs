//! Progressive/periodic/final summarization, vocabulary extraction, and
//! word counting (§4.9).

pub mod engine;
pub mod vocabulary;
pub mod word_count;

pub use engine::{SummarizationEngine, SummaryKind, SummaryRecord};
pub use vocabulary::{parse_vocabulary, VocabularyItem};
pub use word_count::count_words;

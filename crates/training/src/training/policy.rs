//! The extension point shared by every training variant.
//!
//! The driver in [`Trainer`](super::trainer::Trainer) owns the merge loop. A
//! policy decides how pre-tokens are seeded, how candidates are scored and
//! filtered, and what metadata each merge records. Every method has a
//! default matching standard BPE.

use super::corpus::Corpus;
use super::round::{AppliedMerge, RoundStats};
use bpelab_core::{MergeCandidate, MergeDetail, Pair, Score, VocabSource, Vocabulary};
use compact_str::CompactString;

/// A single-character token.
pub fn char_token(c: char) -> CompactString {
    let mut buf = [0u8; 4];
    CompactString::new(c.encode_utf8(&mut buf))
}

/// Split a pre-token into one token per Unicode scalar value.
pub fn char_tokens(pre_token: &str) -> Vec<CompactString> {
    pre_token.chars().map(char_token).collect()
}

/// Variant behaviour plugged into the generic merge loop.
pub trait MergePolicy {
    /// Initial segmentation of a distinct pre-token.
    fn seed(&mut self, pre_token: &str) -> Vec<CompactString> {
        char_tokens(pre_token)
    }

    /// Provenance of a seed token.
    ///
    /// Tokens classified as [`VocabSource::Base`] contribute their
    /// characters to the base vocabulary.
    fn classify(&self, _token: &str) -> VocabSource {
        VocabSource::Base
    }

    /// Tokens registered after the seed tokens, before the first merge.
    fn extra_seeds(&self, _vocab: &Vocabulary) -> Vec<(CompactString, VocabSource)> {
        Vec::new()
    }

    /// Primary ranking score of a candidate pair.
    fn score(&self, _pair: &Pair, count: u64, _stats: &RoundStats) -> Score {
        Score::Frequency(count)
    }

    /// Whether a candidate may be merged this round.
    fn is_eligible(&self, _pair: &Pair, _merged: &str) -> bool {
        true
    }

    /// Called after a merge is applied. Returns the record's detail.
    fn on_merge_applied(&mut self, _merge: &AppliedMerge<'_>) -> MergeDetail {
        MergeDetail::Plain
    }

    /// Best pre-token join competing with the regular winner.
    fn supermerge(&self, _corpus: &Corpus, _vocab: &Vocabulary) -> Option<MergeCandidate> {
        None
    }

    /// Whether `token` is hidden in listings at `step`.
    fn is_suppressed(&self, _token: &str, _step: usize) -> bool {
        false
    }
}

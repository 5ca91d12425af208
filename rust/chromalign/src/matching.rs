//! Greedy exclusive matching between two indexed sets.
//!
//! Every compatible `(a, b)` pair gets a score (lower is better). Pairs are
//! committed in ascending score order, skipping any pair whose `a` or `b`
//! was already used. Ties resolve on `(a, b)` index order, so callers that
//! index their entities in creation order get reproducible results.
//!
//! ```
//! use chromalign::matching::ScoreMatcher;
//!
//! let mut matcher = ScoreMatcher::default();
//! let growing: [f64; 2] = [100.0, 200.0];
//! let candidates = [200.01, 100.02, 300.0];
//! let out = matcher.match_with(growing.len(), candidates.len(), |a, b| {
//!     let diff = (growing[a] - candidates[b]).abs();
//!     (diff <= 0.05).then_some(diff)
//! });
//! assert_eq!(out.pairs, vec![(1, 0), (0, 1)]);
//! assert!(out.unmatched_a.is_empty());
//! assert_eq!(out.unmatched_b, vec![2]);
//! ```

/// Scores at or above this value mark incompatible pairs.
pub const MAX_SCORE: f64 = f64::MAX;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    pub a: usize,
    pub b: usize,
    pub score: f64,
}

/// Result of one matching round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    /// Committed `(a, b)` pairs, in the order they were committed.
    pub pairs: Vec<(usize, usize)>,
    pub unmatched_a: Vec<usize>,
    pub unmatched_b: Vec<usize>,
}

impl MatchOutcome {
    /// Match of every `a`, indexed by `a`.
    pub fn assignment_a(&self, n_a: usize) -> Vec<Option<usize>> {
        let mut out = vec![None; n_a];
        for &(a, b) in self.pairs.iter() {
            out[a] = Some(b);
        }
        out
    }
}

/// Reusable matcher. Keeps its buffers between rounds, the detectors run
/// one round per scan.
#[derive(Debug, Default)]
pub struct ScoreMatcher {
    candidates: Vec<MatchCandidate>,
    a_used: Vec<bool>,
    b_used: Vec<bool>,
}

impl ScoreMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scores every `(a, b)` pair with `score` and resolves the matching.
    /// `None`, non-finite scores, and scores `>= MAX_SCORE` exclude the pair.
    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace")
    )]
    pub fn match_with(
        &mut self,
        n_a: usize,
        n_b: usize,
        mut score: impl FnMut(usize, usize) -> Option<f64>,
    ) -> MatchOutcome {
        self.candidates.clear();
        for a in 0..n_a {
            for b in 0..n_b {
                if let Some(s) = score(a, b) {
                    self.push(MatchCandidate { a, b, score: s });
                }
            }
        }
        self.resolve_buffered(n_a, n_b)
    }

    /// Resolves a precomputed set of candidates.
    pub fn resolve(
        &mut self,
        n_a: usize,
        n_b: usize,
        candidates: impl IntoIterator<Item = MatchCandidate>,
    ) -> MatchOutcome {
        self.candidates.clear();
        for c in candidates {
            self.push(c);
        }
        self.resolve_buffered(n_a, n_b)
    }

    fn push(&mut self, candidate: MatchCandidate) {
        if candidate.score.is_finite() && candidate.score < MAX_SCORE {
            self.candidates.push(candidate);
        }
    }

    fn resolve_buffered(&mut self, n_a: usize, n_b: usize) -> MatchOutcome {
        self.candidates.sort_by(|x, y| {
            x.score
                .total_cmp(&y.score)
                .then(x.a.cmp(&y.a))
                .then(x.b.cmp(&y.b))
        });

        self.a_used.clear();
        self.a_used.resize(n_a, false);
        self.b_used.clear();
        self.b_used.resize(n_b, false);

        let mut out = MatchOutcome::default();
        for c in self.candidates.iter() {
            if self.a_used[c.a] || self.b_used[c.b] {
                continue;
            }
            self.a_used[c.a] = true;
            self.b_used[c.b] = true;
            out.pairs.push((c.a, c.b));
        }
        out.unmatched_a = (0..n_a).filter(|&a| !self.a_used[a]).collect();
        out.unmatched_b = (0..n_b).filter(|&b| !self.b_used[b]).collect();
        out
    }
}

use crate::config::JoinAlignerConfig;
use crate::errors::{
    ConfigurationError,
    Result,
};
use crate::matching::{
    MatchCandidate,
    ScoreMatcher,
};
use crate::models::{
    PeakList,
    PeakListRow,
    RawDataFile,
};
use crate::task::TaskContext;
use crate::utils::TupleRange;
use std::collections::HashSet;
use tracing::{
    debug,
    info,
    warn,
};

/// `distance / tolerance`, 0 for a zero tolerance (only exact hits get this far).
fn closeness(distance: f64, tolerance: f64) -> f64 {
    if tolerance > 0.0 {
        distance / tolerance
    } else {
        0.0
    }
}

/// Average m/z and RT of an aligned row, sorted by m/z for window queries.
#[derive(Debug, Clone, Copy)]
struct RowKey {
    mz: f64,
    rt: f64,
    idx: usize,
}

/// Join aligner: merges the rows of several peak lists into one list where
/// each row holds at most one peak per file.
///
/// Lists are merged one at a time into the growing output. Rows of the
/// incoming list are matched greedily to the output rows that fall within
/// the m/z and RT windows, unmatched rows become new output rows.
#[derive(Debug, Clone)]
pub struct AlignmentEngine {
    config: JoinAlignerConfig,
}

impl AlignmentEngine {
    pub fn new(config: JoinAlignerConfig) -> std::result::Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Files of all lists in input order.
    /// Fails when a file shows up in more than one list.
    fn collect_files(peak_lists: &[PeakList]) -> std::result::Result<Vec<RawDataFile>, ConfigurationError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for list in peak_lists {
            for file in list.data_files() {
                if !seen.insert(file.clone()) {
                    return Err(ConfigurationError::DuplicateDataFile {
                        file: file.to_string(),
                    });
                }
                out.push(file.clone());
            }
        }
        Ok(out)
    }

    /// Score of aligning `row` to `target`, lower is better.
    /// `None` when identities are required to match and they do not.
    fn score(&self, row: &PeakListRow, target: &PeakListRow, rt_window: f64) -> Option<f64> {
        let compatible = row.identities_compatible(target);
        if self.config.require_same_identity && !compatible {
            return None;
        }
        let mz_term = closeness(
            (row.average_mz() - target.average_mz()).abs(),
            self.config.mz_tolerance,
        );
        let rt_term = closeness((row.average_rt() - target.average_rt()).abs(), rt_window);
        let id_term = if compatible { 0.0 } else { 1.0 };
        Some(
            self.config.mz_weight * mz_term
                + self.config.rt_weight * rt_term
                + self.config.identity_weight * id_term,
        )
    }

    /// Candidate pairs between the rows of `list` and the current output rows.
    fn score_list(
        &self,
        list: &PeakList,
        aligned: &[PeakListRow],
        ctx: &TaskContext,
    ) -> Result<Vec<MatchCandidate>> {
        let mut keys: Vec<RowKey> = aligned
            .iter()
            .enumerate()
            .map(|(idx, r)| RowKey {
                mz: r.average_mz(),
                rt: r.average_rt(),
                idx,
            })
            .collect();
        keys.sort_by(|a, b| a.mz.total_cmp(&b.mz).then(a.idx.cmp(&b.idx)));

        let mut candidates = Vec::new();
        for (a, row) in list.rows().iter().enumerate() {
            ctx.check()?;
            let mz = row.average_mz();
            let rt = row.average_rt();
            let mz_window = TupleRange::around(mz, self.config.mz_tolerance);
            let rt_window = self.config.rt_tolerance.window(rt);

            let start = keys.partition_point(|k| k.mz < mz_window.start());
            for key in keys[start..].iter().take_while(|k| k.mz <= mz_window.end()) {
                if (key.rt - rt).abs() > rt_window {
                    continue;
                }
                if let Some(score) = self.score(row, &aligned[key.idx], rt_window) {
                    candidates.push(MatchCandidate {
                        a,
                        b: key.idx,
                        score,
                    });
                }
            }
            ctx.progress.inc(1);
        }
        Ok(candidates)
    }

    /// Aligns the lists into a new one named after the configured name.
    ///
    /// Nothing is returned on cancellation or when a raw data file is present
    /// in more than one list.
    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace")
    )]
    pub fn align(&self, peak_lists: &[PeakList], ctx: &TaskContext) -> Result<PeakList> {
        let all_files = Self::collect_files(peak_lists)?;
        let total_rows: usize = peak_lists.iter().map(|l| l.num_rows()).sum();
        ctx.progress.init_total(2 * total_rows as u64);
        if total_rows == 0 {
            warn!("Aligning {} peak lists without rows", peak_lists.len());
        }

        let mut aligned: Vec<PeakListRow> = Vec::new();
        let mut next_id = 1u32;
        let mut matcher = ScoreMatcher::new();

        for list in peak_lists {
            let candidates = self.score_list(list, &aligned, ctx)?;
            debug!(
                "{} alignment candidates for the {} rows of {}",
                candidates.len(),
                list.num_rows(),
                list.name()
            );
            let outcome = matcher.resolve(list.num_rows(), aligned.len(), candidates);
            let mapping = outcome.assignment_a(list.num_rows());

            for (row, target) in list.rows().iter().zip(mapping) {
                ctx.check()?;
                let target_idx = match target {
                    Some(idx) => idx,
                    None => {
                        aligned.push(PeakListRow::new(next_id));
                        next_id += 1;
                        aligned.len() - 1
                    }
                };
                let target_row = &mut aligned[target_idx];
                for peak in row.peaks() {
                    target_row.add_peak(peak.clone());
                }
                for identity in row.identities() {
                    target_row.add_identity(identity.clone());
                }
                // Last merged row decides the preferred identity.
                target_row.set_preferred_identity(row.preferred_identity().clone());
                ctx.progress.inc(1);
            }
        }

        let mut out = PeakList::new(self.config.peak_list_name.clone(), all_files);
        let n_rows = aligned.len();
        for row in aligned {
            out.add_row(row);
        }
        ctx.progress.finish();
        info!(
            "Aligned {} rows from {} peak lists into {} rows",
            total_rows,
            peak_lists.len(),
            n_rows
        );
        Ok(out)
    }
}

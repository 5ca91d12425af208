use crate::config::DuplicateFilterConfig;
use crate::errors::{
    ConfigurationError,
    Result,
};
use crate::models::{
    PeakList,
    PeakListRow,
};
use crate::task::TaskContext;
use tracing::info;

/// Removes rows that duplicate a larger (by area) row at nearly the same
/// m/z and retention time.
#[derive(Debug, Clone)]
pub struct DuplicateRowFilter {
    config: DuplicateFilterConfig,
}

impl DuplicateRowFilter {
    pub fn new(config: DuplicateFilterConfig) -> std::result::Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    fn same_identification(&self, a: &PeakListRow, b: &PeakListRow) -> bool {
        if !self.config.require_same_identification {
            return true;
        }
        match (a.identities().is_empty(), b.identities().is_empty()) {
            (true, true) => true,
            (false, false) => a.identities_compatible(b),
            _ => false,
        }
    }

    fn is_duplicate(&self, keeper: &PeakListRow, other: &PeakListRow) -> bool {
        (keeper.average_mz() - other.average_mz()).abs() < self.config.mz_difference_max
            && (keeper.average_rt() - other.average_rt()).abs() < self.config.rt_difference_max
            && self.same_identification(keeper, other)
    }

    /// Returns a new list named `"<list> <suffix>"` with the surviving rows,
    /// in descending area order.
    pub fn filter(&self, peak_list: &PeakList, ctx: &TaskContext) -> Result<PeakList> {
        let mut rows: Vec<Option<&PeakListRow>> = peak_list.rows().iter().map(Some).collect();
        rows.sort_by(|a, b| {
            let area = |r: &Option<&PeakListRow>| r.map_or(0.0, |r| r.average_area());
            area(b).total_cmp(&area(a))
        });
        ctx.progress.init_total(rows.len() as u64);

        for first in 0..rows.len() {
            let Some(keeper) = rows[first] else {
                ctx.progress.inc(1);
                continue;
            };
            for second in (first + 1)..rows.len() {
                ctx.check()?;
                if let Some(other) = rows[second] {
                    if self.is_duplicate(keeper, other) {
                        rows[second] = None;
                    }
                }
            }
            ctx.progress.inc(1);
        }

        let mut out = PeakList::new(
            format!("{} {}", peak_list.name(), self.config.suffix),
            peak_list.data_files().to_vec(),
        );
        for row in rows.into_iter().flatten() {
            out.add_row(row.clone());
        }
        info!(
            "Duplicate filter kept {} of {} rows of {}",
            out.num_rows(),
            peak_list.num_rows(),
            peak_list.name()
        );
        Ok(out)
    }
}

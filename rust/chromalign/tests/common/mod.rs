#![allow(dead_code)]

use chromalign::models::{
    ChromatographicPeak,
    DataPoint,
    PeakBuilder,
    PeakList,
    PeakListRow,
    PeakSample,
    PeakStatus,
    RawDataFile,
    Scan,
};
use chromalign::InMemoryScanSource;
use tracing_subscriber::EnvFilter;

/// Installs a test writer subscriber once, filtered with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn gaussian(n: usize, center: f64, sigma: f64, height: f64) -> Vec<f64> {
    (0..n)
        .map(|i| height * (-((i as f64 - center).powi(2)) / (2.0 * sigma * sigma)).exp())
        .collect()
}

pub fn add_traces(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b.iter()).map(|(x, y)| x + y).collect()
}

/// One MS1 scan per trace position. Each `(mz, trace)` contributes a data
/// point where its intensity is above `cutoff`.
pub fn scans_from_traces(traces: &[(f64, Vec<f64>)], rt_step: f64, cutoff: f64) -> Vec<Scan> {
    let n = traces.iter().map(|(_, t)| t.len()).max().unwrap_or(0);
    (0..n)
        .map(|i| {
            let points = traces
                .iter()
                .filter_map(|(mz, trace)| {
                    let int = *trace.get(i)?;
                    (int > cutoff).then(|| DataPoint::new(*mz, int))
                })
                .collect();
            Scan::new(i as u32 + 1, i as f64 * rt_step, points, true)
        })
        .collect()
}

pub fn scan_source(
    name: &str,
    traces: &[(f64, Vec<f64>)],
    rt_step: f64,
    cutoff: f64,
) -> InMemoryScanSource {
    InMemoryScanSource::new(
        RawDataFile::new(name),
        scans_from_traces(traces, rt_step, cutoff),
    )
}

/// Three sample peak (0, height, 0) half a time unit apart: its apex sits at
/// `rt` and its area is `height / 2`.
pub fn triangle_peak(file: &str, mz: f64, rt: f64, height: f64) -> ChromatographicPeak {
    let mut builder = PeakBuilder::new(RawDataFile::new(file));
    for (i, (drt, int)) in [(-0.5, 0.0), (0.0, height), (0.5, 0.0)].into_iter().enumerate() {
        builder.add_sample(PeakSample {
            scan_number: i as u32 + 1,
            mz,
            retention_time: rt + drt,
            intensity: int,
        });
    }
    builder
        .finalize(PeakStatus::Detected)
        .expect("three samples were added")
}

/// Single file peak list, one row per `(mz, rt, height)`.
pub fn peak_list(file: &str, rows: &[(f64, f64, f64)]) -> PeakList {
    let mut out = PeakList::new(format!("{} peaks", file), vec![RawDataFile::new(file)]);
    for (i, &(mz, rt, height)) in rows.iter().enumerate() {
        out.add_row(PeakListRow::with_peak(
            i as u32 + 1,
            triangle_peak(file, mz, rt, height),
        ));
    }
    out
}

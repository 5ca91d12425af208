mod common;

use chromalign::config::{
    JoinAlignerConfig,
    RtTolerance,
};
use chromalign::models::{
    CompoundIdentity,
    PeakList,
    PeakListRow,
    RawDataFile,
};
use chromalign::{
    AlignmentEngine,
    TaskContext,
    TaskReport,
    TaskStatus,
};

fn engine(mz_tolerance: f64) -> AlignmentEngine {
    AlignmentEngine::new(JoinAlignerConfig {
        mz_tolerance,
        rt_tolerance: RtTolerance::Absolute(1.0),
        ..Default::default()
    })
    .unwrap()
}

const ROWS: [(f64, f64, f64); 4] = [
    (150.05, 12.0, 3000.0),
    (220.10, 5.5, 800.0),
    (220.10, 18.0, 1200.0),
    (501.33, 30.2, 500.0),
];

#[test]
fn test_self_alignment_keeps_rows() {
    common::init_tracing();
    let list = common::peak_list("a", &ROWS);
    let aligned = engine(0.01)
        .align(&[list.clone()], &TaskContext::detached())
        .unwrap();

    assert_eq!(aligned.name(), "Aligned peak list");
    assert_eq!(aligned.num_rows(), list.num_rows());
    let ids: Vec<u32> = aligned.rows().iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    for (got, expected) in aligned.rows().iter().zip(list.rows()) {
        assert_eq!(got.average_mz(), expected.average_mz());
        assert_eq!(got.average_rt(), expected.average_rt());
    }
}

#[test]
fn test_aligning_a_renamed_copy_pairs_every_row() {
    common::init_tracing();
    let a = common::peak_list("a", &ROWS);
    let b = common::peak_list("b", &ROWS);
    let ctx = TaskContext::detached();
    let aligned = engine(0.01).align(&[a, b], &ctx).unwrap();

    assert_eq!(aligned.data_files(), &[RawDataFile::new("a"), RawDataFile::new("b")]);
    assert_eq!(aligned.num_rows(), ROWS.len());
    for (row, &(mz, rt, height)) in aligned.rows().iter().zip(ROWS.iter()) {
        assert_eq!(row.num_peaks(), 2);
        assert!((row.average_mz() - mz).abs() < 1e-9);
        assert_eq!(row.average_rt(), rt);
        let heights: Vec<f64> = row.peaks().map(|p| p.height()).collect();
        assert_eq!(heights, vec![height, height]);
    }
    assert_eq!(ctx.progress.fraction(), 1.0);
}

#[test]
fn test_mz_tolerance_decides_pairing() {
    let a = common::peak_list("a", &[(500.0, 300.0, 1000.0)]);
    let b = common::peak_list("b", &[(500.0005, 300.01, 1000.0)]);

    let wide = engine(0.01)
        .align(&[a.clone(), b.clone()], &TaskContext::detached())
        .unwrap();
    assert_eq!(wide.num_rows(), 1);
    assert_eq!(wide.rows()[0].num_peaks(), 2);

    let narrow = engine(0.0001)
        .align(&[a, b], &TaskContext::detached())
        .unwrap();
    assert_eq!(narrow.num_rows(), 2);
    assert!(narrow.rows().iter().all(|r| r.num_peaks() == 1));
}

#[test]
fn test_closest_row_wins() {
    // Both rows of `b` fall in the window of the single row of `a`, the
    // closer one gets merged.
    let a = common::peak_list("a", &[(300.0, 10.0, 100.0)]);
    let b = common::peak_list("b", &[(300.008, 10.5, 100.0), (300.001, 10.1, 100.0)]);
    let aligned = engine(0.01)
        .align(&[a, b], &TaskContext::detached())
        .unwrap();

    assert_eq!(aligned.num_rows(), 2);
    let merged = &aligned.rows()[0];
    assert_eq!(merged.num_peaks(), 2);
    let b_peak = merged.peak(&RawDataFile::new("b")).unwrap();
    assert!((b_peak.mz() - 300.001).abs() < 1e-9);
    assert!((aligned.rows()[1].average_mz() - 300.008).abs() < 1e-9);
}

#[test]
fn test_identity_requirement_blocks_pairing() {
    let with_identity = |file: &str, name: &str| {
        let mut row = PeakListRow::with_peak(1, common::triangle_peak(file, 400.0, 20.0, 100.0));
        row.set_preferred_identity(CompoundIdentity::named(name));
        let mut list = PeakList::new(file, vec![RawDataFile::new(file)]);
        list.add_row(row);
        list
    };
    let a = with_identity("a", "caffeine");
    let b = with_identity("b", "theobromine");

    let strict = AlignmentEngine::new(JoinAlignerConfig {
        require_same_identity: true,
        ..Default::default()
    })
    .unwrap();
    let out = strict
        .align(&[a.clone(), b.clone()], &TaskContext::detached())
        .unwrap();
    assert_eq!(out.num_rows(), 2);

    let lenient = AlignmentEngine::new(JoinAlignerConfig::default()).unwrap();
    let out = lenient.align(&[a, b], &TaskContext::detached()).unwrap();
    assert_eq!(out.num_rows(), 1);
    let row = &out.rows()[0];
    assert_eq!(row.identities().len(), 2);
    assert_eq!(row.preferred_identity().name(), Some("theobromine"));
}

#[test]
fn test_cancelled_alignment_reports_cancelled() {
    let a = common::peak_list("a", &ROWS);
    let b = common::peak_list("b", &ROWS);
    let ctx = TaskContext::detached();
    ctx.cancel.cancel();

    let result = engine(0.01).align(&[a, b], &ctx);
    let report = TaskReport::from_result("Join aligner", &result);
    assert!(result.is_err());
    assert_eq!(report.status, TaskStatus::Cancelled);
}

mod common;

use chromalign::config::{
    DuplicateFilterConfig,
    LinearNormalizerConfig,
    NormalizationType,
    PeakMeasurement,
};
use chromalign::models::{
    PeakList,
    PeakListRow,
    RawDataFile,
};
use chromalign::postprocessing::NORMALIZATION_CEILING;
use chromalign::{
    AlignmentEngine,
    DuplicateRowFilter,
    LinearNormalizer,
    ScanSource,
    TaskContext,
};

#[test]
fn test_duplicate_filter_keeps_larger_row() {
    common::init_tracing();
    // Row 2 is the smaller duplicate of row 1, row 3 is far enough away.
    let list = common::peak_list(
        "run",
        &[
            (250.0, 10.0, 100.0),
            (250.0005, 10.05, 200.0),
            (250.0005, 10.5, 50.0),
        ],
    );
    let filter = DuplicateRowFilter::new(DuplicateFilterConfig::default()).unwrap();
    let out = filter.filter(&list, &TaskContext::detached()).unwrap();

    assert_eq!(out.name(), "run peaks filtered");
    assert_eq!(out.num_rows(), 2);
    let kept = &out.rows()[0];
    let original = &list.rows()[1];
    assert_eq!(kept.id(), original.id());
    assert_eq!(kept.average_height(), 200.0);
    assert_eq!(kept.average_area(), original.average_area());
    assert_eq!(out.rows()[1].id(), 3);
}

#[test]
fn test_duplicate_filter_collapses_to_larger_area_row() {
    common::init_tracing();
    // Triangle peaks have area height / 2, so areas are 100 and 50.
    let list = common::peak_list("run", &[(500.0, 300.0, 200.0), (500.0005, 300.002, 100.0)]);
    assert_eq!(list.rows()[0].average_area(), 100.0);
    assert!((list.rows()[1].average_area() - 50.0).abs() < 1e-6);

    let filter = DuplicateRowFilter::new(DuplicateFilterConfig {
        mz_difference_max: 0.001,
        rt_difference_max: 0.01,
        ..Default::default()
    })
    .unwrap();
    let out = filter.filter(&list, &TaskContext::detached()).unwrap();

    assert_eq!(out.num_rows(), 1);
    assert_eq!(&out.rows()[0], &list.rows()[0]);
    assert_eq!(out.rows()[0].average_area(), 100.0);
}

#[test]
fn test_duplicate_filter_identity_requirement() {
    use chromalign::CompoundIdentity;

    let mut big = PeakListRow::with_peak(1, common::triangle_peak("run", 250.0, 10.0, 200.0));
    big.set_preferred_identity(CompoundIdentity::named("adenosine"));
    let small = PeakListRow::with_peak(2, common::triangle_peak("run", 250.0005, 10.05, 100.0));
    let mut list = PeakList::new("run", vec![RawDataFile::new("run")]);
    list.add_row(big);
    list.add_row(small);

    let strict = DuplicateRowFilter::new(DuplicateFilterConfig {
        require_same_identification: true,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(
        strict
            .filter(&list, &TaskContext::detached())
            .unwrap()
            .num_rows(),
        2
    );

    let lenient = DuplicateRowFilter::new(DuplicateFilterConfig::default()).unwrap();
    let out = lenient.filter(&list, &TaskContext::detached()).unwrap();
    assert_eq!(out.num_rows(), 1);
    assert_eq!(out.rows()[0].preferred_identity().name(), Some("adenosine"));
}

fn aligned_two_files() -> PeakList {
    let a = common::peak_list("a", &[(100.0, 5.0, 400.0), (200.0, 8.0, 1000.0), (300.0, 12.0, 50.0)]);
    let b = common::peak_list("b", &[(100.0, 5.0, 40.0), (200.0, 8.0, 250.0), (300.0, 12.0, 10.0)]);
    AlignmentEngine::new(Default::default())
        .unwrap()
        .align(&[a, b], &TaskContext::detached())
        .unwrap()
}

fn heights(list: &PeakList, file: &str) -> Vec<f64> {
    let file = RawDataFile::new(file);
    list.rows()
        .iter()
        .filter_map(|r| r.peak(&file))
        .map(|p| p.height())
        .collect()
}

#[test]
fn test_max_height_normalization() {
    common::init_tracing();
    let list = aligned_two_files();
    let normalizer = LinearNormalizer::new(LinearNormalizerConfig {
        normalization_type: NormalizationType::MaximumPeakHeight,
        peak_measurement: PeakMeasurement::Height,
        ..Default::default()
    })
    .unwrap();
    let out = normalizer
        .normalize(&list, &[], &TaskContext::detached())
        .unwrap();

    assert_eq!(out.name(), "Aligned peak list normalized");
    assert_eq!(out.num_rows(), list.num_rows());

    let all_heights: Vec<f64> = ["a", "b"]
        .iter()
        .flat_map(|f| heights(&out, f))
        .collect();
    let max = all_heights.iter().fold(0.0f64, |acc, &x| acc.max(x));
    assert!((max - NORMALIZATION_CEILING).abs() < 1e-6, "{max}");

    // Ratios inside a file survive the scaling.
    for file in ["a", "b"] {
        let before = heights(&list, file);
        let after = heights(&out, file);
        for (b, a) in before.iter().zip(after.iter()) {
            let ratio = a / b;
            assert!((ratio - after[0] / before[0]).abs() < 1e-9, "{file}");
        }
    }
    // Both files peak at the same height once divided by their maxima.
    assert!((heights(&out, "b")[1] - NORMALIZATION_CEILING).abs() < 1e-6);
}

#[test]
fn test_total_raw_signal_normalization() {
    let scans_a = common::scan_source("a", &[(100.0, vec![500.0; 10])], 0.1, 0.0);
    let scans_b = common::scan_source("b", &[(100.0, vec![50.0; 10])], 0.1, 0.0);
    let list = aligned_two_files();
    let normalizer = LinearNormalizer::new(LinearNormalizerConfig {
        normalization_type: NormalizationType::TotalRawSignal,
        ..Default::default()
    })
    .unwrap();

    let missing = normalizer.normalize(&list, &[&scans_a], &TaskContext::detached());
    assert!(missing.is_err());

    let sources: [&dyn ScanSource; 2] = [&scans_a, &scans_b];
    let out = normalizer
        .normalize(&list, &sources, &TaskContext::detached())
        .unwrap();
    // Factors 5000 and 500: row 2 becomes 0.2 for `a` and 0.5 for `b`.
    let b_max = heights(&out, "b")[1];
    assert!((b_max - NORMALIZATION_CEILING).abs() < 1e-6);
    let a_row2 = heights(&out, "a")[1];
    assert!((a_row2 - NORMALIZATION_CEILING * 0.4).abs() < 1e-6, "{a_row2}");
}

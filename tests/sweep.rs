//! The parameter sweep and the bad-argument suite

use csrkit::sweep::{bad_argument_cases, sweep_cases, Outcome, Sweep, SweepCase};
use csrkit::{Action, IndexBase, TransformConfig};

#[test]
fn test_bad_argument_suite() {
    let failures: Vec<String> = bad_argument_cases()
        .iter()
        .filter_map(|case| case.check().err())
        .collect();

    assert!(failures.is_empty(), "{:#?}", failures);
}

#[test]
fn test_full_sweep() {
    let report = Sweep::new(2024, TransformConfig::default()).run();

    assert_eq!(report.cases.len(), sweep_cases().len());
    assert!(report.all_ok(), "{:#?}", report.failures().collect::<Vec<_>>());
    assert_eq!(report.rejected(), 2 * 11 * 4);
}

#[test]
fn test_negative_sizes_are_invalid_size() {
    let mut sweep = Sweep::new(1, TransformConfig::sequential());

    for base in IndexBase::ALL {
        let report = sweep.run_case(SweepCase::Conversion {
            m: -1,
            n: 1000,
            action: Action::Symbolic,
            base,
        });
        assert_eq!(report.outcome, Outcome::Rejected("InvalidSize"));
    }
}

#[test]
fn test_degenerate_shapes_pass() {
    let mut sweep = Sweep::new(9, TransformConfig::parallel());

    for (m, n) in [(0, 0), (0, 33), (10, 0)] {
        for permute in [false, true] {
            let report = sweep.run_case(SweepCase::Sort {
                m,
                n,
                permute,
                base: IndexBase::One,
            });
            assert_eq!(report.outcome, Outcome::Passed);
            assert_eq!(report.nnz, 0);
        }
    }
}

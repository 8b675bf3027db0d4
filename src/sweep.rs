//! Parameter sweep over matrix shapes, actions and index bases
//!
//! Every case generates a seeded random CSR matrix (unsorted rows with
//! deliberate duplicate columns), runs it through the transforms and checks
//! the result against the reference oracle. Cases with negative sizes must
//! be rejected with `InvalidSize` before anything is written.

use rand::distributions::{Distribution, Uniform};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{Result, SparseError};
use crate::matrix::{Action, IndexBase, SparseMatrixCSR, TransformConfig};
use crate::routines::{self, CscOutput, CsrInput, CsrStructureMut};
use crate::validation::{verify_csr2csc, verify_csrsort};

/// Row counts swept, including one invalid size
pub const M_RANGE: [isize; 6] = [-1, 0, 10, 500, 872, 1000];

/// Column counts swept, including one invalid size
pub const N_RANGE: [isize; 6] = [-3, 0, 33, 242, 623, 1000];

/// Upper bound on generated entries per row
const MAX_ROW_NNZ: usize = 24;

/// One tuple of the sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepCase {
    /// CSR → CSC conversion
    Conversion {
        m: isize,
        n: isize,
        action: Action,
        base: IndexBase,
    },
    /// In-place row sort, with or without a permutation
    Sort {
        m: isize,
        n: isize,
        permute: bool,
        base: IndexBase,
    },
}

impl SweepCase {
    fn sizes(&self) -> (isize, isize) {
        match *self {
            SweepCase::Conversion { m, n, .. } | SweepCase::Sort { m, n, .. } => (m, n),
        }
    }

    /// Whether the case must fail with `InvalidSize`
    pub fn expects_invalid_size(&self) -> bool {
        let (m, n) = self.sizes();
        m < 0 || n < 0
    }
}

/// Outcome of a single case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Transform succeeded and matched the oracle
    Passed,
    /// Transform was rejected with the expected error kind
    Rejected(&'static str),
    /// Anything else, with a description
    Failed(String),
}

impl Outcome {
    /// Whether the case behaved as expected
    pub fn is_ok(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }
}

/// Result of a single case
#[derive(Debug, Clone)]
pub struct CaseReport {
    /// The tuple that was run
    pub case: SweepCase,
    /// Entries in the generated matrix (0 for rejected cases)
    pub nnz: usize,
    /// What happened
    pub outcome: Outcome,
}

/// Results of a full sweep
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// One report per case, in run order
    pub cases: Vec<CaseReport>,
}

impl SweepReport {
    /// Cases that ran and matched the oracle
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.outcome == Outcome::Passed).count()
    }

    /// Cases rejected with the expected error
    pub fn rejected(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| matches!(c.outcome, Outcome::Rejected(_)))
            .count()
    }

    /// Cases that did not behave as expected
    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| !c.outcome.is_ok())
    }

    /// Whether no case failed
    pub fn all_ok(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// All conversion tuples followed by all sort tuples
pub fn sweep_cases() -> Vec<SweepCase> {
    let mut cases = Vec::new();

    for &m in &M_RANGE {
        for &n in &N_RANGE {
            for action in Action::ALL {
                for base in IndexBase::ALL {
                    cases.push(SweepCase::Conversion { m, n, action, base });
                }
            }
        }
    }

    for &m in &M_RANGE {
        for &n in &N_RANGE {
            for permute in [false, true] {
                for base in IndexBase::ALL {
                    cases.push(SweepCase::Sort { m, n, permute, base });
                }
            }
        }
    }

    cases
}

/// Generates random CSR matrices with unsorted rows and duplicate columns
pub struct MatrixGenerator {
    rng: ChaCha8Rng,
}

impl MatrixGenerator {
    /// Generator seeded for reproducible output
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generate an `m x n` matrix in the given index base
    ///
    /// Columns are drawn with replacement and left in draw order, so rows
    /// come out unsorted and may repeat a column.
    pub fn generate(&mut self, m: usize, n: usize, base: IndexBase) -> SparseMatrixCSR<f64> {
        if m == 0 || n == 0 {
            return SparseMatrixCSR::zeros_with_base(m, n, base);
        }

        let offset = base.offset();
        let nnz_dist = Uniform::from(0..=n.min(MAX_ROW_NNZ));
        let col_dist = Uniform::from(0..n);
        let val_dist = Uniform::from(-10.0..10.0);

        let mut row_ptr = Vec::with_capacity(m + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(offset);

        for _ in 0..m {
            let row_nnz = nnz_dist.sample(&mut self.rng);
            for _ in 0..row_nnz {
                col_idx.push(col_dist.sample(&mut self.rng) + offset);
                values.push(val_dist.sample(&mut self.rng));
            }

            // Force a duplicate now and then
            if row_nnz > 0 && self.rng.gen_bool(0.1) {
                let dup = col_idx[col_idx.len() - 1];
                col_idx.push(dup);
                values.push(val_dist.sample(&mut self.rng));
            }

            row_ptr.push(col_idx.len() + offset);
        }

        SparseMatrixCSR {
            n_rows: m,
            n_cols: n,
            row_ptr,
            col_idx,
            values,
            index_base: base,
        }
    }
}

/// Runs the full sweep with one seed and one configuration
pub struct Sweep {
    generator: MatrixGenerator,
    config: TransformConfig,
}

impl Sweep {
    /// Sweep whose matrices come from `seed`, transformed under `config`
    pub fn new(seed: u64, config: TransformConfig) -> Self {
        Self {
            generator: MatrixGenerator::new(seed),
            config,
        }
    }

    /// Runs every tuple of [`sweep_cases`]
    pub fn run(&mut self) -> SweepReport {
        self.run_cases(&sweep_cases())
    }

    /// Runs the given cases in order, logging each outcome
    pub fn run_cases(&mut self, cases: &[SweepCase]) -> SweepReport {
        let mut report = SweepReport::default();

        for &case in cases {
            let case_report = self.run_case(case);
            match &case_report.outcome {
                Outcome::Failed(reason) => tracing::warn!(?case, %reason, "sweep case failed"),
                outcome => tracing::debug!(?case, nnz = case_report.nnz, ?outcome, "sweep case"),
            }
            report.cases.push(case_report);
        }

        tracing::info!(
            total = report.cases.len(),
            passed = report.passed(),
            rejected = report.rejected(),
            "sweep finished"
        );
        report
    }

    /// Runs one case: negative sizes go to the raw routines and must be
    /// rejected; everything else is generated and checked against the oracle
    pub fn run_case(&mut self, case: SweepCase) -> CaseReport {
        if case.expects_invalid_size() {
            return CaseReport {
                case,
                nnz: 0,
                outcome: expect_invalid_size(case),
            };
        }

        let (m, n) = case.sizes();
        let csr = self.generator.generate(m as usize, n as usize, base_of(case));
        let nnz = csr.nnz();

        let outcome = match case {
            SweepCase::Conversion { action, .. } => self.check_conversion(&csr, action),
            SweepCase::Sort { permute, .. } => self.check_sort(&csr, permute),
        };

        CaseReport { case, nnz, outcome }
    }

    fn check_conversion(&self, csr: &SparseMatrixCSR<f64>, action: Action) -> Outcome {
        let conversion = match csr.convert(action, &self.config) {
            Ok(c) => c,
            Err(e) => return Outcome::Failed(format!("conversion error: {}", e)),
        };
        match verify_csr2csc(csr, action, &conversion) {
            Ok(()) => Outcome::Passed,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }

    fn check_sort(&self, csr: &SparseMatrixCSR<f64>, permute: bool) -> Outcome {
        let mut sorted = csr.clone();
        let perm = match sorted.sort_in_place_with(permute, &self.config) {
            Ok(p) => p,
            Err(e) => return Outcome::Failed(format!("sort error: {}", e)),
        };
        match verify_csrsort(csr, &sorted, perm.as_ref()) {
            Ok(()) => Outcome::Passed,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}

fn base_of(case: SweepCase) -> IndexBase {
    match case {
        SweepCase::Conversion { base, .. } | SweepCase::Sort { base, .. } => base,
    }
}

/// Calls the raw routine with the case's signed sizes and sentinel-filled
/// outputs; it must fail with `InvalidSize` and leave them untouched.
fn expect_invalid_size(case: SweepCase) -> Outcome {
    const SENTINEL: usize = usize::MAX;

    let row_ptr = [0usize; 1];
    let mut col_ptr = [SENTINEL; 4];
    let mut perm = [SENTINEL; 4];

    let result = match case {
        SweepCase::Conversion { m, n, action, base } => routines::csr2csc::<f64>(
            CsrInput {
                m,
                n,
                nnz: 0,
                row_ptr: Some(&row_ptr),
                col_idx: None,
                values: None,
            },
            CscOutput {
                col_ptr: Some(&mut col_ptr),
                row_idx: None,
                values: None,
                perm: Some(&mut perm),
            },
            action,
            base,
        ),
        SweepCase::Sort { m, n, permute, base } => routines::csrsort(
            CsrStructureMut {
                m,
                n,
                nnz: 0,
                row_ptr: Some(&row_ptr),
                col_idx: None,
            },
            if permute { Some(&mut perm) } else { None },
            base,
        ),
    };

    if col_ptr.iter().chain(&perm).any(|&v| v != SENTINEL) {
        return Outcome::Failed("outputs written before size check".into());
    }

    match result {
        Err(SparseError::InvalidSize { .. }) => Outcome::Rejected("InvalidSize"),
        Err(e) => Outcome::Failed(format!("expected InvalidSize, got {}", e.kind())),
        Ok(()) => Outcome::Failed("expected InvalidSize, got success".into()),
    }
}

/// A call with a deliberately bad argument and the error kind it must produce
pub struct BadArgumentCase {
    /// Human-readable label
    pub name: &'static str,
    /// Expected `SparseError::kind`
    pub expected: &'static str,
    run: fn() -> Result<()>,
}

impl BadArgumentCase {
    /// Runs the call, returning the observed error kind on mismatch
    pub fn check(&self) -> std::result::Result<(), String> {
        match (self.run)() {
            Err(e) if e.kind() == self.expected => Ok(()),
            Err(e) => Err(format!("{}: expected {}, got {} ({})", self.name, self.expected, e.kind(), e)),
            Ok(()) => Err(format!("{}: expected {}, got success", self.name, self.expected)),
        }
    }
}

const BAD_ROW_PTR: [usize; 3] = [0, 1, 2];
const BAD_COL_IDX: [usize; 2] = [1, 0];
const BAD_VALUES: [f64; 2] = [1.0, 2.0];

fn conversion_with(
    m: isize,
    n: isize,
    nnz: isize,
    drop_input: Option<&str>,
    drop_output: Option<&str>,
) -> Result<()> {
    let mut col_ptr = [0usize; 3];
    let mut row_idx = [0usize; 2];
    let mut csc_values = [0.0f64; 2];

    let input = CsrInput {
        m,
        n,
        nnz,
        row_ptr: (drop_input != Some("row_ptr")).then_some(&BAD_ROW_PTR[..]),
        col_idx: (drop_input != Some("col_idx")).then_some(&BAD_COL_IDX[..]),
        values: (drop_input != Some("values")).then_some(&BAD_VALUES[..]),
    };
    let output = CscOutput {
        col_ptr: (drop_output != Some("col_ptr")).then_some(&mut col_ptr[..]),
        row_idx: (drop_output != Some("row_idx")).then_some(&mut row_idx[..]),
        values: (drop_output != Some("values")).then_some(&mut csc_values[..]),
        perm: None,
    };
    routines::csr2csc(input, output, Action::Numeric, IndexBase::Zero)
}

fn sort_with(m: isize, n: isize, nnz: isize, drop: Option<&str>, perm_len: Option<usize>) -> Result<()> {
    let mut col_idx = BAD_COL_IDX;
    let mut perm = vec![0usize; perm_len.unwrap_or(0)];

    routines::csrsort(
        CsrStructureMut {
            m,
            n,
            nnz,
            row_ptr: (drop != Some("row_ptr")).then_some(&BAD_ROW_PTR[..]),
            col_idx: (drop != Some("col_idx")).then_some(&mut col_idx[..]),
        },
        perm_len.map(|_| perm.as_mut_slice()),
        IndexBase::Zero,
    )
}

/// Missing-buffer, negative-size and bad-option calls for every routine
pub fn bad_argument_cases() -> Vec<BadArgumentCase> {
    vec![
        BadArgumentCase {
            name: "csr2csc m < 0",
            expected: "InvalidSize",
            run: || conversion_with(-1, 2, 2, None, None),
        },
        BadArgumentCase {
            name: "csr2csc n < 0",
            expected: "InvalidSize",
            run: || conversion_with(2, -1, 2, None, None),
        },
        BadArgumentCase {
            name: "csr2csc nnz < 0",
            expected: "InvalidSize",
            run: || conversion_with(2, 2, -1, None, None),
        },
        BadArgumentCase {
            name: "csr2csc nnz > 0 with m = 0",
            expected: "InvalidSize",
            run: || conversion_with(0, 2, 2, None, None),
        },
        BadArgumentCase {
            name: "csr2csc missing csr_row_ptr",
            expected: "InvalidPointer",
            run: || conversion_with(2, 2, 2, Some("row_ptr"), None),
        },
        BadArgumentCase {
            name: "csr2csc missing csr_col_idx",
            expected: "InvalidPointer",
            run: || conversion_with(2, 2, 2, Some("col_idx"), None),
        },
        BadArgumentCase {
            name: "csr2csc missing csr_values",
            expected: "InvalidPointer",
            run: || conversion_with(2, 2, 2, Some("values"), None),
        },
        BadArgumentCase {
            name: "csr2csc missing csc_col_ptr",
            expected: "InvalidPointer",
            run: || conversion_with(2, 2, 2, None, Some("col_ptr")),
        },
        BadArgumentCase {
            name: "csr2csc missing csc_row_idx",
            expected: "InvalidPointer",
            run: || conversion_with(2, 2, 2, None, Some("row_idx")),
        },
        BadArgumentCase {
            name: "csr2csc missing csc_values",
            expected: "InvalidPointer",
            run: || conversion_with(2, 2, 2, None, Some("values")),
        },
        BadArgumentCase {
            name: "csrsort m < 0",
            expected: "InvalidSize",
            run: || sort_with(-1, 2, 2, None, None),
        },
        BadArgumentCase {
            name: "csrsort n < 0",
            expected: "InvalidSize",
            run: || sort_with(2, -1, 2, None, None),
        },
        BadArgumentCase {
            name: "csrsort nnz < 0",
            expected: "InvalidSize",
            run: || sort_with(2, 2, -1, None, None),
        },
        BadArgumentCase {
            name: "csrsort missing csr_row_ptr",
            expected: "InvalidPointer",
            run: || sort_with(2, 2, 2, Some("row_ptr"), None),
        },
        BadArgumentCase {
            name: "csrsort missing csr_col_idx",
            expected: "InvalidPointer",
            run: || sort_with(2, 2, 2, Some("col_idx"), None),
        },
        BadArgumentCase {
            name: "csrsort short perm",
            expected: "InvalidPointer",
            run: || sort_with(2, 2, 2, None, Some(1)),
        },
        BadArgumentCase {
            name: "identity permutation n < 0",
            expected: "InvalidSize",
            run: || {
                let mut perm = [0usize; 2];
                routines::create_identity_permutation(-1, Some(&mut perm[..]))
            },
        },
        BadArgumentCase {
            name: "identity permutation missing perm",
            expected: "InvalidPointer",
            run: || routines::create_identity_permutation(3, None),
        },
        BadArgumentCase {
            name: "index base 2",
            expected: "InvalidValue",
            run: || IndexBase::try_from(2).map(|_| ()),
        },
        BadArgumentCase {
            name: "action 7",
            expected: "InvalidValue",
            run: || Action::try_from(7).map(|_| ()),
        },
    ]
}

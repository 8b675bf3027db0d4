use std::path::Path;

use anyhow::{bail, Context, Result};
use csrkit::io::{read_bin, MatrixMarketIO};
use csrkit::sweep::{bad_argument_cases, Sweep};
use csrkit::validation::{verify_csr2csc, verify_csrsort};
use csrkit::{Action, IndexBase, SparseMatrixCSR, TransformConfig};

const DEFAULT_SEED: u64 = 0x5eed;

fn usage() -> &'static str {
    "usage: csrkit [--seed N] [MATRIX_FILE (.bin or .mtx)]"
}

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let mut seed = DEFAULT_SEED;
    let mut corpus = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let value = args.next().context(usage())?;
                seed = value.parse().with_context(|| format!("invalid seed '{}'", value))?;
            }
            "-h" | "--help" => {
                println!("{}", usage());
                return Ok(());
            }
            path => corpus = Some(path.to_string()),
        }
    }

    let config = TransformConfig::from_env();
    tracing::info!(
        version = csrkit::VERSION,
        threads = config.system_params.n_threads,
        execution = ?config.execution,
        seed,
        "csrkit"
    );

    let mut failures = 0;

    for case in bad_argument_cases() {
        if let Err(reason) = case.check() {
            tracing::error!(%reason, "bad-argument case failed");
            failures += 1;
        }
    }

    let report = Sweep::new(seed, config.clone()).run();
    for failure in report.failures() {
        tracing::error!(case = ?failure.case, outcome = ?failure.outcome, "sweep failure");
    }
    failures += report.failures().count();

    if let Some(path) = corpus {
        failures += check_corpus(Path::new(&path), &config)?;
    }

    if failures > 0 {
        bail!("{} checks failed", failures);
    }
    tracing::info!("all checks passed");
    Ok(())
}

fn load(path: &Path, base: IndexBase) -> Result<SparseMatrixCSR<f64>> {
    let matrix = match path.extension().and_then(|e| e.to_str()) {
        Some("mtx") => MatrixMarketIO::read_matrix(path, base),
        _ => read_bin(path, base),
    };
    matrix.with_context(|| format!("failed to load {}", path.display()))
}

/// Runs every action and base over a corpus matrix; returns the failure count
fn check_corpus(path: &Path, config: &TransformConfig) -> Result<usize> {
    let mut failures = 0;

    for base in IndexBase::ALL {
        let csr = load(path, base)?;
        tracing::info!(
            path = %path.display(),
            m = csr.n_rows,
            n = csr.n_cols,
            nnz = csr.nnz(),
            ?base,
            "loaded corpus matrix"
        );

        for action in Action::ALL {
            let conversion = csr.convert(action, config)?;
            if let Err(e) = verify_csr2csc(&csr, action, &conversion) {
                tracing::error!(?action, ?base, error = %e, "corpus conversion mismatch");
                failures += 1;
            }
        }

        for permute in [false, true] {
            let mut sorted = csr.clone();
            let perm = sorted.sort_in_place_with(permute, config)?;
            if let Err(e) = verify_csrsort(&csr, &sorted, perm.as_ref()) {
                tracing::error!(permute, ?base, error = %e, "corpus sort mismatch");
                failures += 1;
            }
        }
    }

    Ok(failures)
}

//! Loading corpus matrices from disk and running them through the transforms

use std::path::PathBuf;

use csrkit::io::{read_bin, write_bin, MatrixMarketIO};
use csrkit::sweep::MatrixGenerator;
use csrkit::validation::{verify_csr2csc, verify_csrsort};
use csrkit::{Action, IndexBase, SparseError, TransformConfig};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("csrkit-{}-{}", std::process::id(), name))
}

#[test]
fn test_binary_file_roundtrip() {
    let path = temp_path("roundtrip.bin");
    let matrix = MatrixGenerator::new(17).generate(60, 40, IndexBase::Zero);

    write_bin(&path, &matrix).unwrap();
    let loaded = read_bin(&path, IndexBase::One).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded, matrix.rebased(IndexBase::One));

    for action in Action::ALL {
        let out = loaded.convert(action, &TransformConfig::default()).unwrap();
        verify_csr2csc(&loaded, action, &out).unwrap();
    }
}

#[test]
fn test_matrix_market_file() {
    let path = temp_path("small.mtx");
    std::fs::write(
        &path,
        "%%MatrixMarket matrix coordinate real general\n3 3 4\n1 3 5\n1 1 1\n3 2 2\n3 2 3\n",
    )
    .unwrap();

    let csr = MatrixMarketIO::read_matrix(&path, IndexBase::Zero).unwrap();
    std::fs::remove_file(&path).unwrap();

    let mut sorted = csr.clone();
    let perm = sorted.sort_in_place(true).unwrap();
    verify_csrsort(&csr, &sorted, perm.as_ref()).unwrap();
    assert_eq!(perm.unwrap().as_slice(), &[1, 0, 2, 3]);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = read_bin(temp_path("does-not-exist.bin"), IndexBase::Zero).unwrap_err();
    assert!(matches!(err, SparseError::Io(_)));
}

//! Matrix corpus loading
//!
//! Two on-disk layouts are supported:
//!
//! - the binary corpus layout: little-endian `i32 m, n, nnz`, then
//!   `i32 row_ptr[m + 1]`, `i32 col_idx[nnz]` and `f64 values[nnz]`, all
//!   zero-based;
//! - Matrix Market coordinate files (`real`, `integer` or `pattern`;
//!   `general` or `symmetric`).
//!
//! Both readers return a CSR matrix in the requested index base. Entries
//! are kept exactly as stored: unsorted rows and duplicates survive.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{try_alloc, Result, SparseError};
use crate::matrix::{IndexBase, SparseMatrixCSR};

/// Sizes read from a file header are untrusted; reserve at most this many
/// elements up front and let the vectors grow as entries actually arrive.
const MAX_PREALLOC: usize = 1 << 20;

fn reserve<T>(declared: usize) -> Vec<T> {
    Vec::with_capacity(declared.min(MAX_PREALLOC))
}

fn read_i32<R: Read>(reader: &mut R, what: &str) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|e| SparseError::Format(format!("truncated while reading {}: {}", what, e)))?;
    Ok(i32::from_le_bytes(buf))
}

fn read_f64<R: Read>(reader: &mut R, what: &str) -> Result<f64> {
    let mut buf = [0u8; 8];
    reader
        .read_exact(&mut buf)
        .map_err(|e| SparseError::Format(format!("truncated while reading {}: {}", what, e)))?;
    Ok(f64::from_le_bytes(buf))
}

fn non_negative(value: i32, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| SparseError::Format(format!("{} = {} is negative", what, value)))
}

/// Reads a binary corpus matrix from any reader
pub fn read_bin_from<R: Read>(reader: &mut R, base: IndexBase) -> Result<SparseMatrixCSR<f64>> {
    let m = non_negative(read_i32(reader, "m")?, "m")?;
    let n = non_negative(read_i32(reader, "n")?, "n")?;
    let nnz = non_negative(read_i32(reader, "nnz")?, "nnz")?;
    let offset = base.offset();

    let mut row_ptr = reserve(m + 1);
    for _ in 0..=m {
        row_ptr.push(non_negative(read_i32(reader, "row_ptr")?, "row_ptr entry")? + offset);
    }

    let mut col_idx = reserve(nnz);
    for _ in 0..nnz {
        col_idx.push(non_negative(read_i32(reader, "col_idx")?, "col_idx entry")? + offset);
    }

    let mut values = reserve(nnz);
    for _ in 0..nnz {
        values.push(read_f64(reader, "values")?);
    }

    tracing::debug!(m, n, nnz, ?base, "read binary matrix");
    SparseMatrixCSR::try_new(m, n, row_ptr, col_idx, values, base)
}

/// Reads a binary corpus matrix from a file
pub fn read_bin<P: AsRef<Path>>(path: P, base: IndexBase) -> Result<SparseMatrixCSR<f64>> {
    let file = File::open(path.as_ref())?;
    read_bin_from(&mut BufReader::new(file), base)
}

fn to_i32(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| SparseError::Format(format!("{} = {} exceeds i32", what, value)))
}

/// Writes a matrix in the binary corpus layout (always zero-based on disk)
pub fn write_bin_to<W: Write>(writer: &mut W, matrix: &SparseMatrixCSR<f64>) -> Result<()> {
    let base = matrix.index_base.offset();

    writer.write_all(&to_i32(matrix.n_rows, "m")?.to_le_bytes())?;
    writer.write_all(&to_i32(matrix.n_cols, "n")?.to_le_bytes())?;
    writer.write_all(&to_i32(matrix.nnz(), "nnz")?.to_le_bytes())?;

    for &p in &matrix.row_ptr {
        writer.write_all(&to_i32(p - base, "row_ptr entry")?.to_le_bytes())?;
    }
    for &c in &matrix.col_idx {
        writer.write_all(&to_i32(c - base, "col_idx entry")?.to_le_bytes())?;
    }
    for &v in &matrix.values {
        writer.write_all(&v.to_le_bytes())?;
    }

    Ok(())
}

/// Writes a matrix in the binary corpus layout to a file
pub fn write_bin<P: AsRef<Path>>(path: P, matrix: &SparseMatrixCSR<f64>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_bin_to(&mut writer, matrix)?;
    writer.flush()?;
    Ok(())
}

/// Matrix Market format reader/writer
pub struct MatrixMarketIO;

impl MatrixMarketIO {
    /// Read a matrix in Matrix Market format
    pub fn read_matrix<P: AsRef<Path>>(path: P, base: IndexBase) -> Result<SparseMatrixCSR<f64>> {
        let file = File::open(path.as_ref())?;
        Self::parse(BufReader::new(file), base)
    }

    /// Parse Matrix Market text from any buffered reader
    pub fn parse<R: BufRead>(reader: R, base: IndexBase) -> Result<SparseMatrixCSR<f64>> {
        let mut lines = reader.lines();

        let banner = lines
            .next()
            .ok_or_else(|| SparseError::Format("empty file".into()))??;
        let banner = banner.to_ascii_lowercase();
        if !banner.starts_with("%%matrixmarket") {
            return Err(SparseError::Format("missing %%MatrixMarket banner".into()));
        }
        if !banner.contains("coordinate") {
            return Err(SparseError::Format("only coordinate matrices are supported".into()));
        }
        let pattern = banner.contains("pattern");
        let symmetric = banner.contains("symmetric");
        if banner.contains("complex") {
            return Err(SparseError::Format("complex Matrix Market files are not supported".into()));
        }

        // Skip comments and read the size line: rows cols nnz
        let mut size_line = None;
        for line in lines.by_ref() {
            let line = line?;
            if !line.starts_with('%') && !line.trim().is_empty() {
                size_line = Some(line);
                break;
            }
        }
        let size_line = size_line.ok_or_else(|| SparseError::Format("missing size line".into()))?;

        let parts: Vec<&str> = size_line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(SparseError::Format("invalid size line".into()));
        }
        let parse_size = |s: &str, what: &str| {
            s.parse::<usize>()
                .map_err(|_| SparseError::Format(format!("invalid {}", what)))
        };
        let n_rows = parse_size(parts[0], "number of rows")?;
        let n_cols = parse_size(parts[1], "number of columns")?;
        let declared = parse_size(parts[2], "number of entries")?;

        let mut triplets: Vec<(usize, usize, f64)> = reserve(declared);

        for line in lines {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('%') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 2 {
                return Err(SparseError::Format(format!("invalid entry line '{}'", line)));
            }

            // Matrix Market is one-based
            let row = parse_size(parts[0], "row index")?
                .checked_sub(1)
                .ok_or_else(|| SparseError::Format("row index 0 in one-based file".into()))?;
            let col = parse_size(parts[1], "column index")?
                .checked_sub(1)
                .ok_or_else(|| SparseError::Format("column index 0 in one-based file".into()))?;

            let val: f64 = if pattern {
                1.0
            } else {
                parts
                    .get(2)
                    .ok_or_else(|| SparseError::Format(format!("missing value in '{}'", line)))?
                    .parse()
                    .map_err(|_| SparseError::Format(format!("invalid value in '{}'", line)))?
            };

            if row >= n_rows || col >= n_cols {
                return Err(SparseError::Format(format!(
                    "entry ({}, {}) outside {} x {}",
                    row + 1,
                    col + 1,
                    n_rows,
                    n_cols
                )));
            }

            triplets.push((row, col, val));
            if symmetric && row != col {
                triplets.push((col, row, val));
            }
        }

        if triplets.len() < declared {
            return Err(SparseError::Format(format!(
                "expected {} entries, found {}",
                declared,
                triplets.len()
            )));
        }

        Self::triplets_to_csr(n_rows, n_cols, triplets, base)
    }

    /// Write a matrix in Matrix Market format
    pub fn write_matrix<P: AsRef<Path>>(path: P, matrix: &SparseMatrixCSR<f64>) -> Result<()> {
        let mut file = BufWriter::new(File::create(path.as_ref())?);
        Self::write_to(&mut file, matrix)?;
        file.flush()?;
        Ok(())
    }

    /// Write Matrix Market text to any writer
    pub fn write_to<W: Write>(writer: &mut W, matrix: &SparseMatrixCSR<f64>) -> Result<()> {
        writeln!(writer, "%%MatrixMarket matrix coordinate real general")?;
        writeln!(writer, "{} {} {}", matrix.n_rows, matrix.n_cols, matrix.nnz())?;

        for i in 0..matrix.n_rows {
            for (j, val) in matrix.row_iter(i) {
                writeln!(writer, "{} {} {}", i + 1, j + 1, val)?;
            }
        }

        Ok(())
    }

    /// Groups triplets by row, keeping file order within each row
    ///
    /// Duplicates are not summed.
    fn triplets_to_csr(
        n_rows: usize,
        n_cols: usize,
        mut triplets: Vec<(usize, usize, f64)>,
        base: IndexBase,
    ) -> Result<SparseMatrixCSR<f64>> {
        let offset = base.offset();

        // Stable: entries of a row stay in file order
        triplets.sort_by_key(|&(row, _, _)| row);

        let len = n_rows
            .checked_add(1)
            .ok_or_else(|| SparseError::Format(format!("{} rows overflow", n_rows)))?;
        let mut row_ptr = try_alloc("row_ptr", len, offset)?;
        let mut next = 0;
        for i in 0..n_rows {
            while next < triplets.len() && triplets[next].0 == i {
                next += 1;
            }
            row_ptr[i + 1] = next + offset;
        }

        Ok(SparseMatrixCSR {
            n_rows,
            n_cols,
            row_ptr,
            col_idx: triplets.iter().map(|&(_, col, _)| col + offset).collect(),
            values: triplets.iter().map(|&(_, _, val)| val).collect(),
            index_base: base,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_bin_roundtrip() {
        let matrix = SparseMatrixCSR::new(
            3,
            4,
            vec![0, 2, 2, 4],
            vec![3, 0, 1, 1],
            vec![5.0, 1.0, 2.0, 3.0],
        );

        let mut bytes = Vec::new();
        write_bin_to(&mut bytes, &matrix).unwrap();
        assert_eq!(bytes.len(), 3 * 4 + 4 * 4 + 4 * 4 + 4 * 8);

        let zero = read_bin_from(&mut Cursor::new(&bytes), IndexBase::Zero).unwrap();
        assert_eq!(zero, matrix);

        let one = read_bin_from(&mut Cursor::new(&bytes), IndexBase::One).unwrap();
        assert_eq!(one, matrix.rebased(IndexBase::One));
    }

    #[test]
    fn test_bin_truncated() {
        let mut bytes = Vec::new();
        write_bin_to(&mut bytes, &SparseMatrixCSR::<f64>::identity(3)).unwrap();
        bytes.truncate(bytes.len() - 3);

        let err = read_bin_from(&mut Cursor::new(&bytes), IndexBase::Zero).unwrap_err();
        assert!(matches!(err, SparseError::Format(_)));
    }

    #[test]
    fn test_bin_negative_size() {
        let bytes: Vec<u8> = [-1i32, 3, 0].iter().flat_map(|v| v.to_le_bytes()).collect();
        assert!(read_bin_from(&mut Cursor::new(&bytes), IndexBase::Zero).is_err());
    }

    #[test]
    fn test_matrix_market_keeps_duplicates_and_order() {
        let text = "%%MatrixMarket matrix coordinate real general\n\
                    % a comment\n\
                    3 3 4\n\
                    1 3 5.0\n\
                    1 1 1.0\n\
                    3 2 2.0\n\
                    3 2 3.0\n";

        let csr = MatrixMarketIO::parse(Cursor::new(text), IndexBase::Zero).unwrap();

        assert_eq!(csr.row_ptr, vec![0, 2, 2, 4]);
        assert_eq!(csr.col_idx, vec![2, 0, 1, 1]);
        assert_eq!(csr.values, vec![5.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_matrix_market_symmetric_pattern() {
        let text = "%%MatrixMarket matrix coordinate pattern symmetric\n2 2 2\n1 1\n2 1\n";
        let csr = MatrixMarketIO::parse(Cursor::new(text), IndexBase::One).unwrap();

        assert_eq!(csr.row_ptr, vec![1, 3, 4]);
        assert_eq!(csr.col_idx, vec![1, 2, 1]);
        assert_eq!(csr.values, vec![1.0; 3]);
    }

    #[test]
    fn test_matrix_market_write_then_parse() {
        let matrix = SparseMatrixCSR::new(2, 2, vec![0, 1, 2], vec![1, 0], vec![1.5, -2.0]);
        let mut text = Vec::new();
        MatrixMarketIO::write_to(&mut text, &matrix).unwrap();

        let parsed = MatrixMarketIO::parse(Cursor::new(text), IndexBase::Zero).unwrap();
        assert_eq!(parsed, matrix);
    }

    #[test]
    fn test_matrix_market_rejects_out_of_bounds() {
        let text = "%%MatrixMarket matrix coordinate real general\n2 2 1\n3 1 1.0\n";
        assert!(MatrixMarketIO::parse(Cursor::new(text), IndexBase::Zero).is_err());
    }

    #[test]
    fn test_matrix_market_huge_declared_count() {
        let text = "%%MatrixMarket matrix coordinate real general\n2 2 1000000000000000000\n1 1 1.0\n";
        let err = MatrixMarketIO::parse(Cursor::new(text), IndexBase::Zero).unwrap_err();
        assert!(matches!(err, SparseError::Format(_)));
    }

    #[test]
    fn test_bin_huge_declared_nnz() {
        let bytes: Vec<u8> = [1i32, 1, i32::MAX, 0, i32::MAX]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let err = read_bin_from(&mut Cursor::new(&bytes), IndexBase::Zero).unwrap_err();
        assert!(matches!(err, SparseError::Format(_)));
    }

    #[test]
    fn test_matrix_market_huge_row_count() {
        let text = format!(
            "%%MatrixMarket matrix coordinate real general\n{} 2 0\n",
            usize::MAX
        );
        let err = MatrixMarketIO::parse(Cursor::new(text), IndexBase::Zero).unwrap_err();
        assert!(matches!(err, SparseError::Format(_)));

        let text = format!(
            "%%MatrixMarket matrix coordinate real general\n{} 2 0\n",
            usize::MAX / 2
        );
        let err = MatrixMarketIO::parse(Cursor::new(text), IndexBase::Zero).unwrap_err();
        assert!(matches!(err, SparseError::AllocationFailure { .. }));
    }
}

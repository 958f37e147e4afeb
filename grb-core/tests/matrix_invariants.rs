use grb_core::registry::{min_plus, plus_times};
use grb_core::{mxm, transpose, Matrix, RowIterator, SeekResult, Sparsity, SparsityControl};
use grb_types::{ElementType, TypeCode};
use quickcheck_macros::quickcheck;

fn real_type() -> ElementType {
    ElementType::builtin(TypeCode::Fp64)
}

// Scenario 1: build with a `plus` dup reducer collapses the duplicate (0,0)
// entries and leaves the rest untouched.
#[test]
fn build_reduces_duplicates_with_dup_operator() {
    let dup = grb_core::registry::new_binary_builtin(grb_asm::BinaryOpcode::Plus, TypeCode::Fp64, TypeCode::Fp64, TypeCode::Fp64);
    let i = [0u64, 1, 2, 0];
    let j = [0u64, 1, 2, 0];
    let x = [1.0f64, 2.0, 3.0, 5.0];
    let mut m = Matrix::build(real_type(), 3, 3, &i, &j, &x, Some(&dup)).unwrap();
    let tuples = m.extract_tuples::<f64>().unwrap();
    assert_eq!(tuples.i, vec![0, 1, 2]);
    assert_eq!(tuples.j, vec![0, 1, 2]);
    assert_eq!(tuples.x, vec![6.0, 2.0, 3.0]);
}

// Scenario 2/3: PLUS_TIMES mxm against a 3x3 identity matrix is a no-op,
// and squaring the resulting cycle graph doubles its center entry.
#[test]
fn mxm_plus_times_identity_is_no_op() {
    let identity = Matrix::build(real_type(), 3, 3, &[0, 1, 2], &[0, 1, 2], &[1.0f64, 1.0, 1.0], None).unwrap();
    let b = Matrix::build(real_type(), 3, 3, &[0, 1, 1, 2], &[1, 0, 2, 1], &[1.0f64, 1.0, 1.0, 1.0], None).unwrap();
    let semiring = plus_times(TypeCode::Fp64).unwrap();
    let mut c = Matrix::new(real_type(), 3, 3, SparsityControl::AUTO).unwrap();
    mxm(&mut c, None, None, &semiring, &identity, &b, None).unwrap();
    let mut expected = b.extract_tuples::<f64>().unwrap();
    let mut got = c.extract_tuples::<f64>().unwrap();
    expected.i.sort();
    got.i.sort();
    assert_eq!(got.i, expected.i);
    assert_eq!(got.j, expected.j);
    assert_eq!(got.x, expected.x);
}

#[test]
fn mxm_plus_times_squares_cycle_center_entry() {
    let b = Matrix::build(real_type(), 3, 3, &[0, 1, 1, 2], &[1, 0, 2, 1], &[1.0f64, 1.0, 1.0, 1.0], None).unwrap();
    let semiring = plus_times(TypeCode::Fp64).unwrap();
    let mut c = Matrix::new(real_type(), 3, 3, SparsityControl::AUTO).unwrap();
    mxm(&mut c, None, None, &semiring, &b, &b, None).unwrap();
    let center: Option<f64> = c.extract_element(1, 1).unwrap();
    assert_eq!(center, Some(2.0));
}

// Scenario 4: min_plus short-circuits on the additive identity (infinity
// represented as an absent entry).
#[test]
fn mxm_min_plus_matches_shortest_path_step() {
    const INF: f64 = f64::INFINITY;
    let a = [
        [3.0, 5.0, INF],
        [INF, 0.0, 2.0],
        [4.0, INF, 0.0],
    ];
    let mut i = Vec::new();
    let mut j = Vec::new();
    let mut x = Vec::new();
    for (row, vals) in a.iter().enumerate() {
        for (col, &v) in vals.iter().enumerate() {
            if v.is_finite() {
                i.push(row as u64);
                j.push(col as u64);
                x.push(v);
            }
        }
    }
    let m = Matrix::build(real_type(), 3, 3, &i, &j, &x, None).unwrap();
    let semiring = min_plus(TypeCode::Fp64).unwrap();
    let mut c = Matrix::new(real_type(), 3, 3, SparsityControl::AUTO).unwrap();
    mxm(&mut c, None, None, &semiring, &m, &m, None).unwrap();

    let expected = [
        [3.0, 5.0, 7.0],
        [6.0, 0.0, 2.0],
        [4.0, 9.0, 0.0],
    ];
    for row in 0..3 {
        for col in 0..3 {
            let got: Option<f64> = c.extract_element(row, col).unwrap();
            assert_eq!(got, Some(expected[row as usize][col as usize]), "at ({row},{col})");
        }
    }
}

// Scenario 6: a hypersparse matrix with a handful of populated rows out of
// a huge dimension reports `kount` bounded by the dimension, and `next_row`
// skips straight past the empty rows between them to the next populated one.
#[test]
fn row_iterator_reports_empty_rows_between_populated_ones_on_hypersparse_matrix() {
    const DIM: u64 = 100_000;
    let i: Vec<u64> = (0..10).map(|k| k * 7).collect();
    let j: Vec<u64> = (0..10).collect();
    let x: Vec<f64> = (0..10).map(|v| v as f64).collect();
    let m = Matrix::build(real_type(), DIM, DIM, &i, &j, &x, None).unwrap();
    assert_eq!(m.nvals(), 10);

    let (mut it, first) = RowIterator::seek_row(&m, 0);
    assert_eq!(first, SeekResult::Found);
    assert_eq!(it.kount(), DIM as usize);

    let mut found_rows = vec![it.row_index()];
    for _ in 0..70 {
        if it.next_row() == SeekResult::Found {
            found_rows.push(it.row_index());
        }
        if found_rows.len() == 10 {
            break;
        }
    }
    assert_eq!(found_rows, (0..10).map(|k| k * 7).collect::<Vec<_>>());
}

// Invariant 3: transpose is an involution across every reachable format.
#[quickcheck]
fn transpose_transpose_is_identity(entries: Vec<(u16, u16, i32)>) -> bool {
    let n = 32u64;
    let mut i = Vec::new();
    let mut j = Vec::new();
    let mut x = Vec::new();
    for (r, c, v) in entries {
        i.push((r as u64) % n);
        j.push((c as u64) % n);
        x.push(v as f64);
    }
    if i.is_empty() {
        return true;
    }
    let dup = grb_core::registry::new_binary_builtin(grb_asm::BinaryOpcode::Plus, TypeCode::Fp64, TypeCode::Fp64, TypeCode::Fp64);
    let m = match Matrix::build(real_type(), n, n, &i, &j, &x, Some(&dup)) {
        Ok(m) => m,
        Err(_) => return true,
    };
    let tt = transpose(&transpose(&m));
    let mut a = m.clone().extract_tuples::<f64>().unwrap();
    let mut b = tt.extract_tuples::<f64>().unwrap();
    let mut pairs_a: Vec<_> = a.i.drain(..).zip(a.j.drain(..)).zip(a.x.drain(..)).collect();
    let mut pairs_b: Vec<_> = b.i.drain(..).zip(b.j.drain(..)).zip(b.x.drain(..)).collect();
    pairs_a.sort_by(|l, r| l.0.cmp(&r.0));
    pairs_b.sort_by(|l, r| l.0.cmp(&r.0));
    pairs_a == pairs_b
}

// Invariant 6: `wait` is idempotent.
#[test]
fn wait_is_idempotent() {
    let mut m = Matrix::new(real_type(), 4, 4, SparsityControl::AUTO).unwrap();
    m.set_element(0u64, 0u64, 1.0f64).unwrap();
    m.set_element(1u64, 2u64, 2.0f64).unwrap();
    m.wait().unwrap();
    let once = m.extract_tuples::<f64>().unwrap();
    m.wait().unwrap();
    let twice = m.extract_tuples::<f64>().unwrap();
    assert_eq!(once.i, twice.i);
    assert_eq!(once.j, twice.j);
    assert_eq!(once.x, twice.x);
}

// Boundary behavior: building with an index at GrB_INDEX_MAX is fine; one
// past it is rejected.
#[test]
fn build_rejects_index_past_grb_index_max() {
    let max = grb_types::GRB_INDEX_MAX;
    let ok = Matrix::build(real_type(), max + 1, 1, &[max], &[0], &[1.0f64], None);
    assert!(ok.is_ok());
    let rejected = Matrix::build(real_type(), 10, 10, &[max + 1], &[0], &[1.0f64], None);
    assert!(matches!(rejected, Err(grb_core::GrbError::InvalidIndex { .. })));
}

// Boundary behavior: zero-dimension matrices succeed and stay empty.
#[test]
fn zero_dimension_matrix_is_valid_and_empty() {
    let m = Matrix::new(real_type(), 0, 0, SparsityControl::AUTO).unwrap();
    assert_eq!(m.nvals(), 0);
    assert_eq!(m.nrows(), 0);
    assert_eq!(m.format(), Sparsity::Hypersparse);
}

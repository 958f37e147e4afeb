//! Transpose (`GrB_transpose`, and the "optional transpose-first"
//! descriptor settings consulted by eWise/matmul).
//!
//! Materializes `A^T` by dumping `A`'s entries and rebuilding with rows
//! and columns swapped, reusing the same dump-and-rebuild pattern `wait`
//! and `conform` already use rather than a dedicated in-place pivot.

use super::build::{dump_tuples, rebuild_from_entries};
use super::Matrix;

/// Build `A^T`. Shares `A`'s type, orientation and sparsity thresholds;
/// only the shape and entry coordinates change.
#[tracing::instrument(level = "debug", skip(m))]
pub fn transpose(m: &Matrix) -> Matrix {
    let entries = dump_tuples(m).expect("dump_tuples never fails on a well-formed matrix");
    let swapped: Vec<(u64, u64, Vec<u8>)> = entries.into_iter().map(|(r, c, x)| (c, r, x)).collect();

    let mut template = Matrix::new(m.ty.clone(), m.ncols(), m.nrows(), m.sparsity_control).expect("shape already validated on the source matrix");
    template.is_csc = m.is_csc;
    template.hyper_switch = m.hyper_switch;
    template.bitmap_switch = m.bitmap_switch;

    rebuild_from_entries(&template, swapped).expect("rebuild cannot fail on a duplicate-free entry list")
}

#[cfg(test)]
mod tests {
    use grb_types::{ElementType, TypeCode};

    use super::super::SparsityControl;
    use super::*;

    #[test]
    fn transpose_swaps_coordinates_and_shape() {
        let mut m = Matrix::new(ElementType::builtin(TypeCode::Int32), 2, 3, SparsityControl::AUTO).unwrap();
        m.set_element(0, 2, 5i32).unwrap();
        m.wait().unwrap();
        let mut t = transpose(&m);
        assert_eq!(t.nrows(), 3);
        assert_eq!(t.ncols(), 2);
        let v: i32 = t.extract_element(2, 0).unwrap().unwrap();
        assert_eq!(v, 5);
    }

    #[test]
    fn transpose_of_square_matrix_is_involutive() {
        let mut m = Matrix::new(ElementType::builtin(TypeCode::Int32), 2, 2, SparsityControl::AUTO).unwrap();
        m.set_element(0, 1, 7i32).unwrap();
        m.wait().unwrap();
        let t = transpose(&m);
        let mut tt = transpose(&t);
        let v: i32 = tt.extract_element(0, 1).unwrap().unwrap();
        assert_eq!(v, 7);
    }
}

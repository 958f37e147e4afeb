use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use grb_core::registry::new_binary_builtin;
use grb_core::{ewise_add, Matrix, SparsityControl};
use grb_asm::BinaryOpcode;
use grb_types::{ElementType, TypeCode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_matrix(n: u64, density: f64, rng: &mut StdRng) -> Matrix {
    let ty = ElementType::builtin(TypeCode::Fp64);
    let mut m = Matrix::new(ty, n, n, SparsityControl::AUTO).expect("matrix allocation");
    let expected = ((n * n) as f64 * density) as u64;
    for _ in 0..expected {
        let i = rng.gen_range(0..n);
        let j = rng.gen_range(0..n);
        m.set_element(i, j, rng.gen::<f64>()).expect("set_element");
    }
    m.wait().expect("wait");
    m
}

fn ewise_add_dense_vs_sparse(c: &mut Criterion) {
    let mut group = c.benchmark_group("ewise_add");
    let op = new_binary_builtin(BinaryOpcode::Plus, TypeCode::Fp64, TypeCode::Fp64, TypeCode::Fp64);
    for &(n, density) in &[(64u64, 0.5), (256, 0.05), (1024, 0.001)] {
        let mut rng = StdRng::seed_from_u64(42);
        let a = random_matrix(n, density, &mut rng);
        let b = random_matrix(n, density, &mut rng);
        group.bench_with_input(BenchmarkId::from_parameter(format!("n={n}/density={density}")), &(a, b), |bencher, (a, b)| {
            bencher.iter(|| {
                let ty = ElementType::builtin(TypeCode::Fp64);
                let mut out = Matrix::new(ty, n, n, SparsityControl::AUTO).expect("matrix allocation");
                ewise_add(&mut out, None, None, &op, black_box(a), black_box(b), None).expect("ewise_add");
                out
            });
        });
    }
    group.finish();
}

criterion_group!(benches, ewise_add_dense_vs_sparse);
criterion_main!(benches);

use criterion::Criterion;
use criterion::{criterion_group, criterion_main};
use ndarray::{Array1, Array2};
use rustpost::field::write_field;
use rustpost::{Evaluator, GridCase, Quantity};

const SIZES: [usize; 3] = [128, 256, 512];

pub fn bench_quantity(c: &mut Criterion) {
    let mut group = c.benchmark_group("Quantity");
    group.significance_level(0.1).sample_size(10);
    for n in SIZES.iter() {
        let dir = tempfile::tempdir().unwrap();
        let yy = Array1::linspace(0., 1., *n);
        let case = GridCase::new(*n, *n, 1e-3, 1e8, 1., dir.path(), yy).unwrap();
        let field = Array2::from_shape_fn((*n, *n), |(i, j)| (i * j) as f64);
        write_field(&case, "uu", &field).unwrap();
        write_field(&case, "vv", &field).unwrap();

        // <k> from two raw fields, and a quantity using <k> twice
        let k = dir.path().join("qty_k.dat");
        std::fs::write(&k, "k\n2\nuu 0.5\nvv 0.5\n1.0\n").unwrap();
        let kk = dir.path().join("qty_kk.dat");
        let content = format!("kk\n2\n@{0} @{0} invre\n@{0} uu 1.0\nra\n", k.display());
        std::fs::write(&kk, content).unwrap();

        let name = format!("Size: {}", *n);
        group.bench_function(&name, |b| b.iter(|| Quantity::new(&case, &kk).unwrap()));
        let name = format!("Size: {} (cached)", *n);
        group.bench_function(&name, |b| {
            b.iter(|| Evaluator::with_cache(&case).evaluate(&kk).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_quantity);
criterion_main!(benches);

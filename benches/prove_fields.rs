use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

use docsmith::{
    verify_proof, Document, DocumentHasher, DocumentTree, FieldDef, FieldKind, Schema,
};

const FIELD_COUNTS: [usize; 3] = [8, 64, 512];

// deterministic data
fn gen_document(n: usize) -> (Document, Vec<String>) {
    let mut rng = StdRng::seed_from_u64(42);
    let names: Vec<String> = (0..n).map(|i| format!("field_{i}")).collect();
    let defs = names
        .iter()
        .enumerate()
        .map(|(i, name)| FieldDef::new(name.as_str(), i as u32 + 1, FieldKind::Bytes))
        .collect();
    let schema = Arc::new(Schema::new("bench", defs).unwrap());

    let mut doc = Document::new(schema);
    for name in &names {
        let mut value = vec![0u8; 32];
        let mut salt = [0u8; 32];
        rng.fill_bytes(&mut value);
        rng.fill_bytes(&mut salt);
        doc.set_with_salt(name, value, salt).unwrap();
    }
    (doc, names)
}

fn bench_prove_fields(c: &mut Criterion) {
    let mut group = c.benchmark_group("prove_fields");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(2));
    group.measurement_time(Duration::from_secs(5));

    for n in FIELD_COUNTS {
        let (doc, names) = gen_document(n);

        group.bench_function(BenchmarkId::new("build_tree", n), |b| {
            b.iter(|| black_box(DocumentTree::<DocumentHasher>::build(&doc).unwrap().root()))
        });

        group.bench_function(BenchmarkId::new("prove_all", n), |b| {
            b.iter_batched(
                || DocumentTree::<DocumentHasher>::build(&doc).unwrap(),
                |tree| black_box(tree.create_proofs_batch(&names[..]).unwrap()),
                BatchSize::SmallInput,
            )
        });

        let tree = DocumentTree::<DocumentHasher>::build(&doc).unwrap();
        let proofs = tree.create_proofs_batch(&names[..]).unwrap();
        let root = tree.root();
        group.bench_function(BenchmarkId::new("verify_all", n), |b| {
            b.iter(|| {
                for proof in &proofs {
                    black_box(verify_proof::<DocumentHasher>(proof, &root).unwrap());
                }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_prove_fields);
criterion_main!(benches);

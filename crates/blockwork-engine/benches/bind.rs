use std::rc::Rc;

use blockwork_engine::{
    BlockBuilder, BlockError, BlockFactory, BlockFactoryBuilder, BlockType, Options, Parent,
    TypeRef, Value,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

/// A record with a few text fields and a collection of tags.
struct RecordType;

impl BlockType for RecordType {
    fn name(&self) -> &str {
        "record"
    }

    fn parent(&self) -> Option<Parent> {
        Some(Parent::from("block"))
    }

    fn build_block(&self, builder: &mut BlockBuilder, _options: &Options) -> Result<(), BlockError> {
        for field in ["title", "author", "summary"] {
            builder.add(field, Some(TypeRef::from("text")), Options::new())?;
        }
        builder.add(
            "tags",
            Some(TypeRef::from("collection")),
            Options::new().with("allow_add", true),
        )?;
        Ok(())
    }
}

fn factory() -> BlockFactory {
    BlockFactoryBuilder::new()
        .with_core()
        .add_type(Rc::new(RecordType))
        .build()
        .unwrap()
}

fn record(index: usize, tags: usize) -> Value {
    Value::map([
        ("title", Value::from(format!("Record {index}"))),
        ("author", Value::from("Ann Lee")),
        ("summary", Value::from("Some summary text for benchmarking.")),
        (
            "tags",
            Value::list((0..tags).map(|tag| format!("tag-{tag}"))),
        ),
    ])
}

fn bench_build_and_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind");
    group.sample_size(10);

    let factory = factory();
    for tags in [1, 10, 100] {
        let data = record(0, tags);
        group.bench_with_input(BenchmarkId::new("create_record", tags), &data, |b, data| {
            b.iter(|| {
                let block = factory
                    .create("record", std::hint::black_box(data.clone()), Options::new())
                    .unwrap();
                std::hint::black_box(block);
            });
        });
    }

    group.finish();
}

fn bench_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit");
    group.sample_size(10);

    let factory = factory();
    let submitted = record(1, 20);
    group.bench_function("submit_record", |b| {
        b.iter(|| {
            let block = factory
                .create("record", record(0, 10), Options::new())
                .unwrap();
            block
                .submit(std::hint::black_box(submitted.clone()), false)
                .unwrap();
            std::hint::black_box(block.data().unwrap());
        });
    });

    group.bench_function("create_view", |b| {
        let block = factory
            .create("record", record(0, 10), Options::new())
            .unwrap();
        b.iter(|| {
            let view = block.create_view().unwrap();
            std::hint::black_box(view);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_build_and_bind, bench_submit);
criterion_main!(benches);

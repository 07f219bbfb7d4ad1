use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dired::file::MemoryFileSystem;
use dired::listing::{Entry, ListingBuffer, ListingOptions, ModifiedAt};
use dired::IdentityResolver;
use std::path::Path;

fn sample_entry(i: usize) -> Entry {
    Entry::new(
        "/bench",
        format!("file-{:04}.txt", i),
        "-rw-r--r--",
        "alice",
        "staff",
        (i as u64) * 1024,
        ModifiedAt::new(3, 5, 10, 30),
    )
}

fn benchmark_entry_format_parse(c: &mut Criterion) {
    let entry = sample_entry(42);
    let line = entry.format();

    c.bench_function("entry_format", |b| {
        b.iter(|| black_box(&entry).format());
    });

    c.bench_function("entry_parse", |b| {
        b.iter(|| Entry::parse(Path::new("/bench"), black_box(&line)).unwrap());
    });
}

fn benchmark_snapshot(c: &mut Criterion) {
    let fs = MemoryFileSystem::new();
    for i in 0..1000 {
        fs.add_file(format!("/bench/file-{:04}.txt", i), i as u64);
    }
    let resolver = IdentityResolver::empty();

    c.bench_function("snapshot_1000", |b| {
        b.iter(|| {
            ListingBuffer::snapshot(&fs, &resolver, Path::new("/bench"), ListingOptions::default())
                .unwrap()
        });
    });
}

fn benchmark_dirty_selection(c: &mut Criterion) {
    let entries: Vec<Entry> = (0..1000).map(sample_entry).collect();
    let text = ListingBuffer::from_entries("/bench", entries).render();

    c.bench_function("dirty_select_all", |b| {
        b.iter(|| {
            // 編集後は行から再解析される
            let mut listing = ListingBuffer::reparse("/bench", black_box(&text));
            let count = listing.line_count();
            listing.set_selection_range(0, count, true, false).unwrap();
        });
    });
}

criterion_group!(
    benches,
    benchmark_entry_format_parse,
    benchmark_snapshot,
    benchmark_dirty_selection
);
criterion_main!(benches);

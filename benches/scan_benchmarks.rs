use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use finddups::duplicates::{
    DuplicateFinder, FileIdentity, FinderConfig, Resolver, ResolverConfig, SizeIndex,
};
use finddups::scanner::{Walker, WalkerConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// Tree of `depth` levels, two subdirectories per level
fn setup_test_dir(depth: usize, files_per_dir: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    create_dir_recursive(temp_dir.path().to_path_buf(), depth, files_per_dir);
    temp_dir
}

fn create_dir_recursive(path: PathBuf, depth: usize, files_per_dir: usize) {
    if depth == 0 {
        return;
    }
    fs::create_dir_all(&path).expect("Failed to create dir");

    for i in 0..files_per_dir {
        let file_path = path.join(format!("file_{}.txt", i));
        // Sizes repeat across directories so buckets have several candidates
        fs::write(file_path, vec![b'a' + (i % 3) as u8; 64 * (i + 1)])
            .expect("Failed to write file");
    }

    if depth > 1 {
        for i in 0..2 {
            create_dir_recursive(path.join(format!("dir_{}", i)), depth - 1, files_per_dir);
        }
    }
}

// Files of one size sharing a long prefix, so skip-ahead has work to do
fn setup_bucket(dir: &Path, files: usize, size: usize) -> Vec<PathBuf> {
    (0..files)
        .map(|i| {
            let mut content = vec![b'p'; size];
            let tail = size - 1 - (i % 4);
            content[tail] = b'q';
            let path = dir.join(format!("bucket_{i:03}.bin"));
            fs::write(&path, content).expect("Failed to write bucket file");
            path
        })
        .collect()
}

// 1. Directory Walking
fn bench_walker(c: &mut Criterion) {
    let temp_dir = setup_test_dir(4, 10);
    let config = WalkerConfig::default();

    c.bench_function("walker_150_files", |b| {
        b.iter(|| {
            let walker = Walker::new(temp_dir.path(), config.clone());
            let files: Vec<_> = walker.walk().collect();
            black_box(files);
        })
    });
}

// 2. Resolving a single large bucket at different chunk sizes
fn bench_resolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolver");
    let temp_dir = TempDir::new().unwrap();
    let paths = setup_bucket(temp_dir.path(), 24, 256 * 1024);

    for chunk_size in [1024usize, 64 * 1024] {
        group.bench_with_input(
            BenchmarkId::new("bucket_24x256KiB", chunk_size),
            &chunk_size,
            |b, &chunk_size| {
                let resolver = Resolver::new(ResolverConfig::default().with_chunk_size(chunk_size));
                b.iter(|| {
                    let mut index = SizeIndex::new();
                    for (i, path) in paths.iter().enumerate() {
                        index.insert(FileIdentity::new(path.clone(), 0, i as u64), 256 * 1024);
                    }
                    black_box(resolver.resolve(index).unwrap());
                });
            },
        );
    }
    group.finish();
}

// 3. Full Pipeline
fn bench_pipeline(c: &mut Criterion) {
    let temp_dir = setup_test_dir(3, 10);
    let finder = DuplicateFinder::new(FinderConfig::default());
    let jobs4 = DuplicateFinder::new(
        FinderConfig::default().with_resolver_config(ResolverConfig::default().with_jobs(4)),
    );
    let roots = vec![temp_dir.path().to_path_buf()];

    c.bench_function("pipeline_70_files", |b| {
        b.iter(|| black_box(finder.find_duplicates_in_paths(&roots).unwrap()))
    });
    c.bench_function("pipeline_70_files_jobs4", |b| {
        b.iter(|| black_box(jobs4.find_duplicates_in_paths(&roots).unwrap()))
    });
}

criterion_group!(benches, bench_walker, bench_resolver, bench_pipeline);
criterion_main!(benches);

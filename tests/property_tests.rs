use finddups::duplicates::{FileIdentity, Resolver, ResolverConfig, SizeIndex};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write `contents` as files `f000`, `f001`, ... and return their paths.
fn materialize(dir: &TempDir, contents: &[Vec<u8>]) -> Vec<PathBuf> {
    contents
        .iter()
        .enumerate()
        .map(|(i, content)| {
            let path = dir.path().join(format!("f{i:03}"));
            fs::write(&path, content).unwrap();
            path
        })
        .collect()
}

/// Groups computed by full comparison of every pair, in the order the
/// resolver reports them: larger sizes first, then by first member.
fn naive_groups(contents: &[Vec<u8>]) -> Vec<(u64, Vec<usize>)> {
    let mut by_size: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
    for (i, content) in contents.iter().enumerate() {
        by_size.entry(content.len() as u64).or_default().push(i);
    }

    let mut groups = Vec::new();
    for (size, members) in by_size.into_iter().rev() {
        let mut taken = vec![false; members.len()];
        for a in 0..members.len() {
            if taken[a] {
                continue;
            }
            let mut group = vec![members[a]];
            for b in a + 1..members.len() {
                if !taken[b] && contents[members[a]] == contents[members[b]] {
                    taken[b] = true;
                    group.push(members[b]);
                }
            }
            if group.len() > 1 {
                groups.push((size, group));
            }
        }
    }
    groups
}

fn resolved_groups(
    paths: &[PathBuf],
    contents: &[Vec<u8>],
    config: ResolverConfig,
) -> Vec<(u64, Vec<usize>)> {
    let mut index = SizeIndex::new();
    for (i, (path, content)) in paths.iter().zip(contents).enumerate() {
        index.insert(FileIdentity::new(path.clone(), 1, i as u64), content.len() as u64);
    }

    let (groups, _) = Resolver::new(config).resolve(index).unwrap();
    groups
        .into_iter()
        .map(|g| {
            let members = g
                .files
                .iter()
                .map(|f| paths.iter().position(|p| *p == f.path).unwrap())
                .collect();
            (g.size, members)
        })
        .collect()
}

/// Short strings over a two-letter alphabet share prefixes constantly, which
/// is what exercises skip-ahead and inferred differences.
fn file_contents() -> impl Strategy<Value = Vec<Vec<u8>>> {
    let content = prop::collection::vec(prop::sample::select(vec![b'a', b'b']), 0..6);
    prop::collection::vec(content, 0..14)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_resolver_agrees_with_full_comparison(
        contents in file_contents(),
        chunk_size in 1usize..8,
    ) {
        let dir = TempDir::new().unwrap();
        let paths = materialize(&dir, &contents);

        let expected = naive_groups(&contents);
        let actual = resolved_groups(
            &paths,
            &contents,
            ResolverConfig::default().with_chunk_size(chunk_size),
        );

        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn test_parallel_resolution_is_order_stable(
        contents in file_contents(),
        jobs in 2usize..5,
    ) {
        let dir = TempDir::new().unwrap();
        let paths = materialize(&dir, &contents);

        let sequential = resolved_groups(&paths, &contents, ResolverConfig::default());
        let parallel = resolved_groups(
            &paths,
            &contents,
            ResolverConfig::default().with_jobs(jobs),
        );

        prop_assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_size_index_invariants(sizes in prop::collection::vec(0u64..20, 0..60)) {
        let mut index = SizeIndex::new();
        for (i, &size) in sizes.iter().enumerate() {
            // Every third file repeats the previous inode, like a hard link
            let inode = if i % 3 == 2 { i as u64 - 1 } else { i as u64 };
            index.insert(FileIdentity::new(format!("/f/{i}"), 1, inode), size);
        }

        let total = index.len();
        let skipped = index.hardlinks_skipped();
        prop_assert_eq!(total + skipped, sizes.len());

        let buckets: Vec<_> = index.drain_ordered().collect();
        let mut previous = None;
        let mut seen = 0;
        for bucket in &buckets {
            // Strictly descending sizes
            if let Some(prev) = previous {
                prop_assert!(bucket.size < prev);
            }
            previous = Some(bucket.size);
            prop_assert!(!bucket.is_empty());
            seen += bucket.len();

            // No two entries share an inode
            for (a, fa) in bucket.files.iter().enumerate() {
                for fb in &bucket.files[a + 1..] {
                    prop_assert!(!fa.same_file(fb));
                }
            }
        }
        prop_assert_eq!(seen, total);
    }
}

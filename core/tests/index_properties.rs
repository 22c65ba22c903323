use invert_core::build::build_from_entries;
use invert_core::codec::{format_record, parse_record, PostingsWriter};
use invert_core::index::invert;
use invert_core::persist::IndexPaths;
use invert_core::{DocId, ForwardEntry, Position, Posting, TermId};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tempfile::tempdir;

/// Random forward index: per document, a map of term id to its positions.
fn forward_index() -> impl Strategy<Value = Vec<BTreeMap<TermId, BTreeSet<Position>>>> {
    prop::collection::vec(
        prop::collection::btree_map(1u32..40, prop::collection::btree_set(1u32..500, 1..8), 0..10),
        1..20,
    )
}

fn entries_of(docs: &[BTreeMap<TermId, BTreeSet<Position>>]) -> Vec<ForwardEntry> {
    let mut entries = Vec::new();
    for (i, terms) in docs.iter().enumerate() {
        for (&term_id, positions) in terms {
            let positions = positions.iter().copied().collect();
            entries.push(ForwardEntry::new(i as DocId + 1, term_id, positions));
        }
    }
    // input order must not matter
    entries.reverse();
    entries
}

fn expected_lists(docs: &[BTreeMap<TermId, BTreeSet<Position>>]) -> BTreeMap<TermId, Vec<Posting>> {
    let mut out: BTreeMap<TermId, Vec<Posting>> = BTreeMap::new();
    for (i, terms) in docs.iter().enumerate() {
        for (&term_id, positions) in terms {
            out.entry(term_id)
                .or_default()
                .push(Posting::new(i as DocId + 1, positions.iter().copied().collect()));
        }
    }
    out
}

proptest! {
    #[test]
    fn records_roundtrip(docs in forward_index()) {
        let lists = invert(entries_of(&docs)).unwrap().into_sorted_lists();
        let expected = expected_lists(&docs);
        prop_assert_eq!(lists.len(), expected.len());
        for list in &lists {
            let line = format_record(list.term_id, &list.postings);
            let (term_id, decoded) = parse_record(&line).unwrap();
            prop_assert_eq!(term_id, list.term_id);
            prop_assert_eq!(&decoded, &expected[&list.term_id]);
            prop_assert!(decoded.windows(2).all(|w| w[0].doc_id < w[1].doc_id));
            prop_assert!(decoded.iter().all(|p| p.positions.windows(2).all(|w| w[0] < w[1])));
        }
    }

    #[test]
    fn offsets_and_counts_match_records(docs in forward_index()) {
        let lists = invert(entries_of(&docs)).unwrap().into_sorted_lists();
        let mut writer = PostingsWriter::new(Vec::new());
        let infos = writer.write_all(&lists).unwrap();
        let bytes = writer.finish().unwrap();

        prop_assert_eq!(infos.len(), lists.len());
        for (info, list) in infos.iter().zip(&lists) {
            prop_assert_eq!(info.term_id, list.term_id);
            let rest = &bytes[info.offset as usize..];
            let end = rest.iter().position(|&b| b == b'\n').unwrap();
            let line = std::str::from_utf8(&rest[..end]).unwrap();
            let (term_id, decoded) = parse_record(line).unwrap();
            prop_assert_eq!(term_id, info.term_id);
            let total: u64 = decoded.iter().map(|p| p.positions.len() as u64).sum();
            prop_assert_eq!(total, info.total_occurrences);
            prop_assert_eq!(decoded.len() as u32, info.document_count);
        }
    }

    #[test]
    fn rebuild_is_byte_identical(docs in forward_index()) {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        let pa = IndexPaths::new(a.path());
        let pb = IndexPaths::new(b.path());
        build_from_entries(&pa, entries_of(&docs)).unwrap();
        build_from_entries(&pb, entries_of(&docs)).unwrap();
        let read = |p: &std::path::Path| std::fs::read(p).unwrap();
        prop_assert_eq!(read(&pa.postings), read(&pb.postings));
        prop_assert_eq!(read(&pa.term_info), read(&pb.term_info));
    }
}

#[test]
fn worked_example() {
    let lists = invert(vec![ForwardEntry::new(1, 5, vec![1, 3]), ForwardEntry::new(2, 5, vec![2])])
        .unwrap()
        .into_sorted_lists();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].postings, vec![Posting::new(1, vec![1, 3]), Posting::new(2, vec![2])]);
    let line = format_record(5, &lists[0].postings);
    assert_eq!(line, "5\t1:1\t0:2\t1:2");
    assert_eq!(parse_record(&line).unwrap().1, lists[0].postings);
}

#[test]
fn postings_and_catalog_share_term_order() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let entries: Vec<ForwardEntry> = (1..=50u32)
        .rev()
        .map(|t| ForwardEntry::new(t % 7 + 1, t, vec![t]))
        .collect();
    build_from_entries(&paths, entries).unwrap();

    let first_field = |text: String| -> Vec<String> {
        text.lines().map(|l| l.split('\t').next().unwrap().to_string()).collect()
    };
    let postings_order = first_field(std::fs::read_to_string(&paths.postings).unwrap());
    let catalog_order = first_field(std::fs::read_to_string(&paths.term_info).unwrap());
    assert_eq!(postings_order.len(), 50);
    assert_eq!(postings_order, catalog_order);
}

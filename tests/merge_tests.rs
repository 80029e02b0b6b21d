mod common;

use common::{child_labels, parent_label, tree, union};
use pretty_assertions::assert_eq;
use taxomerge::alignment::Alignment;
use taxomerge::report::{NullSink, Report};
use taxomerge::{Config, Flag, Taxonomy};

fn shape(taxonomy: &Taxonomy) -> Vec<(String, Option<String>)> {
    taxonomy
        .walk()
        .map(|n| (taxonomy.label(n), taxonomy.parent(n).map(|p| taxonomy.label(p))))
        .collect()
}

#[test]
fn test_lower_priority_member_joins_existing_grouping() {
    let mut union = union();
    let mut first = tree("first", "((x,y)v,q)top");
    let mut second = tree("second", "(x,y,z)w");

    union.absorb(&mut first, &mut NullSink).unwrap();
    let outcome = union.absorb(&mut second, &mut NullSink).unwrap();

    let u = union.taxonomy();
    let v = u.lookup_unique("v").unwrap();
    assert_eq!(child_labels(u, v), vec!["x", "y", "z"]);
    assert_eq!(outcome.reflected, 1);
    assert_eq!(outcome.grafted, 1);
    assert!(u.lookup_primary("w").next().is_none());
    assert!(u[v].synonyms().iter().any(|s| s == "w"));
}

#[test]
fn test_merging_twice_adds_nothing() {
    let mut union = union();
    let mut source = tree("s", "(((a,b)ab,(c,d)cd)abcd,(e,(f,g)fg)efg)top");
    union.absorb(&mut source, &mut NullSink).unwrap();
    let before = shape(union.taxonomy());

    let outcome = union.absorb(&mut source, &mut NullSink).unwrap();
    assert_eq!(outcome.grafted, 0);
    assert_eq!(outcome.resolutions, 0);
    assert!(!outcome.has_conflicts());
    assert_eq!(shape(union.taxonomy()), before);
}

#[test]
fn test_higher_priority_grouping_wins_conflict() {
    let mut union = union();
    let mut first = tree("first", "((a,c)ac,(b,d)bd)top");
    let mut second = tree("second", "((a,b)ab,(c,d)cd)top");
    union.absorb(&mut first, &mut NullSink).unwrap();
    let before = shape(union.taxonomy());

    let mut report = Report::new("merge");
    let outcome = union.absorb(&mut second, &mut report).unwrap();

    assert_eq!(outcome.conflicts.len(), 2);
    assert_eq!(report.conflicts.len(), 2);
    assert_eq!(shape(union.taxonomy()), before);
    assert_eq!(parent_label(union.taxonomy(), "a").as_deref(), Some("ac"));

    let record = &report.conflicts[0];
    assert_eq!(record.source, "second");
    assert_eq!(record.node, "ab");
    assert_eq!(record.conflicting_child, "ac");

    for name in ["ab", "cd"] {
        let node = second.lookup_unique(name).unwrap();
        assert!(second[node].has_flag(Flag::Unplaced));
    }
}

#[test]
fn test_refinement_from_second_source() {
    let mut union = union();
    let mut first = tree("first", "(a,b,c)top");
    let mut second = tree("second", "((a,b)ab,c)top");
    union.absorb(&mut first, &mut NullSink).unwrap();
    let outcome = union.absorb(&mut second, &mut NullSink).unwrap();

    assert_eq!(outcome.resolutions, 1);
    assert_eq!(parent_label(union.taxonomy(), "a").as_deref(), Some("ab"));
    assert_eq!(parent_label(union.taxonomy(), "ab").as_deref(), Some("top"));
    assert_eq!(union.sources(), &["first".to_string(), "second".to_string()]);
}

fn align_to_duplicate(nested: &str) -> (Taxonomy, Taxonomy, Alignment, Report) {
    let source = tree("s", nested);
    let copy = source.duplicate("copy");
    let mut report = Report::new("align");
    let alignment = Alignment::align(
        &source,
        &copy,
        &Config::default().alignment,
        None,
        &mut report,
    )
    .unwrap();
    (source, copy, alignment, report)
}

#[test]
fn test_align_to_duplicate_maps_every_node() {
    let (source, copy, alignment, report) =
        align_to_duplicate("(((a,b)ab,(c,d)cd)abcd,(e,(f,g)fg)efg,((x)x)xx)top");

    for node in source.walk() {
        let image = alignment.image(node).expect("every node should be aligned");
        assert_eq!(image.index(), node.index(), "{} misaligned", source.label(node));
        assert_eq!(copy.label(image), source.label(node));
    }
    assert!(report.conflicts.is_empty());
}

#[test]
fn test_nested_homonyms_align_to_their_own_copy() {
    let (source, _, alignment, _) = align_to_duplicate("((x)x)xx");
    assert_eq!(source.lookup("x").len(), 2);
    for node in source.walk() {
        assert_eq!(alignment.image(node).map(|n| n.index()), Some(node.index()));
    }
}

#[test]
fn test_merge_is_deterministic() {
    let run = || {
        let mut union = union();
        for (tag, nested) in [
            ("ncbi", "(((a,b)ab,c)abc,(d,e)de)top"),
            ("gbif", "((a,b,c,x)abc,(d,(e,y)ey)de)top"),
            ("irmng", "((a,c)ac,(b,z)bz)top"),
        ] {
            let mut source = tree(tag, nested);
            union.absorb(&mut source, &mut NullSink).unwrap();
        }
        shape(union.taxonomy())
    };
    assert_eq!(run(), run());
}

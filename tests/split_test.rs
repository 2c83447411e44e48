//! Subtree splitting

use rstest::{fixture, rstest};

use blotree::infrastructure::MemoryPresentation;
use blotree::util::testing::{add_line, empty_document, init_test_setup, markup};
use blotree::{Document, FormatValue, NodeId, TreeError};

type Doc = Document<MemoryPresentation>;

#[fixture]
fn doc() -> Doc {
    init_test_setup();
    empty_document()
}

/// `abc<STRONG>de</STRONG>fg` in one line.
fn formatted_line(doc: &mut Doc) -> NodeId {
    let line = add_line(doc, &["abc", "de", "fg"]).unwrap();
    let de = doc.children(line).unwrap()[1];
    doc.wrap(de, "bold", FormatValue::Bool(true)).unwrap();
    line
}

#[rstest]
fn given_zero_when_splitting_then_returns_node_itself(mut doc: Doc) {
    let line = formatted_line(&mut doc);
    let count = doc.node_count();

    assert_eq!(doc.split(line, 0).unwrap(), Some(line));
    assert_eq!(doc.node_count(), count);
}

#[rstest]
fn given_full_length_when_splitting_then_returns_next_sibling(mut doc: Doc) {
    let first = add_line(&mut doc, &["ab"]).unwrap();
    let second = add_line(&mut doc, &["cd"]).unwrap();
    let count = doc.node_count();

    assert_eq!(doc.split(first, 2).unwrap(), Some(second));
    assert_eq!(doc.split(second, 2).unwrap(), None);
    assert_eq!(doc.node_count(), count);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(4)]
#[case(5)]
#[case(6)]
fn given_inner_index_when_splitting_then_partitions_content(mut doc: Doc, #[case] index: usize) {
    let line = formatted_line(&mut doc);
    let original = doc.plain_text(line).unwrap();

    let after = doc.split(line, index).unwrap().expect("inner split creates a sibling");

    assert_ne!(after, line);
    assert_eq!(doc.kind(after).unwrap(), "line");
    assert_eq!(doc.next(line).unwrap(), Some(after));
    assert_eq!(doc.length(line).unwrap(), index);
    assert_eq!(doc.length(after).unwrap(), 7 - index);
    let joined = doc.plain_text(line).unwrap() + &doc.plain_text(after).unwrap();
    assert_eq!(joined, original);
    assert_eq!(doc.length(doc.root()).unwrap(), 7);
    doc.check_consistency().unwrap();
}

#[rstest]
fn given_index_inside_format_when_splitting_then_both_sides_keep_format(mut doc: Doc) {
    let line = formatted_line(&mut doc);

    doc.split(line, 4).unwrap();

    assert_eq!(
        markup(&doc),
        "<P>abc<STRONG>d</STRONG></P><P><STRONG>e</STRONG>fg</P>"
    );
    doc.check_consistency().unwrap();
}

#[rstest]
fn given_index_on_child_boundary_when_splitting_then_moves_whole_children(mut doc: Doc) {
    let line = formatted_line(&mut doc);
    let children = doc.children(line).unwrap();

    let after = doc.split(line, 3).unwrap().unwrap();

    assert_eq!(doc.children(line).unwrap(), vec![children[0]]);
    assert_eq!(doc.children(after).unwrap(), vec![children[1], children[2]]);
    assert_eq!(markup(&doc), "<P>abc</P><P><STRONG>de</STRONG>fg</P>");
}

#[rstest]
fn given_following_line_when_splitting_then_new_line_goes_between(mut doc: Doc) {
    let first = add_line(&mut doc, &["abcd"]).unwrap();
    let last = add_line(&mut doc, &["zz"]).unwrap();

    let after = doc.split(first, 2).unwrap().unwrap();

    assert_eq!(doc.children(doc.root()).unwrap(), vec![first, after, last]);
    assert_eq!(markup(&doc), "<P>ab</P><P>cd</P><P>zz</P>");
    doc.check_consistency().unwrap();
}

#[rstest]
fn given_text_leaf_when_splitting_then_tail_follows(mut doc: Doc) {
    let line = add_line(&mut doc, &["héllo"]).unwrap();
    let leaf = doc.children(line).unwrap()[0];

    let tail = doc.split(leaf, 2).unwrap().unwrap();

    assert_eq!(doc.text(leaf).unwrap(), Some("hé"));
    assert_eq!(doc.text(tail).unwrap(), Some("llo"));
    assert_eq!(doc.next(leaf).unwrap(), Some(tail));
    doc.check_consistency().unwrap();
}

#[rstest]
fn given_root_when_splitting_inside_then_fails(mut doc: Doc) {
    add_line(&mut doc, &["ab"]).unwrap();
    add_line(&mut doc, &["cd"]).unwrap();
    let root = doc.root();

    assert_eq!(doc.split(root, 2), Err(TreeError::NoParent(root)));
    assert_eq!(doc.split(root, 0).unwrap(), Some(root));
}

#[rstest]
fn given_index_past_end_when_splitting_then_fails(mut doc: Doc) {
    let line = add_line(&mut doc, &["ab"]).unwrap();

    assert_eq!(
        doc.split(line, 3),
        Err(TreeError::OffsetOutOfRange {
            index: 3,
            length: 2
        })
    );
}

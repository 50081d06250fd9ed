//! Integration tests for document building, tree operations, and
//! serialization round trips.

use arborxml::{Document, NodeData, NodeKind, ParseErrorKind};
use pretty_assertions::assert_eq;

fn parse_error_kind(input: &str) -> ParseErrorKind {
    match Document::parse(input.as_bytes()) {
        Ok(_) => panic!("expected parse failure for {input:?}"),
        Err(err) => err.kind,
    }
}

// =============================================================================
// Building Trees
// =============================================================================

#[test]
fn test_parse_builds_nested_tree() {
    let doc = Document::parse(
        b"<order id=\"17\"><customer>Ada</customer><total currency=\"EUR\">45.90</total></order>",
    )
    .unwrap();

    let order = doc.root_element().unwrap();
    assert_eq!(doc.get(order).unwrap().name(), Some("order"));
    assert_eq!(doc.attribute(order, "id"), Some("17"));
    assert_eq!(doc.count_children(order), 2);

    let customer = doc.first_child_named(order, "customer").unwrap();
    assert_eq!(doc.text_content(customer), "Ada");

    let total = doc.first_child_named(order, "total").unwrap();
    assert_eq!(doc.attribute(total, "currency"), Some("EUR"));
    assert_eq!(doc.text_content(total), "45.90");
}

#[test]
fn test_empty_input_is_an_empty_document() {
    let doc = Document::parse(b"").unwrap();
    assert_eq!(doc.node_count(), 1);
    assert_eq!(doc.root_element(), None);
    assert_eq!(doc.to_xml(), "");
}

#[test]
fn test_whitespace_between_top_level_nodes_is_dropped() {
    let doc = Document::parse(b" \r\n\t\0<a/>\n").unwrap();
    assert_eq!(doc.count_children(doc.container()), 1);
}

#[test]
fn test_root_level_text_is_rejected() {
    assert_eq!(parse_error_kind("junk<a/>"), ParseErrorKind::StructuralViolation);
}

#[test]
fn test_trailing_text_after_root_is_ignored() {
    // Content that never reaches another '<' is dropped at end of input
    let doc = Document::parse(b"<a/>trailing").unwrap();
    assert_eq!(doc.count_children(doc.container()), 1);
}

#[test]
fn test_mismatched_close_tag_fails() {
    assert_eq!(parse_error_kind("<a></b>"), ParseErrorKind::MismatchedClose);
}

#[test]
fn test_anonymous_close_matches_any_element() {
    let doc = Document::parse(b"<outer><inner></></outer>").unwrap();
    let outer = doc.root_element().unwrap();
    assert!(doc.first_child_named(outer, "inner").is_some());
}

#[test]
fn test_stray_close_tag_fails() {
    assert_eq!(parse_error_kind("</a>"), ParseErrorKind::StructuralViolation);
}

#[test]
fn test_unterminated_element_fails() {
    assert_eq!(parse_error_kind("<a><b></b>"), ParseErrorKind::UnterminatedConstruct);
}

#[test]
fn test_unclosed_cdata_is_tolerated() {
    let doc = Document::parse(b"<script><![CDATA[alert(1)").unwrap();
    let script = doc.root_element().unwrap();
    assert_eq!(doc.text_content(script), "alert(1)");

    let blob = doc.first_child(script).unwrap();
    assert_eq!(doc.get(blob).unwrap().kind(), NodeKind::CharData);
}

#[test]
fn test_text_and_cdata_children() {
    let doc = Document::parse(b"<s>a<![CDATA[b]]>c</s>").unwrap();
    let s = doc.root_element().unwrap();

    let kinds: Vec<NodeKind> = doc
        .children(s)
        .map(|id| doc.get(id).unwrap().kind())
        .collect();
    assert_eq!(kinds, vec![NodeKind::Text, NodeKind::CharData, NodeKind::Text]);
    assert_eq!(doc.text_content(s), "abc");
}

#[test]
fn test_attribute_entities_are_resolved() {
    let doc = Document::parse(b"<a msg=\"1 &lt; 2 &amp; 3 &gt; 2\"/>").unwrap();
    let a = doc.root_element().unwrap();
    assert_eq!(doc.attribute(a, "msg"), Some("1 < 2 & 3 > 2"));
}

#[test]
fn test_utf16_input_builds_the_same_tree() {
    let input = "<menu title=\"caf\u{e9}\"><dish>cr\u{ea}pe</dish></menu>";

    let mut bytes = vec![0xFF, 0xFE];
    for unit in input.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }

    let from_utf16 = Document::parse(&bytes).unwrap();
    let from_utf8 = Document::parse(input.as_bytes()).unwrap();
    assert_eq!(from_utf16.to_xml(), from_utf8.to_xml());
}

// =============================================================================
// Processing Instructions
// =============================================================================

#[test]
fn test_retained_instruction_keeps_data_tokens() {
    let doc = Document::parse(
        b"<?originalXFAVersion http://www.xfa.org/schema/xfa-template/2.8/ v2.8-scripting:1 ?><root/>",
    )
    .unwrap();

    let pi = doc.first_child(doc.container()).unwrap();
    assert_eq!(doc.get(pi).unwrap().kind(), NodeKind::Instruction);
    assert_eq!(doc.get(pi).unwrap().name(), Some("originalXFAVersion"));
    assert_eq!(
        doc.instruction_data(pi),
        &[
            "http://www.xfa.org/schema/xfa-template/2.8/".to_string(),
            "v2.8-scripting:1".to_string(),
        ]
    );
}

#[test]
fn test_unknown_instruction_target_is_dropped() {
    let doc = Document::parse(b"<?php echo_something ?><root/>").unwrap();
    assert_eq!(doc.count_children(doc.container()), 1);
    let root = doc.first_child(doc.container()).unwrap();
    assert_eq!(doc.get(root).unwrap().kind(), NodeKind::Element);
}

#[test]
fn test_declaration_pseudo_attributes_are_not_stored() {
    let doc = Document::parse(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><root/>").unwrap();
    let pi = doc.first_child(doc.container()).unwrap();
    assert_eq!(doc.get(pi).unwrap().kind(), NodeKind::Instruction);
    assert!(doc.instruction_data(pi).is_empty());
}

// =============================================================================
// Serialization
// =============================================================================

#[test]
fn test_childless_element_collapses_to_self_closing() {
    let doc = Document::parse(b"<root first=\"one\" second=\"two\"></root>").unwrap();
    assert_eq!(doc.to_xml(), "<root first=\"one\" second=\"two\" />\n");
}

#[test]
fn test_attributes_serialize_in_name_order() {
    let doc = Document::parse(b"<root zeta=\"3\" alpha=\"1\" mu=\"2\"/>").unwrap();
    assert_eq!(doc.to_xml(), "<root alpha=\"1\" mu=\"2\" zeta=\"3\" />\n");
}

#[test]
fn test_save_output_reparses_to_itself() {
    let src = "<?xml version='1.0'?>\n\
               <root zeta=\"z\" alpha=\"a\">\n\
               \x20 <item>one &amp; two</item>\n\
               \x20 <blob><![CDATA[raw <stuff>]]></blob>\n\
               </root>";

    let first = Document::parse(src.as_bytes()).unwrap().to_xml();
    let second = Document::parse(first.as_bytes()).unwrap().to_xml();
    assert_eq!(first, second);

    assert_eq!(
        first,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <root alpha=\"a\" zeta=\"z\">\n\
         \x20 <item>one &amp; two</item>\n\
         \x20 <blob><![CDATA[raw <stuff>]]></blob>\n\
         </root>\n"
    );
}

#[test]
fn test_attribute_specials_round_trip() {
    let mut doc = Document::new();
    let root = doc.create_node(NodeData::element("r"));
    doc.append_child(doc.container(), root);
    doc.set_attribute(root, "v", "a<b&c>\"d'e");

    let reparsed = Document::parse(doc.to_xml().as_bytes()).unwrap();
    let r = reparsed.root_element().unwrap();
    assert_eq!(reparsed.attribute(r, "v"), Some("a<b&c>\"d'e"));
}

#[test]
fn test_deeply_nested_round_trip() {
    let mut src = String::new();
    for _ in 0..200 {
        src.push_str("<d>");
    }
    for _ in 0..200 {
        src.push_str("</d>");
    }

    let first = Document::parse(src.as_bytes()).unwrap().to_xml();
    let second = Document::parse(first.as_bytes()).unwrap().to_xml();
    assert_eq!(first, second);
}

// =============================================================================
// Tree Operations
// =============================================================================

#[test]
fn test_insert_into_parsed_tree() {
    let mut doc = Document::parse(b"<r><a/><c/></r>").unwrap();
    let r = doc.root_element().unwrap();
    let b = doc.create_node(NodeData::element("b"));
    doc.insert_child_at(r, 1, b);

    assert_eq!(doc.to_xml(), "<r><a /><b /><c /></r>\n");
}

#[test]
fn test_remove_and_clear_children() {
    let mut doc = Document::parse(b"<r><a/><b/><c/></r>").unwrap();
    let r = doc.root_element().unwrap();
    let b = doc.first_child_named(r, "b").unwrap();

    doc.remove_child(r, b);
    assert_eq!(doc.to_xml(), "<r><a /><c /></r>\n");

    doc.clear_children(r);
    assert_eq!(doc.to_xml(), "<r />\n");
}

#[test]
fn test_nth_child_named_walks_same_named_siblings() {
    let doc = Document::parse(b"<r><i>1</i><x/><i>2</i><i>3</i></r>").unwrap();
    let r = doc.root_element().unwrap();

    for (index, expected) in [(0, "1"), (1, "2"), (2, "3")] {
        let hit = doc.nth_child_named(r, "i", index).unwrap();
        assert_eq!(doc.text_content(hit), expected);
    }
    assert_eq!(doc.nth_child_named(r, "i", 3), None);
    assert_eq!(doc.first_child_named(r, "i"), doc.nth_child_named(r, "i", 0));
}

#[test]
fn test_child_at_counts_every_kind() {
    let doc = Document::parse(b"<r>x<e/>y</r>").unwrap();
    let r = doc.root_element().unwrap();
    assert_eq!(doc.count_children(r), 3);

    let second = doc.child_at(r, 1).unwrap();
    assert_eq!(doc.get(second).unwrap().kind(), NodeKind::Element);
    assert_eq!(doc.child_at(r, 3), None);
}

#[test]
fn test_clone_node_merges_direct_text() {
    let mut doc = Document::parse(b"<e a=\"1\">x<![CDATA[y]]><sub>deep</sub>z</e>").unwrap();
    let e = doc.root_element().unwrap();

    let clone = doc.clone_node(e).unwrap();
    assert_eq!(doc.get(clone).unwrap().name(), Some("e"));
    assert_eq!(doc.attribute(clone, "a"), Some("1"));
    // Direct text and CDATA collapse into one text child; the subtree
    // under <sub> is not copied
    assert_eq!(doc.count_children(clone), 1);
    assert_eq!(doc.text_content(clone), "xyz");
}

#[test]
fn test_clone_subtree_copies_everything() {
    let mut doc = Document::parse(b"<e a=\"1\">x<sub b=\"2\">deep</sub></e>").unwrap();
    let e = doc.root_element().unwrap();

    let clone = doc.clone_subtree(e).unwrap();
    assert_eq!(doc.node_to_xml(clone), doc.node_to_xml(e));
    // The copy is detached and distinct
    assert_eq!(doc.parent(clone), None);
    assert_ne!(clone, e);
}

#[test]
fn test_merge_arena_imports_foreign_tree() {
    let mut target = Document::parse(b"<host><slot/></host>").unwrap();
    let other = Document::parse(b"<guest kind=\"imported\">payload</guest>").unwrap();
    let guest_root = other.root_element().unwrap();

    let offset = target.merge_arena(other);
    let imported = guest_root + offset;

    let host = target.root_element().unwrap();
    let slot = target.first_child_named(host, "slot").unwrap();
    target.append_child(slot, imported);

    assert_eq!(
        target.to_xml(),
        "<host><slot><guest kind=\"imported\">payload</guest></slot></host>\n"
    );
}

// =============================================================================
// Namespaces and Paths
// =============================================================================

#[test]
fn test_namespace_resolution_walks_ancestors() {
    let doc = Document::parse(
        b"<root xmlns=\"urn:d\" xmlns:p=\"urn:p\"><mid><p:leaf/><leaf/></mid></root>",
    )
    .unwrap();
    let root = doc.root_element().unwrap();
    let mid = doc.first_child_named(root, "mid").unwrap();
    let prefixed = doc.first_child_named(mid, "p:leaf").unwrap();
    let plain = doc.first_child_named(mid, "leaf").unwrap();

    assert_eq!(doc.prefix(prefixed), Some("p"));
    assert_eq!(doc.local_name(prefixed), Some("leaf"));
    assert_eq!(doc.namespace_uri(prefixed), Some("urn:p"));

    assert_eq!(doc.prefix(plain), None);
    assert_eq!(doc.local_name(plain), Some("leaf"));
    assert_eq!(doc.namespace_uri(plain), Some("urn:d"));
}

#[test]
fn test_unbound_prefix_has_no_namespace() {
    let doc = Document::parse(b"<q:solo/>").unwrap();
    let solo = doc.root_element().unwrap();
    assert_eq!(doc.prefix(solo), Some("q"));
    assert_eq!(doc.namespace_uri(solo), None);
}

#[test]
fn test_node_by_path_qualified_and_local() {
    let doc = Document::parse(b"<ns:a><ns:b><ns:c/></ns:b></ns:a>").unwrap();
    let container = doc.container();

    let qualified = doc.node_by_path(container, "ns:a/ns:b/ns:c", true).unwrap();
    let local = doc.node_by_path(container, "a/b/c", false).unwrap();
    assert_eq!(qualified, local);

    assert_eq!(doc.node_by_path(container, "a/b/c", true), None);
}

#[test]
fn test_node_by_path_special_segments() {
    let doc = Document::parse(b"<a><b><c/></b></a>").unwrap();
    let a = doc.root_element().unwrap();
    let c = doc.node_by_path(a, "b/c", true).unwrap();

    assert_eq!(doc.node_by_path(c, ".", true), Some(c));
    assert_eq!(doc.node_by_path(c, "..", true), doc.parent(c));
    assert_eq!(doc.node_by_path(c, "../..", true), Some(a));
    // A leading '/' restarts from the top of the tree
    assert_eq!(doc.node_by_path(c, "/a/b/c", true), Some(c));
}

#[test]
fn test_node_by_path_backtracks_across_siblings() {
    let doc = Document::parse(b"<a><b><c/></b><b><d/></b></a>").unwrap();
    let a = doc.root_element().unwrap();

    // The first <b> has no <d>; the lookup must try the second
    let d = doc.node_by_path(a, "b/d", true).unwrap();
    assert_eq!(doc.get(d).unwrap().name(), Some("d"));
}

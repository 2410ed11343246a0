use treeview::prelude::*;

fn id(s: &str) -> NodeId {
    s.parse().unwrap()
}

fn pantry() -> Tree {
    Tree::with_nodes(
        TreeOptions::new().hierarchical_check(true),
        vec![
            NodeData::new("Fruit")
                .child(NodeData::new("Apple"))
                .child(NodeData::new("Banana"))
                .child(NodeData::new("Cherry")),
            NodeData::new("Vegetables")
                .child(NodeData::new("Carrot"))
                .child(NodeData::new("Leek").disabled(true)),
            NodeData::new("Bread").lazy(),
        ],
    )
}

#[test]
fn test_initial_listing() {
    let tree = pantry();
    let mut renderer = TextRenderer::new();
    renderer.render(&tree.nodes());

    insta::assert_snapshot!(renderer.output(), @r###"
▸ Fruit
▸ Vegetables
▸ Bread
"###);
}

#[test]
fn test_listing_after_interaction() {
    let mut tree = pantry();
    tree.toggle_checked(&[id("0.0.0")], StateOptions::default());
    tree.select_nodes(&[id("0.0")], StateOptions::default());
    tree.expand_all(EXPAND_ALL_LEVELS, StateOptions::default());
    tree.search("an", &SearchOptions::default()).unwrap();

    let mut renderer = TextRenderer::new().show_checkboxes(true);
    renderer.render(&tree.nodes());

    insta::assert_snapshot!(renderer.output(), @r###"
▾ [-] Fruit (selected)
    [x] Apple
    [ ] Banana (match)
    [ ] Cherry
▾ [ ] Vegetables
    [ ] Carrot
    [ ] Leek (disabled)
▸ [ ] Bread
"###);
}

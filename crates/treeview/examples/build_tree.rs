//! Builds a small tree, drives a few state changes and prints the
//! notifications they raise
//!
//! Usage:
//!   cargo run --example build_tree

use treeview::prelude::*;

fn main() {
    let options = TreeOptions::new()
        .hierarchical_check(true)
        .propagate_check_event(true);
    let mut tree = Tree::with_nodes(
        options,
        vec![
            NodeData::new("Fruit")
                .with_field("icon", "basket")
                .child(NodeData::new("Apple"))
                .child(NodeData::new("Banana"))
                .child(NodeData::new("Cherry")),
            NodeData::new("Vegetables")
                .child(NodeData::new("Carrot"))
                .child(NodeData::new("Leek").disabled(true)),
        ],
    );
    let events = tree.subscribe();

    let apple: NodeId = "0.0.0".parse().expect("valid node id");
    let fruit: NodeId = "0.0".parse().expect("valid node id");

    tree.toggle_checked(&[apple], StateOptions::default());
    tree.select_nodes(&[fruit], StateOptions::default());
    if let Err(err) = tree.search("^c", &SearchOptions::default()) {
        eprintln!("search failed: {}", err);
    }

    let mut renderer = TextRenderer::new().show_checkboxes(true);
    renderer.render(&tree.nodes());
    println!("{}", renderer.output());
    println!();

    println!("Notifications:");
    for event in events.try_iter() {
        println!("  {:?}", event);
    }
}

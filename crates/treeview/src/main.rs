//! Command-line front end: load a JSON tree description and print it
//!
//! Usage:
//!   treeview <file.json> [search-pattern]
//!
//! With a search pattern, matches are revealed and marked in the listing.

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use treeview::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        bail!("usage: treeview <file.json> [search-pattern]");
    };
    let pattern = args.next();

    let mut tree = Tree::new(TreeOptions::default());
    tree.load(DataSource::File(path.clone()))
        .with_context(|| format!("Failed to load tree from {}", path.display()))?;

    if let Some(pattern) = &pattern {
        let matches = tree
            .search(pattern, &SearchOptions::default())
            .with_context(|| format!("Failed to search for {:?}", pattern))?;
        println!("{} match(es) for {:?}", matches.len(), pattern);
        println!();
    }

    let mut renderer = TextRenderer::new().show_checkboxes(true);
    renderer.render(&tree.nodes());
    println!("{}", renderer.output());

    println!();
    println!("Summary:");
    println!("  Total nodes: {}", tree.len());
    println!("  Checked:     {}", tree.checked().len());
    println!("  Selected:    {}", tree.selected().len());
    println!("  Disabled:    {}", tree.disabled().len());

    Ok(())
}

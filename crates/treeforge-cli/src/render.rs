//! Plain-text views of a project for the terminal.

use std::collections::BTreeSet;

use treeforge_core::{NodeCategory, Project, Tree};

pub fn print_project(project: &Project) {
    println!("{} ({})", project.name, project.id);
    if let Some(description) = &project.description {
        println!("  {}", description);
    }
    println!(
        "  created {}, updated {}",
        project.created_at.format("%Y-%m-%d %H:%M"),
        project.updated_at.format("%Y-%m-%d %H:%M")
    );
    println!();

    let selected = project.selected_tree().map(|t| t.id.as_str());
    println!("Trees: {}", project.trees.len());
    for tree in project.trees.values() {
        let marker = if Some(tree.id.as_str()) == selected { "*" } else { " " };
        println!(
            "{} {} ({}) - {} blocks, {} connections",
            marker,
            tree.title,
            tree.id,
            tree.blocks.len(),
            tree.connections.len()
        );
        print_tree(tree);
        println!();
    }
}

/// Indented hierarchy from the root, then any blocks not reachable from it.
fn print_tree(tree: &Tree) {
    let mut visited = BTreeSet::new();
    if let Some(root) = tree.root_id.as_deref() {
        print_block(tree, root, 1, &mut visited);
    }

    let detached: Vec<&str> = tree
        .blocks
        .keys()
        .map(String::as_str)
        .filter(|id| !visited.contains(id) && tree.parent_of(id).is_none())
        .collect();
    if !detached.is_empty() {
        println!("    (detached)");
        for id in detached {
            print_block(tree, id, 2, &mut visited);
        }
    }
}

fn print_block<'a>(tree: &'a Tree, id: &'a str, depth: usize, visited: &mut BTreeSet<&'a str>) {
    if !visited.insert(id) {
        return;
    }
    let Some(block) = tree.block(id) else {
        return;
    };
    println!(
        "{}{} [{}] {} @ ({}, {})",
        "  ".repeat(depth + 1),
        block.display_name(),
        block.category,
        id.get(..8).unwrap_or(id),
        block.position.x,
        block.position.y
    );
    for child in tree.children_of(id) {
        print_block(tree, child, depth + 1, visited);
    }
}

pub fn print_templates(project: &Project) {
    for category in NodeCategory::ALL {
        let templates: Vec<_> = project
            .nodes
            .values()
            .filter(|t| t.category == category)
            .collect();
        if templates.is_empty() {
            continue;
        }
        println!("{}:", category);
        for template in templates {
            let origin = if template.is_default { "built-in" } else { "custom" };
            println!("  {:<12} {} ({})", template.name, template.display_name(), origin);
            for (key, value) in &template.properties {
                println!("      {} = {}", key, value);
            }
        }
    }
}

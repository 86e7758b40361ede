//! Treeforge CLI - behavior tree project editor.
//!
//! Single binary that provides:
//! - `treeforge new` / `list` / `show` / `delete` - project management
//! - `treeforge tree|block|node` - editing through the mutation engine
//! - `treeforge connect` / `disconnect` - wiring blocks
//! - `treeforge export` / `import` - interchange documents

mod render;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use treeforge_core::config::CONFIG_PATH;
use treeforge_core::serializer::{self, ExportKind};
use treeforge_core::{
    BlockUpdate, EditorConfig, NodeCategory, NodeTemplate, Position, Project, ProjectStorage,
    ProjectStore, Properties, PropertyValue,
};

#[derive(Parser)]
#[command(name = "treeforge")]
#[command(about = "Behavior tree project editor", version)]
struct Cli {
    /// Workspace root directory
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a workspace
    Init,

    /// Create a new project
    New {
        name: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// List stored projects
    List,

    /// Show a project and its trees
    Show { project: String },

    /// Tree management
    Tree {
        #[command(subcommand)]
        command: TreeCommands,
    },

    /// Block management
    Block {
        #[command(subcommand)]
        command: BlockCommands,
    },

    /// Node template management
    Node {
        #[command(subcommand)]
        command: NodeCommands,
    },

    /// Make TARGET a child of SOURCE
    Connect {
        project: String,
        tree: String,
        source: String,
        target: String,
    },

    /// Remove a connection
    Disconnect {
        project: String,
        tree: String,
        connection: String,
    },

    /// Export a project, one tree, or the custom node templates
    Export {
        project: String,

        /// Export only this tree
        #[arg(long, conflicts_with = "nodes")]
        tree: Option<String>,

        /// Export only custom node templates
        #[arg(long)]
        nodes: bool,

        /// Output file, or directory for a generated file name (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Import a project document
    Import {
        file: PathBuf,

        /// Replace a stored project with the same id
        #[arg(long)]
        force: bool,
    },

    /// Delete a stored project
    Delete { project: String },
}

#[derive(Subcommand)]
enum TreeCommands {
    /// Add a tree (it becomes selected)
    Add {
        project: String,
        title: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Remove a tree
    Rm { project: String, tree: String },

    /// Select a tree
    Select { project: String, tree: String },
}

#[derive(Subcommand)]
enum BlockCommands {
    /// Instantiate a node template into a tree
    Add {
        project: String,
        tree: String,
        template: String,

        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        x: f64,

        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        y: f64,
    },

    /// Remove a block and its connections
    Rm {
        project: String,
        tree: String,
        block: String,
    },

    /// Move a block
    Move {
        project: String,
        tree: String,
        block: String,

        #[arg(allow_negative_numbers = true)]
        x: f64,

        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    /// Set a block's title and properties
    Set {
        project: String,
        tree: String,
        block: String,

        #[arg(long)]
        title: Option<String>,

        /// KEY=VALUE, VALUE parsed as JSON when possible (repeatable)
        #[arg(short, long = "property")]
        properties: Vec<String>,
    },
}

#[derive(Subcommand)]
enum NodeCommands {
    /// List node templates
    Ls { project: String },

    /// Add a custom node template
    Add {
        project: String,
        name: String,

        #[arg(long, default_value = "action")]
        category: NodeCategory,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// KEY=VALUE, VALUE parsed as JSON when possible (repeatable)
        #[arg(short, long = "property")]
        properties: Vec<String>,
    },

    /// Remove a custom node template
    Rm { project: String, name: String },

    /// Import node documents (one or an array) into a project
    Import { project: String, file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Find workspace root
    let root = match cli.workspace {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let Some(command) = cli.command else {
        println!("Treeforge - Behavior Tree Editor");
        println!();
        println!("Usage: treeforge <COMMAND>");
        println!();
        println!("Commands:");
        println!("  init     Initialize a workspace");
        println!("  new      Create a project");
        println!("  list     List projects");
        println!("  show     Show a project");
        println!("  tree     Tree management");
        println!("  block    Block management");
        println!("  node     Node template management");
        println!("  export   Export documents");
        println!("  import   Import a project");
        println!();
        println!("Run 'treeforge --help' for more information.");
        return Ok(());
    };

    match command {
        Commands::Init => init_workspace(&root),
        command => run(&root, command),
    }
}

fn run(root: &Path, command: Commands) -> Result<()> {
    let config = load_config(root)?;
    let storage = ProjectStorage::from_config(&config);

    match command {
        Commands::Init => init_workspace(root),
        Commands::New { name, description } => {
            let mut store = ProjectStore::from_config(&config);
            let id = store.create_project(&name, description.as_deref());
            let path = storage.save(store_project(&store)?)?;
            println!("Created project {} ({})", name, id);
            println!("  {}", path.display());
            Ok(())
        }
        Commands::List => list_projects(&storage),
        Commands::Show { project } => {
            let session = Session::open(&storage, &config, &project)?;
            render::print_project(session.project()?);
            Ok(())
        }
        Commands::Tree { command } => handle_tree(&storage, &config, command),
        Commands::Block { command } => handle_block(&storage, &config, command),
        Commands::Node { command } => handle_node(&storage, &config, command),
        Commands::Connect {
            project,
            tree,
            source,
            target,
        } => {
            let mut session = Session::open(&storage, &config, &project)?;
            let tree_id = session.tree_id(&tree)?;
            let source = session.block_id(&tree_id, &source)?;
            let target = session.block_id(&tree_id, &target)?;
            let id = session
                .store
                .create_connection(&tree_id, &source, &target)?;
            session.save()?;
            println!("Connected {} -> {} ({})", short(&source), short(&target), id);
            Ok(())
        }
        Commands::Disconnect {
            project,
            tree,
            connection,
        } => {
            let mut session = Session::open(&storage, &config, &project)?;
            let tree_id = session.tree_id(&tree)?;
            let connection_id = session.connection_id(&tree_id, &connection)?;
            session.store.delete_connection(&tree_id, &connection_id)?;
            session.save()?;
            println!("Removed connection {}", connection_id);
            Ok(())
        }
        Commands::Export {
            project,
            tree,
            nodes,
            out,
            compact,
        } => {
            let session = Session::open(&storage, &config, &project)?;
            export(&session, tree, nodes, out, config.pretty_json && !compact)
        }
        Commands::Import { file, force } => import_project(&storage, &config, &file, force),
        Commands::Delete { project } => {
            let id = resolve_project(&storage, &project)?;
            storage.delete(&id)?;
            println!("Deleted project {}", id);
            Ok(())
        }
    }
}

/// Workspace config, then the user-level config, then defaults.
fn load_config(root: &Path) -> Result<EditorConfig> {
    let mut config = if root.join(CONFIG_PATH).exists() {
        EditorConfig::load_from_workspace(root)?
    } else {
        match directories::ProjectDirs::from("", "", "treeforge") {
            Some(dirs) if dirs.config_dir().join("config.yaml").exists() => {
                EditorConfig::load(&dirs.config_dir().join("config.yaml"))?
            }
            _ => EditorConfig::default(),
        }
    };
    config.resolve_paths(root);
    Ok(config)
}

fn store_project(store: &ProjectStore) -> Result<&Project> {
    store.project().ok_or_else(|| anyhow!("No project loaded"))
}

fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Pick the single candidate equal to `key`, or the single one starting with it.
fn resolve_key<'a>(
    candidates: impl IntoIterator<Item = (&'a str, &'a str)>,
    key: &str,
    what: &str,
) -> Result<String> {
    let candidates: Vec<(&str, &str)> = candidates.into_iter().collect();
    if let Some((id, _)) = candidates
        .iter()
        .find(|(id, label)| *id == key || *label == key)
    {
        return Ok(id.to_string());
    }
    let matches: Vec<&str> = candidates
        .iter()
        .filter(|(id, _)| id.starts_with(key))
        .map(|(id, _)| *id)
        .collect();
    match matches.as_slice() {
        [only] => Ok(only.to_string()),
        [] => bail!("No {} matches '{}'", what, key),
        _ => bail!("'{}' matches {} {}s; use a longer prefix", key, matches.len(), what),
    }
}

fn resolve_project(storage: &ProjectStorage, key: &str) -> Result<String> {
    let summaries = storage.list()?;
    resolve_key(
        summaries.iter().map(|s| (s.id.as_str(), s.name.as_str())),
        key,
        "project",
    )
}

/// One loaded project plus the storage it is saved back to.
struct Session<'a> {
    storage: &'a ProjectStorage,
    store: ProjectStore,
}

impl<'a> Session<'a> {
    fn open(storage: &'a ProjectStorage, config: &EditorConfig, key: &str) -> Result<Self> {
        let id = resolve_project(storage, key)?;
        let project = storage
            .load(&id)
            .with_context(|| format!("Failed to load project {}", id))?;
        let mut store = ProjectStore::from_config(config);
        store.load_project(project);
        Ok(Self { storage, store })
    }

    fn project(&self) -> Result<&Project> {
        store_project(&self.store)
    }

    /// Persist after a mutation. A failure leaves the in-memory edit applied.
    fn save(&self) -> Result<()> {
        self.storage
            .save(self.project()?)
            .context("Change applied but could not be saved")?;
        Ok(())
    }

    fn tree_id(&self, key: &str) -> Result<String> {
        let project = self.project()?;
        resolve_key(
            project
                .trees
                .values()
                .map(|t| (t.id.as_str(), t.title.as_str())),
            key,
            "tree",
        )
    }

    fn block_id(&self, tree_id: &str, key: &str) -> Result<String> {
        let tree = self
            .project()?
            .tree(tree_id)
            .ok_or_else(|| anyhow!("Tree {} not found", tree_id))?;
        resolve_key(
            tree.blocks.values().map(|b| (b.id.as_str(), b.id.as_str())),
            key,
            "block",
        )
    }

    fn connection_id(&self, tree_id: &str, key: &str) -> Result<String> {
        let tree = self
            .project()?
            .tree(tree_id)
            .ok_or_else(|| anyhow!("Tree {} not found", tree_id))?;
        resolve_key(
            tree.connections
                .iter()
                .map(|c| (c.id.as_str(), c.id.as_str())),
            key,
            "connection",
        )
    }
}

fn parse_properties(pairs: &[String]) -> Result<Properties> {
    let mut properties = Properties::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Property '{}' is not KEY=VALUE", pair))?;
        let value = serde_json::from_str::<PropertyValue>(raw)
            .unwrap_or_else(|_| PropertyValue::Text(raw.to_string()));
        properties.insert(key.trim().to_string(), value);
    }
    Ok(properties)
}

fn list_projects(storage: &ProjectStorage) -> Result<()> {
    let summaries = storage.list()?;
    println!("Projects: {}", summaries.len());
    for s in &summaries {
        println!(
            "  {}  {} ({} tree{}, updated {})",
            short(&s.id),
            s.name,
            s.trees,
            if s.trees == 1 { "" } else { "s" },
            s.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn handle_tree(storage: &ProjectStorage, config: &EditorConfig, command: TreeCommands) -> Result<()> {
    match command {
        TreeCommands::Add {
            project,
            title,
            description,
        } => {
            let mut session = Session::open(storage, config, &project)?;
            let id = session.store.create_tree(&title, description.as_deref())?;
            session.save()?;
            println!("Created tree {} ({})", title, id);
        }
        TreeCommands::Rm { project, tree } => {
            let mut session = Session::open(storage, config, &project)?;
            let tree_id = session.tree_id(&tree)?;
            session.store.delete_tree(&tree_id)?;
            session.save()?;
            println!("Removed tree {}", tree_id);
        }
        TreeCommands::Select { project, tree } => {
            let mut session = Session::open(storage, config, &project)?;
            let tree_id = session.tree_id(&tree)?;
            session.store.select_tree(&tree_id)?;
            session.save()?;
            println!("Selected tree {}", tree_id);
        }
    }
    Ok(())
}

fn handle_block(storage: &ProjectStorage, config: &EditorConfig, command: BlockCommands) -> Result<()> {
    match command {
        BlockCommands::Add {
            project,
            tree,
            template,
            x,
            y,
        } => {
            let mut session = Session::open(storage, config, &project)?;
            let tree_id = session.tree_id(&tree)?;
            let id = session
                .store
                .create_block(&tree_id, &template, Position::new(x, y))?;
            session.save()?;
            println!("Created block {} from '{}'", id, template);
        }
        BlockCommands::Rm {
            project,
            tree,
            block,
        } => {
            let mut session = Session::open(storage, config, &project)?;
            let tree_id = session.tree_id(&tree)?;
            let block_id = session.block_id(&tree_id, &block)?;
            session.store.delete_block(&tree_id, &block_id)?;
            session.save()?;
            println!("Removed block {}", block_id);
        }
        BlockCommands::Move {
            project,
            tree,
            block,
            x,
            y,
        } => {
            let mut session = Session::open(storage, config, &project)?;
            let tree_id = session.tree_id(&tree)?;
            let block_id = session.block_id(&tree_id, &block)?;
            session.store.update_block(
                &tree_id,
                &block_id,
                BlockUpdate::position(Position::new(x, y)),
            )?;
            session.save()?;
            let position = session
                .project()?
                .tree(&tree_id)
                .and_then(|t| t.block(&block_id))
                .map(|b| b.position)
                .unwrap_or_default();
            println!("Moved block {} to ({}, {})", short(&block_id), position.x, position.y);
        }
        BlockCommands::Set {
            project,
            tree,
            block,
            title,
            properties,
        } => {
            let mut session = Session::open(storage, config, &project)?;
            let tree_id = session.tree_id(&tree)?;
            let block_id = session.block_id(&tree_id, &block)?;
            let mut update = BlockUpdate {
                title,
                ..BlockUpdate::default()
            };
            if !properties.is_empty() {
                let current = session
                    .project()?
                    .tree(&tree_id)
                    .and_then(|t| t.block(&block_id))
                    .map(|b| b.properties.clone())
                    .unwrap_or_default();
                let mut merged = current;
                merged.extend(parse_properties(&properties)?);
                update.properties = Some(merged);
            }
            session.store.update_block(&tree_id, &block_id, update)?;
            session.save()?;
            println!("Updated block {}", short(&block_id));
        }
    }
    Ok(())
}

fn handle_node(storage: &ProjectStorage, config: &EditorConfig, command: NodeCommands) -> Result<()> {
    match command {
        NodeCommands::Ls { project } => {
            let session = Session::open(storage, config, &project)?;
            render::print_templates(session.project()?);
        }
        NodeCommands::Add {
            project,
            name,
            category,
            title,
            description,
            properties,
        } => {
            let mut session = Session::open(storage, config, &project)?;
            let mut template =
                NodeTemplate::new(&name, category).with_properties(parse_properties(&properties)?);
            template.title = title;
            template.description = description;
            session.store.create_node(template)?;
            session.save()?;
            println!("Created node template '{}' ({})", name, category);
        }
        NodeCommands::Rm { project, name } => {
            let mut session = Session::open(storage, config, &project)?;
            session.store.delete_node(&name)?;
            session.save()?;
            println!("Removed node template '{}'", name);
        }
        NodeCommands::Import { project, file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let templates = serializer::nodes_from_json(&text)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            let mut session = Session::open(storage, config, &project)?;
            let mut added = 0;
            for template in templates {
                let name = template.name.clone();
                match session.store.create_node(template) {
                    Ok(()) => added += 1,
                    Err(reason) => println!("  skipped '{}': {}", name, reason),
                }
            }
            session.save()?;
            println!("Imported {} node template(s)", added);
        }
    }
    Ok(())
}

fn export(
    session: &Session<'_>,
    tree: Option<String>,
    nodes: bool,
    out: Option<PathBuf>,
    pretty: bool,
) -> Result<()> {
    let project = session.project()?;
    let (kind, label, text) = if nodes {
        let docs = serializer::serialize_custom_nodes(project);
        (ExportKind::Nodes, String::new(), serializer::to_json(&docs, pretty)?)
    } else if let Some(tree) = tree {
        let tree_id = session.tree_id(&tree)?;
        let tree = project
            .tree(&tree_id)
            .ok_or_else(|| anyhow!("Tree {} not found", tree_id))?;
        let doc = serializer::serialize_tree(tree);
        (ExportKind::Tree, tree.title.clone(), serializer::to_json(&doc, pretty)?)
    } else {
        let doc = serializer::serialize_project(project);
        (ExportKind::Project, project.name.clone(), serializer::to_json(&doc, pretty)?)
    };

    match out {
        None => println!("{}", text),
        Some(path) => {
            let path = if path.is_dir() {
                path.join(serializer::export_file_name(kind, &label, chrono::Utc::now()))
            } else {
                path
            };
            std::fs::write(&path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
    }
    Ok(())
}

fn import_project(
    storage: &ProjectStorage,
    config: &EditorConfig,
    file: &Path,
    force: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let project = serializer::project_from_json(&text)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    if storage.exists(&project.id) && !force {
        bail!(
            "Project {} already exists; pass --force to replace it",
            project.id
        );
    }

    let mut store = ProjectStore::from_config(config);
    store.load_project(project);
    let project = store_project(&store)?;
    storage.save(project)?;
    println!(
        "Imported project {} ({}, {} trees)",
        project.name,
        project.id,
        project.trees.len()
    );
    Ok(())
}

fn init_workspace(root: &Path) -> Result<()> {
    let config_path = root.join(CONFIG_PATH);
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !config_path.exists() {
        let config = EditorConfig::default();
        let body = format!("# Treeforge Editor Configuration\n\n{}", config.to_yaml()?);
        std::fs::write(&config_path, body)?;
    }

    let config = load_config(root)?;
    std::fs::create_dir_all(&config.projects_dir)?;

    println!("Initialized Treeforge workspace at {}", root.display());
    println!();
    println!("Created:");
    println!("  {} - editor configuration", CONFIG_PATH);
    println!("  {} - project documents", config.projects_dir.display());
    println!();
    println!("Next steps:");
    println!("  1. Run: treeforge new \"My Project\"");
    println!("  2. Run: treeforge show \"My Project\"");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_key_prefers_exact_then_unique_prefix() {
        let candidates = [("abc123", "Main Tree"), ("abd456", "Combat")];
        assert_eq!(resolve_key(candidates, "Combat", "tree").unwrap(), "abd456");
        assert_eq!(resolve_key(candidates, "abc", "tree").unwrap(), "abc123");
        assert!(resolve_key(candidates, "ab", "tree").is_err());
        assert!(resolve_key(candidates, "zz", "tree").is_err());
    }

    #[test]
    fn properties_parse_json_or_fall_back_to_text() {
        let props = parse_properties(&[
            "maxLoop=3".to_string(),
            "label=guard post".to_string(),
            "enabled=true".to_string(),
        ])
        .unwrap();
        assert_eq!(props["maxLoop"].as_f64(), Some(3.0));
        assert_eq!(props["label"].as_str(), Some("guard post"));
        assert_eq!(props["enabled"].as_bool(), Some(true));
        assert!(parse_properties(&["novalue".to_string()]).is_err());
    }

    #[test]
    fn cli_parses_negative_coordinates() {
        let cli = Cli::try_parse_from(["treeforge", "block", "move", "p", "t", "b", "-5", "12.5"])
            .unwrap();
        match cli.command {
            Some(Commands::Block {
                command: BlockCommands::Move { x, y, .. },
            }) => {
                assert_eq!(x, -5.0);
                assert_eq!(y, 12.5);
            }
            _ => panic!("expected block move"),
        }
    }

    #[test]
    fn export_writes_generated_name_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EditorConfig::default();
        config.resolve_paths(dir.path());
        let storage = ProjectStorage::from_config(&config);

        let mut store = ProjectStore::new();
        store.create_project("Guard AI", None);
        storage.save(store.project().unwrap()).unwrap();

        let session = Session::open(&storage, &config, "Guard AI").unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        export(&session, Some("Main Tree".into()), false, Some(out.clone()), true).unwrap();

        let written: Vec<_> = std::fs::read_dir(&out).unwrap().collect();
        assert_eq!(written.len(), 1);
        let name = written[0].as_ref().unwrap().file_name();
        assert!(name.to_string_lossy().starts_with("tree_main_tree_"));
    }
}

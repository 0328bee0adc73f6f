//! Shadetree CLI - inspect shader trees and run the lowering pass.

use std::env;
use std::fs;
use std::sync::atomic::{AtomicU8, Ordering};

use shadetree::prelude::*;
use shadetree::tree::ShaderTreeNode as Tree;

/// Verbosity level (thread-safe)
const LOG_QUIET: u8 = 0;
const LOG_INFO: u8 = 1;
const LOG_DEBUG: u8 = 2;

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LOG_INFO);

#[inline]
fn log_level() -> u8 {
    LOG_LEVEL.load(Ordering::Relaxed)
}

#[inline]
fn set_log_level(level: u8) {
    LOG_LEVEL.store(level, Ordering::Relaxed);
}

macro_rules! info {
    ($($arg:tt)*) => {
        if log_level() >= LOG_INFO {
            println!("[INFO] {}", format!($($arg)*));
        }
    };
}

macro_rules! debug {
    ($($arg:tt)*) => {
        if log_level() >= LOG_DEBUG {
            println!("[DEBUG] {}", format!($($arg)*));
        }
    };
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => set_log_level(LOG_DEBUG),
            "-q" | "--quiet" => set_log_level(LOG_QUIET),
            _ => filtered_args.push(arg),
        }
    }

    init_tracing();

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    match filtered_args[0] {
        // Tree command - show shader-tree hierarchy
        "tree" | "t" => {
            if filtered_args.len() < 2 {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: shadetree tree <tree.json>");
                std::process::exit(1);
            }
            cmd_tree(filtered_args[1]);
        }

        // Lower command - run the pass and print the resulting graph
        "lower" | "l" => {
            if filtered_args.len() < 2 {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: shadetree lower <tree.json> [--preview] [--tables <tables.json>]");
                std::process::exit(1);
            }
            let preview = filtered_args.iter().any(|&s| s == "--preview" || s == "-p");
            let tables = filtered_args
                .iter()
                .position(|&s| s == "--tables")
                .and_then(|i| filtered_args.get(i + 1))
                .copied();
            cmd_lower(filtered_args[1], preview, tables);
        }

        // Help
        "help" | "h" | "-h" | "--help" => print_help(),

        _ => {
            eprintln!("Unknown command: {}", filtered_args[0]);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    }
}

/// Route library tracing through stderr, honoring RUST_LOG and the CLI
/// verbosity flag.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let default = match log_level() {
        LOG_QUIET => "error",
        LOG_DEBUG => "debug",
        _ => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_help() {
    println!("shadetree - shader-tree lowering toolkit");
    println!();
    println!("USAGE:");
    println!("    shadetree [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    t, tree  <tree.json>              Show the shader-tree hierarchy");
    println!("    l, lower <tree.json>              Lower the tree and print the graph");
    println!("    h, help                           Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -q, --quiet      Suppress all output");
    println!();
    println!("LOWER OPTIONS:");
    println!("    -p, --preview            Also emit preview shaders");
    println!("    --tables <tables.json>   Override the built-in mapping tables");
    println!();
    println!("EXAMPLES:");
    println!("    shadetree tree scene.json             # See the input hierarchy");
    println!("    shadetree lower scene.json            # Lower and print the graph");
    println!("    shadetree lower scene.json --preview  # Include preview shaders");
    println!("    shadetree -v lower scene.json         # Verbose lowering");
}

fn load_tree(path: &str) -> Tree {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            std::process::exit(1);
        }
    };
    match serde_json::from_str(&text) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("Failed to parse {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn cmd_tree(path: &str) {
    info!("Loading tree: {}", path);
    let tree = load_tree(path);
    print_node(&tree, 0);
}

fn print_node(node: &Tree, depth: usize) {
    let indent = "  ".repeat(depth);
    let effect = node
        .channel_text("effect")
        .map(|e| format!(" effect={e}"))
        .unwrap_or_default();
    let enabled = match node.channel_text("enable") {
        Some("0") | Some("false") => " (disabled)",
        _ => "",
    };
    println!(
        "{indent}{} \"{}\" [{} channels]{effect}{enabled}",
        node.kind,
        node.name,
        node.channels.len()
    );
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn cmd_lower(path: &str, preview: bool, tables: Option<&str>) {
    info!("Loading tree: {}", path);
    let tree = load_tree(path);

    let maps = match tables {
        Some(table_path) => {
            debug!("Loading table overrides: {}", table_path);
            let text = match fs::read_to_string(table_path) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Failed to read {}: {}", table_path, e);
                    std::process::exit(1);
                }
            };
            match Mappings::from_json(&text) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("Invalid mapping tables: {}", e);
                    std::process::exit(1);
                }
            }
        }
        None => Mappings::default(),
    };

    let mut config = LowerConfig::default();
    if preview {
        config = config.with_preview();
    }

    let mut graph = MemoryGraph::new();
    let lowerer = Lowerer::new(config, &maps);
    let diags = lowerer.lower(&tree, &mut graph);

    debug!("Lowered {} graph nodes", graph.node_count());
    print!("{}", graph.dump());

    if !diags.is_empty() {
        println!();
        println!("Diagnostics ({}):", diags.len());
        for d in diags.iter() {
            println!("  {}", d);
        }
    }
}

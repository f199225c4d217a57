//! spectre-export - merged mesh export tool
//!
//! Reads a JSON scene graph produced by an importer and writes the merged
//! document (layout, buffers, submeshes, skeleton, animations) as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use spectre_export::{animation, document, ExportConfig, IndexWidth, LayoutMode, Scene};

/// Extension of the written document
const DOCUMENT_EXT: &str = "spectre.json";

#[derive(Parser)]
#[command(name = "spectre-export")]
#[command(about = "Merge scene meshes into GPU-ready buffers")]
#[command(version)]
struct Cli {
    /// Input scene (JSON)
    input: PathBuf,

    /// Output document (default: <input>.spectre.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use packed vertex records instead of 16-byte padded attributes
    #[arg(long)]
    packed: bool,

    /// Index width in bits
    #[arg(long, value_parser = parse_index_width)]
    index_width: Option<IndexWidth>,

    /// Node whose meshes are merged (default: first node with meshes)
    #[arg(long)]
    mesh_node: Option<String>,

    /// Skeleton hierarchy root (default: first node named by a bone)
    #[arg(long)]
    skeleton_root: Option<String>,

    /// Do not export animations
    #[arg(long)]
    no_animations: bool,

    /// List merge groups and animations instead of exporting
    #[arg(long)]
    list: bool,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

fn parse_index_width(value: &str) -> Result<IndexWidth, String> {
    value
        .parse::<u32>()
        .ok()
        .and_then(IndexWidth::from_bits)
        .ok_or_else(|| format!("invalid index width '{}' (use 16 or 32)", value))
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied
    fn export_config(&self) -> Result<ExportConfig> {
        let mut config = match &self.config {
            Some(path) => ExportConfig::load(path)?,
            None => ExportConfig::default(),
        };

        if self.packed {
            config.layout = LayoutMode::Packed;
        }
        if let Some(width) = self.index_width {
            config.index_width = width;
        }
        if let Some(name) = &self.mesh_node {
            config.mesh_node = Some(name.clone());
        }
        if let Some(name) = &self.skeleton_root {
            config.skeleton_root = Some(name.clone());
        }
        if self.no_animations {
            config.include_animations = false;
        }

        Ok(config)
    }
}

fn load_scene(path: &Path) -> Result<Scene> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse scene: {:?}", path))
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let scene = load_scene(&cli.input)?;

    if cli.list {
        tracing::info!("Scene {:?}:", cli.input);
        document::list_merge_groups(&scene);
        animation::list_animations(&scene);
        return Ok(());
    }

    let config = cli.export_config()?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension(DOCUMENT_EXT));
    tracing::info!("Exporting {:?} -> {:?}", cli.input, output);

    let doc = document::export_scene(&scene, &config)
        .with_context(|| format!("Failed to export {:?}", cli.input))?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&doc)
    } else {
        serde_json::to_string(&doc)
    }
    .context("Failed to serialize document")?;
    std::fs::write(&output, json).with_context(|| format!("Failed to write output: {:?}", output))?;

    tracing::info!("Done!");
    Ok(())
}

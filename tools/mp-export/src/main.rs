//! mp-export - MeshPack export tool
//!
//! Converts scenes (glTF, GLB, OBJ, JSON primitive lists) into deduplicated,
//! instanced `.mp` geometry containers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use mp_export::{ExportOptions, KeyStrategy, MP_EXTENSION, convert_scene, dump, inspect, manifest};

#[derive(Parser)]
#[command(name = "mp-export")]
#[command(about = "MeshPack geometry export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single scene file
    Convert {
        /// Input scene (glTF/GLB/OBJ/JSON)
        input: PathBuf,

        /// Output .mp file
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Build containers from a manifest file
    Build {
        /// Path to meshpack.toml manifest
        #[arg(default_value = "meshpack.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without building
    Check {
        /// Path to meshpack.toml manifest
        #[arg(default_value = "meshpack.toml")]
        manifest: PathBuf,
    },

    /// Print the contents of a container and verify its offset table
    Inspect {
        /// Input .mp file
        input: PathBuf,

        /// Also print vertex, index, normal and instance arrays
        #[arg(short, long)]
        verbose: bool,
    },

    /// Convert a scene and write the model registry as JSON
    DumpJson {
        /// Input scene (glTF/GLB/OBJ/JSON)
        input: PathBuf,

        /// Output .json file
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,
    },
}

#[derive(clap::Args)]
struct OptionArgs {
    /// Uniform scale for positions and instance translations
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// How primitives are matched for instancing
    #[arg(long, value_enum, default_value_t = KeyStrategy::Structural)]
    key: KeyStrategy,

    /// Only export primitives under this scene path (repeatable)
    #[arg(long)]
    include: Vec<String>,

    /// Rescale averaged normals to unit length
    #[arg(long)]
    renormalize_normals: bool,

    /// Leave normals out for primitives that author none
    #[arg(long)]
    no_computed_normals: bool,
}

impl From<OptionArgs> for ExportOptions {
    fn from(args: OptionArgs) -> Self {
        Self {
            scale: args.scale,
            key: args.key,
            renormalize_normals: args.renormalize_normals,
            compute_missing_normals: !args.no_computed_normals,
            include: args.include,
        }
    }
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

    match cli.command {
        Commands::Convert {
            input,
            output,
            options,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension(MP_EXTENSION));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            convert_scene(&input, &output, &options.into())?;
            tracing::info!("Done!");
        }

        Commands::Build { manifest, output } => {
            tracing::info!("Building scenes from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            let results = manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete! {} containers written", results.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Inspect { input, verbose } => {
            let summary = inspect::inspect_file(&input, verbose)?;
            if !summary.offsets_ok() {
                anyhow::bail!(
                    "{:?}: {} offset table entries disagree with object sizes",
                    input,
                    summary.offset_mismatches.len()
                );
            }
        }

        Commands::DumpJson {
            input,
            output,
            options,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("mp.json"));
            tracing::info!("Dumping {:?} -> {:?}", input, output);
            dump::dump_scene(&input, &output, &options.into())?;
            tracing::info!("Done!");
        }
    }

    Ok(())
}

use clap::{Parser, Subcommand};
use simple_bundle::config::{self, BundleConfig, DEFAULT_CONFIG_FILE};
use simple_bundle::mode::{BuildMode, MODE_ENV_VAR};
use simple_bundle::output;
use simple_bundle::pipeline::Pipeline;
use simple_bundle::transform::BuiltinBackend;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "simple-bundle")]
#[command(about = "Asset pipeline for static sites")]
#[command(long_about = "\
Asset pipeline for static sites

Every *.html file in the source root is an entry page. Every other top-level
file, and everything under the configured copy directories, is matched
against the rule table and run through that rule's transform chain.

Source structure:

  src/
  ├── bundle.toml          # Pipeline config (optional)
  ├── index.html           # Entry page → dist/index.html
  ├── style.scss           # sass rule → dist/assets/css/style.css
  ├── app.js               # scripts rule → dist/assets/js/app.js
  ├── logo.png             # images rule → dist/assets/img/logo.png (+ .webp)
  ├── assets/
  │   ├── img/             # copied recursively → dist/assets/img/
  │   └── fonts/           # copied recursively → dist/assets/fonts/
  └── static/              # copied recursively → dist/

Production builds embed a content hash in every file name and run the
minify / optimize_image steps. References to assets inside entry pages are
rewritten to the final paths, and dist/manifest.json maps every source
file to its output.

Run 'simple-bundle gen-config' to generate a documented bundle.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: <src>/bundle.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transform the source directory into the destination
    Build {
        /// Source directory
        #[arg(long, default_value = "src")]
        src: PathBuf,

        /// Destination directory
        #[arg(long, default_value = "dist")]
        dest: PathBuf,

        #[arg(long, value_enum, env = MODE_ENV_VAR, default_value_t = BuildMode::Development)]
        mode: BuildMode,

        /// Empty the destination before writing
        #[arg(long)]
        clean: bool,
    },
    /// Show which rule and chain each file would get, without writing
    Check {
        /// Source directory
        #[arg(long, default_value = "src")]
        src: PathBuf,

        #[arg(long, value_enum, env = MODE_ENV_VAR, default_value_t = BuildMode::Development)]
        mode: BuildMode,
    },
    /// Print a stock bundle.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build {
            src,
            dest,
            mode,
            clean,
        } => {
            let mut bundle_config = load_config(cli.config.as_deref(), &src)?;
            bundle_config.clean |= clean;
            let pipeline = Pipeline::new(bundle_config, mode, BuiltinBackend)?;

            println!("==> Building {} → {} ({mode})", src.display(), dest.display());
            let outcome = pipeline.run(&src, &dest)?;
            output::print_build_output(&outcome);
            println!("==> Manifest: {}", outcome.manifest_path.display());
        }
        Command::Check { src, mode } => {
            let bundle_config = load_config(cli.config.as_deref(), &src)?;
            let pipeline = Pipeline::new(bundle_config, mode, BuiltinBackend)?;

            println!("==> Checking {}", src.display());
            let plan = pipeline.plan(&src)?;
            output::print_check_output(&plan);
            println!("==> Source is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `--config` if given, else `bundle.toml` in the source directory.
fn load_config(explicit: Option<&Path>, src: &Path) -> Result<BundleConfig, config::ConfigError> {
    match explicit {
        Some(path) if !path.exists() => Err(config::ConfigError::Validation(format!(
            "config file not found: {}",
            path.display()
        ))),
        Some(path) => config::load_config(path),
        None => config::load_config(&src.join(DEFAULT_CONFIG_FILE)),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match verbose {
        0 => "simple_bundle=warn",
        1 => "simple_bundle=info",
        2 => "simple_bundle=debug",
        _ => "simple_bundle=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

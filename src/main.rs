/// Version injected at compile time via CRES_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("CRES_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use constructs_resolve::annotate::{
    apply_kind_shapes, apply_shape, apply_suppressions, PathPattern, ResourceNode, SuppressionRule,
};
use constructs_resolve::config::Config;
use constructs_resolve::defaults::get_shape;
use constructs_resolve::group::{describe_catalogue, load_group};
use constructs_resolve::resolve::Resolver;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::writer::{MakeWriter, MakeWriterExt};

/// Resolve building-block dependencies and annotate generated resources
#[derive(Parser, Debug)]
#[command(name = "cres", version = VERSION, about, long_about = None)]
struct Args {
    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Do not warn when overrides replace prescriptive defaults
    #[arg(long, global = true)]
    no_override_warnings: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve every spec of a dependency group file (YAML or JSON)
    Resolve {
        file: PathBuf,
    },
    /// Attach suppression rules to a resource tree (JSON)
    Annotate {
        tree: PathBuf,

        /// Path pattern locating the target node(s), e.g. `0/0:framework-provider-function`
        #[arg(long, requires = "rules")]
        pattern: Option<PathPattern>,

        /// Rule to attach under --pattern, as CODE=REASON
        #[arg(long = "rule", value_parser = parse_rule, requires = "pattern")]
        rules: Vec<SuppressionRule>,

        /// Named shape from the catalogue (repeatable)
        #[arg(long = "shape")]
        shapes: Vec<String>,

        /// Apply the shapes the catalogue lists for this resource kind (repeatable)
        #[arg(long = "kind")]
        kinds: Vec<String>,

        /// Overwrite the tree file instead of printing
        #[arg(long)]
        in_place: bool,

        /// Fail if nothing was touched
        #[arg(long)]
        require_match: bool,
    },
    /// List resource kinds and suppression shapes
    Kinds,
    /// Show or change the persisted settings
    Config {
        /// Warn when overrides replace prescriptive defaults
        #[arg(long)]
        override_warnings: Option<bool>,

        /// Shape applied by `annotate` when nothing else is given (repeatable, replaces the list)
        #[arg(long = "default-shape")]
        default_shapes: Vec<String>,

        /// Remove every default shape
        #[arg(long, conflicts_with = "default_shapes")]
        clear_default_shapes: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn parse_rule(s: &str) -> Result<SuppressionRule, String> {
    match s.split_once('=') {
        Some((code, reason)) if !code.trim().is_empty() && !reason.trim().is_empty() => {
            Ok(SuppressionRule::new(code.trim(), reason.trim()))
        }
        _ => Err(format!("expected CODE=REASON, got '{}'", s)),
    }
}

/// Console subscriber used when file logging is off: warnings and errors only
fn console_subscriber<W>(writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_max_level(Level::WARN)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .finish()
}

fn setup_console_logging() {
    if tracing::subscriber::set_global_default(console_subscriber(std::io::stderr)).is_err() {
        eprintln!("Failed to install console logging");
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let Some(tracing_level) = level.to_tracing_level() else {
        setup_console_logging();
        return None;
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            setup_console_logging();
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("cres {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("cres").join("cres.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".cres").join("cres.log");
    }
    PathBuf::from("cres.log")
}

fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let config = Config::load();
    let mut resolver = Resolver::from_config(&config);
    if args.no_override_warnings {
        resolver = resolver.with_override_warnings(false);
    }

    match args.command {
        Command::Resolve { file } => run_resolve(&resolver, &file),
        Command::Annotate {
            tree,
            pattern,
            rules,
            shapes,
            kinds,
            in_place,
            require_match,
        } => {
            let shapes = if pattern.is_none() && shapes.is_empty() && kinds.is_empty() {
                config.default_shapes.clone()
            } else {
                shapes
            };
            let selection = Selection {
                pattern: pattern.as_ref(),
                rules: &rules,
                shapes: &shapes,
                kinds: &kinds,
            };
            run_annotate(&tree, &selection, in_place, require_match)
        }
        Command::Kinds => {
            for line in describe_catalogue() {
                println!("{}", line);
            }
            Ok(())
        }
        Command::Config {
            override_warnings,
            default_shapes,
            clear_default_shapes,
        } => {
            let path = Config::config_path()
                .context("No configuration directory on this platform")?;
            let default_shapes = if clear_default_shapes {
                Some(Vec::new())
            } else if default_shapes.is_empty() {
                None
            } else {
                Some(default_shapes)
            };
            let updated = run_config(&path, override_warnings, default_shapes)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
            Ok(())
        }
    }
}

/// Load the config at `path`, apply the given changes and save if anything changed
fn run_config(
    path: &Path,
    override_warnings: Option<bool>,
    default_shapes: Option<Vec<String>>,
) -> Result<Config> {
    let mut config = Config::load_from(path);
    let before = config.clone();

    if let Some(enabled) = override_warnings {
        config.override_warnings = enabled;
    }
    if let Some(shapes) = default_shapes {
        if let Some(unknown) = shapes.iter().find(|name| get_shape(name).is_none()) {
            bail!("Unknown shape: {}", unknown);
        }
        config.default_shapes = shapes;
    }

    if config != before {
        config.save_to(path)?;
        tracing::info!("Saved configuration to {:?}", path);
    }
    Ok(config)
}

fn run_resolve(resolver: &Resolver, file: &Path) -> Result<()> {
    let specs = load_group(file)?;
    tracing::info!("Resolving {} spec(s) from {:?}", specs.len(), file);

    let resolution = resolver.resolve_group(&specs);

    let rendered: Vec<_> = resolution
        .results
        .iter()
        .map(|(id, result)| json!({"id": id, "result": result}))
        .collect();
    println!("{}", serde_json::to_string_pretty(&rendered)?);

    resolution.into_result()?;
    Ok(())
}

/// What `annotate` applies to a tree
struct Selection<'a> {
    pattern: Option<&'a PathPattern>,
    rules: &'a [SuppressionRule],
    shapes: &'a [String],
    kinds: &'a [String],
}

impl Selection<'_> {
    fn is_empty(&self) -> bool {
        self.pattern.is_none() && self.shapes.is_empty() && self.kinds.is_empty()
    }
}

fn run_annotate(
    tree_path: &Path,
    selection: &Selection<'_>,
    in_place: bool,
    require_match: bool,
) -> Result<()> {
    if selection.is_empty() {
        bail!("Nothing to apply: pass --pattern with --rule, --shape or --kind");
    }

    let content = std::fs::read_to_string(tree_path)
        .with_context(|| format!("Failed to read {:?}", tree_path))?;
    let mut root: ResourceNode =
        serde_json::from_str(&content).context("Failed to parse resource tree JSON")?;

    let mut touched = 0;
    if let Some(pattern) = selection.pattern {
        touched += apply_suppressions(&mut root, pattern, selection.rules);
    }
    for shape in selection.shapes {
        touched += apply_shape(&mut root, shape)?;
    }
    for kind in selection.kinds {
        touched += apply_kind_shapes(&mut root, kind)?;
    }

    tracing::info!("Touched {} node(s) in {:?}", touched, tree_path);
    if require_match && touched == 0 {
        bail!("No node matched in {:?}", tree_path);
    }

    let output = serde_json::to_string_pretty(&root)?;
    if in_place {
        std::fs::write(tree_path, output)
            .with_context(|| format!("Failed to write {:?}", tree_path))?;
    } else {
        println!("{}", output);
    }

    Ok(())
}

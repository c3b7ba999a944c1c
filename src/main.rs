// ABOUTME: CLI entry point for rdbms-subsetter
// ABOUTME: Parses flags, initializes logging, and hands off to the library's run()

use clap::Parser;
use rdbms_subsetter::RunConfig;

/// Extracts a referentially-consistent subset of a relational database
/// into a second database with the same schema.
#[derive(Parser)]
#[command(name = "rdbms-subsetter")]
#[command(about = "Copy a sample of a relational database's rows while keeping every foreign key satisfied", long_about = None)]
#[command(version)]
struct Cli {
    /// Source database connection URL
    source: String,
    /// Destination database connection URL
    dest: String,
    /// Base sampling fraction, in [0, 1]
    fraction: f64,

    /// Use logarithmic sizing instead of linear
    #[arg(short = 'l', long)]
    logarithmic: bool,

    /// Rows to buffer before flush; 0 disables buffering
    #[arg(short = 'b', long, default_value_t = 1000)]
    buffer: i64,

    /// Max child rows pulled per non-prioritized parent
    #[arg(short = 'c', long = "children", default_value_t = 3)]
    children: i64,

    /// Force a single-PK row into the target (table:pk), repeatable
    #[arg(short = 'f', long = "force")]
    force: Vec<String>,

    /// Schema(s) to include; the "public" schema is always included
    #[arg(long = "schema")]
    schema: Vec<String>,

    /// Include-table glob, repeatable
    #[arg(short = 't', long = "table")]
    table: Vec<String>,

    /// Exclude-table glob, repeatable
    #[arg(short = 'T', long = "exclude-table")]
    exclude_table: Vec<String>,

    /// Full-copy table glob, repeatable
    #[arg(short = 'F', long = "full-table")]
    full_table: Vec<String>,

    /// JSON config file with tables/schemas/full_tables/constraints keys
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Observer plugin to load by name, repeatable
    #[arg(short = 'i', long = "import")]
    import: Vec<String>,

    /// Log level name (error, warn, info, debug, trace) or a Python
    /// logging-style integer (10=debug, 20=info, 30=warn, 40=error)
    #[arg(long, default_value = "info")]
    loglevel: String,

    /// Skip the interactive confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,

    /// Seed the random sampler for deterministic runs (mainly for tests)
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let level = match rdbms_subsetter::utils::parse_loglevel(&cli.loglevel) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("error: invalid --loglevel: {e:#}");
            std::process::exit(2);
        }
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cfg = RunConfig {
        source_url: cli.source,
        target_url: cli.dest,
        fraction: cli.fraction,
        logarithmic: cli.logarithmic,
        buffer: cli.buffer,
        children_max: cli.children,
        force: cli.force,
        schemas: cli.schema,
        tables: cli.table,
        exclude_tables: cli.exclude_table,
        full_tables: cli.full_table,
        config_path: cli.config,
        imports: cli.import,
        yes: cli.yes,
        seed: cli.seed,
    };

    if let Err(e) = rdbms_subsetter::run(cfg).await {
        eprintln!("error: {e:#}");
        let is_startup_failure = e.downcast_ref::<rdbms_subsetter::StartupError>().is_some();
        std::process::exit(if is_startup_failure { 2 } else { 1 });
    }
}

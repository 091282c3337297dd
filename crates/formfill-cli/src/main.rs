use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use formfill_browser::{BrowserKind, DEFAULT_DEBUG_PORT};
use formfill_cli::OutputFormat;
use formfill_cli::commands::{self, fill::FillOptions, serve::ServeOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "formfill")]
#[command(author, version)]
#[command(
    about = "Fill web forms automatically with random or profile-backed data",
    long_about = "FormFill runs a local API that stores your profile and maps form fields to \
                  profile categories, and drives a browser over the DevTools protocol to fill \
                  every form it finds."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the profile and form interpretation API
    Serve {
        /// Address to listen on
        #[arg(long, env = "FORMFILL_HOST", default_value = formfill_server::DEFAULT_HOST)]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "FORMFILL_PORT", default_value_t = formfill_server::DEFAULT_PORT)]
        port: u16,

        /// SQLite database file (default: ~/.formfill/formfill.db)
        #[arg(long, env = "FORMFILL_DB_PATH", value_name = "PATH")]
        db: Option<PathBuf>,

        /// Chat-completions endpoint used for model-assisted interpretation
        #[arg(long, env = "FORMFILL_ASSIST_URL", value_name = "URL")]
        assist_url: Option<String>,

        /// API key for the assist endpoint
        #[arg(long, env = "FORMFILL_ASSIST_KEY", value_name = "KEY", hide_env_values = true)]
        assist_key: Option<String>,

        /// Model name sent to the assist endpoint
        #[arg(long, env = "FORMFILL_ASSIST_MODEL", value_name = "MODEL")]
        assist_model: Option<String>,

        /// Directory of .txt/.md documents used as background for the model
        #[arg(long, value_name = "DIR")]
        assist_docs: Option<PathBuf>,

        /// Background documents included in each model prompt
        #[arg(
            long,
            value_name = "N",
            default_value_t = formfill_interpreter::assist::DEFAULT_CONTEXT_LIMIT
        )]
        assist_context_limit: usize,
    },

    /// Launch or attach to a browser and fill forms as they appear
    Fill {
        /// Browser to launch (chrome, chromium, edge, firefox)
        #[arg(short, long, default_value = "chrome")]
        browser: BrowserKind,

        /// Attach to a browser already running with remote debugging enabled
        #[arg(long, conflicts_with_all = ["url", "profile", "browser_path"])]
        attach: bool,

        /// Seconds between page scans
        #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,

        /// Also fill inputs that are not visible
        #[arg(long)]
        fill_hidden: bool,

        /// Page to open in the launched browser
        #[arg(short, long)]
        url: Option<String>,

        /// Path to the browser executable (auto-detected if not specified)
        #[arg(long, value_name = "PATH")]
        browser_path: Option<PathBuf>,

        /// Remote debugging port
        #[arg(long, default_value_t = DEFAULT_DEBUG_PORT)]
        debug_port: u16,

        /// Named persistent browser profile (default: temporary profile)
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,

        /// FormFill API to take profile values and field labels from
        #[arg(short, long, value_name = "URL")]
        server: Option<String>,

        /// Profile to fetch from the API
        #[arg(long, default_value = "default", requires = "server")]
        user_id: String,
    },

    /// Interpret the fields of a form description file offline
    Interpret {
        /// JSON file with a "fields" list
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Generate shell completion scripts
    #[command(after_help = "SUPPORTED SHELLS:\n  \
        bash, zsh, fish, powershell, elvish\n\n\
        INSTALLATION:\n  \
        bash:  formfill completion --shell bash >> ~/.bashrc\n  \
        zsh:   formfill completion --shell zsh > ~/.zfunc/_formfill\n  \
        fish:  formfill completion --shell fish > ~/.config/fish/completions/formfill.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(short, long)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Serve {
            host,
            port,
            db,
            assist_url,
            assist_key,
            assist_model,
            assist_docs,
            assist_context_limit,
        } => commands::serve::execute(ServeOptions {
            host,
            port,
            db,
            assist_url,
            assist_key,
            assist_model,
            assist_docs,
            assist_context_limit,
        }),
        Commands::Fill {
            browser,
            attach,
            interval,
            fill_hidden,
            url,
            browser_path,
            debug_port,
            profile,
            server,
            user_id,
        } => commands::fill::execute(FillOptions {
            browser,
            attach,
            interval,
            fill_hidden,
            url,
            browser_path,
            debug_port,
            profile,
            server,
            user_id,
        }),
        Commands::Interpret { file } => commands::interpret::execute(&file, cli.format),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            commands::completion::execute(shell, &mut cmd)
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new(
            "formfill=debug,formfill_cli=debug,formfill_core=debug,formfill_interpreter=debug,\
             formfill_store=debug,formfill_server=debug,formfill_browser=debug",
        )
    } else {
        EnvFilter::new(
            "formfill=info,formfill_cli=info,formfill_interpreter=info,formfill_store=info,\
             formfill_server=info,formfill_browser=info",
        )
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

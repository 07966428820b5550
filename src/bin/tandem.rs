//! Tandem - interactive console for the reference actor
//!
//! Evaluates an optional init file and startup code, then hands the terminal
//! to the console event loop.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use tandem::actor::EventLoopActor;
use tandem::lang::LangParser;
use tandem::shell::{
    ConsoleEventLoop, EditorLineSource, LineSource, PlainLineSource, RequestQueue, ShellConfig,
    Startup, StartupSource, SynchronousBridge,
};

#[derive(Parser)]
#[command(name = "tandem")]
#[command(version, about = "Interactive console for a single-threaded actor", long_about = None)]
struct Cli {
    /// Evaluate CODE instead of reading FILE
    #[arg(short, long, value_name = "CODE")]
    eval: Option<String>,

    /// Print the result of the startup code and exit
    #[arg(short, long)]
    print: bool,

    /// Suppress prompts, result prefixes and the banner
    #[arg(short, long)]
    quiet: bool,

    /// File evaluated before the startup code
    #[arg(short, long, value_name = "FILE")]
    init: Option<PathBuf>,

    /// JSON shell configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use the plain buffered console even on a terminal
    #[arg(long)]
    plain: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Source file to evaluate at startup
    file: Option<PathBuf>,

    /// Arguments exposed to code through argv()
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let mut config = match &cli.config {
        Some(path) => ShellConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ShellConfig::default(),
    };
    config.quiet |= cli.quiet;

    let startup = Startup {
        init: cli.init.as_deref().map(read_source).transpose()?,
        main: match (&cli.eval, &cli.file) {
            (Some(code), _) => Some(StartupSource::inline(code.as_str())),
            (None, Some(path)) => Some(read_source(path)?),
            (None, None) => None,
        },
        print_and_exit: cli.print,
    };

    let interactive = io::stdin().is_terminal();
    if !cli.plain && config.line_editing && interactive {
        let source = EditorLineSource::new(config.history_file.clone())
            .context("Failed to start line editor")?;
        session(source, config, cli.args, startup)
    } else {
        // Piped input is echoed back.
        let source = PlainLineSource::stdio().with_echo(!config.quiet && !interactive);
        session(source, config, cli.args, startup)
    }
}

fn read_source(path: &Path) -> Result<StartupSource> {
    StartupSource::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn session<S: LineSource>(
    mut source: S,
    config: ShellConfig,
    argv: Vec<String>,
    startup: Startup,
) -> Result<()> {
    if !config.quiet {
        source.print_line(&format!("tandem, version {}", tandem::VERSION))?;
    }

    let queue = RequestQueue::new();
    let actor = EventLoopActor::spawn(queue.clone(), argv).context("Failed to start actor")?;
    let bridge = SynchronousBridge::new(actor);
    let mut console = ConsoleEventLoop::new(source, LangParser, bridge, queue, config);

    let exit = startup.run(&mut console)?;
    tracing::debug!("Console loop finished: {:?}", exit);
    Ok(())
}

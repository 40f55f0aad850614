//! markdata CLI - resolve directives in text documents.
//!
//! - `markdata doc.md`: resolve one file to stdout
//! - `markdata doc.md out.md`: resolve one file to another
//! - `markdata docs/`: resolve every matching document in place
//! - `markdata docs/ site/`: mirror `docs/` into `site/`, resolving documents
//! - `markdata -`: resolve standard input

mod batch;
mod error;
mod output;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use markdata_config::{CliSettings, Config};
use markdata_core::builtin::CommandDirective;
use markdata_core::directive::Handler;
use markdata_core::front_matter::FrontMatterFormat;
use markdata_core::{Session, Source};
use tracing_subscriber::EnvFilter;

use batch::Batch;
use error::CliError;
use output::Output;

/// markdata - directive preprocessor for text documents.
#[derive(Parser)]
#[command(name = "markdata", version, about)]
struct Cli {
    /// Document or directory to resolve (`-` reads standard input).
    source: PathBuf,

    /// Output file or directory (default: stdout for a document, in place
    /// for a directory).
    destination: Option<PathBuf>,

    /// Front matter format (overrides config).
    #[arg(long, value_enum)]
    fm_type: Option<FmType>,

    /// Directory relative directive paths resolve against (overrides config).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Directory of executables to register as directives (overrides config).
    #[arg(short, long, env = "MARKDATA_DIRECTIVES")]
    directives: Option<PathBuf>,

    /// Drop the front matter block from the output.
    #[arg(long)]
    strip_front_matter: bool,

    /// Path to configuration file (default: auto-discover markdata.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output (log every resolved document).
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FmType {
    Json,
    Yaml,
    Toml,
}

impl From<FmType> for FrontMatterFormat {
    fn from(value: FmType) -> Self {
        match value {
            FmType::Json => Self::Json,
            FmType::Yaml => Self::Yaml,
            FmType::Toml => Self::Toml,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli.execute(&output) {
        output.fatal(&err);
        std::process::exit(1);
    }
}

impl Cli {
    fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            front_matter: self.fm_type.map(Into::into),
            strip_front_matter: self.strip_front_matter.then_some(true),
            root: self.root,
            directives: self.directives,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let session = build_session(&config)?;

        if self.source == Path::new("-") {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            let resolved = session.resolve(Source::Text(&text))?;
            return emit(&resolved, self.destination.as_deref());
        }

        if self.source.is_dir() {
            return resolve_tree(
                &session,
                &config,
                &self.source,
                self.destination.as_deref(),
                output,
            );
        }

        let resolved = session.resolve(Source::File(&self.source))?;
        emit(&resolved, self.destination.as_deref())
    }
}

/// Build a session from configuration, registering command directives.
///
/// `[[command]]` entries win over executables of the same name in the
/// directives directory.
fn build_session(config: &Config) -> Result<Session, CliError> {
    let mut session = Session::new().with_config(config.session_config());

    if let Some(dir) = &config.paths_resolved.directives {
        // Programs run with the resolution base as working directory
        let found = std::path::absolute(dir)
            .and_then(|dir| CommandDirective::discover(&dir))
            .map_err(|source| CliError::Directives {
                path: dir.clone(),
                source,
            })?;
        for (name, directive) in found {
            session.registry_mut().register(name, Handler::both(directive));
        }
    }

    for command in &config.commands {
        let directive =
            CommandDirective::new(&command.program).with_args(command.args.iter().cloned());
        session
            .registry_mut()
            .register(command.name.clone(), Handler::both(directive));
    }

    Ok(session)
}

/// Write one resolved document to `destination`, or stdout.
fn emit(resolved: &str, destination: Option<&Path>) -> Result<(), CliError> {
    match destination {
        Some(path) => batch::write_file(path, resolved),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(resolved.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn resolve_tree(
    session: &Session,
    config: &Config,
    source: &Path,
    destination: Option<&Path>,
    output: &Output,
) -> Result<(), CliError> {
    if destination.is_some_and(Path::is_file) {
        return Err(CliError::Validation(
            "destination must be a directory when the source is a directory".to_owned(),
        ));
    }

    let patterns = &config.discovery.patterns;
    let report = Batch::new(session, patterns)?.run(source, destination)?;
    output.report(&report, source, patterns);

    if !report.failures.is_empty() {
        return Err(CliError::Batch {
            failed: report.failures.len(),
            total: report.total(),
        });
    }
    Ok(())
}

use anyhow::{bail, Context, Result};
use artifactory_provider::resource::lifecycle;
use artifactory_provider::{
    ArtifactoryClient, ProviderConfig, ProviderError, Resource, ResourceData, ResourceRegistry,
    StateFile, VERSION,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Manage JFrog Artifactory configuration declaratively
#[derive(Parser, Debug)]
#[command(name = "artifactory-provider", version = VERSION, about, long_about = None)]
struct Args {
    /// Provider config file (defaults to the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Artifactory base URL, overrides the config file and ARTIFACTORY_URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Where applied resources are recorded
    #[arg(long, global = true, default_value = "artifactory.state.json")]
    state: PathBuf,

    /// Log level for debugging
    #[arg(long, global = true, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List supported resource types
    Resources,
    /// Print the argument schema of a resource type as JSON
    Schema { resource_type: String },
    /// Create, update or replace a resource from a YAML file of arguments
    Apply {
        resource_type: String,
        #[arg(short, long)]
        file: PathBuf,
        /// Id the resource is recorded under, when the configuration renames it
        #[arg(long)]
        id: Option<String>,
    },
    /// Re-read a recorded resource
    Refresh { resource_type: String, id: String },
    /// Start tracking an existing remote object
    Import { resource_type: String, id: String },
    /// Delete a resource
    Destroy { resource_type: String, id: String },
    /// Check connectivity and credentials
    Ping,
    /// Write connection settings to the config file
    Configure {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        access_token: Option<String>,
        #[arg(long)]
        timeout_secs: Option<u64>,
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

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

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
        Err(err) => {
            eprintln!("Warning: cannot open log file {}: {}", log_path.display(), err);
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

    tracing::info!("artifactory-provider {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir
            .join("artifactory-provider")
            .join("artifactory-provider.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home
            .join(".artifactory-provider")
            .join("artifactory-provider.log");
    }
    PathBuf::from("artifactory-provider.log")
}

fn load_config(args: &Args) -> Result<ProviderConfig> {
    let config = match &args.config {
        Some(path) => ProviderConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ProviderConfig::load(),
    };

    let mut config = config.with_env();
    if let Some(url) = &args.url {
        config.url = Some(url.clone());
    }
    Ok(config)
}

fn connect(args: &Args) -> Result<ArtifactoryClient> {
    let config = load_config(args)?;
    Ok(ArtifactoryClient::new(&config)?)
}

/// Read a YAML map of arguments
fn read_arguments(path: &Path) -> Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => bail!("{} must contain a map of arguments, got {}", path.display(), other),
    }
}

/// Identity of a configuration before it has been applied
fn configured_id(arguments: &Map<String, Value>) -> Option<String> {
    ["key", "repo_key"]
        .iter()
        .find_map(|name| arguments.get(*name).and_then(Value::as_str))
        .map(str::to_string)
}

fn warn_deprecated(resource: &dyn Resource) {
    for diagnostic in lifecycle::diagnostics(resource) {
        eprintln!("{}", diagnostic);
    }
}

fn print_state(data: &ResourceData) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let registry = ResourceRegistry::new();

    match &args.command {
        Command::Resources => {
            for name in registry.type_names() {
                println!("{}", name);
            }
        }
        Command::Schema { resource_type } => {
            let resource = registry.require(resource_type)?;
            println!("{}", serde_json::to_string_pretty(resource.schema())?);
        }
        Command::Ping => {
            connect(&args)?.ping().await?;
            println!("OK");
        }
        Command::Apply {
            resource_type,
            file,
            id,
        } => {
            let resource = registry.require(resource_type)?;
            warn_deprecated(resource);

            let arguments = read_arguments(file)?;
            let mut state = StateFile::load(&args.state)?;
            let configured = configured_id(&arguments);
            let prior = state
                .prior(resource_type, id.as_deref(), configured.as_deref())?
                .cloned();

            let client = connect(&args)?;
            let applied = lifecycle::apply(resource, &client, prior.as_ref(), arguments).await?;

            if let Some(prior) = &prior {
                if prior.id() != applied.id() {
                    state.remove(resource_type, prior.id());
                }
            }
            print_state(&applied)?;
            state.put(resource_type, applied);
            state.save()?;
        }
        Command::Refresh { resource_type, id } => {
            let resource = registry.require(resource_type)?;
            warn_deprecated(resource);

            let mut state = StateFile::load(&args.state)?;
            let Some(prior) = state.get(resource_type, id).cloned() else {
                bail!("{} {} is not in {}", resource_type, id, args.state.display());
            };

            let client = connect(&args)?;
            match lifecycle::refresh(resource, &client, &prior).await? {
                Some(current) => {
                    print_state(&current)?;
                    state.put(resource_type, current);
                }
                None => {
                    eprintln!("{} {} no longer exists, removing it from state", resource_type, id);
                    state.remove(resource_type, id);
                }
            }
            state.save()?;
        }
        Command::Import { resource_type, id } => {
            let resource = registry.require(resource_type)?;
            warn_deprecated(resource);

            let client = connect(&args)?;
            let Some(imported) = lifecycle::import(resource, &client, id).await? else {
                bail!("{} {} does not exist", resource_type, id);
            };

            let mut state = StateFile::load(&args.state)?;
            print_state(&imported)?;
            state.put(resource_type, imported);
            state.save()?;
        }
        Command::Configure {
            username,
            password,
            api_key,
            access_token,
            timeout_secs,
        } => {
            let existing = match &args.config {
                Some(path) if path.exists() => ProviderConfig::load_from(path)?,
                Some(_) => ProviderConfig::default(),
                None => ProviderConfig::load(),
            };
            let mut config = existing;
            if let Some(url) = &args.url {
                config.url = Some(url.clone());
            }
            for (slot, value) in [
                (&mut config.username, username),
                (&mut config.password, password),
                (&mut config.api_key, api_key),
                (&mut config.access_token, access_token),
            ] {
                if value.is_some() {
                    *slot = value.clone();
                }
            }
            if let Some(secs) = timeout_secs {
                config.timeout_secs = *secs;
            }
            config.effective_url()?;

            let path = config.save(args.config.as_deref())?;
            println!("Saved {}", path.display());
        }
        Command::Destroy { resource_type, id } => {
            let resource = registry.require(resource_type)?;
            warn_deprecated(resource);

            let mut state = StateFile::load(&args.state)?;
            let target = state
                .get(resource_type, id)
                .cloned()
                .unwrap_or_else(|| ResourceData::with_id(id.as_str()));

            let client = connect(&args)?;
            lifecycle::destroy(resource, &client, &target).await?;

            state.remove(resource_type, id);
            state.save()?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        match err.downcast_ref::<ProviderError>() {
            Some(provider_err) => eprintln!("{}", provider_err.to_diagnostic()),
            None => eprintln!("Error: {err:?}"),
        }
        std::process::exit(1);
    }

    Ok(())
}

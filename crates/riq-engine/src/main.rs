use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use riq_catalog::ReferenceData;
use riq_engine::{Engine, EngineConfig, ErrorResponse, InMemoryStore, ObservationStore, RestStore, RestStoreConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn request_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("request")
            .long("request")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("JSON request body"),
    )
    .arg(
        Arg::new("store")
            .long("store")
            .value_parser(value_parser!(PathBuf))
            .help("JSON fixture of level tables (default: REST store from SUPABASE_URL)"),
    )
}

fn cli() -> Command {
    Command::new("riq")
        .version(riq_engine::VERSION)
        .about("RegionIQ observation query engine")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML engine configuration"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(Command::new("schema").about("Print the schema description"))
        .subcommand(request_args(
            Command::new("query").about("Run a query and print the JSON response"),
        ))
        .subcommand(
            request_args(Command::new("export").about("Render an export file")).arg(
                Arg::new("out")
                    .long("out")
                    .default_value(".")
                    .value_parser(value_parser!(PathBuf))
                    .help("Output directory"),
            ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<EngineConfig> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn open_store(args: &ArgMatches) -> anyhow::Result<Arc<dyn ObservationStore>> {
    match args.get_one::<PathBuf>("store") {
        Some(path) => Ok(Arc::new(
            InMemoryStore::from_path(path).with_context(|| format!("loading store {}", path.display()))?,
        )),
        None => {
            let config = RestStoreConfig::from_env()?;
            Ok(Arc::new(RestStore::new(config)?))
        }
    }
}

fn read_request(args: &ArgMatches) -> anyhow::Result<serde_json::Value> {
    let path = args
        .get_one::<PathBuf>("request")
        .context("--request is required")?;
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));

    let config = load_config(&matches)?;
    let reference = Arc::new(ReferenceData::builtin()?);

    match matches.subcommand() {
        Some(("schema", _)) => {
            let schema = riq_engine::SchemaDescription::describe(&reference, &config);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Some(("query", args)) => {
            let engine = Engine::new(reference, open_store(args)?, config);
            let body = read_request(args)?;
            match engine.query(&body).await {
                Ok(response) => println!("{}", serde_json::to_string_pretty(&response)?),
                Err(err) => {
                    println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&err))?);
                    std::process::exit(if err.is_client_error() { 2 } else { 1 });
                }
            }
        }
        Some(("export", args)) => {
            let engine = Engine::new(reference, open_store(args)?, config);
            let body = read_request(args)?;
            let out = args
                .get_one::<PathBuf>("out")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("."));
            let file = engine.export(&body).await?;
            let target = out.join(&file.filename);
            std::fs::write(&target, &file.bytes).with_context(|| format!("writing {}", target.display()))?;
            println!("{}", target.display());
        }
        _ => unreachable!("subcommand_required"),
    }
    Ok(())
}

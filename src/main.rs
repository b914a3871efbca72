//! `reqo`: issue one call through the request pipeline from the shell.
//!
//! The envelope is printed as JSON on stdout; rejected calls exit with
//! status 1. UI capabilities are replaced by log events on stderr.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use request_orchestrator::capabilities::{Capabilities, LoginSurfaceFlag, StaticToken};
use request_orchestrator::config::load_config;
use request_orchestrator::observability::logging::init_logging;
use request_orchestrator::{Method, OrchestratorConfig, Pipeline, RequestOptions};

#[derive(Parser)]
#[command(name = "reqo")]
#[command(about = "Send requests through the orchestration pipeline", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `transport.base_url`
    #[arg(short, long)]
    base_url: Option<String>,

    /// Session token sent in the configured token header
    #[arg(short, long, env = "REQO_TOKEN")]
    token: Option<String>,

    /// Treat the call as issued from the login surface
    #[arg(long)]
    login_surface: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Get(CallArgs),
    Head(CallArgs),
    Post(CallArgs),
    Patch(CallArgs),
    Put(CallArgs),
    /// Fetch a raw body and write it to stdout unmodified
    Download(CallArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
struct CallArgs {
    url: String,

    /// JSON payload; query parameters for GET/HEAD, body otherwise
    #[arg(short, long)]
    data: Option<String>,

    /// Resource name appended to the URL path
    #[arg(short, long)]
    name: Option<String>,

    /// Suppress notifications
    #[arg(short, long)]
    silent: bool,

    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl CallArgs {
    fn payload(&self) -> Result<Option<Value>, Box<dyn std::error::Error>> {
        let mut data = match &self.data {
            Some(raw) => Some(serde_json::from_str::<Value>(raw)?),
            None => None,
        };
        if let Some(name) = &self.name {
            let fields = data.get_or_insert_with(|| Value::Object(Default::default()));
            match fields.as_object_mut() {
                Some(fields) => {
                    fields.insert("name".to_string(), Value::String(name.clone()));
                }
                None => return Err("--name requires --data to be a JSON object".into()),
            }
        }
        Ok(data)
    }

    fn options(&self) -> RequestOptions {
        let mut options = RequestOptions::new().silent(self.silent);
        if let Some(secs) = self.timeout_secs {
            options = options.timeout(std::time::Duration::from_secs(secs));
        }
        options
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => OrchestratorConfig::default(),
    };
    if let Some(base_url) = cli.base_url {
        config.transport.base_url = Some(base_url);
    }

    init_logging(&config.observability.log_level);

    let (method, args) = match cli.command {
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Download(args) => {
            let capabilities = capabilities(cli.token, cli.login_surface);
            let pipeline = Pipeline::with_reqwest(config, capabilities)?;
            return match pipeline
                .download(Method::Get, &args.url, args.payload()?, args.options())
                .await
            {
                Ok(response) => {
                    std::io::stdout().write_all(&response.body)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(envelope) => {
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                    Ok(ExitCode::FAILURE)
                }
            };
        }
        Commands::Get(args) => (Method::Get, args),
        Commands::Head(args) => (Method::Head, args),
        Commands::Post(args) => (Method::Post, args),
        Commands::Patch(args) => (Method::Patch, args),
        Commands::Put(args) => (Method::Put, args),
    };

    let pipeline = Pipeline::with_reqwest(config, capabilities(cli.token, cli.login_surface))?;
    let result = pipeline
        .request(method, &args.url, args.payload()?, args.options())
        .await;

    let (envelope, code) = match result {
        Ok(envelope) => (envelope, ExitCode::SUCCESS),
        Err(envelope) => (envelope, ExitCode::FAILURE),
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(code)
}

fn capabilities(token: Option<String>, login_surface: bool) -> Capabilities {
    Capabilities {
        tokens: Arc::new(StaticToken(token)),
        route: Arc::new(LoginSurfaceFlag::new(login_surface)),
        ..Capabilities::default()
    }
}

use inspection_core::config::ValidationConfig;
use inspection_core::engine::{ValidationEngine, ValidationRequest};
use inspection_core::error::{CoreError, CoreResult};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "usage: inspection_validator <document.json> [--policy <policy.json>] \
[--briefing <briefing.json>] [--config <config.json>] [--as-of <YYYY-MM-DD>]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    document: PathBuf,
    policy: Option<PathBuf>,
    briefing: Option<PathBuf>,
    config: Option<PathBuf>,
    as_of: Option<String>,
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut iter = raw.iter();
    let mut args = Args::default();
    let mut document = None;
    while let Some(a) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} needs a value", flag))
        };
        match a.as_str() {
            "--policy" => args.policy = Some(PathBuf::from(value("--policy")?)),
            "--briefing" => args.briefing = Some(PathBuf::from(value("--briefing")?)),
            "--config" => args.config = Some(PathBuf::from(value("--config")?)),
            "--as-of" => args.as_of = Some(value("--as-of")?),
            flag if flag.starts_with("--") => return Err(format!("unknown flag: {}", flag)),
            path if document.is_none() => document = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument: {}", extra)),
        }
    }
    args.document = document.ok_or_else(|| "missing document path".to_string())?;
    Ok(args)
}

fn read(path: &PathBuf) -> CoreResult<String> {
    std::fs::read_to_string(path).map_err(CoreError::from)
}

fn load(args: &Args) -> CoreResult<(ValidationRequest, ValidationConfig)> {
    let document = read(&args.document)?;
    let policy = args.policy.as_ref().map(read).transpose()?;
    let briefing = args.briefing.as_ref().map(read).transpose()?;
    let mut request =
        ValidationRequest::from_json_parts(&document, policy.as_deref(), briefing.as_deref())?;
    if let Some(d) = &args.as_of {
        request = request.with_as_of(d);
    }
    let config = match &args.config {
        Some(p) => ValidationConfig::from_json_str(&read(p)?)?,
        None => ValidationConfig::default(),
    };
    Ok((request, config))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_json = std::env::var("INSPECTION_LOG_JSON").is_ok_and(|v| v == "1");
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{}\n{}", msg, USAGE);
            std::process::exit(2);
        }
    };
    let (request, config) = match load(&args) {
        Ok(v) => v,
        Err(e) => {
            error!("input rejected: {}", e);
            std::process::exit(2);
        }
    };
    let engine = match ValidationEngine::new(config) {
        Ok(e) => e,
        Err(e) => {
            error!("engine setup failed: {}", e);
            std::process::exit(2);
        }
    };
    let report = match engine.validate(&request).await {
        Ok(r) => r,
        Err(e) => {
            error!("validation rejected: {}", e);
            std::process::exit(2);
        }
    };
    match serde_json::to_string_pretty(&report) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            error!("report serialization failed: {}", e);
            std::process::exit(2);
        }
    }
    let summary = report.summary();
    info!(
        validation_id = %report.validation_id,
        errors = summary.error,
        warnings = summary.warn,
        "report written"
    );
    std::process::exit(if report.has_blocking_errors() { 1 } else { 0 });
}

use clap::{Args, Parser, Subcommand};
use forecast_relay::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use forecast_relay::location::SessionCache;
use forecast_relay::{server, ForecastPeriod, ForecastRequest, Pipeline, ProviderConfig, RelayError};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Forecast Relay — AccuWeather location resolution and daily forecasts.
///
/// Examples:
///   relay serve --port 5000
///   relay lookup --continent EUR --country France --province Paris
///   ACCUWEATHER_PERIOD=1day relay lookup -c NAM -n Canada -p Toronto
#[derive(Parser)]
#[command(name = "relay", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,

    /// Log filter used when RUST_LOG is unset (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ProviderArgs {
    /// AccuWeather API key.
    #[arg(long, env = "ACCUWEATHER_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Daily forecast period: 1day, 5day, 10day or 15day.
    #[arg(long, env = "ACCUWEATHER_PERIOD", default_value = "5day", value_parser = parse_period, global = true)]
    period: ForecastPeriod,

    /// Provider base URL.
    #[arg(long, env = "ACCUWEATHER_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Timeout for each provider call, in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the relay over HTTP.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 5000)]
        port: u16,
    },

    /// Run the whole chain once and print the forecast as JSON.
    Lookup {
        /// Region code (AFR, ANT, ARC, ASI, CAC, EUR, MEA, NAM, OCN, SAM).
        #[arg(long, short = 'c')]
        continent: String,

        /// Country name, English or localized.
        #[arg(long, short = 'n')]
        country: String,

        /// Province or city name.
        #[arg(long, short = 'p')]
        province: String,
    },
}

fn parse_period(s: &str) -> Result<ForecastPeriod, String> {
    s.parse()
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn provider_config(args: ProviderArgs) -> Result<ProviderConfig, String> {
    let config = ProviderConfig::new(args.api_key.unwrap_or_default(), args.period)
        .with_base_url(args.base_url)
        .with_timeout(Duration::from_secs(args.timeout_secs));
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = provider_config(cli.provider).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    });
    let pipeline = Pipeline::from_config(&config);

    match cli.command {
        Command::Serve { host, port } => {
            if let Err(e) = server::start(&host, port, pipeline).await {
                eprintln!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Command::Lookup { continent, country, province } => {
            let request = ForecastRequest {
                continent: Some(continent),
                country: Some(country),
                province: Some(province),
            };
            let outcome = tokio::task::spawn_blocking(move || lookup(&pipeline, &request))
                .await
                .unwrap_or_else(|e| Err(RelayError::Internal(e.to_string())));

            match outcome {
                Ok(Some(report)) => match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error: cannot render forecast: {}", e);
                        std::process::exit(1);
                    }
                },
                Ok(None) => {
                    eprintln!("Error: no match for that country or province");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    eprintln!("{}", e.payload());
                    std::process::exit(1);
                }
            }
        }
    }
}

/// All three entry points in one fresh session, as a browser client would call them.
fn lookup(
    pipeline: &Pipeline,
    request: &ForecastRequest,
) -> Result<Option<forecast_relay::location::ForecastReport>, RelayError> {
    let mut session = SessionCache::new();
    pipeline.resolve_country_list(&mut session, request.continent.as_deref())?;
    if pipeline
        .resolve_province_list(&mut session, request.country.as_deref())?
        .is_none()
    {
        return Ok(None);
    }
    pipeline.route_forecast_request(&mut session, request)
}

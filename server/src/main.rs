use relay_agent::config::Config;
use relay_agent::logging::setup_tracing;
use relay_agent::{app, AppState, AGENT_NAME, VERSION};
use relay_engine::Executor;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

const BANNER: &str = r"
  ____       _
 |  _ \ ___ | | __ _ _   _
 | |_) / _ \| |/ _` | | | |
 |  _ <  __/| | (_| | |_| |
 |_| \_\___||_|\__,_|\__, |
                     |___/
";

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::new();
    setup_tracing(config.log_format);
    for warning in &config.warnings {
        warn!("{}", warning);
    }

    let executor = match Executor::from_config(&config.engine()) {
        Ok(executor) => executor,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let listener = match TcpListener::bind(config.bind_addr()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to start agent on {}: {}", config.bind_addr(), e);
            return ExitCode::FAILURE;
        }
    };

    print_startup_banner(&config);

    info!("{} starting on {}", AGENT_NAME, config.public_url());
    info!("Ready to proxy requests to localhost and private APIs");
    info!("CORS enabled for browser access");

    let app_state = Arc::new(AppState {
        executor,
        public_url: config.public_url(),
    });

    if let Err(e) = axum::serve(listener, app(app_state)).await {
        error!("Agent stopped: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn print_startup_banner(config: &Config) {
    println!("{}", BANNER);
    println!("{} v{}", AGENT_NAME, VERSION);
    println!("Listening on {}", config.public_url());
    println!(
        "Outbound requests time out after {}s.\n",
        config.request_timeout.as_secs()
    );
}

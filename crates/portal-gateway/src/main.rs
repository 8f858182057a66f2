use clap::{Parser, Subcommand};
use portal_gateway::{Config, ConfigError, PortalClient, PortalError, PortalTransport};
use std::net::{IpAddr, Ipv4Addr};
use std::process;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Portal Gateway - Huawei Portal protocol client for captive portals
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "portal-gateway")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "config.json")]
    config: String,

    /// Validate configuration and exit (doesn't start the gateway)
    #[arg(long)]
    validate: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Listen for NAS messages until interrupted (default)
    Serve,
    /// Log a user in
    Login {
        /// Address of the user's device
        #[arg(long)]
        user_ip: Ipv4Addr,
        #[arg(long)]
        username: String,
        /// Defaults to the password of the configured user
        #[arg(long)]
        password: Option<String>,
        /// Overrides the configured NAS address
        #[arg(long)]
        nas_ip: Option<IpAddr>,
    },
    /// Log a user out
    Logout {
        #[arg(long)]
        user_ip: Ipv4Addr,
        #[arg(long)]
        nas_ip: Option<IpAddr>,
    },
    /// Query the NAS about a user
    Info {
        #[arg(long)]
        user_ip: Ipv4Addr,
        #[arg(long)]
        nas_ip: Option<IpAddr>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load or create configuration (without logging first)
    let config = match Config::from_file(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing_subscriber::registry()
                .with(EnvFilter::new("info"))
                .with(tracing_subscriber::fmt::layer())
                .init();

            if cli.validate {
                eprintln!("Configuration validation failed!");
                eprintln!("   Error: {}", e);
                process::exit(1);
            }

            warn!("Could not load config file from: {} ({})", cli.config, e);
            info!("Creating example configuration at: {}", cli.config);

            if let Err(e) = Config::example().to_file(&cli.config) {
                error!("Error creating example config: {}", e);
                process::exit(1);
            }

            info!("Please edit {} and restart the gateway", cli.config);
            process::exit(0);
        }
    };

    if cli.validate {
        println!("Configuration validated successfully!");
        println!();
        println!("Configuration summary:");
        println!("  Listen: {}:{}", config.listen_address, config.listen_port);
        match config.nas_addr() {
            Ok(Some(addr)) => println!("  NAS: {}", addr),
            _ => println!("  NAS: (per request):{}", config.nas_port),
        }
        println!("  Protocol version: {}", config.version);
        println!("  Authentication: {}", config.auth_method);
        println!("  Timeout: {}s", config.timeout_secs);
        println!("  Users: {}", config.users.len());
        println!("  Log level: {}", config.log_level.as_deref().unwrap_or("info"));
        process::exit(0);
    }

    let log_level = config.log_level.as_deref().unwrap_or("info");
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Portal Gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from: {}", cli.config);

    if let Err(e) = run(cli.command.unwrap_or(Command::Serve), config).await {
        error!("{}", e);
        process::exit(1);
    }
}

async fn run(command: Command, config: Config) -> Result<(), PortalError> {
    let bind_addr = config.socket_addr()?;
    let transport = match PortalTransport::bind(
        bind_addr,
        config.protocol_version()?.codec(),
        config.timeout(),
    )
    .await
    {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            error!("Failed to bind {}: {}", bind_addr, e);
            process::exit(1);
        }
    };

    let client = PortalClient::new(Arc::clone(&transport), &config.secret, config.nas_port)
        .with_auth_method(config.auth_method()?);
    transport.register_fallback(Arc::new(client.clone()));

    let runner = Arc::clone(&transport);
    let receive_loop = tokio::spawn(async move { runner.run().await });

    let result = execute(command, &config, &client, receive_loop).await;

    transport.deregister_fallback();
    result
}

async fn execute(
    command: Command,
    config: &Config,
    client: &PortalClient,
    receive_loop: tokio::task::JoinHandle<Result<(), PortalError>>,
) -> Result<(), PortalError> {
    match command {
        Command::Serve => serve(config, receive_loop).await,
        Command::Login {
            user_ip,
            username,
            password,
            nas_ip,
        } => login(client, config, user_ip, nas_ip, &username, password).await,
        Command::Logout { user_ip, nas_ip } => {
            let nas_ip = resolve_nas(config, nas_ip)?;
            client.logout(user_ip, nas_ip).await.map(|_| ())
        }
        Command::Info { user_ip, nas_ip } => {
            let nas_ip = resolve_nas(config, nas_ip)?;
            let ack = client.req_info(user_ip, nas_ip).await?;
            for attribute in ack.attributes() {
                println!(
                    "  type {:#04x}: {}",
                    attribute.attr_type,
                    attribute.as_string()
                );
            }
            Ok(())
        }
    }
}

async fn serve(
    config: &Config,
    receive_loop: tokio::task::JoinHandle<Result<(), PortalError>>,
) -> Result<(), PortalError> {
    info!(
        "Sending to NAS port {} with {} authentication",
        config.nas_port, config.auth_method
    );
    info!("Gateway started successfully!");
    info!("Press Ctrl+C to stop");

    tokio::select! {
        joined = receive_loop => joined?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}

async fn login(
    client: &PortalClient,
    config: &Config,
    user_ip: Ipv4Addr,
    nas_ip: Option<IpAddr>,
    username: &str,
    password: Option<String>,
) -> Result<(), PortalError> {
    let nas_ip = resolve_nas(config, nas_ip)?;
    let password = match password {
        Some(password) => password,
        None => config
            .find_user(username)
            .map(|user| user.password.clone())
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "No password given and no configured user {}",
                    username
                ))
            })?,
    };

    client
        .auth(user_ip, nas_ip, username.as_bytes(), password.as_bytes())
        .await
}

fn resolve_nas(config: &Config, nas_ip: Option<IpAddr>) -> Result<IpAddr, PortalError> {
    match nas_ip {
        Some(ip) => Ok(ip),
        None => config.nas_ip()?.ok_or_else(|| {
            PortalError::Config(ConfigError::Invalid(
                "No NAS address given and none configured".to_string(),
            ))
        }),
    }
}

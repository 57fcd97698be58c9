use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::{Host, Url};

use h2_oneshot::{tls, Client, ClientResponse, Request, Response, Server, ServerConfig, TlsFiles};

#[derive(Parser)]
#[command(name = "h2-oneshot", version)]
#[command(about = "One HTTP/2 request/response per connection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer every connection with the contents of a file
    Serve(ServeArgs),
    /// POST a JSON body and save the response body to a file
    Post(PostArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// TOML config file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    listen: Option<SocketAddr>,

    #[arg(long, requires = "key")]
    cert: Option<PathBuf>,

    #[arg(long, requires = "cert")]
    key: Option<PathBuf>,

    #[arg(long)]
    payload: Option<PathBuf>,

    #[arg(long)]
    content_type: Option<String>,

    #[arg(long)]
    chunk_size: Option<usize>,
}

#[derive(Args)]
struct PostArgs {
    url: Url,

    /// PEM file with the CA (or self-signed cert) to trust for https
    #[arg(long)]
    ca: Option<PathBuf>,

    #[arg(short, long, default_value = r#"{"message":"hello"}"#)]
    data: String,

    #[arg(short, long, default_value = "image.png")]
    out: PathBuf,

    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "h2_oneshot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        Commands::Serve(args) => serve(args),
        Commands::Post(args) => post(args),
    }
}

fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let (Some(cert), Some(key)) = (args.cert, args.key) {
        config.tls = Some(TlsFiles { cert, key });
    }
    if let Some(payload) = args.payload {
        config.payload = payload;
    }
    if let Some(content_type) = args.content_type {
        config.content_type = content_type;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }

    let server = Server::bind(&config)?;
    let payload = config.payload.clone();
    let content_type = config.content_type.clone();

    server.run(move |_request: &Request| -> io::Result<Response> {
        let body = std::fs::read(&payload)?;
        Ok(Response::ok(content_type.clone(), body))
    })
}

/// Where and how to send the request for a `post` URL.
#[derive(Debug, PartialEq)]
struct Target {
    addrs: Vec<SocketAddr>,
    /// Host for TLS verification; IPv6 literals without brackets.
    server_name: String,
    /// `:authority` value; keeps the brackets and any explicit port.
    authority: String,
    path: String,
}

impl Target {
    fn from_url(url: &Url) -> Result<Self, Box<dyn std::error::Error>> {
        let server_name = match url.host().ok_or("url has no host")? {
            Host::Domain(domain) => domain.to_string(),
            Host::Ipv4(ip) => ip.to_string(),
            Host::Ipv6(ip) => ip.to_string(),
        };
        let host = url.host_str().ok_or("url has no host")?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        Ok(Self {
            addrs: url.socket_addrs(|| None)?,
            server_name,
            authority,
            path,
        })
    }
}

fn post(args: PostArgs) -> Result<(), Box<dyn std::error::Error>> {
    let target = Target::from_url(&args.url)?;
    let deadline = Some(Instant::now() + Duration::from_secs(args.timeout_secs));
    let body = args.data.as_bytes();

    let response: ClientResponse = match args.url.scheme() {
        "https" => {
            let ca = args.ca.as_deref().ok_or("--ca is required for https")?;
            let config = tls::client_config(&tls::load_certs(ca)?)?;
            Client::connect_tls(&target.addrs[..], config, &target.server_name)?
                .post(&target.authority, &target.path, "application/json", body, deadline)?
        }
        "http" => Client::connect_tcp(&target.addrs[..])?
            .post(&target.authority, &target.path, "application/json", body, deadline)?,
        other => return Err(format!("unsupported scheme {}", other).into()),
    };

    std::fs::write(&args.out, &response.body)?;
    tracing::info!(
        status = response.status,
        bytes = response.body.len(),
        out = %args.out.display(),
        "saved response"
    );
    Ok(())
}

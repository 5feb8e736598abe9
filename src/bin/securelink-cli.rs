use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use securelink_proxy::config::load_config;
use securelink_proxy::securelink::expiry::unix_now;
use securelink_proxy::securelink::{
    decode_path, encode_path, expire_after, DigestAlgorithm, Outcome, SecureLink, Signer,
};

#[derive(Parser)]
#[command(name = "securelink-cli")]
#[command(about = "Issue and check signed links for the secure link proxy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a signed link
    Sign {
        /// Shared secret
        #[arg(short, long, env = "SECURELINK_SECRET")]
        secret: String,

        /// Protected prefix, e.g. /video
        #[arg(short, long)]
        prefix: String,

        /// Real path below the prefix, unencoded, e.g. "/my clip.mp4"
        #[arg(long)]
        path: String,

        /// Put the token in the query string
        #[arg(short, long)]
        query: bool,

        /// Seconds until the link expires (query mode only)
        #[arg(long, requires = "query", conflicts_with = "expire")]
        ttl: Option<u64>,

        /// Explicit expiry as Unix seconds (query mode only)
        #[arg(long, requires = "query")]
        expire: Option<i64>,

        /// Token digest
        #[arg(long, default_value = "md5")]
        algorithm: DigestAlgorithm,

        /// Print JSON instead of the bare link
        #[arg(long)]
        json: bool,
    },
    /// Evaluate a link against a proxy config file, offline
    Check {
        /// Path to the proxy's TOML configuration
        #[arg(short, long, default_value = "securelink.toml")]
        config: PathBuf,

        /// Path and query, e.g. /video/<token>/foo
        link: String,
    },
    /// Request a link from a running proxy and print the status
    Probe {
        /// Proxy base URL
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,

        /// Path and query to request
        link: String,
    },
}

#[derive(Serialize)]
struct SignedLink {
    link: String,
    token: String,
    algorithm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expire: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sign {
            secret,
            prefix,
            path,
            query,
            ttl,
            expire,
            algorithm,
            json,
        } => {
            if secret.is_empty() {
                return Err("secret must not be empty".into());
            }
            if !path.starts_with('/') {
                return Err("path must start with '/'".into());
            }

            let signer = Signer::new(secret, algorithm);
            let expire = expire.or_else(|| ttl.map(|ttl| expire_after(unix_now(), ttl)));
            let (link, token) = if query {
                (
                    signer.query_link(&prefix, &path, expire),
                    signer.token(expire, &path),
                )
            } else {
                (signer.path_link(&prefix, &path), signer.token(None, &path))
            };

            if json {
                let out = SignedLink {
                    link,
                    token,
                    algorithm: signer.algorithm().to_string(),
                    expire,
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{}", link);
            }
        }
        Commands::Check { config, link } => {
            let config = load_config(&config)?;
            let filter = SecureLink::new(&config.securelink)?;
            let (path, query) = match link.split_once('?') {
                Some((path, query)) => (path, Some(query)),
                None => (link.as_str(), None),
            };

            match filter.evaluate(&decode_path(path), query) {
                Outcome::Admit {
                    rewritten_path,
                    verified,
                } => {
                    let forwarded = rewritten_path
                        .map(|p| encode_path(&p))
                        .unwrap_or_else(|| path.to_string());
                    if verified {
                        println!("200 admitted, forwarded as {}", forwarded);
                    } else {
                        println!("200 not protected, forwarded as {}", forwarded);
                    }
                }
                Outcome::Forbid(reason) => println!("403 forbidden ({})", reason.as_str()),
                Outcome::Expired { expire, now } => {
                    println!("410 gone (expired {}s ago)", now - expire)
                }
            }
        }
        Commands::Probe { url, link } => {
            let target = format!("{}{}", url.trim_end_matches('/'), link);
            let res = reqwest::Client::new().get(&target).send().await?;
            println!("{} {}", res.status().as_u16(), target);
        }
    }

    Ok(())
}

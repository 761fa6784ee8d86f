use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use http::header::SET_COOKIE;
use http::{HeaderValue, Request, StatusCode};
use proxy_cookie::config::EXAMPLE_CONFIG;
use proxy_cookie::{
    telemetry, CookieRewriter, Handler, ProxyCookie, ProxyCookieConfig, ResponseBuffer,
    ResponseWriter,
};
use std::io::BufRead;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "proxy-cookie",
    version,
    about = "Rewrite the Path and Domain of Set-Cookie headers"
)]
struct Args {
    /// Configuration file (YAML for .yaml/.yml, TOML for .toml, JSON otherwise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate configuration and exit.
    #[arg(long)]
    validate: bool,

    /// Print example configuration and exit.
    #[arg(long)]
    example_config: bool,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Set-Cookie values to rewrite. Read one per line from stdin when omitted.
    set_cookies: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.example_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    telemetry::init_tracing(&args.log_level, args.json_logs)?;

    let config = match &args.config {
        Some(path) => ProxyCookieConfig::load_from_file(path)?,
        None => ProxyCookieConfig::default(),
    };

    if args.validate {
        CookieRewriter::from_config(&config).context("invalid configuration")?;
        info!(config = ?args.config, "configuration is valid");
        println!("configuration is valid");
        return Ok(());
    }

    let values = if args.set_cookies.is_empty() {
        read_stdin_lines()?
    } else {
        args.set_cookies
    };

    let headers = values
        .iter()
        .map(|v| {
            HeaderValue::from_str(v).with_context(|| format!("not a valid header value: {v:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    let sent = headers.len();

    // Stands in for the backend: emits the given cookies on one response.
    let upstream = move |_req: Request<Bytes>, w: &mut dyn ResponseWriter| {
        for value in &headers {
            w.headers_mut().append(SET_COOKIE, value.clone());
        }
        w.write_header(StatusCode::OK);
    };

    let plugin = ProxyCookie::new(&config, upstream, "proxy-cookie")
        .context("invalid configuration")?;

    let mut w = ResponseBuffer::new();
    plugin.serve(Request::builder().uri("/").body(Bytes::new())?, &mut w);
    let res = w.into_response();

    let mut emitted = 0usize;
    for value in res.headers().get_all(SET_COOKIE) {
        println!("{}", String::from_utf8_lossy(value.as_bytes()));
        emitted += 1;
    }

    if emitted < sent {
        warn!(dropped = sent - emitted, "malformed set-cookie values dropped");
    }

    Ok(())
}

fn read_stdin_lines() -> Result<Vec<String>> {
    let mut out = Vec::new();
    for line in std::io::stdin().lock().lines() {
        let line = line.context("read stdin")?;
        let line = line.trim();
        if !line.is_empty() {
            out.push(line.to_string());
        }
    }
    Ok(out)
}

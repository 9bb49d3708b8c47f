//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use transfer_core::Cookie;

/// Send HTTP requests and download files.
#[derive(Parser, Debug)]
#[command(name = "transfer")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Accept any server certificate
    #[arg(short = 'k', long, global = true)]
    pub insecure: bool,

    /// PEM bundle of trusted root certificates
    #[arg(long, global = true, value_name = "PATH")]
    pub ca_bundle: Option<PathBuf>,

    /// Try HTTP/3 first, falling back to HTTP/1.1 or HTTP/2 per host
    #[arg(long, global = true)]
    pub http3: bool,

    /// Config file (default: $XDG_CONFIG_HOME/transfer/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// GET a URL and write the body to stdout
    Get {
        url: String,
        #[command(flatten)]
        extras: RequestExtras,
    },

    /// POST a form (-d) or a raw body (--body/--body-file)
    Post {
        url: String,
        #[command(flatten)]
        extras: RequestExtras,
        #[command(flatten)]
        payload: Payload,
        /// Return a redirect response instead of following it
        #[arg(long)]
        no_redirect: bool,
    },

    /// PUT a raw body
    Put {
        url: String,
        #[command(flatten)]
        extras: RequestExtras,
        #[command(flatten)]
        body: RawBody,
    },

    /// DELETE with an optional raw body
    Delete {
        url: String,
        #[command(flatten)]
        extras: RequestExtras,
        #[command(flatten)]
        body: RawBody,
    },

    /// POST a file as one multipart chunk alongside form fields
    Upload {
        url: String,
        /// File to send
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
        /// Multipart field name of the file part
        #[arg(long, default_value = "file")]
        field: String,
        /// Filename reported to the server (default: the file's own name)
        #[arg(long)]
        name: Option<String>,
        /// Form field sent alongside the file, repeatable
        #[arg(short = 'd', long = "form", value_name = "KEY=VALUE", value_parser = parse_pair)]
        form: Vec<(String, String)>,
        #[command(flatten)]
        extras: RequestExtras,
    },

    /// Download a URL to a local file, skipping if the file exists
    Download {
        url: String,
        /// Destination path
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
        /// Fetch even if the destination exists
        #[arg(short, long)]
        force: bool,
    },
}

/// Headers and cookies shared by request subcommands.
#[derive(ClapArgs, Debug, Default)]
pub struct RequestExtras {
    /// Extra header, repeatable
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Cookie, repeatable
    #[arg(short = 'b', long = "cookie", value_name = "NAME=VALUE", value_parser = parse_cookie)]
    pub cookies: Vec<Cookie>,
}

/// Form values or a raw body, never both.
#[derive(ClapArgs, Debug, Default)]
pub struct Payload {
    /// Form value, repeatable
    #[arg(
        short = 'd',
        long = "form",
        value_name = "KEY=VALUE",
        value_parser = parse_pair,
        conflicts_with_all = ["body", "body_file"]
    )]
    pub form: Vec<(String, String)>,

    #[command(flatten)]
    pub raw: RawBody,
}

/// Raw body sources.
#[derive(ClapArgs, Debug, Default)]
pub struct RawBody {
    /// Raw body text
    #[arg(long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Raw body read from a file
    #[arg(long, value_name = "PATH")]
    pub body_file: Option<PathBuf>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in {raw:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    Ok((key.to_string(), value.to_string()))
}

fn parse_cookie(raw: &str) -> Result<Cookie, String> {
    let (name, value) = parse_pair(raw)?;
    Ok(Cookie::new(name, value))
}

//! Subcommand execution: send the request, report status, stream the body.

use std::path::Path;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use reqwest::header::LOCATION;
use tokio::io::AsyncWriteExt;
use tracing::info;
use transfer_core::{
    DownloadOutcome, FilePart, Method, RequestBody, RequestSpec, Response, TransferClient,
};

use crate::cli::{Command, Payload, RawBody, RequestExtras};

pub(crate) async fn run(client: &TransferClient, command: Command) -> Result<()> {
    let response = match command {
        Command::Download { url, output, force } => {
            match client.download(&output, &url, force).await? {
                DownloadOutcome::Skipped => {
                    info!(
                        path = %output.display(),
                        "file exists, skipped (use --force to refetch)"
                    );
                }
                DownloadOutcome::Fetched { bytes } => {
                    info!(path = %output.display(), bytes, "downloaded");
                }
            }
            return Ok(());
        }
        Command::Post {
            no_redirect: true,
            url,
            extras,
            payload,
        } => {
            let spec =
                with_extras(Method::POST, &url, extras)?.body(payload_body(payload).await?);
            client.execute_without_redirect(&spec).await?
        }
        command => client.execute(&request_for(command).await?).await?,
    };

    print_response(response).await
}

/// Translates a request subcommand into a request; every parsed header,
/// cookie and body value ends up on the wire.
async fn request_for(command: Command) -> Result<RequestSpec> {
    let spec = match command {
        Command::Get { url, extras } => with_extras(Method::GET, &url, extras)?,
        Command::Post {
            url,
            extras,
            payload,
            ..
        } => with_extras(Method::POST, &url, extras)?.body(payload_body(payload).await?),
        Command::Put { url, extras, body } => {
            with_extras(Method::PUT, &url, extras)?.body(raw_body(body).await?)
        }
        Command::Delete { url, extras, body } => {
            with_extras(Method::DELETE, &url, extras)?.body(raw_body(body).await?)
        }
        Command::Upload {
            url,
            file,
            field,
            name,
            form,
            extras,
        } => {
            let chunk = read_file(&file).await?;
            let file_name = name.unwrap_or_else(|| display_name(&file));
            let part = FilePart::new(field, file_name, chunk);
            with_extras(Method::POST, &url, extras)?.body(RequestBody::multipart(form, Some(part)))
        }
        Command::Download { url, .. } => anyhow::bail!("download of {url} is not a plain request"),
    };
    Ok(spec)
}

fn with_extras(method: Method, url: &str, extras: RequestExtras) -> Result<RequestSpec> {
    Ok(RequestSpec::new(method, url)?
        .headers(extras.headers)
        .cookies(extras.cookies))
}

async fn payload_body(payload: Payload) -> Result<RequestBody> {
    if payload.form.is_empty() {
        raw_body(payload.raw).await
    } else {
        Ok(RequestBody::Form(payload.form))
    }
}

async fn raw_body(raw: RawBody) -> Result<RequestBody> {
    if let Some(text) = raw.body {
        return Ok(RequestBody::Raw(text.into_bytes()));
    }
    match raw.body_file {
        Some(path) => Ok(RequestBody::Raw(read_file(&path).await?)),
        None => Ok(RequestBody::Empty),
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| "file".to_string(), |name| name.to_string_lossy().into_owned())
}

/// Status and `Location` go to the log, the body to stdout.
async fn print_response(response: Response) -> Result<()> {
    let status = response.status();
    match response.headers().get(LOCATION).and_then(|v| v.to_str().ok()) {
        Some(location) => info!(status = status.as_u16(), location, "response"),
        None => info!(status = status.as_u16(), "response"),
    }

    let mut stdout = tokio::io::stdout();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("response body interrupted")?;
        stdout.write_all(&chunk).await?;
    }
    stdout.flush().await?;
    Ok(())
}

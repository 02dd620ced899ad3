//! Cloud upload CLI
//!
//! Uploads one local file to the cloud through an already resolved upload
//! shard and auth token.

use bytesize::ByteSize;
use clap::{Arg, ArgAction, Command};
use cloud_upload::{
    upload_file, CloudClient, CloudConfig, ShardEndpoint, UploadProgress, UploadRequest,
};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("cloud-upload")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Stream a file to cloud storage and register it at a path")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(Arg::new("source").help("Local file to upload").required(true))
        .arg(
            Arg::new("destination")
                .help("Full destination path in the cloud")
                .required(true),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .help("Auth token of the session")
                .required(true),
        )
        .arg(
            Arg::new("shard")
                .long("shard")
                .help("Upload shard URL of the session")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("JSON configuration file"),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Metadata API root, overrides the configuration"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Per-request deadline in seconds")
                .value_parser(clap::value_parser!(u64)),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => CloudConfig::from_file(path)?,
        None => CloudConfig::default(),
    };
    if let Some(url) = matches.get_one::<String>("api-url") {
        config = config.api_base_url(url.as_str());
    }
    if let Some(secs) = matches.get_one::<u64>("timeout") {
        config = config.timeout_secs(*secs);
    }

    let source = matches
        .get_one::<String>("source")
        .ok_or("missing source")?;
    let destination = matches
        .get_one::<String>("destination")
        .ok_or("missing destination")?;
    let token = matches.get_one::<String>("token").ok_or("missing token")?;
    let shard = matches.get_one::<String>("shard").ok_or("missing shard")?;

    let client = CloudClient::new(config)?
        .with_auth_token(token.as_str())
        .with_shard(ShardEndpoint::new(shard.as_str()));

    let (tx, mut rx) = mpsc::channel::<UploadProgress>(32);
    let printer = tokio::spawn(async move {
        let mut last_percent = None;
        while let Some(progress) = rx.recv().await {
            let percent = (progress.percentage * 100.0) as u32;
            if last_percent != Some(percent) {
                println!(
                    "Upload progress: {} / {} ({}%)",
                    ByteSize(progress.bytes_uploaded),
                    ByteSize(progress.total_bytes),
                    percent
                );
                last_percent = Some(percent);
            }
        }
    });

    let request = UploadRequest::new(source.as_str(), destination.as_str()).progress(tx);
    let result = upload_file(&client, request).await;
    let _ = printer.await;

    let result = result?;
    println!(
        "Uploaded: {} hash={} size={} ({} ms)",
        result.destination,
        result.hash,
        ByteSize(result.size),
        result.duration_ms
    );

    Ok(())
}

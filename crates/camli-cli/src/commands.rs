use anyhow::{bail, Context};
use camli_protocol::BasicCredentials;
use camli_server::{CamliServer, ServerConfig};
use camli_store::{check_store, StorageLayout};
use camli_types::BlobRef;
use colored::Colorize;

use crate::cli::*;
use crate::client::{hash_file, LocalBlob, UploadClient};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Upload(args) => cmd_upload(args).await,
        Command::Blobref(args) => cmd_blobref(args),
        Command::Fsck(args) => cmd_fsck(args),
    }
}

/// Layer flags and environment over the optional config file.
pub fn server_config(args: ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_toml_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(root) = args.root {
        config.storage_root = root;
    }
    if args.allow_anonymous_preupload {
        config.allow_anonymous_preupload = true;
    }
    if args.no_stealth {
        config.stealth = false;
    }
    Ok(config.with_secret(args.password))
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = server_config(args)?;
    println!(
        "camli serving on {} (root: {})",
        config.listen.to_string().bold(),
        config.storage_root.display()
    );
    let server = CamliServer::new(config)?;
    server.serve().await?;
    Ok(())
}

async fn cmd_upload(args: UploadArgs) -> anyhow::Result<()> {
    let locals = args
        .files
        .iter()
        .map(|path| hash_file(path))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let refs: Vec<BlobRef> = locals.iter().map(|l| l.blob.clone()).collect();

    let auth = BasicCredentials::new(args.user, args.password);
    let client = UploadClient::new(&args.server, auth);
    let negotiated = client
        .preupload(&refs)
        .await
        .with_context(|| format!("preupload to {}", client.server()))?;

    let (present, missing): (Vec<&LocalBlob>, Vec<&LocalBlob>) = locals
        .iter()
        .partition(|l| negotiated.size_of(&l.blob).is_some());
    for local in &present {
        println!(
            "  {} {} {}",
            "have".dimmed(),
            local.blob.to_string().cyan(),
            local.path.display()
        );
    }
    if missing.is_empty() {
        println!("{} Nothing to upload.", "✓".green().bold());
        return Ok(());
    }

    let missing: Vec<LocalBlob> = missing.into_iter().cloned().collect();
    let summary = client.upload(&negotiated.upload_url, &missing).await?;
    tracing::debug!(%summary, "upload response");

    let verified = client.preupload(&refs).await?;
    let mut failed = 0;
    for local in &missing {
        if verified.size_of(&local.blob) == Some(local.size) {
            println!(
                "  {} {} {}",
                "sent".green(),
                local.blob.to_string().cyan(),
                local.path.display()
            );
        } else {
            failed += 1;
            println!(
                "  {} {} {}",
                "FAIL".red().bold(),
                local.blob.to_string().cyan(),
                local.path.display()
            );
        }
    }
    if failed > 0 {
        bail!("{failed} of {} blobs were not stored", missing.len());
    }
    println!("{} Uploaded {} blobs.", "✓".green().bold(), missing.len());
    Ok(())
}

fn cmd_blobref(args: BlobrefArgs) -> anyhow::Result<()> {
    for path in &args.files {
        let local = hash_file(path)?;
        println!("{}  {}", local.blob, path.display());
    }
    Ok(())
}

fn cmd_fsck(args: FsckArgs) -> anyhow::Result<()> {
    let layout = StorageLayout::open(&args.root)?;
    let report = check_store(&layout)?;

    for corrupt in &report.corrupt {
        println!(
            "  {} {} hashes to {}",
            "corrupt".red().bold(),
            corrupt.path.display(),
            corrupt.actual
        );
    }
    for path in &report.misplaced {
        println!("  {} {}", "misplaced".yellow(), path.display());
    }
    for path in &report.scratch_files {
        println!("  {} {}", "scratch".dimmed(), path.display());
    }
    for path in &report.unrecognized {
        println!("  {} {}", "unknown".dimmed(), path.display());
    }
    println!(
        "Checked {} blobs ({} bytes).",
        report.blobs_checked.to_string().bold(),
        report.bytes_checked
    );

    if !report.is_clean() {
        bail!(
            "{} corrupt and {} misplaced blobs",
            report.corrupt.len(),
            report.misplaced.len()
        );
    }
    println!("{} No issues.", "✓".green().bold());
    Ok(())
}

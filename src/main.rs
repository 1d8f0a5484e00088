use certbot::{BotConfig, CertificateRenderer, CertificateRequest, Cli, Commands, Result};
use clap::Parser;
use log::{error, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Logging einmalig initialisieren, RUST_LOG hat Vorrang
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .init();

    match cli.command {
        Commands::Run {
            template,
            output_dir,
        } => {
            let config = BotConfig::from_env()?.with_overrides(template, output_dir);
            certbot::bot::run(config).await?;
        }

        Commands::Fill {
            template,
            output,
            name,
            id_number,
        } => {
            info!("Filling single certificate");
            let request = CertificateRequest::new(name, id_number);
            certbot::pdf::render(&request, &template, &output)?;
            println!("✓ Certificate created: {}", output.display());
        }

        Commands::Batch {
            template,
            json,
            output_dir,
        } => {
            info!("Starting batch processing");
            let count = fill_batch(&template, &json, &output_dir)?;
            println!("✓ Created {} certificates in {}", count, output_dir.display());
        }
    }

    Ok(())
}

fn fill_batch(template: &Path, json_path: &Path, output_dir: &Path) -> Result<usize> {
    let renderer = CertificateRenderer::open(template)?;
    let requests = CertificateRequest::batch_from_json_file(json_path)?;

    let batch = batch_entries(requests);

    let created: Vec<PathBuf> = renderer.batch_render(output_dir, &batch)?;
    for (idx, path) in created.iter().enumerate() {
        info!("Created [{}] -> {}", idx, path.display());
    }

    Ok(created.len())
}

/// Dateinamen `<name>_<id>.pdf`; doppelte Namen bekommen den Index angehängt
fn batch_entries(requests: Vec<CertificateRequest>) -> Vec<(String, CertificateRequest)> {
    let mut used = HashSet::new();

    requests
        .into_iter()
        .enumerate()
        .map(|(idx, request)| {
            let base = format!(
                "{}_{}",
                sanitize_filename(&request.name),
                sanitize_filename(&request.id_number)
            );
            let mut filename = format!("{}.pdf", base);
            if !used.insert(filename.clone()) {
                let renamed = format!("{}_{}.pdf", base, idx);
                warn!("[{}] {} already used, writing {} instead", idx, filename, renamed);
                used.insert(renamed.clone());
                filename = renamed;
            }
            (filename, request)
        })
        .collect()
}

fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            'ä' => 'a',
            'ö' => 'o',
            'ü' => 'u',
            'ß' => 's',
            _ => '_',
        })
        .collect()
}

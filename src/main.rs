mod cli;

use pixelstore::{
    config,
    server,
    storage::{ImageStorage, LocalImageStorage, ReadOptions, UploadedImage},
};
use pixelstore_common::i18n;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::io::Write;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "pixelstore=trace,pixelstore_codec=trace,pixelstore_common=debug,tower_http=debug"
                .to_string()
        } else {
            "pixelstore=info,pixelstore_codec=info,tower_http=info".to_string()
        }
    });

    // Logs go to stderr so `read` can stream image bytes on stdout
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = load(cli.config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config::validate_config(&config)?;

            tracing::info!("Starting pixelstore server");
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(server::start_server(config))
        }
        Commands::Save { file, target_dir } => {
            save_file(&file, target_dir.as_deref(), cli.config.as_deref())
        }
        Commands::Read { path, output } => read_image(&path, output.as_deref(), cli.config.as_deref()),
        Commands::Exists { name, target_dir } => {
            image_exists(&name, target_dir.as_deref(), cli.config.as_deref())
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("pixelstore {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Load configuration and select the message locale.
fn load(config_path: Option<&Path>) -> Result<config::Config> {
    let config = config::load_config_or_default(config_path)?;
    i18n::set_locale(config.storage.locale);
    Ok(config)
}

fn open_storage(config_path: Option<&Path>) -> Result<LocalImageStorage> {
    let config = load(config_path)?;
    Ok(LocalImageStorage::from_config(
        &config.storage,
        &config.compression,
    ))
}

fn save_file(file: &Path, target_dir: Option<&Path>, config_path: Option<&Path>) -> Result<()> {
    if !file.is_file() {
        anyhow::bail!("Input file does not exist: {:?}", file);
    }

    let storage = open_storage(config_path)?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("Input path has no file name")?;
    let image = UploadedImage::new(file, name);

    let stages = storage.pipeline().stage_names();
    if stages.is_empty() {
        tracing::info!("No compression stages active; storing original bytes");
    } else {
        tracing::info!("Compression stages: {}", stages.join(", "));
    }

    let rt = tokio::runtime::Runtime::new()?;
    let url = rt.block_on(storage.save(&image, target_dir))?;

    println!("{}", url);
    Ok(())
}

fn read_image(path: &str, output: Option<&Path>, config_path: Option<&Path>) -> Result<()> {
    let storage = open_storage(config_path)?;

    let rt = tokio::runtime::Runtime::new()?;
    let data = rt.block_on(storage.read(&ReadOptions::new(path)))?;

    match output {
        Some(out) => {
            std::fs::write(out, &data)
                .with_context(|| format!("Failed to write output file: {:?}", out))?;
            tracing::info!("Wrote {} bytes to {:?}", data.len(), out);
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

fn image_exists(name: &str, target_dir: Option<&Path>, config_path: Option<&Path>) -> Result<()> {
    let storage = open_storage(config_path)?;

    let rt = tokio::runtime::Runtime::new()?;
    let exists = rt.block_on(storage.exists(name, target_dir));

    println!("{}", exists);
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;

    println!("Checking external codec tools...\n");

    let tools = pixelstore_codec::check_tools(&config.compression);
    let mut active_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            if tool.active {
                active_ok = false;
            }
            "✗"
        };

        print!("{} {} ({})", status, tool.stage, tool.name);

        if let Some(ref version) = tool.version {
            print!(" {}", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        if tool.active {
            print!(" [active]");
        }

        println!();
    }

    println!();
    if active_ok {
        println!("All tools for active stages are available!");
    } else {
        println!("Some active stages are missing their tool; those images are stored uncompressed.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Storage root: {}", config.storage.root.display());
            println!("  Image URL prefix: {}", config.storage.url_layout().mount_path());
            println!("  Locale: {}", config.storage.locale.as_str());
            let stages = config.compression.active_stages();
            println!("  Compression stages: {}", stages.len());
            for stage in stages {
                println!("    {}", stage);
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Storage root: {}", config.storage.root.display());
        }
    }

    Ok(())
}

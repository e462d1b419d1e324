//! Check every image in the local image store by exporting it.

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use log::{debug, warn};

use image_audit::{
    audit,
    config::{DaemonConfig, DEFAULT_CONFIG_PATH},
    process::{ProcessRunner, SaveCheck, DEFAULT_CHECKER},
    repository, AuditResult, Result,
};

/// image-audit
#[derive(Debug, Parser)]
#[clap(name = "image-audit", version)]
pub struct App {
    /// Daemon configuration file
    #[clap(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Program used to export images, run as `<checker> save <reference>`
    #[clap(long, default_value = DEFAULT_CHECKER)]
    checker: String,
}

fn run(args: &App) -> Result<AuditResult> {
    let config = DaemonConfig::load(&args.config)?;
    config.validate()?;

    println!(
        "Daemon config: graph: {}, storage-driver: {}, insecure-registries: {}",
        config.store_root.display(),
        config.storage_driver,
        config.insecure_registries.join(",")
    );

    let index = match repository::locate(&config.store_root, &config.storage_driver)? {
        Some((path, index)) => {
            println!(
                "Successfully deserialized repositories.json file: {}",
                path.display()
            );
            debug!("{} image entries in {path:?}", index.entry_count());
            index
        }
        None => Default::default(),
    };

    let mut checker = SaveCheck::new(ProcessRunner, &args.checker);
    let result = audit(&index, &config.insecure_registries, &mut checker)?;

    println!("{result}");

    Ok(result)
}

fn main() -> ExitCode {
    env_logger::init();

    let args = App::parse();

    if !rustix::process::getuid().is_root() {
        warn!("not running as root; the image store may not be readable");
    }

    match run(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            let mut message = format!("error: {err}");
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                message.push_str(&format!(": {cause}"));
                source = cause.source();
            }
            eprintln!("{message}");
            ExitCode::from(err.exit_code())
        }
    }
}

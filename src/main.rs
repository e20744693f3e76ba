use anyhow::{Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use simplelog::{CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, WriteLogger};
use std::fs::File;
use yearsort::yearsort_core::cli::organize_options;
use yearsort::yearsort_core::{
    AssetRef, Cli, Commands, LocalBackend, MetadataProbe, Organizer, Resolver,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize loggers
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Warn,
        Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )];

    if cli.log {
        loggers.push(WriteLogger::new(
            cli.log_level,
            Config::default(),
            File::create("yearsort.log")?,
        ));
    }

    CombinedLogger::init(loggers)?;

    match cli.command {
        Commands::Organize {
            root,
            dest_name,
            on_duplicate,
            jobs,
            dry_run,
            json,
            probe,
        } => {
            let probe = probe.probe().map(|p| Box::new(p) as Box<dyn MetadataProbe>);
            let resolver = Resolver::standard(probe);
            let options = organize_options(dest_name, on_duplicate, jobs, dry_run);
            let organizer = Organizer::new(&LocalBackend, &resolver, options);

            let bar_style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?;
            let bar = if json {
                ProgressBar::hidden()
            } else {
                ProgressBar::new(0).with_style(bar_style)
            };

            let result = organizer.organize(&root, |event| {
                bar.set_length(event.total as u64);
                bar.set_position(event.processed as u64);
                bar.set_message(format!("{} ({})", event.current, event.origin));
            });
            bar.finish_and_clear();

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                if result.dry_run {
                    println!("[DRY RUN]");
                }
                println!("{}", result);
            }

            if !result.success {
                bail!("{}", result.message);
            }
        }

        Commands::Inspect { files, probe } => {
            let probe = probe.probe().map(|p| Box::new(p) as Box<dyn MetadataProbe>);
            let resolver = Resolver::standard(probe);

            for path in files {
                let asset = AssetRef {
                    name: path
                        .file_name()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .to_string(),
                    source: path.clone(),
                    origin: String::new(),
                };
                let resolution = resolver.resolve(&LocalBackend, &asset);
                println!(
                    "{}\t{}\t{}",
                    path.display(),
                    resolution.year,
                    resolution.source
                );
            }
        }
    }

    Ok(())
}

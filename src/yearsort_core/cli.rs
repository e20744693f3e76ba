use crate::yearsort_core::organize::{DEFAULT_DESTINATION_NAME, OrganizeOptions};
use crate::yearsort_core::probe::{DEFAULT_PROBE_TIMEOUT, ExifToolProbe};
use crate::yearsort_core::storage::DuplicatePolicy;
use clap::{Args, Parser, Subcommand};
use simplelog::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Copy photos into one folder per capture year")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable file logging to yearsort.log
    #[arg(long = "log", global = true)]
    pub log: bool,

    /// Log level for file logging (debug, info, warn, error)
    #[arg(long, default_value_t = LevelFilter::Debug, global = true)]
    pub log_level: LevelFilter,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Organize every photo under a folder into "<root>/<dest-name>/<year>/".
    ///
    /// Photos are copied, never moved. A photo whose name already exists in
    /// its year folder is reported as a duplicate and left alone unless
    /// --on-duplicate rename is given.
    Organize {
        /// Folder to scan recursively
        #[arg(required = true)]
        root: PathBuf,

        /// Name of the destination folder created under the root
        #[arg(long, default_value = DEFAULT_DESTINATION_NAME)]
        dest_name: String,

        /// How to treat a name that already exists in the year folder
        #[arg(long, value_enum)]
        on_duplicate: Option<DuplicatePolicy>,

        /// Workers used to resolve capture years (0 = one per CPU)
        #[arg(long, default_value_t = 1)]
        jobs: usize,

        /// Show what would be organized without making changes
        #[arg(long)]
        dry_run: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        probe: ProbeArgs,
    },

    /// Show the capture year chosen for individual files
    Inspect {
        /// Files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        probe: ProbeArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// Do not ask exiftool for capture dates
    #[arg(long)]
    pub no_probe: bool,

    /// exiftool executable to use
    #[arg(long, default_value = "exiftool")]
    pub exiftool: PathBuf,

    /// Seconds to wait for exiftool per file
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT.as_secs())]
    pub probe_timeout: u64,
}

impl ProbeArgs {
    /// The configured probe, if enabled and installed.
    pub fn probe(&self) -> Option<ExifToolProbe> {
        if self.no_probe {
            return None;
        }
        ExifToolProbe::detect(&self.exiftool, Duration::from_secs(self.probe_timeout))
    }
}

/// Build organizer options from command line values.
pub fn organize_options(
    dest_name: String,
    on_duplicate: Option<DuplicatePolicy>,
    jobs: usize,
    dry_run: bool,
) -> OrganizeOptions {
    let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
    OrganizeOptions {
        destination_name: dest_name,
        duplicate_policy: on_duplicate,
        jobs,
        dry_run,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_organize_defaults() {
        let cli = Cli::try_parse_from(["yearsort", "organize", "/photos"]).unwrap();
        match cli.command {
            Commands::Organize {
                root,
                dest_name,
                on_duplicate,
                jobs,
                dry_run,
                probe,
                ..
            } => {
                assert_eq!(root, PathBuf::from("/photos"));
                assert_eq!(dest_name, "Organized photo");
                assert_eq!(on_duplicate, None);
                assert_eq!(jobs, 1);
                assert!(!dry_run);
                assert!(!probe.no_probe);
                assert_eq!(probe.probe_timeout, 10);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_duplicate_policy() {
        let cli = Cli::try_parse_from([
            "yearsort",
            "organize",
            "/photos",
            "--on-duplicate",
            "rename",
            "--no-probe",
        ])
        .unwrap();
        let Commands::Organize { on_duplicate, probe, .. } = cli.command else {
            panic!("expected organize");
        };
        assert_eq!(on_duplicate, Some(DuplicatePolicy::Rename));
        assert!(probe.probe().is_none());
    }

    #[test]
    fn test_zero_jobs_means_all_cpus() {
        let options = organize_options("Out".to_string(), None, 0, false);
        assert_eq!(options.jobs, num_cpus::get());
        assert_eq!(options.destination_name, "Out");
    }
}

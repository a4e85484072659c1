use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "datafetch")]
#[command(version)]
#[command(about = "Download a zipped dataset, extract it safely and print its tables", long_about = None)]
#[command(after_help = "Examples:\n  \
  datafetch https://example.com/data.zip -d data          download and extract into ./data\n  \
  datafetch data.zip -d data -t '*.csv' -n 10           print the first 10 rows of the first CSV\n  \
  datafetch data.zip -d data -l -q                      only list the extracted paths")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR", default_value = ".")]
    pub extract_dir: PathBuf,

    /// Where to save a downloaded archive (default: last URL segment)
    #[arg(long, value_name = "PATH")]
    pub archive: Option<PathBuf>,

    /// List extracted paths
    #[arg(short = 'l')]
    pub list: bool,

    /// Extracted file to print as a table (name or glob)
    #[arg(short = 't', long = "table", value_name = "FILE")]
    pub table: Option<String>,

    /// Print at most N rows
    #[arg(short = 'n', value_name = "N")]
    pub rows: Option<usize>,

    /// Field delimiter for the table
    #[arg(long, value_name = "CHAR", default_value_t = ',')]
    pub delimiter: char,

    /// Allow rows with differing field counts
    #[arg(long)]
    pub flexible: bool,

    /// Verbose logging
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Local path for a downloaded archive
    pub fn archive_path(&self) -> PathBuf {
        if let Some(path) = &self.archive {
            return path.clone();
        }
        let url = self.source.split(['?', '#']).next().unwrap_or_default();
        let url = url.split_once("://").map_or(url, |(_, rest)| rest);
        let name = url
            .split_once('/')
            .and_then(|(_, path)| path.rsplit('/').next())
            .filter(|segment| !segment.is_empty())
            .unwrap_or("download.zip");
        PathBuf::from(name)
    }

    /// Default log filter when `RUST_LOG` is not set
    pub fn log_level(&self) -> &'static str {
        if self.is_very_quiet() {
            "error"
        } else if self.is_quiet() {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

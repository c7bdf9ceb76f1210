use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "medscan-server")]
#[command(about = "Detects the medicine name on an uploaded package photo")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "MEDSCAN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "MEDSCAN_PORT", default_value = "5000")]
    pub port: u16,

    /// Language for OCR (e.g., "eng", "deu", "fra")
    #[arg(long, env = "MEDSCAN_LANGUAGE", default_value = "eng")]
    pub language: String,

    /// Maximum upload size in bytes (default: 50MB)
    #[arg(long, env = "MEDSCAN_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Path to tessdata directory (downloaded on first use if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Segment and OCR the raw upload without running the preprocessing
    /// pipeline first
    #[arg(long, env = "MEDSCAN_NO_PREPROCESS")]
    pub no_preprocess: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub language: String,
    pub max_file_size: usize,
    pub tessdata_path: Option<String>,
    pub preprocess: bool,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            language: args.language,
            max_file_size: args.max_file_size,
            tessdata_path: args.tessdata_path,
            preprocess: !args.no_preprocess,
        }
    }
}

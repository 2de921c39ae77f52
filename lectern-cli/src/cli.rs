use clap::Parser;
use lectern_engine::ProviderKind;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Headless lesson video playback",
    long_about = "Plays one lesson video against a simulated media surface.\n\
                  \n\
                  The engine picks a delivery backend for the URL, prints the unified\n\
                  playback events as they happen and records watch progress either to\n\
                  the log or to an HTTP progress endpoint."
)]
pub struct CliArgs {
    /// Lesson video URL (media file, manifest or packaged stream)
    #[arg(required = true, help = "URL of the lesson video")]
    pub url: String,

    /// Delivery backend
    #[arg(
        short,
        long,
        help = "Provider: packaged, hls or file (default: detected from the URL)"
    )]
    pub provider: Option<ProviderKind>,

    /// Lesson identifier used for progress records
    #[arg(short, long, default_value = "cli-lesson", help = "Lesson id to record progress under")]
    pub lesson: String,

    /// Playback id for the packaged component
    #[arg(long, help = "Playback id, required by the packaged provider")]
    pub playback_id: Option<String>,

    /// Resume position in seconds
    #[arg(short = 's', long, help = "Position in seconds to resume playback from")]
    pub start_time: Option<f64>,

    /// Simulated media duration in seconds
    #[arg(
        short,
        long,
        default_value = "60",
        help = "Duration in seconds reported by the simulated media"
    )]
    pub duration: f64,

    /// Simulated playback speed
    #[arg(
        long,
        default_value = "1.0",
        help = "Playback speed multiplier of the simulated clock"
    )]
    pub speed: f64,

    /// Connection type hint
    #[arg(
        short,
        long,
        help = "Connection type used for the quality recommendation (4g, 3g, 2g, ...)"
    )]
    pub connection: Option<String>,

    /// Progress endpoint
    #[arg(long, help = "POST progress updates to this URL instead of logging them")]
    pub progress_endpoint: Option<String>,

    /// Simulate an element that plays manifests natively
    #[arg(long, help = "Simulated element can play manifests without a streaming library")]
    pub native_hls: bool,

    /// Disable media-source extensions
    #[arg(long, help = "Report library-driven adaptive streaming as unavailable")]
    pub no_mse: bool,

    /// Overall timeout in seconds for the entire HTTP request
    #[arg(
        long,
        default_value = "30",
        help = "Overall timeout in seconds for HTTP requests (0 = no timeout)"
    )]
    pub timeout: u64,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,
}

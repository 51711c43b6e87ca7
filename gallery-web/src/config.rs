use clap::Parser;

/// Gateway configuration, from flags with environment fallbacks.
#[derive(Parser, Debug, Clone)]
#[command(name = "gallery-web")]
#[command(about = "Media gallery gateway over an S3 bucket", long_about = None)]
pub struct WebConfig {
    /// S3 bucket name
    #[arg(long, env = "GALLERY_BUCKET")]
    pub bucket: String,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Comma-separated access codes
    #[arg(long, env = "ACCESS_CODES", default_value = "", hide_env_values = true)]
    pub access_codes: String,

    /// Prefix for absolute media URLs, e.g. https://gallery.example.com
    #[arg(long, env = "BASE_URI", default_value = "")]
    pub base_uri: String,

    /// Comma-separated allowed CORS origins (any origin when empty)
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Leave video files out of galleries
    #[arg(long, env = "GALLERY_NO_VIDEO")]
    pub no_video: bool,

    /// YouTube Data API key; enables playlist enrichment together with the channel id
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    pub youtube_api_key: Option<String>,

    /// Channel whose playlists are matched against gallery names
    #[arg(long, env = "YOUTUBE_CHANNEL_ID")]
    pub youtube_channel_id: Option<String>,
}

impl WebConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Both YouTube settings, when configured.
    pub fn youtube(&self) -> Option<(String, String)> {
        match (&self.youtube_api_key, &self.youtube_channel_id) {
            (Some(key), Some(channel)) if !key.is_empty() && !channel.is_empty() => {
                Some((key.clone(), channel.clone()))
            }
            _ => None,
        }
    }
}

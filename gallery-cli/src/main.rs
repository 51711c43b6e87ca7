mod commands;
mod image_processor;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gallery")]
#[command(about = "Media gallery CLI tool for S3 bucket management", long_about = None)]
struct Cli {
    /// S3 bucket name
    #[arg(short, long, env = "GALLERY_BUCKET", global = true)]
    bucket: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload media files into a gallery folder
    Upload {
        /// Directories or files to upload
        #[arg(required = true)]
        paths: Vec<String>,

        /// Folder (gallery) name
        #[arg(short, long)]
        folder: String,
    },

    /// Delete a gallery folder and everything under it
    Delete {
        /// Folder name to delete
        folder: String,
    },

    /// Print the folder list as JSON
    Folders,

    /// Print the gallery entries of a folder as JSON
    Items {
        /// Folder name
        media: String,

        /// Prefix for absolute media URLs
        #[arg(long, env = "BASE_URI", default_value = "")]
        base_uri: String,

        /// Access token appended to media links
        #[arg(long)]
        token: Option<String>,

        /// Comma-separated access codes the token is checked against
        #[arg(long, env = "ACCESS_CODES", default_value = "", hide_env_values = true)]
        access_codes: String,

        /// Leave video files out
        #[arg(long)]
        no_video: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gallery_cli=info".into()),
        )
        // stdout is reserved for command output
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(bucket) = cli.bucket else {
        anyhow::bail!("A bucket is required: pass --bucket or set GALLERY_BUCKET");
    };

    match cli.command {
        Commands::Upload { paths, folder } => {
            commands::upload::execute(paths, folder, bucket).await?;
        }
        Commands::Delete { folder } => {
            commands::delete::execute(folder, bucket).await?;
        }
        Commands::Folders => {
            commands::list::folders(bucket).await?;
        }
        Commands::Items {
            media,
            base_uri,
            token,
            access_codes,
            no_video,
        } => {
            commands::list::items(bucket, media, base_uri, token, access_codes, no_video).await?;
        }
    }

    Ok(())
}

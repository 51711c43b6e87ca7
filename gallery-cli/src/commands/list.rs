use anyhow::{Context, Result};
use gallery_core::{listing, AccessGate, ListingOptions, MediaLinks, S3Client};

/// Print the folder summaries the gateway would serve.
pub async fn folders(bucket: String) -> Result<()> {
    let s3 = S3Client::new(bucket).await?;

    let folders = listing::load_folders(&s3).await?;
    tracing::info!("Found {} folders", folders.len());

    println!("{}", serde_json::to_string_pretty(&folders)?);
    Ok(())
}

/// Print the gallery entries of one folder, without playlist enrichment.
pub async fn items(
    bucket: String,
    media: String,
    base_uri: String,
    token: Option<String>,
    access_codes: String,
    no_video: bool,
) -> Result<()> {
    let mut links = MediaLinks::new(base_uri);
    if let Some(code) = token {
        let gate = AccessGate::from_csv(&access_codes);
        let token = gate
            .issue(&code)
            .context("Token is not in ACCESS_CODES; links would be rejected")?;
        links = links.with_token(token);
    }

    let s3 = S3Client::new(bucket).await?;
    let options = ListingOptions {
        include_video: !no_video,
    };

    let entries = listing::load_gallery(&s3, None, &media, &links, options).await?;
    tracing::info!("Gallery {} has {} entries", media, entries.len());

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

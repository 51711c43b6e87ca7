use anyhow::Result;
use gallery_core::S3Client;

pub async fn execute(folder: String, bucket: String) -> Result<()> {
    tracing::info!("Deleting folder: {}", folder);

    // Initialize S3 client
    let s3 = S3Client::new(bucket).await?;

    // Only folders with a marker are listed by the gateway
    let marker_key = format!("{folder}/");
    if !s3.object_exists(&marker_key).await? {
        anyhow::bail!("Folder not found: {folder}");
    }

    tracing::info!("Deleting all folder files...");
    let deleted = s3.delete_prefix(&marker_key).await?;

    println!("✓ Folder deleted successfully: {folder} ({deleted} objects)");

    Ok(())
}

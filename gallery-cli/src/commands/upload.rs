use anyhow::Result;
use gallery_core::object::{FileKind, ObjectKey};
use gallery_core::S3Client;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::image_processor::{create_cover, file_kind, is_image_file, is_media_file};

pub async fn execute(paths: Vec<String>, folder: String, bucket: String) -> Result<()> {
    validate_folder_name(&folder)?;

    let files = collect_upload_paths(paths, &folder)?;

    if files.is_empty() {
        anyhow::bail!("No media files found in the provided paths");
    }

    check_unique_filenames(&files)?;

    // Initialize S3 client
    let s3 = S3Client::new(bucket).await?;

    println!("Folder: {}", folder);
    println!("Bucket: {}", s3.bucket());
    println!("Files: {}\n", files.len());

    let upload_pb = ProgressBar::new(files.len() as u64);
    upload_pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.green/blue} {pos}/{len} {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░ "),
    );
    upload_pb.set_message("Uploading to S3...");

    let mut upload_tasks = Vec::new();

    for path in files.iter().cloned() {
        let s3_clone = s3.clone();
        let pb_clone = upload_pb.clone();
        let filename = file_name(&path);
        let key = format!("{folder}/{filename}");

        // Spawn concurrent upload task
        let task = tokio::spawn(async move {
            let result = s3_clone.upload_file(&path, &key).await;
            pb_clone.inc(1);
            pb_clone.set_message(format!("Uploaded: {}", filename));
            result
        });

        upload_tasks.push(task);
    }

    for task in upload_tasks {
        task.await??;
    }

    upload_pb.finish_with_message("All files uploaded");
    println!();

    // Zero-size marker that makes the folder show up in listings
    s3.upload_bytes(Vec::new(), &format!("{folder}/")).await?;

    // Covers from earlier uploads count too, not just this batch.
    let existing = s3.keys_with_prefix(&format!("{folder}/")).await?;

    if has_cover(&existing, &folder) {
        println!("✓ Folder already has a cover image");
    } else if let Some(source) = files.iter().find(|p| is_image_file(p)).cloned() {
        let cover = tokio::task::spawn_blocking(move || create_cover(&source)).await??;
        s3.upload_bytes(cover, &format!("{folder}/{folder}.jpg")).await?;
        println!("✓ Generated cover {folder}/{folder}.jpg");
    } else {
        tracing::warn!("No image to build a cover from; {} will be listed without one", folder);
    }

    println!("✓ Folder complete: {}", folder);
    Ok(())
}

fn validate_folder_name(folder: &str) -> Result<()> {
    if folder.is_empty() || folder.contains('/') {
        anyhow::bail!("Folder name must be non-empty and contain no '/': {folder:?}");
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// `<folder>/<folder>.<ext>` in the bucket is the folder's representative.
fn has_cover(keys: &[String], folder: &str) -> bool {
    keys.iter()
        .filter_map(|key| ObjectKey::parse(key))
        .any(|key| {
            key.folder == folder && key.stem == folder && key.kind() != Some(FileKind::Metadata)
        })
}

fn check_unique_filenames(files: &[PathBuf]) -> Result<()> {
    let mut seen = HashSet::new();
    for path in files {
        let name = file_name(path);
        if !seen.insert(name.clone()) {
            anyhow::bail!("Two files would upload to the same key: {name}");
        }
    }
    Ok(())
}

/// Media files plus the folder's own `<folder>.json` metadata document.
fn is_uploadable(path: &Path, folder: &str) -> bool {
    is_media_file(path)
        || (file_kind(path) == Some(FileKind::Metadata) && stem(path) == folder)
}

fn collect_upload_paths(paths: Vec<String>, folder: &str) -> Result<Vec<PathBuf>> {
    let mut upload_paths = Vec::new();

    for path_str in paths {
        let path = Path::new(&path_str);

        if !path.exists() {
            anyhow::bail!("Path does not exist: {}", path.display());
        }

        if path.is_file() {
            if is_uploadable(path, folder) {
                upload_paths.push(path.to_path_buf());
            }
        } else if path.is_dir() {
            // Walk directory and collect all media
            for entry in WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                if entry_path.is_file() && is_uploadable(entry_path, folder) {
                    upload_paths.push(entry_path.to_path_buf());
                }
            }
        }
    }

    // Sort for consistent ordering
    upload_paths.sort();

    Ok(upload_paths)
}

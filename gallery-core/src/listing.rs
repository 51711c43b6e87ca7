//! Turns a flat bucket listing into the folder and gallery views.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::access::AccessToken;
use crate::object::{guess_content_type, FileKind, MediaKind, ObjectEntry, ObjectKey};
use crate::playlist::{PlaylistEntry, PlaylistSource};
use crate::store::{ObjectStore, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSummary {
    pub folder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    pub src: String,
    #[serde(rename = "type")]
    pub mime: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub thumb: String,
    pub src: String,
    pub caption: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<VideoSource>>,
}

/// One element of a gallery response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GalleryEntry {
    Media(MediaItem),
    Playlist(PlaylistEntry),
    /// Passed through from `<media>/<media>.json` untouched.
    Metadata(serde_json::Value),
}

impl GalleryEntry {
    fn caption(&self) -> &str {
        match self {
            Self::Media(item) => &item.caption,
            Self::Playlist(entry) => &entry.caption,
            Self::Metadata(_) => "",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ListingOptions {
    pub include_video: bool,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self { include_video: true }
    }
}

/// Builds absolute links back into the gateway's object route.
#[derive(Debug, Clone)]
pub struct MediaLinks {
    base_uri: String,
    token: Option<AccessToken>,
}

impl MediaLinks {
    pub fn new(base_uri: impl Into<String>) -> Self {
        let base_uri: String = base_uri.into();
        Self {
            base_uri: base_uri.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: AccessToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn object_url(&self, folder: &str, filename: &str) -> String {
        let mut url = format!(
            "{}/api/{}/{}",
            self.base_uri,
            urlencoding::encode(folder),
            urlencoding::encode(filename)
        );
        if let Some(token) = &self.token {
            url.push_str("?token=");
            url.push_str(&urlencoding::encode(token.as_str()));
        }
        url
    }
}

pub fn metadata_key(media: &str) -> String {
    format!("{media}/{media}.json")
}

/// `Day_1+beach` becomes `Day 1 beach`.
pub fn caption_from_stem(stem: &str) -> String {
    stem.replace(['_', '+'], " ")
}

pub fn build_folder_summaries(objects: &[ObjectEntry]) -> Vec<FolderSummary> {
    let mut seen = HashSet::new();
    let folders: Vec<&str> = objects
        .iter()
        .filter_map(ObjectEntry::marker_folder)
        .filter(|folder| seen.insert(*folder))
        .collect();

    let mut representatives: HashMap<String, &str> = HashMap::new();
    for entry in objects.iter().filter(|o| !o.is_marker()) {
        let Some(key) = ObjectKey::parse(&entry.key) else {
            continue;
        };
        if key.kind() == Some(FileKind::Metadata) || key.folder != key.stem {
            continue;
        }
        representatives.entry(key.base()).or_insert(entry.key.as_str());
    }

    folders
        .into_iter()
        .map(|folder| FolderSummary {
            folder: folder.to_string(),
            image: representatives
                .get(&format!("{folder}/{folder}"))
                .map(|key| key.to_string()),
        })
        .collect()
}

pub fn build_gallery_items(
    media: &str,
    objects: &[ObjectEntry],
    metadata: Option<serde_json::Value>,
    links: &MediaLinks,
    options: ListingOptions,
) -> Vec<GalleryEntry> {
    let files: Vec<(ObjectKey, MediaKind)> = objects
        .iter()
        .filter(|o| !o.is_marker())
        .filter_map(|o| ObjectKey::parse(&o.key))
        .filter(|key| key.folder == media)
        .filter_map(|key| match key.kind() {
            Some(FileKind::Media(MediaKind::Video)) if !options.include_video => None,
            Some(FileKind::Media(kind)) => Some((key, kind)),
            _ => None,
        })
        .collect();

    // Companion thumbnails match on stem; the `.png` extension in any case.
    let pngs: HashMap<String, String> = files
        .iter()
        .filter(|(key, _)| {
            key.extension
                .as_deref()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .map(|(key, _)| (key.stem.clone(), key.filename.clone()))
        .collect();

    let companions: HashSet<&str> = files
        .iter()
        .filter(|(_, kind)| *kind == MediaKind::Video)
        .filter_map(|(key, _)| pngs.get(&key.stem).map(String::as_str))
        .collect();

    let mut entries: Vec<GalleryEntry> = files
        .iter()
        .filter(|(key, kind)| *kind == MediaKind::Video || !companions.contains(key.filename.as_str()))
        .map(|(key, kind)| {
            let thumb = match kind {
                MediaKind::Video => Some(
                    pngs.get(&key.stem)
                        .cloned()
                        .unwrap_or_else(|| format!("{}.png", key.stem)),
                ),
                MediaKind::Image => None,
            };
            GalleryEntry::Media(media_item(key, *kind, thumb.as_deref(), links))
        })
        .collect();

    sort_by_caption(&mut entries);

    match metadata {
        Some(doc) => {
            let mut out = metadata_entries(doc);
            out.extend(entries);
            out
        }
        None => entries,
    }
}

/// Adds playlist entries to a gallery, keeping metadata entries in front.
pub fn merge_playlist(entries: Vec<GalleryEntry>, playlist: Vec<PlaylistEntry>) -> Vec<GalleryEntry> {
    if playlist.is_empty() {
        return entries;
    }

    let (mut head, mut rest): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|entry| matches!(entry, GalleryEntry::Metadata(_)));

    rest.extend(playlist.into_iter().map(GalleryEntry::Playlist));
    sort_by_caption(&mut rest);

    head.extend(rest);
    head
}

/// `thumb` names the companion file of a video, in the same folder.
fn media_item(key: &ObjectKey, kind: MediaKind, thumb: Option<&str>, links: &MediaLinks) -> MediaItem {
    let src = links.object_url(&key.folder, &key.filename);
    let caption = caption_from_stem(&key.stem);

    match kind {
        MediaKind::Image => MediaItem {
            thumb: src.clone(),
            src,
            caption,
            kind,
            sources: None,
        },
        MediaKind::Video => MediaItem {
            thumb: links.object_url(&key.folder, thumb.unwrap_or(&key.filename)),
            sources: Some(vec![VideoSource {
                src: src.clone(),
                mime: guess_content_type(&key.filename).to_string(),
            }]),
            src,
            caption,
            kind,
        },
    }
}

fn sort_by_caption(entries: &mut [GalleryEntry]) {
    entries.sort_by_cached_key(|entry| entry.caption().to_lowercase());
}

fn metadata_entries(doc: serde_json::Value) -> Vec<GalleryEntry> {
    match doc {
        serde_json::Value::Array(items) => items.into_iter().map(GalleryEntry::Metadata).collect(),
        serde_json::Value::Null => Vec::new(),
        other => vec![GalleryEntry::Metadata(other)],
    }
}

pub async fn load_folders(store: &dyn ObjectStore) -> StoreResult<Vec<FolderSummary>> {
    let objects = store.list_objects().await?;
    Ok(build_folder_summaries(&objects))
}

/// One gallery request: listing, optional metadata document, optional
/// playlist, then the transform.
pub async fn load_gallery(
    store: &dyn ObjectStore,
    playlist: Option<&dyn PlaylistSource>,
    media: &str,
    links: &MediaLinks,
    options: ListingOptions,
) -> StoreResult<Vec<GalleryEntry>> {
    let objects = store.list_objects().await?;

    let meta_key = metadata_key(media);
    let metadata = if objects.iter().any(|o| o.key == meta_key && !o.is_marker()) {
        let stored = store.get_object(&meta_key).await?;
        match serde_json::from_slice(&stored.body) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!("Ignoring unreadable metadata {}: {}", meta_key, e);
                None
            }
        }
    } else {
        None
    };

    let entries = build_gallery_items(media, &objects, metadata, links, options);

    let videos = match playlist {
        Some(source) => source.fetch_playlist(media).await.unwrap_or_else(|e| {
            tracing::warn!("Playlist enrichment failed for {}: {:#}", media, e);
            Vec::new()
        }),
        None => Vec::new(),
    };

    Ok(merge_playlist(entries, videos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessGate;
    use crate::playlist::PlaylistKind;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;

    fn entry(key: &str, size: u64) -> ObjectEntry {
        ObjectEntry::new(key, size)
    }

    fn links() -> MediaLinks {
        MediaLinks::new("https://gallery.example/")
    }

    fn captions(entries: &[GalleryEntry]) -> Vec<&str> {
        entries.iter().map(GalleryEntry::caption).collect()
    }

    #[test]
    fn folder_with_representative() {
        let summaries = build_folder_summaries(&[entry("F/", 0), entry("F/F.jpg", 10)]);
        assert_eq!(
            summaries,
            vec![FolderSummary {
                folder: "F".into(),
                image: Some("F/F.jpg".into()),
            }]
        );
    }

    #[test]
    fn folder_without_representative_has_no_image() {
        let summaries = build_folder_summaries(&[
            entry("F/", 0),
            entry("F/other.jpg", 10),
            entry("F/F.json", 10),
            entry("G/F.jpg", 10),
        ]);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].image, None);
        assert_eq!(serde_json::to_value(&summaries[0]).unwrap(), json!({ "folder": "F" }));
    }

    #[test]
    fn folders_keep_listing_order_without_duplicates() {
        let summaries = build_folder_summaries(&[
            entry("b/", 0),
            entry("a/", 0),
            entry("b/sub/", 0),
            entry("a/a.png", 4),
            entry("loose/loose.jpg", 4),
        ]);
        let folders: Vec<_> = summaries.iter().map(|s| s.folder.as_str()).collect();
        assert_eq!(folders, vec!["b", "a"]);
        assert_eq!(summaries[1].image.as_deref(), Some("a/a.png"));
    }

    #[test]
    fn gallery_filters_extensions_and_video_thumbnails() {
        let objects = vec![
            entry("trip/", 0),
            entry("trip/beach.jpg", 5),
            entry("trip/notes.txt", 5),
            entry("trip/trip.json", 5),
            entry("trip/dive.mp4", 5),
            entry("trip/dive.png", 5),
            entry("other/beach.jpg", 5),
        ];

        let items = build_gallery_items("trip", &objects, None, &links(), ListingOptions::default());
        assert_eq!(captions(&items), vec!["beach", "dive"]);

        let GalleryEntry::Media(video) = &items[1] else {
            panic!("expected media item");
        };
        assert_eq!(video.kind, MediaKind::Video);
        assert_eq!(video.thumb, "https://gallery.example/api/trip/dive.png");
        assert_eq!(video.src, "https://gallery.example/api/trip/dive.mp4");
        assert_eq!(
            video.sources,
            Some(vec![VideoSource {
                src: video.src.clone(),
                mime: "video/mp4".into(),
            }])
        );
    }

    #[test]
    fn companion_png_matches_any_extension_case() {
        let objects = vec![entry("trip/dive.mp4", 5), entry("trip/dive.PNG", 5)];
        let items = build_gallery_items("trip", &objects, None, &links(), ListingOptions::default());

        assert_eq!(items.len(), 1);
        let GalleryEntry::Media(video) = &items[0] else {
            panic!("expected media item");
        };
        assert_eq!(video.kind, MediaKind::Video);
        assert_eq!(video.thumb, "https://gallery.example/api/trip/dive.PNG");
    }

    #[test]
    fn video_without_companion_points_at_conventional_png() {
        let objects = vec![entry("trip/dive.webm", 5)];
        let items = build_gallery_items("trip", &objects, None, &links(), ListingOptions::default());

        let GalleryEntry::Media(video) = &items[0] else {
            panic!("expected media item");
        };
        assert_eq!(video.thumb, "https://gallery.example/api/trip/dive.png");
        assert_eq!(video.sources.as_ref().unwrap()[0].mime, "video/webm");
    }

    #[test]
    fn videos_can_be_excluded() {
        let objects = vec![entry("trip/dive.mp4", 5), entry("trip/dive.png", 5)];
        let items = build_gallery_items(
            "trip",
            &objects,
            None,
            &links(),
            ListingOptions { include_video: false },
        );
        assert_eq!(captions(&items), vec!["dive"]);
        assert!(matches!(&items[0], GalleryEntry::Media(m) if m.kind == MediaKind::Image));
    }

    #[test]
    fn captions_sort_case_insensitively() {
        let objects = vec![
            entry("fruit/banana.jpg", 1),
            entry("fruit/Apple.jpg", 1),
            entry("fruit/cherry.jpg", 1),
        ];
        let items = build_gallery_items("fruit", &objects, None, &links(), ListingOptions::default());
        assert_eq!(captions(&items), vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn captions_replace_underscore_and_plus() {
        assert_eq!(caption_from_stem("Day_1+at+the_beach"), "Day 1 at the beach");
    }

    #[test]
    fn metadata_entries_come_first() {
        let objects = vec![entry("trip/b.jpg", 1), entry("trip/a.jpg", 1)];
        let doc = json!([{ "caption": "zzz", "src": "x" }, { "caption": "yyy" }]);
        let items = build_gallery_items("trip", &objects, Some(doc), &links(), ListingOptions::default());

        assert_eq!(items.len(), 4);
        assert_eq!(items[0], GalleryEntry::Metadata(json!({ "caption": "zzz", "src": "x" })));
        assert_eq!(items[1], GalleryEntry::Metadata(json!({ "caption": "yyy" })));
        assert_eq!(captions(&items[2..]), vec!["a", "b"]);
    }

    #[test]
    fn links_encode_segments_and_token() {
        let token = AccessGate::from_csv("s3cr t").issue("s3cr t").unwrap();
        let links = MediaLinks::new("http://h").with_token(token);
        assert_eq!(
            links.object_url("my trip", "a+b.jpg"),
            "http://h/api/my%20trip/a%2Bb.jpg?token=s3cr%20t"
        );
    }

    #[test]
    fn playlist_merges_into_caption_order() {
        let base = vec![
            GalleryEntry::Metadata(json!({ "caption": "meta" })),
            GalleryEntry::Media(MediaItem {
                thumb: "t".into(),
                src: "s".into(),
                caption: "beach".into(),
                kind: MediaKind::Image,
                sources: None,
            }),
        ];
        let playlist = vec![PlaylistEntry {
            kind: PlaylistKind::Youtube,
            id: "v1".into(),
            thumb: "yt".into(),
            caption: "Arrival".into(),
        }];

        let merged = merge_playlist(base, playlist);
        assert!(matches!(merged[0], GalleryEntry::Metadata(_)));
        assert_eq!(captions(&merged[1..]), vec!["Arrival", "beach"]);
    }

    struct FailingPlaylist;

    #[async_trait]
    impl PlaylistSource for FailingPlaylist {
        async fn fetch_playlist(&self, _name: &str) -> anyhow::Result<Vec<PlaylistEntry>> {
            anyhow::bail!("quota exceeded")
        }
    }

    #[tokio::test]
    async fn load_gallery_reads_metadata_and_survives_playlist_failure() {
        let store = MemoryStore::new()
            .with("trip/", Vec::<u8>::new())
            .with("trip/trip.json", br#"[{"caption":"intro"}]"#.to_vec())
            .with("trip/beach.jpg", vec![1u8]);

        let entries = load_gallery(
            &store,
            Some(&FailingPlaylist as &dyn PlaylistSource),
            "trip",
            &links(),
            ListingOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], GalleryEntry::Metadata(json!({ "caption": "intro" })));
        assert_eq!(entries[1].caption(), "beach");
    }

    #[tokio::test]
    async fn load_folders_uses_listing() {
        let store = MemoryStore::new()
            .with("trip/", Vec::<u8>::new())
            .with("trip/trip.jpg", vec![1u8]);

        let folders = load_folders(&store).await.unwrap();
        assert_eq!(folders[0].image.as_deref(), Some("trip/trip.jpg"));
    }
}

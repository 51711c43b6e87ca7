pub mod access;
pub mod listing;
pub mod object;
pub mod playlist;
pub mod s3;
pub mod store;

pub use access::{AccessDenied, AccessGate, AccessToken, Scope};
pub use listing::{
    build_folder_summaries, build_gallery_items, load_folders, load_gallery, FolderSummary,
    GalleryEntry, ListingOptions, MediaItem, MediaLinks,
};
pub use object::{MediaKind, ObjectEntry, ObjectKey};
pub use playlist::{PlaylistEntry, PlaylistSource, YoutubeClient};
pub use s3::S3Client;
pub use store::{MemoryStore, ObjectStore, StoreError, StoredObject};

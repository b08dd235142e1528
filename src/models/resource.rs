//! Owned resource models (comments, videos, playlists)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kinds of resource that carry an owner reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Comment,
    Video,
    Playlist,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Comment => "comment",
            ResourceKind::Video => "video",
            ResourceKind::Playlist => "playlist",
        };
        f.write_str(name)
    }
}

/// A persisted record owned by exactly one identity.
pub trait OwnedResource: Clone + Send + Sync + Serialize + 'static {
    const KIND: ResourceKind;
    /// Backing table
    const TABLE: &'static str;
    /// Name of the path parameter carrying this resource's id
    const ID_PARAM: &'static str;

    fn id(&self) -> Uuid;
    fn owner(&self) -> Uuid;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    #[serde(rename = "owner")]
    pub owner_id: Uuid,
    pub video_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    #[serde(rename = "owner")]
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: Uuid,
    #[serde(rename = "owner")]
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl OwnedResource for Comment {
    const KIND: ResourceKind = ResourceKind::Comment;
    const TABLE: &'static str = "comments";
    const ID_PARAM: &'static str = "comment_id";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.owner_id
    }
}

impl OwnedResource for Video {
    const KIND: ResourceKind = ResourceKind::Video;
    const TABLE: &'static str = "videos";
    const ID_PARAM: &'static str = "video_id";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.owner_id
    }
}

impl OwnedResource for Playlist {
    const KIND: ResourceKind = ResourceKind::Playlist;
    const TABLE: &'static str = "playlists";
    const ID_PARAM: &'static str = "playlist_id";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.owner_id
    }
}

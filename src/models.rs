use serde::{Deserialize, Serialize};

/// Track information imported from Discogs
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub position: String,
    pub title: String,
    pub duration: String,
}

/// Form data handed to the collection's create/update path.
///
/// Only the catalog fields are filled by an import; condition, notes and
/// purchase info stay with the owner. `cover_art_url` is set only after the
/// cover has been copied into our own storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VinylFormData {
    pub artist: String,
    pub album: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressing_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleeve_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_art_url: Option<String>,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discogs_id: Option<String>,
    #[serde(default)]
    pub tracklist: Vec<Track>,
}

/// Search result trimmed down for display in a result list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResultDisplay {
    pub id: u64,
    pub artist: String,
    pub album: String,
    pub year: Option<String>,
    pub label: Option<String>,
    pub catno: Option<String>,
    pub format: Option<String>,
    pub country: Option<String>,
    pub thumb: String,
    #[serde(rename = "coverImage")]
    pub cover_image: String,
}

/// Pagination summary exposed to the UI
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    pub page: u32,
    pub pages: u32,
    pub total: u32,
}

impl PageInfo {
    pub fn has_more(&self) -> bool {
        self.page < self.pages
    }
}

/// One page of display-ready search results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchPage {
    pub results: Vec<SearchResultDisplay>,
    pub pagination: PageInfo,
}

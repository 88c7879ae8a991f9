use serde::{Deserialize, Serialize};

/// Artist credit from Discogs
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscogsArtist {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub anv: String, // Artist name variation
    #[serde(default)]
    pub join: String,
    #[serde(default)]
    pub role: String,
}

/// Label credit, carrying the catalog number of this pressing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscogsLabel {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub catno: String,
}

/// Physical format entry, e.g. `{ name: "Vinyl", qty: "2", descriptions: ["LP", "Album"] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscogsFormat {
    pub name: String,
    #[serde(default)]
    pub qty: String, // Discogs sends the quantity as a string
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub descriptions: Vec<String>,
}

/// Tracklist entry. Headings and index tracks share this shape and are told apart by `type_`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscogsTrack {
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub type_: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration: String, // Duration as string from Discogs (e.g., "3:45")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscogsImage {
    #[serde(rename = "type")]
    pub image_type: String,
    pub uri: String,
    #[serde(default)]
    pub uri150: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Full release detail from `GET /releases/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscogsRelease {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub artists: Vec<DiscogsArtist>,
    #[serde(default)]
    pub artists_sort: Option<String>,
    #[serde(default)]
    pub labels: Vec<DiscogsLabel>,
    #[serde(default)]
    pub formats: Vec<DiscogsFormat>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub tracklist: Vec<DiscogsTrack>,
    #[serde(default)]
    pub images: Vec<DiscogsImage>,
    #[serde(default)]
    pub master_id: Option<u64>, // Reference to the master release
}

/// Individual result from `GET /database/search`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscogsSearchResult {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub result_type: String,
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub label: Vec<String>,
    #[serde(default)]
    pub catno: Option<String>,
    #[serde(default)]
    pub format: Vec<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub style: Vec<String>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub master_id: Option<u64>,
}

/// Discogs API pagination info
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscogsPagination {
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    pub items: u32,
}

/// Discogs search response wrapper
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscogsSearchResponse {
    pub pagination: DiscogsPagination,
    #[serde(default)]
    pub results: Vec<DiscogsSearchResult>,
}

/// Error body Discogs returns on non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct DiscogsErrorBody {
    pub message: Option<String>,
}

/// Quota reported by the `X-Discogs-Ratelimit*` response headers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_tolerates_missing_collections() {
        let release: DiscogsRelease =
            serde_json::from_str(r#"{"id": 42, "title": "Kind of Blue"}"#).unwrap();

        assert_eq!(release.id, 42);
        assert!(release.artists.is_empty());
        assert!(release.images.is_empty());
        assert_eq!(release.year, None);
    }

    #[test]
    fn tracklist_entry_keeps_type_marker() {
        let json = r#"{"position": "", "type_": "heading", "title": "Side A"}"#;
        let track: DiscogsTrack = serde_json::from_str(json).unwrap();

        assert_eq!(track.type_, "heading");
        assert_eq!(track.duration, "");
    }
}

//! Mapping from Discogs API shapes to the collection's form and display shapes.
//!
//! Everything here is pure. Cover art is never copied into `VinylFormData` by
//! these functions; it is filled in once the image has been proxied.

use crate::discogs::models::{
    DiscogsFormat, DiscogsRelease, DiscogsSearchResult, DiscogsTrack,
};
use crate::models::{SearchResultDisplay, Track, VinylFormData};
use regex::Regex;
use std::sync::OnceLock;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
pub const MAX_GENRES: usize = 5;

/// Discogs format names and descriptors mapped to our format options
const FORMAT_MAP: &[(&str, &str)] = &[
    ("LP", "LP"),
    ("Album", "LP"),
    ("12\"", "12\""),
    ("7\"", "7\""),
    ("10\"", "10\""),
    ("2xLP", "2xLP"),
    ("3xLP", "3xLP"),
    ("Box Set", "Box Set"),
    ("EP", "12\""),
    ("Single", "7\""),
];

/// A single format inference rule, applied to the first listed format
type FormatRule = fn(&DiscogsFormat) -> Option<String>;

/// Format rules in priority order. The first rule that matches wins.
const FORMAT_RULES: &[(&str, FormatRule)] = &[
    ("multi-disc vinyl", multi_disc_vinyl),
    ("descriptor", mapped_descriptor),
    ("format name", mapped_name),
];

fn lookup_format(key: &str) -> Option<&'static str> {
    FORMAT_MAP
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| *to)
}

fn multi_disc_vinyl(format: &DiscogsFormat) -> Option<String> {
    let qty: u32 = format.qty.trim().parse().ok()?;
    if format.name == "Vinyl" && qty >= 2 {
        Some(format!("{}xLP", qty))
    } else {
        None
    }
}

fn mapped_descriptor(format: &DiscogsFormat) -> Option<String> {
    format
        .descriptions
        .iter()
        .find_map(|desc| lookup_format(desc))
        .map(str::to_string)
}

fn mapped_name(format: &DiscogsFormat) -> Option<String> {
    lookup_format(&format.name).map(str::to_string)
}

fn disambiguation_suffix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s*\(\d+\)$").unwrap())
}

/// Strip the "(N)" suffix Discogs appends to tell same-named artists apart.
///
/// "Nirvana (2)" becomes "Nirvana"; names without the suffix are only trimmed.
pub fn clean_artist_name(name: &str) -> String {
    disambiguation_suffix().replace(name, "").trim().to_string()
}

/// Pick a single display format from the release's format list.
///
/// Only the first format entry is considered. Rules run in the order of
/// `FORMAT_RULES`; when none match, the raw format name is returned as-is.
pub fn primary_format(formats: &[DiscogsFormat]) -> Option<String> {
    let primary = formats.first()?;

    FORMAT_RULES
        .iter()
        .find_map(|(_, rule)| rule(primary))
        .or_else(|| Some(primary.name.clone()))
}

/// Union of genres and styles, first-seen order, at most `MAX_GENRES` entries
pub fn extract_genres(genres: &[String], styles: &[String]) -> Vec<String> {
    let mut combined: Vec<String> = Vec::with_capacity(MAX_GENRES);

    for genre in genres.iter().chain(styles.iter()) {
        if combined.len() == MAX_GENRES {
            break;
        }
        if !combined.contains(genre) {
            combined.push(genre.clone());
        }
    }

    combined
}

/// Keep only real tracks, dropping the headings and index entries Discogs interleaves
pub fn transform_tracklist(tracklist: &[DiscogsTrack]) -> Vec<Track> {
    tracklist
        .iter()
        .filter(|track| track.type_ == "track")
        .map(|track| Track {
            position: track.position.clone(),
            title: track.title.clone(),
            duration: track.duration.clone(),
        })
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn release_artist(release: &DiscogsRelease) -> String {
    release
        .artists
        .first()
        .map(|artist| clean_artist_name(&artist.name))
        .filter(|name| !name.is_empty())
        .or_else(|| release.artists_sort.as_deref().and_then(non_empty))
        .unwrap_or_else(|| UNKNOWN_ARTIST.to_string())
}

/// Convert a full Discogs release into form data for the collection.
///
/// `cover_art_url` is left unset; see [`primary_cover_image_url`].
pub fn transform_release_to_vinyl_form(release: &DiscogsRelease) -> VinylFormData {
    let first_label = release.labels.first();

    VinylFormData {
        artist: release_artist(release),
        album: non_empty(&release.title).unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
        year: release.year.filter(|year| *year > 0),
        label: first_label.and_then(|label| non_empty(&label.name)),
        catalog_number: first_label.and_then(|label| non_empty(&label.catno)),
        country: release.country.as_deref().and_then(non_empty),
        format: primary_format(&release.formats),
        genre: extract_genres(&release.genres, &release.styles),
        discogs_id: Some(release.id.to_string()),
        tracklist: transform_tracklist(&release.tracklist),
        cover_art_url: None,
        ..Default::default()
    }
}

/// The image tagged "primary", else the first image, else nothing
pub fn primary_cover_image_url(release: &DiscogsRelease) -> Option<String> {
    release
        .images
        .iter()
        .find(|img| img.image_type == "primary")
        .or_else(|| release.images.first())
        .map(|img| img.uri.clone())
}

/// Lighter transformation for the result list.
///
/// Discogs titles search results as "Artist - Album". The split happens on the
/// first " - ", so an artist name that itself contains " - " is misparsed.
pub fn transform_search_result(result: &DiscogsSearchResult) -> SearchResultDisplay {
    let (artist, album) = match result.title.split_once(" - ") {
        Some((artist, album)) => (clean_artist_name(artist), album.to_string()),
        None => (UNKNOWN_ARTIST.to_string(), result.title.clone()),
    };

    SearchResultDisplay {
        id: result.id,
        artist,
        album,
        year: result.year.as_deref().and_then(non_empty),
        label: result.label.first().cloned(),
        catno: result.catno.as_deref().and_then(non_empty),
        format: if result.format.is_empty() {
            None
        } else {
            Some(result.format.join(", "))
        },
        country: result.country.as_deref().and_then(non_empty),
        thumb: result.thumb.clone().unwrap_or_default(),
        cover_image: result.cover_image.clone().unwrap_or_default(),
    }
}

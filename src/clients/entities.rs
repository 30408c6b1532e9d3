use serde::{Deserialize, Serialize};

/// A single track returned by the search API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub track_id: i64,
    pub artist_name: String,
    pub track_name: String,
    pub preview_url: String,
    #[serde(rename = "artworkUrl100")]
    pub artwork_url100: String,
}

impl Song {
    // Primary text of a list row
    pub fn title(&self) -> &str {
        &self.track_name
    }

    // Secondary text of a list row
    pub fn caption(&self) -> &str {
        &self.artist_name
    }
}

/// Response envelope. Other top level keys such as `resultCount` are ignored.
#[derive(Serialize, Deserialize, Debug)]
pub struct SearchResult {
    pub results: Vec<Song>,
}

#[cfg(test)]
impl Song {
    pub fn mock(track_id: i64, track_name: &str, artist_name: &str) -> Self {
        Self {
            track_id,
            artist_name: artist_name.to_string(),
            track_name: track_name.to_string(),
            preview_url: format!("https://audio.example/{track_id}.m4a"),
            artwork_url100: format!("https://art.example/{track_id}/100x100bb.jpg"),
        }
    }
}

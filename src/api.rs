// API client module: contains a small blocking HTTP client that talks to
// the music catalog. The catalog exposes a client-credentials token
// endpoint plus search, track and artist lookups; everything here is
// synchronous because the pipeline processes one file at a time.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/api/token";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Simple catalog client that holds a reqwest blocking client, the two
/// base URLs, the API credentials and an optional bearer token obtained
/// through [`ApiClient::authenticate`].
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    api_url: String,
    auth_url: String,
    client_id: String,
    client_secret: String,
    token: Option<String>,
}

/// Response from the token endpoint. Only the fields the tagger needs
/// are kept; unknown fields are ignored.
#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// Envelope returned by the search endpoint.
#[derive(Deserialize, Debug)]
pub struct SearchResponse {
    pub tracks: TrackPage,
}

#[derive(Deserialize, Debug)]
pub struct TrackPage {
    pub items: Vec<TrackSummary>,
}

/// A search hit. The id feeds the follow-up track lookup.
#[derive(Deserialize, Debug, Clone)]
pub struct TrackSummary {
    pub id: String,
    pub name: String,
    pub artists: Vec<ArtistRef>,
}

/// Full track object from `/tracks/{id}`.
#[derive(Deserialize, Debug)]
pub struct Track {
    pub name: String,
    pub artists: Vec<ArtistRef>,
    pub album: Album,
    pub track_number: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

/// Album object embedded in a track. Track-embedded albums usually carry
/// an empty `genres` list, hence the fallback to the artist lookup.
#[derive(Deserialize, Debug)]
pub struct Album {
    pub name: String,
    pub release_date: Option<String>,
    pub images: Vec<Image>,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct Image {
    pub url: String,
}

/// Full artist object from `/artists/{id}`; used only for its genres.
#[derive(Deserialize, Debug)]
pub struct Artist {
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl ApiClient {
    /// Create an ApiClient configured from the environment. The base
    /// URLs come from `TUNETAG_API_URL` / `TUNETAG_AUTH_URL` with the
    /// public catalog as fallback; credentials come from `CLIENT_ID` /
    /// `CLIENT_SECRET` (a `.env` file in the working directory is
    /// honored, see `main`).
    pub fn from_env() -> Result<Self> {
        let api_url =
            std::env::var("TUNETAG_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let auth_url =
            std::env::var("TUNETAG_AUTH_URL").unwrap_or_else(|_| DEFAULT_AUTH_URL.into());
        let client_id = std::env::var("CLIENT_ID").unwrap_or_default();
        let client_secret = std::env::var("CLIENT_SECRET").unwrap_or_default();
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            api_url,
            auth_url,
            client_id,
            client_secret,
            token: None,
        })
    }

    /// Returns whether both credentials are present.
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// Store credentials collected interactively.
    pub fn set_credentials(&mut self, client_id: &str, client_secret: &str) {
        self.client_id = client_id.to_string();
        self.client_secret = client_secret.to_string();
    }

    /// Helper to build the Authorization header map when a token is set.
    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(t) = &self.token {
            let val = format!("Bearer {}", t);
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&val).unwrap());
        }
        headers
    }

    /// Perform the client-credentials grant and store the bearer token
    /// for subsequent calls. The token outlives any realistic batch, so
    /// there is no refresh handling.
    pub fn authenticate(&mut self) -> Result<()> {
        info!("requesting access token from {}", self.auth_url);
        let basic = BASE64.encode(format!("{}:{}", self.client_id, self.client_secret));
        let res = self
            .client
            .post(&self.auth_url)
            .header(AUTHORIZATION, format!("Basic {}", basic))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .context("Failed to send token request")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            error!("authorization failure: {} - {}", status, txt);
            anyhow::bail!("Authorization failed: {} - {}", status, txt);
        }
        let resp: TokenResponse = res.json().context("Parsing token response json")?;
        debug!("token granted, expires in {}s", resp.expires_in);
        self.token = Some(resp.access_token);
        Ok(())
    }

    /// Search the catalog for a track. The query is exact text with an
    /// optional artist clause; only the first hit is requested. Returns
    /// `Ok(None)` on an empty result set so the caller can ask the user
    /// to retype the query.
    pub fn search_track(&self, title: &str, artist: &str) -> Result<Option<TrackSummary>> {
        let query = build_search_query(title, artist);
        info!("searching for {:?}", query);
        let url = format!("{}/search", &self.api_url);
        let res = self
            .client
            .get(&url)
            .headers(self.auth_headers())
            .query(&[("q", query.as_str()), ("type", "track"), ("limit", "1")])
            .send()
            .context("Failed to send search request")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            anyhow::bail!("Search failed: {} - {}", status, txt);
        }
        let resp: SearchResponse = res.json().context("Parsing search response json")?;
        Ok(resp.tracks.items.into_iter().next())
    }

    /// Fetch the full track object for a search hit.
    pub fn track(&self, id: &str) -> Result<Track> {
        debug!("fetching track {}", id);
        let url = format!("{}/tracks/{}", &self.api_url, id);
        let res = self
            .client
            .get(&url)
            .headers(self.auth_headers())
            .send()
            .context("Failed to send track request")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            anyhow::bail!("Track lookup failed: {} - {}", status, txt);
        }
        let track: Track = res.json().context("Parsing track response json")?;
        Ok(track)
    }

    /// Fetch an artist object; used to fill in genres when the album
    /// carries none.
    pub fn artist(&self, id: &str) -> Result<Artist> {
        debug!("fetching artist {}", id);
        let url = format!("{}/artists/{}", &self.api_url, id);
        let res = self
            .client
            .get(&url)
            .headers(self.auth_headers())
            .send()
            .context("Failed to send artist request")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            anyhow::bail!("Artist lookup failed: {} - {}", status, txt);
        }
        let artist: Artist = res.json().context("Parsing artist response json")?;
        Ok(artist)
    }

    /// Download a cover image and return the raw bytes. Image URLs are
    /// absolute and unauthenticated.
    pub fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        debug!("downloading cover image from {}", url);
        let res = self
            .client
            .get(url)
            .send()
            .context("Failed to download cover image")?;
        if !res.status().is_success() {
            anyhow::bail!("Cover image download failed: {}", res.status());
        }
        Ok(res.bytes().context("Reading cover image body")?.to_vec())
    }
}

/// Build the search query string. The artist clause is only attached
/// when an artist name is known; the first pass per file searches on the
/// filename alone.
fn build_search_query(title: &str, artist: &str) -> String {
    let artist = artist.trim();
    if artist.is_empty() {
        title.trim().to_string()
    } else {
        format!("{} artist:{}", title.trim(), artist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_query_includes_artist_clause() {
        assert_eq!(
            build_search_query("Mysterons", "Portishead"),
            "Mysterons artist:Portishead"
        );
    }

    #[test]
    fn search_query_skips_empty_artist() {
        assert_eq!(build_search_query("Mysterons", ""), "Mysterons");
        assert_eq!(build_search_query(" Mysterons ", "   "), "Mysterons");
    }

    #[test]
    fn parses_token_response() {
        let json = r#"{"access_token":"abc123","token_type":"Bearer","expires_in":3600}"#;
        let resp: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token, "abc123");
        assert_eq!(resp.expires_in, 3600);
    }

    #[test]
    fn parses_search_response() {
        let json = r#"{
            "tracks": {
                "items": [
                    {
                        "id": "t1",
                        "name": "Kitchen Sink",
                        "artists": [{"id": "a1", "name": "Amon Tobin"}],
                        "popularity": 40
                    }
                ]
            }
        }"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        let hit = &resp.tracks.items[0];
        assert_eq!(hit.id, "t1");
        assert_eq!(hit.artists[0].name, "Amon Tobin");
    }

    #[test]
    fn parses_empty_search_response() {
        let json = r#"{"tracks": {"items": []}}"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(resp.tracks.items.is_empty());
    }

    #[test]
    fn parses_track_without_album_genres() {
        let json = r#"{
            "name": "Kitchen Sink",
            "artists": [{"id": "a1", "name": "Amon Tobin"}],
            "track_number": 2,
            "album": {
                "name": "Foley Room",
                "release_date": "2007-03-05",
                "images": [{"url": "https://img.example/cover.jpg", "width": 640, "height": 640}]
            }
        }"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.track_number, 2);
        assert!(track.album.genres.is_empty());
        assert_eq!(track.album.release_date.as_deref(), Some("2007-03-05"));
        assert_eq!(track.album.images[0].url, "https://img.example/cover.jpg");
    }
}

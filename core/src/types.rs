//! Domain records for the Instagram API.
//!
//! # Design
//! These are plain immutable records built straight from the `data` part of
//! an envelope. They hold no token and make no calls; anything that acts on a
//! record goes through `Session` with the record's id.
//!
//! The API is loose about types: ids arrive as strings or integers,
//! `created_time` as a string of epoch seconds, and optional fields are
//! either missing or `null`. The `de` helpers absorb all of that so missing
//! data degrades to defaults instead of failing the whole response.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(default, deserialize_with = "de::or_default")]
    pub username: String,
    #[serde(default, deserialize_with = "de::or_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "de::or_default")]
    pub profile_picture: String,
    #[serde(default, deserialize_with = "de::or_default")]
    pub bio: String,
    #[serde(default, deserialize_with = "de::or_default")]
    pub website: String,
    #[serde(default)]
    pub counts: Option<UserCounts>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCounts {
    #[serde(default, deserialize_with = "de::or_default")]
    pub media: u64,
    #[serde(default, deserialize_with = "de::or_default")]
    pub follows: u64,
    #[serde(default, deserialize_with = "de::or_default")]
    pub followed_by: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Media {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "de::or_default")]
    pub kind: MediaKind,
    #[serde(default, deserialize_with = "de::or_default")]
    pub filter: String,
    #[serde(default, deserialize_with = "de::or_default")]
    pub tags: Vec<String>,
    /// Epoch seconds.
    #[serde(default, deserialize_with = "de::timestamp")]
    pub created_time: i64,
    #[serde(default, deserialize_with = "de::or_default")]
    pub link: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub caption: Option<Comment>,
    #[serde(default, deserialize_with = "de::or_default")]
    pub comments: Counted<Comment>,
    #[serde(default, deserialize_with = "de::or_default")]
    pub likes: Counted<User>,
    #[serde(default)]
    pub images: Option<ImageSet>,
    #[serde(default)]
    pub videos: Option<VideoSet>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default, deserialize_with = "de::or_default")]
    pub user_has_liked: bool,
    #[serde(default, deserialize_with = "de::or_default")]
    pub users_in_photo: Vec<UserInPhoto>,
}

/// A count plus the first few items the server chose to inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Counted<T> {
    #[serde(default, deserialize_with = "de::or_default")]
    pub count: u64,
    #[serde(default = "Vec::new", deserialize_with = "de::or_default")]
    pub data: Vec<T>,
}

impl<T> Default for Counted<T> {
    fn default() -> Self {
        Self {
            count: 0,
            data: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default, deserialize_with = "de::or_default")]
    pub url: String,
    #[serde(default, deserialize_with = "de::or_default")]
    pub width: u32,
    #[serde(default, deserialize_with = "de::or_default")]
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSet {
    #[serde(default)]
    pub low_resolution: Option<Image>,
    #[serde(default)]
    pub thumbnail: Option<Image>,
    #[serde(default)]
    pub standard_resolution: Option<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSet {
    #[serde(default)]
    pub low_resolution: Option<Image>,
    #[serde(default)]
    pub standard_resolution: Option<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInPhoto {
    pub user: User,
    #[serde(default, deserialize_with = "de::or_default")]
    pub position: Position,
}

/// Relative position inside the photo, both axes in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default, deserialize_with = "de::or_default")]
    pub x: f64,
    #[serde(default, deserialize_with = "de::or_default")]
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    /// Epoch seconds.
    #[serde(default, deserialize_with = "de::timestamp")]
    pub created_time: i64,
    #[serde(default, deserialize_with = "de::or_default")]
    pub text: String,
    #[serde(default)]
    pub from: Option<User>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default, deserialize_with = "de::or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "de::or_default")]
    pub media_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Empty for ad-hoc locations attached to media without a place id.
    #[serde(default, deserialize_with = "de::id")]
    pub id: String,
    #[serde(default, deserialize_with = "de::or_default")]
    pub name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Filters for `Session::search_media`. Unset filters are left out of the
/// query string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaSearch {
    pub latitude: f64,
    pub longitude: f64,
    pub min_timestamp: Option<i64>,
    pub max_timestamp: Option<i64>,
    /// Radius in metres.
    pub distance: Option<u32>,
}

impl MediaSearch {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            min_timestamp: None,
            max_timestamp: None,
            distance: None,
        }
    }

    pub fn min_timestamp(mut self, timestamp: i64) -> Self {
        self.min_timestamp = Some(timestamp);
        self
    }

    pub fn max_timestamp(mut self, timestamp: i64) -> Self {
        self.max_timestamp = Some(timestamp);
        self
    }

    pub fn distance(mut self, metres: u32) -> Self {
        self.distance = Some(metres);
        self
    }

    /// Query pairs in the order the API documents them.
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("lat", self.latitude.to_string()),
            ("lng", self.longitude.to_string()),
        ];
        if let Some(min) = self.min_timestamp {
            pairs.push(("min_timestamp", min.to_string()));
        }
        if let Some(max) = self.max_timestamp {
            pairs.push(("max_timestamp", max.to_string()));
        }
        if let Some(distance) = self.distance {
            pairs.push(("distance", distance.to_string()));
        }
        pairs
    }
}

pub(crate) mod de {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Integer(i64),
        Unsigned(u64),
    }

    /// `null` or missing becomes `T::default()`.
    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Ids arrive as strings or integers.
    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Option::<Loose>::deserialize(deserializer)? {
            Some(Loose::Text(text)) => text,
            Some(Loose::Integer(n)) => n.to_string(),
            Some(Loose::Unsigned(n)) => n.to_string(),
            None => String::new(),
        })
    }

    /// Epoch seconds as a string or an integer.
    pub fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Option::<Loose>::deserialize(deserializer)? {
            Some(Loose::Text(text)) if text.is_empty() => Ok(0),
            Some(Loose::Text(text)) => text
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid timestamp {text:?}"))),
            Some(Loose::Integer(n)) => Ok(n),
            Some(Loose::Unsigned(n)) => {
                i64::try_from(n).map_err(|_| D::Error::custom(format!("timestamp {n} out of range")))
            }
            None => Ok(0),
        }
    }
}

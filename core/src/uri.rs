//! Endpoint templates and the builder that turns them into request URLs.
//!
//! Templates are relative paths whose `{name}` segments are replaced by path
//! parameters. Values are percent-encoded as path segments, so ids and tag
//! names containing `/`, `?` or spaces cannot change the shape of the URL.

use url::Url;

use crate::config::{AccessToken, SessionConfig};
use crate::error::ApiError;

/// Relative endpoint templates of the v1 API.
pub mod endpoints {
    pub const USER: &str = "users/{user_id}";
    pub const USER_FEED: &str = "users/self/feed";
    pub const USER_RECENT_MEDIA: &str = "users/{user_id}/media/recent";
    pub const USER_LIKED_MEDIA: &str = "users/self/media/liked";
    pub const USER_SEARCH: &str = "users/search";

    pub const FOLLOWS: &str = "users/{user_id}/follows";
    pub const FOLLOWED_BY: &str = "users/{user_id}/followed-by";
    pub const REQUESTED_BY: &str = "users/self/requested-by";
    pub const RELATIONSHIP: &str = "users/{user_id}/relationship";

    pub const MEDIA: &str = "media/{media_id}";
    pub const MEDIA_SEARCH: &str = "media/search";
    pub const MEDIA_POPULAR: &str = "media/popular";

    pub const MEDIA_COMMENTS: &str = "media/{media_id}/comments";
    pub const MEDIA_COMMENT: &str = "media/{media_id}/comments/{comment_id}";
    pub const MEDIA_LIKES: &str = "media/{media_id}/likes";

    pub const TAG: &str = "tags/{tag_name}";
    pub const TAG_RECENT_MEDIA: &str = "tags/{tag_name}/media/recent";
    pub const TAG_SEARCH: &str = "tags/search";

    pub const LOCATION: &str = "locations/{location_id}";
    pub const LOCATION_RECENT_MEDIA: &str = "locations/{location_id}/media/recent";
    pub const LOCATION_SEARCH: &str = "locations/search";
}

/// Resolves endpoint templates against a base URL and access token.
#[derive(Debug, Clone)]
pub struct UriBuilder {
    base_url: Url,
    access_token: AccessToken,
}

impl UriBuilder {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            access_token: config.access_token.clone(),
        }
    }

    /// Substitute `path_params` into `template` and, when `append_token` is
    /// set, add the access token as a query parameter.
    ///
    /// Further query parameters can be added to the returned URL with
    /// `Url::query_pairs_mut`.
    pub fn construct(
        &self,
        template: &str,
        path_params: &[(&str, &str)],
        append_token: bool,
    ) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ApiError::Config(format!("{} cannot be a base url", self.base_url)))?;
            segments.pop_if_empty();
            for segment in template.split('/').filter(|s| !s.is_empty()) {
                match placeholder_name(segment) {
                    Some(name) => {
                        let value = path_params
                            .iter()
                            .find(|(key, _)| *key == name)
                            .map(|(_, value)| *value)
                            .ok_or_else(|| ApiError::UnresolvedPlaceholder(name.to_string()))?;
                        segments.push(value);
                    }
                    None => {
                        segments.push(segment);
                    }
                }
            }
        }
        if append_token {
            url.query_pairs_mut()
                .append_pair("access_token", self.access_token.expose());
        }
        Ok(url)
    }
}

fn placeholder_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

//! The `Session` façade: one method per API capability.
//!
//! # Design
//! A session owns a `UriBuilder` and a `Transport` and keeps nothing between
//! calls. Every operation is one of four shapes, each handled by a private
//! helper:
//!
//! - lookups issue one GET and require `data`; its absence is `NotFound`.
//! - lists issue one GET, require `meta.code == 200`, and map the `data` array.
//! - paginated lists follow `pagination.next_url` up to the requested number
//!   of pages and map the last page fetched. Running out of pages early is
//!   not an error.
//! - mutations issue one POST or DELETE and report `meta.code == 200` as a
//!   bool, whatever the HTTP status.
//!
//! Failures propagate on first sight; nothing is retried.

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::{AccessToken, SessionConfig};
use crate::envelope::{Envelope, OK_CODE};
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport};
use crate::relationship::{Action, Relationship};
use crate::types::{Comment, Location, Media, MediaSearch, Tag, User};
use crate::uri::{endpoints, UriBuilder};

/// Path value addressing the session's own user.
pub const SELF: &str = "self";

/// Authenticated access to the API on behalf of one user.
#[derive(Debug, Clone)]
pub struct Session<T> {
    uris: UriBuilder,
    access_token: AccessToken,
    transport: T,
}

impl<T: Transport> Session<T> {
    pub fn new(config: SessionConfig, transport: T) -> Self {
        Self {
            uris: UriBuilder::new(&config),
            access_token: config.access_token,
            transport,
        }
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// The user with `user_id`, or `NotFound` if they do not exist or cannot
    /// be seen with this token.
    pub fn get_user(&self, user_id: &str) -> Result<User, ApiError> {
        let url = self.uris.construct(endpoints::USER, &[("user_id", user_id)], true)?;
        self.lookup(url, "User", user_id)
    }

    /// The owner of the access token.
    pub fn get_current_user(&self) -> Result<User, ApiError> {
        self.get_user(SELF)
    }

    /// Media published by `user_id`, as found on result page `pages`.
    #[instrument(level = "debug", skip(self))]
    pub fn get_recent_published_media(&self, user_id: &str, pages: u32) -> Result<Vec<Media>, ApiError> {
        check_pages(pages)?;
        let url = self
            .uris
            .construct(endpoints::USER_RECENT_MEDIA, &[("user_id", user_id)], true)?;
        self.paginate(url, pages)
    }

    /// Media in the session user's feed.
    #[instrument(level = "debug", skip(self))]
    pub fn get_feed(&self, pages: u32) -> Result<Vec<Media>, ApiError> {
        check_pages(pages)?;
        let url = self.uris.construct(endpoints::USER_FEED, &[], true)?;
        self.paginate(url, pages)
    }

    /// Media the session user has liked.
    #[instrument(level = "debug", skip(self))]
    pub fn get_liked_media(&self, pages: u32) -> Result<Vec<Media>, ApiError> {
        check_pages(pages)?;
        let url = self.uris.construct(endpoints::USER_LIKED_MEDIA, &[], true)?;
        self.paginate(url, pages)
    }

    /// Users whose username or full name matches `name`.
    pub fn search_users_by_name(&self, name: &str) -> Result<Vec<User>, ApiError> {
        let mut url = self.uris.construct(endpoints::USER_SEARCH, &[], true)?;
        url.query_pairs_mut().append_pair("q", name);
        self.list(url)
    }

    // -----------------------------------------------------------------------
    // Relationships
    // -----------------------------------------------------------------------

    /// Users that `user_id` follows.
    #[instrument(level = "debug", skip(self))]
    pub fn get_follows(&self, user_id: &str, pages: u32) -> Result<Vec<User>, ApiError> {
        check_pages(pages)?;
        let url = self
            .uris
            .construct(endpoints::FOLLOWS, &[("user_id", user_id)], true)?;
        self.paginate(url, pages)
    }

    /// Users following `user_id`.
    #[instrument(level = "debug", skip(self))]
    pub fn get_followers(&self, user_id: &str, pages: u32) -> Result<Vec<User>, ApiError> {
        check_pages(pages)?;
        let url = self
            .uris
            .construct(endpoints::FOLLOWED_BY, &[("user_id", user_id)], true)?;
        self.paginate(url, pages)
    }

    /// Users waiting for the session user to approve their follow request.
    pub fn get_follow_requests(&self) -> Result<Vec<User>, ApiError> {
        let url = self.uris.construct(endpoints::REQUESTED_BY, &[], true)?;
        self.list(url)
    }

    pub fn get_relationship_with(&self, user_id: &str) -> Result<Relationship, ApiError> {
        let url = self
            .uris
            .construct(endpoints::RELATIONSHIP, &[("user_id", user_id)], true)?;
        self.lookup(url, "Relationship", user_id)
    }

    /// Apply `action` to the relationship with `user_id`. Returns whether the
    /// server accepted it.
    #[instrument(level = "debug", skip(self))]
    pub fn modify_relationship(&self, user_id: &str, action: Action) -> Result<bool, ApiError> {
        let url = self
            .uris
            .construct(endpoints::RELATIONSHIP, &[("user_id", user_id)], true)?;
        self.mutate(HttpRequest::post_form(url, &[("action", action.as_str())]))
    }

    // -----------------------------------------------------------------------
    // Media
    // -----------------------------------------------------------------------

    pub fn get_media(&self, media_id: &str) -> Result<Media, ApiError> {
        let url = self
            .uris
            .construct(endpoints::MEDIA, &[("media_id", media_id)], true)?;
        self.lookup(url, "Media", media_id)
    }

    /// Media taken near a point, optionally within a time window.
    pub fn search_media(&self, search: &MediaSearch) -> Result<Vec<Media>, ApiError> {
        let mut url = self.uris.construct(endpoints::MEDIA_SEARCH, &[], true)?;
        url.query_pairs_mut().extend_pairs(search.query_pairs());
        self.list(url)
    }

    pub fn get_popular_media(&self) -> Result<Vec<Media>, ApiError> {
        let url = self.uris.construct(endpoints::MEDIA_POPULAR, &[], true)?;
        self.list(url)
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    pub fn get_media_comments(&self, media_id: &str) -> Result<Vec<Comment>, ApiError> {
        let url = self
            .uris
            .construct(endpoints::MEDIA_COMMENTS, &[("media_id", media_id)], true)?;
        self.list(url)
    }

    /// Comment on `media_id` and return the created comment.
    #[instrument(level = "debug", skip(self, text))]
    pub fn post_comment(&self, media_id: &str, text: &str) -> Result<Comment, ApiError> {
        let url = self
            .uris
            .construct(endpoints::MEDIA_COMMENTS, &[("media_id", media_id)], false)?;
        let request = HttpRequest::post_form(
            url,
            &[("access_token", self.access_token.expose()), ("text", text)],
        );
        let envelope = self.fetch(request)?;
        envelope.ensure_ok()?;
        envelope.into_item()?.ok_or(ApiError::MissingField("data"))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn remove_comment(&self, media_id: &str, comment_id: &str) -> Result<bool, ApiError> {
        let url = self.uris.construct(
            endpoints::MEDIA_COMMENT,
            &[("media_id", media_id), ("comment_id", comment_id)],
            true,
        )?;
        self.mutate(HttpRequest::delete(url))
    }

    // -----------------------------------------------------------------------
    // Likes
    // -----------------------------------------------------------------------

    /// Users who have liked `media_id`.
    pub fn get_likers(&self, media_id: &str) -> Result<Vec<User>, ApiError> {
        let url = self
            .uris
            .construct(endpoints::MEDIA_LIKES, &[("media_id", media_id)], true)?;
        self.list(url)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn like_media(&self, media_id: &str) -> Result<bool, ApiError> {
        let url = self
            .uris
            .construct(endpoints::MEDIA_LIKES, &[("media_id", media_id)], false)?;
        self.mutate(HttpRequest::post_form(
            url,
            &[("access_token", self.access_token.expose())],
        ))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn remove_media_like(&self, media_id: &str) -> Result<bool, ApiError> {
        let url = self
            .uris
            .construct(endpoints::MEDIA_LIKES, &[("media_id", media_id)], true)?;
        self.mutate(HttpRequest::delete(url))
    }

    // -----------------------------------------------------------------------
    // Tags
    // -----------------------------------------------------------------------

    pub fn get_tag(&self, tag_name: &str) -> Result<Tag, ApiError> {
        let url = self
            .uris
            .construct(endpoints::TAG, &[("tag_name", tag_name)], true)?;
        self.lookup(url, "Tag", tag_name)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn get_recent_media_for_tag(&self, tag_name: &str, pages: u32) -> Result<Vec<Media>, ApiError> {
        check_pages(pages)?;
        let url = self
            .uris
            .construct(endpoints::TAG_RECENT_MEDIA, &[("tag_name", tag_name)], true)?;
        self.paginate(url, pages)
    }

    pub fn search_tags(&self, query: &str) -> Result<Vec<Tag>, ApiError> {
        let mut url = self.uris.construct(endpoints::TAG_SEARCH, &[], true)?;
        url.query_pairs_mut().append_pair("q", query);
        self.list(url)
    }

    // -----------------------------------------------------------------------
    // Locations
    // -----------------------------------------------------------------------

    pub fn get_location(&self, location_id: &str) -> Result<Location, ApiError> {
        let url = self
            .uris
            .construct(endpoints::LOCATION, &[("location_id", location_id)], true)?;
        self.lookup(url, "Location", location_id)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn get_recent_media_from_location(
        &self,
        location_id: &str,
        pages: u32,
    ) -> Result<Vec<Media>, ApiError> {
        check_pages(pages)?;
        let url = self.uris.construct(
            endpoints::LOCATION_RECENT_MEDIA,
            &[("location_id", location_id)],
            true,
        )?;
        self.paginate(url, pages)
    }

    /// Places near a point; `distance` is a radius in metres.
    pub fn search_locations(
        &self,
        latitude: f64,
        longitude: f64,
        distance: Option<u32>,
    ) -> Result<Vec<Location>, ApiError> {
        let mut url = self.uris.construct(endpoints::LOCATION_SEARCH, &[], true)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("lat", &latitude.to_string())
                .append_pair("lng", &longitude.to_string());
            if let Some(distance) = distance {
                query.append_pair("distance", &distance.to_string());
            }
        }
        self.list(url)
    }

    // -----------------------------------------------------------------------
    // Shared request shapes
    // -----------------------------------------------------------------------

    fn fetch(&self, request: HttpRequest) -> Result<Envelope, ApiError> {
        let method = request.method.as_str();
        let endpoint = request.endpoint().to_string();
        let response = self.transport.execute(request)?;
        debug!(method, endpoint = %endpoint, status = response.status, "api response");
        Envelope::from_response(&response)
    }

    fn lookup<R: DeserializeOwned>(&self, url: Url, resource: &'static str, id: &str) -> Result<R, ApiError> {
        let not_found = || ApiError::NotFound {
            resource,
            id: id.to_string(),
        };
        let envelope = match self.fetch(HttpRequest::get(url)) {
            Ok(envelope) => envelope,
            Err(ApiError::HttpError { status: 404, .. }) => return Err(not_found()),
            Err(e) => return Err(e),
        };
        envelope.into_item()?.ok_or_else(not_found)
    }

    fn list<R: DeserializeOwned>(&self, url: Url) -> Result<Vec<R>, ApiError> {
        let envelope = self.fetch(HttpRequest::get(url))?;
        envelope.ensure_ok()?;
        envelope.into_list()
    }

    /// Fetch up to `pages` pages starting at `first` and map the last one.
    fn paginate<R: DeserializeOwned>(&self, first: Url, pages: u32) -> Result<Vec<R>, ApiError> {
        let mut url = String::from(first);
        let mut page = 1;
        loop {
            let envelope = self.fetch(HttpRequest::get(url))?;
            envelope.ensure_ok()?;
            match envelope.next_url().map(str::to_string) {
                Some(next) if page < pages => {
                    url = next;
                    page += 1;
                }
                next => {
                    if next.is_none() && page < pages {
                        debug!(requested = pages, available = page, "ran out of pages");
                    }
                    return envelope.into_list();
                }
            }
        }
    }

    fn mutate(&self, request: HttpRequest) -> Result<bool, ApiError> {
        let envelope = self.fetch(request)?;
        Ok(envelope.code()? == OK_CODE)
    }
}

fn check_pages(pages: u32) -> Result<(), ApiError> {
    if pages == 0 {
        return Err(ApiError::InvalidPage);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::http::HttpMethod;
    use crate::relationship::OutgoingStatus;
    use crate::replay::ReplayTransport;

    const BASE: &str = "http://api.test/v1/";

    fn session(replay: &ReplayTransport) -> Session<&ReplayTransport> {
        let config = SessionConfig::for_base_url(BASE, "tok").unwrap();
        Session::new(config, replay)
    }

    fn ok(data: Value) -> String {
        json!({"meta": {"code": 200}, "data": data}).to_string()
    }

    fn page(data: Value, next_url: Option<&str>) -> String {
        let pagination = match next_url {
            Some(next) => json!({"next_url": next}),
            None => json!({}),
        };
        json!({"meta": {"code": 200}, "data": data, "pagination": pagination}).to_string()
    }

    fn users(ids: &[&str]) -> Value {
        Value::Array(
            ids.iter()
                .map(|id| json!({"id": id, "username": format!("user{id}")}))
                .collect(),
        )
    }

    fn ids(users: &[User]) -> Vec<&str> {
        users.iter().map(|u| u.id.as_str()).collect()
    }

    #[test]
    fn zero_pages_fails_before_any_request() {
        let replay = ReplayTransport::new();
        let s = session(&replay);

        assert!(matches!(s.get_follows("1", 0), Err(ApiError::InvalidPage)));
        assert!(matches!(s.get_followers("1", 0), Err(ApiError::InvalidPage)));
        assert!(matches!(s.get_feed(0), Err(ApiError::InvalidPage)));
        assert!(matches!(s.get_liked_media(0), Err(ApiError::InvalidPage)));
        assert!(matches!(s.get_recent_published_media("1", 0), Err(ApiError::InvalidPage)));
        assert!(matches!(s.get_recent_media_for_tag("yolo", 0), Err(ApiError::InvalidPage)));
        assert!(matches!(s.get_recent_media_from_location("1", 0), Err(ApiError::InvalidPage)));
        assert_eq!(replay.request_count(), 0);
    }

    #[test]
    fn single_page_without_next_url() {
        let replay = ReplayTransport::new().respond_ok(page(users(&["7", "3", "5"]), None));
        let follows = session(&replay).get_follows("1", 1).unwrap();

        assert_eq!(ids(&follows), vec!["7", "3", "5"]);
        let requests = replay.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(requests[0].url, "http://api.test/v1/users/1/follows?access_token=tok");
    }

    #[test]
    fn pagination_follows_next_url_and_keeps_last_page() {
        let replay = ReplayTransport::new()
            .respond_ok(page(users(&["1", "2"]), Some("http://api.test/v1/users/9/followed-by?cursor=2")))
            .respond_ok(page(users(&["3", "4"]), Some("http://api.test/v1/users/9/followed-by?cursor=4")))
            .respond_ok(page(users(&["5"]), Some("http://api.test/v1/users/9/followed-by?cursor=5")));
        let followers = session(&replay).get_followers("9", 3).unwrap();

        assert_eq!(ids(&followers), vec!["5"]);
        let urls: Vec<String> = replay.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://api.test/v1/users/9/followed-by?access_token=tok",
                "http://api.test/v1/users/9/followed-by?cursor=2",
                "http://api.test/v1/users/9/followed-by?cursor=4",
            ]
        );
    }

    #[test]
    fn pagination_stops_early_when_exhausted() {
        let replay = ReplayTransport::new()
            .respond_ok(page(users(&["1"]), Some("http://api.test/next")))
            .respond_ok(page(users(&["2"]), None))
            .respond_ok(page(users(&["never"]), None));
        let follows = session(&replay).get_follows("1", 10).unwrap();

        assert_eq!(ids(&follows), vec!["2"]);
        assert_eq!(replay.request_count(), 2);
        assert_eq!(replay.remaining(), 1);
    }

    #[test]
    fn failing_intermediate_page_fails_the_whole_call() {
        let replay = ReplayTransport::new()
            .respond_ok(page(users(&["1"]), Some("http://api.test/next")))
            .respond(500, "upstream exploded");
        let err = session(&replay).get_follows("1", 2).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
    }

    #[test]
    fn error_meta_on_a_page_is_an_api_error() {
        let replay = ReplayTransport::new().respond(
            400,
            json!({"meta": {"code": 400, "error_type": "OAuthAccessTokenException", "error_message": "invalid token"}})
                .to_string(),
        );
        let err = session(&replay).get_feed(1).unwrap_err();
        assert!(matches!(err, ApiError::Api { code: 400, ref error_type, .. } if error_type == "OAuthAccessTokenException"));
    }

    #[test]
    fn lookup_maps_data() {
        let replay = ReplayTransport::new().respond_ok(r#"{"data":{"id":"123","username":"a"}}"#);
        let user = session(&replay).get_user("123").unwrap();
        assert_eq!(user.id, "123");
        assert_eq!(user.username, "a");
        assert_eq!(replay.requests()[0].url, "http://api.test/v1/users/123?access_token=tok");
    }

    #[test]
    fn lookup_without_data_is_not_found() {
        let replay = ReplayTransport::new()
            .respond_ok(r#"{"meta":{"code":200}}"#)
            .respond(
                400,
                r#"{"meta":{"code":400,"error_type":"APINotFoundError","error_message":"invalid media id"}}"#,
            )
            .respond(404, "Not Found")
            .respond_ok(r#"{"meta":{"code":200},"data":null}"#)
            .respond_ok(r#"{"meta":{"code":200}}"#)
            .respond_ok(r#"{"meta":{"code":200}}"#);
        let s = session(&replay);

        let err = s.get_user("42").unwrap_err();
        assert!(matches!(err, ApiError::NotFound { resource: "User", ref id } if id == "42"));
        assert_eq!(err.to_string(), "User with id = 42 cannot be accessed or may not exist");

        assert!(matches!(s.get_media("m9"), Err(ApiError::NotFound { resource: "Media", .. })));
        assert!(matches!(s.get_tag("nope"), Err(ApiError::NotFound { resource: "Tag", .. })));
        assert!(matches!(
            s.get_location("7"),
            Err(ApiError::NotFound { resource: "Location", ref id }) if id == "7"
        ));
        assert!(matches!(
            s.get_relationship_with("8"),
            Err(ApiError::NotFound { resource: "Relationship", ref id }) if id == "8"
        ));
        assert!(matches!(s.get_current_user(), Err(ApiError::NotFound { resource: "User", .. })));
        assert_eq!(replay.remaining(), 0);
    }

    #[test]
    fn relationship_with_null_fields_uses_defaults() {
        let replay = ReplayTransport::new().respond_ok(
            r#"{"meta":{"code":200},"data":{"outgoing_status":"follows","incoming_status":null,"target_user_is_private":null}}"#,
        );
        let rel = session(&replay).get_relationship_with("2").unwrap();
        assert_eq!(rel.outgoing_status, OutgoingStatus::Follows);
        assert_eq!(rel.incoming_status, crate::relationship::IncomingStatus::None);
        assert!(!rel.target_user_is_private);
    }

    #[test]
    fn current_user_uses_self() {
        let replay = ReplayTransport::new().respond_ok(ok(json!({"id": "1", "username": "me"})));
        let user = session(&replay).get_current_user().unwrap();
        assert_eq!(user.username, "me");
        assert_eq!(replay.requests()[0].url, "http://api.test/v1/users/self?access_token=tok");
    }

    #[test]
    fn search_users_encodes_query() {
        let replay = ReplayTransport::new().respond_ok(ok(users(&["4"])));
        let found = session(&replay).search_users_by_name("jack & jill").unwrap();
        assert_eq!(ids(&found), vec!["4"]);
        assert_eq!(
            replay.requests()[0].url,
            "http://api.test/v1/users/search?access_token=tok&q=jack+%26+jill"
        );
    }

    #[test]
    fn search_media_sends_only_present_filters() {
        let replay = ReplayTransport::new().respond_ok(ok(json!([{"id": "m1"}])));
        let media = session(&replay)
            .search_media(&MediaSearch::new(48.858844, 2.294351).distance(1000))
            .unwrap();
        assert_eq!(media[0].id, "m1");
        assert_eq!(
            replay.requests()[0].url,
            "http://api.test/v1/media/search?access_token=tok&lat=48.858844&lng=2.294351&distance=1000"
        );
    }

    #[test]
    fn list_without_data_is_malformed() {
        let replay = ReplayTransport::new().respond_ok(r#"{"meta":{"code":200}}"#);
        let err = session(&replay).get_popular_media().unwrap_err();
        assert!(matches!(err, ApiError::MissingField("data")));
    }

    #[test]
    fn mutations_report_meta_code() {
        let replay = ReplayTransport::new()
            .respond_ok(r#"{"meta":{"code":200},"data":null}"#)
            .respond(400, r#"{"meta":{"code":400,"error_type":"APIError"}}"#)
            .respond_ok(r#"{"meta":{"code":200}}"#)
            .respond_ok(r#"{"meta":{"code":429}}"#);
        let s = session(&replay);

        assert!(s.like_media("m1").unwrap());
        assert!(!s.remove_media_like("m1").unwrap());
        assert!(s.modify_relationship("2", Action::Follow).unwrap());
        assert!(!s.remove_comment("m1", "c1").unwrap());
    }

    #[test]
    fn mutation_without_meta_code_is_malformed() {
        let replay = ReplayTransport::new().respond_ok(r#"{"data":null}"#);
        let err = session(&replay).like_media("m1").unwrap_err();
        assert!(matches!(err, ApiError::MissingField("meta.code")));
    }

    #[test]
    fn like_puts_token_in_form_body() {
        let replay = ReplayTransport::new().respond_ok(ok(Value::Null));
        session(&replay).like_media("m 1").unwrap();

        let req = &replay.requests()[0];
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://api.test/v1/media/m%201/likes");
        assert_eq!(req.body.as_deref(), Some("access_token=tok"));
    }

    #[test]
    fn modify_relationship_sends_action_form_field() {
        let replay = ReplayTransport::new().respond_ok(ok(json!({"outgoing_status": "requested"})));
        session(&replay).modify_relationship("2", Action::Unblock).unwrap();

        let req = &replay.requests()[0];
        assert_eq!(req.url, "http://api.test/v1/users/2/relationship?access_token=tok");
        assert_eq!(req.body.as_deref(), Some("action=unblock"));
    }

    #[test]
    fn relationship_lookup() {
        let replay = ReplayTransport::new().respond_ok(ok(
            json!({"outgoing_status": "follows", "incoming_status": "followed_by"}),
        ));
        let rel = session(&replay).get_relationship_with("2").unwrap();
        assert_eq!(rel.outgoing_status, OutgoingStatus::Follows);
    }

    #[test]
    fn post_comment_returns_created_comment() {
        let replay = ReplayTransport::new().respond_ok(ok(json!({
            "id": "c77",
            "created_time": "1300000000",
            "text": "nice pic",
            "from": {"id": "1", "username": "me"}
        })));
        let comment = session(&replay).post_comment("m1", "nice pic").unwrap();

        assert_eq!(comment.id, "c77");
        assert_eq!(comment.created_time, 1_300_000_000);
        let req = &replay.requests()[0];
        assert_eq!(req.url, "http://api.test/v1/media/m1/comments");
        assert_eq!(req.body.as_deref(), Some("access_token=tok&text=nice+pic"));
    }

    #[test]
    fn post_comment_rejected_by_server() {
        let replay = ReplayTransport::new().respond(
            400,
            r#"{"meta":{"code":400,"error_type":"APIError","error_message":"comment too long"}}"#,
        );
        let err = session(&replay).post_comment("m1", "x").unwrap_err();
        assert!(matches!(err, ApiError::Api { code: 400, ref message, .. } if message == "comment too long"));
    }

    #[test]
    fn remove_comment_is_a_delete_with_token_in_query() {
        let replay = ReplayTransport::new().respond_ok(ok(Value::Null));
        assert!(session(&replay).remove_comment("m1", "c9").unwrap());
        let req = &replay.requests()[0];
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "http://api.test/v1/media/m1/comments/c9?access_token=tok");
    }

    #[test]
    fn search_locations_with_and_without_distance() {
        let replay = ReplayTransport::new()
            .respond_ok(ok(json!([{"id": 1, "name": "Eiffel Tower", "latitude": 48.8, "longitude": 2.2}])))
            .respond_ok(ok(json!([])));
        let s = session(&replay);

        let places = s.search_locations(48.8, 2.2, Some(500)).unwrap();
        assert_eq!(places[0].id, "1");
        assert!(s.search_locations(0.5, 1.0, None).unwrap().is_empty());

        let urls: Vec<String> = replay.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://api.test/v1/locations/search?access_token=tok&lat=48.8&lng=2.2&distance=500",
                "http://api.test/v1/locations/search?access_token=tok&lat=0.5&lng=1",
            ]
        );
    }

    #[test]
    fn transport_failure_propagates() {
        let replay = ReplayTransport::new();
        let err = session(&replay).get_popular_media().unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[test]
    #[tracing_test::traced_test]
    fn token_never_reaches_the_logs() {
        let replay = ReplayTransport::new()
            .respond_ok(page(users(&["1"]), Some("http://api.test/v1/users/self/feed?cursor=1")))
            .respond_ok(page(json!([]), None));
        session(&replay).get_feed(5).unwrap();

        assert!(logs_contain("api response"));
        assert!(logs_contain("ran out of pages"));
        assert!(!logs_contain("access_token"));
    }
}

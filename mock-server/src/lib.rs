//! In-memory emulation of the Instagram v1 API.
//!
//! Serves a small seeded world (five users, a handful of media, two places)
//! behind the same routes, envelope and pagination scheme as the real API.
//! Every request must carry `ACCESS_TOKEN`, either in the query string or in
//! a POST form body. Lists are paged `PAGE_SIZE` items at a time with an
//! absolute `next_url`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    routing::{delete, get},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// The only token the server accepts.
pub const ACCESS_TOKEN: &str = "mock-access-token";

/// Id of the user that owns `ACCESS_TOKEN`.
pub const SELF_ID: &str = "1";

pub const PAGE_SIZE: usize = 2;

const DEFAULT_SEARCH_DISTANCE: f64 = 1000.0;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub profile_picture: String,
    pub bio: String,
    pub website: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub created_time: String,
    pub text: String,
    pub from: User,
}

#[derive(Clone, Debug)]
pub struct MediaRecord {
    pub id: String,
    pub kind: &'static str,
    pub owner: String,
    pub created_time: i64,
    pub filter: &'static str,
    pub tags: Vec<String>,
    pub location: Option<String>,
}

/// Everything the server knows. Media are kept newest first.
#[derive(Debug, Default)]
pub struct Store {
    pub users: Vec<User>,
    pub media: Vec<MediaRecord>,
    pub locations: Vec<Location>,
    /// user id -> ids of the users they follow
    pub follows: HashMap<String, Vec<String>>,
    /// users waiting for `SELF_ID` to approve them
    pub requested_by: Vec<String>,
    /// private users `SELF_ID` has asked to follow
    pub pending: HashSet<String>,
    pub private: HashSet<String>,
    pub blocked: HashSet<String>,
    /// media id -> ids of users who liked it
    pub likes: HashMap<String, Vec<String>>,
    pub comments: HashMap<String, Vec<Comment>>,
}

impl Store {
    pub fn seeded() -> Self {
        let user = |id: &str, username: &str, full_name: &str| User {
            id: id.to_string(),
            username: username.to_string(),
            full_name: full_name.to_string(),
            profile_picture: format!("http://images.mock/profiles/{id}.jpg"),
            bio: String::new(),
            website: String::new(),
        };
        let media = |id: &str, kind, owner: &str, created_time, tags: &[&str], location: Option<&str>| MediaRecord {
            id: id.to_string(),
            kind,
            owner: owner.to_string(),
            created_time,
            filter: "Normal",
            tags: tags.iter().map(|t| t.to_string()).collect(),
            location: location.map(str::to_string),
        };
        let ids = |ids: &[&str]| ids.iter().map(|id| id.to_string()).collect::<Vec<_>>();

        let mut store = Store {
            users: vec![
                user("1", "alice", "Alice Archer"),
                user("2", "bob", "Bob Baker"),
                user("3", "carol", "Carol Cooper"),
                user("4", "dave", "Dave Dyer"),
                user("5", "erin", "Erin Evans"),
            ],
            media: vec![
                media("m5", "image", "3", 1_300_000_500, &["sunset", "paris"], Some("100")),
                media("m4", "video", "2", 1_300_000_400, &["sunset"], None),
                media("m3", "image", "1", 1_300_000_300, &["sunrise"], Some("200")),
                media("m2", "image", "4", 1_300_000_200, &["sunset"], Some("100")),
                media("m1", "image", "1", 1_300_000_100, &["paris"], Some("100")),
            ],
            locations: vec![
                Location {
                    id: "100".to_string(),
                    name: "Eiffel Tower".to_string(),
                    latitude: 48.858844,
                    longitude: 2.294351,
                },
                Location {
                    id: "200".to_string(),
                    name: "Louvre".to_string(),
                    latitude: 48.860611,
                    longitude: 2.337644,
                },
            ],
            requested_by: ids(&["5"]),
            private: ["4"].iter().map(|id| id.to_string()).collect(),
            ..Store::default()
        };
        store.follows.insert("1".to_string(), ids(&["2", "3"]));
        store.follows.insert("2".to_string(), ids(&["1", "3"]));
        store.follows.insert("3".to_string(), ids(&["1"]));
        store.follows.insert("5".to_string(), ids(&["2"]));
        store.likes.insert("m5".to_string(), ids(&["1", "2"]));
        store.likes.insert("m4".to_string(), ids(&["1"]));
        store.likes.insert("m2".to_string(), ids(&["3"]));
        store.comments.insert(
            "m5".to_string(),
            vec![Comment {
                id: "c1".to_string(),
                created_time: "1300000600".to_string(),
                text: "what a view".to_string(),
                from: store.users[1].clone(),
            }],
        );
        store
    }

    fn user(&self, id: &str) -> Option<&User> {
        let id = if id == "self" { SELF_ID } else { id };
        self.users.iter().find(|u| u.id == id)
    }

    fn follows_of(&self, id: &str) -> &[String] {
        self.follows.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    fn followers_of(&self, id: &str) -> Vec<String> {
        self.users
            .iter()
            .filter(|u| self.follows_of(&u.id).iter().any(|f| f == id))
            .map(|u| u.id.clone())
            .collect()
    }

    fn user_json(&self, user: &User) -> Value {
        json!({
            "id": user.id,
            "username": user.username,
            "full_name": user.full_name,
            "profile_picture": user.profile_picture,
            "bio": user.bio,
            "website": user.website,
            "counts": {
                "media": self.media.iter().filter(|m| m.owner == user.id).count(),
                "follows": self.follows_of(&user.id).len(),
                "followed_by": self.followers_of(&user.id).len(),
            }
        })
    }

    fn users_json(&self, ids: &[String]) -> Vec<Value> {
        ids.iter()
            .filter_map(|id| self.user(id))
            .map(|u| self.user_json(u))
            .collect()
    }

    fn media_json(&self, media: &MediaRecord) -> Value {
        let image = |size: &str, px: u32| {
            json!({"url": format!("http://images.mock/{}/{size}.jpg", media.id), "width": px, "height": px})
        };
        let likers = self.likes.get(&media.id).cloned().unwrap_or_default();
        let comments = self.comments.get(&media.id).cloned().unwrap_or_default();
        let location = media
            .location
            .as_deref()
            .and_then(|id| self.locations.iter().find(|l| l.id == id));
        let mut value = json!({
            "id": media.id,
            "type": media.kind,
            "filter": media.filter,
            "tags": media.tags,
            "created_time": media.created_time.to_string(),
            "link": format!("http://instagr.am/p/{}/", media.id),
            "user": self.user(&media.owner),
            "caption": null,
            "comments": {"count": comments.len(), "data": comments},
            "likes": {"count": likers.len(), "data": self.users_json(&likers)},
            "images": {
                "low_resolution": image("low", 306),
                "thumbnail": image("thumb", 150),
                "standard_resolution": image("standard", 612),
            },
            "location": location,
            "user_has_liked": likers.iter().any(|id| id == SELF_ID),
            "users_in_photo": [],
        });
        if media.kind == "video" {
            value["videos"] = json!({
                "standard_resolution": {"url": format!("http://videos.mock/{}.mp4", media.id), "width": 640, "height": 640}
            });
        }
        value
    }

    fn media_list(&self, filter: impl Fn(&MediaRecord) -> bool) -> Vec<Value> {
        self.media
            .iter()
            .filter(|m| filter(m))
            .map(|m| self.media_json(m))
            .collect()
    }

    fn tag_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for tag in self.media.iter().flat_map(|m| m.tags.iter()) {
            match counts.iter_mut().find(|(name, _)| name == tag) {
                Some((_, count)) => *count += 1,
                None => counts.push((tag.clone(), 1)),
            }
        }
        counts
    }

    fn relationship_json(&self, target: &str) -> Value {
        let outgoing = if self.follows_of(SELF_ID).iter().any(|id| id == target) {
            "follows"
        } else if self.pending.contains(target) {
            "requested"
        } else {
            "none"
        };
        let incoming = if self.blocked.contains(target) {
            "blocked_by_you"
        } else if self.follows_of(target).iter().any(|id| id == SELF_ID) {
            "followed_by"
        } else if self.requested_by.iter().any(|id| id == target) {
            "requested_by"
        } else {
            "none"
        };
        json!({
            "outgoing_status": outgoing,
            "incoming_status": incoming,
            "target_user_is_private": self.private.contains(target),
        })
    }

    fn apply(&mut self, target: &str, action: &str) -> Result<(), String> {
        match action {
            "follow" if self.private.contains(target) => {
                self.pending.insert(target.to_string());
            }
            "follow" => {
                let follows = self.follows.entry(SELF_ID.to_string()).or_default();
                if !follows.iter().any(|id| id == target) {
                    follows.push(target.to_string());
                }
            }
            "unfollow" => {
                self.pending.remove(target);
                unfollow(&mut self.follows, SELF_ID, target);
            }
            "block" => {
                self.blocked.insert(target.to_string());
                unfollow(&mut self.follows, SELF_ID, target);
                unfollow(&mut self.follows, target, SELF_ID);
            }
            "unblock" => {
                self.blocked.remove(target);
            }
            "approve" | "deny" => {
                let position = self
                    .requested_by
                    .iter()
                    .position(|id| id == target)
                    .ok_or_else(|| format!("user {target} has not requested to follow you"))?;
                self.requested_by.remove(position);
                if action == "approve" {
                    self.follows
                        .entry(target.to_string())
                        .or_default()
                        .push(SELF_ID.to_string());
                }
            }
            other => return Err(format!("unknown action {other:?}")),
        }
        Ok(())
    }
}

fn unfollow(follows: &mut HashMap<String, Vec<String>>, from: &str, to: &str) {
    if let Some(list) = follows.get_mut(from) {
        list.retain(|id| id != to);
    }
}

pub type Db = Arc<RwLock<Store>>;

type Reply = (StatusCode, Json<Value>);
type Params = HashMap<String, String>;

pub fn app() -> Router {
    app_with(Store::seeded())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/v1/users/search", get(search_users))
        .route("/v1/users/self/feed", get(feed))
        .route("/v1/users/self/media/liked", get(liked_media))
        .route("/v1/users/self/requested-by", get(follow_requests))
        .route("/v1/users/self", get(get_self))
        .route("/v1/users/self/media/recent", get(self_media))
        .route("/v1/users/{user_id}", get(get_user))
        .route("/v1/users/{user_id}/media/recent", get(user_media))
        .route("/v1/users/{user_id}/follows", get(follows))
        .route("/v1/users/{user_id}/followed-by", get(followers))
        .route(
            "/v1/users/{user_id}/relationship",
            get(get_relationship).post(modify_relationship),
        )
        .route("/v1/media/search", get(search_media))
        .route("/v1/media/popular", get(popular_media))
        .route("/v1/media/{media_id}", get(get_media))
        .route("/v1/media/{media_id}/comments", get(get_comments).post(post_comment))
        .route("/v1/media/{media_id}/comments/{comment_id}", delete(delete_comment))
        .route(
            "/v1/media/{media_id}/likes",
            get(get_likes).post(like).delete(unlike),
        )
        .route("/v1/tags/search", get(search_tags))
        .route("/v1/tags/{tag_name}", get(get_tag))
        .route("/v1/tags/{tag_name}/media/recent", get(tag_media))
        .route("/v1/locations/search", get(search_locations))
        .route("/v1/locations/{location_id}", get(get_location))
        .route("/v1/locations/{location_id}/media/recent", get(location_media))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock api listening");
    }
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Envelope helpers
// ---------------------------------------------------------------------------

fn ok(data: Value) -> Reply {
    (StatusCode::OK, Json(json!({"meta": {"code": 200}, "data": data})))
}

fn api_error(error_type: &str, message: impl Into<String>) -> Reply {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"meta": {"code": 400, "error_type": error_type, "error_message": message.into()}})),
    )
}

fn not_found(message: impl Into<String>) -> Reply {
    api_error("APINotFoundError", message)
}

fn authorize(params: &Params) -> Result<(), Reply> {
    match params.get("access_token") {
        Some(token) if token == ACCESS_TOKEN => Ok(()),
        Some(_) => Err(api_error("OAuthAccessTokenException", "The access_token provided is invalid.")),
        None => Err(api_error(
            "OAuthParameterException",
            "Missing client_id or access_token URL parameter.",
        )),
    }
}

/// Token from the query string, falling back to the form body.
fn authorize_post(query: &Params, form: &Params) -> Result<(), Reply> {
    if query.contains_key("access_token") {
        authorize(query)
    } else {
        authorize(form)
    }
}

/// Serve the page of `items` selected by the `cursor` query parameter.
fn paginate(items: Vec<Value>, params: &Params, headers: &HeaderMap, uri: &Uri) -> Reply {
    let start = params
        .get("cursor")
        .and_then(|c| c.parse::<usize>().ok())
        .unwrap_or(0)
        .min(items.len());
    let end = (start + PAGE_SIZE).min(items.len());
    let pagination = if end < items.len() {
        let host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("localhost");
        json!({"next_url": format!("http://{host}{}?access_token={ACCESS_TOKEN}&cursor={end}", uri.path())})
    } else {
        json!({})
    };
    let page: Vec<Value> = items[start..end].to_vec();
    (
        StatusCode::OK,
        Json(json!({"meta": {"code": 200}, "data": page, "pagination": pagination})),
    )
}

fn coordinates(params: &Params) -> Result<(f64, f64, f64), Reply> {
    let number = |key: &str| params.get(key).and_then(|v| v.parse::<f64>().ok());
    let (Some(lat), Some(lng)) = (number("lat"), number("lng")) else {
        return Err(api_error("APIInvalidParametersError", "lat and lng are required"));
    };
    Ok((lat, lng, number("distance").unwrap_or(DEFAULT_SEARCH_DISTANCE)))
}

/// Equirectangular approximation, good enough at city scale.
fn distance_metres(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS: f64 = 6_371_000.0;
    let x = (lng2 - lng1).to_radians() * ((lat1 + lat2) / 2.0).to_radians().cos();
    let y = (lat2 - lat1).to_radians();
    (x * x + y * y).sqrt() * EARTH_RADIUS
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

async fn get_user(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Reply, Reply> {
    user_reply(&db, &user_id, &params).await
}

async fn get_self(State(db): State<Db>, Query(params): Query<Params>) -> Result<Reply, Reply> {
    user_reply(&db, SELF_ID, &params).await
}

async fn user_reply(db: &Db, user_id: &str, params: &Params) -> Result<Reply, Reply> {
    authorize(params)?;
    let store = db.read().await;
    let user = store
        .user(user_id)
        .ok_or_else(|| not_found("this user does not exist"))?;
    Ok(ok(store.user_json(user)))
}

async fn user_media(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Reply, Reply> {
    user_media_reply(&db, &user_id, &params, &headers, &uri).await
}

async fn self_media(
    State(db): State<Db>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Reply, Reply> {
    user_media_reply(&db, SELF_ID, &params, &headers, &uri).await
}

async fn user_media_reply(
    db: &Db,
    user_id: &str,
    params: &Params,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<Reply, Reply> {
    authorize(params)?;
    let store = db.read().await;
    let owner = store
        .user(user_id)
        .ok_or_else(|| not_found("this user does not exist"))?
        .id
        .clone();
    let items = store.media_list(|m| m.owner == owner);
    Ok(paginate(items, params, headers, uri))
}

async fn feed(
    State(db): State<Db>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Reply, Reply> {
    authorize(&params)?;
    let store = db.read().await;
    let follows = store.follows_of(SELF_ID).to_vec();
    let items = store.media_list(|m| m.owner == SELF_ID || follows.contains(&m.owner));
    Ok(paginate(items, &params, &headers, &uri))
}

async fn liked_media(
    State(db): State<Db>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Reply, Reply> {
    authorize(&params)?;
    let store = db.read().await;
    let items = store.media_list(|m| {
        store
            .likes
            .get(&m.id)
            .is_some_and(|likers| likers.iter().any(|id| id == SELF_ID))
    });
    Ok(paginate(items, &params, &headers, &uri))
}

async fn search_users(State(db): State<Db>, Query(params): Query<Params>) -> Result<Reply, Reply> {
    authorize(&params)?;
    let query = params
        .get("q")
        .map(|q| q.to_lowercase())
        .ok_or_else(|| api_error("APIInvalidParametersError", "missing q"))?;
    let store = db.read().await;
    let found: Vec<Value> = store
        .users
        .iter()
        .filter(|u| u.username.to_lowercase().contains(&query) || u.full_name.to_lowercase().contains(&query))
        .map(|u| store.user_json(u))
        .collect();
    Ok(ok(Value::Array(found)))
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

async fn follows(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Reply, Reply> {
    authorize(&params)?;
    let store = db.read().await;
    let user = store
        .user(&user_id)
        .ok_or_else(|| not_found("this user does not exist"))?;
    let items = store.users_json(store.follows_of(&user.id));
    Ok(paginate(items, &params, &headers, &uri))
}

async fn followers(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Reply, Reply> {
    authorize(&params)?;
    let store = db.read().await;
    let user = store
        .user(&user_id)
        .ok_or_else(|| not_found("this user does not exist"))?;
    let items = store.users_json(&store.followers_of(&user.id));
    Ok(paginate(items, &params, &headers, &uri))
}

async fn follow_requests(State(db): State<Db>, Query(params): Query<Params>) -> Result<Reply, Reply> {
    authorize(&params)?;
    let store = db.read().await;
    Ok(ok(Value::Array(store.users_json(&store.requested_by))))
}

async fn get_relationship(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Reply, Reply> {
    authorize(&params)?;
    let store = db.read().await;
    let user = store
        .user(&user_id)
        .ok_or_else(|| not_found("this user does not exist"))?;
    Ok(ok(store.relationship_json(&user.id)))
}

async fn modify_relationship(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    Query(params): Query<Params>,
    Form(form): Form<Params>,
) -> Result<Reply, Reply> {
    authorize_post(&params, &form)?;
    let action = form
        .get("action")
        .ok_or_else(|| api_error("APIInvalidParametersError", "missing action"))?;
    let mut store = db.write().await;
    let target = store
        .user(&user_id)
        .ok_or_else(|| not_found("this user does not exist"))?
        .id
        .clone();
    store
        .apply(&target, action)
        .map_err(|message| api_error("APIInvalidParametersError", message))?;
    debug!(%target, %action, "relationship modified");
    Ok(ok(store.relationship_json(&target)))
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

async fn get_media(
    State(db): State<Db>,
    Path(media_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Reply, Reply> {
    authorize(&params)?;
    let store = db.read().await;
    let media = store
        .media
        .iter()
        .find(|m| m.id == media_id)
        .ok_or_else(|| not_found("invalid media id"))?;
    Ok(ok(store.media_json(media)))
}

async fn popular_media(State(db): State<Db>, Query(params): Query<Params>) -> Result<Reply, Reply> {
    authorize(&params)?;
    let store = db.read().await;
    Ok(ok(Value::Array(store.media_list(|_| true))))
}

async fn search_media(State(db): State<Db>, Query(params): Query<Params>) -> Result<Reply, Reply> {
    authorize(&params)?;
    let (lat, lng, distance) = coordinates(&params)?;
    let bound = |key: &str| params.get(key).and_then(|v| v.parse::<i64>().ok());
    let (min, max) = (bound("min_timestamp"), bound("max_timestamp"));
    let store = db.read().await;
    let near: HashSet<&str> = store
        .locations
        .iter()
        .filter(|l| distance_metres(lat, lng, l.latitude, l.longitude) <= distance)
        .map(|l| l.id.as_str())
        .collect();
    let found = store.media_list(|m| {
        m.location.as_deref().is_some_and(|id| near.contains(id))
            && min.is_none_or(|min| m.created_time >= min)
            && max.is_none_or(|max| m.created_time <= max)
    });
    Ok(ok(Value::Array(found)))
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

async fn get_comments(
    State(db): State<Db>,
    Path(media_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Reply, Reply> {
    authorize(&params)?;
    let store = db.read().await;
    if !store.media.iter().any(|m| m.id == media_id) {
        return Err(not_found("invalid media id"));
    }
    let comments = store.comments.get(&media_id).cloned().unwrap_or_default();
    Ok(ok(json!(comments)))
}

async fn post_comment(
    State(db): State<Db>,
    Path(media_id): Path<String>,
    Query(params): Query<Params>,
    Form(form): Form<Params>,
) -> Result<Reply, Reply> {
    authorize_post(&params, &form)?;
    let text = form
        .get("text")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| api_error("APIInvalidParametersError", "missing text"))?;
    let mut store = db.write().await;
    if !store.media.iter().any(|m| m.id == media_id) {
        return Err(not_found("invalid media id"));
    }
    let from = store
        .user(SELF_ID)
        .cloned()
        .ok_or_else(|| not_found("this user does not exist"))?;
    let comment = Comment {
        id: Uuid::new_v4().to_string(),
        created_time: now().to_string(),
        text: text.clone(),
        from,
    };
    store
        .comments
        .entry(media_id.clone())
        .or_default()
        .push(comment.clone());
    debug!(%media_id, comment_id = %comment.id, "comment created");
    Ok(ok(json!(comment)))
}

async fn delete_comment(
    State(db): State<Db>,
    Path((media_id, comment_id)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> Result<Reply, Reply> {
    authorize(&params)?;
    let mut store = db.write().await;
    let comments = store
        .comments
        .get_mut(&media_id)
        .ok_or_else(|| not_found("invalid media id"))?;
    let before = comments.len();
    comments.retain(|c| c.id != comment_id);
    if comments.len() == before {
        return Err(not_found("invalid comment id"));
    }
    debug!(%media_id, %comment_id, "comment deleted");
    Ok(ok(Value::Null))
}

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

async fn get_likes(
    State(db): State<Db>,
    Path(media_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Reply, Reply> {
    authorize(&params)?;
    let store = db.read().await;
    if !store.media.iter().any(|m| m.id == media_id) {
        return Err(not_found("invalid media id"));
    }
    let likers = store.likes.get(&media_id).cloned().unwrap_or_default();
    Ok(ok(Value::Array(store.users_json(&likers))))
}

async fn like(
    State(db): State<Db>,
    Path(media_id): Path<String>,
    Query(params): Query<Params>,
    Form(form): Form<Params>,
) -> Result<Reply, Reply> {
    authorize_post(&params, &form)?;
    let mut store = db.write().await;
    if !store.media.iter().any(|m| m.id == media_id) {
        return Err(not_found("invalid media id"));
    }
    let likers = store.likes.entry(media_id.clone()).or_default();
    if !likers.iter().any(|id| id == SELF_ID) {
        likers.push(SELF_ID.to_string());
    }
    debug!(%media_id, "media liked");
    Ok(ok(Value::Null))
}

async fn unlike(
    State(db): State<Db>,
    Path(media_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Reply, Reply> {
    authorize(&params)?;
    let mut store = db.write().await;
    let likers = store.likes.entry(media_id.clone()).or_default();
    let before = likers.len();
    likers.retain(|id| id != SELF_ID);
    if likers.len() == before {
        return Err(api_error("APIError", "you have not liked this media"));
    }
    debug!(%media_id, "media unliked");
    Ok(ok(Value::Null))
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

async fn get_tag(
    State(db): State<Db>,
    Path(tag_name): Path<String>,
    Query(params): Query<Params>,
) -> Result<Reply, Reply> {
    authorize(&params)?;
    let store = db.read().await;
    let (name, count) = store
        .tag_counts()
        .into_iter()
        .find(|(name, _)| *name == tag_name)
        .ok_or_else(|| not_found("invalid tag name"))?;
    Ok(ok(json!({"name": name, "media_count": count})))
}

async fn tag_media(
    State(db): State<Db>,
    Path(tag_name): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Reply, Reply> {
    authorize(&params)?;
    let store = db.read().await;
    let items = store.media_list(|m| m.tags.contains(&tag_name));
    Ok(paginate(items, &params, &headers, &uri))
}

async fn search_tags(State(db): State<Db>, Query(params): Query<Params>) -> Result<Reply, Reply> {
    authorize(&params)?;
    let query = params
        .get("q")
        .ok_or_else(|| api_error("APIInvalidParametersError", "missing q"))?;
    let store = db.read().await;
    let found: Vec<Value> = store
        .tag_counts()
        .into_iter()
        .filter(|(name, _)| name.starts_with(query.as_str()))
        .map(|(name, count)| json!({"name": name, "media_count": count}))
        .collect();
    Ok(ok(Value::Array(found)))
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

async fn get_location(
    State(db): State<Db>,
    Path(location_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Reply, Reply> {
    authorize(&params)?;
    let store = db.read().await;
    let location = store
        .locations
        .iter()
        .find(|l| l.id == location_id)
        .ok_or_else(|| not_found("invalid location id"))?;
    Ok(ok(json!(location)))
}

async fn location_media(
    State(db): State<Db>,
    Path(location_id): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Reply, Reply> {
    authorize(&params)?;
    let store = db.read().await;
    if !store.locations.iter().any(|l| l.id == location_id) {
        return Err(not_found("invalid location id"));
    }
    let items = store.media_list(|m| m.location.as_deref() == Some(location_id.as_str()));
    Ok(paginate(items, &params, &headers, &uri))
}

async fn search_locations(State(db): State<Db>, Query(params): Query<Params>) -> Result<Reply, Reply> {
    authorize(&params)?;
    let (lat, lng, distance) = coordinates(&params)?;
    let store = db.read().await;
    let found: Vec<&Location> = store
        .locations
        .iter()
        .filter(|l| distance_metres(lat, lng, l.latitude, l.longitude) <= distance)
        .collect();
    Ok(ok(json!(found)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_counts() {
        let store = Store::seeded();
        let alice = store.user("self").unwrap();
        let rendered = store.user_json(alice);
        assert_eq!(rendered["username"], "alice");
        assert_eq!(rendered["counts"]["media"], 2);
        assert_eq!(rendered["counts"]["follows"], 2);
        assert_eq!(rendered["counts"]["followed_by"], 2);
    }

    #[test]
    fn media_json_shape() {
        let store = Store::seeded();
        let m4 = store.media.iter().find(|m| m.id == "m4").unwrap();
        let rendered = store.media_json(m4);
        assert_eq!(rendered["type"], "video");
        assert_eq!(rendered["created_time"], "1300000400");
        assert_eq!(rendered["user"]["id"], "2");
        assert_eq!(rendered["likes"]["count"], 1);
        assert_eq!(rendered["user_has_liked"], true);
        assert!(rendered["location"].is_null());
        assert!(rendered["videos"]["standard_resolution"]["url"].is_string());
    }

    #[test]
    fn follow_private_user_is_pending() {
        let mut store = Store::seeded();
        store.apply("4", "follow").unwrap();
        assert_eq!(store.relationship_json("4")["outgoing_status"], "requested");
        store.apply("4", "unfollow").unwrap();
        assert_eq!(store.relationship_json("4")["outgoing_status"], "none");
    }

    #[test]
    fn approve_moves_request_to_follower() {
        let mut store = Store::seeded();
        assert_eq!(store.relationship_json("5")["incoming_status"], "requested_by");
        store.apply("5", "approve").unwrap();
        assert_eq!(store.relationship_json("5")["incoming_status"], "followed_by");
        assert!(store.apply("5", "deny").is_err());
    }

    #[test]
    fn block_severs_both_directions() {
        let mut store = Store::seeded();
        store.apply("2", "block").unwrap();
        let rel = store.relationship_json("2");
        assert_eq!(rel["outgoing_status"], "none");
        assert_eq!(rel["incoming_status"], "blocked_by_you");
        assert!(!store.follows_of("2").iter().any(|id| id == SELF_ID));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let mut store = Store::seeded();
        assert!(store.apply("2", "poke").is_err());
    }

    #[test]
    fn tag_counts_aggregate_media() {
        let store = Store::seeded();
        let counts = store.tag_counts();
        assert!(counts.contains(&("sunset".to_string(), 3)));
        assert!(counts.contains(&("paris".to_string(), 2)));
        assert!(counts.contains(&("sunrise".to_string(), 1)));
    }

    #[test]
    fn eiffel_tower_and_louvre_are_a_few_km_apart() {
        let d = distance_metres(48.858844, 2.294351, 48.860611, 2.337644);
        assert!((3000.0..3400.0).contains(&d), "got {d}");
    }
}

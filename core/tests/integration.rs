//! Every session operation against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the SDK over real
//! HTTP through `UreqTransport`. Validates URL construction, token placement,
//! envelope handling and pagination end to end with the actual server.
#![cfg(feature = "ureq")]

use instagram_core::{
    Action, ApiError, IncomingStatus, MediaKind, MediaSearch, OutgoingStatus, Session, SessionConfig,
    UreqTransport,
};

fn start_server() -> std::net::SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn session(addr: std::net::SocketAddr, token: &str) -> Session<UreqTransport> {
    let config = SessionConfig::for_base_url(&format!("http://{addr}/v1"), token).unwrap();
    Session::new(config, UreqTransport::new())
}

fn ids<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    items.into_iter().collect()
}

#[test]
fn read_operations() {
    let addr = start_server();
    let s = session(addr, mock_server::ACCESS_TOKEN);

    // Users.
    let me = s.get_current_user().unwrap();
    assert_eq!(me.username, "alice");
    assert_eq!(me.counts.unwrap().followed_by, 2);

    let bob = s.get_user("2").unwrap();
    assert_eq!(bob.full_name, "Bob Baker");

    let err = s.get_user("999").unwrap_err();
    assert!(matches!(err, ApiError::NotFound { resource: "User", ref id } if id == "999"));

    let found = s.search_users_by_name("ca").unwrap();
    assert_eq!(ids(found.iter().map(|u| u.username.as_str())), vec!["carol"]);

    // Media.
    let m4 = s.get_media("m4").unwrap();
    assert_eq!(m4.kind, MediaKind::Video);
    assert!(m4.user_has_liked);
    assert_eq!(m4.user.as_ref().unwrap().id, "2");
    assert!(m4.videos.is_some());
    assert!(matches!(s.get_media("nope"), Err(ApiError::NotFound { .. })));

    let popular = s.get_popular_media().unwrap();
    assert_eq!(popular.len(), 5);

    let near = s
        .search_media(&MediaSearch::new(48.858844, 2.294351).distance(500).max_timestamp(1_300_000_150))
        .unwrap();
    assert_eq!(ids(near.iter().map(|m| m.id.as_str())), vec!["m1"]);

    let comments = s.get_media_comments("m5").unwrap();
    assert_eq!(comments[0].text, "what a view");
    assert_eq!(comments[0].from.as_ref().unwrap().username, "bob");

    let likers = s.get_likers("m5").unwrap();
    assert_eq!(ids(likers.iter().map(|u| u.id.as_str())), vec!["1", "2"]);

    // Tags.
    let tag = s.get_tag("sunset").unwrap();
    assert_eq!(tag.media_count, 3);
    assert!(matches!(s.get_tag("unheard-of"), Err(ApiError::NotFound { resource: "Tag", .. })));

    let tags = s.search_tags("sun").unwrap();
    let mut names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["sunrise", "sunset"]);

    // Locations.
    let eiffel = s.get_location("100").unwrap();
    assert_eq!(eiffel.name, "Eiffel Tower");
    assert_eq!(eiffel.latitude, Some(48.858844));

    let places = s.search_locations(48.8606, 2.3376, Some(200)).unwrap();
    assert_eq!(ids(places.iter().map(|l| l.id.as_str())), vec!["200"]);
}

#[test]
fn pagination_over_http() {
    let addr = start_server();
    let s = session(addr, mock_server::ACCESS_TOKEN);

    // Feed holds m5, m4, m3, m1 (own media and followed users), two per page.
    let first = s.get_feed(1).unwrap();
    assert_eq!(ids(first.iter().map(|m| m.id.as_str())), vec!["m5", "m4"]);
    let second = s.get_feed(2).unwrap();
    assert_eq!(ids(second.iter().map(|m| m.id.as_str())), vec!["m3", "m1"]);
    let beyond = s.get_feed(10).unwrap();
    assert_eq!(beyond, second);

    let sunset = s.get_recent_media_for_tag("sunset", 2).unwrap();
    assert_eq!(ids(sunset.iter().map(|m| m.id.as_str())), vec!["m2"]);

    let at_eiffel = s.get_recent_media_from_location("100", 1).unwrap();
    assert_eq!(ids(at_eiffel.iter().map(|m| m.id.as_str())), vec!["m5", "m2"]);

    let mine = s.get_recent_published_media("1", 1).unwrap();
    assert_eq!(ids(mine.iter().map(|m| m.id.as_str())), vec!["m3", "m1"]);

    let liked = s.get_liked_media(1).unwrap();
    assert_eq!(ids(liked.iter().map(|m| m.id.as_str())), vec!["m5", "m4"]);

    let follows = s.get_follows("1", 1).unwrap();
    assert_eq!(ids(follows.iter().map(|u| u.id.as_str())), vec!["2", "3"]);

    let followers = s.get_followers("2", 1).unwrap();
    assert_eq!(ids(followers.iter().map(|u| u.id.as_str())), vec!["1", "5"]);

    assert!(matches!(s.get_follows("1", 0), Err(ApiError::InvalidPage)));
}

#[test]
fn write_operations() {
    let addr = start_server();
    let s = session(addr, mock_server::ACCESS_TOKEN);

    // Comments.
    let comment = s.post_comment("m1", "nice pic").unwrap();
    assert_eq!(comment.text, "nice pic");
    assert_eq!(comment.from.as_ref().unwrap().id, "1");
    assert!(comment.created_time > 0);
    assert_eq!(s.get_media_comments("m1").unwrap().len(), 1);

    assert!(s.remove_comment("m1", &comment.id).unwrap());
    assert!(!s.remove_comment("m1", &comment.id).unwrap());
    assert!(s.get_media_comments("m1").unwrap().is_empty());

    // Likes.
    assert!(!s.get_media("m1").unwrap().user_has_liked);
    assert!(s.like_media("m1").unwrap());
    assert!(s.get_media("m1").unwrap().user_has_liked);
    assert!(s.remove_media_like("m1").unwrap());
    assert!(!s.remove_media_like("m1").unwrap());

    // Relationships.
    let rel = s.get_relationship_with("2").unwrap();
    assert_eq!(rel.outgoing_status, OutgoingStatus::Follows);
    assert_eq!(rel.incoming_status, IncomingStatus::FollowedBy);

    assert!(s.modify_relationship("2", Action::Unfollow).unwrap());
    assert_eq!(s.get_relationship_with("2").unwrap().outgoing_status, OutgoingStatus::None);

    assert!(s.modify_relationship("4", Action::Follow).unwrap());
    let private = s.get_relationship_with("4").unwrap();
    assert_eq!(private.outgoing_status, OutgoingStatus::RequestedToFollow);
    assert!(private.target_user_is_private);

    let requests = s.get_follow_requests().unwrap();
    assert_eq!(ids(requests.iter().map(|u| u.id.as_str())), vec!["5"]);
    assert!(s.modify_relationship("5", Action::Approve).unwrap());
    assert!(s.get_follow_requests().unwrap().is_empty());
    assert!(!s.modify_relationship("5", Action::Deny).unwrap());
}

#[test]
fn bad_token_surfaces_server_error() {
    let addr = start_server();
    let s = session(addr, "not-the-token");

    let err = s.get_popular_media().unwrap_err();
    assert!(
        matches!(err, ApiError::Api { code: 400, ref error_type, .. } if error_type == "OAuthAccessTokenException")
    );
    assert!(!s.like_media("m1").unwrap());
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let s = session(addr, mock_server::ACCESS_TOKEN);
    let err = s.get_popular_media().unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

//! End-to-end tests against the live mock server.
//!
//! Each test starts the mock backend on an ephemeral port with its own
//! store, then drives the `Marketplace` facade over real HTTP — request
//! building, reqwest execution, and response parsing together.

use std::time::Duration;

use marketplace_core::{
    primary_image, ApiConfig, ApiError, CreateListing, CreateUser, ImageLookup, ImageUpload,
    Marketplace, ProfileImage, SendMessage, Session, ThreadKey, UpdateUser,
};
use tokio::net::TcpListener;

async fn start() -> (Marketplace, mock_server::Db) {
    let db = mock_server::Db::default();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run_with_db(listener, db.clone()));
    let api = Marketplace::new(ApiConfig::new(&format!("http://{addr}/v1")));
    (api, db)
}

async fn register(api: &Marketplace, username: &str) {
    api.create_user(&CreateUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: "hunter2".to_string(),
        full_name: None,
        user_location: None,
    })
    .await
    .unwrap();
}

async fn post_listing(api: &Marketplace, seller: &str, title: &str, price: f64) -> i64 {
    api.create_listing(&CreateListing {
        seller: seller.to_string(),
        title: title.to_string(),
        description: format!("{title} description"),
        price,
        item_condition: None,
        location: None,
        tags: None,
    })
    .await
    .unwrap()
    .id
}

fn jpeg(filename: &str) -> ImageUpload {
    ImageUpload {
        filename: filename.to_string(),
        content_type: "image/jpeg".to_string(),
        bytes: vec![0xff, 0xd8, 0xff, 0xe0],
    }
}

#[tokio::test]
async fn listing_lifecycle() {
    let (api, _db) = start().await;
    register(&api, "ikeafan").await;

    let page = api.listings().await.unwrap();
    assert!(page.listings.is_empty());
    assert_eq!(page.pagination.total_count, 0);

    let id = post_listing(&api, "ikeafan", "Desk lamp", 12.5).await;

    // Every listed id can be fetched back with an identical id.
    let page = api.listings().await.unwrap();
    assert_eq!(page.listings.len(), 1);
    for listing in &page.listings {
        let fetched = api.listing(listing.id).await.unwrap();
        assert_eq!(fetched.id, listing.id);
    }

    let listing = api.listing(id).await.unwrap();
    assert_eq!(listing.title, "Desk lamp");
    assert_eq!(listing.seller, "ikeafan");
    assert!(listing.created_datetime.is_some());

    let confirmation = api.delete_listing(id).await.unwrap();
    assert_eq!(confirmation.message, format!("Listing {id} deleted"));

    let err = api.listing(id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    let err = api.delete_listing(id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}

#[tokio::test]
async fn create_listing_surfaces_server_message() {
    let (api, _db) = start().await;

    // No such seller registered.
    let err = api
        .create_listing(&CreateListing {
            seller: "ghost".to_string(),
            title: "Chair".to_string(),
            description: "Wobbly".to_string(),
            price: 3.0,
            item_condition: None,
            location: None,
            tags: None,
        })
        .await
        .unwrap_err();
    match err {
        ApiError::Http { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "seller ghost does not exist");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn negative_price_round_trips_unmutated() {
    let (api, _db) = start().await;
    register(&api, "ikeafan").await;

    // The mock backend accepts negative prices; the client must pass the
    // value through without touching it.
    let id = post_listing(&api, "ikeafan", "Haunted mirror", -5.0).await;
    let listing = api.listing(id).await.unwrap();
    assert_eq!(listing.price, -5.0);
}

#[tokio::test]
async fn user_update_and_favorites_replacement() {
    let (api, _db) = start().await;
    register(&api, "ikeafan").await;

    let confirmation = api
        .update_user(
            "ikeafan",
            &UpdateUser {
                full_name: Some("Ike A. Fan".to_string()),
                ..UpdateUser::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(confirmation.message, "User ikeafan updated");

    api.update_favorite_listings("ikeafan", &[3, 1, 4]).await.unwrap();
    let user = api.user("ikeafan").await.unwrap();
    assert_eq!(user.full_name.as_deref(), Some("Ike A. Fan"));
    assert_eq!(user.favorite_listings, vec![3, 1, 4]);

    // Full replacement: the previous set is gone, not merged.
    api.update_favorite_listings("ikeafan", &[7]).await.unwrap();
    let user = api.user("ikeafan").await.unwrap();
    assert_eq!(user.favorite_listings, vec![7]);

    // Empty set clears favorites.
    api.update_favorite_listings("ikeafan", &[]).await.unwrap();
    let user = api.user("ikeafan").await.unwrap();
    assert!(user.favorite_listings.is_empty());

    let err = api.user("ghost").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}

#[tokio::test]
async fn messages_and_thread_grouping() {
    let (api, _db) = start().await;

    let sent = api
        .send_message(&SendMessage {
            sender: "a".to_string(),
            receiver: "b".to_string(),
            message_body: "hi".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(sent.sender, "a");
    assert_eq!(sent.receiver, "b");
    assert_eq!(sent.message_body, "hi");
    assert!(sent.id > 0);

    // Distinct timestamps keep the "latest message" assertion deterministic.
    tokio::time::sleep(Duration::from_millis(5)).await;
    let reply = api
        .send_message(&SendMessage {
            sender: "b".to_string(),
            receiver: "a".to_string(),
            message_body: "hello back".to_string(),
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    api.send_message(&SendMessage {
        sender: "c".to_string(),
        receiver: "a".to_string(),
        message_body: "is the chair still available".to_string(),
    })
    .await
    .unwrap();

    // Both orderings of the pair fetch the same conversation.
    let forward = api.messages_between("a", "b").await.unwrap();
    let backward = api.messages_between("b", "a").await.unwrap();
    assert_eq!(forward.len(), 2);
    assert_eq!(forward, backward);

    let session = Session::new("a");
    let inbox = api.inbox(&session).await.unwrap();
    assert_eq!(inbox.len(), 3);

    let threads = api.inbox_threads(&session).await.unwrap();
    assert_eq!(threads.len(), 2);
    // Newest-first: the c thread leads, then a-b with the reply as latest.
    assert_eq!(threads[0].key, ThreadKey::new("a", "c"));
    assert_eq!(threads[1].key, ThreadKey::new("b", "a"));
    assert_eq!(threads[1].latest.id, reply.id);
    assert_eq!(threads[1].key.other("a"), "b");
}

#[tokio::test]
async fn image_upload_and_primary_selection() {
    let (api, _db) = start().await;
    register(&api, "ikeafan").await;
    let listing_id = post_listing(&api, "ikeafan", "Bookshelf", 40.0).await;
    let session = Session::new("ikeafan");

    assert!(api.listing_images(listing_id).await.unwrap().is_empty());

    let first = api
        .upload_image(jpeg("front.jpg"), listing_id, &session, false)
        .await
        .unwrap();
    assert_eq!(first.filename, "front.jpg");
    assert!(!first.is_primary);

    let second = api
        .upload_image(jpeg("side.jpg"), listing_id, &session, true)
        .await
        .unwrap();
    assert!(second.is_primary);

    let images = api.listing_images(listing_id).await.unwrap();
    assert_eq!(images.len(), 2);
    // The flagged image wins over the first-returned one.
    assert_eq!(primary_image(&images).unwrap().id, second.id);

    let err = api.listing_images(listing_id + 100).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}

#[tokio::test]
async fn primary_images_batch_degrades_per_item() {
    let (api, _db) = start().await;
    register(&api, "ikeafan").await;
    let with_image = post_listing(&api, "ikeafan", "Bookshelf", 40.0).await;
    let without_image = post_listing(&api, "ikeafan", "Rug", 15.0).await;
    let session = Session::new("ikeafan");

    let uploaded = api
        .upload_image(jpeg("shelf.jpg"), with_image, &session, true)
        .await
        .unwrap();

    // One found, one empty, one failing — the batch itself still succeeds
    // and results align with the input.
    let lookups = api
        .primary_images(&[with_image, without_image, 9999])
        .await;
    assert_eq!(lookups.len(), 3);
    assert_eq!(lookups[0], ImageLookup::Found(uploaded));
    assert_eq!(lookups[1], ImageLookup::Placeholder);
    assert_eq!(lookups[2], ImageLookup::Placeholder);
    assert!(lookups[0].url().unwrap().contains("shelf.jpg"));
}

#[tokio::test]
async fn profile_images_are_best_effort() {
    let (api, db) = start().await;
    register(&api, "ikeafan").await;

    // No photo set: a normal null-url outcome, not an error.
    let profile = api.profile_image("ikeafan").await.unwrap();
    assert_eq!(profile, ProfileImage { url: None });

    db.write()
        .await
        .profile_images
        .insert("ikeafan".to_string(), "/static/profiles/ikeafan.jpg".to_string());
    let profile = api.profile_image("ikeafan").await.unwrap();
    assert_eq!(profile.url.as_deref(), Some("/static/profiles/ikeafan.jpg"));

    // Strict fetch propagates; the best-effort wrapper degrades.
    let err = api.profile_image("ghost").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
    let profile = api.profile_image_or_placeholder("ghost").await;
    assert_eq!(profile, ProfileImage { url: None });

    let profiles = api
        .profile_images(&["ikeafan".to_string(), "ghost".to_string()])
        .await;
    assert_eq!(profiles[0].url.as_deref(), Some("/static/profiles/ikeafan.jpg"));
    assert_eq!(profiles[1], ProfileImage { url: None });
}

#[tokio::test]
async fn profile_image_degrades_on_transport_failure() {
    // Nothing listens here; the strict call fails with Network, the
    // best-effort call still resolves to "no image".
    let api = Marketplace::new(ApiConfig::new("http://127.0.0.1:9/v1"));

    let err = api.profile_image("ikeafan").await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));

    let profile = api.profile_image_or_placeholder("ikeafan").await;
    assert_eq!(profile, ProfileImage { url: None });
}

#[tokio::test]
async fn tags_lifecycle() {
    let (api, _db) = start().await;
    register(&api, "ikeafan").await;
    let listing_id = post_listing(&api, "ikeafan", "Bookshelf", 40.0).await;

    assert!(api.tags().await.unwrap().is_empty());

    let tag = api.create_tag("furniture").await.unwrap();
    assert_eq!(tag.name, "furniture");
    assert!(tag.tag_id > 0);

    let tags = api.tags().await.unwrap();
    assert_eq!(tags.len(), 1);

    // Fresh listing has no tag associations.
    assert!(api.tags_for_listing(listing_id).await.unwrap().is_empty());

    let err = api.tags_for_listing(9999).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}

//! End-to-end HTTP test: start the router on an ephemeral port over in-memory storage,
//! drive it with reqwest and with the page glue's HTTP client.

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use storefront_directory::client::glue::HEARTED_CLASS;
use storefront_directory::client::{
    wire_page, ClientError, Collaborators, Dispatch, Element, HeartApi, Notifier, PageEvent,
    PageModel, Place, PlaceAutocomplete, SearchApi, StorefrontClient,
};
use storefront_directory::domain::{StoreId, UserId};
use storefront_directory::transport;
use storefront_directory::{MemoryStorage, ServiceConfig, StoreService};

async fn start_server() -> Result<String, Box<dyn std::error::Error>> {
    let service = StoreService::new(Arc::new(MemoryStorage::new()), ServiceConfig::default());
    let router = transport::http::create_router(transport::http::AppState::new(service));

    // Bind to an ephemeral port to avoid conflicts with a running server.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

fn store_body(name: &str, tags: &[&str]) -> Value {
    json!({
        "name": name,
        "description": "Coffee, cake and wifi",
        "tags": tags,
        "location": { "type": "Point", "coordinates": [-79.38, 43.65], "address": "1 King St W" },
        "author": 1
    })
}

async fn create_store(
    client: &reqwest::Client,
    base_url: &str,
    body: Value,
) -> Result<Value, Box<dyn std::error::Error>> {
    let resp = client
        .post(format!("{}/api/stores", base_url))
        .json(&body)
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    let body: Value = resp.json().await?;
    assert!(body["success"].as_bool().unwrap_or(false));
    Ok(body["data"].clone())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_store_lifecycle_over_http() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = start_server().await?;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/health", base_url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(health["data"]["status"], "ok");

    // --- create + slug disambiguation ---
    let first = create_store(&client, &base_url, store_body("Cafe Blue", &["wifi", "coffee"])).await?;
    let second = create_store(&client, &base_url, store_body("Cafe Blue", &["wifi"])).await?;
    assert_eq!(first["slug"], "cafe-blue");
    assert_eq!(second["slug"], "cafe-blue-2");
    assert_eq!(first["location"]["type"], "Point");

    // --- validation names the failing field, nothing is stored ---
    let resp = client
        .post(format!("{}/api/stores", base_url))
        .json(&json!({ "name": "No Location", "author": 1 }))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await?;
    let fields: Vec<&str> = body["data"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["location.coordinates", "location.address"]);

    // --- malformed JSON is a 422 ---
    let resp = client
        .post(format!("{}/api/stores", base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);

    let all: Value = client
        .get(format!("{}/api/stores", base_url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);

    // --- update without renaming keeps the slug ---
    let id = second["id"].as_i64().unwrap();
    let updated: Value = client
        .put(format!("{}/api/stores/{}", base_url, id))
        .json(&json!({ "description": "Now with pastries" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(updated["data"]["slug"], "cafe-blue-2");
    assert_eq!(updated["data"]["description"], "Now with pastries");

    let by_slug: Value = client
        .get(format!("{}/api/slugs/cafe-blue-2", base_url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(by_slug["data"]["id"].as_i64(), Some(id));

    // --- tags ---
    let tags: Value = client
        .get(format!("{}/api/tags", base_url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(tags["data"][0], json!({ "tag": "wifi", "count": 2 }));
    assert_eq!(tags["data"][1], json!({ "tag": "coffee", "count": 1 }));

    let tagged: Value = client
        .get(format!("{}/api/stores?tag=coffee", base_url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(tagged["data"].as_array().unwrap().len(), 1);

    // --- reviews + top stores ---
    let first_id = first["id"].as_i64().unwrap();
    for (store, rating) in [(first_id, 3), (first_id, 5), (id, 4)] {
        let resp = client
            .post(format!("{}/api/stores/{}/reviews", base_url, store))
            .json(&json!({ "author": 2, "rating": rating, "text": "ok" }))
            .send()
            .await?;
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    }
    let bad_rating = client
        .post(format!("{}/api/stores/{}/reviews", base_url, id))
        .json(&json!({ "author": 2, "rating": 9 }))
        .send()
        .await?;
    assert_eq!(bad_rating.status(), reqwest::StatusCode::BAD_REQUEST);

    let top: Value = client
        .get(format!("{}/api/top", base_url))
        .send()
        .await?
        .json()
        .await?;
    let top = top["data"].as_array().unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0]["name"], "Cafe Blue");
    assert_eq!(top[0]["averageRating"], json!(4.0));
    assert_eq!(top[0]["reviews"].as_array().unwrap().len(), 2);

    // --- delete ---
    let resp = client
        .delete(format!("{}/api/stores/{}", base_url, id))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let resp = client
        .get(format!("{}/api/stores/{}", base_url, id))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_empty_aggregations() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = start_server().await?;
    let client = reqwest::Client::new();
    for path in ["/api/tags", "/api/top", "/api/search?q=cafe"] {
        let body: Value = client
            .get(format!("{}{}", base_url, path))
            .send()
            .await?
            .json()
            .await?;
        assert!(body["success"].as_bool().unwrap_or(false), "{}", path);
        assert_eq!(body["data"], json!([]), "{}", path);
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_heart_requires_user() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = start_server().await?;
    let client = reqwest::Client::new();
    let store = create_store(&client, &base_url, store_body("Cafe Blue", &[])).await?;
    let resp = client
        .post(format!("{}/api/stores/{}/heart", base_url, store["id"]))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

    let anonymous = StorefrontClient::new(base_url.clone());
    assert!(matches!(
        anonymous.toggle_heart(StoreId(1)).await,
        Err(ClientError::Unauthenticated)
    ));
    Ok(())
}

struct FixedPlace;

#[async_trait::async_trait]
impl PlaceAutocomplete for FixedPlace {
    async fn resolve(&self, _address: &str) -> Result<Place, ClientError> {
        Ok(Place {
            lat: 43.65,
            lng: -79.38,
        })
    }
}

#[derive(Default)]
struct Messages(Mutex<Vec<String>>);

impl Notifier for Messages {
    fn notify(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_page_glue_against_live_api() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = start_server().await?;
    let client = reqwest::Client::new();
    let store = create_store(&client, &base_url, store_body("Cafe Blue", &[])).await?;
    let store_id = store["id"].as_i64().unwrap();

    let api = Arc::new(StorefrontClient::new(base_url.clone()).with_user(UserId(5)));
    let suggestions = api.search("cafe").await?;
    assert_eq!(suggestions[0].href, "/store/cafe-blue");

    let mut page = PageModel::new();
    let search = page.push(Element::new("input").with_class("search"));
    let counter = page.push(Element::new("span").with_class("heart-count").with_text("0"));
    let heart = page.push(
        Element::new("form")
            .with_class("heart")
            .with_attr("action", &format!("/api/stores/{}/heart", store_id)),
    );
    let missing = page.push(
        Element::new("form")
            .with_class("heart")
            .with_attr("action", "/api/stores/999/heart"),
    );
    let messages = Arc::new(Messages::default());
    let wired = wire_page(
        page,
        Collaborators {
            places: Arc::new(FixedPlace),
            search: api.clone(),
            hearts: api.clone(),
            notifier: messages.clone(),
        },
    );

    let outcome = wired.dispatch(PageEvent::Submit { element: heart }).await;
    assert_eq!(outcome, Dispatch::Handled { prevent_default: true });
    let snapshot = wired.page().await;
    assert!(snapshot.get(heart).unwrap().has_class(HEARTED_CLASS));
    assert_eq!(snapshot.get(counter).unwrap().text, "1");

    // a store that doesn't exist: form stays as it was, user is told
    let outcome = wired.dispatch(PageEvent::Submit { element: missing }).await;
    assert!(matches!(outcome, Dispatch::Failed { prevent_default: true, .. }));
    assert!(!wired.page().await.get(missing).unwrap().has_class(HEARTED_CLASS));
    assert_eq!(messages.0.lock().unwrap().len(), 1);

    wired
        .dispatch(PageEvent::SearchInput {
            element: search,
            text: "blue".to_string(),
        })
        .await;
    let snapshot = wired.page().await;
    assert_eq!(snapshot.get(search).unwrap().suggestions.len(), 1);
    Ok(())
}

//! Page initialization: finds the interactive elements and registers one handler each.
//!
//! Handlers never hold the page lock across a request, so submissions from different
//! heart forms run independently. A failed request leaves the triggering element as it
//! was and goes to the [`Notifier`].

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::client::api::{HeartApi, Notifier, PlaceAutocomplete, SearchApi};
use crate::client::page::{ElementId, PageModel};
use crate::domain::{HeartState, StoreId};

pub const ADDRESS_SELECTOR: &str = "#address";
pub const LAT_SELECTOR: &str = "#lat";
pub const LNG_SELECTOR: &str = "#lng";
pub const SEARCH_SELECTOR: &str = ".search";
pub const HEART_FORM_SELECTOR: &str = "form.heart";
pub const HEART_COUNT_SELECTOR: &str = ".heart-count";

/// Class set on a heart form while its store is hearted.
pub const HEARTED_CLASS: &str = "heart--hearted";

/// External services the page talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub places: Arc<dyn PlaceAutocomplete>,
    pub search: Arc<dyn SearchApi>,
    pub hearts: Arc<dyn HeartApi>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Handler {
    Autocomplete {
        lat: ElementId,
        lng: ElementId,
    },
    TypeAhead,
    Heart {
        store: StoreId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// The user picked `text` from the address autocomplete.
    AddressSelected { element: ElementId, text: String },
    /// The search box now contains `text`.
    SearchInput { element: ElementId, text: String },
    Submit { element: ElementId },
}

impl PageEvent {
    fn element(&self) -> ElementId {
        match self {
            PageEvent::AddressSelected { element, .. }
            | PageEvent::SearchInput { element, .. }
            | PageEvent::Submit { element } => *element,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// No handler for this element/event pair; the browser default applies.
    Ignored,
    Handled { prevent_default: bool },
    /// A newer search replaced this one before its results arrived.
    Superseded,
    Failed { prevent_default: bool, error: String },
}

pub struct WiredPage {
    page: Mutex<PageModel>,
    handlers: HashMap<ElementId, Handler>,
    collaborators: Collaborators,
}

/// Extracts the store id from a heart form's `action`, e.g. `/api/stores/42/heart`.
pub fn heart_form_store(action: &str) -> Option<StoreId> {
    let mut segments = action.trim_end_matches('/').rsplit('/');
    if segments.next()? != "heart" {
        return None;
    }
    segments.next()?.parse().ok().map(StoreId)
}

/// Wires every element the storefront pages care about.
pub fn wire_page(page: PageModel, collaborators: Collaborators) -> WiredPage {
    let mut handlers = HashMap::new();

    if let Some(address) = page.query(ADDRESS_SELECTOR) {
        match (page.query(LAT_SELECTOR), page.query(LNG_SELECTOR)) {
            (Some(lat), Some(lng)) => {
                handlers.insert(address, Handler::Autocomplete { lat, lng });
            }
            _ => warn!("address input without lat/lng fields, autocomplete not wired"),
        }
    }

    if let Some(search) = page.query(SEARCH_SELECTOR) {
        handlers.insert(search, Handler::TypeAhead);
    }

    for form in page.query_all(HEART_FORM_SELECTOR) {
        let store = page
            .get(form)
            .and_then(|e| e.attr("action"))
            .and_then(heart_form_store);
        match store {
            Some(store) => {
                handlers.insert(form, Handler::Heart { store });
            }
            None => warn!(element = form.0, "heart form without a store action"),
        }
    }

    debug!(handlers = handlers.len(), "page wired");
    WiredPage {
        page: Mutex::new(page),
        handlers,
        collaborators,
    }
}

impl WiredPage {
    pub fn handler(&self, element: ElementId) -> Option<&Handler> {
        self.handlers.get(&element)
    }

    /// Snapshot of the current page state.
    pub async fn page(&self) -> PageModel {
        self.page.lock().await.clone()
    }

    pub async fn dispatch(&self, event: PageEvent) -> Dispatch {
        let Some(handler) = self.handlers.get(&event.element()).cloned() else {
            return Dispatch::Ignored;
        };
        match (handler, event) {
            (Handler::Autocomplete { lat, lng }, PageEvent::AddressSelected { element, text }) => {
                self.on_address(element, lat, lng, text).await
            }
            (Handler::TypeAhead, PageEvent::SearchInput { element, text }) => {
                self.on_search(element, text).await
            }
            (Handler::Heart { store }, PageEvent::Submit { element }) => {
                self.on_heart(element, store).await
            }
            _ => Dispatch::Ignored,
        }
    }

    fn fail(&self, prevent_default: bool, error: String) -> Dispatch {
        self.collaborators.notifier.notify(&error);
        Dispatch::Failed {
            prevent_default,
            error,
        }
    }

    async fn on_address(
        &self,
        element: ElementId,
        lat: ElementId,
        lng: ElementId,
        text: String,
    ) -> Dispatch {
        let place = match self.collaborators.places.resolve(&text).await {
            Ok(p) => p,
            Err(e) => return self.fail(false, format!("Could not look up that address: {}", e)),
        };
        let mut page = self.page.lock().await;
        for (id, value) in [(element, text), (lat, place.lat.to_string()), (lng, place.lng.to_string())] {
            if let Some(el) = page.get_mut(id) {
                el.value = value;
            }
        }
        Dispatch::Handled {
            prevent_default: false,
        }
    }

    async fn on_search(&self, element: ElementId, text: String) -> Dispatch {
        {
            let mut page = self.page.lock().await;
            let Some(input) = page.get_mut(element) else {
                return Dispatch::Ignored;
            };
            input.value = text.clone();
            if text.trim().is_empty() {
                input.suggestions.clear();
                return Dispatch::Handled {
                    prevent_default: false,
                };
            }
        }

        let result = self.collaborators.search.search(&text).await;

        let mut page = self.page.lock().await;
        let input = match page.get_mut(element) {
            Some(input) if input.value == text => input,
            _ => return Dispatch::Superseded,
        };
        match result {
            Ok(suggestions) => {
                input.suggestions = suggestions;
                Dispatch::Handled {
                    prevent_default: false,
                }
            }
            Err(e) => {
                // the old suggestions belong to a previous query
                input.suggestions.clear();
                drop(page);
                self.fail(false, format!("Search failed: {}", e))
            }
        }
    }

    async fn on_heart(&self, element: ElementId, store: StoreId) -> Dispatch {
        let state: HeartState = match self.collaborators.hearts.toggle_heart(store).await {
            Ok(s) => s,
            Err(e) => return self.fail(true, format!("Could not update favorite: {}", e)),
        };
        let mut page = self.page.lock().await;
        if let Some(form) = page.get_mut(element) {
            if state.hearted {
                form.classes.insert(HEARTED_CLASS.to_string());
            } else {
                form.classes.remove(HEARTED_CLASS);
            }
        }
        for counter in page.query_all(HEART_COUNT_SELECTOR) {
            if let Some(el) = page.get_mut(counter) {
                el.text = state.hearts.len().to_string();
            }
        }
        Dispatch::Handled {
            prevent_default: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::api::{ClientError, Place, Suggestion};
    use crate::client::page::Element;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct Fakes {
        fail: AtomicBool,
        messages: StdMutex<Vec<String>>,
        hearted: StdMutex<Vec<StoreId>>,
    }

    #[async_trait]
    impl PlaceAutocomplete for Fakes {
        async fn resolve(&self, _address: &str) -> Result<Place, ClientError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClientError::Place("quota exceeded".to_string()));
            }
            Ok(Place {
                lat: 43.65,
                lng: -79.38,
            })
        }
    }

    #[async_trait]
    impl SearchApi for Fakes {
        async fn search(&self, query: &str) -> Result<Vec<Suggestion>, ClientError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClientError::Api {
                    status: 503,
                    message: "down".to_string(),
                });
            }
            Ok(vec![Suggestion {
                name: format!("{} Cafe", query),
                href: "/store/cafe".to_string(),
            }])
        }
    }

    #[async_trait]
    impl HeartApi for Fakes {
        async fn toggle_heart(&self, store: StoreId) -> Result<HeartState, ClientError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClientError::Unauthenticated);
            }
            let mut hearted = self.hearted.lock().unwrap();
            let now = if let Some(pos) = hearted.iter().position(|s| *s == store) {
                hearted.remove(pos);
                false
            } else {
                hearted.push(store);
                true
            };
            Ok(HeartState {
                store,
                hearted: now,
                hearts: hearted.clone(),
            })
        }
    }

    impl Notifier for Fakes {
        fn notify(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    struct Fixture {
        wired: WiredPage,
        fakes: Arc<Fakes>,
        address: ElementId,
        lat: ElementId,
        lng: ElementId,
        search: ElementId,
        hearts: Vec<ElementId>,
        counter: ElementId,
        plain_form: ElementId,
    }

    fn fixture(fail: bool) -> Fixture {
        let mut page = PageModel::new();
        let address = page.push(Element::new("input").with_id("address"));
        let lat = page.push(Element::new("input").with_id("lat"));
        let lng = page.push(Element::new("input").with_id("lng"));
        let search = page.push(Element::new("input").with_class("search"));
        let counter = page.push(Element::new("span").with_class("heart-count").with_text("0"));
        let hearts = vec![
            page.push(
                Element::new("form")
                    .with_class("heart")
                    .with_attr("action", "/api/stores/1/heart"),
            ),
            page.push(
                Element::new("form")
                    .with_class("heart")
                    .with_attr("action", "/api/stores/2/heart"),
            ),
        ];
        let plain_form = page.push(Element::new("form").with_attr("action", "/add"));

        let fakes = Arc::new(Fakes {
            fail: AtomicBool::new(fail),
            ..Default::default()
        });
        let wired = wire_page(
            page,
            Collaborators {
                places: fakes.clone(),
                search: fakes.clone(),
                hearts: fakes.clone(),
                notifier: fakes.clone(),
            },
        );
        Fixture {
            wired,
            fakes,
            address,
            lat,
            lng,
            search,
            hearts,
            counter,
            plain_form,
        }
    }

    #[test]
    fn heart_form_action_parsing() {
        assert_eq!(heart_form_store("/api/stores/42/heart"), Some(StoreId(42)));
        assert_eq!(heart_form_store("/api/stores/42/heart/"), Some(StoreId(42)));
        assert_eq!(heart_form_store("/api/stores/abc/heart"), None);
        assert_eq!(heart_form_store("/api/stores/42"), None);
    }

    #[tokio::test]
    async fn wires_every_known_element() {
        let f = fixture(false);
        assert!(matches!(f.wired.handler(f.address), Some(Handler::Autocomplete { .. })));
        assert_eq!(f.wired.handler(f.search), Some(&Handler::TypeAhead));
        assert_eq!(
            f.wired.handler(f.hearts[1]),
            Some(&Handler::Heart { store: StoreId(2) })
        );
        assert_eq!(f.wired.handler(f.plain_form), None);
    }

    #[tokio::test]
    async fn heart_submit_is_intercepted_and_updates_the_form() {
        let f = fixture(false);
        let outcome = f.wired.dispatch(PageEvent::Submit { element: f.hearts[0] }).await;
        assert_eq!(outcome, Dispatch::Handled { prevent_default: true });

        let page = f.wired.page().await;
        assert!(page.get(f.hearts[0]).unwrap().has_class(HEARTED_CLASS));
        assert!(!page.get(f.hearts[1]).unwrap().has_class(HEARTED_CLASS));
        assert_eq!(page.get(f.counter).unwrap().text, "1");

        f.wired.dispatch(PageEvent::Submit { element: f.hearts[0] }).await;
        let page = f.wired.page().await;
        assert!(!page.get(f.hearts[0]).unwrap().has_class(HEARTED_CLASS));
        assert_eq!(page.get(f.counter).unwrap().text, "0");
    }

    #[tokio::test]
    async fn concurrent_heart_submissions_are_independent() {
        let f = fixture(false);
        let (a, b) = tokio::join!(
            f.wired.dispatch(PageEvent::Submit { element: f.hearts[0] }),
            f.wired.dispatch(PageEvent::Submit { element: f.hearts[1] }),
        );
        assert_eq!(a, Dispatch::Handled { prevent_default: true });
        assert_eq!(b, Dispatch::Handled { prevent_default: true });
        let page = f.wired.page().await;
        assert!(f.hearts.iter().all(|h| page.get(*h).unwrap().has_class(HEARTED_CLASS)));
        assert_eq!(page.get(f.counter).unwrap().text, "2");
    }

    #[tokio::test]
    async fn failed_heart_leaves_form_unchanged_and_notifies() {
        let f = fixture(true);
        let before = f.wired.page().await;
        let outcome = f.wired.dispatch(PageEvent::Submit { element: f.hearts[0] }).await;
        assert!(matches!(outcome, Dispatch::Failed { prevent_default: true, .. }));
        assert_eq!(f.wired.page().await, before);
        assert_eq!(f.fakes.messages.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn address_selection_fills_coordinates() {
        let f = fixture(false);
        let outcome = f
            .wired
            .dispatch(PageEvent::AddressSelected {
                element: f.address,
                text: "1 King St W".to_string(),
            })
            .await;
        assert_eq!(outcome, Dispatch::Handled { prevent_default: false });
        let page = f.wired.page().await;
        assert_eq!(page.get(f.address).unwrap().value, "1 King St W");
        assert_eq!(page.get(f.lat).unwrap().value, "43.65");
        assert_eq!(page.get(f.lng).unwrap().value, "-79.38");
    }

    #[tokio::test]
    async fn failed_address_lookup_leaves_fields_alone() {
        let f = fixture(true);
        let outcome = f
            .wired
            .dispatch(PageEvent::AddressSelected {
                element: f.address,
                text: "nowhere".to_string(),
            })
            .await;
        assert!(matches!(outcome, Dispatch::Failed { .. }));
        let page = f.wired.page().await;
        assert!(page.get(f.lat).unwrap().value.is_empty());
        assert!(page.get(f.address).unwrap().value.is_empty());
    }

    #[tokio::test]
    async fn search_input_renders_and_clears_suggestions() {
        let f = fixture(false);
        f.wired
            .dispatch(PageEvent::SearchInput {
                element: f.search,
                text: "Blue".to_string(),
            })
            .await;
        let page = f.wired.page().await;
        assert_eq!(page.get(f.search).unwrap().suggestions[0].name, "Blue Cafe");

        f.wired
            .dispatch(PageEvent::SearchInput {
                element: f.search,
                text: "  ".to_string(),
            })
            .await;
        let page = f.wired.page().await;
        assert!(page.get(f.search).unwrap().suggestions.is_empty());
    }

    #[tokio::test]
    async fn failed_search_clears_stale_suggestions_and_notifies() {
        let f = fixture(false);
        let search = |text: &str| PageEvent::SearchInput {
            element: f.search,
            text: text.to_string(),
        };
        f.wired.dispatch(search("Blue")).await;
        assert_eq!(f.wired.page().await.get(f.search).unwrap().suggestions.len(), 1);

        f.fakes.fail.store(true, Ordering::SeqCst);
        let outcome = f.wired.dispatch(search("Green")).await;
        assert!(matches!(outcome, Dispatch::Failed { prevent_default: false, .. }));
        let page = f.wired.page().await;
        assert_eq!(page.get(f.search).unwrap().value, "Green");
        assert!(page.get(f.search).unwrap().suggestions.is_empty());
        assert_eq!(f.fakes.messages.lock().unwrap().len(), 1);
    }

    /// Search backend where the query "slow" waits for a signal and then fails.
    struct GatedSearch {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl SearchApi for GatedSearch {
        async fn search(&self, query: &str) -> Result<Vec<Suggestion>, ClientError> {
            if query == "slow" {
                self.entered.notify_one();
                self.release.notified().await;
                return Err(ClientError::Api {
                    status: 504,
                    message: "timeout".to_string(),
                });
            }
            Ok(vec![Suggestion {
                name: query.to_string(),
                href: format!("/store/{}", query),
            }])
        }
    }

    #[tokio::test]
    async fn superseded_search_failure_is_not_reported() {
        let mut page = PageModel::new();
        let search = page.push(Element::new("input").with_class("search"));
        let fakes = Arc::new(Fakes::default());
        let gated = Arc::new(GatedSearch {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let wired = Arc::new(wire_page(
            page,
            Collaborators {
                places: fakes.clone(),
                search: gated.clone(),
                hearts: fakes.clone(),
                notifier: fakes.clone(),
            },
        ));

        let slow = {
            let wired = wired.clone();
            tokio::spawn(async move {
                wired
                    .dispatch(PageEvent::SearchInput {
                        element: search,
                        text: "slow".to_string(),
                    })
                    .await
            })
        };
        gated.entered.notified().await;
        wired
            .dispatch(PageEvent::SearchInput {
                element: search,
                text: "fast".to_string(),
            })
            .await;
        gated.release.notify_one();

        assert_eq!(slow.await.unwrap(), Dispatch::Superseded);
        let page = wired.page().await;
        assert_eq!(page.get(search).unwrap().suggestions[0].name, "fast");
        assert!(fakes.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn events_on_unwired_elements_are_ignored() {
        let f = fixture(false);
        assert_eq!(
            f.wired.dispatch(PageEvent::Submit { element: f.plain_form }).await,
            Dispatch::Ignored
        );
        assert_eq!(
            f.wired.dispatch(PageEvent::Submit { element: f.search }).await,
            Dispatch::Ignored
        );
    }
}

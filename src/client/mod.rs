//! Page interaction glue.
//!
//! On page load the storefront wires three kinds of elements: the address field (kept in
//! sync with its lat/lng inputs through a place lookup), the search box (type-ahead) and
//! every heart form (favorite toggle without a page reload).

pub mod api;
pub mod glue;
pub mod page;

pub use api::{
    ClientError, HeartApi, Notifier, Place, PlaceAutocomplete, SearchApi, StorefrontClient,
    Suggestion,
};
pub use glue::{wire_page, Collaborators, Dispatch, Handler, PageEvent, WiredPage};
pub use page::{Element, ElementId, PageModel};

//! Client core for the content-generation UI.
//!
//! Two controllers turn a latent, possibly failing backend into observable
//! view state: [`RequestController`] runs one generation request at a time
//! and [`LibraryController`] holds fetched library items together with a
//! filtered and sorted view of them. Both talk to the backend through the
//! [`Transport`] trait and publish every state change on a `watch` channel.

pub mod library;
pub mod request;
pub mod theme;
pub mod transport;
pub mod view;

pub use library::{LibraryController, LibraryViewState, RefreshOutcome};
pub use request::{RequestController, RequestState, SubmitOutcome};
pub use theme::{
    FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, ThemeController, ThemeState,
};
pub use transport::{resolve_base_url, HttpTransport, Transport, TransportError};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

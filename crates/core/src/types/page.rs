//! Offset-paginated list envelopes.

use serde::de::DeserializeOwned;

/// A single page of a provider list endpoint.
///
/// Every list endpoint returns its items under an endpoint-specific key
/// together with a `total_items` count for the whole result set.
pub trait ListPage: DeserializeOwned {
    /// Item type carried by the page.
    type Item;

    /// Total number of items the provider reports for the whole query.
    fn total_items(&self) -> u64;

    /// Consume the page and return its items in provider order.
    fn into_items(self) -> Vec<Self::Item>;
}

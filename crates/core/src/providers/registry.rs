use std::collections::HashMap;

use super::finnhub::FinnhubProvider;
use super::polygon::PolygonProvider;
use super::traits::PriceProvider;

/// Ordered list of price providers.
///
/// The first registered provider is the primary; the rest are fallbacks
/// tried in registration order. New providers can be added without
/// modifying existing code.
pub struct PriceProviderRegistry {
    providers: Vec<Box<dyn PriceProvider>>,
}

impl PriceProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with every provider whose API key is configured.
    pub fn new_with_defaults(api_keys: &HashMap<String, String>) -> Self {
        let mut registry = Self::new();

        // Polygon — primary, intraday aggregates
        if let Some(key) = api_keys.get("polygon").filter(|k| !k.trim().is_empty()) {
            registry.register(Box::new(PolygonProvider::new(key.clone())));
        }

        // Finnhub — fallback candles
        if let Some(key) = api_keys.get("finnhub").filter(|k| !k.trim().is_empty()) {
            registry.register(Box::new(FinnhubProvider::new(key.clone())));
        }

        registry
    }

    /// Register a new price provider at the lowest priority.
    pub fn register(&mut self, provider: Box<dyn PriceProvider>) {
        self.providers.push(provider);
    }

    /// All providers, ordered by priority.
    pub fn providers(&self) -> impl Iterator<Item = &dyn PriceProvider> {
        self.providers.iter().map(|p| p.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.providers().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for PriceProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub mod interaction;
pub mod normalizer;
pub mod overlay;
pub mod price_service;
pub mod render_model;
pub mod scale;

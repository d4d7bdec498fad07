pub mod airports;
pub mod briefing;
pub mod cache;
pub mod decoder;
pub mod geo;
pub mod providers;
pub mod severity;

pub mod entities;
pub mod errors;
pub mod inference;
pub mod locator;
pub mod network;
pub mod repositories;
pub mod settings;
pub mod traits;

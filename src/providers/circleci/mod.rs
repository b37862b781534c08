mod client;
mod provider;
mod types;


pub use client::DEFAULT_CIRCLECI_API_URL;
pub use provider::CircleCiProvider;

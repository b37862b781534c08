mod client;
mod provider;
mod types;


pub use client::DEFAULT_GITHUB_API_URL;
pub use provider::GitHubProvider;
pub use types::RepositoryTarget;

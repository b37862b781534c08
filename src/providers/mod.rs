pub mod circleci;
pub mod github;
mod http;

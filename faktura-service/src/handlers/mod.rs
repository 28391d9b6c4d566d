pub mod documents;
pub mod health;
pub mod quotes;
pub mod webhooks;

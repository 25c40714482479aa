pub mod cache;
pub mod database;
pub mod greeting;

pub use cache::{Cache, MockCache, RedisCache};
pub use database::{DocumentStore, MockDocumentStore, MongoDb};
pub use greeting::{seed_greeting, GREETING, GREETING_KEY};

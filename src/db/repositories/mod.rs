//! Database repositories
//!
//! One repository per table. Each exposes a trait used by the services and a
//! `Sqlx*Repository` implementation that works on SQLite and MySQL.

pub mod article;
pub mod subscriber;
pub mod user;

pub use article::{ArticleRepository, SqlxArticleRepository};
pub use subscriber::{SqlxSubscriberRepository, SubscriberRepository};
pub use user::{SqlxUserRepository, UserRepository};

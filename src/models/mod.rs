//! Data models
//!
//! Records for the three tables (`users`, `blog_articles`, `email_list`) plus
//! the input types services accept.

mod article;
mod subscriber;
mod user;

pub use article::{Article, CreateArticleInput, UpdateArticleInput};
pub use subscriber::{SubscribeInput, Subscriber};
pub use user::{CustomerStatus, CustomerTier, User};

//! Services layer - Business logic
//!
//! Services validate input, enforce the business rules and translate storage
//! failures into typed errors the HTTP layer can map to status codes.

pub mod article;
pub mod email;
pub mod password;
pub mod subscriber;
pub mod token;
pub mod user;

pub use article::{ArticleService, ArticleServiceError};
pub use email::Mailer;
pub use password::{hash_password, verify_password};
pub use subscriber::{SubscribeOutcome, SubscriberService, SubscriberServiceError};
pub use token::TokenService;
pub use user::{
    AuthSession, ForgotPasswordOutcome, LoginInput, PasswordResetOptions, RegisterInput,
    UserService, UserServiceError,
};

//! Services layer - Business logic
//!
//! This module contains all business logic services for the Airwave system.
//! Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories, cache, and external endpoints
//! - Handling validation and error cases

pub mod ai;
pub mod markdown;
pub mod password;
pub mod posts;
pub mod predict;
pub mod rate_limiter;
pub mod user;
pub mod youtube;

pub use ai::{AiClient, AiClientError, ChatMessage};
pub use markdown::MarkdownRenderer;
pub use password::{hash_password, verify_password};
pub use posts::{PostService, PostServiceError};
pub use predict::PredictClient;
pub use rate_limiter::SlidingWindowLimiter;
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
pub use youtube::{YoutubeClient, YoutubeSearchResult};

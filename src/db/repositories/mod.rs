//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod podcast;
pub mod post;
pub mod program_video;
pub mod session;
pub mod short_link;
pub mod stream_config;
pub mod tune;
pub mod user;
pub mod whitelist;

pub use podcast::{PodcastRepository, SqlxPodcastRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use program_video::{ProgramVideoRepository, SqlxProgramVideoRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use short_link::{ShortLinkRepository, SqlxShortLinkRepository};
pub use stream_config::{SqlxStreamConfigRepository, StreamConfigRepository};
pub use tune::{SqlxTuneRepository, TuneRepository};
pub use user::{SqlxUserRepository, UserRepository};
pub use whitelist::{SqlxWhitelistRepository, WhitelistRepository};

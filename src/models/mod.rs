//! Data models
//!
//! This module contains all data structures used throughout the Airwave system.
//! Models represent:
//! - Database entities (Post, Podcast, TuneEntry, ProgramVideo, ShortLink,
//!   StreamConfig, User, WhitelistedEmail, Session)
//! - API request/response types
//! - Internal data transfer objects

mod podcast;
mod post;
mod program_video;
mod session;
mod short_link;
mod stream_config;
mod tune;
mod user;
mod whitelist;

pub use podcast::{CreatePodcastInput, Podcast, UpdatePodcastInput};
pub use post::{CreatePostInput, ListParams, PagedResult, Post, PostStatus, UpdatePostInput};
pub use program_video::{CreateProgramVideoInput, ProgramVideo};
pub use session::Session;
pub use short_link::{CreateShortLinkInput, ShortLink};
pub use stream_config::{StreamConfig, UpdateStreamConfigInput};
pub use tune::{TuneEntry, TuneEntryInput};
pub use user::{RoleSet, User};
pub use whitelist::WhitelistedEmail;

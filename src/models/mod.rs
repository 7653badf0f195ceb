//! Data models
//!
//! This module contains the data structures exchanged with the coaching
//! backend. Models represent:
//! - Backend entities (User, Profile, Notice, AttendanceRecord, Rating, ClassSettings)
//! - Request payloads
//! - Auth responses
//!
//! The backend is document-store backed and sends identifiers as `_id`
//! (sometimes alongside a virtual `id`); every entity accepts either.

mod attendance;
mod common;
mod notice;
mod profile;
mod rating;
mod session;
mod settings;
mod user;

pub use attendance::{AttendanceRecord, MarkAttendanceInput};
pub use common::UserRef;
pub use notice::{Attachment, CreateNoticeInput, Notice, NoticeAuthor, NoticePriority};
pub use profile::{
    AdminProfileUpdate, JapaneseLevel, Profile, Progress, SocialLinks, UpdateProfileInput,
};
pub use rating::{CreateRatingInput, Rating};
pub use session::AuthResponse;
pub use settings::{ClassSettings, DEFAULT_BOOK_NAME};
pub use user::{User, UserRole};

//! Services layer - client-side business logic
//!
//! Each service wraps a group of backend endpoints together with the view
//! state built from them. Services are responsible for:
//! - Validating input before it reaches the network
//! - Applying optimistic local changes and reporting their outcome
//! - Mapping backend failures onto per-service error types

pub mod attendance;
pub mod mutation;
pub mod notice;
pub mod password;
pub mod profile;
pub mod rating;
pub mod settings;
pub mod theme;
pub mod user;

pub use attendance::{
    AttendanceBoard, AttendanceError, MarkAllOutcome, MarkCompensation, PendingMark, StudentRow,
};
pub use mutation::MutationState;
pub use notice::{NoticeBoard, NoticeCompensation, NoticeError, PendingDelete};
pub use password::{validate_new_password, PasswordError, MIN_PASSWORD_LENGTH};
pub use profile::{rank_by_lessons, AvatarSource, ProfileError, ProfileService, Rank};
pub use rating::{average_score, RatingError, RatingService};
pub use settings::{
    BodyShape, ProbeAttempt, ProbeStrategy, SettingsError, SettingsService, WriteOutcome,
};
pub use theme::{Theme, ThemePreference};
pub use user::{UserService, UserServiceError, UserStats};

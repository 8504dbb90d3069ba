//! Services module
//!
//! Business logic that coordinates between the remote gateway, the
//! local repository and the CLI commands.

pub mod announcements;
pub mod cache;
pub mod classes;
pub mod grades;
pub mod permissions;
pub mod quiz;
pub mod session;
pub mod sync;

pub use announcements::AnnouncementBoard;
pub use cache::{CollectionCache, EntityCache};
pub use classes::ClassesService;
pub use grades::{GradeAggregator, GradeReport};
pub use permissions::{LockSignals, Permissions, Subject};
pub use quiz::{format_score, QuizSession, SubmitOutcome};
pub use session::SessionService;
pub use sync::{ContentOwner, ContentSyncController, SyncState, TaskDetails};

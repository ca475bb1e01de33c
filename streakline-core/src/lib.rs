//! streakline-core: progress records, streak computation and session routing

pub mod account;
pub mod calendar;
pub mod progress;
pub mod routing;
pub mod store;
pub mod streak;
pub mod time;
pub mod tracker;

pub use account::{Goal, GoalStatus, SubscriptionStatus, UserAccount};
pub use calendar::{day_grid, progress_in_range, DayProgress, EditPolicy};
pub use progress::{MarkedMethod, ProgressMark, ProgressRecord, StreakSnapshot};
pub use routing::{
    decide, decide_destination, resolve_destination, Decision, Destination, Location, Route,
    RouteGroup, RoutingRule, RoutingState, SessionState,
};
pub use store::{MemoryStore, RecordStore, StoreError};
pub use streak::{compute_streak, resolve_duplicates};
pub use tracker::{mark_progress, recalculate_streak, MarkOutcome};

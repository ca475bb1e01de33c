//! Session routing: which screen a user should land on.
//!
//! First matching rule wins, and the order matters:
//! 1) no session or no user -> auth/welcome
//! 2) already inside onboarding -> stay (never interrupted, even without payment)
//! 3) no active payment -> auth/payment-setup
//! 4) no goal yet -> onboarding/questionnaire
//! 5) otherwise -> tabs
//!
//! Each rule answers `Stay` when the caller is already where it would send them.

use std::fmt;

use tracing::info;

use crate::account::UserAccount;
use crate::store::{RecordStore, StoreError};

/// Top-level route group the caller currently occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteGroup {
    Auth,
    Onboarding,
    Tabs,
    Other,
}

impl RouteGroup {
    fn from_segment(segment: &str) -> Self {
        let name = segment.trim_start_matches('(').trim_end_matches(')');
        match name {
            "auth" => RouteGroup::Auth,
            "onboarding" => RouteGroup::Onboarding,
            "tabs" => RouteGroup::Tabs,
            _ => RouteGroup::Other,
        }
    }
}

/// Where the caller is right now: group plus the screen inside it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub group: RouteGroup,
    pub screen: Option<String>,
}

impl Location {
    pub fn new(group: RouteGroup) -> Self {
        Self { group, screen: None }
    }

    pub fn at(group: RouteGroup, screen: impl Into<String>) -> Self {
        Self {
            group,
            screen: Some(screen.into()),
        }
    }

    /// Parse a route path like `/(auth)/payment-setup` or `tabs`.
    pub fn parse(path: &str) -> Self {
        let mut segments = path.split('/').map(str::trim).filter(|s| !s.is_empty());
        let group = segments
            .next()
            .map(RouteGroup::from_segment)
            .unwrap_or(RouteGroup::Other);
        let screen = segments.next().map(str::to_string);
        Self { group, screen }
    }

    fn is_at(&self, route: Route) -> bool {
        let (group, screen) = route.parts();
        self.group == group && self.screen.as_deref() == screen
    }
}

/// Canonical destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Welcome,
    PaymentSetup,
    Questionnaire,
    Tabs,
}

impl Route {
    fn parts(&self) -> (RouteGroup, Option<&'static str>) {
        match self {
            Route::Welcome => (RouteGroup::Auth, Some("welcome")),
            Route::PaymentSetup => (RouteGroup::Auth, Some("payment-setup")),
            Route::Questionnaire => (RouteGroup::Onboarding, Some("questionnaire")),
            Route::Tabs => (RouteGroup::Tabs, None),
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Welcome => "auth/welcome",
            Route::PaymentSetup => "auth/payment-setup",
            Route::Questionnaire => "onboarding/questionnaire",
            Route::Tabs => "tabs",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Stay,
    Go(Route),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Stay => f.write_str("stay"),
            Destination::Go(route) => write!(f, "go({route})"),
        }
    }
}

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingRule {
    SignedOut,
    OnboardingInProgress,
    PaymentRequired,
    OnboardingRequired,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub destination: Destination,
    pub rule: RoutingRule,
}

/// Everything the decision reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutingState {
    pub has_session: bool,
    pub has_user: bool,
    pub has_active_payment: bool,
    pub has_completed_onboarding: bool,
}

/// Session/account facts known before the onboarding check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub has_session: bool,
    pub user_id: Option<String>,
    pub has_active_payment: bool,
}

impl SessionState {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn from_account(has_session: bool, account: Option<&UserAccount>) -> Self {
        Self {
            has_session,
            user_id: account.map(|a| a.id.clone()),
            has_active_payment: account.is_some_and(UserAccount::has_active_payment),
        }
    }

    pub fn routing_state(&self, has_completed_onboarding: bool) -> RoutingState {
        RoutingState {
            has_session: self.has_session,
            has_user: self.user_id.is_some(),
            has_active_payment: self.has_active_payment,
            has_completed_onboarding,
        }
    }
}

fn stay_or_go(already_there: bool, route: Route, rule: RoutingRule) -> Decision {
    let destination = if already_there {
        Destination::Stay
    } else {
        Destination::Go(route)
    };
    Decision { destination, rule }
}

/// Rules 1-3; `None` means the onboarding check decides.
fn decide_before_onboarding(
    has_session: bool,
    has_user: bool,
    has_active_payment: bool,
    location: &Location,
) -> Option<Decision> {
    if !(has_session && has_user) {
        return Some(stay_or_go(
            location.group == RouteGroup::Auth,
            Route::Welcome,
            RoutingRule::SignedOut,
        ));
    }

    if location.group == RouteGroup::Onboarding {
        return Some(Decision {
            destination: Destination::Stay,
            rule: RoutingRule::OnboardingInProgress,
        });
    }

    if !has_active_payment {
        return Some(stay_or_go(
            location.is_at(Route::PaymentSetup),
            Route::PaymentSetup,
            RoutingRule::PaymentRequired,
        ));
    }

    None
}

/// Rules 4-5.
fn decide_after_onboarding(has_completed_onboarding: bool, location: &Location) -> Decision {
    if !has_completed_onboarding {
        stay_or_go(
            location.group == RouteGroup::Onboarding,
            Route::Questionnaire,
            RoutingRule::OnboardingRequired,
        )
    } else {
        stay_or_go(location.group == RouteGroup::Tabs, Route::Tabs, RoutingRule::Ready)
    }
}

/// Pure decision over fully known state.
pub fn decide(state: &RoutingState, location: &Location) -> Decision {
    decide_before_onboarding(
        state.has_session,
        state.has_user,
        state.has_active_payment,
        location,
    )
    .unwrap_or_else(|| decide_after_onboarding(state.has_completed_onboarding, location))
}

pub fn decide_destination(state: &RoutingState, location: &Location) -> Destination {
    decide(state, location).destination
}

/// Decide for a live session, reading onboarding status from the store only
/// when rules 1-3 leave it open. A failed read is returned as-is; signed-out,
/// mid-onboarding and unpaid sessions never touch the store, so they never see
/// a store error.
pub fn resolve_destination<S: RecordStore + ?Sized>(
    store: &S,
    session: &SessionState,
    location: &Location,
) -> Result<Decision, StoreError> {
    let undecided = decide_before_onboarding(
        session.has_session,
        session.user_id.is_some(),
        session.has_active_payment,
        location,
    )
    .is_none();

    let onboarded = match session.user_id.as_deref() {
        Some(user_id) if undecided => store.has_any_goal(user_id)?,
        _ => false,
    };
    let decision = decide(&session.routing_state(onboarded), location);

    info!(
        group = ?location.group,
        screen = location.screen.as_deref().unwrap_or(""),
        rule = ?decision.rule,
        destination = %decision.destination,
        "routing decided"
    );

    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Goal, GoalStatus, SubscriptionStatus};
    use crate::progress::{ProgressMark, ProgressRecord, StreakSnapshot};
    use crate::store::MemoryStore;
    use std::cell::Cell;

    fn state(session: bool, user: bool, paid: bool, onboarded: bool) -> RoutingState {
        RoutingState {
            has_session: session,
            has_user: user,
            has_active_payment: paid,
            has_completed_onboarding: onboarded,
        }
    }

    #[test]
    fn test_signed_out_goes_to_welcome() {
        let d = decide_destination(&state(false, false, false, false), &Location::new(RouteGroup::Tabs));
        assert_eq!(d, Destination::Go(Route::Welcome));
    }

    #[test]
    fn test_signed_out_in_auth_stays() {
        let d = decide_destination(&state(false, false, true, true), &Location::parse("/(auth)/payment-setup"));
        assert_eq!(d, Destination::Stay);
    }

    #[test]
    fn test_session_without_user_is_signed_out() {
        let d = decide(&state(true, false, true, true), &Location::new(RouteGroup::Onboarding));
        assert_eq!(d.destination, Destination::Go(Route::Welcome));
        assert_eq!(d.rule, RoutingRule::SignedOut);
    }

    #[test]
    fn test_onboarding_never_interrupted_by_missing_payment() {
        let d = decide(&state(true, true, false, false), &Location::new(RouteGroup::Onboarding));
        assert_eq!(d.destination, Destination::Stay);
        assert_eq!(d.rule, RoutingRule::OnboardingInProgress);
    }

    #[test]
    fn test_unpaid_goes_to_payment_setup() {
        let d = decide_destination(&state(true, true, false, true), &Location::new(RouteGroup::Tabs));
        assert_eq!(d, Destination::Go(Route::PaymentSetup));

        // elsewhere in auth is not "exactly at" payment setup
        let d = decide_destination(&state(true, true, false, true), &Location::parse("auth/welcome"));
        assert_eq!(d, Destination::Go(Route::PaymentSetup));

        let d = decide_destination(&state(true, true, false, true), &Location::parse("/(auth)/payment-setup"));
        assert_eq!(d, Destination::Stay);
    }

    #[test]
    fn test_paid_without_goal_goes_to_questionnaire() {
        let d = decide_destination(&state(true, true, true, false), &Location::parse("auth/payment-setup"));
        assert_eq!(d, Destination::Go(Route::Questionnaire));
    }

    #[test]
    fn test_ready_user_lands_in_tabs() {
        let s = state(true, true, true, true);
        assert_eq!(decide_destination(&s, &Location::new(RouteGroup::Tabs)), Destination::Stay);
        assert_eq!(decide_destination(&s, &Location::parse("(tabs)/history")), Destination::Stay);
        assert_eq!(decide_destination(&s, &Location::new(RouteGroup::Other)), Destination::Go(Route::Tabs));
        assert_eq!(decide_destination(&s, &Location::parse("auth/welcome")), Destination::Go(Route::Tabs));
    }

    #[test]
    fn test_location_parse() {
        assert_eq!(Location::parse("/(auth)/payment-setup"), Location::at(RouteGroup::Auth, "payment-setup"));
        assert_eq!(Location::parse("tabs"), Location::new(RouteGroup::Tabs));
        assert_eq!(Location::parse(""), Location::new(RouteGroup::Other));
        assert_eq!(Location::parse("/modal").group, RouteGroup::Other);
    }

    #[test]
    fn test_destination_display() {
        assert_eq!(Destination::Go(Route::PaymentSetup).to_string(), "go(auth/payment-setup)");
        assert_eq!(Destination::Stay.to_string(), "stay");
    }

    /// Store whose goal lookup fails and counts how often it was asked.
    #[derive(Default)]
    struct FailingGoals {
        lookups: Cell<usize>,
    }

    impl RecordStore for FailingGoals {
        fn upsert_progress(&mut self, _: &str, _: &str, _: ProgressMark) -> Result<ProgressRecord, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        fn list_progress(&self, _: &str, _: &str) -> Result<Vec<ProgressRecord>, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        fn write_streak_snapshot(&mut self, _: &str, _: &str, _: &StreakSnapshot) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        fn read_streak_snapshot(&self, _: &str, _: &str) -> Result<Option<StreakSnapshot>, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        fn list_streak_snapshots(&self, _: &str) -> Result<Vec<(String, StreakSnapshot)>, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        fn upsert_goal(&mut self, _: &str, _: Goal) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        fn list_goals(&self, _: &str) -> Result<Vec<Goal>, StoreError> {
            self.lookups.set(self.lookups.get() + 1);
            Err(StoreError::Unavailable("offline".into()))
        }
    }

    fn paid_session(id: &str) -> SessionState {
        let account = UserAccount::new(id).with_subscription(SubscriptionStatus::Active, "cus_1");
        SessionState::from_account(true, Some(&account))
    }

    #[test]
    fn test_failed_onboarding_check_propagates() {
        let store = FailingGoals::default();
        let err = resolve_destination(&store, &paid_session("u1"), &Location::new(RouteGroup::Other)).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.lookups.get(), 1);
    }

    #[test]
    fn test_onboarding_check_skipped_when_earlier_rule_decides() {
        let store = FailingGoals::default();

        let signed_out = resolve_destination(&store, &SessionState::signed_out(), &Location::new(RouteGroup::Tabs)).unwrap();
        assert_eq!(signed_out.destination, Destination::Go(Route::Welcome));

        let unpaid = SessionState::from_account(true, Some(&UserAccount::new("u1")));
        let d = resolve_destination(&store, &unpaid, &Location::new(RouteGroup::Tabs)).unwrap();
        assert_eq!(d.destination, Destination::Go(Route::PaymentSetup));

        assert_eq!(store.lookups.get(), 0);
    }

    #[test]
    fn test_resolve_reads_goals() {
        let mut store = MemoryStore::new();
        let session = paid_session("u1");
        let here = Location::new(RouteGroup::Tabs);

        let d = resolve_destination(&store, &session, &here).unwrap();
        assert_eq!(d.destination, Destination::Go(Route::Questionnaire));

        store.upsert_goal("u1", Goal::new("g1", "Meditate")).unwrap();
        let d = resolve_destination(&store, &session, &here).unwrap();
        assert_eq!(d.destination, Destination::Stay);
        assert_eq!(d.rule, RoutingRule::Ready);

        // giving up on the only goal does not send the user back to onboarding
        store.set_goal_status("u1", "g1", GoalStatus::Abandoned).unwrap();
        let d = resolve_destination(&store, &session, &here).unwrap();
        assert_eq!(d.rule, RoutingRule::Ready);
    }

    #[test]
    fn test_resolve_agrees_with_pure_decision() {
        let mut store = MemoryStore::new();
        store.upsert_goal("done", Goal::new("g1", "Walk")).unwrap();

        let sessions = [
            SessionState::signed_out(),
            SessionState { has_session: true, ..SessionState::signed_out() },
            SessionState::from_account(true, Some(&UserAccount::new("done"))),
            paid_session("fresh"),
            paid_session("done"),
        ];
        let locations = ["auth/welcome", "auth/payment-setup", "onboarding/questionnaire", "tabs", "other"];

        for session in &sessions {
            let onboarded = session.user_id.as_deref() == Some("done");
            for path in locations {
                let here = Location::parse(path);
                let resolved = resolve_destination(&store, session, &here).unwrap();
                assert_eq!(resolved, decide(&session.routing_state(onboarded), &here), "{session:?} at {path}");
            }
        }
    }
}

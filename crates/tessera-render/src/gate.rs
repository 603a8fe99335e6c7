//! Status gating.
//!
//! Every unit and action may require a minimum status. A caller whose status
//! ranks below the requirement does not see the thing at all: no error is
//! raised, the output is simply empty.

use tracing::warn;

use crate::levels::{Scale, Status};

/// Whether a caller at `current` may see something requiring `required`.
pub fn permits(current: Status, required: Status) -> bool {
    current >= required
}

/// Something with an optional required status, declared by name.
pub trait Gated {
    /// Name of the required status, or `None` for the lowest.
    fn required_status(&self) -> Option<&str>;
}

/// Checks a declared requirement against the caller's status.
///
/// Undeclared requirements are always permitted. An unknown status name is
/// never permitted.
pub fn permits_declared(scale: &Scale<Status>, current: Status, required: Option<&str>) -> bool {
    match required {
        None => true,
        Some(name) => match scale.get(name) {
            Some(required) => permits(current, required),
            None => {
                warn!(status = name, "unknown required status; denying");
                false
            }
        },
    }
}

/// Keeps the items the caller may see, in declaration order.
pub fn filter_actions<'a, A: Gated>(
    scale: &Scale<Status>,
    actions: impl IntoIterator<Item = &'a A>,
    current: Status,
) -> Vec<&'a A>
where
    A: 'a,
{
    actions
        .into_iter()
        .filter(|action| permits_declared(scale, current, action.required_status()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::Level;
    use proptest::prelude::*;

    #[derive(Debug, PartialEq)]
    struct Named(&'static str, Option<&'static str>);

    impl Gated for Named {
        fn required_status(&self) -> Option<&str> {
            self.1
        }
    }

    fn scale() -> Scale<Status> {
        Scale::new(["PUBLIC", "USER", "STAFF", "ADMINISTRATOR"]).unwrap()
    }

    #[test]
    fn user_cannot_reach_staff_action() {
        let scale = scale();
        let user = scale.require("USER").unwrap();
        let staff = scale.require("STAFF").unwrap();
        assert!(!permits(user, staff));
        assert!(permits(staff, user));
        assert!(permits(user, user));
    }

    #[test]
    fn unknown_requirement_fails_closed() {
        let scale = scale();
        let admin = scale.max();
        assert!(!permits_declared(&scale, admin, Some("ROOT")));
        assert!(permits_declared(&scale, Status::LOWEST, None));
    }

    #[test]
    fn filter_keeps_order() {
        let scale = scale();
        let actions = [
            Named("edit", Some("STAFF")),
            Named("view", None),
            Named("purge", Some("ADMINISTRATOR")),
            Named("comment", Some("USER")),
        ];
        let kept = filter_actions(&scale, &actions, scale.require("STAFF").unwrap());
        let names: Vec<&str> = kept.iter().map(|a| a.0).collect();
        assert_eq!(names, vec!["edit", "view", "comment"]);
    }

    proptest! {
        #[test]
        fn permits_matches_rank_order(current in 0usize..4, required in 0usize..4) {
            prop_assert_eq!(
                permits(Status::from_rank(current), Status::from_rank(required)),
                current >= required
            );
        }

        #[test]
        fn filter_is_idempotent_and_ordered(
            requirements in proptest::collection::vec(proptest::option::of(0usize..4), 0..10),
            current in 0usize..4,
        ) {
            const NAMES: [&str; 4] = ["PUBLIC", "USER", "STAFF", "ADMINISTRATOR"];
            let scale = scale();
            let current = Status::from_rank(current);
            let actions: Vec<Named> = requirements
                .iter()
                .map(|r| Named("a", r.map(|rank| NAMES[rank])))
                .collect();

            let once = filter_actions(&scale, &actions, current);
            let twice = filter_actions(&scale, once.iter().copied(), current);
            prop_assert_eq!(&once, &twice);

            // Subsequence: positions in the original are strictly increasing.
            let positions: Vec<usize> = once
                .iter()
                .map(|kept| actions.iter().position(|a| std::ptr::eq(a, *kept)).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }
}

// tests/property_validators.rs

use std::path::Path;

use proptest::prelude::*;
use pio_mcp::validate::{PathPolicy, validate_identifier, validate_port};

const ROOT: &str = "/srv/pio";

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-zA-Z0-9_-]{1,8}",
        1 => Just("..".to_string()),
        1 => Just(".".to_string()),
    ]
}

proptest! {
    // Whatever the segments, an accepted path is inside the root and has
    // no `.` or `..` left in it.
    #[cfg(unix)]
    #[test]
    fn accepted_paths_stay_inside_root(segments in proptest::collection::vec(segment(), 0..8)) {
        let policy = PathPolicy::new([ROOT]);
        let raw = format!("{ROOT}/{}", segments.join("/"));
        if let Ok(path) = policy.validate(&raw) {
            prop_assert!(path.as_path().starts_with(ROOT));
            prop_assert!(path
                .as_path()
                .components()
                .all(|c| !matches!(c, std::path::Component::ParentDir | std::path::Component::CurDir)));
        }
    }

    // Normalizing an accepted path again is a no-op.
    #[cfg(unix)]
    #[test]
    fn path_validation_is_idempotent(segments in proptest::collection::vec(segment(), 0..8)) {
        let policy = PathPolicy::new([ROOT]);
        let raw = format!("{ROOT}/{}", segments.join("/"));
        if let Ok(first) = policy.validate(&raw) {
            let again = policy.validate_path(first.as_path()).unwrap();
            prop_assert_eq!(first, again);
        }
    }

    // More `..` than real segments always escapes the root.
    #[cfg(unix)]
    #[test]
    fn surplus_parent_segments_are_rejected(depth in 0usize..4, extra in 1usize..4) {
        let policy = PathPolicy::new([ROOT]);
        let down = vec!["d"; depth].join("/");
        // ROOT itself is two levels deep.
        let up = vec![".."; depth + 2 + extra].join("/");
        let raw = format!("{ROOT}/{down}/{up}/etc");
        prop_assert!(policy.validate(&raw).is_err());
    }

    #[test]
    fn identifiers_round_trip_exactly(id in "[a-zA-Z0-9_.][a-zA-Z0-9_.-]{0,40}") {
        let validated = validate_identifier("board", &id).unwrap();
        prop_assert_eq!(validated.as_str(), id.as_str());
    }

    #[test]
    fn identifiers_with_any_disallowed_char_are_rejected(
        prefix in "[a-z]{0,5}",
        bad in "[ ;|&$`<>'\"()\\\\/*?!#]",
        suffix in "[a-z]{0,5}",
    ) {
        let id = format!("{prefix}{bad}{suffix}");
        prop_assert!(validate_identifier("board", &id).is_err());
    }

    #[test]
    fn validators_never_panic(s in "\\PC{0,64}") {
        let _ = validate_identifier("board", &s);
        let _ = validate_port(&s);
        let _ = PathPolicy::new([ROOT]).validate(&s);
    }
}

#[test]
fn root_itself_is_a_valid_project_dir() {
    let policy = PathPolicy::new([ROOT]);
    if cfg!(unix) {
        assert_eq!(policy.validate(ROOT).unwrap().as_path(), Path::new(ROOT));
    }
}

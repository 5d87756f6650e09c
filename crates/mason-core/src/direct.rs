//! Direct build commands that bypass the planner.
//!
//! `build <structure> [at] <x> <y> <z>` is unambiguous, so the runtime turns
//! it straight into a one-task plan without a planner round trip. Anything
//! else (including `build house` without coordinates) goes to the planner.

use mason_types::{ActionKind, BlockPos, Task};

use crate::planner::Plan;

/// Parse a direct build command. Coordinates may be separated by commas.
pub fn parse_build_command(command: &str) -> Option<Plan> {
    let normalized = command.trim().to_ascii_lowercase().replace(',', " ");
    let mut words: Vec<&str> = normalized.split_whitespace().collect();
    if words.first() != Some(&"build") {
        return None;
    }
    words.retain(|w| *w != "at");

    let [_, structure, x, y, z] = words.as_slice() else {
        return None;
    };
    if structure.parse::<i32>().is_ok() {
        return None;
    }
    let origin = BlockPos::new(x.parse().ok()?, y.parse().ok()?, z.parse().ok()?);

    let task = Task::of(ActionKind::Build)
        .with("structure", *structure)
        .with_position(origin);
    Some(Plan::new(format!("build {structure} at {origin}"), vec![task]))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_at() {
        for command in ["build house at 10 64 -20", "Build house 10 64 -20", "build house at 10, 64, -20"] {
            let plan = parse_build_command(command).unwrap();
            assert_eq!(plan.goal, "build house at (10, 64, -20)");
            let task = plan.tasks.first().unwrap();
            assert_eq!(task.kind().ok(), Some(ActionKind::Build));
            assert_eq!(task.str_param("structure").ok(), Some("house"));
            assert_eq!(task.position().ok(), Some(BlockPos::new(10, 64, -20)));
        }
    }

    #[test]
    fn other_commands_go_to_the_planner() {
        for command in [
            "build house",
            "build a big house at 1 2 3",
            "build house at 1 2",
            "build house at one two three",
            "mine 10 dirt",
            "build 1 2 3",
            "",
        ] {
            assert!(parse_build_command(command).is_none(), "{command}");
        }
    }
}

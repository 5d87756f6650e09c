//! A small rule-based planner for imperative commands.
//!
//! [`RulePlanner`] understands one verb per clause and splits multi-step
//! commands on `then` and `and`:
//!
//! ```text
//! mine 10 dirt then craft 4 oak_planks
//! go to 5 1 5 and place torch at 5 2 5
//! kill 3 zombies
//! follow me / follow Steve
//! defend me / protect Alex
//! build tower 3x8x3 / build house at 4 0 4
//! help build
//! ```
//!
//! It stands in for a language-model planner in the engine demo.

use mason_types::{ActionKind, BlockPos, EntityCategory, Task};

use crate::planner::{Plan, PlanningContext, PlanningError, Planner};

/// Planner backed by a fixed verb table.
#[derive(Debug, Clone, Copy, Default)]
pub struct RulePlanner;

impl RulePlanner {
    /// Create a rule planner.
    pub const fn new() -> Self {
        Self
    }
}

impl Planner for RulePlanner {
    fn plan(&self, ctx: &PlanningContext, command: &str) -> Result<Plan, PlanningError> {
        let normalized = command.trim().to_ascii_lowercase().replace(',', " ");
        let mut tasks = Vec::new();
        for clause in clauses(&normalized) {
            let task = parse_clause(ctx, &clause)
                .ok_or_else(|| PlanningError::not_understood(command))?;
            tasks.push(task);
        }
        if tasks.is_empty() {
            return Err(PlanningError::not_understood(command));
        }
        Ok(Plan::new(command.trim(), tasks))
    }
}

/// Split on the `then` / `and` connectives, dropping empty clauses.
fn clauses(command: &str) -> Vec<Vec<&str>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for word in command.split_whitespace() {
        if matches!(word, "then" | "and") {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(word);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn parse_clause(ctx: &PlanningContext, words: &[&str]) -> Option<Task> {
    let (verb, rest) = words.split_first()?;
    let rest = strip_fillers(rest);
    match *verb {
        "mine" | "dig" => {
            let (quantity, block) = counted(&rest)?;
            Some(
                Task::of(ActionKind::Mine)
                    .with("block", block)
                    .with("quantity", quantity),
            )
        }
        "gather" | "collect" | "harvest" => {
            let (quantity, resource) = counted(&rest)?;
            Some(
                Task::of(ActionKind::Gather)
                    .with("resource", resource)
                    .with("quantity", quantity),
            )
        }
        "craft" | "make" => {
            let (quantity, item) = counted(&rest)?;
            Some(
                Task::of(ActionKind::Craft)
                    .with("item", item)
                    .with("quantity", quantity),
            )
        }
        "go" | "walk" | "goto" | "move" => {
            let coords = rest.strip_prefix(&["to"]).unwrap_or(rest.as_slice());
            Some(Task::of(ActionKind::Pathfind).with_position(position(coords)?))
        }
        "place" | "put" => {
            let (block, coords) = rest.split_first()?;
            let coords = coords.strip_prefix(&["at"]).unwrap_or(coords);
            Some(
                Task::of(ActionKind::Place)
                    .with("block", *block)
                    .with_position(position(coords)?),
            )
        }
        "attack" | "fight" => {
            let [kind] = rest.as_slice() else {
                return None;
            };
            Some(Task::of(ActionKind::Attack).with("target", singular(kind)))
        }
        "kill" | "hunt" => {
            let (count, kind) = counted(&rest)?;
            Some(
                Task::of(ActionKind::Kill)
                    .with("target", singular(&kind))
                    .with("count", count),
            )
        }
        "spawn" | "summon" => {
            let (kind, coords) = rest.split_first()?;
            let task = Task::of(ActionKind::Spawn).with("entity", singular(kind));
            match coords.strip_prefix(&["at"]).unwrap_or(coords) {
                [] => Some(task),
                coords => Some(task.with_position(position(coords)?)),
            }
        }
        "follow" => {
            let [who] = rest.as_slice() else {
                return None;
            };
            let target = if *who == "me" { "player" } else { *who };
            Some(Task::of(ActionKind::Follow).with("target", target))
        }
        "defend" | "protect" | "guard" => {
            let [who] = rest.as_slice() else {
                return None;
            };
            let ward = if *who == "me" {
                nearest_player(ctx)?
            } else {
                (*who).to_owned()
            };
            Some(Task::of(ActionKind::Defend).with("entity", ward))
        }
        "build" => build_clause(&rest),
        "help" => {
            // "help build" or "help": join the oldest build in progress.
            if !matches!(rest.as_slice(), [] | ["build"] | ["build", "it"]) {
                return None;
            }
            let active = ctx.active_builds.iter().find(|b| !b.complete)?;
            Some(Task::of(ActionKind::Build).with("structure", active.structure_kind.as_str()))
        }
        _ => None,
    }
}

fn build_clause(words: &[&str]) -> Option<Task> {
    let (structure, rest) = words.split_first()?;
    let mut task = Task::of(ActionKind::Build).with("structure", *structure);
    let mut rest = rest;
    if let Some((w, h, d)) = rest.first().and_then(|word| dimensions(word)) {
        task = task.with("width", w).with("height", h).with("depth", d);
        rest = rest.get(1..).unwrap_or_default();
    }
    let rest = rest.strip_prefix(&["at"]).unwrap_or(rest);
    if rest.is_empty() {
        return Some(task);
    }
    Some(task.with_position(position(rest)?))
}

/// Drop articles so "mine some dirt" and "craft a stick" read naturally.
fn strip_fillers<'a>(words: &[&'a str]) -> Vec<&'a str> {
    words
        .iter()
        .copied()
        .filter(|w| !matches!(*w, "a" | "an" | "the" | "some"))
        .collect()
}

/// `[N] <name words...>` with the name joined by underscores.
fn counted(words: &[&str]) -> Option<(u32, String)> {
    let (count, name) = match words.split_first() {
        Some((first, rest)) if first.parse::<u32>().is_ok() => (first.parse().ok()?, rest),
        _ => (1, words),
    };
    if name.is_empty() || count == 0 {
        return None;
    }
    Some((count, name.join("_")))
}

fn position(words: &[&str]) -> Option<BlockPos> {
    let [x, y, z] = words else {
        return None;
    };
    Some(BlockPos::new(x.parse().ok()?, y.parse().ok()?, z.parse().ok()?))
}

/// `WxHxD`, e.g. `5x4x5`.
fn dimensions(word: &str) -> Option<(u32, u32, u32)> {
    let mut parts = word.split('x');
    let w = parts.next()?.parse().ok()?;
    let h = parts.next()?.parse().ok()?;
    let d = parts.next()?.parse().ok()?;
    parts.next().is_none().then_some((w, h, d))
}

fn singular(word: &str) -> String {
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() && !stem.ends_with('s') => stem.to_owned(),
        _ => word.to_owned(),
    }
}

fn nearest_player(ctx: &PlanningContext) -> Option<String> {
    ctx.nearby_entities
        .iter()
        .find(|e| e.category == EntityCategory::Player)
        .map(|e| e.name.clone())
}

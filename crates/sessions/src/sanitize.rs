//! Turn-sequence sanitizer.
//!
//! Runs before every completion call and before every persist. Stored
//! history may come from older deployments and carry shapes the completion
//! API rejects, so the output of this function is the only shape that ever
//! leaves the process.

use std::collections::{HashMap, HashSet};

use lb_domain::tool::{Role, Turn};

/// Normalize tool-call annotations.
///
/// - `tool_calls` survives only on assistant turns, and only when non-empty.
/// - A `tool` turn is kept only when its `tool_call_id` was requested by an
///   earlier assistant turn. It answers the most recent such turn, so a
///   provider that reuses ids across turns still gets each call paired.
/// - An assistant tool call that never received a `tool` turn is pruned.
///
/// Pure and idempotent.
pub fn sanitize(turns: &[Turn]) -> Vec<Turn> {
    // call id -> index of the latest assistant turn that requested it
    let mut requested: HashMap<&str, usize> = HashMap::new();
    let mut answered: HashSet<(usize, &str)> = HashSet::new();
    let mut keep = vec![true; turns.len()];

    for (i, turn) in turns.iter().enumerate() {
        match turn.role {
            Role::Assistant => {
                if let Some(calls) = &turn.tool_calls {
                    requested.extend(calls.iter().map(|c| (c.id.as_str(), i)));
                }
            }
            Role::Tool => match turn.tool_call_id.as_deref() {
                Some(id) => match requested.get(id) {
                    Some(&owner) => {
                        answered.insert((owner, id));
                    }
                    None => keep[i] = false,
                },
                None => keep[i] = false,
            },
            _ => {}
        }
    }

    turns
        .iter()
        .enumerate()
        .filter(|(i, _)| keep[*i])
        .map(|(i, turn)| {
            let mut turn = turn.clone();
            turn.tool_calls = match (turn.role, turn.tool_calls.take()) {
                (Role::Assistant, Some(mut calls)) => {
                    calls.retain(|c| answered.contains(&(i, c.id.as_str())));
                    (!calls.is_empty()).then_some(calls)
                }
                _ => None,
            };
            turn
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lb_domain::tool::ToolCall;
    use serde_json::json;

    fn call(id: &str) -> ToolCall {
        ToolCall::new(id, "show_food_image", &json!({"dish_name": "Wagyu Steak"}))
    }

    fn with_calls(mut turn: Turn, calls: Vec<ToolCall>) -> Turn {
        turn.tool_calls = Some(calls);
        turn
    }

    #[test]
    fn empty_assistant_tool_calls_are_removed() {
        let out = sanitize(&[with_calls(Turn::assistant("hi"), vec![])]);
        assert!(out[0].tool_calls.is_none());
        assert_eq!(out[0].content, "hi");
    }

    #[test]
    fn non_assistant_tool_calls_are_stripped() {
        let out = sanitize(&[
            with_calls(Turn::system("s"), vec![call("a")]),
            with_calls(Turn::user("u"), vec![]),
        ]);
        assert!(out.iter().all(|t| t.tool_calls.is_none()));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn answered_call_is_kept() {
        let turns = vec![
            Turn::user("show me wagyu"),
            Turn::assistant_with_tools("", vec![call("c1")]),
            Turn::tool_result("c1", "show_food_image", "{}"),
        ];
        assert_eq!(sanitize(&turns), turns);
    }

    #[test]
    fn orphan_tool_turn_is_dropped() {
        let out = sanitize(&[
            Turn::user("hi"),
            Turn::tool_result("ghost", "show_food_image", "{}"),
            Turn::assistant("hello"),
        ]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|t| t.role != Role::Tool));
    }

    #[test]
    fn tool_turn_before_its_call_is_dropped() {
        let out = sanitize(&[
            Turn::tool_result("c1", "show_food_image", "{}"),
            Turn::assistant_with_tools("", vec![call("c1")]),
        ]);
        assert_eq!(out.len(), 1);
        assert!(out[0].tool_calls.is_none());
    }

    #[test]
    fn unanswered_call_is_pruned() {
        let out = sanitize(&[
            Turn::assistant_with_tools("", vec![call("c1"), call("c2")]),
            Turn::tool_result("c2", "show_food_image", "{}"),
        ]);
        let calls = out[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "c2");
    }

    #[test]
    fn reused_id_pairs_with_latest_request() {
        let menu = ToolCall::new("call_0", "get_menu", &json!({}));
        let booking = ToolCall::new("call_0", "book_table", &json!({"party": 2}));
        let turns = vec![
            Turn::user("menu?"),
            Turn::assistant_with_tools("", vec![menu]),
            Turn::tool_result("call_0", "get_menu", "{}"),
            Turn::assistant("Here is the menu."),
            Turn::user("book a table"),
            Turn::assistant_with_tools("One moment.", vec![booking]),
        ];
        let out = sanitize(&turns);
        assert_eq!(out.len(), 6);
        assert_eq!(out[1].tool_calls.as_ref().map(Vec::len), Some(1));
        assert!(out[5].tool_calls.is_none());
        assert_eq!(sanitize(&out), out);
    }

    #[test]
    fn reused_id_answered_twice_keeps_both_calls() {
        let turns = vec![
            Turn::assistant_with_tools("", vec![call("call_0")]),
            Turn::tool_result("call_0", "show_food_image", "{}"),
            Turn::assistant_with_tools("", vec![call("call_0")]),
            Turn::tool_result("call_0", "show_food_image", "{}"),
        ];
        assert_eq!(sanitize(&turns), turns);
    }

    #[test]
    fn idempotent_and_invariants_hold() {
        let messy = vec![
            with_calls(Turn::system("s"), vec![call("x")]),
            Turn::user("u"),
            with_calls(Turn::assistant("a"), vec![]),
            Turn::assistant_with_tools("", vec![call("c1"), call("c2")]),
            Turn::tool_result("c1", "show_food_image", "{}"),
            Turn::tool_result("zz", "get_menu", "{}"),
            with_calls(Turn::user("again"), vec![call("q")]),
            Turn::assistant_with_tools("", vec![call("c3")]),
        ];
        let once = sanitize(&messy);
        assert_eq!(sanitize(&once), once);

        for turn in &once {
            match turn.role {
                Role::Assistant => {
                    if let Some(calls) = &turn.tool_calls {
                        assert!(!calls.is_empty());
                    }
                }
                _ => assert!(turn.tool_calls.is_none()),
            }
        }
    }
}

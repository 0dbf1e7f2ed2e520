//! Tool dispatch for one model reply.
//!
//! Every requested call is resolved against the [`ToolRegistry`] in order.
//! A resolved call appends exactly one `tool` turn to the session; an
//! unregistered one appends nothing and does not stop the rest of the batch.

use std::sync::LazyLock;

use lb_domain::tool::{ToolCall, Turn};
use lb_domain::trace::TraceEvent;
use lb_sessions::SessionHandle;
use lb_tools::{ToolRegistry, ToolResultCard, SHOW_FOOD_IMAGE};
use regex::Regex;

/// Canned apology some models emit instead of text alongside a tool call.
static TEMPLATED_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^sorry, i encountered").expect("valid regex"));

#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Cards in call order, one per resolved `show_food_image` call.
    pub cards: Vec<ToolResultCard>,
    /// Number of calls that produced a `tool` turn.
    pub executed: usize,
}

/// Run every call in `calls`, appending the `tool` turns to `session`.
pub fn dispatch_tool_calls(
    registry: &ToolRegistry,
    session: &SessionHandle,
    calls: &[ToolCall],
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();

    for call in calls {
        let result = registry.invoke(call.name(), &call.function.arguments);

        TraceEvent::ToolDispatched {
            session_id: session.id().to_owned(),
            tool_name: call.name().to_owned(),
            call_id: call.id.clone(),
            resolved: result.is_some(),
        }
        .emit();

        let Some(result) = result else {
            tracing::warn!(
                session_id = session.id(),
                tool = call.name(),
                "tool call not handled (unregistered or malformed arguments)"
            );
            continue;
        };

        session.append(Turn::tool_result(
            call.id.clone(),
            call.name(),
            result.content.to_string(),
        ));
        outcome.executed += 1;
        if let Some(card) = result.card {
            outcome.cards.push(card);
        }
    }

    outcome
}

/// Whether the first reply's text should be replaced by a synthesized one.
pub fn needs_fallback(content: &str) -> bool {
    content.trim().is_empty() || TEMPLATED_ERROR.is_match(content.trim_start())
}

/// `Here's the {dish}: {description}` from the first recognised
/// `show_food_image` call, if any.
pub fn fallback_reply(registry: &ToolRegistry, calls: &[ToolCall]) -> Option<String> {
    calls
        .iter()
        .filter(|c| c.name() == SHOW_FOOD_IMAGE && registry.is_registered(SHOW_FOOD_IMAGE))
        .find_map(|c| registry.food_card(&c.function.arguments))
        .map(|card| format!("Here's the {}: {}", card.dish_name, card.description))
}

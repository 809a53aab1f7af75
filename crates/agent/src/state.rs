//! The reasoning/act loop as an explicit state machine.
//!
//! ```text
//! Reasoning --ToolCallParsed--> Dispatching --ToolResultReady--> Reasoning
//! Reasoning --FinishParsed----> Finished
//! Reasoning --BudgetExhausted-> Aborted
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting on the model's next step.
    #[default]
    Reasoning,
    /// A tool call is being executed.
    Dispatching,
    /// The model produced a final answer.
    Finished,
    /// The iteration budget ran out.
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    ToolCallParsed,
    ToolResultReady,
    FinishParsed,
    BudgetExhausted,
}

impl LoopState {
    /// The state after `event`, or `None` if the transition is not allowed.
    pub fn next(self, event: LoopEvent) -> Option<LoopState> {
        use LoopEvent::*;
        use LoopState::*;
        match (self, event) {
            (Reasoning, ToolCallParsed) => Some(Dispatching),
            (Dispatching, ToolResultReady) => Some(Reasoning),
            (Reasoning, FinishParsed) => Some(Finished),
            (Reasoning, BudgetExhausted) => Some(Aborted),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Finished | LoopState::Aborted)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::Reasoning => "reasoning",
            LoopState::Dispatching => "dispatching",
            LoopState::Finished => "finished",
            LoopState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_round_trip_returns_to_reasoning() {
        let s = LoopState::default();
        let s = s.next(LoopEvent::ToolCallParsed).unwrap();
        assert_eq!(s, LoopState::Dispatching);
        let s = s.next(LoopEvent::ToolResultReady).unwrap();
        assert_eq!(s, LoopState::Reasoning);
    }

    #[test]
    fn terminal_transitions() {
        assert_eq!(
            LoopState::Reasoning.next(LoopEvent::FinishParsed),
            Some(LoopState::Finished)
        );
        assert_eq!(
            LoopState::Reasoning.next(LoopEvent::BudgetExhausted),
            Some(LoopState::Aborted)
        );
        assert!(LoopState::Finished.is_terminal());
        assert!(LoopState::Aborted.is_terminal());
        assert!(!LoopState::Dispatching.is_terminal());
    }

    #[test]
    fn invalid_transitions_rejected() {
        assert_eq!(LoopState::Dispatching.next(LoopEvent::FinishParsed), None);
        assert_eq!(LoopState::Dispatching.next(LoopEvent::ToolCallParsed), None);
        assert_eq!(LoopState::Reasoning.next(LoopEvent::ToolResultReady), None);
        assert_eq!(LoopState::Finished.next(LoopEvent::ToolCallParsed), None);
        assert_eq!(LoopState::Aborted.next(LoopEvent::FinishParsed), None);
    }
}

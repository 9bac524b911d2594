//! 编排器阶段
//!
//! AwaitingInput → Completing → {Dispatching, Terminal}；Dispatching → Completing；
//! Completing（最终回复）→ AwaitingInput | Terminal。Terminal 之后不再迁移。

use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentPhase {
    #[default]
    AwaitingInput,
    Completing,
    Dispatching,
    Terminal,
}

impl AgentPhase {
    pub fn is_terminal(self) -> bool {
        self == AgentPhase::Terminal
    }

    /// 合法迁移
    pub fn can_transition_to(self, next: AgentPhase) -> bool {
        use AgentPhase::*;
        matches!(
            (self, next),
            (AwaitingInput, Completing)
                | (AwaitingInput, Terminal)
                | (Completing, Dispatching)
                | (Completing, AwaitingInput)
                | (Completing, Terminal)
                | (Dispatching, Completing)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_is_absorbing() {
        for next in [
            AgentPhase::AwaitingInput,
            AgentPhase::Completing,
            AgentPhase::Dispatching,
            AgentPhase::Terminal,
        ] {
            assert!(!AgentPhase::Terminal.can_transition_to(next));
        }
    }

    #[test]
    fn test_only_terminal_is_terminal() {
        assert!(AgentPhase::Terminal.is_terminal());
        assert!(!AgentPhase::AwaitingInput.is_terminal());
        assert!(!AgentPhase::Completing.is_terminal());
        assert!(!AgentPhase::Dispatching.is_terminal());
    }

    #[test]
    fn test_dispatch_always_returns_to_completing() {
        assert!(AgentPhase::Dispatching.can_transition_to(AgentPhase::Completing));
        assert!(!AgentPhase::Dispatching.can_transition_to(AgentPhase::AwaitingInput));
        assert!(!AgentPhase::Dispatching.can_transition_to(AgentPhase::Terminal));
    }
}

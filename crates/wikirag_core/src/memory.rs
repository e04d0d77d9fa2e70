use crate::domain::ConversationTurn;

/// In-process accumulator of question/answer turns, oldest first.
///
/// With a limit set, appending past it evicts the oldest retained turn.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: Vec<ConversationTurn>,
    limit: Option<usize>,
    total: u64,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` and `Some(0)` both mean unbounded.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            turns: Vec::new(),
            limit: limit.filter(|n| *n > 0),
            total: 0,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        self.total += 1;
        if let Some(limit) = self.limit {
            if self.turns.len() > limit {
                let evicted = self.turns.len() - limit;
                self.turns.drain(..evicted);
                tracing::debug!(evicted, limit, "conversation history trimmed");
            }
        }
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Turns appended over the session, including evicted ones.
    pub fn total_turns(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(i: usize) -> ConversationTurn {
        ConversationTurn {
            question: format!("q{i}"),
            answer: format!("a{i}"),
        }
    }

    #[test]
    fn unbounded_memory_keeps_every_turn_in_order() {
        let mut mem = ConversationMemory::new();
        for i in 0..40 {
            mem.append(turn(i));
        }
        assert_eq!(mem.history().len(), 40);
        assert_eq!(mem.history()[0].question, "q0");
        assert_eq!(mem.history()[39].question, "q39");
    }

    #[test]
    fn bounded_memory_evicts_oldest_first() {
        let mut mem = ConversationMemory::with_limit(Some(3));
        for i in 0..5 {
            mem.append(turn(i));
        }
        let questions: Vec<&str> = mem.history().iter().map(|t| t.question.as_str()).collect();
        assert_eq!(questions, vec!["q2", "q3", "q4"]);
        assert_eq!(mem.total_turns(), 5);
    }

    #[test]
    fn zero_limit_is_unbounded() {
        let mem = ConversationMemory::with_limit(Some(0));
        assert_eq!(mem.limit(), None);
    }
}

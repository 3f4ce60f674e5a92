//! Conversation memory: the ordered log of question/answer exchanges.

/// One recorded question/answer pair.
///
/// `index` is the 1-based position the exchange took when it was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    index: usize,
    question: String,
    answer: String,
}

impl Exchange {
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }
}

/// Append-only sequence of exchanges, cleared only as a whole.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    exchanges: Vec<Exchange>,
}

impl ConversationMemory {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            exchanges: Vec::new(),
        }
    }

    /// Append an exchange with the next index and return it.
    pub fn record(&mut self, question: String, answer: String) -> &Exchange {
        let index = self.exchanges.len() + 1;
        self.exchanges.push(Exchange {
            index,
            question,
            answer,
        });
        &self.exchanges[index - 1]
    }

    /// Drop every exchange; the next one recorded gets index 1.
    pub fn clear(&mut self) {
        self.exchanges.clear();
    }

    #[must_use]
    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    #[must_use]
    pub fn last(&self) -> Option<&Exchange> {
        self.exchanges.last()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.exchanges.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}

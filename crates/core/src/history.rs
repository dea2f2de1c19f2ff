/// Direction of a history step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Outcome of a history step, applied to the command text by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryStep<'a> {
    /// Load this entry with the caret at its end.
    Load(&'a str),
    /// Moved past the newest entry: clear the command, caret at start.
    Clear,
    /// Nothing to do.
    Stay,
}

/// Past commands, oldest first, plus the navigation pointer.
/// `index == entries.len()` means a fresh, not-yet-submitted command.
#[derive(Clone, Debug, Default)]
pub struct CommandHistory {
    entries: Vec<String>,
    index: usize,
}

impl CommandHistory {
    pub fn new(entries: Vec<String>) -> Self {
        let index = entries.len();
        Self { entries, index }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Full replacement is the only way entries change on the client.
    pub fn replace(&mut self, entries: Vec<String>) {
        self.index = entries.len();
        self.entries = entries;
    }

    pub fn step(&mut self, direction: Direction) -> HistoryStep<'_> {
        let len = self.entries.len();
        if len == 0 {
            return HistoryStep::Stay;
        }
        match direction {
            Direction::Up if self.index > 0 => {
                self.index -= 1;
                HistoryStep::Load(&self.entries[self.index])
            }
            Direction::Down if self.index + 1 < len => {
                self.index += 1;
                HistoryStep::Load(&self.entries[self.index])
            }
            Direction::Down if self.index + 1 == len => {
                self.index = len;
                HistoryStep::Clear
            }
            _ => HistoryStep::Stay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> CommandHistory {
        CommandHistory::new(vec!["ls".into(), "pwd".into(), "cd /".into()])
    }

    #[test]
    fn up_walks_back_and_stops_at_oldest() {
        let mut h = sample();
        assert_eq!(h.index(), 3);
        assert_eq!(h.step(Direction::Up), HistoryStep::Load("cd /"));
        assert_eq!(h.step(Direction::Up), HistoryStep::Load("pwd"));
        assert_eq!(h.step(Direction::Up), HistoryStep::Load("ls"));
        assert_eq!(h.step(Direction::Up), HistoryStep::Stay);
        assert_eq!(h.index(), 0);
    }

    #[test]
    fn down_from_newest_clears_then_stays() {
        let mut h = sample();
        h.step(Direction::Up);
        assert_eq!(h.index(), 2);
        assert_eq!(h.step(Direction::Down), HistoryStep::Clear);
        assert_eq!(h.index(), 3);
        assert_eq!(h.step(Direction::Down), HistoryStep::Stay);
        assert_eq!(h.step(Direction::Down), HistoryStep::Stay);
        assert_eq!(h.index(), 3);
    }

    #[test]
    fn down_moves_forward_through_entries() {
        let mut h = sample();
        for _ in 0..3 {
            h.step(Direction::Up);
        }
        assert_eq!(h.step(Direction::Down), HistoryStep::Load("pwd"));
        assert_eq!(h.step(Direction::Down), HistoryStep::Load("cd /"));
        assert_eq!(h.step(Direction::Down), HistoryStep::Clear);
    }

    #[test]
    fn empty_history_never_moves() {
        let mut h = CommandHistory::default();
        assert_eq!(h.step(Direction::Up), HistoryStep::Stay);
        assert_eq!(h.step(Direction::Down), HistoryStep::Stay);
        assert_eq!(h.index(), 0);
    }

    #[test]
    fn replace_resets_index_to_fresh() {
        let mut h = sample();
        h.step(Direction::Up);
        h.replace(vec!["echo hi".into()]);
        assert_eq!(h.index(), 1);
        assert_eq!(h.entries(), ["echo hi".to_string()]);
    }
}

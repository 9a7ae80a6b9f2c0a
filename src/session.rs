use crate::scorer::RoundResult;

/// Running tally across rounds.
#[derive(Debug, Default)]
pub struct Session {
    results: Vec<RoundResult>,
    timed_out: usize,
}

impl Session {
    pub fn new() -> Session {
        Session::default()
    }

    pub fn record(&mut self, result: RoundResult) {
        self.results.push(result);
    }

    /// A round that ran out of time without a guess.
    pub fn record_timeout(&mut self) {
        self.timed_out += 1;
    }

    pub fn rounds_played(&self) -> usize {
        self.results.len() + self.timed_out
    }

    pub fn rounds_timed_out(&self) -> usize {
        self.timed_out
    }

    pub fn total_score(&self) -> u64 {
        self.results.iter().map(|r| r.score() as u64).sum()
    }

    /// Closest guess so far.
    pub fn best(&self) -> Option<&RoundResult> {
        self.results
            .iter()
            .min_by(|a, b| a.distance_km().total_cmp(&b.distance_km()))
    }

    pub fn results(&self) -> &[RoundResult] {
        &self.results
    }
}

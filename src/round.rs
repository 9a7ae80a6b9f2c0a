//! One play cycle: target, imagery snap, guess, score.
//!
//! A round moves `Loading -> Ready -> Guessed -> Scored` and is driven by
//! explicit events from the caller. A round whose target cannot be fetched
//! ends in `Failed`; the only way out is [`Round::next`]. The countdown only
//! runs while the player can still guess.

use std::time::Duration;

use tracing::{info, warn};

use crate::{
    coordinate::Coordinate,
    error::{Error, Result},
    provider::{Target, TargetProvider},
    scorer::{score_guess, RoundResult},
    snap::{scoring_reference, ImageryResolver, SnapResult, SNAP_RADIUS_M},
};

#[derive(Debug, Clone, PartialEq)]
pub enum RoundState {
    Loading,
    Ready,
    Guessed,
    Scored(Outcome),
    Failed(String),
}

impl RoundState {
    fn name(&self) -> &'static str {
        match self {
            RoundState::Loading => "loading",
            RoundState::Ready => "ready",
            RoundState::Guessed => "guessed",
            RoundState::Scored(_) => "scored",
            RoundState::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Result(RoundResult),
    /// Countdown ran out before any guess was placed.
    TimedOut,
}

#[derive(Debug)]
pub struct Round {
    state: RoundState,
    time_limit: Duration,
    remaining: Duration,
    target: Option<Target>,
    snap: Option<SnapResult>,
    guess: Option<Coordinate>,
}

impl Round {
    pub fn new(time_limit: Duration) -> Round {
        Round {
            state: RoundState::Loading,
            time_limit,
            remaining: time_limit,
            target: None,
            snap: None,
            guess: None,
        }
    }

    /// Fetch the target, then snap it to imagery.
    ///
    /// A failed fetch is terminal for this round. A failed or empty snap is
    /// not: the round becomes `Ready` without imagery and scores against the
    /// unsnapped target.
    pub fn start<P, R>(&mut self, provider: &P, resolver: &R) -> Result<&RoundState>
    where
        P: TargetProvider + ?Sized,
        R: ImageryResolver + ?Sized,
    {
        self.expect_state("start", matches!(self.state, RoundState::Loading))?;

        let target = match provider.fetch() {
            Ok(target) => target,
            Err(e) => {
                warn!("Round cannot start: {e}");
                self.state = RoundState::Failed(e.to_string());
                return Ok(&self.state);
            }
        };

        let snap = match resolver.resolve(target.coordinate, SNAP_RADIUS_M) {
            Ok(snap) => snap,
            Err(e) => {
                warn!("Imagery snap failed for {}: {e}", target.coordinate);
                SnapResult::NotFound
            }
        };
        if snap == SnapResult::NotFound {
            info!("No imagery near {}", target.coordinate);
        }

        self.target = Some(target);
        self.snap = Some(snap);
        self.state = RoundState::Ready;
        Ok(&self.state)
    }

    /// Place or move the guess pin.
    pub fn place_guess(&mut self, guess: Coordinate) -> Result<()> {
        self.expect_state(
            "place a guess",
            matches!(self.state, RoundState::Ready | RoundState::Guessed),
        )?;
        self.guess = Some(guess);
        self.state = RoundState::Guessed;
        Ok(())
    }

    pub fn submit(&mut self) -> Result<RoundResult> {
        self.expect_state("submit", matches!(self.state, RoundState::Guessed))?;
        let (target, guess) = match (&self.target, self.guess) {
            (Some(target), Some(guess)) => (target.coordinate, guess),
            _ => {
                return Err(Error::InvalidTransition {
                    action: "submit",
                    state: self.state.name(),
                })
            }
        };
        let reference = scoring_reference(target, self.snap.as_ref());
        let result = score_guess(reference, guess);
        info!(
            "Scored guess {guess} against {reference}: {:.3} km, {} points",
            result.distance_km(),
            result.score()
        );
        self.state = RoundState::Scored(Outcome::Result(result));
        Ok(result)
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> &RoundState {
        self.tick_by(Duration::from_secs(1))
    }

    pub fn tick_by(&mut self, elapsed: Duration) -> &RoundState {
        if !matches!(self.state, RoundState::Ready | RoundState::Guessed) {
            return &self.state;
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        if self.remaining.is_zero() {
            if self.guess.is_some() {
                info!("Time is up, submitting placed guess");
                if let Err(e) = self.submit() {
                    warn!("Auto-submit failed: {e}");
                }
            } else {
                info!("Time is up without a guess");
                self.state = RoundState::Scored(Outcome::TimedOut);
            }
        }
        &self.state
    }

    /// A fresh round with the same time limit.
    pub fn next(&self) -> Result<Round> {
        self.expect_state(
            "start the next round",
            matches!(self.state, RoundState::Scored(_) | RoundState::Failed(_)),
        )?;
        Ok(Round::new(self.time_limit))
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn snap(&self) -> Option<&SnapResult> {
        self.snap.as_ref()
    }

    pub fn guess(&self) -> Option<Coordinate> {
        self.guess
    }

    /// Where imagery is shown. `None` with a target means no imagery nearby.
    pub fn display_center(&self) -> Option<Coordinate> {
        self.snap.as_ref().and_then(SnapResult::coordinate)
    }

    pub fn imagery_available(&self) -> bool {
        self.display_center().is_some()
    }

    /// The coordinate guesses are scored against, once the target is known.
    pub fn reference(&self) -> Option<Coordinate> {
        self.target
            .as_ref()
            .map(|t| scoring_reference(t.coordinate, self.snap.as_ref()))
    }

    pub fn result(&self) -> Option<RoundResult> {
        match self.state {
            RoundState::Scored(Outcome::Result(result)) => Some(result),
            _ => None,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    fn expect_state(&self, action: &'static str, ok: bool) -> Result<()> {
        if ok {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                action,
                state: self.state.name(),
            })
        }
    }
}

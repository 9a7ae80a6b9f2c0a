use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
    time::{Duration, Instant},
};

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use geoscore::{
    compute_distance_km, compute_score, load_panoramas, Cache, CachedResolver, Config, Coordinate,
    FixedTargets, HttpImageryResolver, HttpTargetProvider, ImageryResolver, LocalImagery, Outcome,
    Round, RoundState, Session, Target, TargetProvider,
};

/// Score location guesses against street-imagery targets
#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[arg(short, long, action, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Distance and score between a reference and a guess
    Distance {
        /// Reference latitude
        #[arg(allow_negative_numbers = true)]
        ref_lat: String,
        /// Reference longitude
        #[arg(allow_negative_numbers = true)]
        ref_lon: String,
        /// Guess latitude
        #[arg(allow_negative_numbers = true)]
        guess_lat: String,
        /// Guess longitude
        #[arg(allow_negative_numbers = true)]
        guess_lon: String,
    },
    /// Score for a distance in kilometres
    Score { distance_km: f64 },
    /// Play rounds in the terminal, reading "lat lon" guesses from stdin
    Play {
        #[arg(short, long, default_value_t = 5)]
        rounds: usize,
        /// Seconds per round
        #[arg(short, long, default_value_t = 120)]
        time_limit: u64,
        /// JSON array of panorama locations, used when no remote service is configured
        #[arg(short, long)]
        panoramas: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = Cli::parse();
    geoscore::init_logging(args.verbose);

    let res = match args.command {
        Command::Distance {
            ref_lat,
            ref_lon,
            guess_lat,
            guess_lon,
        } => distance(&ref_lat, &ref_lon, &guess_lat, &guess_lon),
        Command::Score { distance_km } => {
            if distance_km.is_nan() || distance_km < 0.0 {
                Err(format!("distance must be non-negative, got {distance_km}").into())
            } else {
                println!("{}", compute_score(distance_km));
                Ok(())
            }
        }
        Command::Play {
            rounds,
            time_limit,
            panoramas,
        } => play(rounds, Duration::from_secs(time_limit), panoramas),
    };

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn distance(ref_lat: &str, ref_lon: &str, guess_lat: &str, guess_lon: &str) -> CliResult {
    let reference = Coordinate::parse(ref_lat, ref_lon)?;
    let guess = Coordinate::parse(guess_lat, guess_lon)?;
    let km = compute_distance_km(reference, guess);
    println!("{km:.3}\t{}", compute_score(km));
    Ok(())
}

fn play(rounds: usize, time_limit: Duration, panoramas: Option<PathBuf>) -> CliResult {
    let config = Config::load();
    let local = match &panoramas {
        Some(path) => load_panoramas(path)?,
        None => Vec::new(),
    };

    let provider: Box<dyn TargetProvider> = match &config.target_url {
        Some(url) => Box::new(HttpTargetProvider::new(url, config.http_timeout)?),
        None if !local.is_empty() => Box::new(FixedTargets::new(
            local
                .iter()
                .map(|c| Target {
                    coordinate: *c,
                    image_url: None,
                })
                .collect(),
        )),
        None => return Err("set GEOSCORE_TARGET_URL or pass --panoramas".into()),
    };
    let resolver: Box<dyn ImageryResolver> = match config.imagery() {
        Some((url, key)) => Box::new(CachedResolver::new(
            HttpImageryResolver::new(url, key, config.http_timeout)?,
            Cache::new(&config.cache_dir.join("snap"))?,
        )),
        None => Box::new(LocalImagery::new(local)),
    };

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut session = Session::new();
    let mut round = Round::new(time_limit);

    for n in 1..=rounds {
        round.start(provider.as_ref(), resolver.as_ref())?;
        if let RoundState::Failed(msg) = round.state() {
            eprintln!("Round {n} could not start: {msg}");
            return Err("no target available".into());
        }

        match round.display_center() {
            Some(center) => eprintln!("Round {n}: imagery centred at {center}"),
            None => eprintln!("Round {n}: no imagery available at this location"),
        }
        if let Some(url) = round.target().and_then(|t| t.image_url.as_deref()) {
            eprintln!("Reference image: {url}");
        }

        while matches!(round.state(), RoundState::Ready | RoundState::Guessed) {
            eprint!(
                "[{}s left] guess \"lat lon\", or \"submit\": ",
                round.remaining().as_secs()
            );
            io::stderr().flush()?;
            let asked = Instant::now();
            let line = match lines.next() {
                Some(line) => line?,
                None => {
                    info!("Input closed");
                    return finish(&session);
                }
            };
            if !matches!(
                round.tick_by(asked.elapsed()),
                RoundState::Ready | RoundState::Guessed
            ) {
                eprintln!("Time is up");
                break;
            }
            handle_input(&mut round, line.trim());
        }

        match round.state() {
            RoundState::Scored(Outcome::Result(result)) => {
                println!(
                    "round {n}\t{:.3} km\t{} points",
                    result.distance_km(),
                    result.score()
                );
                session.record(*result);
            }
            RoundState::Scored(Outcome::TimedOut) => {
                println!("round {n}\ttimed out");
                session.record_timeout();
            }
            _ => {}
        }
        if let Some(reference) = round.reference() {
            eprintln!("Answer: {reference}");
        }
        round = round.next()?;
    }

    finish(&session)
}

fn handle_input(round: &mut Round, line: &str) {
    if line == "submit" {
        if let Err(e) = round.submit() {
            eprintln!("{e}");
        }
        return;
    }
    let mut parts = line.split_whitespace();
    let parsed = match (parts.next(), parts.next()) {
        (Some(lat), Some(lon)) => Coordinate::parse(lat, lon),
        _ => {
            eprintln!("expected \"lat lon\"");
            return;
        }
    };
    match parsed {
        Ok(guess) => {
            if let Err(e) = round.place_guess(guess) {
                warn!("{e}");
            }
        }
        Err(e) => eprintln!("{e}"),
    }
}

fn finish(session: &Session) -> CliResult {
    println!(
        "total\t{} points over {} rounds ({} timed out)",
        session.total_score(),
        session.rounds_played(),
        session.rounds_timed_out()
    );
    if let Some(best) = session.best() {
        println!("best\t{:.3} km", best.distance_km());
    }
    Ok(())
}

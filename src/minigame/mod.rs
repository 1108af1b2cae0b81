//! Single-round rock/paper/scissors logic.
//!
//! Kept Discord-free so it can be tested without a gateway connection.

use std::str::FromStr;

use rand::Rng;

/// A rock/paper/scissors move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// Draw a uniformly random move.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Paper => "paper",
            Self::Scissors => "scissors",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Rock => "🪨",
            Self::Paper => "📄",
            Self::Scissors => "✂️",
        }
    }

    /// The move this move beats.
    fn beats(&self) -> Move {
        match self {
            Self::Rock => Self::Scissors,
            Self::Scissors => Self::Paper,
            Self::Paper => Self::Rock,
        }
    }
}

impl FromStr for Move {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rock" | "r" => Ok(Self::Rock),
            "paper" | "p" => Ok(Self::Paper),
            "scissors" | "s" => Ok(Self::Scissors),
            _ => Err(()),
        }
    }
}

/// Outcome of one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Tie,
    FirstWins,
    SecondWins,
}

/// Resolve one round between two moves.
pub fn resolve(first: Move, second: Move) -> Outcome {
    if first == second {
        Outcome::Tie
    } else if first.beats() == second {
        Outcome::FirstWins
    } else {
        Outcome::SecondWins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Move::*;

    #[test]
    fn test_ties() {
        for m in Move::ALL {
            assert_eq!(resolve(m, m), Outcome::Tie);
        }
    }

    #[test]
    fn test_first_wins() {
        assert_eq!(resolve(Rock, Scissors), Outcome::FirstWins);
        assert_eq!(resolve(Scissors, Paper), Outcome::FirstWins);
        assert_eq!(resolve(Paper, Rock), Outcome::FirstWins);
    }

    #[test]
    fn test_second_wins() {
        assert_eq!(resolve(Scissors, Rock), Outcome::SecondWins);
        assert_eq!(resolve(Paper, Scissors), Outcome::SecondWins);
        assert_eq!(resolve(Rock, Paper), Outcome::SecondWins);
    }

    #[test]
    fn test_parse_accepts_case_and_shorthand() {
        assert_eq!("Rock".parse::<Move>(), Ok(Rock));
        assert_eq!(" PAPER ".parse::<Move>(), Ok(Paper));
        assert_eq!("s".parse::<Move>(), Ok(Scissors));
        assert!("lizard".parse::<Move>().is_err());
    }

    #[test]
    fn test_random_is_in_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let m = Move::random(&mut rng);
            assert!(Move::ALL.contains(&m));
        }
    }
}

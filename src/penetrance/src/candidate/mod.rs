use std::io::BufRead;

use located_error::prelude::*;
use log::trace;

#[cfg(test)]
use mockall::automock;

use crate::{Dosage, PenetranceError, Population};

/// A simulated offspring: its genotype at the disease locus, and an independent uniform draw in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub dosage: Dosage,
    pub draw  : f64,
}

impl Candidate {
    /// # Errors
    /// - `InvalidDraw` if `draw` does not lie within `[0, 1)`
    pub fn new(dosage: Dosage, draw: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&draw) {
            return Err(PenetranceError::InvalidDraw(draw)).loc("While creating candidate")
        }
        Ok(Self{dosage, draw})
    }
}

/// Stream of offspring candidates. `Ok(None)` marks the end of the stream.
#[cfg_attr(test, automock)]
pub trait CandidateSource {
    fn next_candidate(&mut self) -> Result<Option<Candidate>>;
}

/// Random mating within a founder population.
///
/// Each candidate is the offspring of two randomly picked founders (with replacement), inheriting
/// one random allele from each parent. This stream never ends.
pub struct PanmicticMating<'a> {
    population: &'a Population,
    rng       : fastrand::Rng,
}

impl<'a> PanmicticMating<'a> {
    /// # Errors
    /// - `EmptyPopulation` if `population` does not contain any founder.
    pub fn new(population: &'a Population, seed: u64) -> Result<Self> {
        if population.is_empty() {
            return Err(PenetranceError::EmptyPopulation).loc("While initializing random mating")
        }
        Ok(Self{population, rng: fastrand::Rng::with_seed(seed)})
    }

    fn gamete(&mut self) -> u8 {
        let parent = &self.population.founders[self.rng.usize(..self.population.len())];
        parent.alleles()[self.rng.usize(..2)]
    }
}

impl CandidateSource for PanmicticMating<'_> {
    fn next_candidate(&mut self) -> Result<Option<Candidate>> {
        let dosage = Dosage::try_from(self.gamete() + self.gamete())
            .loc("While mating founder individuals")?;
        Ok(Some(Candidate{dosage, draw: self.rng.f64()}))
    }
}

/// Replay a pre-generated stream of candidates.
///
/// # Format
/// One candidate per line: `<dosage> [<draw>]`, whitespace separated. Empty lines and lines starting
/// with `#` are ignored. Missing draws are generated from a seeded random number generator.
pub struct CandidateReader<R: BufRead> {
    lines  : std::io::Lines<R>,
    line_no: usize,
    rng    : fastrand::Rng,
}

impl<R: BufRead> CandidateReader<R> {
    pub fn new(reader: R, seed: u64) -> Self {
        Self{lines: reader.lines(), line_no: 0, rng: fastrand::Rng::with_seed(seed)}
    }

    fn parse(&mut self, line: &str) -> Result<Candidate> {
        let line_no = self.line_no;
        let parse_err = || PenetranceError::ParseCandidate{line: line_no, content: line.to_string()};
        let mut fields = line.split_whitespace();

        let dosage = fields.next()
            .and_then(|field| field.parse::<u8>().ok())
            .ok_or_else(parse_err)
            .loc("While parsing candidate dosage")?;
        let dosage = Dosage::try_from(dosage).with_loc(parse_err)?;

        let draw = match fields.next() {
            Some(field) => field.parse::<f64>().map_err(|_| parse_err()).loc("While parsing candidate draw")?,
            None        => self.rng.f64(),
        };

        if fields.next().is_some() {
            return Err(parse_err()).loc("While parsing candidate")
        }
        Candidate::new(dosage, draw).with_loc(parse_err)
    }
}

impl<R: BufRead> CandidateSource for CandidateReader<R> {
    fn next_candidate(&mut self) -> Result<Option<Candidate>> {
        while let Some(line) = self.lines.next() {
            self.line_no += 1;
            let line = line.loc("While reading candidate stream")?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue
            }
            let candidate = self.parse(line)?;
            trace!("candidate {}: {candidate:?}", self.line_no);
            return Ok(Some(candidate))
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use itertools::Itertools;

    use super::*;
    use crate::Founder;

    fn drain(source: &mut impl CandidateSource) -> Result<Vec<Candidate>> {
        let mut candidates = Vec::new();
        while let Some(candidate) = source.next_candidate()? {
            candidates.push(candidate);
        }
        Ok(candidates)
    }

    #[test]
    fn invalid_draws() {
        assert!(Candidate::new(Dosage::WILD_TYPE, 1.0).is_err());
        assert!(Candidate::new(Dosage::WILD_TYPE, -0.5).is_err());
        assert!(Candidate::new(Dosage::WILD_TYPE, 0.0).is_ok());
    }

    #[test]
    fn mating_within_homozygous_population() -> Result<()> {
        let population = Population::new(None, vec![Founder::new("a", [1, 1])?, Founder::new("b", [1, 1])?]);
        let mut mating = PanmicticMating::new(&population, 1)?;
        for _ in 0..100 {
            let candidate = mating.next_candidate()?.expect("Random mating never ends");
            assert_eq!(candidate.dosage, Dosage::HOMOZYGOUS);
            assert!((0.0..1.0).contains(&candidate.draw));
        }
        Ok(())
    }

    #[test]
    fn mating_heterozygotes_yields_all_dosages() -> Result<()> {
        let population = Population::new(None, vec![Founder::new("a", [0, 1])?]);
        let mut mating = PanmicticMating::new(&population, 3)?;
        let dosages = (0..1000)
            .map(|_| mating.next_candidate().map(|c| c.map(|c| c.dosage)))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .unique()
            .sorted()
            .collect_vec();
        assert_eq!(dosages, vec![Dosage::WILD_TYPE, Dosage::HETEROZYGOUS, Dosage::HOMOZYGOUS]);
        Ok(())
    }

    #[test]
    fn mating_is_seeded() -> Result<()> {
        let mut rng = fastrand::Rng::with_seed(11);
        let population = Population::hardy_weinberg(50, 0.3, None, &mut rng);
        let mut a = PanmicticMating::new(&population, 5)?;
        let mut b = PanmicticMating::new(&population, 5)?;
        for _ in 0..50 {
            assert_eq!(a.next_candidate()?, b.next_candidate()?);
        }
        Ok(())
    }

    #[test]
    fn empty_population_cannot_mate() {
        let population = Population::default();
        assert!(PanmicticMating::new(&population, 0).is_err());
    }

    #[test]
    fn read_candidates() -> Result<()> {
        let stream = "# dosage draw\n0 0.5\n\n2 0.01\n1\n";
        let candidates = drain(&mut CandidateReader::new(Cursor::new(stream), 0))?;
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0], Candidate{dosage: Dosage::WILD_TYPE, draw: 0.5});
        assert_eq!(candidates[1], Candidate{dosage: Dosage::HOMOZYGOUS, draw: 0.01});
        assert_eq!(candidates[2].dosage, Dosage::HETEROZYGOUS);
        assert!((0.0..1.0).contains(&candidates[2].draw));
        Ok(())
    }

    #[test]
    fn malformed_candidates() {
        for stream in ["3 0.5", "x 0.5", "1 1.5", "1 0.5 0.5", "1 half"] {
            let err = drain(&mut CandidateReader::new(Cursor::new(stream), 0)).expect_err("Stream is malformed");
            assert!(err.chain().any(|e| e.to_string().contains("Failed to parse candidate at line 1")), "{err:?}");
        }
    }
}

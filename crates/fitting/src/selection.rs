//! Spectrum selection and deterministic naming of fit outputs
//!
//! Independent fits for different spectra may be run in parallel by the
//! caller, so every name created for a fit is derived from the run and the
//! spectrum or bank it belongs to. Nothing here keeps a counter.

// crate modules
use crate::driver::Stage;
use crate::error::{Error, Result};

// ncstools modules
use ncstools_utils::f;

// external crates
use itertools::Itertools;
use nom::character::complete::{char, digit1, space0};
use nom::combinator::{all_consuming, map_res, opt};
use nom::sequence::{delimited, preceded, tuple};
use nom::IResult;
use serde::{Deserialize, Serialize};

/// Inclusive range of spectrum numbers, always with `first <= last`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpectrumRange {
    first: u32,
    last: u32,
}

impl SpectrumRange {
    /// Create a range, swapping the ends if given backwards
    pub fn new(first: u32, last: u32) -> Self {
        Self {
            first: first.min(last),
            last: first.max(last),
        }
    }

    /// First spectrum number
    pub fn first(&self) -> u32 {
        self.first
    }

    /// Last spectrum number, inclusive
    pub fn last(&self) -> u32 {
        self.last
    }

    /// Every spectrum number in the range
    pub fn spectra(&self) -> impl Iterator<Item = u32> {
        self.first..=self.last
    }

    /// Number of spectra in the range
    pub fn len(&self) -> usize {
        (self.last - self.first) as usize + 1
    }

    /// Always false, a range holds at least one spectrum
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl std::fmt::Display for SpectrumRange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// Spectra or banks to fit
///
/// ```rust
/// # use ncstools_fitting::SpectrumSelection;
/// assert_eq!("forward".parse::<SpectrumSelection>().unwrap(), SpectrumSelection::Forward);
/// assert_eq!("135".parse::<SpectrumSelection>().unwrap(), SpectrumSelection::Range(135, 135));
/// assert_eq!("135-185".parse::<SpectrumSelection>().unwrap(), SpectrumSelection::Range(135, 185));
/// assert!("sideways".parse::<SpectrumSelection>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpectrumSelection {
    /// All forward scattering detectors
    Forward,
    /// All backward scattering detectors
    Backward,
    /// Explicit inclusive range of spectrum numbers
    Range(u32, u32),
}

impl std::str::FromStr for SpectrumSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            other => {
                let (_, (first, last)) =
                    spectrum_range(other).map_err(|_| Error::InvalidSelection(s.to_string()))?;
                Ok(Self::Range(first, last.unwrap_or(first)))
            }
        }
    }
}

impl std::fmt::Display for SpectrumSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Backward => write!(f, "backward"),
            Self::Range(first, last) if first == last => write!(f, "{first}"),
            Self::Range(first, last) => write!(f, "{first}-{last}"),
        }
    }
}

/// Single spectrum number or `first-last` range
fn spectrum_range(i: &str) -> IResult<&str, (u32, Option<u32>)> {
    all_consuming(tuple((
        delimited(space0, map_res(digit1, str::parse::<u32>), space0),
        opt(preceded(
            char('-'),
            delimited(space0, map_res(digit1, str::parse::<u32>), space0),
        )),
    )))(i)
}

/// How spectra are grouped into fits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitMode {
    /// Every spectrum is fitted on its own
    Spectra,
    /// Spectra in a detector bank are summed and fitted together
    Bank,
}

/// Detector groupings of an instrument
pub trait DetectorGroups {
    /// All forward scattering spectra
    fn forward_spectra(&self) -> SpectrumRange;
    /// All backward scattering spectra
    fn backward_spectra(&self) -> SpectrumRange;
    /// Forward scattering banks
    fn forward_banks(&self) -> Vec<SpectrumRange>;
    /// Backward scattering banks
    fn backward_banks(&self) -> Vec<SpectrumRange>;
}

/// Detector layout of the VESUVIO spectrometer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vesuvio;

impl DetectorGroups for Vesuvio {
    fn forward_spectra(&self) -> SpectrumRange {
        SpectrumRange::new(135, 198)
    }

    fn backward_spectra(&self) -> SpectrumRange {
        SpectrumRange::new(3, 134)
    }

    fn forward_banks(&self) -> Vec<SpectrumRange> {
        (0..8)
            .map(|i| SpectrumRange::new(135 + 8 * i, 142 + 8 * i))
            .collect()
    }

    fn backward_banks(&self) -> Vec<SpectrumRange> {
        vec![
            SpectrumRange::new(3, 46),
            SpectrumRange::new(47, 90),
            SpectrumRange::new(91, 134),
        ]
    }
}

impl SpectrumSelection {
    /// Resolve into the ranges that will be loaded
    ///
    /// In [FitMode::Spectra] this is a single range. In [FitMode::Bank] there
    /// is one range per bank, which only makes sense for the keyword
    /// selections.
    pub fn resolve<G: DetectorGroups>(&self, groups: &G, mode: FitMode) -> Result<Vec<SpectrumRange>> {
        match (mode, self) {
            (FitMode::Spectra, Self::Forward) => Ok(vec![groups.forward_spectra()]),
            (FitMode::Spectra, Self::Backward) => Ok(vec![groups.backward_spectra()]),
            (FitMode::Spectra, Self::Range(first, last)) => {
                Ok(vec![SpectrumRange::new(*first, *last)])
            }
            (FitMode::Bank, Self::Forward) => Ok(groups.forward_banks()),
            (FitMode::Bank, Self::Backward) => Ok(groups.backward_banks()),
            (FitMode::Bank, Self::Range(..)) => Err(Error::BankSelection(self.to_string())),
        }
    }

    /// Spectrum list in the form a loader expects, e.g. `3-46;47-90`
    pub fn spectrum_list<G: DetectorGroups>(&self, groups: &G, mode: FitMode) -> Result<String> {
        Ok(self.resolve(groups, mode)?.iter().join(";"))
    }

    /// Identity of every fit needed for this selection, in order
    ///
    /// ```rust
    /// # use ncstools_fitting::{FitMode, SpectrumSelection, Vesuvio};
    /// let selection: SpectrumSelection = "135-136".parse().unwrap();
    /// let fits = selection.identities("15039", &Vesuvio, FitMode::Spectra).unwrap();
    /// assert_eq!(fits[1].output_name(), "15039_data_spectrum_136");
    ///
    /// let selection: SpectrumSelection = "backward".parse().unwrap();
    /// let fits = selection.identities("15039", &Vesuvio, FitMode::Bank).unwrap();
    /// assert_eq!(fits.len(), 3);
    /// assert_eq!(fits[0].output_name(), "15039_data_backward_bank_1");
    /// ```
    pub fn identities<G: DetectorGroups>(
        &self,
        run: &str,
        groups: &G,
        mode: FitMode,
    ) -> Result<Vec<FitIdentity>> {
        let ranges = self.resolve(groups, mode)?;
        Ok(match mode {
            FitMode::Spectra => ranges
                .iter()
                .flat_map(|range| range.spectra())
                .enumerate()
                .map(|(index, spectrum)| FitIdentity::spectrum(run, index, spectrum))
                .collect(),
            FitMode::Bank => (0..ranges.len())
                .map(|index| FitIdentity::bank(run, &self.to_string(), index))
                .collect(),
        })
    }
}

/// Unique identity of a single fit
///
/// Every name a fit creates is derived from this, so fits of different
/// spectra never collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitIdentity {
    run: String,
    index: usize,
    suffix: String,
}

impl FitIdentity {
    /// Identity for a single spectrum
    ///
    /// The `index` is the position of the spectrum in the loaded data.
    pub fn spectrum(run: &str, index: usize, spectrum: u32) -> Self {
        Self {
            run: run.to_string(),
            index,
            suffix: f!("_spectrum_{spectrum}"),
        }
    }

    /// Identity for the n-th bank of a selection, counting from zero
    pub fn bank(run: &str, selection: &str, index: usize) -> Self {
        Self {
            run: run.to_string(),
            index,
            suffix: f!("_{selection}_bank_{}", index + 1),
        }
    }

    /// Run identifier
    pub fn run(&self) -> &str {
        &self.run
    }

    /// Position in the loaded data
    pub fn index(&self) -> usize {
        self.index
    }

    /// Suffix shared by every name, e.g. `_spectrum_135`
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Name of the fitted data output
    pub fn output_name(&self) -> String {
        f!("{}_data{}", self.run, self.suffix)
    }

    /// Name for the transient output of an optimizer call
    pub fn intermediate_name(&self, stage: Stage) -> String {
        f!("__{}{}_{}", self.run, self.suffix, stage.tag())
    }
}

impl std::fmt::Display for FitIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.run, self.suffix)
    }
}

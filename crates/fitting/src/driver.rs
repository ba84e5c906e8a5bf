//! The two-stage fitting protocol
//!
//! 1. The reduced function, with ties and width constraints, is fitted to get
//!    the central values
//! 2. The all-free function is seeded with those values and evaluated for a
//!    single iteration with nothing tied, giving symmetric errors for every
//!    parameter
//!
//! A simulation skips the first stage and evaluates the all-free function at
//! the declared starting values without iterating at all.

// crate modules
use crate::data::{Dataset, FitCurve};
use crate::error::{Error, Result};
use crate::optimizer::{FitRequest, Optimizer, OptimizerOutput};
use crate::options::FitOptions;
use crate::result::FitResult;
use crate::selection::FitIdentity;
use crate::spec::{FitSpec, RenderMode};

// ncstools modules
use ncstools_profiles::ParameterValues;

// external crates
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Iterations allowed for the all-free error estimate
pub const STAGE2_ITERATIONS: u32 = 1;

/// Iterations allowed for a simulation, i.e. evaluation only
pub const SIMULATION_ITERATIONS: u32 = 0;

/// Optimizer call within the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Reduced fit for the central values
    Stage1,
    /// All-free evaluation for the errors
    Stage2,
}

impl Stage {
    /// Short lowercase tag, used in names
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Stage1 => "stage1",
            Self::Stage2 => "stage2",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Stage1 => write!(f, "stage 1 (reduced fit)"),
            Self::Stage2 => write!(f, "stage 2 (all-free error estimate)"),
        }
    }
}

/// Where the driver is in the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Nothing run yet
    Init,
    /// Running the reduced fit
    Stage1Fit,
    /// Running the all-free evaluation
    Stage2Fit,
    /// Finished successfully
    Done,
    /// Stopped at the given stage
    Failed(Stage),
}

/// Runs the two-stage protocol for a spec against an optimizer
///
/// Each call to [run()](FitDriver::run) or [simulate()](FitDriver::simulate)
/// starts again from [DriverState::Init] and is independent of any previous
/// call.
#[derive(Debug)]
pub struct FitDriver<'a, O: Optimizer> {
    spec: &'a FitSpec,
    options: &'a FitOptions,
    optimizer: O,
    state: DriverState,
}

impl<'a, O: Optimizer> FitDriver<'a, O> {
    /// Create a driver for the given model and options
    pub fn new(spec: &'a FitSpec, options: &'a FitOptions, optimizer: O) -> Self {
        Self {
            spec,
            options,
            optimizer,
            state: DriverState::Init,
        }
    }

    /// Current state of the protocol
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Borrow the optimizer
    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    /// Give back the optimizer
    pub fn into_optimizer(self) -> O {
        self.optimizer
    }

    /// Fit the data with both stages
    ///
    /// A failure in the first stage is final, the second stage is never
    /// attempted.
    ///
    /// The data is fitted as given. Smoothing and masking set in the options
    /// are only validated here, so apply them beforehand with
    /// [Dataset::preprocess] or [DataLoader::load_and_preprocess](crate::DataLoader::load_and_preprocess).
    pub fn run(&mut self, data: &Dataset, identity: &FitIdentity) -> Result<FitResult> {
        self.state = DriverState::Init;
        self.options.validate()?;
        self.spec.log_summary(false);

        // Stage 1, reduced parameterisation with ties and constraints
        self.state = DriverState::Stage1Fit;
        info!("Running {} for {identity}", Stage::Stage1);
        let request = self
            .stage1_request(identity)
            .inspect_err(|_| self.state = DriverState::Failed(Stage::Stage1))?;
        let stage1 = self.call(Stage::Stage1, &request, data)?;
        debug!(
            "Stage 1 reduced chi-square = {:.6}",
            stage1.reduced_chi_square
        );

        // Stage 2, everything free and seeded from stage 1
        let seed = stage1.parameters.values();
        self.stage2(data, identity, &seed, STAGE2_ITERATIONS)
    }

    /// Evaluate the model at its declared starting values
    ///
    /// No fitting is done, the result is the all-free function evaluated once.
    /// As with [run()](FitDriver::run), the data must already be preprocessed.
    pub fn simulate(&mut self, data: &Dataset, identity: &FitIdentity) -> Result<FitResult> {
        self.state = DriverState::Init;
        self.options.validate()?;
        self.spec.log_summary(true);

        let seed = self.spec.default_parameters();
        self.stage2(data, identity, &seed, SIMULATION_ITERATIONS)
    }

    /// All-free evaluation seeded from `seed`
    fn stage2(
        &mut self,
        data: &Dataset,
        identity: &FitIdentity,
        seed: &ParameterValues,
        max_iterations: u32,
    ) -> Result<FitResult> {
        self.state = DriverState::Stage2Fit;
        info!("Running {} for {identity}", Stage::Stage2);

        let function = self
            .spec
            .render_function(RenderMode::AllFree(seed))
            .inspect_err(|_| self.state = DriverState::Failed(Stage::Stage2))?;

        let request = FitRequest {
            function,
            ties: String::new(),
            constraints: String::new(),
            max_iterations,
            minimizer: self.options.minimizer.clone(),
            output: identity.intermediate_name(Stage::Stage2),
        };

        let output = self.call(Stage::Stage2, &request, data)?;

        let curve = output
            .calculated
            .map(|calculated| FitCurve::new(data, calculated))
            .transpose()
            .inspect_err(|_| self.state = DriverState::Failed(Stage::Stage2))?;

        self.state = DriverState::Done;
        info!(
            "Finished {identity}, reduced chi-square = {:.6}",
            output.reduced_chi_square
        );

        Ok(FitResult {
            name: identity.output_name(),
            reduced_chi_square: output.reduced_chi_square,
            parameters: output.parameters,
            curve,
        })
    }

    /// Reduced function, ties and constraints for the first stage
    fn stage1_request(&self, identity: &FitIdentity) -> Result<FitRequest> {
        Ok(FitRequest {
            function: self.spec.render_function(RenderMode::Reduced)?,
            ties: self.spec.render_ties(),
            constraints: self.spec.render_constraints(),
            max_iterations: self.options.max_iterations,
            minimizer: self.options.minimizer.clone(),
            output: identity.intermediate_name(Stage::Stage1),
        })
    }

    /// Single optimizer call on rescaled data
    fn call(&mut self, stage: Stage, request: &FitRequest, data: &Dataset) -> Result<OptimizerOutput> {
        let scaled = self.options.scale()?.apply(data);
        self.optimizer.fit(request, &scaled).map_err(|source| {
            self.state = DriverState::Failed(stage);
            Error::Optimizer { stage, source }
        })
    }
}

//! The full model for a single fit and its function strings

// crate modules
use crate::error::{Error, Result};

// ncstools modules
use ncstools_profiles::{
    build_constraints, build_ties, join, parse_background, parse_intensity_constraints,
    parse_profiles, AttributeValue, Background, FseMode, Fragment, IntensityConstraints,
    MassComponent, ParameterValues, Profile,
};
use ncstools_utils::f;

// external crates
use itertools::Itertools;
use log::{debug, info};

/// How the composite function is rendered
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderMode<'a> {
    /// Physically constrained composite with the intensity constraint matrix
    Reduced,
    /// Generic composite with every parameter seeded from the table
    AllFree(&'a ParameterValues),
}

/// Composite function types understood by the optimizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    /// Count rate with intensity constraints between the masses
    ComptonScatteringCountRate,
    /// Plain sum of member functions
    CompositeFunction,
    /// One member function per domain
    MultiDomainFunction,
}

impl std::fmt::Display for CompositeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Self::ComptonScatteringCountRate => "ComptonScatteringCountRate",
            Self::CompositeFunction => "CompositeFunction",
            Self::MultiDomainFunction => "MultiDomainFunction",
        };
        write!(f, "{s}")
    }
}

/// Typed form of a composite function string
///
/// The header and members are only serialised when displayed, e.g.
/// `composite=CompositeFunction,NumDeriv=1;name=...;name=...`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeFunction {
    /// Composite type
    pub kind: CompositeKind,
    /// Header attributes following the composite type
    pub attributes: Vec<(String, AttributeValue)>,
    /// Member functions in order
    pub members: Vec<Fragment>,
}

impl CompositeFunction {
    /// Start a composite with numerical derivatives and no members
    pub fn new(kind: CompositeKind) -> Self {
        Self {
            kind,
            attributes: vec![("NumDeriv".to_string(), AttributeValue::Integer(1))],
            members: Vec::new(),
        }
    }

    /// Append a header attribute
    pub fn push_attribute(&mut self, key: &str, value: AttributeValue) {
        self.attributes.push((key.to_string(), value));
    }
}

impl std::fmt::Display for CompositeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = f!("composite={}", self.kind);
        for (key, value) in &self.attributes {
            s += &f!(",{key}={value}");
        }
        for member in &self.members {
            s += &f!(";{member}");
        }
        write!(f, "{s}")
    }
}

/// Everything defining the model for a single fit
///
/// Built once per fit and never modified. The order of the components defines
/// their parameter prefixes, `f0.`, `f1.`, and so on, with the background
/// taking the next index after the last component.
///
/// ```rust
/// # use ncstools_fitting::{FitSpec, RenderMode};
/// let spec = FitSpec::from_descriptors(
///     &[16.0, 27.0],
///     "function=Gaussian,width=10;function=Gaussian,width=13",
///     "",
///     "",
///     0,
/// )
/// .unwrap();
///
/// assert_eq!(
///     spec.render_function(RenderMode::Reduced).unwrap(),
///     "composite=ComptonScatteringCountRate,NumDeriv=1;\
///      name=GaussianComptonProfile,WorkspaceIndex=0,Mass=16.000000,Width=10.000000;\
///      name=GaussianComptonProfile,WorkspaceIndex=0,Mass=27.000000,Width=13.000000"
/// );
/// assert_eq!(spec.render_constraints(), "");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FitSpec {
    components: Vec<MassComponent>,
    workspace_index: usize,
    background: Option<Background>,
    intensity_constraints: Option<IntensityConstraints>,
}

impl FitSpec {
    /// Create a spec from components with no background or constraints
    pub fn new(components: Vec<MassComponent>, workspace_index: usize) -> Result<Self> {
        if components.is_empty() {
            return Err(Error::NoComponents);
        }

        Ok(Self {
            components,
            workspace_index,
            background: None,
            intensity_constraints: None,
        })
    }

    /// Build a spec straight from the declarative descriptor strings
    ///
    /// Empty `background` or `intensity_constraints` strings mean none.
    pub fn from_descriptors(
        masses: &[f64],
        profiles: &str,
        background: &str,
        intensity_constraints: &str,
        workspace_index: usize,
    ) -> Result<Self> {
        let mut spec = Self::new(parse_profiles(masses, profiles)?, workspace_index)?;

        if let Some(background) = parse_background(background)? {
            spec = spec.with_background(background);
        }

        if let Some(constraints) = parse_intensity_constraints(intensity_constraints)? {
            spec = spec.with_intensity_constraints(constraints)?;
        }

        Ok(spec)
    }

    /// Add a background after the mass components
    pub fn with_background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }

    /// Add intensity constraints, one column per component
    pub fn with_intensity_constraints(mut self, constraints: IntensityConstraints) -> Result<Self> {
        if constraints.ncols() != self.components.len() {
            return Err(Error::ConstraintColumns {
                columns: constraints.ncols(),
                components: self.components.len(),
            });
        }
        self.intensity_constraints = Some(constraints);
        Ok(self)
    }

    /// Mass components in declaration order
    pub fn components(&self) -> &[MassComponent] {
        &self.components
    }

    /// Spectrum index written into every profile
    pub fn workspace_index(&self) -> usize {
        self.workspace_index
    }

    /// Background, if any
    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    /// Intensity constraints, if any
    pub fn intensity_constraints(&self) -> Option<&IntensityConstraints> {
        self.intensity_constraints.as_ref()
    }

    /// Parameter prefix of the background function
    pub fn background_prefix(&self) -> String {
        f!("f{}.", self.components.len())
    }

    /// Build the typed composite function
    pub fn composite(&self, mode: RenderMode) -> Result<CompositeFunction> {
        let values = match mode {
            RenderMode::Reduced => None,
            RenderMode::AllFree(values) => Some(values),
        };

        let mut composite = match mode {
            RenderMode::Reduced => {
                let mut composite = CompositeFunction::new(CompositeKind::ComptonScatteringCountRate);
                if let Some(constraints) = &self.intensity_constraints {
                    composite.push_attribute(
                        "IntensityConstraints",
                        AttributeValue::Text(constraints.render()),
                    );
                }
                composite
            }
            RenderMode::AllFree(_) => CompositeFunction::new(CompositeKind::CompositeFunction),
        };

        for (index, component) in self.components.iter().enumerate() {
            let prefix = f!("f{index}.");
            composite
                .members
                .push(component.fragment(&prefix, self.workspace_index, values)?);
        }

        if let Some(background) = &self.background {
            composite
                .members
                .push(background.fragment(&self.background_prefix(), values)?);
        }

        Ok(composite)
    }

    /// Render the composite function string
    ///
    /// In [RenderMode::AllFree] every parameter must be in the table.
    pub fn render_function(&self, mode: RenderMode) -> Result<String> {
        let function = self.composite(mode)?.to_string();
        debug!("Function: {function}");
        Ok(function)
    }

    /// Comma separated width constraints, empty if there are none
    pub fn render_constraints(&self) -> String {
        let constraints = join(&build_constraints(&self.components));
        debug!("Constraints: {constraints}");
        constraints
    }

    /// Comma separated ties, empty if there are none
    pub fn render_ties(&self) -> String {
        let ties = join(&build_ties(&self.components));
        debug!("Ties: {ties}");
        ties
    }

    /// Render a multi-domain function fitting `n` spectra simultaneously
    ///
    /// Every domain gets a copy of the local function with its own constraints
    /// and ties, and the width of the first mass is tied across all domains.
    ///
    /// ```rust
    /// # use ncstools_fitting::FitSpec;
    /// let spec = FitSpec::from_descriptors(&[16.0], "function=Gaussian,width=[8, 10, 12]", "", "", 0).unwrap();
    ///
    /// assert_eq!(
    ///     spec.render_global_function(2, None).unwrap(),
    ///     "composite=MultiDomainFunction;\
    ///      (composite=ComptonScatteringCountRate,NumDeriv=1,$domains=i;\
    ///      name=GaussianComptonProfile,WorkspaceIndex=0,Mass=16.000000,Width=10.000000;\
    ///      constraints=(8.000000 < f0.Width < 12.000000));\
    ///      (composite=ComptonScatteringCountRate,NumDeriv=1,$domains=i;\
    ///      name=GaussianComptonProfile,WorkspaceIndex=0,Mass=16.000000,Width=10.000000;\
    ///      constraints=(8.000000 < f0.Width < 12.000000));\
    ///      ties=(f1.f0.Width=f0.f0.Width)"
    /// );
    /// ```
    pub fn render_global_function(
        &self,
        n: usize,
        values: Option<&ParameterValues>,
    ) -> Result<String> {
        if n == 0 {
            return Err(Error::NoDomains);
        }

        let mode = match values {
            Some(values) => RenderMode::AllFree(values),
            None => RenderMode::Reduced,
        };

        let mut local = self.composite(mode)?;
        local.push_attribute("$domains", AttributeValue::Text("i".to_string()));
        let mut local = local.to_string();

        let constraints = self.render_constraints();
        if !constraints.is_empty() {
            local += &f!(";constraints=({constraints})");
        }

        let ties = self.render_ties();
        if !ties.is_empty() {
            local += &f!(";ties=({ties})");
        }

        let mut global = f!("composite={}", CompositeKind::MultiDomainFunction);
        for _ in 0..n {
            global += &f!(";({local})");
        }

        if n > 1 {
            let chain = (0..n).rev().map(|i| f!("f{i}.f0.Width")).join("=");
            global += &f!(";ties=({chain})");
        }

        debug!("Global function: {global}");
        Ok(global)
    }

    /// Declared starting values of every parameter
    ///
    /// Used to seed a simulation in place of a first stage fit.
    pub fn default_parameters(&self) -> ParameterValues {
        let mut values = ParameterValues::new();
        for (index, component) in self.components.iter().enumerate() {
            for (name, value) in component.default_parameters(&f!("f{index}.")).iter() {
                values.insert(name, value);
            }
        }

        if let Some(background) = &self.background {
            for (name, value) in background.default_parameters(&self.background_prefix()).iter() {
                values.insert(name, value);
            }
        }

        values
    }

    /// Human readable summary of the model, one line per entry
    pub fn summary(&self, simulation: bool) -> Vec<String> {
        let mut lines = Vec::new();

        for (index, component) in self.components.iter().enumerate() {
            let details = match component.profile() {
                Profile::Gaussian { .. } => "Gaussian".to_string(),
                Profile::GramCharlier(gc) => {
                    let terms = gc
                        .hermite
                        .iter()
                        .enumerate()
                        .filter(|(_, active)| **active)
                        .map(|(k, _)| f!("H_{}", 2 * k))
                        .join(" ");
                    let mut details = f!("GramCharlier, Hermite Terms='{terms}'");
                    match (simulation, gc.fse) {
                        (true, _) => {
                            if let Some(seed) = gc.fse_seed {
                                details += &f!(", Kfse={seed:.6}");
                            }
                        }
                        (false, FseMode::Free) => details += ", k free",
                        (false, FseMode::Fixed(flag)) => {
                            details += &f!(", Sears Flag={}", flag as u8)
                        }
                    }
                    details
                }
            };
            lines.push(f!("Mass {}: {details}", index + 1));
        }

        if let Some(background) = &self.background {
            lines.push(f!(
                "Including background using {} of order={}",
                background.function().to_lowercase(),
                background.order()
            ));
        }

        lines
    }

    /// Write the model summary to the log
    pub fn log_summary(&self, simulation: bool) {
        match simulation {
            true => info!("-- Simulation Options Summary --"),
            false => info!("-- Fitting Options Summary --"),
        }
        for line in self.summary(simulation) {
            info!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydrogen_and_oxygen() -> FitSpec {
        FitSpec::from_descriptors(
            &[1.0079, 16.0],
            "function=GramCharlier,width=[2, 5, 7],hermite_coeffs=[1,0,1],k_free=0,sears_flag=1;\
             function=Gaussian,width=10",
            "function=Polynomial,order=1",
            "[1, -2]",
            3,
        )
        .unwrap()
    }

    #[test]
    fn reduced_header_embeds_matrix() {
        let function = hydrogen_and_oxygen()
            .render_function(RenderMode::Reduced)
            .unwrap();
        assert!(function.starts_with(
            "composite=ComptonScatteringCountRate,NumDeriv=1,\
             IntensityConstraints=\"Matrix(1|2)1.000000|-2.000000\";"
        ));
        assert!(function.ends_with(";name=Polynomial,n=1"));
    }

    #[test]
    fn all_free_uses_every_value() {
        let spec = hydrogen_and_oxygen();
        let values = spec.default_parameters();
        let function = spec.render_function(RenderMode::AllFree(&values)).unwrap();
        assert_eq!(
            function,
            "composite=CompositeFunction,NumDeriv=1;\
             name=GramCharlierComptonProfile,WorkspaceIndex=3,Mass=1.007900,HermiteCoeffs=1 0 1,\
             Width=5.000000,FSECoeff=0.000000,C_0=1.000000,C_4=1.000000;\
             name=GaussianComptonProfile,WorkspaceIndex=3,Mass=16.000000,Width=10.000000,Intensity=1.000000;\
             name=Polynomial,n=1,A0=0.000000,A1=0.000000"
        );
    }

    #[test]
    fn constraint_columns_must_match() {
        let result = FitSpec::from_descriptors(
            &[16.0],
            "function=Gaussian,width=10",
            "",
            "[1, 2]",
            0,
        );
        assert!(matches!(
            result,
            Err(Error::ConstraintColumns {
                columns: 2,
                components: 1
            })
        ));
    }

    #[test]
    fn global_ties_chain_every_domain() {
        let function = hydrogen_and_oxygen().render_global_function(3, None).unwrap();
        assert!(function.ends_with(";ties=(f2.f0.Width=f1.f0.Width=f0.f0.Width)"));
        assert_eq!(function.matches("$domains=i").count(), 3);
        assert!(hydrogen_and_oxygen().render_global_function(0, None).is_err());
    }

    #[test]
    fn single_domain_has_no_global_ties() {
        let function = hydrogen_and_oxygen().render_global_function(1, None).unwrap();
        assert!(!function.contains("f0.f0.Width"));
    }

    #[test]
    fn summary_lines() {
        let spec = hydrogen_and_oxygen();
        assert_eq!(
            spec.summary(false),
            vec![
                "Mass 1: GramCharlier, Hermite Terms='H_0 H_4', Sears Flag=1",
                "Mass 2: Gaussian",
                "Including background using polynomial of order=1",
            ]
        );
    }
}

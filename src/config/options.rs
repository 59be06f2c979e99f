//! Command-line or API options for the domain-decomposition preconditioners.
//!
//! Options are plain values, built once (from `Default`, the `with_*` builders, or
//! `(key, value)` string pairs as they come off a command line) and passed by reference into
//! every constructor.

use crate::error::KError;
use bitflags::bitflags;

bitflags! {
    /// How the coarse space enters the two-level preconditioner.
    ///
    /// - empty: one-level preconditioner,
    /// - `PROJECTION`: projected (balancing) preconditioner,
    /// - `PROJECTION | ADDITIVE`: hybrid preconditioner,
    /// - `ADDITIVE`: fully additive preconditioner.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CoarseCorrection: u8 {
        const PROJECTION = 0b01;
        const ADDITIVE   = 0b10;
    }
}

/// GenEO coarse-space options.
#[derive(Debug, Clone, PartialEq)]
pub struct GenEoOptions {
    /// Number of eigenpairs requested from each local eigenproblem.
    pub nev: usize,
    /// Enrich with the modes bounding the largest eigenvalue.
    pub eigmax: bool,
    /// Threshold for the eigmax problem; `λmax ≤ max_multiplicity / tau_eigmax`.
    pub tau_eigmax: f64,
    /// Enrich with the modes bounding the smallest eigenvalue (Additive Schwarz only).
    pub eigmin: bool,
    /// Threshold for the eigmin problem; `λmin ≥ tau_eigmin`.
    pub tau_eigmin: f64,
}

impl Default for GenEoOptions {
    fn default() -> Self {
        Self { nev: 10, eigmax: true, tau_eigmax: 0.1, eigmin: true, tau_eigmin: 0.1 }
    }
}

/// Options shared by both domain-decomposition variants.
#[derive(Debug, Clone, PartialEq)]
pub struct DdOptions {
    /// Additive Schwarz local solver (assembled `A_s`) instead of Neumann-Neumann (scaled `M_s`).
    pub switch_to_asm: bool,
    /// Diagonal-ratio (k) scaling instead of multiplicity scaling.
    pub kscaling: bool,
    pub verbose: bool,
    pub geneo: bool,
    pub coarse_projection: bool,
    pub add_coarse_solve: bool,
    pub geneo_opts: GenEoOptions,
}

impl Default for DdOptions {
    fn default() -> Self {
        Self {
            switch_to_asm: false,
            kscaling: true,
            verbose: false,
            geneo: true,
            coarse_projection: true,
            add_coarse_solve: false,
            geneo_opts: GenEoOptions::default(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, KError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(KError::SolveError(format!("option {key}: cannot parse {value:?} as a boolean"))),
    }
}

fn parse_num<N: std::str::FromStr>(key: &str, value: &str) -> Result<N, KError> {
    value
        .trim()
        .parse()
        .map_err(|_| KError::SolveError(format!("option {key}: cannot parse {value:?}")))
}

impl DdOptions {
    pub fn asm(mut self, flag: bool) -> Self {
        self.switch_to_asm = flag;
        self
    }
    pub fn with_kscaling(mut self, flag: bool) -> Self {
        self.kscaling = flag;
        self
    }
    pub fn with_verbose(mut self, flag: bool) -> Self {
        self.verbose = flag;
        self
    }
    pub fn with_geneo(mut self, flag: bool) -> Self {
        self.geneo = flag;
        self
    }
    pub fn with_coarse_projection(mut self, flag: bool) -> Self {
        self.coarse_projection = flag;
        self
    }
    pub fn with_add_coarse_solve(mut self, flag: bool) -> Self {
        self.add_coarse_solve = flag;
        self
    }
    pub fn with_nev(mut self, nev: usize) -> Self {
        self.geneo_opts.nev = nev;
        self
    }
    pub fn with_geneo_opts(mut self, opts: GenEoOptions) -> Self {
        self.geneo_opts = opts;
        self
    }

    /// Coarse correction selected by the projection / additive flags.
    pub fn coarse_correction(&self) -> CoarseCorrection {
        let mut c = CoarseCorrection::empty();
        c.set(CoarseCorrection::PROJECTION, self.coarse_projection);
        c.set(CoarseCorrection::ADDITIVE, self.add_coarse_solve);
        c
    }

    // Applies one recognized key; `Ok(false)` if the key is not a `DdOptions` key.
    fn set(&mut self, key: &str, value: &str) -> Result<bool, KError> {
        match key {
            "switch_to_asm" => self.switch_to_asm = parse_bool(key, value)?,
            "kscaling" => self.kscaling = parse_bool(key, value)?,
            "verbose" => self.verbose = parse_bool(key, value)?,
            "geneo" => self.geneo = parse_bool(key, value)?,
            "coarse_projection" => self.coarse_projection = parse_bool(key, value)?,
            "add_coarse_solve" => self.add_coarse_solve = parse_bool(key, value)?,
            "geneo_nev" => self.geneo_opts.nev = parse_num(key, value)?,
            "geneo_eigmax" => self.geneo_opts.eigmax = parse_bool(key, value)?,
            "geneo_tau_eigmax" => self.geneo_opts.tau_eigmax = parse_num(key, value)?,
            "geneo_eigmin" => self.geneo_opts.eigmin = parse_bool(key, value)?,
            "geneo_tau_eigmin" => self.geneo_opts.tau_eigmin = parse_num(key, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Builds options from `(key, value)` pairs on top of the defaults.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, KError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut opts = Self::default();
        for (key, value) in pairs {
            if !opts.set(key, value)? {
                return Err(KError::Unsupported("unknown domain-decomposition option"));
            }
        }
        Ok(opts)
    }
}

/// Options of the algebraic sign-splitting variant.
#[derive(Debug, Clone, PartialEq)]
pub struct SplittingOptions {
    pub dd: DdOptions,
    /// Number of eigenpairs requested from the indefinite local block `B_s`.
    pub bs_nev: usize,
}

impl Default for SplittingOptions {
    fn default() -> Self {
        Self { dd: DdOptions::default(), bs_nev: 20 }
    }
}

impl SplittingOptions {
    pub fn new(dd: DdOptions) -> Self {
        Self { dd, ..Self::default() }
    }

    pub fn with_bs_nev(mut self, nev: usize) -> Self {
        self.bs_nev = nev;
        self
    }

    /// Same keys as [`DdOptions::from_pairs`], plus `bs_nev`.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, KError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut opts = Self::default();
        for (key, value) in pairs {
            if key == "bs_nev" {
                opts.bs_nev = parse_num(key, value)?;
            } else if !opts.dd.set(key, value)? {
                return Err(KError::Unsupported("unknown sign-splitting option"));
            }
        }
        Ok(opts)
    }
}

//! Running the whole pipeline against an external compiler.
//!
//! The driver lowers every unit, then repeatedly prints the units, hands them to the compiler and
//! feeds the reported diagnostics back to each unit's [`Resolver`], until a round resolves
//! nothing. Each round that makes progress rewrites at least one access, so the loop runs at most
//! one round more than there are ambiguous accesses; an iteration cap bounds it regardless.

use std::collections::BTreeSet;
use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing::{debug, warn};

use crate::loc::Pos;
use crate::lower::{LowerError, LowerOptions, lower};
use crate::print::{Printed, print};
use crate::resolve::Resolver;
use crate::{NodeId, Tree, observer};

/// A named piece of source text handed to the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub text: String,
}

/// A positioned message reported by the compiler.
#[derive(Display, Debug, Clone, PartialEq, Eq)]
#[display("{unit}:{line}:{column}: {message}")]
pub struct Diagnostic {
    /// The name of the [`Source`] the diagnostic refers to.
    pub unit: String,

    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.column)
    }
}

/// The external compiler.
pub trait Compiler {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Compiles the sources together and returns every diagnostic reported.
    fn compile(&mut self, sources: &[Source]) -> Result<Vec<Diagnostic>, Self::Error>;
}

#[derive(Error, Debug)]
pub enum DriverError<E: std::error::Error + 'static> {
    #[error("the compiler failed")]
    Compile(#[source] E),

    #[error(transparent)]
    Internal(#[from] crate::Error),
}

#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOptions {
    pub lower: LowerOptions,

    /// The maximal number of resolution rounds before giving up.
    pub max_rounds: usize,

    /// Whether to add the observer interface unit to the sources.
    pub emit_observer: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            lower: LowerOptions::default(),
            max_rounds: 16,
            emit_observer: true,
        }
    }
}

/// A compilation unit going through the pipeline.
#[derive(Debug, Clone)]
pub struct Unit {
    pub name: String,
    pub tree: Tree,
    accesses: Vec<NodeId>,
    resolver: Resolver,
}

impl Unit {
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }
}

/// What the pipeline produced.
#[derive(Debug)]
pub struct Outcome {
    /// The final text of every unit that was lowered, followed by the observer interface unit if
    /// it was emitted.
    pub sources: Vec<Source>,

    /// Diagnostics of the last compile round that no rewrite accounts for.
    pub unresolved: Vec<Diagnostic>,

    /// Units that could not be lowered and were left out.
    pub failed: Vec<(String, LowerError)>,

    /// How many times the compiler was invoked.
    pub rounds: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: DriverOptions,
    units: Vec<Unit>,
    failed: Vec<(String, LowerError)>,
    properties: BTreeSet<String>,
}

impl Pipeline {
    pub fn new(options: DriverOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Lowers `tree` and adds it to the pipeline.
    ///
    /// A unit that fails to lower is recorded in [`Outcome::failed`] and takes no further part.
    pub fn add_unit(&mut self, name: impl Into<String>, mut tree: Tree) {
        let name = name.into();

        match lower(&mut tree, &self.options.lower) {
            Ok(lowered) => {
                debug!(unit = %name, properties = lowered.properties.len(), "lowered unit");
                self.properties.extend(lowered.properties);

                self.units.push(Unit {
                    name,
                    tree,
                    accesses: lowered.accesses,
                    resolver: Resolver::default(),
                });
            }

            Err(e) => {
                warn!(unit = %name, error = %e, "failed to lower unit");
                self.failed.push((name, e));
            }
        }
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.name == name)
    }

    /// Names of all properties lowered so far, across units.
    pub fn properties(&self) -> &BTreeSet<String> {
        &self.properties
    }

    fn print_all(&self) -> (Vec<Source>, Vec<Printed>) {
        let printed: Vec<_> = self.units.iter().map(|unit| print(&unit.tree)).collect();
        let mut sources: Vec<_> = self
            .units
            .iter()
            .zip(&printed)
            .map(|(unit, printed)| Source {
                name: unit.name.clone(),
                text: printed.text.clone(),
            })
            .collect();

        if self.options.emit_observer && !self.properties.is_empty() {
            sources.push(Source {
                name: observer::unit_name(&self.options.lower),
                text: observer::unit_source(&self.options.lower),
            });
        }

        (sources, printed)
    }

    /// Runs the compile and resolve loop to completion.
    pub fn run<C: Compiler>(&mut self, compiler: &mut C) -> Result<Outcome, DriverError<C::Error>> {
        // property names are only known once every unit is lowered
        for unit in self.units.iter_mut().filter(|unit| !unit.accesses.is_empty()) {
            let accesses = std::mem::take(&mut unit.accesses);
            unit.resolver = Resolver::new(&unit.tree, accesses, &self.properties);
        }

        let mut rounds = 0;

        loop {
            let (sources, printed) = self.print_all();
            let diagnostics = compiler.compile(&sources).map_err(DriverError::Compile)?;
            rounds += 1;

            debug!(round = rounds, diagnostics = diagnostics.len(), "compiled");

            if diagnostics.is_empty() || rounds > self.options.max_rounds {
                if !diagnostics.is_empty() {
                    warn!(rounds, "giving up on resolving diagnostics");
                }

                return Ok(self.finish(sources, diagnostics, rounds));
            }

            let mut progress = false;
            let mut unresolved = vec![];

            for diagnostic in diagnostics {
                let idx = self.units.iter().position(|unit| unit.name == diagnostic.unit);
                let resolved = match idx {
                    Some(idx) => {
                        let unit = &mut self.units[idx];
                        unit.resolver
                            .resolve(&mut unit.tree, Some(&printed[idx].layout), diagnostic.pos())
                            .map_err(crate::Error::from)?
                    }

                    None => false,
                };

                if resolved {
                    progress = true;
                } else {
                    unresolved.push(diagnostic);
                }
            }

            debug!(round = rounds, progress, unresolved = unresolved.len(), "resolved diagnostics");

            if !progress {
                return Ok(self.finish(sources, unresolved, rounds));
            }
        }
    }

    fn finish(&self, sources: Vec<Source>, unresolved: Vec<Diagnostic>, rounds: usize) -> Outcome {
        Outcome {
            sources,
            unresolved,
            failed: self.failed.clone(),
            rounds,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "// {}", self.name)?;
        f.write_str(&self.text)
    }
}

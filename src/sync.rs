//! Copying online parameters into the target network.
//!
//! Parameters are paired once, at construction, by their [`ParamRole`]. A
//! sync then walks the pair list; it never looks parameters up by name.

use log::debug;

use crate::error::{DqnError, Result};
use crate::params::{ParamRole, ParamSpec, Parameterized};

/// One online parameter and its target counterpart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamPair {
    pub online: ParamRole,
    pub target: ParamRole,
    pub shape: Vec<usize>,
}

/// Ordered pairing of online and target parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamPairs {
    pairs: Vec<ParamPair>,
}

impl ParamPairs {
    /// Pair every online parameter with the target parameter of the same
    /// role. Fails if either side has a parameter without a counterpart or
    /// if paired shapes differ.
    pub fn new(online: &[ParamSpec], target: &[ParamSpec]) -> Result<Self> {
        let mut pairs = Vec::with_capacity(online.len());
        for spec in online {
            let counterpart = target
                .iter()
                .find(|t| t.role == spec.role)
                .ok_or_else(|| {
                    DqnError::parameter_mismatch(spec.role, "no target parameter with this role")
                })?;
            if counterpart.shape != spec.shape {
                return Err(DqnError::parameter_mismatch(
                    spec.role,
                    format!("online shape {:?} but target shape {:?}", spec.shape, counterpart.shape),
                ));
            }
            pairs.push(ParamPair {
                online: spec.role,
                target: counterpart.role,
                shape: spec.shape.clone(),
            });
        }

        if let Some(extra) = target.iter().find(|t| !online.iter().any(|o| o.role == t.role)) {
            return Err(DqnError::parameter_mismatch(
                extra.role,
                "no online parameter with this role",
            ));
        }

        Ok(ParamPairs { pairs })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamPair> {
        self.pairs.iter()
    }
}

/// The "synchronize now" operation.
#[derive(Clone, Debug)]
pub struct TargetSync {
    pairs: ParamPairs,
}

impl TargetSync {
    pub fn new<P: Parameterized>(online: &P, target: &P) -> Result<Self> {
        let pairs = ParamPairs::new(&online.parameter_specs(), &target.parameter_specs())?;
        Ok(TargetSync { pairs })
    }

    pub fn pairs(&self) -> &ParamPairs {
        &self.pairs
    }

    /// Overwrite every target parameter with its online counterpart.
    ///
    /// All pairs are checked before the first write, so an error leaves the
    /// target untouched.
    pub fn sync<P: Parameterized>(&self, online: &P, target: &mut P) -> Result<()> {
        for pair in self.pairs.iter() {
            let src = online.parameter(pair.online).ok_or_else(|| {
                DqnError::parameter_mismatch(pair.online, "online network no longer has this parameter")
            })?;
            let dst = target.parameter(pair.target).ok_or_else(|| {
                DqnError::parameter_mismatch(pair.target, "target network no longer has this parameter")
            })?;
            if src.shape() != pair.shape.as_slice() || dst.shape() != pair.shape.as_slice() {
                return Err(DqnError::parameter_mismatch(
                    pair.online,
                    format!(
                        "expected shape {:?}, online has {:?} and target has {:?}",
                        pair.shape,
                        src.shape(),
                        dst.shape()
                    ),
                ));
            }
        }

        for pair in self.pairs.iter() {
            if let (Some(src), Some(mut dst)) = (online.parameter(pair.online), target.parameter_mut(pair.target)) {
                dst.assign(&src);
            }
        }

        debug!("Synchronized {} target parameters", self.pairs.len());
        Ok(())
    }
}

//! Control scheme — the immutable binding set of one run.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::binding::Binding;
use crate::error::{HubDriveError, ValidationError};
use crate::id::{BindingId, HubId};
use crate::limits::MotorLimits;

/// Named set of bindings driven together.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlScheme {
    pub name: String,
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

impl ControlScheme {
    /// Create a scheme after validating every binding.
    ///
    /// # Errors
    ///
    /// Returns [`HubDriveError::Validation`] when the name is empty, a
    /// binding id is used twice, or a binding is out of bounds.
    pub fn new(name: impl Into<String>, bindings: Vec<Binding>) -> Result<Self, HubDriveError> {
        let scheme = Self {
            name: name.into(),
            bindings,
        };
        scheme.validate()?;
        Ok(scheme)
    }

    /// Check scheme-level invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HubDriveError::Validation`] on the first violation.
    pub fn validate(&self) -> Result<(), HubDriveError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let mut seen = HashSet::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            if !seen.insert(binding.id) {
                return Err(ValidationError::DuplicateBindingId(binding.id).into());
            }
            binding.validate(&MotorLimits::PROTOCOL)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn binding(&self, id: BindingId) -> Option<&Binding> {
        self.bindings.iter().find(|binding| binding.id == id)
    }

    /// Distinct hubs targeted by the scheme, sorted.
    #[must_use]
    pub fn hub_ids(&self) -> Vec<HubId> {
        let mut hubs: Vec<HubId> = self
            .bindings
            .iter()
            .map(|binding| binding.output.hub_id.clone())
            .collect();
        hubs.sort();
        hubs.dedup();
        hubs
    }
}

//! # Core Error Types
//!
//! Three families, with three different fates:
//!
//! - [`WorldError`]: wiring failures while constructing an entity. Fatal to
//!   that one entity; the caller decides whether startup continues.
//! - [`ComponentError`]: a single component failed during a tick. Collected
//!   into [`TickErrors`]; never stops the pass over other entities.
//! - [`StoreError`]: a sparse-set lookup hit an absent or deleted key.

use crate::ecs::ComponentKind;
use std::fmt;
use thiserror::Error;
use vectrek_shared::EntityId;

/// Errors from a sparse-set store.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The key is absent or was deleted.
    #[error("missing key {key}")]
    Missing {
        /// The key that was looked up.
        key: EntityId,
    },
}

/// Errors raised while building or addressing entities.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldError {
    /// A component's required sibling is not on the entity.
    #[error("entity {entity}: {component} requires {requires}: missing prerequisite")]
    MissingPrerequisite {
        /// The entity under construction.
        entity: EntityId,
        /// The component whose init failed.
        component: ComponentKind,
        /// The sibling it needed.
        requires: ComponentKind,
    },

    /// The id is already in use by a live entity.
    #[error("entity {0} already exists")]
    DuplicateEntity(EntityId),

    /// The same component type was passed twice for one entity.
    #[error("entity {entity}: {component} given more than once")]
    DuplicateComponent {
        /// The entity under construction.
        entity: EntityId,
        /// The repeated component type.
        component: ComponentKind,
    },

    /// Every entity id has been handed out.
    #[error("entity ids exhausted")]
    IdsExhausted,

    /// No live entity has this id.
    #[error("entity {0} not found")]
    UnknownEntity(EntityId),

    /// The entity exists but lacks the component the operation needs.
    #[error("entity {entity} has no {component}")]
    MissingComponent {
        /// The entity addressed.
        entity: EntityId,
        /// The component that was needed.
        component: ComponentKind,
    },
}

/// A single component's failure during a tick.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentError {
    /// A sibling the component reads every tick has gone missing.
    #[error("entity {entity}: {component} has no {sibling}")]
    MissingSibling {
        /// The entity being updated.
        entity: EntityId,
        /// The component being updated.
        component: ComponentKind,
        /// The sibling that could not be resolved.
        sibling: ComponentKind,
    },
}

/// Every component error raised during one `World::update` call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TickErrors(Vec<ComponentError>);

impl TickErrors {
    /// Wraps a list of errors.
    #[must_use]
    pub fn new(errors: Vec<ComponentError>) -> Self {
        Self(errors)
    }

    /// The collected errors, in system order.
    #[must_use]
    pub fn errors(&self) -> &[ComponentError] {
        &self.0
    }

    /// Number of errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwraps into the underlying list.
    #[must_use]
    pub fn into_inner(self) -> Vec<ComponentError> {
        self.0
    }
}

impl fmt::Display for TickErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for TickErrors {}

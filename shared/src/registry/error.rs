use thiserror::Error;

use crate::types::{FieldName, HostEntity};

/// Errors that can occur during registration operations. The registry refuses
/// the operation without mutating state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("entity {0:?} is already registered as a controller")]
    ControllerReregistered(HostEntity),

    #[error("entity {0:?} is already registered as a plain entity; it can't become a controller")]
    NotRegisteredAsController(HostEntity),

    #[error("a controller can't be controlled by another controller")]
    ControllerControlled,

    #[error("an entity can only be controlled by a registered controller")]
    ControlledByNonController,

    #[error("entity {0:?} is not registered")]
    UnknownEntity(HostEntity),

    #[error("field `{1}` is not registered on entity {0:?}")]
    UnknownField(HostEntity, FieldName),
}

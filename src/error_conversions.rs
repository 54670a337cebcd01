//! Error conversion glue between layers.
//!
//! The domain layer must not depend on service/repository error types, so the
//! conversions live here. Service conversions are only compiled together with
//! the `server` feature.

use crate::domain::types::TypeConstraintError;
use crate::repository::RepositoryError;

impl From<TypeConstraintError> for RepositoryError {
    fn from(val: TypeConstraintError) -> Self {
        RepositoryError::ValidationError(val.to_string())
    }
}

#[cfg(feature = "server")]
mod service {
    use crate::domain::types::TypeConstraintError;
    use crate::forms::terminations::{
        AddTerminationFormError, DeleteTerminationsFormError, ListTerminationsFormError,
        UpdateTerminationFormError,
    };
    use crate::services::ServiceError;
    use crate::services::export::DownloadError;

    impl From<TypeConstraintError> for ServiceError {
        fn from(val: TypeConstraintError) -> Self {
            match val {
                TypeConstraintError::EmptyString(field) => ServiceError::MissingField(field),
                other => ServiceError::Validation(other.to_string()),
            }
        }
    }

    impl From<AddTerminationFormError> for ServiceError {
        fn from(val: AddTerminationFormError) -> Self {
            match val {
                AddTerminationFormError::MissingField(field) => ServiceError::MissingField(field),
                other => ServiceError::Validation(other.to_string()),
            }
        }
    }

    impl From<UpdateTerminationFormError> for ServiceError {
        fn from(val: UpdateTerminationFormError) -> Self {
            match val {
                UpdateTerminationFormError::MissingField(field) => {
                    ServiceError::MissingField(field)
                }
                UpdateTerminationFormError::UnknownTermination => ServiceError::NotFound,
                other => ServiceError::Validation(other.to_string()),
            }
        }
    }

    impl From<DeleteTerminationsFormError> for ServiceError {
        fn from(val: DeleteTerminationsFormError) -> Self {
            ServiceError::Validation(val.to_string())
        }
    }

    impl From<ListTerminationsFormError> for ServiceError {
        fn from(val: ListTerminationsFormError) -> Self {
            ServiceError::Validation(val.to_string())
        }
    }

    impl From<DownloadError> for ServiceError {
        fn from(val: DownloadError) -> Self {
            match val {
                DownloadError::InvalidFormat(_) => ServiceError::Validation(val.to_string()),
                other => {
                    log::error!("Failed to render export: {other}");
                    ServiceError::Internal
                }
            }
        }
    }
}

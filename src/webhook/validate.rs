//! # Admission Handling
//!
//! Decodes an AdmissionReview, dispatches to the driver's validate
//! operations and allows or denies with the accumulated field errors.

use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use kube::core::DynamicObject;
use tracing::{error, warn};

use crate::crd::ManagedResource;
use crate::manager::{FieldErrorList, Manager};

/// Validate one admission request against the kind's driver
pub async fn handle_admission<K: ManagedResource>(
    manager: &dyn Manager<K>,
    review: AdmissionReview<K>,
) -> AdmissionReview<DynamicObject> {
    let request: AdmissionRequest<K> = match review.try_into() {
        Ok(request) => request,
        Err(err) => {
            warn!("invalid admission review: {err}");
            return AdmissionResponse::invalid(err.to_string()).into_review();
        }
    };

    let response = AdmissionResponse::from(&request);

    let result = match request.operation {
        Operation::Create => match &request.object {
            Some(obj) => manager.validate_create(obj).await,
            None => Ok(Vec::new()),
        },
        Operation::Update => match (&request.old_object, &request.object) {
            (Some(old), Some(new)) => manager.validate_update(old, new).await,
            _ => Ok(Vec::new()),
        },
        _ => Ok(Vec::new()),
    };

    let response = match result {
        Ok(errors) if errors.is_empty() => response,
        Ok(errors) => response.deny(deny_message(&request.kind.kind, &request.name, &errors)),
        Err(err) => {
            error!("could not validate {} {}: {err}", request.kind.kind, request.name);
            AdmissionResponse::invalid(err.to_string())
        }
    };

    response.into_review()
}

fn deny_message(kind: &str, name: &str, errors: &FieldErrorList) -> String {
    let details = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{kind} {name:?} is invalid: [{details}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::FieldError;

    #[test]
    fn deny_message_lists_all_field_errors() {
        let errors = vec![
            FieldError::forbidden("spec.region", "field is immutable"),
            FieldError::invalid("spec.engine", "engine does not exist"),
        ];
        assert_eq!(
            deny_message("RDBInstance", "my-instance", &errors),
            "RDBInstance \"my-instance\" is invalid: [spec.region: Forbidden: field is immutable, spec.engine: Invalid value: engine does not exist]"
        );
    }
}

use crate::domain::{error::OperatorError, reconcile::entities::Incident};

/// State of a persistent volume claim as seen by the planners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimState {
    /// Storage class configured on the claim. Absent means the cluster default.
    pub storage_class_name: Option<String>,
    pub file_system_resize_pending: bool,
}

impl ClaimState {
    pub fn get_storage_class_name(&self) -> &str {
        self.storage_class_name.as_deref().unwrap_or("")
    }
}

/// Synchronous read access to the claims of the members being planned.
#[cfg_attr(test, mockall::automock)]
pub trait ClaimInspector {
    fn get_claim(&self, claim_name: &str) -> Result<ClaimState, OperatorError>;
}

/// Sink for incidents raised while planning.
pub trait IncidentRecorder {
    fn record(&mut self, incident: Incident);
}

impl IncidentRecorder for Vec<Incident> {
    fn record(&mut self, incident: Incident) {
        self.push(incident);
    }
}

/// Claim states fetched ahead of a planning pass, keyed by claim name.
///
/// A failed read is kept as the error so the planner can skip that member only.
#[derive(Debug, Default)]
pub struct ClaimSnapshot {
    claims: std::collections::HashMap<String, Result<ClaimState, OperatorError>>,
}

impl ClaimSnapshot {
    pub fn insert(&mut self, claim_name: impl Into<String>, state: Result<ClaimState, OperatorError>) {
        self.claims.insert(claim_name.into(), state);
    }
}

impl ClaimInspector for ClaimSnapshot {
    fn get_claim(&self, claim_name: &str) -> Result<ClaimState, OperatorError> {
        match self.claims.get(claim_name) {
            Some(state) => state.clone(),
            None => Err(OperatorError::ClaimNotFound {
                name: claim_name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_snapshot_returns_stored_results() {
        let mut snapshot = ClaimSnapshot::default();
        snapshot.insert(
            "data-1",
            Ok(ClaimState {
                storage_class_name: Some("ssd".to_string()),
                file_system_resize_pending: false,
            }),
        );
        snapshot.insert(
            "data-2",
            Err(OperatorError::KubeApiError {
                message: "timeout".to_string(),
            }),
        );

        assert_eq!(snapshot.get_claim("data-1").unwrap().get_storage_class_name(), "ssd");
        assert!(matches!(
            snapshot.get_claim("data-2"),
            Err(OperatorError::KubeApiError { .. })
        ));
        assert!(matches!(
            snapshot.get_claim("data-3"),
            Err(OperatorError::ClaimNotFound { .. })
        ));
    }
}

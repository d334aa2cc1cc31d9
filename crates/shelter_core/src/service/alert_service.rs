//! Hazard alert use-case service.
//!
//! # Invariants
//! - Status changes are unconditional; any status may follow any other.
//! - Risk assessment is delegated verbatim to the injected predictor.

use crate::hazard::{DisasterFeatures, HazardPredictor, PredictionError, RiskLevel};
use crate::model::alert::{Alert, AlertId, AlertSeverity, AlertStatus};
use crate::repo::alert_repo::AlertRepository;
use crate::repo::RepoResult;
use log::{info, warn};

pub struct AlertService<R: AlertRepository> {
    repo: R,
}

impl<R: AlertRepository> AlertService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create(&self, alert: &Alert) -> RepoResult<AlertId> {
        self.repo.create_alert(alert)
    }

    pub fn update(&self, alert: &Alert) -> RepoResult<()> {
        self.repo.update_alert(alert)
    }

    pub fn get(&self, id: AlertId) -> RepoResult<Option<Alert>> {
        self.repo.get_alert(id)
    }

    pub fn list(&self) -> RepoResult<Vec<Alert>> {
        self.repo.list_alerts()
    }

    pub fn list_active(&self) -> RepoResult<Vec<Alert>> {
        self.repo.list_alerts_by_status(AlertStatus::Active)
    }

    pub fn list_by_category(&self, category: &str) -> RepoResult<Vec<Alert>> {
        self.repo.list_alerts_by_category(category.trim())
    }

    pub fn list_by_severity(&self, severity: AlertSeverity) -> RepoResult<Vec<Alert>> {
        self.repo.list_alerts_by_severity(severity)
    }

    pub fn list_by_status(&self, status: AlertStatus) -> RepoResult<Vec<Alert>> {
        self.repo.list_alerts_by_status(status)
    }

    pub fn set_status(&self, id: AlertId, status: AlertStatus) -> RepoResult<()> {
        self.repo.set_alert_status(id, status)?;
        info!(
            "event=set_alert_status module=alerts status=ok alert_id={} alert_status={}",
            id, status
        );
        Ok(())
    }

    pub fn delete(&self, id: AlertId) -> RepoResult<()> {
        self.repo.delete_alert(id)
    }

    /// Asks `predictor` for the risk level of `features`.
    pub fn assess_risk<P>(
        &self,
        predictor: &P,
        features: &DisasterFeatures,
    ) -> Result<RiskLevel, PredictionError>
    where
        P: HazardPredictor + ?Sized,
    {
        match predictor.predict(features) {
            Ok(level) => {
                info!(
                    "event=assess_risk module=alerts status=ok disaster_kind={} risk={}",
                    features.disaster_kind, level
                );
                Ok(level)
            }
            Err(err) => {
                warn!(
                    "event=assess_risk module=alerts status=error disaster_kind={} error={}",
                    features.disaster_kind, err
                );
                Err(err)
            }
        }
    }
}

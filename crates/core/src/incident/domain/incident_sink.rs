use crate::incident::domain::incident::{Incident, IncidentTrigger};
use crate::incident::domain::incident_log::IncidentLog;
use crate::incident::domain::snapshot_store::SnapshotStore;
use crate::shared::frame::Frame;

/// How far an incident got before persistence failed.
#[derive(Clone, Debug)]
pub enum PendingStage {
    /// The snapshot was never written; the frame is kept for a retry.
    Snapshot { frame: Frame },
    /// The snapshot exists but the log append failed.
    Log { incident: Incident },
}

/// A fired incident that could not be fully persisted.
#[derive(Clone, Debug)]
pub struct UnpersistedIncident {
    pub trigger: IncidentTrigger,
    pub stage: PendingStage,
    pub reason: String,
}

#[derive(Clone, Debug)]
pub enum SinkOutcome {
    Persisted(Incident),
    Unpersisted { trigger: IncidentTrigger, reason: String },
}

impl SinkOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, SinkOutcome::Persisted(_))
    }
}

/// Hands fired incidents to the snapshot store and the incident log.
///
/// Failures never propagate to the caller. They are returned as
/// [`SinkOutcome::Unpersisted`] and the incident is kept for
/// [`IncidentSink::retry_unpersisted`].
pub struct IncidentSink {
    snapshots: Box<dyn SnapshotStore>,
    log: Box<dyn IncidentLog>,
    pending: Vec<UnpersistedIncident>,
}

impl IncidentSink {
    pub fn new(snapshots: Box<dyn SnapshotStore>, log: Box<dyn IncidentLog>) -> Self {
        Self {
            snapshots,
            log,
            pending: Vec::new(),
        }
    }

    pub fn record(&mut self, trigger: IncidentTrigger, frame: Frame) -> SinkOutcome {
        match self.persist(trigger, PendingStage::Snapshot { frame }) {
            Ok(incident) => SinkOutcome::Persisted(incident),
            Err(unpersisted) => {
                log::warn!(
                    "Incident for subject {} ({}) not persisted: {}",
                    unpersisted.trigger.subject_id,
                    unpersisted.trigger.direction,
                    unpersisted.reason
                );
                let outcome = SinkOutcome::Unpersisted {
                    trigger: unpersisted.trigger.clone(),
                    reason: unpersisted.reason.clone(),
                };
                self.pending.push(unpersisted);
                outcome
            }
        }
    }

    /// Attempts every pending incident once more, resuming at the stage
    /// that failed. Returns the incidents persisted by this pass.
    pub fn retry_unpersisted(&mut self) -> Vec<Incident> {
        let pending = std::mem::take(&mut self.pending);
        let mut persisted = Vec::new();
        for item in pending {
            match self.persist(item.trigger, item.stage) {
                Ok(incident) => persisted.push(incident),
                Err(still_pending) => {
                    log::warn!(
                        "Retry failed for subject {}: {}",
                        still_pending.trigger.subject_id,
                        still_pending.reason
                    );
                    self.pending.push(still_pending);
                }
            }
        }
        persisted
    }

    pub fn unpersisted(&self) -> &[UnpersistedIncident] {
        &self.pending
    }

    fn persist(
        &mut self,
        trigger: IncidentTrigger,
        stage: PendingStage,
    ) -> Result<Incident, UnpersistedIncident> {
        let incident = match stage {
            PendingStage::Snapshot { frame } => {
                match self.snapshots.store(&frame, &trigger.snapshot_hint()) {
                    Ok(snapshot_ref) => trigger.clone().into_incident(snapshot_ref),
                    Err(e) => {
                        return Err(UnpersistedIncident {
                            trigger,
                            stage: PendingStage::Snapshot { frame },
                            reason: format!("snapshot: {e}"),
                        })
                    }
                }
            }
            PendingStage::Log { incident } => incident,
        };

        match self.log.append(&incident) {
            Ok(()) => Ok(incident),
            Err(e) => Err(UnpersistedIncident {
                trigger,
                reason: format!("log: {e}"),
                stage: PendingStage::Log { incident },
            }),
        }
    }
}

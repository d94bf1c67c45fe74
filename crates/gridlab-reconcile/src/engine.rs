//! The reconciliation state machine.
//!
//! Each status message either creates the component it describes, merges
//! onto the stored record, or (for `"gone"`) removes it. Messages are
//! applied in arrival order; the last one to arrive wins.

use gridlab_bus::BusSession;
use gridlab_core::models::component::{
    CreateComponent, InfrastructureComponent, STATE_GONE, STATE_UNKNOWN, UpdateComponent,
};
use gridlab_core::repository::ComponentRepository;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ReconcileError;
use crate::message::{Schema, Status, StatusMessage};
use crate::publisher::ActionPublisher;

/// What handling a message did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Deleted,
    /// `"gone"` arrived while configurations still reference the
    /// component. The state was recorded and the row kept.
    DeletionPostponed,
    /// `"gone"` for a component that was never stored.
    Discarded,
    /// The message was a command, not a status report.
    CommandIgnored,
}

pub struct Reconciler<R: ComponentRepository, B: BusSession> {
    components: R,
    publisher: ActionPublisher<B>,
}

impl<R: ComponentRepository, B: BusSession> Reconciler<R, B> {
    pub fn new(components: R, publisher: ActionPublisher<B>) -> Self {
        Self {
            components,
            publisher,
        }
    }

    /// Apply one raw message body.
    pub async fn handle_message(&self, body: &[u8]) -> Result<Outcome, ReconcileError> {
        let (message, raw) = StatusMessage::decode(body)?;

        if message.is_command() {
            debug!(action = ?message.action, "Ignoring command");
            return Ok(Outcome::CommandIgnored);
        }

        let uuid = Uuid::parse_str(&message.properties.uuid)
            .map_err(|_| ReconcileError::InvalidUuid(message.properties.uuid.clone()))?;

        match self.components.get(uuid).await {
            Ok(existing) => self.update_from_status(existing, message, raw).await,
            Err(e) if e.is_not_found() => self.create_from_status(uuid, message, raw).await,
            Err(e) => Err(e.into()),
        }
    }

    async fn create_from_status(
        &self,
        uuid: Uuid,
        message: StatusMessage,
        raw: Value,
    ) -> Result<Outcome, ReconcileError> {
        if message.state() == Some(STATE_GONE) {
            info!(%uuid, "Discarding gone status of unknown component");
            return Ok(Outcome::Discarded);
        }

        let StatusMessage {
            properties,
            status,
            schema,
            ..
        } = message;
        let status = status.unwrap_or_default();
        let schema = schema.unwrap_or_default();

        let category = required("category", properties.category)?;
        let component_type = required("type", properties.component_type)?;
        let manager = manager_of(uuid, &status);

        let input = CreateComponent {
            uuid: Some(uuid),
            name: properties.name.unwrap_or_default(),
            category,
            component_type,
            location: properties.location.unwrap_or_default(),
            description: properties.description.unwrap_or_default(),
            websocket_url: properties.ws_url.unwrap_or_default(),
            api_url: properties.api_url.unwrap_or_default(),
            state: Some(status.state.unwrap_or_else(|| STATE_UNKNOWN.to_string())),
            uptime: status.uptime,
            managed_externally: true,
            manager,
            status_update_raw: Some(raw),
            start_parameter_schema: schema.start,
            create_parameter_schema: schema.create,
        };

        let created = self.components.create(input).await?;
        info!(
            %uuid,
            name = %created.name,
            category = %created.category,
            state = %created.state,
            "Registered component from status"
        );

        // Pull a complete status report right away.
        if let Err(e) = self.publisher.send_ping(uuid).await {
            warn!(%uuid, error = %e, "Failed to ping new component");
        }

        Ok(Outcome::Created)
    }

    async fn update_from_status(
        &self,
        existing: InfrastructureComponent,
        message: StatusMessage,
        raw: Value,
    ) -> Result<Outcome, ReconcileError> {
        let uuid = existing.uuid;
        let mut outcome = Outcome::Updated;

        if message.state() == Some(STATE_GONE) {
            match self.components.delete(uuid).await {
                Ok(()) => {
                    info!(%uuid, "Removed gone component");
                    return Ok(Outcome::Deleted);
                }
                Err(e) if e.is_deletion_postponed() => {
                    info!(%uuid, reason = %e, "Component is gone but still referenced");
                    outcome = Outcome::DeletionPostponed;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let update = merge(uuid, message, raw)?;
        let updated = self.components.update(uuid, update).await?;
        debug!(
            %uuid,
            previous_state = %existing.state,
            state = %updated.state,
            "Updated component from status"
        );

        Ok(outcome)
    }
}

/// Every field present in the message, as an update.
fn merge(uuid: Uuid, message: StatusMessage, raw: Value) -> Result<UpdateComponent, ReconcileError> {
    let StatusMessage {
        properties,
        status,
        schema,
        ..
    } = message;
    let status = status.unwrap_or_default();
    let Schema { start, create } = schema.unwrap_or_default();

    Ok(UpdateComponent {
        name: properties.name,
        category: not_blank("category", properties.category)?,
        component_type: not_blank("type", properties.component_type)?,
        location: properties.location,
        description: properties.description,
        websocket_url: properties.ws_url,
        api_url: properties.api_url,
        manager: manager_of(uuid, &status).map(Some),
        state: status.state,
        uptime: status.uptime,
        status_update_raw: Some(raw),
        start_parameter_schema: start,
        create_parameter_schema: create,
    })
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ReconcileError> {
    not_blank(field, value)?.ok_or(ReconcileError::MissingField(field))
}

fn not_blank(field: &'static str, value: Option<String>) -> Result<Option<String>, ReconcileError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ReconcileError::MissingField(field)),
        other => Ok(other),
    }
}

/// The managing component named in the status, if it is a valid UUID.
fn manager_of(uuid: Uuid, status: &Status) -> Option<Uuid> {
    let raw = status.managed_by.as_deref()?;
    match Uuid::parse_str(raw) {
        Ok(manager) => Some(manager),
        Err(_) => {
            warn!(%uuid, managed_by = raw, "Ignoring invalid manager UUID");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(body: &str) -> (StatusMessage, Value) {
        StatusMessage::decode(body.as_bytes()).unwrap()
    }

    #[test]
    fn merge_only_sets_present_fields() {
        let uuid = Uuid::new_v4();
        let (message, raw) = decode(
            r#"{"properties": {"uuid": "x", "name": "Sim2"},
                "status": {"state": "running", "uptime": 3.0}}"#,
        );

        let update = merge(uuid, message, raw.clone()).unwrap();
        assert_eq!(update.name.as_deref(), Some("Sim2"));
        assert_eq!(update.state.as_deref(), Some("running"));
        assert_eq!(update.uptime, Some(3.0));
        assert!(update.category.is_none());
        assert!(update.location.is_none());
        assert!(update.manager.is_none());
        assert_eq!(update.status_update_raw, Some(raw));
    }

    #[test]
    fn merge_rejects_blank_category() {
        let (message, raw) = decode(r#"{"properties": {"uuid": "x", "category": " "}}"#);
        let err = merge(Uuid::new_v4(), message, raw).unwrap_err();
        assert!(matches!(err, ReconcileError::MissingField("category")));
    }

    #[test]
    fn invalid_manager_is_ignored() {
        let status = Status {
            managed_by: Some("not-a-uuid".into()),
            ..Default::default()
        };
        assert_eq!(manager_of(Uuid::new_v4(), &status), None);

        let manager = Uuid::new_v4();
        let status = Status {
            managed_by: Some(manager.to_string()),
            ..Default::default()
        };
        assert_eq!(manager_of(Uuid::new_v4(), &status), Some(manager));
    }
}

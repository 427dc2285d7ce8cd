//! Profile change approval workflow
//!
//! Patients submit the fields they want changed; an administrator approves
//! or rejects each request once. Either decision notifies the requester.

use nutriform_shared::validation::validate_requested_fields;
use nutriform_shared::{
    ChangeRequestStatus, Notification, ProfileChangeCreate, ProfileChangeRequest, ReviewDecision,
};
use tracing::info;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::repositories::{NotificationRepository, ProfileChangeRepository};

/// Profile change service for business logic
pub struct ProfileChangeService;

impl ProfileChangeService {
    /// Submit a new pending request
    pub async fn submit<S>(store: &S, input: ProfileChangeCreate) -> ServiceResult<ProfileChangeRequest>
    where
        S: ProfileChangeRepository + ?Sized,
    {
        validate_requested_fields(&input.requested_fields)?;

        let request = store
            .create_request(input.user_id, input.requested_fields)
            .await?;
        info!(request_id = %request.id, user_id = %request.user_id, "Profile change requested");
        Ok(request)
    }

    /// All requests, newest first
    pub async fn list<S>(store: &S) -> ServiceResult<Vec<ProfileChangeRequest>>
    where
        S: ProfileChangeRepository + ?Sized,
    {
        Ok(store.list_requests().await?)
    }

    pub async fn approve<S>(
        store: &S,
        request_id: Uuid,
        admin_id: Uuid,
    ) -> ServiceResult<ProfileChangeRequest>
    where
        S: ProfileChangeRepository + NotificationRepository + ?Sized,
    {
        Self::review(store, request_id, admin_id, ReviewDecision::Approve).await
    }

    pub async fn reject<S>(
        store: &S,
        request_id: Uuid,
        admin_id: Uuid,
    ) -> ServiceResult<ProfileChangeRequest>
    where
        S: ProfileChangeRepository + NotificationRepository + ?Sized,
    {
        Self::review(store, request_id, admin_id, ReviewDecision::Reject).await
    }

    /// Record the decision and notify the requester
    ///
    /// Only pending requests can be reviewed; a second decision is a conflict.
    pub async fn review<S>(
        store: &S,
        request_id: Uuid,
        admin_id: Uuid,
        decision: ReviewDecision,
    ) -> ServiceResult<ProfileChangeRequest>
    where
        S: ProfileChangeRepository + NotificationRepository + ?Sized,
    {
        let request = store.get_request(request_id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("Profile change request {} not found", request_id))
        })?;

        if request.status != ChangeRequestStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "Profile change request {} is already {}",
                request_id,
                request.status.as_str()
            )));
        }

        let (status, verb) = match decision {
            ReviewDecision::Approve => (ChangeRequestStatus::Approved, "approved"),
            ReviewDecision::Reject => (ChangeRequestStatus::Rejected, "rejected"),
        };

        let updated = store
            .update_request_status(request_id, status, admin_id)
            .await?;
        store
            .create_notification(
                updated.user_id,
                format!("Your request {} was {} by an administrator", request_id, verb),
            )
            .await?;

        info!(
            %request_id,
            %admin_id,
            status = status.as_str(),
            "Profile change request reviewed"
        );
        Ok(updated)
    }

    /// Notifications of a user, newest first
    pub async fn notifications<S>(store: &S, user_id: Uuid) -> ServiceResult<Vec<Notification>>
    where
        S: NotificationRepository + ?Sized,
    {
        Ok(store.list_notifications(user_id).await?)
    }
}

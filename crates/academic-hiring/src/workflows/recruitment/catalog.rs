use chrono::{DateTime, Utc};
use tracing::info;

use super::access::Caller;
use super::domain::{
    is_valid_national_id, JuryMember, JuryMemberDraft, Listing, ListingDraft, ListingId,
    ListingRemoval, ListingStatus, ListingUpdate, NewUser, ProfileUpdate, Registration, Role,
    User, UserId,
};
use super::error::WorkflowError;
use super::repository::{
    ApplicationFilter, ListingFilter, NotificationPublisher, RecruitmentStore, RepositoryError,
};
use super::service::RecruitmentService;
use super::views::ListingView;

impl<S, N> RecruitmentService<S, N>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    /// Self-service sign-up. The account is always a candidate.
    pub fn register(&self, registration: Registration) -> Result<User, WorkflowError> {
        self.create_account(registration, Role::Candidate)
    }

    /// Admin-created account with an explicit role (staff and jury accounts).
    pub fn provision_user(
        &self,
        caller: &Caller,
        registration: Registration,
        role: Role,
    ) -> Result<User, WorkflowError> {
        caller.require(Role::Admin, "provision accounts")?;
        self.create_account(registration, role)
    }

    /// Map an identity asserted by the transport to a caller context.
    pub fn resolve_caller(&self, user_id: UserId) -> Result<Caller, WorkflowError> {
        self.store
            .get_user(user_id)?
            .map(|user| Caller::new(user.id, user.role))
            .ok_or(WorkflowError::Unauthenticated)
    }

    pub fn me(&self, caller: &Caller) -> Result<User, WorkflowError> {
        self.store
            .get_user(caller.user_id)?
            .ok_or_else(|| WorkflowError::not_found("user", caller.user_id))
    }

    pub fn update_me(&self, caller: &Caller, update: ProfileUpdate) -> Result<User, WorkflowError> {
        self.apply_profile(caller.user_id, update)
    }

    /// Admin view of every account, optionally narrowed to one role.
    pub fn users(&self, caller: &Caller, role: Option<Role>) -> Result<Vec<User>, WorkflowError> {
        caller.require(Role::Admin, "browse accounts")?;
        Ok(self
            .store
            .list_users()?
            .into_iter()
            .filter(|user| role.map_or(true, |role| user.role == role))
            .collect())
    }

    pub fn user(&self, caller: &Caller, user_id: UserId) -> Result<User, WorkflowError> {
        caller.require(Role::Admin, "view accounts")?;
        self.store
            .get_user(user_id)?
            .ok_or_else(|| WorkflowError::not_found("user", user_id))
    }

    pub fn update_user(
        &self,
        caller: &Caller,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> Result<User, WorkflowError> {
        caller.require(Role::Admin, "update accounts")?;
        self.apply_profile(user_id, update)
    }

    /// Accounts referenced by applications or evaluations cannot be deleted.
    pub fn delete_user(&self, caller: &Caller, user_id: UserId) -> Result<(), WorkflowError> {
        caller.require(Role::Admin, "delete accounts")?;
        if caller.user_id == user_id {
            return Err(WorkflowError::validation("admins cannot delete their own account"));
        }
        self.store.delete_user(user_id).map_err(|err| match err {
            RepositoryError::NotFound => WorkflowError::not_found("user", user_id),
            RepositoryError::Conflict => WorkflowError::validation(format!(
                "{user_id} still has applications or evaluations"
            )),
            other => other.into(),
        })?;
        info!(user = %user_id, "account deleted");
        Ok(())
    }

    pub fn create_listing(
        &self,
        caller: &Caller,
        draft: ListingDraft,
    ) -> Result<ListingView, WorkflowError> {
        caller.require(Role::Admin, "create listings")?;
        let draft = ListingDraft {
            faculty: required_text("faculty", &draft.faculty)?,
            department: required_text("department", &draft.department)?,
            ..draft
        };
        check_window(&draft.publish_date, &draft.deadline)?;

        let listing = self
            .store
            .create_listing(draft, caller.user_id, self.clock.now())?;
        info!(
            listing = %listing.id,
            position = listing.position.label(),
            deadline = %listing.deadline,
            "listing created"
        );
        self.listing_view(listing)
    }

    /// Once a listing has applications only its deadline may move.
    pub fn update_listing(
        &self,
        caller: &Caller,
        listing_id: ListingId,
        update: ListingUpdate,
    ) -> Result<ListingView, WorkflowError> {
        caller.require(Role::Admin, "update listings")?;
        let mut listing = self.visible_listing(listing_id)?;
        let locked_once_applied = update.touches_locked_fields();

        let ListingUpdate {
            position,
            faculty,
            department,
            publish_date,
            deadline,
            description,
            requirements,
        } = update;
        if let Some(position) = position {
            listing.position = position;
        }
        if let Some(faculty) = faculty {
            listing.faculty = required_text("faculty", &faculty)?;
        }
        if let Some(department) = department {
            listing.department = required_text("department", &department)?;
        }
        if let Some(publish_date) = publish_date {
            listing.publish_date = publish_date;
        }
        if let Some(deadline) = deadline {
            listing.deadline = deadline;
        }
        if description.is_some() {
            listing.description = description;
        }
        if requirements.is_some() {
            listing.requirements = requirements;
        }
        check_window(&listing.publish_date, &listing.deadline)?;
        listing.updated_at = Some(self.clock.now());

        let listing = self
            .store
            .update_listing(listing, locked_once_applied)
            .map_err(|err| match err {
                RepositoryError::NotFound => WorkflowError::not_found("listing", listing_id),
                RepositoryError::Conflict => WorkflowError::validation(
                    "only the deadline can change once a listing has applications",
                ),
                other => other.into(),
            })?;
        info!(listing = %listing_id, deadline = %listing.deadline, "listing updated");
        self.listing_view(listing)
    }

    /// Hard delete when nothing references the listing, otherwise archive it.
    pub fn delete_listing(
        &self,
        caller: &Caller,
        listing_id: ListingId,
    ) -> Result<ListingRemoval, WorkflowError> {
        caller.require(Role::Admin, "delete listings")?;
        let removal = self
            .store
            .remove_listing(listing_id, self.clock.now())
            .map_err(|err| match err {
                RepositoryError::NotFound => WorkflowError::not_found("listing", listing_id),
                other => other.into(),
            })?;

        info!(listing = %listing_id, outcome = ?removal, "listing removed");
        Ok(removal)
    }

    /// Public listing catalogue; archived listings never appear.
    pub fn listings(&self, status: Option<ListingStatus>) -> Result<Vec<ListingView>, WorkflowError> {
        self.listing_views(ListingFilter::default(), status)
    }

    /// Admin catalogue that also shows archived listings.
    pub fn all_listings(
        &self,
        caller: &Caller,
        status: Option<ListingStatus>,
    ) -> Result<Vec<ListingView>, WorkflowError> {
        caller.require(Role::Admin, "browse archived listings")?;
        self.listing_views(
            ListingFilter {
                include_archived: true,
            },
            status,
        )
    }

    pub fn listing(&self, listing_id: ListingId) -> Result<ListingView, WorkflowError> {
        let listing = self.visible_listing(listing_id)?;
        self.listing_view(listing)
    }

    pub fn jury_members(&self, caller: &Caller) -> Result<Vec<JuryMember>, WorkflowError> {
        caller.require(Role::Manager, "browse the jury directory")?;
        Ok(self.store.list_jury()?)
    }

    /// Enrol an existing jury-role account in the directory used for assignments.
    pub fn add_jury_member(
        &self,
        caller: &Caller,
        draft: JuryMemberDraft,
    ) -> Result<JuryMember, WorkflowError> {
        caller.require(Role::Manager, "manage the jury directory")?;
        let user = self
            .store
            .get_user(draft.user_id)?
            .ok_or_else(|| WorkflowError::not_found("user", draft.user_id))?;
        if user.role != Role::Jury {
            return Err(WorkflowError::validation(format!(
                "{} is a {} account, not a jury account",
                user.id,
                user.role.label()
            )));
        }

        let member = self
            .store
            .add_jury_member(JuryMember {
                id: user.id,
                national_id: user.national_id,
                name: user.name,
                email: user.email,
                department: draft.department,
                faculty: draft.faculty,
                university: draft.university,
            })
            .map_err(|err| match err {
                RepositoryError::Conflict => WorkflowError::validation(format!(
                    "{} is already in the jury directory",
                    draft.user_id
                )),
                other => other.into(),
            })?;
        info!(jury_member = %member.id, "jury member enrolled");
        Ok(member)
    }

    pub fn remove_jury_member(&self, caller: &Caller, user_id: UserId) -> Result<(), WorkflowError> {
        caller.require(Role::Manager, "manage the jury directory")?;
        self.store
            .remove_jury_member(user_id)
            .map_err(|err| match err {
                RepositoryError::NotFound => WorkflowError::not_found("jury member", user_id),
                other => other.into(),
            })?;
        info!(jury_member = %user_id, "jury member removed");
        Ok(())
    }

    fn create_account(&self, registration: Registration, role: Role) -> Result<User, WorkflowError> {
        let national_id = registration.national_id.trim().to_string();
        if !is_valid_national_id(&national_id) {
            return Err(WorkflowError::validation(
                "national id must be exactly 11 digits",
            ));
        }
        let name = required_text("name", &registration.name)?;
        let email = checked_email(&registration.email)?;

        let user = self
            .store
            .create_user(NewUser {
                national_id,
                name,
                email,
                role,
                created_at: self.clock.now(),
            })
            .map_err(|err| match err {
                RepositoryError::Conflict => {
                    WorkflowError::validation("national id or email is already registered")
                }
                other => other.into(),
            })?;
        info!(user = %user.id, role = role.label(), "account created");
        Ok(user)
    }

    fn apply_profile(&self, user_id: UserId, update: ProfileUpdate) -> Result<User, WorkflowError> {
        let mut user = self
            .store
            .get_user(user_id)?
            .ok_or_else(|| WorkflowError::not_found("user", user_id))?;

        let ProfileUpdate {
            name,
            email,
            phone,
            address,
        } = update;
        if let Some(name) = name {
            user.name = required_text("name", &name)?;
        }
        if let Some(email) = email {
            user.email = checked_email(&email)?;
        }
        if phone.is_some() {
            user.phone = optional_text(phone);
        }
        if address.is_some() {
            user.address = optional_text(address);
        }
        user.updated_at = Some(self.clock.now());

        let user = self.store.update_user(user).map_err(|err| match err {
            RepositoryError::NotFound => WorkflowError::not_found("user", user_id),
            RepositoryError::Conflict => {
                WorkflowError::validation("email is already registered to another account")
            }
            other => other.into(),
        })?;
        info!(user = %user_id, "profile updated");
        Ok(user)
    }

    fn listing_views(
        &self,
        filter: ListingFilter,
        status: Option<ListingStatus>,
    ) -> Result<Vec<ListingView>, WorkflowError> {
        self.store
            .list_listings(&filter)?
            .into_iter()
            .map(|listing| self.listing_view(listing))
            .filter(|view| match (view, status) {
                (Ok(view), Some(status)) => view.status == status,
                _ => true,
            })
            .collect()
    }

    fn visible_listing(&self, listing_id: ListingId) -> Result<Listing, WorkflowError> {
        self.store
            .get_listing(listing_id)?
            .filter(|listing| !listing.archived)
            .ok_or_else(|| WorkflowError::not_found("listing", listing_id))
    }

    fn application_count(&self, listing_id: ListingId) -> Result<usize, WorkflowError> {
        Ok(self
            .store
            .list_applications(&ApplicationFilter {
                listing_id: Some(listing_id),
                ..ApplicationFilter::default()
            })?
            .len())
    }

    fn listing_view(&self, listing: Listing) -> Result<ListingView, WorkflowError> {
        Ok(ListingView {
            status: listing.status_at(self.clock.now()),
            applications_count: self.application_count(listing.id)?,
            listing,
        })
    }
}

fn required_text(field: &str, value: &str) -> Result<String, WorkflowError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WorkflowError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn checked_email(value: &str) -> Result<String, WorkflowError> {
    let email = value.trim();
    if !email.contains('@') {
        return Err(WorkflowError::validation("email address is malformed"));
    }
    Ok(email.to_string())
}

fn check_window(publish_date: &DateTime<Utc>, deadline: &DateTime<Utc>) -> Result<(), WorkflowError> {
    if deadline <= publish_date {
        return Err(WorkflowError::validation(
            "deadline must be after the publish date",
        ));
    }
    Ok(())
}

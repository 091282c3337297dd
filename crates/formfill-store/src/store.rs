use crate::Result;
use async_trait::async_trait;
use formfill_core::{InterpretationResult, MappingEntry, StoredMapping, UserProfile};

/// Persistence for user profiles, per-site field mappings and cached interpretations
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Profile for a user, `None` if nothing was saved yet
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Insert or replace a profile; the last write wins
    async fn save_profile(&self, profile: &UserProfile) -> Result<()>;

    /// Mappings for one form, or for the whole domain when `form_id` is `None`
    async fn get_mappings(&self, domain: &str, form_id: Option<&str>) -> Result<Vec<StoredMapping>>;

    /// Insert or replace the mapping for (domain, form_id, field_name)
    async fn save_mapping(&self, mapping: &StoredMapping) -> Result<()>;

    /// Save many mappings in one transaction, skipping incomplete entries
    ///
    /// Returns the number of mappings written.
    async fn save_mappings(
        &self,
        domain: &str,
        form_id: Option<&str>,
        entries: Vec<MappingEntry>,
    ) -> Result<usize>;

    /// Cache the interpretation of a form
    async fn save_interpretation(
        &self,
        domain: &str,
        form_id: Option<&str>,
        result: &InterpretationResult,
    ) -> Result<()>;

    /// Cached interpretation; without `form_id`, the most confident one for the domain
    async fn get_interpretation(
        &self,
        domain: &str,
        form_id: Option<&str>,
    ) -> Result<Option<InterpretationResult>>;
}

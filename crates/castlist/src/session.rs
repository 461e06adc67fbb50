use crate::Error;
use castlist_core::{
    access::{DataAccess, EnrichedRoster, MembershipCache, PlatformClient},
    config::CastlistConfig,
    model::{GroupRef, RosterDefinition, RosterMember, TenantId},
    page::{Cursor, PageControls, RosterPager},
    store::{Clock, RosterStore, StoreBackend, SystemClock},
    token::{ACTION_SHOW, DisplayMode, NavigationToken, decode_with_limit, encode_with_limit},
};
use std::sync::Arc;

///
/// RenderedPage
///
/// Everything needed to draw one roster page and its buttons.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RenderedPage {
    pub definition: RosterDefinition,
    pub display_mode: DisplayMode,
    pub cursor: Cursor,

    /// `None` on the ungrouped bucket.
    pub group_ref: Option<GroupRef>,
    pub group_label: String,
    pub members: Vec<RosterMember>,
    pub page_number: usize,
    pub page_count: usize,
    pub group_count: usize,
    pub controls: PageControls,
}

///
/// Castlist
///
/// Session handle over one store and one shared membership cache. Every
/// call is stateless; navigation state lives only in tokens.
///

pub struct Castlist<B, C = SystemClock> {
    access: DataAccess<B, C>,
    config: CastlistConfig,
}

impl<B: StoreBackend, C: Clock> Castlist<B, C> {
    /// Build a session. The configuration is validated first.
    pub fn new(
        store: RosterStore<B, C>,
        cache: Arc<MembershipCache>,
        config: CastlistConfig,
    ) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            access: DataAccess::with_config(store, cache, &config),
            config,
        })
    }

    #[must_use]
    pub const fn access(&self) -> &DataAccess<B, C> {
        &self.access
    }

    #[must_use]
    pub const fn store(&self) -> &RosterStore<B, C> {
        self.access.store()
    }

    #[must_use]
    pub const fn config(&self) -> &CastlistConfig {
        &self.config
    }

    /// Cheap listing for selection menus; never touches the platform.
    pub fn list_roster_summaries(&self, tenant: &TenantId) -> Result<Vec<RosterDefinition>, Error> {
        Ok(self.access.list_roster_summaries(tenant)?)
    }

    /// Listing cut to the configured menu size.
    pub fn list_menu_entries(&self, tenant: &TenantId) -> Result<Vec<RosterDefinition>, Error> {
        Ok(self.access.list_menu_entries(tenant)?)
    }

    pub async fn get_enriched_roster<P: PlatformClient>(
        &self,
        tenant: &TenantId,
        identifier: &str,
        platform: &P,
    ) -> Result<EnrichedRoster, Error> {
        Ok(self
            .access
            .get_enriched_roster(tenant, identifier, platform)
            .await?)
    }

    /// Token that opens `roster_id` on its first page in view mode.
    pub fn start_token(&self, roster_id: &str) -> Result<String, Error> {
        let state = NavigationToken::new(ACTION_SHOW, 0, 0, roster_id, DisplayMode::View);

        Ok(encode_with_limit(
            &state,
            self.config.navigation.max_token_chars,
        )?)
    }

    /// Run one full navigation cycle: decode, resolve, enrich, sort, page.
    /// A malformed token fails before any store or platform access.
    pub async fn open<P: PlatformClient>(
        &self,
        tenant: &TenantId,
        token: &str,
        platform: &P,
    ) -> Result<RenderedPage, Error> {
        let max_chars = self.config.navigation.max_token_chars;
        let state = decode_with_limit(token, max_chars).inspect_err(|err| {
            tracing::warn!(tenant = %tenant, error = %err, "rejecting malformed navigation token");
        })?;

        let roster = self
            .access
            .get_enriched_roster(tenant, &state.roster_id, platform)
            .await?;
        let definition = roster.definition.clone();

        let pager = RosterPager::new(roster, self.config.paging.page_size, state.display_mode)
            .with_token_limit(max_chars);
        let cursor = pager.navigate(&state);
        let controls = pager.controls(cursor)?;
        let view = pager.page(cursor);
        let group_ref = pager
            .groups()
            .get(view.cursor.group_index as usize)
            .and_then(|group| group.group_ref.clone());

        tracing::debug!(
            tenant = %tenant,
            roster = %definition.id(),
            action = %state.action,
            group = view.cursor.group_index,
            page = view.cursor.page_index,
            "rendered roster page"
        );

        Ok(RenderedPage {
            definition,
            display_mode: state.display_mode,
            cursor: view.cursor,
            group_ref,
            group_label: view.group_label.to_string(),
            members: view.members.to_vec(),
            page_number: view.page_number,
            page_count: view.page_count,
            group_count: view.group_count,
            controls,
        })
    }
}

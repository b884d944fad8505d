use log::debug;

use crate::processors::Processors;

impl Processors {
    /// Handle a username change. The write is a plain upsert, so a replay
    /// converges on the same value; the last observed event wins.
    pub(super) async fn process_username(
        &self,
        account: String,
        username: String,
    ) -> anyhow::Result<()> {
        debug!("Username for {} set to {:?}", account, username);
        self.db.postgres.set_username(&account, &username).await
    }
}

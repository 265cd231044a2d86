use anyhow::{bail, Context as _};
use menu_core::config::MenuConfig;
use menu_core::{
    AdminGate, Direction, LocalCache, MenuSession, MenuTree, Reconciled, RemoteSyncChannel, Tag,
};
use menu_sync_client::SocketChannel;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// One admin edit, as given on the command line.
#[derive(Debug, Clone)]
pub enum EditOp {
    Price {
        section: String,
        item: usize,
        price: usize,
        value: String,
    },
    Tag {
        section: String,
        item: usize,
        tag: Tag,
    },
    Delete {
        section: String,
        item: usize,
    },
    Move {
        section: String,
        item: usize,
        direction: Direction,
    },
}

pub struct App {
    pub config: MenuConfig,
    pub socket_path: PathBuf,
}

impl App {
    pub fn new(config: MenuConfig, socket_override: Option<PathBuf>) -> Self {
        let socket_path = socket_override.unwrap_or_else(|| config.sync.socket_path.clone());
        Self {
            config,
            socket_path,
        }
    }

    pub fn channel(&self) -> anyhow::Result<SocketChannel> {
        Ok(SocketChannel::new(&self.socket_path, self.config.record_key()?))
    }

    pub fn session(&self) -> anyhow::Result<MenuSession> {
        let key = self.config.record_key()?;
        let cache = LocalCache::new(Arc::new(self.config.cache_slots()), key);
        Ok(MenuSession::new(
            Arc::new(self.channel()?),
            cache,
            AdminGate::new(self.config.credential()),
            self.config.default_tree()?,
        ))
    }

    /// Opens the session and applies the first delivery. A seed write is followed by
    /// its own echo, which is consumed too.
    pub async fn open_settled(&self, session: &mut MenuSession) -> anyhow::Result<()> {
        session
            .open()
            .await
            .with_context(|| format!("cannot reach record service at {}", self.socket_path.display()))?;
        match session.next_update().await {
            Some(Reconciled::Seeded) => {
                session.next_update().await;
            }
            Some(Reconciled::Rejected(reason)) => warn!("Showing last known menu: {}", reason),
            Some(_) => {}
            None => bail!("record service closed the subscription"),
        }
        Ok(())
    }

    /// Current tree from the remote, or the cached/default one when it is unreachable.
    pub async fn current_tree(&self) -> anyhow::Result<MenuTree> {
        let mut session = self.session()?;
        if let Err(e) = self.open_settled(&mut session).await {
            warn!("{:#}; showing cached menu", e);
        }
        Ok(session.tree().clone())
    }

    /// Returns the resulting tree and whether anything was written.
    pub async fn edit(&self, password: String, op: EditOp) -> anyhow::Result<(MenuTree, bool)> {
        let mut session = self.session()?;
        self.open_settled(&mut session).await?;

        let mut input = password;
        session.attempt_login(&mut input)?;

        match op {
            EditOp::Price {
                section,
                item,
                price,
                value,
            } => session.update_price(&section, item, price, value)?,
            EditOp::Tag { section, item, tag } => session.toggle_tag(&section, item, tag)?,
            EditOp::Delete { section, item } => session.delete_item(&section, item)?,
            EditOp::Move {
                section,
                item,
                direction,
            } => session.reorder_item(&section, item, direction)?,
        }

        if !session.has_unsaved_edits() {
            info!("Nothing changed, not saving");
            session.cancel();
            return Ok((session.tree().clone(), false));
        }
        session.save().await?;
        Ok((session.tree().clone(), true))
    }

    /// Writes the default document. Without `force` an existing record is kept.
    pub async fn seed(&self, force: bool) -> anyhow::Result<bool> {
        let channel = self.channel()?;
        if !force {
            let mut client = menu_sync_client::Client::connect(&self.socket_path).await?;
            if client.get(channel.key().as_str()).await?.is_some() {
                return Ok(false);
            }
        }
        channel.write(&self.config.default_tree()?).await?;
        Ok(true)
    }
}

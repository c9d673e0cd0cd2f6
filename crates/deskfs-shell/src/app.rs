use anyhow::{anyhow, bail, Context};
use deskfs_core::config::settings::Config;
use deskfs_core::event::{Command, Event};
use deskfs_core::nav::filter::{sort_nodes, SortDirection, SortField};
use deskfs_core::{NodeFlags, NodeId, NodeKind, SnapshotStore, Vfs};

use crate::input::{InputAction, HELP};
use crate::render;

/// What the REPL loop does after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Print the text (if any) and read the next line.
    Continue(String),
    /// Leave the loop.
    Quit,
}

/// Shell state: the VFS, the current folder, listing preferences and the
/// snapshot store the VFS is persisted to.
pub struct App<S: SnapshotStore> {
    vfs: Vfs,
    cwd: NodeId,
    config: Config,
    store: S,
    sort: SortField,
    direction: SortDirection,
}

impl<S: SnapshotStore> App<S> {
    /// Loads the persisted snapshot from `store`, falling back to a freshly
    /// seeded tree when there is none or it cannot be used. An unusable
    /// snapshot is set aside first; if that fails, autosave is switched off
    /// so it is not overwritten.
    pub fn boot(mut config: Config, store: S) -> Self {
        let options = config.vfs_options();
        let loaded = store
            .load()
            .and_then(|state| state.map(|s| Vfs::from_snapshot(s, options)).transpose());
        let vfs = match loaded {
            Ok(Some(vfs)) => vfs,
            Ok(None) => {
                tracing::info!("no snapshot yet, seeding a fresh tree");
                Vfs::new(options)
            }
            Err(e) => {
                tracing::warn!(error = %e, "snapshot unusable, starting from a fresh tree");
                match store.set_aside() {
                    Ok(Some(location)) => tracing::warn!(%location, "kept unusable snapshot"),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "could not set snapshot aside, autosave off");
                        config.storage.autosave = false;
                    }
                }
                Vfs::new(options)
            }
        };
        let cwd = vfs.root();
        Self {
            sort: config.listing.sort,
            direction: config.listing.direction,
            vfs,
            cwd,
            config,
            store,
        }
    }

    pub fn vfs(&self) -> &Vfs {
        &self.vfs
    }

    pub fn cwd(&self) -> NodeId {
        self.cwd
    }

    pub fn prompt(&self) -> String {
        render::prompt(&self.vfs, self.cwd)
    }

    /// Applies one parsed action. VFS failures come back as errors and
    /// leave the tree unchanged.
    pub fn handle(&mut self, action: InputAction) -> anyhow::Result<Flow> {
        let text = match action {
            InputAction::Noop => String::new(),
            InputAction::List { path, all } => {
                let id = match path {
                    Some(p) => self.resolve(&p)?,
                    None => self.cwd,
                };
                let show_hidden = all || self.config.listing.show_hidden;
                let children = self.vfs.children(id, show_hidden)?;
                let sorted = sort_nodes(
                    &children,
                    self.sort,
                    self.direction,
                    self.config.listing.folders_first,
                );
                render::listing(&sorted, &self.config.listing.date_format, |n| {
                    self.vfs.is_favorite(n.id())
                })
            }
            InputAction::ChangeDir(p) => {
                let id = self.resolve(&p)?;
                if !self.vfs.get(id).is_some_and(|n| n.is_folder()) {
                    bail!("not a folder: {p}");
                }
                self.cwd = id;
                String::new()
            }
            InputAction::PrintDir => self.vfs.path(self.cwd)?,
            InputAction::Tree(p) => {
                let id = match p {
                    Some(p) => self.resolve(&p)?,
                    None => self.cwd,
                };
                render::tree(&self.vfs, id, self.config.listing.show_hidden)
            }
            InputAction::Show(p) => {
                let id = self.resolve(&p)?;
                self.vfs
                    .get(id)
                    .and_then(|n| n.content())
                    .ok_or_else(|| anyhow!("not a file: {p}"))?
                    .to_string()
            }
            InputAction::Info(p) => {
                let id = self.resolve(&p)?;
                let node = self.vfs.get(id).ok_or_else(|| anyhow!("no such node: {p}"))?;
                render::info(&self.vfs, node, &self.config.listing.date_format)
            }
            InputAction::MakeDir(p) => self.create(NodeKind::Folder, &p, None)?,
            InputAction::Touch(p) => self.create(NodeKind::File, &p, None)?,
            InputAction::Write { path, content } => match self.vfs.resolve_from(self.cwd, &path) {
                Some(id) => self.run(Command::SetContent(id, content))?,
                None => self.create(NodeKind::File, &path, Some(content))?,
            },
            InputAction::Move { source, target } => {
                let command = Command::Move(self.resolve(&source)?, self.resolve(&target)?);
                self.run(command)?
            }
            InputAction::Rename { path, name } => {
                let id = self.resolve(&path)?;
                self.run(Command::Rename(id, name))?
            }
            InputAction::Remove(p) => {
                let id = self.resolve(&p)?;
                self.run(Command::Delete(id))?
            }
            InputAction::Trash => render::trash(
                self.vfs.list_trash(),
                &self.vfs,
                &self.config.listing.date_format,
            ),
            InputAction::Restore(index) => self.run(Command::Restore(index))?,
            InputAction::Purge(index) => self.run(Command::Purge(index))?,
            InputAction::EmptyTrash => self.run(Command::EmptyTrash)?,
            InputAction::Copy(p) => {
                let id = self.resolve(&p)?;
                self.run(Command::Copy(id))?
            }
            InputAction::Cut(p) => {
                let id = self.resolve(&p)?;
                self.run(Command::Cut(id))?
            }
            InputAction::Paste(p) => {
                let target = match p {
                    Some(p) => self.resolve(&p)?,
                    None => self.cwd,
                };
                self.run(Command::Paste(target))?
            }
            InputAction::Clipboard => render::clipboard(self.vfs.clipboard_state(), &self.vfs),
            InputAction::ClearClipboard => self.run(Command::ClearClipboard)?,
            InputAction::Find {
                query,
                hidden,
                content,
            } => {
                let mut options = self.config.search_options();
                options.include_hidden |= hidden;
                options.match_content |= content;
                render::search_results(&self.vfs, &self.vfs.search(&query, options))
            }
            InputAction::Fuzzy(query) => {
                let matches = self
                    .vfs
                    .fuzzy_search(&query, self.config.search_options());
                render::fuzzy_results(&self.vfs, &matches)
            }
            InputAction::Favorite(p) => {
                let id = self.resolve(&p)?;
                self.run(Command::Favorite(id))?
            }
            InputAction::Unfavorite(p) => {
                // orphaned favorites can only be named by id
                let id = match parse_id(&p) {
                    Some(id) => id,
                    None => self.resolve(&p)?,
                };
                self.run(Command::Unfavorite(id))?
            }
            InputAction::Favorites => render::favorites(&self.vfs),
            InputAction::SetHidden(p, hidden) => {
                let (id, flags) = self.flags_of(&p)?;
                self.run(Command::SetFlags(id, NodeFlags { hidden, ..flags }))?
            }
            InputAction::SetReadOnly(p, read_only) => {
                let (id, flags) = self.flags_of(&p)?;
                self.run(Command::SetFlags(id, NodeFlags { read_only, ..flags }))?
            }
            InputAction::Sort(field, direction) => {
                self.sort = field;
                self.direction = direction;
                format!("sorting by {field:?} ({direction:?})").to_lowercase()
            }
            InputAction::Save => {
                self.save()?;
                "snapshot saved".to_string()
            }
            InputAction::Help => HELP.to_string(),
            InputAction::Quit => {
                if self.config.storage.autosave {
                    self.save()?;
                }
                return Ok(Flow::Quit);
            }
        };
        Ok(Flow::Continue(text))
    }

    /// Executes a core command, persists the result when it changed the
    /// tree and renders the event.
    fn run(&mut self, command: Command) -> anyhow::Result<String> {
        let event = self.vfs.execute(command);
        if let Event::OperationFailed { operation, error } = &event {
            bail!("{operation} failed: {error}");
        }
        if self.vfs.get(self.cwd).is_none() {
            self.cwd = self.vfs.root();
        }
        if event.is_persistent_change() && self.config.storage.autosave {
            self.save()?;
        }
        Ok(render::event(&self.vfs, &event))
    }

    fn create(&mut self, kind: NodeKind, path: &str, content: Option<String>) -> anyhow::Result<String> {
        let (parent, name) = self.split_parent(path)?;
        self.run(Command::Create {
            kind,
            name,
            parent,
            content,
        })
    }

    fn save(&self) -> anyhow::Result<()> {
        self.store
            .save(&self.vfs.snapshot())
            .context("failed to save snapshot")
    }

    /// Resolves a path relative to the current folder. `#<id>` names a live
    /// node directly.
    fn resolve(&self, path: &str) -> anyhow::Result<NodeId> {
        if let Some(id) = parse_id(path) {
            return match self.vfs.get(id) {
                Some(_) => Ok(id),
                None => Err(anyhow!("no live node {id}")),
            };
        }
        self.vfs
            .resolve_from(self.cwd, path)
            .ok_or_else(|| anyhow!("no such file or folder: {path}"))
    }

    /// Splits `a/b/name` into the resolved folder `a/b` and `name`. A bare
    /// name lands in the current folder.
    fn split_parent(&self, path: &str) -> anyhow::Result<(NodeId, String)> {
        let trimmed = path.trim_end_matches('/');
        match trimmed.rsplit_once('/') {
            Some(("", name)) => Ok((self.vfs.root(), name.to_string())),
            Some((parent, name)) => Ok((self.resolve(parent)?, name.to_string())),
            None => Ok((self.cwd, trimmed.to_string())),
        }
    }

    fn flags_of(&self, path: &str) -> anyhow::Result<(NodeId, NodeFlags)> {
        let id = self.resolve(path)?;
        let node = self.vfs.get(id).ok_or_else(|| anyhow!("no live node {id}"))?;
        Ok((id, node.flags()))
    }
}

fn parse_id(text: &str) -> Option<NodeId> {
    text.strip_prefix('#')?.parse().ok().map(NodeId::from_raw)
}

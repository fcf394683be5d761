//! Inbox store: captured inputs and their tags

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::model::{Identity, InputWrite, NewUserInput, Tag, UserInput};
use crate::ports::InboxPort;
use crate::validation::{normalize_tag, validate_text};

use super::filter::Query;
use super::optimistic::{Base, OptimisticStore, Projection, Record, StoreState};

impl Record for UserInput {
    fn identity(&self) -> Identity {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboxContext {
    /// Text in the capture box; a create clears it and its rollback restores it
    pub draft: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboxFilter {
    pub query: Query,
    /// Only inputs carrying this tag
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboxView {
    /// Matching inputs, newest first
    pub visible: Vec<UserInput>,
    /// Tags in use, most used first
    pub tags: Vec<Tag>,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboxProjection;

impl Projection for InboxProjection {
    const ENTITY: &'static str = "input";

    type Record = UserInput;
    type Context = InboxContext;
    type Filter = InboxFilter;
    type View = InboxView;

    fn project(base: &Base<Self>, filter: &InboxFilter) -> InboxView {
        let mut visible: Vec<UserInput> = base
            .records
            .iter()
            .filter(|input| filter.query.matches(&input.text))
            .filter(|input| filter.tag.as_deref().map_or(true, |t| input.has_tag(t)))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut tags: Vec<Tag> = base
            .context
            .tags
            .iter()
            .filter(|t| t.usage_count > 0)
            .cloned()
            .collect();
        tags.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.name.cmp(&b.name))
        });

        InboxView {
            visible,
            tags,
            total: base.records.len(),
        }
    }
}

/// Move usage from tag set `old` to `new`, adding pending tags for new names
fn shift_tags(tags: &mut Vec<Tag>, old: &[String], new: &[String], now: DateTime<Utc>) {
    for name in old.iter().filter(|n| !new.contains(n)) {
        if let Some(tag) = tags.iter_mut().find(|t| &t.name == name) {
            tag.usage_count = (tag.usage_count - 1).max(0);
        }
    }
    for name in new.iter().filter(|n| !old.contains(n)) {
        match tags.iter_mut().find(|t| &t.name == name) {
            Some(tag) => tag.usage_count += 1,
            None => tags.push(Tag {
                id: Identity::pending(),
                name: name.clone(),
                usage_count: 1,
                created_at: now,
            }),
        }
    }
}

/// Tags named by `names`, as currently known, sorted by name
fn embed(tags: &[Tag], names: &[String]) -> Vec<Tag> {
    let mut embedded: Vec<Tag> = tags
        .iter()
        .filter(|t| names.contains(&t.name))
        .cloned()
        .collect();
    embedded.sort_by(|a, b| a.name.cmp(&b.name));
    embedded
}

/// Take the tag table from a write and refresh the copies held by inputs
fn adopt_write(base: &mut Base<InboxProjection>, id: Identity, written: &InputWrite) {
    base.context.tags = written.tags.clone();
    base.upsert(id, written.input.clone());
    refresh_embedded(base);
}

fn refresh_embedded(base: &mut Base<InboxProjection>) {
    let tags = &base.context.tags;
    for input in &mut base.records {
        let names = input.tag_names();
        input.tags = embed(tags, &names);
    }
}

/// Normalize, dedupe and validate tag names before anything is applied
fn checked_tags(raw: &[String]) -> Result<Vec<String>> {
    let mut names = Vec::with_capacity(raw.len());
    for tag in raw {
        let name = normalize_tag(tag)?;
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

fn checked_input(text: &str) -> Result<NewUserInput> {
    validate_text(text)?;
    let mut new = NewUserInput::from_text(text);
    new.tags = checked_tags(&new.tags)?;
    Ok(new)
}

pub struct InboxStore<S> {
    store: OptimisticStore<InboxProjection>,
    port: Arc<S>,
}

impl<S: InboxPort> InboxStore<S> {
    pub fn new(port: Arc<S>) -> Self {
        Self {
            store: OptimisticStore::default(),
            port,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState<InboxProjection>> {
        self.store.subscribe()
    }

    pub fn snapshot(&self) -> StoreState<InboxProjection> {
        self.store.snapshot()
    }

    pub async fn load(&self) -> Result<()> {
        let port = Arc::clone(&self.port);
        let draft = self.store.read(|s| s.context().draft.clone());
        self.store
            .load(async move {
                let snapshot = port.load().await?;
                let context = InboxContext {
                    draft,
                    tags: snapshot.tags,
                };
                Ok((snapshot.inputs, context))
            })
            .await
    }

    pub fn set_draft(&self, text: &str) {
        let text = text.to_string();
        self.store.update_context(|c| c.draft = text);
    }

    pub fn set_query(&self, query: &str) {
        let query = Query::new(query);
        self.store.update_filter(|f| f.query = query);
    }

    /// Show only inputs with this tag; `None` shows all
    pub fn set_tag_filter(&self, tag: Option<&str>) -> Result<()> {
        let tag = tag.map(normalize_tag).transpose()?;
        self.store.update_filter(|f| f.tag = tag);
        Ok(())
    }

    /// Create an input from the current draft
    pub async fn submit_draft(&self) -> Result<UserInput> {
        let draft = self.store.read(|s| s.context().draft.clone());
        self.create(&draft).await
    }

    pub async fn create(&self, text: &str) -> Result<UserInput> {
        let new = checked_input(text)?;
        let placeholder = Identity::pending();
        let now = Utc::now();
        let port = Arc::clone(&self.port);

        let written = self
            .store
            .mutate(
                |base| {
                    shift_tags(&mut base.context.tags, &[], &new.tags, now);
                    let input = UserInput {
                        id: placeholder,
                        text: new.text.clone(),
                        created_at: now,
                        updated_at: now,
                        tags: embed(&base.context.tags, &new.tags),
                    };
                    base.records.insert(0, input);
                    base.context.draft.clear();
                    Ok(new)
                },
                move |new| async move { port.create_input(new).await },
                |base, written: &InputWrite| adopt_write(base, placeholder, written),
            )
            .await?;
        Ok(written.input)
    }

    /// Replace the text; tags follow the new text's hashtags
    pub async fn update(&self, id: Identity, text: &str) -> Result<UserInput> {
        let new = checked_input(text)?;
        self.rewrite(id, new).await
    }

    /// Replace the tag set, keeping the text
    pub async fn retag(&self, id: Identity, tags: &[String]) -> Result<UserInput> {
        let tags = checked_tags(tags)?;
        let text = self
            .store
            .read(|s| s.find(id).map(|input| input.text.clone()))
            .ok_or_else(|| Error::not_found("input", id))?;
        self.rewrite(id, NewUserInput { text, tags }).await
    }

    async fn rewrite(&self, id: Identity, new: NewUserInput) -> Result<UserInput> {
        let now = Utc::now();
        let port = Arc::clone(&self.port);

        let written = self
            .store
            .mutate(
                |base| {
                    let row_id = id.require("input")?;
                    let old = base.get(id)?.tag_names();
                    shift_tags(&mut base.context.tags, &old, &new.tags, now);
                    let tags = embed(&base.context.tags, &new.tags);
                    let input = base.get_mut(id)?;
                    input.text = new.text.clone();
                    input.tags = tags;
                    input.updated_at = now;
                    Ok((row_id, new))
                },
                move |(row_id, new)| async move { port.update_input(row_id, new).await },
                |base, written: &InputWrite| adopt_write(base, id, written),
            )
            .await?;
        Ok(written.input)
    }

    pub async fn delete(&self, id: Identity) -> Result<()> {
        let now = Utc::now();
        let port = Arc::clone(&self.port);

        self.store
            .mutate(
                |base| {
                    let row_id = id.require("input")?;
                    let removed = base.remove(id)?;
                    shift_tags(&mut base.context.tags, &removed.tag_names(), &[], now);
                    base.last_deleted = Some(removed);
                    Ok(row_id)
                },
                move |row_id| async move { port.delete_input(row_id).await },
                |base, tags: &Vec<Tag>| {
                    base.context.tags = tags.clone();
                    refresh_embedded(base);
                },
            )
            .await
            .map(|_| ())
    }

    /// Re-insert the input removed by the last delete, with its tags
    pub async fn undo_delete(&self) -> Result<UserInput> {
        let now = Utc::now();
        let port = Arc::clone(&self.port);

        let written = self
            .store
            .mutate(
                |base| {
                    let mut input = base
                        .last_deleted
                        .take()
                        .ok_or_else(|| Error::Other("no deleted input to restore".into()))?;
                    let names = input.tag_names();
                    shift_tags(&mut base.context.tags, &[], &names, now);
                    input.tags = embed(&base.context.tags, &names);
                    base.records.push(input.clone());
                    Ok(input)
                },
                move |input| async move { port.restore_input(input).await },
                // Deleted inputs were persisted, so the id is unchanged
                |base, written: &InputWrite| adopt_write(base, written.input.id, written),
            )
            .await?;
        Ok(written.input)
    }
}

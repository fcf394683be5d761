//! Optimistic mutation engine
//!
//! A store keeps its state in a `watch` channel. Every write runs the same
//! sequence:
//!
//! ```text
//! snapshot base ──▶ apply (sync) ──▶ publish ──▶ persist (await)
//!                                                   │
//!                          ┌────────── Ok ──────────┴────────── Err ──────────┐
//!                          ▼                                                  ▼
//!                 reconcile with the                             restore snapshot, record
//!                 authoritative result                           last_error, return Err
//! ```
//!
//! Derived views are recomputed from scratch on every publish, so a restored
//! snapshot can never leave a stale view behind. Concurrent writes are not
//! serialized: a rollback restores the snapshot taken by the failing write.

use std::fmt::Debug;
use std::future::Future;

use tokio::sync::watch;

use crate::error::{ActionKind, Error, Result, StoreError};
use crate::model::Identity;

/// A record held by a store
pub trait Record: Clone + Debug + PartialEq + Send + Sync + 'static {
    fn identity(&self) -> Identity;
}

/// Binds a record type to the state around it and the view computed from it
pub trait Projection: Clone + Debug + Default + PartialEq + Send + Sync + 'static {
    /// Entity name for errors and log lines
    const ENTITY: &'static str;

    type Record: Record;
    /// Non-record state that writes may also touch (tags, categories, drafts)
    type Context: Clone + Debug + Default + PartialEq + Send + Sync + 'static;
    type Filter: Clone + Debug + Default + PartialEq + Send + Sync + 'static;
    type View: Clone + Debug + Default + PartialEq + Send + Sync + 'static;

    fn project(base: &Base<Self>, filter: &Self::Filter) -> Self::View;
}

/// The slice of state a write may change and a rollback restores
#[derive(Debug, Clone, PartialEq)]
pub struct Base<P: Projection> {
    pub records: Vec<P::Record>,
    pub context: P::Context,
    /// Last record removed by a delete, for one-level undo
    pub last_deleted: Option<P::Record>,
}

// Written by hand so records need not implement `Default`
impl<P: Projection> Default for Base<P> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            context: P::Context::default(),
            last_deleted: None,
        }
    }
}

impl<P: Projection> Base<P> {
    pub fn index_of(&self, id: Identity) -> Result<usize> {
        self.records
            .iter()
            .position(|r| r.identity() == id)
            .ok_or_else(|| Error::not_found(P::ENTITY, id))
    }

    pub fn get(&self, id: Identity) -> Result<&P::Record> {
        let index = self.index_of(id)?;
        Ok(&self.records[index])
    }

    pub fn get_mut(&mut self, id: Identity) -> Result<&mut P::Record> {
        let index = self.index_of(id)?;
        Ok(&mut self.records[index])
    }

    pub fn remove(&mut self, id: Identity) -> Result<P::Record> {
        let index = self.index_of(id)?;
        Ok(self.records.remove(index))
    }

    /// Replace the record with identity `id`, or append `record` if it is gone
    pub fn upsert(&mut self, id: Identity, record: P::Record) {
        match self.records.iter_mut().find(|r| r.identity() == id) {
            Some(slot) => *slot = record,
            None => self.records.push(record),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreState<P: Projection> {
    pub base: Base<P>,
    pub filter: P::Filter,
    pub view: P::View,
    pub is_loading: bool,
    pub last_error: Option<StoreError>,
}

impl<P: Projection> StoreState<P> {
    fn new(filter: P::Filter) -> Self {
        let mut state = Self {
            base: Base::default(),
            filter,
            view: P::View::default(),
            is_loading: false,
            last_error: None,
        };
        state.refresh();
        state
    }

    fn refresh(&mut self) {
        self.view = P::project(&self.base, &self.filter);
    }

    pub fn records(&self) -> &[P::Record] {
        &self.base.records
    }

    pub fn context(&self) -> &P::Context {
        &self.base.context
    }

    pub fn find(&self, id: Identity) -> Option<&P::Record> {
        self.base.records.iter().find(|r| r.identity() == id)
    }
}

pub struct OptimisticStore<P: Projection> {
    state: watch::Sender<StoreState<P>>,
}

impl<P: Projection> Default for OptimisticStore<P> {
    fn default() -> Self {
        Self::new(P::Filter::default())
    }
}

impl<P: Projection> OptimisticStore<P> {
    pub fn new(filter: P::Filter) -> Self {
        let (state, _) = watch::channel(StoreState::new(filter));
        Self { state }
    }

    /// Receiver that sees every published state
    pub fn subscribe(&self) -> watch::Receiver<StoreState<P>> {
        self.state.subscribe()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> StoreState<P> {
        self.state.borrow().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&StoreState<P>) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn update_filter(&self, update: impl FnOnce(&mut P::Filter)) {
        self.state.send_modify(|state| {
            update(&mut state.filter);
            state.refresh();
        });
    }

    /// Change context that is never persisted, such as draft text
    pub fn update_context(&self, update: impl FnOnce(&mut P::Context)) {
        self.state.send_modify(|state| {
            update(&mut state.base.context);
            state.refresh();
        });
    }

    /// Replace records and context with what `fetch` returns
    pub async fn load<F>(&self, fetch: F) -> Result<()>
    where
        F: Future<Output = Result<(Vec<P::Record>, P::Context)>>,
    {
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.last_error = None;
        });

        match fetch.await {
            Ok((records, context)) => {
                let count = records.len();
                self.state.send_modify(|state| {
                    state.base = Base {
                        records,
                        context,
                        last_deleted: None,
                    };
                    state.is_loading = false;
                    state.refresh();
                });
                tracing::debug!("Loaded {} {} records", count, P::ENTITY);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Loading {} records failed: {}", P::ENTITY, err);
                self.state.send_modify(|state| {
                    state.is_loading = false;
                    state.last_error = Some(StoreError::new(ActionKind::Load, &err));
                });
                Err(err)
            }
        }
    }

    /// Run one optimistic write
    ///
    /// `apply` edits the base synchronously and returns what `persist` needs.
    /// If `apply` fails the base is left untouched. If `persist` fails it is
    /// restored to its state before `apply`. On success `reconcile` folds the
    /// authoritative result back in.
    pub async fn mutate<Plan, Out, Fut>(
        &self,
        apply: impl FnOnce(&mut Base<P>) -> Result<Plan>,
        persist: impl FnOnce(Plan) -> Fut,
        reconcile: impl FnOnce(&mut Base<P>, &Out),
    ) -> Result<Out>
    where
        Fut: Future<Output = Result<Out>>,
    {
        let mut applied: Option<Result<(Base<P>, Plan)>> = None;
        self.state.send_modify(|state| {
            let snapshot = state.base.clone();
            match apply(&mut state.base) {
                Ok(plan) => {
                    state.last_error = None;
                    applied = Some(Ok((snapshot, plan)));
                }
                Err(err) => {
                    state.base = snapshot;
                    state.last_error = Some(StoreError::new(ActionKind::Write, &err));
                    applied = Some(Err(err));
                }
            }
            state.refresh();
        });

        let (snapshot, plan) = match applied {
            Some(Ok(applied)) => applied,
            Some(Err(err)) => return Err(err),
            None => return Err(Error::Other(format!("{} write was not applied", P::ENTITY))),
        };

        match persist(plan).await {
            Ok(out) => {
                self.state.send_modify(|state| {
                    reconcile(&mut state.base, &out);
                    state.refresh();
                });
                tracing::debug!("Reconciled {} write", P::ENTITY);
                Ok(out)
            }
            Err(err) => {
                tracing::warn!("Rolling back {} write: {}", P::ENTITY, err);
                self.state.send_modify(|state| {
                    state.base = snapshot;
                    state.last_error = Some(StoreError::new(ActionKind::Write, &err));
                    state.refresh();
                });
                Err(err)
            }
        }
    }

    /// Remove a record and remember it for [`undo_delete`](Self::undo_delete)
    pub async fn delete<Out, Fut>(
        &self,
        id: Identity,
        persist: impl FnOnce(P::Record) -> Fut,
        reconcile: impl FnOnce(&mut Base<P>, &Out),
    ) -> Result<Out>
    where
        Fut: Future<Output = Result<Out>>,
    {
        self.mutate(
            |base| {
                let removed = base.remove(id)?;
                base.last_deleted = Some(removed.clone());
                Ok(removed)
            },
            persist,
            reconcile,
        )
        .await
    }

    /// Put the last deleted record back; `persist` re-inserts it
    pub async fn undo_delete<Fut>(
        &self,
        persist: impl FnOnce(P::Record) -> Fut,
    ) -> Result<P::Record>
    where
        Fut: Future<Output = Result<P::Record>>,
    {
        self.undo_delete_with(|_, _| {}, persist).await
    }

    /// Like [`undo_delete`](Self::undo_delete), letting `place` adjust the
    /// record against the records that are left before it goes back
    pub async fn undo_delete_with<Fut>(
        &self,
        place: impl FnOnce(&Base<P>, &mut P::Record),
        persist: impl FnOnce(P::Record) -> Fut,
    ) -> Result<P::Record>
    where
        Fut: Future<Output = Result<P::Record>>,
    {
        self.mutate(
            |base| {
                let mut record = base
                    .last_deleted
                    .take()
                    .ok_or_else(|| Error::Other(format!("no deleted {} to restore", P::ENTITY)))?;
                place(base, &mut record);
                base.records.push(record.clone());
                Ok(record)
            },
            persist,
            |base, restored: &P::Record| base.upsert(restored.identity(), restored.clone()),
        )
        .await
    }
}

use crate::{Connection, Error, Model, Result, Session};
use futures::future::{self, BoxFuture, FutureExt};
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt::{self, Debug},
    future::Future,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    BeforeQuery,
    AfterQuery,
    BeforeUpdate,
    AfterUpdate,
    BeforeDelete,
    AfterDelete,
    BeforeInsert,
    AfterInsert,
}

/// Lifecycle callbacks of a model, every method defaults to doing nothing.
///
/// Model level points receive only the session. `before_insert` receives the
/// record about to be written and `after_query` each record just read.
/// Returning an error only logs it, call [`Session::abort`] to stop the
/// operation.
pub trait Lifecycle<C: Connection>: Model {
    fn before_query(session: &mut Session<C>) -> impl Future<Output = Result<()>> + Send {
        let _ = session;
        future::ready(Ok(()))
    }

    fn after_query(&mut self, session: &mut Session<C>) -> impl Future<Output = Result<()>> + Send {
        let _ = session;
        future::ready(Ok(()))
    }

    fn before_update(session: &mut Session<C>) -> impl Future<Output = Result<()>> + Send {
        let _ = session;
        future::ready(Ok(()))
    }

    fn after_update(session: &mut Session<C>) -> impl Future<Output = Result<()>> + Send {
        let _ = session;
        future::ready(Ok(()))
    }

    fn before_delete(session: &mut Session<C>) -> impl Future<Output = Result<()>> + Send {
        let _ = session;
        future::ready(Ok(()))
    }

    fn after_delete(session: &mut Session<C>) -> impl Future<Output = Result<()>> + Send {
        let _ = session;
        future::ready(Ok(()))
    }

    fn before_insert(&self, session: &mut Session<C>) -> impl Future<Output = Result<()>> + Send {
        let _ = session;
        future::ready(Ok(()))
    }

    fn after_insert(session: &mut Session<C>) -> impl Future<Output = Result<()>> + Send {
        let _ = session;
        future::ready(Ok(()))
    }
}

/// What a hook is invoked on.
pub enum HookTarget<'a> {
    /// The model bound to the session.
    Model,
    Record(&'a (dyn Any + Send + Sync + 'static)),
    RecordMut(&'a mut (dyn Any + Send + Sync + 'static)),
}

type Dispatch<C> = for<'a> fn(HookPoint, HookTarget<'a>, &'a mut Session<C>) -> BoxFuture<'a, Result<()>>;

/// Lifecycle handlers keyed by model type.
pub struct HookRegistry<C: Connection> {
    hooks: HashMap<TypeId, Dispatch<C>>,
}

impl<C: Connection> HookRegistry<C> {
    pub fn new() -> Self {
        Self {
            hooks: HashMap::new(),
        }
    }

    /// Register the [`Lifecycle`] implementation of `M`, replacing any previous one.
    pub fn register<M: Lifecycle<C>>(&mut self) -> &mut Self {
        log::debug!("Registering hooks of `{}`", std::any::type_name::<M>());
        self.hooks.insert(TypeId::of::<M>(), dispatch::<C, M>);
        self
    }

    pub fn contains(&self, model: TypeId) -> bool {
        self.hooks.contains_key(&model)
    }

    pub(crate) fn get(&self, model: TypeId) -> Option<Dispatch<C>> {
        self.hooks.get(&model).copied()
    }
}

impl<C: Connection> Default for HookRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connection> Clone for HookRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            hooks: self.hooks.clone(),
        }
    }
}

impl<C: Connection> Debug for HookRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("models", &self.hooks.len())
            .finish()
    }
}

fn dispatch<'a, C: Connection, M: Lifecycle<C>>(
    point: HookPoint,
    target: HookTarget<'a>,
    session: &'a mut Session<C>,
) -> BoxFuture<'a, Result<()>> {
    match (point, target) {
        (HookPoint::BeforeQuery, _) => M::before_query(session).boxed(),
        (HookPoint::BeforeUpdate, _) => M::before_update(session).boxed(),
        (HookPoint::AfterUpdate, _) => M::after_update(session).boxed(),
        (HookPoint::BeforeDelete, _) => M::before_delete(session).boxed(),
        (HookPoint::AfterDelete, _) => M::after_delete(session).boxed(),
        (HookPoint::AfterInsert, _) => M::after_insert(session).boxed(),
        (HookPoint::BeforeInsert, HookTarget::Record(record)) => match record.downcast_ref::<M>() {
            Some(record) => record.before_insert(session).boxed(),
            None => future::ready(Err(mismatch::<M>(point))).boxed(),
        },
        (HookPoint::AfterQuery, HookTarget::RecordMut(record)) => match record.downcast_mut::<M>() {
            Some(record) => record.after_query(session).boxed(),
            None => future::ready(Err(mismatch::<M>(point))).boxed(),
        },
        (HookPoint::BeforeInsert | HookPoint::AfterQuery, _) => {
            future::ready(Err(mismatch::<M>(point))).boxed()
        }
    }
}

fn mismatch<M>(point: HookPoint) -> Error {
    Error::msg(format!(
        "Hook {:?} expected a record of type `{}`",
        point,
        std::any::type_name::<M>()
    ))
}

impl<C: Connection> Session<C> {
    /// Invoke the hook of `model` at `point`, when hooks are enabled and one is registered.
    ///
    /// Errors are logged and swallowed.
    pub(crate) async fn call_hook(&mut self, model: TypeId, point: HookPoint, target: HookTarget<'_>) {
        if !self.enable_hook {
            return;
        }
        let Some(dispatch) = self.hooks.get(model) else {
            return;
        };
        if let Err(e) = dispatch(point, target, self).await {
            log::error!("Hook {:?} failed: {:#}", point, e);
        }
    }

    /// Invoke the hook of the bound model.
    pub(crate) async fn call_model_hook(&mut self, point: HookPoint) {
        let Some(model) = self.ref_table.as_ref().map(|v| v.model_type()) else {
            return;
        };
        self.call_hook(model, point, HookTarget::Model).await;
    }
}

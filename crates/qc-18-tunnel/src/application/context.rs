//! # Execution Context
//!
//! Store handle, block header data and event buffer of one operation, plus
//! the cache-then-write primitive that makes a unit of work all-or-nothing.

use crate::adapters::CacheStore;
use crate::domain::Result;
use crate::events::TunnelEvent;
use crate::ports::KvStore;

/// Header data of the block being executed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockInfo {
    /// Block height.
    pub height: u64,
    /// Block time, unix seconds.
    pub time: i64,
    /// App hash of the header.
    pub app_hash: Vec<u8>,
    /// Data hash of the header.
    pub data_hash: Vec<u8>,
}

/// Execution context.
pub struct Context<'a> {
    store: &'a mut dyn KvStore,
    block: BlockInfo,
    events: Vec<TunnelEvent>,
}

impl<'a> Context<'a> {
    /// Context over `store` for the given block.
    pub fn new(store: &'a mut dyn KvStore, block: BlockInfo) -> Self {
        Self {
            store,
            block,
            events: Vec::new(),
        }
    }

    /// Read access to the store.
    pub fn store(&self) -> &dyn KvStore {
        &*self.store
    }

    /// Write access to the store.
    pub fn store_mut(&mut self) -> &mut dyn KvStore {
        &mut *self.store
    }

    /// Current block.
    pub fn block(&self) -> &BlockInfo {
        &self.block
    }

    /// Block time, unix seconds.
    pub fn block_time(&self) -> i64 {
        self.block.time
    }

    /// Buffer an event.
    pub fn emit(&mut self, event: TunnelEvent) {
        self.events.push(event);
    }

    /// Events emitted so far.
    pub fn events(&self) -> &[TunnelEvent] {
        &self.events
    }

    /// Drain the event buffer.
    pub fn take_events(&mut self) -> Vec<TunnelEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Run `f` against a cached child context.
///
/// Writes and events of `f` reach `ctx` only if `f` returns `Ok`; on error
/// they are discarded wholesale and the error is returned.
pub fn apply_if_no_error<T, F>(ctx: &mut Context<'_>, f: F) -> Result<T>
where
    F: FnOnce(&mut Context<'_>) -> Result<T>,
{
    let block = ctx.block.clone();
    let mut cache = CacheStore::new(&mut *ctx.store);

    let (result, events) = {
        let mut child = Context::new(&mut cache, block);
        let result = f(&mut child);
        (result, child.take_events())
    };

    match result {
        Ok(value) => {
            cache.commit();
            ctx.events.extend(events);
            Ok(value)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::domain::TunnelError;

    #[test]
    fn test_apply_commits_on_success() {
        let mut store = MemoryStore::new();
        let mut ctx = Context::new(&mut store, BlockInfo::default());

        let value = apply_if_no_error(&mut ctx, |child| {
            child.store_mut().set(b"k", b"v".to_vec());
            child.emit(TunnelEvent::ParamsUpdated);
            Ok(7)
        })
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(ctx.events(), &[TunnelEvent::ParamsUpdated]);
        assert_eq!(ctx.store().get(b"k"), Some(b"v".to_vec()));
    }

    #[test]
    fn test_apply_discards_on_error() {
        let mut store = MemoryStore::new();
        let mut ctx = Context::new(&mut store, BlockInfo::default());

        let result: Result<()> = apply_if_no_error(&mut ctx, |child| {
            child.store_mut().set(b"k", b"v".to_vec());
            child.emit(TunnelEvent::ParamsUpdated);
            Err(TunnelError::RouteNotReady(1))
        });

        assert_eq!(result, Err(TunnelError::RouteNotReady(1)));
        assert!(ctx.events().is_empty());
        assert!(!ctx.store().has(b"k"));
    }

    #[test]
    fn test_nested_apply_isolates_inner_failure() {
        let mut store = MemoryStore::new();
        let mut ctx = Context::new(&mut store, BlockInfo::default());

        apply_if_no_error(&mut ctx, |outer| {
            outer.store_mut().set(b"outer", vec![1]);
            let inner: Result<()> = apply_if_no_error(outer, |inner| {
                inner.store_mut().set(b"inner", vec![2]);
                Err(TunnelError::Transport("down".into()))
            });
            assert!(inner.is_err());
            Ok(())
        })
        .unwrap();

        assert!(ctx.store().has(b"outer"));
        assert!(!ctx.store().has(b"inner"));
    }
}

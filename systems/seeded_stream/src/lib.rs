#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic seeded substreams standing in for the host's seed context.
//!
//! Every substream is derived from a [`SubcontextKey`] by hashing the seed
//! text together with the host context value, so equal keys always replay
//! the same draws regardless of what was drawn before. Nested subcontexts
//! mix their index into the parent state and borrow the parent mutably,
//! which keeps acquisition strictly nested.

use rand::{seq::index, SeedableRng};
use rand_chacha::ChaCha8Rng;
use seed_scanner_core::{
    NestedStream, SeededStream, Selection, StreamSource, SubcontextKey, UnlockOptions,
    UnlockPackRecord, UnlockRequest,
};
use sha2::{Digest, Sha256};

const NESTED_LABEL: &str = "nested-subcontext";

/// Stateless source of deterministic substreams.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostStreams;

impl HostStreams {
    /// Creates the stream source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl StreamSource for HostStreams {
    type Stream<'a> = ContextStream;

    fn open_subcontext(&self, key: &SubcontextKey) -> Self::Stream<'_> {
        ContextStream::open(key)
    }
}

/// Open subcontext derived from a [`SubcontextKey`].
#[derive(Debug)]
pub struct ContextStream {
    state: u64,
    context_value: i32,
}

impl ContextStream {
    fn open(key: &SubcontextKey) -> Self {
        let state = derive_context_seed(key);
        tracing::trace!(
            seed = key.seed().as_str(),
            context = key.context_value(),
            "acquired subcontext"
        );
        Self {
            state,
            context_value: key.context_value(),
        }
    }
}

impl Drop for ContextStream {
    fn drop(&mut self) {
        tracing::trace!(context = self.context_value, "released subcontext");
    }
}

impl SeededStream for ContextStream {
    type Nested<'a> = NestedContext<'a>;

    fn open_nested(&mut self, index: u32) -> Self::Nested<'_> {
        let seed = derive_nested_seed(self.state, index);
        NestedContext {
            parent: self,
            index,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

/// Nested subcontext held while its parent stays open.
#[derive(Debug)]
pub struct NestedContext<'a> {
    parent: &'a mut ContextStream,
    index: u32,
    rng: ChaCha8Rng,
}

impl Drop for NestedContext<'_> {
    fn drop(&mut self) {
        tracing::trace!(
            context = self.parent.context_value,
            index = self.index,
            "released nested subcontext"
        );
    }
}

impl NestedStream for NestedContext<'_> {
    fn draw_unlock_options(
        &mut self,
        pack: &UnlockPackRecord,
        selection: &Selection,
        request: UnlockRequest,
    ) -> UnlockOptions {
        if !pack.offers_on(request.day()) {
            return UnlockOptions::none();
        }

        let eligible = pack.eligible_unlocks(selection, request);
        let amount = eligible.len().min(2);
        let mut picks = index::sample(&mut self.rng, eligible.len(), amount)
            .into_iter()
            .map(|position| eligible[position]);
        UnlockOptions::new(picks.next(), picks.next())
    }
}

fn derive_context_seed(key: &SubcontextKey) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(key.seed().as_str().as_bytes());
    hasher.update(key.context_value().to_le_bytes());
    finalize_seed(hasher)
}

fn derive_nested_seed(base: u64, index: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(NESTED_LABEL.as_bytes());
    hasher.update(index.to_le_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    u64::from_le_bytes(bytes)
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Gene pool doubles.

use std::sync::Mutex;

use egp_graph::{Candidate, CandidateQuery, GcDigest, GcRef, GenePool, GenePoolError};

/// A pool whose every query times out.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeoutPool;

impl GenePool for TimeoutPool {
    fn find_insertion_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<Candidate>, GenePoolError> {
        Err(GenePoolError::Timeout(query.timeout))
    }

    fn fetch(&self, digest: &GcDigest) -> Result<GcRef, GenePoolError> {
        Err(GenePoolError::NotFound(*digest))
    }
}

/// Wraps a pool and records every query made of it.
#[derive(Debug, Default)]
pub struct RecordingPool<P> {
    inner: P,
    queries: Mutex<Vec<CandidateQuery>>,
}

impl<P> RecordingPool<P> {
    /// Records queries made of `inner`.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queries made so far, oldest first.
    pub fn queries(&self) -> Vec<CandidateQuery> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The wrapped pool.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: GenePool> GenePool for RecordingPool<P> {
    fn find_insertion_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<Candidate>, GenePoolError> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.clone());
        self.inner.find_insertion_candidates(query)
    }

    fn fetch(&self, digest: &GcDigest) -> Result<GcRef, GenePoolError> {
        self.inner.fetch(digest)
    }
}

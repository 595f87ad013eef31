// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Steady-state exception (SSE) repair.
//!
//! An SSE is an unconnected destination end point. The stabilizer repairs one
//! per iteration until the graph validates or the attempt budget runs out.
//! Each repair picks, uniformly at random, one non-empty kind of internal
//! source (an unused source, a new graph input, or a reused source) and then
//! one end point of that kind. Only when no internal source is viable does it
//! go to the gene pool for a graph to splice in above the SSE's row; the SSE
//! is then fed by the spliced graph's first compatible output.

use std::ops::Range;

use egp_types::{Ept, TypeRegistry};
use tracing::{debug, info, instrument, warn};

use crate::config::StabilizerConfig;
use crate::endpoint::EndPointRef;
use crate::error::GraphError;
use crate::gc::{Freeze, GcRef, GeneticCode};
use crate::gene_pool::{CandidateQuery, GenePool, GenePoolError, MatchMode};
use crate::graph_type::{GraphType, RowPresence};
use crate::insertion::{self, graft, restructure, Above, Fetal, InsertOp, Insertion};
use crate::interface::MAX_INTERFACE_ELEMENTS;
use crate::rng::Prng;
use crate::row::{EndPointClass, Row};
use crate::validate::{Validity, Violation};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum SourceKind {
    Unused,
    NewTopLevelInput,
    Reuse,
}

/// Repair attempts shared by a top-level graph and every fetal graph
/// stabilized on its behalf.
#[derive(Debug)]
struct Budget {
    limit: usize,
    used: usize,
}

/// Drives graphs to validity by connecting their unconnected destinations.
pub struct Stabilizer<'a> {
    registry: &'a TypeRegistry,
    pool: &'a dyn GenePool,
    config: StabilizerConfig,
}

impl<'a> Stabilizer<'a> {
    /// A stabilizer matching types against `registry` and sourcing external
    /// graphs from `pool`.
    pub fn new(registry: &'a TypeRegistry, pool: &'a dyn GenePool, config: StabilizerConfig) -> Self {
        Self {
            registry,
            pool,
            config,
        }
    }

    /// The tuning in use.
    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    /// A generator seeded from the configuration.
    pub fn seeded_rng(&self) -> Prng {
        Prng::from_seed_u64(self.config.seed)
    }

    /// Runs `op` and stabilizes the result, the fetal graph first.
    ///
    /// # Errors
    /// Any insertion error, [`GraphError::StabilizationFailed`] when the
    /// budget runs out, or the first non-completeness violation found.
    #[instrument(skip_all, fields(op = %op))]
    pub fn insert(
        &self,
        op: InsertOp,
        tgc: &GcRef,
        igc: &GcRef,
        rng: &mut Prng,
    ) -> Result<GcRef, GraphError> {
        let Insertion { mut rgc, fetal } = insertion::insert(self.registry, op, tgc, igc)?;
        let mut budget = Budget {
            limit: self.config.sse_limit,
            used: 0,
        };
        if let Some(Fetal { row, fgc }) = fetal {
            let fgc = self.stabilize_with(fgc, false, &mut budget, rng)?;
            graft(&mut rgc, row, fgc)?;
        }
        self.stabilize_with(rgc, op == InsertOp::Wrap, &mut budget, rng)
    }

    /// Repairs `gc` until it validates, then freezes it.
    ///
    /// # Errors
    /// [`GraphError::StabilizationFailed`] when the budget runs out, or the
    /// first non-completeness violation found.
    #[instrument(skip_all, fields(graph_type = %gc.graph_type()))]
    pub fn stabilize(&self, gc: GeneticCode, rng: &mut Prng) -> Result<GcRef, GraphError> {
        let mut budget = Budget {
            limit: self.config.sse_limit,
            used: 0,
        };
        self.stabilize_with(gc, false, &mut budget, rng)
    }

    fn stabilize_with(
        &self,
        mut gc: GeneticCode,
        wrapped: bool,
        budget: &mut Budget,
        rng: &mut Prng,
    ) -> Result<GcRef, GraphError> {
        loop {
            match gc.validate(self.registry) {
                Validity::Valid => {
                    let frozen = gc.freeze();
                    info!(digest = %frozen.digest(), attempts = budget.used, "stabilized");
                    return Ok(frozen);
                }
                Validity::Invalid(Violation::Incomplete { row, index, .. }) => {
                    if budget.used >= budget.limit {
                        return Err(exhausted(&gc, budget));
                    }
                    budget.used += 1;
                    gc = self.repair(gc, EndPointRef::new(row, index), wrapped, budget, rng)?;
                }
                Validity::Invalid(violation) => return Err(violation.into_error()),
            }
        }
    }

    fn repair(
        &self,
        mut gc: GeneticCode,
        dst: EndPointRef,
        wrapped: bool,
        budget: &mut Budget,
        rng: &mut Prng,
    ) -> Result<GeneticCode, GraphError> {
        let graph = gc.graph();
        let dst_ept = graph
            .ept(dst.row, EndPointClass::Dst, dst.index)
            .cloned()
            .ok_or(GraphError::EndpointOutOfRange {
                index: dst.index,
                len: graph.interface(dst.row, EndPointClass::Dst).map_or(0, |i| i.len()),
            })?;

        let (unused, reuse) = self.internal_sources(&gc, dst, &dst_ept);
        let mut kinds = Vec::with_capacity(3);
        if !unused.is_empty() {
            kinds.push(SourceKind::Unused);
        }
        if !wrapped && self.admits_new_input(&gc, dst, &dst_ept) {
            kinds.push(SourceKind::NewTopLevelInput);
        }
        if !reuse.is_empty() {
            kinds.push(SourceKind::Reuse);
        }

        let kind = rng.choose(&kinds).copied();
        let src = match kind {
            Some(SourceKind::Unused) => rng.choose(&unused).copied(),
            Some(SourceKind::Reuse) => rng.choose(&reuse).copied(),
            Some(SourceKind::NewTopLevelInput) => {
                let index = gc
                    .graph_mut()
                    .insert_endpoint(Row::I, EndPointClass::Src, dst_ept.clone())?;
                Some(EndPointRef::new(Row::I, index))
            }
            None => None,
        };
        match src {
            Some(src) => {
                debug!(%src, %dst, ?kind, "connected");
                gc.graph_mut().connect(src, dst)?;
                Ok(gc)
            }
            None => self.external(gc, dst, &dst_ept, budget, rng),
        }
    }

    /// Viable existing sources, split into unused and reusable.
    fn internal_sources(
        &self,
        gc: &GeneticCode,
        dst: EndPointRef,
        dst_ept: &Ept,
    ) -> (Vec<EndPointRef>, Vec<EndPointRef>) {
        let graph = gc.graph();
        let (mut unused, mut reuse) = (Vec::new(), Vec::new());
        for &row in gc.graph_type().connectivity().legal_sources(dst.row) {
            let count = graph.interface(row, EndPointClass::Src).map_or(0, |i| i.len());
            for index in 0..count {
                let src = EndPointRef::new(row, index);
                let Some(src_ept) = graph.source_ept(self.registry, src) else {
                    continue;
                };
                if !self.registry.is_compatible(&src_ept, dst_ept)
                    || !graph.admits_fixed(self.registry, dst, &src_ept)
                {
                    continue;
                }
                match graph.fan_out(src) {
                    0 => unused.push(src),
                    n if n < self.config.max_fan_out => reuse.push(src),
                    _ => {}
                }
            }
        }
        (unused, reuse)
    }

    fn admits_new_input(&self, gc: &GeneticCode, dst: EndPointRef, dst_ept: &Ept) -> bool {
        let graph_type = gc.graph_type();
        graph_type.connectivity().is_legal(Row::I, dst.row)
            && graph_type.presence(Row::I) != RowPresence::Forbidden
            && !dst_ept.has_wildcard()
            && gc.inputs().total_elements() + dst_ept.len() <= MAX_INTERFACE_ELEMENTS
    }

    fn external(
        &self,
        gc: GeneticCode,
        dst: EndPointRef,
        dst_ept: &Ept,
        budget: &mut Budget,
        rng: &mut Prng,
    ) -> Result<GeneticCode, GraphError> {
        let above = Above::for_row(dst.row).filter(|_| gc.graph_type() == GraphType::Standard);
        let Some(above) = above else {
            debug!(%dst, graph_type = %gc.graph_type(), "external sourcing not applicable");
            return Err(exhausted(&gc, budget));
        };
        let scope = rng.next_in(1, u32::from(self.config.max_search_scope.max(1))) as u8;
        let mode = if rng.next_bool() {
            MatchMode::Exact
        } else {
            MatchMode::Compatible
        };
        let query = CandidateQuery {
            output: dst_ept.clone(),
            mode,
            scope,
            timeout: self.config.external_timeout(),
        };
        let mut candidates = match self.pool.find_insertion_candidates(&query) {
            Ok(candidates) => candidates,
            Err(GenePoolError::Timeout(after)) => {
                warn!(%dst, ?after, "gene pool timed out");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        candidates.retain(|c| c.graph_type != GraphType::Empty);
        candidates.sort_by(|a, b| {
            a.proximity
                .cmp(&b.proximity)
                .then_with(|| b.abundance.cmp(&a.abundance))
                .then_with(|| a.digest.cmp(&b.digest))
        });
        candidates.truncate(self.config.candidate_limit);
        let Some(pick) = rng.choose(&candidates).copied() else {
            debug!(%dst, scope, ?mode, "no external candidates");
            return Ok(gc);
        };
        let igc = self.pool.fetch(&pick.digest)?;
        debug!(%dst, igc = %pick.digest, ?above, "external insertion");
        let displaced = gc.sub_gc(above.replaced_row()).map_or(0, |g| g.outputs().len());
        let inserted = igc.outputs().len();
        let Insertion { mut rgc, fetal } = restructure(self.registry, &gc, &igc, above)?;
        let Some(Fetal { row, mut fgc }) = fetal else {
            return Ok(rgc);
        };
        if above == Above::O {
            // The insert's outputs follow the displaced row's in the resultant.
            self.feed(&mut rgc, Row::B, displaced..displaced + inserted, dst, dst_ept)?;
        } else {
            // The displaced sub-GC runs second inside the fetal graph.
            let fetal_dst = EndPointRef::new(Row::B, dst.index);
            self.feed(&mut fgc, Row::A, 0..inserted, fetal_dst, dst_ept)?;
        }
        let fgc = self.stabilize_with(fgc, false, budget, rng)?;
        graft(&mut rgc, row, fgc)?;
        Ok(rgc)
    }

    /// Connects `dst` to the first source of `row` in `indices` it accepts.
    fn feed(
        &self,
        gc: &mut GeneticCode,
        row: Row,
        indices: Range<usize>,
        dst: EndPointRef,
        dst_ept: &Ept,
    ) -> Result<(), GraphError> {
        let graph = gc.graph();
        let src = indices.map(|index| EndPointRef::new(row, index)).find(|&src| {
            graph.source_ept(self.registry, src).is_some_and(|ept| {
                self.registry.is_compatible(&ept, dst_ept)
                    && graph.admits_fixed(self.registry, dst, &ept)
            })
        });
        match src {
            Some(src) => {
                debug!(%src, %dst, "fed by insertion");
                gc.graph_mut().connect(src, dst)?;
                Ok(())
            }
            None => {
                debug!(%dst, "insertion has no compatible output");
                Ok(())
            }
        }
    }
}

fn exhausted(gc: &GeneticCode, budget: &Budget) -> GraphError {
    let remaining = gc.graph().unconnected().len();
    info!(remaining, attempts = budget.used, "stabilization failed");
    GraphError::StabilizationFailed {
        remaining,
        attempts: budget.used,
    }
}

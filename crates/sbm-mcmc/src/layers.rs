use log::debug;
use sbm_core::errors::{ErrorInfo, SbmError};
use sbm_core::rng::RngHandle;
use sbm_core::{Block, GraphView, Vertex};

use crate::block_state::{BlockState, EntropyArgs, EntropyBreakdown};
use crate::engine::{metropolis_accept, shuffled_vertices, StepOutcome, SweepOutcome};
use crate::proposal::MoveProposer;

/// Several edge layers over one vertex set sharing a single partition.
///
/// Each layer keeps its own block edge counts and degree statistics. The
/// partition prior is paid once, on the first layer; the adjacency, edge
/// count and degree terms are summed over layers.
#[derive(Debug, Clone)]
pub struct LayeredBlockState<G: GraphView> {
    layers: Vec<BlockState<G>>,
}

impl<G: GraphView> LayeredBlockState<G> {
    /// Builds one state per layer graph with assignment `b`.
    pub fn new(
        graphs: Vec<G>,
        b: Vec<Block>,
        deg_corr: bool,
        args: EntropyArgs,
    ) -> Result<Self, SbmError> {
        if graphs.is_empty() {
            return Err(SbmError::Graph(ErrorInfo::new(
                "no-layers",
                "a layered state needs at least one layer",
            )));
        }
        let n = graphs[0].num_vertices();
        if let Some(i) = graphs.iter().position(|g| g.num_vertices() != n) {
            return Err(SbmError::Graph(
                ErrorInfo::new("layer-size-mismatch", "layers disagree on the vertex count")
                    .with_context("layer", i.to_string())
                    .with_context("expected", n.to_string())
                    .with_context("found", graphs[i].num_vertices().to_string()),
            ));
        }
        let mut layers = Vec::with_capacity(graphs.len());
        for (i, graph) in graphs.into_iter().enumerate() {
            let mut layer_args = args;
            layer_args.partition_dl = args.partition_dl && i == 0;
            layers.push(BlockState::new(graph, b.clone(), deg_corr, layer_args)?);
        }
        Ok(Self { layers })
    }

    /// Replaces the move proposer on every layer.
    pub fn with_proposer(self, proposer: MoveProposer) -> Self {
        Self {
            layers: self
                .layers
                .into_iter()
                .map(|layer| layer.with_proposer(proposer))
                .collect(),
        }
    }

    /// Number of layers.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// State of layer `i`.
    pub fn layer(&self, i: usize) -> &BlockState<G> {
        &self.layers[i]
    }

    /// Shared assignment.
    pub fn assignment(&self) -> &[Block] {
        self.layers[0].assignment()
    }

    /// Block of `v`.
    pub fn block_of(&self, v: Vertex) -> Block {
        self.layers[0].block_of(v)
    }

    /// Number of occupied blocks.
    pub fn num_blocks(&self) -> usize {
        self.layers[0].num_blocks()
    }

    /// Term-wise sum of the layer breakdowns.
    pub fn entropy_breakdown(&self) -> EntropyBreakdown {
        let mut sum = EntropyBreakdown {
            adjacency: 0.0,
            partition: 0.0,
            edges: 0.0,
            degrees: 0.0,
            total: 0.0,
        };
        for layer in &self.layers {
            let part = layer.entropy_breakdown();
            sum.adjacency += part.adjacency;
            sum.partition += part.partition;
            sum.edges += part.edges;
            sum.degrees += part.degrees;
            sum.total += part.total;
        }
        sum
    }

    /// Total description length.
    pub fn total_dl(&self) -> f64 {
        self.layers.iter().map(BlockState::total_dl).sum()
    }

    /// Change of the total description length if `v` moved to `nr`.
    pub fn virtual_move_dl(&self, v: Vertex, nr: Block) -> f64 {
        self.layers
            .iter()
            .map(|layer| layer.virtual_move_dl(v, nr))
            .sum()
    }

    /// Moves `v` to `nr` on every layer.
    pub fn move_vertex(&mut self, v: Vertex, nr: Block) {
        for layer in &mut self.layers {
            layer.move_vertex(v, nr);
        }
    }

    /// Metropolis–Hastings step for `v`. Targets and proposal probabilities
    /// follow the first layer's adjacency.
    pub fn step_vertex(&mut self, v: Vertex, beta: f64, rng: &mut RngHandle) -> StepOutcome {
        let head = &self.layers[0];
        let r = head.block_of(v);
        let nr = head.propose_move(v, rng);
        let mut outcome = StepOutcome {
            vertex: v,
            from: r,
            to: nr,
            accepted: false,
            delta: 0.0,
        };
        if nr == r {
            return outcome;
        }
        let proposer = *head.proposer();
        let forward = proposer.log_prob(head, v, r, nr);
        let reverse = proposer.log_prob(head, v, nr, r);
        let ds = self.virtual_move_dl(v, nr);
        if metropolis_accept(-beta * ds + reverse - forward, rng) {
            self.move_vertex(v, nr);
            outcome.accepted = true;
            outcome.delta = ds;
        }
        outcome
    }

    /// Runs `sweeps` passes over all vertices in random order.
    pub fn sweep(&mut self, sweeps: usize, beta: f64, rng: &mut RngHandle) -> SweepOutcome {
        let mut total = SweepOutcome::default();
        for _ in 0..sweeps {
            let mut outcome = SweepOutcome::default();
            for v in shuffled_vertices(self.layers[0].graph(), rng) {
                outcome.record(&self.step_vertex(v, beta, rng));
            }
            debug!(
                "layered sweep: accepted {}/{} dS={:.4} B={}",
                outcome.accepted,
                outcome.attempted,
                outcome.delta,
                self.num_blocks()
            );
            total.merge(&outcome);
        }
        total
    }
}

//! Effect-chain controller and block processor.
//!
//! [`EffectChain`] owns everything a running chain needs: the compiled
//! graph, one runtime per non-structural node, per-node output and
//! band-split buffers, the shared mix scratch, and the crossover instances
//! backing `split-freq` nodes.
//!
//! # Reload semantics
//!
//! [`load_graph`](EffectChain::load_graph) synchronizes runtimes
//! incrementally: a node keeps its runtime instance (and therefore its
//! continuous DSP state) across reloads as long as its `(id, type)` pair is
//! unchanged; a type change constructs a fresh instance; removal evicts.
//! Unknown effect types are recovered locally - the node stays in the graph
//! as a passthrough. A configure failure aborts the load and leaves the
//! previously installed graph running.
//!
//! # Block traversal
//!
//! [`process`](EffectChain::process) walks the topological order once per
//! block. For each node it mixes the main parents into the node's output
//! buffer (mean of two or more parents), routes `split-freq` output through
//! the node's low/high band buffers, builds the port-1 sidechain mix for
//! sidechain-aware nodes (self-keyed when no sidechain parent exists), and
//! finally copies the output terminator's buffer back into the caller's
//! block. Buffers grow on demand and are length-sliced to the current
//! block, so a steady block size processes with zero allocations.

use std::collections::HashMap;
use std::mem;

use cadena_core::{Context, LinkwitzRiley, NodeRuntime, sanitize};
use cadena_registry::Registry;
use tracing::{debug, warn};

use crate::compile::{self, CompiledGraph, INPUT_ID, OUTPUT_ID, is_sidechain_aware, is_structural};
use crate::error::GraphError;

/// Linkwitz-Riley order used by `split-freq` nodes.
const SPLIT_FREQ_ORDER: usize = 4;

/// Crossover rebuild threshold for cutoff drift, in Hz.
const SPLIT_FREQ_EPSILON: f64 = 1e-9;

/// Which buffer of the source node an edge reads.
#[derive(Debug, Clone, Copy)]
enum SourceTap {
    /// The node's main output buffer.
    Out,
    /// A band splitter's low band (port 0).
    SplitLow,
    /// A band splitter's high band (port 1).
    SplitHigh,
}

/// A resolved parent connection: source arena index + buffer tap.
#[derive(Debug, Clone, Copy)]
struct ExecEdge {
    source: usize,
    tap: SourceTap,
}

/// Node role in the traversal.
#[derive(Debug, Clone, Copy)]
enum ExecKind {
    /// The `_input` terminator; its buffer receives the caller's block.
    Input,
    /// The `_output` terminator; its mixed input becomes the chain output.
    Output,
    /// `split` / `sum`: pure routing, the mixed input passes through.
    Routing,
    /// `split-freq` with its cutoff resolved and clamped.
    SplitFreq {
        /// Clamped crossover frequency in Hz.
        freq_hz: f64,
    },
    /// An effect node, structural sidechain awareness resolved.
    Effect {
        /// Port-1 parents form the sidechain set for this type.
        sidechain_aware: bool,
    },
}

/// One node of the execution arena, in topological position.
#[derive(Debug)]
struct ExecNode {
    id: String,
    kind: ExecKind,
    bypassed: bool,
    main: Vec<ExecEdge>,
    side: Vec<ExecEdge>,
}

/// Per-node audio buffers, grown on demand and never shrunk.
#[derive(Debug, Default)]
struct NodeBuffers {
    out: Vec<f64>,
    split_low: Vec<f64>,
    split_high: Vec<f64>,
}

/// A loaded, runnable effect chain.
pub struct EffectChain {
    ctx: Context,
    registry: Registry,
    graph: Option<CompiledGraph>,
    /// Runtime per non-structural node id, with the type it was built for.
    runtimes: HashMap<String, (String, NodeRuntime)>,
    /// Crossover state per `split-freq` node id.
    crossovers: HashMap<String, LinkwitzRiley>,
    exec: Vec<ExecNode>,
    buffers: Vec<NodeBuffers>,
    scratch: Vec<f64>,
    side_scratch: Vec<f64>,
    input_index: usize,
    output_index: usize,
}

impl EffectChain {
    /// Create a chain with the given audio environment and effect registry.
    pub fn new(ctx: Context, registry: Registry) -> Self {
        Self {
            ctx,
            registry,
            graph: None,
            runtimes: HashMap::new(),
            crossovers: HashMap::new(),
            exec: Vec::new(),
            buffers: Vec::new(),
            scratch: Vec::new(),
            side_scratch: Vec::new(),
            input_index: 0,
            output_index: 0,
        }
    }

    /// Replace the audio environment. Takes effect at the next
    /// [`load_graph`](Self::load_graph).
    pub fn set_context(&mut self, ctx: Context) {
        self.ctx = ctx;
    }

    /// Current audio environment.
    pub fn context(&self) -> Context {
        self.ctx
    }

    /// The registry this chain resolves effect types against.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Parse and install a graph document.
    ///
    /// An empty document clears the graph without error (runtimes may
    /// linger until the next non-empty load). On any error the previously
    /// installed graph stays in place.
    pub fn load_graph(&mut self, raw: &str) -> Result<(), GraphError> {
        let compiled = compile::compile(raw)?;
        if compiled.is_empty() {
            debug!("installing empty graph");
            self.graph = None;
            self.exec.clear();
            self.buffers.clear();
            return Ok(());
        }

        // Synchronize runtimes: create for new ids and type changes.
        for id in &compiled.order {
            let params = &compiled.nodes[id];
            if is_structural(&params.effect_type) {
                continue;
            }
            let needs_new = match self.runtimes.get(id) {
                Some((existing_type, _)) => existing_type != &params.effect_type,
                None => true,
            };
            if !needs_new {
                continue;
            }
            match self.registry.lookup(&params.effect_type) {
                Some(factory) => {
                    let runtime = factory(&self.ctx).map_err(|source| {
                        GraphError::ConfigureFailed {
                            id: id.clone(),
                            source,
                        }
                    })?;
                    debug!(id = %id, effect_type = %params.effect_type, "created runtime");
                    self.runtimes
                        .insert(id.clone(), (params.effect_type.clone(), runtime));
                }
                None => {
                    // Recovered locally: the node exists structurally and
                    // passes audio through unchanged.
                    warn!(
                        id = %id,
                        effect_type = %params.effect_type,
                        "unknown effect type; node passes through"
                    );
                    self.runtimes.remove(id);
                }
            }
        }

        // Configure every live runtime; the first failure aborts the load.
        for id in &compiled.order {
            let params = &compiled.nodes[id];
            if is_structural(&params.effect_type) {
                continue;
            }
            if let Some((_, runtime)) = self.runtimes.get_mut(id) {
                runtime
                    .configure(&self.ctx, params)
                    .map_err(|source| GraphError::ConfigureFailed {
                        id: id.clone(),
                        source,
                    })?;
            }
        }

        // Evict state for nodes that left the graph.
        self.runtimes.retain(|id, _| compiled.nodes.contains_key(id));
        self.crossovers.retain(|id, _| {
            compiled
                .nodes
                .get(id)
                .is_some_and(|n| n.effect_type == "split-freq")
        });

        self.build_exec(&compiled);
        self.graph = Some(compiled);
        Ok(())
    }

    /// Drop the graph, all runtimes, buffers, and crossovers.
    pub fn reset(&mut self) {
        self.graph = None;
        self.runtimes.clear();
        self.crossovers.clear();
        self.exec.clear();
        self.buffers.clear();
        self.scratch.clear();
        self.side_scratch.clear();
    }

    /// True when a graph with both terminators is installed.
    pub fn has_graph(&self) -> bool {
        self.graph.is_some()
    }

    /// The installed runtime for a node, for inspection.
    pub fn node_runtime(&self, id: &str) -> Option<&NodeRuntime> {
        self.runtimes.get(id).map(|(_, runtime)| runtime)
    }

    /// Resolve the execution arena from a compiled graph.
    fn build_exec(&mut self, compiled: &CompiledGraph) {
        let index: HashMap<&str, usize> = compiled
            .order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let nyquist = self.ctx.nyquist();
        self.exec = compiled
            .order
            .iter()
            .map(|id| {
                let params = &compiled.nodes[id];
                let effect_type = params.effect_type.as_str();
                let kind = match effect_type {
                    "_input" => ExecKind::Input,
                    "_output" => ExecKind::Output,
                    "split" | "sum" => ExecKind::Routing,
                    "split-freq" => ExecKind::SplitFreq {
                        freq_hz: params.number("freqHz", 1200.0).clamp(20.0, 0.95 * nyquist),
                    },
                    _ => ExecKind::Effect {
                        sidechain_aware: is_sidechain_aware(effect_type),
                    },
                };
                let sidechain_aware =
                    matches!(kind, ExecKind::Effect { sidechain_aware: true });

                let mut main = Vec::new();
                let mut side = Vec::new();
                for edge in compiled.parents(id) {
                    let tap = if compiled.nodes[&edge.from].effect_type == "split-freq" {
                        if edge.from_port == 1 {
                            SourceTap::SplitHigh
                        } else {
                            SourceTap::SplitLow
                        }
                    } else {
                        SourceTap::Out
                    };
                    let exec_edge = ExecEdge {
                        source: index[edge.from.as_str()],
                        tap,
                    };
                    if sidechain_aware && edge.to_port == 1 {
                        side.push(exec_edge);
                    } else {
                        main.push(exec_edge);
                    }
                }

                ExecNode {
                    id: id.clone(),
                    kind,
                    bypassed: params.bypassed,
                    main,
                    side,
                }
            })
            .collect();

        self.input_index = index[INPUT_ID];
        self.output_index = index[OUTPUT_ID];
        self.buffers = (0..self.exec.len()).map(|_| NodeBuffers::default()).collect();
    }

    /// The buffer an edge reads from.
    #[inline]
    fn tap<'a>(buffers: &'a [NodeBuffers], edge: &ExecEdge) -> &'a [f64] {
        let node = &buffers[edge.source];
        match edge.tap {
            SourceTap::Out => &node.out,
            SourceTap::SplitLow => &node.split_low,
            SourceTap::SplitHigh => &node.split_high,
        }
    }

    /// Mix a parent set into `dst` per the mixing rule: zero for no
    /// parents, copy for one, arithmetic mean for two or more. Non-finite
    /// source samples are zeroed at this ingress.
    fn mix_edges(buffers: &[NodeBuffers], edges: &[ExecEdge], dst: &mut [f64], scratch: &mut [f64]) {
        let n = dst.len();
        match edges.len() {
            0 => dst.fill(0.0),
            1 => {
                let src = Self::tap(buffers, &edges[0]);
                for i in 0..n {
                    dst[i] = sanitize(src[i]);
                }
            }
            count => {
                scratch[..n].fill(0.0);
                for edge in edges {
                    let src = Self::tap(buffers, edge);
                    for i in 0..n {
                        scratch[i] += sanitize(src[i]);
                    }
                }
                let inv = 1.0 / count as f64;
                for i in 0..n {
                    dst[i] = scratch[i] * inv;
                }
            }
        }
    }

    /// Process one block in place.
    ///
    /// Returns `true` for an empty block, `false` when no valid graph is
    /// installed, and `true` after a complete traversal. Never propagates
    /// errors mid-block.
    pub fn process(&mut self, block: &mut [f64]) -> bool {
        if block.is_empty() {
            return true;
        }
        if self.graph.is_none() || self.exec.is_empty() {
            return false;
        }
        let n = block.len();

        // Grow buffers to the block length; existing capacity is reused.
        for buffers in self.buffers.iter_mut() {
            if buffers.out.len() < n {
                buffers.out.resize(n, 0.0);
            }
            if buffers.split_low.len() < n {
                buffers.split_low.resize(n, 0.0);
            }
            if buffers.split_high.len() < n {
                buffers.split_high.resize(n, 0.0);
            }
        }
        if self.scratch.len() < n {
            self.scratch.resize(n, 0.0);
        }
        if self.side_scratch.len() < n {
            self.side_scratch.resize(n, 0.0);
        }

        // Ingress: the input terminator's buffer carries the caller's block.
        self.buffers[self.input_index].out[..n].copy_from_slice(block);

        for v in 0..self.exec.len() {
            if v == self.input_index {
                continue;
            }

            // Take the destination out of the arena so sources can be read
            // while it is written.
            let mut dst = mem::take(&mut self.buffers[v].out);
            Self::mix_edges(
                &self.buffers,
                &self.exec[v].main,
                &mut dst[..n],
                &mut self.scratch[..n],
            );

            match self.exec[v].kind {
                ExecKind::SplitFreq { freq_hz } => {
                    self.run_split_freq(v, freq_hz, &dst, n);
                }
                ExecKind::Input | ExecKind::Output | ExecKind::Routing => {
                    // The mixed input is the node's output.
                }
                ExecKind::Effect { sidechain_aware } => {
                    if !self.exec[v].bypassed {
                        if let Some((_, runtime)) = self.runtimes.get_mut(&self.exec[v].id) {
                            if sidechain_aware && runtime.is_sidechain() {
                                if self.exec[v].side.is_empty() {
                                    // Self-keyed: the node's own input is
                                    // the detector signal.
                                    self.side_scratch[..n].copy_from_slice(&dst[..n]);
                                } else {
                                    Self::mix_edges(
                                        &self.buffers,
                                        &self.exec[v].side,
                                        &mut self.side_scratch[..n],
                                        &mut self.scratch[..n],
                                    );
                                }
                                if let NodeRuntime::Sidechain(rt) = runtime {
                                    rt.process_with_sidechain(
                                        &mut dst[..n],
                                        &self.side_scratch[..n],
                                    );
                                }
                            } else {
                                runtime.process(&mut dst[..n]);
                            }
                        }
                    }
                }
            }

            self.buffers[v].out = dst;
        }

        block.copy_from_slice(&self.buffers[self.output_index].out[..n]);
        true
    }

    /// Run a `split-freq` node: maintain its crossover and fill the band
    /// buffers. On a crossover build failure both bands carry the input.
    fn run_split_freq(&mut self, v: usize, freq_hz: f64, input: &[f64], n: usize) {
        let id = &self.exec[v].id;
        let sample_rate = self.ctx.sample_rate();

        let rebuild = match self.crossovers.get(id) {
            Some(crossover) => {
                (crossover.frequency() - freq_hz).abs() > SPLIT_FREQ_EPSILON
                    || (crossover.sample_rate() - sample_rate).abs() > f64::EPSILON
            }
            None => true,
        };
        if rebuild {
            match LinkwitzRiley::new(sample_rate, freq_hz, SPLIT_FREQ_ORDER) {
                Ok(crossover) => {
                    self.crossovers.insert(id.clone(), crossover);
                }
                Err(err) => {
                    warn!(id = %id, freq_hz, %err, "crossover build failed; bands fall back to passthrough");
                    self.crossovers.remove(id);
                }
            }
        }

        let mut low = mem::take(&mut self.buffers[v].split_low);
        let mut high = mem::take(&mut self.buffers[v].split_high);
        let split_ok = self
            .crossovers
            .get_mut(id)
            .is_some_and(|xo| xo.process_block(&input[..n], &mut low[..n], &mut high[..n]).is_ok());
        if !split_ok {
            low[..n].copy_from_slice(&input[..n]);
            high[..n].copy_from_slice(&input[..n]);
        }
        self.buffers[v].split_low = low;
        self.buffers[v].split_high = high;
    }
}

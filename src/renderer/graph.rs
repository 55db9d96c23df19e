//! Explicit stage graph: each stage declares the frame resources it reads and
//! writes, and the graph validates the wiring and fixes an execution order
//! once, at initialization.

use std::collections::{BTreeSet, HashMap};

use crate::renderer::error::GraphError;

/// Inter-stage resource. Indices are light slots (sun first).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameResource {
    ShadowMap(usize),
    Irradiance(usize),
    GBuffer,
    Backbuffer,
}

/// Declared inputs and outputs of a stage.
pub trait StageNode {
    fn label(&self) -> &'static str;
    fn reads(&self) -> Vec<FrameResource>;
    fn writes(&self) -> Vec<FrameResource>;
}

impl<T: StageNode + ?Sized> StageNode for Box<T> {
    fn label(&self) -> &'static str {
        (**self).label()
    }

    fn reads(&self) -> Vec<FrameResource> {
        (**self).reads()
    }

    fn writes(&self) -> Vec<FrameResource> {
        (**self).writes()
    }
}

/// Validated stages in dependency order.
pub struct FrameGraph<N> {
    nodes: Vec<N>,
    order: Vec<usize>,
}

impl<N: StageNode> FrameGraph<N> {
    /// Checks single-writer and producer rules, then orders stages so every
    /// writer runs before its readers. Ties keep insertion order.
    pub fn compile(nodes: Vec<N>) -> Result<Self, GraphError> {
        let mut writers: HashMap<FrameResource, usize> = HashMap::new();
        for (index, node) in nodes.iter().enumerate() {
            for resource in node.writes() {
                if let Some(&first) = writers.get(&resource) {
                    if first != index {
                        return Err(GraphError::MultipleWriters {
                            resource,
                            first: nodes[first].label(),
                            second: node.label(),
                        });
                    }
                }
                writers.insert(resource, index);
            }
        }

        let mut successors: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); nodes.len()];
        let mut in_degree = vec![0usize; nodes.len()];
        for (index, node) in nodes.iter().enumerate() {
            for resource in node.reads() {
                match writers.get(&resource) {
                    Some(&writer) if writer == index => {
                        return Err(GraphError::ReadsOwnOutput {
                            stage: node.label(),
                            resource,
                        });
                    }
                    Some(&writer) => {
                        if successors[writer].insert(index) {
                            in_degree[index] += 1;
                        }
                    }
                    None => {
                        return Err(GraphError::MissingProducer {
                            stage: node.label(),
                            resource,
                        });
                    }
                }
            }
        }

        let mut ready: BTreeSet<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(nodes.len());
        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &succ in &successors[next] {
                in_degree[succ] -= 1;
                if in_degree[succ] == 0 {
                    ready.insert(succ);
                }
            }
        }

        if order.len() != nodes.len() {
            let stuck = (0..nodes.len())
                .filter(|i| !order.contains(i))
                .map(|i| nodes[i].label())
                .collect();
            return Err(GraphError::Cycle(stuck));
        }

        log::debug!(
            "Stage order: {:?}",
            order.iter().map(|&i| nodes[i].label()).collect::<Vec<_>>()
        );

        Ok(Self { nodes, order })
    }

    /// Stages in execution order.
    pub fn ordered(&self) -> impl Iterator<Item = &N> {
        self.order.iter().map(move |&i| &self.nodes[i])
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.ordered().map(|node| node.label()).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

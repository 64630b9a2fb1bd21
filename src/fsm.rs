//! A generic automaton with failure links, shared by HSP seeding (spec
//! §4.5) and the PCR primer simulator (spec §4.7). Payloads attached at
//! insertion propagate along failure links at `compile()` time so a single
//! traversal reports every pattern ending at each position, including
//! suffix matches reached only via a failure link (classic Aho-Corasick).

use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

struct Node<P> {
    children: HashMap<u8, NodeId>,
    fail: NodeId,
    payloads: Vec<P>,
}

const ROOT: NodeId = NodeId(0);

/// An automaton under construction. Call [`Automaton::compile`] once all
/// patterns are inserted to build failure links; traversal is only
/// available on the compiled form.
pub struct Automaton<P> {
    nodes: Vec<Node<P>>,
}

impl<P: Clone> Automaton<P> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                children: HashMap::new(),
                fail: ROOT,
                payloads: Vec::new(),
            }],
        }
    }

    /// Insert `pattern`, tagging its terminal node with `payload` (e.g. a
    /// primer id, or a seed's diagonal offset).
    pub fn add(&mut self, pattern: &[u8], payload: P) {
        let mut current = ROOT;
        for &symbol in pattern {
            current = self.child_or_insert(current, symbol);
        }
        self.nodes[current.0 as usize].payloads.push(payload);
    }

    fn child_or_insert(&mut self, node: NodeId, symbol: u8) -> NodeId {
        if let Some(&child) = self.nodes[node.0 as usize].children.get(&symbol) {
            return child;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            children: HashMap::new(),
            fail: ROOT,
            payloads: Vec::new(),
        });
        self.nodes[node.0 as usize].children.insert(symbol, id);
        id
    }

    /// Build failure links via BFS and propagate payloads along them, then
    /// freeze into a [`CompiledAutomaton`] for traversal.
    pub fn compile(mut self) -> CompiledAutomaton<P> {
        let mut queue = VecDeque::new();
        let root_children: Vec<(u8, NodeId)> = self.nodes[ROOT.0 as usize].children.iter().map(|(&s, &n)| (s, n)).collect();
        for (_, child) in &root_children {
            queue.push_back(*child);
        }
        while let Some(node) = queue.pop_front() {
            let children: Vec<(u8, NodeId)> = self.nodes[node.0 as usize].children.iter().map(|(&s, &n)| (s, n)).collect();
            for (symbol, child) in children {
                let mut fail = self.nodes[node.0 as usize].fail;
                let resolved = loop {
                    if let Some(&next) = self.nodes[fail.0 as usize].children.get(&symbol) {
                        break next;
                    }
                    if fail == ROOT {
                        break ROOT;
                    }
                    fail = self.nodes[fail.0 as usize].fail;
                };
                let resolved = if resolved == child { ROOT } else { resolved };
                self.nodes[child.0 as usize].fail = resolved;
                let inherited = self.nodes[resolved.0 as usize].payloads.clone();
                self.nodes[child.0 as usize].payloads.extend(inherited);
                queue.push_back(child);
            }
        }
        CompiledAutomaton { nodes: self.nodes }
    }
}

impl<P: Clone> Default for Automaton<P> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CompiledAutomaton<P> {
    nodes: Vec<Node<P>>,
}

impl<P> CompiledAutomaton<P> {
    /// Traverse `text`, calling `on_match(position, payload)` for every
    /// pattern ending at `position` (inclusive), for every payload
    /// registered on that match (direct or via a failure link).
    pub fn traverse(&self, text: &[u8], mut on_match: impl FnMut(usize, &P)) {
        let mut current = ROOT;
        for (i, &symbol) in text.iter().enumerate() {
            current = self.step(current, symbol);
            for payload in &self.nodes[current.0 as usize].payloads {
                on_match(i, payload);
            }
        }
    }

    fn step(&self, mut node: NodeId, symbol: u8) -> NodeId {
        loop {
            if let Some(&next) = self.nodes[node.0 as usize].children.get(&symbol) {
                return next;
            }
            if node == ROOT {
                return ROOT;
            }
            node = self.nodes[node.0 as usize].fail;
        }
    }
}

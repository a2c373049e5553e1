//! Ordered, mutable container of instruction records for one method body.
//!
//! Records are addressed by [`InsnId`]. Positions are only meaningful until the next insertion;
//! ids stay valid for the lifetime of the sequence. Insertion is strictly additive: nothing
//! already in the sequence is removed or reordered.

use crate::instruction::{InsnId, Instruction};
use crate::result::{Error, Result};
use serde::{Serialize, Serializer};
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_SEQUENCE_TAG: AtomicU32 = AtomicU32::new(1);

#[derive(Clone, Debug, PartialEq)]
struct Node {
    id: InsnId,
    insn: Instruction,
}

/// The instruction stream of one method.
///
/// Clones share the tag and the id counter of the sequence they came from: ids of existing
/// records stay valid in every clone, and no two clones ever issue the same id.
#[derive(Clone, Debug)]
pub struct InstructionSequence {
    tag: u32,
    next_index: Arc<AtomicU32>,
    nodes: Vec<Node>,
}

impl PartialEq for InstructionSequence {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.nodes == other.nodes
    }
}

impl Default for InstructionSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionSequence {
    pub fn new() -> Self {
        Self {
            tag: NEXT_SEQUENCE_TAG.fetch_add(1, Ordering::Relaxed),
            next_index: Arc::new(AtomicU32::new(0)),
            nodes: Vec::new(),
        }
    }

    fn issue_id(&self) -> InsnId {
        InsnId {
            sequence: self.tag,
            index: self.next_index.fetch_add(1, Ordering::Relaxed),
        }
    }

    fn attach(&mut self, insn: Instruction) -> Node {
        Node {
            id: self.issue_id(),
            insn,
        }
    }

    /// Appends a record at the end and returns its id.
    pub fn push(&mut self, insn: Instruction) -> InsnId {
        let node = self.attach(insn);
        let id = node.id;
        self.nodes.push(node);
        id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if the id belongs to a record currently in this sequence.
    pub fn contains(&self, id: InsnId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: InsnId) -> Option<usize> {
        if id.sequence != self.tag {
            return None;
        }
        self.nodes.iter().position(|node| node.id == id)
    }

    /// Logical position of a member record.
    pub fn index_of(&self, id: InsnId) -> Result<usize> {
        self.position(id).ok_or(Error::RecordNotMember(id))
    }

    /// Looks up a member record by id.
    pub fn get(&self, id: InsnId) -> Option<&Instruction> {
        self.position(id).map(|pos| &self.nodes[pos].insn)
    }

    /// Record and id at a logical position.
    pub fn at(&self, position: usize) -> Option<(InsnId, &Instruction)> {
        self.nodes.get(position).map(|node| (node.id, &node.insn))
    }

    /// Iterates over `(id, record)` pairs in order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (InsnId, &Instruction)> + '_ {
        self.nodes.iter().map(|node| (node.id, &node.insn))
    }

    /// Iterates over a sub-range of positions; the range is clamped to the sequence length.
    pub fn range(
        &self,
        range: Range<usize>,
    ) -> impl DoubleEndedIterator<Item = (usize, InsnId, &Instruction)> + '_ {
        let end = range.end.min(self.nodes.len());
        let start = range.start.min(end);
        self.nodes[start..end]
            .iter()
            .enumerate()
            .map(move |(offset, node)| (start + offset, node.id, &node.insn))
    }

    pub fn ids(&self) -> Vec<InsnId> {
        self.nodes.iter().map(|node| node.id).collect()
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.nodes.iter().map(|node| &node.insn)
    }

    /// Inserts `fragment`, in order, immediately before `anchor`.
    ///
    /// Returns the ids of the new records in fragment order. Nothing is inserted if the anchor
    /// is not a member.
    pub fn insert_before<I>(&mut self, anchor: InsnId, fragment: I) -> Result<Vec<InsnId>>
    where
        I: IntoIterator<Item = Instruction>,
    {
        let pos = self.index_of(anchor)?;
        Ok(self.splice_at(pos, fragment))
    }

    /// Inserts `fragment`, in order, immediately after `anchor`.
    ///
    /// Returns the ids of the new records in fragment order. Nothing is inserted if the anchor
    /// is not a member.
    pub fn insert_after<I>(&mut self, anchor: InsnId, fragment: I) -> Result<Vec<InsnId>>
    where
        I: IntoIterator<Item = Instruction>,
    {
        let pos = self.index_of(anchor)?;
        Ok(self.splice_at(pos + 1, fragment))
    }

    fn splice_at<I>(&mut self, pos: usize, fragment: I) -> Vec<InsnId>
    where
        I: IntoIterator<Item = Instruction>,
    {
        let nodes: Vec<Node> = fragment.into_iter().map(|insn| self.attach(insn)).collect();
        let ids = nodes.iter().map(|node| node.id).collect();
        tracing::debug!("Inserting {} record(s) at position {}", nodes.len(), pos);
        self.nodes.splice(pos..pos, nodes);
        ids
    }
}

impl FromIterator<Instruction> for InstructionSequence {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        let mut sequence = Self::new();
        for insn in iter {
            sequence.push(insn);
        }
        sequence
    }
}

impl Serialize for InstructionSequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.instructions())
    }
}

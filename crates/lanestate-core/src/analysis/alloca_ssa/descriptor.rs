use crate::analysis::provenance::Provenance;
use crate::block::BlockId;
use crate::instructions::InstId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DescId(pub u32);

impl DescId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DescId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "desc{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinDescriptor {
    pub block: BlockId,
    pub allocas: Provenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectDescriptor {
    pub block: BlockId,
    pub inst: InstId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Descriptor {
    Join(JoinDescriptor),
    Effect(EffectDescriptor),
}

impl Descriptor {
    pub fn block(&self) -> BlockId {
        match self {
            Descriptor::Join(join) => join.block,
            Descriptor::Effect(effect) => effect.block,
        }
    }

    pub fn is_join(&self) -> bool {
        matches!(self, Descriptor::Join(_))
    }

    pub fn as_join(&self) -> Option<&JoinDescriptor> {
        match self {
            Descriptor::Join(join) => Some(join),
            Descriptor::Effect(_) => None,
        }
    }

    pub fn as_effect(&self) -> Option<&EffectDescriptor> {
        match self {
            Descriptor::Effect(effect) => Some(effect),
            Descriptor::Join(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DescriptorArena {
    descriptors: Vec<Descriptor>,
}

impl DescriptorArena {
    pub fn alloc(&mut self, descriptor: Descriptor) -> DescId {
        let id = DescId(self.descriptors.len() as u32);
        self.descriptors.push(descriptor);
        id
    }

    pub fn get(&self, id: DescId) -> &Descriptor {
        &self.descriptors[id.index()]
    }

    pub fn join(&self, id: DescId) -> Option<&JoinDescriptor> {
        self.get(id).as_join()
    }

    pub fn join_mut(&mut self, id: DescId) -> Option<&mut JoinDescriptor> {
        match &mut self.descriptors[id.index()] {
            Descriptor::Join(join) => Some(join),
            Descriptor::Effect(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn clear(&mut self) {
        self.descriptors.clear();
    }
}

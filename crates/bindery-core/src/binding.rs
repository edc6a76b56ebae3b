#![forbid(unsafe_code)]

//! Handle describing one edge created by `bind_to` or `weak_bind`.
//!
//! A [`Binding`] does not keep either node alive and dropping it does not
//! remove the edge; call [`Binding::unbind`] for that.

use std::fmt;

use crate::error::{BindError, Result};
use crate::id::NodeId;
use crate::node::{Node, WeakNode};
use crate::peers::EdgeKind;
use crate::storage::Storage;

/// Which kind of edge a [`Binding`] stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Bidirectional edge.
    Strong,
    /// `node` is a weak dependent of `peer`.
    Weak,
}

/// Record of an edge between `node` (the side that initiated the bind) and
/// `peer`.
pub struct Binding<S: Storage> {
    kind: BindingKind,
    node: WeakNode<S>,
    peer: WeakNode<S>,
}

impl<S: Storage> Clone for Binding<S> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            node: self.node.clone(),
            peer: self.peer.clone(),
        }
    }
}

impl<S: Storage> Binding<S> {
    pub(crate) fn new(kind: BindingKind, node: &Node<S>, peer: &Node<S>) -> Self {
        Self {
            kind,
            node: node.downgrade(),
            peer: peer.downgrade(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node.id()
    }

    #[must_use]
    pub fn peer_id(&self) -> NodeId {
        self.peer.id()
    }

    /// Whether both nodes exist and the edge is still in place.
    #[must_use]
    pub fn is_live(&self) -> bool {
        let (Some(node), Some(peer)) = (self.node.upgrade(), self.peer.upgrade()) else {
            return false;
        };
        let expected = match self.kind {
            BindingKind::Strong => EdgeKind::Strong,
            BindingKind::Weak => EdgeKind::Source,
        };
        node.edge_to(&peer) == Some(expected)
    }

    /// Remove the edge this binding stands for.
    ///
    /// # Errors
    ///
    /// `NotBound` if either node is gone or the edge was already removed.
    pub fn unbind(&self) -> Result<()> {
        let (Some(node), Some(peer)) = (self.node.upgrade(), self.peer.upgrade()) else {
            return Err(BindError::NotBound {
                node: self.node.id(),
                peer: self.peer.id(),
            });
        };
        match self.kind {
            BindingKind::Strong => node.unbind_from(&peer),
            BindingKind::Weak => node.unbind_weak_from(&peer),
        }
    }
}

impl<S: Storage> fmt::Debug for Binding<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("kind", &self.kind)
            .field("node", &self.node.id())
            .field("peer", &self.peer.id())
            .finish()
    }
}

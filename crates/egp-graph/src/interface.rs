// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ordered end point type sequences for one side of a row.

use egp_types::Ept;

use crate::error::GraphError;

/// Most flattened EPT elements one interface may hold.
pub const MAX_INTERFACE_ELEMENTS: usize = 256;

/// The end point types of one side of one row.
///
/// A canonical interface is sorted ascending by [`Ept`] order, stable with
/// respect to insertion. [`Interface::insert_endpoint`] keeps a canonical
/// interface canonical; [`Interface::push`] appends and may leave it out of
/// order until [`Interface::reorder`] is called.
#[derive(Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct Interface {
    epts: Vec<Ept>,
    elements: usize,
}

impl Interface {
    /// An interface with no end points.
    pub const fn new() -> Self {
        Self {
            epts: Vec::new(),
            elements: 0,
        }
    }

    /// Builds an interface in the given order.
    ///
    /// # Errors
    /// [`GraphError::InterfaceOverflow`] past [`MAX_INTERFACE_ELEMENTS`].
    pub fn from_epts(epts: impl IntoIterator<Item = Ept>) -> Result<Self, GraphError> {
        let mut iface = Self::new();
        for ept in epts {
            iface.push(ept)?;
        }
        Ok(iface)
    }

    /// Number of end points.
    pub fn len(&self) -> usize {
        self.epts.len()
    }

    /// `true` when there are no end points.
    pub fn is_empty(&self) -> bool {
        self.epts.is_empty()
    }

    /// Type of the end point at `index`.
    pub fn get(&self, index: usize) -> Option<&Ept> {
        self.epts.get(index)
    }

    /// End point types in index order.
    pub fn epts(&self) -> &[Ept] {
        &self.epts
    }

    /// Iterates end point types in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, Ept> {
        self.epts.iter()
    }

    /// Sum of the flattened lengths of every end point type.
    pub fn total_elements(&self) -> usize {
        self.elements
    }

    /// `true` when the types are in canonical order.
    pub fn is_canonical(&self) -> bool {
        self.epts.windows(2).all(|w| w[0] <= w[1])
    }

    fn reserve(&self, ept: &Ept) -> Result<(), GraphError> {
        let elements = self.elements + ept.len();
        if elements > MAX_INTERFACE_ELEMENTS {
            return Err(GraphError::InterfaceOverflow { elements });
        }
        Ok(())
    }

    /// Appends an end point, returning its index.
    ///
    /// # Errors
    /// [`GraphError::InterfaceOverflow`] past [`MAX_INTERFACE_ELEMENTS`].
    pub fn push(&mut self, ept: Ept) -> Result<usize, GraphError> {
        self.reserve(&ept)?;
        self.elements += ept.len();
        self.epts.push(ept);
        Ok(self.epts.len() - 1)
    }

    /// Inserts an end point after every end point of equal type, returning
    /// its index. End points at or beyond that index move up by one.
    ///
    /// # Errors
    /// [`GraphError::InterfaceOverflow`] past [`MAX_INTERFACE_ELEMENTS`].
    pub fn insert_endpoint(&mut self, ept: Ept) -> Result<usize, GraphError> {
        self.reserve(&ept)?;
        let index = self.epts.partition_point(|e| e <= &ept);
        self.elements += ept.len();
        self.epts.insert(index, ept);
        Ok(index)
    }

    /// Removes the end point at `index`; later end points move down by one.
    ///
    /// # Errors
    /// [`GraphError::EndpointOutOfRange`] when `index` is past the end.
    pub fn remove_endpoint(&mut self, index: usize) -> Result<Ept, GraphError> {
        if index >= self.epts.len() {
            return Err(GraphError::EndpointOutOfRange {
                index,
                len: self.epts.len(),
            });
        }
        let ept = self.epts.remove(index);
        self.elements -= ept.len();
        Ok(ept)
    }

    /// Stable-sorts into canonical order and returns the permutation:
    /// `perm[old_index] == new_index`.
    pub fn reorder(&mut self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.epts.len()).collect();
        order.sort_by(|&a, &b| self.epts[a].cmp(&self.epts[b]));
        let mut perm = vec![0; order.len()];
        for (new, &old) in order.iter().enumerate() {
            perm[old] = new;
        }
        let mut sorted: Vec<Option<Ept>> = self.epts.drain(..).map(Some).collect();
        self.epts = order.iter().filter_map(|&old| sorted[old].take()).collect();
        perm
    }
}

impl<'a> IntoIterator for &'a Interface {
    type Item = &'a Ept;
    type IntoIter = std::slice::Iter<'a, Ept>;

    fn into_iter(self) -> Self::IntoIter {
        self.epts.iter()
    }
}

//! Callbacks that displace the synthesized buffers before upload.

use std::fmt;

use nalgebra::{Point3, Vector3, Vector4};

use crate::mesh::TubeMesh;

/// Mutable view of the synthesized buffers handed to each callback.
///
/// Slices cannot change length, so callbacks may move vertices and bend
/// normals but never add or remove any.
#[derive(Debug)]
pub struct PostprocessBuffers<'a> {
    /// Vertex positions.
    pub vertices: &'a mut [Point3<f64>],
    /// Vertex normals.
    pub normals: &'a mut [Vector3<f64>],
    /// Vertex tangents, when enabled.
    pub tangents: Option<&'a mut [Vector4<f64>]>,
}

/// Handle returned by [`crate::TubeGenerator::add_postprocess`], used to
/// remove the callback again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostprocessId(u64);

type Callback = Box<dyn FnMut(&mut PostprocessBuffers<'_>) + Send>;

/// Ordered list of registered callbacks.
#[derive(Default)]
pub(crate) struct PostprocessChain {
    callbacks: Vec<(PostprocessId, Callback)>,
    next_id: u64,
}

impl fmt::Debug for PostprocessChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostprocessChain")
            .field("ids", &self.callbacks.iter().map(|(id, _)| *id).collect::<Vec<_>>())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl PostprocessChain {
    pub(crate) fn add(&mut self, callback: Callback) -> PostprocessId {
        let id = PostprocessId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, callback));
        id
    }

    pub(crate) fn remove(&mut self, id: PostprocessId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(existing, _)| *existing != id);
        self.callbacks.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Invoke every callback in registration order.
    pub(crate) fn run(&mut self, mesh: &mut TubeMesh) {
        if self.callbacks.is_empty() {
            return;
        }
        let mut buffers = PostprocessBuffers {
            vertices: &mut mesh.vertices,
            normals: &mut mesh.normals,
            tangents: mesh.tangents.as_deref_mut(),
        };
        for (_, callback) in &mut self.callbacks {
            callback(&mut buffers);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn mesh() -> TubeMesh {
        TubeMesh {
            vertices: vec![Point3::origin(); 2],
            normals: vec![Vector3::x(); 2],
            ..TubeMesh::default()
        }
    }

    #[test]
    fn runs_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut chain = PostprocessChain::default();
        for tag in 0..3 {
            let order = Arc::clone(&order);
            chain.add(Box::new(move |_| {
                if let Ok(mut order) = order.lock() {
                    order.push(tag);
                }
            }));
        }

        chain.run(&mut mesh());
        let order = order.lock().map(|o| o.clone()).unwrap_or_default();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn callbacks_mutate_buffers() {
        let mut chain = PostprocessChain::default();
        chain.add(Box::new(|buffers| {
            for v in buffers.vertices.iter_mut() {
                v.y += 1.0;
            }
        }));
        chain.add(Box::new(|buffers| {
            // Sees the previous callback's displacement
            for v in buffers.vertices.iter_mut() {
                v.y *= 2.0;
            }
            assert!(buffers.tangents.is_none());
        }));

        let mut mesh = mesh();
        chain.run(&mut mesh);
        assert!(mesh.vertices.iter().all(|v| (v.y - 2.0).abs() < f64::EPSILON));
    }

    #[test]
    fn remove_by_id() {
        let mut chain = PostprocessChain::default();
        let a = chain.add(Box::new(|_| {}));
        let b = chain.add(Box::new(|_| {}));
        assert_ne!(a, b);
        assert_eq!(chain.len(), 2);

        assert!(chain.remove(a));
        assert!(!chain.remove(a));
        assert_eq!(chain.len(), 1);
        assert!(chain.remove(b));
        assert!(chain.is_empty());
    }
}

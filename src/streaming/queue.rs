//! Thread-safe FIFO of finished chunk meshes

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::core::types::IVec3;

/// A finished mesh payload
///
/// `vertices` is a packed stream of three `u8` per vertex in mesh-local
/// space, ready for GPU upload.
#[derive(Clone, Debug)]
pub struct ChunkMesh {
    pub position: IVec3,
    pub vertices: Vec<u8>,
}

impl ChunkMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

/// Unbounded multi-producer FIFO drained by the render thread
///
/// Producers never block; the consumer is expected to drain with
/// [`try_pop`](MeshQueue::try_pop) every frame, so depth stays within one
/// sweep's worth of meshes.
pub struct MeshQueue {
    tx: Sender<ChunkMesh>,
    rx: Receiver<ChunkMesh>,
}

impl MeshQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn push(&self, mesh: ChunkMesh) {
        // the receiver lives as long as the queue, so send cannot fail
        let _ = self.tx.send(mesh);
    }

    /// Pop the oldest mesh, if any is ready
    pub fn try_pop(&self) -> Option<ChunkMesh> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for MeshQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let queue = MeshQueue::new();
        for i in 0..3 {
            queue.push(ChunkMesh {
                position: IVec3::new(i, 0, 0),
                vertices: vec![i as u8; 3],
            });
        }
        assert_eq!(queue.len(), 3);
        for i in 0..3 {
            let mesh = queue.try_pop().expect("queued mesh");
            assert_eq!(mesh.position, IVec3::new(i, 0, 0));
            assert_eq!(mesh.vertex_count(), 1);
        }
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn test_concurrent_producers() {
        use std::sync::Arc;

        let queue = Arc::new(MeshQueue::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..16 {
                        queue.push(ChunkMesh {
                            position: IVec3::new(t, i, 0),
                            vertices: Vec::new(),
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.len(), 64);
    }
}

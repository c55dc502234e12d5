//! Shared-manager concurrency tests
//!
//! The manager has no internal lock; these exercise the
//! `SharedCompressionManager` (external mutex) shape with many threads.

use std::sync::Arc;
use std::thread;
use vectier_core::{CompressionConfig, Tier};
use vectier_storage::tiering_manager::{CompressionManager, SharedCompressionManager};

fn shared_manager() -> SharedCompressionManager {
    let config = CompressionConfig {
        dimension: 16,
        pq_subvectors: Some(4),
        pq8_centroids: 16,
        pq4_centroids: 8,
        min_training_samples: 20,
        ..CompressionConfig::default()
    };
    CompressionManager::new(config).unwrap().into_shared()
}

fn vector_for(seed: usize) -> Vec<f32> {
    (0..16).map(|d| ((seed * 31 + d * 7) % 97) as f32 / 97.0 - 0.5).collect()
}

#[test]
fn test_concurrent_store_and_retrieve() {
    let manager = shared_manager();

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for i in 0..25 {
                    let id = format!("w{}-{}", worker, i);
                    let vector = vector_for(worker * 100 + i);
                    manager.lock().store(id.as_str(), &vector).unwrap();
                    let back = manager.lock().retrieve(&id).unwrap().unwrap();
                    assert_eq!(back, vector);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let manager = manager.lock();
    assert_eq!(manager.len(), 200);
    assert_eq!(manager.get_access_record("w3-7").unwrap().total_accesses, 2);
}

#[test]
fn test_concurrent_transitions_apply_once() {
    let manager = shared_manager();
    {
        let mut guard = manager.lock();
        for i in 0..40 {
            guard.store(format!("v{}", i), &vector_for(i)).unwrap();
        }
        assert!(guard.train_codebooks().unwrap());
    }

    // Every thread races to move the same ids to cool; exactly one wins each.
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                (0..40)
                    .filter(|i| {
                        manager
                            .lock()
                            .transition_tier(&format!("v{}", i), Tier::Cool)
                            .is_ok()
                    })
                    .count()
            })
        })
        .collect();

    let wins: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(wins, 40);

    let manager = manager.lock();
    assert_eq!(manager.get_tier_distribution().cool, 40);
    assert_eq!(manager.get_memory_stats().total_bytes, 40 * 4);
}

//! End-to-end verification of the framework → queue → renderer pipeline.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use duplex::core::{
    ComponentId, CoreResult, EngineConfig, StopSignal, ThreadBody, ThreadConfig, WorkerThread,
};
use duplex::framework::{MappingComponent, StaticMeshMapping};
use duplex::render::{renderer_thread, RenderContext};
use duplex::Engine;
use parking_lot::Mutex;

fn fast_thread_config() -> ThreadConfig {
    ThreadConfig {
        target_fps: 250,
        shutdown_timeout_ms: 2000,
        stats_log_interval: 0,
    }
}

fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

// ============================================================================
// Queue ordering and atomicity
// ============================================================================

#[test]
fn test_fifo_per_producer_across_threads() {
    let context = RenderContext::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let producers: Vec<_> = (0..4u64)
        .map(|producer| {
            let context = context.clone();
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for seq in 0..500u64 {
                    let log = Arc::clone(&log);
                    context
                        .queue()
                        .enqueue("record", move || log.lock().push((producer, seq)));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let report = context.queue().process_commands();
    assert_eq!(report.executed, 2000);

    let log = log.lock();
    for producer in 0..4u64 {
        let seqs: Vec<u64> = log
            .iter()
            .filter(|(p, _)| *p == producer)
            .map(|(_, s)| *s)
            .collect();
        assert_eq!(seqs, (0..500).collect::<Vec<_>>());
    }
}

#[test]
fn test_swap_drain_exactly_once() {
    const PRODUCERS: u64 = 8;
    const PER_PRODUCER: u64 = 1000;

    let context = RenderContext::new();
    let seen = Arc::new(Mutex::new(HashSet::new()));
    let duplicates = Arc::new(AtomicU64::new(0));
    let producing = Arc::new(AtomicBool::new(true));

    let drainer = {
        let context = context.clone();
        let producing = Arc::clone(&producing);
        thread::spawn(move || {
            let mut executed = 0usize;
            while producing.load(Ordering::Acquire) {
                executed += context.queue().process_commands().executed;
            }
            executed + context.queue().process_commands().executed
        })
    };

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let context = context.clone();
            let seen = Arc::clone(&seen);
            let duplicates = Arc::clone(&duplicates);
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    let seen = Arc::clone(&seen);
                    let duplicates = Arc::clone(&duplicates);
                    context.queue().enqueue("tag", move || {
                        if !seen.lock().insert(producer * PER_PRODUCER + seq) {
                            duplicates.fetch_add(1, Ordering::Relaxed);
                        }
                    });
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }
    producing.store(false, Ordering::Release);

    let executed = drainer.join().unwrap();
    assert_eq!(executed, (PRODUCERS * PER_PRODUCER) as usize);
    assert_eq!(duplicates.load(Ordering::Relaxed), 0);
    assert_eq!(seen.lock().len(), (PRODUCERS * PER_PRODUCER) as usize);
    assert_eq!(context.queue().pending_command_count(), 0);
}

// ============================================================================
// Registration protocol
// ============================================================================

#[test]
fn test_idempotent_registration() {
    let context = RenderContext::new();
    let mut mesh = StaticMeshMapping::new(context.clone(), "Cube");

    assert!(mesh.register_component());
    assert!(!mesh.register_component());
    assert_eq!(context.queue().pending_command_count(), 1);
    context.queue().process_commands();

    assert!(mesh.unregister_component());
    assert!(!mesh.unregister_component());
    assert_eq!(context.queue().pending_command_count(), 1);
    context.queue().process_commands();

    let stats = context.queue().stats();
    assert_eq!(stats.enqueued, 2);
    assert_eq!(stats.executed, 2);
}

#[test]
fn test_no_dangling_proxy() {
    let context = RenderContext::new();
    let mut keep = StaticMeshMapping::new(context.clone(), "Keep");
    let mut gone = StaticMeshMapping::new(context.clone(), "Gone");
    keep.register_component();
    gone.register_component();
    context.queue().process_commands();
    assert_eq!(context.scene().primitive_count(), 2);

    gone.unregister_component();
    context.queue().process_commands();

    assert_eq!(context.scene().primitive_count(), 1);
    assert!(context
        .scene()
        .with_primitive(gone.component_id(), |_| ())
        .is_none());
    assert!(context
        .scene()
        .with_primitive(keep.component_id(), |_| ())
        .is_some());
}

#[test]
fn test_register_dirty_unregister_scenario() {
    let context = RenderContext::new();
    let mut mesh = StaticMeshMapping::new(context.clone(), "Cube");

    mesh.register_component();
    context.queue().process_commands();
    assert_eq!(context.scene().primitive_count(), 1);

    mesh.mark_render_state_dirty();
    assert!(mesh.is_render_state_dirty());
    mesh.clear_render_state_dirty();
    assert!(!mesh.is_render_state_dirty());

    mesh.unregister_component();
    context.queue().process_commands();
    assert_eq!(context.scene().primitive_count(), 0);
}

// ============================================================================
// Worker thread lifecycle
// ============================================================================

struct StubbornBody {
    release: AtomicBool,
}

impl ThreadBody for StubbornBody {
    fn run(&self, _stop: &StopSignal) -> CoreResult<()> {
        while !self.release.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(5));
        }
        Ok(())
    }
}

#[test]
fn test_join_bounds() {
    let mut worker = WorkerThread::new(
        "Stubborn",
        StubbornBody {
            release: AtomicBool::new(false),
        },
    );
    assert!(worker.wait_for_completion(Duration::from_millis(10)));
    assert!(worker.start());

    worker.stop();
    assert!(!worker.wait_for_completion(Duration::from_millis(50)));
    assert!(worker.is_running());

    worker.body().release.store(true, Ordering::Release);
    // Zero waits until the loop returns.
    assert!(worker.wait_for_completion(Duration::ZERO));
    assert!(!worker.is_running());
}

#[test]
fn test_double_start_keeps_first_running() {
    let context = RenderContext::new();
    let mut renderer = renderer_thread(context, &fast_thread_config());

    assert!(renderer.start());
    assert!(!renderer.start());
    assert!(renderer.is_running());

    let before = renderer.body().render_frame_count();
    assert!(wait_until(Duration::from_secs(5), || {
        renderer.body().render_frame_count() > before + 3
    }));

    renderer.stop();
    assert!(renderer.wait_for_completion(Duration::from_secs(5)));
}

// ============================================================================
// Full engine
// ============================================================================

#[test]
fn test_engine_pipeline() {
    let config = EngineConfig {
        framework: fast_thread_config(),
        renderer: fast_thread_config(),
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config).unwrap();
    engine.start().unwrap();

    let (id_tx, id_rx) = crossbeam_channel::bounded::<ComponentId>(2);
    engine
        .submit(move |set| {
            for name in ["Cube", "Sphere"] {
                let id = set.spawn(StaticMeshMapping::new(set.context().clone(), name));
                id_tx.send(id).unwrap();
            }
        })
        .unwrap();
    let cube = id_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let sphere = id_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    let scene = Arc::clone(engine.context().scene());
    assert!(wait_until(Duration::from_secs(5), || scene.primitive_count() == 2));

    engine
        .submit(move |set| {
            if let Some(mesh) = set.get_mut::<StaticMeshMapping>(cube) {
                mesh.set_mesh_name("Cube_Updated");
            }
        })
        .unwrap();
    assert!(wait_until(Duration::from_secs(5), || {
        scene
            .with_primitive(cube, |proxy| proxy.draw_data().label)
            .as_deref()
            == Some("Cube_Updated")
    }));

    engine.submit(move |set| assert!(set.despawn(sphere))).unwrap();
    assert!(wait_until(Duration::from_secs(5), || !scene.contains(sphere)));

    let report = engine.shutdown();
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(scene.primitive_count(), 0);
    assert!(engine.framework_frame_count() > 0);
    assert!(engine.render_frame_count() > 0);
    assert!(!engine.is_running());
}

#[test]
fn test_engine_drop_shuts_down() {
    let config = EngineConfig {
        framework: fast_thread_config(),
        renderer: fast_thread_config(),
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config).unwrap();
    engine.start().unwrap();
    let context = engine.context().clone();

    engine
        .submit(|set| {
            set.spawn(StaticMeshMapping::new(set.context().clone(), "Cube"));
        })
        .unwrap();
    assert!(wait_until(Duration::from_secs(5), || {
        context.scene().primitive_count() == 1
    }));

    drop(engine);
    assert_eq!(context.scene().primitive_count(), 0);
    assert_eq!(context.queue().pending_command_count(), 0);
}

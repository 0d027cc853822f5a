//! One engine shared by several worker threads, including reloads mid-flight

mod common;

use common::{fields, message, TestEngine};
use serde_json::json;
use sluice_sdk::{Definitions, PipelineEngine};
use std::sync::Arc;
use std::thread;

const THREADS: usize = 8;
const MESSAGES_PER_THREAD: usize = 200;

fn classify() -> TestEngine {
    TestEngine::new()
        .with_rule(
            r#"rule "classify"
               when to_long($message.status) >= 500
               then
                   set_field("class", "server-error");
                   set_field("worker_echo", to_long($message.worker) * 10);
               end"#,
        )
        .with_pipeline(r#"pipeline "main" stage 0 match all rule "classify"; end"#)
        .with_connection("default", "main")
}

fn run_workers(engine: &Arc<PipelineEngine>) {
    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let engine = Arc::clone(engine);
            thread::spawn(move || {
                for _ in 0..MESSAGES_PER_THREAD {
                    let output =
                        engine.process(vec![message(json!({"status": 503, "worker": worker}))]);
                    let fields = fields(&*output[0]);
                    assert_eq!(fields["class"], json!("server-error"));
                    assert_eq!(fields["worker_echo"], json!(worker * 10));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_parallel_evaluation_on_compiled_rules() {
    let engine = Arc::new(classify().build());
    run_workers(&engine);
    assert_eq!(
        engine.metrics()["classify"].executed,
        (THREADS * MESSAGES_PER_THREAD) as u64
    );
}

#[test]
fn test_parallel_evaluation_on_interpreted_rules() {
    let engine = Arc::new(classify().interpreted().build());
    run_workers(&engine);
    assert_eq!(
        engine.metrics()["classify"].matched,
        (THREADS * MESSAGES_PER_THREAD) as u64
    );
}

#[test]
fn test_reload_swaps_state_for_later_messages() {
    let engine = Arc::new(classify().build());
    let before = engine.state();

    let replacement = Definitions::new()
        .with_rule(
            "classify",
            r#"rule "classify" when true then set_field("class", "reloaded"); end"#,
        )
        .with_pipeline("main", r#"pipeline "main" stage 0 match all rule "classify"; end"#)
        .with_connection("default", "main");

    let reader = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for _ in 0..500 {
                let output = engine.process(vec![message(json!({"status": 503, "worker": 1}))]);
                let class = fields(&*output[0])["class"].clone();
                assert!(class == json!("server-error") || class == json!("reloaded"));
            }
        })
    };
    let report = engine.load(&replacement);
    reader.join().unwrap();
    assert!(report.is_clean());

    let (output, _) = engine
        .evaluate("main", message(json!({"status": 200})))
        .unwrap();
    assert_eq!(fields(&*output[0])["class"], json!("reloaded"));
    // The old snapshot is untouched
    assert!(before.rule("classify").unwrap().source().contains("server-error"));
    assert!(engine.state().rule("classify").unwrap().source().contains("reloaded"));

    // Counters of a surviving rule name carry over
    assert!(engine.metrics()["classify"].executed >= 1);
}

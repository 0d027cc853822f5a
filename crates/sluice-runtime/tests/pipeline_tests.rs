//! Pipelines built from rule source, processed end to end

use sluice_compiler::Compiler;
use sluice_core::Value;
use sluice_runtime::{
    CompiledRule, ExecutableRule, FunctionRegistry, LogMessage, Message, NoopListener,
    PipelineInterpreter, RuntimePipeline, StreamConnections, TraceRecorder,
};
use std::collections::HashMap;
use std::sync::Arc;

const RULES: &[&str] = &[
    r#"rule "route errors"
       when has_field("error")
       then route_to_stream("errors");
       end"#,
    r#"rule "spawn child"
       when to_string($message.source) != "spawner"
       then create_message("child", "spawner");
       end"#,
    r#"rule "tag errors"
       when true
       then set_field("seen_by_errors", true);
       end"#,
    r#"rule "drop noise"
       when to_string($message.level) == "noise"
       then drop_message();
       end"#,
];

const PIPELINES: &str = r#"
pipeline "main"
  stage 0 match either
    rule "drop noise";
    rule "route errors";
    rule "spawn child";
end
pipeline "errors"
  stage 0 match all
    rule "tag errors";
end
"#;

struct Fixture {
    pipelines: HashMap<String, Arc<RuntimePipeline>>,
}

impl Fixture {
    fn new() -> Self {
        let registry = FunctionRegistry::with_builtins().unwrap();
        let compiler = Compiler::new(&registry);

        let mut rules: HashMap<String, Arc<dyn ExecutableRule>> = HashMap::new();
        for source in RULES {
            let validated = compiler.parse_rule(source).unwrap();
            let program = compiler.compile_rule(&validated).unwrap();
            let rule = CompiledRule::link(program, &registry).unwrap();
            rules.insert(validated.name().to_string(), Arc::new(rule));
        }

        let pipelines = compiler
            .parse_pipelines(PIPELINES)
            .unwrap()
            .iter()
            .map(|validated| {
                let pipeline =
                    RuntimePipeline::resolve(validated.pipeline(), |name| rules.get(name).cloned());
                (pipeline.name.clone(), Arc::new(pipeline))
            })
            .collect();
        Self { pipelines }
    }

    fn connections(&self) -> StreamConnections {
        let mut connections = StreamConnections::new();
        connections.connect("default", self.pipelines["main"].clone());
        connections.connect("errors", self.pipelines["errors"].clone());
        connections
    }
}

fn message(fields: &[(&str, &str)]) -> Box<dyn Message> {
    let mut message = LogMessage::new("hello", "app", chrono::Utc::now());
    for (name, value) in fields {
        message.set_field(name, Value::from(*value));
    }
    Box::new(message)
}

#[test]
fn test_new_streams_trigger_another_round() {
    let fixture = Fixture::new();
    let output = PipelineInterpreter::new().process(
        vec![message(&[("error", "disk full")])],
        &fixture.connections(),
        &mut NoopListener,
    );

    assert_eq!(output.len(), 2);
    let original = &output[0];
    assert_eq!(original.streams(), vec!["default", "errors"]);
    assert_eq!(original.get_field("seen_by_errors"), Some(Value::Bool(true)));

    let child = &output[1];
    assert_eq!(child.get_field("source"), Some(Value::from("spawner")));
    assert_eq!(child.streams(), vec!["default"]);
    assert_eq!(child.get_field("seen_by_errors"), None);
}

#[test]
fn test_dropped_message_is_not_returned() {
    let fixture = Fixture::new();
    let mut recorder = TraceRecorder::new();
    let output = PipelineInterpreter::new().process(
        vec![message(&[("level", "noise")])],
        &fixture.connections(),
        &mut recorder,
    );

    // Dropping stops the stage before the child is created
    assert!(output.is_empty());
    assert!(recorder.traces()[0].dropped);
}

#[test]
fn test_evaluate_returns_created_messages_unprocessed() {
    let fixture = Fixture::new();
    let main = fixture.pipelines["main"].clone();
    let output =
        PipelineInterpreter::new().evaluate(message(&[]), &[main], &mut NoopListener);

    assert_eq!(output.len(), 2);
    assert_eq!(output[1].get_field("message"), Some(Value::from("child")));
    assert!(output[1].streams().is_empty());
}

#[test]
fn test_message_without_connected_pipeline_passes_through() {
    let fixture = Fixture::new();
    let mut message = message(&[]);
    message.add_stream("unconnected");
    let output = PipelineInterpreter::new().process(
        vec![message],
        &fixture.connections(),
        &mut NoopListener,
    );

    assert_eq!(output.len(), 1);
    assert_eq!(output[0].streams(), vec!["unconnected"]);
}

//! The interpreter and the compiled fast path must agree on every rule

use serde_json::json;
use sluice_compiler::Compiler;
use sluice_runtime::{
    CompiledRule, EvaluationContext, ExecutableRule, FunctionRegistry, InterpretedRule, LogMessage,
    Result,
};
use std::sync::Arc;

const RULES: &[&str] = &[
    r#"
    rule "classify requests"
    when
        to_long($message.status) >= 500 || contains(to_string($message.path), "/admin")
    then
        let parts = split("/", to_string($message.path));
        set_field("first_segment", parts[1]);
        set_field("severity", to_long($message.status) / 100);
        set_field("tag", concat(lowercase(to_string($message.method)), "-req"));
        set_field("meta", {code: to_long($message.status), ok: false});
    end
    "#,
    r#"
    rule "short circuit"
    when
        has_field("missing") && to_long($message.status) / 0 > 1
    then
        set_field("unreachable", true);
    end
    "#,
    r#"
    rule "division by zero"
    when
        to_long($message.status) / to_long($message.zero) > 1
    then
        set_field("unreachable", true);
    end
    "#,
    r#"
    rule "dates"
    when
        is_string($message.day)
    then
        let next = parse_date(to_string($message.day), "%Y-%m-%d") + days(1);
        set_field("next_day", format_date(next, "%Y-%m-%d"));
        set_field("weekly", period("P1W") + days(2) == period("P1W2D"));
    end
    "#,
    r#"
    rule "lists and maps"
    when
        not is_null($message.status)
    then
        let items = [1, 2.5, "three", [4]];
        set_field("third", items[2]);
        set_field("nested", items[3]);
        set_field("missing_index", items[10]);
        set_field("keys", join(keys(to_map(parse_json("{\"b\": 1, \"a\": 2}"))), ","));
        set_field("negated", -to_long($message.status));
        remove_field("path");
    end
    "#,
];

fn message() -> LogMessage {
    LogMessage::from_json(json!({
        "_id": "fixed-id",
        "status": 503,
        "path": "/admin/users",
        "method": "GET",
        "zero": 0,
        "day": "2024-02-28",
    }))
    .unwrap()
}

struct Outcome {
    condition: Result<bool>,
    actions: Option<Result<()>>,
    fields: serde_json::Value,
}

fn run(rule: &dyn ExecutableRule) -> Outcome {
    let mut msg = message();
    let (condition, actions) = {
        let mut ctx = EvaluationContext::new(&mut msg);
        let condition = rule.evaluate_condition(&mut ctx);
        let actions = match condition {
            Ok(true) => Some(rule.execute_actions(&mut ctx)),
            _ => None,
        };
        (condition, actions)
    };
    Outcome {
        condition,
        actions,
        fields: serde_json::to_value(msg.fields()).unwrap(),
    }
}

#[test]
fn test_interpreter_and_compiled_rules_agree() {
    let registry = Arc::new(FunctionRegistry::with_builtins().unwrap());
    let compiler = Compiler::new(&*registry);

    for source in RULES {
        let validated = compiler
            .parse_rule(source)
            .unwrap_or_else(|errors| panic!("{:?} in {}", errors, source));
        let compiled = CompiledRule::link(compiler.compile_rule(&validated).unwrap(), &registry)
            .unwrap();
        let interpreted = InterpretedRule::new(validated.into_rule(), registry.clone());

        let a = run(&interpreted);
        let b = run(&compiled);
        assert_eq!(a.condition, b.condition, "condition differs for {}", source);
        assert_eq!(a.actions, b.actions, "actions differ for {}", source);
        assert_eq!(a.fields, b.fields, "fields differ for {}", source);
    }
}

#[test]
fn test_expected_results() {
    let registry = Arc::new(FunctionRegistry::with_builtins().unwrap());
    let compiler = Compiler::new(&*registry);
    let compile = |source: &str| {
        let validated = compiler.parse_rule(source).unwrap();
        CompiledRule::link(compiler.compile_rule(&validated).unwrap(), &registry).unwrap()
    };

    let classify = run(&compile(RULES[0]));
    assert_eq!(classify.condition, Ok(true));
    assert_eq!(classify.fields["first_segment"], json!("admin"));
    assert_eq!(classify.fields["severity"], json!(5));
    assert_eq!(classify.fields["tag"], json!("get-req"));
    assert_eq!(classify.fields["meta"], json!({"code": 503, "ok": false}));

    let short = run(&compile(RULES[1]));
    assert_eq!(short.condition, Ok(false));

    let division = run(&compile(RULES[2]));
    assert!(division.condition.is_err());

    let dates = run(&compile(RULES[3]));
    assert_eq!(dates.fields["next_day"], json!("2024-02-29"));
    assert_eq!(dates.fields["weekly"], json!(true));

    let lists = run(&compile(RULES[4]));
    assert_eq!(lists.actions, Some(Ok(())));
    assert_eq!(lists.fields["third"], json!("three"));
    assert_eq!(lists.fields["nested"], json!([4]));
    assert_eq!(lists.fields["keys"], json!("a,b"));
    assert_eq!(lists.fields["negated"], json!(-503));
    assert!(lists.fields.get("missing_index").is_none());
    assert!(lists.fields.get("path").is_none());
}

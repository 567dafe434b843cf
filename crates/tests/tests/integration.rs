//! End-to-end tests for the pipeline interpreter.
//!
//! These drive the full path: program construction (direct or through the
//! reload controller), stream selection, stage-sliced execution, and the
//! fixed-point loop. Execution order across pipelines inside one stage
//! slice is unspecified, so assertions only check the *set* of effects.

use std::sync::Arc;

use sluice_ast::{Expression, Pipeline, Statement};
use sluice_foundation::{Message, StreamId, Value};
use sluice_runtime::{ChangeEvent, PipelineSource, RuleSource, StreamAssignment};
use sluice_tests::{
    action_rule, assert_long_field, increment_of, resolved_stage, stamping_rule, InMemorySources,
    TestHarness,
};

fn has_field(name: &str) -> Expression {
    Expression::call("has_field", vec![Expression::string(name)])
}

/// An empty program returns every message unchanged and touches no
/// metrics.
#[test]
fn test_empty_program_passes_message_unchanged() {
    let harness = TestHarness::empty();
    let mut message = Message::new("m1");
    message.set_field("x", Value::Long(1));

    let output = harness.process_one(message.clone());

    assert_eq!(output, message);
    assert_eq!(harness.filtered_out(), 0);
}

/// A message without streams runs the pipelines assigned to `"default"`.
#[test]
fn test_default_stream_routing() {
    let pipeline = Pipeline::new(
        "p1",
        "defaults",
        vec![resolved_stage(
            0,
            false,
            vec![stamping_rule("set-x", Expression::boolean(true), "x", 1)],
        )],
    )
    .unwrap();
    let harness = TestHarness::from_program(vec![pipeline], vec![("default", vec!["p1"])]);

    let output = harness.process_one(Message::new("m1"));

    assert_long_field(&output, "x", 1);
}

/// With `match_all`, one non-matching rule stops the pipeline from
/// advancing, but the actions of the rules that did match still run.
#[test]
fn test_match_all_gates_next_stage() {
    let stage10 = resolved_stage(
        10,
        true,
        vec![
            stamping_rule("never", Expression::boolean(false), "from_never", 1),
            stamping_rule("always", Expression::boolean(true), "from_always", 1),
        ],
    );
    let stage20 = resolved_stage(
        20,
        false,
        vec![stamping_rule(
            "later",
            Expression::boolean(true),
            "from_stage20",
            1,
        )],
    );
    let pipeline = Pipeline::new("p1", "gated", vec![stage10, stage20]).unwrap();
    let harness = TestHarness::from_program(vec![pipeline], vec![("default", vec!["p1"])]);

    let output = harness.process_one(Message::new("m1"));

    assert_long_field(&output, "from_always", 1);
    assert_eq!(output.field("from_never"), None);
    assert_eq!(output.field("from_stage20"), None, "stage 20 must not run");
}

/// With `match_all` and every rule matching, the pipeline advances.
#[test]
fn test_match_all_advances_when_all_match() {
    let stage10 = resolved_stage(
        10,
        true,
        vec![
            stamping_rule("first", Expression::boolean(true), "a", 1),
            stamping_rule("second", Expression::boolean(true), "b", 1),
        ],
    );
    let stage20 = resolved_stage(
        20,
        false,
        vec![stamping_rule("later", Expression::boolean(true), "c", 1)],
    );
    let pipeline = Pipeline::new("p1", "advancing", vec![stage10, stage20]).unwrap();
    let harness = TestHarness::from_program(vec![pipeline], vec![("default", vec!["p1"])]);

    let output = harness.process_one(Message::new("m1"));

    assert_long_field(&output, "a", 1);
    assert_long_field(&output, "b", 1);
    assert_long_field(&output, "c", 1);
}

/// Without `match_all`, at least one rule must match to advance.
#[test]
fn test_no_match_stops_pipeline() {
    let stage0 = resolved_stage(
        0,
        false,
        vec![stamping_rule("never", Expression::boolean(false), "a", 1)],
    );
    let stage10 = resolved_stage(
        10,
        false,
        vec![stamping_rule("later", Expression::boolean(true), "b", 1)],
    );
    let pipeline = Pipeline::new("p1", "stopped", vec![stage0, stage10]).unwrap();
    let harness = TestHarness::from_program(vec![pipeline], vec![("default", vec!["p1"])]);

    let output = harness.process_one(Message::new("m1"));

    assert_eq!(output.field("a"), None);
    assert_eq!(output.field("b"), None);
}

/// `drop_message()` removes the message from the output, bumps the
/// filtered-out meter, and commits the journal offset.
#[test]
fn test_dropped_message() {
    let pipeline = Pipeline::new(
        "p1",
        "dropper",
        vec![resolved_stage(
            0,
            false,
            vec![action_rule(
                "drop",
                vec![Statement::call("drop_message", vec![])],
            )],
        )],
    )
    .unwrap();
    let harness = TestHarness::from_program(vec![pipeline], vec![("default", vec!["p1"])]);

    let output = harness.process(vec![Message::new("m1").with_journal_offset(42)]);

    assert!(output.is_empty());
    assert_eq!(harness.filtered_out(), 1);
    assert_eq!(harness.committed_offsets(), vec![42]);
}

/// Routing into a new stream re-queues the message so the pipelines of
/// that stream run too; each (message, stream) combination runs exactly once.
#[test]
fn test_added_stream_triggers_reprocessing() {
    let on_default = Pipeline::new(
        "p1",
        "router",
        vec![resolved_stage(
            0,
            false,
            vec![action_rule(
                "route",
                vec![
                    Statement::call(
                        "set_field",
                        vec![Expression::string("p1_runs"), increment_of("p1_runs")],
                    ),
                    Statement::call("route_to_stream", vec![Expression::string("s2")]),
                ],
            )],
        )],
    )
    .unwrap();
    let on_s2 = Pipeline::new(
        "p2",
        "downstream",
        vec![resolved_stage(
            0,
            false,
            vec![action_rule(
                "count",
                vec![Statement::call(
                    "set_field",
                    vec![Expression::string("p2_runs"), increment_of("p2_runs")],
                )],
            )],
        )],
    )
    .unwrap();
    let harness = TestHarness::from_program(
        vec![on_default, on_s2],
        vec![("default", vec!["p1"]), ("s2", vec!["p2"])],
    );

    let output = harness.process_one(Message::new("m1"));

    // both ran, and only once each
    assert_long_field(&output, "p1_runs", 1);
    assert_long_field(&output, "p2_runs", 1);
    assert!(output.streams().contains(&StreamId::from("s2")));
}

/// Messages created by rules are not evaluated mid-pass; they join the
/// work set and get their own pass against the same snapshot.
#[test]
fn test_created_messages_enter_next_pass() {
    // the spawn is guarded on a seed field so the created message does
    // not spawn again
    let spawner = Pipeline::new(
        "p1",
        "spawner",
        vec![resolved_stage(
            0,
            false,
            vec![
                Arc::new(
                    sluice_ast::Rule::new(
                        None,
                        "spawn",
                        has_field("seed"),
                        vec![Statement::Expr(Expression::call(
                            "create_message",
                            vec![],
                        ))],
                    )
                    .unwrap(),
                ),
                stamping_rule("touch", Expression::boolean(true), "touched", 1),
            ],
        )],
    )
    .unwrap();

    let harness = TestHarness::from_program(vec![spawner], vec![("default", vec!["p1"])]);

    let mut seeded = Message::new("m1");
    seeded.set_field("seed", Value::Boolean(true));
    let mut output = harness.process(vec![seeded]);
    output.sort_by(|a, b| a.id().as_str().cmp(b.id().as_str()));

    assert_eq!(output.len(), 2);
    assert_eq!(output[0].id().as_str(), "m1");
    assert_eq!(output[1].id().as_str(), "m1#1");
    // the created message went through the default pipelines itself
    assert_long_field(&output[0], "touched", 1);
    assert_long_field(&output[1], "touched", 1);
    assert_eq!(output[1].field("seed"), None);
}

/// A stream removed during a pass is not blacklisted; if it is re-added
/// later, its pipelines run again.
#[test]
fn test_removed_stream_can_be_reprocessed_when_readded() {
    let on_s1 = Pipeline::new(
        "p_s1",
        "hopper",
        vec![resolved_stage(
            0,
            false,
            vec![action_rule(
                "hop",
                vec![
                    Statement::call(
                        "set_field",
                        vec![Expression::string("s1_runs"), increment_of("s1_runs")],
                    ),
                    Statement::call("remove_from_stream", vec![Expression::string("s1")]),
                    Statement::call("route_to_stream", vec![Expression::string("s2")]),
                ],
            )],
        )],
    )
    .unwrap();
    let on_s2 = Pipeline::new(
        "p_s2",
        "bouncer",
        vec![resolved_stage(
            0,
            false,
            vec![action_rule(
                "bounce",
                vec![
                    Statement::call(
                        "set_field",
                        vec![Expression::string("s2_runs"), increment_of("s2_runs")],
                    ),
                    Statement::call("route_to_stream", vec![Expression::string("s1")]),
                ],
            )],
        )],
    )
    .unwrap();
    let harness = TestHarness::from_program(
        vec![on_s1, on_s2],
        vec![("s1", vec!["p_s1"]), ("s2", vec!["p_s2"])],
    );

    let mut message = Message::new("m1");
    message.add_stream("s1");
    let output = harness.process_one(message);

    // s1 ran twice: once initially, once after p_s2 re-added it;
    // s2 was blacklisted after its first run
    assert_long_field(&output, "s1_runs", 2);
    assert_long_field(&output, "s2_runs", 1);
    assert!(!output.streams().contains(&StreamId::from("s1")));
    assert!(output.streams().contains(&StreamId::from("s2")));
}

/// Variable bindings are scoped to one (message, stage) context and do
/// not leak into later stages.
#[test]
fn test_fresh_context_per_stage() {
    let stage0 = resolved_stage(
        0,
        false,
        vec![action_rule(
            "binder",
            vec![
                Statement::let_("x", Expression::long(42)),
                Statement::call(
                    "set_field",
                    vec![Expression::string("from_stage0"), Expression::variable("x")],
                ),
            ],
        )],
    );
    let stage10 = resolved_stage(
        10,
        false,
        vec![action_rule(
            "reader",
            vec![Statement::call(
                "set_field",
                vec![
                    Expression::string("from_stage10"),
                    Expression::variable("x"),
                ],
            )],
        )],
    );
    let pipeline = Pipeline::new("p1", "scoped", vec![stage0, stage10]).unwrap();
    let harness = TestHarness::from_program(vec![pipeline], vec![("default", vec!["p1"])]);

    let output = harness.process_one(Message::new("m1"));

    assert_long_field(&output, "from_stage0", 42);
    // the binding from stage 0 is gone; the field holds Null
    assert_eq!(output.field("from_stage10"), Some(&Value::Null));
}

/// A pipeline assigned to several of the message's streams runs once.
#[test]
fn test_pipeline_union_is_deduplicated() {
    let shared = Pipeline::new(
        "p1",
        "shared",
        vec![resolved_stage(
            0,
            false,
            vec![action_rule(
                "count",
                vec![Statement::call(
                    "set_field",
                    vec![Expression::string("runs"), increment_of("runs")],
                )],
            )],
        )],
    )
    .unwrap();
    let harness = TestHarness::from_program(
        vec![shared],
        vec![("s1", vec!["p1"]), ("s2", vec!["p1"])],
    );

    let mut message = Message::new("m1");
    message.add_stream("s1");
    message.add_stream("s2");
    let output = harness.process_one(message);

    assert_long_field(&output, "runs", 1);
}

/// Two pipelines in the same stage slice share the message: both of
/// their effects land, whatever their relative order.
#[test]
fn test_effects_within_slice_accumulate() {
    let counting = |id: &str| {
        Pipeline::new(
            id,
            id,
            vec![resolved_stage(
                0,
                false,
                vec![action_rule(
                    "count",
                    vec![Statement::call(
                        "set_field",
                        vec![Expression::string("counter"), increment_of("counter")],
                    )],
                )],
            )],
        )
        .unwrap()
    };
    let harness = TestHarness::from_program(
        vec![counting("p1"), counting("p2")],
        vec![("default", vec!["p1", "p2"])],
    );

    let output = harness.process_one(Message::new("m1"));

    assert_long_field(&output, "counter", 2);
}

/// Stage slices run in ascending order across pipelines: a later stage
/// of one pipeline observes the effects of an earlier stage of another.
#[test]
fn test_cross_pipeline_stage_ordering() {
    let early = Pipeline::new(
        "p1",
        "early",
        vec![resolved_stage(
            0,
            false,
            vec![stamping_rule("mark", Expression::boolean(true), "early", 1)],
        )],
    )
    .unwrap();
    let late = Pipeline::new(
        "p2",
        "late",
        vec![resolved_stage(
            5,
            false,
            vec![stamping_rule("observe", has_field("early"), "late", 1)],
        )],
    )
    .unwrap();
    let harness =
        TestHarness::from_program(vec![early, late], vec![("default", vec!["p1", "p2"])]);

    let output = harness.process_one(Message::new("m1"));

    assert_long_field(&output, "late", 1);
}

/// The blacklist is scoped to one `process()` call: a second call runs
/// the same pipelines again.
#[test]
fn test_blacklist_is_per_call() {
    let pipeline = Pipeline::new(
        "p1",
        "counter",
        vec![resolved_stage(
            0,
            false,
            vec![action_rule(
                "count",
                vec![Statement::call(
                    "set_field",
                    vec![Expression::string("runs"), increment_of("runs")],
                )],
            )],
        )],
    )
    .unwrap();
    let harness = TestHarness::from_program(vec![pipeline], vec![("default", vec!["p1"])]);

    let first = harness.process_one(Message::new("m1"));
    assert_long_field(&first, "runs", 1);

    let second = harness.process_one(first);
    assert_long_field(&second, "runs", 2);
}

/// One broken pipeline source does not take down the rest of the
/// program: its messages pass through, others process normally.
#[test]
fn test_parse_failure_isolation() {
    let sources = Arc::new(InMemorySources::default());
    sources.rules.lock().unwrap().push(RuleSource {
        id: "r1".into(),
        source: "rule ok".into(),
    });
    sources.pipelines.lock().unwrap().extend([
        PipelineSource {
            id: "p_good".into(),
            source: "stage 0 match_any: ok".into(),
        },
        PipelineSource {
            id: "p_bad".into(),
            source: "!".into(),
        },
    ]);
    sources.assignments.lock().unwrap().extend([
        StreamAssignment {
            stream_id: "s_good".into(),
            pipeline_ids: vec!["p_good".into()],
        },
        StreamAssignment {
            stream_id: "s_bad".into(),
            pipeline_ids: vec!["p_bad".into()],
        },
    ]);
    let (harness, _controller) = TestHarness::from_sources(sources);

    let mut good = Message::new("m_good");
    good.add_stream("s_good");
    let mut bad = Message::new("m_bad");
    bad.add_stream("s_bad");

    let mut output = harness.process(vec![good, bad]);
    output.sort_by(|a, b| a.id().as_str().cmp(b.id().as_str()));

    assert_eq!(output.len(), 2);
    let bad_out = &output[0];
    let good_out = &output[1];
    assert_eq!(bad_out.id().as_str(), "m_bad");
    assert!(bad_out.fields().next().is_none(), "untouched passthrough");
    assert_long_field(good_out, "ok", 1);
}

/// A reload between calls swaps the program; in-flight behavior of past
/// calls is unaffected.
#[test]
fn test_reload_swaps_program_between_calls() {
    let sources = Arc::new(InMemorySources::default());
    sources.rules.lock().unwrap().push(RuleSource {
        id: "r1".into(),
        source: "rule before".into(),
    });
    sources.pipelines.lock().unwrap().push(PipelineSource {
        id: "p1".into(),
        source: "stage 0 match_any: before".into(),
    });
    sources.assignments.lock().unwrap().push(StreamAssignment {
        stream_id: "default".into(),
        pipeline_ids: vec!["p1".into()],
    });
    let (harness, controller) = TestHarness::from_sources(sources.clone());

    let output = harness.process_one(Message::new("m1"));
    assert_long_field(&output, "before", 1);

    // swap the rule out and reload
    sources.rules.lock().unwrap()[0].source = "rule after".into();
    sources.pipelines.lock().unwrap()[0].source = "stage 0 match_any: after".into();
    controller.reload().unwrap();

    let output = harness.process_one(Message::new("m2"));
    assert_long_field(&output, "after", 1);
    assert_eq!(output.field("before"), None);
}

/// Change events on the bus drive the full reload path.
#[tokio::test]
async fn test_change_events_reload_program() {
    let sources = Arc::new(InMemorySources::default());
    sources.pipelines.lock().unwrap().push(PipelineSource {
        id: "p1".into(),
        source: "stage 0 match_any:".into(),
    });
    let (harness, controller) = TestHarness::from_sources(sources.clone());
    assert_eq!(harness.store().snapshot().pipeline_count(), 1);

    let (bus, _keep) = tokio::sync::broadcast::channel(16);
    let handle = Arc::new(controller).spawn(bus.subscribe());

    sources.pipelines.lock().unwrap().push(PipelineSource {
        id: "p2".into(),
        source: "stage 0 match_any:".into(),
    });
    bus.send(ChangeEvent::PipelinesChanged {
        updated: vec!["p2".into()],
        deleted: vec![],
    })
    .unwrap();

    for _ in 0..100 {
        if harness.store().snapshot().pipeline_count() == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(harness.store().snapshot().pipeline_count(), 2);
    handle.abort();
}

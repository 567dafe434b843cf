//! Test harness for end-to-end interpreter runs.
//!
//! Builds programs either directly from AST values or through the full
//! reload path (in-memory source stores + a line-oriented stub parser),
//! and records journal commits for assertions.

use std::sync::{Arc, Mutex};

// link the built-in function library into the registry
use sluice_functions as _;

use indexmap::IndexMap;
use sluice_ast::{Expression, ParseError, Pipeline, PipelineRuleParser, Rule, Stage, Statement};
use sluice_foundation::{Message, PipelineId, StreamId, Value};
use sluice_runtime::{
    Interpreter, Journal, PipelineSource, PipelineSourceService, ProgramSnapshot, ProgramStore,
    ReloadController, RuleSource, RuleSourceService, SourceError, StreamAssignment,
    StreamAssignmentService,
};

/// Journal that records committed offsets.
#[derive(Debug, Default)]
pub struct RecordingJournal {
    offsets: Mutex<Vec<u64>>,
}

impl RecordingJournal {
    pub fn committed(&self) -> Vec<u64> {
        self.offsets.lock().unwrap().clone()
    }
}

impl Journal for RecordingJournal {
    fn mark_journal_offset_committed(&self, offset: u64) {
        self.offsets.lock().unwrap().push(offset);
    }
}

/// In-memory source-of-truth stores, mutable between reloads.
#[derive(Debug, Default)]
pub struct InMemorySources {
    pub rules: Mutex<Vec<RuleSource>>,
    pub pipelines: Mutex<Vec<PipelineSource>>,
    pub assignments: Mutex<Vec<StreamAssignment>>,
}

impl RuleSourceService for InMemorySources {
    fn load_all(&self) -> Result<Vec<RuleSource>, SourceError> {
        Ok(self.rules.lock().unwrap().clone())
    }
}

impl PipelineSourceService for InMemorySources {
    fn load_all(&self) -> Result<Vec<PipelineSource>, SourceError> {
        Ok(self.pipelines.lock().unwrap().clone())
    }
}

impl StreamAssignmentService for InMemorySources {
    fn load_all(&self) -> Result<Vec<StreamAssignment>, SourceError> {
        Ok(self.assignments.lock().unwrap().clone())
    }
}

/// Minimal parser for reload-path tests.
///
/// Rule source: `rule <name>` parses to a rule that stamps field
/// `<name>` with `1`; a source of `!` fails. Pipeline source: one stage
/// per line, `stage <n> match_all|match_any: <rule refs, comma separated>`;
/// `!` fails.
pub struct StubParser;

impl PipelineRuleParser for StubParser {
    fn parse_rule(&self, source: &str) -> Result<Rule, ParseError> {
        let name = source
            .strip_prefix("rule ")
            .ok_or_else(|| ParseError::new(1, 1, "expected `rule <name>`"))?
            .trim();
        Rule::new(
            None,
            name,
            Expression::boolean(true),
            vec![Statement::call(
                "set_field",
                vec![Expression::string(name), Expression::long(1)],
            )],
        )
        .map_err(|e| ParseError::new(1, 1, e.to_string()))
    }

    fn parse_pipeline(&self, id: &PipelineId, source: &str) -> Result<Pipeline, ParseError> {
        if source.trim() == "!" {
            return Err(ParseError::new(1, 1, "broken pipeline"));
        }
        let mut stages = Vec::new();
        for (line_no, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let rest = line
                .strip_prefix("stage ")
                .ok_or_else(|| ParseError::new(line_no + 1, 1, "expected `stage <n>`"))?;
            let (head, refs) = rest
                .split_once(':')
                .ok_or_else(|| ParseError::new(line_no + 1, 1, "expected `:`"))?;
            let mut parts = head.split_whitespace();
            let number: i32 = parts
                .next()
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| ParseError::new(line_no + 1, 1, "bad stage number"))?;
            let match_all = matches!(parts.next(), Some("match_all"));
            let refs = refs
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            stages.push(Stage::new(number, match_all, refs));
        }
        Pipeline::new(id.clone(), id.as_str(), stages)
            .map_err(|e| ParseError::new(1, 1, e.to_string()))
    }
}

/// End-to-end fixture around one interpreter and one program store.
pub struct TestHarness {
    store: Arc<ProgramStore>,
    interpreter: Interpreter,
    journal: Arc<RecordingJournal>,
}

impl TestHarness {
    /// Harness over the empty program.
    pub fn empty() -> Self {
        Self::from_snapshot(ProgramSnapshot::empty())
    }

    /// Harness over a directly constructed program. Assignments map
    /// stream ids to pipeline ids.
    pub fn from_program(
        pipelines: Vec<Pipeline>,
        assignments: Vec<(&str, Vec<&str>)>,
    ) -> Self {
        let by_id: IndexMap<PipelineId, Arc<Pipeline>> = pipelines
            .into_iter()
            .map(|p| (p.id().clone(), Arc::new(p)))
            .collect();
        let mut map: IndexMap<StreamId, Vec<Arc<Pipeline>>> = IndexMap::new();
        for (stream, ids) in assignments {
            let entry = map.entry(StreamId::from(stream)).or_default();
            for id in ids {
                entry.push(by_id[&PipelineId::from(id)].clone());
            }
        }
        Self::from_snapshot(ProgramSnapshot::new(by_id, map))
    }

    /// Harness built through the reload path: sources are parsed with
    /// [`StubParser`] and linked by a [`ReloadController`].
    pub fn from_sources(sources: Arc<InMemorySources>) -> (Self, ReloadController) {
        let store = Arc::new(ProgramStore::new());
        let controller = ReloadController::new(
            sources.clone(),
            sources.clone(),
            sources,
            Arc::new(StubParser),
            store.clone(),
        );
        let journal = Arc::new(RecordingJournal::default());
        let interpreter = Interpreter::new(store.clone(), journal.clone());
        (
            Self {
                store,
                interpreter,
                journal,
            },
            controller,
        )
    }

    fn from_snapshot(snapshot: ProgramSnapshot) -> Self {
        let store = Arc::new(ProgramStore::new());
        store.publish(Arc::new(snapshot));
        let journal = Arc::new(RecordingJournal::default());
        let interpreter = Interpreter::new(store.clone(), journal.clone());
        Self {
            store,
            interpreter,
            journal,
        }
    }

    pub fn store(&self) -> &Arc<ProgramStore> {
        &self.store
    }

    pub fn process(&self, messages: Vec<Message>) -> Vec<Message> {
        self.interpreter.process(messages)
    }

    /// Process a single message, expecting a single output.
    pub fn process_one(&self, message: Message) -> Message {
        let mut output = self.process(vec![message]);
        assert_eq!(output.len(), 1, "expected exactly one output message");
        output.pop().unwrap()
    }

    pub fn filtered_out(&self) -> u64 {
        self.interpreter.metrics().filtered_out_messages()
    }

    pub fn committed_offsets(&self) -> Vec<u64> {
        self.journal.committed()
    }
}

/// Rule that stamps `field = value` whenever `when` holds.
pub fn stamping_rule(name: &str, when: Expression, field: &str, value: i64) -> Arc<Rule> {
    Arc::new(
        Rule::new(
            None,
            name,
            when,
            vec![Statement::call(
                "set_field",
                vec![Expression::string(field), Expression::long(value)],
            )],
        )
        .expect("stamping rule"),
    )
}

/// Rule with arbitrary actions, matching unconditionally.
pub fn action_rule(name: &str, then: Vec<Statement>) -> Arc<Rule> {
    Arc::new(Rule::new(None, name, Expression::boolean(true), then).expect("action rule"))
}

/// Stage with pre-resolved rules.
pub fn resolved_stage(number: i32, match_all: bool, rules: Vec<Arc<Rule>>) -> Stage {
    let refs = rules.iter().map(|r| r.name().to_string()).collect();
    let mut stage = Stage::new(number, match_all, refs);
    stage.set_rules(rules);
    stage
}

/// `to_long(get_field(field)) + 1`, for counting rule executions.
pub fn increment_of(field: &str) -> Expression {
    Expression::Binary {
        op: sluice_foundation::BinaryOp::Add,
        left: Box::new(Expression::call(
            "to_long",
            vec![Expression::call(
                "get_field",
                vec![Expression::string(field)],
            )],
        )),
        right: Box::new(Expression::long(1)),
    }
}

/// Assert a message field equals a long.
pub fn assert_long_field(message: &Message, field: &str, expected: i64) {
    assert_eq!(
        message.field(field),
        Some(&Value::Long(expected)),
        "field `{field}`"
    );
}
